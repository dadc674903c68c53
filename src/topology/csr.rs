//! Compressed-sparse-row adjacency tables.
//
// Row `i` occupies `values[offsets[i] .. offsets[i + 1]]`. Used for
// cell → points, point → cells and cell → face-neighbour connectivity.

/// CSR table with `T` entries per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Csr<T> {
    offsets: Vec<usize>,
    values: Vec<T>,
}

impl<T> Default for Csr<T> {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            values: Vec::new(),
        }
    }
}

impl<T: Copy> Csr<T> {
    /// Build a table from one list per row.
    pub fn from_rows<R, I>(rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = T>,
    {
        let mut offsets = vec![0];
        let mut values = Vec::new();
        for row in rows {
            values.extend(row);
            offsets.push(values.len());
        }
        Self { offsets, values }
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total number of stored entries.
    #[inline]
    pub fn n_values(&self) -> usize {
        self.values.len()
    }

    /// Entries of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.values[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.n_rows()).map(move |i| self.row(i))
    }
}

impl<T: Copy> Csr<T> {
    /// Transpose the table: row `j` of the result lists every `i` whose row
    /// contains an entry mapping to `j`.
    ///
    /// `key` maps an entry to its target row, `make` builds the transposed
    /// entry from the source row index. Rows of the result are sorted by
    /// source row because sources are visited in order.
    pub fn transpose<U: Copy>(
        &self,
        n_target_rows: usize,
        key: impl Fn(T) -> usize,
        make: impl Fn(usize) -> U,
    ) -> Csr<U> {
        let mut counts = vec![0usize; n_target_rows + 1];
        for &v in &self.values {
            counts[key(v) + 1] += 1;
        }
        for j in 0..n_target_rows {
            counts[j + 1] += counts[j];
        }
        let offsets = counts.clone();
        let mut cursor = counts;
        let mut slots: Vec<Option<U>> = vec![None; self.values.len()];
        for i in 0..self.n_rows() {
            for &v in self.row(i) {
                let j = key(v);
                slots[cursor[j]] = Some(make(i));
                cursor[j] += 1;
            }
        }
        Csr {
            offsets,
            values: slots.into_iter().flatten().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_roundtrip() {
        let csr = Csr::from_rows(vec![vec![1u32, 2], vec![], vec![3]]);
        assert_eq!(csr.n_rows(), 3);
        assert_eq!(csr.n_values(), 3);
        assert_eq!(csr.row(0), &[1, 2]);
        assert!(csr.row(1).is_empty());
        assert_eq!(csr.row(2), &[3]);
        assert_eq!(csr.rows().count(), 3);
    }

    #[test]
    fn empty_table_has_no_rows() {
        let csr = Csr::<u32>::default();
        assert_eq!(csr.n_rows(), 0);
    }

    #[test]
    fn transpose_inverts_incidence() {
        // cell 0 -> points {0, 1}, cell 1 -> points {1, 2}
        let cp = Csr::from_rows(vec![vec![0usize, 1], vec![1, 2]]);
        let pc = cp.transpose(3, |p| p, |c| c);
        assert_eq!(pc.row(0), &[0]);
        assert_eq!(pc.row(1), &[0, 1]);
        assert_eq!(pc.row(2), &[1]);
    }
}
