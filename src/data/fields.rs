//! Named per-cell fields consumed by refinement criteria.
//!
//! A [`FieldSet`] is a snapshot of already-materialized field data keyed by
//! name. Lookups are the validation point for field data: a criterion that
//! names a missing field, a field of the wrong kind, a field with the wrong
//! length or a field holding NaN/inf fails here with a [`ConfigError`], before
//! any sampling happens.

use std::borrow::Cow;

use hashbrown::HashMap;

use crate::mesh_error::ConfigError;
use crate::topology::point::CellId;

/// Cell-centred field data.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldData {
    /// One scalar per cell.
    Scalar(Vec<f64>),
    /// One 3-vector per cell.
    Vector(Vec<[f64; 3]>),
}

impl FieldData {
    /// Number of cells covered.
    pub fn len(&self) -> usize {
        match self {
            FieldData::Scalar(v) => v.len(),
            FieldData::Vector(v) => v.len(),
        }
    }

    /// `true` when the field has no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            FieldData::Scalar(_) => "scalar",
            FieldData::Vector(_) => "vector",
        }
    }

    fn first_non_finite(&self) -> Option<usize> {
        match self {
            FieldData::Scalar(v) => v.iter().position(|x| !x.is_finite()),
            FieldData::Vector(v) => v.iter().position(|x| x.iter().any(|c| !c.is_finite())),
        }
    }
}

/// Named cell fields for one adaptation step.
#[derive(Clone, Debug, Default)]
pub struct FieldSet {
    fields: HashMap<String, FieldData>,
}

impl FieldSet {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a scalar field.
    pub fn insert_scalar(&mut self, name: impl Into<String>, values: Vec<f64>) -> &mut Self {
        self.fields.insert(name.into(), FieldData::Scalar(values));
        self
    }

    /// Insert or replace a vector field.
    pub fn insert_vector(&mut self, name: impl Into<String>, values: Vec<[f64; 3]>) -> &mut Self {
        self.fields.insert(name.into(), FieldData::Vector(values));
        self
    }

    /// Raw access to a field.
    pub fn get(&self, name: &str) -> Option<&FieldData> {
        self.fields.get(name)
    }

    /// `true` if a field with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn try_get(&self, owner: &str, name: &str, n_cells: usize) -> Result<&FieldData, ConfigError> {
        let data = self.fields.get(name).ok_or_else(|| ConfigError::MissingField {
            criterion: owner.to_owned(),
            field: name.to_owned(),
        })?;
        if data.len() != n_cells {
            return Err(ConfigError::FieldLength {
                field: name.to_owned(),
                expected: n_cells,
                found: data.len(),
            });
        }
        if let Some(cell) = data.first_non_finite() {
            return Err(ConfigError::NonFiniteValue {
                field: name.to_owned(),
                cell: CellId::from_index(cell),
            });
        }
        Ok(data)
    }

    /// Validated scalar field for `owner` (a criterion name, used in errors).
    pub fn try_scalar(&self, owner: &str, name: &str, n_cells: usize) -> Result<&[f64], ConfigError> {
        match self.try_get(owner, name, n_cells)? {
            FieldData::Scalar(v) => Ok(v),
            other => Err(ConfigError::FieldKind {
                criterion: owner.to_owned(),
                field: name.to_owned(),
                expected: "scalar",
                found: other.kind(),
            }),
        }
    }

    /// Validated vector field for `owner`.
    pub fn try_vector(
        &self,
        owner: &str,
        name: &str,
        n_cells: usize,
    ) -> Result<&[[f64; 3]], ConfigError> {
        match self.try_get(owner, name, n_cells)? {
            FieldData::Vector(v) => Ok(v),
            other => Err(ConfigError::FieldKind {
                criterion: owner.to_owned(),
                field: name.to_owned(),
                expected: "vector",
                found: other.kind(),
            }),
        }
    }

    /// Validated scalar view of any field: scalars as-is, vectors by magnitude.
    pub fn try_magnitude(
        &self,
        owner: &str,
        name: &str,
        n_cells: usize,
    ) -> Result<Cow<'_, [f64]>, ConfigError> {
        Ok(match self.try_get(owner, name, n_cells)? {
            FieldData::Scalar(v) => Cow::Borrowed(v.as_slice()),
            FieldData::Vector(v) => Cow::Owned(
                v.iter()
                    .map(|x| (x[0] * x[0] + x[1] * x[1] + x[2] * x[2]).sqrt())
                    .collect(),
            ),
        })
    }
}
