//! 2:1 balance validation helpers.
//!
//! Face-adjacent cells may differ by at most one refinement level. These
//! helpers project a refine/unrefine decision onto the current level field
//! and report the face pairs that would break the rule.

use crate::mesh_error::AdaptError;
use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::{CellId, Level};

/// Structures that can check their own consistency.
///
/// `validate_invariants` always runs the check; `debug_assert_invariants`
/// only panics in builds where [`check_invariants!`](crate::check_invariants)
/// is active.
pub trait DebugInvariants {
    /// Panic on a broken invariant when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Return the first broken invariant.
    fn validate_invariants(&self) -> Result<(), AdaptError>;
}

/// Run a fallible check and panic with context on error, in debug builds or
/// with the `check-invariants` feature.
#[macro_export]
macro_rules! check_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Behavior when a projected level field violates 2:1 balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceHandling {
    /// Skip the check.
    Ignore,
    /// Log a warning per violating face.
    Warn,
    /// Return an error on the first violating face.
    Error,
}

/// Level field after refining `refine` (+1) and unrefining `unrefine` (-1).
pub fn projected_levels<V>(mesh: &V, refine: &[CellId], unrefine: &[CellId]) -> Vec<Level>
where
    V: ConnectivityView,
{
    let mut levels = mesh.cell_levels();
    for c in refine {
        levels[c.index()] = levels[c.index()].saturating_add(1);
    }
    for c in unrefine {
        levels[c.index()] = levels[c.index()].saturating_sub(1);
    }
    levels
}

/// Face pairs `(a, b)` with `a < b` whose levels differ by more than one.
pub fn balance_violations<V>(mesh: &V, levels: &[Level]) -> Vec<(CellId, CellId)>
where
    V: ConnectivityView,
{
    let mut out = Vec::new();
    for a in mesh.cells() {
        for &b in mesh.cell_neighbors(a) {
            if a < b && levels[a.index()].abs_diff(levels[b.index()]) > 1 {
                out.push((a, b));
            }
        }
    }
    out
}

/// Check a level field for 2:1 balance with the requested handling.
///
/// Returns the number of violating face pairs (always 0 when `Error` is
/// requested and the call succeeds).
pub fn check_balance<V>(
    mesh: &V,
    levels: &[Level],
    handling: BalanceHandling,
) -> Result<usize, AdaptError>
where
    V: ConnectivityView,
{
    if handling == BalanceHandling::Ignore {
        return Ok(0);
    }
    let violations = balance_violations(mesh, levels);
    for &(a, b) in &violations {
        match handling {
            BalanceHandling::Warn => {
                log::warn!(
                    "2:1 balance violated: cell {a} (level {}) next to cell {b} (level {})",
                    levels[a.index()],
                    levels[b.index()]
                );
            }
            BalanceHandling::Error => {
                return Err(AdaptError::InvalidTopology(format!(
                    "2:1 balance violated between cells {a} and {b}"
                )));
            }
            BalanceHandling::Ignore => {}
        }
    }
    Ok(violations.len())
}
