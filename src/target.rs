//! Fair-share target quantities.

use crate::error::AllocationError;
use crate::snapshot::Split;
use crate::types::{Quantities, Quantity};

/// Total quantity after the new fill lands: everything previously held plus the fill.
///
/// Fails with `InconsistentState` when the sum does not fit in a [`Quantity`].
pub fn overall_quantity(
    previous: &Quantities,
    new_quantity: Quantity,
) -> Result<Quantity, AllocationError> {
    previous
        .checked_total()
        .and_then(|held| held.checked_add(new_quantity))
        .ok_or_else(|| {
            AllocationError::inconsistent(format!(
                "holding plus a fill of {new_quantity} exceeds {}",
                Quantity::MAX
            ))
        })
}

/// Target quantity per account in `split`, as a rounded share of the overall quantity.
///
/// Accounts in `previous` but not in `split` get no target here; callers treat
/// them as targeting zero. An empty split yields empty targets. Fails when the
/// overall quantity overflows.
pub fn compute_targets(
    previous: &Quantities,
    new_quantity: Quantity,
    split: &Split,
) -> Result<Quantities, AllocationError> {
    let overall = overall_quantity(previous, new_quantity)?;
    Ok(split
        .iter()
        .map(|(account, pct)| (account.clone(), pct.share_of(overall)))
        .collect())
}
