//! Drift correction: make the adjustable deltas add up to the fill exactly.
//!
//! Rounding each account's target independently can leave the deltas summing
//! to more (overshoot) or less (undershoot) than the new fill quantity.
//!
//! - **Overshoot** is removed one unit at a time from the account with the
//!   largest current delta, ties going to the lowest account id. Deltas never
//!   go below zero. The result is computed directly as a water level instead
//!   of looping unit by unit, so large overshoots cost `O(n log max)`.
//! - **Undershoot** is handed out one unit per account in ascending account
//!   order, cycling if needed, as long as it stays within the rounding
//!   tolerance supplied by the caller.

use crate::error::AllocationError;
use crate::types::{Quantities, Quantity};

/// Adjust `deltas` so they sum to exactly `new_quantity`.
///
/// `tolerance` is the largest undershoot attributable to rounding; a bigger
/// shortfall is reported as [`AllocationError::InconsistentState`]. Deltas that
/// already sum to `new_quantity` are returned unchanged.
pub fn reconcile(
    deltas: &Quantities,
    new_quantity: Quantity,
    tolerance: Quantity,
) -> Result<Quantities, AllocationError> {
    let total = deltas.checked_total().ok_or_else(|| {
        AllocationError::inconsistent(format!("deltas add up to more than {}", Quantity::MAX))
    })?;
    if total == new_quantity {
        return Ok(deltas.clone());
    }
    if deltas.is_empty() {
        return Err(AllocationError::inconsistent(format!(
            "no adjustable accounts to absorb a fill of {new_quantity}"
        )));
    }
    if total > new_quantity {
        Ok(trim_overshoot(deltas, total - new_quantity))
    } else {
        spread_shortfall(deltas, new_quantity - total, tolerance)
    }
}

/// Units above `level`, summed over all accounts.
fn excess_above(deltas: &Quantities, level: Quantity) -> Quantity {
    deltas.iter().map(|(_, d)| d.saturating_sub(level)).sum()
}

fn trim_overshoot(deltas: &Quantities, overshoot: Quantity) -> Quantities {
    // Lowest level whose excess fits inside the overshoot. At level 0 the
    // excess is the whole total, which is at least the overshoot.
    let (mut lo, mut hi) = (0, deltas.max_quantity());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if excess_above(deltas, mid) <= overshoot {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    let level = lo;

    // Fewer than the number of accounts sitting at `level`.
    let mut remaining = overshoot - excess_above(deltas, level);
    deltas
        .iter()
        .map(|(account, delta)| {
            let mut trimmed = delta.min(level);
            if remaining > 0 && level > 0 && trimmed == level {
                trimmed -= 1;
                remaining -= 1;
            }
            (account.clone(), trimmed)
        })
        .collect()
}

fn spread_shortfall(
    deltas: &Quantities,
    shortfall: Quantity,
    tolerance: Quantity,
) -> Result<Quantities, AllocationError> {
    if shortfall > tolerance {
        return Err(AllocationError::inconsistent(format!(
            "shortfall of {shortfall} exceeds the rounding tolerance of {tolerance}"
        )));
    }
    let accounts = deltas.len() as Quantity;
    let (base, extra) = (shortfall / accounts, shortfall % accounts);
    Ok(deltas
        .iter()
        .enumerate()
        .map(|(i, (account, delta))| {
            let bonus = if (i as Quantity) < extra { 1 } else { 0 };
            (account.clone(), delta + base + bonus)
        })
        .collect())
}
