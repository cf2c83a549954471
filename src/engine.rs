//! Allocation pipeline: targets → classification → reconciliation → merge.

use crate::classify::classify;
use crate::error::AllocationError;
use crate::merge::{FinalPosition, merge};
use crate::reconcile::reconcile;
use crate::snapshot::{Fill, FillSnapshot, PreviousPositionSnapshot, Split, SplitSnapshot};
use crate::target::compute_targets;
use crate::types::{Quantities, Quantity};

/// Largest undershoot that rounding alone can explain: one unit per split account.
fn rounding_tolerance(split: &Split) -> Quantity {
    split.len() as Quantity
}

/// Allocate `fill` on top of existing holdings.
///
/// The result always satisfies `total == previous.total() + fill.quantity()`.
pub fn allocate(
    split: &Split,
    fill: &Fill,
    previous: &Quantities,
) -> Result<FinalPosition, AllocationError> {
    let targets = compute_targets(previous, fill.quantity(), split)?;
    let classification = classify(previous, &targets);
    let adjusted = reconcile(
        &classification.deltas,
        fill.quantity(),
        rounding_tolerance(split),
    )?;
    merge(
        &classification.frozen,
        &adjusted,
        previous,
        fill.ticker(),
    )
}

/// Allocate the first fill for a ticker, when nothing is held yet.
///
/// Each account gets its rounded share of the fill. Accounts split at 0%
/// stay at zero; every other account takes part in absorbing rounding drift,
/// even when its own share rounds to zero.
pub fn allocate_first_trade(split: &Split, fill: &Fill) -> Result<FinalPosition, AllocationError> {
    let none = Quantities::new();
    let shares = compute_targets(&none, fill.quantity(), split)?;

    let mut owed = Quantities::new();
    let mut idle = Quantities::new();
    for (account, pct) in split.iter() {
        let share = shares.get(account.as_str()).unwrap_or(0);
        if pct.value() > 0.0 {
            owed.insert(account.clone(), share);
        } else {
            idle.insert(account.clone(), share);
        }
    }

    let adjusted = reconcile(&owed, fill.quantity(), rounding_tolerance(split))?;
    merge(&idle, &adjusted, &none, fill.ticker())
}

/// Compute the new positions from the wire-encoded snapshots.
///
/// An absent or empty `previous` snapshot takes the first-trade path.
/// Inputs are only read; parsing produces fresh values.
pub fn compute_allocation(
    split: &SplitSnapshot,
    fill: &FillSnapshot,
    previous: Option<&PreviousPositionSnapshot>,
) -> Result<FinalPosition, AllocationError> {
    allocate_parsed_split(&split.parse()?, fill, previous)
}

/// [`compute_allocation`] for a split that has already been parsed.
pub(crate) fn allocate_parsed_split(
    split: &Split,
    fill: &FillSnapshot,
    previous: Option<&PreviousPositionSnapshot>,
) -> Result<FinalPosition, AllocationError> {
    let fill = fill.parse()?;
    match previous {
        Some(snapshot) if !snapshot.is_empty() => {
            let previous = snapshot.parse(fill.ticker())?;
            allocate(split, &fill, &previous)
        }
        _ => allocate_first_trade(split, &fill),
    }
}
