//! # fillsplit
//!
//! Deterministic allocation of trade fills across accounts that should each
//! own a configured percentage of an asset.
//!
//! Every cycle takes three snapshots (the percentage split, the latest fill,
//! and the previous positions for the filled ticker) and produces new
//! per-account positions. Accounts already at or above their fair share are
//! left alone; the fill is spread over the accounts that are owed quantity.
//! The new positions always add up to exactly previous total + fill quantity.
//!
//! ## Quick Start
//!
//! ```
//! use fillsplit::{FillSnapshot, PreviousPositionSnapshot, SplitSnapshot, compute_allocation};
//!
//! let split: SplitSnapshot = [("A", "50%"), ("B", "30%"), ("C", "20%")].into_iter().collect();
//! let fill = FillSnapshot::new("AXA", "0.42$", 50);
//! let previous: PreviousPositionSnapshot =
//!     [("A", "40 AXA"), ("B", "30 AXA"), ("C", "30 AXA")].into_iter().collect();
//!
//! let position = compute_allocation(&split, &fill, Some(&previous)).unwrap();
//!
//! // C already holds its 20% of 150, so A and B absorb the whole fill.
//! assert_eq!(position.to_string(), "{A: 75 AXA, B: 45 AXA, C: 30 AXA}");
//! assert_eq!(position.total(), 150);
//! ```
//!
//! ## First Trade
//!
//! Without previous positions the fill is split proportionally:
//!
//! ```
//! use fillsplit::{FillSnapshot, SplitSnapshot, compute_allocation};
//!
//! let split: SplitSnapshot = [("A", "60%"), ("B", "40%")].into_iter().collect();
//! let position = compute_allocation(&split, &FillSnapshot::new("X", "1$", 100), None).unwrap();
//! assert_eq!(position.get("A"), Some(60));
//! assert_eq!(position.get("B"), Some(40));
//! ```
//!
//! ## Rounding
//!
//! Shares are rounded half away from zero. Drift between the rounded deltas
//! and the fill is removed from the largest deltas first, or handed out one
//! unit per account in ascending account order; see [`reconcile`](mod@reconcile).
//!
//! ## Errors
//!
//! | Kind | Raised when |
//! |------|-------------|
//! | `Parse` | a percentage, position, or fill value is malformed |
//! | `MissingInput` | the split or fill snapshot is unavailable at cycle start |
//! | `InconsistentState` | the fill cannot be allocated exactly |
//!
//! ```
//! use fillsplit::{ErrorKind, FillSnapshot, SplitSnapshot, compute_allocation};
//!
//! let split: SplitSnapshot = [("A", "60")].into_iter().collect();
//! let err = compute_allocation(&split, &FillSnapshot::new("X", "1$", 10), None).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Parse);
//! ```

pub mod classify;
pub mod cycle;
mod engine;
mod error;
mod merge;
pub mod reconcile;
mod snapshot;
pub mod target;
mod types;

pub use classify::{Classification, classify};
pub use cycle::{CycleInputs, CycleObserver, CycleOutcome, CycleState, NoopObserver, run_cycle};
pub use engine::{allocate, allocate_first_trade, compute_allocation};
pub use error::{AllocationError, ErrorKind};
pub use merge::{FinalPosition, merge};
pub use reconcile::reconcile;
pub use snapshot::{
    Fill, FillSnapshot, PreviousPositionSnapshot, Split, SplitSnapshot, encode_position,
};
pub use target::{compute_targets, overall_quantity};
pub use types::{AccountId, Percent, Price, Quantities, Quantity};
