//! One allocation cycle as a small state machine.
//!
//! ```text
//! AwaitingInputs ──(split + fill present)──▶ Computing ──▶ Done
//!        │                                       │
//!        └────────(missing snapshot)────▶ Failed ◀┘
//! ```
//!
//! Cycles share nothing. Whatever the caller wants to record about a cycle
//! goes through the [`CycleObserver`] it passes in.

use std::fmt;

use crate::engine::allocate_parsed_split;
use crate::error::{AllocationError, ErrorKind};
use crate::merge::FinalPosition;
use crate::snapshot::{FillSnapshot, PreviousPositionSnapshot, Split, SplitSnapshot};

/// Where a cycle currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CycleState {
    AwaitingInputs,
    Computing,
    Done,
    Failed,
}

impl CycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CycleState::Done | CycleState::Failed)
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleState::AwaitingInputs => write!(f, "AWAITING_INPUTS"),
            CycleState::Computing => write!(f, "COMPUTING"),
            CycleState::Done => write!(f, "DONE"),
            CycleState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Snapshots observed at cycle start. `previous` may legitimately be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleInputs {
    pub split: Option<SplitSnapshot>,
    pub fill: Option<FillSnapshot>,
    pub previous: Option<PreviousPositionSnapshot>,
}

/// Terminal result of a cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Done(FinalPosition),
    Failed(AllocationError),
}

impl CycleOutcome {
    pub fn state(&self) -> CycleState {
        match self {
            CycleOutcome::Done(_) => CycleState::Done,
            CycleOutcome::Failed(_) => CycleState::Failed,
        }
    }

    pub fn position(&self) -> Option<&FinalPosition> {
        match self {
            CycleOutcome::Done(p) => Some(p),
            CycleOutcome::Failed(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            CycleOutcome::Done(_) => None,
            CycleOutcome::Failed(e) => Some(e.kind()),
        }
    }

    pub fn into_result(self) -> Result<FinalPosition, AllocationError> {
        match self {
            CycleOutcome::Done(p) => Ok(p),
            CycleOutcome::Failed(e) => Err(e),
        }
    }
}

/// Receives state changes of a running cycle.
pub trait CycleObserver {
    fn on_transition(&mut self, _from: CycleState, _to: CycleState) {}

    /// Called once the split has parsed, before anything is allocated.
    fn on_split(&mut self, _split: &Split) {}

    fn on_failure(&mut self, _error: &AllocationError) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl CycleObserver for NoopObserver {}

struct Cycle<'a> {
    state: CycleState,
    observer: &'a mut dyn CycleObserver,
}

impl Cycle<'_> {
    fn advance(&mut self, to: CycleState) {
        let from = self.state;
        self.state = to;
        self.observer.on_transition(from, to);
    }

    fn fail(mut self, error: AllocationError) -> CycleOutcome {
        self.observer.on_failure(&error);
        self.advance(CycleState::Failed);
        CycleOutcome::Failed(error)
    }

    fn finish(mut self, position: FinalPosition) -> CycleOutcome {
        self.advance(CycleState::Done);
        CycleOutcome::Done(position)
    }
}

/// Run one cycle against the given snapshots.
///
/// Never panics on bad input: every failure comes back as
/// [`CycleOutcome::Failed`] with no position produced.
pub fn run_cycle(inputs: &CycleInputs, observer: &mut dyn CycleObserver) -> CycleOutcome {
    let mut cycle = Cycle {
        state: CycleState::AwaitingInputs,
        observer,
    };

    let (split, fill) = match (&inputs.split, &inputs.fill) {
        (Some(split), Some(fill)) => (split, fill),
        (None, _) => return cycle.fail(AllocationError::missing("no split snapshot available")),
        (_, None) => return cycle.fail(AllocationError::missing("no fill snapshot available")),
    };

    cycle.advance(CycleState::Computing);
    let split = match split.parse() {
        Ok(split) => split,
        Err(e) => return cycle.fail(e),
    };
    cycle.observer.on_split(&split);
    match allocate_parsed_split(&split, fill, inputs.previous.as_ref()) {
        Ok(position) => cycle.finish(position),
        Err(e) => cycle.fail(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        transitions: Vec<(CycleState, CycleState)>,
        split_totals: Vec<f64>,
        failures: Vec<ErrorKind>,
    }

    impl CycleObserver for Recorder {
        fn on_transition(&mut self, from: CycleState, to: CycleState) {
            self.transitions.push((from, to));
        }

        fn on_split(&mut self, split: &Split) {
            self.split_totals.push(split.total_percent());
        }

        fn on_failure(&mut self, error: &AllocationError) {
            self.failures.push(error.kind());
        }
    }

    fn inputs() -> CycleInputs {
        CycleInputs {
            split: Some([("A", "60%"), ("B", "40%")].into_iter().collect()),
            fill: Some(FillSnapshot::new("X", "0.10$", 100)),
            previous: None,
        }
    }

    #[test]
    fn successful_cycle_walks_to_done() {
        let mut rec = Recorder::default();
        let outcome = run_cycle(&inputs(), &mut rec);
        assert_eq!(outcome.state(), CycleState::Done);
        assert_eq!(outcome.position().unwrap().total(), 100);
        assert_eq!(
            rec.transitions,
            [
                (CycleState::AwaitingInputs, CycleState::Computing),
                (CycleState::Computing, CycleState::Done),
            ]
        );
        assert!(rec.failures.is_empty());
    }

    #[test]
    fn missing_fill_fails_before_computing() {
        let mut rec = Recorder::default();
        let outcome = run_cycle(
            &CycleInputs {
                fill: None,
                ..inputs()
            },
            &mut rec,
        );
        assert_eq!(outcome.error_kind(), Some(ErrorKind::MissingInput));
        assert_eq!(
            rec.transitions,
            [(CycleState::AwaitingInputs, CycleState::Failed)]
        );
    }

    #[test]
    fn missing_split_fails() {
        let outcome = run_cycle(
            &CycleInputs {
                split: None,
                ..inputs()
            },
            &mut NoopObserver,
        );
        assert_eq!(outcome.error_kind(), Some(ErrorKind::MissingInput));
        assert!(outcome.position().is_none());
    }

    #[test]
    fn parse_error_fails_from_computing() {
        let mut rec = Recorder::default();
        let outcome = run_cycle(
            &CycleInputs {
                split: Some([("A", "60")].into_iter().collect()),
                ..inputs()
            },
            &mut rec,
        );
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Parse));
        assert_eq!(rec.failures, [ErrorKind::Parse]);
        assert_eq!(
            rec.transitions.last(),
            Some(&(CycleState::Computing, CycleState::Failed))
        );
    }

    #[test]
    fn observer_sees_parsed_split_once() {
        let mut rec = Recorder::default();
        run_cycle(
            &CycleInputs {
                split: Some([("A", "60%"), ("B", "30%")].into_iter().collect()),
                ..inputs()
            },
            &mut rec,
        );
        assert_eq!(rec.split_totals, [90.0]);

        let mut rec = Recorder::default();
        run_cycle(
            &CycleInputs {
                split: Some([("A", "sixty%")].into_iter().collect()),
                ..inputs()
            },
            &mut rec,
        );
        assert!(rec.split_totals.is_empty());
        assert_eq!(rec.failures, [ErrorKind::Parse]);
    }

    #[test]
    fn terminal_states() {
        assert!(CycleState::Done.is_terminal());
        assert!(CycleState::Failed.is_terminal());
        assert!(!CycleState::Computing.is_terminal());
        assert_eq!(CycleState::AwaitingInputs.to_string(), "AWAITING_INPUTS");
    }
}
