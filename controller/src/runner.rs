//! Cycle driver: gather snapshots → run cycle → store → audit.
//!
//! This is the main workflow that ties together all components.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fillsplit::{
    AllocationError, CycleInputs, CycleObserver, CycleOutcome, CycleState, FillSnapshot,
    FinalPosition, PreviousPositionSnapshot, Split, SplitSnapshot, compute_allocation, run_cycle,
};
use log::{debug, error, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::{
    FillFeeder, LatestSlot, SplitFeeder, sleep_unless_stopped, spawn_fill_feed, spawn_split_feed,
};
use crate::sink::PositionSink;

/// Options for a periodic run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this many cycles. `None` runs until the stop flag is set.
    pub cycles: Option<u64>,
}

/// Tally of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub done: u64,
    pub failed: u64,
}

/// Logs cycle transitions and failures for one cycle number.
struct CycleLogger {
    cycle: u64,
}

impl CycleObserver for CycleLogger {
    fn on_transition(&mut self, from: CycleState, to: CycleState) {
        debug!("cycle {}: {from} -> {to}", self.cycle);
    }

    fn on_split(&mut self, split: &Split) {
        let total = split.total_percent();
        if (total - 100.0).abs() > 1e-6 {
            warn!("cycle {}: split totals {total}% instead of 100%", self.cycle);
        }
    }

    fn on_failure(&mut self, error: &AllocationError) {
        warn!(
            "cycle {} failed with {}: {}",
            self.cycle,
            error.kind(),
            error.reason()
        );
    }
}

/// Read whatever the feeders and the sink currently hold.
///
/// Previous positions are looked up for the ticker of the current fill,
/// ignoring surrounding whitespace the same way fill parsing does.
pub fn gather_inputs(
    split: &LatestSlot<SplitSnapshot>,
    fill: &LatestSlot<FillSnapshot>,
    sink: &dyn PositionSink,
) -> CycleInputs {
    let split = split.latest();
    let fill = fill.latest();
    let previous = fill.as_ref().and_then(|f| sink.previous(f.ticker.trim()));
    CycleInputs {
        split,
        fill,
        previous,
    }
}

/// Run one numbered cycle: compute, store on success, and audit either way.
///
/// Allocation failures are part of the returned outcome; only audit I/O
/// errors are returned as `Err`.
pub fn execute_cycle(
    cycle: u64,
    inputs: &CycleInputs,
    sink: &mut dyn PositionSink,
    audit: &mut AuditLog,
) -> Result<CycleOutcome> {
    info!("cycle {cycle}: started");
    audit::log_cycle_started(audit, cycle)?;
    audit::log_inputs(audit, cycle, inputs)?;

    let outcome = run_cycle(inputs, &mut CycleLogger { cycle });
    match &outcome {
        CycleOutcome::Done(position) => {
            info!("cycle {cycle}: new position {position}");
            sink.store(position);
            audit::log_allocation(audit, cycle, position)?;
        }
        CycleOutcome::Failed(e) => {
            audit::log_cycle_failed(audit, cycle, e)?;
        }
    }
    Ok(outcome)
}

fn feeder_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}

/// Start the feeders and drive cycles on the configured interval.
///
/// The first cycle runs one interval after start. Returns when `opts.cycles`
/// cycles have run or `stop` is set; feeder threads are stopped and joined
/// before returning.
pub fn run(
    config: &Config,
    opts: &RunOptions,
    sink: &mut dyn PositionSink,
    stop: Arc<AtomicBool>,
) -> Result<RunSummary> {
    let mut audit = AuditLog::open(&config.audit_path())?;
    audit.log_simple("run_started")?;

    let split_slot = LatestSlot::new();
    let fill_slot = LatestSlot::new();

    let split_feed = spawn_split_feed(
        SplitFeeder::new(config.split.clone(), feeder_rng(config.seed, 0)),
        split_slot.clone(),
        config.schedule.split_interval(),
        Arc::clone(&stop),
    )?;
    let fill_feed = spawn_fill_feed(
        FillFeeder::new(
            config.fill.clone(),
            &config.schedule,
            feeder_rng(config.seed, 1),
        ),
        fill_slot.clone(),
        Arc::clone(&stop),
    )?;

    info!(
        "Controller started: cycle every {:?}, audit at {}",
        config.schedule.cycle_interval(),
        config.audit_path().display()
    );

    let result = drive_cycles(
        config,
        opts,
        &split_slot,
        &fill_slot,
        sink,
        &mut audit,
        &stop,
    );

    stop.store(true, Ordering::Relaxed);
    for (name, handle) in [("split", split_feed), ("fill", fill_feed)] {
        if handle.join().is_err() {
            error!("{name} feeder thread panicked");
        }
    }

    let summary = result?;
    audit::log_run_completed(&mut audit, summary.cycles, summary.done, summary.failed)?;
    info!(
        "{} cycles, {} done, {} failed. Audit logged to {}",
        summary.cycles,
        summary.done,
        summary.failed,
        config.audit_path().display()
    );
    Ok(summary)
}

fn drive_cycles(
    config: &Config,
    opts: &RunOptions,
    split_slot: &LatestSlot<SplitSnapshot>,
    fill_slot: &LatestSlot<FillSnapshot>,
    sink: &mut dyn PositionSink,
    audit: &mut AuditLog,
    stop: &AtomicBool,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    while opts.cycles.is_none_or(|limit| summary.cycles < limit) {
        if !sleep_unless_stopped(stop, config.schedule.cycle_interval()) {
            break;
        }
        summary.cycles += 1;

        let inputs = gather_inputs(split_slot, fill_slot, sink);
        match execute_cycle(summary.cycles, &inputs, sink, audit)? {
            CycleOutcome::Done(_) => summary.done += 1,
            CycleOutcome::Failed(_) => summary.failed += 1,
        }
    }
    Ok(summary)
}

/// Compute one allocation from JSON files, without feeders or a sink.
pub fn allocate_from_files(
    split_path: &Path,
    fill_path: &Path,
    previous_path: Option<&Path>,
) -> Result<FinalPosition> {
    let split: SplitSnapshot = read_json(split_path)?;
    let fill: FillSnapshot = read_json(fill_path)?;
    let previous: Option<PreviousPositionSnapshot> = previous_path
        .map(read_json::<PreviousPositionSnapshot>)
        .transpose()?;

    Ok(compute_allocation(&split, &fill, previous.as_ref())?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::InputRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&contents)?)
}
