//! Tick-stepped golden tests over a tiny world.
//!
//! A micro-worldtest steps some state a fixed number of ticks, records a
//! snapshot before the first step and after each one, and compares the whole
//! timeline against a golden JSON file.

use crate::snapshot::assert_json_snapshot;
use anyhow::Result;
use serde::Serialize;
use slidingwindows_core::SimTick;
use std::path::PathBuf;

/// Configuration for a micro-worldtest.
#[derive(Debug, Clone)]
pub struct MicroWorldtestConfig {
    /// Written into the report.
    pub name: String,
    /// Steps to run; the report has `ticks + 1` frames.
    pub ticks: u64,
    /// Simulated milliseconds per step, handed to the step function.
    pub tick_ms: u64,
    /// Golden JSON file.
    pub snapshot_path: PathBuf,
}

impl MicroWorldtestConfig {
    /// Config with the given step length.
    pub fn new(name: impl Into<String>, ticks: u64, tick_ms: u64, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            ticks,
            tick_ms,
            snapshot_path: snapshot_path.into(),
        }
    }
}

/// Snapshot captured at a given tick.
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestFrame<S> {
    /// Tick number.
    pub tick: u64,
    /// Snapshot payload.
    pub snapshot: S,
}

/// Full timeline of a run, as stored in the golden file.
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestReport<S> {
    /// Run name.
    pub name: String,
    /// One frame per tick, starting at tick 0.
    pub frames: Vec<MicroWorldtestFrame<S>>,
}

/// Run a micro-worldtest and assert (or update) its golden file.
///
/// `step` gets the tick being left and the step length in milliseconds.
/// The report is returned so callers can make extra assertions on it.
pub fn run_micro_worldtest<State, Snapshot, StepFn, SnapFn>(
    config: MicroWorldtestConfig,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Result<MicroWorldtestReport<Snapshot>>
where
    Snapshot: Serialize,
    StepFn: FnMut(SimTick, u64, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let mut frames = Vec::with_capacity(config.ticks as usize + 1);
    let mut tick = SimTick::ZERO;
    frames.push(MicroWorldtestFrame {
        tick: tick.0,
        snapshot: snapshot(tick, &state),
    });

    for _ in 0..config.ticks {
        step(tick, config.tick_ms, &mut state);
        tick = tick.advance(1);
        frames.push(MicroWorldtestFrame {
            tick: tick.0,
            snapshot: snapshot(tick, &state),
        });
    }

    let report = MicroWorldtestReport {
        name: config.name,
        frames,
    };
    assert_json_snapshot(&config.snapshot_path, &report)?;
    Ok(report)
}
