#![warn(missing_docs)]
//! Deterministic test surfaces: a leaf event log, golden snapshots and the
//! metrics report of headless runs.

mod metrics;
mod micro_worldtest;
mod snapshot;

use anyhow::{Context, Result};
use serde::Serialize;
use slidingwindows_core::{BlockPos, SimTick};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub use metrics::*;
pub use micro_worldtest::*;
pub use snapshot::*;

/// One line of the event log of a headless run.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    /// Simulation tick when the event occurred.
    pub tick: SimTick,
    /// Event label, e.g. `toggle` or `rain`.
    pub kind: &'a str,
    /// Block the event concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<BlockPos>,
    /// Free-form detail.
    pub payload: &'a str,
}

impl<'a> EventRecord<'a> {
    /// Event not tied to a block.
    pub fn new(tick: SimTick, kind: &'a str, payload: &'a str) -> Self {
        Self {
            tick,
            kind,
            pos: None,
            payload,
        }
    }

    /// Attach the block position.
    pub fn at(mut self, pos: BlockPos) -> Self {
        self.pos = Some(pos);
        self
    }
}

/// Newline-delimited JSON event log.
pub struct JsonlSink {
    out: BufWriter<File>,
    written: usize,
}

impl JsonlSink {
    /// Create a new log at `path`; parent directories are created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append an event.
    pub fn write(&mut self, event: &EventRecord<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Events written so far.
    pub fn len(&self) -> usize {
        self.written
    }

    /// True before the first event.
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Flush buffered lines to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
