//! Metrics report written by the headless demo for CI artifacts.
//!
//! One JSON document per run, covering the leaf animation pipeline and the
//! rain-on-glass sampler.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level metrics document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Run identifier.
    pub run_name: String,
    /// RFC 3339 timestamp of report creation.
    pub timestamp: String,
    /// Overall verdict.
    pub result: RunResult,
    /// Leaf toggles and the frames they caused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationMetrics>,
    /// Rain sampler activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain: Option<RainMetrics>,
    /// Wall-clock and tick counts.
    pub execution: ExecutionMetrics,
}

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunResult {
    /// Every check held.
    Pass,
    /// Something went wrong.
    Fail,
}

/// Animation pipeline counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationMetrics {
    /// Successful toggles, partners included.
    pub toggles: u64,
    /// Pipeline steps executed by the frame scheduler.
    pub tasks_run: u64,
    /// Static meshes baked.
    pub tessellations: u64,
    /// Tasks still queued when the run ended.
    pub pending_at_end: u64,
}

/// Rain sampler counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RainMetrics {
    /// Sampler passes run.
    pub samples: u64,
    /// Sampler passes that found glass.
    pub hits: u64,
    /// Ambient sounds emitted.
    pub sounds: u64,
    /// Mean glass cover over the hits.
    pub mean_cover: f32,
}

/// Run size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// Simulated ticks.
    pub ticks: u64,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl MetricsReport {
    /// Empty passing report stamped with the current time.
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            result: RunResult::Pass,
            animation: None,
            rain: None,
            execution: ExecutionMetrics::default(),
        }
    }
}

/// Writes [`MetricsReport`]s as pretty JSON.
#[derive(Debug, Clone)]
pub struct MetricsSink {
    path: PathBuf,
}

impl MetricsSink {
    /// Sink at `path`; parent directories are created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    /// Overwrite the file with `report`.
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write metrics to {}", self.path.display()))
    }
}
