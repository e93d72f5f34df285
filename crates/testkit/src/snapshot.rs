//! Golden-file JSON snapshots.
//!
//! Values are written as pretty JSON with object keys sorted and a trailing
//! newline, so diffs stay stable across serde field order changes. Set
//! `SW_UPDATE_SNAPSHOTS=1` to rewrite goldens instead of comparing.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Environment variable that switches snapshot asserts to update mode.
pub const UPDATE_SNAPSHOTS_ENV: &str = "SW_UPDATE_SNAPSHOTS";

/// Compare `value` with the golden file at `path`, or rewrite the golden in
/// update mode.
pub fn assert_json_snapshot<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let actual = canonical_json(value)?;

    if should_update_snapshots() {
        return write_snapshot(path, &actual);
    }

    let expected = fs::read_to_string(path).with_context(|| {
        format!(
            "Snapshot missing at {} (set {}=1 to create it)",
            path.display(),
            UPDATE_SNAPSHOTS_ENV
        )
    })?;

    if expected != actual {
        let line = first_difference(&expected, &actual);
        anyhow::bail!(
            "Snapshot mismatch at {} line {} (set {}=1 to update)",
            path.display(),
            line,
            UPDATE_SNAPSHOTS_ENV
        );
    }
    Ok(())
}

/// Canonical text form used by [`assert_json_snapshot`].
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    let mut s = serde_json::to_string_pretty(&sorted(value)).context("Failed to format snapshot")?;
    s.push('\n');
    Ok(s)
}

fn should_update_snapshots() -> bool {
    matches!(
        std::env::var(UPDATE_SNAPSHOTS_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn write_snapshot(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create snapshot directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    tracing::info!(path = %path.display(), "updated snapshot");
    Ok(())
}

// 1-based line of the first mismatch.
fn first_difference(expected: &str, actual: &str) -> usize {
    expected
        .lines()
        .zip(actual.lines())
        .position(|(e, a)| e != a)
        .unwrap_or_else(|| expected.lines().count().min(actual.lines().count()))
        + 1
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(values) => Value::Array(values.into_iter().map(sorted).collect()),
        other => other,
    }
}
