//! slidingwindows - headless demo of glass leaves and rain-on-glass ambience

use anyhow::Result;
use slidingwindows::headless::{self, HeadlessConfig};
use slidingwindows_world::PrecipitationType;
use std::{env, path::PathBuf};
use tracing::info;

fn main() -> Result<()> {
    // WARN by default; RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting slidingwindows v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    let summary = headless::run(cli.into_config())?;
    println!(
        "leaves={} paired={} toggles={} tasks={} tessellations={} rain_sounds={} sounds={}",
        summary.leaves,
        summary.paired,
        summary.toggles,
        summary.tasks_run,
        summary.tessellations,
        summary.rain_sounds,
        summary.sounds_played
    );
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    config_dir: PathBuf,
    ticks: u64,
    seed: u64,
    precipitation: PrecipitationType,
    intensity: f32,
    event_log: Option<PathBuf>,
    metrics: Option<PathBuf>,
    no_audio: bool,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions {
            config_dir: PathBuf::from("config"),
            ticks: 100,
            seed: 0,
            precipitation: PrecipitationType::Rain,
            intensity: 1.0,
            event_log: None,
            metrics: None,
            no_audio: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config-dir" => {
                    if let Some(path) = args.next() {
                        opts.config_dir = PathBuf::from(path);
                    } else {
                        tracing::error!("--config-dir requires a directory path");
                    }
                }
                "--ticks" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<u64>() {
                            Ok(value) => opts.ticks = value,
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--ticks must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--ticks requires an integer");
                    }
                }
                "--seed" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<u64>() {
                            Ok(value) => opts.seed = value,
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--seed must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--seed requires an integer");
                    }
                }
                "--intensity" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<f32>() {
                            Ok(value) => opts.intensity = value.clamp(0.0, 1.0),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--intensity must be a number");
                            }
                        }
                    } else {
                        tracing::error!("--intensity requires a number");
                    }
                }
                "--rain" => opts.precipitation = PrecipitationType::Rain,
                "--hail" => opts.precipitation = PrecipitationType::Hail,
                "--snow" => opts.precipitation = PrecipitationType::Snow,
                "--event-log" => {
                    if let Some(path) = args.next() {
                        opts.event_log = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--event-log requires a file path");
                    }
                }
                "--metrics" => {
                    if let Some(path) = args.next() {
                        opts.metrics = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--metrics requires a file path");
                    }
                }
                "--no-audio" => opts.no_audio = true,
                other => {
                    tracing::warn!(arg = %other, "ignoring unknown argument");
                }
            }
        }
        opts
    }

    fn into_config(self) -> HeadlessConfig {
        HeadlessConfig {
            config_dir: self.config_dir,
            ticks: self.ticks,
            seed: self.seed,
            precipitation: self.precipitation,
            intensity: self.intensity,
            event_log: self.event_log,
            metrics: self.metrics,
            no_audio: self.no_audio,
        }
    }
}
