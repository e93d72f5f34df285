//! Headless demo: a small glazed room driven for a fixed number of ticks.
//!
//! A server world owns placement, pairing and toggles. A client world is
//! restored from its snapshot, receives every dirty leaf as a replicated
//! tree, runs the mesh-swap pipeline frame by frame and feeds the rain
//! sampler. Sounds from both sides go to the audio manager.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use glam::Vec3;
use tracing::{debug, info, warn};

use slidingwindows_audio::{AudioManager, SoundPlayer};
use slidingwindows_core::{scoped_rng, BlockFacing, BlockPos, SimTick, Side, TreeAttribute};
use slidingwindows_render::ShapeLibrary;
use slidingwindows_testkit::{
    AnimationMetrics, EventRecord, ExecutionMetrics, JsonlSink, MetricsReport, MetricsSink, RainMetrics,
};
use slidingwindows_world::{
    interaction, multiblock, run_frame, Api, BlockAccessor, BlockSelection, ClientApi, GameMode, MemoryWorld,
    Player, PrecipitationType, WeatherToggle,
};

use crate::config::{try_register_with_config_ui, RainOnWindowsConfig};
use crate::mod_system::SlidingWindowsModSystem;
use crate::rain::{RainOnWindows, TickOutcome, TICK_MS};

/// Block pack of the demo room.
pub const DEMO_BLOCKS: &str = include_str!("../assets/demo/blocks.json");

/// Shapes of the demo blocks.
pub const DEMO_SHAPES: &str = include_str!("../assets/demo/shapes.json");

/// Client frames per sampler tick.
const FRAMES_PER_TICK: u64 = 8;

/// Rain plane above the room; the player's eye is 6.3 below it.
const ROOF_RAIN_HEIGHT: i32 = 72;

/// Rain plane when the player steps outside.
const OPEN_SKY_RAIN_HEIGHT: i32 = 60;

/// Ticks between scripted toggles.
const TOGGLE_EVERY: u64 = 5;

/// Demo run options.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Directory holding the rain config file.
    pub config_dir: PathBuf,
    /// Sampler ticks to run.
    pub ticks: u64,
    /// World seed for the sampler rolls.
    pub seed: u64,
    /// Forced precipitation type.
    pub precipitation: PrecipitationType,
    /// Precipitation intensity in `[0, 1]`.
    pub intensity: f32,
    /// JSONL event log, if wanted.
    pub event_log: Option<PathBuf>,
    /// Metrics report, if wanted.
    pub metrics: Option<PathBuf>,
    /// Skip the audio device even when one is available.
    pub no_audio: bool,
}

impl HeadlessConfig {
    /// Rain at full intensity for `ticks`.
    pub fn new(config_dir: PathBuf, ticks: u64) -> Self {
        Self {
            config_dir,
            ticks,
            seed: 0,
            precipitation: PrecipitationType::Rain,
            intensity: 1.0,
            event_log: None,
            metrics: None,
            no_audio: true,
        }
    }
}

/// What a demo run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessSummary {
    /// Leaves placed.
    pub leaves: usize,
    /// Leaves that found a partner on placement.
    pub paired: usize,
    /// Player toggles that changed something.
    pub toggles: u64,
    /// Pipeline tasks the client ran.
    pub tasks_run: u64,
    /// Static meshes the client baked.
    pub tessellations: u64,
    /// Tasks still queued at the end.
    pub pending_at_end: u64,
    /// Sampler ticks that rolled candidates.
    pub rain_hits: u64,
    /// Sounds the sampler emitted.
    pub rain_sounds: u64,
    /// Every sound the audio manager received.
    pub sounds_played: usize,
}

/// The placed leaves, in toggle order.
struct Room {
    leaves: Vec<BlockPos>,
}

/// Run the demo.
pub fn run(cfg: HeadlessConfig) -> Result<HeadlessSummary> {
    let started = Instant::now();
    let rain_config = RainOnWindowsConfig::load_or_create(&cfg.config_dir)?;
    if !try_register_with_config_ui(None, &rain_config, &cfg.config_dir, |_| {}) {
        debug!("no config UI; using {}", RainOnWindowsConfig::path_in(&cfg.config_dir).display());
    }

    let registry = Arc::new(SlidingWindowsModSystem.load_blocks_str(DEMO_BLOCKS)?);
    let shapes = ShapeLibrary::from_json_str(DEMO_SHAPES).context("failed to load demo shapes")?;

    let player = Player::new(Vec3::new(0.5, 64.0, 0.5), GameMode::Survival);
    let mut server = MemoryWorld::server(Arc::clone(&registry));
    let room = build_room(&mut server, &player)?;

    let mut client_world = MemoryWorld::restore(Side::Client, Arc::clone(&registry), &server.snapshot()?)?;
    client_world.set_default_rain_height(ROOF_RAIN_HEIGHT);
    let mut client = ClientApi::headless(shapes);
    for pos in client_world.leaf_positions() {
        interaction::initialize(&mut Api::client(&mut client_world, &mut client), pos);
    }
    server.take_dirty_entities();

    let mut audio = if cfg.no_audio {
        AudioManager::stub()
    } else {
        AudioManager::new().unwrap_or_else(|err| {
            warn!("Audio unavailable: {err:#}. Continuing without sound");
            AudioManager::stub()
        })
    };
    audio.set_listener_position(player.position.to_array());

    let mut events = cfg.event_log.as_ref().map(JsonlSink::create).transpose()?;
    let mut weather = WeatherToggle::raining(cfg.intensity);
    weather.forced_type = cfg.precipitation;
    let mut sampler = RainOnWindows::new(rain_config);

    let mut summary = HeadlessSummary {
        leaves: room.leaves.len(),
        paired: room
            .leaves
            .iter()
            .filter(|pos| {
                server
                    .leaf(**pos)
                    .and_then(|leaf| leaf.pairing())
                    .is_some_and(|p| p.has_partner())
            })
            .count(),
        ..Default::default()
    };
    let mut covers = Vec::new();
    let mut samples = 0;
    let outdoors = cfg.ticks / 3..cfg.ticks * 2 / 3;

    let mut tick = SimTick::ZERO;
    for _ in 0..cfg.ticks {
        if tick.0 % TOGGLE_EVERY == TOGGLE_EVERY / 2 && !room.leaves.is_empty() {
            let target = room.leaves[(tick.0 / TOGGLE_EVERY) as usize % room.leaves.len()];
            let before = server.leaf(target).is_some_and(|l| l.is_open());
            match interaction::interact(&mut Api::server(&mut server), &player, target) {
                Ok(()) => {
                    summary.toggles += 1;
                    let state = if before { "closed" } else { "opened" };
                    if let Some(sink) = events.as_mut() {
                        sink.write(&EventRecord::new(tick, "toggle", state).at(target))?;
                    }
                }
                Err(err) => warn!(%target, "toggle refused: {err}"),
            }
        }
        replicate(&mut server, &mut client_world, &mut client);

        for _ in 0..FRAMES_PER_TICK {
            let report = run_frame(&mut client_world, &mut client, TICK_MS / FRAMES_PER_TICK);
            summary.tasks_run += report.tasks_run as u64;
            summary.tessellations += report.tessellated.len() as u64;
        }

        let rain_height = if outdoors.contains(&tick.0) {
            OPEN_SKY_RAIN_HEIGHT
        } else {
            ROOF_RAIN_HEIGHT
        };
        client_world.set_default_rain_height(rain_height);
        let mut rng = scoped_rng(cfg.seed, 0, tick);
        let outcome = sampler.on_game_tick(
            &mut client_world,
            Some(&weather),
            Some(&player),
            TICK_MS as f32 / 1000.0,
            &mut rng,
        );
        samples += 1;
        if let TickOutcome::Sampled { played, .. } = outcome {
            summary.rain_hits += 1;
            summary.rain_sounds += played as u64;
            covers.push(sampler.cover_factor());
        }
        if let Some(sink) = events.as_mut() {
            sink.write(&EventRecord::new(tick, "rain", outcome.label()))?;
        }

        for request in server.take_sounds().into_iter().chain(client_world.take_sounds()) {
            audio.play_sound_at(request);
        }
        audio.update();
        tick = tick.advance(1);
    }

    summary.pending_at_end = client.scheduler.len() as u64;
    summary.sounds_played = audio.history().count();
    if let Some(sink) = events.as_mut() {
        sink.flush()?;
    }

    if let Some(path) = &cfg.metrics {
        let mut report = MetricsReport::new("slidingwindows-headless");
        report.animation = Some(AnimationMetrics {
            toggles: summary.toggles,
            tasks_run: summary.tasks_run,
            tessellations: summary.tessellations,
            pending_at_end: summary.pending_at_end,
        });
        let mean_cover = if covers.is_empty() {
            0.0
        } else {
            covers.iter().sum::<f32>() / covers.len() as f32
        };
        report.rain = Some(RainMetrics {
            samples,
            hits: summary.rain_hits,
            sounds: summary.rain_sounds,
            mean_cover,
        });
        report.execution = ExecutionMetrics {
            ticks: cfg.ticks,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        MetricsSink::create(path)?.write(&report)?;
        info!("Wrote metrics to {}", path.display());
    }

    info!(
        leaves = summary.leaves,
        toggles = summary.toggles,
        rain_sounds = summary.rain_sounds,
        "headless run finished"
    );
    Ok(summary)
}

/// Place a pair of sliding windows, a tall window, a glass door and a
/// trapdoor around the player.
fn build_room(server: &mut MemoryWorld, player: &Player) -> Result<Room> {
    let placements = [
        ("slidingwindows:slidingwindow-glass", BlockPos::new(3, 64, 0), BlockFacing::West),
        ("slidingwindows:slidingwindow-glass", BlockPos::new(3, 64, 1), BlockFacing::West),
        ("slidingwindows:slidingwindow-tall", BlockPos::new(0, 64, 3), BlockFacing::North),
        ("slidingwindows:glassdoor-plain", BlockPos::new(-3, 64, 0), BlockFacing::East),
        ("slidingwindows:glasstrapdoor-leaded", BlockPos::new(0, 67, 0), BlockFacing::Down),
    ];

    let mut leaves = Vec::new();
    for (code, pos, face) in placements {
        let id = server
            .registry()
            .id_by_code(code)
            .with_context(|| format!("demo block {code} missing"))?;
        let selection = BlockSelection::at(pos, face, Vec3::splat(0.5));
        let origin = multiblock::try_place_block(&mut Api::server(server), player, &selection, id)
            .with_context(|| format!("failed to place {code} at {pos}"))?;
        leaves.push(origin);
    }
    Ok(Room { leaves })
}

/// Push every leaf the server marked dirty to the client.
fn replicate(server: &mut MemoryWorld, client_world: &mut MemoryWorld, client: &mut ClientApi) {
    for pos in server.take_dirty_entities() {
        let Some(leaf) = server.leaf(pos) else {
            continue;
        };
        let mut tree = TreeAttribute::new();
        leaf.to_tree(&mut tree);
        interaction::from_tree(&mut Api::client(client_world, client), pos, &tree);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_and_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = HeadlessConfig::new(dir.path().join("config"), 30);
        cfg.event_log = Some(dir.path().join("out/events.jsonl"));
        cfg.metrics = Some(dir.path().join("out/metrics.json"));

        let summary = run(cfg).unwrap();
        assert_eq!(summary.leaves, 5);
        assert!(summary.toggles >= 5);
        assert!(summary.tasks_run > 0);
        assert!(RainOnWindowsConfig::path_in(&dir.path().join("config")).exists());

        let metrics = std::fs::read_to_string(dir.path().join("out/metrics.json")).unwrap();
        assert!(metrics.contains("\"toggles\""));
        let events = std::fs::read_to_string(dir.path().join("out/events.jsonl")).unwrap();
        assert!(events.lines().any(|l| l.contains("\"toggle\"")));
        assert_eq!(events.lines().filter(|l| l.contains("\"rain\"")).count(), 30);
    }

    #[test]
    fn snow_never_taps_the_glass() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = HeadlessConfig::new(dir.path().to_path_buf(), 12);
        cfg.precipitation = PrecipitationType::Snow;
        let summary = run(cfg).unwrap();
        assert_eq!(summary.rain_sounds, 0);
        assert_eq!(summary.rain_hits, 0);
    }
}
