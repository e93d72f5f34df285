//! Rain-on-glass sampler scenarios on an in-memory client world.

use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec3;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use slidingwindows::headless::DEMO_BLOCKS;
use slidingwindows::rain::{scan_candidates, window_normalization, RainOnWindows, TickOutcome, TICK_MS};
use slidingwindows::{RainOnWindowsConfig, SlidingWindowsModSystem};
use slidingwindows_audio::SoundKind;
use slidingwindows_core::{scoped_rng, BlockPos};
use slidingwindows_testkit::{run_micro_worldtest, MicroWorldtestConfig};
use slidingwindows_world::{
    interaction, Api, BlockAccessor, ClientApi, GameMode, MemoryWorld, Player, PrecipitationType, WeatherToggle,
};

const UNDER_ROOF: i32 = 70;
const OPEN_SKY: i32 = 60;
const WINDOW: &str = "slidingwindows:slidingwindow-glass";
const ROOF: &str = "slidingwindows:roof";
const PANE: &str = "slidingwindows:glasspane-plain";

struct Room {
    world: MemoryWorld,
    sampler: RainOnWindows,
    weather: WeatherToggle,
    player: Player,
    rain_height: i32,
    last: Option<TickOutcome>,
}

impl Room {
    fn new(config: RainOnWindowsConfig) -> Self {
        let registry = Arc::new(SlidingWindowsModSystem.load_blocks_str(DEMO_BLOCKS).unwrap());
        let mut world = MemoryWorld::client(registry);
        world.set_default_rain_height(UNDER_ROOF);
        Self {
            world,
            sampler: RainOnWindows::new(config),
            weather: WeatherToggle::raining(1.0),
            player: Player::new(Vec3::new(0.5, 64.0, 0.5), GameMode::Survival),
            rain_height: UNDER_ROOF,
            last: None,
        }
    }

    fn put(&mut self, code: &str, pos: BlockPos) {
        let id = self.world.registry().id_by_code(code).unwrap();
        self.world.set_block(id, pos);
    }

    fn set_rain_height(&mut self, height: i32) {
        self.rain_height = height;
        self.world.set_default_rain_height(height);
    }

    fn tick(&mut self, rng: &mut StdRng) -> TickOutcome {
        let outcome = self.sampler.on_game_tick(
            &mut self.world,
            Some(&self.weather),
            Some(&self.player),
            TICK_MS as f32 / 1000.0,
            rng,
        );
        self.last = Some(outcome);
        outcome
    }
}

#[derive(Serialize)]
struct CoverSnapshot {
    cover: f64,
    outcome: Option<&'static str>,
    under_cover: bool,
}

fn golden(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/snapshots")
        .join(format!("{name}.json"))
}

#[test]
fn cover_factor_timeline_matches_golden() {
    let mut room = Room::new(RainOnWindowsConfig::default());
    room.put(WINDOW, BlockPos::new(2, 64, 0));

    run_micro_worldtest(
        MicroWorldtestConfig::new("rain_cover_timeline", 12, TICK_MS, golden("rain_cover_timeline")),
        room,
        |tick, _dt_ms, room| {
            let outside = (5..8).contains(&tick.0);
            room.set_rain_height(if outside { OPEN_SKY } else { UNDER_ROOF });
            let mut rng = scoped_rng(7, 0, tick);
            room.tick(&mut rng);
        },
        |_, room| CoverSnapshot {
            cover: (f64::from(room.sampler.cover_factor()) * 1000.0).round() / 1000.0,
            outcome: room.last.map(|o| o.label()),
            under_cover: room.rain_height == UNDER_ROOF,
        },
    )
    .unwrap();
}

#[test]
fn sounds_are_ambient_and_centered_on_the_glass() {
    let mut room = Room::new(RainOnWindowsConfig::default());
    let pos = BlockPos::new(-3, 65, 2);
    room.put(WINDOW, pos);

    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        room.tick(&mut rng);
    }
    let sounds = room.world.take_sounds();
    assert!(!sounds.is_empty());
    for sound in &sounds {
        assert_eq!(sound.kind, SoundKind::Ambient);
        assert_eq!(sound.position, [-2.5, 65.0, 2.5]);
        assert_eq!(sound.range, 16.0);
        assert!(sound.pitch >= 0.85 && sound.pitch <= 0.95, "closed window pitch {}", sound.pitch);
        assert!(sound
            .location
            .to_string()
            .starts_with("slidingwindows:sounds/weather/rain-on-glass-"));
    }
}

#[test]
fn open_windows_sound_higher() {
    let mut room = Room::new(RainOnWindowsConfig::default());
    let pos = BlockPos::new(2, 64, 0);
    room.put(WINDOW, pos);
    interaction::toggle(
        &mut Api::client(&mut room.world, &mut ClientApi::headless(Default::default())),
        pos,
        true,
        false,
    );
    room.world.take_sounds();

    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        room.tick(&mut rng);
    }
    let sounds = room.world.take_sounds();
    assert!(!sounds.is_empty());
    assert!(sounds.iter().all(|s| s.pitch >= 0.95 && s.pitch <= 1.05));
}

#[test]
fn plain_glass_needs_the_all_glass_switch() {
    let mut rng = StdRng::seed_from_u64(5);
    let pane = BlockPos::new(1, 64, 1);

    let mut strict = Room::new(RainOnWindowsConfig::default());
    strict.put(ROOF, BlockPos::new(1, 65, 1));
    strict.put(PANE, pane);
    assert_eq!(strict.tick(&mut rng), TickOutcome::NoCandidates);

    let mut lenient = Room::new(RainOnWindowsConfig {
        enable_rain_sounds_on_all_glass: true,
        ..Default::default()
    });
    lenient.put(ROOF, BlockPos::new(1, 65, 1));
    lenient.put(PANE, pane);
    assert!(matches!(lenient.tick(&mut rng), TickOutcome::Sampled { candidates: 1, .. }));
}

#[test]
fn candidates_outside_the_search_box_are_ignored() {
    let mut room = Room::new(RainOnWindowsConfig::default());
    let mut rng = StdRng::seed_from_u64(9);
    room.put(WINDOW, BlockPos::new(9, 64, 0));
    room.put(WINDOW, BlockPos::new(0, 68, 0));
    room.put(WINDOW, BlockPos::new(0, 62, 0));
    assert_eq!(room.tick(&mut rng), TickOutcome::NoCandidates);

    room.put(WINDOW, BlockPos::new(8, 67, -8));
    room.put(WINDOW, BlockPos::new(-8, 63, 8));
    assert!(matches!(room.tick(&mut rng), TickOutcome::Sampled { candidates: 2, .. }));
}

#[test]
fn search_box_centre_truncates_toward_zero() {
    let mut room = Room::new(RainOnWindowsConfig::default());
    room.player = Player::new(Vec3::new(-0.5, 64.0, -0.5), GameMode::Survival);
    // Centred on (0, 64, 0): x and z span -8..=8.
    room.put(WINDOW, BlockPos::new(8, 64, 8));
    room.put(WINDOW, BlockPos::new(-9, 64, 0));
    room.put(WINDOW, BlockPos::new(0, 64, -9));

    let found: Vec<BlockPos> = scan_candidates(&room.world, &room.player, false)
        .into_iter()
        .map(|c| c.pos)
        .collect();
    assert_eq!(found, vec![BlockPos::new(8, 64, 8)]);
}

#[test]
fn early_outs_leave_the_cover_alone() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut room = Room::new(RainOnWindowsConfig {
        enable_rain_sounds_on_windows: false,
        ..Default::default()
    });
    room.put(WINDOW, BlockPos::new(2, 64, 0));
    assert_eq!(room.tick(&mut rng), TickOutcome::Disabled);

    let mut room = Room::new(RainOnWindowsConfig::default());
    room.put(WINDOW, BlockPos::new(2, 64, 0));
    room.weather.forced_type = PrecipitationType::Snow;
    assert_eq!(room.tick(&mut rng), TickOutcome::Calm);
    room.weather.forced_type = PrecipitationType::Hail;
    room.weather.chunk_loaded = false;
    assert_eq!(room.tick(&mut rng), TickOutcome::NoWeather);
    room.weather.chunk_loaded = true;
    room.weather.intensity = 0.01;
    assert_eq!(room.tick(&mut rng), TickOutcome::Calm);
    assert_eq!(room.sampler.cover_factor(), 0.0);

    room.weather.intensity = 1.0;
    assert!(matches!(room.tick(&mut rng), TickOutcome::Sampled { .. }));
    assert!(room.sampler.cover_factor() > 0.0);
}

#[test]
fn volume_scale_zero_mutes_every_hit() {
    let mut room = Room::new(RainOnWindowsConfig {
        volume_scale: 0.0,
        ..Default::default()
    });
    room.put(WINDOW, BlockPos::new(2, 64, 0));
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..100 {
        room.tick(&mut rng);
    }
    let sounds = room.world.take_sounds();
    assert!(!sounds.is_empty());
    assert!(sounds.iter().all(|s| s.volume == 0.0));
}

proptest! {
    #[test]
    fn normalization_is_bounded_and_non_increasing(n in 0usize..500) {
        let here = window_normalization(n);
        prop_assert!((0.25..=2.0).contains(&here));
        prop_assert!(window_normalization(n + 1) <= here);
    }

    #[test]
    fn cover_stays_in_range_and_settles(steps in proptest::collection::vec((any::<bool>(), 0.0f32..3.0), 1..40)) {
        let mut sampler = RainOnWindows::new(RainOnWindowsConfig::default());
        for (under, dt) in &steps {
            sampler.update_cover(*under, *dt);
            prop_assert!((-1.0..=1.0).contains(&sampler.cover_factor()));
        }
        // Two capped ticks under cover always reach full strength.
        sampler.update_cover(true, 0.5);
        sampler.update_cover(true, 0.5);
        prop_assert_eq!(sampler.cover_factor(), 1.0);
    }
}
