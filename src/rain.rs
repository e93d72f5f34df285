//! Rain-on-glass ambience.
//!
//! Every [`TICK_MS`] the sampler looks for glassy blocks around the player
//! and, while it is raining or hailing and the player is under cover, rolls
//! a quiet tapping sound on a few of them. A cover factor in `[-1, 1]`
//! smooths walking in and out of shelter: it climbs while under cover,
//! falls twice as fast outside, and at about `-1` the sampler stops doing
//! per-block work.

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use slidingwindows_audio::{SoundKind, SoundRequest};
use slidingwindows_core::{AssetLocation, BlockPos};
use slidingwindows_world::{read_weather, BlockAccessor, Player, PrecipitationType, WeatherSystem};

use crate::config::RainOnWindowsConfig;

/// Sampler period.
pub const TICK_MS: u64 = 400;
/// Horizontal search radius around the player, in blocks.
pub const SEARCH_RADIUS: i32 = 8;
/// Weaker precipitation is ignored.
pub const MIN_INTENSITY: f32 = 0.05;
/// Deepest position below the rain plane that still hears the rain.
pub const MAX_DEPTH_BELOW_RAIN: f32 = 8.0;
/// Cover factor gain per second under cover.
pub const RISE_SPEED: f32 = 2.0;
/// Cover factor loss per second outside.
pub const FALL_SPEED: f32 = 4.0;
/// Longest tick delta honored, so sleeps and teleports do not jump.
pub const MAX_DT: f32 = 0.5;
/// Hits per second per block at full intensity and cover.
pub const DESIRED_HITS_PER_SECOND: f32 = 0.3;
/// Rolloff distance of the emitted sounds.
pub const SOUND_RANGE: f32 = 16.0;
/// Candidate count at which the per-block chance is unscaled.
pub const BASELINE_WINDOWS: f32 = 8.0;

/// One glassy block near the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Block position.
    pub pos: BlockPos,
    /// Whether a leaf there is open.
    pub open: bool,
}

/// What one sampler tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TickOutcome {
    /// Disabled in the config.
    Disabled,
    /// Weather, player or chunk unavailable.
    NoWeather,
    /// Too little precipitation, or snow.
    Calm,
    /// No sound for this precipitation type.
    NoSoundKey,
    /// No glassy blocks in range.
    NoCandidates,
    /// Player has been outside long enough; nothing rolled.
    Exposed,
    /// Every candidate got a roll.
    Sampled {
        /// Candidates rolled.
        candidates: usize,
        /// Sounds played.
        played: usize,
    },
}

impl TickOutcome {
    /// Short name for logs and snapshots.
    pub fn label(&self) -> &'static str {
        match self {
            TickOutcome::Disabled => "disabled",
            TickOutcome::NoWeather => "no-weather",
            TickOutcome::Calm => "calm",
            TickOutcome::NoSoundKey => "no-sound-key",
            TickOutcome::NoCandidates => "no-candidates",
            TickOutcome::Exposed => "exposed",
            TickOutcome::Sampled { .. } => "sampled",
        }
    }
}

/// Sound location for `kind`, picking one of three variants.
pub fn sound_key<R: Rng + ?Sized>(kind: PrecipitationType, rng: &mut R) -> Option<String> {
    let variant = rng.gen_range(1..=3);
    match kind {
        PrecipitationType::Rain => Some(format!("slidingwindows:sounds/weather/rain-on-glass-{variant}")),
        PrecipitationType::Hail => Some(format!("slidingwindows:sounds/weather/hail-on-glass-{variant}")),
        PrecipitationType::Snow | PrecipitationType::Auto => None,
    }
}

/// Glassy blocks within [`SEARCH_RADIUS`] horizontally and from one below
/// to three above the player's feet.
pub fn scan_candidates(world: &dyn BlockAccessor, player: &Player, all_glass: bool) -> Vec<Candidate> {
    let center = player.block_pos();
    let mut out = Vec::new();
    for x in center.x - SEARCH_RADIUS..=center.x + SEARCH_RADIUS {
        for z in center.z - SEARCH_RADIUS..=center.z + SEARCH_RADIUS {
            for y in center.y - 1..=center.y + 3 {
                let pos = BlockPos::new(x, y, z);
                let block = world.block(pos);
                if block.is_air() || !block.is_glassy(all_glass) {
                    continue;
                }
                let open = world.leaf(pos).is_some_and(|leaf| leaf.is_open());
                out.push(Candidate { pos, open });
            }
        }
    }
    out
}

/// Whether an eye at `eye_y` is sheltered from rain falling to `rain_height`.
pub fn is_under_cover(rain_height: f32, eye_y: f32) -> bool {
    let depth = rain_height - eye_y;
    depth > 0.05 && depth <= MAX_DEPTH_BELOW_RAIN
}

/// Per-block chance multiplier for `count` candidates: `(8/n)^1.3` clamped
/// to `[0.25, 2]`.
pub fn window_normalization(count: usize) -> f32 {
    let n = count.max(1) as f32;
    (BASELINE_WINDOWS / n).powf(1.3).clamp(0.25, 2.0)
}

/// Multiplier favoring hits right after entering cover and fading them
/// after leaving.
pub fn entry_bias(cover: f32) -> f32 {
    if cover < 0.0 {
        1.0 - (-cover * 0.8).clamp(0.0, 0.8)
    } else {
        1.0 + (1.0 - cover.abs()) * 0.6
    }
}

/// The sampler with its cover hysteresis.
#[derive(Debug, Clone)]
pub struct RainOnWindows {
    config: RainOnWindowsConfig,
    cover_factor: f32,
}

impl RainOnWindows {
    /// Sampler starting from neutral cover.
    pub fn new(config: RainOnWindowsConfig) -> Self {
        Self {
            config,
            cover_factor: 0.0,
        }
    }

    /// Active config.
    pub fn config(&self) -> &RainOnWindowsConfig {
        &self.config
    }

    /// Swap in an edited config.
    pub fn set_config(&mut self, config: RainOnWindowsConfig) {
        self.config = config;
    }

    /// Current cover factor.
    pub fn cover_factor(&self) -> f32 {
        self.cover_factor
    }

    /// Step the cover factor. Returns `false` once the player has been
    /// outside long enough to skip sampling.
    pub fn update_cover(&mut self, under_cover: bool, dt: f32) -> bool {
        let dt = dt.min(MAX_DT);
        if under_cover {
            if self.cover_factor < 0.0 {
                self.cover_factor = 0.0;
            }
            self.cover_factor = (self.cover_factor + RISE_SPEED * dt).clamp(-1.0, 1.0);
            true
        } else {
            self.cover_factor = (self.cover_factor - FALL_SPEED * dt).clamp(-1.0, 1.0);
            self.cover_factor > -0.99
        }
    }

    /// One sampler tick of `dt` seconds.
    pub fn on_game_tick<R: Rng + ?Sized>(
        &mut self,
        world: &mut dyn BlockAccessor,
        weather: Option<&dyn WeatherSystem>,
        player: Option<&Player>,
        dt: f32,
        rng: &mut R,
    ) -> TickOutcome {
        if !self.config.enable_rain_sounds_on_windows {
            return TickOutcome::Disabled;
        }
        let Some(reading) = read_weather(weather, player) else {
            return TickOutcome::NoWeather;
        };
        if reading.intensity < MIN_INTENSITY || reading.kind == PrecipitationType::Snow {
            return TickOutcome::Calm;
        }
        let Some(location) = sound_key(reading.kind, rng).and_then(|key| AssetLocation::parse(&key).ok())
        else {
            debug!(kind = ?reading.kind, "no rain-on-glass sound for precipitation type");
            return TickOutcome::NoSoundKey;
        };
        let Some(player) = player else {
            return TickOutcome::NoWeather;
        };

        let candidates = scan_candidates(&*world, player, self.config.enable_rain_sounds_on_all_glass);
        if candidates.is_empty() {
            return TickOutcome::NoCandidates;
        }

        let feet = player.block_pos();
        let eye_y = player.position.y + player.local_eye_y;
        let rain_height = world.rain_map_height(feet.x, feet.z) as f32;
        if !self.update_cover(is_under_cover(rain_height, eye_y), dt) {
            debug!(cover = self.cover_factor, "player outside; skipping rain sampling");
            return TickOutcome::Exposed;
        }

        let intensity = reading.intensity;
        let strength = self.cover_factor.abs();
        let bias = entry_bias(self.cover_factor);
        let base_volume = 0.15 * intensity * strength * bias;
        let ticks_per_second = 1000.0 / TICK_MS as f32;
        let base_chance = DESIRED_HITS_PER_SECOND * intensity / ticks_per_second
            * window_normalization(candidates.len())
            * strength
            * bias;
        let volume_scale = self.config.effective_volume_scale();

        let mut played = 0;
        for candidate in &candidates {
            let chance = base_chance * if candidate.open { 1.3 } else { 1.0 };
            if rng.gen::<f64>() > chance as f64 {
                continue;
            }
            let openness = if candidate.open { 1.0 } else { 0.9 };
            let jitter_volume = 0.8 + rng.gen::<f32>() * 0.4;
            let jitter_pitch = rng.gen::<f32>() * 0.1 - 0.05;
            let pos = candidate.pos;
            world.play_sound_at(
                SoundRequest::new(location.clone(), [pos.x as f32 + 0.5, pos.y as f32, pos.z as f32 + 0.5])
                    .with_kind(SoundKind::Ambient)
                    .with_pitch(openness + jitter_pitch)
                    .with_range(SOUND_RANGE)
                    .with_volume(base_volume * openness * jitter_volume * volume_scale),
            );
            played += 1;
        }

        debug!(
            candidates = candidates.len(),
            played,
            cover = self.cover_factor,
            "rain-on-glass tick"
        );
        TickOutcome::Sampled {
            candidates: candidates.len(),
            played,
        }
    }
}
