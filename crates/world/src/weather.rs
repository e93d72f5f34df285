//! Weather queries for the rain-on-glass sampler.
//!
//! The host weather system is consumed through [`WeatherSystem`];
//! [`WeatherToggle`] is the deterministic in-memory implementation used by
//! tests and the headless demo.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use slidingwindows_core::BlockPos;

use crate::Player;

/// What is falling from the sky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrecipitationType {
    /// Undecided; derived from temperature.
    #[default]
    Auto,
    /// Rain.
    Rain,
    /// Snow.
    Snow,
    /// Hail.
    Hail,
}

/// Host weather queries.
pub trait WeatherSystem {
    /// Whether the chunk the player stands in is loaded.
    fn player_chunk_loaded(&self) -> bool;

    /// Raw precipitation level at `pos`; callers clamp to `[0, 1]`.
    fn precipitation_at(&self, pos: Vec3) -> f32;

    /// Precipitation type of the blended weather snapshot, when a snapshot exists.
    fn blended_precipitation_type(&self) -> Option<PrecipitationType>;

    /// Precipitation type from the slow-access weather lookup, when available.
    fn slow_access_precipitation_type(&self, pos: Vec3) -> Option<PrecipitationType>;

    /// Current temperature in degrees Celsius at `pos`.
    fn temperature_at(&self, pos: BlockPos) -> f32;
}

/// Resolved weather at the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherReading {
    /// Precipitation type; never [`PrecipitationType::Auto`].
    pub kind: PrecipitationType,
    /// Intensity in `[0, 1]`.
    pub intensity: f32,
}

/// Weather at the player, or `None` when the weather system, the player or
/// the player's chunk is unavailable.
///
/// The type comes from the blended snapshot when set, then the slow-access
/// lookup, then temperature (at or below zero is snow).
pub fn read_weather(
    weather: Option<&dyn WeatherSystem>,
    player: Option<&Player>,
) -> Option<WeatherReading> {
    let weather = weather?;
    if !weather.player_chunk_loaded() {
        debug!("player chunk not loaded");
        return None;
    }
    let player = player?;
    let pos = player.position;

    let intensity = weather.precipitation_at(pos).clamp(0.0, 1.0);

    let mut kind = match weather.blended_precipitation_type() {
        Some(kind) if kind != PrecipitationType::Auto => kind,
        _ => weather
            .slow_access_precipitation_type(pos)
            .unwrap_or(PrecipitationType::Auto),
    };

    if kind == PrecipitationType::Auto {
        let temperature = weather.temperature_at(player.block_pos());
        kind = if temperature <= 0.0 {
            PrecipitationType::Snow
        } else {
            PrecipitationType::Rain
        };
    }

    Some(WeatherReading { kind, intensity })
}

/// Coarse weather state driving [`WeatherToggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WeatherState {
    /// Clear skies, no precipitation.
    #[default]
    Clear,
    /// Active precipitation.
    Precipitation,
    /// Heavy precipitation; intensity reads at least [`STORM_INTENSITY`].
    Thunderstorm,
}

/// Lower bound on intensity during a thunderstorm.
pub const STORM_INTENSITY: f32 = 0.9;

/// Deterministic in-memory weather.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherToggle {
    /// Current weather state.
    pub state: WeatherState,
    /// Precipitation level while precipitating.
    pub intensity: f32,
    /// Type reported by the blended snapshot; `Auto` defers to temperature.
    pub forced_type: PrecipitationType,
    /// Ambient temperature.
    pub temperature: f32,
    /// Whether the player's chunk counts as loaded.
    pub chunk_loaded: bool,
}

impl WeatherToggle {
    /// Clear, mild weather with the player's chunk loaded.
    pub fn new() -> Self {
        Self {
            state: WeatherState::Clear,
            intensity: 0.0,
            forced_type: PrecipitationType::Auto,
            temperature: 15.0,
            chunk_loaded: true,
        }
    }

    /// Steady rain at `intensity`.
    pub fn raining(intensity: f32) -> Self {
        Self {
            state: WeatherState::Precipitation,
            intensity,
            ..Self::new()
        }
    }

    /// Set the weather state, returning the transition when it changed.
    pub fn set_state(&mut self, state: WeatherState) -> Option<WeatherChanged> {
        let from = self.state;
        self.state = state;
        (from != state).then(|| WeatherChanged::new(from, state))
    }

    /// Toggle between clear and precipitation.
    pub fn toggle(&mut self) -> Option<WeatherChanged> {
        let next = match self.state {
            WeatherState::Clear => WeatherState::Precipitation,
            WeatherState::Precipitation | WeatherState::Thunderstorm => WeatherState::Clear,
        };
        self.set_state(next)
    }

    /// Check if currently raining/snowing/hailing.
    pub fn is_precipitating(&self) -> bool {
        matches!(
            self.state,
            WeatherState::Precipitation | WeatherState::Thunderstorm
        )
    }
}

impl Default for WeatherToggle {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherSystem for WeatherToggle {
    fn player_chunk_loaded(&self) -> bool {
        self.chunk_loaded
    }

    fn precipitation_at(&self, _pos: Vec3) -> f32 {
        match self.state {
            WeatherState::Clear => 0.0,
            WeatherState::Precipitation => self.intensity,
            WeatherState::Thunderstorm => self.intensity.max(STORM_INTENSITY),
        }
    }

    fn blended_precipitation_type(&self) -> Option<PrecipitationType> {
        Some(self.forced_type)
    }

    fn slow_access_precipitation_type(&self, _pos: Vec3) -> Option<PrecipitationType> {
        None
    }

    fn temperature_at(&self, _pos: BlockPos) -> f32 {
        self.temperature
    }
}

/// Event emitted when weather changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherChanged {
    /// Previous weather state.
    pub from: WeatherState,
    /// New weather state.
    pub to: WeatherState,
}

impl WeatherChanged {
    /// Create a weather change event.
    pub fn new(from: WeatherState, to: WeatherState) -> Self {
        Self { from, to }
    }
}
