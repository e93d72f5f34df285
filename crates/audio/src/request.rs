//! Positional sound requests.

use serde::{Deserialize, Serialize};
use slidingwindows_core::AssetLocation;

/// Volume category a sound is mixed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundKind {
    /// Block and interaction effects.
    Sound,
    /// Environmental ambience (rain, wind).
    Ambient,
}

/// One positional sound to play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundRequest {
    /// Clip to play.
    pub location: AssetLocation,
    /// World-space emitter position.
    pub position: [f32; 3],
    /// Mixer category.
    pub kind: SoundKind,
    /// Playback speed multiplier.
    pub pitch: f32,
    /// Distance at which the sound falls silent.
    pub range: f32,
    /// Base volume before falloff and settings.
    pub volume: f32,
}

impl SoundRequest {
    /// Block sound with default pitch, range 32 and full volume.
    pub fn new(location: AssetLocation, position: [f32; 3]) -> Self {
        Self {
            location,
            position,
            kind: SoundKind::Sound,
            pitch: 1.0,
            range: 32.0,
            volume: 1.0,
        }
    }

    /// Set the mixer category.
    pub fn with_kind(mut self, kind: SoundKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the pitch.
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Set the falloff range.
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    /// Set the base volume.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

/// Anything that can play positional sounds.
pub trait SoundPlayer {
    /// Queue `request` for playback.
    fn play_sound_at(&mut self, request: SoundRequest);
}

impl SoundPlayer for Vec<SoundRequest> {
    fn play_sound_at(&mut self, request: SoundRequest) {
        self.push(request);
    }
}
