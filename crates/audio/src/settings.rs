//! Mixer levels per sound category.

use serde::{Deserialize, Serialize};

use crate::SoundKind;

/// Levels the [`AudioManager`](crate::AudioManager) multiplies into every
/// sound after distance falloff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Scales every category.
    pub master: f32,
    /// Door, window and trapdoor effects.
    pub blocks: f32,
    /// Rain on glass and other ambience.
    pub ambient: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master: 1.0,
            blocks: 1.0,
            ambient: 0.7,
        }
    }
}

impl AudioSettings {
    /// Level for sounds of `kind`, clamped to `[0, 1]`.
    pub fn effective_volume(&self, kind: SoundKind) -> f32 {
        let category = match kind {
            SoundKind::Sound => self.blocks,
            SoundKind::Ambient => self.ambient,
        };
        (self.master * category).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambience_sits_below_block_effects() {
        let settings = AudioSettings::default();
        assert_eq!(settings.effective_volume(SoundKind::Sound), 1.0);
        assert!((settings.effective_volume(SoundKind::Ambient) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn master_scales_and_levels_clamp() {
        let settings = AudioSettings {
            master: 0.5,
            blocks: 0.6,
            ambient: 4.0,
        };
        assert!((settings.effective_volume(SoundKind::Sound) - 0.3).abs() < 1e-6);
        assert_eq!(settings.effective_volume(SoundKind::Ambient), 1.0);
    }

    #[test]
    fn missing_keys_keep_their_defaults() {
        let settings: AudioSettings = serde_json::from_str(r#"{ "ambient": 0.2 }"#).unwrap();
        assert_eq!(settings.master, 1.0);
        assert_eq!(settings.ambient, 0.2);
    }
}
