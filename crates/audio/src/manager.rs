//! Audio manager for positional block and ambient sounds.

use crate::{AudioSettings, SoundPlayer, SoundRequest};
use anyhow::Result;
use glam::Vec3;
use slidingwindows_core::AssetLocation;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

#[cfg(feature = "rodio_backend")]
mod backend {
    use super::*;
    use anyhow::Context;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Audio data for a loaded sound.
    pub struct SoundData {
        /// Raw audio bytes
        pub data: Vec<u8>,
    }

    /// Backend state for rodio audio.
    pub struct BackendState {
        /// Output stream (must be kept alive)
        pub _stream: OutputStream,
        /// Stream handle for creating sinks
        pub stream_handle: OutputStreamHandle,
        /// Active one-shot sounds
        pub active_sounds: Arc<Mutex<Vec<Sink>>>,
    }

    impl BackendState {
        pub fn new() -> Result<Self> {
            let (stream, stream_handle) =
                OutputStream::try_default().context("Failed to create audio output stream")?;

            Ok(Self {
                _stream: stream,
                stream_handle,
                active_sounds: Arc::new(Mutex::new(Vec::new())),
            })
        }

        pub fn play_sound(&self, data: &SoundData, volume: f32, pitch: f32) -> Result<()> {
            let cursor = Cursor::new(data.data.clone());
            let source = rodio::Decoder::new(cursor).context("Failed to decode audio")?;

            let sink = Sink::try_new(&self.stream_handle).context("Failed to create audio sink")?;
            sink.set_volume(volume);
            sink.append(source.speed(pitch));

            if let Ok(mut active) = self.active_sounds.lock() {
                active.retain(|s| !s.empty());
                active.push(sink);
            }

            Ok(())
        }

        pub fn update(&mut self) {
            if let Ok(mut active) = self.active_sounds.lock() {
                active.retain(|s| !s.empty());
            }
        }

        pub fn active_sound_count(&self) -> usize {
            self.active_sounds.lock().map(|a| a.len()).unwrap_or(0)
        }

        pub fn stop_all(&mut self) {
            if let Ok(mut active) = self.active_sounds.lock() {
                for sink in active.drain(..) {
                    sink.stop();
                }
            }
        }
    }
}

#[cfg(not(feature = "rodio_backend"))]
mod backend {
    use super::*;

    /// Audio data for a loaded sound (stub).
    #[allow(dead_code)]
    pub struct SoundData {
        /// Raw audio bytes (unused in stub mode)
        pub data: Vec<u8>,
    }

    /// Backend state stub when rodio is not available.
    pub struct BackendState;

    impl BackendState {
        pub fn new() -> Result<Self> {
            debug!("Audio backend: stub (no rodio)");
            Ok(Self)
        }

        pub fn play_sound(&self, _data: &SoundData, _volume: f32, _pitch: f32) -> Result<()> {
            Ok(())
        }

        pub fn update(&mut self) {}

        pub fn active_sound_count(&self) -> usize {
            0
        }

        pub fn stop_all(&mut self) {}
    }
}

use backend::{BackendState, SoundData};
use std::sync::Arc;

/// How many played sounds the manager remembers.
const HISTORY_LEN: usize = 256;

/// A sound that reached the mixer, with its final volume.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayedSound {
    /// Original request.
    pub request: SoundRequest,
    /// Volume after falloff and settings.
    pub effective_volume: f32,
}

/// Main audio manager.
///
/// Uses rodio for output when the `rodio_backend` feature is enabled.
pub struct AudioManager {
    /// Backend state
    backend: Option<BackendState>,
    /// Current audio settings
    settings: AudioSettings,
    /// Loaded clips keyed by location
    sounds: HashMap<AssetLocation, Arc<SoundData>>,
    /// Listener position for 3D audio
    listener_pos: [f32; 3],
    /// Most recent audible sounds, oldest first
    history: VecDeque<PlayedSound>,
}

impl AudioManager {
    /// Create a new audio manager.
    ///
    /// Falls back to a stub if audio initialization fails.
    pub fn new() -> Result<Self> {
        let backend = match BackendState::new() {
            Ok(b) => {
                debug!("Audio manager initialized");
                Some(b)
            }
            Err(e) => {
                tracing::warn!("Failed to initialize audio: {}. Using stub.", e);
                None
            }
        };

        Ok(Self {
            backend,
            ..Self::stub()
        })
    }

    /// Create a stub audio manager that doesn't actually play audio.
    ///
    /// Useful for testing or headless operation.
    pub fn stub() -> Self {
        Self {
            backend: None,
            settings: AudioSettings::default(),
            sounds: HashMap::new(),
            listener_pos: [0.0, 64.0, 0.0],
            history: VecDeque::new(),
        }
    }

    /// Check if audio playback is available.
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Replace the mixer levels.
    pub fn with_settings(mut self, settings: AudioSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the listener position for 3D audio.
    pub fn set_listener_position(&mut self, pos: [f32; 3]) {
        self.listener_pos = pos;
    }

    /// Load a clip into memory.
    pub fn load_sound(&mut self, location: AssetLocation, data: Vec<u8>) {
        debug!("Loaded sound: {}", location);
        self.sounds.insert(location, Arc::new(SoundData { data }));
    }

    /// Sounds that reached the mixer, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &PlayedSound> {
        self.history.iter()
    }

    /// Forget the playback history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Linear distance falloff times the category volume.
    fn calculate_volume(&self, request: &SoundRequest) -> f32 {
        let distance = Vec3::from(request.position).distance(Vec3::from(self.listener_pos));
        if request.range <= 0.0 || distance >= request.range {
            return 0.0;
        }

        let falloff = 1.0 - (distance / request.range);
        request.volume * falloff * self.settings.effective_volume(request.kind)
    }

    /// Update audio state (call once per frame).
    pub fn update(&mut self) {
        if let Some(backend) = &mut self.backend {
            backend.update();
        }
    }

    /// Get the number of currently playing sounds.
    pub fn active_sound_count(&self) -> usize {
        self.backend
            .as_ref()
            .map(|b| b.active_sound_count())
            .unwrap_or(0)
    }

    /// Stop all sounds.
    pub fn stop_all(&mut self) {
        if let Some(backend) = &mut self.backend {
            backend.stop_all();
        }
    }
}

impl SoundPlayer for AudioManager {
    fn play_sound_at(&mut self, request: SoundRequest) {
        let volume = self.calculate_volume(&request);
        if volume < 0.001 {
            return; // Too quiet to hear
        }

        if let Some(sound_data) = self.sounds.get(&request.location) {
            if let Some(backend) = &self.backend {
                if let Err(e) = backend.play_sound(sound_data.as_ref(), volume, request.pitch) {
                    tracing::warn!("Failed to play sound {}: {}", request.location, e);
                }
            }
        } else {
            debug!("Sound not loaded: {}", request.location);
        }

        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(PlayedSound {
            request,
            effective_volume: volume,
        });
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::stub()
    }
}
