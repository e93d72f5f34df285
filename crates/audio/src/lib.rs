//! Audio plumbing for slidingwindows.
//!
//! Behaviors describe what they want to hear as [`SoundRequest`]s and hand
//! them to a [`SoundPlayer`]. The [`AudioManager`] is the in-process player:
//! it applies distance falloff and the category volume from
//! [`AudioSettings`], keeps a short history of what played, and (with the
//! `rodio_backend` feature) sends loaded clips to the output device.
//!
//! # Example
//!
//! ```ignore
//! let mut audio = AudioManager::stub();
//! audio.set_listener_position([0.0, 64.0, 0.0]);
//! audio.play_sound_at(SoundRequest::new(loc, [0.5, 64.5, 0.5]));
//! ```

mod manager;
mod request;
mod settings;

pub use manager::{AudioManager, PlayedSound};
pub use request::{SoundKind, SoundPlayer, SoundRequest};
pub use settings::AudioSettings;
