#![warn(missing_docs)]
//! Client-side mesh and animation plumbing for door and window leaves.
//!
//! Nothing here draws pixels. The crate defines the host seams a leaf needs
//! (shape loading, tessellation, a per-instance animator) together with
//! headless implementations, the shared per-block-type [`MeshCache`] and the
//! [`FrameScheduler`] that sequences the open/close mesh swap.

mod animator;
mod cache;
mod mesh;
mod scheduler;
mod tessellator;

pub use animator::{AnimationMetaData, AnimationUtil, HeadlessAnimator, RendererState};
pub use cache::{MeshCache, MeshSet};
pub use mesh::{around, MeshData, MeshHash, MeshVertex, Shape};
pub use scheduler::{CallbackId, FrameScheduler};
pub use tessellator::{tessellate_boxes, BoxTessellator, ShapeLibrary, ShapeLoader, Tessellator};

/// Animation clip used by content without an opened shape.
pub const LEGACY_OPENED_ANIMATION: &str = "opened";

/// Ease speed used when a block configures none.
pub const DEFAULT_EASE_SPEED: f32 = 10.0;

/// How many clip durations the static mesh stays hidden after a toggle.
pub const ANIMATION_BUFFER_MULTIPLIER: f64 = 6.0;

/// Delay between the final tessellation pass and stopping the clips.
pub const ANIMATION_FINISH_DELAY_MS: u64 = 30;

/// Nominal clip duration for an ease speed: `1000 / ease`.
pub fn base_duration_ms(ease_speed: f32) -> f64 {
    let ease = if ease_speed > 0.0 {
        ease_speed
    } else {
        DEFAULT_EASE_SPEED
    };
    1000.0 / ease as f64
}

/// Delay before the resting static mesh is restored.
pub fn static_mesh_restore_delay_ms(ease_speed: f32) -> u64 {
    (base_duration_ms(ease_speed) * ANIMATION_BUFFER_MULTIPLIER) as u64
}

/// Which animator track a toggle plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimTrack {
    /// Closed to open.
    Opening,
    /// Open to closed.
    Closing,
}

impl AnimTrack {
    /// Track that moves a leaf into the `open` state.
    pub fn towards(open: bool) -> Self {
        if open {
            AnimTrack::Opening
        } else {
            AnimTrack::Closing
        }
    }

    /// The track expected after this one finishes.
    pub fn next(self) -> Self {
        match self {
            AnimTrack::Opening => AnimTrack::Closing,
            AnimTrack::Closing => AnimTrack::Opening,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ease_gives_six_hundred_ms_buffer() {
        assert_eq!(base_duration_ms(10.0), 100.0);
        assert_eq!(static_mesh_restore_delay_ms(10.0), 600);
        assert_eq!(static_mesh_restore_delay_ms(0.0), 600);
        assert_eq!(static_mesh_restore_delay_ms(4.0), 1500);
    }

    #[test]
    fn tracks_alternate() {
        assert_eq!(AnimTrack::towards(true), AnimTrack::Opening);
        assert_eq!(AnimTrack::Opening.next(), AnimTrack::Closing);
    }
}
