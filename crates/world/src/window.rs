//! Sliding window geometry and tuning.

use glam::Vec3;

use slidingwindows_assets::BlockType;
use slidingwindows_core::{Cuboid, Vec3i, RAD2DEG};

use crate::Pairing;

/// Pitch of the open sound.
pub const OPEN_PITCH: f32 = 0.8;
/// Pitch of the close sound.
pub const CLOSE_PITCH: f32 = 0.7;
/// Suffix of the opened animator dict key.
pub const OPENED_DICT_SUFFIX: &str = "-alt";

/// Closed and opened box sets.
///
/// Collision boxes are read as `[frame, sash closed, sash open]`; missing
/// entries fall back to the previous one (the frame to an empty box). The
/// boxes already span the whole footprint, so they are only mirrored and
/// rotated, never stacked per cell.
pub fn hitboxes(block: &BlockType, pairing: &Pairing) -> (Vec<Cuboid>, Vec<Cuboid>) {
    let all = &block.collision_boxes;
    let frame = all.first().copied().unwrap_or_default();
    let sash_closed = all.get(1).copied().unwrap_or(frame);
    let sash_open = all.get(2).copied().unwrap_or(sash_closed);

    let mut closed = vec![frame, sash_closed];
    let mut opened = vec![frame, sash_open];

    if pairing.invert {
        for b in closed.iter_mut().chain(opened.iter_mut()) {
            *b = b.mirrored_x(0.5);
        }
    }

    let height = block.attributes.footprint_height() as f32;
    let origin = Vec3::new(0.5, height / 2.0, 0.5);
    let deg_y = pairing.rotate_y_rad * RAD2DEG;
    let rotate = |boxes: Vec<Cuboid>| -> Vec<Cuboid> {
        boxes
            .into_iter()
            .map(|b| b.rotated_copy(0.0, deg_y, 0.0, origin))
            .collect()
    };

    (rotate(closed), rotate(opened))
}

/// Boxes of a filler cell: the controller's current boxes shifted into the
/// filler's local space.
pub fn filler_boxes(controller_boxes: &[Cuboid], offset_inv: Vec3i) -> Vec<Cuboid> {
    controller_boxes
        .iter()
        .map(|b| b.translated(offset_inv.x as f32, offset_inv.y as f32, offset_inv.z as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidingwindows_assets::{registry_from_str, BehaviorClasses, BehaviorKind};
    use std::f32::consts::FRAC_PI_2;

    fn window(boxes: &str) -> BlockType {
        let mut classes = BehaviorClasses::new();
        classes.register_block_behavior_class("SlidingWindow", BehaviorKind::SlidingWindow);
        let json = format!(
            r#"[{{ "code": "x:window", "behavior": "SlidingWindow",
                  "attributes": {{ "width": 1, "height": 2 }},
                  "collisionBoxes": {boxes} }}]"#
        );
        let registry = registry_from_str(&json, &classes).unwrap();
        registry
            .get_or_air(registry.id_by_code("x:window").unwrap())
            .clone()
    }

    const BOXES: &str = r#"[
        {"x1":0,"y1":0,"z1":0.4,"x2":1,"y2":2,"z2":0.6},
        {"x1":0,"y1":0,"z1":0.45,"x2":1,"y2":1,"z2":0.55},
        {"x1":0,"y1":1,"z1":0.45,"x2":1,"y2":2,"z2":0.55}
    ]"#;

    #[test]
    fn unrotated_boxes_keep_the_authored_layout() {
        let (closed, opened) = hitboxes(&window(BOXES), &Pairing::default());
        assert_eq!(closed.len(), 2);
        assert!(closed[1].approx_eq(&Cuboid::new(0.0, 0.0, 0.45, 1.0, 1.0, 0.55), 1e-5));
        assert!(opened[1].approx_eq(&Cuboid::new(0.0, 1.0, 0.45, 1.0, 2.0, 0.55), 1e-5));
        assert_ne!(closed, opened);
    }

    #[test]
    fn missing_boxes_fall_back_in_order() {
        let single = r#"[{"x1":0,"y1":0,"z1":0.4,"x2":1,"y2":2,"z2":0.6}]"#;
        let (closed, opened) = hitboxes(&window(single), &Pairing::default());
        assert_eq!(closed, opened);
        assert_eq!(closed[0], closed[1]);
    }

    #[test]
    fn quarter_turn_swaps_x_and_z_extents() {
        let pairing = Pairing {
            rotate_y_rad: FRAC_PI_2,
            ..Pairing::default()
        };
        let (closed, _) = hitboxes(&window(BOXES), &pairing);
        let frame = closed[0];
        assert!((frame.x2 - frame.x1 - 0.2).abs() < 1e-5);
        assert!((frame.z2 - frame.z1 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn inverted_boxes_mirror_around_the_controller_column() {
        let asymmetric = r#"[{"x1":0,"y1":0,"z1":0.4,"x2":2,"y2":2,"z2":0.6}]"#;
        let pairing = Pairing {
            invert: true,
            ..Pairing::default()
        };
        let (closed, _) = hitboxes(&window(asymmetric), &pairing);
        assert!(closed[0].approx_eq(&Cuboid::new(-1.0, 0.0, 0.4, 1.0, 2.0, 0.6), 1e-5));
    }

    #[test]
    fn filler_boxes_shift_by_the_inverse_offset() {
        let boxes = [Cuboid::new(0.0, 0.0, 0.4, 1.0, 2.0, 0.6)];
        let shifted = filler_boxes(&boxes, Vec3i::new(0, -1, 0));
        assert!(shifted[0].approx_eq(&Cuboid::new(0.0, -1.0, 0.4, 1.0, 1.0, 0.6), 1e-6));
    }
}
