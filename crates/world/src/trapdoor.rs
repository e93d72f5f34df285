//! Glass trapdoor orientation and geometry.

use glam::{Mat4, Vec2, Vec3};

use slidingwindows_assets::BlockType;
use slidingwindows_core::{mod_i32, Axis, BlockFacing, Cuboid, DEG2RAD, RAD2DEG};
use slidingwindows_render::around;

use crate::{BlockSelection, TrapdoorLeaf};

/// Suffix of the opened animator dict key.
pub const OPENED_DICT_SUFFIX: &str = "-open";

/// Animator dict key of the closed shape: `trapdoor-<style>`, falling back to
/// the block code path.
pub fn closed_dict_key(block: &BlockType) -> String {
    let style = block.style().unwrap_or_else(|| block.code.path());
    format!("trapdoor-{style}")
}

fn rot_rad(leaf: &TrapdoorLeaf) -> f32 {
    leaf.rot_deg as f32 * DEG2RAD
}

/// Facing while closed.
pub fn facing_when_closed(leaf: &TrapdoorLeaf) -> BlockFacing {
    let attached = leaf.attached_face;
    if attached.is_vertical() {
        return attached.opposite();
    }
    let hai = attached.horizontal_angle_index() as f32;
    BlockFacing::Down.face_when_rotated_by(0.0, hai * 90.0 * DEG2RAD + 90.0 * DEG2RAD, rot_rad(leaf))
}

/// Facing while open.
pub fn facing_when_opened(leaf: &TrapdoorLeaf) -> BlockFacing {
    let attached = leaf.attached_face;
    if attached.is_vertical() {
        let tilt = if attached.is_negative() { -90.0 } else { 90.0 };
        return attached
            .opposite()
            .face_when_rotated_by(tilt * DEG2RAD, 0.0, 0.0)
            .face_when_rotated_by(0.0, rot_rad(leaf), 0.0);
    }
    attached.opposite()
}

/// Model transform placing the authored trapdoor on its attachment face.
pub fn transform(leaf: &TrapdoorLeaf) -> Mat4 {
    let attached = leaf.attached_face;
    let rot = leaf.rot_deg as f32 * DEG2RAD;
    let inner = if attached.is_vertical() {
        let flip = if attached.is_negative() { 180.0 } else { 0.0 };
        Mat4::from_rotation_y(rot) * Mat4::from_rotation_z(flip * DEG2RAD)
    } else {
        let hai = attached.horizontal_angle_index() as f32;
        Mat4::from_rotation_y(hai * 90.0 * DEG2RAD)
            * Mat4::from_rotation_y(90.0 * DEG2RAD)
            * Mat4::from_rotation_z(rot)
    };
    around(Vec3::splat(0.5), inner)
}

/// Closed boxes are the collision boxes under [`transform`]; opened boxes are
/// swung 90 degrees about X first.
pub fn hitboxes(block: &BlockType, leaf: &TrapdoorLeaf) -> (Vec<Cuboid>, Vec<Cuboid>) {
    let tf = transform(leaf);
    let center = Vec3::splat(0.5);
    let closed = block
        .collision_boxes
        .iter()
        .map(|b| b.transformed_copy(&tf))
        .collect();
    let opened = block
        .collision_boxes
        .iter()
        .map(|b| b.rotated_copy(90.0, 0.0, 0.0, center).transformed_copy(&tf))
        .collect();
    (closed, opened)
}

/// Project a point onto the plane of `face`.
fn to_ab(face: BlockFacing, p: Vec3) -> Vec2 {
    match face.axis() {
        Axis::X => Vec2::new(p.y, p.z),
        Axis::Y => Vec2::new(p.x, p.z),
        Axis::Z => Vec2::new(p.x, p.y),
    }
}

/// Attachment face and rotation for a trapdoor placed at `selection`.
///
/// The rotation points from the hit position towards the face center,
/// snapped to 90 degrees; west and south faces are mirrored.
pub fn placement_orientation(selection: &BlockSelection) -> (BlockFacing, i32) {
    let face = selection.face;
    let center = to_ab(face, Vec3::splat(0.5));
    let hit = to_ab(face, selection.hit_position);
    let angle = RAD2DEG * (center.x - hit.x).atan2(center.y - hit.y);
    let mut rot_deg = (angle / 90.0).round_ties_even() as i32 * 90;
    if matches!(face, BlockFacing::West | BlockFacing::South) {
        rot_deg = -rot_deg;
    }
    (face, rot_deg)
}

/// Apply a world-edit rotation of `degrees` about Y.
pub fn on_transformed(leaf: &mut TrapdoorLeaf, degrees: i32) {
    let face = leaf.attached_face;
    if face.is_vertical() {
        leaf.rot_deg = mod_i32(leaf.rot_deg - degrees, 360);
    } else {
        let index = mod_i32(face.horizontal_angle_index() - degrees / 90, 4);
        leaf.attached_face = BlockFacing::HORIZONTALS_ANGLEORDER[index as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidingwindows_core::BlockPos;

    fn leaf(face: BlockFacing, rot_deg: i32) -> TrapdoorLeaf {
        TrapdoorLeaf {
            attached_face: face,
            rot_deg,
            ..TrapdoorLeaf::default()
        }
    }

    #[test]
    fn floor_trapdoor_faces_away_from_its_support() {
        let t = leaf(BlockFacing::Up, 0);
        assert_eq!(facing_when_closed(&t), BlockFacing::Down);
        assert!(facing_when_opened(&t).is_horizontal());
    }

    #[test]
    fn wall_trapdoor_opens_towards_the_wall() {
        let t = leaf(BlockFacing::North, 0);
        assert_eq!(facing_when_opened(&t), BlockFacing::South);
        assert_eq!(facing_when_closed(&t), BlockFacing::Down);
    }

    #[test]
    fn identity_transform_for_up_face_without_rotation() {
        let tf = transform(&leaf(BlockFacing::Up, 0));
        let p = tf.transform_point3(Vec3::new(0.1, 0.2, 0.3));
        assert!((p - Vec3::new(0.1, 0.2, 0.3)).length() < 1e-5);
    }

    #[test]
    fn hit_position_picks_the_rotation() {
        let sel = BlockSelection::at(BlockPos::new(0, 0, 0), BlockFacing::Up, Vec3::new(0.5, 1.0, 0.9));
        let (face, rot) = placement_orientation(&sel);
        assert_eq!(face, BlockFacing::Up);
        assert_eq!(rot.rem_euclid(360), 180);

        let sel = BlockSelection::at(BlockPos::new(0, 0, 0), BlockFacing::Up, Vec3::new(0.5, 1.0, 0.1));
        assert_eq!(placement_orientation(&sel).1, 0);
    }

    #[test]
    fn world_rotation_turns_the_rotation_or_the_face() {
        let mut floor = leaf(BlockFacing::Up, 90);
        on_transformed(&mut floor, 180);
        assert_eq!(floor.rot_deg, 270);

        let mut wall = leaf(BlockFacing::East, 0);
        on_transformed(&mut wall, 90);
        assert_eq!(wall.attached_face, BlockFacing::South);
    }

    #[test]
    fn dict_key_prefers_the_style_variant() {
        use slidingwindows_assets::{registry_from_str, BehaviorClasses};
        let registry = registry_from_str(
            r#"[{ "code": "x:trapdoor-clear", "variant": { "style": "framed" } },
                { "code": "x:trapdoor-plain" }]"#,
            &BehaviorClasses::new(),
        )
        .unwrap();
        let framed = registry.get_or_air(registry.id_by_code("x:trapdoor-clear").unwrap());
        let plain = registry.get_or_air(registry.id_by_code("x:trapdoor-plain").unwrap());
        assert_eq!(closed_dict_key(framed), "trapdoor-framed");
        assert_eq!(closed_dict_key(plain), "trapdoor-trapdoor-plain");
    }
}
