//! Per-instance leaf state: the closed set of door, window and trapdoor
//! block entities.

use bitflags::bitflags;

use slidingwindows_assets::{BehaviorKind, BlockType};
use slidingwindows_core::{BlockFacing, Cuboid, TreeAttribute, Vec3i};
use slidingwindows_render::{CallbackId, MeshData};

use crate::{door, trapdoor, window};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    /// Render-side switches of one leaf.
    pub struct VisualFlags: u8 {
        /// Add the resting static mesh on tessellation.
        const TESSELLATE_STATIC = 0b0000_0001;
        /// The animator mesh is being drawn.
        const RENDER_ANIMATION = 0b0000_0010;
        /// The next tessellation pass should wind the animation down.
        const STOPS_SOON = 0b0000_0100;
    }
}

impl Default for VisualFlags {
    fn default() -> Self {
        VisualFlags::TESSELLATE_STATIC
    }
}

/// Client-side visual state of a leaf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafVisuals {
    /// Pipeline switches.
    pub flags: VisualFlags,
    /// Oriented resting mesh handed to the tessellator.
    pub static_mesh: Option<MeshData>,
    /// Pending timed callbacks owned by this leaf.
    pub callbacks: Vec<CallbackId>,
}

/// State shared by every leaf kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafState {
    /// Open flag.
    pub open: bool,
    /// Collision/selection boxes while closed.
    pub boxes_closed: Vec<Cuboid>,
    /// Collision/selection boxes while open.
    pub boxes_opened: Vec<Cuboid>,
    /// Render-side state.
    pub visuals: LeafVisuals,
}

/// Orientation and partner links of a pairable leaf.
///
/// Partners are offsets from this leaf's controller to the partner's
/// controller. They are resolved through the world on every access.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pairing {
    /// Yaw in radians, a multiple of 90 degrees.
    pub rotate_y_rad: f32,
    /// Mirrored handedness.
    pub invert: bool,
    /// Offset to the left partner.
    pub left: Option<Vec3i>,
    /// Offset to the right partner.
    pub right: Option<Vec3i>,
}

impl Pairing {
    /// Facing of the closed leaf.
    pub fn facing(&self) -> BlockFacing {
        BlockFacing::horizontal_from_yaw(self.rotate_y_rad)
    }

    /// Yaw with handedness applied, used for meshes and renderers.
    pub fn mesh_yaw(&self) -> f32 {
        if self.invert {
            -self.rotate_y_rad
        } else {
            self.rotate_y_rad
        }
    }

    /// Whether either partner offset is set.
    pub fn has_partner(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }

    fn read(&mut self, tree: &TreeAttribute, left_key: &str, right_key: &str) {
        self.rotate_y_rad = tree.get_float("rotateYRad");
        self.invert = tree.get_bool("invertHandles");
        self.left = tree.get_vec3i(left_key);
        self.right = tree.get_vec3i(right_key);
    }

    fn write(&self, tree: &mut TreeAttribute, left_key: &str, right_key: &str) {
        tree.set_float("rotateYRad", self.rotate_y_rad);
        tree.set_bool("invertHandles", self.invert);
        match self.left {
            Some(offset) => tree.set_vec3i(left_key, offset),
            None => {
                tree.remove(left_key);
            }
        }
        match self.right {
            Some(offset) => tree.set_vec3i(right_key, offset),
            None => {
                tree.remove(right_key);
            }
        }
    }
}

/// Which partner slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    /// Partner towards `facing.cw()`.
    Left,
    /// Partner towards `facing.ccw()`.
    Right,
}

impl Hand {
    /// Search direction for a leaf facing `facing`.
    pub fn direction(self, facing: BlockFacing) -> BlockFacing {
        match self {
            Hand::Left => facing.cw(),
            Hand::Right => facing.ccw(),
        }
    }

    /// The other slot.
    pub fn other(self) -> Self {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// Sliding window leaf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowLeaf {
    /// Shared state.
    pub state: LeafState,
    /// Orientation and partners.
    pub pairing: Pairing,
}

/// Glass door leaf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoorLeaf {
    /// Shared state.
    pub state: LeafState,
    /// Orientation and partners.
    pub pairing: Pairing,
    /// Story lock carried through saves untouched.
    pub story_locked_code: Option<String>,
}

/// Glass trapdoor leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapdoorLeaf {
    /// Shared state.
    pub state: LeafState,
    /// Face of the block the trapdoor hangs on.
    pub attached_face: BlockFacing,
    /// Rotation in degrees, a multiple of 90.
    pub rot_deg: i32,
}

impl Default for TrapdoorLeaf {
    fn default() -> Self {
        Self {
            state: LeafState::default(),
            attached_face: BlockFacing::North,
            rot_deg: 0,
        }
    }
}

/// One door, window or trapdoor block entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// Multiblock sliding window.
    SlidingWindow(WindowLeaf),
    /// Multiblock glass door.
    Door(DoorLeaf),
    /// Single-cell glass trapdoor.
    Trapdoor(TrapdoorLeaf),
}

impl Leaf {
    /// Fresh closed leaf of `kind`.
    pub fn new(kind: BehaviorKind) -> Self {
        match kind {
            BehaviorKind::SlidingWindow => Leaf::SlidingWindow(WindowLeaf::default()),
            BehaviorKind::GlassDoor => Leaf::Door(DoorLeaf::default()),
            BehaviorKind::GlassTrapdoor => Leaf::Trapdoor(TrapdoorLeaf::default()),
        }
    }

    /// Fresh leaf for `block`, when it carries a behavior.
    pub fn for_block(block: &BlockType) -> Option<Self> {
        block.behavior.map(Self::new)
    }

    /// Behavior kind.
    pub fn kind(&self) -> BehaviorKind {
        match self {
            Leaf::SlidingWindow(_) => BehaviorKind::SlidingWindow,
            Leaf::Door(_) => BehaviorKind::GlassDoor,
            Leaf::Trapdoor(_) => BehaviorKind::GlassTrapdoor,
        }
    }

    /// Shared state.
    pub fn state(&self) -> &LeafState {
        match self {
            Leaf::SlidingWindow(w) => &w.state,
            Leaf::Door(d) => &d.state,
            Leaf::Trapdoor(t) => &t.state,
        }
    }

    /// Mutable shared state.
    pub fn state_mut(&mut self) -> &mut LeafState {
        match self {
            Leaf::SlidingWindow(w) => &mut w.state,
            Leaf::Door(d) => &mut d.state,
            Leaf::Trapdoor(t) => &mut t.state,
        }
    }

    /// Open flag.
    pub fn is_open(&self) -> bool {
        self.state().open
    }

    /// Orientation and partners; trapdoors have none.
    pub fn pairing(&self) -> Option<&Pairing> {
        match self {
            Leaf::SlidingWindow(w) => Some(&w.pairing),
            Leaf::Door(d) => Some(&d.pairing),
            Leaf::Trapdoor(_) => None,
        }
    }

    /// Mutable orientation and partners.
    pub fn pairing_mut(&mut self) -> Option<&mut Pairing> {
        match self {
            Leaf::SlidingWindow(w) => Some(&mut w.pairing),
            Leaf::Door(d) => Some(&mut d.pairing),
            Leaf::Trapdoor(_) => None,
        }
    }

    /// Mirrored handedness; trapdoors are never inverted.
    pub fn invert(&self) -> bool {
        self.pairing().is_some_and(|p| p.invert)
    }

    /// Partner offset in `hand`.
    pub fn partner_offset(&self, hand: Hand) -> Option<Vec3i> {
        let pairing = self.pairing()?;
        match hand {
            Hand::Left => pairing.left,
            Hand::Right => pairing.right,
        }
    }

    /// Set or clear the partner offset in `hand`.
    pub fn set_partner_offset(&mut self, hand: Hand, offset: Option<Vec3i>) {
        if let Some(pairing) = self.pairing_mut() {
            match hand {
                Hand::Left => pairing.left = offset,
                Hand::Right => pairing.right = offset,
            }
        }
    }

    /// Facing while closed.
    pub fn facing_when_closed(&self) -> BlockFacing {
        match self {
            Leaf::SlidingWindow(w) => w.pairing.facing(),
            Leaf::Door(d) => d.pairing.facing(),
            Leaf::Trapdoor(t) => trapdoor::facing_when_closed(t),
        }
    }

    /// Facing while open.
    pub fn facing_when_opened(&self) -> BlockFacing {
        match self {
            Leaf::SlidingWindow(w) => w.pairing.facing(),
            Leaf::Door(d) => door::facing_when_opened(&d.pairing),
            Leaf::Trapdoor(t) => trapdoor::facing_when_opened(t),
        }
    }

    /// Boxes for the current state.
    pub fn col_sel_boxes(&self) -> &[Cuboid] {
        let state = self.state();
        if state.open {
            &state.boxes_opened
        } else {
            &state.boxes_closed
        }
    }

    /// Whether `face` of the controller cell is a solid side.
    pub fn is_side_solid(&self, face: BlockFacing) -> bool {
        let open = self.is_open();
        match self {
            Leaf::SlidingWindow(w) => !open && face == w.pairing.facing(),
            Leaf::Door(_) | Leaf::Trapdoor(_) => {
                (!open && face == self.facing_when_closed())
                    || (open && face == self.facing_when_opened())
            }
        }
    }

    /// Recompute both box sets from `block`'s collision boxes.
    pub fn update_hitboxes(&mut self, block: &BlockType) {
        let (closed, opened) = match self {
            Leaf::SlidingWindow(w) => window::hitboxes(block, &w.pairing),
            Leaf::Door(d) => door::hitboxes(block, &d.pairing),
            Leaf::Trapdoor(t) => trapdoor::hitboxes(block, t),
        };
        let state = self.state_mut();
        state.boxes_closed = closed;
        state.boxes_opened = opened;
    }

    /// Write the persisted fields.
    pub fn to_tree(&self, tree: &mut TreeAttribute) {
        match self {
            Leaf::SlidingWindow(w) => {
                w.pairing.write(tree, "leftWindowPos", "rightWindowPos");
                tree.set_bool("isOpen", w.state.open);
            }
            Leaf::Door(d) => {
                d.pairing.write(tree, "leftDoorPos", "rightDoorPos");
                tree.set_bool("isOpen", d.state.open);
                match &d.story_locked_code {
                    Some(code) => tree.set_string("storyLockedCode", code.clone()),
                    None => {
                        tree.remove("storyLockedCode");
                    }
                }
            }
            Leaf::Trapdoor(t) => {
                tree.set_int("attachedFace", t.attached_face.index() as i32);
                tree.set_int("rotDeg", t.rot_deg);
                tree.set_bool("opened", t.state.open);
            }
        }
    }

    /// Read the persisted fields; visual state is left alone.
    ///
    /// Doors and windows accept the legacy `opened` key alongside `isOpen`.
    pub fn read_tree(&mut self, tree: &TreeAttribute) {
        match self {
            Leaf::SlidingWindow(w) => {
                w.pairing.read(tree, "leftWindowPos", "rightWindowPos");
                w.state.open = tree.get_bool("opened") || tree.get_bool("isOpen");
            }
            Leaf::Door(d) => {
                d.pairing.read(tree, "leftDoorPos", "rightDoorPos");
                d.state.open = tree.get_bool("isOpen") || tree.get_bool("opened");
                d.story_locked_code = tree.get_string("storyLockedCode").map(str::to_string);
            }
            Leaf::Trapdoor(t) => {
                t.attached_face =
                    BlockFacing::from_index(tree.get_int("attachedFace")).unwrap_or(BlockFacing::North);
                t.rot_deg = tree.get_int("rotDeg");
                t.state.open = tree.get_bool("opened");
            }
        }
    }

    /// Build a leaf of `kind` from a saved tree.
    pub fn from_tree(kind: BehaviorKind, tree: &TreeAttribute) -> Self {
        let mut leaf = Self::new(kind);
        leaf.read_tree(tree);
        leaf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_reads_legacy_opened_key() {
        let mut tree = TreeAttribute::new();
        tree.set_bool("opened", true);
        let leaf = Leaf::from_tree(BehaviorKind::SlidingWindow, &tree);
        assert!(leaf.is_open());

        let mut out = TreeAttribute::new();
        leaf.to_tree(&mut out);
        assert!(out.get_bool("isOpen"));
        assert!(!out.contains("opened"));
    }

    #[test]
    fn partner_offsets_survive_the_tree() {
        let mut leaf = Leaf::new(BehaviorKind::GlassDoor);
        leaf.set_partner_offset(Hand::Right, Some(Vec3i::new(-2, 0, 0)));
        if let Leaf::Door(door) = &mut leaf {
            door.pairing.invert = true;
            door.story_locked_code = Some("crypt".into());
        }

        let mut tree = TreeAttribute::new();
        leaf.to_tree(&mut tree);
        let bytes = tree.to_bytes().unwrap();
        let back = Leaf::from_tree(
            BehaviorKind::GlassDoor,
            &TreeAttribute::from_bytes(&bytes).unwrap(),
        );

        assert_eq!(back.partner_offset(Hand::Right), Some(Vec3i::new(-2, 0, 0)));
        assert_eq!(back.partner_offset(Hand::Left), None);
        assert!(back.invert());
        let Leaf::Door(door) = back else {
            panic!("expected a door");
        };
        assert_eq!(door.story_locked_code.as_deref(), Some("crypt"));
    }

    #[test]
    fn cleared_partner_removes_its_key() {
        let mut leaf = Leaf::new(BehaviorKind::SlidingWindow);
        leaf.set_partner_offset(Hand::Left, Some(Vec3i::new(1, 0, 0)));
        let mut tree = TreeAttribute::new();
        leaf.to_tree(&mut tree);
        assert!(tree.contains("leftWindowPos"));

        leaf.set_partner_offset(Hand::Left, None);
        leaf.to_tree(&mut tree);
        assert!(!tree.contains("leftWindowPos"));
    }

    #[test]
    fn window_is_solid_only_on_its_facing_while_closed() {
        let leaf = Leaf::new(BehaviorKind::SlidingWindow);
        assert!(leaf.is_side_solid(BlockFacing::North));
        assert!(!leaf.is_side_solid(BlockFacing::South));

        let mut open = leaf.clone();
        open.state_mut().open = true;
        assert!(!open.is_side_solid(BlockFacing::North));
    }

    #[test]
    fn trapdoors_have_no_pairing() {
        let mut leaf = Leaf::new(BehaviorKind::GlassTrapdoor);
        leaf.set_partner_offset(Hand::Left, Some(Vec3i::new(1, 0, 0)));
        assert!(leaf.pairing().is_none());
        assert!(!leaf.invert());
    }
}
