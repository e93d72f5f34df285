use std::collections::{BTreeMap, HashMap};

use slidingwindows_core::{AssetLocation, Cuboid, Vec3i};
use tracing::debug;

use crate::{AssetError, BehaviorClasses, BehaviorKind, BlockAttributes, BlockDefinition, BlockMaterial};

/// Numeric block id; index into the registry.
pub type BlockId = u16;

/// Id of the implicit air block.
pub const BLOCK_AIR: BlockId = 0;

/// Code prefix of multiblock filler blocks.
pub const FILLER_PREFIX: &str = "multiblock-monolithic-";

/// Encode a controller-to-filler offset as a filler block code path,
/// e.g. `(1, 0, -1)` becomes `multiblock-monolithic-p1-0-n1`.
pub fn filler_code(offset: Vec3i) -> String {
    fn part(v: i32) -> String {
        match v {
            v if v < 0 => format!("n{}", -v),
            v if v > 0 => format!("p{v}"),
            _ => "0".to_string(),
        }
    }
    format!(
        "{FILLER_PREFIX}{}-{}-{}",
        part(offset.x),
        part(offset.y),
        part(offset.z)
    )
}

/// Inverse of [`filler_code`]; accepts a bare path or a domain-qualified code.
pub fn parse_filler_code(code: &str) -> Option<Vec3i> {
    let path = code.split_once(':').map(|(_, p)| p).unwrap_or(code);
    let rest = path.strip_prefix(FILLER_PREFIX)?;
    let mut parts = rest.split('-');
    let mut next = || -> Option<i32> {
        let raw = parts.next()?;
        if raw == "0" {
            return Some(0);
        }
        let (sign, digits) = match raw.split_at(1) {
            ("p", d) => (1, d),
            ("n", d) => (-1, d),
            _ => return None,
        };
        digits.parse::<i32>().ok().filter(|v| *v > 0).map(|v| sign * v)
    };
    let offset = Vec3i::new(next()?, next()?, next()?);
    if parts.next().is_some() {
        return None;
    }
    Some(offset)
}

/// Fully resolved block type.
#[derive(Debug, Clone)]
pub struct BlockType {
    /// Numeric id.
    pub id: BlockId,
    /// Domain-qualified code.
    pub code: AssetLocation,
    /// Door/window/trapdoor behavior, if any.
    pub behavior: Option<BehaviorKind>,
    /// Material class.
    pub material: BlockMaterial,
    /// Closed-state shape.
    pub shape: Option<AssetLocation>,
    /// Local collision boxes as authored.
    pub collision_boxes: Vec<Cuboid>,
    /// Whether placement may overwrite this cell.
    pub replaceable: bool,
    /// Variant key/value pairs.
    pub variant: BTreeMap<String, String>,
    /// Behavior tuning.
    pub attributes: BlockAttributes,
    /// Controller-to-filler offset for multiblock fillers.
    pub filler_offset: Option<Vec3i>,
}

impl BlockType {
    /// True for the implicit air block.
    pub fn is_air(&self) -> bool {
        self.id == BLOCK_AIR
    }

    /// True for multiblock fillers.
    pub fn is_filler(&self) -> bool {
        self.filler_offset.is_some()
    }

    /// Offset from a filler back to its controller.
    pub fn offset_inv(&self) -> Option<Vec3i> {
        self.filler_offset.map(|o| -o)
    }

    /// Whether placing a block may overwrite this one.
    pub fn is_replaceable(&self) -> bool {
        self.is_air() || self.replaceable
    }

    /// `style` variant, if any.
    pub fn style(&self) -> Option<&str> {
        self.variant.get("style").map(String::as_str)
    }

    /// Rain-on-glass candidate test.
    pub fn is_glassy(&self, all_glass: bool) -> bool {
        self.attributes.is_glassy() || (all_glass && self.material == BlockMaterial::Glass)
    }

    fn air() -> Self {
        Self {
            id: BLOCK_AIR,
            code: AssetLocation::from_parts(slidingwindows_core::DEFAULT_DOMAIN, "air"),
            behavior: None,
            material: BlockMaterial::Air,
            shape: None,
            collision_boxes: Vec::new(),
            replaceable: true,
            variant: BTreeMap::new(),
            attributes: BlockAttributes::default(),
            filler_offset: None,
        }
    }
}

/// Registry storing block types keyed by id.
///
/// Id 0 is always air. Filler types are interned for every offset any
/// registered multiblock can produce.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    types: Vec<BlockType>,
    code_to_id: HashMap<AssetLocation, BlockId>,
    filler_ids: HashMap<Vec3i, BlockId>,
}

impl BlockRegistry {
    /// Build from pack definitions, resolving behavior class names.
    pub fn from_definitions(
        defs: Vec<BlockDefinition>,
        classes: &BehaviorClasses,
    ) -> Result<Self, AssetError> {
        let mut registry = Self {
            types: vec![BlockType::air()],
            code_to_id: HashMap::new(),
            filler_ids: HashMap::new(),
        };
        registry
            .code_to_id
            .insert(registry.types[0].code.clone(), BLOCK_AIR);

        let mut max_width = 1;
        let mut max_height = 1;

        for def in defs {
            let code = AssetLocation::parse(&def.code)?;
            let behavior = match def.behavior.as_deref() {
                Some(class) => Some(classes.block_behavior(class).ok_or_else(|| {
                    AssetError::UnknownBehavior {
                        code: code.to_string(),
                        class: class.to_string(),
                    }
                })?),
                None => None,
            };
            if let Some(class) = def.entity_behavior.as_deref() {
                let entity = classes.entity_behavior(class).ok_or_else(|| {
                    AssetError::UnknownBehavior {
                        code: code.to_string(),
                        class: class.to_string(),
                    }
                })?;
                if behavior != Some(entity) {
                    return Err(AssetError::MismatchedBehavior(code.to_string()));
                }
            }
            let shape = def.shape.as_deref().map(AssetLocation::parse).transpose()?;

            if behavior.is_some() {
                max_width = max_width.max(def.attributes.footprint_width());
                max_height = max_height.max(def.attributes.footprint_height());
            }

            registry.insert(BlockType {
                id: 0,
                code,
                behavior,
                material: def.material,
                shape,
                collision_boxes: def.collision_boxes,
                replaceable: def.replaceable,
                variant: def.variant,
                attributes: def.attributes,
                filler_offset: None,
            })?;
        }

        registry.intern_fillers(max_width, max_height)?;
        Ok(registry)
    }

    fn insert(&mut self, mut block: BlockType) -> Result<BlockId, AssetError> {
        if self.code_to_id.contains_key(&block.code) {
            return Err(AssetError::Duplicate(block.code.to_string()));
        }
        let id = self.types.len() as BlockId;
        block.id = id;
        self.code_to_id.insert(block.code.clone(), id);
        if let Some(offset) = block.filler_offset {
            self.filler_ids.insert(offset, id);
        }
        self.types.push(block);
        Ok(id)
    }

    fn intern_fillers(&mut self, max_width: i32, max_height: i32) -> Result<(), AssetError> {
        let reach = max_width - 1;
        for dx in -reach..=reach {
            for dy in 0..max_height {
                for dz in -reach..=reach {
                    let offset = Vec3i::new(dx, dy, dz);
                    if offset.is_zero() {
                        continue;
                    }
                    let code = AssetLocation::parse(&filler_code(offset))?;
                    self.insert(BlockType {
                        id: 0,
                        code,
                        behavior: None,
                        material: BlockMaterial::Other,
                        shape: None,
                        collision_boxes: Vec::new(),
                        replaceable: false,
                        variant: BTreeMap::new(),
                        attributes: BlockAttributes::default(),
                        filler_offset: Some(offset),
                    })?;
                }
            }
        }
        debug!(count = self.filler_ids.len(), "interned multiblock fillers");
        Ok(())
    }

    /// Look up a block type by numeric id.
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.types.get(id as usize)
    }

    /// Block type by id, falling back to air for unknown ids.
    pub fn get_or_air(&self, id: BlockId) -> &BlockType {
        self.types.get(id as usize).unwrap_or(&self.types[0])
    }

    /// Resolve a block id by its code (bare paths use the default domain).
    pub fn id_by_code(&self, code: &str) -> Option<BlockId> {
        let loc = AssetLocation::parse(code).ok()?;
        self.code_to_id.get(&loc).copied()
    }

    /// Filler block encoding `offset` (controller to filler).
    pub fn filler_block(&self, offset: Vec3i) -> Option<BlockId> {
        self.filler_ids.get(&offset).copied()
    }

    /// Number of registered block types (air and fillers included).
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: air is registered implicitly.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate all block types in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.types.iter()
    }
}
