use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use slidingwindows_assets::BlockType;
use slidingwindows_core::{AssetLocation, Cuboid};
use tracing::{debug, warn};

use crate::{MeshData, MeshVertex, Shape};

/// Turns shapes into static block geometry.
pub trait Tessellator {
    /// Tessellate `shape` for `block`.
    fn tessellate_shape(&self, block: &BlockType, shape: &Shape) -> MeshData;
}

/// Resolves shape locations to loaded shapes.
pub trait ShapeLoader {
    /// Shape at `location`, if one is known.
    fn load_shape(&self, location: &AssetLocation) -> Option<Shape>;
}

/// Face layout: normal plus the four corners (as min/max selectors per axis).
const FACES: [([f32; 3], [[bool; 3]; 4]); 6] = [
    // north (-z)
    (
        [0.0, 0.0, -1.0],
        [
            [true, false, false],
            [false, false, false],
            [false, true, false],
            [true, true, false],
        ],
    ),
    // east (+x)
    (
        [1.0, 0.0, 0.0],
        [
            [true, false, true],
            [true, false, false],
            [true, true, false],
            [true, true, true],
        ],
    ),
    // south (+z)
    (
        [0.0, 0.0, 1.0],
        [
            [false, false, true],
            [true, false, true],
            [true, true, true],
            [false, true, true],
        ],
    ),
    // west (-x)
    (
        [-1.0, 0.0, 0.0],
        [
            [false, false, false],
            [false, false, true],
            [false, true, true],
            [false, true, false],
        ],
    ),
    // up (+y)
    (
        [0.0, 1.0, 0.0],
        [
            [false, true, true],
            [true, true, true],
            [true, true, false],
            [false, true, false],
        ],
    ),
    // down (-y)
    (
        [0.0, -1.0, 0.0],
        [
            [false, false, false],
            [true, false, false],
            [true, false, true],
            [false, false, true],
        ],
    ),
];

const UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

/// Emits one quad per face of every shape element (24 vertices, 36 indices).
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxTessellator;

impl BoxTessellator {
    fn push_element(mesh: &mut MeshData, element: &Cuboid) {
        let min = element.min();
        let max = element.max();
        for (normal, corners) in FACES.iter() {
            let base = mesh.vertices.len() as u32;
            for (corner, uv) in corners.iter().zip(UVS.iter()) {
                let pick = |use_max: bool, lo: f32, hi: f32| if use_max { hi } else { lo };
                mesh.vertices.push(MeshVertex {
                    position: [
                        pick(corner[0], min.x, max.x),
                        pick(corner[1], min.y, max.y),
                        pick(corner[2], min.z, max.z),
                    ],
                    normal: *normal,
                    uv: *uv,
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }
}

impl Tessellator for BoxTessellator {
    fn tessellate_shape(&self, _block: &BlockType, shape: &Shape) -> MeshData {
        tessellate_boxes(shape)
    }
}

/// Box geometry for every element of `shape`.
pub fn tessellate_boxes(shape: &Shape) -> MeshData {
    let mut mesh = MeshData::empty();
    for element in &shape.elements {
        BoxTessellator::push_element(&mut mesh, element);
    }
    mesh
}

/// In-memory shape table.
#[derive(Debug, Clone, Default)]
pub struct ShapeLibrary {
    shapes: HashMap<AssetLocation, Shape>,
}

impl ShapeLibrary {
    /// Empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a shape under its own code.
    pub fn insert(&mut self, shape: Shape) {
        self.shapes.insert(shape.code.clone(), shape);
    }

    /// Number of known shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// True when no shape is registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Parse a JSON array of shapes.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let shapes: Vec<Shape> = serde_json::from_str(input).context("invalid shape json")?;
        let mut library = Self::new();
        for shape in shapes {
            library.insert(shape);
        }
        debug!(count = library.len(), "loaded shapes");
        Ok(library)
    }

    /// Load a JSON array of shapes from disk.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read shapes from {}", path.display()))?;
        Self::from_json_str(&data)
    }
}

impl ShapeLoader for ShapeLibrary {
    fn load_shape(&self, location: &AssetLocation) -> Option<Shape> {
        let shape = self.shapes.get(location).cloned();
        if shape.is_none() {
            warn!(%location, "shape not found");
        }
        shape
    }
}
