use blake3::Hasher;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use slidingwindows_core::{AssetLocation, Cuboid};

/// Hash of the combined vertex/index buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHash(pub [u8; 32]);

/// Packed vertex layout produced by the tessellator.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Position in block-local coordinates.
    pub position: [f32; 3],
    /// Face normal (unit length).
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
}

/// Triangle-list mesh for one block instance or shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex buffer.
    pub vertices: Vec<MeshVertex>,
    /// Index buffer (triangle list).
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Construct an empty mesh.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append another mesh, rebasing its indices.
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Apply `matrix` to every position and normal in place.
    pub fn matrix_transform(&mut self, matrix: &Mat4) {
        for vertex in &mut self.vertices {
            let p = matrix.transform_point3(Vec3::from(vertex.position));
            vertex.position = p.to_array();
            let n = matrix.transform_vector3(Vec3::from(vertex.normal));
            vertex.normal = n.normalize_or_zero().to_array();
        }
    }

    /// Copy rotated by `rad_y` around `origin`.
    pub fn rotated_y(&self, origin: Vec3, rad_y: f32) -> Self {
        let mut copy = self.clone();
        copy.matrix_transform(&around(origin, Mat4::from_rotation_y(rad_y)));
        copy
    }

    /// Stable hash of the vertex + index buffers for cache comparisons.
    pub fn hash(&self) -> MeshHash {
        let mut hasher = Hasher::new();
        hasher.update(bytemuck::cast_slice(&self.vertices));
        hasher.update(bytemuck::cast_slice(&self.indices));
        MeshHash(*hasher.finalize().as_bytes())
    }
}

/// `inner` applied about `origin` instead of the local zero.
pub fn around(origin: Vec3, inner: Mat4) -> Mat4 {
    Mat4::from_translation(origin) * inner * Mat4::from_translation(-origin)
}

/// Loaded block shape: a set of axis-aligned elements plus the animation
/// clips it ships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Location the shape was loaded from.
    pub code: AssetLocation,
    /// Box elements in block-local space.
    pub elements: Vec<Cuboid>,
    /// Animation clip codes available on this shape.
    #[serde(default)]
    pub animations: Vec<String>,
}

impl Shape {
    /// Whether the shape ships a clip named `code`.
    pub fn has_animation(&self, code: &str) -> bool {
        self.animations.iter().any(|a| a == code)
    }
}
