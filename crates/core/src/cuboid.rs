//! Axis-aligned boxes in block-local space.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned box used for collision and selection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cuboid {
    /// Minimum X.
    pub x1: f32,
    /// Minimum Y.
    pub y1: f32,
    /// Minimum Z.
    pub z1: f32,
    /// Maximum X.
    pub x2: f32,
    /// Maximum Y.
    pub y2: f32,
    /// Maximum Z.
    pub z2: f32,
}

impl Cuboid {
    /// Construct from two corners; components are sorted so `x1 <= x2` etc.
    pub fn new(x1: f32, y1: f32, z1: f32, x2: f32, y2: f32, z2: f32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            z1: z1.min(z2),
            x2: x1.max(x2),
            y2: y1.max(y2),
            z2: z1.max(z2),
        }
    }

    /// The full unit cube.
    pub fn unit() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0)
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x1, self.y1, self.z1)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x2, self.y2, self.z2)
    }

    /// Copy transformed by `matrix`, re-fitted to an axis-aligned box.
    pub fn transformed_copy(&self, matrix: &Mat4) -> Self {
        let (lo, hi) = (self.min(), self.max());
        let mut out_min = Vec3::splat(f32::MAX);
        let mut out_max = Vec3::splat(f32::MIN);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            let p = matrix.transform_point3(corner);
            out_min = out_min.min(p);
            out_max = out_max.max(p);
        }
        Self::new(out_min.x, out_min.y, out_min.z, out_max.x, out_max.y, out_max.z).snapped()
    }

    /// Copy rotated by the given degrees (X then Y then Z) around `origin`.
    pub fn rotated_copy(&self, deg_x: f32, deg_y: f32, deg_z: f32, origin: Vec3) -> Self {
        let matrix = Mat4::from_translation(origin)
            * Mat4::from_rotation_x(deg_x.to_radians())
            * Mat4::from_rotation_y(deg_y.to_radians())
            * Mat4::from_rotation_z(deg_z.to_radians())
            * Mat4::from_translation(-origin);
        self.transformed_copy(&matrix)
    }

    /// Copy shifted by an offset.
    pub fn translated(&self, dx: f32, dy: f32, dz: f32) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            z1: self.z1 + dz,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
            z2: self.z2 + dz,
        }
    }

    /// Copy reflected across the plane `x = center_x`.
    pub fn mirrored_x(&self, center_x: f32) -> Self {
        Self {
            x1: 2.0 * center_x - self.x2,
            x2: 2.0 * center_x - self.x1,
            ..*self
        }
    }

    /// Compare with a tolerance.
    pub fn approx_eq(&self, other: &Cuboid, eps: f32) -> bool {
        (self.x1 - other.x1).abs() <= eps
            && (self.y1 - other.y1).abs() <= eps
            && (self.z1 - other.z1).abs() <= eps
            && (self.x2 - other.x2).abs() <= eps
            && (self.y2 - other.y2).abs() <= eps
            && (self.z2 - other.z2).abs() <= eps
    }

    // Rotations by quarter turns leave ~1e-7 noise on the corners.
    fn snapped(self) -> Self {
        let snap = |v: f32| (v * 10_000.0).round() / 10_000.0;
        Self {
            x1: snap(self.x1),
            y1: snap(self.y1),
            z1: snap(self.z1),
            x2: snap(self.x2),
            y2: snap(self.y2),
            z2: snap(self.z2),
        }
    }
}
