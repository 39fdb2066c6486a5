//! Geometry primitives: vectors, axis-aligned boxes, rigid transforms.

use nalgebra::{Matrix3, Matrix4};
use serde::{Deserialize, Serialize};

/// 3D vector (metres).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3f {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Axis-aligned bounding box. `min` is inclusive, `max` is the upper bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3f,
    pub max: Vec3f,
}

impl Aabb {
    pub const fn new(min: Vec3f, max: Vec3f) -> Self {
        Self { min, max }
    }

    /// `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn size(&self) -> Vec3f {
        Vec3f::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }

    pub fn volume(&self) -> f32 {
        let s = self.size();
        s.x * s.y * s.z
    }
}

/// Rigid SE(3) transform stored as a row-major 4x4 matrix.
///
/// Serialized as four rows of four numbers:
///
/// ```toml
/// T_node_lidar = [[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1]]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f32; 4]; 4]", into = "[[f32; 4]; 4]")]
pub struct TransformSe3 {
    pub m: [f32; 16],
}

impl TransformSe3 {
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Pure translation.
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        let mut t = Self::IDENTITY;
        t.m[3] = x;
        t.m[7] = y;
        t.m[11] = z;
        t
    }

    /// Entry at `(row, col)`.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.m[row * 4 + col]
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_row_slice(&self.m)
    }

    pub fn is_finite(&self) -> bool {
        self.m.iter().all(|v| v.is_finite())
    }

    /// Bottom row is `[0, 0, 0, 1]` and the rotation block is orthonormal
    /// with determinant +1, within `tolerance`.
    pub fn is_rigid(&self, tolerance: f32) -> bool {
        if !self.is_finite() {
            return false;
        }
        let m = self.to_matrix();
        let bottom_ok = m[(3, 0)].abs() <= tolerance
            && m[(3, 1)].abs() <= tolerance
            && m[(3, 2)].abs() <= tolerance
            && (m[(3, 3)] - 1.0).abs() <= tolerance;
        if !bottom_ok {
            return false;
        }

        let r: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).into_owned();
        let gram = r.transpose() * r;
        let orthonormal = (gram - Matrix3::identity()).iter().all(|v| v.abs() <= tolerance);
        orthonormal && (r.determinant() - 1.0).abs() <= tolerance
    }
}

impl Default for TransformSe3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[[f32; 4]; 4]> for TransformSe3 {
    fn from(rows: [[f32; 4]; 4]) -> Self {
        let mut m = [0.0; 16];
        for (r, row) in rows.iter().enumerate() {
            m[r * 4..r * 4 + 4].copy_from_slice(row);
        }
        Self { m }
    }
}

impl From<TransformSe3> for [[f32; 4]; 4] {
    fn from(t: TransformSe3) -> Self {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(&t.m[r * 4..r * 4 + 4]);
        }
        rows
    }
}
