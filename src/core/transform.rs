//! Rigid 4x4 transform (position + orientation in session space).
//!
//! Storage is column-major, matching the layout the tracking subsystem and
//! the cross-platform bridge use when a transform travels as 16 numbers:
//!
//! ```text
//! | c0.x c1.x c2.x c3.x |     rotation in columns 0..3
//! | c0.y c1.y c2.y c3.y |     translation in column 3
//! | c0.z c1.z c2.z c3.z |
//! |  0    0    0    1   |
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Mul;

use super::vector::Vec3;

/// Rigid transform in session space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Columns, each `[x, y, z, w]`
    pub cols: [[f32; 4]; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Transform = Transform {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Pure translation
    pub fn from_translation(position: Vec3) -> Self {
        let mut t = Self::IDENTITY;
        t.cols[3] = [position.x, position.y, position.z, 1.0];
        t
    }

    /// Rotation about the X axis (radians, right-handed)
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Transform {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Rotation about the Y (up) axis (radians, right-handed)
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Transform {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Build from 16 column-major values.
    ///
    /// Returns `None` if the slice does not hold exactly 16 finite values.
    pub fn from_column_major(values: &[f32]) -> Option<Self> {
        if values.len() != 16 || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let mut cols = [[0.0f32; 4]; 4];
        for (i, chunk) in values.chunks_exact(4).enumerate() {
            cols[i].copy_from_slice(chunk);
        }
        Some(Transform { cols })
    }

    /// Flatten to 16 column-major values
    pub fn to_column_major(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for (i, col) in self.cols.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(col);
        }
        out
    }

    /// Translation component
    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.cols[3][0], self.cols[3][1], self.cols[3][2])
    }

    /// Copy of this transform with a different translation
    pub fn with_position(&self, position: Vec3) -> Self {
        let mut t = *self;
        t.cols[3] = [position.x, position.y, position.z, 1.0];
        t
    }

    /// Map a point from this transform's local frame into the parent frame
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let c = &self.cols;
        Vec3::new(
            c[0][0] * p.x + c[1][0] * p.y + c[2][0] * p.z + c[3][0],
            c[0][1] * p.x + c[1][1] * p.y + c[2][1] * p.z + c[3][1],
            c[0][2] * p.x + c[1][2] * p.y + c[2][2] * p.z + c[3][2],
        )
    }

    /// Map a direction (ignores translation)
    #[inline]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        let c = &self.cols;
        Vec3::new(
            c[0][0] * v.x + c[1][0] * v.y + c[2][0] * v.z,
            c[0][1] * v.x + c[1][1] * v.y + c[2][1] * v.z,
            c[0][2] * v.x + c[1][2] * v.y + c[2][2] * v.z,
        )
    }
}

impl Mul for Transform {
    type Output = Transform;

    /// `self * rhs`: apply `rhs` first, then `self`
    fn mul(self, rhs: Transform) -> Transform {
        let mut cols = [[0.0f32; 4]; 4];
        for (j, col) in cols.iter_mut().enumerate() {
            for (i, value) in col.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.cols[k][i] * rhs.cols[j][k]).sum();
            }
        }
        Transform { cols }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_translation_moves_points() {
        let t = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let p = t.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(2.0, 2.0, 3.0));
        assert_eq!(t.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_rotation_then_translation() {
        // Local +X rotated 90 degrees about Y points along world -Z.
        let t = Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))
            * Transform::from_rotation_y(FRAC_PI_2);
        let p = t.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_column_major_roundtrip_and_rejects() {
        let t = Transform::from_translation(Vec3::new(4.0, 5.0, 6.0));
        let flat = t.to_column_major();
        assert_eq!(flat[12], 4.0);
        assert_eq!(Transform::from_column_major(&flat), Some(t));

        assert!(Transform::from_column_major(&flat[..15]).is_none());
        let mut bad = flat;
        bad[0] = f32::NAN;
        assert!(Transform::from_column_major(&bad).is_none());
    }

    #[test]
    fn test_identity_is_neutral() {
        let t = Transform::from_rotation_x(0.3) * Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(Transform::IDENTITY * t, t);
        assert_eq!(t * Transform::IDENTITY, t);
    }
}
