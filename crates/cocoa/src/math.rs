//! Math types and glam re-exports.
//!
//! Rotation is stored as euler angles in **degrees**, matching what the
//! inspector shows and what editor commands record. Only the z angle matters
//! for rendering and physics.

pub use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Position, scale, and euler rotation (degrees) of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
    pub euler_rotation: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        scale: Vec3::ONE,
        euler_rotation: Vec3::ZERO,
    };

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    pub fn from_xy(x: f32, y: f32) -> Self {
        Self::from_xyz(x, y, 0.0)
    }

    pub fn with_scale(mut self, x: f32, y: f32) -> Self {
        self.scale = Vec3::new(x, y, 1.0);
        self
    }

    pub fn with_rotation_z(mut self, degrees: f32) -> Self {
        self.euler_rotation.z = degrees;
        self
    }

    /// Model matrix: translate, then rotate about z, then scale.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.euler_rotation.z.to_radians())
            * Mat4::from_scale(self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Is `point` inside the box centered at `center` with `half_size`,
/// rotated by `rotation_degrees` about its center?
///
/// The point is rotated into the box's local frame, then tested against the
/// axis-aligned extents.
pub fn point_in_box(point: Vec2, half_size: Vec2, center: Vec2, rotation_degrees: f32) -> bool {
    let local = if rotation_degrees != 0.0 {
        rotate_about(point, center, -rotation_degrees)
    } else {
        point
    };
    let min = center - half_size;
    let max = center + half_size;
    local.x >= min.x && local.x <= max.x && local.y >= min.y && local.y <= max.y
}

/// Rotate `point` about `origin` by `degrees` (counter-clockwise).
pub fn rotate_about(point: Vec2, origin: Vec2, degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let d = point - origin;
    origin + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
}
