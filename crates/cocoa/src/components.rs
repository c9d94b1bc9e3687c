//! Scene components: sprites, rigid bodies, and box colliders.
//!
//! All components are plain data. The texture of a [`Sprite`] is a runtime
//! handle and is skipped by serde; scene files store the texture path next
//! to the component instead (see [`crate::scene`]).

use serde::{Deserialize, Serialize};

use crate::asset::TextureHandle;
use crate::math::{Vec2, Vec4};

/// Texture coordinates in corner order bottom-right, top-right, top-left,
/// bottom-left.
pub const DEFAULT_TEX_COORDS: [Vec2; 4] = [
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
];

/// A region of a texture plus its size in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sprite {
    #[serde(skip)]
    pub texture: Option<TextureHandle>,
    pub width: f32,
    pub height: f32,
    pub tex_coords: [Vec2; 4],
}

impl Sprite {
    pub fn new(texture: TextureHandle, width: f32, height: f32) -> Self {
        Self {
            texture: Some(texture),
            width,
            height,
            tex_coords: DEFAULT_TEX_COORDS,
        }
    }

    /// Cell `index` (row-major, top-left first) of a sheet with uniform
    /// `cell_w`×`cell_h` pixel cells.
    pub fn from_sheet(
        texture: TextureHandle,
        sheet_w: u32,
        sheet_h: u32,
        cell_w: u32,
        cell_h: u32,
        index: u32,
    ) -> Self {
        let columns = (sheet_w / cell_w).max(1);
        let x = (index % columns) * cell_w;
        let y = (index / columns) * cell_h;
        let min = Vec2::new(x as f32 / sheet_w as f32, y as f32 / sheet_h as f32);
        let max = Vec2::new(
            (x + cell_w) as f32 / sheet_w as f32,
            (y + cell_h) as f32 / sheet_h as f32,
        );
        Self {
            texture: Some(texture),
            width: cell_w as f32,
            height: cell_h as f32,
            tex_coords: [
                Vec2::new(max.x, max.y),
                Vec2::new(max.x, min.y),
                Vec2::new(min.x, min.y),
                Vec2::new(min.x, max.y),
            ],
        }
    }

    /// Smallest and largest texture coordinate of the region.
    pub fn uv_bounds(&self) -> (Vec2, Vec2) {
        let min = self.tex_coords.iter().copied().reduce(Vec2::min).unwrap_or(Vec2::ZERO);
        let max = self.tex_coords.iter().copied().reduce(Vec2::max).unwrap_or(Vec2::ONE);
        (min, max)
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            texture: None,
            width: 32.0,
            height: 32.0,
            tex_coords: DEFAULT_TEX_COORDS,
        }
    }
}

/// Makes an entity visible to the batch renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteRenderer {
    pub color: Vec4,
    pub sprite: Sprite,
    /// Batches are drawn in ascending z order.
    pub z_index: i32,
}

impl SpriteRenderer {
    pub fn colored(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            color: Vec4::new(r, g, b, a),
            ..Self::default()
        }
    }

    pub fn textured(sprite: Sprite) -> Self {
        Self {
            sprite,
            ..Self::default()
        }
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.sprite.width = width;
        self.sprite.height = height;
        self
    }

    pub fn z(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }
}

impl Default for SpriteRenderer {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            sprite: Sprite::default(),
            z_index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BodyType2D {
    #[default]
    Dynamic,
    Kinematic,
    Static,
}

impl BodyType2D {
    pub const ALL: [BodyType2D; 3] = [BodyType2D::Dynamic, BodyType2D::Kinematic, BodyType2D::Static];

    pub fn label(self) -> &'static str {
        match self {
            BodyType2D::Dynamic => "Dynamic",
            BodyType2D::Kinematic => "Kinematic",
            BodyType2D::Static => "Static",
        }
    }
}

/// Physical body definition. The physics world reads it when the entity is
/// registered; the simulation state itself lives inside the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rigidbody2D {
    pub body_type: BodyType2D,
    pub velocity: Vec2,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub fixed_rotation: bool,
    /// Continuous collision detection ("bullet").
    pub continuous_collision: bool,
}

impl Default for Rigidbody2D {
    fn default() -> Self {
        Self {
            body_type: BodyType2D::Dynamic,
            velocity: Vec2::ZERO,
            mass: 1.0,
            linear_damping: 0.9,
            angular_damping: 0.8,
            fixed_rotation: false,
            continuous_collision: false,
        }
    }
}

/// Box collider. `half_size` is scaled by the transform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Box2D {
    pub size: Vec2,
    pub half_size: Vec2,
    pub offset: Vec2,
}

impl Box2D {
    pub fn new(width: f32, height: f32) -> Self {
        let size = Vec2::new(width, height);
        Self {
            size,
            half_size: size * 0.5,
            offset: Vec2::ZERO,
        }
    }
}

impl Default for Box2D {
    fn default() -> Self {
        Self::new(32.0, 32.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_cell_coords() {
        let sprite = Sprite::from_sheet(TextureHandle(0), 80, 40, 16, 40, 1);
        let (min, max) = sprite.uv_bounds();
        assert_eq!(min, Vec2::new(0.2, 0.0));
        assert_eq!(max, Vec2::new(0.4, 1.0));
        assert_eq!(sprite.tex_coords[0], max);
        assert_eq!(sprite.width, 16.0);
    }

    #[test]
    fn sprite_renderer_round_trips_without_texture() {
        let spr = SpriteRenderer::textured(Sprite::new(TextureHandle(3), 10.0, 20.0)).z(2);
        let json = serde_json::to_string(&spr).unwrap();
        let back: SpriteRenderer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sprite.texture, None);
        assert_eq!(back.sprite.width, 10.0);
        assert_eq!(back.z_index, 2);
    }
}
