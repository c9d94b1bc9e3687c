//! # Quad: Drawables and Their Geometry
//!
//! Everything the batch renderer draws is a quad. A [`Drawable`] describes
//! one, and [`Drawable::write_vertices`] turns it into four [`Vertex`]
//! records in a fixed corner order:
//!
//! ```text
//!   2 ─────── 1        0 = bottom-right  (+0.5, -0.5)
//!   │ ╲       │        1 = top-right     (+0.5, +0.5)
//!   │   ╲     │        2 = top-left      (-0.5, +0.5)
//!   │     ╲   │        3 = bottom-left   (-0.5, -0.5)
//!   3 ─────── 0
//! ```
//!
//! Indices per quad are `(3, 2, 0)` and `(0, 2, 1)` offset by `4 * quad`, so
//! both triangles share the 0–2 diagonal and keep the same winding whatever
//! the rotation.
//!
//! Unrotated quads are placed with a plain `center + corner * scale * size`.
//! Rotated quads go through `translate · rotate_z · scale(scale * size)`,
//! which keeps the common unrotated case free of matrix math.

use crate::asset::TextureHandle;
use crate::components::{DEFAULT_TEX_COORDS, SpriteRenderer};
use crate::ecs::Entity;
use crate::math::{Mat4, Transform, Vec2, Vec3, Vec4};

use super::vertex::Vertex;

/// Corner offsets in bottom-right, top-right, top-left, bottom-left order.
pub const CORNERS: [Vec2; 4] = [
    Vec2::new(0.5, -0.5),
    Vec2::new(0.5, 0.5),
    Vec2::new(-0.5, 0.5),
    Vec2::new(-0.5, -0.5),
];

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

/// One quad submitted to the render system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drawable {
    /// A scene entity's sprite.
    Sprite {
        transform: Transform,
        renderer: SpriteRenderer,
        entity: Option<Entity>,
    },
    /// Solid axis-aligned rectangle between two corners.
    RawQuad { min: Vec2, max: Vec2, color: Vec3 },
    /// Solid quad with explicit corner positions (in corner order).
    ArbitraryQuad { vertices: [Vec2; 4], color: Vec3 },
    /// A sub-rectangle of a texture, e.g. a gizmo handle.
    TexturedQuad {
        texture: TextureHandle,
        size: Vec2,
        position: Vec2,
        color: Vec3,
        uv_min: Vec2,
        uv_max: Vec2,
        rotation: f32,
    },
}

impl Drawable {
    pub fn sprite(transform: Transform, renderer: SpriteRenderer, entity: Entity) -> Self {
        Drawable::Sprite {
            transform,
            renderer,
            entity: Some(entity),
        }
    }

    /// The texture this drawable samples, if any.
    pub fn texture(&self) -> Option<TextureHandle> {
        match self {
            Drawable::Sprite { renderer, .. } => renderer.sprite.texture,
            Drawable::TexturedQuad { texture, .. } => Some(*texture),
            Drawable::RawQuad { .. } | Drawable::ArbitraryQuad { .. } => None,
        }
    }

    /// Write the four corner vertices. `tex_slot` is 0 for untextured quads.
    pub fn write_vertices(&self, tex_slot: u32, out: &mut [Vertex]) {
        debug_assert_eq!(out.len(), VERTICES_PER_QUAD);
        match *self {
            Drawable::Sprite {
                transform,
                renderer,
                entity,
            } => {
                let size = Vec2::new(renderer.sprite.width, renderer.sprite.height);
                let corners = quad_corners(
                    transform.position,
                    transform.scale,
                    size,
                    transform.euler_rotation.z,
                );
                let entity_id = entity.map_or(0, Entity::picking_id);
                fill(out, corners, &renderer.sprite.tex_coords, renderer.color, tex_slot, entity_id);
            }
            Drawable::RawQuad { min, max, color } => {
                let size = max - min;
                let center = min + size / 2.0;
                let corners = quad_corners(center.extend(0.0), Vec3::ONE, size, 0.0);
                fill(out, corners, &DEFAULT_TEX_COORDS, color.extend(1.0), 0, 0);
            }
            Drawable::ArbitraryQuad { vertices, color } => {
                let corners = vertices.map(|v| v.extend(0.0));
                fill(out, corners, &DEFAULT_TEX_COORDS, color.extend(1.0), 0, 0);
            }
            Drawable::TexturedQuad {
                size,
                position,
                color,
                uv_min,
                uv_max,
                rotation,
                ..
            } => {
                let tex_coords = [
                    Vec2::new(uv_max.x, uv_max.y),
                    Vec2::new(uv_max.x, uv_min.y),
                    Vec2::new(uv_min.x, uv_min.y),
                    Vec2::new(uv_min.x, uv_max.y),
                ];
                let corners = quad_corners(position.extend(0.0), Vec3::ONE, size, rotation);
                fill(out, corners, &tex_coords, color.extend(1.0), tex_slot, 0);
            }
        }
    }
}

fn fill(
    out: &mut [Vertex],
    corners: [Vec3; 4],
    tex_coords: &[Vec2; 4],
    color: Vec4,
    tex_slot: u32,
    entity_id: u32,
) {
    for (i, v) in out.iter_mut().enumerate() {
        *v = Vertex {
            position: corners[i].to_array(),
            color: color.to_array(),
            tex_coords: tex_coords[i].to_array(),
            tex_slot: tex_slot as f32,
            entity_id,
            _pad: [0],
        };
    }
}

/// World-space corners of a quad centered at `position`.
pub fn quad_corners(position: Vec3, scale: Vec3, size: Vec2, rotation_degrees: f32) -> [Vec3; 4] {
    if rotation_degrees != 0.0 {
        let matrix = Mat4::from_translation(position)
            * Mat4::from_rotation_z(rotation_degrees.to_radians())
            * Mat4::from_scale(scale * Vec3::new(size.x, size.y, 1.0));
        CORNERS.map(|c| matrix.transform_point3(c.extend(0.0)))
    } else {
        CORNERS.map(|c| {
            Vec3::new(
                position.x + c.x * scale.x * size.x,
                position.y + c.y * scale.y * size.y,
                0.0,
            )
        })
    }
}

/// Static index pattern for `max_quads` quads.
pub fn generate_indices(max_quads: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(max_quads * INDICES_PER_QUAD);
    for quad in 0..max_quads as u32 {
        let offset = quad * VERTICES_PER_QUAD as u32;
        indices.extend_from_slice(&[
            offset + 3,
            offset + 2,
            offset,
            offset,
            offset + 2,
            offset + 1,
        ]);
    }
    indices
}
