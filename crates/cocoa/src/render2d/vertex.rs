//! # Vertex: Per-Corner Data Sent to the GPU
//!
//! Every quad a batch accepts becomes four [`Vertex`] records. Positions are
//! already in world space (the batch applies the transform CPU-side), so
//! quads with different transforms share one buffer and one draw call.
//!
//! ```text
//! Vertex (48 bytes)
//! ┌──────────────┬──────────────────┬────────────┬──────────┬───────────┐
//! │ position     │ color            │ tex_coords │ tex_slot │ entity_id │
//! │ [f32; 3]     │ [f32; 4]         │ [f32; 2]   │ f32      │ u32       │
//! │ offset 0     │ offset 12        │ offset 28  │ 36       │ 40        │
//! │ location(0)  │ location(1)      │ location(2)│ loc(3)   │ loc(4)    │
//! └──────────────┴──────────────────┴────────────┴──────────┴───────────┘
//! ```
//!
//! `tex_slot` is the 1-based texture unit the fragment shader samples, 0 for
//! a solid-colored quad. `entity_id` is the owning entity's slot index plus
//! one, 0 meaning "no entity"; the picking pass writes it out verbatim.
//!
//! `#[repr(C)]` plus bytemuck's `Pod` lets a `&[Vertex]` be uploaded as bytes
//! without copying.

use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coords: [f32; 2],
    pub tex_slot: f32,
    pub entity_id: u32,
    /// Keeps the stride a multiple of 16 bytes.
    pub _pad: [u32; 1],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // color
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
            // tex_coords
            wgpu::VertexAttribute {
                offset: 28,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
            // tex_slot
            wgpu::VertexAttribute {
                offset: 36,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32,
            },
            // entity_id
            wgpu::VertexAttribute {
                offset: 40,
                shader_location: 4,
                format: wgpu::VertexFormat::Uint32,
            },
        ],
    };
}

/// Per-frame uniform: camera view-projection plus the selected entity's
/// picking id (0 when nothing is selected) for the highlight.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub active_entity_id: u32,
    pub _pad: [u32; 3],
}

impl FrameUniform {
    pub fn new(view_proj: glam::Mat4, active_entity_id: u32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            active_entity_id,
            _pad: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
        assert_eq!(std::mem::offset_of!(Vertex, color), 12);
        assert_eq!(std::mem::offset_of!(Vertex, tex_coords), 28);
        assert_eq!(std::mem::offset_of!(Vertex, tex_slot), 36);
        assert_eq!(std::mem::offset_of!(Vertex, entity_id), 40);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 80);
    }
}
