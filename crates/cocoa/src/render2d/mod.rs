//! # Render2d: Batched Sprite Rendering
//!
//! Every visible thing is a quad. Quads are packed into [`RenderBatch`]es of
//! up to `max_batch_quads` quads and eight textures each, and every batch is
//! one indexed draw call.
//!
//! ## Architecture
//!
//! ```text
//!  Scene (Transform + SpriteRenderer)     Gizmos, debug quads
//!            │                                   │
//!            ▼                                   ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │ RenderSystem::submit(drawable, z, layer)             │
//!   │   first batch with same z/layer that can_accept,     │
//!   │   else a new batch in z order                        │
//!   └──────────────────────────┬──────────────────────────┘
//!                              ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │ RenderBatch::add  → 4 world-space vertices            │
//!   │   texture → 1-based slot, entity → picking id         │
//!   └──────────────────────────┬──────────────────────────┘
//!                              ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │ RenderSystem::render(backend, layer)                  │
//!   │   start() once, upload count*4 vertices,              │
//!   │   bind slots, draw count*6 indices                    │
//!   └──────────────────────────┬──────────────────────────┘
//!                              ▼
//!         RenderBackend (wgpu: picking pass + main pass)
//! ```
//!
//! ## Design Decisions
//!
//! **CPU-side vertex transform.** Corners are computed on the CPU, so quads
//! with different transforms share one buffer and one draw. The shader only
//! applies the camera.
//!
//! **Batches persist.** A batch is created the first time its z-index needs
//! room and then cleared, not destroyed, every frame. GPU buffers are
//! allocated once per batch.
//!
//! **Eight texture slots.** The fragment shader picks one of eight bound
//! textures by the vertex's slot number, so a batch can mix textures without
//! breaking the draw. A ninth distinct texture opens a new batch.
//!
//! **Picking from the same batches.** The picking pass replays the batches
//! with a shader that writes each vertex's entity id to an integer target.
//!
//! ## Comparison
//!
//! - **Painter's-algorithm sort per sprite** (sort everything by z, break on
//!   texture change): fewer batches for mixed scenes, but a full sort every
//!   frame. Here z-order is per batch and textures are slotted.
//! - **Instanced sprites** (Bevy): one transform per instance on the GPU.
//!   Scales further, but loses the per-vertex entity id used for picking.

pub mod backend;
pub mod batch;
pub mod camera;
pub mod quad;
pub mod system;
pub mod texture_slots;
pub mod vertex;

#[cfg(feature = "render2d")]
pub mod picking;
#[cfg(feature = "render2d")]
pub mod wgpu_backend;

pub use backend::{BatchBuffersId, HeadlessBackend, RenderBackend};
pub use batch::RenderBatch;
pub use camera::Camera2d;
pub use quad::Drawable;
pub use system::{Layer, RenderStats, RenderSystem};
pub use texture_slots::{MAX_TEXTURE_SLOTS, TextureSlots};
pub use vertex::Vertex;

#[cfg(feature = "render2d")]
pub use picking::{PickingTarget, decode_entity_id};
#[cfg(feature = "render2d")]
pub use wgpu_backend::WgpuBackend;

use crate::asset::TextureHandle;

/// Errors from batching and from the GPU backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("batch is full ({capacity} quads)")]
    BatchFull { capacity: usize },
    #[error("no free texture slot for {0:?}")]
    NoTextureSlot(TextureHandle),
    #[error("batch rendered before start()")]
    NotStarted,
    #[error("batch already started")]
    AlreadyStarted,
    #[error("batch has no GPU buffers after an earlier failure")]
    BatchUnavailable,
    #[error("unknown batch buffers {0:?}")]
    UnknownBuffers(BatchBuffersId),
    #[error("GPU resource creation failed: {0}")]
    Gpu(String),
    #[error("texture {0:?} is not registered")]
    UnknownTexture(TextureHandle),
    #[error("{failed} batch(es) failed to render; first error: {first}")]
    BatchesFailed {
        failed: usize,
        first: Box<RenderError>,
    },
    #[error("picking readback failed: {0}")]
    Readback(String),
}
