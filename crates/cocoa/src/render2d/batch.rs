//! # Batch: Many Quads, One Draw Call
//!
//! A [`RenderBatch`] owns a fixed-capacity vertex array, a static index
//! pattern, and up to eight texture slots. Quads are appended until either
//! the capacity or the slot set runs out; the render system then opens
//! another batch.
//!
//! ```text
//! RenderBatch { z: 0, max: 1000 }
//! ┌──────────────────────────────────────────────────────────────┐
//! │ vertices: [v0 v1 v2 v3 | v4 v5 v6 v7 | ...... unused ......] │
//! │            quad 0        quad 1        count = 2             │
//! │ indices:  [3 2 0 0 2 1 | 7 6 4 4 6 5 | ... max quads ...]    │
//! │ slots:    [tex#4 → 1, tex#9 → 2]                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! new ──► start ──► (add* ──► render ──► clear)* ──► release
//!         once                                       once
//! ```
//!
//! Vertex storage is allocated once in [`RenderBatch::new`] and reused every
//! frame; [`clear`](RenderBatch::clear) only resets the count and the slots.
//! Only the first `count * 4` vertices are uploaded per frame.
//!
//! ## Preconditions as Errors
//!
//! Adding to a full batch, adding a ninth texture, rendering before
//! `start`, or starting twice all return a [`RenderError`] and leave the
//! batch untouched.

use bytemuck::Zeroable;

use super::RenderError;
use super::backend::{BatchBuffersId, RenderBackend};
use super::quad::{Drawable, INDICES_PER_QUAD, VERTICES_PER_QUAD, generate_indices};
use super::texture_slots::TextureSlots;
use super::vertex::Vertex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GpuState {
    Idle,
    Started(BatchBuffersId),
    /// `start` failed; the batch is skipped from now on.
    Failed,
    Released,
}

pub struct RenderBatch {
    z_index: i32,
    max_quads: usize,
    count: usize,
    render_on_top: bool,
    slots: TextureSlots,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    gpu: GpuState,
}

impl RenderBatch {
    pub fn new(max_quads: usize, z_index: i32, render_on_top: bool) -> Self {
        Self {
            z_index,
            max_quads,
            count: 0,
            render_on_top,
            slots: TextureSlots::new(),
            vertices: vec![Vertex::zeroed(); max_quads * VERTICES_PER_QUAD],
            indices: generate_indices(max_quads),
            gpu: GpuState::Idle,
        }
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn render_on_top(&self) -> bool {
        self.render_on_top
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_quads
    }

    pub fn texture_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_started(&self) -> bool {
        matches!(self.gpu, GpuState::Started(_))
    }

    pub(crate) fn has_failed(&self) -> bool {
        self.gpu == GpuState::Failed
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The vertices written so far this frame.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices[..self.count * VERTICES_PER_QUAD]
    }

    /// Room for one more quad, and a slot for its texture?
    pub fn can_accept(&self, drawable: &Drawable) -> bool {
        if self.count >= self.max_quads {
            return false;
        }
        match drawable.texture() {
            None => true,
            Some(texture) => self.slots.can_hold(texture),
        }
    }

    pub fn add(&mut self, drawable: &Drawable) -> Result<(), RenderError> {
        if self.count >= self.max_quads {
            return Err(RenderError::BatchFull {
                capacity: self.max_quads,
            });
        }
        let tex_slot = match drawable.texture() {
            None => 0,
            Some(texture) => self
                .slots
                .insert(texture)
                .ok_or(RenderError::NoTextureSlot(texture))?,
        };

        let start = self.count * VERTICES_PER_QUAD;
        drawable.write_vertices(tex_slot, &mut self.vertices[start..start + VERTICES_PER_QUAD]);
        self.count += 1;
        Ok(())
    }

    /// Acquire GPU buffers and upload the index pattern. Exactly once.
    pub fn start(&mut self, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        match self.gpu {
            GpuState::Idle => {}
            GpuState::Failed => return Err(RenderError::BatchUnavailable),
            GpuState::Started(_) | GpuState::Released => return Err(RenderError::AlreadyStarted),
        }
        match backend.create_batch_buffers(self.max_quads, &self.indices) {
            Ok(buffers) => {
                log::debug!(
                    "render batch started (z = {}, {} quads, on_top = {})",
                    self.z_index,
                    self.max_quads,
                    self.render_on_top
                );
                self.gpu = GpuState::Started(buffers);
                Ok(())
            }
            Err(e) => {
                self.gpu = GpuState::Failed;
                Err(e)
            }
        }
    }

    /// Upload this frame's vertices and issue one indexed draw.
    pub fn render(&mut self, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        let buffers = match self.gpu {
            GpuState::Started(buffers) => buffers,
            GpuState::Failed => return Err(RenderError::BatchUnavailable),
            GpuState::Idle | GpuState::Released => return Err(RenderError::NotStarted),
        };

        backend.upload_vertices(buffers, self.vertices())?;
        for (unit, texture) in self.slots.iter() {
            backend.bind_texture(unit, texture);
        }
        let result = backend.draw_indexed(buffers, (self.count * INDICES_PER_QUAD) as u32);
        backend.unbind_textures();
        result
    }

    /// Forget this frame's quads and textures. Storage is kept.
    pub fn clear(&mut self) {
        self.count = 0;
        self.slots.clear();
    }

    /// Free the GPU buffers. Returns `false` if there was nothing to free.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) -> bool {
        match self.gpu {
            GpuState::Started(buffers) => {
                backend.release_batch_buffers(buffers);
                self.gpu = GpuState::Released;
                true
            }
            GpuState::Idle | GpuState::Failed => {
                self.gpu = GpuState::Released;
                false
            }
            GpuState::Released => false,
        }
    }
}

impl Drop for RenderBatch {
    fn drop(&mut self) {
        if let GpuState::Started(buffers) = self.gpu {
            log::warn!(
                "render batch (z = {}) dropped without release; buffers {:?} leaked",
                self.z_index,
                buffers
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::TextureHandle;
    use crate::math::{Vec2, Vec3};
    use crate::render2d::backend::{BackendCall, HeadlessBackend};
    use crate::render2d::texture_slots::MAX_TEXTURE_SLOTS;

    fn solid() -> Drawable {
        Drawable::RawQuad {
            min: Vec2::ZERO,
            max: Vec2::ONE,
            color: Vec3::ONE,
        }
    }

    fn textured(id: u32) -> Drawable {
        Drawable::TexturedQuad {
            texture: TextureHandle(id),
            size: Vec2::ONE,
            position: Vec2::ZERO,
            color: Vec3::ONE,
            uv_min: Vec2::ZERO,
            uv_max: Vec2::ONE,
            rotation: 0.0,
        }
    }

    #[test]
    fn rejects_at_capacity() {
        let mut batch = RenderBatch::new(2, 0, false);
        assert!(batch.can_accept(&solid()));
        batch.add(&solid()).unwrap();
        batch.add(&solid()).unwrap();
        assert!(!batch.can_accept(&solid()));
        assert!(matches!(batch.add(&solid()), Err(RenderError::BatchFull { capacity: 2 })));
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn ninth_texture_rejected_existing_reused() {
        let mut batch = RenderBatch::new(100, 0, false);
        for id in 0..MAX_TEXTURE_SLOTS as u32 {
            batch.add(&textured(id)).unwrap();
        }
        assert!(!batch.can_accept(&textured(99)));
        assert!(matches!(batch.add(&textured(99)), Err(RenderError::NoTextureSlot(_))));
        assert!(batch.can_accept(&textured(3)));
        batch.add(&textured(3)).unwrap();
        // Untextured quads never need a slot.
        assert!(batch.can_accept(&solid()));
        assert_eq!(batch.texture_count(), MAX_TEXTURE_SLOTS);
        assert_eq!(batch.len(), MAX_TEXTURE_SLOTS + 1);
        // Reused texture keeps its slot.
        assert_eq!(batch.vertices()[MAX_TEXTURE_SLOTS * 4].tex_slot, 4.0);
    }

    #[test]
    fn two_quads_index_buffer() {
        let mut batch = RenderBatch::new(2, 0, false);
        batch.add(&solid()).unwrap();
        batch.add(&solid()).unwrap();
        assert_eq!(batch.indices(), &[3, 2, 0, 0, 2, 1, 7, 6, 4, 4, 6, 5]);
    }

    #[test]
    fn render_before_start_is_an_error() {
        let mut backend = HeadlessBackend::new();
        let mut batch = RenderBatch::new(4, 0, false);
        batch.add(&solid()).unwrap();
        assert!(matches!(batch.render(&mut backend), Err(RenderError::NotStarted)));
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn start_twice_is_an_error() {
        let mut backend = HeadlessBackend::new();
        let mut batch = RenderBatch::new(4, 0, false);
        batch.start(&mut backend).unwrap();
        assert!(matches!(batch.start(&mut backend), Err(RenderError::AlreadyStarted)));
        assert!(batch.release(&mut backend));
    }

    #[test]
    fn render_uploads_only_used_vertices_and_binds_units() {
        let mut backend = HeadlessBackend::new();
        let mut batch = RenderBatch::new(10, 0, false);
        batch.start(&mut backend).unwrap();
        batch.add(&textured(5)).unwrap();
        batch.add(&textured(6)).unwrap();
        batch.add(&solid()).unwrap();
        backend.clear_log();

        batch.render(&mut backend).unwrap();
        let buffers = match backend.calls[0] {
            BackendCall::Upload { buffers, vertex_count } => {
                assert_eq!(vertex_count, 12);
                buffers
            }
            ref other => panic!("expected upload, got {other:?}"),
        };
        assert_eq!(
            &backend.calls[1..],
            &[
                BackendCall::BindTexture { unit: 1, texture: TextureHandle(5) },
                BackendCall::BindTexture { unit: 2, texture: TextureHandle(6) },
                BackendCall::Draw { buffers, index_count: 18 },
                BackendCall::UnbindTextures,
            ]
        );
        assert_eq!(backend.indices(buffers).map(<[u32]>::len), Some(60));
        batch.release(&mut backend);
    }

    #[test]
    fn clear_reuses_storage() {
        let mut batch = RenderBatch::new(3, 0, false);
        batch.add(&textured(1)).unwrap();
        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.texture_count(), 0);
        assert_eq!(batch.vertices().len(), 0);
        assert_eq!(batch.vertices.len(), 12);
    }

    #[test]
    fn release_happens_once() {
        let mut backend = HeadlessBackend::new();
        let mut batch = RenderBatch::new(1, 0, false);
        batch.start(&mut backend).unwrap();
        assert_eq!(backend.live_buffers(), 1);
        assert!(batch.release(&mut backend));
        assert!(!batch.release(&mut backend));
        assert_eq!(backend.live_buffers(), 0);
        assert!(matches!(batch.render(&mut backend), Err(RenderError::NotStarted)));
    }

    #[test]
    fn failed_start_marks_batch_unavailable() {
        let mut backend = HeadlessBackend::new();
        backend.fail_next_create = true;
        let mut batch = RenderBatch::new(1, 0, false);
        assert!(matches!(batch.start(&mut backend), Err(RenderError::Gpu(_))));
        assert!(batch.has_failed());
        assert!(matches!(batch.render(&mut backend), Err(RenderError::BatchUnavailable)));
    }
}
