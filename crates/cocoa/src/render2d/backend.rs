//! # Backend: The GPU Primitives the Batch Renderer Calls
//!
//! Batches never touch wgpu directly. They talk to a [`RenderBackend`] that
//! offers exactly the operations a batch needs:
//!
//! ```text
//! start()   ──► create_batch_buffers(max_quads, static indices)
//! render()  ──► upload_vertices(first count*4)
//!               bind_texture(unit, handle)   × slots in use
//!               draw_indexed(count*6)
//!               unbind_textures()
//! release() ──► release_batch_buffers()
//! ```
//!
//! [`WgpuBackend`](super::wgpu_backend::WgpuBackend) records these into
//! render passes. [`HeadlessBackend`] just remembers the calls, which is what
//! the batching tests assert against.

use std::collections::HashMap;

use crate::asset::TextureHandle;

use super::RenderError;
use super::vertex::Vertex;

/// Opaque id of one batch's GPU vertex/index buffer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchBuffersId(pub(crate) u32);

pub trait RenderBackend {
    /// Allocate vertex storage for `max_quads` quads and upload the static
    /// index buffer.
    fn create_batch_buffers(
        &mut self,
        max_quads: usize,
        indices: &[u32],
    ) -> Result<BatchBuffersId, RenderError>;

    /// Upload `vertices` to the start of the batch's vertex buffer.
    fn upload_vertices(&mut self, buffers: BatchBuffersId, vertices: &[Vertex]) -> Result<(), RenderError>;

    /// Make `texture` available to the shader on 1-based `unit`.
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Draw the first `index_count` indices of the batch.
    fn draw_indexed(&mut self, buffers: BatchBuffersId, index_count: u32) -> Result<(), RenderError>;

    fn unbind_textures(&mut self);

    fn release_batch_buffers(&mut self, buffers: BatchBuffersId);
}

// ── Headless ─────────────────────────────────────────────────────────────

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Create { buffers: BatchBuffersId, max_quads: usize },
    Upload { buffers: BatchBuffersId, vertex_count: usize },
    BindTexture { unit: u32, texture: TextureHandle },
    Draw { buffers: BatchBuffersId, index_count: u32 },
    UnbindTextures,
    Release { buffers: BatchBuffersId },
}

/// A backend without a GPU. Keeps uploaded data and a call log.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    pub calls: Vec<BackendCall>,
    next_id: u32,
    indices: HashMap<BatchBuffersId, Vec<u32>>,
    vertices: HashMap<BatchBuffersId, Vec<Vertex>>,
    /// Make the next `create_batch_buffers` fail, to exercise error paths.
    pub fail_next_create: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Draw { .. }))
            .count()
    }

    pub fn live_buffers(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self, buffers: BatchBuffersId) -> Option<&[u32]> {
        self.indices.get(&buffers).map(Vec::as_slice)
    }

    pub fn uploaded_vertices(&self, buffers: BatchBuffersId) -> Option<&[Vertex]> {
        self.vertices.get(&buffers).map(Vec::as_slice)
    }

    pub fn clear_log(&mut self) {
        self.calls.clear();
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_batch_buffers(
        &mut self,
        max_quads: usize,
        indices: &[u32],
    ) -> Result<BatchBuffersId, RenderError> {
        if std::mem::take(&mut self.fail_next_create) {
            return Err(RenderError::Gpu("headless create failure".into()));
        }
        let buffers = BatchBuffersId(self.next_id);
        self.next_id += 1;
        self.indices.insert(buffers, indices.to_vec());
        self.vertices.insert(buffers, Vec::new());
        self.calls.push(BackendCall::Create { buffers, max_quads });
        Ok(buffers)
    }

    fn upload_vertices(&mut self, buffers: BatchBuffersId, vertices: &[Vertex]) -> Result<(), RenderError> {
        let slot = self
            .vertices
            .get_mut(&buffers)
            .ok_or(RenderError::UnknownBuffers(buffers))?;
        *slot = vertices.to_vec();
        self.calls.push(BackendCall::Upload {
            buffers,
            vertex_count: vertices.len(),
        });
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.calls.push(BackendCall::BindTexture { unit, texture });
    }

    fn draw_indexed(&mut self, buffers: BatchBuffersId, index_count: u32) -> Result<(), RenderError> {
        if !self.indices.contains_key(&buffers) {
            return Err(RenderError::UnknownBuffers(buffers));
        }
        self.calls.push(BackendCall::Draw { buffers, index_count });
        Ok(())
    }

    fn unbind_textures(&mut self) {
        self.calls.push(BackendCall::UnbindTextures);
    }

    fn release_batch_buffers(&mut self, buffers: BatchBuffersId) {
        self.indices.remove(&buffers);
        self.vertices.remove(&buffers);
        self.calls.push(BackendCall::Release { buffers });
    }
}
