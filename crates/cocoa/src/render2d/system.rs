//! # Render System: Routing Quads into Batches
//!
//! The [`RenderSystem`] owns every [`RenderBatch`] and keeps them sorted by
//! z-index. Each frame:
//!
//! ```text
//! begin_frame()                  drop failed batches, clear the rest
//! submit(drawable, z, layer)*    first batch with same z + layer that accepts,
//!                                else a new batch inserted after z' <= z
//! render(backend, Bottom)        ascending z, start() on first use
//! render(backend, Top)           overlay batches (gizmos) after the scene
//! ```
//!
//! Batches are never destroyed between frames, only cleared, so their GPU
//! buffers are created once and reused. [`release`](RenderSystem::release)
//! frees them all when the renderer shuts down.
//!
//! A batch whose GPU resources fail is logged and skipped; the rest of the
//! frame still renders and the failure is returned to the caller afterwards.
//! The failed batch holds no GPU buffers and is dropped at the next
//! `begin_frame`, so its quads get a fresh batch that retries the backend.

use crate::components::SpriteRenderer;
use crate::math::Transform;
use crate::scene::Scene;

use super::RenderError;
use super::backend::RenderBackend;
use super::batch::RenderBatch;
use super::quad::Drawable;

/// Which pass a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Scene content.
    Bottom,
    /// Drawn after the scene (gizmos, debug overlays).
    Top,
}

impl Layer {
    fn is_top(self) -> bool {
        self == Layer::Top
    }
}

/// What the last `render` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub batches: usize,
    pub draw_calls: usize,
    pub quads: usize,
}

pub struct RenderSystem {
    batches: Vec<RenderBatch>,
    max_batch_quads: usize,
}

impl RenderSystem {
    pub fn new(max_batch_quads: usize) -> Self {
        Self {
            batches: Vec::new(),
            max_batch_quads,
        }
    }

    pub fn batches(&self) -> &[RenderBatch] {
        &self.batches
    }

    pub fn max_batch_quads(&self) -> usize {
        self.max_batch_quads
    }

    /// Clear every batch for a new frame.
    pub fn begin_frame(&mut self) {
        let before = self.batches.len();
        self.batches.retain(|b| !b.has_failed());
        if self.batches.len() < before {
            log::debug!("dropped {} failed render batches", before - self.batches.len());
        }
        for batch in &mut self.batches {
            batch.clear();
        }
    }

    /// Route one quad into a batch.
    pub fn submit(&mut self, drawable: Drawable, z_index: i32, layer: Layer) -> Result<(), RenderError> {
        let on_top = layer.is_top();
        let existing = self.batches.iter().position(|b| {
            b.z_index() == z_index
                && b.render_on_top() == on_top
                && !b.has_failed()
                && b.can_accept(&drawable)
        });

        let index = match existing {
            Some(index) => index,
            None => {
                let index = self.batches.partition_point(|b| b.z_index() <= z_index);
                log::debug!(
                    "new render batch at z = {z_index} ({} total)",
                    self.batches.len() + 1
                );
                self.batches
                    .insert(index, RenderBatch::new(self.max_batch_quads, z_index, on_top));
                index
            }
        };
        self.batches[index].add(&drawable)
    }

    /// Submit every entity that has a [`Transform`] and a [`SpriteRenderer`].
    ///
    /// Returns the number of sprites submitted.
    pub fn submit_scene(&mut self, scene: &Scene) -> Result<usize, RenderError> {
        let mut sprites = Vec::new();
        scene
            .world
            .view2::<Transform, SpriteRenderer>(|entity, transform, renderer| {
                sprites.push((renderer.z_index, Drawable::sprite(*transform, *renderer, entity)));
            });
        let count = sprites.len();
        for (z, drawable) in sprites {
            self.submit(drawable, z, Layer::Bottom)?;
        }
        Ok(count)
    }

    /// Render the batches of one layer in ascending z order.
    pub fn render(&mut self, backend: &mut dyn RenderBackend, layer: Layer) -> Result<RenderStats, RenderError> {
        let on_top = layer.is_top();
        let mut stats = RenderStats::default();
        let mut first_error: Option<RenderError> = None;
        let mut failed = 0;

        for batch in self.batches.iter_mut() {
            if batch.render_on_top() != on_top || batch.is_empty() {
                continue;
            }
            if !batch.is_started() && !batch.has_failed() {
                if let Err(e) = batch.start(backend) {
                    log::error!("render batch (z = {}) failed to start: {e}", batch.z_index());
                    failed += 1;
                    first_error.get_or_insert(e);
                    continue;
                }
            }
            match batch.render(backend) {
                Ok(()) => {
                    stats.batches += 1;
                    stats.draw_calls += 1;
                    stats.quads += batch.len();
                }
                Err(RenderError::BatchUnavailable) => {}
                Err(e) => {
                    log::error!("render batch (z = {}) failed: {e}", batch.z_index());
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            None => Ok(stats),
            Some(first) => Err(RenderError::BatchesFailed {
                failed,
                first: Box::new(first),
            }),
        }
    }

    /// Release every batch's GPU buffers and drop the batches.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        for mut batch in self.batches.drain(..) {
            batch.release(backend);
        }
    }
}
