//! Frame orchestration.
//!
//! [`render_frame`] acquires the surface texture and an encoder, lets the
//! caller record its passes, then submits and presents. [`ScenePasses`]
//! records the scene itself:
//!
//! ```text
//! render(Bottom) → picking pass      (entity ids, no gizmos)
//! render(Bottom) → render(Top) → main pass (clear + sprites + gizmos)
//! ```

use crate::asset::TextureAssets;
use crate::ecs::Entity;
use crate::math::Vec2;
use crate::render2d::picking::{PickingTarget, decode_entity_id};
use crate::render2d::wgpu_backend::WgpuBackend;
use crate::render2d::{Layer, RenderError, RenderStats, RenderSystem};
use crate::scene::Scene;

use super::gpu::GpuContext;

/// Per-frame state handed to everything that records passes.
pub struct FrameContext<'a> {
    pub encoder: wgpu::CommandEncoder,
    pub view: wgpu::TextureView,
    pub gpu: &'a GpuContext,
}

/// Render a single frame. `record` adds every pass; submit and present
/// happen afterwards.
pub(crate) fn render_frame(
    gpu: &GpuContext,
    record: impl FnOnce(&mut FrameContext<'_>),
) -> Result<(), wgpu::SurfaceError> {
    let output = gpu.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("cocoa frame encoder"),
        });

    let mut frame = FrameContext {
        encoder,
        view,
        gpu,
    };
    record(&mut frame);

    gpu.queue.submit(std::iter::once(frame.encoder.finish()));
    output.present();
    Ok(())
}

pub fn clear_color(rgba: [f64; 4]) -> wgpu::Color {
    wgpu::Color {
        r: rgba[0],
        g: rgba[1],
        b: rgba[2],
        a: rgba[3],
    }
}

/// The sprite backend plus the picking target it draws ids into.
pub struct ScenePasses {
    pub backend: WgpuBackend,
    pub picking: PickingTarget,
}

impl ScenePasses {
    pub fn new(gpu: &GpuContext) -> Self {
        let (width, height) = gpu.surface_size();
        Self {
            backend: WgpuBackend::new(&gpu.device, &gpu.queue, gpu.surface_format()),
            picking: PickingTarget::new(&gpu.device, width, height),
        }
    }

    pub fn resize(&mut self, gpu: &GpuContext) {
        let (width, height) = gpu.surface_size();
        self.picking.resize(&gpu.device, width, height);
    }

    /// Record the picking and main passes for the batches already submitted
    /// to `render`. Failed batches are skipped; the first failure is
    /// returned after everything else has been recorded.
    pub fn draw(
        &mut self,
        frame: &mut FrameContext<'_>,
        render: &mut RenderSystem,
        scene: &Scene,
        assets: &TextureAssets,
        clear: wgpu::Color,
    ) -> Result<RenderStats, RenderError> {
        self.backend.sync_textures(assets);
        let active_id = scene.active_entity().map_or(0, Entity::picking_id);
        self.backend
            .set_frame(scene.camera.view_projection(), active_id);

        let mut first_error = None;
        let mut keep = |result: Result<RenderStats, RenderError>| match result {
            Ok(stats) => stats,
            Err(e) => {
                first_error.get_or_insert(e);
                RenderStats::default()
            }
        };

        keep(render.render(&mut self.backend, Layer::Bottom));
        self.backend
            .encode_picking_pass(&mut frame.encoder, &self.picking);

        let bottom = keep(render.render(&mut self.backend, Layer::Bottom));
        let top = keep(render.render(&mut self.backend, Layer::Top));
        self.backend
            .encode_main_pass(&mut frame.encoder, &frame.view, Some(clear));

        match first_error {
            Some(e) => Err(e),
            None => Ok(RenderStats {
                batches: bottom.batches + top.batches,
                draw_calls: bottom.draw_calls + top.draw_calls,
                quads: bottom.quads + top.quads,
            }),
        }
    }

    /// The entity under window pixel `cursor`, from the last submitted
    /// picking pass.
    pub fn pick(&self, gpu: &GpuContext, scene: &Scene, cursor: Vec2) -> Result<Option<Entity>, RenderError> {
        if cursor.x < 0.0 || cursor.y < 0.0 {
            return Ok(None);
        }
        let raw = self
            .picking
            .read_pixel(&gpu.device, &gpu.queue, cursor.x as u32, cursor.y as u32)?;
        Ok(decode_entity_id(raw).and_then(|index| scene.world.entity_at_index(index)))
    }
}
