//! # Picking: Which Entity Is Under the Cursor
//!
//! The scene batches are drawn a second time into an `R32Uint` texture with
//! a fragment shader that writes each vertex's `entity_id` (slot index + 1)
//! instead of a color. Clicking reads back the single texel under the mouse.
//!
//! ```text
//!  picking pass                        readback
//!  ┌───────────────────────┐           copy 1×1 texel at (x, y)
//!  │ 0 0 0 0 0 0 0 0 0 0   │  ──────►  buffer (256-byte row)
//!  │ 0 0 3 3 3 0 0 0 0 0   │           map_async + poll(Wait)
//!  │ 0 0 3 3 3 0 7 7 0 0   │           raw u32: 0 = nothing,
//!  │ 0 0 0 0 0 0 7 7 0 0   │                    n = entity slot n - 1
//!  └───────────────────────┘
//! ```
//!
//! Transparent texels are discarded, so clicks through the empty parts of a
//! sprite hit whatever is behind it.
//!
//! ## Comparison
//!
//! - **CPU hit-testing** (walk sprites, test bounds): no GPU round trip, but
//!   ignores texture alpha and has to replicate z order. The physics world's
//!   `overlap_point` does this for colliders.
//! - **Color-encoded ids in the main target**: saves a texture but limits ids
//!   to 24 bits and breaks with blending.

use super::RenderError;

pub const PICKING_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;

/// Rows copied to a buffer must be 256-byte aligned, even for one texel.
const READBACK_ROW_BYTES: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// Slot index encoded in a raw picking value, `None` for background.
pub fn decode_entity_id(raw: u32) -> Option<u32> {
    raw.checked_sub(1)
}

/// Off-screen integer target plus a one-texel readback buffer.
pub struct PickingTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    width: u32,
    height: u32,
}

impl PickingTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("picking target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICKING_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("picking readback"),
            size: READBACK_ROW_BYTES as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            texture,
            view,
            readback,
            width,
            height,
        }
    }

    /// Recreate the texture if the surface size changed.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if (width.max(1), height.max(1)) != (self.width, self.height) {
            *self = Self::new(device, width, height);
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Read the raw id at pixel (`x`, `y`), origin top-left. Blocks until the
    /// GPU has finished all submitted work. Outside the target reads as 0.
    pub fn read_pixel(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        x: u32,
        y: u32,
    ) -> Result<u32, RenderError> {
        if x >= self.width || y >= self.height {
            return Ok(0);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("picking readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(READBACK_ROW_BYTES),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let submission = queue.submit(Some(encoder.finish()));

        let slice = self.readback.slice(..4);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission),
                timeout: None,
            })
            .map_err(|e| RenderError::Readback(format!("device poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|e| RenderError::Readback(e.to_string()))?
            .map_err(|e| RenderError::Readback(e.to_string()))?;

        let raw = {
            let data = slice.get_mapped_range();
            u32::from_ne_bytes([data[0], data[1], data[2], data[3]])
        };
        self.readback.unmap();
        Ok(raw)
    }
}
