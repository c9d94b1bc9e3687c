//! # wgpu Backend
//!
//! Implements [`RenderBackend`] on a wgpu device. Batches call it while the
//! render system walks them; the backend records one pending draw per batch
//! and replays the list into a render pass afterwards:
//!
//! ```text
//! RenderSystem::render(backend, Bottom)    upload + pending draws
//! backend.encode_picking_pass(..)          draws → R32Uint target
//! RenderSystem::render(backend, Bottom)    same batches again
//! RenderSystem::render(backend, Top)       gizmo batches
//! backend.encode_main_pass(..)             draws → surface
//! ```
//!
//! ## Bind Groups
//!
//! | group | binding | contents                                   |
//! |-------|---------|--------------------------------------------|
//! | 0     | 0       | `FrameUniform` (view-projection, active id) |
//! | 1     | 0–7     | texture slots 1–8 (unused slots = white)   |
//! | 1     | 8       | shared nearest-filter sampler              |
//!
//! Group 1 bind groups are cached by their slot contents, so a batch whose
//! textures did not change between frames reuses the same bind group.
//!
//! Textures are uploaded from [`TextureAssets`] by
//! [`sync_textures`](WgpuBackend::sync_textures); a handle that was never
//! uploaded samples as white.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::asset::{TextureAssets, TextureHandle};
use crate::math::Mat4;

use super::RenderError;
use super::backend::{BatchBuffersId, RenderBackend};
use super::picking::{PICKING_FORMAT, PickingTarget};
use super::texture_slots::MAX_TEXTURE_SLOTS;
use super::vertex::{FrameUniform, Vertex};

type SlotKey = [Option<TextureHandle>; MAX_TEXTURE_SLOTS];

/// Cached bind groups are dropped past this many distinct slot sets.
const MAX_CACHED_BIND_GROUPS: usize = 256;

struct BatchBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    max_vertices: usize,
}

struct PendingDraw {
    buffers: BatchBuffersId,
    index_count: u32,
    slots: SlotKey,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    sprite_pipeline: wgpu::RenderPipeline,
    picking_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: wgpu::TextureView,
    textures: HashMap<TextureHandle, wgpu::TextureView>,
    bind_groups: HashMap<SlotKey, wgpu::BindGroup>,
    buffers: HashMap<BatchBuffersId, BatchBuffers>,
    next_id: u32,
    bound: SlotKey,
    pending: Vec<PendingDraw>,
}

impl WgpuBackend {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite batch shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sprite.wgsl").into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let mut texture_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..MAX_TEXTURE_SLOTS as u32)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            })
            .collect();
        texture_entries.push(wgpu::BindGroupLayoutEntry {
            binding: MAX_TEXTURE_SLOTS as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture slots bind group layout"),
            entries: &texture_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite batch pipeline layout"),
            bind_group_layouts: &[&frame_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let sprite_pipeline = build_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "fs_main",
            surface_format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );
        let picking_pipeline = build_pipeline(device, &pipeline_layout, &shader, "fs_picking", PICKING_FORMAT, None);

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame uniform buffer"),
            contents: bytemuck::cast_slice(&[FrameUniform::new(Mat4::IDENTITY, 0)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame bind group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = upload_rgba(device, queue, "white 1x1", 1, 1, &[255, 255, 255, 255]);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            sprite_pipeline,
            picking_pipeline,
            frame_buffer,
            frame_bind_group,
            texture_layout,
            sampler,
            white,
            textures: HashMap::new(),
            bind_groups: HashMap::new(),
            buffers: HashMap::new(),
            next_id: 0,
            bound: [None; MAX_TEXTURE_SLOTS],
            pending: Vec::new(),
        }
    }

    /// Upload every texture in `assets` that is not on the GPU yet.
    pub fn sync_textures(&mut self, assets: &TextureAssets) {
        for id in 0..assets.len() as u32 {
            let handle = TextureHandle(id);
            if self.textures.contains_key(&handle) {
                continue;
            }
            let Some(asset) = assets.get(handle) else {
                continue;
            };
            let view = upload_rgba(
                &self.device,
                &self.queue,
                &asset.label,
                asset.width,
                asset.height,
                &asset.pixels,
            );
            self.textures.insert(handle, view);
            log::debug!("uploaded texture '{}' as {:?}", asset.label, handle);
        }
    }

    /// Camera matrix and highlighted entity for the next passes.
    pub fn set_frame(&self, view_proj: Mat4, active_entity_id: u32) {
        self.queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::cast_slice(&[FrameUniform::new(view_proj, active_entity_id)]),
        );
    }

    /// Replay pending draws into the surface view.
    pub fn encode_main_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear: Option<wgpu::Color>,
    ) {
        let load = clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear);
        self.encode(encoder, view, load, false);
    }

    /// Replay pending draws into the picking target, cleared to 0.
    pub fn encode_picking_pass(&mut self, encoder: &mut wgpu::CommandEncoder, target: &PickingTarget) {
        self.encode(
            encoder,
            target.view(),
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            true,
        );
    }

    pub fn pending_draws(&self) -> usize {
        self.pending.len()
    }

    fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
        picking: bool,
    ) {
        let draws = std::mem::take(&mut self.pending);
        if self.bind_groups.len() > MAX_CACHED_BIND_GROUPS {
            self.bind_groups.clear();
        }
        for draw in &draws {
            self.ensure_bind_group(draw.slots);
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(if picking { "picking pass" } else { "sprite batch pass" }),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(if picking {
            &self.picking_pipeline
        } else {
            &self.sprite_pipeline
        });
        pass.set_bind_group(0, &self.frame_bind_group, &[]);

        for draw in &draws {
            let (Some(buffers), Some(bind_group)) =
                (self.buffers.get(&draw.buffers), self.bind_groups.get(&draw.slots))
            else {
                continue;
            };
            pass.set_bind_group(1, bind_group, &[]);
            pass.set_vertex_buffer(0, buffers.vertex.slice(..));
            pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
    }

    fn ensure_bind_group(&mut self, slots: SlotKey) {
        if self.bind_groups.contains_key(&slots) {
            return;
        }
        let views: Vec<&wgpu::TextureView> = slots
            .iter()
            .map(|slot| {
                slot.and_then(|handle| self.textures.get(&handle))
                    .unwrap_or(&self.white)
            })
            .collect();
        let mut entries: Vec<wgpu::BindGroupEntry<'_>> = views
            .iter()
            .enumerate()
            .map(|(binding, view)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: MAX_TEXTURE_SLOTS as u32,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture slots bind group"),
            layout: &self.texture_layout,
            entries: &entries,
        });
        self.bind_groups.insert(slots, bind_group);
    }
}

impl RenderBackend for WgpuBackend {
    fn create_batch_buffers(
        &mut self,
        max_quads: usize,
        indices: &[u32],
    ) -> Result<BatchBuffersId, RenderError> {
        let max_vertices = max_quads * 4;
        let vertex_bytes = (max_vertices * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress;
        if vertex_bytes == 0 || vertex_bytes > self.device.limits().max_buffer_size {
            return Err(RenderError::Gpu(format!(
                "vertex buffer of {vertex_bytes} bytes for {max_quads} quads is out of range"
            )));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("batch vertex buffer"),
            size: vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("batch index buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(err) = validation.or(out_of_memory) {
            return Err(RenderError::Gpu(err.to_string()));
        }

        let id = BatchBuffersId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(
            id,
            BatchBuffers {
                vertex,
                index,
                max_vertices,
            },
        );
        Ok(id)
    }

    fn upload_vertices(&mut self, buffers: BatchBuffersId, vertices: &[Vertex]) -> Result<(), RenderError> {
        let target = self
            .buffers
            .get(&buffers)
            .ok_or(RenderError::UnknownBuffers(buffers))?;
        if vertices.len() > target.max_vertices {
            return Err(RenderError::Gpu(format!(
                "{} vertices exceed buffer capacity {}",
                vertices.len(),
                target.max_vertices
            )));
        }
        if !vertices.is_empty() {
            self.queue
                .write_buffer(&target.vertex, 0, bytemuck::cast_slice(vertices));
        }
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        match (unit as usize).checked_sub(1) {
            Some(i) if i < MAX_TEXTURE_SLOTS => {
                if !self.textures.contains_key(&texture) {
                    log::warn!("{texture:?} bound before upload; sampling white");
                }
                self.bound[i] = Some(texture);
            }
            _ => log::error!("texture unit {unit} out of range 1..={MAX_TEXTURE_SLOTS}"),
        }
    }

    fn draw_indexed(&mut self, buffers: BatchBuffersId, index_count: u32) -> Result<(), RenderError> {
        if !self.buffers.contains_key(&buffers) {
            return Err(RenderError::UnknownBuffers(buffers));
        }
        self.pending.push(PendingDraw {
            buffers,
            index_count,
            slots: self.bound,
        });
        Ok(())
    }

    fn unbind_textures(&mut self) {
        self.bound = [None; MAX_TEXTURE_SLOTS];
    }

    fn release_batch_buffers(&mut self, buffers: BatchBuffersId) {
        if let Some(b) = self.buffers.remove(&buffers) {
            b.vertex.destroy();
            b.index.destroy();
        }
        self.pending.retain(|d| d.buffers != buffers);
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn upload_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> wgpu::TextureView {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        pixels,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
