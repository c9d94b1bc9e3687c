//! egui overlay: toolbar, hierarchy, and inspector, toggled with F12.
//!
//! [`EditorOverlay`] lives in the app rather than in [`LevelEditor`] because
//! it needs the window and the GPU device, and `egui_winit::State` is not
//! `Sync`. Panel edits are collected during the UI pass and applied to the
//! scene through the editor afterwards.

use std::sync::Arc;

use crate::asset::TextureAssets;
use crate::render::gpu::GpuContext;
use crate::render::pass::FrameContext;
use crate::scene::Scene;

use super::LevelEditor;
use super::hierarchy::hierarchy_panel;
use super::inspector::{InspectorEdits, inspector_panel};
use super::toolbar::{ToolbarStatus, toolbar_panel};

pub struct EditorOverlay {
    egui_ctx: egui::Context,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
    paint_jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    frame_ready: bool,
}

impl EditorOverlay {
    pub fn new(gpu: &GpuContext, window: &Arc<winit::window::Window>) -> Self {
        let egui_ctx = egui::Context::default();

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_format(),
            egui_wgpu::RendererOptions::default(),
        );

        Self {
            egui_ctx,
            egui_winit,
            egui_renderer,
            visible: true,
            paint_jobs: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
            frame_ready: false,
        }
    }

    /// Forward a winit event to egui. Returns true if egui consumed it.
    pub fn on_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        if !self.visible {
            return false;
        }
        self.egui_winit.on_window_event(window, event).consumed
    }

    /// Whether the pointer is over a panel, so viewport clicks should be
    /// ignored.
    pub fn wants_pointer(&self) -> bool {
        self.visible && self.egui_ctx.is_pointer_over_area()
    }

    /// Run the panels and apply what they requested.
    pub fn build_ui(
        &mut self,
        window: &winit::window::Window,
        editor: &mut LevelEditor,
        scene: &mut Scene,
        assets: &mut TextureAssets,
    ) {
        if !self.visible {
            self.frame_ready = false;
            return;
        }

        let raw_input = self.egui_winit.take_egui_input(window);
        let status = ToolbarStatus {
            can_undo: editor.history.can_undo(),
            can_redo: editor.history.can_redo(),
            playing: editor.is_playing(),
            mode: editor.gizmos.mode(),
        };
        let mut selected = scene.active_entity();
        let mut action = None;
        let mut edits = InspectorEdits::default();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            action = toolbar_panel(ctx, &status);
            selected = hierarchy_panel(ctx, &scene.world, selected);
            edits = inspector_panel(ctx, &scene.world, selected);
        });

        if selected != scene.active_entity() {
            scene.set_active_entity(selected);
        }
        for command in edits.commands {
            if let Err(e) = editor.apply(scene, command) {
                log::warn!("inspector edit dropped: {e}");
            }
        }
        if edits.finished {
            editor.end_edit();
        }
        if let Some(action) = action {
            editor.perform(action, scene, assets);
        }

        self.egui_winit
            .handle_platform_output(window, full_output.platform_output);
        self.paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        self.textures_delta = full_output.textures_delta;
        self.frame_ready = true;
    }

    /// Draw the overlay on top of the scene in the current frame.
    pub fn render_overlay(&mut self, frame: &mut FrameContext<'_>) {
        if !self.frame_ready {
            return;
        }
        self.frame_ready = false;

        let gpu = frame.gpu;
        let (sw, sh) = gpu.surface_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [sw, sh],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        for (id, delta) in &self.textures_delta.set {
            self.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, delta);
        }

        let cmd_buffers = self.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut frame.encoder,
            &self.paint_jobs,
            &screen_descriptor,
        );
        if !cmd_buffers.is_empty() {
            gpu.queue.submit(cmd_buffers);
        }

        {
            let render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui overlay"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer.render(
                &mut render_pass.forget_lifetime(),
                &self.paint_jobs,
                &screen_descriptor,
            );
        }

        for id in &self.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
