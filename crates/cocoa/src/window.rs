//! Window management via winit.
//!
//! Implements [`winit::application::ApplicationHandler`] to drive the event
//! loop: window and GPU creation, input forwarding, resize, and the editor
//! frame.
//!
//! ```text
//! RedrawRequested
//!   time.update
//!   editor.update          physics step (playing) or gizmo drag
//!   overlay.build_ui       panel edits applied through commands
//!   render.begin_frame
//!   editor.submit          scene sprites + gizmos
//!   passes.draw            picking pass, main pass (Bottom, Top)
//!   overlay.render_overlay
//!   present
//! ```

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::app::{AppError, SetupFn};
use crate::asset::TextureAssets;
use crate::editor::LevelEditor;
use crate::input::InputState;
use crate::project::ProjectData;
use crate::render::gpu::GpuContext;
use crate::render::pass::{ScenePasses, clear_color, render_frame};
use crate::render2d::RenderSystem;
use crate::scene::Scene;
use crate::settings::EngineSettings;
use crate::time::Time;

/// The application state that winit drives.
pub(crate) struct WinitApp {
    scene: Scene,
    assets: TextureAssets,
    render: RenderSystem,
    editor: LevelEditor,
    input: InputState,
    time: Time,
    setup: Vec<SetupFn>,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    passes: Option<ScenePasses>,
    #[cfg(feature = "editor")]
    overlay: Option<crate::editor::EditorOverlay>,
    fatal: Option<AppError>,
}

impl WinitApp {
    pub fn new(settings: EngineSettings, project: ProjectData, setup: Vec<SetupFn>) -> Result<Self, AppError> {
        let mut assets = TextureAssets::new();
        let render = RenderSystem::new(settings.render.max_batch_quads);
        let editor = LevelEditor::new(settings, &mut assets)?.with_project(project);
        Ok(Self {
            scene: Scene::new(),
            assets,
            render,
            editor,
            input: InputState::default(),
            time: Time::new(),
            setup,
            window: None,
            gpu: None,
            passes: None,
            #[cfg(feature = "editor")]
            overlay: None,
            fatal: None,
        })
    }

    pub fn take_fatal(&mut self) -> Option<AppError> {
        self.fatal.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{error}");
        self.fatal = Some(error);
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_settings = &self.editor.settings.window;
        let attrs = Window::default_attributes()
            .with_title(window_settings.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                window_settings.width as f64,
                window_settings.height as f64,
            ));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let gpu = GpuContext::new(window.clone())?;
        let (width, height) = gpu.surface_size();
        self.scene.camera.set_viewport(width, height);
        self.passes = Some(ScenePasses::new(&gpu));

        #[cfg(feature = "editor")]
        {
            self.overlay = Some(crate::editor::EditorOverlay::new(&gpu, &window));
        }

        self.gpu = Some(gpu);
        self.window = Some(window);
        log::info!("window created ({width}x{height})");
        Ok(())
    }

    fn run_setup(&mut self) {
        let scene_path = self.editor.scene_path();
        if self.editor.project.current_scene_path().is_some() && scene_path.exists() {
            if let Err(e) = self.editor.load_scene(&mut self.scene, &mut self.assets) {
                log::error!("cannot open {}: {e}", scene_path.display());
            }
        }
        for setup in std::mem::take(&mut self.setup) {
            setup(&mut self.scene, &mut self.assets);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
            if let Some(passes) = &mut self.passes {
                passes.resize(gpu);
            }
        }
        if width > 0 && height > 0 {
            self.scene.camera.set_viewport(width, height);
        }
    }

    fn overlay_wants_pointer(&self) -> bool {
        #[cfg(feature = "editor")]
        {
            self.overlay.as_ref().is_some_and(|o| o.wants_pointer())
        }
        #[cfg(not(feature = "editor"))]
        {
            false
        }
    }

    fn left_pressed(&mut self) {
        if self.overlay_wants_pointer() {
            return;
        }
        let cursor = self.input.cursor;
        let picked = match (&self.gpu, &self.passes) {
            (Some(gpu), Some(passes)) => passes
                .pick(gpu, &self.scene, cursor)
                .unwrap_or_else(|e| {
                    log::warn!("{e}");
                    None
                }),
            _ => None,
        };
        let mouse_world = self.scene.camera.screen_to_world(cursor);
        self.editor
            .mouse_pressed(&mut self.scene, mouse_world, picked);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.time.update();
        let dt = self.time.delta_secs();
        let mouse_world = self.scene.camera.screen_to_world(self.input.cursor);
        self.editor.update(&mut self.scene, mouse_world, dt);

        #[cfg(feature = "editor")]
        if let (Some(window), Some(overlay)) = (&self.window, &mut self.overlay) {
            overlay.build_ui(window, &mut self.editor, &mut self.scene, &mut self.assets);
        }

        self.render.begin_frame();
        if let Err(e) = self.editor.submit(&self.scene, &mut self.render) {
            log::warn!("frame submission incomplete: {e}");
        }

        let clear = clear_color(self.editor.settings.render.clear_color);
        let Self {
            gpu,
            passes,
            render,
            scene,
            assets,
            #[cfg(feature = "editor")]
            overlay,
            ..
        } = self;
        let (Some(gpu), Some(passes)) = (gpu.as_ref(), passes.as_mut()) else {
            return;
        };

        let mut stats = None;
        let result = render_frame(gpu, |frame| {
            match passes.draw(frame, render, scene, assets, clear) {
                Ok(s) => stats = Some(s),
                Err(e) => log::error!("{e}"),
            }
            #[cfg(feature = "editor")]
            if let Some(overlay) = overlay.as_mut() {
                overlay.render_overlay(frame);
            }
        });

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = gpu.surface_size();
                self.resize(w, h);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("surface error: {e:?}"),
        }

        #[cfg(feature = "diagnostics")]
        if self.time.crossed_second() {
            if let Some(stats) = stats {
                log::info!(
                    "{:.0} fps, {} batches, {} draw calls, {} quads",
                    self.time.fps(),
                    stats.batches,
                    stats.draw_calls,
                    stats.quads
                );
            }
        }
        #[cfg(not(feature = "diagnostics"))]
        let _ = stats;

        self.input.end_frame();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for WinitApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            self.fail(event_loop, e);
            return;
        }
        self.run_setup();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "editor")]
        if let (Some(window), Some(overlay)) = (&self.window, &mut self.overlay) {
            let released = matches!(
                event,
                WindowEvent::MouseInput {
                    state: ElementState::Released,
                    ..
                }
            );
            // Releases still reach the viewport so a drag never gets stuck.
            if overlay.on_window_event(window, &event) && !released {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested, exiting");
                if let Some(passes) = &mut self.passes {
                    self.render.release(&mut passes.backend);
                }
                event_loop.exit();
            }

            WindowEvent::Resized(size) => self.resize(size.width, size.height),

            WindowEvent::Focused(false) => self.input.reset(),

            WindowEvent::ModifiersChanged(modifiers) => {
                self.input.modifiers = modifiers.state().into();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => {
                        if !self.input.keys.press(key) || event.repeat {
                            return;
                        }
                        #[cfg(feature = "editor")]
                        if key == crate::input::KeyCode::F12 {
                            if let Some(overlay) = &mut self.overlay {
                                overlay.visible = !overlay.visible;
                                log::info!("editor overlay {}", if overlay.visible { "shown" } else { "hidden" });
                            }
                            return;
                        }
                        let modifiers = self.input.modifiers;
                        self.editor
                            .handle_key(&mut self.scene, &self.assets, key, modifiers);
                    }
                    ElementState::Released => self.input.keys.release(key),
                }
            }

            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => {
                    self.input.mouse.press(button);
                    if button == MouseButton::Left {
                        self.left_pressed();
                    }
                }
                ElementState::Released => {
                    self.input.mouse.release(button);
                    if button == MouseButton::Left {
                        self.editor.mouse_released();
                    }
                }
            },

            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor = crate::math::Vec2::new(position.x as f32, position.y as f32);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
