//! App builder.
//!
//! [`App`] is the entry point of the level editor. Configure settings and
//! the project, register setup closures that populate the scene, then call
//! [`run`](App::run) to open the window and start the event loop.
//!
//! # Example
//!
//! ```ignore
//! use cocoa::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     env_logger::init();
//!     App::new(EngineSettings::load_or_default("cocoa.json"))
//!         .setup(|scene, _assets| {
//!             scene.world.spawn((
//!                 Transform::from_xy(0.0, 0.0),
//!                 SpriteRenderer::colored(1.0, 0.5, 0.2, 1.0).size(64.0, 64.0),
//!             ));
//!         })
//!         .run()
//! }
//! ```

use crate::asset::{AssetError, TextureAssets};
use crate::project::{ProjectData, ProjectError};
use crate::render::GpuError;
use crate::scene::{Scene, SceneError};
use crate::settings::{EngineSettings, SettingsError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("cannot create the window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

pub(crate) type SetupFn = Box<dyn FnOnce(&mut Scene, &mut TextureAssets)>;

pub struct App {
    settings: EngineSettings,
    project: ProjectData,
    setup: Vec<SetupFn>,
}

impl App {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            project: ProjectData::default(),
            setup: Vec::new(),
        }
    }

    /// Open `project`. Its current scene, if the file exists, is loaded
    /// before the setup closures run.
    pub fn project(mut self, project: ProjectData) -> Self {
        self.project = project;
        self
    }

    /// Register a closure that runs once after the window is created.
    pub fn setup(mut self, f: impl FnOnce(&mut Scene, &mut TextureAssets) + 'static) -> Self {
        self.setup.push(Box::new(f));
        self
    }

    /// Start the event loop. Returns when the window is closed, or with the
    /// error that stopped the app.
    pub fn run(self) -> Result<(), AppError> {
        let event_loop = winit::event_loop::EventLoop::new()?;
        let mut app = crate::window::WinitApp::new(self.settings, self.project, self.setup)?;
        event_loop.run_app(&mut app)?;
        match app.take_fatal() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
