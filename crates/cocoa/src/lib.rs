//! # Cocoa: 2D Level Editor Engine
//!
//! A small 2D engine built around a batched sprite renderer and an editor
//! with command-based undo/redo. Scenes live in a sparse-set ECS, draw
//! through z-ordered quad batches with eight texture slots each, and are
//! edited with gizmos and an egui inspector.
//!
//! Start with `use cocoa::prelude::*` and build an [`App`](app::App).

pub mod asset;
pub mod commands;
pub mod components;
pub mod ecs;
pub mod editor;
pub mod input;
pub mod math;
pub mod prelude;
pub mod project;
pub mod render2d;
pub mod scene;
pub mod settings;
pub mod time;

#[cfg(feature = "render2d")]
pub mod app;
#[cfg(feature = "render2d")]
pub mod render;
#[cfg(feature = "render2d")]
pub(crate) mod window;

#[cfg(feature = "physics2d")]
pub mod physics2d;
