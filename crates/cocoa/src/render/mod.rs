//! Window-surface plumbing shared by the scene renderer and the editor
//! overlay: the wgpu device and surface, and per-frame encoder setup.

pub mod gpu;
pub mod pass;

pub use gpu::{GpuContext, GpuError};
pub use pass::FrameContext;
