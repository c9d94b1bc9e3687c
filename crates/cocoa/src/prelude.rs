//! Convenience re-exports: `use cocoa::prelude::*` for the common items.

pub use crate::asset::{AssetError, TextureAssets, TextureHandle};
pub use crate::commands::{
    ChangeEnumCommand, ChangeFloatCommand, ChangeVec2Command, ChangeVec3Command,
    ChangeVec4Command, Command, CommandError, CommandHistory, EnumField, FloatField,
    SceneCommand, Vec2Field, Vec3Field, Vec4Field,
};
pub use crate::components::{BodyType2D, Box2D, Rigidbody2D, Sprite, SpriteRenderer};
pub use crate::ecs::{Entity, World};
pub use crate::editor::{GizmoMode, GizmoSystem, LevelEditor};
pub use crate::input::{InputState, KeyCode, Modifiers, MouseButton};
pub use crate::math::{Mat4, Transform, Vec2, Vec3, Vec4};
pub use crate::project::{EditorData, ProjectData};
pub use crate::render2d::{Camera2d, Drawable, Layer, RenderError, RenderSystem};
pub use crate::scene::{Scene, SceneData, SceneError};
pub use crate::settings::{EngineSettings, Physics2dSettings, RenderSettings, WindowSettings};
pub use crate::time::Time;

#[cfg(feature = "render2d")]
pub use crate::app::{App, AppError};

#[cfg(feature = "physics2d")]
pub use crate::physics2d::PhysicsWorld2d;
