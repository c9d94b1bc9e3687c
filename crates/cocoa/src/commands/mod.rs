//! # Commands: Reversible Scene Edits
//!
//! Every edit the editor makes to a scene (gizmo drags, inspector fields)
//! goes through a [`Command`] pushed onto a [`CommandHistory`], so it can be
//! undone and redone.
//!
//! ```text
//!  gizmo drag frame 1 ─► ChangeVec3Command(e, Position, p1) ─┐
//!  gizmo drag frame 2 ─► ChangeVec3Command(e, Position, p2) ─┤ merged into
//!  gizmo drag frame 3 ─► ChangeVec3Command(e, Position, p3) ─┘ one entry
//!  mouse release      ─► set_no_merge_most_recent()
//!  Ctrl+Z             ─► position back to p0
//! ```
//!
//! ## Commands Address Fields, Not Memory
//!
//! A command stores `(entity, field selector)` and resolves it every time it
//! runs. If the entity was despawned or the component removed, the command
//! fails with a [`CommandError`]; the history logs it and drops the entry.
//!
//! ## Tagged Variants
//!
//! [`SceneCommand`] is a closed enum with one variant per value type. Two
//! commands merge only when they are the same variant, target the same
//! entity, and name the same field; the values themselves are never
//! compared.

mod field;
mod history;

pub use field::{
    ChangeEnumCommand, ChangeFloatCommand, ChangeVec2Command, ChangeVec3Command,
    ChangeVec4Command, EnumField, FieldEdit, FieldSelector, FloatField, Vec2Field, Vec3Field,
    Vec4Field,
};
pub use history::CommandHistory;

use crate::ecs::Entity;
use crate::scene::Scene;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("entity {0} no longer exists")]
    StaleTarget(Entity),
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },
}

/// A reversible edit.
pub trait Command {
    fn execute(&mut self, scene: &mut Scene) -> Result<(), CommandError>;

    /// Restore the state captured by the first `execute`.
    fn undo(&mut self, scene: &mut Scene) -> Result<(), CommandError>;

    /// Fold `next` into `self` if both edit the same target. Returns whether
    /// it did.
    fn try_merge(&mut self, next: &Self) -> bool;
}

/// Discriminator of [`SceneCommand`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ChangeFloat,
    ChangeVec2,
    ChangeVec3,
    ChangeVec4,
    ChangeEnum,
}

impl<F: FieldSelector> Command for FieldEdit<F> {
    fn execute(&mut self, scene: &mut Scene) -> Result<(), CommandError> {
        self.apply(&mut scene.world)
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<(), CommandError> {
        self.revert(&mut scene.world)
    }

    fn try_merge(&mut self, next: &Self) -> bool {
        self.absorb(next)
    }
}

/// Every edit the editor can record.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    Float(ChangeFloatCommand),
    Vec2(ChangeVec2Command),
    Vec3(ChangeVec3Command),
    Vec4(ChangeVec4Command),
    Enum(ChangeEnumCommand),
}

impl SceneCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            SceneCommand::Float(c) => c.kind(),
            SceneCommand::Vec2(c) => c.kind(),
            SceneCommand::Vec3(c) => c.kind(),
            SceneCommand::Vec4(c) => c.kind(),
            SceneCommand::Enum(c) => c.kind(),
        }
    }

    pub fn entity(&self) -> Entity {
        match self {
            SceneCommand::Float(c) => c.entity(),
            SceneCommand::Vec2(c) => c.entity(),
            SceneCommand::Vec3(c) => c.entity(),
            SceneCommand::Vec4(c) => c.entity(),
            SceneCommand::Enum(c) => c.entity(),
        }
    }
}

impl Command for SceneCommand {
    fn execute(&mut self, scene: &mut Scene) -> Result<(), CommandError> {
        match self {
            SceneCommand::Float(c) => c.execute(scene),
            SceneCommand::Vec2(c) => c.execute(scene),
            SceneCommand::Vec3(c) => c.execute(scene),
            SceneCommand::Vec4(c) => c.execute(scene),
            SceneCommand::Enum(c) => c.execute(scene),
        }
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<(), CommandError> {
        match self {
            SceneCommand::Float(c) => c.undo(scene),
            SceneCommand::Vec2(c) => c.undo(scene),
            SceneCommand::Vec3(c) => c.undo(scene),
            SceneCommand::Vec4(c) => c.undo(scene),
            SceneCommand::Enum(c) => c.undo(scene),
        }
    }

    fn try_merge(&mut self, next: &Self) -> bool {
        match (self, next) {
            (SceneCommand::Float(a), SceneCommand::Float(b)) => a.try_merge(b),
            (SceneCommand::Vec2(a), SceneCommand::Vec2(b)) => a.try_merge(b),
            (SceneCommand::Vec3(a), SceneCommand::Vec3(b)) => a.try_merge(b),
            (SceneCommand::Vec4(a), SceneCommand::Vec4(b)) => a.try_merge(b),
            (SceneCommand::Enum(a), SceneCommand::Enum(b)) => a.try_merge(b),
            _ => false,
        }
    }
}

macro_rules! impl_from_edit {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        $(impl From<$ty> for SceneCommand {
            fn from(edit: $ty) -> Self {
                SceneCommand::$variant(edit)
            }
        })+
    };
}

impl_from_edit!(
    Float => ChangeFloatCommand,
    Vec2 => ChangeVec2Command,
    Vec3 => ChangeVec3Command,
    Vec4 => ChangeVec4Command,
    Enum => ChangeEnumCommand,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BodyType2D, Rigidbody2D};
    use crate::math::{Transform, Vec3};

    #[test]
    fn different_variants_never_merge() {
        let mut scene = Scene::new();
        let e = scene.world.spawn((Transform::default(), Rigidbody2D::default()));
        let mut a: SceneCommand = ChangeFloatCommand::new(e, FloatField::Mass, 2.0).into();
        let b: SceneCommand = ChangeEnumCommand::new(e, EnumField::BodyType, BodyType2D::Static).into();
        let c: SceneCommand = ChangeVec3Command::new(e, Vec3Field::Position, Vec3::ONE).into();
        assert!(!a.try_merge(&b));
        assert!(!a.try_merge(&c));
        assert_eq!(a.kind(), CommandKind::ChangeFloat);
        assert_eq!(b.kind(), CommandKind::ChangeEnum);
        assert_eq!(c.entity(), e);
    }

    #[test]
    fn enum_command_round_trip() {
        let mut scene = Scene::new();
        let e = scene.world.spawn((Rigidbody2D::default(),));
        let mut cmd: SceneCommand = ChangeEnumCommand::new(e, EnumField::BodyType, BodyType2D::Kinematic).into();
        cmd.execute(&mut scene).unwrap();
        assert_eq!(scene.world.get::<Rigidbody2D>(e).unwrap().body_type, BodyType2D::Kinematic);
        cmd.undo(&mut scene).unwrap();
        assert_eq!(scene.world.get::<Rigidbody2D>(e).unwrap().body_type, BodyType2D::Dynamic);
    }
}
