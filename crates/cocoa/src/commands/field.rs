//! Field selectors and the generic field-edit command.
//!
//! A command never holds a reference into the world. It holds an
//! `(entity, selector)` pair and resolves it to a `&mut` slot each time it
//! runs, so a despawned entity or a removed component is detected instead of
//! written through.

use std::fmt;

use crate::components::{BodyType2D, Box2D, Rigidbody2D, SpriteRenderer};
use crate::ecs::{Entity, World};
use crate::math::{Transform, Vec2, Vec3, Vec4};

use super::{CommandError, CommandKind};

/// Names one field of one component type.
pub trait FieldSelector: Copy + PartialEq + fmt::Debug {
    type Value: Copy + PartialEq + fmt::Debug;
    const KIND: CommandKind;

    fn resolve(self, world: &mut World, entity: Entity) -> Result<&mut Self::Value, CommandError>;
}

fn component<'w, T: 'static + Send + Sync>(
    world: &'w mut World,
    entity: Entity,
    name: &'static str,
) -> Result<&'w mut T, CommandError> {
    if !world.is_alive(entity) {
        return Err(CommandError::StaleTarget(entity));
    }
    world
        .get_mut::<T>(entity)
        .ok_or(CommandError::MissingComponent { entity, component: name })
}

// ── Selectors ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatField {
    Mass,
    LinearDamping,
    AngularDamping,
    /// `Transform::euler_rotation.z`, degrees.
    RotationZ,
    SpriteWidth,
    SpriteHeight,
}

impl FieldSelector for FloatField {
    type Value = f32;
    const KIND: CommandKind = CommandKind::ChangeFloat;

    fn resolve(self, world: &mut World, entity: Entity) -> Result<&mut f32, CommandError> {
        Ok(match self {
            FloatField::Mass => &mut component::<Rigidbody2D>(world, entity, "Rigidbody2D")?.mass,
            FloatField::LinearDamping => {
                &mut component::<Rigidbody2D>(world, entity, "Rigidbody2D")?.linear_damping
            }
            FloatField::AngularDamping => {
                &mut component::<Rigidbody2D>(world, entity, "Rigidbody2D")?.angular_damping
            }
            FloatField::RotationZ => {
                &mut component::<Transform>(world, entity, "Transform")?.euler_rotation.z
            }
            FloatField::SpriteWidth => {
                &mut component::<SpriteRenderer>(world, entity, "SpriteRenderer")?.sprite.width
            }
            FloatField::SpriteHeight => {
                &mut component::<SpriteRenderer>(world, entity, "SpriteRenderer")?.sprite.height
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vec2Field {
    BoxSize,
    BoxHalfSize,
    BoxOffset,
    Velocity,
}

impl FieldSelector for Vec2Field {
    type Value = Vec2;
    const KIND: CommandKind = CommandKind::ChangeVec2;

    fn resolve(self, world: &mut World, entity: Entity) -> Result<&mut Vec2, CommandError> {
        Ok(match self {
            Vec2Field::BoxSize => &mut component::<Box2D>(world, entity, "Box2D")?.size,
            Vec2Field::BoxHalfSize => &mut component::<Box2D>(world, entity, "Box2D")?.half_size,
            Vec2Field::BoxOffset => &mut component::<Box2D>(world, entity, "Box2D")?.offset,
            Vec2Field::Velocity => &mut component::<Rigidbody2D>(world, entity, "Rigidbody2D")?.velocity,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vec3Field {
    Position,
    Scale,
    EulerRotation,
}

impl FieldSelector for Vec3Field {
    type Value = Vec3;
    const KIND: CommandKind = CommandKind::ChangeVec3;

    fn resolve(self, world: &mut World, entity: Entity) -> Result<&mut Vec3, CommandError> {
        let transform = component::<Transform>(world, entity, "Transform")?;
        Ok(match self {
            Vec3Field::Position => &mut transform.position,
            Vec3Field::Scale => &mut transform.scale,
            Vec3Field::EulerRotation => &mut transform.euler_rotation,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vec4Field {
    SpriteColor,
}

impl FieldSelector for Vec4Field {
    type Value = Vec4;
    const KIND: CommandKind = CommandKind::ChangeVec4;

    fn resolve(self, world: &mut World, entity: Entity) -> Result<&mut Vec4, CommandError> {
        match self {
            Vec4Field::SpriteColor => {
                Ok(&mut component::<SpriteRenderer>(world, entity, "SpriteRenderer")?.color)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumField {
    BodyType,
}

impl FieldSelector for EnumField {
    type Value = BodyType2D;
    const KIND: CommandKind = CommandKind::ChangeEnum;

    fn resolve(self, world: &mut World, entity: Entity) -> Result<&mut BodyType2D, CommandError> {
        match self {
            EnumField::BodyType => {
                Ok(&mut component::<Rigidbody2D>(world, entity, "Rigidbody2D")?.body_type)
            }
        }
    }
}

// ── FieldEdit ────────────────────────────────────────────────────────────

/// Set one field to `new_value`; undo writes back the value it replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEdit<F: FieldSelector> {
    entity: Entity,
    field: F,
    new_value: F::Value,
    /// Captured by the first successful execute.
    old_value: Option<F::Value>,
}

impl<F: FieldSelector> FieldEdit<F> {
    pub fn new(entity: Entity, field: F, new_value: F::Value) -> Self {
        Self {
            entity,
            field,
            new_value,
            old_value: None,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn field(&self) -> F {
        self.field
    }

    pub fn new_value(&self) -> F::Value {
        self.new_value
    }

    pub fn old_value(&self) -> Option<F::Value> {
        self.old_value
    }

    pub fn kind(&self) -> CommandKind {
        F::KIND
    }

    pub(crate) fn apply(&mut self, world: &mut World) -> Result<(), CommandError> {
        let slot = self.field.resolve(world, self.entity)?;
        if self.old_value.is_none() {
            self.old_value = Some(*slot);
        }
        *slot = self.new_value;
        Ok(())
    }

    pub(crate) fn revert(&mut self, world: &mut World) -> Result<(), CommandError> {
        let slot = self.field.resolve(world, self.entity)?;
        if let Some(old) = self.old_value {
            *slot = old;
        }
        Ok(())
    }

    /// Absorb `next` if it edits the same field of the same entity. Values
    /// are never compared.
    pub(crate) fn absorb(&mut self, next: &Self) -> bool {
        if self.entity != next.entity || self.field != next.field {
            return false;
        }
        self.new_value = next.new_value;
        true
    }
}

pub type ChangeFloatCommand = FieldEdit<FloatField>;
pub type ChangeVec2Command = FieldEdit<Vec2Field>;
pub type ChangeVec3Command = FieldEdit<Vec3Field>;
pub type ChangeVec4Command = FieldEdit<Vec4Field>;
pub type ChangeEnumCommand = FieldEdit<EnumField>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_reports_missing_component_and_stale_entity() {
        let mut world = World::new();
        let e = world.spawn((Transform::default(),));
        assert!(Vec3Field::Position.resolve(&mut world, e).is_ok());
        assert_eq!(
            FloatField::Mass.resolve(&mut world, e).unwrap_err(),
            CommandError::MissingComponent {
                entity: e,
                component: "Rigidbody2D"
            }
        );
        world.despawn(e);
        assert_eq!(
            Vec3Field::Position.resolve(&mut world, e).unwrap_err(),
            CommandError::StaleTarget(e)
        );
    }

    #[test]
    fn old_value_is_captured_once() {
        let mut world = World::new();
        let e = world.spawn((Rigidbody2D::default(),));
        let mut edit = ChangeFloatCommand::new(e, FloatField::Mass, 7.0);
        edit.apply(&mut world).unwrap();
        world.get_mut::<Rigidbody2D>(e).unwrap().mass = 3.0;
        edit.apply(&mut world).unwrap();
        assert_eq!(edit.old_value(), Some(1.0));

        edit.revert(&mut world).unwrap();
        assert_eq!(world.get::<Rigidbody2D>(e).unwrap().mass, 1.0);
    }

    #[test]
    fn absorb_requires_same_entity_and_field() {
        let mut world = World::new();
        let a = world.spawn_empty();
        let b = world.spawn_empty();
        let mut edit = ChangeVec3Command::new(a, Vec3Field::Position, Vec3::X);
        assert!(!edit.absorb(&ChangeVec3Command::new(b, Vec3Field::Position, Vec3::Y)));
        assert!(!edit.absorb(&ChangeVec3Command::new(a, Vec3Field::Scale, Vec3::Y)));
        assert!(edit.absorb(&ChangeVec3Command::new(a, Vec3Field::Position, Vec3::X)));
        assert!(edit.absorb(&ChangeVec3Command::new(a, Vec3Field::Position, Vec3::Y)));
        assert_eq!(edit.new_value(), Vec3::Y);
    }
}
