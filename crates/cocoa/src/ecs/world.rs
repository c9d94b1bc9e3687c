//! # World: Entities, Components, Names
//!
//! The [`World`] owns every entity of a scene, their components (one
//! [`SparseSet`] per component type), and entity names.
//!
//! ```text
//! World
//! ├── entities:  EntityAllocator      (generational ids)
//! ├── storages:  TypeId → SparseSet<T> (type-erased)
//! └── names:     Entity → String
//! ```
//!
//! Systems read component pairs with [`view2`](World::view2) and write
//! single components through [`get_mut`](World::get_mut).

use std::any::TypeId;
use std::collections::HashMap;

use super::entity::{Entity, EntityAllocator};
use super::storage::{AnyStorage, SparseSet};

/// Central container for entities, components, and names.
pub struct World {
    entities: EntityAllocator,
    storages: HashMap<TypeId, Box<dyn AnyStorage>>,
    names: HashMap<Entity, String>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            storages: HashMap::new(),
            names: HashMap::new(),
        }
    }

    // ── Entities ─────────────────────────────────────────────────────────

    pub fn spawn_empty(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Spawn an entity with a bundle of components, e.g. `(Transform, SpriteRenderer)`.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.entities.allocate();
        bundle.insert_into(self, entity);
        entity
    }

    /// Despawn an entity and drop all of its components.
    ///
    /// Returns `false` if the entity was already dead.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.deallocate(entity) {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        self.names.remove(&entity);
        true
    }

    /// Despawn everything.
    pub fn clear_entities(&mut self) {
        let all: Vec<Entity> = self.entities.iter_alive().collect();
        for entity in all {
            self.despawn(entity);
        }
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// The live entity occupying slot `index`. Used to resolve picking ids.
    pub fn entity_at_index(&self, index: u32) -> Option<Entity> {
        self.entities.at_index(index)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// All live entities in slot order.
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.iter_alive().collect()
    }

    // ── Names ────────────────────────────────────────────────────────────

    pub fn name_entity(&mut self, entity: Entity, name: &str) {
        if self.is_alive(entity) {
            self.names.insert(entity, name.to_owned());
        }
    }

    pub fn entity_name(&self, entity: Entity) -> Option<&str> {
        self.names.get(&entity).map(String::as_str)
    }

    pub fn try_named(&self, name: &str) -> Option<Entity> {
        self.names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(e, _)| *e)
    }

    // ── Components ───────────────────────────────────────────────────────

    fn storage<T: 'static + Send + Sync>(&self) -> Option<&SparseSet<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref())
    }

    fn storage_mut<T: 'static + Send + Sync>(&mut self) -> Option<&mut SparseSet<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut())
    }

    /// Add or replace a component. Ignored (with a warning) for dead entities.
    pub fn insert<T: 'static + Send + Sync>(&mut self, entity: Entity, component: T) {
        if !self.is_alive(entity) {
            log::warn!(
                "insert `{}` on dead entity {entity:?} ignored",
                std::any::type_name::<T>()
            );
            return;
        }
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(SparseSet::<T>::new()) as Box<dyn AnyStorage>);
        if let Some(set) = storage.as_any_mut().downcast_mut::<SparseSet<T>>() {
            set.insert(entity, component);
        }
    }

    pub fn get<T: 'static + Send + Sync>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    pub fn get_mut<T: 'static + Send + Sync>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity)
    }

    pub fn has<T: 'static + Send + Sync>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Remove a component and return it.
    pub fn remove<T: 'static + Send + Sync>(&mut self, entity: Entity) -> Option<T> {
        self.storage_mut::<T>()?.remove(entity)
    }

    /// Read-only iteration over entities carrying both `A` and `B`.
    pub fn view2<A, B>(&self, mut f: impl FnMut(Entity, &A, &B))
    where
        A: 'static + Send + Sync,
        B: 'static + Send + Sync,
    {
        let (Some(a), Some(b)) = (self.storage::<A>(), self.storage::<B>()) else {
            return;
        };
        for (entity, a) in a.iter() {
            if let Some(b) = b.get(entity) {
                f(entity, a, b);
            }
        }
    }
}

// ── Bundles ──────────────────────────────────────────────────────────────

/// A set of components inserted together by [`World::spawn`].
pub trait Bundle {
    fn insert_into(self, world: &mut World, entity: Entity);
}

macro_rules! impl_bundle_tuple {
    ($($C:ident),+) => {
        impl<$($C: 'static + Send + Sync),+> Bundle for ($($C,)+) {
            #[allow(non_snake_case)]
            fn insert_into(self, world: &mut World, entity: Entity) {
                let ($($C,)+) = self;
                $(world.insert(entity, $C);)+
            }
        }
    };
}

impl_bundle_tuple!(A);
impl_bundle_tuple!(A, B);
impl_bundle_tuple!(A, B, C);
impl_bundle_tuple!(A, B, C, D);
impl_bundle_tuple!(A, B, C, D, E);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pos(f32);
    #[derive(Debug, PartialEq)]
    struct Vel(f32);

    #[test]
    fn spawn_and_get() {
        let mut world = World::new();
        let e = world.spawn((Pos(1.0), Vel(2.0)));
        assert_eq!(world.get::<Pos>(e), Some(&Pos(1.0)));
        assert_eq!(world.get::<Vel>(e), Some(&Vel(2.0)));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn despawn_drops_components_and_names() {
        let mut world = World::new();
        let e = world.spawn((Pos(1.0),));
        world.name_entity(e, "player");
        assert!(world.despawn(e));
        assert!(!world.is_alive(e));
        assert_eq!(world.get::<Pos>(e), None);
        assert_eq!(world.try_named("player"), None);
        assert!(!world.despawn(e));
    }

    #[test]
    fn view2_reads_pairs() {
        let mut world = World::new();
        world.spawn((Pos(1.0), Vel(3.0)));
        world.spawn((Vel(4.0),));
        let mut sum = 0.0;
        world.view2::<Pos, Vel>(|_, p, v| sum += p.0 + v.0);
        assert_eq!(sum, 4.0);
    }

    #[test]
    fn entity_at_index_follows_recycling() {
        let mut world = World::new();
        let e = world.spawn((Pos(0.0),));
        world.despawn(e);
        assert_eq!(world.entity_at_index(e.index()), None);
        let again = world.spawn((Pos(1.0),));
        assert_eq!(world.entity_at_index(e.index()), Some(again));
    }
}
