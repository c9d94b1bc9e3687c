//! # Storage: Sparse Sets
//!
//! Each component type lives in its own [`SparseSet<T>`]: a packed `dense`
//! array of values, a parallel array of owning entities, and a `sparse`
//! array indexed by entity slot that points into the packed arrays.
//!
//! ```text
//! sparse:   [Some(1), None, Some(0)]     ← indexed by Entity::index
//! entities: [E2, E0]
//! dense:    [T(E2), T(E0)]
//! ```
//!
//! Insert and remove are O(1) (removal swap-removes and patches the moved
//! entity's sparse slot). Iteration walks the packed arrays, which is what
//! the renderer does every frame.
//!
//! The world keeps storages type-erased behind [`AnyStorage`] so it can
//! remove every component of a despawned entity without knowing the types.
//!
//! ## Comparison
//!
//! - **EnTT (C++)**: the same sparse-set layout, with paging for the sparse
//!   array. The engine this editor comes from stored its scene in EnTT.
//! - **Archetype ECS (hecs, bevy_ecs)**: faster multi-component iteration,
//!   but adding or removing a component moves the whole entity.

use std::any::Any;

use super::entity::Entity;

/// Type-erased view of a [`SparseSet`].
pub(crate) trait AnyStorage: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Drop the entity's component, if present.
    fn remove_entity(&mut self, entity: Entity) -> bool;
}

/// Packed storage for one component type.
pub(crate) struct SparseSet<T> {
    sparse: Vec<Option<usize>>,
    entities: Vec<Entity>,
    dense: Vec<T>,
}

impl<T> SparseSet<T> {
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            dense: Vec::new(),
        }
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        let slot = *self.sparse.get(entity.index as usize)?;
        let idx = slot?;
        (self.entities[idx] == entity).then_some(idx)
    }

    /// Insert or replace the component for `entity`. Returns the old value.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        let slot = entity.index as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }
        if let Some(idx) = self.sparse[slot] {
            if self.entities[idx] == entity {
                return Some(std::mem::replace(&mut self.dense[idx], value));
            }
            // Leftover from an older generation in the same slot.
            self.swap_remove_at(idx);
        }
        self.sparse[slot] = Some(self.dense.len());
        self.entities.push(entity);
        self.dense.push(value);
        None
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|idx| &self.dense[idx])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.dense_index(entity).map(|idx| &mut self.dense[idx])
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let idx = self.dense_index(entity)?;
        Some(self.swap_remove_at(idx))
    }

    fn swap_remove_at(&mut self, idx: usize) -> T {
        let removed = self.entities[idx];
        self.sparse[removed.index as usize] = None;
        self.entities.swap_remove(idx);
        let value = self.dense.swap_remove(idx);
        if let Some(moved) = self.entities.get(idx) {
            self.sparse[moved.index as usize] = Some(idx);
        }
        value
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }
}

impl<T: 'static + Send + Sync> AnyStorage for SparseSet<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(index: u32, generation: u32) -> Entity {
        Entity { index, generation }
    }

    #[test]
    fn insert_get_replace() {
        let mut set = SparseSet::new();
        assert_eq!(set.insert(e(3, 0), 1.0f32), None);
        assert_eq!(set.get(e(3, 0)), Some(&1.0));
        assert_eq!(set.insert(e(3, 0), 2.0), Some(1.0));
        assert_eq!(set.iter().count(), 1);
    }

    #[test]
    fn stale_generation_misses() {
        let mut set = SparseSet::new();
        set.insert(e(0, 0), 10u32);
        assert_eq!(set.get(e(0, 1)), None);
        // A newer generation replaces the leftover value.
        set.insert(e(0, 1), 20u32);
        assert_eq!(set.iter().count(), 1);
        assert_eq!(set.get(e(0, 0)), None);
        assert_eq!(set.get(e(0, 1)), Some(&20));
    }

    #[test]
    fn remove_patches_moved_entity() {
        let mut set = SparseSet::new();
        set.insert(e(0, 0), 'a');
        set.insert(e(1, 0), 'b');
        set.insert(e(2, 0), 'c');
        assert_eq!(set.remove(e(0, 0)), Some('a'));
        assert_eq!(set.get(e(2, 0)), Some(&'c'));
        assert_eq!(set.get(e(1, 0)), Some(&'b'));
        assert_eq!(set.iter().count(), 2);
    }
}
