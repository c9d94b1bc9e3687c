//! Per-batch texture slot allocation.
//!
//! A batch can sample at most [`MAX_TEXTURE_SLOTS`] distinct textures in its
//! single draw call. Slots are handed out in first-use order and numbered
//! from 1 (slot 0 is "untextured").

use crate::asset::TextureHandle;

pub const MAX_TEXTURE_SLOTS: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct TextureSlots {
    slots: Vec<TextureHandle>,
}

impl TextureSlots {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(MAX_TEXTURE_SLOTS),
        }
    }

    pub fn contains(&self, texture: TextureHandle) -> bool {
        self.slots.contains(&texture)
    }

    pub fn has_room(&self) -> bool {
        self.slots.len() < MAX_TEXTURE_SLOTS
    }

    /// Could `texture` be sampled by this batch (already slotted, or room left)?
    pub fn can_hold(&self, texture: TextureHandle) -> bool {
        self.contains(texture) || self.has_room()
    }

    /// 1-based slot of `texture`, if it has one.
    pub fn slot_of(&self, texture: TextureHandle) -> Option<u32> {
        self.slots
            .iter()
            .position(|&t| t == texture)
            .map(|i| i as u32 + 1)
    }

    /// Slot for `texture`, allocating one if needed. `None` when full.
    pub fn insert(&mut self, texture: TextureHandle) -> Option<u32> {
        if let Some(slot) = self.slot_of(texture) {
            return Some(slot);
        }
        if !self.has_room() {
            return None;
        }
        self.slots.push(texture);
        Some(self.slots.len() as u32)
    }

    /// `(slot, texture)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, TextureHandle)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, &t)| (i as u32 + 1, t))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_one_based_and_deduplicated() {
        let mut slots = TextureSlots::new();
        assert_eq!(slots.insert(TextureHandle(7)), Some(1));
        assert_eq!(slots.insert(TextureHandle(3)), Some(2));
        assert_eq!(slots.insert(TextureHandle(7)), Some(1));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.slot_of(TextureHandle(3)), Some(2));
        assert_eq!(slots.slot_of(TextureHandle(9)), None);
    }

    #[test]
    fn full_set_rejects_new_but_keeps_old() {
        let mut slots = TextureSlots::new();
        for i in 0..MAX_TEXTURE_SLOTS as u32 {
            assert!(slots.insert(TextureHandle(i)).is_some());
        }
        assert!(!slots.has_room());
        assert_eq!(slots.insert(TextureHandle(100)), None);
        assert!(!slots.can_hold(TextureHandle(100)));
        assert!(slots.can_hold(TextureHandle(4)));
        slots.clear();
        assert!(slots.is_empty());
    }
}
