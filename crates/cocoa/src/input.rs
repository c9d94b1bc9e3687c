//! Keyboard and mouse input state.
//!
//! [`InputState`] is fed by the window event handler and read by the editor
//! once per frame. Shortcuts (Ctrl+Z and friends) need the modifier state,
//! so it is tracked next to the key sets.

use std::collections::HashSet;
use std::hash::Hash;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

use crate::math::Vec2;

/// Tracks the state of a set of inputs (keys or mouse buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
#[derive(Debug)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    /// Returns `true` on a fresh press, `false` for key repeat.
    pub fn press(&mut self, input: T) -> bool {
        let fresh = self.pressed.insert(input);
        if fresh {
            self.just_pressed.insert(input);
        }
        fresh
    }

    pub fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Clear per-frame state. Called at the end of each frame.
    pub fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }

    /// Forget everything, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        self.pressed.clear();
        self.clear_just();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ctrl/Shift state, updated from `ModifiersChanged`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl From<winit::keyboard::ModifiersState> for Modifiers {
    fn from(state: winit::keyboard::ModifiersState) -> Self {
        Self {
            // Cmd on macOS acts as Ctrl for shortcuts.
            ctrl: state.control_key() || state.super_key(),
            shift: state.shift_key(),
        }
    }
}

/// Everything the editor reads from the window each frame.
#[derive(Debug, Default)]
pub struct InputState {
    pub keys: Input<KeyCode>,
    pub mouse: Input<MouseButton>,
    pub modifiers: Modifiers,
    /// Cursor in window pixels, origin top-left.
    pub cursor: Vec2,
}

impl InputState {
    pub fn end_frame(&mut self) {
        self.keys.clear_just();
        self.mouse.clear_just();
    }

    pub fn reset(&mut self) {
        self.keys.reset();
        self.mouse.reset();
        self.modifiers = Modifiers::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_fresh_once_until_released() {
        let mut keys: Input<KeyCode> = Input::new();
        assert!(keys.press(KeyCode::KeyZ));
        assert!(!keys.press(KeyCode::KeyZ));
        assert!(keys.just_pressed(KeyCode::KeyZ));

        keys.clear_just();
        assert!(keys.pressed(KeyCode::KeyZ));
        assert!(!keys.just_pressed(KeyCode::KeyZ));

        keys.release(KeyCode::KeyZ);
        assert!(keys.just_released(KeyCode::KeyZ));
        assert!(!keys.pressed(KeyCode::KeyZ));
    }

    #[test]
    fn reset_drops_held_buttons() {
        let mut state = InputState::default();
        state.mouse.press(MouseButton::Left);
        state.modifiers.ctrl = true;
        state.reset();
        assert!(!state.mouse.pressed(MouseButton::Left));
        assert_eq!(state.modifiers, Modifiers::default());
    }
}
