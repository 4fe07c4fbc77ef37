//! Input state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` is true every frame the key is
//!   physically down. Used for continuous actions like gallery rotation.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only until
//!   `end_frame()`, which the main loop calls after at least one fixed step
//!   consumed them, so a press landing on a frame with zero steps is not lost.
//!
//! The same `EdgeSet` bookkeeping backs keyboard keys, mouse buttons and
//! controller buttons: a repeated "pressed" report for something already
//! held never produces a second edge.

use std::collections::HashSet;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    F3,
    Left,
    Right,
    /// Next gallery page.
    N,
    /// Toggle background music.
    M,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

/// Held set plus the transitions observed since the last `end_frame`.
#[derive(Debug, Clone)]
pub struct EdgeSet<T: Eq + Hash + Copy> {
    held: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> EdgeSet<T> {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Record a press. Returns true only on a not-pressed -> pressed edge.
    pub fn press(&mut self, item: T) -> bool {
        if self.held.insert(item) {
            self.just_pressed.insert(item);
            true
        } else {
            false
        }
    }

    /// Record a release. Returns true only if the item was held.
    pub fn release(&mut self, item: T) -> bool {
        if self.held.remove(&item) {
            self.just_released.insert(item);
            true
        } else {
            false
        }
    }

    /// Apply a raw "is it down" report, whichever way it points.
    pub fn set(&mut self, item: T, pressed: bool) -> bool {
        if pressed {
            self.press(item)
        } else {
            self.release(item)
        }
    }

    pub fn is_held(&self, item: T) -> bool {
        self.held.contains(&item)
    }

    pub fn is_just_pressed(&self, item: T) -> bool {
        self.just_pressed.contains(&item)
    }

    pub fn is_just_released(&self, item: T) -> bool {
        self.just_released.contains(&item)
    }

    /// Forget everything, e.g. when the device backing these buttons goes away.
    pub fn clear(&mut self) {
        self.held.clear();
        self.just_pressed.clear();
        self.just_released.clear();
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for EdgeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InputState {
    keys: EdgeSet<Key>,
    mouse: EdgeSet<MouseBtn>,

    pub mouse_position: (f64, f64),
    /// Cursor travel while the left button is held, summed since `end_frame`.
    pub drag_delta: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys: EdgeSet::new(),
            mouse: EdgeSet::new(),
            mouse_position: (0.0, 0.0),
            drag_delta: (0.0, 0.0),
        }
    }

    pub fn key_down(&mut self, key: Key) {
        self.keys.press(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.keys.release(key);
    }

    pub fn mouse_down(&mut self, btn: MouseBtn) {
        self.mouse.press(btn);
    }

    pub fn mouse_up(&mut self, btn: MouseBtn) {
        self.mouse.release(btn);
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        if self.mouse.is_held(MouseBtn::Left) {
            self.drag_delta.0 += x - self.mouse_position.0;
            self.drag_delta.1 += y - self.mouse_position.1;
        }
        self.mouse_position = (x, y);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.keys.is_held(key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.keys.is_just_pressed(key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.keys.is_just_released(key)
    }

    pub fn is_mouse_held(&self, btn: MouseBtn) -> bool {
        self.mouse.is_held(btn)
    }

    pub fn is_mouse_just_pressed(&self, btn: MouseBtn) -> bool {
        self.mouse.is_just_pressed(btn)
    }

    pub fn is_mouse_just_released(&self, btn: MouseBtn) -> bool {
        self.mouse.is_just_released(btn)
    }

    pub fn end_frame(&mut self) {
        self.keys.end_frame();
        self.mouse.end_frame();
        self.drag_delta = (0.0, 0.0);
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::N);
        assert!(input.is_held(Key::N));
        assert!(input.is_just_pressed(Key::N));
    }

    #[test]
    fn test_key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::M);
        input.key_up(Key::M);
        assert!(!input.is_held(Key::M));
        assert!(input.is_just_released(Key::M));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::Left);
        assert!(!input.is_just_released(Key::Left));
        assert!(!input.is_held(Key::Left));
    }

    #[test]
    fn test_end_frame_clears_transient_state() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        input.mouse_down(MouseBtn::Left);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::Left));
        assert!(!input.is_mouse_just_pressed(MouseBtn::Left));
        assert!(input.is_held(Key::Left));
        assert!(input.is_mouse_held(MouseBtn::Left));
    }

    #[test]
    fn test_mouse_up_sets_just_released() {
        let mut input = InputState::new();
        input.mouse_down(MouseBtn::Left);
        input.mouse_up(MouseBtn::Left);
        assert!(input.is_mouse_just_released(MouseBtn::Left));
        assert!(!input.is_mouse_held(MouseBtn::Left));
    }

    #[test]
    fn test_drag_delta_only_accumulates_while_left_held() {
        let mut input = InputState::new();
        input.cursor_moved(10.0, 10.0);
        assert_eq!(input.drag_delta, (0.0, 0.0));

        input.mouse_down(MouseBtn::Left);
        input.cursor_moved(15.0, 8.0);
        input.cursor_moved(20.0, 6.0);
        assert_eq!(input.drag_delta, (10.0, -4.0));
        assert_eq!(input.mouse_position, (20.0, 6.0));

        input.end_frame();
        assert_eq!(input.drag_delta, (0.0, 0.0));
    }

    #[test]
    fn edge_set_reports_single_edge_for_repeated_press() {
        let mut edges: EdgeSet<u8> = EdgeSet::new();
        assert!(edges.press(1));
        assert!(!edges.press(1));
        assert!(edges.is_just_pressed(1));
        assert!(edges.release(1));
        assert!(edges.press(1));
    }

    #[test]
    fn edge_set_set_follows_raw_reports() {
        let mut edges: EdgeSet<u8> = EdgeSet::new();
        assert!(edges.set(7, true));
        assert!(!edges.set(7, true));
        assert!(edges.set(7, false));
        assert!(!edges.set(7, false));
    }

    #[test]
    fn edge_set_clear_forgets_held_state() {
        let mut edges: EdgeSet<u8> = EdgeSet::new();
        edges.press(3);
        edges.clear();
        assert!(!edges.is_held(3));
        assert!(edges.press(3), "a fresh press after clear is an edge again");
    }
}
