//! Keyboard state with edge detection
//!
//! Browser listeners call `press`/`release` whenever events arrive. The
//! driver takes one `snapshot` per frame and then calls `end_frame`, which is
//! what turns "down now, up last frame" into a just-pressed edge.

use serde::{Deserialize, Serialize};

/// Logical keys the games care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Fire,
    Start,
    Pause,
}

const KEY_COUNT: usize = 7;

impl Key {
    pub const ALL: [Key; KEY_COUNT] = [
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::Fire,
        Key::Start,
        Key::Pause,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Map a DOM `KeyboardEvent.code`
    pub fn from_code(code: &str) -> Option<Key> {
        match code {
            "ArrowLeft" | "KeyA" => Some(Key::Left),
            "ArrowRight" | "KeyD" => Some(Key::Right),
            "ArrowUp" | "KeyW" => Some(Key::Up),
            "ArrowDown" | "KeyS" => Some(Key::Down),
            "Space" => Some(Key::Fire),
            "Enter" => Some(Key::Start),
            "KeyP" | "Escape" => Some(Key::Pause),
            _ => None,
        }
    }
}

/// Read-only view of the keyboard for one update phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    down: [bool; KEY_COUNT],
    pressed: [bool; KEY_COUNT],
}

impl InputSnapshot {
    pub fn is_down(&self, key: Key) -> bool {
        self.down[key.index()]
    }

    /// Went down since the previous frame
    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed[key.index()]
    }

    /// -1 for left, 1 for right, 0 for neither or both
    pub fn steer(&self) -> f32 {
        match (self.is_down(Key::Left), self.is_down(Key::Right)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    current: [bool; KEY_COUNT],
    previous: [bool; KEY_COUNT],
    /// Presses that started and ended between two frames
    tapped: [bool; KEY_COUNT],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        let i = key.index();
        if !self.current[i] {
            self.tapped[i] = true;
        }
        self.current[i] = true;
    }

    pub fn release(&mut self, key: Key) {
        self.current[key.index()] = false;
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.current[key.index()]
    }

    pub fn was_pressed(&self, key: Key) -> bool {
        let i = key.index();
        (self.current[i] && !self.previous[i]) || self.tapped[i]
    }

    /// Freeze the current state for the update phase
    pub fn snapshot(&self) -> InputSnapshot {
        let mut pressed = [false; KEY_COUNT];
        for key in Key::ALL {
            pressed[key.index()] = self.was_pressed(key);
        }
        InputSnapshot {
            down: self.current,
            pressed,
        }
    }

    /// Roll current into previous; call once per frame after the snapshot
    pub fn end_frame(&mut self) {
        self.previous = self.current;
        self.tapped = [false; KEY_COUNT];
    }

    /// Forget everything (focus lost, restart)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
