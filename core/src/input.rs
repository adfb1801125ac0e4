//! Per-tick input as the display adapter reports it.
//!
//! A batch is transient: it is consumed by exactly one tick and never kept.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Keyboard keys the session understands. Anything else is `Other` and only
/// matters if an action combo names it (none do).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    A,
    D,
    E,
    Q,
    S,
    W,
    F1,
    LeftShift,
    Escape,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputBatch {
    /// Seconds since the previous batch.
    pub dt:      f64,
    /// Keys held down right now.
    pub pressed: BTreeSet<Key>,
    /// Keys that went down since the previous batch.
    pub clicked: BTreeSet<Key>,
}

impl InputBatch {
    pub fn new(dt: f64) -> Self {
        Self { dt, ..Self::default() }
    }

    pub fn press(mut self, key: Key) -> Self {
        self.pressed.insert(key);
        self
    }

    pub fn click(mut self, key: Key) -> Self {
        self.clicked.insert(key);
        self
    }

    /// A click also counts as pressed for this tick, even when the adapter
    /// only listed the key under `clicked`.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key) || self.clicked.contains(&key)
    }

    pub fn was_clicked(&self, key: Key) -> bool {
        self.clicked.contains(&key)
    }

    /// Every key that counts as held this tick.
    pub fn held_keys(&self) -> BTreeSet<Key> {
        self.pressed.union(&self.clicked).copied().collect()
    }

    /// The player asked to close the window.
    pub fn requests_close(&self) -> bool {
        self.is_pressed(Key::Escape)
    }
}
