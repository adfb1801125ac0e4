//! Key combos → discrete actions.

use crate::input::Key;
use crate::types::Action;
use std::collections::BTreeSet;

/// The keys that must all be held for one action. Empty means no-op.
pub type Combo = &'static [Key];

/// Action table shared by every procgen game, in action-index order.
pub const PROCGEN_COMBOS: &[Combo] = &[
    &[Key::Left, Key::Down],
    &[Key::Left],
    &[Key::Left, Key::Up],
    &[Key::Down],
    &[],
    &[Key::Up],
    &[Key::Right, Key::Down],
    &[Key::Right],
    &[Key::Right, Key::Up],
    &[Key::D],
    &[Key::A],
    &[Key::W],
    &[Key::S],
    &[Key::Q],
    &[Key::E],
];

/// Pick the action whose combo has the most keys, all of them pressed.
/// Ties go to the lower index. Returns `None` only if no combo matches,
/// which can't happen when the table has an empty combo.
pub fn keys_to_action(combos: &[Combo], pressed: &BTreeSet<Key>) -> Option<Action> {
    let mut best: Option<(Action, usize)> = None;
    for (action, combo) in combos.iter().enumerate() {
        if !combo.iter().all(|k| pressed.contains(k)) {
            continue;
        }
        match best {
            Some((_, len)) if len >= combo.len() => {}
            _ => best = Some((action, combo.len())),
        }
    }
    best.map(|(action, _)| action)
}

/// Index of the empty combo, if the table has one.
pub fn noop_action(combos: &[Combo]) -> Option<Action> {
    combos.iter().position(|c| c.is_empty())
}
