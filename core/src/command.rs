use crate::input::{InputBatch, Key};
use serde::{Deserialize, Serialize};

/// Held to turn the snapshot key into a save.
pub const SAVE_MODIFIER: Key = Key::LeftShift;
/// Clicked alone to load, with the modifier to save.
pub const SNAPSHOT_KEY: Key = Key::F1;

/// Session-level commands. These never reach the engine's action input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCommand {
    SaveState,
    LoadState,
}

/// Resolve at most one command for this tick. Save is checked first.
/// A modifier that went down in this same batch counts as held.
pub fn resolve_command(batch: &InputBatch) -> Option<SessionCommand> {
    if !batch.was_clicked(SNAPSHOT_KEY) {
        return None;
    }
    if batch.is_pressed(SAVE_MODIFIER) {
        Some(SessionCommand::SaveState)
    } else {
        Some(SessionCommand::LoadState)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_and_click_is_save() {
        let batch = InputBatch::new(0.0).press(Key::LeftShift).click(Key::F1);
        assert_eq!(resolve_command(&batch), Some(SessionCommand::SaveState));
    }

    #[test]
    fn click_alone_is_load() {
        let batch = InputBatch::new(0.0).click(Key::F1);
        assert_eq!(resolve_command(&batch), Some(SessionCommand::LoadState));
    }

    #[test]
    fn holding_snapshot_key_without_click_does_nothing() {
        let batch = InputBatch::new(0.0).press(Key::LeftShift).press(Key::F1);
        assert_eq!(resolve_command(&batch), None);
    }

    #[test]
    fn modifier_clicked_this_tick_still_counts_as_held() {
        let batch = InputBatch::new(0.0).click(Key::LeftShift).click(Key::F1);
        assert_eq!(resolve_command(&batch), Some(SessionCommand::SaveState));
    }

    #[test]
    fn shift_and_f1_clicked_together_on_the_wire_is_save() {
        let batch: InputBatch =
            serde_json::from_str(r#"{"dt":0.066,"clicked":["LEFT_SHIFT","F1"]}"#).unwrap();
        assert_eq!(resolve_command(&batch), Some(SessionCommand::SaveState));
    }
}
