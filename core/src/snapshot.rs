use crate::types::Step;

/// Complete engine state captured by a save command, plus the session's
/// running episode counters at that moment. `state` is opaque to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state:          Vec<u8>,
    /// Engine step counter when the snapshot was taken. Diagnostic only.
    pub taken_at:       Step,
    pub episode_return: f32,
    pub episode_steps:  u64,
}

/// Single-slot snapshot storage. Lives inside the session; never persisted.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    slot: Option<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite whatever was saved before.
    pub fn save(&mut self, snapshot: Snapshot) {
        self.slot = Some(snapshot);
    }

    /// Read the saved snapshot. The slot is left intact.
    pub fn load(&self) -> Option<&Snapshot> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
