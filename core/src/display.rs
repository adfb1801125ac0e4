//! Display adapter seam.
//!
//! The real window lives outside this crate. The session only needs two
//! things from it: the next input batch (or a close signal) and somewhere
//! to put the frame.

use crate::{
    error::InteractiveResult,
    factory::DisplayGeometry,
    input::InputBatch,
    types::Frame,
};
use std::collections::VecDeque;

pub trait Display {
    /// Block until the next input batch. `None` means the window closed.
    fn poll(&mut self) -> InteractiveResult<Option<InputBatch>>;

    /// Show one frame, scaled to `geometry`.
    fn present(&mut self, frame: &Frame, geometry: DisplayGeometry) -> InteractiveResult<()>;
}

/// Plays back a fixed list of batches, then reports the window as closed.
/// Keeps every presented frame for inspection.
#[derive(Debug, Default)]
pub struct ScriptedDisplay {
    pending:   VecDeque<InputBatch>,
    pub shown: Vec<(Frame, DisplayGeometry)>,
}

impl ScriptedDisplay {
    pub fn new(batches: impl IntoIterator<Item = InputBatch>) -> Self {
        Self {
            pending: batches.into_iter().collect(),
            shown:   Vec::new(),
        }
    }
}

impl Display for ScriptedDisplay {
    fn poll(&mut self) -> InteractiveResult<Option<InputBatch>> {
        Ok(self.pending.pop_front())
    }

    fn present(&mut self, frame: &Frame, geometry: DisplayGeometry) -> InteractiveResult<()> {
        self.shown.push((frame.clone(), geometry));
        Ok(())
    }
}
