//! The engine contract.
//!
//! RULE: The session only talks to the engine through `Environment`.
//! Wrappers implement it by delegation, so `get_state` / `set_state` on any
//! wrapper reach the base engine unchanged.

use crate::{
    action::Combo,
    config::EnvConfig,
    error::InteractiveResult,
    types::{Action, ChannelKey, Channels, Observation, Shape, Step},
};
use std::collections::BTreeMap;

/// One running simulation instance.
pub trait Environment {
    /// Shape of every observation channel.
    fn ob_space(&self) -> BTreeMap<ChannelKey, Shape>;

    /// Key combos for each action, in action-index order.
    fn combos(&self) -> &[Combo];

    /// Current observation (reward for the last step, channels, episode start).
    fn observe(&self) -> Observation;

    /// Side channels, e.g. the full-resolution render in human mode.
    fn get_info(&self) -> Channels;

    /// Apply one action and advance the engine by exactly one step.
    fn act(&mut self, action: Action) -> InteractiveResult<()>;

    /// Opaque serialization of the complete engine state.
    fn get_state(&self) -> InteractiveResult<Vec<u8>>;

    /// Replace the complete engine state with a blob from `get_state`.
    fn set_state(&mut self, state: &[u8]) -> InteractiveResult<()>;

    /// Steps taken since construction (not reset by `set_state`).
    fn step_count(&self) -> Step;
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn ob_space(&self) -> BTreeMap<ChannelKey, Shape> { (**self).ob_space() }
    fn combos(&self) -> &[Combo] { (**self).combos() }
    fn observe(&self) -> Observation { (**self).observe() }
    fn get_info(&self) -> Channels { (**self).get_info() }
    fn act(&mut self, action: Action) -> InteractiveResult<()> { (**self).act(action) }
    fn get_state(&self) -> InteractiveResult<Vec<u8>> { (**self).get_state() }
    fn set_state(&mut self, state: &[u8]) -> InteractiveResult<()> { (**self).set_state(state) }
    fn step_count(&self) -> Step { (**self).step_count() }
}

/// Builds engine instances. The real game engine lives behind this.
pub trait EnvBackend {
    fn create(&self, num: usize, config: &EnvConfig) -> InteractiveResult<Box<dyn Environment>>;
}
