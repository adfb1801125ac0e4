//! Shared test engine: a one-dimensional counter with a configurable
//! observation shape. Every state is a single integer, so state equality
//! is easy to assert.

#![allow(dead_code)]

use procgen_core::{
    action::{Combo, PROCGEN_COMBOS},
    config::EnvConfig,
    env::{EnvBackend, Environment},
    error::{EnvError, InteractiveResult},
    types::{Action, ChannelKey, Channels, Frame, Observation, Shape, Step, RGB_KEY},
};
use std::cell::RefCell;
use std::collections::BTreeMap;

pub const LEFT: Action = 1;
pub const RIGHT: Action = 7;

pub struct CounterEnv {
    pub position: i64,
    pub height:   usize,
    pub width:    usize,
    steps:        Step,
    fail_at:      Option<Step>,
    episode_len:  Option<Step>,
}

impl CounterEnv {
    pub fn new(height: usize, width: usize) -> Self {
        Self { position: 0, height, width, steps: 0, fail_at: None, episode_len: None }
    }

    /// The `n`th call to `act` fails.
    pub fn failing_at(mut self, n: Step) -> Self {
        self.fail_at = Some(n);
        self
    }

    /// Every `n`th step ends an episode with reward 1.
    pub fn with_episode_length(mut self, n: Step) -> Self {
        self.episode_len = Some(n);
        self
    }

    fn episode_boundary(&self) -> bool {
        matches!(self.episode_len, Some(n) if self.steps > 0 && self.steps % n == 0)
    }

    fn frame(&self, scale: usize) -> Frame {
        let mut frame = Frame::blank(self.height * scale, self.width * scale, 3);
        frame.pixels[0] = self.position.rem_euclid(256) as u8;
        frame
    }
}

impl Environment for CounterEnv {
    fn ob_space(&self) -> BTreeMap<ChannelKey, Shape> {
        BTreeMap::from([(RGB_KEY.to_string(), Shape::hwc(self.height, self.width, 3))])
    }

    fn combos(&self) -> &[Combo] {
        PROCGEN_COMBOS
    }

    fn observe(&self) -> Observation {
        Observation {
            reward: if self.episode_boundary() { 1.0 } else { 0.0 },
            ob:     Channels::from([(RGB_KEY.to_string(), self.frame(1))]),
            first:  self.episode_boundary(),
        }
    }

    fn get_info(&self) -> Channels {
        Channels::from([(RGB_KEY.to_string(), self.frame(2))])
    }

    fn act(&mut self, action: Action) -> InteractiveResult<()> {
        self.steps += 1;
        if Some(self.steps) == self.fail_at {
            return Err(EnvError::StepFailed { reason: "injected".to_string() }.into());
        }
        match action {
            LEFT  => self.position -= 1,
            RIGHT => self.position += 1,
            _     => {}
        }
        Ok(())
    }

    fn get_state(&self) -> InteractiveResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.position)?)
    }

    fn set_state(&mut self, state: &[u8]) -> InteractiveResult<()> {
        self.position = serde_json::from_slice(state)?;
        Ok(())
    }

    fn step_count(&self) -> Step {
        self.steps
    }
}

/// Hands out `CounterEnv`s and remembers what it was asked for.
#[derive(Default)]
pub struct CapturingBackend {
    pub shape:   (usize, usize),
    pub created: RefCell<Vec<(usize, EnvConfig)>>,
}

impl CapturingBackend {
    pub fn with_shape(height: usize, width: usize) -> Self {
        Self { shape: (height, width), created: RefCell::new(Vec::new()) }
    }
}

impl EnvBackend for CapturingBackend {
    fn create(&self, num: usize, config: &EnvConfig) -> InteractiveResult<Box<dyn Environment>> {
        self.created.borrow_mut().push((num, config.clone()));
        Ok(Box::new(CounterEnv::new(self.shape.0, self.shape.1)))
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
