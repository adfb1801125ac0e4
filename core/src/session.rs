//! The interactive session controller.
//!
//! STATES: Ready → Running → Stopped (terminal).
//!
//! TICK ORDER (fixed, never reordered):
//!   1. Resolve at most one session command (save checked before load).
//!   2. Apply it to the engine / snapshot slot.
//!   3. Map pressed keys to an action and step the engine once.
//!   4. Select the player-visible frame.
//!
//! So a load lands before this tick's action, and a save captures the
//! state from before this tick's action.
//!
//! RULES:
//!   - Any engine error stops the session. Nothing is retried.
//!   - Loading with nothing saved is a logged no-op, not an error.
//!   - A load also rewinds the running episode return and length, so a
//!     discarded branch never counts toward the episode.

use crate::{
    action::{keys_to_action, noop_action},
    command::{resolve_command, SessionCommand},
    display::Display,
    env::Environment,
    error::{EnvError, InteractiveResult, SessionError},
    factory::{ChannelKeys, DisplayGeometry},
    input::InputBatch,
    snapshot::{Snapshot, SnapshotStore},
    types::{Action, Channels, Frame, Step},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Ready,
    Running,
    Stopped,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub tick:         u64,
    pub command:      Option<SessionCommand>,
    pub action:       Action,
    pub step:         Step,
    pub reward:       f32,
    pub episode_done: bool,
    pub frame:        Frame,
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub ticks:               u64,
    pub episodes_completed:  u64,
    pub saves:               u64,
    pub loads:               u64,
    pub ignored_loads:       u64,
    pub last_episode_return: Option<f32>,
    pub last_episode_length: Option<u64>,
}

pub struct Session<E: Environment = Box<dyn Environment>> {
    env:            Option<E>,
    keys:           ChannelKeys,
    geometry:       DisplayGeometry,
    recording:      bool,
    state:          SessionState,
    snapshots:      SnapshotStore,
    summary:        SessionSummary,
    episode_return: f32,
    episode_steps:  u64,
}

impl<E: Environment> Session<E> {
    pub fn new(env: E, keys: ChannelKeys, geometry: DisplayGeometry, recording: bool) -> Self {
        Self {
            env: Some(env),
            keys,
            geometry,
            recording,
            state: SessionState::Ready,
            snapshots: SnapshotStore::new(),
            summary: SessionSummary::default(),
            episode_return: 0.0,
            episode_steps: 0,
        }
    }

    pub fn state(&self) -> SessionState { self.state }
    pub fn geometry(&self) -> DisplayGeometry { self.geometry }
    pub fn channel_keys(&self) -> &ChannelKeys { &self.keys }
    pub fn is_recording(&self) -> bool { self.recording }
    pub fn snapshots(&self) -> &SnapshotStore { &self.snapshots }
    pub fn summary(&self) -> &SessionSummary { &self.summary }

    /// The engine, until the session stops.
    pub fn env(&self) -> Option<&E> {
        self.env.as_ref()
    }

    pub fn start(&mut self) -> InteractiveResult<()> {
        self.expect_state(SessionState::Ready, "start")?;
        self.state = SessionState::Running;
        log::info!(
            "session running: {}x{} ob_key={:?} info_key={:?}",
            self.geometry.width,
            self.geometry.height,
            self.keys.ob_key,
            self.keys.info_key
        );
        Ok(())
    }

    /// Release the engine. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        self.env = None;
        self.state = SessionState::Stopped;
        log::info!(
            "session stopped after {} ticks ({} episodes)",
            self.summary.ticks,
            self.summary.episodes_completed
        );
    }

    /// The frame the player should currently see.
    pub fn current_frame(&self) -> InteractiveResult<Frame> {
        let env = self.env.as_ref().ok_or(SessionError::InvalidTransition {
            action: "read a frame from",
            state:  self.state,
        })?;
        Self::visible_frame(&self.keys, env)
    }

    /// Run one tick. An engine error stops the session and is returned.
    pub fn tick(&mut self, batch: &InputBatch) -> InteractiveResult<TickOutcome> {
        self.expect_state(SessionState::Running, "tick")?;
        match self.advance(batch) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::error!("engine failure, stopping session: {e}");
                self.stop();
                Err(e)
            }
        }
    }

    /// Drive the session until the display closes. The session always ends
    /// up stopped, whether the loop exits cleanly or with an error.
    pub fn run(&mut self, display: &mut dyn Display) -> InteractiveResult<SessionSummary> {
        self.start()?;
        let result = self.run_loop(display);
        self.stop();
        result.map(|()| self.summary.clone())
    }

    fn run_loop(&mut self, display: &mut dyn Display) -> InteractiveResult<()> {
        display.present(&self.current_frame()?, self.geometry)?;
        while let Some(batch) = display.poll()? {
            let outcome = self.tick(&batch)?;
            display.present(&outcome.frame, self.geometry)?;
        }
        log::debug!("display closed");
        Ok(())
    }

    fn advance(&mut self, batch: &InputBatch) -> InteractiveResult<TickOutcome> {
        let env = self.env.as_mut().ok_or(SessionError::InvalidTransition {
            action: "tick",
            state:  self.state,
        })?;

        let command = resolve_command(batch);
        match command {
            Some(SessionCommand::SaveState) => {
                let state = env.get_state()?;
                let taken_at = env.step_count();
                self.snapshots.save(Snapshot {
                    state,
                    taken_at,
                    episode_return: self.episode_return,
                    episode_steps:  self.episode_steps,
                });
                self.summary.saves += 1;
                log::info!("save state (step {taken_at})");
            }
            Some(SessionCommand::LoadState) => match self.snapshots.load() {
                Some(snapshot) => {
                    env.set_state(&snapshot.state)?;
                    self.episode_return = snapshot.episode_return;
                    self.episode_steps = snapshot.episode_steps;
                    self.summary.loads += 1;
                    log::info!("load state (saved at step {})", snapshot.taken_at);
                }
                None => {
                    self.summary.ignored_loads += 1;
                    log::info!("load state: nothing saved yet, ignoring");
                }
            },
            None => {}
        }

        let combos = env.combos();
        let action = keys_to_action(combos, &batch.held_keys())
            .or_else(|| noop_action(combos))
            .unwrap_or(0);
        env.act(action)?;

        let obs = env.observe();
        let step = env.step_count();
        self.episode_return += obs.reward;
        self.episode_steps += 1;

        // The step that ends an episode already reports the next one's
        // first observation.
        let episode_done = obs.first;
        if episode_done {
            log::info!(
                "episode complete: return={:.2} length={}",
                self.episode_return,
                self.episode_steps
            );
            self.summary.episodes_completed += 1;
            self.summary.last_episode_return = Some(self.episode_return);
            self.summary.last_episode_length = Some(self.episode_steps);
            self.episode_return = 0.0;
            self.episode_steps = 0;
        }

        let frame = Self::visible_frame(&self.keys, env)?;
        self.summary.ticks += 1;
        log::debug!("tick={} action={action} reward={:.3} step={step}", self.summary.ticks, obs.reward);

        Ok(TickOutcome {
            tick: self.summary.ticks,
            command,
            action,
            step,
            reward: obs.reward,
            episode_done,
            frame,
        })
    }

    fn visible_frame(keys: &ChannelKeys, env: &E) -> InteractiveResult<Frame> {
        let info = if keys.info_key.is_some() { env.get_info() } else { Channels::new() };
        let obs = env.observe();
        keys.select(&obs, &info).ok_or_else(|| {
            let key = keys.frame_source().key().to_string();
            EnvError::MissingChannel { key }.into()
        })
    }

    fn expect_state(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { action, state: self.state })
        }
    }
}
