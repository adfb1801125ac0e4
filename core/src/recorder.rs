//! Recording decorator.
//!
//! Wraps any `Environment` and writes every frame the player is shown to a
//! `RecordingStore`. Writes happen inside `act`, so a slow disk slows the
//! tick rate but never reorders frames. The wrapped engine's behavior is
//! untouched: all trait calls delegate.

use crate::{
    action::Combo,
    env::Environment,
    error::{EnvError, InteractiveResult},
    store::RecordingStore,
    types::{Action, ChannelKey, Channels, Frame, Observation, Shape, Step},
};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Which channel the recorder pulls frames from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSource {
    /// A channel of `observe().ob`.
    Observation(ChannelKey),
    /// A channel of `get_info()`.
    Info(ChannelKey),
}

impl FrameSource {
    pub fn select(&self, obs: &Observation, info: &Channels) -> Option<Frame> {
        match self {
            FrameSource::Observation(key) => obs.ob.get(key).cloned(),
            FrameSource::Info(key)        => info.get(key).cloned(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            FrameSource::Observation(key) | FrameSource::Info(key) => key,
        }
    }
}

impl fmt::Display for FrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSource::Observation(key) => write!(f, "ob:{key}"),
            FrameSource::Info(key)        => write!(f, "info:{key}"),
        }
    }
}

pub struct VideoRecorder<E: Environment> {
    inner:             E,
    store:             RecordingStore,
    recording_id:      String,
    source:            FrameSource,
    episode:           u64,
    frames_in_episode: u64,
}

impl<E: Environment> VideoRecorder<E> {
    /// Open the recording database in `dir` and record the current frame.
    /// Fails if the directory or database can't be created.
    pub fn new(inner: E, dir: &Path, source: FrameSource, env_name: &str) -> InteractiveResult<Self> {
        let store = RecordingStore::open_dir(dir)?;
        store.migrate()?;

        let recording_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().to_rfc3339();
        store.insert_recording(&recording_id, env_name, &source.to_string(), &started_at)?;
        log::info!(
            "recording {} to {} (source {source})",
            recording_id,
            dir.display()
        );

        let mut recorder = Self {
            inner,
            store,
            recording_id,
            source,
            episode: 0,
            frames_in_episode: 0,
        };
        recorder.record_current()?;
        Ok(recorder)
    }

    pub fn recording_id(&self) -> &str {
        &self.recording_id
    }

    pub fn source(&self) -> &FrameSource {
        &self.source
    }

    pub fn store(&self) -> &RecordingStore {
        &self.store
    }

    pub fn episode(&self) -> u64 {
        self.episode
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    fn record_current(&mut self) -> InteractiveResult<()> {
        let obs = self.inner.observe();
        let info = self.inner.get_info();
        let frame = self.source.select(&obs, &info).ok_or_else(|| EnvError::MissingChannel {
            key: self.source.key().to_string(),
        })?;

        if obs.first && self.frames_in_episode > 0 {
            log::debug!("recording episode {} finished after {} frames", self.episode, self.frames_in_episode);
            self.episode += 1;
            self.frames_in_episode = 0;
        }

        self.store.append_frame(
            &self.recording_id,
            self.episode,
            self.inner.step_count(),
            obs.reward,
            &frame,
        )?;
        self.frames_in_episode += 1;
        Ok(())
    }
}

impl<E: Environment> Environment for VideoRecorder<E> {
    fn ob_space(&self) -> BTreeMap<ChannelKey, Shape> {
        self.inner.ob_space()
    }

    fn combos(&self) -> &[Combo] {
        self.inner.combos()
    }

    fn observe(&self) -> Observation {
        self.inner.observe()
    }

    fn get_info(&self) -> Channels {
        self.inner.get_info()
    }

    fn act(&mut self, action: Action) -> InteractiveResult<()> {
        self.inner.act(action)?;
        self.record_current()
    }

    fn get_state(&self) -> InteractiveResult<Vec<u8>> {
        self.inner.get_state()
    }

    fn set_state(&mut self, state: &[u8]) -> InteractiveResult<()> {
        self.inner.set_state(state)
    }

    fn step_count(&self) -> Step {
        self.inner.step_count()
    }
}
