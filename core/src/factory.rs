//! Environment factory.
//!
//! CONSTRUCTION ORDER (fixed):
//!   1. Validate level pinning and vision mode.
//!   2. Pick channel keys from vision mode.
//!   3. Create exactly one engine instance.
//!   4. Wrap it in a recorder if a record directory was given.
//!   5. Derive display geometry from the wrapped engine's "rgb" shape.
//!
//! Any failure aborts the whole build. No partial session is returned.

use crate::{
    config::{ConfigValue, EnvConfig},
    env::{EnvBackend, Environment},
    error::{ConfigError, EnvError, InteractiveResult},
    recorder::{FrameSource, VideoRecorder},
    session::Session,
    types::{ChannelKey, Channels, Frame, Observation, Shape, RGB_KEY},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Window pixels per observation pixel.
pub const ZOOM: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionMode {
    /// Show the engine's own high-resolution render (info channel).
    Human,
    /// Show the raw observation a policy would receive.
    Agent,
}

impl FromStr for VisionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(VisionMode::Human),
            "agent" => Ok(VisionMode::Agent),
            other   => Err(ConfigError::UnsupportedVision { value: other.to_string() }),
        }
    }
}

impl fmt::Display for VisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisionMode::Human => f.write_str("human"),
            VisionMode::Agent => f.write_str("agent"),
        }
    }
}

/// Exactly one of the two keys is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelKeys {
    pub ob_key:   Option<ChannelKey>,
    pub info_key: Option<ChannelKey>,
}

impl ChannelKeys {
    pub fn for_vision(vision: VisionMode) -> Self {
        match vision {
            VisionMode::Human => Self { ob_key: None, info_key: Some(RGB_KEY.to_string()) },
            VisionMode::Agent => Self { ob_key: Some(RGB_KEY.to_string()), info_key: None },
        }
    }

    /// The same selection, as the recorder sees it.
    pub fn frame_source(&self) -> FrameSource {
        match (&self.ob_key, &self.info_key) {
            (Some(key), _)    => FrameSource::Observation(key.clone()),
            (None, Some(key)) => FrameSource::Info(key.clone()),
            (None, None)      => FrameSource::Observation(RGB_KEY.to_string()),
        }
    }

    /// The frame the player should see. Never falls back to the other channel.
    pub fn select(&self, obs: &Observation, info: &Channels) -> Option<Frame> {
        self.frame_source().select(obs, info)
    }
}

/// Target window size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub width:  usize,
    pub height: usize,
}

impl DisplayGeometry {
    /// Height and width are the first two dims of the shape.
    pub fn from_shape(key: &str, shape: &Shape) -> Result<Self, EnvError> {
        let invalid = || EnvError::InvalidObservationShape {
            key:   key.to_string(),
            shape: shape.dims().to_vec(),
        };
        let (height, width) = match shape.dims() {
            [h, w, ..] if *h > 0 && *w > 0 => (*h, *w),
            _ => return Err(invalid()),
        };
        Ok(Self {
            width:  width * ZOOM,
            height: height * ZOOM,
        })
    }
}

/// Resolve geometry from a full observation space.
pub fn display_geometry(ob_space: &BTreeMap<ChannelKey, Shape>) -> Result<DisplayGeometry, EnvError> {
    let shape = ob_space
        .get(RGB_KEY)
        .ok_or_else(|| EnvError::MissingChannel { key: RGB_KEY.to_string() })?;
    DisplayGeometry::from_shape(RGB_KEY, shape)
}

/// Build a ready-to-run session.
///
/// `record_dir` of `None` or an empty path means no recorder.
pub fn make_interactive(
    vision: VisionMode,
    record_dir: Option<&Path>,
    config: &EnvConfig,
    backend: &dyn EnvBackend,
) -> InteractiveResult<Session> {
    config.check_level_pinning()?;

    let keys = ChannelKeys::for_vision(vision);
    let config = match vision {
        VisionMode::Human => config.with_option("render_mode", ConfigValue::Str("rgb_array".to_string())),
        VisionMode::Agent => config.clone(),
    };

    let base = backend.create(1, &config)?;
    let record_dir = record_dir.filter(|dir| !dir.as_os_str().is_empty());
    let env: Box<dyn Environment> = match record_dir {
        Some(dir) => Box::new(VideoRecorder::new(base, dir, keys.frame_source(), config.env_name())?),
        None      => base,
    };

    let geometry = display_geometry(&env.ob_space())?;
    log::info!(
        "built {} session for {} ({}x{}, recording: {})",
        vision,
        config.env_name(),
        geometry.width,
        geometry.height,
        record_dir.is_some()
    );

    Ok(Session::new(env, keys, geometry, record_dir.is_some()))
}
