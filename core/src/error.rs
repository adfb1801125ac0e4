use thiserror::Error;

/// Problems with user-supplied options. Raised before any environment exists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown environment '{name}'")]
    UnknownEnvironment { name: String },

    #[error("Level seed must be an integer, got '{value}'")]
    InvalidLevelSeed { value: String },

    #[error("Unsupported vision mode '{value}' (expected 'human' or 'agent')")]
    UnsupportedVision { value: String },

    #[error("start_level and num_levels=1 must be set together")]
    LevelPinning,

    #[error("Option '{name}' has the wrong type")]
    OptionType { name: String },
}

/// Engine contract violations and step failures.
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Observation space has no '{key}' channel")]
    MissingChannel { key: String },

    #[error("Invalid observation shape {shape:?} for channel '{key}'")]
    InvalidObservationShape { key: String, shape: Vec<usize> },

    #[error("Action {action} outside action space of size {size}")]
    InvalidAction { action: usize, size: usize },

    #[error("Engine rejected configuration: {reason}")]
    Rejected { reason: String },

    #[error("Engine step failed: {reason}")]
    StepFailed { reason: String },

    #[error("Snapshot could not be restored: {reason}")]
    BadSnapshot { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Cannot {action} a session in state {state:?}")]
    InvalidTransition {
        action: &'static str,
        state:  crate::session::SessionState,
    },
}

#[derive(Error, Debug)]
pub enum InteractiveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Recording error: {0}")]
    Recording(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type InteractiveResult<T> = Result<T, InteractiveError>;
