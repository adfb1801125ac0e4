//! Configuration builder: user options in, normalized engine options out.
//!
//! RULES:
//!   - Negative toggles ("uncenter", "disable") become positive engine options.
//!   - The legacy alias never receives a distribution mode.
//!   - A level seed pins `start_level` and `num_levels = 1` together.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Every game the engine registry knows about.
pub const ENV_NAMES: &[&str] = &[
    "bigfish",
    "bossfight",
    "caveflyer",
    "chaser",
    "climber",
    "coinrun",
    "coinrun_aisc",
    "dodgeball",
    "fruitbot",
    "heist",
    "heist_aisc_many_chests",
    "heist_aisc_many_keys",
    "jumper",
    "leaper",
    "maze",
    "maze_aisc",
    "maze_redgem",
    "maze_yellowgem",
    "maze_yellowstar_redgem",
    "miner",
    "ninja",
    "plunder",
    "starpilot",
];

/// Older coinrun build that predates distribution modes.
pub const LEGACY_ENV_NAME: &str = "coinrun_old";

pub const DEFAULT_ENV_NAME: &str = "heist_aisc_many_chests";
pub const DEFAULT_DISTRIBUTION_MODE: &str = "hard";

pub fn is_known_env(name: &str) -> bool {
    name == LEGACY_ENV_NAME || ENV_NAMES.contains(&name)
}

/// Options as the user supplied them, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveOptions {
    pub env_name:              String,
    pub distribution_mode:     String,
    pub level_seed:            Option<i64>,
    pub rand_region:           i64,
    pub random_percent:        f64,
    pub key_penalty:           i64,
    pub step_penalty:          i64,
    pub continue_after_coin:   bool,
    pub paint_vel_info:        bool,
    pub use_generated_assets:  bool,
    pub uncenter_agent:        bool,
    pub disable_backgrounds:   bool,
    pub restrict_themes:       bool,
    pub use_monochrome_assets: bool,
}

impl Default for InteractiveOptions {
    fn default() -> Self {
        Self {
            env_name:              DEFAULT_ENV_NAME.to_string(),
            distribution_mode:     DEFAULT_DISTRIBUTION_MODE.to_string(),
            level_seed:            None,
            rand_region:           0,
            random_percent:        0.0,
            key_penalty:           0,
            step_penalty:          0,
            continue_after_coin:   false,
            paint_vel_info:        false,
            use_generated_assets:  false,
            uncenter_agent:        false,
            disable_backgrounds:   false,
            restrict_themes:       false,
            use_monochrome_assets: false,
        }
    }
}

/// A single engine option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b)  => write!(f, "{b}"),
            ConfigValue::Int(i)   => write!(f, "{i}"),
            ConfigValue::Float(x) => write!(f, "{x}"),
            ConfigValue::Str(s)   => f.write_str(s),
        }
    }
}

/// Normalized engine configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    env_name: String,
    options:  BTreeMap<String, ConfigValue>,
}

impl EnvConfig {
    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.options.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.options.iter()
    }

    pub fn get_bool(&self, key: &str) -> ConfigResult<Option<bool>> {
        match self.options.get(key) {
            None                        => Ok(None),
            Some(ConfigValue::Bool(b))  => Ok(Some(*b)),
            Some(_) => Err(ConfigError::OptionType { name: key.to_string() }),
        }
    }

    pub fn get_int(&self, key: &str) -> ConfigResult<Option<i64>> {
        match self.options.get(key) {
            None                       => Ok(None),
            Some(ConfigValue::Int(i))  => Ok(Some(*i)),
            Some(_) => Err(ConfigError::OptionType { name: key.to_string() }),
        }
    }

    pub fn get_str(&self, key: &str) -> ConfigResult<Option<&str>> {
        match self.options.get(key) {
            None                       => Ok(None),
            Some(ConfigValue::Str(s))  => Ok(Some(s.as_str())),
            Some(_) => Err(ConfigError::OptionType { name: key.to_string() }),
        }
    }

    /// Return a copy with one extra option. Used by the factory to inject
    /// options that depend on vision mode.
    pub fn with_option(&self, key: &str, value: ConfigValue) -> EnvConfig {
        let mut next = self.clone();
        next.options.insert(key.to_string(), value);
        next
    }

    /// `start_level` and `num_levels == 1` must appear together.
    pub fn check_level_pinning(&self) -> ConfigResult<()> {
        let start_level = self.get_int("start_level")?;
        let num_levels = self.get_int("num_levels")?;
        match (start_level, num_levels) {
            (Some(_), Some(1)) => Ok(()),
            (Some(_), _)       => Err(ConfigError::LevelPinning),
            (None, Some(1))    => Err(ConfigError::LevelPinning),
            (None, _)          => Ok(()),
        }
    }
}

/// Parse a level seed given as text (e.g. from a CLI flag).
pub fn parse_level_seed(value: &str) -> ConfigResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::InvalidLevelSeed { value: value.to_string() })
}

/// Normalize user options into an engine configuration.
pub fn build_config(opts: &InteractiveOptions) -> ConfigResult<EnvConfig> {
    if !is_known_env(&opts.env_name) {
        return Err(ConfigError::UnknownEnvironment { name: opts.env_name.clone() });
    }

    let mut options = BTreeMap::new();
    let mut set = |key: &str, value: ConfigValue| {
        options.insert(key.to_string(), value);
    };

    set("paint_vel_info",        ConfigValue::Bool(opts.paint_vel_info));
    set("use_generated_assets",  ConfigValue::Bool(opts.use_generated_assets));
    set("center_agent",          ConfigValue::Bool(!opts.uncenter_agent));
    set("use_backgrounds",       ConfigValue::Bool(!opts.disable_backgrounds));
    set("restrict_themes",       ConfigValue::Bool(opts.restrict_themes));
    set("use_monochrome_assets", ConfigValue::Bool(opts.use_monochrome_assets));
    set("random_percent",        ConfigValue::Float(opts.random_percent));
    set("rand_region",           ConfigValue::Int(opts.rand_region));
    set("key_penalty",           ConfigValue::Int(opts.key_penalty));
    set("step_penalty",          ConfigValue::Int(opts.step_penalty));
    set("continue_after_coin",   ConfigValue::Bool(opts.continue_after_coin));

    if opts.env_name != LEGACY_ENV_NAME {
        set("distribution_mode", ConfigValue::Str(opts.distribution_mode.clone()));
    }
    if let Some(seed) = opts.level_seed {
        set("start_level", ConfigValue::Int(seed));
        set("num_levels",  ConfigValue::Int(1));
    }

    let config = EnvConfig { env_name: opts.env_name.clone(), options };
    log::debug!("built config for {}: {:?}", config.env_name, config.options);
    Ok(config)
}
