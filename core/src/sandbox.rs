//! Sandbox backend: a tiny coin-grid game behind the `Environment` trait.
//!
//! Stands in for the real engine so sessions can run headless. It honors
//! the options the session controller cares about (level pinning, render
//! mode, step penalty) and ignores the purely cosmetic ones.

use crate::{
    action::{Combo, PROCGEN_COMBOS},
    config::EnvConfig,
    env::{EnvBackend, Environment},
    error::{EnvError, InteractiveResult},
    rng::{LevelRng, LevelSampler},
    types::{Action, ChannelKey, Channels, Frame, Observation, Shape, Step, RGB_KEY},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GRID: usize = 16;
pub const TILE_PX: usize = 4;
pub const OB_SIZE: usize = GRID * TILE_PX; // 64
pub const RENDER_SCALE: usize = 8;          // 512 px info frame
pub const COIN_REWARD: f32 = 10.0;
pub const MAX_EPISODE_STEPS: u64 = 1000;

const WALL: [u8; 3] = [110, 110, 110];
const AGENT: [u8; 3] = [40, 90, 220];
const COIN: [u8; 3] = [240, 200, 30];

/// Creates `SandboxEnv` instances. Only single-instance sessions are served.
#[derive(Debug, Default, Clone, Copy)]
pub struct SandboxBackend;

impl EnvBackend for SandboxBackend {
    fn create(&self, num: usize, config: &EnvConfig) -> InteractiveResult<Box<dyn Environment>> {
        if num != 1 {
            return Err(EnvError::Rejected {
                reason: format!("sandbox supports exactly one instance, asked for {num}"),
            }
            .into());
        }
        Ok(Box::new(SandboxEnv::new(config)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SandboxOptions {
    wall_density:    f64,
    step_penalty:    f32,
    render:          bool,
    use_backgrounds: bool,
    keep_going:      bool,
}

/// Everything `get_state` captures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GameState {
    episode:          u64,
    level:            u64,
    walls:            Vec<bool>,
    agent:            (usize, usize),
    coin:             Option<(usize, usize)>,
    steps_in_episode: u64,
    last_reward:      f32,
    first:            bool,
}

pub struct SandboxEnv {
    sampler: LevelSampler,
    options: SandboxOptions,
    state:   GameState,
    steps:   Step,
}

impl SandboxEnv {
    pub fn new(config: &EnvConfig) -> InteractiveResult<Self> {
        config.check_level_pinning()?;
        let start_level = config.get_int("start_level")?.unwrap_or(0);
        let num_levels = config.get_int("num_levels")?.unwrap_or(0);
        if start_level < 0 || num_levels < 0 {
            return Err(EnvError::Rejected {
                reason: format!("start_level={start_level} num_levels={num_levels} must be non-negative"),
            }
            .into());
        }

        let wall_density = match config.get_str("distribution_mode")? {
            Some("easy") => 0.10,
            Some("hard") => 0.20,
            _            => 0.15,
        };
        let options = SandboxOptions {
            wall_density,
            step_penalty:    config.get_int("step_penalty")?.unwrap_or(0) as f32 / 1000.0,
            render:          config.get_str("render_mode")? == Some("rgb_array"),
            use_backgrounds: config.get_bool("use_backgrounds")?.unwrap_or(true),
            keep_going:      config.get_bool("continue_after_coin")?.unwrap_or(false),
        };
        let sampler = LevelSampler {
            seed:        config.get_int("rand_seed")?.unwrap_or(0) as u64,
            start_level: start_level as u64,
            num_levels:  num_levels as u64,
        };

        let state = generate_level(sampler, options.wall_density, 0);
        log::debug!("sandbox {} starting on level {}", config.env_name(), state.level);
        Ok(Self { sampler, options, state, steps: 0 })
    }

    /// Level currently being played.
    pub fn level(&self) -> u64 {
        self.state.level
    }

    pub fn agent_position(&self) -> (usize, usize) {
        self.state.agent
    }

    fn render(&self) -> Frame {
        let mut frame = Frame::blank(OB_SIZE, OB_SIZE, 3);
        if self.options.use_backgrounds {
            let mut tint = LevelRng::new(self.state.level, 1);
            let bg = [
                20 + tint.next_u64_below(40) as u8,
                20 + tint.next_u64_below(40) as u8,
                20 + tint.next_u64_below(40) as u8,
            ];
            frame.fill_rect(0, 0, OB_SIZE, OB_SIZE, bg);
        }
        for (i, wall) in self.state.walls.iter().enumerate() {
            if *wall {
                frame.fill_rect((i / GRID) * TILE_PX, (i % GRID) * TILE_PX, TILE_PX, TILE_PX, WALL);
            }
        }
        if let Some((row, col)) = self.state.coin {
            frame.fill_rect(row * TILE_PX, col * TILE_PX, TILE_PX, TILE_PX, COIN);
        }
        let (row, col) = self.state.agent;
        frame.fill_rect(row * TILE_PX, col * TILE_PX, TILE_PX, TILE_PX, AGENT);
        frame
    }

    fn is_open(&self, row: i64, col: i64) -> bool {
        (0..GRID as i64).contains(&row)
            && (0..GRID as i64).contains(&col)
            && !self.state.walls[row as usize * GRID + col as usize]
    }

    fn try_move(&mut self, d_row: i64, d_col: i64) {
        let (row, col) = self.state.agent;
        let (row, col) = (row as i64, col as i64);
        if d_col != 0 && self.is_open(row, col + d_col) {
            self.state.agent.1 = (col + d_col) as usize;
        }
        let col = self.state.agent.1 as i64;
        if d_row != 0 && self.is_open(row + d_row, col) {
            self.state.agent.0 = (row + d_row) as usize;
        }
    }
}

/// Row/column delta for an action index of `PROCGEN_COMBOS`.
fn action_delta(action: Action) -> (i64, i64) {
    match action {
        0 => (1, -1),
        1 => (0, -1),
        2 => (-1, -1),
        3 => (1, 0),
        5 => (-1, 0),
        6 => (1, 1),
        7 => (0, 1),
        8 => (-1, 1),
        _ => (0, 0),
    }
}

fn generate_level(sampler: LevelSampler, wall_density: f64, episode: u64) -> GameState {
    let level = sampler.level_for_episode(episode);
    let mut rng = LevelRng::new(level, 0);

    let mut walls: Vec<bool> = (0..GRID * GRID).map(|_| rng.chance(wall_density)).collect();
    let agent = (rng.next_u64_below(GRID as u64) as usize, rng.next_u64_below(GRID as u64) as usize);
    let mut coin = agent;
    while coin == agent {
        coin = (rng.next_u64_below(GRID as u64) as usize, rng.next_u64_below(GRID as u64) as usize);
    }

    // Carve an L-shaped corridor so the coin is always reachable.
    let (ar, ac) = agent;
    let (cr, cc) = coin;
    for col in ac.min(cc)..=ac.max(cc) {
        walls[ar * GRID + col] = false;
    }
    for row in ar.min(cr)..=ar.max(cr) {
        walls[row * GRID + cc] = false;
    }

    GameState {
        episode,
        level,
        walls,
        agent,
        coin: Some(coin),
        steps_in_episode: 0,
        last_reward: 0.0,
        first: true,
    }
}

impl Environment for SandboxEnv {
    fn ob_space(&self) -> BTreeMap<ChannelKey, Shape> {
        BTreeMap::from([(RGB_KEY.to_string(), Shape::hwc(OB_SIZE, OB_SIZE, 3))])
    }

    fn combos(&self) -> &[Combo] {
        PROCGEN_COMBOS
    }

    fn observe(&self) -> Observation {
        Observation {
            reward: self.state.last_reward,
            ob:     Channels::from([(RGB_KEY.to_string(), self.render())]),
            first:  self.state.first,
        }
    }

    fn get_info(&self) -> Channels {
        if self.options.render {
            Channels::from([(RGB_KEY.to_string(), self.render().upscale(RENDER_SCALE))])
        } else {
            Channels::new()
        }
    }

    fn act(&mut self, action: Action) -> InteractiveResult<()> {
        if action >= PROCGEN_COMBOS.len() {
            return Err(EnvError::InvalidAction { action, size: PROCGEN_COMBOS.len() }.into());
        }
        self.steps += 1;
        self.state.first = false;
        self.state.steps_in_episode += 1;

        let (d_row, d_col) = action_delta(action);
        self.try_move(d_row, d_col);

        let mut reward = -self.options.step_penalty;
        let mut done = self.state.steps_in_episode >= MAX_EPISODE_STEPS;
        if self.state.coin == Some(self.state.agent) {
            reward += COIN_REWARD;
            self.state.coin = None;
            done |= !self.options.keep_going;
        }

        if done {
            let next_episode = self.state.episode + 1;
            self.state = generate_level(self.sampler, self.options.wall_density, next_episode);
        }
        self.state.last_reward = reward;
        Ok(())
    }

    fn get_state(&self) -> InteractiveResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.state)?)
    }

    fn set_state(&mut self, state: &[u8]) -> InteractiveResult<()> {
        let restored: GameState = serde_json::from_slice(state).map_err(|e| EnvError::BadSnapshot {
            reason: e.to_string(),
        })?;
        if restored.walls.len() != GRID * GRID {
            return Err(EnvError::BadSnapshot {
                reason: format!("expected {} tiles, got {}", GRID * GRID, restored.walls.len()),
            }
            .into());
        }
        self.state = restored;
        Ok(())
    }

    fn step_count(&self) -> Step {
        self.steps
    }
}
