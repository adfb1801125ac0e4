//! procgen-interactive: play a procgen game one input batch at a time.
//!
//! Usage:
//!   procgen-interactive --env-name maze --level-seed 7 < inputs.jsonl
//!   procgen-interactive --vision agent --record-dir /tmp/out
//!
//! Each stdin line is one tick's input batch:
//!   {"dt": 0.066, "pressed": ["LEFT_SHIFT"], "clicked": ["F1"]}
//! Each presented frame is answered with one JSON status line on stdout.
//! EOF or an ESCAPE key closes the session.

use anyhow::{Context, Result};
use clap::Parser;
use procgen_core::{
    config::{build_config, parse_level_seed, InteractiveOptions, DEFAULT_DISTRIBUTION_MODE, DEFAULT_ENV_NAME},
    display::Display,
    error::InteractiveResult,
    factory::{make_interactive, DisplayGeometry, VisionMode},
    input::InputBatch,
    sandbox::SandboxBackend,
    types::Frame,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "procgen-interactive",
    version,
    about = "Interactive version of Procgen allowing you to play the games"
)]
struct Cli {
    /// Level of fidelity of observation.
    #[arg(long, default_value = "human", value_parser = ["agent", "human"])]
    vision: String,

    /// Directory to record frames to.
    #[arg(long)]
    record_dir: Option<PathBuf>,

    /// Which distribution mode to use for the level generation.
    #[arg(long, default_value = DEFAULT_DISTRIBUTION_MODE)]
    distribution_mode: String,

    /// Name of game to create.
    #[arg(long, default_value = DEFAULT_ENV_NAME)]
    env_name: String,

    /// Select an individual level to use.
    #[arg(long, value_parser = parse_level_seed)]
    level_seed: Option<i64>,

    /// Size of area to randomize cheese location over.
    #[arg(long, default_value_t = 0, help_heading = "Advanced")]
    rand_region: i64,

    /// How often to randomize the level construction.
    #[arg(long, default_value_t = 0.0, help_heading = "Advanced")]
    random_percent: f64,

    /// Penalty for picking up keys (divided by 10).
    #[arg(long, default_value_t = 0, help_heading = "Advanced")]
    key_penalty: i64,

    /// Time penalty per step (divided by 1000).
    #[arg(long, default_value_t = 0, help_heading = "Advanced")]
    step_penalty: i64,

    /// Don't end the level when the coin is collected.
    #[arg(long, help_heading = "Advanced")]
    continue_after_coin: bool,

    /// Paint player velocity info in the top left corner.
    #[arg(long, help_heading = "Advanced")]
    paint_vel_info: bool,

    /// Use randomly generated assets in place of human designed assets.
    #[arg(long, help_heading = "Advanced")]
    use_generated_assets: bool,

    /// Display the full level for games that center the observation to the agent.
    #[arg(long, help_heading = "Advanced")]
    uncenter_agent: bool,

    /// Disable human designed backgrounds.
    #[arg(long, help_heading = "Advanced")]
    disable_backgrounds: bool,

    /// Restrict games that use multiple themes to a single theme.
    #[arg(long, help_heading = "Advanced")]
    restrict_themes: bool,

    /// Use monochromatic rectangles instead of human designed assets.
    #[arg(long, help_heading = "Advanced")]
    use_monochrome_assets: bool,
}

impl Cli {
    fn options(&self) -> InteractiveOptions {
        InteractiveOptions {
            env_name:              self.env_name.clone(),
            distribution_mode:     self.distribution_mode.clone(),
            level_seed:            self.level_seed,
            rand_region:           self.rand_region,
            random_percent:        self.random_percent,
            key_penalty:           self.key_penalty,
            step_penalty:          self.step_penalty,
            continue_after_coin:   self.continue_after_coin,
            paint_vel_info:        self.paint_vel_info,
            use_generated_assets:  self.use_generated_assets,
            uncenter_agent:        self.uncenter_agent,
            disable_backgrounds:   self.disable_backgrounds,
            restrict_themes:       self.restrict_themes,
            use_monochrome_assets: self.use_monochrome_assets,
        }
    }
}

#[derive(serde::Serialize)]
struct FrameStatus {
    frame:         u64,
    window_width:  usize,
    window_height: usize,
    frame_width:   usize,
    frame_height:  usize,
}

/// Line-oriented display: input batches on stdin, frame status on stdout.
struct StdioDisplay<R: BufRead, W: Write> {
    input:     R,
    output:    W,
    presented: u64,
}

impl<R: BufRead, W: Write> StdioDisplay<R, W> {
    fn new(input: R, output: W) -> Self {
        Self { input, output, presented: 0 }
    }
}

impl<R: BufRead, W: Write> Display for StdioDisplay<R, W> {
    fn poll(&mut self) -> InteractiveResult<Option<InputBatch>> {
        let mut buffer = String::new();
        loop {
            buffer.clear();
            let bytes_read = self.input.read_line(&mut buffer)?;
            if bytes_read == 0 {
                return Ok(None); // EOF
            }
            if buffer.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InputBatch>(&buffer) {
                Ok(batch) if batch.requests_close() => {
                    log::info!("escape pressed, closing");
                    return Ok(None);
                }
                Ok(batch) => return Ok(Some(batch)),
                Err(e) => {
                    log::warn!("Skipping malformed input line: {e}");
                    let err_json = serde_json::json!({ "error": e.to_string() });
                    writeln!(self.output, "{}", err_json)?;
                    self.output.flush()?;
                }
            }
        }
    }

    fn present(&mut self, frame: &Frame, geometry: DisplayGeometry) -> InteractiveResult<()> {
        let status = FrameStatus {
            frame:         self.presented,
            window_width:  geometry.width,
            window_height: geometry.height,
            frame_width:   frame.width,
            frame_height:  frame.height,
        };
        self.presented += 1;
        writeln!(self.output, "{}", serde_json::to_string(&status)?)?;
        self.output.flush()?;
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let vision: VisionMode = cli.vision.parse()?;
    let config = build_config(&cli.options()).context("invalid options")?;

    let mut session = make_interactive(vision, cli.record_dir.as_deref(), &config, &SandboxBackend)
        .context("failed to build interactive session")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut display = StdioDisplay::new(stdin.lock(), stdout.lock());
    let summary = session.run(&mut display).context("session aborted")?;

    eprintln!("=== SESSION SUMMARY ===");
    eprintln!("  env:        {}", config.env_name());
    eprintln!("  ticks:      {}", summary.ticks);
    eprintln!("  episodes:   {}", summary.episodes_completed);
    eprintln!("  saves:      {}", summary.saves);
    eprintln!("  loads:      {} ({} ignored)", summary.loads, summary.ignored_loads);
    if let (Some(ret), Some(len)) = (summary.last_episode_return, summary.last_episode_length) {
        eprintln!("  last episode: return {ret:.2} over {len} steps");
    }
    Ok(())
}
