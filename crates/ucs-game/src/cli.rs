//! `ucs-demo`: headless run of the tutorial level.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, Overrides, SimConfig};
use crate::error::Result;
use crate::game::Game;
use crate::script::Script;
use crate::state::Condition;

const ENV_HELP: &str = "\
ENVIRONMENT:
    UCS_FPS             Override --fps
    UCS_FRAMES          Override --frames
    UCS_TILE_SIZE       Override --tile-size
    UCS_PROMPT_FRAMES   Override --prompt-frames
    UCS_LOG_FORMAT      Override --log-format (text|json)
    RUST_LOG            Log filter (default: info)";

#[derive(Debug, Parser)]
#[command(
    name = "ucs-demo",
    about = "Headless run of the UCS tutorial level with a scripted input track",
    version,
    after_help = ENV_HELP
)]
pub struct Cli {
    /// JSON config file. Flags and UCS_* variables take precedence.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Frames to run.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Simulation frames per second.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Tile edge in pixels.
    #[arg(long)]
    pub tile_size: Option<i32>,

    /// Frames a message stays up before it is dismissed.
    #[arg(long)]
    pub prompt_frames: Option<u64>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Print the run summary on one line.
    #[arg(long)]
    pub compact: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            fps: self.fps,
            frames: self.frames,
            tile_size: self.tile_size,
            prompt_frames: self.prompt_frames,
            log_format: self.log_format,
        }
    }
}

/// What a run ended with. Printed as JSON on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    /// Frames the scene was frozen behind a message.
    pub frozen_frames: u64,
    pub messages: Vec<String>,
    pub pickups: Vec<String>,
    pub held: Vec<String>,
    pub hp: i32,
    pub condition: String,
    pub player: Option<(i32, i32)>,
    pub actors: usize,
}

/// Merge defaults, the config file, the environment and the flags, in that
/// order, and validate the result.
///
/// # Errors
///
/// Config read, parse and validation errors.
pub fn load_config(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    config.apply(&Overrides::from_env(env));
    config.apply(&cli.overrides());
    config.validate()?;
    Ok(config)
}

/// Run the tutorial for `config.frames` frames, or until the player is
/// defeated.
///
/// # Errors
///
/// Setup errors and the first frame error.
pub fn run_game(config: &SimConfig) -> Result<RunSummary> {
    let mut game = Game::new(config)?;
    let mut script = Script::tutorial(config.prompt_frames);
    let mut frames = 0;
    let mut frozen_frames = 0;

    tracing::info!(frames = config.frames, fps = config.fps, "run started");
    while frames < config.frames {
        let report = script.step(&mut game)?;
        frames = report.frame;
        if report.prompt_active {
            frozen_frames += 1;
        }
        if report.spawned > 0 || !report.destroyed.is_empty() {
            tracing::info!(
                frame = report.frame,
                spawned = report.spawned,
                destroyed = report.destroyed.len(),
                "scene changed"
            );
        }
        if game.state().condition.get() == Condition::Defeat {
            tracing::info!(frame = report.frame, "run stopped on defeat");
            break;
        }
    }

    let state = game.state();
    let summary = RunSummary {
        frames,
        frozen_frames,
        messages: game.messages().to_vec(),
        pickups: state.pickups.get(),
        held: game
            .held_items()
            .iter()
            .map(|item| item.name().to_string())
            .collect(),
        hp: state.hp.get(),
        condition: state.condition.get().to_string(),
        player: game.player_position().map(|p| (p.x, p.y)),
        actors: game.driver().scene().len(),
    };
    tracing::info!(
        frames = summary.frames,
        pickups = summary.pickups.len(),
        condition = %summary.condition,
        "run finished"
    );
    Ok(summary)
}

/// Install the global subscriber. Logs go to stderr so stdout only carries
/// the summary.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(error) = installed {
        eprintln!("ucs-demo: logging not installed: {error}");
    }
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli, |key| std::env::var(key).ok())?;
    init_tracing(config.log_format);
    let summary = run_game(&config)?;
    let out = if cli.compact {
        serde_json::to_string(&summary)?
    } else {
        serde_json::to_string_pretty(&summary)?
    };
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tracing_test::traced_test;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("ucs-demo").chain(args.iter().copied()))
    }

    #[test]
    fn flags_beat_environment_beats_defaults() {
        let env: HashMap<&str, &str> = [("UCS_FRAMES", "10"), ("UCS_FPS", "30")].into();
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let config = load_config(&cli(&["--frames", "5"]), lookup).unwrap();
        assert_eq!(config.frames, 5);
        assert_eq!(config.fps, 30);
        assert_eq!(config.tile_size, 16);
    }

    #[test]
    fn invalid_flag_value_fails_validation() {
        let err = load_config(&cli(&["--fps", "0"]), |_| None).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn log_format_flag_parses() {
        let parsed = cli(&["--log-format", "json", "--compact"]);
        assert_eq!(parsed.log_format, Some(LogFormat::Json));
        assert!(parsed.compact);
    }

    #[test]
    fn short_run_reports_the_untouched_state() {
        let config = SimConfig {
            frames: 3,
            ..SimConfig::default()
        };
        let summary = run_game(&config).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.frozen_frames, 0);
        assert!(summary.messages.is_empty());
        assert_eq!(summary.hp, 50);
        assert_eq!(summary.condition, "alive");
        assert_eq!(summary.player, Some((707, 624)));
        assert_eq!(summary.actors, 2);
    }

    #[test]
    #[traced_test]
    fn pickups_and_the_finish_are_logged() {
        run_game(&SimConfig::default()).unwrap();
        assert!(logs_contain("item picked up"));
        assert!(logs_contain("tutorial entered"));
        assert!(logs_contain("run finished"));
    }
}
