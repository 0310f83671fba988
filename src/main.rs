//! Stepstui — rebuild an ordered process by dragging steps into numbered slots.

mod app;
mod feedback;
mod game;
mod input;
mod placement;
mod sequence;
mod theme;
mod ui;
mod validator;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use sequence::{CANONICAL_SEQUENCE, Partitioning};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Options derived from CLI that shape the puzzle (parts, penalty rule, cue timing).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub partitioning: Partitioning,
    pub wrong_drop: WrongDropPolicy,
    pub cue_timeout: Duration,
    pub mute: bool,
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let partitioning = Partitioning::new(&args.parts, CANONICAL_SEQUENCE.len())
            .context("invalid --parts")?;
        Ok(Self {
            partitioning,
            wrong_drop: args.wrong_drop,
            cue_timeout: Duration::from_millis(args.cue_timeout_ms),
            mute: args.mute,
            seed: args.seed,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = setup_logging(args.log_dir.as_deref())?;
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "theme load failed; using defaults");
            theme::Theme::default()
        }
    };
    let config = GameConfig::from_args(&args)?;
    tracing::info!(
        parts = ?args.parts,
        wrong_drop = ?config.wrong_drop,
        seed = ?config.seed,
        "starting"
    );
    let mut app = App::new(args, config, theme);
    app.run()?;
    Ok(())
}

/// File-only logging: the terminal belongs to the UI. The guard must outlive the app.
fn setup_logging(dir: Option<&Path>) -> Result<WorkerGuard> {
    let dir = dir.map_or_else(default_log_dir, Path::to_path_buf);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&dir, "stepstui.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::info!("log file: {}", dir.join("stepstui.log").display());
    Ok(guard)
}

/// XDG state dir, else ~/.local/state, else the current directory.
fn default_log_dir() -> PathBuf {
    let base = match std::env::var("XDG_STATE_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".local").join("state"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join("stepstui")
}

/// Drag-and-drop sequencing puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "stepstui",
    version,
    about = "Drag the scattered steps into the slots in the right order. Three lives.",
    long_about = "Stepstui is a terminal sequencing puzzle.\n\n\
        Drag each step into its numbered slot, top to bottom. Dropping a wrong step \
        costs a life; trying to skip ahead just snaps the step back. Fill every slot \
        of every part to win.\n\n\
        CONTROLS (mouse):\n  Press on a step, drag it over a slot, release.\n\n\
        CONTROLS (keyboard):\n  Left/Right h/l  Pick step   Up/Down k/j  Pick slot\n  Enter/Space     Drop        R            Restart (end screen)\n  Q / Esc         Quit"
)]
pub struct Args {
    /// Part lengths, in order (e.g. 4,4 for two screens of four; 4 for a single four-step screen).
    #[arg(long, value_delimiter = ',', default_value = "4,4", value_name = "LENS")]
    pub parts: Vec<usize>,

    /// What a wrong drop does besides costing a life.
    #[arg(short, long, default_value = "penalize")]
    pub wrong_drop: WrongDropPolicy,

    /// Release the input lock if a cue has not completed after this long.
    #[arg(long, default_value = "4000", value_name = "MS")]
    pub cue_timeout_ms: u64,

    /// Do not ring the terminal bell (cue timing is unchanged).
    #[arg(long)]
    pub mute: bool,

    /// Seed for the tile shuffle (reproducible layouts).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Skip the home screen and start immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable overlay fade and slot shake.
    #[arg(long)]
    pub no_animation: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Directory for stepstui.log (default: $XDG_STATE_HOME/stepstui).
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

/// Wrong-drop handling: lose a life only, or also wipe the current part's slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WrongDropPolicy {
    #[default]
    #[value(name = "penalize")]
    PenalizeOnly,
    ClearPart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["stepstui"]);
        assert_eq!(args.parts, vec![4, 4]);
        assert_eq!(args.wrong_drop, WrongDropPolicy::PenalizeOnly);
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!(config.partitioning.part_count(), 2);
        assert_eq!(config.cue_timeout, Duration::from_millis(4000));
    }

    #[test]
    fn test_overflowing_parts_is_config_error() {
        let args = Args::parse_from(["stepstui", "--parts", "18446744073709551615,1"]);
        assert!(GameConfig::from_args(&args).is_err());
    }

    #[test]
    fn test_single_part_variant() {
        let args = Args::parse_from(["stepstui", "--parts", "4", "--wrong-drop", "clear-part"]);
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!(config.partitioning.total(), 4);
        assert_eq!(config.wrong_drop, WrongDropPolicy::ClearPart);
    }

    #[test]
    fn test_bad_parts_rejected() {
        let args = Args::parse_from(["stepstui", "--parts", "6,6"]);
        assert!(GameConfig::from_args(&args).is_err());
    }
}
