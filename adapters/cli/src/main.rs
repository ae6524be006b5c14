#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Dice Arena experience.

mod simulation;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use dice_arena_rendering::{Color, GridPresentation, Presentation, RenderingBackend, Scene};
use dice_arena_rendering_macroquad::{MacroquadBackend, Palette};
use dice_arena_world::{query, GameConfig, Level, DEFAULT_ARENA};
use tracing_subscriber::EnvFilter;

use crate::simulation::Simulation;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");
const WINDOW_TITLE: &str = "Dice Arena";

/// Command-line arguments accepted by the binary.
#[derive(Debug, Parser)]
#[command(name = "dice-arena", version, about = "Dice-gated arena shooter")]
struct CliArgs {
    /// Level file to load instead of the bundled arena.
    #[arg(long, value_name = "PATH")]
    level: Option<PathBuf>,

    /// Configuration file replacing the built-in tuning.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Overrides the configured random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Skips the tutorial screen.
    #[arg(long)]
    skip_tutorial: bool,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Screen pixels per world pixel.
    #[arg(long, default_value_t = 3.0)]
    zoom: f32,

    /// Palette manifest replacing the built-in colors.
    #[arg(long, value_name = "PATH")]
    palette: Option<PathBuf>,

    /// Logs the frame rate once per second.
    #[arg(long)]
    show_fps: bool,

    /// Enables or disables vertical sync.
    #[arg(long, value_name = "on|off")]
    vsync: Option<VsyncMode>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum VsyncMode {
    On,
    Off,
}

/// Entry point for the Dice Arena command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_level);

    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.skip_tutorial {
        config.start_with_tutorial = false;
    }
    let level = load_level(args.level.as_ref())?;

    let grid = GridPresentation::new(
        level.columns(),
        level.rows(),
        config.cell_size,
        Color::from_rgb_u8(250, 230, 120),
    )
    .context("level cannot be presented")?;

    let mut simulation = Simulation::new(config, &level);
    tracing::info!(
        columns = level.columns(),
        rows = level.rows(),
        "{}",
        query::welcome_banner(simulation.world())
    );

    let mut scene = Scene::new(grid);
    simulation.populate_scene(&mut scene);

    let mut backend = MacroquadBackend::new().with_show_fps(args.show_fps);
    if let Some(mode) = args.vsync {
        backend = backend.with_vsync(mode == VsyncMode::On);
    }
    if let Some(path) = args.palette {
        backend = backend.with_palette(Palette::from_manifest_path(path)?);
    }

    let presentation = Presentation::new(
        WINDOW_TITLE,
        Color::from_rgb_u8(18, 16, 26),
        args.zoom,
        scene,
    );
    backend.run(presentation, move |dt, input, scene| {
        simulation.frame(dt, &input, scene);
    })
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read configuration at {}", path.display()))?;
            GameConfig::from_toml_str(&contents)
                .with_context(|| format!("invalid configuration at {}", path.display()))
        }
        None => {
            GameConfig::from_toml_str(DEFAULT_CONFIG).context("built-in configuration is invalid")
        }
    }
}

fn load_level(path: Option<&PathBuf>) -> Result<Level> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read level at {}", path.display()))?;
            Level::parse(&contents).with_context(|| format!("invalid level at {}", path.display()))
        }
        None => Level::parse(DEFAULT_ARENA).context("bundled arena is invalid"),
    }
}
