#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Crypt Crawler levels headlessly.

mod ascii;
mod config;
mod session;

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crypt_crawler_level::load_level;
use crypt_crawler_rendering::{Presentation, RenderingBackend};
use crypt_crawler_world::query;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ascii::AsciiBackend;
use config::SimulationConfig;
use session::{MoveScript, Outcome, Session};

/// Play Crypt Crawler levels through the fixed-step simulation.
#[derive(Debug, Parser)]
#[command(name = "crypt-crawler", version)]
struct Args {
    /// Map files to play in order; clearing one loads the next
    #[arg(long = "level", required = true, num_args = 1..)]
    levels: Vec<PathBuf>,

    /// TOML file with simulation settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of frames to simulate per level
    #[arg(long)]
    frames: Option<u64>,

    /// Simulated real time per frame in milliseconds
    #[arg(long = "frame-ms")]
    frame_ms: Option<u64>,

    /// Player intents over U, D, L, R and `.` (wait one move delay), consumed whenever the player may move
    #[arg(long, default_value = "")]
    moves: String,

    /// Seed for pursuer wandering
    #[arg(long)]
    seed: Option<u64>,

    /// Print an ASCII view of each level when it ends
    #[arg(long)]
    render: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut SimulationConfig) {
        if let Some(frames) = self.frames {
            config.max_frames = frames;
        }
        if let Some(frame_ms) = self.frame_ms {
            config.frame_ms = frame_ms;
        }
        if let Some(seed) = self.seed {
            config.rng_seed = seed;
        }
    }
}

/// Entry point for the Crypt Crawler command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = SimulationConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    let mut script = MoveScript::parse(&args.moves).context("invalid --moves script")?;

    for (index, path) in args.levels.iter().enumerate() {
        let layout = load_level(path, config.tile_length)
            .with_context(|| format!("failed to load level {}", path.display()))?;
        let mut session = Session::new(&config, layout);
        if index == 0 {
            println!("{}", query::welcome_banner(session.world()));
        }

        let outcome = session.play(&mut script, config.frame_duration(), config.max_frames);
        info!(
            level = %path.display(),
            ?outcome,
            ticks = session.ticks(),
            remaining_moves = script.remaining(),
            "level session ended"
        );

        if args.render {
            let title = format!("Level {}", index + 1);
            AsciiBackend::new(io::stdout().lock())
                .present(&Presentation::capture(title, session.world()))?;
        }

        match outcome {
            Outcome::Cleared => println!("Level {} cleared.", index + 1),
            Outcome::Lost => {
                println!("GAME OVER");
                return Ok(());
            }
            Outcome::OutOfFrames => {
                warn!(frames = config.max_frames, "frame budget exhausted");
                println!("Level {} unfinished.", index + 1);
                return Ok(());
            }
        }
    }

    println!("All levels cleared.");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}
