//! Simulation settings read from an optional TOML file.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use crypt_crawler_core::Command;
use crypt_crawler_level::DEFAULT_TILE_LENGTH;
use crypt_crawler_system_clock::{SimulationClock, DEFAULT_MAX_TICKS_PER_FRAME};
use crypt_crawler_system_pursuit::DEFAULT_RNG_SEED;
use serde::Deserialize;

/// Tunable settings for a headless run. Every field has a default.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationConfig {
    pub(crate) ticks_per_second: u32,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) tile_length: f32,
    pub(crate) player_move_delay_ms: u64,
    pub(crate) pursuer_step_delay_ms: u64,
    pub(crate) animation_frame_ms: u64,
    pub(crate) rng_seed: u64,
    pub(crate) frame_ms: u64,
    pub(crate) max_frames: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 60,
            max_ticks_per_frame: DEFAULT_MAX_TICKS_PER_FRAME,
            tile_length: DEFAULT_TILE_LENGTH,
            player_move_delay_ms: 200,
            pursuer_step_delay_ms: 200,
            animation_frame_ms: 250,
            rng_seed: DEFAULT_RNG_SEED,
            frame_ms: 16,
            max_frames: 3_600,
        }
    }
}

impl SimulationConfig {
    /// Reads the file at `path`, or returns the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub(crate) fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse simulation config toml contents")
    }

    pub(crate) fn clock(&self) -> SimulationClock {
        SimulationClock::from_rate(self.ticks_per_second, self.max_ticks_per_frame)
    }

    pub(crate) fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    pub(crate) fn player_move_delay(&self) -> Duration {
        Duration::from_millis(self.player_move_delay_ms)
    }

    pub(crate) fn timing_command(&self) -> Command {
        Command::ConfigureTiming {
            player_move_delay: self.player_move_delay(),
            pursuer_step_delay: Duration::from_millis(self.pursuer_step_delay_ms),
            animation_frame_duration: Duration::from_millis(self.animation_frame_ms),
        }
    }
}
