#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pursuer behaviour: chasing pursuers follow the path finder toward the
//! player, idle ones wander through open neighbouring tiles.

use crypt_crawler_core::{
    Command, Direction, Event, OccupancyView, PursuerSnapshot, PursuerState, PursuerView,
    TileCoord, TileView,
};
use crypt_crawler_system_pathfinding::PathFinder;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed used when callers do not provide one.
pub const DEFAULT_RNG_SEED: u64 = 0x5eed_c0de;

/// Pursuit system that decides one step per ready pursuer each tick.
#[derive(Debug)]
pub struct Pursuit {
    path_finder: PathFinder,
    rng: ChaCha8Rng,
    open: Vec<Direction>,
}

impl Pursuit {
    /// Creates a pursuit system whose wandering is driven by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            path_finder: PathFinder::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            open: Vec::with_capacity(Direction::ALL.len()),
        }
    }

    /// Emits `StepPursuer` commands for pursuers ready to move.
    ///
    /// Pursuers are visited in id order. A chasing pursuer asks the path
    /// finder for its next step toward `player`; when no path exists, or the
    /// pursuer is idle, it picks uniformly among its open directions. A
    /// pursuer boxed in on all sides emits nothing.
    pub fn handle(
        &mut self,
        events: &[Event],
        pursuers: &PursuerView,
        player: Option<TileCoord>,
        tiles: TileView<'_>,
        occupancy: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) {
        let ticked = events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }));
        if !ticked {
            return;
        }

        for pursuer in pursuers.iter().filter(|pursuer| pursuer.ready_for_step) {
            let chase = match (pursuer.state, player) {
                (PursuerState::Chase, Some(goal)) => {
                    self.path_finder
                        .next_step(pursuer.cell, goal, tiles, occupancy)
                }
                _ => None,
            };

            if let Some(direction) = chase.or_else(|| self.wander(pursuer)) {
                out.push(Command::StepPursuer {
                    pursuer: pursuer.id,
                    direction,
                });
            }
        }
    }

    fn wander(&mut self, pursuer: &PursuerSnapshot) -> Option<Direction> {
        self.open.clear();
        self.open.extend(pursuer.blocked.open_directions());
        if self.open.is_empty() {
            return None;
        }

        let index = self.rng.gen_range(0..self.open.len());
        self.open.get(index).copied()
    }
}

impl Default for Pursuit {
    fn default() -> Self {
        Self::new(DEFAULT_RNG_SEED)
    }
}
