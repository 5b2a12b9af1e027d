#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Short-range line-of-sight scan that lets idle pursuers notice the player.

use std::collections::{HashSet, VecDeque};

use crypt_crawler_core::{
    Command, Direction, Event, Occupant, OccupancyView, PursuerState, PursuerView, TileCoord,
    TileView,
};

/// Cells closer than this Manhattan distance to the origin keep expanding.
const SCAN_RADIUS: u32 = 2;

/// Reports whether the player can be seen from `origin`.
///
/// The scan is a breadth-first expansion seeded with the four neighbours of
/// `origin`. Every visited cell is checked for the player; only open cells
/// closer than two tiles to the origin expand further, so walls stop the
/// scan and nothing beyond a two-tile Manhattan radius is ever visited.
#[must_use]
pub fn player_visible(
    origin: TileCoord,
    tiles: TileView<'_>,
    occupancy: OccupancyView<'_>,
) -> bool {
    Scan::default().run(origin, tiles, occupancy)
}

#[derive(Debug, Default)]
struct Scan {
    queue: VecDeque<TileCoord>,
    visited: HashSet<TileCoord>,
}

impl Scan {
    fn run(
        &mut self,
        origin: TileCoord,
        tiles: TileView<'_>,
        occupancy: OccupancyView<'_>,
    ) -> bool {
        self.queue.clear();
        self.visited.clear();
        let _ = self.visited.insert(origin);
        self.enqueue_neighbors(origin);

        while let Some(cell) = self.queue.pop_front() {
            if occupancy.occupant(cell) == Some(Occupant::Player) {
                return true;
            }

            if !tiles.is_solid(cell) && origin.manhattan_distance(cell) < SCAN_RADIUS {
                self.enqueue_neighbors(cell);
            }
        }

        false
    }

    fn enqueue_neighbors(&mut self, cell: TileCoord) {
        for direction in Direction::ALL {
            if let Some(neighbor) = cell.neighbor(direction) {
                if self.visited.insert(neighbor) {
                    self.queue.push_back(neighbor);
                }
            }
        }
    }
}

/// Visibility system that alerts idle pursuers once per simulation tick.
#[derive(Debug, Default)]
pub struct Visibility {
    scan: Scan,
}

impl Visibility {
    /// Creates a new visibility system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `AlertPursuer` for every idle pursuer that sees the player.
    ///
    /// Nothing happens unless `events` carries a `TimeAdvanced` event.
    /// Chasing pursuers are skipped.
    pub fn handle(
        &mut self,
        events: &[Event],
        pursuers: &PursuerView,
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

        for pursuer in pursuers.iter() {
            if pursuer.state != PursuerState::Idle {
                continue;
            }

            if self.scan.run(pursuer.cell, tiles, occupancy) {
                out.push(Command::AlertPursuer {
                    pursuer: pursuer.id,
                });
            }
        }
    }
}
