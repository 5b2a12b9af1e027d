#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Best-first grid search that steers pursuers toward the player.
//!
//! The search orders its frontier by accumulated cost plus the Manhattan
//! distance to the goal. Entries with equal priority pop in discovery order,
//! which keeps every query deterministic for a given layout.

use std::{cmp::Reverse, collections::BinaryHeap};

use crypt_crawler_core::{Direction, OccupancyView, TileCoord, TileView};

const UNVISITED: u32 = u32::MAX;

/// Per-cell record kept in the search cost table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PathCell {
    predecessor: Option<TileCoord>,
    cost: u32,
}

impl PathCell {
    const UNVISITED: Self = Self {
        predecessor: None,
        cost: UNVISITED,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct FrontierEntry {
    priority: u32,
    sequence: u64,
    cell: TileCoord,
    cost: u32,
}

/// Reusable path finder that keeps its cost table and frontier between queries.
#[derive(Debug, Default)]
pub struct PathFinder {
    columns: u32,
    cells: Vec<PathCell>,
    frontier: BinaryHeap<Reverse<FrontierEntry>>,
}

impl PathFinder {
    /// Creates a path finder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first move from `from` along a shortest path to `goal`.
    ///
    /// Yields `None` when `from` equals `goal` or when no path exists.
    #[must_use]
    pub fn next_step(
        &mut self,
        from: TileCoord,
        goal: TileCoord,
        tiles: TileView<'_>,
        occupancy: OccupancyView<'_>,
    ) -> Option<Direction> {
        let path = self.find_path(from, goal, tiles, occupancy)?;
        let first = path.first()?;
        from.direction_to(*first)
    }

    /// Computes the cells walked from `from` to `goal`, excluding `from`.
    ///
    /// Cells are expandable when they are not solid and hold no door or
    /// pursuer. The goal must itself be expandable to be reached.
    #[must_use]
    pub fn find_path(
        &mut self,
        from: TileCoord,
        goal: TileCoord,
        tiles: TileView<'_>,
        occupancy: OccupancyView<'_>,
    ) -> Option<Vec<TileCoord>> {
        if from == goal {
            return Some(Vec::new());
        }
        if !tiles.contains(from) || !is_expandable(goal, tiles, occupancy) {
            return None;
        }

        self.reset(tiles.dimensions());
        let mut sequence = 0_u64;
        self.record(from, PathCell {
            predecessor: None,
            cost: 0,
        });
        self.frontier.push(Reverse(FrontierEntry {
            priority: from.manhattan_distance(goal),
            sequence,
            cell: from,
            cost: 0,
        }));

        while let Some(Reverse(entry)) = self.frontier.pop() {
            if entry.cell == goal {
                return self.reconstruct(from, goal);
            }
            if entry.cost > self.cost(entry.cell) {
                continue;
            }

            let next_cost = entry.cost.saturating_add(1);
            for direction in Direction::ALL {
                let Some(neighbor) = entry.cell.neighbor(direction) else {
                    continue;
                };
                if !is_expandable(neighbor, tiles, occupancy) || next_cost >= self.cost(neighbor) {
                    continue;
                }

                self.record(neighbor, PathCell {
                    predecessor: Some(entry.cell),
                    cost: next_cost,
                });
                sequence += 1;
                self.frontier.push(Reverse(FrontierEntry {
                    priority: next_cost.saturating_add(neighbor.manhattan_distance(goal)),
                    sequence,
                    cell: neighbor,
                    cost: next_cost,
                }));
            }
        }

        None
    }

    fn reset(&mut self, (columns, rows): (u32, u32)) {
        let len = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        self.columns = columns;
        self.cells.clear();
        self.cells.resize(len, PathCell::UNVISITED);
        self.frontier.clear();
    }

    fn index(&self, cell: TileCoord) -> Option<usize> {
        if cell.column() >= self.columns {
            return None;
        }
        let index = u64::from(cell.row()) * u64::from(self.columns) + u64::from(cell.column());
        usize::try_from(index)
            .ok()
            .filter(|index| *index < self.cells.len())
    }

    fn cost(&self, cell: TileCoord) -> u32 {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .map_or(UNVISITED, |record| record.cost)
    }

    fn record(&mut self, cell: TileCoord, record: PathCell) {
        if let Some(slot) = self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            *slot = record;
        }
    }

    fn reconstruct(&self, from: TileCoord, goal: TileCoord) -> Option<Vec<TileCoord>> {
        let mut path = vec![goal];
        let mut cursor = goal;
        while cursor != from {
            let record = self.cells.get(self.index(cursor)?)?;
            cursor = record.predecessor?;
            if cursor != from {
                path.push(cursor);
            }
        }
        path.reverse();
        Some(path)
    }
}

fn is_expandable(cell: TileCoord, tiles: TileView<'_>, occupancy: OccupancyView<'_>) -> bool {
    !tiles.is_solid(cell) && !occupancy.blocks_movement(cell)
}
