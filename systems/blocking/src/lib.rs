#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure resolver that reports which cardinal moves are impassable for a mobile entity.

use crypt_crawler_core::{BlockedDirections, Direction, OccupancyView, TileCoord, TileView};

/// Computes the blocked flags for an entity standing on `cell`.
///
/// A direction is blocked when the neighbouring tile is a wall, lies outside
/// the grid, or holds an occupant that stops movement (a door or another
/// pursuer). The result depends only on the views, so resolving twice without
/// intervening moves yields identical flags.
#[must_use]
pub fn resolve(
    cell: TileCoord,
    tiles: TileView<'_>,
    occupancy: OccupancyView<'_>,
) -> BlockedDirections {
    BlockedDirections::from_fn(|direction| is_blocked(cell, direction, tiles, occupancy))
}

/// Reports whether a single step from `cell` toward `direction` is impassable.
#[must_use]
pub fn is_blocked(
    cell: TileCoord,
    direction: Direction,
    tiles: TileView<'_>,
    occupancy: OccupancyView<'_>,
) -> bool {
    let Some(neighbor) = cell.neighbor(direction) else {
        return true;
    };

    tiles.is_solid(neighbor) || occupancy.blocks_movement(neighbor)
}
