//! Tile layout and occupancy grids owned by the world.

use crypt_crawler_core::{
    tile_center, world_to_tile, LevelLayout, Occupant, OccupancyView, TileCode, TileCoord,
    TileView,
};
use glam::Vec2;

/// Static tile layout of the active level.
///
/// Codes are stored row-major in a flat vector sized once when the level
/// loads. Lookups outside the grid report no code and count as solid.
#[derive(Clone, Debug)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_length: f32,
    codes: Vec<TileCode>,
}

impl TileGrid {
    pub(crate) fn empty(tile_length: f32) -> Self {
        Self {
            columns: 0,
            rows: 0,
            tile_length,
            codes: Vec::new(),
        }
    }

    /// Builds a grid from a parsed layout, rejecting inconsistent dimensions.
    pub(crate) fn from_layout(layout: &LevelLayout) -> Option<Self> {
        let expected = usize::try_from(u64::from(layout.columns) * u64::from(layout.rows)).ok()?;
        if layout.tiles.len() != expected || !(layout.tile_length > 0.0) {
            return None;
        }

        Some(Self {
            columns: layout.columns,
            rows: layout.rows,
            tile_length: layout.tile_length,
            codes: layout.tiles.clone(),
        })
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Tile code at `cell`, if the cell lies within the grid.
    #[must_use]
    pub fn code(&self, cell: TileCoord) -> Option<TileCode> {
        self.view().code(cell)
    }

    /// Reports whether `cell` is a wall or lies outside the grid.
    #[must_use]
    pub fn is_solid(&self, cell: TileCoord) -> bool {
        self.view().is_solid(cell)
    }

    /// Reports whether `cell` lies within the grid.
    #[must_use]
    pub fn contains(&self, cell: TileCoord) -> bool {
        self.view().contains(cell)
    }

    /// Converts a world-space position into a tile inside this grid.
    #[must_use]
    pub fn world_to_tile(&self, position: Vec2) -> Option<TileCoord> {
        world_to_tile(position, self.tile_length).filter(|cell| self.contains(*cell))
    }

    /// World-space center of `cell`.
    #[must_use]
    pub fn tile_center(&self, cell: TileCoord) -> Vec2 {
        tile_center(cell, self.tile_length)
    }

    /// Borrows the grid as a read-only view for systems.
    #[must_use]
    pub fn view(&self) -> TileView<'_> {
        TileView::new(&self.codes, self.columns, self.rows)
    }
}

/// Dense record of which entity stands on each tile.
#[derive(Clone, Debug)]
pub(crate) struct OccupancyGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<Occupant>>,
}

impl OccupancyGrid {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    pub(crate) fn occupant(&self, cell: TileCoord) -> Option<Occupant> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    pub(crate) fn is_vacant(&self, cell: TileCoord) -> bool {
        self.index(cell).is_some() && self.occupant(cell).is_none()
    }

    /// Records `occupant` on `cell`. Callers vacate the cell first.
    pub(crate) fn occupy(&mut self, cell: TileCoord, occupant: Occupant) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                debug_assert!(slot.is_none(), "cell {cell:?} already occupied by {slot:?}");
                *slot = Some(occupant);
            }
        }
    }

    pub(crate) fn vacate(&mut self, cell: TileCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = None;
            }
        }
    }

    pub(crate) fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|slot| slot.is_some()).count()
    }

    pub(crate) fn view(&self) -> OccupancyView<'_> {
        OccupancyView::new(&self.cells, self.columns, self.rows)
    }

    fn index(&self, cell: TileCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
