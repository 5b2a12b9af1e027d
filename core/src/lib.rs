#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Crypt Crawler simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views such as [`TileView`] and [`OccupancyView`], and respond exclusively
//! with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Crypt Crawler.";

/// Number of frames in the shared sprite animation cycle.
pub const ANIMATION_FRAME_COUNT: u8 = 4;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Updates the simulated durations that pace movement and animation.
    ConfigureTiming {
        /// Minimum simulated time between two honoured player intents.
        player_move_delay: Duration,
        /// Simulated time a pursuer must accumulate before stepping again.
        pursuer_step_delay: Duration,
        /// Simulated time each animation frame stays on screen.
        animation_frame_duration: Duration,
    },
    /// Replaces the active level with the provided layout.
    LoadLevel {
        /// Fully parsed level description.
        layout: LevelLayout,
    },
    /// Advances the simulation clock by one fixed tick.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Applies a player intent to move one tile in the given direction.
    MovePlayer {
        /// Direction of the attempted move.
        direction: Direction,
    },
    /// Switches an idle pursuer into chase behaviour.
    AlertPursuer {
        /// Identifier of the pursuer that detected the player.
        pursuer: PursuerId,
    },
    /// Requests that a pursuer advance a single tile.
    StepPursuer {
        /// Identifier of the pursuer attempting to move.
        pursuer: PursuerId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a new level replaced the previous one.
    LevelLoaded {
        /// Number of tile columns in the new level.
        columns: u32,
        /// Number of tile rows in the new level.
        rows: u32,
        /// Number of pursuers placed in the level.
        pursuers: u32,
    },
    /// Indicates that the simulation clock advanced by one fixed tick.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Sequence number of the tick within the current level.
        tick: u64,
    },
    /// Reports that the shared animation cycle moved to a new frame.
    AnimationAdvanced {
        /// Frame index now displayed, in `0..ANIMATION_FRAME_COUNT`.
        frame: u8,
    },
    /// Confirms that the player moved between two tiles.
    PlayerMoved {
        /// Tile the player occupied before moving.
        from: TileCoord,
        /// Tile the player occupies after moving.
        to: TileCoord,
    },
    /// Reports that a player move was rejected without an alternate action.
    PlayerBlocked {
        /// Direction of the rejected move.
        direction: Direction,
    },
    /// Confirms that the player picked up a key.
    KeyCollected {
        /// Tile the key was lying on.
        cell: TileCoord,
        /// Number of keys the player now carries.
        keys_held: u32,
    },
    /// Confirms that the player spent a key to open a door.
    DoorUnlocked {
        /// Tile the door occupied.
        cell: TileCoord,
    },
    /// Confirms that the player attacked and removed a pursuer.
    PursuerSlain {
        /// Identifier of the removed pursuer.
        pursuer: PursuerId,
        /// Tile the pursuer occupied.
        cell: TileCoord,
    },
    /// Announces that an idle pursuer started chasing the player.
    PursuerAlerted {
        /// Identifier of the alerted pursuer.
        pursuer: PursuerId,
    },
    /// Confirms that a pursuer moved between two tiles.
    PursuerAdvanced {
        /// Identifier of the pursuer that advanced.
        pursuer: PursuerId,
        /// Tile the pursuer occupied before moving.
        from: TileCoord,
        /// Tile the pursuer occupies after moving.
        to: TileCoord,
    },
    /// Reports that a pursuer reached the player.
    PlayerCaught {
        /// Identifier of the pursuer that caught the player.
        pursuer: PursuerId,
        /// Tile the player occupied when caught.
        cell: TileCoord,
    },
    /// Announces that the level entered a new status.
    LevelStatusChanged {
        /// Status that became active.
        status: LevelStatus,
    },
}

/// Progress of the active level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelStatus {
    /// The player is exploring and entities may move.
    InProgress,
    /// The player reached the exit ladder.
    Cleared,
    /// A pursuer caught the player.
    Lost,
}

/// Cardinal movement directions available to mobile entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices (world up).
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices (world down).
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All four directions in the canonical scan order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Column and row offsets applied by a single step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

/// Location of a single tile expressed as column and row indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Tile reached by a single step in `direction`.
    ///
    /// Returns `None` when the step would leave the non-negative quadrant.
    /// Upper bounds are not checked here; views treat those tiles as
    /// out of range.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Option<TileCoord> {
        let (dx, dy) = direction.offset();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(TileCoord::new(column, row))
    }

    /// Direction of a single step from `self` to an adjacent `other`.
    #[must_use]
    pub fn direction_to(self, other: TileCoord) -> Option<Direction> {
        let column_diff = self.column().abs_diff(other.column());
        let row_diff = self.row().abs_diff(other.row());
        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if other.column() > self.column() {
                Some(Direction::East)
            } else {
                Some(Direction::West)
            }
        } else if other.row() > self.row() {
            Some(Direction::South)
        } else {
            Some(Direction::North)
        }
    }
}

/// Numeric tile code taken from the level's tile sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCode(u16);

impl TileCode {
    /// Wraps a zero-based tile sheet index.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric tile sheet index.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Reports whether the tile is an impassable wall.
    ///
    /// Wall tiles are the sheet's top two rows, its left and right border
    /// columns, and the two wall rows starting at 40 and 50.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(
            self.0,
            0..=5 | 10 | 15 | 20 | 25 | 30 | 35 | 40..=45 | 50..=55
        )
    }
}

/// Tag describing what currently stands on a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    /// The player character.
    Player,
    /// A pursuing enemy.
    Pursuer,
    /// A locked door.
    Door,
    /// A key lying on the floor.
    Key,
}

impl Occupant {
    /// Reports whether mobile entities treat the occupant as an obstacle.
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        matches!(self, Self::Door | Self::Pursuer)
    }
}

/// Per-direction movement restrictions computed for a mobile entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockedDirections {
    north: bool,
    east: bool,
    south: bool,
    west: bool,
}

impl BlockedDirections {
    /// Flags with every direction open.
    pub const OPEN: Self = Self {
        north: false,
        east: false,
        south: false,
        west: false,
    };

    /// Builds flags by evaluating `is_blocked` once per direction.
    #[must_use]
    pub fn from_fn<F>(mut is_blocked: F) -> Self
    where
        F: FnMut(Direction) -> bool,
    {
        Self {
            north: is_blocked(Direction::North),
            east: is_blocked(Direction::East),
            south: is_blocked(Direction::South),
            west: is_blocked(Direction::West),
        }
    }

    /// Reports whether movement in `direction` is impassable.
    #[must_use]
    pub const fn is_blocked(&self, direction: Direction) -> bool {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }

    /// Iterator over the directions that remain passable.
    pub fn open_directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |direction| !self.is_blocked(*direction))
    }
}

/// Unique identifier assigned to a pursuer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PursuerId(u32);

impl PursuerId {
    /// Creates a new pursuer identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behavioural state of a pursuer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PursuerState {
    /// Wandering randomly until the player comes into view.
    Idle,
    /// Pathing toward the player. Pursuers never leave this state.
    Chase,
}

/// Kinds of entity that a level may place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player character.
    Player,
    /// Skull enemy that pursues the player.
    Skull,
    /// Free-standing animated torch.
    Torch,
    /// Wall-mounted animated torch.
    SideTorch,
    /// Key that unlocks a single door.
    Key,
    /// Locked door.
    Door,
    /// Ladder leading out of the level.
    Exit,
}

impl EntityKind {
    /// Parses the label used by the level text format.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Player" => Some(Self::Player),
            "Skull" => Some(Self::Skull),
            "Torch" => Some(Self::Torch),
            "Side_Torch" => Some(Self::SideTorch),
            "Key" => Some(Self::Key),
            "Door" => Some(Self::Door),
            "Exit" => Some(Self::Exit),
            _ => None,
        }
    }

    /// Label used by the level text format.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Skull => "Skull",
            Self::Torch => "Torch",
            Self::SideTorch => "Side_Torch",
            Self::Key => "Key",
            Self::Door => "Door",
            Self::Exit => "Exit",
        }
    }
}

/// Entity requested by a level at a world-space position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Kind of entity to create.
    pub kind: EntityKind,
    /// World-space position of the entity, normally a tile center.
    pub position: Vec2,
}

/// Fully parsed level handed from the loader to the world.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelLayout {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Side length of a tile in world units.
    pub tile_length: f32,
    /// Tile codes stored row-major, `columns * rows` entries.
    pub tiles: Vec<TileCode>,
    /// Entities to place once the grid exists.
    pub placements: Vec<Placement>,
}

/// Converts a world-space position into the tile containing it.
///
/// World `y` grows upward while tile rows grow downward, so the row is
/// `floor(y / -tile_length)`. Positions left of or above the grid origin
/// yield `None`, as does a non-positive tile length.
#[must_use]
pub fn world_to_tile(position: Vec2, tile_length: f32) -> Option<TileCoord> {
    if tile_length <= 0.0 {
        return None;
    }

    let column = (position.x / tile_length).floor();
    let row = (position.y / -tile_length).floor();
    if column < 0.0 || row < 0.0 || column > u32::MAX as f32 || row > u32::MAX as f32 {
        return None;
    }

    Some(TileCoord::new(column as u32, row as u32))
}

/// World-space center of the provided tile.
#[must_use]
pub fn tile_center(cell: TileCoord, tile_length: f32) -> Vec2 {
    let half = tile_length / 2.0;
    Vec2::new(
        cell.column() as f32 * tile_length + half,
        -(cell.row() as f32 * tile_length) - half,
    )
}

/// Read-only view into the static tile layout.
#[derive(Clone, Copy, Debug)]
pub struct TileView<'a> {
    codes: &'a [TileCode],
    columns: u32,
    rows: u32,
}

impl<'a> TileView<'a> {
    /// Captures a new tile view backed by the provided row-major codes.
    #[must_use]
    pub fn new(codes: &'a [TileCode], columns: u32, rows: u32) -> Self {
        Self {
            codes,
            columns,
            rows,
        }
    }

    /// Tile code stored at `cell`, or `None` when the cell lies outside the grid.
    #[must_use]
    pub fn code(&self, cell: TileCoord) -> Option<TileCode> {
        grid_index(cell, self.columns, self.rows).and_then(|index| self.codes.get(index).copied())
    }

    /// Reports whether the cell is a wall. Cells outside the grid count as walls.
    #[must_use]
    pub fn is_solid(&self, cell: TileCoord) -> bool {
        self.code(cell).map_or(true, TileCode::is_solid)
    }

    /// Reports whether the cell lies within the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: TileCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Provides the dimensions of the underlying tile grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<Occupant>],
    columns: u32,
    rows: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<Occupant>], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Returns the occupant of the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: TileCoord) -> Option<Occupant> {
        grid_index(cell, self.columns, self.rows)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the cell currently has no occupant.
    #[must_use]
    pub fn is_free(&self, cell: TileCoord) -> bool {
        self.occupant(cell).is_none()
    }

    /// Reports whether the cell's occupant stops mobile entities.
    #[must_use]
    pub fn blocks_movement(&self, cell: TileCoord) -> bool {
        self.occupant(cell).map_or(false, Occupant::blocks_movement)
    }

    /// Provides the dimensions of the underlying occupancy grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }
}

fn grid_index(cell: TileCoord, columns: u32, rows: u32) -> Option<usize> {
    if cell.column() < columns && cell.row() < rows {
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(columns).ok()?;
        Some(row * width + column)
    } else {
        None
    }
}

/// Immutable representation of the player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Tile currently occupied by the player.
    pub cell: TileCoord,
    /// Directions the player could not move in when last resolved.
    pub blocked: BlockedDirections,
    /// Whether the sprite faces right.
    pub facing_right: bool,
    /// Number of keys carried.
    pub keys_held: u32,
    /// Whether the movement delay has elapsed.
    pub ready_to_move: bool,
}

/// Immutable representation of a single pursuer's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PursuerSnapshot {
    /// Unique identifier assigned to the pursuer.
    pub id: PursuerId,
    /// Tile currently occupied by the pursuer.
    pub cell: TileCoord,
    /// Behavioural state of the pursuer.
    pub state: PursuerState,
    /// Directions the pursuer could not move in when last resolved.
    pub blocked: BlockedDirections,
    /// Whether the sprite faces right.
    pub facing_right: bool,
    /// Indicates whether the pursuer accrued enough time to step.
    pub ready_for_step: bool,
}

/// Read-only snapshot describing all pursuers within the level.
#[derive(Clone, Debug, Default)]
pub struct PursuerView {
    snapshots: Vec<PursuerSnapshot>,
}

impl PursuerView {
    /// Creates a new pursuer view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PursuerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured pursuer snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &PursuerSnapshot> {
        self.snapshots.iter()
    }

    /// Number of pursuers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no pursuers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PursuerSnapshot> {
        self.snapshots
    }
}
