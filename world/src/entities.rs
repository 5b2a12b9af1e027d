//! Entity records stored inside the world.

use std::time::Duration;

use crypt_crawler_core::{
    BlockedDirections, Direction, PlayerSnapshot, PursuerId, PursuerSnapshot, PursuerState,
    TileCoord,
};

/// Decorative prop kinds. Props never occupy tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropKind {
    /// Free-standing torch.
    Torch,
    /// Wall-mounted torch.
    SideTorch,
}

/// Static decoration placed by the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prop {
    kind: PropKind,
    cell: TileCoord,
}

impl Prop {
    pub(crate) const fn new(kind: PropKind, cell: TileCoord) -> Self {
        Self { kind, cell }
    }

    /// Kind of decoration.
    #[must_use]
    pub const fn kind(&self) -> PropKind {
        self.kind
    }

    /// Tile the decoration is drawn on.
    #[must_use]
    pub const fn cell(&self) -> TileCoord {
        self.cell
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Player {
    pub(crate) cell: TileCoord,
    pub(crate) facing_right: bool,
    pub(crate) blocked: BlockedDirections,
    pub(crate) keys_held: u32,
    pub(crate) cooldown: Duration,
}

impl Player {
    pub(crate) fn at(cell: TileCoord) -> Self {
        Self {
            cell,
            facing_right: true,
            blocked: BlockedDirections::default(),
            keys_held: 0,
            cooldown: Duration::ZERO,
        }
    }

    pub(crate) fn face(&mut self, direction: Direction) {
        match direction {
            Direction::East => self.facing_right = true,
            Direction::West => self.facing_right = false,
            Direction::North | Direction::South => {}
        }
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            cell: self.cell,
            blocked: self.blocked,
            facing_right: self.facing_right,
            keys_held: self.keys_held,
            ready_to_move: self.cooldown.is_zero(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Pursuer {
    pub(crate) id: PursuerId,
    pub(crate) cell: TileCoord,
    pub(crate) state: PursuerState,
    pub(crate) facing_right: bool,
    pub(crate) blocked: BlockedDirections,
    pub(crate) accumulator: Duration,
}

impl Pursuer {
    pub(crate) fn at(id: PursuerId, cell: TileCoord) -> Self {
        Self {
            id,
            cell,
            state: PursuerState::Idle,
            facing_right: false,
            blocked: BlockedDirections::default(),
            accumulator: Duration::ZERO,
        }
    }

    pub(crate) fn face(&mut self, direction: Direction) {
        match direction {
            Direction::East => self.facing_right = true,
            Direction::West => self.facing_right = false,
            Direction::North | Direction::South => {}
        }
    }

    pub(crate) fn snapshot(&self, step_delay: Duration) -> PursuerSnapshot {
        PursuerSnapshot {
            id: self.id,
            cell: self.cell,
            state: self.state,
            blocked: self.blocked,
            facing_right: self.facing_right,
            ready_for_step: self.accumulator >= step_delay,
        }
    }
}

/// Shared sprite animation cycle advanced by fixed ticks.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AnimationClock {
    elapsed: Duration,
    frame: u8,
}

impl AnimationClock {
    pub(crate) fn frame(&self) -> u8 {
        self.frame
    }

    /// Accumulates `dt` and returns the new frame when the cycle moved.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        frame_duration: Duration,
        frames: u8,
    ) -> Option<u8> {
        if frame_duration.is_zero() || frames == 0 {
            return None;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        let mut advanced = false;
        while self.elapsed >= frame_duration {
            self.elapsed -= frame_duration;
            self.frame = (self.frame + 1) % frames;
            advanced = true;
        }

        advanced.then_some(self.frame)
    }
}
