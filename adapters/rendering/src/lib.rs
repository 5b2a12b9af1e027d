#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Crypt Crawler adapters.
//!
//! The core exposes world-space positions and a shared animation frame;
//! backends turn a captured [`Scene`] into draw calls.

use anyhow::Result as AnyResult;
use crypt_crawler_core::{LevelStatus, PursuerState, TileCode, TileCoord};
use crypt_crawler_world::{query, PropKind, World};
use glam::Vec2;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Dark purple tint behind the dungeon while a level is being played.
    pub const DUNGEON: Self = Self::new(0.1412, 0.0745, 0.1020, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Clear color used while the level is in `status`.
    #[must_use]
    pub const fn for_status(status: LevelStatus) -> Self {
        match status {
            LevelStatus::InProgress => Self::DUNGEON,
            LevelStatus::Cleared | LevelStatus::Lost => Self::BLACK,
        }
    }
}

/// Single tile quad of the level layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileQuad {
    /// Tile drawn by the quad.
    pub cell: TileCoord,
    /// Sprite sheet index of the tile.
    pub code: TileCode,
    /// World-space top-left corner of the quad.
    pub origin: Vec2,
}

/// Sprite categories drawn on top of the tile layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    /// The player character.
    Player,
    /// A skull wandering while unaware of the player.
    IdleSkull,
    /// A skull chasing the player.
    ChasingSkull,
    /// Free-standing torch.
    Torch,
    /// Wall-mounted torch.
    SideTorch,
    /// Uncollected key.
    Key,
    /// Locked door.
    Door,
    /// Exit ladder.
    Exit,
}

impl SpriteKind {
    /// Reports whether the sprite cycles through the shared animation frames.
    #[must_use]
    pub const fn is_animated(self) -> bool {
        matches!(
            self,
            Self::Player | Self::IdleSkull | Self::ChasingSkull | Self::Torch | Self::SideTorch
        )
    }
}

/// Positioned, animated sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    /// What the sprite depicts.
    pub kind: SpriteKind,
    /// Tile the sprite stands on.
    pub cell: TileCoord,
    /// World-space center of the sprite.
    pub position: Vec2,
    /// Animation frame to draw.
    pub frame: u8,
    /// Whether the sprite faces right; left-facing sprites are mirrored.
    pub facing_right: bool,
}

/// Scene description combining the tile layer and its inhabitants.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Side length of a tile in world units.
    pub tile_length: f32,
    /// Tile quads in row-major order.
    pub tiles: Vec<TileQuad>,
    /// Sprites in draw order: props first, then pickups, then actors.
    pub sprites: Vec<Sprite>,
    /// Progress of the captured level.
    pub status: LevelStatus,
}

impl Scene {
    /// Captures the drawable state of `world`.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        let grid = query::tile_grid(world);
        let tile_length = grid.tile_length();
        let frame = query::animation_frame(world);

        let mut tiles = Vec::with_capacity((grid.columns() * grid.rows()) as usize);
        for row in 0..grid.rows() {
            for column in 0..grid.columns() {
                let cell = TileCoord::new(column, row);
                if let Some(code) = grid.code(cell) {
                    tiles.push(TileQuad {
                        cell,
                        code,
                        origin: grid.tile_center(cell)
                            + Vec2::new(-tile_length / 2.0, tile_length / 2.0),
                    });
                }
            }
        }

        let mut sprites = Vec::new();
        let mut push = |kind: SpriteKind, cell: TileCoord, facing_right: bool| {
            sprites.push(Sprite {
                kind,
                cell,
                position: grid.tile_center(cell),
                frame: if kind.is_animated() { frame } else { 0 },
                facing_right,
            });
        };

        for prop in query::props(world) {
            let kind = match prop.kind() {
                PropKind::Torch => SpriteKind::Torch,
                PropKind::SideTorch => SpriteKind::SideTorch,
            };
            push(kind, prop.cell(), true);
        }
        if let Some(exit) = query::exit(world) {
            push(SpriteKind::Exit, exit, true);
        }
        for key in query::keys(world) {
            push(SpriteKind::Key, *key, true);
        }
        for door in query::doors(world) {
            push(SpriteKind::Door, *door, true);
        }
        for pursuer in query::pursuer_view(world).iter() {
            let kind = match pursuer.state {
                PursuerState::Idle => SpriteKind::IdleSkull,
                PursuerState::Chase => SpriteKind::ChasingSkull,
            };
            push(kind, pursuer.cell, pursuer.facing_right);
        }
        if let Some(player) = query::player(world) {
            push(SpriteKind::Player, player.cell, player.facing_right);
        }

        Self {
            columns: grid.columns(),
            rows: grid.rows(),
            tile_length,
            tiles,
            sprites,
            status: query::status(world),
        }
    }

    /// Total width of the scene in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Total height of the scene in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Sprites standing on `cell`, in draw order.
    pub fn sprites_at(&self, cell: TileCoord) -> impl Iterator<Item = &Sprite> {
        self.sprites
            .iter()
            .filter(move |sprite| sprite.cell == cell)
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title shown by the backend.
    pub title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Captures `world` into a presentation titled `title`.
    #[must_use]
    pub fn capture<T>(title: T, world: &World) -> Self
    where
        T: Into<String>,
    {
        let scene = Scene::capture(world);
        Self {
            title: title.into(),
            clear_color: Color::for_status(scene.status),
            scene,
        }
    }
}

/// Rendering backend capable of presenting Crypt Crawler scenes.
pub trait RenderingBackend {
    /// Draws a single presentation.
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()>;
}
