//! Text backend that prints captured scenes as character grids.

use std::io::Write;

use anyhow::{Context, Result};
use crypt_crawler_core::{LevelStatus, TileCoord};
use crypt_crawler_rendering::{Presentation, RenderingBackend, Scene, SpriteKind};

/// Writes each presentation as a titled character grid.
#[derive(Debug)]
pub(crate) struct AsciiBackend<W> {
    out: W,
}

impl<W: Write> AsciiBackend<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RenderingBackend for AsciiBackend<W> {
    fn present(&mut self, presentation: &Presentation) -> Result<()> {
        let status = match presentation.scene.status {
            LevelStatus::InProgress => "in progress",
            LevelStatus::Cleared => "cleared",
            LevelStatus::Lost => "GAME OVER",
        };
        writeln!(self.out, "{} ({status})", presentation.title)
            .and_then(|()| write!(self.out, "{}", render(&presentation.scene)))
            .and_then(|()| self.out.flush())
            .context("failed to write ascii frame")
    }
}

/// Renders `scene` with one character per tile and one line per row.
pub(crate) fn render(scene: &Scene) -> String {
    let mut text = String::with_capacity(((scene.columns + 1) * scene.rows) as usize);
    for row in 0..scene.rows {
        for column in 0..scene.columns {
            text.push(glyph(scene, TileCoord::new(column, row)));
        }
        text.push('\n');
    }
    text
}

fn glyph(scene: &Scene, cell: TileCoord) -> char {
    if let Some(sprite) = scene.sprites_at(cell).last() {
        return match sprite.kind {
            SpriteKind::Player => '@',
            SpriteKind::IdleSkull => 's',
            SpriteKind::ChasingSkull => 'S',
            SpriteKind::Torch => 't',
            SpriteKind::SideTorch => 'i',
            SpriteKind::Key => 'k',
            SpriteKind::Door => '+',
            SpriteKind::Exit => '>',
        };
    }

    let solid = scene
        .tiles
        .get((cell.row() * scene.columns + cell.column()) as usize)
        .map_or(true, |tile| tile.code.is_solid());
    if solid {
        '#'
    } else {
        '.'
    }
}
