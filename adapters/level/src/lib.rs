#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scene loader that turns line-oriented map files into level layouts.
//!
//! A map file is a sequence of bracketed sections, each terminated by a blank
//! line or the end of input:
//!
//! ```text
//! [header]
//! width=4
//! height=3
//!
//! [layer]
//! data=
//! 2,2,2,2,
//! 2,13,13,2,
//! 2,2,2,2
//!
//! [Entity]
//! type=Player
//! location=1,1,1,1
//! ```
//!
//! Tile codes are stored 1-indexed in the file; zero marks an empty slot.
//! Entity locations are tile coordinates and are converted to the world-space
//! center of that tile.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crypt_crawler_core::{tile_center, EntityKind, LevelLayout, Placement, TileCode, TileCoord};
use thiserror::Error;
use tracing::{debug, info};

/// Side length of a tile in world units used by the shipped maps.
pub const DEFAULT_TILE_LENGTH: f32 = 0.1;

/// Largest grid, in tiles, a map header may declare.
pub const MAX_MAP_CELLS: u64 = 1 << 20;

/// Errors raised while reading a map file. No partial layout is ever returned.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The map never declared a `[header]` section.
    #[error("map is missing its [header] section")]
    MissingHeader,
    /// The header omitted one of its required dimensions.
    #[error("[header] on line {line} does not declare `{name}`")]
    MissingDimension {
        /// Line of the `[header]` marker.
        line: usize,
        /// Name of the missing key.
        name: &'static str,
    },
    /// A numeric field could not be parsed or was out of range.
    #[error("line {line}: `{value}` is not a valid {expected}")]
    InvalidNumber {
        /// Line holding the value.
        line: usize,
        /// Offending text.
        value: String,
        /// Description of the expected value.
        expected: &'static str,
    },
    /// The header declared a grid with more tiles than [`MAX_MAP_CELLS`].
    #[error(
        "[header] on line {line} declares a {columns}x{rows} grid; at most {} tiles are allowed",
        MAX_MAP_CELLS
    )]
    DimensionsTooLarge {
        /// Line of the `[header]` marker.
        line: usize,
        /// Declared map width.
        columns: u32,
        /// Declared map height.
        rows: u32,
    },
    /// A `[layer]` section appeared before the dimensions were known.
    #[error("line {line}: [layer] appears before [header]")]
    LayerBeforeHeader {
        /// Line of the `[layer]` marker.
        line: usize,
    },
    /// A tile row carried fewer codes than the declared width.
    #[error("line {line}: expected {expected} tile codes, found {found}")]
    ShortRow {
        /// Line of the row.
        line: usize,
        /// Declared map width.
        expected: u32,
        /// Codes present on the row.
        found: usize,
    },
    /// The layer data ended before the declared height was reached.
    #[error("layer data starting on line {line} has {found} of {expected} rows")]
    MissingRows {
        /// Line of the `data=` key.
        line: usize,
        /// Declared map height.
        expected: u32,
        /// Rows present before the input ended.
        found: u32,
    },
    /// The map never provided tile data.
    #[error("map has no [layer] data")]
    MissingLayer,
    /// An entity section named a type the game does not know.
    #[error("line {line}: unknown entity type `{label}`")]
    UnknownEntityType {
        /// Line of the `type=` key.
        line: usize,
        /// Label found in the file.
        label: String,
    },
    /// A `location=` key appeared before any `type=` key in its section.
    #[error("line {line}: location given before an entity type")]
    LocationWithoutType {
        /// Line of the `location=` key.
        line: usize,
    },
    /// An entity was placed outside the declared grid.
    #[error("line {line}: placement at ({column}, {row}) lies outside the map")]
    PlacementOutOfBounds {
        /// Line of the `location=` key.
        line: usize,
        /// Requested column.
        column: u32,
        /// Requested row.
        row: u32,
    },
    /// The map does not place a player.
    #[error("map does not place a player")]
    MissingPlayer,
    /// The map places more than one player.
    #[error("line {line}: map places a second player")]
    DuplicatePlayer {
        /// Line of the second player's `location=` key.
        line: usize,
    },
    /// The map file could not be read.
    #[error("failed to read map file {path}")]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Reads and parses the map file stored at `path`.
pub fn load_level(path: impl AsRef<Path>, tile_length: f32) -> Result<LevelLayout, LevelError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let layout = parse_level(&source, tile_length)?;
    info!(
        path = %path.display(),
        columns = layout.columns,
        rows = layout.rows,
        placements = layout.placements.len(),
        "map file loaded"
    );
    Ok(layout)
}

/// Parses map text into a level layout with tiles `tile_length` units wide.
pub fn parse_level(source: &str, tile_length: f32) -> Result<LevelLayout, LevelError> {
    let mut parser = Parser::new(source);
    parser.run()?;
    parser.finish(tile_length)
}

#[derive(Clone, Copy, Debug)]
struct Dimensions {
    columns: u32,
    rows: u32,
}

#[derive(Clone, Copy, Debug)]
struct PendingPlacement {
    line: usize,
    kind: EntityKind,
    cell: TileCoord,
}

struct Parser<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    dimensions: Option<Dimensions>,
    tiles: Option<Vec<TileCode>>,
    placements: Vec<PendingPlacement>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().enumerate(),
            dimensions: None,
            tiles: None,
            placements: Vec::new(),
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        self.lines
            .next()
            .map(|(index, line)| (index + 1, line.trim()))
    }

    /// Next key/value line of the current section, or `None` at its end.
    fn section_entry(&mut self) -> Option<(usize, &'a str, &'a str)> {
        loop {
            let (line, text) = self.next_line()?;
            if text.is_empty() {
                return None;
            }
            if text.starts_with('#') {
                continue;
            }

            let (key, value) = text.split_once('=').unwrap_or((text, ""));
            return Some((line, key.trim(), value.trim()));
        }
    }

    fn run(&mut self) -> Result<(), LevelError> {
        while let Some((line, text)) = self.next_line() {
            let Some(name) = text
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            else {
                continue;
            };

            match name.trim().to_ascii_lowercase().as_str() {
                "header" => self.header(line)?,
                "layer" => self.layer(line)?,
                "entity" => self.entity()?,
                other => {
                    debug!(section = other, line, "skipping unrecognised map section");
                    while self.section_entry().is_some() {}
                }
            }
        }

        Ok(())
    }

    fn header(&mut self, start: usize) -> Result<(), LevelError> {
        let mut columns = None;
        let mut rows = None;
        while let Some((line, key, value)) = self.section_entry() {
            match key {
                "width" => columns = Some(parse_dimension(line, value)?),
                "height" => rows = Some(parse_dimension(line, value)?),
                _ => {}
            }
        }

        let columns = columns.ok_or(LevelError::MissingDimension {
            line: start,
            name: "width",
        })?;
        let rows = rows.ok_or(LevelError::MissingDimension {
            line: start,
            name: "height",
        })?;
        if u64::from(columns) * u64::from(rows) > MAX_MAP_CELLS {
            return Err(LevelError::DimensionsTooLarge {
                line: start,
                columns,
                rows,
            });
        }
        self.dimensions = Some(Dimensions { columns, rows });
        Ok(())
    }

    fn layer(&mut self, start: usize) -> Result<(), LevelError> {
        let dimensions = self
            .dimensions
            .ok_or(LevelError::LayerBeforeHeader { line: start })?;

        while let Some((line, key, _)) = self.section_entry() {
            if key == "data" {
                self.tiles = Some(self.layer_rows(line, dimensions)?);
            }
        }

        Ok(())
    }

    fn layer_rows(
        &mut self,
        data_line: usize,
        dimensions: Dimensions,
    ) -> Result<Vec<TileCode>, LevelError> {
        let width = usize::try_from(dimensions.columns).unwrap_or(usize::MAX);
        let mut tiles = Vec::new();

        for row in 0..dimensions.rows {
            let Some((line, text)) = self.next_line() else {
                return Err(LevelError::MissingRows {
                    line: data_line,
                    expected: dimensions.rows,
                    found: row,
                });
            };

            let codes: Vec<&str> = text
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .collect();
            if codes.len() < width {
                return Err(LevelError::ShortRow {
                    line,
                    expected: dimensions.columns,
                    found: codes.len(),
                });
            }

            for code in &codes[..width] {
                tiles.push(parse_tile_code(line, code)?);
            }
        }

        Ok(tiles)
    }

    fn entity(&mut self) -> Result<(), LevelError> {
        let mut kind = None;
        while let Some((line, key, value)) = self.section_entry() {
            match key {
                "type" => {
                    kind = Some(EntityKind::from_label(value).ok_or_else(|| {
                        LevelError::UnknownEntityType {
                            line,
                            label: value.to_owned(),
                        }
                    })?);
                }
                "location" => {
                    let kind = kind.ok_or(LevelError::LocationWithoutType { line })?;
                    let cell = parse_location(line, value)?;
                    self.placements.push(PendingPlacement { line, kind, cell });
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn finish(self, tile_length: f32) -> Result<LevelLayout, LevelError> {
        let dimensions = self.dimensions.ok_or(LevelError::MissingHeader)?;
        let tiles = self.tiles.ok_or(LevelError::MissingLayer)?;

        let mut player_seen = false;
        let mut placements = Vec::with_capacity(self.placements.len());
        for pending in self.placements {
            let PendingPlacement { line, kind, cell } = pending;
            if cell.column() >= dimensions.columns || cell.row() >= dimensions.rows {
                return Err(LevelError::PlacementOutOfBounds {
                    line,
                    column: cell.column(),
                    row: cell.row(),
                });
            }
            if kind == EntityKind::Player {
                if player_seen {
                    return Err(LevelError::DuplicatePlayer { line });
                }
                player_seen = true;
            }

            placements.push(Placement {
                kind,
                position: tile_center(cell, tile_length),
            });
        }

        if !player_seen {
            return Err(LevelError::MissingPlayer);
        }

        Ok(LevelLayout {
            columns: dimensions.columns,
            rows: dimensions.rows,
            tile_length,
            tiles,
            placements,
        })
    }
}

fn parse_number(line: usize, value: &str, expected: &'static str) -> Result<u32, LevelError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| LevelError::InvalidNumber {
            line,
            value: value.to_owned(),
            expected,
        })
}

fn parse_dimension(line: usize, value: &str) -> Result<u32, LevelError> {
    match parse_number(line, value, "map dimension")? {
        0 => Err(LevelError::InvalidNumber {
            line,
            value: value.to_owned(),
            expected: "map dimension",
        }),
        dimension => Ok(dimension),
    }
}

fn parse_tile_code(line: usize, value: &str) -> Result<TileCode, LevelError> {
    let raw = parse_number(line, value, "tile code")?;
    let code = u16::try_from(raw.saturating_sub(1)).map_err(|_| LevelError::InvalidNumber {
        line,
        value: value.to_owned(),
        expected: "tile code",
    })?;
    Ok(TileCode::new(code))
}

fn parse_location(line: usize, value: &str) -> Result<TileCoord, LevelError> {
    let mut fields = value.split(',');
    let mut coordinate = || parse_number(line, fields.next().unwrap_or(""), "tile coordinate");
    let column = coordinate()?;
    let row = coordinate()?;
    Ok(TileCoord::new(column, row))
}
