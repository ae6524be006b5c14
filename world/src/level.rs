//! ASCII level loading.
//!
//! Each character of a level file describes one cell. Every cell receives a
//! floor tile; the character may add one more entity on top of it.

use dice_arena_core::{CellCoord, ObjKind, PickupKind};
use thiserror::Error;

/// Arena shipped with the game.
pub const DEFAULT_ARENA: &str = include_str!("../levels/arena.txt");

/// Errors raised while parsing a level.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    /// The level has no rows.
    #[error("level is empty")]
    Empty,
    /// A character has no entity mapping.
    #[error("unknown tile {tile:?} at column {column}, row {row}")]
    UnknownTile {
        /// Offending character.
        tile: char,
        /// Column of the character.
        column: u32,
        /// Row of the character.
        row: u32,
    },
    /// A mandatory tile appears zero or several times.
    #[error("level must contain exactly one {tile:?} tile (found {count})")]
    TileCount {
        /// Mandatory character.
        tile: char,
        /// Number of occurrences.
        count: usize,
    },
}

/// Entity placed on a cell by the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Cell the entity occupies.
    pub cell: CellCoord,
    /// Entity type.
    pub kind: ObjKind,
}

/// Parsed level: grid dimensions and the entities to create, in load order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    columns: u32,
    rows: u32,
    placements: Vec<Placement>,
}

impl Level {
    /// Parses a level, requiring exactly one player and one target.
    pub fn parse(source: &str) -> Result<Self, LevelError> {
        let lines: Vec<&str> = source
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        let row_count = lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(0, |last| last + 1);
        if row_count == 0 {
            return Err(LevelError::Empty);
        }

        let lines = &lines[..row_count];
        let columns = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let columns = u32::try_from(columns).unwrap_or(u32::MAX);
        let rows = u32::try_from(row_count).unwrap_or(u32::MAX);

        let mut placements = Vec::new();
        for row in 0..rows {
            for column in 0..columns {
                placements.push(Placement {
                    cell: CellCoord::new(column as i32, row as i32),
                    kind: ObjKind::Background,
                });
            }
        }

        for (row, line) in (0u32..).zip(lines) {
            for (column, tile) in (0u32..).zip(line.chars()) {
                let kind = tile_kind(tile).ok_or(LevelError::UnknownTile { tile, column, row })?;
                if let Some(kind) = kind {
                    placements.push(Placement {
                        cell: CellCoord::new(column as i32, row as i32),
                        kind,
                    });
                }
            }
        }

        for (tile, kind) in [('T', ObjKind::Target), ('P', ObjKind::Player)] {
            let count = placements.iter().filter(|placement| placement.kind == kind).count();
            if count != 1 {
                return Err(LevelError::TileCount { tile, count });
            }
        }

        Ok(Self {
            columns,
            rows,
            placements,
        })
    }

    /// Width in cells.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Height in cells.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Entities to create, floor tiles first.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
}

/// Maps a level character to the entity it adds. `Some(None)` is bare floor.
const fn tile_kind(tile: char) -> Option<Option<ObjKind>> {
    let kind = match tile {
        '.' | ' ' => None,
        '#' => Some(ObjKind::Wall),
        'P' => Some(ObjKind::Player),
        'T' => Some(ObjKind::Target),
        'S' => Some(ObjKind::Spawn),
        'E' => Some(ObjKind::Enemy),
        'B' => Some(ObjKind::EnemyBig),
        'g' => Some(ObjKind::Pickup(PickupKind::Shotgun)),
        's' => Some(ObjKind::Pickup(PickupKind::Speed)),
        'h' => Some(ObjKind::Pickup(PickupKind::Health)),
        _ => return None,
    };
    Some(kind)
}
