//! Room layout, cell occupancy queries and the flood-fill distance field.

use std::collections::VecDeque;

use dice_arena_core::CellCoord;
use glam::Vec2;

use crate::entity::Obj;

/// Coordinates of a room in the multi-room world grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoomCoord {
    /// Horizontal room index.
    pub x: i32,
    /// Vertical room index.
    pub y: i32,
}

impl RoomCoord {
    /// Creates a room coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Dimensions of a room and the mapping between pixels and cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoomLayout {
    cell_size: f32,
    columns: u32,
    rows: u32,
}

impl RoomLayout {
    /// Creates a room layout.
    #[must_use]
    pub const fn new(cell_size: f32, columns: u32, rows: u32) -> Self {
        Self {
            cell_size,
            columns,
            rows,
        }
    }

    /// Side of a cell in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of columns in a room.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in a room.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Width of a room in pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Height of a room in pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Top-left pixel of the cell inside the room starting at `room_origin`.
    #[must_use]
    pub fn cell_to_world(&self, cell: CellCoord, room_origin: Vec2) -> Vec2 {
        room_origin
            + Vec2::new(
                cell.column() as f32 * self.cell_size,
                cell.row() as f32 * self.cell_size,
            )
    }

    /// Cell containing the pixel.
    #[must_use]
    pub fn world_to_cell(&self, position: Vec2) -> CellCoord {
        CellCoord::new(
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// Room containing the pixel: nearest cell first, then floored by room size.
    #[must_use]
    pub fn world_to_room(&self, position: Vec2) -> RoomCoord {
        let column = (position.x / self.cell_size).round();
        let row = (position.y / self.cell_size).round();
        RoomCoord::new(
            (column / self.columns.max(1) as f32).floor() as i32,
            (row / self.rows.max(1) as f32).floor() as i32,
        )
    }

    /// Pixel origin of a room.
    #[must_use]
    pub fn room_origin(&self, room: RoomCoord) -> Vec2 {
        Vec2::new(room.x as f32 * self.width(), room.y as f32 * self.height())
    }

    /// Reports whether the cell lies inside the room.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= 0
            && cell.row() >= 0
            && (cell.column() as u32) < self.columns
            && (cell.row() as u32) < self.rows
    }
}

/// First colliding entity, in list order, whose cell equals `cell`.
#[must_use]
pub fn entity_at_cell(objects: &[Obj], cell: CellCoord, cell_size: f32) -> Option<&Obj> {
    objects
        .iter()
        .find(|obj| obj.collides() && obj.cell(cell_size) == cell)
}

/// Reports whether no colliding entity occupies the cell.
#[must_use]
pub fn is_cell_free(objects: &[Obj], cell: CellCoord, cell_size: f32) -> bool {
    entity_at_cell(objects, cell, cell_size).is_none()
}

/// Per-cell step count to the target over the 8-connected grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistanceField {
    columns: u32,
    rows: u32,
    distances: Vec<Option<u32>>,
}

impl DistanceField {
    /// Floods outward from `start` through every cell `is_free` accepts.
    ///
    /// `start` is seeded with zero even when occupied; unreachable cells stay
    /// unset.
    pub fn flood_fill<F>(columns: u32, rows: u32, start: CellCoord, mut is_free: F) -> Self
    where
        F: FnMut(CellCoord) -> bool,
    {
        let cell_count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut field = Self {
            columns,
            rows,
            distances: vec![None; cell_count],
        };

        let Some(start_index) = field.index(start) else {
            return field;
        };
        field.distances[start_index] = Some(0);

        let mut queue = VecDeque::new();
        queue.push_back((start, 0u32));

        while let Some((cell, distance)) = queue.pop_front() {
            for neighbor in cell.neighbors() {
                let Some(index) = field.index(neighbor) else {
                    continue;
                };

                if field.distances[index].is_some() || !is_free(neighbor) {
                    continue;
                }

                field.distances[index] = Some(distance + 1);
                queue.push_back((neighbor, distance + 1));
            }
        }

        field
    }

    /// Width of the field in cells.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Height of the field in cells.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Dense distances stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Option<u32>] {
        &self.distances
    }

    /// Distance stored for the cell, `None` when unset or out of bounds.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        self.index(cell).and_then(|index| self.distances[index])
    }

    /// Reports whether stepping from `from` to `to` strictly approaches the target.
    ///
    /// An unset origin counts as infinitely far away; an unset destination is
    /// unreachable and never acceptable.
    #[must_use]
    pub fn is_step_acceptable(&self, from: CellCoord, to: CellCoord) -> bool {
        self.approaches(from, self.distance(to))
    }

    /// Distance of a cell that was occupied during the flood: the stored
    /// value if any, otherwise one more than its nearest flooded neighbour.
    #[must_use]
    pub fn distance_through(&self, cell: CellCoord) -> Option<u32> {
        self.distance(cell).or_else(|| {
            cell.neighbors()
                .into_iter()
                .filter_map(|neighbor| self.distance(neighbor))
                .min()
                .map(|distance| distance + 1)
        })
    }

    /// Same rule as [`Self::is_step_acceptable`] with the destination measured
    /// by [`Self::distance_through`], for steps onto a character.
    #[must_use]
    pub fn is_step_onto_acceptable(&self, from: CellCoord, to: CellCoord) -> bool {
        self.approaches(from, self.distance_through(to))
    }

    fn approaches(&self, from: CellCoord, to_distance: Option<u32>) -> bool {
        let Some(to_distance) = to_distance else {
            return false;
        };

        self.distance(from)
            .map_or(true, |from_distance| to_distance < from_distance)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }

        usize::try_from(row * self.columns + column).ok()
    }
}
