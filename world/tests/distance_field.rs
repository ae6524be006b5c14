//! Property tests for the breadth-first distance field.
//!
//! Random wall masks are flooded and compared against a brute-force
//! relaxation over the same eight-connected grid.

use dice_arena_core::CellCoord;
use dice_arena_world::DistanceField;
use proptest::prelude::*;

fn grid_strategy() -> impl Strategy<Value = (u32, u32, Vec<bool>, u32, u32)> {
    (1u32..=9, 1u32..=9).prop_flat_map(|(columns, rows)| {
        let cells = (columns * rows) as usize;
        (
            Just(columns),
            Just(rows),
            prop::collection::vec(prop::bool::weighted(0.3), cells),
            0..columns,
            0..rows,
        )
    })
}

fn cell_at(columns: u32, index: usize) -> CellCoord {
    let index = index as u32;
    CellCoord::new((index % columns) as i32, (index / columns) as i32)
}

/// Repeats neighbour relaxation until nothing changes.
fn relaxed(columns: u32, rows: u32, walls: &[bool], start: CellCoord) -> Vec<Option<u32>> {
    let index_of = |cell: CellCoord| -> Option<usize> {
        let in_bounds = cell.column() >= 0
            && cell.row() >= 0
            && (cell.column() as u32) < columns
            && (cell.row() as u32) < rows;
        in_bounds.then(|| cell.row() as usize * columns as usize + cell.column() as usize)
    };

    let mut distances = vec![None; walls.len()];
    if let Some(index) = index_of(start) {
        distances[index] = Some(0u32);
    }

    loop {
        let mut changed = false;
        for index in 0..distances.len() {
            let Some(distance) = distances[index] else {
                continue;
            };
            for neighbor in cell_at(columns, index).neighbors() {
                let Some(next) = index_of(neighbor) else {
                    continue;
                };
                if walls[next] || neighbor == start {
                    continue;
                }
                if distances[next].map_or(true, |known| known > distance + 1) {
                    distances[next] = Some(distance + 1);
                    changed = true;
                }
            }
        }
        if !changed {
            return distances;
        }
    }
}

proptest! {
    #[test]
    fn flood_fill_matches_relaxation((columns, rows, walls, column, row) in grid_strategy()) {
        let start = CellCoord::new(column as i32, row as i32);
        let field = DistanceField::flood_fill(columns, rows, start, |cell| {
            !walls[cell.row() as usize * columns as usize + cell.column() as usize]
        });

        let expected = relaxed(columns, rows, &walls, start);
        prop_assert_eq!(field.cells(), expected.as_slice());
        prop_assert_eq!(field.distance(start), Some(0));
    }

    #[test]
    fn neighbouring_distances_differ_by_at_most_one((columns, rows, walls, column, row) in grid_strategy()) {
        let start = CellCoord::new(column as i32, row as i32);
        let field = DistanceField::flood_fill(columns, rows, start, |cell| {
            !walls[cell.row() as usize * columns as usize + cell.column() as usize]
        });

        for index in 0..field.cells().len() {
            let cell = cell_at(columns, index);
            let Some(distance) = field.distance(cell) else {
                continue;
            };
            for neighbor in cell.neighbors() {
                if let Some(other) = field.distance(neighbor) {
                    prop_assert!(distance.abs_diff(other) <= 1, "{cell:?} -> {neighbor:?}");
                }
            }
        }
    }

    #[test]
    fn acceptable_steps_strictly_descend((columns, rows, walls, column, row) in grid_strategy()) {
        let start = CellCoord::new(column as i32, row as i32);
        let field = DistanceField::flood_fill(columns, rows, start, |cell| {
            !walls[cell.row() as usize * columns as usize + cell.column() as usize]
        });

        for index in 0..field.cells().len() {
            let from = cell_at(columns, index);
            for to in from.neighbors() {
                let acceptable = field.is_step_acceptable(from, to);
                match (field.distance(from), field.distance(to)) {
                    (_, None) => prop_assert!(!acceptable),
                    (None, Some(_)) => prop_assert!(acceptable),
                    (Some(a), Some(b)) => prop_assert_eq!(acceptable, b < a),
                }
            }
        }
    }
}

#[test]
fn walled_off_cells_stay_unset() {
    // . # .
    // . # .
    let walls = [false, true, false, false, true, false];
    let field = DistanceField::flood_fill(3, 2, CellCoord::new(0, 0), |cell| {
        !walls[cell.row() as usize * 3 + cell.column() as usize]
    });

    assert_eq!(field.distance(CellCoord::new(0, 1)), Some(1));
    assert_eq!(field.distance(CellCoord::new(1, 0)), None);
    assert_eq!(field.distance(CellCoord::new(2, 1)), None);
    assert!(!field.is_step_acceptable(CellCoord::new(0, 1), CellCoord::new(2, 1)));
}
