//! Snapping of arbitrary world positions onto walkable cells.

use stealth_nav_core::{CellCoord, Vec2};

use crate::{Cell, WalkabilityGrid};

/// Searches expanding square rings around the cell nearest to `point`.
///
/// Rings are visited in increasing Chebyshev distance and the search stops
/// once no cell in a farther ring could beat the best candidate. Ties keep the
/// first candidate found, which makes the result deterministic.
pub(crate) fn nearest_walkable(
    grid: &WalkabilityGrid,
    point: Vec2,
    radius: f32,
) -> Option<&Cell> {
    if !point.is_finite() || !radius.is_finite() || radius < 0.0 {
        return None;
    }

    let anchor = clamped_anchor(grid, point);
    let cell_size = grid.cell_size();
    let offset = point.distance(grid.center_of(anchor));
    let max_ring = ((radius + offset) / cell_size).ceil();
    let max_ring = if max_ring >= i64::from(u32::MAX) as f32 {
        i64::from(u32::MAX)
    } else {
        max_ring as i64
    };

    let mut best: Option<(&Cell, f32)> = None;

    for ring in 0..=max_ring {
        for coord in ring_cells(anchor, ring) {
            let Some(cell) = grid.cell(coord) else {
                continue;
            };
            if !cell.is_walkable() {
                continue;
            }

            let distance = point.distance(cell.center());
            if distance > radius {
                continue;
            }

            match best {
                Some((_, best_distance)) if best_distance <= distance => {}
                _ => best = Some((cell, distance)),
            }
        }

        if let Some((_, best_distance)) = best {
            let next_ring_floor = (ring + 1) as f32 * cell_size - offset;
            if best_distance <= next_ring_floor {
                break;
            }
        }

        if ring > i64::from(grid.columns().max(grid.rows())) {
            break;
        }
    }

    best.map(|(cell, _)| cell)
}

/// Cell nearest to `point`, clamped into the grid so positions outside the
/// bounds still search from the closest edge.
fn clamped_anchor(grid: &WalkabilityGrid, point: Vec2) -> CellCoord {
    let local = (point - grid.origin()) / grid.cell_size();
    let column = clamp_axis(local.x, grid.columns());
    let row = clamp_axis(local.y, grid.rows());
    CellCoord::new(column, row)
}

fn clamp_axis(value: f32, count: u32) -> u32 {
    let upper = count.saturating_sub(1);
    let rounded = value.round();
    if rounded <= 0.0 {
        0
    } else if rounded >= upper as f32 {
        upper
    } else {
        rounded as u32
    }
}

/// Coordinates on the square ring at Chebyshev distance `ring` from `center`.
///
/// Coordinates that would fall below zero are skipped; callers filter the
/// upper bounds through the grid lookup.
fn ring_cells(center: CellCoord, ring: i64) -> impl Iterator<Item = CellCoord> {
    let column = i64::from(center.column());
    let row = i64::from(center.row());

    (-ring..=ring)
        .flat_map(move |dy| (-ring..=ring).map(move |dx| (dx, dy)))
        .filter(move |(dx, dy)| dx.abs() == ring || dy.abs() == ring)
        .filter_map(move |(dx, dy)| {
            let column = u32::try_from(column + dx).ok()?;
            let row = u32::try_from(row + dy).ok()?;
            Some(CellCoord::new(column, row))
        })
}
