//! Line traversal over the grid and the grid-backed obstruction probe.

use stealth_nav_core::{CellCoord, ObstacleClass, ObstructionProbe, ProbeHit, Vec2};

use crate::WalkabilityGrid;

/// Fraction of a cell advanced between probe samples.
const PROBE_STEP_FRACTION: f32 = 0.25;

/// Bresenham walk between the cells containing `from` and `to`.
pub(crate) fn line_walkable(grid: &WalkabilityGrid, from: Vec2, to: Vec2) -> bool {
    let (Some(start), Some(end)) = (grid.coord_at(from), grid.coord_at(to)) else {
        return false;
    };

    let mut x0 = i64::from(start.column());
    let mut y0 = i64::from(start.row());
    let x1 = i64::from(end.column());
    let y1 = i64::from(end.row());

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        if !walkable(grid, x0, y0) {
            return false;
        }
        if x0 == x1 && y0 == y1 {
            return true;
        }

        let e2 = 2 * err;
        let step_x = e2 > -dy;
        let step_y = e2 < dx;

        if step_x && step_y && !(walkable(grid, x0 + sx, y0) && walkable(grid, x0, y0 + sy)) {
            return false;
        }

        if step_x {
            err -= dy;
            x0 += sx;
        }
        if step_y {
            err += dx;
            y0 += sy;
        }
    }
}

fn walkable(grid: &WalkabilityGrid, column: i64, row: i64) -> bool {
    match (u32::try_from(column), u32::try_from(row)) {
        (Ok(column), Ok(row)) => grid.is_walkable(CellCoord::new(column, row)),
        _ => false,
    }
}

/// Obstruction probe that treats blocked and out-of-bounds cells as solid.
///
/// The grid only models static level geometry, so every [`ObstacleClass`]
/// is answered the same way. Hosts that track doors or props wrap this probe
/// and add their dynamic obstacles for [`ObstacleClass::All`].
#[derive(Clone, Copy, Debug)]
pub struct GridProbe<'a> {
    grid: &'a WalkabilityGrid,
}

impl<'a> GridProbe<'a> {
    /// Creates a probe over the provided grid.
    #[must_use]
    pub const fn new(grid: &'a WalkabilityGrid) -> Self {
        Self { grid }
    }

    /// Grid the probe samples.
    #[must_use]
    pub const fn grid(&self) -> &'a WalkabilityGrid {
        self.grid
    }
}

impl ObstructionProbe for GridProbe<'_> {
    fn probe(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        _class: ObstacleClass,
    ) -> Option<ProbeHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec2::ZERO || !max_distance.is_finite() || max_distance <= 0.0 {
            return None;
        }

        let step = self.grid.cell_size() * PROBE_STEP_FRACTION;
        let mut distance = 0.0_f32;
        loop {
            let point = origin + direction * distance;
            if !self.grid.is_walkable_at(point) {
                return Some(ProbeHit { point, distance });
            }
            if distance >= max_distance {
                return None;
            }
            distance = (distance + step).min(max_distance);
        }
    }
}
