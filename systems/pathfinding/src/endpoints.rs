//! Resolution of raw start and goal positions into searchable cells.

use stealth_nav_core::{CellCoord, Endpoint, PlanError, Vec2};
use stealth_nav_world::{Cell, WalkabilityGrid};

use crate::PlannerConfig;

/// Outcome of resolving both endpoints of a planning request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Resolution {
    /// The agent already stands at the goal; the plan is empty.
    Arrived,
    /// Both endpoints map to distinct walkable cells.
    Search {
        /// Walkable cell the search starts from.
        start: CellCoord,
        /// Walkable cell the search tries to reach.
        goal: CellCoord,
        /// Point the returned waypoints are smoothed from: the caller's start
        /// when it lies in a walkable cell, else the center of the snapped cell.
        origin: Vec2,
    },
}

/// Maps `start` and `goal` onto walkable cells, snapping blocked endpoints to
/// the nearest walkable cell within their configured radius.
pub(crate) fn resolve(
    grid: &WalkabilityGrid,
    config: &PlannerConfig,
    start: Vec2,
    goal: Vec2,
) -> Result<Resolution, PlanError> {
    let start_cell = snap(grid, start, config.start_snap_radius, Endpoint::Start)?;
    let goal_cell = snap(grid, goal, config.goal_snap_radius, Endpoint::Goal)?;

    if start_cell == goal_cell || start.distance(goal) <= grid.cell_size() * 0.5 {
        return Ok(Resolution::Arrived);
    }

    let origin = if grid.is_walkable_at(start) {
        start
    } else {
        grid.center_of(start_cell)
    };

    Ok(Resolution::Search {
        start: start_cell,
        goal: goal_cell,
        origin,
    })
}

fn snap(
    grid: &WalkabilityGrid,
    point: Vec2,
    radius: f32,
    endpoint: Endpoint,
) -> Result<CellCoord, PlanError> {
    match grid.cell_at(point) {
        Some(cell) if cell.is_walkable() => Ok(cell.coord()),
        _ => grid
            .nearest_walkable(point, radius)
            .map(Cell::coord)
            .ok_or(PlanError::InvalidEndpoint { endpoint, radius }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_goal_snaps_within_radius() {
        let grid = WalkabilityGrid::open(4, 1, 1.0)
            .expect("grid")
            .with_blocked_cells([CellCoord::new(3, 0)]);
        let config = PlannerConfig::default();

        let resolution =
            resolve(&grid, &config, Vec2::ZERO, Vec2::new(3.0, 0.0)).expect("goal snaps");
        assert_eq!(
            resolution,
            Resolution::Search {
                start: CellCoord::new(0, 0),
                goal: CellCoord::new(2, 0),
                origin: Vec2::ZERO,
            }
        );
    }

    #[test]
    fn origin_keeps_walkable_starts_and_centers_snapped_ones() {
        let grid = WalkabilityGrid::open(4, 2, 1.0)
            .expect("grid")
            .with_blocked_cells([CellCoord::new(0, 0)]);
        let config = PlannerConfig::default();
        let goal = Vec2::new(3.0, 1.0);

        let walkable_start = Vec2::new(1.3, 0.2);
        let Resolution::Search { origin, .. } =
            resolve(&grid, &config, walkable_start, goal).expect("walkable start")
        else {
            panic!("expected a search");
        };
        assert_eq!(origin, walkable_start);

        let Resolution::Search { start, origin, .. } =
            resolve(&grid, &config, Vec2::new(-0.2, 0.1), goal).expect("start snaps")
        else {
            panic!("expected a search");
        };
        assert_eq!(origin, grid.center_of(start));
    }

    #[test]
    fn nearby_points_in_neighbouring_cells_count_as_arrived() {
        let grid = WalkabilityGrid::open(4, 1, 1.0).expect("grid");
        let config = PlannerConfig::default();

        let resolution = resolve(&grid, &config, Vec2::new(0.45, 0.0), Vec2::new(0.55, 0.0))
            .expect("both endpoints walkable");
        assert_eq!(resolution, Resolution::Arrived);
    }

    #[test]
    fn unreachable_start_reports_the_start_endpoint() {
        let grid = WalkabilityGrid::open(10, 1, 1.0)
            .expect("grid")
            .with_blocked_cells((0..8).map(|column| CellCoord::new(column, 0)));
        let config = PlannerConfig {
            start_snap_radius: 2.0,
            ..PlannerConfig::default()
        };

        let error = resolve(&grid, &config, Vec2::ZERO, Vec2::new(9.0, 0.0))
            .expect_err("no walkable cell near the start");
        assert_eq!(
            error,
            PlanError::InvalidEndpoint {
                endpoint: Endpoint::Start,
                radius: 2.0,
            }
        );
    }
}
