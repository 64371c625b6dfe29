use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stealth_nav_core::{CellCoord, Endpoint, ObstacleClass, ObstructionProbe, Path, PlanError, Vec2};
use stealth_nav_system_pathfinding::{
    FallbackPlanner, OptimalPlanner, PathPlanner, Planner, PlannerConfig, PlannerKind,
};
use stealth_nav_world::{GridProbe, WalkabilityGrid};

const EPSILON: f32 = 1e-4;

fn point(column: u32, row: u32) -> Vec2 {
    Vec2::new(column as f32, row as f32)
}

fn plan<P: PathPlanner>(
    planner: &P,
    grid: &WalkabilityGrid,
    start: Vec2,
    goal: Vec2,
) -> Result<Path, PlanError> {
    planner.find_path(grid, &GridProbe::new(grid), start, goal)
}

fn assert_all_walkable(grid: &WalkabilityGrid, path: &Path) {
    for waypoint in path.waypoints() {
        let cell = grid
            .cell_at(*waypoint)
            .unwrap_or_else(|| panic!("waypoint {waypoint} lies outside the grid"));
        assert!(cell.is_walkable(), "waypoint {waypoint} lies in a blocked cell");
        assert!(
            cell.center().distance(*waypoint) < EPSILON,
            "waypoint {waypoint} is not a cell center"
        );
    }
}

#[test]
fn open_grid_diagonal_collapses_to_goal() {
    let grid = WalkabilityGrid::open(5, 5, 1.0).expect("grid");
    let planner = OptimalPlanner::default();

    let raw = planner
        .search(&grid, point(0, 0), point(4, 4))
        .expect("open grid has a path");
    assert_eq!(
        raw.waypoints(),
        &[point(1, 1), point(2, 2), point(3, 3), point(4, 4)]
    );

    let smoothed = plan(&planner, &grid, point(0, 0), point(4, 4)).expect("open grid");
    assert_eq!(smoothed.waypoints(), &[point(4, 4)]);
}

#[test]
fn start_and_goal_in_same_cell_yield_empty_path() {
    let grid = WalkabilityGrid::open(5, 5, 1.0).expect("grid");
    let start = Vec2::new(2.1, 2.1);
    let goal = Vec2::new(1.8, 2.3);

    for kind in [PlannerKind::Optimal, PlannerKind::Fallback] {
        let planner = Planner::new(kind, PlannerConfig::default());
        let path = plan(&planner, &grid, start, goal).expect("degenerate request succeeds");
        assert!(path.is_empty(), "{kind:?} returned {path:?}");
    }
}

fn goal_pocket_grid() -> WalkabilityGrid {
    WalkabilityGrid::from_ascii(
        "
        .....##
        .....##
        .....##
        .....##
        .....##
        ",
        1.0,
        Vec2::ZERO,
    )
    .expect("grid")
}

#[test]
fn blocked_goal_snaps_to_nearest_walkable_cell() {
    let grid = goal_pocket_grid();

    for kind in [PlannerKind::Optimal, PlannerKind::Fallback] {
        let planner = Planner::new(kind, PlannerConfig::default());
        let path = plan(&planner, &grid, point(0, 2), point(6, 2)).expect("goal snaps");
        assert_eq!(path.last(), Some(point(4, 2)), "{kind:?} ended elsewhere");
        assert_all_walkable(&grid, &path);
    }
}

#[test]
fn blocked_goal_outside_snap_radius_is_rejected() {
    let grid = goal_pocket_grid();
    let planner = OptimalPlanner::new(PlannerConfig {
        goal_snap_radius: 1.5,
        ..PlannerConfig::default()
    });

    assert_eq!(
        plan(&planner, &grid, point(0, 2), point(6, 2)),
        Err(PlanError::InvalidEndpoint {
            endpoint: Endpoint::Goal,
            radius: 1.5,
        })
    );
}

#[test]
fn raw_path_length_matches_octile_distance() {
    let grid = WalkabilityGrid::open(8, 8, 1.0).expect("grid");
    let start = point(0, 0);
    let goal = point(7, 3);

    let diagonal = OptimalPlanner::default()
        .search(&grid, start, goal)
        .expect("open grid");
    let octile = 3.0 * std::f32::consts::SQRT_2 + 4.0;
    assert!(
        (diagonal.length_from(start) - octile).abs() < EPSILON,
        "length {} != {octile}",
        diagonal.length_from(start)
    );

    let orthogonal = OptimalPlanner::new(PlannerConfig {
        allow_diagonals: false,
        ..PlannerConfig::default()
    })
    .search(&grid, start, goal)
    .expect("open grid");
    assert!((orthogonal.length_from(start) - 10.0).abs() < EPSILON);
    assert_eq!(orthogonal.len(), 10);
}

#[test]
fn corner_cutting_is_refused_by_default() {
    let grid = WalkabilityGrid::from_ascii(
        "
        .#.
        ...
        ",
        1.0,
        Vec2::ZERO,
    )
    .expect("grid");

    let path = OptimalPlanner::default()
        .search(&grid, point(0, 0), point(2, 0))
        .expect("path around the pillar");
    assert_eq!(path.waypoints(), &[point(0, 1), point(1, 1), point(2, 1), point(2, 0)]);

    let cutting = OptimalPlanner::new(PlannerConfig {
        cut_corners: true,
        ..PlannerConfig::default()
    })
    .search(&grid, point(0, 0), point(2, 0))
    .expect("path around the pillar");
    assert_eq!(cutting.waypoints(), &[point(1, 1), point(2, 0)]);
}

#[test]
fn disconnected_goal_reports_path_not_found() {
    let grid = WalkabilityGrid::from_ascii(
        "
        ..#...
        ..#.#.
        ..#...
        ",
        1.0,
        Vec2::ZERO,
    )
    .expect("grid");

    for kind in [PlannerKind::Optimal, PlannerKind::Fallback] {
        let planner = Planner::new(kind, PlannerConfig::default());
        assert_eq!(
            plan(&planner, &grid, point(0, 1), point(5, 1)),
            Err(PlanError::PathNotFound),
            "{kind:?} crossed the wall"
        );
    }
}

#[test]
fn iteration_budget_bounds_the_search() {
    let grid = WalkabilityGrid::open(40, 1, 1.0).expect("grid");
    let tight = PlannerConfig {
        max_iterations: 5,
        ..PlannerConfig::default()
    };

    for kind in [PlannerKind::Optimal, PlannerKind::Fallback] {
        let planner = Planner::new(kind, tight.clone());
        assert_eq!(
            plan(&planner, &grid, point(0, 0), point(39, 0)),
            Err(PlanError::PathNotFound),
            "{kind:?} ignored its budget"
        );

        let relaxed = Planner::new(kind, PlannerConfig::default());
        assert!(plan(&relaxed, &grid, point(0, 0), point(39, 0)).is_ok());
    }
}

fn pocket_grid() -> WalkabilityGrid {
    WalkabilityGrid::from_ascii(
        "
        ...#...
        ...#...
        ...#...
        ...#...
        .......
        ",
        1.0,
        Vec2::ZERO,
    )
    .expect("grid")
}

fn orthogonal_config() -> PlannerConfig {
    PlannerConfig {
        allow_diagonals: false,
        ..PlannerConfig::default()
    }
}

#[test]
fn fallback_backs_out_of_dead_end_pocket() {
    let grid = pocket_grid();
    let planner = FallbackPlanner::new(orthogonal_config());

    let path = plan(&planner, &grid, point(0, 2), point(6, 2)).expect("detour under the wall");
    assert_eq!(path.last(), Some(point(6, 2)));
    assert_all_walkable(&grid, &path);
}

#[test]
fn fallback_honours_backtrack_budget() {
    let grid = pocket_grid();
    let planner = FallbackPlanner::new(PlannerConfig {
        max_backtracks: 3,
        ..orthogonal_config()
    });

    assert_eq!(
        plan(&planner, &grid, point(0, 2), point(6, 2)),
        Err(PlanError::PathNotFound)
    );
}

#[test]
fn fallback_walks_around_a_wall() {
    let grid = WalkabilityGrid::from_ascii(
        "
        ........
        ........
        ....#...
        ....#...
        ....#...
        ........
        ",
        1.0,
        Vec2::ZERO,
    )
    .expect("grid");
    let planner = FallbackPlanner::default();

    let path = plan(&planner, &grid, point(1, 3), point(7, 3)).expect("route around the wall");
    assert_eq!(path.last(), Some(point(7, 3)));
    assert_all_walkable(&grid, &path);

    let mut from = point(1, 3);
    for &waypoint in path.waypoints() {
        assert!(
            grid.line_walkable(from, waypoint),
            "segment {from} -> {waypoint} crosses the wall"
        );
        from = waypoint;
    }
}

#[test]
fn off_center_start_never_cuts_through_neighbouring_block() {
    let grid = WalkabilityGrid::open(5, 3, 1.0)
        .expect("grid")
        .with_blocked_cells([CellCoord::new(1, 1)]);
    let probe = GridProbe::new(&grid);
    let start = Vec2::new(0.0, 0.45);
    let goal = point(4, 1);
    assert!(
        !probe.is_clear(start, goal, ObstacleClass::StaticGeometry),
        "layout must hide the goal from the start"
    );

    for kind in [PlannerKind::Optimal, PlannerKind::Fallback] {
        let planner = Planner::new(kind, PlannerConfig::default());
        let path = plan(&planner, &grid, start, goal).expect("route around the block");
        assert_eq!(path.last(), Some(goal), "{kind:?} ended elsewhere");
        assert_all_walkable(&grid, &path);

        let mut from = start;
        for &waypoint in path.waypoints() {
            assert!(
                probe.is_clear(from, waypoint, ObstacleClass::StaticGeometry),
                "{kind:?} leg {from} -> {waypoint} crosses the block"
            );
            from = waypoint;
        }
    }
}

fn random_grid(rng: &mut ChaCha8Rng, columns: u32, rows: u32) -> WalkabilityGrid {
    let cells = (0..columns * rows).map(|_| rng.gen_bool(0.75)).collect();
    WalkabilityGrid::from_walkability(columns, rows, 1.0, Vec2::ZERO, cells).expect("grid")
}

fn random_walkable(rng: &mut ChaCha8Rng, grid: &WalkabilityGrid) -> Option<CellCoord> {
    let walkable: Vec<_> = grid
        .cells()
        .filter(|cell| cell.is_walkable())
        .map(|cell| cell.coord())
        .collect();
    if walkable.is_empty() {
        None
    } else {
        Some(walkable[rng.gen_range(0..walkable.len())])
    }
}

#[test]
fn smoothing_never_lengthens_random_paths() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let planner = OptimalPlanner::default();
    let mut planned = 0;

    for _ in 0..64 {
        let grid = random_grid(&mut rng, 16, 12);
        let (Some(start), Some(goal)) = (
            random_walkable(&mut rng, &grid),
            random_walkable(&mut rng, &grid),
        ) else {
            continue;
        };
        let start = grid.center_of(start);
        let goal = grid.center_of(goal);

        let Ok(raw) = planner.search(&grid, start, goal) else {
            continue;
        };
        let smoothed = plan(&planner, &grid, start, goal).expect("raw search succeeded");
        planned += 1;

        assert_all_walkable(&grid, &raw);
        assert_all_walkable(&grid, &smoothed);
        assert_eq!(smoothed.last(), raw.last());
        assert!(smoothed.len() <= raw.len());
        assert!(
            smoothed
                .waypoints()
                .iter()
                .all(|waypoint| raw.waypoints().contains(waypoint)),
            "smoothed waypoints must come from the raw path"
        );
        assert!(
            smoothed.length_from(start) <= raw.length_from(start) + EPSILON,
            "smoothing lengthened {raw:?} into {smoothed:?}"
        );
    }

    assert!(planned > 10, "only {planned} random layouts were solvable");
}

#[test]
fn fallback_paths_on_random_grids_stay_walkable() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let planner = FallbackPlanner::default();

    for _ in 0..64 {
        let grid = random_grid(&mut rng, 16, 12);
        let (Some(start), Some(goal)) = (
            random_walkable(&mut rng, &grid),
            random_walkable(&mut rng, &grid),
        ) else {
            continue;
        };
        let start = grid.center_of(start);
        let goal = grid.center_of(goal);

        match plan(&planner, &grid, start, goal) {
            Ok(path) => {
                assert_all_walkable(&grid, &path);
                if !path.is_empty() {
                    assert_eq!(path.last(), Some(goal));
                }
            }
            Err(error) => assert_eq!(error, PlanError::PathNotFound),
        }
    }
}
