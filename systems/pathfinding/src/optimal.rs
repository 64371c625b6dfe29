//! A* search over the walkability grid.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
};

use stealth_nav_core::{CellCoord, ObstructionProbe, Path, PlanError, Vec2};
use stealth_nav_world::WalkabilityGrid;
use tracing::{debug, trace};

use crate::{
    endpoints::{self, Resolution},
    smoothing::{self, Sightline},
    PathPlanner, PlannerConfig,
};

/// Shortest-path planner built on A* with line-of-sight smoothing.
///
/// Step costs are the distances between cell centers, so diagonal moves cost
/// `sqrt(2)` cells. The heuristic is the straight-line distance when diagonals
/// are enabled and the Manhattan distance otherwise; both are admissible.
#[derive(Clone, Debug, Default)]
pub struct OptimalPlanner {
    config: PlannerConfig,
}

impl OptimalPlanner {
    /// Creates a planner with the provided configuration.
    #[must_use]
    pub const fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Configuration the planner was built with.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Runs the search without smoothing.
    ///
    /// The returned waypoints are the centers of every cell on the shortest
    /// path, excluding the start cell and ending at the goal cell.
    pub fn search(
        &self,
        grid: &WalkabilityGrid,
        start: Vec2,
        goal: Vec2,
    ) -> Result<Path, PlanError> {
        let raw = self.raw_plan(grid, start, goal)?;
        Ok(raw.map_or_else(Path::empty, |raw| Path::new(raw.waypoints)))
    }

    /// `None` when the agent already stands at the goal.
    fn raw_plan(
        &self,
        grid: &WalkabilityGrid,
        start: Vec2,
        goal: Vec2,
    ) -> Result<Option<RawPlan>, PlanError> {
        match endpoints::resolve(grid, &self.config, start, goal)? {
            Resolution::Arrived => Ok(None),
            Resolution::Search {
                start,
                goal,
                origin,
            } => {
                let cells = self.search_cells(grid, start, goal)?;
                Ok(Some(RawPlan {
                    origin,
                    start,
                    waypoints: cells.into_iter().map(|cell| grid.center_of(cell)).collect(),
                }))
            }
        }
    }

    fn search_cells(
        &self,
        grid: &WalkabilityGrid,
        start: CellCoord,
        goal: CellCoord,
    ) -> Result<Vec<CellCoord>, PlanError> {
        let goal_center = grid.center_of(goal);
        let heuristic = |coord: CellCoord| {
            let delta = grid.center_of(coord) - goal_center;
            if self.config.allow_diagonals {
                delta.length()
            } else {
                delta.x.abs() + delta.y.abs()
            }
        };

        let mut open = BinaryHeap::new();
        let mut g_score: HashMap<CellCoord, f32> = HashMap::new();
        let mut came_from: HashMap<CellCoord, CellCoord> = HashMap::new();
        let mut closed: HashSet<CellCoord> = HashSet::new();
        let mut sequence = 0_u64;
        let mut expansions = 0_u32;

        let _ = g_score.insert(start, 0.0);
        open.push(OpenNode {
            f_score: heuristic(start),
            sequence,
            coord: start,
        });

        while let Some(node) = open.pop() {
            if closed.contains(&node.coord) {
                continue;
            }

            expansions += 1;
            if expansions > self.config.max_iterations {
                debug!(
                    expansions,
                    ?start,
                    ?goal,
                    "optimal search exhausted its iteration budget"
                );
                return Err(PlanError::PathNotFound);
            }

            if node.coord == goal {
                trace!(expansions, ?start, ?goal, "optimal search reached goal");
                return reconstruct(&came_from, start, goal);
            }

            let _ = closed.insert(node.coord);
            let current_g = g_score.get(&node.coord).copied().unwrap_or(f32::INFINITY);
            let current_center = grid.center_of(node.coord);

            for neighbor in grid.neighbors(node.coord) {
                let coord = neighbor.coord();
                if closed.contains(&coord) {
                    continue;
                }
                if !self.config.allow_diagonals && is_diagonal(node.coord, coord) {
                    continue;
                }
                if !grid.can_step(node.coord, coord, self.config.cut_corners) {
                    continue;
                }

                let tentative = current_g + current_center.distance(neighbor.center());
                let known = g_score.get(&coord).copied().unwrap_or(f32::INFINITY);
                if tentative < known {
                    let _ = g_score.insert(coord, tentative);
                    let _ = came_from.insert(coord, node.coord);
                    sequence += 1;
                    open.push(OpenNode {
                        f_score: tentative + heuristic(coord),
                        sequence,
                        coord,
                    });
                }
            }
        }

        debug!(expansions, ?start, ?goal, "optimal search exhausted the open set");
        Err(PlanError::PathNotFound)
    }
}

impl PathPlanner for OptimalPlanner {
    fn find_path<O>(
        &self,
        grid: &WalkabilityGrid,
        probe: &O,
        start: Vec2,
        goal: Vec2,
    ) -> Result<Path, PlanError>
    where
        O: ObstructionProbe + ?Sized,
    {
        let Some(raw) = self.raw_plan(grid, start, goal)? else {
            return Ok(Path::empty());
        };

        let sight = Sightline::new(grid, probe);
        let led = smoothing::with_lead_in(grid, raw.origin, raw.start, raw.waypoints);
        Ok(Path::new(smoothing::string_pull(&sight, raw.origin, &led)))
    }
}

struct RawPlan {
    origin: Vec2,
    start: CellCoord,
    waypoints: Vec<Vec2>,
}

/// Open-set entry ordered so the max-heap pops the lowest `f_score` first,
/// falling back to insertion order on ties.
#[derive(Clone, Copy, Debug)]
struct OpenNode {
    f_score: f32,
    sequence: u64,
    coord: CellCoord,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

fn is_diagonal(from: CellCoord, to: CellCoord) -> bool {
    from.column() != to.column() && from.row() != to.row()
}

/// Walks parent links back from `goal`, returning the cells after `start`.
fn reconstruct(
    came_from: &HashMap<CellCoord, CellCoord>,
    start: CellCoord,
    goal: CellCoord,
) -> Result<Vec<CellCoord>, PlanError> {
    let mut cells = vec![goal];
    let mut current = goal;

    while current != start {
        let parent = came_from
            .get(&current)
            .copied()
            .ok_or(PlanError::PathNotFound)?;
        if parent != start {
            cells.push(parent);
        }
        current = parent;
        if cells.len() > came_from.len() + 1 {
            return Err(PlanError::PathNotFound);
        }
    }

    cells.reverse();
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_set_pops_lowest_score_then_oldest() {
        let mut heap = BinaryHeap::new();
        heap.push(OpenNode {
            f_score: 3.0,
            sequence: 0,
            coord: CellCoord::new(0, 0),
        });
        heap.push(OpenNode {
            f_score: 1.0,
            sequence: 2,
            coord: CellCoord::new(2, 0),
        });
        heap.push(OpenNode {
            f_score: 1.0,
            sequence: 1,
            coord: CellCoord::new(1, 0),
        });

        let order: Vec<_> = std::iter::from_fn(|| heap.pop().map(|node| node.coord)).collect();
        assert_eq!(
            order,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(2, 0),
                CellCoord::new(0, 0)
            ]
        );
    }

    #[test]
    fn reconstruct_excludes_start() {
        let start = CellCoord::new(0, 0);
        let middle = CellCoord::new(1, 0);
        let goal = CellCoord::new(2, 0);
        let came_from = HashMap::from([(middle, start), (goal, middle)]);

        assert_eq!(
            reconstruct(&came_from, start, goal).expect("linked chain"),
            vec![middle, goal]
        );
    }

    #[test]
    fn search_respects_disabled_diagonals() {
        let grid = WalkabilityGrid::open(3, 3, 1.0).expect("grid");
        let planner = OptimalPlanner::new(PlannerConfig {
            allow_diagonals: false,
            ..PlannerConfig::default()
        });

        let path = planner
            .search(&grid, Vec2::ZERO, Vec2::new(2.0, 2.0))
            .expect("open grid");
        assert_eq!(path.len(), 4);
        let mut previous = Vec2::ZERO;
        for &waypoint in path.waypoints() {
            assert!(
                (waypoint.distance(previous) - 1.0).abs() < 1e-6,
                "only orthogonal unit steps, got {previous} -> {waypoint}"
            );
            previous = waypoint;
        }
    }
}
