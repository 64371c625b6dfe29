//! Greedy best-first planner with bounded backtracking.

use std::collections::{HashMap, HashSet};

use stealth_nav_core::{CellCoord, ObstructionProbe, Path, PlanError, Vec2};
use stealth_nav_world::WalkabilityGrid;
use tracing::{debug, trace};

use crate::{
    endpoints::{self, Resolution},
    smoothing::{self, Sightline},
    PathPlanner, PlannerConfig,
};

/// Cheap approximate planner.
///
/// Each step moves to the neighbouring cell closest to the goal, charging a
/// penalty for cells that have already been scored so the walk drifts away
/// from areas it keeps returning to. Cells the walk had to back out of are
/// never entered again during the same call.
#[derive(Clone, Debug, Default)]
pub struct FallbackPlanner {
    config: PlannerConfig,
}

impl FallbackPlanner {
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

    fn walk(
        &self,
        grid: &WalkabilityGrid,
        start: CellCoord,
        goal: CellCoord,
    ) -> Result<Vec<CellCoord>, PlanError> {
        let goal_center = grid.center_of(goal);
        let penalty_unit = self.config.revisit_penalty * grid.cell_size();

        let mut trail = vec![start];
        let mut on_trail = HashSet::from([start]);
        let mut dead_ends: HashSet<CellCoord> = HashSet::new();
        let mut evaluations: HashMap<CellCoord, u32> = HashMap::new();
        let mut backtracks = 0_u32;
        let mut steps = 0_u32;

        while let Some(&current) = trail.last() {
            if current == goal {
                trace!(steps, backtracks, ?start, ?goal, "fallback walk reached goal");
                return Ok(trail.into_iter().skip(1).collect());
            }

            steps += 1;
            if steps > self.config.max_iterations {
                debug!(steps, ?start, ?goal, "fallback walk exhausted its iteration budget");
                return Err(PlanError::PathNotFound);
            }

            let mut best: Option<(CellCoord, f32)> = None;
            for neighbor in grid.neighbors(current) {
                let coord = neighbor.coord();
                if !self.config.allow_diagonals
                    && coord.column() != current.column()
                    && coord.row() != current.row()
                {
                    continue;
                }
                if on_trail.contains(&coord)
                    || dead_ends.contains(&coord)
                    || !grid.can_step(current, coord, self.config.cut_corners)
                {
                    continue;
                }

                let seen = evaluations.entry(coord).or_insert(0);
                let score = neighbor.center().distance(goal_center) + penalty_unit * *seen as f32;
                *seen += 1;

                if best.map_or(true, |(_, best_score)| score < best_score) {
                    best = Some((coord, score));
                }
            }

            match best {
                Some((next, _)) => {
                    trail.push(next);
                    let _ = on_trail.insert(next);
                }
                None => {
                    backtracks += 1;
                    if backtracks > self.config.max_backtracks {
                        debug!(
                            backtracks,
                            ?start,
                            ?goal,
                            "fallback walk exceeded its backtrack budget"
                        );
                        return Err(PlanError::PathNotFound);
                    }
                    if let Some(dead) = trail.pop() {
                        let _ = on_trail.remove(&dead);
                        let _ = dead_ends.insert(dead);
                    }
                }
            }
        }

        debug!(?start, ?goal, "fallback walk backtracked past its start");
        Err(PlanError::PathNotFound)
    }
}

impl PathPlanner for FallbackPlanner {
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
        let (start, goal, origin) = match endpoints::resolve(grid, &self.config, start, goal)? {
            Resolution::Arrived => return Ok(Path::empty()),
            Resolution::Search {
                start,
                goal,
                origin,
            } => (start, goal, origin),
        };

        let waypoints: Vec<Vec2> = self
            .walk(grid, start, goal)?
            .into_iter()
            .map(|cell| grid.center_of(cell))
            .collect();
        let waypoints = smoothing::with_lead_in(grid, origin, start, waypoints);

        let sight = Sightline::new(grid, probe);
        let waypoints = smoothing::prune_redundant(&sight, origin, waypoints);
        let waypoints = smoothing::soften_turns(
            &sight,
            origin,
            waypoints,
            self.config.turn_threshold_degrees.to_radians(),
        );
        Ok(Path::new(smoothing::dedup(waypoints, grid.cell_size())))
    }
}
