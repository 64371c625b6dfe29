#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid path planners that turn a start and a goal into waypoints.
//!
//! Two interchangeable strategies implement [`PathPlanner`]:
//! [`OptimalPlanner`] runs an A* search and string-pulls the result, while
//! [`FallbackPlanner`] runs a cheaper greedy best-first walk with bounded
//! backtracking. [`Planner`] wraps either one so callers pick a strategy once
//! and dispatch without type checks. All search state lives inside a single
//! call; the grid is only ever borrowed immutably.

mod endpoints;
mod fallback;
mod optimal;
mod smoothing;

use serde::{Deserialize, Serialize};
use stealth_nav_core::{ObstructionProbe, Path, PlanError, Vec2};
use stealth_nav_world::WalkabilityGrid;

pub use fallback::FallbackPlanner;
pub use optimal::OptimalPlanner;

/// Tunables shared by both planners.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Node expansions (optimal) or greedy steps (fallback) allowed per call.
    pub max_iterations: u32,
    /// Radius searched for a walkable substitute when the start is blocked.
    pub start_snap_radius: f32,
    /// Radius searched for a walkable substitute when the goal is blocked.
    pub goal_snap_radius: f32,
    /// Enables the four diagonal moves.
    pub allow_diagonals: bool,
    /// Permits diagonal moves that clip a blocked orthogonal neighbor.
    pub cut_corners: bool,
    /// Dead ends the fallback planner may back out of before giving up.
    pub max_backtracks: u32,
    /// Cells of extra cost the fallback planner charges per earlier evaluation of a cell.
    pub revisit_penalty: f32,
    /// Turns sharper than this survive the fallback planner's turn smoothing.
    pub turn_threshold_degrees: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2_000,
            start_snap_radius: 5.0,
            goal_snap_radius: 3.0,
            allow_diagonals: true,
            cut_corners: false,
            max_backtracks: 10,
            revisit_penalty: 1.0,
            turn_threshold_degrees: 45.0,
        }
    }
}

/// Capability shared by every path planning strategy.
pub trait PathPlanner {
    /// Plans a route from `start` to `goal`.
    ///
    /// Returns an empty [`Path`] when both points resolve to the same cell or
    /// lie within half a cell of each other. Blocked endpoints are snapped to
    /// the nearest walkable cell within the configured radius. `probe` is
    /// consulted when shortcutting waypoints.
    fn find_path<O>(
        &self,
        grid: &WalkabilityGrid,
        probe: &O,
        start: Vec2,
        goal: Vec2,
    ) -> Result<Path, PlanError>
    where
        O: ObstructionProbe + ?Sized;
}

/// Identifies a planning strategy, typically read from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerKind {
    /// Shortest paths through [`OptimalPlanner`].
    #[default]
    Optimal,
    /// Fast approximate paths through [`FallbackPlanner`].
    Fallback,
}

/// Planner strategy selected once per agent.
#[derive(Clone, Debug)]
pub enum Planner {
    /// A* search with line-of-sight smoothing.
    Optimal(OptimalPlanner),
    /// Greedy best-first search with bounded backtracking.
    Fallback(FallbackPlanner),
}

impl Planner {
    /// Builds the strategy identified by `kind`.
    #[must_use]
    pub fn new(kind: PlannerKind, config: PlannerConfig) -> Self {
        match kind {
            PlannerKind::Optimal => Self::Optimal(OptimalPlanner::new(config)),
            PlannerKind::Fallback => Self::Fallback(FallbackPlanner::new(config)),
        }
    }

    /// Strategy wrapped by this planner.
    #[must_use]
    pub const fn kind(&self) -> PlannerKind {
        match self {
            Self::Optimal(_) => PlannerKind::Optimal,
            Self::Fallback(_) => PlannerKind::Fallback,
        }
    }

    /// Configuration the wrapped strategy was built with.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        match self {
            Self::Optimal(planner) => planner.config(),
            Self::Fallback(planner) => planner.config(),
        }
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlannerKind::default(), PlannerConfig::default())
    }
}

impl PathPlanner for Planner {
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
        match self {
            Self::Optimal(planner) => planner.find_path(grid, probe, start, goal),
            Self::Fallback(planner) => planner.find_path(grid, probe, start, goal),
        }
    }
}
