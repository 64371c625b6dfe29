#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Stealth Nav engine.
//!
//! This crate defines the vocabulary that connects the static walkability
//! grid, the path planners, and the per-agent movement controllers. The grid
//! answers read-only queries, planners turn a start and a goal into a
//! [`Path`] or a [`PlanError`], and controllers drive an [`AgentBody`] each
//! tick. Collaborators that live outside the engine (collision geometry and
//! health bookkeeping) are reached through the [`ObstructionProbe`] and
//! [`InjurySignal`] traits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// World-space position or direction used throughout the engine.
pub use glam::Vec2;

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Chebyshev (king move) distance between two cell coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }

    /// Offsets the coordinate by signed deltas, returning `None` on underflow
    /// or overflow.
    #[must_use]
    pub fn offset(self, delta_column: i32, delta_row: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(delta_column)?;
        let row = self.row.checked_add_signed(delta_row)?;
        Some(CellCoord::new(column, row))
    }
}

/// Ordered waypoints an agent should travel through.
///
/// The agent's current position is never part of the path. An empty path is a
/// successful planning result meaning the agent is already at the goal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    waypoints: Vec<Vec2>,
}

impl Path {
    /// Creates a path from the provided waypoints.
    #[must_use]
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        Self { waypoints }
    }

    /// Creates the empty "already there" path.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            waypoints: Vec::new(),
        }
    }

    /// Waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Number of waypoints in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the path contains no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint stored at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Vec2> {
        self.waypoints.get(index).copied()
    }

    /// Final waypoint of the path, if any.
    #[must_use]
    pub fn last(&self) -> Option<Vec2> {
        self.waypoints.last().copied()
    }

    /// Traversal distance when walking the path from `start`.
    #[must_use]
    pub fn length_from(&self, start: Vec2) -> f32 {
        let mut previous = start;
        let mut total = 0.0;
        for waypoint in &self.waypoints {
            total += previous.distance(*waypoint);
            previous = *waypoint;
        }
        total
    }

    /// Consumes the path, yielding the underlying waypoints.
    #[must_use]
    pub fn into_vec(self) -> Vec<Vec2> {
        self.waypoints
    }
}

/// Identifies which end of a planning request could not be resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// The agent's starting position.
    Start,
    /// The requested destination.
    Goal,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Goal => write!(f, "goal"),
        }
    }
}

/// Reasons a planner may fail to produce a path.
///
/// Requests whose endpoints collapse onto the same cell are not errors; they
/// yield an empty [`Path`].
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// The search exhausted its frontier or its iteration budget.
    #[error("no path found within the search budget")]
    PathNotFound,
    /// An endpoint is unwalkable and no walkable cell lies within the snapping radius.
    #[error("{endpoint} is unwalkable and no walkable cell lies within {radius} units")]
    InvalidEndpoint {
        /// Endpoint that could not be snapped onto the grid.
        endpoint: Endpoint,
        /// Snapping radius that was searched, in world units.
        radius: f32,
    },
}

/// Movement strategy currently selected by a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    /// Steer straight at the target along an unobstructed line.
    DirectChase,
    /// Follow waypoints produced by a path planner.
    GridFollow,
}

/// Classes of obstacles an obstruction probe should consider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleClass {
    /// Level geometry that never changes while the grid is alive.
    StaticGeometry,
    /// Static geometry plus anything dynamic the host tracks (doors, props).
    All,
}

/// First blocking point reported by an obstruction probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    /// World-space position where the segment became blocked.
    pub point: Vec2,
    /// Distance travelled along the probe direction before the hit.
    pub distance: f32,
}

/// Segment query against the host's collision geometry.
pub trait ObstructionProbe {
    /// Casts from `origin` along the unit `direction` for at most
    /// `max_distance`, returning the first blocking point if anything of the
    /// requested `class` obstructs the segment.
    fn probe(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        class: ObstacleClass,
    ) -> Option<ProbeHit>;

    /// Reports whether the straight segment between two points is unobstructed.
    fn is_clear(&self, from: Vec2, to: Vec2, class: ObstacleClass) -> bool {
        let delta = to - from;
        let distance = delta.length();
        if distance <= f32::EPSILON {
            return true;
        }
        self.probe(from, delta / distance, distance, class).is_none()
    }
}

impl<T: ObstructionProbe + ?Sized> ObstructionProbe for &T {
    fn probe(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        class: ObstacleClass,
    ) -> Option<ProbeHit> {
        (**self).probe(origin, direction, max_distance, class)
    }
}

/// Reports whether an agent is currently below full health.
///
/// Controllers receive an implementation at construction time and consult it
/// every tick when composing the movement speed.
pub trait InjurySignal {
    /// Returns `true` while the agent is injured.
    fn is_injured(&self) -> bool;
}

impl<F> InjurySignal for F
where
    F: Fn() -> bool,
{
    fn is_injured(&self) -> bool {
        self()
    }
}

/// Injury signal for agents that never take damage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Uninjured;

impl InjurySignal for Uninjured {
    fn is_injured(&self) -> bool {
        false
    }
}

/// Snapshot of an agent's hit points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    current: u32,
    maximum: u32,
}

impl Health {
    /// Creates a health snapshot, clamping `current` to `maximum`.
    #[must_use]
    pub fn new(current: u32, maximum: u32) -> Self {
        Self {
            current: current.min(maximum),
            maximum,
        }
    }

    /// Creates a snapshot at full health.
    #[must_use]
    pub const fn full(maximum: u32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn maximum(&self) -> u32 {
        self.maximum
    }

    /// Fraction of health remaining in the range `0.0..=1.0`.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        if self.maximum == 0 {
            return 1.0;
        }
        self.current as f32 / self.maximum as f32
    }
}

impl InjurySignal for Health {
    fn is_injured(&self) -> bool {
        self.current < self.maximum
    }
}

/// Kinematic state of an agent as seen by the movement core.
///
/// Controllers write [`AgentBody::velocity`]; the host's physics step owns
/// [`AgentBody::position`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentBody {
    /// World-space position of the agent.
    pub position: Vec2,
    /// Velocity requested for the current physics step, in units per second.
    pub velocity: Vec2,
}

impl AgentBody {
    /// Creates a stationary body at `position`.
    #[must_use]
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }

    /// Magnitude of the current velocity.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Moves the body along its velocity for `dt` seconds.
    ///
    /// Hosts without their own physics integrator (tests, the CLI) use this to
    /// apply the velocity a controller produced.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}
