#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-agent movement controller that chooses between chasing a target in a
//! straight line and following planned waypoints.
//!
//! A controller is owned by exactly one agent. Each tick the host calls
//! [`MovementController::move_towards`] on the fixed physics step,
//! [`MovementController::observe`] on the variable step, and
//! [`MovementController::update_facing`] on the render step.
//! [`MovementController::advance`] bundles the first two for hosts that run a
//! single step.

mod config;
mod patrol;
mod stuck;

use stealth_nav_core::{
    AgentBody, InjurySignal, MovementMode, ObstacleClass, ObstructionProbe, Path, Vec2,
};
use stealth_nav_system_pathfinding::PathPlanner;
use stealth_nav_world::WalkabilityGrid;
use tracing::debug;

pub use config::MovementConfig;
pub use patrol::PatrolRoute;

use stuck::StuckDetector;

/// Read-only world queries a controller consults during a tick.
#[derive(Debug)]
pub struct Surroundings<'a, O: ?Sized> {
    /// Grid handed to the path planner.
    pub grid: &'a WalkabilityGrid,
    /// Probe used for straight-line feasibility.
    pub probe: &'a O,
}

impl<'a, O: ?Sized> Surroundings<'a, O> {
    /// Bundles the grid and probe for a tick.
    #[must_use]
    pub const fn new(grid: &'a WalkabilityGrid, probe: &'a O) -> Self {
        Self { grid, probe }
    }
}

impl<O: ?Sized> Clone for Surroundings<'_, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O: ?Sized> Copy for Surroundings<'_, O> {}

/// Movement state machine for a single agent.
#[derive(Debug)]
pub struct MovementController<P, I> {
    config: MovementConfig,
    planner: P,
    injury: I,
    speed_context: f32,
    mode: MovementMode,
    committed: bool,
    evaluated_target: Option<Vec2>,
    commit_anchor: Option<Vec2>,
    last_position: Option<Vec2>,
    travel_since_probe: f32,
    path: Path,
    path_index: usize,
    path_goal: Option<Vec2>,
    travel_since_plan: f32,
    settled: bool,
    plan_failed: bool,
    plan_cooldown: f32,
    active: bool,
    direction: Vec2,
    facing: f32,
    stuck: StuckDetector,
    patrol: PatrolRoute,
}

impl<P, I> MovementController<P, I>
where
    P: PathPlanner,
    I: InjurySignal,
{
    /// Creates a controller that plans with `planner` and slows down while
    /// `injury` reports the agent as hurt.
    #[must_use]
    pub fn new(config: MovementConfig, planner: P, injury: I) -> Self {
        Self {
            config,
            planner,
            injury,
            speed_context: 1.0,
            mode: MovementMode::DirectChase,
            committed: false,
            evaluated_target: None,
            commit_anchor: None,
            last_position: None,
            travel_since_probe: 0.0,
            path: Path::empty(),
            path_index: 0,
            path_goal: None,
            travel_since_plan: 0.0,
            settled: false,
            plan_failed: false,
            plan_cooldown: 0.0,
            active: false,
            direction: Vec2::ZERO,
            facing: 0.0,
            stuck: StuckDetector::default(),
            patrol: PatrolRoute::default(),
        }
    }

    /// Runs [`Self::move_towards`] followed by [`Self::observe`].
    pub fn advance<O>(
        &mut self,
        surroundings: Surroundings<'_, O>,
        body: &mut AgentBody,
        target: Vec2,
        dt: f32,
    ) where
        O: ObstructionProbe + ?Sized,
    {
        self.move_towards(surroundings, body, target);
        self.observe(body, dt);
    }

    /// Chooses a movement mode for `target` and writes the resulting velocity
    /// into `body`.
    pub fn move_towards<O>(
        &mut self,
        surroundings: Surroundings<'_, O>,
        body: &mut AgentBody,
        target: Vec2,
    ) where
        O: ObstructionProbe + ?Sized,
    {
        self.track_travel(body.position);
        self.evaluate_mode(surroundings.probe, body.position, target);

        match self.mode {
            MovementMode::DirectChase => self.chase_directly(body, target),
            MovementMode::GridFollow => self.follow_grid(surroundings, body, target),
        }
    }

    /// Variable-step bookkeeping: cooldowns and stuck detection.
    pub fn observe(&mut self, body: &AgentBody, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        self.plan_cooldown = (self.plan_cooldown - dt).max(0.0);

        if !self.active {
            self.stuck.reset();
            return;
        }

        let slow_limit = match self.mode {
            MovementMode::GridFollow => self.config.stuck_time_grid,
            MovementMode::DirectChase => self.config.stuck_time_direct,
        };
        self.stuck
            .observe(&self.config, body.position, body.speed(), dt, slow_limit);
    }

    /// Render-step facing update.
    ///
    /// Returns the new heading in radians, or `None` when the body moves too
    /// slowly for its velocity to define a direction.
    pub fn update_facing(&mut self, body: &AgentBody) -> Option<f32> {
        if body.speed() < self.config.facing_deadzone {
            return None;
        }
        self.facing = body.velocity.y.atan2(body.velocity.x);
        Some(self.facing)
    }

    /// Last applied heading in radians.
    #[must_use]
    pub const fn facing(&self) -> f32 {
        self.facing
    }

    /// Sets the caller-owned speed multiplier for subsequent ticks.
    pub fn set_speed_context(&mut self, multiplier: f32) {
        self.speed_context = multiplier;
    }

    /// Speed the controller currently requests.
    ///
    /// Composed as base speed, then context multiplier, then injury multiplier.
    #[must_use]
    pub fn current_speed(&self) -> f32 {
        let injury = if self.injury.is_injured() {
            self.config.injury_multiplier
        } else {
            1.0
        };
        self.config.base_speed * self.speed_context * injury
    }

    /// Halts the agent and forgets the current request.
    pub fn stop_movement(&mut self, body: &mut AgentBody) {
        body.velocity = Vec2::ZERO;
        self.direction = Vec2::ZERO;
        self.clear_path();
        self.active = false;
        self.settled = false;
        self.plan_failed = false;
        self.plan_cooldown = 0.0;
        self.evaluated_target = None;
        self.release_commitment();
        self.stuck.reset();
    }

    /// Discards the current path; grid followers recompute it next tick.
    pub fn clear_path(&mut self) {
        self.path = Path::empty();
        self.path_index = 0;
        self.path_goal = None;
    }

    /// Reports whether unconsumed waypoints remain.
    #[must_use]
    pub fn has_valid_path(&self) -> bool {
        self.path_index < self.path.len()
    }

    /// Unit direction of the last requested velocity, zero while stationary.
    #[must_use]
    pub const fn movement_direction(&self) -> Vec2 {
        self.direction
    }

    /// Reports whether `body` lies within `threshold` of `point`.
    #[must_use]
    pub fn has_arrived_at(&self, body: &AgentBody, point: Vec2, threshold: f32) -> bool {
        body.position.distance(point) <= threshold
    }

    /// Reports whether the agent failed to make progress or could not plan.
    ///
    /// The controller never reacts to this flag itself.
    #[must_use]
    pub const fn is_stuck_or_hitting_wall(&self) -> bool {
        self.plan_failed || self.stuck.is_stuck()
    }

    /// Currently selected movement mode.
    #[must_use]
    pub const fn mode(&self) -> MovementMode {
        self.mode
    }

    /// Reports whether the agent is committed to grid following.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Reports whether the agent reached its grid goal and awaits a new target.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.settled
    }

    /// Path currently being followed.
    #[must_use]
    pub const fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the waypoint currently being approached.
    #[must_use]
    pub const fn path_index(&self) -> usize {
        self.path_index
    }

    /// Configuration the controller was built with.
    #[must_use]
    pub const fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Replaces the patrol points and restarts from the first one.
    pub fn set_patrol_points(&mut self, points: Vec<Vec2>) {
        self.patrol.set_points(points);
    }

    /// Moves to the next patrol point, wrapping after the last.
    pub fn advance_patrol_index(&mut self) {
        self.patrol.advance();
    }

    /// Patrol point the agent should head to next.
    #[must_use]
    pub fn current_patrol_point(&self) -> Option<Vec2> {
        self.patrol.current()
    }

    /// Home position, always the first patrol point.
    #[must_use]
    pub fn return_target(&self) -> Option<Vec2> {
        self.patrol.home()
    }

    /// Patrol route owned by this agent.
    #[must_use]
    pub const fn patrol(&self) -> &PatrolRoute {
        &self.patrol
    }

    fn track_travel(&mut self, position: Vec2) {
        if let Some(previous) = self.last_position {
            let travelled = position.distance(previous);
            self.travel_since_probe += travelled;
            self.travel_since_plan += travelled;
        }
        self.last_position = Some(position);
    }

    fn evaluate_mode<O>(&mut self, probe: &O, position: Vec2, target: Vec2)
    where
        O: ObstructionProbe + ?Sized,
    {
        let target_changed = match (self.evaluated_target, self.commit_anchor) {
            (None, _) => true,
            (Some(_), Some(anchor)) if self.committed => {
                target.distance(anchor) > self.config.commit_release_distance
            }
            (Some(previous), _) => target.distance(previous) > self.config.target_change_epsilon,
        };

        if target_changed {
            self.evaluated_target = Some(target);
            self.settled = false;
            self.plan_failed = false;
            self.plan_cooldown = 0.0;
            self.travel_since_probe = 0.0;
            self.clear_path();

            if probe.is_clear(position, target, ObstacleClass::All) {
                self.release_commitment();
                self.switch_mode(MovementMode::DirectChase);
            } else {
                self.commit_to_grid(target);
            }
            return;
        }

        if self.mode == MovementMode::DirectChase
            && self.travel_since_probe >= self.config.direct_recheck_distance
        {
            self.travel_since_probe = 0.0;
            if !probe.is_clear(position, target, ObstacleClass::All) {
                self.clear_path();
                self.commit_to_grid(target);
            }
        }
    }

    fn commit_to_grid(&mut self, target: Vec2) {
        self.committed = true;
        self.commit_anchor = Some(target);
        self.switch_mode(MovementMode::GridFollow);
    }

    fn release_commitment(&mut self) {
        self.committed = false;
        self.commit_anchor = None;
    }

    fn switch_mode(&mut self, mode: MovementMode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "movement mode changed");
            self.mode = mode;
        }
    }

    fn chase_directly(&mut self, body: &mut AgentBody, target: Vec2) {
        let offset = target - body.position;
        let distance = offset.length();
        if distance <= self.config.arrival_distance {
            self.halt(body);
            self.active = false;
            return;
        }

        self.steer(body, offset / distance);
    }

    fn follow_grid<O>(
        &mut self,
        surroundings: Surroundings<'_, O>,
        body: &mut AgentBody,
        target: Vec2,
    ) where
        O: ObstructionProbe + ?Sized,
    {
        if self.settled {
            self.halt(body);
            self.active = false;
            return;
        }

        if self.plan_failed && self.plan_cooldown > 0.0 {
            self.halt(body);
            return;
        }

        if self.needs_replan(target) && !self.replan(surroundings, body, target) {
            return;
        }

        while let Some(waypoint) = self.path.get(self.path_index) {
            if body.position.distance(waypoint) > self.config.waypoint_reach_distance {
                break;
            }
            self.path_index += 1;
        }

        match self.path.get(self.path_index) {
            Some(waypoint) => {
                let offset = waypoint - body.position;
                let distance = offset.length();
                if distance > f32::EPSILON {
                    self.steer(body, offset / distance);
                } else {
                    self.halt(body);
                }
            }
            None => self.halt(body),
        }
    }

    fn needs_replan(&self, target: Vec2) -> bool {
        if self.path.is_empty() || self.path_index >= self.path.len() {
            return true;
        }
        let goal_moved = self
            .path_goal
            .map_or(true, |goal| goal.distance(target) > self.config.goal_replan_distance);
        goal_moved || self.travel_since_plan > self.config.replan_travel_distance
    }

    /// Returns `false` when the tick ends without a path to follow.
    fn replan<O>(
        &mut self,
        surroundings: Surroundings<'_, O>,
        body: &mut AgentBody,
        target: Vec2,
    ) -> bool
    where
        O: ObstructionProbe + ?Sized,
    {
        match self
            .planner
            .find_path(surroundings.grid, surroundings.probe, body.position, target)
        {
            Ok(path) if path.is_empty() => {
                debug!(position = %body.position, %target, "grid follower settled at goal");
                self.clear_path();
                self.release_commitment();
                self.settled = true;
                self.plan_failed = false;
                self.active = false;
                self.halt(body);
                false
            }
            Ok(path) => {
                self.path = path;
                self.path_index = 0;
                self.path_goal = Some(target);
                self.travel_since_plan = 0.0;
                self.plan_failed = false;
                true
            }
            Err(error) => {
                debug!(
                    %error,
                    position = %body.position,
                    %target,
                    "grid plan failed, holding position"
                );
                self.clear_path();
                self.plan_failed = true;
                self.plan_cooldown = self.config.failed_plan_cooldown;
                self.active = true;
                self.halt(body);
                false
            }
        }
    }

    fn steer(&mut self, body: &mut AgentBody, direction: Vec2) {
        self.active = true;
        self.direction = direction;
        body.velocity = direction * self.current_speed();
    }

    fn halt(&mut self, body: &mut AgentBody) {
        self.direction = Vec2::ZERO;
        body.velocity = Vec2::ZERO;
    }
}
