use serde::{Deserialize, Serialize};

/// Tunables for [`crate::MovementController`].
///
/// Distances are in world units and durations in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Speed before the context and injury multipliers are applied.
    pub base_speed: f32,
    /// Multiplier applied while the injury signal reports the agent as hurt.
    pub injury_multiplier: f32,
    /// Target displacement that triggers a fresh line-of-sight evaluation.
    pub target_change_epsilon: f32,
    /// Target displacement that releases an agent committed to the grid.
    pub commit_release_distance: f32,
    /// Distance travelled in direct chase between line-of-sight rechecks.
    pub direct_recheck_distance: f32,
    /// Goal displacement that invalidates the current path.
    pub goal_replan_distance: f32,
    /// Distance travelled along a path before it is recomputed.
    pub replan_travel_distance: f32,
    /// Distance at which a waypoint counts as reached.
    pub waypoint_reach_distance: f32,
    /// Distance at which a direct chase counts as arrived.
    pub arrival_distance: f32,
    /// Time during which planning is suppressed after a failed plan.
    pub failed_plan_cooldown: f32,
    /// Speed below which the agent counts as not moving.
    pub stuck_speed: f32,
    /// Time spent below [`MovementConfig::stuck_speed`] before a grid follower is stuck.
    pub stuck_time_grid: f32,
    /// Time spent below [`MovementConfig::stuck_speed`] before a direct chaser is stuck.
    pub stuck_time_direct: f32,
    /// Length of the net displacement window.
    pub displacement_window: f32,
    /// Net displacement a window must exceed for the agent to count as moving.
    pub displacement_min: f32,
    /// Speed below which the facing is left untouched.
    pub facing_deadzone: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            base_speed: 3.5,
            injury_multiplier: 0.7,
            target_change_epsilon: 0.25,
            commit_release_distance: 3.0,
            direct_recheck_distance: 2.0,
            goal_replan_distance: 1.5,
            replan_travel_distance: 6.0,
            waypoint_reach_distance: 0.2,
            arrival_distance: 0.3,
            failed_plan_cooldown: 0.5,
            stuck_speed: 0.1,
            stuck_time_grid: 0.5,
            stuck_time_direct: 1.5,
            displacement_window: 0.5,
            displacement_min: 0.05,
            facing_deadzone: 0.05,
        }
    }
}
