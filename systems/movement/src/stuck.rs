use stealth_nav_core::Vec2;

use crate::MovementConfig;

/// Tracks how long an agent has failed to make progress.
///
/// Two independent signals raise the flag: the speed staying below a
/// threshold for longer than a mode-dependent limit, or the net displacement
/// over a fixed window staying below a minimum. The second catches agents
/// whose requested velocity is high while the physics keeps them pinned.
#[derive(Clone, Debug, Default)]
pub(crate) struct StuckDetector {
    slow_for: f32,
    window_anchor: Option<Vec2>,
    window_elapsed: f32,
    displacement_stalled: bool,
    stuck: bool,
}

impl StuckDetector {
    pub(crate) fn observe(
        &mut self,
        config: &MovementConfig,
        position: Vec2,
        speed: f32,
        dt: f32,
        slow_limit: f32,
    ) {
        if speed < config.stuck_speed {
            self.slow_for += dt;
        } else {
            self.slow_for = 0.0;
        }

        let anchor = *self.window_anchor.get_or_insert(position);
        self.window_elapsed += dt;
        if self.window_elapsed >= config.displacement_window {
            self.displacement_stalled = position.distance(anchor) < config.displacement_min;
            self.window_anchor = Some(position);
            self.window_elapsed = 0.0;
        }

        self.stuck = self.slow_for > slow_limit || self.displacement_stalled;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) const fn is_stuck(&self) -> bool {
        self.stuck
    }
}
