use stealth_nav_core::Vec2;

/// Ordered, cyclic list of patrol points.
///
/// The first point doubles as the agent's home.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatrolRoute {
    points: Vec<Vec2>,
    index: usize,
}

impl PatrolRoute {
    /// Creates a route starting at its first point.
    #[must_use]
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points, index: 0 }
    }

    /// Replaces the points and restarts from the first one.
    pub fn set_points(&mut self, points: Vec<Vec2>) {
        self.points = points;
        self.index = 0;
    }

    /// Moves to the next point, wrapping after the last.
    pub fn advance(&mut self) {
        if self.points.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.points.len();
    }

    /// Point the agent is currently patrolling towards.
    #[must_use]
    pub fn current(&self) -> Option<Vec2> {
        self.points.get(self.index).copied()
    }

    /// Point agents return to once a chase is abandoned.
    #[must_use]
    pub fn home(&self) -> Option<Vec2> {
        self.points.first().copied()
    }

    /// Index of the current point.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// All points of the route in patrol order.
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_wraps_to_first_point() {
        let mut route = PatrolRoute::new(vec![Vec2::ZERO, Vec2::X, Vec2::Y]);
        route.advance();
        route.advance();
        assert_eq!(route.current(), Some(Vec2::Y));
        route.advance();
        assert_eq!(route.index(), 0);
        assert_eq!(route.current(), Some(Vec2::ZERO));
    }

    #[test]
    fn home_is_always_the_first_point() {
        let mut route = PatrolRoute::new(vec![Vec2::new(4.0, 1.0), Vec2::X]);
        route.advance();
        assert_eq!(route.home(), Some(Vec2::new(4.0, 1.0)));

        route.set_points(vec![Vec2::Y]);
        assert_eq!(route.index(), 0);
        assert_eq!(route.home(), Some(Vec2::Y));
    }

    #[test]
    fn empty_route_has_no_targets() {
        let mut route = PatrolRoute::default();
        route.advance();
        assert_eq!(route.current(), None);
        assert_eq!(route.home(), None);
    }
}
