//! Waypoint post-processing shared by the planners.

use stealth_nav_core::{CellCoord, ObstacleClass, ObstructionProbe, Vec2};
use stealth_nav_world::WalkabilityGrid;

/// Fraction of a cell below which consecutive waypoints count as duplicates.
const DUPLICATE_FRACTION: f32 = 1.0e-3;

/// Line-of-sight oracle combining grid walkability with the host probe.
pub(crate) struct Sightline<'a, O: ?Sized> {
    grid: &'a WalkabilityGrid,
    probe: &'a O,
}

impl<'a, O> Sightline<'a, O>
where
    O: ObstructionProbe + ?Sized,
{
    pub(crate) fn new(grid: &'a WalkabilityGrid, probe: &'a O) -> Self {
        Self { grid, probe }
    }

    /// Both the grid and the static geometry must agree the segment is open.
    pub(crate) fn is_clear(&self, from: Vec2, to: Vec2) -> bool {
        self.grid.line_walkable(from, to)
            && self
                .probe
                .is_clear(from, to, ObstacleClass::StaticGeometry)
    }
}

/// Prefixes `waypoints` with the center of the start cell unless `origin`
/// already sits on it.
///
/// The center is always reachable from anywhere inside its own cell, so the
/// smoothing passes have a safe first leg when nothing further is visible.
pub(crate) fn with_lead_in(
    grid: &WalkabilityGrid,
    origin: Vec2,
    start: CellCoord,
    waypoints: Vec<Vec2>,
) -> Vec<Vec2> {
    let center = grid.center_of(start);
    if origin.distance(center) <= grid.cell_size() * DUPLICATE_FRACTION {
        return waypoints;
    }

    let mut led = Vec::with_capacity(waypoints.len() + 1);
    led.push(center);
    led.extend(waypoints);
    led
}

/// Greedy forward string pull.
///
/// From each kept point the farthest later waypoint with a clear line is
/// kept next, so the result is always a subsequence of `raw` ending at the
/// same final waypoint.
pub(crate) fn string_pull<O>(
    sight: &Sightline<'_, O>,
    anchor: Vec2,
    raw: &[Vec2],
) -> Vec<Vec2>
where
    O: ObstructionProbe + ?Sized,
{
    let mut smoothed = Vec::with_capacity(raw.len());
    let mut from = anchor;
    let mut index = 0;

    while index < raw.len() {
        let mut reach = index;
        while reach + 1 < raw.len() && sight.is_clear(from, raw[reach + 1]) {
            reach += 1;
        }
        smoothed.push(raw[reach]);
        from = raw[reach];
        index = reach + 1;
    }

    smoothed
}

/// Drops every waypoint whose neighbours already see each other.
pub(crate) fn prune_redundant<O>(
    sight: &Sightline<'_, O>,
    anchor: Vec2,
    waypoints: Vec<Vec2>,
) -> Vec<Vec2>
where
    O: ObstructionProbe + ?Sized,
{
    let mut kept = Vec::with_capacity(waypoints.len());
    let mut previous = anchor;

    for (index, &point) in waypoints.iter().enumerate() {
        let skippable = waypoints
            .get(index + 1)
            .is_some_and(|&next| sight.is_clear(previous, next));
        if !skippable {
            kept.push(point);
            previous = point;
        }
    }

    kept
}

/// Removes gentle bends whose shortcut is clear.
///
/// A waypoint survives when the heading change through it reaches
/// `threshold` radians or when cutting it would cross an obstacle.
pub(crate) fn soften_turns<O>(
    sight: &Sightline<'_, O>,
    anchor: Vec2,
    waypoints: Vec<Vec2>,
    threshold: f32,
) -> Vec<Vec2>
where
    O: ObstructionProbe + ?Sized,
{
    let mut kept = Vec::with_capacity(waypoints.len());
    let mut previous = anchor;

    for (index, &point) in waypoints.iter().enumerate() {
        let Some(&next) = waypoints.get(index + 1) else {
            kept.push(point);
            break;
        };

        if turn_angle(previous, point, next) < threshold && sight.is_clear(previous, next) {
            continue;
        }
        kept.push(point);
        previous = point;
    }

    kept
}

/// Collapses consecutive waypoints closer than a small fraction of a cell.
pub(crate) fn dedup(mut waypoints: Vec<Vec2>, cell_size: f32) -> Vec<Vec2> {
    let epsilon = cell_size * DUPLICATE_FRACTION;
    waypoints.dedup_by(|later, earlier| later.distance(*earlier) <= epsilon);
    waypoints
}

/// Absolute heading change in radians when travelling `from -> via -> to`.
fn turn_angle(from: Vec2, via: Vec2, to: Vec2) -> f32 {
    let incoming = via - from;
    let outgoing = to - via;
    incoming.perp_dot(outgoing).atan2(incoming.dot(outgoing)).abs()
}
