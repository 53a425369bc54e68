//! Spatial pathing primitives — greedy single-step movement.
//!
//! There is deliberately no full path search here. Both player and NPC
//! movement are built from three primitives: one greedy step toward a
//! target, the ranked set of walkable tiles adjacent to a target, and the
//! nearest door. A step is only valid onto a walkable, unoccupied tile.

use std::collections::HashSet;

use crate::grid::{Door, Grid};
use crate::types::GridPos;

/// One greedy step from `from` toward `to`.
///
/// Considers the eight neighboring tiles, keeps those that are walkable,
/// unoccupied, and strictly closer to `to`, and returns the closest of
/// them. Returns `None` when no such tile exists (blocked, or already
/// adjacent enough that no strictly-closer tile is free).
#[must_use]
pub fn step_toward(
    grid: &Grid,
    occupied: &HashSet<GridPos>,
    from: GridPos,
    to: GridPos,
) -> Option<GridPos> {
    let current = from.distance(to);
    from.neighbors()
        .into_iter()
        .filter(|p| grid.is_walkable(*p) && !occupied.contains(p))
        .filter(|p| p.distance(to) < current)
        .min_by_key(|p| (p.distance(to), (p.x - from.x).abs() + (p.y - from.y).abs()))
}

/// Walk up to `max_steps` greedy steps from `from` toward `to`, committing
/// each step into `occupied` as it lands.
///
/// A collision or dead end terminates the loop early, yielding a partial
/// move rather than a failure. Stops once adjacent to the target.
#[must_use]
pub fn walk_toward(
    grid: &Grid,
    occupied: &mut HashSet<GridPos>,
    from: GridPos,
    to: GridPos,
    max_steps: u32,
) -> GridPos {
    let mut pos = from;
    for _ in 0..max_steps {
        if pos.distance(to) <= 1 {
            break;
        }
        let Some(next) = step_toward(grid, occupied, pos, to) else {
            break;
        };
        occupied.remove(&pos);
        occupied.insert(next);
        pos = next;
    }
    pos
}

/// Walkable, unoccupied tiles adjacent to `target`, ranked by proximity to
/// `rank_from` (closest first, Manhattan tie-break).
#[must_use]
pub fn adjacent_walkable(
    grid: &Grid,
    occupied: &HashSet<GridPos>,
    target: GridPos,
    rank_from: GridPos,
) -> Vec<GridPos> {
    let mut tiles: Vec<GridPos> = target
        .neighbors()
        .into_iter()
        .filter(|p| grid.is_walkable(*p) && !occupied.contains(p))
        .collect();
    tiles.sort_by_key(|p| {
        (
            p.distance(rank_from),
            (p.x - rank_from.x).abs() + (p.y - rank_from.y).abs(),
        )
    });
    tiles
}

/// The door closest to `from`, by Chebyshev distance.
#[must_use]
pub fn nearest_door(doors: &[Door], from: GridPos) -> Option<&Door> {
    doors.iter().min_by_key(|d| d.pos.distance(from))
}
