//! Grid Movement Service — per-turn repositioning.
//!
//! Decides each turn whether the acting player (and optionally a targeted
//! NPC) should reposition, and applies it while preserving the
//! no-two-occupants-per-tile invariant. Used by both the fast path and the
//! full pipeline; skipped entirely on inter-location movement.

use std::collections::HashSet;

use tracing::debug;

use crate::config::MovementConfig;
use crate::path;
use crate::types::{GridPos, Location};

/// Exit vocabulary that redirects a targetless move toward the nearest door.
const EXIT_WORDS: [&str; 7] = ["leave", "exit", "door", "doorway", "out", "outside", "depart"];

/// What one movement resolution did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveOutcome {
    /// The player's position after the turn, if it was set or changed.
    pub player: Option<GridPos>,
    /// An NPC that repositioned (mutual approach), with its new position.
    pub npc: Option<(String, GridPos)>,
}

impl MoveOutcome {
    /// Whether anything actually moved or was backfilled.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.player.is_none() && self.npc.is_none()
    }
}

/// Resolves intra-location repositioning for one turn.
#[derive(Debug, Clone)]
pub struct MovementService {
    cfg: MovementConfig,
}

impl MovementService {
    /// Create a movement service with the given tuning.
    #[must_use]
    pub fn new(cfg: MovementConfig) -> Self {
        Self { cfg }
    }

    /// The tuning this service was built with.
    #[must_use]
    pub fn config(&self) -> &MovementConfig {
        &self.cfg
    }

    /// Resolve movement for one turn of input at `loc`.
    ///
    /// `recalled_npc` is a name surfaced by a prior NPC-lookup tool call,
    /// used as a fallback when no name in the input matches. NPC positions
    /// inside `loc` are updated in place; the caller owns persisting the
    /// returned player position.
    pub fn resolve_turn(
        &self,
        loc: &mut Location,
        player_pos: Option<GridPos>,
        input: &str,
        recalled_npc: Option<&str>,
    ) -> MoveOutcome {
        let Some(grid) = loc.grid.as_ref() else {
            return MoveOutcome::default();
        };
        let grid = grid.clone();

        // Lazy backfill: a mover with no prior position starts near the
        // entry door before any move is computed.
        let backfilled = player_pos.is_none();
        let mut player = match player_pos {
            Some(p) => p,
            None => {
                let occupied = loc.occupancy(None);
                let fallback = loc.player_start.filter(|p| !occupied.contains(p));
                match fallback.or_else(|| default_entry(&grid, loc, &occupied)) {
                    Some(p) => p,
                    None => grid.center(),
                }
            }
        };

        let mut outcome = MoveOutcome {
            player: backfilled.then_some(player),
            npc: None,
        };

        let target_name = match_entity_name(input, loc, recalled_npc);

        if let Some(name) = target_name {
            let Some(&target) = loc.positions.get(&name) else {
                return outcome;
            };

            if player.distance(target) > 1 {
                // Bounded greedy approach: a clear run ends the move beside
                // the target in one repositioning, while walls and other
                // occupants cut it short rather than being crossed.
                let mut occupied = loc.occupancy(None);
                player =
                    path::walk_toward(&grid, &mut occupied, player, target, self.cfg.player_steps);
                outcome.player = Some(player);
            }

            // Mutual approach: a still-distant NPC closes toward the player.
            if target.distance(player) > self.cfg.approach_distance {
                let mut occupied = loc.occupancy(Some(player));
                occupied.remove(&target);
                let npc_pos =
                    path::walk_toward(&grid, &mut occupied, target, player, self.cfg.npc_steps);
                if npc_pos != target {
                    loc.positions.insert(name.clone(), npc_pos);
                    outcome.npc = Some((name, npc_pos));
                }
            }
            return outcome;
        }

        // No entity match: exit vocabulary walks toward the nearest door.
        if wants_exit(input) {
            if let Some(door) = path::nearest_door(&loc.doors, player) {
                let door_pos = door.pos;
                let mut occupied = loc.occupancy(Some(player));
                occupied.remove(&player);
                let next =
                    path::walk_toward(&grid, &mut occupied, player, door_pos, self.cfg.player_steps);
                if next != player || backfilled {
                    outcome.player = Some(next);
                }
            }
            return outcome;
        }

        debug!("no movement target in input, leaving positions unchanged");
        outcome
    }
}

// ---------------------------------------------------------------------------
// Name matching
// ---------------------------------------------------------------------------

/// Best match between input tokens and known entity names at the location.
///
/// Longest matching name wins; falls back to a name surfaced by a prior
/// lookup when nothing in the text matches.
fn match_entity_name(input: &str, loc: &Location, recalled: Option<&str>) -> Option<String> {
    let haystack = input.to_lowercase();
    let mut best: Option<&String> = None;
    for name in loc.positions.keys() {
        let needle = name.to_lowercase();
        if haystack.contains(&needle)
            && best.is_none_or(|b| needle.len() > b.len())
        {
            best = Some(name);
        }
    }
    // First/last name fragments still count when the full name misses.
    if best.is_none() {
        for name in loc.positions.keys() {
            for part in name.split_whitespace() {
                if part.len() >= 3 && contains_word(&haystack, &part.to_lowercase()) {
                    best = best
                        .filter(|b| b.len() >= name.len())
                        .or(Some(name));
                }
            }
        }
    }
    best.cloned().or_else(|| {
        recalled
            .filter(|r| loc.positions.contains_key(*r))
            .map(ToString::to_string)
    })
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|t| t == word)
}

fn wants_exit(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_WORDS.iter().any(|w| contains_word(&lower, w))
}

/// A walkable tile next to an entry door, used to backfill a missing
/// position.
fn default_entry(
    grid: &crate::grid::Grid,
    loc: &Location,
    occupied: &HashSet<GridPos>,
) -> Option<GridPos> {
    let door = loc.doors.first()?;
    path::adjacent_walkable(grid, occupied, door.pos, grid.center())
        .first()
        .copied()
}
