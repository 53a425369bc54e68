//! Fast-Path Executor — cheap handlers for tier 0/1 actions.
//!
//! Tier 0 answers from templates alone; tier 1 asks the text generator for
//! a short line and falls back to the template when generation fails. Both
//! tiers run the Grid Movement Service and stream their events in order.
//! The fast path never touches the scene context record.

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::events::{EventSink, TurnEvent};
use crate::generate::TextGenerator;
use crate::movement::{MoveOutcome, MovementService};
use crate::path;
use crate::types::{
    ActionKind, ActionTier, Classification, Direction, GridPos, Location, SceneContext,
};

/// One fast-path turn's inputs.
#[derive(Debug, Clone, Copy)]
pub struct FastTurn<'a> {
    /// Raw player input.
    pub input: &'a str,
    /// The classification that routed here (tier 0 or 1).
    pub classification: &'a Classification,
    /// Current scene record, read-only.
    pub scene: &'a SceneContext,
    /// Player position before the turn.
    pub player_pos: Option<GridPos>,
    /// NPC name surfaced by a prior lookup, if any.
    pub recalled_npc: Option<&'a str>,
}

/// Executes tier 0/1 turns.
pub struct FastPath<G> {
    movement: MovementService,
    generator: G,
}

impl<G: TextGenerator> FastPath<G> {
    /// Build an executor over the movement service and generator.
    pub fn new(movement: MovementService, generator: G) -> Self {
        Self {
            movement,
            generator,
        }
    }

    /// Run one fast-path turn, streaming events to `sink`.
    ///
    /// Returns the player's position after the turn for the caller to
    /// persist. Generation failures degrade to the templated line; the only
    /// error out of here is a closed event stream.
    pub async fn execute(
        &self,
        loc: &mut Location,
        turn: FastTurn<'_>,
        sink: &EventSink,
    ) -> Result<Option<GridPos>> {
        let action = turn.classification.action;
        let outcome = self.reposition(loc, &turn);
        let player = outcome.player.or(turn.player_pos);

        if !outcome.is_noop() {
            sink.send(TurnEvent::GridUpdated {
                location: loc.id,
                player: outcome.player,
            })
            .await?;
        }

        let template = template_line(action, loc, turn.scene, &outcome);
        let text = match turn.classification.tier {
            ActionTier::Instant => template,
            _ => self.short_line(&turn, loc, &template).await,
        };
        sink.send(TurnEvent::Narrative { text }).await?;
        sink.send(TurnEvent::Done).await?;
        Ok(player)
    }

    /// Apply movement for the turn, if the action calls for any.
    fn reposition(&self, loc: &mut Location, turn: &FastTurn<'_>) -> MoveOutcome {
        let params = &turn.classification.params;
        match turn.classification.action {
            ActionKind::GridMove => {
                if let Some(pos) = click_target(params) {
                    return self.click_move(loc, turn.player_pos, pos);
                }
                if let Some(direction) = params.get("direction").and_then(Value::as_str) {
                    return self.directional_move(loc, turn.player_pos, direction);
                }
                self.movement
                    .resolve_turn(loc, turn.player_pos, turn.input, turn.recalled_npc)
            }
            // Approach vocabulary aside, social actions still drift the
            // player toward whoever they address.
            ActionKind::Greeting | ActionKind::Question | ActionKind::Examine => self
                .movement
                .resolve_turn(loc, turn.player_pos, turn.input, turn.recalled_npc),
            _ => MoveOutcome::default(),
        }
    }

    /// Click-to-move: walk toward the pre-resolved coordinate.
    fn click_move(
        &self,
        loc: &mut Location,
        player_pos: Option<GridPos>,
        target: GridPos,
    ) -> MoveOutcome {
        let Some(grid) = loc.grid.clone() else {
            return MoveOutcome::default();
        };
        let from = player_pos.unwrap_or_else(|| grid.center());
        let mut occupied = loc.occupancy(None);
        occupied.remove(&from);
        let dest = if grid.is_walkable(target) && !occupied.contains(&target) {
            target
        } else {
            let steps = self.movement.config().player_steps;
            path::walk_toward(&grid, &mut occupied, from, target, steps)
        };
        debug!(?from, ?dest, "click move");
        MoveOutcome {
            player: (Some(dest) != player_pos).then_some(dest),
            npc: None,
        }
    }

    /// Directional move: prefer a door in that direction, else walk the
    /// compass delta.
    fn directional_move(
        &self,
        loc: &mut Location,
        player_pos: Option<GridPos>,
        direction: &str,
    ) -> MoveOutcome {
        let Some(direction) = Direction::parse(direction) else {
            return MoveOutcome::default();
        };
        let Some(grid) = loc.grid.clone() else {
            return MoveOutcome::default();
        };
        let from = match player_pos {
            Some(p) => p,
            None => grid.center(),
        };
        let target = loc
            .doors
            .iter()
            .find(|d| d.direction == direction)
            .map(|d| d.pos)
            .or_else(|| {
                direction
                    .delta()
                    .map(|(dx, dy)| GridPos::new(from.x + dx * 64, from.y + dy * 64))
            });
        let Some(target) = target else {
            return MoveOutcome::default();
        };
        let mut occupied = loc.occupancy(None);
        occupied.remove(&from);
        let steps = self.movement.config().player_steps;
        let dest = path::walk_toward(&grid, &mut occupied, from, target, steps);
        MoveOutcome {
            player: (Some(dest) != player_pos).then_some(dest),
            npc: None,
        }
    }

    /// Tier-1 line: a one-sentence generation with the template as
    /// fallback.
    async fn short_line(&self, turn: &FastTurn<'_>, loc: &Location, fallback: &str) -> String {
        let prompt = format!(
            "Location: {}\nScene: {}\nPlayer: {}\nNarrate the result in one or two sentences.",
            loc.name, turn.scene.summary, turn.input,
        );
        match self.generator.complete(NARRATOR_SYSTEM, &prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => fallback.to_string(),
            Err(err) => {
                debug!(error = %err, "short-line generation failed, using template");
                fallback.to_string()
            }
        }
    }
}

const NARRATOR_SYSTEM: &str =
    "You are the narrator of a grounded fantasy world. Answer briefly, in second person.";

fn click_target(params: &serde_json::Map<String, Value>) -> Option<GridPos> {
    let x = params.get("x")?.as_i64()?;
    let y = params.get("y")?.as_i64()?;
    Some(GridPos::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
}

/// The templated line for a tier-0 answer (and the tier-1 fallback).
fn template_line(
    action: ActionKind,
    loc: &Location,
    scene: &SceneContext,
    outcome: &MoveOutcome,
) -> String {
    match action {
        ActionKind::GridMove => {
            if outcome.is_noop() {
                "You stay where you are.".to_string()
            } else {
                "You make your way across the area.".to_string()
            }
        }
        ActionKind::Look => {
            if scene.summary.is_empty() {
                format!("You take in {}.", loc.name)
            } else {
                scene.summary.clone()
            }
        }
        ActionKind::CheckExits => {
            if loc.connections.is_empty() {
                "You see no obvious way out.".to_string()
            } else {
                let exits: Vec<String> = loc
                    .connections
                    .iter()
                    .map(|c| format!("{} to {}", c.direction.as_str(), c.target))
                    .collect();
                format!("Ways out: {}.", exits.join(", "))
            }
        }
        ActionKind::Wait => "You wait, and the moment passes.".to_string(),
        ActionKind::Rest => "You rest a while and feel somewhat restored.".to_string(),
        ActionKind::Gesture => "Your gesture does not go unnoticed.".to_string(),
        ActionKind::Greeting => "You offer a greeting.".to_string(),
        ActionKind::Farewell => "You take your leave.".to_string(),
        ActionKind::Consume => "You eat and drink your fill.".to_string(),
        ActionKind::Examine => "You look it over carefully.".to_string(),
        ActionKind::Interact => "You manage it without trouble.".to_string(),
        ActionKind::Eavesdrop => "You listen in, catching fragments of talk.".to_string(),
        _ => "Time passes.".to_string(),
    }
}
