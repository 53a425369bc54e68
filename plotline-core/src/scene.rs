//! Scene Context Service — reconciles externally generated scene state.
//!
//! The full pipeline produces fresh scene state as loosely structured JSON.
//! This service clamps every enum field to its closed set, bounds the free
//! text, persists the record with a partial-field update so it cannot race
//! an occupancy write, and derives NPC reactive movement from the delta
//! between the old and new records. Everything here is best-effort: errors
//! are logged and swallowed.

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::config::SceneConfig;
use crate::error::Result;
use crate::path;
use crate::store::{DocumentStore, SESSIONS};
use crate::types::{
    GridPos, Location, NpcAttitude, NpcStatus, PresentNpc, SceneContext, SessionId, Tension,
};

/// Validates, persists, and reacts to scene-state updates.
#[derive(Debug, Clone)]
pub struct SceneService {
    cfg: SceneConfig,
}

impl SceneService {
    /// Create a scene service with the given bounds.
    #[must_use]
    pub fn new(cfg: SceneConfig) -> Self {
        Self { cfg }
    }

    /// Clamp raw generated output into a valid [`SceneContext`].
    ///
    /// Unknown enum strings fall back (tension keeps the previous value,
    /// NPC status and attitude take their defaults), free text is truncated
    /// to the configured bounds, and the turn counter advances past the
    /// previous record.
    #[must_use]
    pub fn sanitize(&self, raw: &Value, previous: &SceneContext) -> SceneContext {
        let summary = truncate(
            raw["summary"].as_str().unwrap_or(&previous.summary),
            self.cfg.max_summary_chars,
        );
        let tension = Tension::parse_or(
            raw["tension"].as_str().unwrap_or_default(),
            previous.tension,
        );
        let present = raw["npcs"]
            .as_array()
            .map(|npcs| npcs.iter().filter_map(|npc| self.sanitize_npc(npc)).collect())
            .unwrap_or_else(|| previous.present.clone());
        let active_events = raw["active_events"]
            .as_array()
            .map(|events| {
                events
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|e| truncate(e, self.cfg.max_intent_chars))
                    .collect()
            })
            .unwrap_or_else(|| previous.active_events.clone());

        SceneContext {
            summary,
            tension,
            present,
            active_events,
            turn: previous.turn + 1,
        }
    }

    fn sanitize_npc(&self, raw: &Value) -> Option<PresentNpc> {
        let name = raw["name"].as_str()?.trim();
        if name.is_empty() {
            return None;
        }
        Some(PresentNpc {
            name: name.to_string(),
            status: NpcStatus::parse_or_default(raw["status"].as_str().unwrap_or_default()),
            attitude: NpcAttitude::parse_or_default(raw["attitude"].as_str().unwrap_or_default()),
            intent: truncate(
                raw["intent"].as_str().unwrap_or_default(),
                self.cfg.max_intent_chars,
            ),
        })
    }

    /// Persist a scene context onto the session record.
    ///
    /// Only the `scene_context` field is written, so a concurrent position
    /// write on the same record survives.
    pub async fn persist(
        &self,
        store: &dyn DocumentStore,
        session: SessionId,
        scene: &SceneContext,
    ) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("scene_context".into(), json!(scene));
        store
            .set_fields(SESSIONS, &session.to_string(), fields)
            .await
    }

    /// Derive NPC movement from the old→new scene delta.
    ///
    /// Departed NPCs lose their grid position; arrivals are seated at a free
    /// ambient slot, else a door tile; NPCs with status `leaving` step
    /// toward the nearest door. Occupancy stays collision-free throughout.
    pub fn react(
        &self,
        loc: &mut Location,
        old: &SceneContext,
        new: &SceneContext,
        player: Option<GridPos>,
    ) {
        // Departures first, freeing their tiles for arrivals.
        for npc in &old.present {
            if new.npc(&npc.name).is_none() && loc.positions.remove(&npc.name).is_some() {
                debug!(npc = %npc.name, "cleared position for departed npc");
            }
        }

        let Some(grid) = loc.grid.clone() else {
            return;
        };

        for npc in &new.present {
            if loc.positions.contains_key(&npc.name) {
                continue;
            }
            let occupied = loc.occupancy(player);
            let slot = loc
                .ambient_slots
                .iter()
                .find(|p| !occupied.contains(p))
                .or_else(|| loc.doors.iter().map(|d| &d.pos).find(|p| !occupied.contains(p)));
            match slot {
                Some(&pos) => {
                    loc.positions.insert(npc.name.clone(), pos);
                }
                None => warn!(npc = %npc.name, "no free tile for arriving npc"),
            }
        }

        for npc in &new.present {
            if npc.status != NpcStatus::Leaving {
                continue;
            }
            let Some(&pos) = loc.positions.get(&npc.name) else {
                continue;
            };
            let Some(door) = path::nearest_door(&loc.doors, pos) else {
                continue;
            };
            let door_pos = door.pos;
            let mut occupied = loc.occupancy(player);
            occupied.remove(&pos);
            let next = path::walk_toward(&grid, &mut occupied, pos, door_pos, self.cfg.leaving_steps);
            loc.positions.insert(npc.name.clone(), next);
        }
    }

    /// Full update: sanitize, persist, react. Background entry point;
    /// persistence failure is logged, movement still applies.
    pub async fn apply(
        &self,
        store: &dyn DocumentStore,
        session: SessionId,
        loc: &mut Location,
        previous: &SceneContext,
        raw: &Value,
        player: Option<GridPos>,
    ) -> SceneContext {
        let scene = self.sanitize(raw, previous);
        if let Err(err) = self.persist(store, session, &scene).await {
            warn!(%session, error = %err, "scene context persist failed");
        }
        self.react(loc, previous, &scene, player);
        scene
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Door, GenParams, Grid, TileKind};
    use crate::store::InMemoryStore;
    use crate::types::{Direction, LocationType};

    fn service() -> SceneService {
        SceneService::new(SceneConfig::default())
    }

    fn tavern() -> Location {
        let mut loc = Location::new("The Gilded Eel", LocationType::Tavern);
        loc.grid = Some(Grid::filled(10, 10, TileKind::Floor, GenParams::default()));
        loc.doors.push(Door {
            pos: GridPos::new(5, 9),
            direction: Direction::South,
            leads_to: "street".into(),
        });
        loc.ambient_slots = vec![GridPos::new(2, 2), GridPos::new(7, 3)];
        loc
    }

    fn scene_with(npcs: &[(&str, NpcStatus)]) -> SceneContext {
        SceneContext {
            present: npcs
                .iter()
                .map(|(name, status)| PresentNpc {
                    name: (*name).to_string(),
                    status: *status,
                    attitude: NpcAttitude::Neutral,
                    intent: String::new(),
                })
                .collect(),
            ..SceneContext::default()
        }
    }

    #[test]
    fn sanitize_clamps_unknown_enums_and_truncates() {
        let previous = SceneContext {
            tension: Tension::Cautious,
            ..SceneContext::default()
        };
        let raw = json!({
            "summary": "a".repeat(2000),
            "tension": "apocalyptic",
            "npcs": [
                {"name": "Mira", "status": "berserk", "attitude": "smug", "intent": "b".repeat(500)},
                {"name": "   ", "status": "engaged"}
            ],
        });
        let scene = service().sanitize(&raw, &previous);
        assert_eq!(scene.summary.chars().count(), 600);
        assert_eq!(scene.tension, Tension::Cautious);
        assert_eq!(scene.present.len(), 1, "blank names are dropped");
        assert_eq!(scene.present[0].status, NpcStatus::Observing);
        assert_eq!(scene.present[0].attitude, NpcAttitude::Neutral);
        assert_eq!(scene.present[0].intent.chars().count(), 160);
        assert_eq!(scene.turn, previous.turn + 1);
    }

    #[test]
    fn departed_npc_loses_position() {
        let mut loc = tavern();
        loc.positions.insert("Mira".into(), GridPos::new(4, 4));
        let old = scene_with(&[("Mira", NpcStatus::Engaged)]);
        let new = scene_with(&[]);
        service().react(&mut loc, &old, &new, None);
        assert!(!loc.positions.contains_key("Mira"));
    }

    #[test]
    fn arrival_takes_ambient_slot_then_door() {
        let mut loc = tavern();
        let old = scene_with(&[]);
        let new = scene_with(&[("Mira", NpcStatus::Observing), ("Tom", NpcStatus::Observing)]);
        service().react(&mut loc, &old, &new, None);
        assert_eq!(loc.positions["Mira"], GridPos::new(2, 2));
        assert_eq!(loc.positions["Tom"], GridPos::new(7, 3));

        // Slots exhausted: the next arrival lands on the door tile.
        let newer = scene_with(&[
            ("Mira", NpcStatus::Observing),
            ("Tom", NpcStatus::Observing),
            ("Sal", NpcStatus::Observing),
        ]);
        service().react(&mut loc, &new, &newer, None);
        assert_eq!(loc.positions["Sal"], GridPos::new(5, 9));
    }

    #[test]
    fn leaving_npc_steps_toward_nearest_door() {
        let mut loc = tavern();
        loc.positions.insert("Mira".into(), GridPos::new(5, 2));
        let old = scene_with(&[("Mira", NpcStatus::Engaged)]);
        let new = scene_with(&[("Mira", NpcStatus::Leaving)]);
        service().react(&mut loc, &old, &new, None);
        let pos = loc.positions["Mira"];
        let door = GridPos::new(5, 9);
        assert!(pos.distance(door) < GridPos::new(5, 2).distance(door));
    }

    #[test]
    fn absent_to_leaving_across_two_updates_ends_near_door() {
        let mut loc = tavern();
        let empty = scene_with(&[]);
        let arrived = scene_with(&[("Stranger", NpcStatus::Observing)]);
        let svc = service();
        svc.react(&mut loc, &empty, &arrived, None);
        let leaving = scene_with(&[("Stranger", NpcStatus::Leaving)]);
        svc.react(&mut loc, &arrived, &leaving, None);
        svc.react(&mut loc, &leaving, &leaving, None);
        let pos = loc.positions["Stranger"];
        let door = GridPos::new(5, 9);
        assert!(pos.distance(door) <= 1, "ended at {pos:?}, door {door:?}");
    }

    #[tokio::test]
    async fn persist_writes_only_the_scene_field() {
        let store = InMemoryStore::new();
        let session = SessionId::new();
        store
            .put(SESSIONS, &session.to_string(), json!({"positions": {"player": {"x": 3, "y": 3}}}))
            .await
            .expect("seed");
        let scene = scene_with(&[("Mira", NpcStatus::Engaged)]);
        service()
            .persist(&store, session, &scene)
            .await
            .expect("persist");
        let doc = store
            .get(SESSIONS, &session.to_string())
            .await
            .expect("get")
            .expect("doc");
        assert_eq!(doc["positions"]["player"]["x"], json!(3));
        assert_eq!(doc["scene_context"]["present"][0]["name"], json!("Mira"));
    }
}
