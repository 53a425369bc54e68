//! End-to-end tests across the classify → generate → move → reconcile
//! pipeline.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

use plotline_core::classify::{ClassifyContext, classify};
use plotline_core::config::{GridConfig, MovementConfig, SceneConfig};
use plotline_core::events::{EventSink, TurnEvent};
use plotline_core::fastpath::{FastPath, FastTurn};
use plotline_core::generate::NullGenerator;
use plotline_core::grid::{GenParams, Grid, TileKind};
use plotline_core::mapgen::{GridSynthesizer, dimension_range};
use plotline_core::movement::MovementService;
use plotline_core::scene::SceneService;
use plotline_core::store::{DocumentStore, InMemoryStore, SESSIONS};
use plotline_core::types::{
    ActionKind, ActionTier, Connection, Direction, GridPos, Location, LocationType, NpcAttitude,
    NpcStatus, PresentNpc, SceneContext, SessionId, SettlementSize,
};

fn tavern_location(seed: u64) -> Location {
    let mut loc = Location::new("The Gilded Eel", LocationType::Tavern);
    loc.connections.push(Connection {
        direction: Direction::South,
        target: "Harbor Street".into(),
        distance: 1,
    });
    let synthesizer = GridSynthesizer::new(GridConfig::default());
    let mut rng = StdRng::seed_from_u64(seed);
    let named = vec!["Mira the Keeper".to_string()];
    assert!(synthesizer.ensure_generated(&mut loc, GenParams::default(), &named, &mut rng));
    loc
}

/// Walkable-tile flood fill, the test-side notion of reachability.
fn reachable_from(grid: &Grid, start: GridPos) -> HashSet<GridPos> {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(pos) = queue.pop_front() {
        for next in pos.neighbors() {
            if grid.is_walkable(next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

#[test]
fn tavern_medium_has_counter_row_and_reachable_door() {
    for seed in 0..8 {
        let loc = tavern_location(seed);
        let grid = loc.grid.as_ref().expect("generated");

        let ((wmin, wmax), (hmin, hmax)) =
            dimension_range(LocationType::Tavern, SettlementSize::Medium);
        assert!((wmin..=wmax).contains(&grid.width));
        assert!((hmin..=hmax).contains(&grid.height));

        // Exactly one counter row.
        let counter_rows: HashSet<i32> = grid
            .iter_positions()
            .filter(|&p| grid.get(p) == Some(TileKind::Counter))
            .map(|p| p.y)
            .collect();
        assert_eq!(counter_rows.len(), 1, "seed {seed}: counter rows {counter_rows:?}");

        // A door is reachable from beside the counter.
        let beside_counter = grid
            .iter_positions()
            .find(|&p| {
                grid.is_walkable(p)
                    && p.neighbors()
                        .into_iter()
                        .any(|n| grid.get(n) == Some(TileKind::Counter))
            })
            .expect("walkable tile beside the counter");
        let reachable = reachable_from(grid, beside_counter);
        let door_reached = loc
            .doors
            .iter()
            .any(|d| reachable.contains(&d.pos) || d.pos.neighbors().iter().any(|n| reachable.contains(n)));
        assert!(door_reached, "seed {seed}: no door reachable from the counter");
    }
}

#[tokio::test]
async fn walk_north_turn_runs_the_fast_path_end_to_end() {
    let mut loc = tavern_location(42);
    let store = InMemoryStore::new();
    let session = SessionId::new();

    let snapshot = ClassifyContext {
        entities: loc.positions.keys().cloned().collect(),
        ..ClassifyContext::default()
    };
    let classification = classify("I walk north", &snapshot);
    assert_eq!(classification.tier, ActionTier::Instant);
    assert_eq!(classification.action, ActionKind::GridMove);

    let executor = FastPath::new(MovementService::new(MovementConfig::default()), NullGenerator);
    let (sink, mut rx) = EventSink::channel(16);
    let scene = SceneContext::default();
    let start = loc.player_start;
    let turn = FastTurn {
        input: "I walk north",
        classification: &classification,
        scene: &scene,
        player_pos: start,
        recalled_npc: None,
    };
    let player = executor
        .execute(&mut loc, turn, &sink)
        .await
        .expect("fast path");
    drop(sink);

    let player = player.expect("player positioned");
    let mut fields = serde_json::Map::new();
    fields.insert("positions.player".into(), json!({"x": player.x, "y": player.y}));
    store
        .set_fields(SESSIONS, &session.to_string(), fields)
        .await
        .expect("persist position");

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events.last(), Some(&TurnEvent::Done));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, TurnEvent::Narrative { .. })),
        "no narrative emitted"
    );

    // Occupancy invariant after the move.
    let occupied = loc.occupancy(None);
    assert!(!occupied.contains(&player), "player stacked on an npc");
}

#[tokio::test]
async fn scene_update_never_clobbers_a_position_write() {
    let store = Arc::new(InMemoryStore::new());
    let session = SessionId::new();
    let mut loc = tavern_location(7);

    // Main path writes occupancy.
    let mut fields = serde_json::Map::new();
    fields.insert("positions.player".into(), json!({"x": 4, "y": 5}));
    store
        .set_fields(SESSIONS, &session.to_string(), fields)
        .await
        .expect("position write");

    // Background path writes scene context on the same record.
    let service = SceneService::new(SceneConfig::default());
    let previous = SceneContext::default();
    let raw = json!({
        "summary": "The taproom murmurs on.",
        "tension": "calm",
        "npcs": [{"name": "Mira the Keeper", "status": "engaged", "attitude": "friendly", "intent": "pour drinks"}],
        "active_events": [],
    });
    let scene = service
        .apply(store.as_ref(), session, &mut loc, &previous, &raw, None)
        .await;
    assert_eq!(scene.present.len(), 1);

    let doc = store
        .get(SESSIONS, &session.to_string())
        .await
        .expect("get")
        .expect("doc");
    assert_eq!(doc["positions"]["player"], json!({"x": 4, "y": 5}));
    assert_eq!(doc["scene_context"]["summary"], json!("The taproom murmurs on."));
}

#[test]
fn npc_arriving_then_leaving_ends_beside_a_door() {
    let mut loc = tavern_location(11);
    let service = SceneService::new(SceneConfig::default());

    let absent = SceneContext::default();
    let stranger = |status: NpcStatus| SceneContext {
        present: vec![PresentNpc {
            name: "Hooded Stranger".into(),
            status,
            attitude: NpcAttitude::Wary,
            intent: "watch the door".into(),
        }],
        ..SceneContext::default()
    };

    let arrived = stranger(NpcStatus::Observing);
    let player = loc.player_start;
    service.react(&mut loc, &absent, &arrived, player);
    assert!(loc.positions.contains_key("Hooded Stranger"));

    // Greedy movement has no path search, so a start boxed in by furniture
    // may legitimately stall. Reseat the stranger on a distant tile the
    // door is greedily reachable from, then let the reactive pass walk it.
    let grid = loc.grid.clone().expect("generated");
    let door = loc.doors.first().expect("door").pos;
    let start = grid
        .walkable_positions()
        .into_iter()
        .filter(|p| p.distance(door) >= 4)
        .find(|&p| {
            let mut occupied = HashSet::new();
            plotline_core::path::walk_toward(&grid, &mut occupied, p, door, 64).distance(door) <= 1
        })
        .expect("a tile with a clear run to the door");
    loc.positions.insert("Hooded Stranger".into(), start);

    let leaving = stranger(NpcStatus::Leaving);
    let mut previous = arrived;
    // A handful of reconciliations; three steps each reach any door on a
    // tavern-sized grid.
    for _ in 0..8 {
        service.react(&mut loc, &previous, &leaving, None);
        previous = leaving.clone();
    }
    let pos = loc.positions["Hooded Stranger"];
    let near_door = loc.doors.iter().any(|d| d.pos.distance(pos) <= 1);
    assert!(near_door, "stranger stalled at {pos}");
}
