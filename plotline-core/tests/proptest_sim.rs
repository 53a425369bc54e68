//! Property tests for the classifier, pathing, and grid synthesis.

use std::collections::HashSet;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use plotline_core::classify::{ClassifyContext, classify};
use plotline_core::config::{GridConfig, MovementConfig};
use plotline_core::generate::extract_json;
use plotline_core::grid::GenParams;
use plotline_core::mapgen::GridSynthesizer;
use plotline_core::movement::MovementService;
use plotline_core::types::{
    ActionTier, Activity, Connection, Direction, Location, LocationType, Tension,
};

fn any_tension() -> impl Strategy<Value = Tension> {
    prop_oneof![
        Just(Tension::Calm),
        Just(Tension::Cautious),
        Just(Tension::Tense),
        Just(Tension::Hostile),
        Just(Tension::Critical),
    ]
}

fn any_kind() -> impl Strategy<Value = LocationType> {
    prop_oneof![
        Just(LocationType::Gate),
        Just(LocationType::Market),
        Just(LocationType::Tavern),
        Just(LocationType::Temple),
        Just(LocationType::Plaza),
        Just(LocationType::Shop),
        Just(LocationType::Residence),
        Just(LocationType::Landmark),
        Just(LocationType::Dungeon),
        Just(LocationType::District),
        Just(LocationType::Docks),
        Just(LocationType::Barracks),
        Just(LocationType::Palace),
        Just(LocationType::Other),
    ]
}

proptest! {
    /// Same input, same snapshot, same answer.
    #[test]
    fn classification_is_deterministic(
        input in ".{0,60}",
        tension in any_tension(),
        combat in any::<bool>(),
    ) {
        let ctx = ClassifyContext {
            activity: if combat { Activity::Combat } else { Activity::Exploring },
            tension,
            npcs: vec!["Mira".to_string()],
            ..ClassifyContext::default()
        };
        let a = classify(&input, &ctx);
        let b = classify(&input, &ctx);
        prop_assert_eq!(a, b);
    }

    /// Combat floors every classification at tier 2; elevated tension does
    /// the same for low base tiers; promotion never lowers a tier.
    #[test]
    fn tier_promotion_is_monotonic(input in ".{0,60}", tension in any_tension()) {
        let base_ctx = ClassifyContext {
            npcs: vec!["Mira".to_string()],
            ..ClassifyContext::default()
        };
        let base = classify(&input, &base_ctx);

        let combat = classify(&input, &ClassifyContext {
            activity: Activity::Combat,
            ..base_ctx.clone()
        });
        prop_assert!(combat.tier >= ActionTier::Contextual);
        prop_assert!(combat.tier >= base.tier);

        let tensed = classify(&input, &ClassifyContext {
            tension,
            ..base_ctx.clone()
        });
        prop_assert!(tensed.tier >= base.tier);
        if tension.is_elevated() {
            prop_assert!(tensed.tier >= ActionTier::Contextual);
        }
    }

    /// Direction sanitization is total and lands in the closed vocabulary.
    #[test]
    fn direction_parse_never_panics(raw in ".{0,20}") {
        if let Some(dir) = Direction::parse(&raw) {
            prop_assert!(Direction::ALL.contains(&dir));
            prop_assert_eq!(Direction::parse(dir.as_str()), Some(dir));
        }
    }

    /// Tolerant JSON extraction is total.
    #[test]
    fn extract_json_never_panics(raw in ".{0,200}") {
        let _ = extract_json(&raw);
    }

    /// Every door a synthesis places has a walkable neighbor, whatever the
    /// type, size, or seed.
    #[test]
    fn synthesized_doors_are_always_reachable(kind in any_kind(), seed in any::<u64>()) {
        let synthesizer = GridSynthesizer::new(GridConfig::default());
        let mut rng = StdRng::seed_from_u64(seed);
        let connections = vec![
            Connection { direction: Direction::North, target: "a".into(), distance: 1 },
            Connection { direction: Direction::West, target: "b".into(), distance: 1 },
        ];
        let out = synthesizer
            .synthesize(kind, &connections, &[], GenParams::default(), &mut rng)
            .expect("synthesis");
        for door in &out.doors {
            prop_assert!(
                door.pos.neighbors().into_iter().any(|n| out.grid.is_walkable(n)),
                "door at {} in {:?} has no walkable neighbor", door.pos, kind
            );
        }
    }

    /// No movement turn ever stacks two occupants on a tile.
    #[test]
    fn movement_preserves_the_occupancy_invariant(
        seed in any::<u64>(),
        input_idx in 0usize..4,
    ) {
        let inputs = [
            "I walk over to Mira the Keeper",
            "I head for the exit",
            "I approach the stranger",
            "I stand still",
        ];
        let mut loc = Location::new("Prop Tavern", LocationType::Tavern);
        loc.connections.push(Connection {
            direction: Direction::South,
            target: "street".into(),
            distance: 1,
        });
        let synthesizer = GridSynthesizer::new(GridConfig::default());
        let mut rng = StdRng::seed_from_u64(seed);
        let named = vec!["Mira the Keeper".to_string(), "stranger".to_string()];
        prop_assume!(synthesizer.ensure_generated(&mut loc, GenParams::default(), &named, &mut rng));

        let service = MovementService::new(MovementConfig::default());
        let start = loc.player_start;
        let outcome = service.resolve_turn(&mut loc, start, inputs[input_idx], None);

        let player = outcome.player.or(start);
        let mut tiles: Vec<_> = loc.positions.values().copied().collect();
        if let Some(p) = player {
            tiles.push(p);
        }
        let unique: HashSet<_> = tiles.iter().copied().collect();
        prop_assert_eq!(unique.len(), tiles.len(), "occupancy collision");
    }
}
