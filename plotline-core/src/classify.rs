//! Input Classifier — maps raw player text to a response tier.
//!
//! The classifier is an ordered table of rules. Each rule pairs a predicate
//! over the normalized input (plus a minimal session snapshot) with an
//! intrinsic action type and base tier; the first rule that matches wins.
//! A promotion pass then raises (never lowers) the tier for combat or
//! elevated tension. Classification is pure and recomputed every turn.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::types::{
    ActionKind, ActionTier, Activity, Classification, Direction, GridPos, Tension,
};

/// The minimal session snapshot classification reads.
///
/// Everything here is cheap to assemble from the session record and the
/// current location; nothing in it is mutated by classification.
#[derive(Debug, Clone, Default)]
pub struct ClassifyContext {
    /// What the session is currently doing.
    pub activity: Activity,
    /// Scene tension at the time of input.
    pub tension: Tension,
    /// Names of NPCs present in the scene.
    pub npcs: Vec<String>,
    /// Names of entities with a grid position at the location.
    pub entities: Vec<String>,
    /// A pre-resolved movement coordinate from a click, if any.
    pub click_target: Option<GridPos>,
}

impl ClassifyContext {
    fn npc_present(&self) -> bool {
        !self.npcs.is_empty()
    }

    /// Case-insensitive match of a known entity name inside `text`.
    fn visible_entity(&self, text: &str) -> Option<&str> {
        let mut best: Option<&str> = None;
        for name in self.entities.iter().chain(self.npcs.iter()) {
            let needle = name.to_lowercase();
            if text.contains(&needle) && best.is_none_or(|b| needle.len() > b.len()) {
                best = Some(name);
            }
        }
        best
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

type Matcher = fn(&str, &ClassifyContext) -> Option<Map<String, Value>>;

struct Rule {
    action: ActionKind,
    tier: ActionTier,
    matches: Matcher,
}

/// The ladder, top to bottom. Order is significant: earlier rules shadow
/// later ones, so the cheap unambiguous categories come first and the
/// trigger-vocabulary categories (skill checks, deep dialogue) come last.
const RULES: &[Rule] = &[
    Rule {
        action: ActionKind::GridMove,
        tier: ActionTier::Instant,
        matches: match_directional_move,
    },
    Rule {
        action: ActionKind::GridMove,
        tier: ActionTier::Instant,
        matches: match_entity_move,
    },
    Rule {
        action: ActionKind::Look,
        tier: ActionTier::Instant,
        matches: match_look_around,
    },
    Rule {
        action: ActionKind::Examine,
        tier: ActionTier::Quick,
        matches: match_examine,
    },
    Rule {
        action: ActionKind::CheckExits,
        tier: ActionTier::Instant,
        matches: match_check_exits,
    },
    Rule {
        action: ActionKind::Rest,
        tier: ActionTier::Quick,
        matches: match_rest,
    },
    Rule {
        action: ActionKind::Wait,
        tier: ActionTier::Instant,
        matches: match_wait,
    },
    Rule {
        action: ActionKind::Gesture,
        tier: ActionTier::Instant,
        matches: match_gesture,
    },
    Rule {
        action: ActionKind::Greeting,
        tier: ActionTier::Quick,
        matches: match_greeting,
    },
    Rule {
        action: ActionKind::Question,
        tier: ActionTier::Quick,
        matches: match_question,
    },
    Rule {
        action: ActionKind::Farewell,
        tier: ActionTier::Quick,
        matches: match_farewell,
    },
    Rule {
        action: ActionKind::Consume,
        tier: ActionTier::Quick,
        matches: match_consume,
    },
    Rule {
        action: ActionKind::Interact,
        tier: ActionTier::Quick,
        matches: match_interact,
    },
    Rule {
        action: ActionKind::Eavesdrop,
        tier: ActionTier::Quick,
        matches: match_eavesdrop,
    },
    Rule {
        action: ActionKind::Flavor,
        tier: ActionTier::Quick,
        matches: match_flavor,
    },
    Rule {
        action: ActionKind::SkillAction,
        tier: ActionTier::Contextual,
        matches: match_skill_trigger,
    },
    Rule {
        action: ActionKind::Dialogue,
        tier: ActionTier::Contextual,
        matches: match_dialogue_trigger,
    },
];

/// Classify one turn of input against the session snapshot.
///
/// Never fails: a snapshot that could not be loaded should be classified
/// with [`Classification::fallback`] by the caller, and input no rule
/// recognizes falls through to the same tier-3 default here.
#[must_use]
pub fn classify(input: &str, ctx: &ClassifyContext) -> Classification {
    // Click-to-move carries a pre-resolved coordinate; it is always the
    // instant tier, exempt from promotion, regardless of any text.
    if let Some(pos) = ctx.click_target {
        let mut params = Map::new();
        params.insert("x".into(), json!(pos.x));
        params.insert("y".into(), json!(pos.y));
        return Classification {
            tier: ActionTier::Instant,
            action: ActionKind::GridMove,
            params,
        };
    }

    let text = input.trim().to_lowercase();
    if text.is_empty() {
        return Classification::fallback();
    }

    for rule in RULES {
        if let Some(params) = (rule.matches)(&text, ctx) {
            let tier = promote(rule.tier, ctx);
            debug!(action = rule.action.as_str(), tier = %tier, "classified input");
            return Classification {
                tier,
                action: rule.action,
                params,
            };
        }
    }
    Classification::fallback()
}

/// Raise the base tier for combat or elevated tension. Never lowers.
fn promote(base: ActionTier, ctx: &ClassifyContext) -> ActionTier {
    let mut tier = base;
    if ctx.activity == Activity::Combat {
        tier = tier.promote_to(ActionTier::Contextual);
    }
    if ctx.tension.is_elevated() && tier < ActionTier::Contextual {
        tier = ActionTier::Contextual;
    }
    tier
}

// ---------------------------------------------------------------------------
// Matchers
// ---------------------------------------------------------------------------

const MOVE_VERBS: [&str; 9] = [
    "walk", "go", "move", "head", "run", "step", "stride", "approach", "wander",
];

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric()).any(|t| t == word)
}

fn has_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| {
        if w.contains(' ') {
            text.contains(w)
        } else {
            has_word(text, w)
        }
    })
}

fn match_directional_move(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    if !has_any(text, &MOVE_VERBS) {
        return None;
    }
    let direction = text
        .split(|c: char| !c.is_alphanumeric())
        .find_map(Direction::parse)?;
    let mut params = Map::new();
    params.insert("direction".into(), json!(direction.as_str()));
    Some(params)
}

fn match_entity_move(text: &str, ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    if !has_any(text, &MOVE_VERBS) {
        return None;
    }
    let target = ctx.visible_entity(text)?;
    let mut params = Map::new();
    params.insert("target".into(), json!(target));
    Some(params)
}

fn match_look_around(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    let surveys = text.contains("look around")
        || text.contains("glance around")
        || text.contains("survey")
        || text.contains("take in the")
        || text == "look";
    surveys.then(Map::new)
}

fn match_examine(text: &str, ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    if !(text.contains("look at")
        || has_any(text, &["examine", "inspect", "study"]))
    {
        return None;
    }
    let target = ctx.visible_entity(text)?;
    let mut params = Map::new();
    params.insert("target".into(), json!(target));
    Some(params)
}

fn match_check_exits(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    let asks = has_word(text, "exits")
        || text.contains("ways out")
        || text.contains("way out")
        || text.contains("where can i go")
        || text.contains("which way");
    asks.then(Map::new)
}

fn match_rest(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    has_any(text, &["rest", "nap", "sleep", "sit down", "take a seat"]).then(Map::new)
}

fn match_wait(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    (has_word(text, "wait") || text.contains("do nothing") || text.contains("stand still"))
        .then(Map::new)
}

fn match_gesture(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    has_any(
        text,
        &["nod", "wave", "shrug", "bow", "smile", "wink", "gesture", "salute"],
    )
    .then(Map::new)
}

fn match_greeting(text: &str, ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    if !ctx.npc_present() {
        return None;
    }
    has_any(
        text,
        &["hello", "hi", "greet", "good morning", "good evening", "good day"],
    )
    .then(Map::new)
}

fn match_question(text: &str, ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    if !ctx.npc_present() {
        return None;
    }
    let word_count = text.split_whitespace().count();
    let simple = word_count <= 10
        && (text.ends_with('?')
            || has_any(text, &["who", "what", "where", "when", "why", "how"]));
    simple.then(Map::new)
}

fn match_farewell(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    has_any(
        text,
        &["goodbye", "farewell", "bye", "see you", "take my leave"],
    )
    .then(Map::new)
}

fn match_consume(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    has_any(text, &["eat", "drink", "sip", "quaff", "swig", "bite into"]).then(Map::new)
}

fn match_interact(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    has_any(
        text,
        &[
            "pick up", "put down", "open the", "close the", "knock", "grab", "push", "pull",
            "light the", "snuff",
        ],
    )
    .then(Map::new)
}

fn match_eavesdrop(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    has_any(text, &["eavesdrop", "listen in", "overhear"]).then(Map::new)
}

fn match_flavor(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    has_any(
        text,
        &["hum", "whistle", "stretch", "yawn", "tap my", "crack my knuckles"],
    )
    .then(Map::new)
}

fn match_skill_trigger(text: &str, _ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    has_any(
        text,
        &[
            "pick the lock",
            "lockpick",
            "sneak",
            "hide",
            "steal",
            "pickpocket",
            "climb",
            "leap",
            "swim",
            "pry",
            "force the",
            "disarm",
            "dodge",
            "persuade",
            "convince",
            "intimidate",
            "deceive",
            "search for traps",
        ],
    )
    .then(Map::new)
}

fn match_dialogue_trigger(text: &str, ctx: &ClassifyContext) -> Option<Map<String, Value>> {
    if !ctx.npc_present() {
        return None;
    }
    has_any(
        text,
        &[
            "talk to", "speak with", "speak to", "ask about", "ask him", "ask her", "ask them",
            "tell me about", "discuss", "confront", "interrogate",
        ],
    )
    .then(Map::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ClassifyContext {
        ClassifyContext::default()
    }

    fn ctx_with_npc(name: &str) -> ClassifyContext {
        ClassifyContext {
            npcs: vec![name.to_string()],
            ..ClassifyContext::default()
        }
    }

    #[test]
    fn walk_north_is_instant_grid_move() {
        let c = classify("I walk north", &ctx());
        assert_eq!(c.tier, ActionTier::Instant);
        assert_eq!(c.action, ActionKind::GridMove);
        assert_eq!(c.params["direction"], json!("north"));
    }

    #[test]
    fn pick_the_lock_is_contextual_skill_action() {
        for tension in [Tension::Calm, Tension::Hostile] {
            let snapshot = ClassifyContext {
                tension,
                ..ClassifyContext::default()
            };
            let c = classify("I try to pick the lock on the door", &snapshot);
            assert_eq!(c.tier, ActionTier::Contextual);
            assert_eq!(c.action, ActionKind::SkillAction);
        }
    }

    #[test]
    fn move_toward_visible_entity_carries_target() {
        let snapshot = ClassifyContext {
            entities: vec!["Mira".into()],
            ..ClassifyContext::default()
        };
        let c = classify("I walk over to Mira", &snapshot);
        assert_eq!(c.action, ActionKind::GridMove);
        assert_eq!(c.params["target"], json!("Mira"));
    }

    #[test]
    fn greeting_requires_npc_present() {
        let alone = classify("Hello there", &ctx());
        assert_eq!(alone.action, ActionKind::Default);
        let company = classify("Hello there", &ctx_with_npc("Mira"));
        assert_eq!(company.action, ActionKind::Greeting);
        assert_eq!(company.tier, ActionTier::Quick);
    }

    #[test]
    fn combat_floors_every_classification_at_contextual() {
        let snapshot = ClassifyContext {
            activity: Activity::Combat,
            ..ClassifyContext::default()
        };
        let c = classify("I walk north", &snapshot);
        assert_eq!(c.action, ActionKind::GridMove);
        assert_eq!(c.tier, ActionTier::Contextual);
    }

    #[test]
    fn elevated_tension_promotes_low_tiers_only() {
        let snapshot = ClassifyContext {
            tension: Tension::Tense,
            ..ClassifyContext::default()
        };
        let c = classify("I look around", &snapshot);
        assert_eq!(c.tier, ActionTier::Contextual);
        // A tier-3 default stays tier 3; promotion never lowers.
        let d = classify("zzzxqj unclassifiable", &snapshot);
        assert_eq!(d.tier, ActionTier::Full);
    }

    #[test]
    fn click_target_is_always_instant() {
        let snapshot = ClassifyContext {
            activity: Activity::Combat,
            tension: Tension::Critical,
            click_target: Some(GridPos::new(4, 7)),
            ..ClassifyContext::default()
        };
        let c = classify("charge screaming at the bandit", &snapshot);
        assert_eq!(c.tier, ActionTier::Instant);
        assert_eq!(c.action, ActionKind::GridMove);
        assert_eq!(c.params["x"], json!(4));
        assert_eq!(c.params["y"], json!(7));
    }

    #[test]
    fn unmatched_input_falls_back_to_full_default() {
        let c = classify("florp the wibble", &ctx());
        assert_eq!(c, Classification::fallback());
        assert_eq!(classify("   ", &ctx()), Classification::fallback());
    }

    #[test]
    fn classification_is_deterministic() {
        let snapshot = ctx_with_npc("Barkeep");
        let a = classify("I ask where the road leads?", &snapshot);
        let b = classify("I ask where the road leads?", &snapshot);
        assert_eq!(a, b);
    }

    #[test]
    fn ladder_order_prefers_earlier_rules() {
        // "walk" plus a direction shadows the flavor vocabulary.
        let c = classify("I whistle as I walk east", &ctx());
        assert_eq!(c.action, ActionKind::GridMove);
    }

    #[test]
    fn examine_requires_visible_target() {
        let c = classify("I examine the runes", &ctx());
        assert_ne!(c.action, ActionKind::Examine);
        let snapshot = ClassifyContext {
            entities: vec!["runes".into()],
            ..ClassifyContext::default()
        };
        let d = classify("I examine the runes", &snapshot);
        assert_eq!(d.action, ActionKind::Examine);
        assert_eq!(d.params["target"], json!("runes"));
    }
}
