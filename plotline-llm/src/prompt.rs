//! Prompt templates for narrative generation.
//!
//! Every prompt is a testable artifact with named `{placeholder}` slots,
//! filled by [`fill`]. In production these would be loaded from TOML; this
//! module provides the built-in defaults.

/// Scene-merge prompt (capable tier). The response must be a JSON object
/// the core can clamp into a scene context.
pub const SCENE_MERGE_SYSTEM: &str = r"You maintain the living state of a scene in a grounded
fantasy world. Given the previous scene state and what just happened, produce the new state.
Your response must be a single valid JSON object and nothing else.";

/// User half of the scene-merge prompt.
pub const SCENE_MERGE_USER: &str = r#"Previous scene state:
{previous_scene}

What happened this turn:
{turn_events}

Return JSON:
{{"summary": "one-paragraph scene summary", "tension": "calm|cautious|tense|hostile|critical", "npcs": [{{"name": "...", "status": "engaged|observing|leaving|hostile|unconscious|fled|dead", "attitude": "friendly|neutral|wary|hostile|terrified", "intent": "one line"}}], "active_events": ["ongoing thing", ...]}}"#;

/// First-impression prompt for a freshly generated location (capable tier).
pub const FIRST_IMPRESSION_SYSTEM: &str = r"You are the narrator of a grounded fantasy world.
Describe a location as the player first sees it. Second person, present tense, three to five
sentences. Mention the people present without naming anyone the player has not met.";

/// User half of the first-impression prompt.
pub const FIRST_IMPRESSION_USER: &str = r"Location: {location_name} ({location_type})
Condition: {condition}, wealth: {wealth}
Notable features: {features}
People present: {present}";

/// Full-turn narration prompt (capable tier).
pub const TURN_NARRATIVE_SYSTEM: &str = r"You are the narrator of a grounded fantasy world.
Narrate the outcome of the player's action. Second person, past tense, at most two paragraphs.
Never decide the player's feelings or words for them.";

/// User half of the full-turn narration prompt.
pub const TURN_NARRATIVE_USER: &str = r"Scene: {scene_summary}
Tension: {tension}
Player action: {player_action}
Mechanical outcome: {outcome}";

/// Replace `{name}` slots from `(name, value)` pairs.
///
/// Unknown slots are left intact so a missing value is visible in logs
/// rather than silently blank.
#[must_use]
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in values {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}
