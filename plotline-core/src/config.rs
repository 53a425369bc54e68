//! Configuration for the Plotline simulation core.
//!
//! Maps directly to `plotline.toml`.

use serde::{Deserialize, Serialize};

/// Top-level core configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlotlineConfig {
    /// Grid synthesis settings.
    #[serde(default)]
    pub grid: GridConfig,
    /// Per-turn movement settings.
    #[serde(default)]
    pub movement: MovementConfig,
    /// Scene-context reconciliation settings.
    #[serde(default)]
    pub scene: SceneConfig,
    /// World tick debounce and probability settings.
    #[serde(default)]
    pub tick: TickConfig,
    /// Background task supervision.
    #[serde(default)]
    pub tasks: TaskConfig,
}

impl PlotlineConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::CoreError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Grid synthesis tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Bounded retry count for door position collisions.
    #[serde(default = "default_10")]
    pub max_door_attempts: u32,
    /// Cellular-automaton generations for cave interiors.
    #[serde(default = "default_4")]
    pub cave_generations: u32,
    /// Initial wall probability for the cave seed grid.
    #[serde(default = "default_0_45")]
    pub cave_wall_chance: f32,
    /// A cave cell becomes wall when it has at least this many wall neighbors.
    #[serde(default = "default_5_usize")]
    pub cave_birth_limit: usize,
    /// Minimum Chebyshev spacing between ambient population figures.
    #[serde(default = "default_2")]
    pub ambient_min_spacing: i32,
    /// Radius searched for a semantic (near-furniture) entity placement.
    #[serde(default = "default_3_i32")]
    pub semantic_radius: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_door_attempts: 10,
            cave_generations: 4,
            cave_wall_chance: 0.45,
            cave_birth_limit: 5,
            ambient_min_spacing: 2,
            semantic_radius: 3,
        }
    }
}

/// Per-turn repositioning tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Maximum greedy steps the player takes toward a target per turn.
    #[serde(default = "default_3")]
    pub player_steps: u32,
    /// Maximum greedy steps an approached NPC takes back toward the player.
    #[serde(default = "default_2_u32")]
    pub npc_steps: u32,
    /// An NPC approaches only while farther than this many tiles away.
    #[serde(default = "default_2")]
    pub approach_distance: i32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            player_steps: 3,
            npc_steps: 2,
            approach_distance: 2,
        }
    }
}

/// Scene-context reconciliation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Maximum characters kept of the scene summary.
    #[serde(default = "default_600_usize")]
    pub max_summary_chars: usize,
    /// Maximum characters kept of a per-NPC intent line.
    #[serde(default = "default_160_usize")]
    pub max_intent_chars: usize,
    /// Greedy steps a "leaving" NPC takes toward the nearest door.
    #[serde(default = "default_3")]
    pub leaving_steps: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_summary_chars: 600,
            max_intent_chars: 160,
            leaving_steps: 3,
        }
    }
}

/// World tick debounce and probability tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickConfig {
    /// Milliseconds of quiet after the last buffered action before the
    /// evaluation fires.
    #[serde(default = "default_500_u64")]
    pub debounce_ms: u64,
    /// Chance a quiet batch in a calm, occupied scene still evaluates.
    #[serde(default = "default_0_08")]
    pub liveliness_chance: f32,
    /// Chance per tick of an independent proactive NPC action.
    #[serde(default = "default_0_05")]
    pub proactive_chance: f32,
    /// Reaction texts shorter than this are treated as "no reaction".
    #[serde(default = "default_12_usize")]
    pub min_reaction_chars: usize,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            liveliness_chance: 0.08,
            proactive_chance: 0.05,
            min_reaction_chars: 12,
        }
    }
}

/// Background task supervision tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Maximum concurrently running supervised background tasks.
    #[serde(default = "default_8_usize")]
    pub max_concurrent: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self { max_concurrent: 8 }
    }
}

// ---------------------------------------------------------------------------
// serde default helpers
// ---------------------------------------------------------------------------

fn default_2() -> i32 {
    2
}
fn default_3() -> u32 {
    3
}
fn default_3_i32() -> i32 {
    3
}
fn default_4() -> u32 {
    4
}
fn default_10() -> u32 {
    10
}
fn default_2_u32() -> u32 {
    2
}
fn default_5_usize() -> usize {
    5
}
fn default_8_usize() -> usize {
    8
}
fn default_12_usize() -> usize {
    12
}
fn default_160_usize() -> usize {
    160
}
fn default_600_usize() -> usize {
    600
}
fn default_500_u64() -> u64 {
    500
}
fn default_0_45() -> f32 {
    0.45
}
fn default_0_08() -> f32 {
    0.08
}
fn default_0_05() -> f32 {
    0.05
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_design_values() {
        let cfg = PlotlineConfig::default();
        assert_eq!(cfg.tick.debounce_ms, 500);
        assert_eq!(cfg.movement.player_steps, 3);
        assert_eq!(cfg.movement.npc_steps, 2);
        assert_eq!(cfg.grid.max_door_attempts, 10);
        assert_eq!(cfg.scene.leaving_steps, 3);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = PlotlineConfig::from_toml(
            r#"
            [tick]
            debounce_ms = 250

            [grid]
            cave_generations = 6
            "#,
        )
        .expect("valid toml");
        assert_eq!(cfg.tick.debounce_ms, 250);
        assert_eq!(cfg.grid.cave_generations, 6);
        // Untouched sections and fields keep their defaults.
        assert_eq!(cfg.grid.semantic_radius, 3);
        assert_eq!(cfg.grid.ambient_min_spacing, 2);
        assert_eq!(cfg.movement.player_steps, 3);
        assert!((cfg.tick.liveliness_chance - 0.08).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = PlotlineConfig::from_toml("debounce = [").expect_err("invalid toml");
        assert!(matches!(err, crate::CoreError::Config(_)));
    }

    #[test]
    fn config_loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("plotline.toml");
        std::fs::write(&path, "[movement]\nplayer_steps = 5\n").expect("write");
        let cfg = PlotlineConfig::from_file(&path).expect("load");
        assert_eq!(cfg.movement.player_steps, 5);
    }
}
