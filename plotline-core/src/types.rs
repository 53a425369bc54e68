//! Core type definitions for the Plotline simulation core.
//!
//! Everything here is pure data: the closed vocabularies (directions,
//! tension levels, NPC statuses, location taxonomy) and the records that
//! flow between the classifier, the grid services, and the scene state.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for an active play session (one running plot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a location within a session's world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub Uuid);

impl LocationId {
    /// Create a new random location ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A tile coordinate on a location's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    /// Column, 0-based from the west edge.
    pub x: i32,
    /// Row, 0-based from the north edge.
    pub y: i32,
}

impl GridPos {
    /// Create a position.
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance — the number of single-tile steps
    /// (diagonals allowed) between two positions.
    #[must_use]
    pub fn distance(&self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Whether `other` is one of the eight surrounding tiles (or equal).
    #[must_use]
    pub fn is_adjacent(&self, other: Self) -> bool {
        self.distance(other) <= 1
    }

    /// The eight surrounding tiles, unordered and unbounded.
    #[must_use]
    pub fn neighbors(&self) -> [Self; 8] {
        let Self { x, y } = *self;
        [
            Self::new(x - 1, y - 1),
            Self::new(x, y - 1),
            Self::new(x + 1, y - 1),
            Self::new(x - 1, y),
            Self::new(x + 1, y),
            Self::new(x - 1, y + 1),
            Self::new(x, y + 1),
            Self::new(x + 1, y + 1),
        ]
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Direction Vocabulary
// ---------------------------------------------------------------------------

/// The closed direction vocabulary used for doors, connections, and movement.
///
/// Any externally supplied direction string must be normalized through
/// [`Direction::parse`] before being stored or compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward the top edge of the grid.
    North,
    /// Toward the bottom edge of the grid.
    South,
    /// Toward the right edge of the grid.
    East,
    /// Toward the left edge of the grid.
    West,
    /// Diagonal: up-right.
    Northeast,
    /// Diagonal: up-left.
    Northwest,
    /// Diagonal: down-right.
    Southeast,
    /// Diagonal: down-left.
    Southwest,
    /// Ascending (stairs).
    Up,
    /// Descending (stairs).
    Down,
    /// Entering an enclosed space.
    Inside,
    /// Leaving an enclosed space.
    Outside,
}

impl Direction {
    /// All twelve directions, in canonical order.
    pub const ALL: [Self; 12] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::Northeast,
        Self::Northwest,
        Self::Southeast,
        Self::Southwest,
        Self::Up,
        Self::Down,
        Self::Inside,
        Self::Outside,
    ];

    /// Normalize an external direction string to the closed vocabulary.
    ///
    /// Accepts canonical names and the usual short forms ("n", "sw", …),
    /// case- and whitespace-insensitively. Returns `None` for anything else.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "north" | "n" => Some(Self::North),
            "south" | "s" => Some(Self::South),
            "east" | "e" => Some(Self::East),
            "west" | "w" => Some(Self::West),
            "northeast" | "north-east" | "ne" => Some(Self::Northeast),
            "northwest" | "north-west" | "nw" => Some(Self::Northwest),
            "southeast" | "south-east" | "se" => Some(Self::Southeast),
            "southwest" | "south-west" | "sw" => Some(Self::Southwest),
            "up" | "upstairs" => Some(Self::Up),
            "down" | "downstairs" => Some(Self::Down),
            "inside" | "in" => Some(Self::Inside),
            "outside" | "out" => Some(Self::Outside),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Northeast => "northeast",
            Self::Northwest => "northwest",
            Self::Southeast => "southeast",
            Self::Southwest => "southwest",
            Self::Up => "up",
            Self::Down => "down",
            Self::Inside => "inside",
            Self::Outside => "outside",
        }
    }

    /// Unit grid delta for the eight compass directions.
    ///
    /// `up`/`down`/`inside`/`outside` have no planar delta and return `None`.
    #[must_use]
    pub fn delta(&self) -> Option<(i32, i32)> {
        match self {
            Self::North => Some((0, -1)),
            Self::South => Some((0, 1)),
            Self::East => Some((1, 0)),
            Self::West => Some((-1, 0)),
            Self::Northeast => Some((1, -1)),
            Self::Northwest => Some((-1, -1)),
            Self::Southeast => Some((1, 1)),
            Self::Southwest => Some((-1, 1)),
            _ => None,
        }
    }

    /// Whether this direction changes floors rather than crossing the grid.
    #[must_use]
    pub fn is_vertical(&self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tension
// ---------------------------------------------------------------------------

/// Scene-level danger indicator, strictly ordered from calm to critical.
///
/// Tension influences classifier tier promotion and NPC behavior. The
/// ordering is load-bearing: comparisons like `tension >= Tense` appear
/// throughout the core.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tension {
    /// Nothing notable is happening.
    #[default]
    Calm,
    /// Something is slightly off.
    Cautious,
    /// Open unease; violence is plausible.
    Tense,
    /// Someone present means harm.
    Hostile,
    /// Violence or catastrophe is underway.
    Critical,
}

impl Tension {
    /// Parse an external tension string, falling back to `fallback` for
    /// anything outside the closed set.
    #[must_use]
    pub fn parse_or(raw: &str, fallback: Self) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "calm" => Self::Calm,
            "cautious" => Self::Cautious,
            "tense" => Self::Tense,
            "hostile" => Self::Hostile,
            "critical" => Self::Critical,
            _ => fallback,
        }
    }

    /// Anything above calm counts as elevated for tier promotion.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        *self > Self::Calm
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Cautious => "cautious",
            Self::Tense => "tense",
            Self::Hostile => "hostile",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Tension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// NPC Scene State
// ---------------------------------------------------------------------------

/// What a present NPC is currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NpcStatus {
    /// Actively interacting with the player.
    Engaged,
    /// Present and aware, not interacting.
    #[default]
    Observing,
    /// Heading for an exit.
    Leaving,
    /// Actively threatening.
    Hostile,
    /// Down but alive.
    Unconscious,
    /// Has run from the scene.
    Fled,
    /// Dead.
    Dead,
}

impl NpcStatus {
    /// Parse an external status string, defaulting to `Observing`.
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "engaged" => Self::Engaged,
            "observing" => Self::Observing,
            "leaving" => Self::Leaving,
            "hostile" => Self::Hostile,
            "unconscious" => Self::Unconscious,
            "fled" => Self::Fled,
            "dead" => Self::Dead,
            _ => Self::Observing,
        }
    }
}

/// How a present NPC feels about the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NpcAttitude {
    /// Well-disposed.
    Friendly,
    /// Indifferent.
    #[default]
    Neutral,
    /// Suspicious, keeping distance.
    Wary,
    /// Openly antagonistic.
    Hostile,
    /// Too frightened to act normally.
    Terrified,
}

impl NpcAttitude {
    /// Parse an external attitude string, defaulting to `Neutral`.
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "friendly" => Self::Friendly,
            "neutral" => Self::Neutral,
            "wary" => Self::Wary,
            "hostile" => Self::Hostile,
            "terrified" => Self::Terrified,
            _ => Self::Neutral,
        }
    }
}

/// A named NPC currently present in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentNpc {
    /// Display name, also the key into the location's position map.
    pub name: String,
    /// Current activity.
    pub status: NpcStatus,
    /// Disposition toward the player.
    pub attitude: NpcAttitude,
    /// One-line description of what the NPC wants right now.
    pub intent: String,
}

/// The shared scene-state record for a session.
///
/// Replaced wholesale by the full pipeline each turn; the fast path never
/// writes it directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneContext {
    /// Free-text summary of the current scene, length-bounded.
    pub summary: String,
    /// Current danger level.
    pub tension: Tension,
    /// NPCs present in the scene.
    pub present: Vec<PresentNpc>,
    /// Ongoing events ("the fire is spreading").
    pub active_events: Vec<String>,
    /// Turn counter, incremented on every reconciliation.
    pub turn: u32,
}

impl SceneContext {
    /// Look up a present NPC by name (case-insensitive).
    #[must_use]
    pub fn npc(&self, name: &str) -> Option<&PresentNpc> {
        self.present
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }
}

// ---------------------------------------------------------------------------
// Location Taxonomy
// ---------------------------------------------------------------------------

/// The fixed set of location types driving grid synthesis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    /// Settlement entrance.
    Gate,
    /// Open-air market.
    Market,
    /// Tavern or inn common room.
    Tavern,
    /// Place of worship.
    Temple,
    /// Public square.
    Plaza,
    /// A single shop interior.
    Shop,
    /// A private home.
    Residence,
    /// A notable outdoor feature.
    Landmark,
    /// Underground complex.
    Dungeon,
    /// A whole neighborhood.
    District,
    /// Waterfront and piers.
    Docks,
    /// Guard barracks.
    Barracks,
    /// Seat of power.
    Palace,
    /// Anything else.
    #[default]
    Other,
}

impl LocationType {
    /// Parse an external type string, defaulting to `Other`.
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "gate" => Self::Gate,
            "market" => Self::Market,
            "tavern" | "inn" => Self::Tavern,
            "temple" | "shrine" => Self::Temple,
            "plaza" | "square" => Self::Plaza,
            "shop" | "store" => Self::Shop,
            "residence" | "house" | "home" => Self::Residence,
            "landmark" => Self::Landmark,
            "dungeon" | "cave" | "crypt" => Self::Dungeon,
            "district" => Self::District,
            "docks" | "harbor" | "port" => Self::Docks,
            "barracks" => Self::Barracks,
            "palace" | "keep" | "castle" => Self::Palace,
            _ => Self::Other,
        }
    }
}

/// Settlement size class, one axis of the grid dimension table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementSize {
    /// Hamlet or outpost.
    Small,
    /// Village or small town.
    #[default]
    Medium,
    /// Town or city.
    Large,
}

/// How busy a location is, driving ambient population counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopulationDensity {
    /// Nobody else around.
    Isolated,
    /// A handful of background figures.
    #[default]
    Sparse,
    /// Comfortably busy.
    Populated,
    /// Shoulder to shoulder.
    Crowded,
}

impl PopulationDensity {
    /// Inclusive [min, max] count of unnamed ambient figures to scatter.
    #[must_use]
    pub fn ambient_range(&self) -> (usize, usize) {
        match self {
            Self::Isolated => (0, 0),
            Self::Sparse => (1, 2),
            Self::Populated => (4, 6),
            Self::Crowded => (8, 12),
        }
    }
}

// ---------------------------------------------------------------------------
// Location Records
// ---------------------------------------------------------------------------

/// A logical exit from one location toward another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Normalized direction of travel.
    pub direction: Direction,
    /// Name of the destination location.
    pub target: String,
    /// Travel distance in abstract units (narrative flavor only).
    pub distance: u32,
}

/// A simmering conflict anchored to a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimmeringTension {
    /// What the conflict is about.
    pub description: String,
    /// Severity from 0.0 (gossip) to 1.0 (about to explode).
    pub severity: f32,
    /// Names of the involved parties.
    pub involved: Vec<String>,
}

/// A location in the session's world.
///
/// The grid is synthesized exactly once, on first visit; `grid: None` means
/// not yet generated (or a previous generation failed and will be retried).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Stable identity.
    pub id: LocationId,
    /// Display name, unique within a session.
    pub name: String,
    /// Type driving grid synthesis.
    pub kind: LocationType,
    /// Whether the player has discovered this location.
    pub discovered: bool,
    /// Logical exits.
    pub connections: Vec<Connection>,
    /// The synthesized tile grid, absent until first visit.
    pub grid: Option<crate::grid::Grid>,
    /// Doors placed on the grid, one per connection (plus a default).
    pub doors: Vec<crate::grid::Door>,
    /// Tiles reserved for unnamed ambient population.
    pub ambient_slots: Vec<GridPos>,
    /// Simmering conflicts at this location.
    pub tensions: Vec<SimmeringTension>,
    /// Grid positions of named entities, lazily backfilled.
    pub positions: std::collections::HashMap<String, GridPos>,
    /// Suggested player spawn tile, set at synthesis.
    pub player_start: Option<GridPos>,
}

impl Location {
    /// Create an undiscovered, ungenerated location.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: LocationType) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            kind,
            discovered: false,
            connections: Vec::new(),
            grid: None,
            doors: Vec::new(),
            ambient_slots: Vec::new(),
            tensions: Vec::new(),
            positions: std::collections::HashMap::new(),
            player_start: None,
        }
    }

    /// Whether the grid has been synthesized. Once true it stays true; the
    /// grid is never regenerated for the same location.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.grid.is_some()
    }

    /// The set of tiles currently claimed by named entities, optionally
    /// including the player's position.
    #[must_use]
    pub fn occupancy(&self, player: Option<GridPos>) -> std::collections::HashSet<GridPos> {
        let mut occupied: std::collections::HashSet<GridPos> =
            self.positions.values().copied().collect();
        if let Some(p) = player {
            occupied.insert(p);
        }
        occupied
    }
}

// ---------------------------------------------------------------------------
// Action Classification
// ---------------------------------------------------------------------------

/// How expensive a classified action's response is permitted to be.
///
/// Ordered: promotion raises a tier, never lowers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionTier {
    /// Tier 0 — instant, fully templated.
    Instant,
    /// Tier 1 — cheap, short generative.
    Quick,
    /// Tier 2 — full generative with compressed context.
    Contextual,
    /// Tier 3 — the full pipeline.
    Full,
}

impl ActionTier {
    /// Numeric tier, 0–3.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Instant => 0,
            Self::Quick => 1,
            Self::Contextual => 2,
            Self::Full => 3,
        }
    }

    /// Raise to at least `floor`. Promotion is mandatory, demotion never
    /// happens.
    #[must_use]
    pub fn promote_to(self, floor: Self) -> Self {
        self.max(floor)
    }
}

impl fmt::Display for ActionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// The action-type tag attached to a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Intra-location repositioning.
    GridMove,
    /// Survey the scene.
    Look,
    /// Inspect a named entity.
    Examine,
    /// List the exits.
    CheckExits,
    /// Rest a while.
    Rest,
    /// Do nothing.
    Wait,
    /// A wordless gesture.
    Gesture,
    /// Greet a visible NPC.
    Greeting,
    /// Ask a visible NPC something simple.
    Question,
    /// Say goodbye.
    Farewell,
    /// Eat or drink.
    Consume,
    /// Poke at a simple object.
    Interact,
    /// Listen in on others.
    Eavesdrop,
    /// Pure roleplay color with no mechanical effect.
    Flavor,
    /// Anything requiring a skill check.
    SkillAction,
    /// Substantive conversation.
    Dialogue,
    /// Unrecognized input — full pipeline.
    Default,
}

impl ActionKind {
    /// Snake-case tag, as surfaced to the event stream.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GridMove => "grid_move",
            Self::Look => "look",
            Self::Examine => "examine",
            Self::CheckExits => "check_exits",
            Self::Rest => "rest",
            Self::Wait => "wait",
            Self::Gesture => "gesture",
            Self::Greeting => "greeting",
            Self::Question => "question",
            Self::Farewell => "farewell",
            Self::Consume => "consume",
            Self::Interact => "interact",
            Self::Eavesdrop => "eavesdrop",
            Self::Flavor => "flavor",
            Self::SkillAction => "skill_action",
            Self::Dialogue => "dialogue",
            Self::Default => "default",
        }
    }

    /// "Quiet" actions never warrant a world reaction on their own.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        matches!(
            self,
            Self::GridMove
                | Self::Wait
                | Self::Gesture
                | Self::Flavor
                | Self::Look
                | Self::CheckExits
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the player is currently doing at a coarse level. Combat mandates a
/// classification tier floor of 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// Normal play.
    #[default]
    Exploring,
    /// Mid-fight.
    Combat,
}

/// The result of classifying one turn of player input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Response cost tier after promotion.
    pub tier: ActionTier,
    /// Action-type tag.
    pub action: ActionKind,
    /// Parameter bag (direction, target name, click coordinates, …).
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Classification {
    /// The safe default: the full pipeline handles whatever this was.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            tier: ActionTier::Full,
            action: ActionKind::Default,
            params: serde_json::Map::new(),
        }
    }
}
