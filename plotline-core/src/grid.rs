//! Tile vocabulary and the 2D grid container.
//!
//! [`TileKind`] is the fixed legend shared with the rendering layer — the
//! integer values are part of the wire contract and must not be reordered.
//! [`Grid`] is a plain width × height array of tiles plus the parameters it
//! was generated with, so a client can re-render it deterministically.

use serde::{Deserialize, Serialize};

use crate::types::{Direction, GridPos, PopulationDensity, SettlementSize};

// ---------------------------------------------------------------------------
// Tile Legend
// ---------------------------------------------------------------------------

/// The fixed tile legend. Serialized as its integer value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[serde(into = "u8", try_from = "u8")]
pub enum TileKind {
    /// Bare walkable floor.
    #[default]
    Floor = 0,
    /// Solid wall.
    Wall = 1,
    /// Door to another location.
    Door = 2,
    /// Open water.
    Water = 3,
    /// Table.
    Table = 4,
    /// Chair.
    Chair = 5,
    /// Service counter.
    Counter = 6,
    /// Wall shelf.
    Shelf = 7,
    /// Bed.
    Bed = 8,
    /// Altar.
    Altar = 9,
    /// Structural pillar.
    Pillar = 10,
    /// Market stall.
    Stall = 11,
    /// Barrel.
    Barrel = 12,
    /// Crate.
    Crate = 13,
    /// Carpet (walkable).
    Carpet = 14,
    /// Throne.
    Throne = 15,
    /// Fence.
    Fence = 16,
    /// Pier planking (walkable).
    Pier = 17,
    /// Rubble (walkable, slow).
    Rubble = 18,
    /// Stairs up or down (walkable).
    Stairs = 19,
    /// Wall torch.
    Torch = 20,
    /// Fireplace.
    Fireplace = 21,
    /// Weapon rack.
    WeaponRack = 22,
    /// Fountain.
    Fountain = 23,
    /// Grass (walkable).
    Grass = 24,
}

impl TileKind {
    /// The fixed walkable subset of the legend.
    #[must_use]
    pub fn is_walkable(&self) -> bool {
        matches!(
            self,
            Self::Floor
                | Self::Door
                | Self::Carpet
                | Self::Grass
                | Self::Stairs
                | Self::Rubble
                | Self::Pier
        )
    }
}

impl From<TileKind> for u8 {
    fn from(t: TileKind) -> Self {
        t as Self
    }
}

impl TryFrom<u8> for TileKind {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Floor),
            1 => Ok(Self::Wall),
            2 => Ok(Self::Door),
            3 => Ok(Self::Water),
            4 => Ok(Self::Table),
            5 => Ok(Self::Chair),
            6 => Ok(Self::Counter),
            7 => Ok(Self::Shelf),
            8 => Ok(Self::Bed),
            9 => Ok(Self::Altar),
            10 => Ok(Self::Pillar),
            11 => Ok(Self::Stall),
            12 => Ok(Self::Barrel),
            13 => Ok(Self::Crate),
            14 => Ok(Self::Carpet),
            15 => Ok(Self::Throne),
            16 => Ok(Self::Fence),
            17 => Ok(Self::Pier),
            18 => Ok(Self::Rubble),
            19 => Ok(Self::Stairs),
            20 => Ok(Self::Torch),
            21 => Ok(Self::Fireplace),
            22 => Ok(Self::WeaponRack),
            23 => Ok(Self::Fountain),
            24 => Ok(Self::Grass),
            other => Err(format!("unknown tile value: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Generation Parameters
// ---------------------------------------------------------------------------

/// Tunable knobs recorded alongside a generated grid.
///
/// Callers may supply any subset; the synthesizer fills in the rest and
/// records the effective values on the grid for reproducible re-rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenParams {
    /// Structural condition, 0.0 (ruined) to 1.0 (pristine).
    pub condition: f32,
    /// Wealth of the place, 0.0 (destitute) to 1.0 (opulent).
    pub wealth: f32,
    /// How much loose junk to scatter, 0.0 to 1.0.
    pub clutter: f32,
    /// Light level, 0.0 (pitch dark) to 1.0 (bright).
    pub lighting: f32,
    /// Explicit width, clamped into the type×size range if set.
    pub width: Option<u32>,
    /// Explicit height, clamped into the type×size range if set.
    pub height: Option<u32>,
    /// Settlement size class for the dimension table.
    pub size: SettlementSize,
    /// Ambient population density.
    pub density: PopulationDensity,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            condition: 0.7,
            wealth: 0.5,
            clutter: 0.3,
            lighting: 0.7,
            width: None,
            height: None,
            size: SettlementSize::default(),
            density: PopulationDensity::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Door
// ---------------------------------------------------------------------------

/// A door (or stair) tile linking a grid edge to a logical connection.
///
/// Invariant: a door always has at least one adjacent walkable interior
/// tile; the synthesizer forces the neighboring tile walkable on placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    /// Tile position of the door.
    pub pos: GridPos,
    /// Logical direction of the connection it serves.
    pub direction: Direction,
    /// Name of the location this door leads to.
    pub leads_to: String,
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// A width × height tile grid, generated once per location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Row-major tile array, `width * height` entries.
    pub tiles: Vec<TileKind>,
    /// Effective parameters the grid was generated with.
    pub params: GenParams,
}

impl Grid {
    /// Create a grid filled with a single tile kind.
    #[must_use]
    pub fn filled(width: u32, height: u32, fill: TileKind, params: GenParams) -> Self {
        Self {
            width,
            height,
            tiles: vec![fill; (width * height) as usize],
            params,
        }
    }

    /// Whether a position lies on the grid.
    #[must_use]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Tile at `pos`, or `None` out of bounds.
    #[must_use]
    pub fn get(&self, pos: GridPos) -> Option<TileKind> {
        if self.in_bounds(pos) {
            Some(self.tiles[(pos.y as u32 * self.width + pos.x as u32) as usize])
        } else {
            None
        }
    }

    /// Set the tile at `pos`; out-of-bounds writes are ignored.
    pub fn set(&mut self, pos: GridPos, tile: TileKind) {
        if self.in_bounds(pos) {
            self.tiles[(pos.y as u32 * self.width + pos.x as u32) as usize] = tile;
        }
    }

    /// Whether `pos` is on the grid and walkable.
    #[must_use]
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.get(pos).is_some_and(|t| t.is_walkable())
    }

    /// Center tile of the grid.
    #[must_use]
    pub fn center(&self) -> GridPos {
        GridPos::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// Iterate every position on the grid in row-major order.
    pub fn iter_positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..h).flat_map(move |y| (0..w).map(move |x| GridPos::new(x, y)))
    }

    /// All walkable positions, row-major.
    #[must_use]
    pub fn walkable_positions(&self) -> Vec<GridPos> {
        self.iter_positions()
            .filter(|&p| self.is_walkable(p))
            .collect()
    }

    /// Count of tiles equal to `kind`.
    #[must_use]
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|&&t| t == kind).count()
    }
}
