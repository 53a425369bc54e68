//! Grid Synthesizer — builds a location's tile grid on first visit.
//!
//! Dispatches to one of six category generators by location type, places a
//! door per logical connection, seats named entities near type-appropriate
//! furniture, and scatters unnamed ambient population. Generation happens
//! at most once per location: the `generated` state is checked before any
//! work, and a failed generation leaves the location untouched so the next
//! visit retries.
//!
//! All randomness flows through the caller-supplied `Rng` so tests can
//! inject a fixed seed.

mod cave;
mod rooms;

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::config::GridConfig;
use crate::error::{CoreError, Result};
use crate::grid::{Door, GenParams, Grid, TileKind};
use crate::types::{Connection, Direction, GridPos, Location, LocationType, SettlementSize};

// ---------------------------------------------------------------------------
// Dimension Table
// ---------------------------------------------------------------------------

/// Inclusive [min, max] width and height for a location type at a
/// settlement size.
#[must_use]
pub fn dimension_range(kind: LocationType, size: SettlementSize) -> ((u32, u32), (u32, u32)) {
    // Base ranges at medium size.
    let (wmin, wmax, hmin, hmax) = match kind {
        LocationType::Gate => (10, 14, 8, 12),
        LocationType::Market => (14, 22, 12, 18),
        LocationType::Tavern => (10, 16, 8, 12),
        LocationType::Temple => (10, 16, 10, 16),
        LocationType::Plaza => (14, 22, 14, 20),
        LocationType::Shop => (8, 12, 6, 10),
        LocationType::Residence => (6, 10, 6, 10),
        LocationType::Landmark => (12, 18, 10, 16),
        LocationType::Dungeon => (16, 26, 12, 20),
        LocationType::District => (18, 28, 14, 22),
        LocationType::Docks => (14, 22, 10, 16),
        LocationType::Barracks => (10, 16, 8, 12),
        LocationType::Palace => (14, 22, 12, 18),
        LocationType::Other => (8, 14, 8, 12),
    };
    let scale = |v: u32| -> u32 {
        let scaled = match size {
            SettlementSize::Small => v * 4 / 5,
            SettlementSize::Medium => v,
            SettlementSize::Large => v * 5 / 4,
        };
        scaled.max(6)
    };
    (
        (scale(wmin), scale(wmax)),
        (scale(hmin), scale(hmax)),
    )
}

/// The six generator categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Interior,
    Open,
    Fortification,
    Underground,
    Waterfront,
    Religious,
}

fn category(kind: LocationType) -> Category {
    match kind {
        LocationType::Gate | LocationType::Barracks => Category::Fortification,
        LocationType::Dungeon => Category::Underground,
        LocationType::Docks => Category::Waterfront,
        LocationType::Temple => Category::Religious,
        LocationType::Market
        | LocationType::Plaza
        | LocationType::District
        | LocationType::Landmark => Category::Open,
        _ => Category::Interior,
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Everything one synthesis run produces.
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// The finished tile grid.
    pub grid: Grid,
    /// Doors placed for the location's connections.
    pub doors: Vec<Door>,
    /// Tiles reserved for unnamed ambient population.
    pub ambient_slots: Vec<GridPos>,
    /// Seating of the named entities that were passed in.
    pub positions: HashMap<String, GridPos>,
    /// Suggested player spawn tile.
    pub player_start: GridPos,
}

/// Builds grids for locations on first visit.
#[derive(Debug, Clone)]
pub struct GridSynthesizer {
    cfg: GridConfig,
}

impl GridSynthesizer {
    /// Create a synthesizer with the given tuning.
    #[must_use]
    pub fn new(cfg: GridConfig) -> Self {
        Self { cfg }
    }

    /// Generate the location's grid if it has none yet.
    ///
    /// Returns `true` when a grid was produced on this call. Failures are
    /// logged and leave the location ungenerated for retry on the next
    /// visit — never fatal to the turn. Exclusive access to the location
    /// makes the generate-once check race-free in process.
    pub fn ensure_generated<R: Rng>(
        &self,
        loc: &mut Location,
        params: GenParams,
        named: &[String],
        rng: &mut R,
    ) -> bool {
        if loc.is_generated() {
            return false;
        }
        match self.synthesize(loc.kind, &loc.connections, named, params, rng) {
            Ok(s) => {
                loc.grid = Some(s.grid);
                loc.doors = s.doors;
                loc.ambient_slots = s.ambient_slots;
                loc.player_start = Some(s.player_start);
                for (name, pos) in s.positions {
                    loc.positions.entry(name).or_insert(pos);
                }
                true
            }
            Err(e) => {
                warn!(location = %loc.name, error = %e, "grid generation failed, will retry on next visit");
                false
            }
        }
    }

    /// Run one full synthesis. Pure with respect to the supplied RNG.
    ///
    /// # Errors
    /// Returns `CoreError::Generation` when the dimension table yields a
    /// degenerate grid (should not happen for any table entry).
    pub fn synthesize<R: Rng>(
        &self,
        kind: LocationType,
        connections: &[Connection],
        named: &[String],
        params: GenParams,
        rng: &mut R,
    ) -> Result<Synthesis> {
        let ((wmin, wmax), (hmin, hmax)) = dimension_range(kind, params.size);
        let width = match params.width {
            Some(w) => w.clamp(wmin, wmax),
            None => rng.gen_range(wmin..=wmax),
        };
        let height = match params.height {
            Some(h) => h.clamp(hmin, hmax),
            None => rng.gen_range(hmin..=hmax),
        };
        if width < 5 || height < 5 {
            return Err(CoreError::Generation {
                location: format!("{kind:?}"),
                reason: format!("degenerate dimensions {width}x{height}"),
            });
        }

        let cat = category(kind);
        let fill = if cat == Category::Underground {
            TileKind::Wall
        } else {
            TileKind::Floor
        };
        let mut grid = Grid::filled(width, height, fill, params.clone());

        match cat {
            Category::Interior => rooms::interior(&mut grid, kind, &params, rng),
            Category::Open => rooms::open_space(&mut grid, &params, rng),
            Category::Fortification => rooms::fortification(&mut grid),
            Category::Underground => cave::carve(&mut grid, &self.cfg, rng),
            Category::Waterfront => rooms::waterfront(&mut grid, &params, rng),
            Category::Religious => rooms::religious(&mut grid),
        }

        let doors = self.place_doors(&mut grid, connections, rng);
        let ambient_slots = self.place_ambient(&grid, &doors, &params, rng);
        let positions = self.place_named(&grid, &doors, kind, named, &ambient_slots, rng);
        let player_start = pick_player_start(&grid, &doors, &positions, &ambient_slots);

        Ok(Synthesis {
            grid,
            doors,
            ambient_slots,
            positions,
            player_start,
        })
    }

    // -----------------------------------------------------------------------
    // Doors
    // -----------------------------------------------------------------------

    fn place_doors<R: Rng>(
        &self,
        grid: &mut Grid,
        connections: &[Connection],
        rng: &mut R,
    ) -> Vec<Door> {
        let mut doors: Vec<Door> = Vec::new();

        if connections.is_empty() {
            // Always at least one way out: a default door on the south edge.
            if let Some(pos) = self.pick_edge_tile(grid, Direction::South, &doors, rng) {
                commit_door(grid, pos, Direction::South);
                doors.push(Door {
                    pos,
                    direction: Direction::South,
                    leads_to: "outside".to_string(),
                });
            }
            return doors;
        }

        for conn in connections {
            if conn.direction.is_vertical() {
                if let Some(pos) = self.pick_stair_tile(grid, &doors, rng) {
                    grid.set(pos, TileKind::Stairs);
                    doors.push(Door {
                        pos,
                        direction: conn.direction,
                        leads_to: conn.target.clone(),
                    });
                } else {
                    debug!(target = %conn.target, "no stair tile found, skipping connection");
                }
                continue;
            }

            let edge_dir = planar_edge(conn.direction);
            if let Some(pos) = self.pick_edge_tile(grid, edge_dir, &doors, rng) {
                commit_door(grid, pos, edge_dir);
                doors.push(Door {
                    pos,
                    direction: conn.direction,
                    leads_to: conn.target.clone(),
                });
            } else {
                debug!(target = %conn.target, "door placement exhausted retries, skipping");
            }
        }
        doors
    }

    /// An edge tile for a door, retried on collision with already-placed
    /// doors up to the configured attempt bound.
    fn pick_edge_tile<R: Rng>(
        &self,
        grid: &Grid,
        dir: Direction,
        doors: &[Door],
        rng: &mut R,
    ) -> Option<GridPos> {
        let (w, h) = (grid.width as i32, grid.height as i32);
        for _ in 0..self.cfg.max_door_attempts {
            let pos = match dir {
                Direction::North => GridPos::new(rng.gen_range(1..w - 1), 0),
                Direction::South => GridPos::new(rng.gen_range(1..w - 1), h - 1),
                Direction::East => GridPos::new(w - 1, rng.gen_range(1..h - 1)),
                Direction::West => GridPos::new(0, rng.gen_range(1..h - 1)),
                // Diagonals get a deterministic corner-adjacent spot.
                Direction::Northeast => GridPos::new(w - 2, 0),
                Direction::Northwest => GridPos::new(1, 0),
                Direction::Southeast => GridPos::new(w - 2, h - 1),
                Direction::Southwest => GridPos::new(1, h - 1),
                _ => return None,
            };
            if !doors.iter().any(|d| d.pos == pos) {
                return Some(pos);
            }
        }
        None
    }

    fn pick_stair_tile<R: Rng>(&self, grid: &Grid, doors: &[Door], rng: &mut R) -> Option<GridPos> {
        let (w, h) = (grid.width as i32, grid.height as i32);
        for _ in 0..self.cfg.max_door_attempts * 3 {
            let pos = GridPos::new(rng.gen_range(1..w - 1), rng.gen_range(1..h - 1));
            if grid.is_walkable(pos) && !doors.iter().any(|d| d.pos == pos) {
                return Some(pos);
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Population
    // -----------------------------------------------------------------------

    /// Scatter ambient slots on walkable tiles with minimum spacing.
    fn place_ambient<R: Rng>(
        &self,
        grid: &Grid,
        doors: &[Door],
        params: &GenParams,
        rng: &mut R,
    ) -> Vec<GridPos> {
        let (min, max) = params.density.ambient_range();
        if max == 0 {
            return Vec::new();
        }
        let count = rng.gen_range(min..=max);
        let door_tiles: HashSet<GridPos> = doors.iter().map(|d| d.pos).collect();
        let spacing = self.cfg.ambient_min_spacing;

        let candidates: Vec<GridPos> = grid
            .walkable_positions()
            .into_iter()
            .filter(|p| !door_tiles.contains(p))
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut slots: Vec<GridPos> = Vec::with_capacity(count);
        for _ in 0..count * 20 {
            if slots.len() == count {
                break;
            }
            if let Some(&pos) = candidates.choose(rng)
                && slots.iter().all(|s| s.distance(pos) >= spacing)
            {
                slots.push(pos);
            }
        }
        slots
    }

    /// Seat named entities near type-appropriate furniture, falling back
    /// to any free walkable tile.
    fn place_named<R: Rng>(
        &self,
        grid: &Grid,
        doors: &[Door],
        kind: LocationType,
        named: &[String],
        ambient_slots: &[GridPos],
        rng: &mut R,
    ) -> HashMap<String, GridPos> {
        let anchor_kind = match kind {
            LocationType::Tavern | LocationType::Shop => Some(TileKind::Counter),
            LocationType::Temple => Some(TileKind::Altar),
            LocationType::Gate => Some(TileKind::Door),
            LocationType::Barracks => Some(TileKind::WeaponRack),
            LocationType::Palace => Some(TileKind::Throne),
            _ => None,
        };
        let anchors: Vec<GridPos> = match anchor_kind {
            Some(t) => grid
                .iter_positions()
                .filter(|&p| grid.get(p) == Some(t))
                .collect(),
            None => Vec::new(),
        };

        let mut occupied: HashSet<GridPos> = ambient_slots.iter().copied().collect();
        occupied.extend(doors.iter().map(|d| d.pos));
        let mut positions = HashMap::new();

        for name in named {
            let near: Vec<GridPos> = grid
                .walkable_positions()
                .into_iter()
                .filter(|p| !occupied.contains(p))
                .filter(|p| {
                    anchors
                        .iter()
                        .any(|a| a.distance(*p) <= self.cfg.semantic_radius)
                })
                .collect();
            let pick = near.choose(rng).copied().or_else(|| {
                grid.walkable_positions()
                    .into_iter()
                    .filter(|p| !occupied.contains(p))
                    .collect::<Vec<_>>()
                    .choose(rng)
                    .copied()
            });
            if let Some(pos) = pick {
                occupied.insert(pos);
                positions.insert(name.clone(), pos);
            }
        }
        positions
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

fn planar_edge(dir: Direction) -> Direction {
    match dir {
        // Enclosed-space directions behave like the south (entrance) edge.
        Direction::Inside | Direction::Outside => Direction::South,
        other => other,
    }
}

/// Write a door tile and force its interior neighbor walkable so the door
/// is always reachable.
fn commit_door(grid: &mut Grid, pos: GridPos, edge: Direction) {
    grid.set(pos, TileKind::Door);
    let (w, h) = (grid.width as i32, grid.height as i32);
    let interior = match edge {
        Direction::North | Direction::Northeast | Direction::Northwest => {
            GridPos::new(pos.x.clamp(1, w - 2), 1)
        }
        Direction::South | Direction::Southeast | Direction::Southwest => {
            GridPos::new(pos.x.clamp(1, w - 2), h - 2)
        }
        Direction::East => GridPos::new(w - 2, pos.y.clamp(1, h - 2)),
        Direction::West => GridPos::new(1, pos.y.clamp(1, h - 2)),
        _ => return,
    };
    if !grid.is_walkable(interior) {
        grid.set(interior, TileKind::Floor);
    }
}

/// Player spawn: adjacent to the primary (south, else first) door biased
/// toward the room interior, else any free edge-adjacent walkable tile,
/// else the grid center.
fn pick_player_start(
    grid: &Grid,
    doors: &[Door],
    positions: &HashMap<String, GridPos>,
    ambient_slots: &[GridPos],
) -> GridPos {
    let mut occupied: HashSet<GridPos> = positions.values().copied().collect();
    occupied.extend(ambient_slots.iter().copied());

    let primary = doors
        .iter()
        .find(|d| d.direction == Direction::South)
        .or_else(|| doors.first());

    if let Some(door) = primary {
        let center = grid.center();
        let mut candidates: Vec<GridPos> = door
            .pos
            .neighbors()
            .into_iter()
            .filter(|p| grid.is_walkable(*p) && !occupied.contains(p))
            .collect();
        candidates.sort_by_key(|p| p.distance(center));
        if let Some(&pos) = candidates.first() {
            return pos;
        }
    }

    let (w, h) = (grid.width as i32, grid.height as i32);
    let on_fringe = |p: &GridPos| p.x <= 1 || p.y <= 1 || p.x >= w - 2 || p.y >= h - 2;
    if let Some(pos) = grid
        .walkable_positions()
        .into_iter()
        .find(|p| on_fringe(p) && !occupied.contains(p))
    {
        return pos;
    }
    grid.center()
}
