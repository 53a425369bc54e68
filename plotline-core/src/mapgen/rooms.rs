//! Room-style generators: interiors, open spaces, fortifications,
//! waterfronts, and religious buildings.
//!
//! Each generator receives a grid pre-filled with floor, draws its
//! structure and furniture, and leaves door placement to the caller.
//! Furniture never lands on the outer wall ring so doors always find a
//! forceable interior neighbor.

use rand::Rng;

use crate::grid::{GenParams, Grid, TileKind};
use crate::types::{GridPos, LocationType};

/// Walled rectangle with subtype-specific furniture.
pub fn interior<R: Rng>(grid: &mut Grid, kind: LocationType, params: &GenParams, rng: &mut R) {
    perimeter_walls(grid);
    match kind {
        LocationType::Tavern => tavern_furniture(grid, rng),
        LocationType::Shop => shop_furniture(grid, rng),
        LocationType::Residence => residence_furniture(grid, rng),
        LocationType::Palace => palace_furniture(grid),
        _ => sparse_furniture(grid, rng),
    }
    scatter_wear(grid, params, rng);
}

/// Grass/paved hybrid: partial fence, central paved zone, fountain
/// centerpiece, scattered stalls, wide entrances on all four sides.
pub fn open_space<R: Rng>(grid: &mut Grid, params: &GenParams, rng: &mut R) {
    let (w, h) = (grid.width as i32, grid.height as i32);
    for pos in grid.walkable_positions() {
        grid.set(pos, TileKind::Grass);
    }

    // Partial perimeter fence, each run kept with 60% probability.
    for x in 0..w {
        if rng.gen_bool(0.6) {
            grid.set(GridPos::new(x, 0), TileKind::Fence);
        }
        if rng.gen_bool(0.6) {
            grid.set(GridPos::new(x, h - 1), TileKind::Fence);
        }
    }
    for y in 0..h {
        if rng.gen_bool(0.6) {
            grid.set(GridPos::new(0, y), TileKind::Fence);
        }
        if rng.gen_bool(0.6) {
            grid.set(GridPos::new(w - 1, y), TileKind::Fence);
        }
    }

    // Central paved zone with a fountain centerpiece.
    let center = grid.center();
    let rx = (w / 4).max(2);
    let ry = (h / 4).max(2);
    for y in (center.y - ry).max(1)..=(center.y + ry).min(h - 2) {
        for x in (center.x - rx).max(1)..=(center.x + rx).min(w - 2) {
            grid.set(GridPos::new(x, y), TileKind::Floor);
        }
    }
    grid.set(center, TileKind::Fountain);

    // Stalls scattered on the grass fringe.
    let stalls = ((w * h) as f32 * 0.02).max(1.0) as usize;
    for _ in 0..stalls {
        let pos = GridPos::new(rng.gen_range(1..w - 1), rng.gen_range(1..h - 1));
        if grid.get(pos) == Some(TileKind::Grass) {
            grid.set(pos, TileKind::Stall);
        }
    }

    // Wide entrances: a three-tile gap at the midpoint of each side.
    for dx in -1..=1 {
        grid.set(GridPos::new(w / 2 + dx, 0), TileKind::Grass);
        grid.set(GridPos::new(w / 2 + dx, h - 1), TileKind::Grass);
    }
    for dy in -1..=1 {
        grid.set(GridPos::new(0, h / 2 + dy), TileKind::Grass);
        grid.set(GridPos::new(w - 1, h / 2 + dy), TileKind::Grass);
    }

    scatter_wear(grid, params, rng);
}

/// Double-thick walls, cleared interior, corner pillars, weapon racks,
/// wall torches.
pub fn fortification(grid: &mut Grid) {
    let (w, h) = (grid.width as i32, grid.height as i32);
    perimeter_walls(grid);
    for x in 1..w - 1 {
        grid.set(GridPos::new(x, 1), TileKind::Wall);
        grid.set(GridPos::new(x, h - 2), TileKind::Wall);
    }
    for y in 1..h - 1 {
        grid.set(GridPos::new(1, y), TileKind::Wall);
        grid.set(GridPos::new(w - 2, y), TileKind::Wall);
    }

    // Interior corners get pillars, the north wall gets racks and torches.
    for (x, y) in [(2, 2), (w - 3, 2), (2, h - 3), (w - 3, h - 3)] {
        grid.set(GridPos::new(x, y), TileKind::Pillar);
    }
    let rack_y = 2;
    for x in [w / 2 - 1, w / 2 + 1] {
        grid.set(GridPos::new(x, rack_y), TileKind::WeaponRack);
    }
    for x in [3, w - 4] {
        grid.set(GridPos::new(x, rack_y), TileKind::Torch);
    }
}

/// Water band along the bottom, piers bridging into it, a walled building
/// area above, shoreline crates and barrels.
pub fn waterfront<R: Rng>(grid: &mut Grid, params: &GenParams, rng: &mut R) {
    let (w, h) = (grid.width as i32, grid.height as i32);

    // Bottom third is open water.
    let water_top = h - (h / 3).max(2);
    for y in water_top..h {
        for x in 0..w {
            grid.set(GridPos::new(x, y), TileKind::Water);
        }
    }

    // Piers run from the shore out into the water.
    let pier_count = (w / 8).max(1);
    for i in 0..pier_count {
        let x = (i * 2 + 1) * w / (pier_count * 2 + 1);
        for y in water_top - 1..h - 1 {
            grid.set(GridPos::new(x, y), TileKind::Pier);
        }
    }

    // Walled building area hugging the top edge.
    let bw = (w / 2).max(4);
    let bh = ((water_top - 1) / 2).max(3);
    for y in 0..bh {
        for x in 0..bw {
            let pos = GridPos::new(x, y);
            let edge = x == 0 || y == 0 || x == bw - 1 || y == bh - 1;
            grid.set(pos, if edge { TileKind::Wall } else { TileKind::Floor });
        }
    }
    // Opening so the building connects to the shore.
    grid.set(GridPos::new(bw / 2, bh - 1), TileKind::Floor);

    // Shoreline cargo.
    let cargo = (w / 3).max(2) as usize;
    for _ in 0..cargo {
        let pos = GridPos::new(rng.gen_range(1..w - 1), water_top - 1);
        if grid.get(pos) == Some(TileKind::Floor) {
            let tile = if rng.gen_bool(0.5) {
                TileKind::Crate
            } else {
                TileKind::Barrel
            };
            grid.set(pos, tile);
        }
    }

    scatter_wear(grid, params, rng);
}

/// Walled rectangle, central carpeted nave, altar at the north end,
/// symmetric pillars, torches.
pub fn religious(grid: &mut Grid) {
    let (w, h) = (grid.width as i32, grid.height as i32);
    perimeter_walls(grid);

    let cx = w / 2;
    for y in 2..h - 1 {
        grid.set(GridPos::new(cx, y), TileKind::Carpet);
    }
    grid.set(GridPos::new(cx, 1), TileKind::Altar);

    for y in (3..h - 2).step_by(3) {
        grid.set(GridPos::new(cx - 2, y), TileKind::Pillar);
        grid.set(GridPos::new(cx + 2, y), TileKind::Pillar);
    }
    for x in [2, w - 3] {
        grid.set(GridPos::new(x, 1), TileKind::Torch);
    }
}

// ---------------------------------------------------------------------------
// Furniture sets
// ---------------------------------------------------------------------------

fn tavern_furniture<R: Rng>(grid: &mut Grid, rng: &mut R) {
    let (w, h) = (grid.width as i32, grid.height as i32);

    // Exactly one counter row near the north wall, with a pass gap at the
    // east end for the keeper.
    let counter_y = 2;
    for x in 2..w - 3 {
        grid.set(GridPos::new(x, counter_y), TileKind::Counter);
    }

    // Fireplace set into the west wall.
    grid.set(GridPos::new(1, h / 2), TileKind::Fireplace);

    // Barrels stacked behind the counter.
    for x in 2..(w - 3).min(5) {
        grid.set(GridPos::new(x, 1), TileKind::Barrel);
    }

    // Scattered tables, each with a chair beside it. Bounded attempts so a
    // cramped room yields fewer tables rather than spinning.
    let want = ((w * h) / 18).max(2) as usize;
    let mut placed = 0;
    for _ in 0..want * 10 {
        if placed == want {
            break;
        }
        let pos = GridPos::new(rng.gen_range(2..w - 2), rng.gen_range(counter_y + 2..h - 2));
        if grid.get(pos) == Some(TileKind::Floor) {
            grid.set(pos, TileKind::Table);
            placed += 1;
            let chair = GridPos::new(pos.x + 1, pos.y);
            if grid.get(chair) == Some(TileKind::Floor) {
                grid.set(chair, TileKind::Chair);
            }
        }
    }
}

fn shop_furniture<R: Rng>(grid: &mut Grid, rng: &mut R) {
    let (w, h) = (grid.width as i32, grid.height as i32);

    // Shelves along the north interior wall.
    for x in 1..w - 1 {
        if x % 3 != 0 {
            grid.set(GridPos::new(x, 1), TileKind::Shelf);
        }
    }
    // Counter row partway down.
    let counter_y = (h / 3).max(2);
    for x in 2..w - 3 {
        grid.set(GridPos::new(x, counter_y), TileKind::Counter);
    }
    // Stock crates in the back corner.
    let crates = (w / 3).max(1);
    for _ in 0..crates {
        let pos = GridPos::new(rng.gen_range(1..w - 1), rng.gen_range(h - 3..h - 1));
        if grid.get(pos) == Some(TileKind::Floor) {
            grid.set(pos, TileKind::Crate);
        }
    }
}

fn residence_furniture<R: Rng>(grid: &mut Grid, rng: &mut R) {
    let (w, h) = (grid.width as i32, grid.height as i32);
    grid.set(GridPos::new(1, 1), TileKind::Bed);
    grid.set(GridPos::new(w - 2, 1), TileKind::Shelf);
    let table = GridPos::new(w / 2, h / 2);
    grid.set(table, TileKind::Table);
    for d in [(-1, 0), (1, 0)] {
        let chair = GridPos::new(table.x + d.0, table.y + d.1);
        if grid.get(chair) == Some(TileKind::Floor) && rng.gen_bool(0.8) {
            grid.set(chair, TileKind::Chair);
        }
    }
}

fn palace_furniture(grid: &mut Grid) {
    let (w, h) = (grid.width as i32, grid.height as i32);
    let cx = w / 2;

    // Central carpet path from the south entrance to the dais.
    for y in 2..h - 1 {
        grid.set(GridPos::new(cx, y), TileKind::Carpet);
    }
    grid.set(GridPos::new(cx, 1), TileKind::Throne);

    // Symmetric pillars flanking the path, torches on the dais wall.
    for y in (3..h - 2).step_by(2) {
        grid.set(GridPos::new(cx - 3, y), TileKind::Pillar);
        grid.set(GridPos::new(cx + 3, y), TileKind::Pillar);
    }
    for x in [cx - 2, cx + 2] {
        grid.set(GridPos::new(x, 1), TileKind::Torch);
    }
}

fn sparse_furniture<R: Rng>(grid: &mut Grid, rng: &mut R) {
    let (w, h) = (grid.width as i32, grid.height as i32);
    let pieces = ((w * h) / 30).max(1);
    for _ in 0..pieces {
        let pos = GridPos::new(rng.gen_range(2..w - 2), rng.gen_range(2..h - 2));
        if grid.get(pos) == Some(TileKind::Floor) {
            let tile = if rng.gen_bool(0.6) {
                TileKind::Table
            } else {
                TileKind::Chair
            };
            grid.set(pos, tile);
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Single-thickness wall around the grid edge.
pub(crate) fn perimeter_walls(grid: &mut Grid) {
    let (w, h) = (grid.width as i32, grid.height as i32);
    for x in 0..w {
        grid.set(GridPos::new(x, 0), TileKind::Wall);
        grid.set(GridPos::new(x, h - 1), TileKind::Wall);
    }
    for y in 0..h {
        grid.set(GridPos::new(0, y), TileKind::Wall);
        grid.set(GridPos::new(w - 1, y), TileKind::Wall);
    }
}

/// Scatter rubble and junk proportional to disrepair and clutter.
fn scatter_wear<R: Rng>(grid: &mut Grid, params: &GenParams, rng: &mut R) {
    let (w, h) = (grid.width as i32, grid.height as i32);
    let area = (w * h) as f32;
    let rubble = ((1.0 - params.condition) * area * 0.05) as usize;
    let junk = (params.clutter * area * 0.04) as usize;

    for _ in 0..rubble {
        let pos = GridPos::new(rng.gen_range(1..w - 1), rng.gen_range(1..h - 1));
        if matches!(grid.get(pos), Some(TileKind::Floor | TileKind::Grass)) {
            grid.set(pos, TileKind::Rubble);
        }
    }
    for _ in 0..junk {
        let pos = GridPos::new(rng.gen_range(1..w - 1), rng.gen_range(1..h - 1));
        if matches!(grid.get(pos), Some(TileKind::Floor | TileKind::Grass)) {
            let tile = if rng.gen_bool(0.5) {
                TileKind::Crate
            } else {
                TileKind::Barrel
            };
            grid.set(pos, tile);
        }
    }
}
