//! Cellular-automaton cave interiors for underground locations.
//!
//! A randomized seed grid is evolved for a fixed number of generations
//! under a neighbor-count rule, then bordered by forced walls. Degenerate
//! results (almost no open space) are patched with a carved central
//! chamber so door placement always has somewhere to anchor.

use rand::Rng;

use crate::config::GridConfig;
use crate::grid::{Grid, TileKind};
use crate::types::GridPos;

/// Carve a cave into `grid` (which arrives wall-filled).
pub fn carve<R: Rng>(grid: &mut Grid, cfg: &GridConfig, rng: &mut R) {
    let (w, h) = (grid.width as i32, grid.height as i32);

    // Seed: random walls at cave_wall_chance, border always wall.
    let mut cells = vec![false; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            let border = x == 0 || y == 0 || x == w - 1 || y == h - 1;
            cells[(y * w + x) as usize] =
                border || rng.gen_bool(f64::from(cfg.cave_wall_chance));
        }
    }

    // Evolve: a cell is wall next generation when at least cave_birth_limit
    // of its eight neighbors (out-of-bounds counts as wall) are walls.
    for _ in 0..cfg.cave_generations {
        let mut next = cells.clone();
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let mut walls = 0;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        if cells[((y + dy) * w + (x + dx)) as usize] {
                            walls += 1;
                        }
                    }
                }
                next[(y * w + x) as usize] = walls >= cfg.cave_birth_limit;
            }
        }
        cells = next;
    }

    for y in 0..h {
        for x in 0..w {
            let tile = if cells[(y * w + x) as usize] {
                TileKind::Wall
            } else {
                TileKind::Floor
            };
            grid.set(GridPos::new(x, y), tile);
        }
    }

    // Patch degenerate caves: carve a central chamber when under a fifth of
    // the interior opened up.
    let open = grid.count(TileKind::Floor);
    if open * 5 < (w * h) as usize {
        let cx = w / 2;
        let cy = h / 2;
        for y in (cy - 2).max(1)..=(cy + 2).min(h - 2) {
            for x in (cx - 3).max(1)..=(cx + 3).min(w - 2) {
                grid.set(GridPos::new(x, y), TileKind::Floor);
            }
        }
    }

    // Scatter rubble and abandoned crates over the open floor.
    let scatter = ((w * h) as f32 * 0.04) as usize;
    for _ in 0..scatter {
        let pos = GridPos::new(rng.gen_range(1..w - 1), rng.gen_range(1..h - 1));
        if grid.get(pos) == Some(TileKind::Floor) {
            let tile = if rng.gen_bool(0.7) {
                TileKind::Rubble
            } else {
                TileKind::Crate
            };
            grid.set(pos, tile);
        }
    }
}
