//! Randomized-Kruskal maze layout.
//!
//! Cells start fully walled in; walls between cells in different
//! connected sets are knocked out one at a time in random order.
//! A plain Kruskal run produces a perfect maze with exactly one route
//! between any two cells, which makes for dull firefights, so walls
//! that Kruskal would keep still get a chance to be removed
//! and open up extra routes.

use rand::{seq::SliceRandom, Rng};

use crate::math as m;

/// Parameters for maze generation.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-types", serde(default))]
pub struct MazeParams {
    /// Side length of one maze cell in world units.
    pub cell_size: f64,
    /// Thickness of the generated walls.
    pub wall_width: f64,
    /// Chance per round to consume the next vertical wall candidate.
    pub vert_prob: f64,
    /// Chance per round to consume the next horizontal wall candidate.
    pub horiz_prob: f64,
    /// Chance to knock out a wall between already-connected cells anyway.
    pub extra_opening_prob: f64,
}

impl Default for MazeParams {
    fn default() -> Self {
        MazeParams {
            cell_size: 50.0,
            wall_width: 2.0,
            vert_prob: 0.9,
            horiz_prob: 0.6,
            extra_opening_prob: 0.4,
        }
    }
}

/// An axis-aligned wall, given by its center and full extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallRect {
    pub center: m::Vec2,
    pub width: f64,
    pub height: f64,
}

/// Generate the maze walls for an arena of the given size.
///
/// The same parameters and generator state always produce the same layout.
/// Candidate walls are consumed until either the vertical or the horizontal
/// list runs dry, so a few candidates of the other kind survive unprocessed;
/// this leans the layout toward long corridors and is kept on purpose.
pub fn generate(
    arena_width: f64,
    arena_height: f64,
    params: &MazeParams,
    rng: &mut impl Rng,
) -> Vec<WallRect> {
    let cells_x = (arena_width / params.cell_size).floor() as usize;
    let cells_y = (arena_height / params.cell_size).floor() as usize;
    let cell_count = cells_x * cells_y;
    if cell_count == 0 {
        return Vec::new();
    }
    let cell_at = |x: usize, y: usize| x * cells_y + y;

    // every cell starts with a wall on its right and bottom side
    let mut right_walls = vec![true; cell_count];
    let mut bottom_walls = vec![true; cell_count];
    let mut sets = CellSets::new(cell_count);

    let mut right_candidates: Vec<usize> = (0..cell_count).collect();
    let mut bottom_candidates: Vec<usize> = (0..cell_count).collect();
    right_candidates.shuffle(rng);
    bottom_candidates.shuffle(rng);

    while !right_candidates.is_empty() && !bottom_candidates.is_empty() {
        if rng.gen::<f64>() < params.vert_prob {
            if let Some(cell) = right_candidates.pop() {
                let (x, y) = (cell / cells_y, cell % cells_y);
                if x + 1 < cells_x {
                    if sets.join(cell, cell_at(x + 1, y))
                        || rng.gen::<f64>() < params.extra_opening_prob
                    {
                        right_walls[cell] = false;
                    }
                }
            }
        }
        if rng.gen::<f64>() < params.horiz_prob {
            if let Some(cell) = bottom_candidates.pop() {
                let (x, y) = (cell / cells_y, cell % cells_y);
                if y + 1 < cells_y {
                    if sets.join(cell, cell_at(x, y + 1))
                        || rng.gen::<f64>() < params.extra_opening_prob
                    {
                        bottom_walls[cell] = false;
                    }
                }
            }
        }
    }

    let half_cell = params.cell_size / 2.0;
    let mut walls = Vec::new();
    for x in 0..cells_x {
        for y in 0..cells_y {
            let cell = cell_at(x, y);
            let center = m::Vec2::new(
                x as f64 * params.cell_size + half_cell,
                y as f64 * params.cell_size + half_cell,
            );
            if bottom_walls[cell] {
                walls.push(WallRect {
                    center: m::Vec2::new(center.x, center.y + half_cell),
                    width: params.cell_size,
                    height: params.wall_width,
                });
            }
            if right_walls[cell] {
                walls.push(WallRect {
                    center: m::Vec2::new(center.x + half_cell, center.y),
                    width: params.wall_width,
                    height: params.cell_size,
                });
            }
        }
    }
    walls
}

/// Disjoint-set forest over cell indices.
struct CellSets {
    parent: Vec<usize>,
}

impl CellSets {
    fn new(len: usize) -> Self {
        CellSets {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            // path halving keeps later lookups short
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Join the sets of two cells.
    /// Returns false if they were already connected.
    fn join(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        self.parent[root_b] = root_a;
        true
    }
}
