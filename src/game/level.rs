//! Arena assembly: border walls, maze walls, tank spawns and powerups.

use rand::Rng;

use super::maze::{self, MazeParams};
use crate::math as m;
use crate::physics::{behavior, BodyKey, PhysicsWorld, PowerupKind};

/// Parameters for building a level.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-types", serde(default))]
pub struct LevelParams {
    pub arena_width: f64,
    pub arena_height: f64,
    pub maze: MazeParams,
    /// How many powerups to scatter on free cells.
    pub powerup_count: usize,
}

impl Default for LevelParams {
    fn default() -> Self {
        LevelParams {
            arena_width: 900.0,
            arena_height: 600.0,
            maze: MazeParams::default(),
            powerup_count: 2,
        }
    }
}

/// Handles to the bodies a session needs to drive.
#[derive(Clone, Copy, Debug)]
pub struct Level {
    pub tanks: [BodyKey; 2],
}

// spawn point and facing angle per player
const TANK_SPAWNS: [([f64; 2], f64); 2] = [([25.0, 25.0], 0.0), ([525.0, 525.0], 0.0)];

/// Populate a world with a freshly generated arena.
///
/// The caller supplies the random generator so that a seeded session
/// can rebuild the exact same level after a round reset.
pub fn build(world: &mut PhysicsWorld, params: &LevelParams, rng: &mut impl Rng) -> Level {
    let (w, h) = (params.arena_width, params.arena_height);
    let ww = params.maze.wall_width;

    // border walls laid just inside the arena edges
    world.insert_body(behavior::wall_body(m::Vec2::new(w / 2.0, ww / 2.0), w, ww));
    world.insert_body(behavior::wall_body(
        m::Vec2::new(w / 2.0, h - ww / 2.0),
        w,
        ww,
    ));
    world.insert_body(behavior::wall_body(m::Vec2::new(ww / 2.0, h / 2.0), ww, h));
    world.insert_body(behavior::wall_body(
        m::Vec2::new(w - ww / 2.0, h / 2.0),
        ww,
        h,
    ));

    for wall in maze::generate(w, h, &params.maze, rng) {
        world.insert_body(behavior::wall_body(wall.center, wall.width, wall.height));
    }

    let mut spawn_tank = |player: u8| {
        let ([x, y], facing) = TANK_SPAWNS[usize::from(player - 1)];
        world.insert_body(behavior::tank_body(
            m::Vec2::new(x, y),
            m::Angle::Deg(facing),
            player,
        ))
    };
    let tanks = [spawn_tank(1), spawn_tank(2)];

    scatter_powerups(world, params, rng);

    Level { tanks }
}

/// Drop powerups on random free cell centers, avoiding the spawn cells.
fn scatter_powerups(world: &mut PhysicsWorld, params: &LevelParams, rng: &mut impl Rng) {
    let cells_x = (params.arena_width / params.maze.cell_size).floor() as usize;
    let cells_y = (params.arena_height / params.maze.cell_size).floor() as usize;
    let cell_count = cells_x * cells_y;
    if cell_count == 0 || params.powerup_count == 0 {
        return;
    }
    let spawn_cells: Vec<usize> = TANK_SPAWNS
        .iter()
        .map(|([px, py], _)| {
            let x = ((px / params.maze.cell_size) as usize).min(cells_x - 1);
            let y = ((py / params.maze.cell_size) as usize).min(cells_y - 1);
            x * cells_y + y
        })
        .collect();

    // draw a couple of spares in case some picks land on spawn cells
    let draw_count = (params.powerup_count + spawn_cells.len()).min(cell_count);
    let picks = rand::seq::index::sample(rng, cell_count, draw_count);
    let half_cell = params.maze.cell_size / 2.0;
    for cell in picks
        .iter()
        .filter(|cell| !spawn_cells.contains(cell))
        .take(params.powerup_count)
    {
        let center = m::Vec2::new(
            (cell / cells_y) as f64 * params.maze.cell_size + half_cell,
            (cell % cells_y) as f64 * params.maze.cell_size + half_cell,
        );
        let kind = if rng.gen_bool(0.5) {
            PowerupKind::Repair
        } else {
            PowerupKind::AmmoCache
        };
        world.insert_body(behavior::powerup_body(center, kind));
    }
}
