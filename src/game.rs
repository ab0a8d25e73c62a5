//! The game core: a seeded two-player session driving the physics world,
//! plus level assembly and maze generation.

use itertools::izip;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::physics::{behavior, BodyKey, PhysicsWorld};

//

pub mod level;
pub use level::{Level, LevelParams};

pub mod maze;
pub use maze::{MazeParams, WallRect};

//

/// One player's controls for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct TankInput {
    pub forward: bool,
    pub reverse: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub fire: bool,
}

/// Frames to let the finished round play out before the next one starts.
pub const ROUND_RESET_DELAY: u64 = 200;

/// A running match between two tanks.
///
/// The session owns the world, the level parameters and the random
/// generator, so a session built from the same seed and fed the same
/// inputs plays out the same way every time.
pub struct Session {
    world: PhysicsWorld,
    params: LevelParams,
    rng: Pcg32,
    tanks: [BodyKey; 2],
    round: u32,
    round_over: bool,
    reset_countdown: u64,
}

impl Session {
    pub fn new(seed: u64, params: LevelParams) -> Self {
        let mut world = PhysicsWorld::new();
        let mut rng = Pcg32::seed_from_u64(seed);
        let level = level::build(&mut world, &params, &mut rng);
        Session {
            world,
            params,
            rng,
            tanks: level.tanks,
            round: 1,
            round_over: false,
            reset_countdown: 0,
        }
    }

    #[inline]
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    #[inline]
    pub fn tanks(&self) -> [BodyKey; 2] {
        self.tanks
    }

    #[inline]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[inline]
    pub fn round_over(&self) -> bool {
        self.round_over
    }

    /// Advance the match by one frame.
    ///
    /// Inputs are applied in player order, then the world ticks,
    /// then requested shots are fired so that a fresh bullet first moves
    /// on the next frame.
    pub fn frame(&mut self, inputs: [TankInput; 2]) {
        for (tank, input) in izip!(self.tanks, inputs) {
            self.apply_input(tank, input);
        }
        self.world.tick();
        for (tank, input) in izip!(self.tanks, inputs) {
            if input.fire {
                behavior::fire(&mut self.world, tank);
            }
        }

        if self.round_over {
            self.reset_countdown -= 1;
            if self.reset_countdown == 0 {
                self.reset_round();
            }
        } else if self.tanks.iter().any(|tank| !self.world.is_live(*tank)) {
            self.round_over = true;
            self.reset_countdown = ROUND_RESET_DELAY;
            match self.tanks.map(|tank| self.world.is_live(tank)) {
                [true, false] => log::info!("round {} goes to player 1", self.round),
                [false, true] => log::info!("round {} goes to player 2", self.round),
                _ => log::info!("round {} is a draw", self.round),
            }
        }
    }

    /// Drive and steer a tank. Velocity is taken from the heading
    /// before this frame's turn is applied.
    fn apply_input(&mut self, tank: BodyKey, input: TankInput) {
        let Some(body) = self.world.get_body_mut(tank) else {
            return;
        };
        // conflicting keys resolve in favor of forward and left
        let drive = if input.forward {
            behavior::TANK_SPEED
        } else if input.reverse {
            -behavior::TANK_SPEED
        } else {
            0.0
        };
        let velocity = body.heading() * drive;
        body.set_velocity(velocity);
        if input.turn_left {
            body.rotate_by_deg(-behavior::TANK_TURN_SPEED);
        } else if input.turn_right {
            body.rotate_by_deg(behavior::TANK_TURN_SPEED);
        }
    }

    fn reset_round(&mut self) {
        self.world.clear();
        let level = level::build(&mut self.world, &self.params, &mut self.rng);
        self.tanks = level.tanks;
        self.round += 1;
        self.round_over = false;
        log::info!("round {} begins", self.round);
    }
}
