//! Input sources for headless runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::world::{LocalWorld, TickInput};

/// Produces the player's input for each tick.
pub trait Pilot {
    fn next_input(&mut self, world: &LocalWorld) -> TickInput;
}

/// Wanders in a random direction, aims at the nearest enemy and fires while
/// one is in range. Restarts as soon as the game is over.
#[derive(Debug, Clone)]
pub struct ScriptedPilot {
    rng: StdRng,
    heading: TickInput,
    ticks_left: u32,
    fire_range: f64,
}

impl ScriptedPilot {
    /// Ticks spent on one wander heading before choosing another.
    pub const HEADING_TICKS: u32 = 90;

    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            heading: TickInput::default(),
            ticks_left: 0,
            fire_range: 600.0,
        }
    }

    fn pick_heading(&mut self) -> TickInput {
        let vertical = self.rng.random_range(0..3);
        let horizontal = self.rng.random_range(0..3);
        TickInput {
            up: vertical == 1,
            down: vertical == 2,
            left: horizontal == 1,
            right: horizontal == 2,
            ..TickInput::default()
        }
    }
}

impl Pilot for ScriptedPilot {
    fn next_input(&mut self, world: &LocalWorld) -> TickInput {
        if world.is_game_over() {
            return TickInput {
                restart: true,
                ..TickInput::default()
            };
        }
        if self.ticks_left == 0 {
            self.heading = self.pick_heading();
            self.ticks_left = Self::HEADING_TICKS;
        }
        self.ticks_left -= 1;

        let player = &world.player;
        let nearest = world
            .enemies
            .iter()
            .map(|enemy| (enemy.x - player.x, enemy.y - player.y))
            .min_by(|a, b| a.0.hypot(a.1).total_cmp(&b.0.hypot(b.1)));

        let mut input = self.heading;
        input.aim = player.angle;
        if let Some((dx, dy)) = nearest {
            input.aim = dy.atan2(dx);
            input.fire = dx.hypot(dy) <= self.fire_range;
        }
        input
    }
}

/// Replays the same input every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldInput(pub TickInput);

impl Pilot for HoldInput {
    fn next_input(&mut self, _world: &LocalWorld) -> TickInput {
        self.0
    }
}
