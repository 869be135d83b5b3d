//! Headless local simulation: one player, bullets and a steadily growing horde.
//!
//! All randomness comes from a seeded [`StdRng`], so two worlds built from the
//! same seed and fed the same inputs evolve identically.

use std::collections::BTreeMap;

use protocol::{BulletState, EnemyState, PlayerState, SessionId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const WORLD_WIDTH: f64 = 20_000.0;
pub const WORLD_HEIGHT: f64 = 20_000.0;

/// Units the player moves per tick along each pressed axis.
pub const PLAYER_SPEED: f64 = 2.0;
/// Units a bullet travels per tick.
pub const BULLET_SPEED: f64 = 5.0;
pub const FIRE_INTERVAL_MS: u64 = 500;
pub const MAGAZINE_SIZE: u32 = 6;
pub const RELOAD_MS: u64 = 2_000;
pub const SPAWN_INTERVAL_MS: u64 = 1_000;
pub const CONTACT_DAMAGE: f64 = 10.0;
pub const KILL_SCORE: u64 = 10;

/// Bullets farther than this outside the world are dropped.
pub const BULLET_CULL_MARGIN: f64 = 1_000.0;
const BULLET_RADIUS: f64 = 4.0;
const MUZZLE_OFFSET: f64 = 15.0;

/// Enemies appear just outside a view of this size around the player.
const VIEW_WIDTH: f64 = 800.0;
const VIEW_HEIGHT: f64 = 600.0;
const SPAWN_DISTANCE: f64 = 400.0;

const WAVE_KILLS_MIN: u32 = 10;
const WAVE_KILLS_MAX: u32 = 15;

/// An enemy kind and the cumulative probability threshold that selects it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Archetype {
    pub radius: f64,
    pub speed: f64,
    pub hp: f64,
    threshold: f64,
}

/// Walker, runner, brute and tank, in roll order.
pub const ARCHETYPES: [Archetype; 4] = [
    Archetype {
        radius: 25.0,
        speed: 1.0,
        hp: 1.0,
        threshold: 0.6,
    },
    Archetype {
        radius: 20.0,
        speed: 2.0,
        hp: 1.0,
        threshold: 0.85,
    },
    Archetype {
        radius: 40.0,
        speed: 3.0,
        hp: 0.5,
        threshold: 0.9,
    },
    Archetype {
        radius: 35.0,
        speed: 0.6,
        hp: 3.0,
        threshold: 1.0,
    },
];

impl Archetype {
    /// Picks the archetype for a roll in `[0, 1)`.
    #[must_use]
    pub fn for_roll(roll: f64) -> Self {
        ARCHETYPES
            .iter()
            .copied()
            .find(|archetype| roll < archetype.threshold)
            .unwrap_or(ARCHETYPES[ARCHETYPES.len() - 1])
    }

    const fn spawn(self, x: f64, y: f64) -> EnemyState {
        EnemyState {
            x,
            y,
            radius: self.radius,
            speed: self.speed,
            hp: self.hp,
        }
    }
}

/// Player intent for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Heading in radians.
    pub aim: f64,
    pub fire: bool,
    /// Starts a new game once the player is down.
    pub restart: bool,
}

/// What happened during one [`LocalWorld::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepEvents {
    pub shots: u32,
    pub kills: u32,
    pub contacts: u32,
    pub spawned: u32,
    pub culled: u32,
    pub wave_advanced: bool,
    pub game_over: bool,
}

#[derive(Debug, Clone, Default)]
struct Gun {
    fired: u32,
    since_shot_ms: Option<u64>,
    reload_left_ms: Option<u64>,
}

impl Gun {
    fn ready(&self) -> bool {
        self.reload_left_ms.is_none()
            && self
                .since_shot_ms
                .map_or(true, |elapsed| elapsed >= FIRE_INTERVAL_MS)
    }

    fn advance(&mut self, dt_ms: u64) {
        if let Some(elapsed) = self.since_shot_ms.as_mut() {
            *elapsed = elapsed.saturating_add(dt_ms);
        }
    }

    fn record_shot(&mut self) {
        self.since_shot_ms = Some(0);
        self.fired += 1;
        if self.fired >= MAGAZINE_SIZE {
            self.reload_left_ms = Some(RELOAD_MS);
        }
    }

    fn tick_reload(&mut self, dt_ms: u64) {
        if let Some(left) = self.reload_left_ms {
            let left = left.saturating_sub(dt_ms);
            if left == 0 {
                self.reload_left_ms = None;
                self.fired = 0;
            } else {
                self.reload_left_ms = Some(left);
            }
        }
    }
}

/// The locally predicted game state.
#[derive(Debug, Clone)]
pub struct LocalWorld {
    pub player: PlayerState,
    pub bullets: Vec<BulletState>,
    pub enemies: Vec<EnemyState>,
    /// Everyone else the relay reported, keyed by their session id.
    pub remote_players: BTreeMap<SessionId, PlayerState>,
    score: u64,
    wave: u32,
    wave_kills: u32,
    wave_target: u32,
    gun: Gun,
    spawn_timer_ms: u64,
    clock_ms: u64,
    game_over: bool,
    rng: StdRng,
}

impl LocalWorld {
    /// A fresh game with the player in the middle of the world.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let wave_target = rng.random_range(WAVE_KILLS_MIN..=WAVE_KILLS_MAX);
        Self {
            player: PlayerState::at(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0),
            bullets: Vec::new(),
            enemies: Vec::new(),
            remote_players: BTreeMap::new(),
            score: 0,
            wave: 1,
            wave_kills: 0,
            wave_target,
            gun: Gun::default(),
            spawn_timer_ms: 0,
            clock_ms: 0,
            game_over: false,
            rng,
        }
    }

    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Kills still needed to reach the next wave.
    #[must_use]
    pub const fn kills_to_next_wave(&self) -> u32 {
        self.wave_target.saturating_sub(self.wave_kills)
    }

    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub const fn is_reloading(&self) -> bool {
        self.gun.reload_left_ms.is_some()
    }

    #[must_use]
    pub const fn rounds_left(&self) -> u32 {
        MAGAZINE_SIZE.saturating_sub(self.gun.fired)
    }

    /// Simulated time in milliseconds.
    #[must_use]
    pub const fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Advances the simulation by `dt_ms` milliseconds.
    pub fn step(&mut self, dt_ms: u64, input: &TickInput) -> StepEvents {
        let mut events = StepEvents::default();
        self.clock_ms = self.clock_ms.saturating_add(dt_ms);
        self.player.angle = input.aim;

        if self.game_over {
            if input.restart {
                self.restart();
            }
            return events;
        }

        self.move_player(input);
        self.gun.advance(dt_ms);
        if input.fire && self.gun.ready() {
            self.fire();
            events.shots += 1;
        }
        self.gun.tick_reload(dt_ms);

        events.culled = self.advance_bullets();

        self.spawn_timer_ms += dt_ms;
        if self.spawn_timer_ms >= SPAWN_INTERVAL_MS {
            self.spawn_timer_ms = 0;
            self.spawn_enemy();
            events.spawned += 1;
        }

        self.advance_enemies(&mut events);
        events.game_over = self.game_over;
        events
    }

    /// Resets score, wave, player and entities for a new game.
    pub fn restart(&mut self) {
        self.player = PlayerState::at(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0);
        self.bullets.clear();
        self.enemies.clear();
        self.score = 0;
        self.wave = 1;
        self.wave_kills = 0;
        self.wave_target = self.rng.random_range(WAVE_KILLS_MIN..=WAVE_KILLS_MAX);
        self.gun = Gun::default();
        self.spawn_timer_ms = 0;
        self.game_over = false;
    }

    fn move_player(&mut self, input: &TickInput) {
        if input.up {
            self.player.y -= PLAYER_SPEED;
        }
        if input.down {
            self.player.y += PLAYER_SPEED;
        }
        if input.left {
            self.player.x -= PLAYER_SPEED;
        }
        if input.right {
            self.player.x += PLAYER_SPEED;
        }
    }

    fn fire(&mut self) {
        let (sin, cos) = self.player.angle.sin_cos();
        let reach = self.player.radius + MUZZLE_OFFSET;
        self.bullets.push(BulletState {
            x: cos.mul_add(reach, self.player.x),
            y: sin.mul_add(reach, self.player.y),
            dx: cos * BULLET_SPEED,
            dy: sin * BULLET_SPEED,
        });
        self.gun.record_shot();
    }

    fn advance_bullets(&mut self) -> u32 {
        let before = self.bullets.len();
        self.bullets.retain_mut(|bullet| {
            bullet.x += bullet.dx;
            bullet.y += bullet.dy;
            (-BULLET_CULL_MARGIN..=WORLD_WIDTH + BULLET_CULL_MARGIN).contains(&bullet.x)
                && (-BULLET_CULL_MARGIN..=WORLD_HEIGHT + BULLET_CULL_MARGIN).contains(&bullet.y)
        });
        u32::try_from(before - self.bullets.len()).unwrap_or(u32::MAX)
    }

    fn spawn_enemy(&mut self) {
        let (px, py) = (self.player.x, self.player.y);
        let across = self.rng.random::<f64>();
        let (x, y) = match self.rng.random_range(0..4) {
            0 => (px + across.mul_add(VIEW_WIDTH, -VIEW_WIDTH / 2.0), py - SPAWN_DISTANCE),
            1 => (px + SPAWN_DISTANCE, py + across.mul_add(VIEW_HEIGHT, -VIEW_HEIGHT / 2.0)),
            2 => (px + across.mul_add(VIEW_WIDTH, -VIEW_WIDTH / 2.0), py + SPAWN_DISTANCE),
            _ => (px - SPAWN_DISTANCE, py + across.mul_add(VIEW_HEIGHT, -VIEW_HEIGHT / 2.0)),
        };
        let archetype = Archetype::for_roll(self.rng.random::<f64>());
        self.enemies.push(archetype.spawn(x, y));
    }

    /// Steers every enemy at the player, then resolves contact and bullet hits.
    ///
    /// Contact is judged on the distance before the enemy moved. Each enemy
    /// absorbs at most one bullet per tick.
    fn advance_enemies(&mut self, events: &mut StepEvents) {
        let (px, py, pr) = (self.player.x, self.player.y, self.player.radius);
        let mut index = 0;
        while index < self.enemies.len() {
            let enemy = &mut self.enemies[index];
            let (dx, dy) = (px - enemy.x, py - enemy.y);
            let dist = dx.hypot(dy);
            if dist > 0.0 {
                enemy.x += dx / dist * enemy.speed;
                enemy.y += dy / dist * enemy.speed;
            }

            if dist < enemy.radius + pr {
                self.enemies.remove(index);
                self.player.hp -= CONTACT_DAMAGE;
                events.contacts += 1;
                if self.player.hp <= 0.0 {
                    self.game_over = true;
                }
                continue;
            }

            let hit = self.bullets.iter().position(|bullet| {
                (enemy.x - bullet.x).hypot(enemy.y - bullet.y) < enemy.radius + BULLET_RADIUS
            });
            if let Some(bullet) = hit {
                self.bullets.remove(bullet);
                enemy.hp -= 1.0;
                if enemy.hp <= 0.0 {
                    self.enemies.remove(index);
                    events.kills += 1;
                    events.wave_advanced |= self.record_kill();
                    continue;
                }
            }
            index += 1;
        }
    }

    fn record_kill(&mut self) -> bool {
        self.score += KILL_SCORE;
        self.wave_kills += 1;
        if self.wave_kills < self.wave_target {
            return false;
        }
        self.wave += 1;
        self.wave_kills = 0;
        self.wave_target = self.rng.random_range(WAVE_KILLS_MIN..=WAVE_KILLS_MAX);
        true
    }
}
