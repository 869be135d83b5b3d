//! Headless horde simulation and the adapter that connects it to the relay.
//!
//! [`LocalWorld`] is a rendering-free model of the survival game: one locally
//! predicted player, bullets, and zombies that spawn every second and chase
//! the player. [`run_loop`] drives it at a fixed tick rate and exchanges
//! state with the relay through a [`client::ClientSession`] once per tick.

mod adapter;
mod pilot;
mod runner;
mod world;

pub use adapter::{apply_inbound, outbound_envelope};
pub use pilot::{HoldInput, Pilot, ScriptedPilot};
pub use runner::{run_loop, FixedTicker, RunReport};
pub use world::{
    Archetype, LocalWorld, StepEvents, TickInput, ARCHETYPES, BULLET_CULL_MARGIN, BULLET_SPEED,
    CONTACT_DAMAGE, FIRE_INTERVAL_MS, KILL_SCORE, MAGAZINE_SIZE, PLAYER_SPEED, RELOAD_MS,
    SPAWN_INTERVAL_MS, WORLD_HEIGHT, WORLD_WIDTH,
};
