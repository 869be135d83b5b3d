//! Entity state carried inside envelopes.

use serde::{Deserialize, Serialize};

const fn default_hp() -> f64 {
    100.0
}

const fn default_player_radius() -> f64 {
    20.0
}

/// A player's position, heading and health.
///
/// Only `x` and `y` are required on the wire; the relay seeds new players
/// without a radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default = "default_hp")]
    pub hp: f64,
    #[serde(default = "default_player_radius")]
    pub radius: f64,
}

impl PlayerState {
    /// A full-health player at `(x, y)` facing along +x.
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            hp: default_hp(),
            radius: default_player_radius(),
        }
    }
}

/// A bullet in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletState {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub dx: f64,
    #[serde(default)]
    pub dy: f64,
}

/// A zombie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyState {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub speed: f64,
    pub hp: f64,
}
