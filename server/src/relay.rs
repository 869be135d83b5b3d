//! Shared world state held by the relay.

use std::collections::BTreeMap;

use protocol::{BulletState, EnemyState, PlayerState, SessionId, StateReport, WorldSnapshot};

/// Last known state from every connected client.
///
/// The relay does no simulation of its own: players are whatever their
/// owner last reported, and the bullets and zombies lists are whatever the
/// most recent reporter sent.
#[derive(Debug, Clone)]
pub struct RelayState {
    next_id: u64,
    players: BTreeMap<SessionId, PlayerState>,
    bullets: Vec<BulletState>,
    zombies: Vec<EnemyState>,
}

impl Default for RelayState {
    fn default() -> Self {
        Self {
            next_id: 1,
            players: BTreeMap::new(),
            bullets: Vec::new(),
            zombies: Vec::new(),
        }
    }
}

impl RelayState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next id and seeds the player at the origin.
    pub fn join(&mut self) -> SessionId {
        let id = SessionId::new(self.next_id);
        self.next_id += 1;
        self.players.insert(id, PlayerState::at(0.0, 0.0));
        id
    }

    /// Records a `"state"` envelope from `id`.
    ///
    /// Lists the report leaves out keep their current contents. Ignored for
    /// ids that already left.
    pub fn apply_state(&mut self, id: SessionId, state: StateReport) -> bool {
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };
        *player = state.player;
        if let Some(bullets) = state.bullets {
            self.bullets = bullets;
        }
        if let Some(zombies) = state.zombies {
            self.zombies = zombies;
        }
        true
    }

    pub fn leave(&mut self, id: SessionId) -> bool {
        self.players.remove(&id).is_some()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            players: self.players.clone(),
            zombies: self.zombies.clone(),
            bullets: self.bullets.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(x: f64, bullets: usize) -> StateReport {
        StateReport {
            player: PlayerState::at(x, 0.0),
            bullets: Some(vec![
                BulletState {
                    x: 0.0,
                    y: 0.0,
                    dx: 1.0,
                    dy: 0.0,
                };
                bullets
            ]),
            zombies: Some(Vec::new()),
        }
    }

    #[test]
    fn ids_start_at_one() {
        let mut relay = RelayState::new();
        assert_eq!(relay.join(), SessionId::new(1));
        assert_eq!(relay.join(), SessionId::new(2));
        let snapshot = relay.snapshot();
        assert_eq!(snapshot.players[&SessionId::new(1)], PlayerState::at(0.0, 0.0));
    }

    #[test]
    fn ids_not_reused() {
        let mut relay = RelayState::new();
        let first = relay.join();
        relay.leave(first);
        assert_eq!(relay.join(), SessionId::new(2));
    }

    #[test]
    fn state_replaces_player_and_shared_lists() {
        let mut relay = RelayState::new();
        let a = relay.join();
        let b = relay.join();
        assert!(relay.apply_state(a, state(5.0, 3)));
        assert!(relay.apply_state(b, state(7.0, 1)));

        let snapshot = relay.snapshot();
        assert!((snapshot.players[&a].x - 5.0).abs() < f64::EPSILON);
        assert!((snapshot.players[&b].x - 7.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.bullets.len(), 1, "last reporter wins");
    }

    #[test]
    fn missing_lists_keep_current_ones() {
        let mut relay = RelayState::new();
        let a = relay.join();
        let b = relay.join();
        assert!(relay.apply_state(a, state(5.0, 3)));
        let position_only = StateReport {
            player: PlayerState::at(9.0, 1.0),
            bullets: None,
            zombies: None,
        };
        assert!(relay.apply_state(b, position_only));

        let snapshot = relay.snapshot();
        assert_eq!(snapshot.bullets.len(), 3);
        assert_eq!(snapshot.players[&b], PlayerState::at(9.0, 1.0));
    }

    #[test]
    fn departed_players_ignored() {
        let mut relay = RelayState::new();
        let id = relay.join();
        assert!(relay.leave(id));
        assert!(!relay.leave(id));
        assert!(!relay.apply_state(id, state(1.0, 0)));
        assert_eq!(relay.player_count(), 0);
    }
}
