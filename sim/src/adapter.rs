//! Mapping between the local world and the wire envelopes.

use protocol::{InboundEnvelope, OutboundEnvelope, SessionId};

use crate::world::LocalWorld;

/// The `"state"` envelope for this tick: our player plus our view of the
/// bullets and zombies.
#[must_use]
pub fn outbound_envelope(world: &LocalWorld) -> OutboundEnvelope {
    OutboundEnvelope {
        player: world.player.clone(),
        bullets: world.bullets.clone(),
        zombies: world.enemies.clone(),
    }
}

/// Applies an authoritative world envelope.
///
/// Zombies and bullets are replaced wholesale. Other players are stored as
/// remote players; the entry under `own_id` is skipped so the locally
/// predicted player is never overwritten.
pub fn apply_inbound(world: &mut LocalWorld, inbound: InboundEnvelope, own_id: Option<SessionId>) {
    let snapshot = inbound.world;
    world.enemies = snapshot.zombies;
    world.bullets = snapshot.bullets;
    world.remote_players = snapshot.players;
    if let Some(id) = own_id {
        world.remote_players.remove(&id);
    }
}
