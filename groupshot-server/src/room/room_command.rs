use groupshot_core::model::{PeerId, SignalingEnvelope};

/// Commands entering a room's event loop from the WebSocket layer.
#[derive(Debug)]
pub enum RoomCommand {
    /// A peer holding this room's id asked to become a member.
    Join { peer_id: PeerId },

    /// Deliver an envelope to its target, or to every other member when
    /// no target is named.
    Relay { envelope: SignalingEnvelope },

    /// Membership ends, voluntarily or because the socket dropped.
    Leave { peer_id: PeerId },
}
