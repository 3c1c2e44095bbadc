use bytes::Bytes;
use groupshot_core::model::PeerId;

/// Upward notifications from one peer connection, merged across all
/// peers by the repository.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// Transport up and canvas channel open; the peer can receive.
    Connected(PeerId),
    /// A canvas-channel frame from this peer.
    Message(PeerId, Bytes),
    /// The peer went away (remote close or transport loss after connect).
    Disconnected(PeerId),
    /// Negotiation or transport gave up before/while connected.
    Failed(PeerId, String),
}

impl PeerEvent {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            PeerEvent::Connected(id)
            | PeerEvent::Message(id, _)
            | PeerEvent::Disconnected(id)
            | PeerEvent::Failed(id, _) => id,
        }
    }
}
