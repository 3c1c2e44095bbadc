use groupshot_core::model::{MalformedEnvelope, PeerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Wire frame that does not decode. Callers drop and log these; they
    /// never take a peer connection down.
    #[error(transparent)]
    Envelope(#[from] MalformedEnvelope),

    /// Sending to a peer whose data channel is not open yet (or anymore).
    /// Retry after the peer reports connected.
    #[error("peer {0} is not connected")]
    PeerNotConnected(PeerId),

    /// The transport gave up on a peer. Surfaced upward as an event; this
    /// variant exists for calls that race the teardown.
    #[error("negotiation with {peer_id} failed: {reason}")]
    NegotiationFailed { peer_id: PeerId, reason: String },

    /// The relay refused the join. Fatal to this attempt only.
    #[error("room join rejected: {0}")]
    RoomJoinRejected(String),

    /// The shared relay connection is gone. The session is over; the user
    /// has to rejoin.
    #[error("relay connection closed")]
    RelayClosed,

    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("webrtc: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("data channel codec: {0}")]
    Codec(#[from] postcard::Error),
}
