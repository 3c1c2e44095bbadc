use async_trait::async_trait;
use groupshot_core::model::{PeerId, SignalingEnvelope};

/// The room actor's one way out: hand an envelope to the transport layer
/// for a specific member. Implemented by the WebSocket service in
/// production and by a capturing mock in tests.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn forward(&self, peer_id: PeerId, envelope: SignalingEnvelope);
}
