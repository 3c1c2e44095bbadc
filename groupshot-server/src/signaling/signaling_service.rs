use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use groupshot_core::model::{PeerId, SignalingEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
}

/// Fan-out from room actors to connected WebSockets. One entry per live
/// socket; envelopes to a peer that already disconnected are dropped.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    pub fn add_peer(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(peer_id, tx);
    }

    pub fn remove_peer(&self, peer_id: &PeerId) {
        self.inner.peers.remove(peer_id);
    }

    pub fn send_envelope(&self, peer_id: &PeerId, envelope: &SignalingEnvelope) {
        if let Some(peer) = self.inner.peers.get(peer_id) {
            let json = envelope.to_json();
            if let Err(e) = peer.send(Message::Text(json.into())) {
                error!("Failed to send WS message to {}: {:?}", peer_id, e);
            }
        } else {
            warn!("Attempted to send envelope to disconnected peer {}", peer_id);
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn forward(&self, peer_id: PeerId, envelope: SignalingEnvelope) {
        self.send_envelope(&peer_id, &envelope);
    }
}
