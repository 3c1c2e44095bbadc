use async_trait::async_trait;
use groupshot_core::model::{PeerId, RoomControl, SignalingEnvelope, SignalingEvent};
use groupshot_server::SignalingOutput;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Mock SignalingOutput that captures every forwarded envelope.
#[derive(Clone)]
pub struct MockSignalingOutput {
    /// Channel to stream captured forwards.
    tx: mpsc::UnboundedSender<(PeerId, SignalingEnvelope)>,
    /// All captured forwards (for verification).
    forwards: Arc<Mutex<Vec<(PeerId, SignalingEnvelope)>>>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(PeerId, SignalingEnvelope)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            forwards: Arc::new(Mutex::new(Vec::new())),
        };
        (signaling, rx)
    }

    /// Every envelope delivered to `peer_id`, in forward order.
    pub async fn envelopes_for(&self, peer_id: &PeerId) -> Vec<SignalingEnvelope> {
        self.forwards
            .lock()
            .await
            .iter()
            .filter(|(to, _)| to == peer_id)
            .map(|(_, envelope)| envelope.clone())
            .collect()
    }

    /// Room control payloads delivered to `peer_id`.
    pub async fn controls_for(&self, peer_id: &PeerId) -> Vec<RoomControl> {
        self.envelopes_for(peer_id)
            .await
            .iter()
            .filter_map(|envelope| match envelope.decode() {
                Ok(SignalingEvent::Signaling(control)) => Some(control),
                _ => None,
            })
            .collect()
    }

    pub async fn total_forwards(&self) -> usize {
        self.forwards.lock().await.len()
    }

    /// Poll until at least `count` forwards were captured or the timeout
    /// elapses. Returns whether the count was reached.
    pub async fn wait_for_forwards(&self, count: usize, timeout_ms: u64) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.forwards.lock().await.len() >= count {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn forward(&self, peer_id: PeerId, envelope: SignalingEnvelope) {
        tracing::debug!("[MockSignaling] forward to {}", peer_id);

        self.forwards
            .lock()
            .await
            .push((peer_id.clone(), envelope.clone()));
        let _ = self.tx.send((peer_id, envelope));
    }
}
