use crate::error::ClientError;
use async_trait::async_trait;
use groupshot_core::canvas::{CanvasEvent, CanvasState};
use groupshot_core::model::{CanvasPacket, Frame, PeerId, StickerEntity};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

/// Where canvas packets go out. The connection repository is the real
/// implementation; tests record instead of sending.
#[async_trait]
pub trait PacketFanout: Send + Sync {
    /// Deliver to every connected peer; returns how many got it.
    async fn broadcast(&self, packet: &CanvasPacket) -> Result<usize, ClientError>;
    /// Deliver to exactly one peer.
    async fn send_to(&self, peer_id: &PeerId, packet: &CanvasPacket) -> Result<(), ClientError>;
}

/// Notification for the rendering layer that the shared canvas moved
/// under it, whether by a local gesture or a remote broadcast.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasChange {
    Updated(StickerEntity),
    Removed(Uuid),
    SnapshotMerged { added: usize },
}

/// The local participant's view of the shared canvas.
///
/// Every mutation, ours or a peer's, passes through the same ownership
/// rules in [`CanvasState`]. Our accepted mutations are broadcast;
/// rejected ones (claim lost, ownership gone) evaporate silently. The
/// state lock covers guard-then-mutate only, never a network send.
pub struct CanvasSession {
    local_id: PeerId,
    state: Mutex<CanvasState>,
    fanout: Arc<dyn PacketFanout>,
    changes_tx: mpsc::UnboundedSender<CanvasChange>,
}

impl CanvasSession {
    pub fn new(
        local_id: PeerId,
        fanout: Arc<dyn PacketFanout>,
    ) -> (Self, mpsc::UnboundedReceiver<CanvasChange>) {
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        (
            Self {
                local_id,
                state: Mutex::new(CanvasState::new()),
                fanout,
                changes_tx,
            },
            changes_rx,
        )
    }

    /// Drop a new sticker on the canvas and tell everyone.
    pub async fn place_sticker(
        &self,
        image_url: impl Into<String>,
        frame: Frame,
    ) -> Result<StickerEntity, ClientError> {
        let sticker = StickerEntity::new(image_url, frame);
        let event = CanvasEvent::Create {
            sticker: sticker.clone(),
        };
        self.apply_local(event).await;
        Ok(sticker)
    }

    /// A drag gesture started: try to claim the sticker. `false` means
    /// someone else holds it and the gesture should not begin.
    pub async fn begin_drag(&self, id: Uuid) -> bool {
        self.apply_local(CanvasEvent::Claim { id }).await
    }

    /// Mid-drag frame update. Only lands while we hold the claim.
    pub async fn drag(&self, id: Uuid, frame: Frame) -> bool {
        self.apply_local(CanvasEvent::Mutate { id, frame }).await
    }

    /// Drag ended: give the sticker back to the room.
    pub async fn end_drag(&self, id: Uuid) -> bool {
        self.apply_local(CanvasEvent::Release { id }).await
    }

    pub async fn delete_sticker(&self, id: Uuid) -> bool {
        self.apply_local(CanvasEvent::Delete { id }).await
    }

    /// Apply one inbound peer packet through the same rules our own
    /// gestures go through.
    pub async fn handle_packet(&self, packet: CanvasPacket) {
        match packet {
            CanvasPacket::Event { from, event } => {
                let change = {
                    let mut state = self.state.lock().await;
                    if !state.apply(&from, &event).is_applied() {
                        debug!("Ignored stale canvas event from {}", from);
                        return;
                    }
                    Self::change_for(&state, &event)
                };
                self.publish(change);
            }
            CanvasPacket::SnapshotRequest { from } => {
                let stickers = self.state.lock().await.snapshot();
                let reply = CanvasPacket::Snapshot {
                    from: self.local_id.clone(),
                    stickers,
                };
                if let Err(e) = self.fanout.send_to(&from, &reply).await {
                    warn!("Snapshot reply to {} failed: {}", from, e);
                }
            }
            CanvasPacket::Snapshot { from, stickers } => {
                let added = self.state.lock().await.merge_snapshot(stickers);
                debug!("Merged snapshot from {}: {} new stickers", from, added);
                self.publish(CanvasChange::SnapshotMerged { added });
            }
        }
    }

    /// Ask the room for the canvas we missed by joining late. Any peer's
    /// answer fills us in.
    pub async fn request_snapshot(&self) -> Result<usize, ClientError> {
        let packet = CanvasPacket::SnapshotRequest {
            from: self.local_id.clone(),
        };
        self.fanout.broadcast(&packet).await
    }

    pub async fn stickers(&self) -> Vec<StickerEntity> {
        self.state.lock().await.snapshot()
    }

    async fn apply_local(&self, event: CanvasEvent) -> bool {
        let change = {
            let mut state = self.state.lock().await;
            if !state.apply(&self.local_id, &event).is_applied() {
                return false;
            }
            Self::change_for(&state, &event)
        };
        self.publish(change);

        let packet = CanvasPacket::Event {
            from: self.local_id.clone(),
            event,
        };
        match self.fanout.broadcast(&packet).await {
            Ok(delivered) => debug!("Canvas event broadcast to {} peers", delivered),
            Err(e) => warn!("Canvas broadcast failed: {}", e),
        }
        true
    }

    fn change_for(state: &CanvasState, event: &CanvasEvent) -> CanvasChange {
        match event {
            CanvasEvent::Delete { id } => CanvasChange::Removed(*id),
            CanvasEvent::Create { sticker } => match state.get(&sticker.id) {
                Some(current) => CanvasChange::Updated(current.clone()),
                None => CanvasChange::Removed(sticker.id),
            },
            CanvasEvent::Claim { id }
            | CanvasEvent::Mutate { id, .. }
            | CanvasEvent::Release { id } => match state.get(id) {
                Some(current) => CanvasChange::Updated(current.clone()),
                None => CanvasChange::Removed(*id),
            },
        }
    }

    fn publish(&self, change: CanvasChange) {
        // A missing listener is fine; changes are advisory.
        let _ = self.changes_tx.send(change);
    }
}
