use crate::error::ClientError;
use groupshot_core::model::{
    IceCandidatePayload, PeerId, RoomControl, SignalingEnvelope, SignalingEvent,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Something that can carry wire frames to the relay. The production
/// implementation is [`crate::signaling::RelayConnection`]; tests swap in
/// loopbacks.
pub trait SignalTransport: Send + Sync {
    fn send_text(&self, text: String) -> Result<(), ClientError>;
    fn close(&self);
}

/// A decoded inbound envelope with its routing fields.
#[derive(Debug, Clone)]
pub struct InboundSignal {
    pub sender_id: PeerId,
    pub target_id: Option<PeerId>,
    pub event: SignalingEvent,
}

/// Encodes local negotiation intents into envelopes and decodes the
/// relay's frames back into typed events. Routing stays the relay's
/// business; this layer never looks at who a frame is for.
#[derive(Clone)]
pub struct SignalingService {
    local_id: PeerId,
    transport: Arc<dyn SignalTransport>,
}

impl SignalingService {
    pub fn new(local_id: PeerId, transport: Arc<dyn SignalTransport>) -> Self {
        Self {
            local_id,
            transport,
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn send_offer(&self, target: &PeerId, sdp: String) -> Result<(), ClientError> {
        self.send(SignalingEnvelope::offer(
            self.local_id.clone(),
            target.clone(),
            sdp,
        ))
    }

    pub fn send_answer(&self, target: &PeerId, sdp: String) -> Result<(), ClientError> {
        self.send(SignalingEnvelope::answer(
            self.local_id.clone(),
            target.clone(),
            sdp,
        ))
    }

    pub fn send_ice(
        &self,
        target: &PeerId,
        candidate: IceCandidatePayload,
    ) -> Result<(), ClientError> {
        self.send(SignalingEnvelope::ice_candidate(
            self.local_id.clone(),
            target.clone(),
            candidate,
        ))
    }

    pub fn send_control(
        &self,
        target: Option<PeerId>,
        control: &RoomControl,
    ) -> Result<(), ClientError> {
        self.send(SignalingEnvelope::signaling(
            self.local_id.clone(),
            target,
            control,
        ))
    }

    fn send(&self, envelope: SignalingEnvelope) -> Result<(), ClientError> {
        self.transport.send_text(envelope.to_json())
    }

    pub fn close(&self) {
        self.transport.close();
    }

    /// Turn raw relay frames into typed signals. Frames that fail to
    /// decode are logged and dropped here; a garbled envelope must never
    /// read as a peer failure.
    pub fn spawn_decoder(
        mut raw_rx: mpsc::UnboundedReceiver<String>,
    ) -> mpsc::UnboundedReceiver<InboundSignal> {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(text) = raw_rx.recv().await {
                let envelope = match SignalingEnvelope::from_json(&text) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("Dropping malformed relay frame: {}", e);
                        continue;
                    }
                };
                let event = match envelope.decode() {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Dropping malformed payload from {}: {}", envelope.sender_id, e);
                        continue;
                    }
                };
                let signal = InboundSignal {
                    sender_id: envelope.sender_id,
                    target_id: envelope.target_id,
                    event,
                };
                if tx.send(signal).is_err() {
                    break;
                }
            }
            debug!("Signal decoder finished");
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingTransport {
        sent: Mutex<Vec<String>>,
    }

    impl SignalTransport for RecordingTransport {
        fn send_text(&self, text: String) -> Result<(), ClientError> {
            self.sent.lock().unwrap().push(text);
            Ok(())
        }

        fn close(&self) {}
    }

    #[tokio::test]
    async fn malformed_frames_are_dropped_without_ending_the_stream() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut signals = SignalingService::spawn_decoder(raw_rx);

        let sender = PeerId::new();
        raw_tx.send("not json at all".into()).unwrap();
        raw_tx
            .send(format!(
                r#"{{"messageType":"offer","message":{{"wrong":"shape"}},"senderId":"{sender}"}}"#
            ))
            .unwrap();
        let good = SignalingEnvelope::offer(sender.clone(), PeerId::new(), "v=0 sdp".into());
        raw_tx.send(good.to_json()).unwrap();

        let signal = signals.recv().await.expect("good frame survives");
        assert_eq!(signal.sender_id, sender);
        assert!(matches!(signal.event, SignalingEvent::Offer { .. }));
    }

    #[tokio::test]
    async fn send_helpers_encode_routable_envelopes() {
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
        });
        let local = PeerId::new();
        let target = PeerId::new();
        let service = SignalingService::new(local.clone(), transport.clone());

        service.send_offer(&target, "v=0 sdp".into()).unwrap();
        service
            .send_control(None, &RoomControl::CreateRoom)
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        let offer = SignalingEnvelope::from_json(&sent[0]).unwrap();
        assert_eq!(offer.sender_id, local);
        assert_eq!(offer.target_id, Some(target));

        let control = SignalingEnvelope::from_json(&sent[1]).unwrap();
        assert_eq!(control.target_id, None);
    }
}
