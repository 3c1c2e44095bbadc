use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Wire-level message class. The relay routes on `sender_id`/`target_id`
/// only and never looks inside `message`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EnvelopeKind {
    Offer,
    Answer,
    IceCandidate,
    Signaling,
}

/// One relay protocol event. Constructed once, never mutated.
/// `target_id == None` means "every other member of my room".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignalingEnvelope {
    pub message_type: EnvelopeKind,
    pub message: Value,
    pub sender_id: PeerId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_id: Option<PeerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferPayload {
    pub sdp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerPayload {
    pub sdp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidatePayload {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// Room management traffic carried under `EnvelopeKind::Signaling`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum RoomControl {
    CreateRoom,
    RoomCreated { room_id: RoomId },
    JoinRoom { room_id: RoomId },
    JoinAccepted { room_id: RoomId, members: Vec<PeerId> },
    JoinRejected { reason: String },
    PeerJoined { peer_id: PeerId },
    LeaveRoom,
    PeerLeft { peer_id: PeerId },
}

/// A decoded envelope payload, shaped by its declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    Offer { sdp: String },
    Answer { sdp: String },
    IceCandidate(IceCandidatePayload),
    Signaling(RoomControl),
}

/// Decode failure: the payload does not match the declared message type,
/// or the wire text is not a valid envelope at all. Dropped and logged by
/// callers, never escalated to a peer-connection failure.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("malformed envelope: {reason}")]
pub struct MalformedEnvelope {
    pub reason: String,
}

impl MalformedEnvelope {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SignalingEnvelope {
    pub fn offer(sender_id: PeerId, target_id: PeerId, sdp: String) -> Self {
        Self {
            message_type: EnvelopeKind::Offer,
            message: serde_json::json!({ "sdp": sdp }),
            sender_id,
            target_id: Some(target_id),
        }
    }

    pub fn answer(sender_id: PeerId, target_id: PeerId, sdp: String) -> Self {
        Self {
            message_type: EnvelopeKind::Answer,
            message: serde_json::json!({ "sdp": sdp }),
            sender_id,
            target_id: Some(target_id),
        }
    }

    pub fn ice_candidate(
        sender_id: PeerId,
        target_id: PeerId,
        candidate: IceCandidatePayload,
    ) -> Self {
        Self {
            message_type: EnvelopeKind::IceCandidate,
            message: serde_json::json!({
                "candidate": candidate.candidate,
                "sdpMid": candidate.sdp_mid,
                "sdpMLineIndex": candidate.sdp_m_line_index,
            }),
            sender_id,
            target_id: Some(target_id),
        }
    }

    pub fn signaling(sender_id: PeerId, target_id: Option<PeerId>, control: &RoomControl) -> Self {
        // RoomControl contains only strings, uuids and vecs of those, so
        // this serialization cannot fail.
        let message = serde_json::to_value(control)
            .expect("room control payload serializes to JSON");
        Self {
            message_type: EnvelopeKind::Signaling,
            message,
            sender_id,
            target_id,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("envelope serializes to JSON")
    }

    /// Parse the wire text. An unknown `messageType` is a hard decode
    /// error here, not something to skip over: silently ignoring it would
    /// mask a protocol-version mismatch between peers.
    pub fn from_json(text: &str) -> Result<Self, MalformedEnvelope> {
        serde_json::from_str(text).map_err(|e| MalformedEnvelope::new(e.to_string()))
    }

    /// Interpret the opaque payload against the declared message type.
    pub fn decode(&self) -> Result<SignalingEvent, MalformedEnvelope> {
        match self.message_type {
            EnvelopeKind::Offer => {
                let OfferPayload { sdp } = self.payload()?;
                Ok(SignalingEvent::Offer { sdp })
            }
            EnvelopeKind::Answer => {
                let AnswerPayload { sdp } = self.payload()?;
                Ok(SignalingEvent::Answer { sdp })
            }
            EnvelopeKind::IceCandidate => Ok(SignalingEvent::IceCandidate(self.payload()?)),
            EnvelopeKind::Signaling => Ok(SignalingEvent::Signaling(self.payload()?)),
        }
    }

    fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, MalformedEnvelope> {
        serde_json::from_value(self.message.clone()).map_err(|e| {
            MalformedEnvelope::new(format!("{:?} payload: {}", self.message_type, e))
        })
    }
}
