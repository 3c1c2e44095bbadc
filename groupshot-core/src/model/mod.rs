mod envelope;
mod packet;
mod peer;
mod room;
mod sticker;

pub use envelope::{
    AnswerPayload, EnvelopeKind, IceCandidatePayload, MalformedEnvelope, OfferPayload,
    RoomControl, SignalingEnvelope, SignalingEvent,
};
pub use packet::CanvasPacket;
pub use peer::PeerId;
pub use room::RoomId;
pub use sticker::{Frame, StickerAsset, StickerEntity};
