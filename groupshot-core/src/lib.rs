pub mod canvas;
pub mod model;

pub use canvas::{CanvasEvent, CanvasState, Decision};
pub use model::{
    EnvelopeKind, MalformedEnvelope, PeerId, RoomControl, RoomId, SignalingEnvelope,
    SignalingEvent, StickerEntity,
};
