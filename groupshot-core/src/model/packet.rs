use crate::canvas::CanvasEvent;
use crate::model::peer::PeerId;
use crate::model::sticker::StickerEntity;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Application message carried peer-to-peer over the canvas data channel.
/// The relay never sees these. Postcard on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CanvasPacket {
    Event { from: PeerId, event: CanvasEvent },
    SnapshotRequest { from: PeerId },
    Snapshot { from: PeerId, stickers: Vec<StickerEntity> },
}

impl CanvasPacket {
    pub fn from(&self) -> &PeerId {
        match self {
            CanvasPacket::Event { from, .. }
            | CanvasPacket::SnapshotRequest { from }
            | CanvasPacket::Snapshot { from, .. } => from,
        }
    }

    pub fn encode(&self) -> Result<Bytes, postcard::Error> {
        postcard::to_allocvec(self).map(Bytes::from)
    }

    pub fn decode(data: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(data)
    }
}
