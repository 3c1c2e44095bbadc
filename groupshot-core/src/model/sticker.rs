use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position and size of a sticker on the shared canvas, in canvas points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// One shared canvas object. `owner` is the single participant currently
/// allowed to move, resize or delete it; `None` means free for claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StickerEntity {
    pub id: Uuid,
    pub image_url: String,
    pub frame: Frame,
    pub owner: Option<PeerId>,
}

impl StickerEntity {
    pub fn new(image_url: impl Into<String>, frame: Frame) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_url: image_url.into(),
            frame,
            owner: None,
        }
    }
}

/// Catalog entry for a decorative asset. Fetching the catalog itself is an
/// external concern; this is only the shape it hands us.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StickerAsset {
    pub name: String,
    pub image: String,
}
