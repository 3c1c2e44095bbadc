use bytes::Bytes;
use groupshot_core::model::PeerId;
use std::sync::Arc;

/// The media pipeline's side of the capture contract: whoever renders a
/// participant's video keeps the latest decoded frame around as an opaque
/// value. The core never learns the pixel format.
pub trait FrameSource: Send + Sync {
    fn peer_id(&self) -> PeerId;
    fn latest_frame(&self) -> Option<Bytes>;
}

#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub peer_id: PeerId,
    pub data: Bytes,
}

/// The capture trigger: one registered source per participant, one frame
/// per source at the moment the shutter fires. Sources that have not
/// decoded anything yet are simply absent from the result.
#[derive(Default)]
pub struct CaptureSession {
    sources: Vec<Arc<dyn FrameSource>>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Arc<dyn FrameSource>) {
        self.sources.push(source);
    }

    pub fn capture(&self) -> Vec<CapturedFrame> {
        self.sources
            .iter()
            .filter_map(|source| {
                source.latest_frame().map(|data| CapturedFrame {
                    peer_id: source.peer_id(),
                    data,
                })
            })
            .collect()
    }
}
