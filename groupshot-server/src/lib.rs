pub mod room;
pub mod signaling;

pub use room::{Room, RoomCommand, RoomRegistry};
pub use signaling::{SignalingOutput, SignalingService, ws_handler};

use std::sync::Arc;

/// Shared axum state: the WebSocket fan-out plus the room registry.
#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
    pub registry: RoomRegistry,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let signaling = SignalingService::new();
        let registry = RoomRegistry::new(Arc::new(signaling.clone()));
        Arc::new(Self {
            signaling,
            registry,
        })
    }
}
