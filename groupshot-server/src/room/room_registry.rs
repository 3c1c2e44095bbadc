use crate::room::{Room, RoomCommand};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use groupshot_core::model::RoomId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Live rooms, keyed by their unguessable id. Possession of the id is the
/// whole admission check; there is no account layer in front of it.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
    signaling: Arc<dyn SignalingOutput>,
}

impl RoomRegistry {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
        }
    }

    /// Mint a fresh room and spawn its event loop. The actor removes its
    /// own registry entry once the last member leaves.
    pub fn create_room(&self) -> RoomId {
        let room_id = RoomId::new();
        info!("Creating room {}", room_id);

        let (tx, rx) = mpsc::channel(100);
        let room = Room::new(
            room_id.clone(),
            rx,
            self.signaling.clone(),
            self.rooms.clone(),
        );
        tokio::spawn(room.run());

        self.rooms.insert(room_id.clone(), tx);
        room_id
    }

    pub fn sender(&self, room_id: &RoomId) -> Option<mpsc::Sender<RoomCommand>> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
