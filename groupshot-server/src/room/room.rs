use crate::room::room_command::RoomCommand;
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use groupshot_core::model::{PeerId, RoomControl, RoomId, SignalingEnvelope};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One room's event loop. All membership mutation and relay iteration for
/// a room happens on this single task, so a broadcast can never observe a
/// half-updated member set.
pub struct Room {
    room_id: RoomId,
    members: HashSet<PeerId>,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
    registry_rooms: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
}

impl Room {
    pub fn new(
        room_id: RoomId,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
        registry_rooms: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
    ) -> Self {
        Self {
            room_id,
            members: HashSet::new(),
            command_rx,
            signaling,
            registry_rooms,
        }
    }

    pub async fn run(mut self) {
        info!("Room {} event loop started", self.room_id);

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RoomCommand::Join { peer_id } => self.handle_join(peer_id).await,
                RoomCommand::Relay { envelope } => self.handle_relay(envelope).await,
                RoomCommand::Leave { peer_id } => {
                    self.handle_leave(peer_id).await;
                    if self.members.is_empty() {
                        break;
                    }
                }
            }
        }

        self.registry_rooms.remove(&self.room_id);
        info!("Room {} deleted", self.room_id);
    }

    async fn handle_join(&mut self, peer_id: PeerId) {
        let existing: Vec<PeerId> = self.members.iter().cloned().collect();

        if !self.members.insert(peer_id.clone()) {
            warn!("Peer {} joined room {} twice", peer_id, self.room_id);
            return;
        }
        info!("Peer {} joined room {}", peer_id, self.room_id);

        let accepted = RoomControl::JoinAccepted {
            room_id: self.room_id.clone(),
            members: existing.clone(),
        };
        self.signaling
            .forward(
                peer_id.clone(),
                SignalingEnvelope::signaling(peer_id.clone(), Some(peer_id.clone()), &accepted),
            )
            .await;

        let joined = RoomControl::PeerJoined {
            peer_id: peer_id.clone(),
        };
        for member in existing {
            self.signaling
                .forward(
                    member.clone(),
                    SignalingEnvelope::signaling(peer_id.clone(), Some(member), &joined),
                )
                .await;
        }
    }

    /// Best-effort, at-most-once delivery. A named target that already
    /// left is a silent no-op.
    async fn handle_relay(&mut self, envelope: SignalingEnvelope) {
        if !self.members.contains(&envelope.sender_id) {
            warn!(
                "Dropping envelope from non-member {} of room {}",
                envelope.sender_id, self.room_id
            );
            return;
        }

        match &envelope.target_id {
            Some(target) => {
                if self.members.contains(target) {
                    self.signaling.forward(target.clone(), envelope.clone()).await;
                }
            }
            None => {
                let recipients: Vec<PeerId> = self
                    .members
                    .iter()
                    .filter(|m| **m != envelope.sender_id)
                    .cloned()
                    .collect();
                for member in recipients {
                    self.signaling.forward(member, envelope.clone()).await;
                }
            }
        }
    }

    async fn handle_leave(&mut self, peer_id: PeerId) {
        if !self.members.remove(&peer_id) {
            return;
        }
        info!("Peer {} left room {}", peer_id, self.room_id);

        let left = RoomControl::PeerLeft {
            peer_id: peer_id.clone(),
        };
        for member in self.members.iter().cloned().collect::<Vec<_>>() {
            self.signaling
                .forward(
                    member.clone(),
                    SignalingEnvelope::signaling(peer_id.clone(), Some(member), &left),
                )
                .await;
        }
    }
}
