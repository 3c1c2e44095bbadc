use crate::error::ClientError;
use crate::repository::ConnectionRepository;
use crate::signaling::{InboundSignal, SignalingService};
use groupshot_core::model::{PeerId, RoomControl, RoomId, SignalingEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Thin orchestration over the relay: create a room, join one, leave.
///
/// Owns the dispatch of inbound relay signals: negotiation traffic goes
/// to the repository, room control comes back to the caller awaiting it
/// here. When the relay connection dies the control stream ends and every
/// pending call fails with [`ClientError::RelayClosed`]; rejoining is the
/// user's move, there is no automatic reconnect.
pub struct RoomSession {
    signaling: SignalingService,
    repository: Arc<ConnectionRepository>,
    control_rx: mpsc::UnboundedReceiver<RoomControl>,
    room_id: Option<RoomId>,
}

impl RoomSession {
    pub fn new(
        signaling: SignalingService,
        repository: Arc<ConnectionRepository>,
        mut signals: mpsc::UnboundedReceiver<InboundSignal>,
    ) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let dispatch_repository = repository.clone();
        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                match signal.event {
                    SignalingEvent::Signaling(control) => match control {
                        RoomControl::PeerJoined { peer_id } => {
                            // The newcomer takes the offerer role; our
                            // client appears when their offer arrives.
                            info!("Peer {} joined the room", peer_id);
                        }
                        RoomControl::PeerLeft { peer_id } => {
                            info!("Peer {} left the room", peer_id);
                            dispatch_repository.remove(&peer_id).await;
                        }
                        other => {
                            if control_tx.send(other).is_err() {
                                break;
                            }
                        }
                    },
                    _ => dispatch_repository.handle_signal(signal).await,
                }
            }
            debug!("Signal dispatcher finished");
        });

        Self {
            signaling,
            repository,
            control_rx,
            room_id: None,
        }
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    /// Ask the relay for a fresh room and turn its id into a share link.
    pub async fn create_room(&mut self, base_url: &str) -> Result<(RoomId, String), ClientError> {
        self.signaling.send_control(None, &RoomControl::CreateRoom)?;

        loop {
            match self.control_rx.recv().await {
                Some(RoomControl::RoomCreated { room_id }) => {
                    let link = room_id.share_link(base_url);
                    info!("Created room {}", room_id);
                    return Ok((room_id, link));
                }
                Some(other) => debug!("Ignoring control {:?} while creating a room", other),
                None => return Err(ClientError::RelayClosed),
            }
        }
    }

    /// Join a room by its id (the capability from a share link) and start
    /// negotiating towards every member already there.
    pub async fn join(&mut self, room_id: RoomId) -> Result<Vec<PeerId>, ClientError> {
        self.signaling.send_control(
            None,
            &RoomControl::JoinRoom {
                room_id: room_id.clone(),
            },
        )?;

        loop {
            match self.control_rx.recv().await {
                Some(RoomControl::JoinAccepted { room_id, members }) => {
                    info!("Joined room {} with {} members", room_id, members.len());
                    self.room_id = Some(room_id);
                    for member in &members {
                        if let Err(e) = self.repository.connect_to(member.clone()).await {
                            warn!("Failed to start negotiation with {}: {}", member, e);
                        }
                    }
                    return Ok(members);
                }
                Some(RoomControl::JoinRejected { reason }) => {
                    return Err(ClientError::RoomJoinRejected(reason));
                }
                Some(other) => debug!("Ignoring control {:?} while joining", other),
                None => return Err(ClientError::RelayClosed),
            }
        }
    }

    /// Leave the room and drop every peer connection on the spot.
    pub async fn leave(&mut self) -> Result<(), ClientError> {
        if self.room_id.take().is_some() {
            self.signaling.send_control(None, &RoomControl::LeaveRoom)?;
        }
        self.repository.close_all().await;
        Ok(())
    }

    /// End the session: leave if needed and close the shared relay
    /// connection.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.leave().await {
            debug!("Leave during shutdown failed: {}", e);
        }
        self.signaling.close();
    }
}
