use crate::canvas::PacketFanout;
use crate::config::TransportConfig;
use crate::error::ClientError;
use crate::peer::{PeerConnectionClient, PeerEvent};
use crate::signaling::{InboundSignal, SignalingService};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use groupshot_core::model::{CanvasPacket, PeerId, SignalingEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The set of live peer connections for the local participant, one per
/// remote peer in the room. Fans local sends out to every connected peer
/// and merges every peer's events into one upward stream. Arrival order
/// is only meaningful per peer, never across peers.
pub struct ConnectionRepository {
    local_id: PeerId,
    config: TransportConfig,
    signaling: SignalingService,
    clients: Arc<DashMap<PeerId, Arc<PeerConnectionClient>>>,
    client_event_tx: mpsc::Sender<PeerEvent>,
}

impl ConnectionRepository {
    /// Returns the repository plus the merged event stream. A client that
    /// reports `Failed` or `Disconnected` is dropped from the active set
    /// before the event is passed upward.
    pub fn new(
        signaling: SignalingService,
        config: TransportConfig,
    ) -> (Arc<Self>, mpsc::Receiver<PeerEvent>) {
        let clients: Arc<DashMap<PeerId, Arc<PeerConnectionClient>>> = Arc::new(DashMap::new());
        let (client_event_tx, mut client_event_rx) = mpsc::channel::<PeerEvent>(256);
        let (public_tx, public_rx) = mpsc::channel(256);

        let pump_clients = clients.clone();
        tokio::spawn(async move {
            while let Some(event) = client_event_rx.recv().await {
                match &event {
                    PeerEvent::Failed(peer_id, reason) => {
                        warn!("Peer {} failed: {}", peer_id, reason);
                        if let Some((_, client)) = pump_clients.remove(peer_id) {
                            tokio::spawn(async move { client.close().await });
                        }
                    }
                    PeerEvent::Disconnected(peer_id) => {
                        info!("Peer {} disconnected", peer_id);
                        if let Some((_, client)) = pump_clients.remove(peer_id) {
                            tokio::spawn(async move { client.close().await });
                        }
                    }
                    _ => {}
                }
                if public_tx.send(event).await.is_err() {
                    break;
                }
            }
            debug!("Repository event pump finished");
        });

        let repository = Arc::new(Self {
            local_id: signaling.local_id().clone(),
            config,
            signaling,
            clients,
            client_event_tx,
        });

        (repository, public_rx)
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn peer_count(&self) -> usize {
        self.clients.len()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.clients.contains_key(peer_id)
    }

    pub async fn connected_peers(&self) -> Vec<PeerId> {
        let mut connected = Vec::new();
        for client in self.snapshot() {
            if client.is_connected().await {
                connected.push(client.remote_id().clone());
            }
        }
        connected
    }

    /// Open a session towards `peer_id` and take the offerer role. Used
    /// for every member already in the room when we join.
    pub async fn connect_to(&self, peer_id: PeerId) -> Result<(), ClientError> {
        if peer_id == self.local_id || self.clients.contains_key(&peer_id) {
            return Ok(());
        }
        let client = self.create_client(peer_id.clone()).await?;
        if let Err(e) = client.start_offer().await {
            self.clients.remove(&peer_id);
            client.close().await;
            return Err(ClientError::NegotiationFailed {
                peer_id,
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// Route one decoded negotiation signal to the right peer client.
    /// Offers and early candidates create the client on demand; answers
    /// for unknown peers are stale and dropped.
    pub async fn handle_signal(&self, signal: InboundSignal) {
        let sender = signal.sender_id.clone();
        let result = match signal.event {
            SignalingEvent::Offer { sdp } => match self.client_for(sender.clone()).await {
                Ok(client) => client.handle_remote_offer(sdp).await,
                Err(e) => Err(e),
            },
            SignalingEvent::Answer { sdp } => match self.clients.get(&sender) {
                Some(client) => {
                    let client = client.value().clone();
                    client.handle_remote_answer(sdp).await
                }
                None => {
                    debug!("Dropping answer from unknown peer {}", sender);
                    Ok(())
                }
            },
            SignalingEvent::IceCandidate(candidate) => {
                match self.client_for(sender.clone()).await {
                    Ok(client) => client.handle_remote_candidate(candidate).await,
                    Err(e) => Err(e),
                }
            }
            SignalingEvent::Signaling(control) => {
                debug!("Repository ignoring control signal {:?}", control);
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Negotiation step with {} failed: {}", sender, e);
        }
    }

    /// Send to every connected peer, skipping the rest. No queuing for
    /// peers still negotiating; late joiners catch up via a snapshot.
    /// Returns how many peers the frame went to.
    pub async fn broadcast(&self, data: &Bytes) -> usize {
        let mut delivered = 0;
        // Snapshot first so the map lock is never held across a send.
        for client in self.snapshot() {
            match client.send(data).await {
                Ok(()) => delivered += 1,
                Err(ClientError::PeerNotConnected(_)) => {}
                Err(e) => warn!("Broadcast to {} failed: {}", client.remote_id(), e),
            }
        }
        delivered
    }

    pub async fn send_to(&self, peer_id: &PeerId, data: &Bytes) -> Result<(), ClientError> {
        let Some(client) = self.clients.get(peer_id).map(|c| c.value().clone()) else {
            return Err(ClientError::PeerNotConnected(peer_id.clone()));
        };
        client.send(data).await
    }

    /// Drop one peer, e.g. after the relay said it left the room.
    pub async fn remove(&self, peer_id: &PeerId) {
        if let Some((_, client)) = self.clients.remove(peer_id) {
            client.close().await;
        }
    }

    /// Tear down every session immediately. No drain: in-flight sends
    /// are abandoned with the transports.
    pub async fn close_all(&self) {
        let clients: Vec<_> = self
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.clients.clear();
        for client in clients {
            client.close().await;
        }
    }

    fn snapshot(&self) -> Vec<Arc<PeerConnectionClient>> {
        self.clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    async fn client_for(&self, peer_id: PeerId) -> Result<Arc<PeerConnectionClient>, ClientError> {
        if let Some(client) = self.clients.get(&peer_id) {
            return Ok(client.value().clone());
        }
        self.create_client(peer_id).await
    }

    async fn create_client(
        &self,
        peer_id: PeerId,
    ) -> Result<Arc<PeerConnectionClient>, ClientError> {
        let client = Arc::new(
            PeerConnectionClient::new(
                self.local_id.clone(),
                peer_id.clone(),
                self.config.clone(),
                self.signaling.clone(),
                self.client_event_tx.clone(),
            )
            .await?,
        );
        // Another task may have raced us here; whoever landed first wins
        // and the losing transport is discarded.
        match self.clients.entry(peer_id) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                let winner = existing.get().clone();
                drop(existing);
                client.close().await;
                Ok(winner)
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(client.clone());
                Ok(client)
            }
        }
    }
}

#[async_trait]
impl PacketFanout for ConnectionRepository {
    async fn broadcast(&self, packet: &CanvasPacket) -> Result<usize, ClientError> {
        let data = packet.encode()?;
        Ok(ConnectionRepository::broadcast(self, &data).await)
    }

    async fn send_to(&self, peer_id: &PeerId, packet: &CanvasPacket) -> Result<(), ClientError> {
        let data = packet.encode()?;
        ConnectionRepository::send_to(self, peer_id, &data).await
    }
}
