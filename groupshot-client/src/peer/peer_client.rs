use crate::config::TransportConfig;
use crate::error::ClientError;
use crate::peer::negotiation::{Negotiation, NegotiationState, NegotiationStep};
use crate::peer::peer_event::PeerEvent;
use crate::signaling::SignalingService;
use bytes::Bytes;
use groupshot_core::model::{IceCandidatePayload, PeerId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// Label of the data channel carrying canvas traffic. The handshake is
/// not complete until this channel is open on both ends.
pub const CANVAS_CHANNEL_LABEL: &str = "canvas";

/// Everything a transport callback needs, cloneable into `'static`
/// closures. `wired_at` pins the callback to the peer-connection
/// generation it was registered on, so a torn-down transport (offer
/// glare) cannot poison its replacement.
#[derive(Clone)]
struct CallbackCtx {
    remote_id: PeerId,
    signaling: SignalingService,
    event_tx: mpsc::Sender<PeerEvent>,
    negotiation: Arc<Mutex<Negotiation>>,
    data_channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    generation: Arc<AtomicU64>,
    wired_at: u64,
}

impl CallbackCtx {
    fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.wired_at
    }
}

/// One peer-to-peer session with one remote participant: the negotiation
/// state machine plus the transport it drives.
pub struct PeerConnectionClient {
    remote_id: PeerId,
    config: TransportConfig,
    signaling: SignalingService,
    event_tx: mpsc::Sender<PeerEvent>,
    negotiation: Arc<Mutex<Negotiation>>,
    data_channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    generation: Arc<AtomicU64>,
    pc: Mutex<Arc<RTCPeerConnection>>,
}

impl PeerConnectionClient {
    pub async fn new(
        local_id: PeerId,
        remote_id: PeerId,
        config: TransportConfig,
        signaling: SignalingService,
        event_tx: mpsc::Sender<PeerEvent>,
    ) -> Result<Self, ClientError> {
        let negotiation = Arc::new(Mutex::new(Negotiation::new(
            local_id.clone(),
            remote_id.clone(),
        )));
        let data_channel = Arc::new(Mutex::new(None));
        let generation = Arc::new(AtomicU64::new(0));

        let ctx = CallbackCtx {
            remote_id: remote_id.clone(),
            signaling: signaling.clone(),
            event_tx: event_tx.clone(),
            negotiation: negotiation.clone(),
            data_channel: data_channel.clone(),
            generation: generation.clone(),
            wired_at: 0,
        };
        let pc = Self::build_transport(&config, ctx).await?;

        Ok(Self {
            remote_id,
            config,
            signaling,
            event_tx,
            negotiation,
            data_channel,
            generation,
            pc: Mutex::new(pc),
        })
    }

    pub fn remote_id(&self) -> &PeerId {
        &self.remote_id
    }

    pub async fn state(&self) -> NegotiationState {
        self.negotiation.lock().await.state()
    }

    pub async fn is_connected(&self) -> bool {
        self.negotiation.lock().await.is_connected()
    }

    /// Take the offerer role: open the canvas channel, produce an offer
    /// and push it through the relay.
    pub async fn start_offer(&self) -> Result<(), ClientError> {
        let pc = self.current_pc().await;
        let dc = pc.create_data_channel(CANVAS_CHANNEL_LABEL, None).await?;
        Self::setup_channel(dc, self.ctx().await);

        let offer = pc.create_offer(None).await?;
        pc.set_local_description(offer.clone()).await?;
        self.negotiation.lock().await.offer_sent();
        self.signaling.send_offer(&self.remote_id, offer.sdp)?;
        debug!("Sent offer to {}", self.remote_id);
        Ok(())
    }

    pub async fn handle_remote_offer(&self, sdp: String) -> Result<(), ClientError> {
        let step = self.negotiation.lock().await.remote_offer();
        match step {
            NegotiationStep::AnswerOffer { flush } => self.answer(sdp, flush, false).await,
            NegotiationStep::YieldAndAnswer { flush } => {
                info!(
                    "Offer glare with {}: yielding the offerer role",
                    self.remote_id
                );
                self.answer(sdp, flush, true).await
            }
            NegotiationStep::HoldOffer => {
                debug!(
                    "Offer glare with {}: holding our offer, dropping theirs",
                    self.remote_id
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub async fn handle_remote_answer(&self, sdp: String) -> Result<(), ClientError> {
        let step = self.negotiation.lock().await.remote_answer();
        let NegotiationStep::ApplyAnswer { flush } = step else {
            debug!("Dropping stale answer from {}", self.remote_id);
            return Ok(());
        };

        let pc = self.current_pc().await;
        let desc = RTCSessionDescription::answer(sdp)?;
        pc.set_remote_description(desc).await?;
        self.flush_candidates(&pc, flush).await;
        Ok(())
    }

    pub async fn handle_remote_candidate(
        &self,
        candidate: IceCandidatePayload,
    ) -> Result<(), ClientError> {
        let step = self.negotiation.lock().await.remote_candidate(candidate);
        match step {
            NegotiationStep::ApplyCandidate(candidate) => {
                let pc = self.current_pc().await;
                self.flush_candidates(&pc, vec![candidate]).await;
                Ok(())
            }
            NegotiationStep::Buffered => {
                debug!("Buffered early candidate from {}", self.remote_id);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Send one canvas frame. Only valid while the handshake is complete;
    /// everything else is the caller's cue to wait or give up.
    pub async fn send(&self, data: &Bytes) -> Result<(), ClientError> {
        if !self.negotiation.lock().await.is_connected() {
            return Err(ClientError::PeerNotConnected(self.remote_id.clone()));
        }
        let channel = self.data_channel.lock().await.clone();
        let Some(dc) = channel else {
            return Err(ClientError::PeerNotConnected(self.remote_id.clone()));
        };
        dc.send(data).await?;
        Ok(())
    }

    /// Immediate teardown, no drain. Anything in flight is abandoned.
    pub async fn close(&self) {
        self.negotiation.lock().await.closed();
        let pc = self.current_pc().await;
        if let Err(e) = pc.close().await {
            warn!("Error closing transport to {}: {}", self.remote_id, e);
        }
    }

    async fn answer(
        &self,
        sdp: String,
        flush: Vec<IceCandidatePayload>,
        rebuild: bool,
    ) -> Result<(), ClientError> {
        if rebuild {
            // Our own offer is abandoned; the surviving session is the
            // remote one, negotiated on a fresh transport.
            let next_gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let old = self.current_pc().await;
            let _ = old.close().await;
            *self.data_channel.lock().await = None;

            let ctx = CallbackCtx {
                wired_at: next_gen,
                ..self.ctx().await
            };
            let fresh = Self::build_transport(&self.config, ctx).await?;
            *self.pc.lock().await = fresh;
        }

        let pc = self.current_pc().await;
        let desc = RTCSessionDescription::offer(sdp)?;
        pc.set_remote_description(desc).await?;
        self.flush_candidates(&pc, flush).await;

        let answer = pc.create_answer(None).await?;
        pc.set_local_description(answer.clone()).await?;
        self.negotiation.lock().await.answer_sent();
        self.signaling.send_answer(&self.remote_id, answer.sdp)?;
        debug!("Sent answer to {}", self.remote_id);
        Ok(())
    }

    async fn current_pc(&self) -> Arc<RTCPeerConnection> {
        self.pc.lock().await.clone()
    }

    async fn ctx(&self) -> CallbackCtx {
        CallbackCtx {
            remote_id: self.remote_id.clone(),
            signaling: self.signaling.clone(),
            event_tx: self.event_tx.clone(),
            negotiation: self.negotiation.clone(),
            data_channel: self.data_channel.clone(),
            generation: self.generation.clone(),
            wired_at: self.generation.load(Ordering::SeqCst),
        }
    }

    /// Candidates are applied in the order they arrived; a failing one is
    /// logged and skipped, the rest still go in.
    async fn flush_candidates(
        &self,
        pc: &Arc<RTCPeerConnection>,
        candidates: Vec<IceCandidatePayload>,
    ) {
        for candidate in candidates {
            let init = RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_m_line_index,
                ..Default::default()
            };
            if let Err(e) = pc.add_ice_candidate(init).await {
                warn!("Failed to add ICE candidate from {}: {}", self.remote_id, e);
            }
        }
    }

    async fn build_transport(
        config: &TransportConfig,
        ctx: CallbackCtx,
    ) -> Result<Arc<RTCPeerConnection>, ClientError> {
        let mut media = MediaEngine::default();
        media.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media)?;

        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: config.ice_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_ctx = ctx.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let ctx = state_ctx.clone();
            Box::pin(async move {
                if !ctx.is_current() {
                    return;
                }
                debug!("Transport state for {}: {}", ctx.remote_id, s);
                match s {
                    RTCPeerConnectionState::Connected => {
                        if ctx.negotiation.lock().await.transport_connected() {
                            let _ = ctx
                                .event_tx
                                .send(PeerEvent::Connected(ctx.remote_id.clone()))
                                .await;
                        }
                    }
                    RTCPeerConnectionState::Failed => {
                        if ctx.negotiation.lock().await.transport_failed() {
                            let _ = ctx
                                .event_tx
                                .send(PeerEvent::Failed(
                                    ctx.remote_id.clone(),
                                    "transport failed".into(),
                                ))
                                .await;
                        }
                    }
                    RTCPeerConnectionState::Disconnected | RTCPeerConnectionState::Closed => {
                        if ctx.negotiation.lock().await.closed() {
                            let _ = ctx
                                .event_tx
                                .send(PeerEvent::Disconnected(ctx.remote_id.clone()))
                                .await;
                        }
                    }
                    _ => {}
                }
            })
        }));

        // Trickle ICE: every locally gathered candidate goes straight to
        // the remote peer through the relay.
        let ice_ctx = ctx.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let ctx = ice_ctx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                if !ctx.is_current() {
                    return;
                }
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let payload = IceCandidatePayload {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                if let Err(e) = ctx.signaling.send_ice(&ctx.remote_id, payload) {
                    warn!("Failed to send ICE candidate to {}: {}", ctx.remote_id, e);
                }
            })
        }));

        // Answerer side: the offerer opens the channel, we adopt it.
        let dc_ctx = ctx.clone();
        pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let ctx = dc_ctx.clone();
            Box::pin(async move {
                debug!(
                    "Inbound data channel '{}' from {}",
                    dc.label(),
                    ctx.remote_id
                );
                Self::setup_channel(dc, ctx);
            })
        }));

        Ok(pc)
    }

    fn setup_channel(dc: Arc<RTCDataChannel>, ctx: CallbackCtx) {
        let open_ctx = ctx.clone();
        let dc_for_open = dc.clone();
        dc.on_open(Box::new(move || {
            let ctx = open_ctx.clone();
            let dc = dc_for_open.clone();
            Box::pin(async move {
                if !ctx.is_current() {
                    return;
                }
                info!("Canvas channel open with {}", ctx.remote_id);
                *ctx.data_channel.lock().await = Some(dc);
                if ctx.negotiation.lock().await.channel_open() {
                    let _ = ctx
                        .event_tx
                        .send(PeerEvent::Connected(ctx.remote_id.clone()))
                        .await;
                }
            })
        }));

        let msg_ctx = ctx;
        dc.on_message(Box::new(move |msg: DataChannelMessage| {
            let ctx = msg_ctx.clone();
            Box::pin(async move {
                if !ctx.is_current() {
                    return;
                }
                let bytes = Bytes::from(msg.data.to_vec());
                let _ = ctx
                    .event_tx
                    .send(PeerEvent::Message(ctx.remote_id.clone(), bytes))
                    .await;
            })
        }));
    }
}
