use crate::AppState;
use crate::room::RoomCommand;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use groupshot_core::model::{
    EnvelopeKind, PeerId, RoomControl, RoomId, SignalingEnvelope, SignalingEvent,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(peer_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let Ok(peer_id) = Uuid::parse_str(&peer_id).map(PeerId) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, state))
        .into_response()
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, state: Arc<AppState>) {
    info!("New WebSocket connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.signaling.add_peer(peer_id.clone(), tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();
        let peer_id = peer_id.clone();

        async move {
            // The room this socket has joined, if any. One room per
            // connection; rejoining replaces it.
            let mut joined: Option<(RoomId, mpsc::Sender<RoomCommand>)> = None;

            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        handle_envelope(&state, &peer_id, &text, &mut joined).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            if let Some((_, room_tx)) = joined.take() {
                let _ = room_tx
                    .send(RoomCommand::Leave {
                        peer_id: peer_id.clone(),
                    })
                    .await;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.signaling.remove_peer(&peer_id);
    info!("WebSocket disconnected: {}", peer_id);
}

async fn handle_envelope(
    state: &Arc<AppState>,
    peer_id: &PeerId,
    text: &str,
    joined: &mut Option<(RoomId, mpsc::Sender<RoomCommand>)>,
) {
    let envelope = match SignalingEnvelope::from_json(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Dropping malformed envelope from {}: {}", peer_id, e);
            return;
        }
    };

    if envelope.sender_id != *peer_id {
        warn!(
            "Dropping envelope claiming sender {} on {}'s socket",
            envelope.sender_id, peer_id
        );
        return;
    }

    if envelope.message_type != EnvelopeKind::Signaling {
        relay(peer_id, envelope, joined).await;
        return;
    }

    let control = match envelope.decode() {
        Ok(SignalingEvent::Signaling(control)) => control,
        Ok(_) | Err(_) => {
            warn!("Dropping malformed control envelope from {}", peer_id);
            return;
        }
    };

    match control {
        RoomControl::CreateRoom => {
            let room_id = state.registry.create_room();
            reply(state, peer_id, &RoomControl::RoomCreated { room_id });
        }
        RoomControl::JoinRoom { room_id } => match state.registry.sender(&room_id) {
            Some(room_tx) => {
                // One room per connection: joining another leaves the
                // current one first.
                if let Some((_, old_tx)) = joined.take() {
                    let _ = old_tx
                        .send(RoomCommand::Leave {
                            peer_id: peer_id.clone(),
                        })
                        .await;
                }
                let cmd = RoomCommand::Join {
                    peer_id: peer_id.clone(),
                };
                if let Err(e) = room_tx.send(cmd).await {
                    error!("Room {} died: {}", room_id, e);
                    reply(
                        state,
                        peer_id,
                        &RoomControl::JoinRejected {
                            reason: "room no longer exists".into(),
                        },
                    );
                    return;
                }
                *joined = Some((room_id, room_tx));
            }
            None => {
                reply(
                    state,
                    peer_id,
                    &RoomControl::JoinRejected {
                        reason: "unknown room".into(),
                    },
                );
            }
        },
        RoomControl::LeaveRoom => {
            if let Some((_, room_tx)) = joined.take() {
                let _ = room_tx
                    .send(RoomCommand::Leave {
                        peer_id: peer_id.clone(),
                    })
                    .await;
            }
        }
        other => {
            warn!("Ignoring server-originated control {:?} from {}", other, peer_id);
        }
    }
}

async fn relay(
    peer_id: &PeerId,
    envelope: SignalingEnvelope,
    joined: &mut Option<(RoomId, mpsc::Sender<RoomCommand>)>,
) {
    let Some((room_id, room_tx)) = joined else {
        warn!("Peer {} relayed an envelope before joining a room", peer_id);
        return;
    };

    if room_tx.send(RoomCommand::Relay { envelope }).await.is_err() {
        warn!("Room {} is gone, dropping relay from {}", room_id, peer_id);
        *joined = None;
    }
}

fn reply(state: &Arc<AppState>, peer_id: &PeerId, control: &RoomControl) {
    let envelope =
        SignalingEnvelope::signaling(peer_id.clone(), Some(peer_id.clone()), control);
    state.signaling.send_envelope(peer_id, &envelope);
}
