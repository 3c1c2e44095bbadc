use async_trait::async_trait;
use groupshot_client::canvas::{CanvasChange, CanvasSession, PacketFanout};
use groupshot_client::error::ClientError;
use groupshot_core::canvas::CanvasEvent;
use groupshot_core::model::{CanvasPacket, Frame, PeerId};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Records every outbound packet instead of touching a network.
#[derive(Default)]
struct RecordingFanout {
    broadcasts: Mutex<Vec<CanvasPacket>>,
    directs: Mutex<Vec<(PeerId, CanvasPacket)>>,
}

#[async_trait]
impl PacketFanout for RecordingFanout {
    async fn broadcast(&self, packet: &CanvasPacket) -> Result<usize, ClientError> {
        self.broadcasts.lock().await.push(packet.clone());
        Ok(1)
    }

    async fn send_to(&self, peer_id: &PeerId, packet: &CanvasPacket) -> Result<(), ClientError> {
        self.directs
            .lock()
            .await
            .push((peer_id.clone(), packet.clone()));
        Ok(())
    }
}

fn frame(x: f32, y: f32) -> Frame {
    Frame::new(x, y, 64.0, 64.0)
}

#[tokio::test]
async fn drag_session_broadcasts_claim_move_release() {
    let local = PeerId::new();
    let fanout = Arc::new(RecordingFanout::default());
    let (session, _changes) = CanvasSession::new(local.clone(), fanout.clone());

    let sticker = session
        .place_sticker("https://cdn.example.com/star.png", frame(0.0, 0.0))
        .await
        .expect("place");

    assert!(session.begin_drag(sticker.id).await);
    assert!(session.drag(sticker.id, frame(30.0, 40.0)).await);
    assert!(session.end_drag(sticker.id).await);

    let broadcasts = fanout.broadcasts.lock().await;
    assert_eq!(broadcasts.len(), 4, "create, claim, mutate, release");
    assert!(matches!(
        &broadcasts[1],
        CanvasPacket::Event { event: CanvasEvent::Claim { .. }, .. }
    ));
    assert!(matches!(
        &broadcasts[2],
        CanvasPacket::Event { event: CanvasEvent::Mutate { .. }, .. }
    ));
    assert!(matches!(
        &broadcasts[3],
        CanvasPacket::Event { event: CanvasEvent::Release { .. }, .. }
    ));
}

#[tokio::test]
async fn losing_intents_are_not_broadcast() {
    let local = PeerId::new();
    let remote = PeerId::new();
    let fanout = Arc::new(RecordingFanout::default());
    let (session, _changes) = CanvasSession::new(local, fanout.clone());

    let sticker = session
        .place_sticker("https://cdn.example.com/star.png", frame(0.0, 0.0))
        .await
        .expect("place");

    // The remote participant claims it first.
    session
        .handle_packet(CanvasPacket::Event {
            from: remote.clone(),
            event: CanvasEvent::Claim { id: sticker.id },
        })
        .await;

    let before = fanout.broadcasts.lock().await.len();
    assert!(!session.begin_drag(sticker.id).await);
    assert!(!session.drag(sticker.id, frame(9.0, 9.0)).await);
    assert!(!session.delete_sticker(sticker.id).await);
    assert_eq!(
        fanout.broadcasts.lock().await.len(),
        before,
        "rejected intents stay local"
    );

    // After their release, our claim goes through again.
    session
        .handle_packet(CanvasPacket::Event {
            from: remote,
            event: CanvasEvent::Release { id: sticker.id },
        })
        .await;
    assert!(session.begin_drag(sticker.id).await);
}

#[tokio::test]
async fn snapshot_request_is_answered_directly_to_the_asker() {
    let local = PeerId::new();
    let joiner = PeerId::new();
    let fanout = Arc::new(RecordingFanout::default());
    let (session, _changes) = CanvasSession::new(local.clone(), fanout.clone());

    session
        .place_sticker("https://cdn.example.com/star.png", frame(1.0, 1.0))
        .await
        .expect("place");
    session
        .place_sticker("https://cdn.example.com/moon.png", frame(2.0, 2.0))
        .await
        .expect("place");

    session
        .handle_packet(CanvasPacket::SnapshotRequest {
            from: joiner.clone(),
        })
        .await;

    let directs = fanout.directs.lock().await;
    assert_eq!(directs.len(), 1);
    let (to, packet) = &directs[0];
    assert_eq!(to, &joiner);
    match packet {
        CanvasPacket::Snapshot { from, stickers } => {
            assert_eq!(from, &local);
            assert_eq!(stickers.len(), 2);
        }
        other => panic!("expected snapshot, got {:?}", other),
    }
}

#[tokio::test]
async fn remote_events_surface_as_changes() {
    let local = PeerId::new();
    let remote = PeerId::new();
    let fanout = Arc::new(RecordingFanout::default());
    let (session, mut changes) = CanvasSession::new(local, fanout);

    let sticker = session
        .place_sticker("https://cdn.example.com/star.png", frame(0.0, 0.0))
        .await
        .expect("place");
    let _ = changes.recv().await; // our own create

    session
        .handle_packet(CanvasPacket::Event {
            from: remote.clone(),
            event: CanvasEvent::Claim { id: sticker.id },
        })
        .await;

    match changes.recv().await.expect("change for remote claim") {
        CanvasChange::Updated(updated) => {
            assert_eq!(updated.id, sticker.id);
            assert_eq!(updated.owner, Some(remote.clone()));
        }
        other => panic!("expected update, got {:?}", other),
    }

    // Replay of the same claim is idempotent: no further change event.
    session
        .handle_packet(CanvasPacket::Event {
            from: remote,
            event: CanvasEvent::Claim { id: sticker.id },
        })
        .await;
    assert!(
        changes.try_recv().is_err(),
        "idempotent re-apply must not publish a change"
    );
}
