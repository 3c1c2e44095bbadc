use groupshot_core::model::{PeerId, RoomControl, SignalingEnvelope};

use crate::integration::init_tracing;
use crate::utils::create_test_relay;

#[tokio::test]
async fn test_peer_leaves_others_stay() {
    init_tracing();

    let relay = create_test_relay();
    let (_room_id, room_tx) = relay.create_room();

    let alice = PeerId::new();
    let bob = PeerId::new();
    let carol = PeerId::new();
    for peer in [&alice, &bob, &carol] {
        relay.join(&room_tx, peer).await.expect("join");
    }

    relay.leave(&room_tx, &bob).await.expect("bob leaves");
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    for peer in [&alice, &carol] {
        let controls = relay.signaling.controls_for(peer).await;
        assert!(
            controls
                .iter()
                .any(|c| matches!(c, RoomControl::PeerLeft { peer_id } if *peer_id == bob)),
            "remaining members learn that bob left"
        );
    }

    // The survivors can still talk through the room.
    let offer = SignalingEnvelope::offer(alice.clone(), carol.clone(), "v=0 offer".into());
    relay.relay(&room_tx, offer.clone()).await.expect("relay");
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(
        relay.signaling.envelopes_for(&carol).await.last(),
        Some(&offer)
    );
    assert_eq!(relay.registry.room_count(), 1);
}
