use groupshot_core::model::{EnvelopeKind, PeerId, SignalingEnvelope};

use crate::integration::init_tracing;
use crate::utils::create_test_relay;

#[tokio::test]
async fn test_broadcast_reaches_everyone_but_the_sender() {
    init_tracing();

    let relay = create_test_relay();
    let (_room_id, room_tx) = relay.create_room();

    let alice = PeerId::new();
    let bob = PeerId::new();
    let carol = PeerId::new();
    for peer in [&alice, &bob, &carol] {
        relay.join(&room_tx, peer).await.expect("join");
    }

    let baseline_alice = relay.signaling.envelopes_for(&alice).await.len();

    let broadcast = SignalingEnvelope {
        message_type: EnvelopeKind::Offer,
        message: serde_json::json!({ "sdp": "v=0 broadcast" }),
        sender_id: alice.clone(),
        target_id: None,
    };
    relay.relay(&room_tx, broadcast.clone()).await.expect("relay");

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    for peer in [&bob, &carol] {
        let envelopes = relay.signaling.envelopes_for(peer).await;
        assert_eq!(
            envelopes.last().expect("peer received broadcast"),
            &broadcast
        );
    }
    assert_eq!(
        relay.signaling.envelopes_for(&alice).await.len(),
        baseline_alice,
        "a broadcast never loops back to its sender"
    );
}
