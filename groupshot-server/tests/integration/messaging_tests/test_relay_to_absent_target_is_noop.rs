use groupshot_core::model::{PeerId, SignalingEnvelope};

use crate::integration::init_tracing;
use crate::utils::create_test_relay;

#[tokio::test]
async fn test_relay_to_absent_target_is_a_silent_noop() {
    init_tracing();

    let relay = create_test_relay();
    let (_room_id, room_tx) = relay.create_room();

    let alice = PeerId::new();
    let bob = PeerId::new();
    relay.join(&room_tx, &alice).await.expect("alice joins");
    relay.join(&room_tx, &bob).await.expect("bob joins");

    let departed = PeerId::new();
    let stale = SignalingEnvelope::offer(alice.clone(), departed.clone(), "v=0 stale".into());
    relay.relay(&room_tx, stale).await.expect("relay accepts");

    // The room stays healthy: a follow-up targeted envelope still lands.
    let live = SignalingEnvelope::offer(alice.clone(), bob.clone(), "v=0 live".into());
    relay.relay(&room_tx, live.clone()).await.expect("relay");

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(relay.signaling.envelopes_for(&departed).await.is_empty());
    assert_eq!(
        relay.signaling.envelopes_for(&bob).await.last(),
        Some(&live)
    );
}
