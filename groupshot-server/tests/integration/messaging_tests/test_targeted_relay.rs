use groupshot_core::model::{PeerId, SignalingEnvelope};

use crate::integration::init_tracing;
use crate::utils::create_test_relay;

#[tokio::test]
async fn test_targeted_relay_reaches_only_the_target() {
    init_tracing();

    let relay = create_test_relay();
    let (_room_id, room_tx) = relay.create_room();

    let alice = PeerId::new();
    let bob = PeerId::new();
    let carol = PeerId::new();
    for peer in [&alice, &bob, &carol] {
        relay.join(&room_tx, peer).await.expect("join");
    }
    let baseline_bob = relay.signaling.envelopes_for(&bob).await.len();
    let baseline_carol = relay.signaling.envelopes_for(&carol).await.len();

    let offer = SignalingEnvelope::offer(alice.clone(), bob.clone(), "v=0 offer".into());
    relay.relay(&room_tx, offer.clone()).await.expect("relay");

    // Give the actor a beat, then check exact delivery.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let to_bob = relay.signaling.envelopes_for(&bob).await;
    assert_eq!(to_bob.len(), baseline_bob + 1);
    assert_eq!(to_bob.last().unwrap(), &offer);

    assert_eq!(
        relay.signaling.envelopes_for(&carol).await.len(),
        baseline_carol,
        "carol must not see a targeted offer"
    );
}
