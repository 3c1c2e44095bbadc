use groupshot_core::model::{PeerId, RoomControl};

use crate::integration::init_tracing;
use crate::utils::create_test_relay;

#[tokio::test]
async fn test_peer_joins_room() {
    init_tracing();

    let relay = create_test_relay();
    let (_room_id, room_tx) = relay.create_room();

    let alice = PeerId::new();
    let bob = PeerId::new();

    // First joiner is told the room is otherwise empty.
    let members = relay.join(&room_tx, &alice).await.expect("alice joins");
    assert!(members.is_empty());

    // Second joiner sees the first; the first is notified.
    let members = relay.join(&room_tx, &bob).await.expect("bob joins");
    assert_eq!(members, vec![alice.clone()]);

    assert!(relay.signaling.wait_for_forwards(3, 2000).await);
    let alice_controls = relay.signaling.controls_for(&alice).await;
    assert!(
        alice_controls
            .iter()
            .any(|c| matches!(c, RoomControl::PeerJoined { peer_id } if *peer_id == bob)),
        "alice should be told bob joined"
    );
}
