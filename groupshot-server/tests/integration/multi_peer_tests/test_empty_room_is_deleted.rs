use groupshot_core::model::PeerId;

use crate::integration::init_tracing;
use crate::utils::create_test_relay;

#[tokio::test]
async fn test_empty_room_is_deleted() {
    init_tracing();

    let relay = create_test_relay();
    let (_room_id, room_tx) = relay.create_room();
    assert_eq!(relay.registry.room_count(), 1);

    let alice = PeerId::new();
    relay.join(&room_tx, &alice).await.expect("alice joins");
    relay.leave(&room_tx, &alice).await.expect("alice leaves");

    let start = std::time::Instant::now();
    while relay.registry.room_count() != 0 {
        assert!(
            start.elapsed().as_millis() < 2000,
            "empty room should be torn down"
        );
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
