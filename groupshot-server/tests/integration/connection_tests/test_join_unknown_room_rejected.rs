use groupshot_core::model::RoomId;

use crate::integration::init_tracing;
use crate::utils::create_test_relay;

#[tokio::test]
async fn test_unknown_room_has_no_sender() {
    init_tracing();

    let relay = create_test_relay();
    relay.create_room();

    // A guessed id does not resolve; the socket layer turns this into a
    // join rejection for the caller.
    assert!(relay.registry.sender(&RoomId::new()).is_none());
    assert_eq!(relay.registry.room_count(), 1);
}
