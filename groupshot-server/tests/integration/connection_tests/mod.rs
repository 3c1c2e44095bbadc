mod test_join_unknown_room_rejected;
mod test_peer_joins_room;
