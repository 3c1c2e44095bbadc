mod test_empty_room_is_deleted;
mod test_peer_leaves_others_stay;
