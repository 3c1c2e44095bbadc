mod test_broadcast_excludes_sender;
mod test_relay_to_absent_target_is_noop;
mod test_targeted_relay;
