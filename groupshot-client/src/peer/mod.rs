mod negotiation;
mod peer_client;
mod peer_event;

pub use negotiation::*;
pub use peer_client::*;
pub use peer_event::*;
