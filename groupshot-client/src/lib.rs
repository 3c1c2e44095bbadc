pub mod canvas;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod error;
pub mod peer;
pub mod repository;
pub mod room;
pub mod signaling;

pub use canvas::{CanvasChange, CanvasSession, PacketFanout};
pub use config::TransportConfig;
pub use error::ClientError;
pub use peer::{NegotiationState, PeerConnectionClient, PeerEvent};
pub use repository::ConnectionRepository;
pub use room::RoomSession;
pub use signaling::{InboundSignal, RelayConnection, SignalTransport, SignalingService};
