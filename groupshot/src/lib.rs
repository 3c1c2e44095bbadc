pub use groupshot_core::model::PeerId;

pub mod model {
    pub use groupshot_core::model::*;
}

pub mod canvas {
    pub use groupshot_core::canvas::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use groupshot_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use groupshot_client::*;
}
