mod relay_connection;
mod service;

pub use relay_connection::*;
pub use service::*;
