use axum::{Router, routing::get};
use groupshot_server::{AppState, ws_handler};
use std::env;
use std::net::SocketAddr;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Initializing groupshot relay...");

    let addr: SocketAddr = env::var("GROUPSHOT_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let state = AppState::new();

    let app = Router::new()
        .route("/signaling/{peer_id}", get(ws_handler))
        .with_state(state);

    info!("Relay listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
