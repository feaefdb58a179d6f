//! The flow compiler's gateway binary: loads the topology, emits the
//! bootstrap TOS flows, and serves the REST frontend from spec §6.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use flowchain_core::{generate_tos_flows, Rib, StdoutSpeaker};
use flowchain_gateway::{build_router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::var("FLOWCHAIN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("flowchain.json"));

    let fps = match flowchain_topology::load_config(&config_path) {
        Ok(fps) => fps,
        Err(e) => {
            tracing::error!(path = %config_path.display(), error = %e, "failed to load topology, exiting");
            std::process::exit(1);
        }
    };

    let speaker: Arc<dyn flowchain_core::SpeakerChannel> = Arc::new(StdoutSpeaker);
    generate_tos_flows(&fps, speaker.as_ref());

    let state = AppState::new(Rib::new(fps), speaker);
    let app = build_router(state);

    let bind_addr: SocketAddr = std::env::var("FLOWCHAIN_BIND")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()
        .expect("FLOWCHAIN_BIND must be a valid socket address");

    tracing::info!(%bind_addr, "flowchain gateway listening");

    let listener = tokio::net::TcpListener::bind(bind_addr).await.expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
