//! The REST frontend, exabgp speaker wiring, and gateway binary.
//!
//! Everything the core (`flowchain-core`) deliberately stays ignorant of
//! lives here: HTTP routing, request parsing, and process startup.

#![warn(missing_docs)]

pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use flowchain_core::{Rib, SpeakerChannel};
use parking_lot::Mutex;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler: the single RIB lock and the
/// channel routes are written to.
pub struct AppState {
    /// The sole mutable state of the controller.
    pub rib: Mutex<Rib>,
    /// Destination for compiled route text.
    pub speaker: Arc<dyn SpeakerChannel>,
}

impl AppState {
    /// Wrap a freshly-loaded topology and a speaker channel into shared state.
    pub fn new(rib: Rib, speaker: Arc<dyn SpeakerChannel>) -> Arc<Self> {
        Arc::new(Self { rib: Mutex::new(rib), speaker })
    }
}

/// Build the router exposing exactly the paths from spec §6.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/add/:prefix/:preflen/:natted/:nattedlen/:start/:chain", get(handlers::add).post(handlers::add))
        .route(
            "/override/:prefix/:preflen/:natted/:nattedlen/:start/:chain",
            get(handlers::override_flow).post(handlers::override_flow),
        )
        .route("/delete/:prefix/:preflen", get(handlers::delete).post(handlers::delete))
        .route("/show/flow", get(handlers::show_flow))
        .route("/show/flow/extensive", get(handlers::show_flow_extensive))
        .route("/show/flow/html", get(handlers::show_flow_html))
        .route("/show/flow/url", get(handlers::show_flow_url))
        .route("/show/flow/json", get(handlers::show_flow_json))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::logging))
        .with_state(state)
}
