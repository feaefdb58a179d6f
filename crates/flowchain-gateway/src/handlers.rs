//! REST handlers for the `/add`, `/override`, `/delete`, and `/show/flow...`
//! paths described in spec §6.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use flowchain_core::Flow;

use crate::AppState;

/// Path segments shared by `/add` and `/override`.
pub struct AddPathParams {
    prefix: String,
    preflen: String,
    natted: String,
    nattedlen: String,
    start: String,
    chain: String,
}

fn build_flow(params: AddPathParams) -> Flow {
    let prefix = format!("{}/{}", params.prefix, params.preflen);
    let prefix_natted = if params.natted == "none" {
        None
    } else {
        Some(format!("{}/{}", params.natted, params.nattedlen))
    };
    let chain = params.chain.split('_').map(str::to_string).collect();
    Flow::new(params.start, chain, prefix, prefix_natted)
}

fn error_response(err: flowchain_common::Error) -> (StatusCode, String) {
    tracing::warn!(error = %err, "request rejected");
    (StatusCode::BAD_REQUEST, err.to_string())
}

/// `GET|POST /add/<prefix>/<preflen>/<natted>/<nattedlen>/<start>/<chain>`
pub async fn add(
    State(state): State<Arc<AppState>>,
    Path((prefix, preflen, natted, nattedlen, start, chain)): Path<(String, String, String, String, String, String)>,
) -> impl IntoResponse {
    let flow = build_flow(AddPathParams { prefix, preflen, natted, nattedlen, start, chain });
    let summary = flow.prefix.clone();

    let mut rib = state.rib.lock();
    match rib.add(flow, state.speaker.as_ref()) {
        Ok(()) => {
            tracing::info!(prefix = %summary, "flow added");
            StatusCode::OK.into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

/// `GET|POST /override/<prefix>/<preflen>/<natted>/<nattedlen>/<start>/<chain>`
pub async fn override_flow(
    State(state): State<Arc<AppState>>,
    Path((prefix, preflen, natted, nattedlen, start, chain)): Path<(String, String, String, String, String, String)>,
) -> impl IntoResponse {
    let flow = build_flow(AddPathParams { prefix, preflen, natted, nattedlen, start, chain });
    let summary = flow.prefix.clone();

    let mut rib = state.rib.lock();
    match rib.override_flow(flow, state.speaker.as_ref()) {
        Ok(()) => {
            tracing::info!(prefix = %summary, "flow overridden");
            StatusCode::OK.into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

/// `GET|POST /delete/<prefix>/<preflen>`
pub async fn delete(State(state): State<Arc<AppState>>, Path((prefix, preflen)): Path<(String, String)>) -> impl IntoResponse {
    let target = format!("{prefix}/{preflen}");
    let mut rib = state.rib.lock();

    if rib.find_by_prefix(&target).is_none() {
        tracing::warn!(prefix = %target, "delete requested for unknown flow");
        return (StatusCode::BAD_REQUEST, format!("no matched flow for {target}")).into_response();
    }

    rib.delete(&target, state.speaker.as_ref());
    tracing::info!(prefix = %target, "flow deleted");
    StatusCode::OK.into_response()
}

/// `GET /show/flow`
pub async fn show_flow(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rib = state.rib.lock();
    let body: String = rib.flows().iter().map(|f| f.show(false, false)).collect();
    body
}

/// `GET /show/flow/extensive`
pub async fn show_flow_extensive(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rib = state.rib.lock();
    let body: String = rib.flows().iter().map(|f| f.show(true, false)).collect();
    body
}

/// `GET /show/flow/html`
pub async fn show_flow_html(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rib = state.rib.lock();
    let inner = if rib.flows().is_empty() {
        "no flow installed.\n".to_string()
    } else {
        rib.flows().iter().map(|f| f.show(true, true)).collect()
    };
    Html(format!("<html>\n{inner}</html>\n"))
}

/// `GET /show/flow/url`
pub async fn show_flow_url(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rib = state.rib.lock();
    let body: String = rib.flows().iter().map(|f| format!("{}\n", f.url())).collect();
    body
}

/// `GET /show/flow/json`
pub async fn show_flow_json(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rib = state.rib.lock();
    let flows: Vec<_> = rib.flows().iter().map(|f| f.to_json()).collect();
    Json(flows)
}
