//! Read-only HTTP surface: liveness and room previews.
//!
//! Handlers ask the gateway through a reply channel, so they see the same
//! state the sockets do without sharing it.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::oneshot;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wordrace_protocol::RoomCode;

use crate::gateway::{Command, CommandSender};

#[derive(Clone)]
pub(crate) struct HttpState {
    pub(crate) commands: CommandSender,
    pub(crate) started: Instant,
}

pub(crate) fn router(state: HttpState, origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/room/:code", get(room_preview))
        .layer(cors(origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// An empty list allows any origin.
fn cors(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

async fn health(State(state): State<HttpState>) -> Response {
    let (reply, stats) = oneshot::channel();
    if state.commands.send(Command::Stats { reply }).is_err() {
        return unavailable();
    }
    match stats.await {
        Ok(stats) => Json(json!({
            "status": "ok",
            "rooms": stats.rooms,
            "uptime": state.started.elapsed().as_secs_f64(),
        }))
        .into_response(),
        Err(_) => unavailable(),
    }
}

async fn room_preview(State(state): State<HttpState>, Path(code): Path<String>) -> Response {
    let Some(code) = RoomCode::parse(&code) else {
        return room_not_found();
    };
    let (reply, preview) = oneshot::channel();
    if state.commands.send(Command::Preview { code, reply }).is_err() {
        return unavailable();
    }
    match preview.await {
        Ok(Some(preview)) => Json(preview).into_response(),
        Ok(None) => room_not_found(),
        Err(_) => unavailable(),
    }
}

fn room_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "room_not_found" })),
    )
        .into_response()
}

fn unavailable() -> Response {
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}
