//! WebSocket upgrade and per-connection stats stream.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::stream::StreamExt;
use tracing::{debug, info};

use crate::metrics::{collect_stats, container_exists};
use crate::state::AppState;

use std::collections::HashMap;
use std::sync::atomic::Ordering;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/containers/:name/stats", get(stats_handler))
        .with_state(state)
}

pub async fn stats_handler(
    ws: WebSocketUpgrade,
    Path(name): Path<String>,
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    if let Some(expected) = state.auth_token.as_ref() {
        match q.get("token") {
            Some(t) if t == expected => {}
            _ => return StatusCode::UNAUTHORIZED.into_response(),
        }
    }
    if !container_exists(&state, &name).await {
        return (StatusCode::NOT_FOUND, format!("No such container: {name}")).into_response();
    }
    ws.on_upgrade(move |socket| stream_stats(socket, state, name))
}

async fn stream_stats(mut socket: WebSocket, state: AppState, name: String) {
    let clients = state.client_count.fetch_add(1, Ordering::Relaxed) + 1;
    info!(container = %name, clients, "stats stream opened");

    // Ensure we decrement on disconnect (drop).
    struct ClientGuard(AppState);
    impl Drop for ClientGuard {
        fn drop(&mut self) {
            self.0.client_count.fetch_sub(1, Ordering::Relaxed);
        }
    }
    let _guard = ClientGuard(state.clone());

    let mut ticker = tokio::time::interval(state.interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(record) = collect_stats(&state, &name).await else {
                    info!(container = %name, "container is gone, closing stream");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                let Ok(js) = serde_json::to_string(&record) else { break };
                if socket.send(Message::Text(js)).await.is_err() {
                    break;
                }
            }
            msg = socket.next() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                _ => {}
            },
        }
    }
    debug!(container = %name, "stats stream closed");
}
