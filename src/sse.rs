//! HTTP/SSE transport for the MCP server
//!
//! `GET /sse` opens a per-client event stream: the first event names the
//! session's POST endpoint, every later event carries one protocol
//! response. `POST /messages/` feeds client messages into the matching
//! session. Sessions are isolated; the only shared state is the handler
//! and the session registry.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::OdooError;
use crate::mcp::protocol::{McpHandler, McpRequest, McpResponse};

/// Session ID
pub type SessionId = String;

/// Tracks connected SSE sessions and their outbound channels.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, mpsc::Sender<McpResponse>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new session
    pub fn register(&self, id: SessionId, tx: mpsc::Sender<McpResponse>) {
        self.sessions.write().insert(id, tx);
    }

    /// Unregister a session
    pub fn unregister(&self, id: &str) {
        self.sessions.write().remove(id);
    }

    /// Get the outbound channel for a session
    pub fn sender(&self, id: &str) -> Option<mpsc::Sender<McpResponse>> {
        self.sessions.read().get(id).cloned()
    }

    /// Number of connected sessions
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state for the SSE routes.
struct SseState<H> {
    handler: Arc<H>,
    registry: Arc<SessionRegistry>,
}

impl<H> Clone for SseState<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            registry: self.registry.clone(),
        }
    }
}

/// SSE-transport MCP server.
pub struct SseServer<H> {
    handler: Arc<H>,
    addr: SocketAddr,
}

impl<H: McpHandler + 'static> SseServer<H> {
    /// Create a new SSE server
    pub fn new(handler: H, port: u16) -> Self {
        Self {
            handler: Arc::new(handler),
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }

    /// Build the router
    pub fn router(handler: Arc<H>) -> Router {
        let state = SseState {
            handler,
            registry: Arc::new(SessionRegistry::new()),
        };
        Router::new()
            .route("/sse", get(sse_handler::<H>))
            .route("/messages/", post(messages_handler::<H>))
            .route("/health", get(health_handler::<H>))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Start the server
    pub async fn start(self) -> std::io::Result<()> {
        let app = Self::router(self.handler);

        tracing::info!("SSE server listening on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Health check endpoint
async fn health_handler<H: McpHandler>(State(state): State<SseState<H>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.registry.session_count(),
    }))
}

/// Removes the session when the client's event stream goes away.
struct SessionGuard {
    id: SessionId,
    registry: Arc<SessionRegistry>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.id);
        tracing::info!("Session disconnected: {}", self.id);
    }
}

/// Open a new session and stream responses to the client.
async fn sse_handler<H: McpHandler>(
    State(state): State<SseState<H>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel::<McpResponse>(64);
    state.registry.register(session_id.clone(), tx);
    tracing::info!("Session connected: {}", session_id);

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages/?session_id={}", session_id));

    // The guard is owned by the stream; dropping the stream unregisters
    // the session.
    let guard = SessionGuard {
        id: session_id,
        registry: state.registry.clone(),
    };
    let responses = ReceiverStream::new(rx).map(move |response| {
        let _ = &guard;
        let data = serde_json::to_string(&response).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().event("message").data(data))
    });

    let stream = futures::stream::once(async move { Ok::<_, Infallible>(endpoint) }).chain(responses);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: String,
}

/// Accept one client-to-server protocol message for an established session.
async fn messages_handler<H: McpHandler>(
    State(state): State<SseState<H>>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> impl IntoResponse {
    let Some(tx) = state.registry.sender(&query.session_id) else {
        return (StatusCode::NOT_FOUND, "Unknown session".to_string());
    };

    let request: McpRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            let response = McpResponse::from_error(None, OdooError::Serialization(e));
            let _ = tx.send(response).await;
            return (StatusCode::BAD_REQUEST, "Invalid message".to_string());
        }
    };

    let is_notification = request.is_notification();
    let response = state.handler.handle_request(request).await;
    if !is_notification {
        // a client that disconnected mid-call just loses the response
        if tx.send(response).await.is_err() {
            tracing::debug!(session = %query.session_id, "dropping response for closed session");
        }
    }

    (StatusCode::ACCEPTED, "Accepted".to_string())
}
