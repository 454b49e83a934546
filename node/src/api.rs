//! # REST + WebSocket API
//!
//! Builds the axum router for the node's HTTP interface. All handlers share
//! [`AppState`] through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path             | Description                                |
//! |--------|------------------|--------------------------------------------|
//! | GET    | `/health`        | Liveness probe                             |
//! | GET    | `/status`        | Chain length, tip, replacement policy      |
//! | GET    | `/blocks`        | The whole chain                            |
//! | GET    | `/blocks/:index` | One block by index                         |
//! | POST   | `/blocks`        | Record a value in a new block              |
//! | POST   | `/chain`         | Offer a candidate chain for replacement    |
//! | POST   | `/sync`          | Deliver one peer message                   |
//! | GET    | `/ws`            | Live chain events                          |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cashchain_protocol::network::{PeerMessage, SyncEngine, SyncError, SyncOutcome};
use cashchain_protocol::storage::{Block, ReplaceOutcome};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone; the chain store sits behind an `Arc` inside the engine.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Peer message handling over the shared chain store.
    pub engine: SyncEngine,
    /// Broadcast channel for live event notifications.
    pub event_tx: broadcast::Sender<NodeEvent>,
    /// Prometheus metrics.
    pub metrics: SharedMetrics,
}

/// Events pushed to WebSocket subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeEvent {
    /// A block was added to the tip.
    BlockAppended {
        index: u64,
        hash: String,
        value: i64,
        timestamp: String,
    },
    /// The chain was replaced by a longer one.
    ChainReplaced {
        previous_len: usize,
        new_len: usize,
        tip_hash: String,
    },
}

impl NodeEvent {
    fn appended(block: &Block) -> Self {
        NodeEvent::BlockAppended {
            index: block.index,
            hash: block.hash.clone(),
            value: block.value,
            timestamp: block.timestamp.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/blocks", get(blocks_handler).post(mine_handler))
        .route("/blocks/:index", get(block_by_index_handler))
        .route("/chain", post(replace_chain_handler))
        .route("/sync", post(sync_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Request body for `POST /blocks`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MineRequest {
    /// Cash value to record.
    pub value: i64,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Ledger protocol version.
    pub protocol_version: String,
    /// Number of blocks, genesis included.
    pub chain_length: usize,
    /// Index of the tip.
    pub tip_index: u64,
    /// Hash of the tip.
    pub tip_hash: String,
    /// Active replacement policy.
    pub replace_policy: String,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
}

/// Error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 while the process is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.engine.store();
    let tip = store.latest_block();
    Json(StatusResponse {
        version: state.version.clone(),
        protocol_version: cashchain_protocol::config::PROTOCOL_VERSION.to_string(),
        chain_length: store.len(),
        tip_index: tip.index,
        tip_hash: tip.hash,
        replace_policy: store.policy().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /blocks`: the whole chain, genesis first.
async fn blocks_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.store().blocks())
}

/// `GET /blocks/:index`: 404 past the tip.
async fn block_by_index_handler(
    Path(index): Path<u64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.engine.store().get(index) {
        Some(block) => (StatusCode::OK, Json(block)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Block not found at index {}", index),
        ),
    }
}

/// `POST /blocks`: mine `value` onto the tip and announce it.
async fn mine_handler(
    State(state): State<AppState>,
    Json(req): Json<MineRequest>,
) -> impl IntoResponse {
    let timer = state.metrics.block_mining_seconds.start_timer();
    let mined = state.engine.store().mine(req.value);
    timer.observe_duration();

    match mined {
        Ok(block) => {
            state.metrics.blocks_appended_total.inc();
            refresh_chain_length(&state);
            publish(&state, NodeEvent::appended(&block));
            (StatusCode::CREATED, Json(block)).into_response()
        }
        Err(e) => {
            state.metrics.blocks_rejected_total.inc();
            tracing::error!(error = %e, "freshly mined block failed validation");
            error_response(StatusCode::CONFLICT, e)
        }
    }
}

/// `POST /chain`: offer a full candidate chain.
///
/// 200 with the [`ReplaceOutcome`] when the candidate was acceptable
/// (replaced or not longer), 422 with the reason when it was invalid.
async fn replace_chain_handler(
    State(state): State<AppState>,
    Json(candidate): Json<Vec<Block>>,
) -> impl IntoResponse {
    match state.engine.store().replace_chain(candidate) {
        Ok(outcome) => {
            record_replace(&state, &outcome);
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(e) => {
            state.metrics.chain_replacements_rejected_total.inc();
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e)
        }
    }
}

/// `POST /sync`: deliver one [`PeerMessage`].
///
/// Returns the outcome and the message the caller should send back or
/// broadcast. Invalid blocks or chains yield 422.
async fn sync_handler(
    State(state): State<AppState>,
    Json(message): Json<PeerMessage>,
) -> impl IntoResponse {
    match state.engine.handle_message(message) {
        Ok(result) => {
            if let Some(outcome) = &result.outcome {
                record_sync(&state, outcome);
            }
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            match &e {
                SyncError::InvalidBlock(_) => state.metrics.blocks_rejected_total.inc(),
                SyncError::InvalidChain(_) => state.metrics.chain_replacements_rejected_total.inc(),
            }
            tracing::warn!(error = %e, "peer message rejected");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e)
        }
    }
}

// ---------------------------------------------------------------------------
// Bookkeeping
// ---------------------------------------------------------------------------

fn refresh_chain_length(state: &AppState) {
    state
        .metrics
        .chain_length
        .set(state.engine.store().len() as i64);
}

fn publish(state: &AppState, event: NodeEvent) {
    // No subscribers is fine.
    let _ = state.event_tx.send(event);
}

fn record_replace(state: &AppState, outcome: &ReplaceOutcome) {
    if let ReplaceOutcome::Replaced {
        previous_len,
        new_len,
    } = *outcome
    {
        state.metrics.chain_replacements_total.inc();
        refresh_chain_length(state);
        publish(
            state,
            NodeEvent::ChainReplaced {
                previous_len,
                new_len,
                tip_hash: state.engine.store().latest_block().hash,
            },
        );
    }
}

fn record_sync(state: &AppState, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Appended { block } => {
            state.metrics.blocks_appended_total.inc();
            refresh_chain_length(state);
            publish(state, NodeEvent::appended(block));
        }
        SyncOutcome::Replace { result } => record_replace(state, result),
        SyncOutcome::Ignored | SyncOutcome::UpToDate { .. } | SyncOutcome::NeedFullChain { .. } => {}
    }
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// `GET /ws`: push-only stream of JSON-encoded [`NodeEvent`]s.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
