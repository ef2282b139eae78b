use axum::{
    Json,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tracing::{debug, error, info, instrument, warn};

use crate::embedding::MpnetEmbedder;
use crate::gateway::error::ApiError;
use crate::gateway::payload::SearchQuery;
use crate::gateway::state::HandlerState;
use crate::registry::CorpusRegistry;
use crate::search::{SearchError, SearchParams, run_search};
use crate::store::{SearchBackend, SearchSession, VerseRecord};

/// One-shot search: parse, check out a connection, run the pipeline, reply.
/// The connection returns to the pool on every exit path.
#[instrument(skip(state, body))]
pub async fn semantic_search_handler<B>(
    State(state): State<HandlerState<B>>,
    body: String,
) -> Result<Json<Vec<VerseRecord>>, ApiError>
where
    B: SearchBackend + Clone + Send + Sync + 'static,
{
    let query: SearchQuery = serde_json::from_str(&body)
        .map_err(|e| ApiError::Validation(format!("invalid request: {}", e)))?;
    let params = SearchParams::from(query);

    let mut session = state.backend.session().await.map_err(|e| {
        error!(error = %e, "Failed to check out store connection");
        ApiError::Internal
    })?;

    let verses = run_search(&state.embedder, &state.registry, &mut session, &params).await?;

    debug!(results = verses.len(), "Search request complete");
    Ok(Json(verses.into_iter().map(VerseRecord::from).collect()))
}

/// Upgrades to a WebSocket search session.
pub async fn session_handler<B>(
    State(state): State<HandlerState<B>>,
    ws: WebSocketUpgrade,
) -> Response
where
    B: SearchBackend + Clone + Send + Sync + 'static,
{
    ws.on_upgrade(move |socket| run_session(state, socket))
}

/// Drives one session: a single store connection checked out for the whole
/// conversation, messages handled strictly in arrival order. The connection
/// is released exactly once, when this function returns.
async fn run_session<B>(state: HandlerState<B>, mut socket: WebSocket)
where
    B: SearchBackend + Clone + Send + Sync + 'static,
{
    let mut session = match state.backend.session().await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Failed to check out store connection for session");
            let _ = socket
                .send(Message::Text(error_json("internal server error").into()))
                .await;
            return;
        }
    };

    info!("Search session connected");

    while let Some(message) = socket.recv().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "Session socket error");
                break;
            }
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Pings are answered at the protocol layer.
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Binary(_) => {
                let reply = error_json("invalid JSON message");
                if socket.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let outcome = handle_session_message(
            &state.embedder,
            &state.registry,
            &mut session,
            text.as_str(),
        )
        .await;

        if socket.send(Message::Text(outcome.reply.into())).await.is_err() {
            break;
        }

        if outcome.terminal {
            warn!("Session store connection failed, closing session");
            break;
        }
    }

    info!("Search session disconnected");
}

/// Reply to one session message, plus whether the session must close
/// because its connection is no longer usable.
pub struct SessionReply {
    pub reply: String,
    pub terminal: bool,
}

/// Handles a single session message end to end. Malformed or invalid
/// messages produce an error reply and leave the session open; only a
/// connection-level store failure is terminal.
pub async fn handle_session_message<S: SearchSession>(
    embedder: &MpnetEmbedder,
    registry: &CorpusRegistry,
    session: &mut S,
    text: &str,
) -> SessionReply {
    let query: SearchQuery = match serde_json::from_str(text) {
        Ok(query) => query,
        Err(_) => {
            return SessionReply {
                reply: error_json("invalid JSON message"),
                terminal: false,
            };
        }
    };

    let params = SearchParams::from(query);

    match run_search(embedder, registry, session, &params).await {
        Ok(verses) => {
            let records: Vec<VerseRecord> = verses.into_iter().map(VerseRecord::from).collect();
            SessionReply {
                reply: serde_json::to_string(&records).unwrap_or_else(|_| "[]".to_string()),
                terminal: false,
            }
        }
        Err(err) if err.is_validation() => SessionReply {
            reply: error_json(&err.to_string()),
            terminal: false,
        },
        Err(SearchError::Store(err)) => {
            error!(error = %err, "Session search failed");
            SessionReply {
                reply: error_json("internal server error"),
                terminal: err.is_connection(),
            }
        }
        Err(err) => {
            error!(error = %err, "Session search failed");
            SessionReply {
                reply: error_json("internal server error"),
                terminal: false,
            }
        }
    }
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
