//! Router for the generate relay API

use std::convert::Infallible;
use std::sync::{Arc, RwLock};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::public;
use crate::api::state::AppState;
use crate::ollama::TokenStream;

type SharedState = Arc<RwLock<AppState>>;

/// Forward a prompt to the upstream generate endpoint and re-stream the
/// decoded tokens as the response body.
///
/// The outgoing body is the raw token text concatenated in arrival order.
/// It is labeled `text/event-stream` but carries no `data:`/`event:`
/// framing, matching what the browser page consumes.
async fn generate_handler(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::GenerateRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let ollama = state
        .read()
        .expect("Unable to read shared state")
        .ollama
        .clone();

    let tokens = match ollama.generate(&payload.prompt).await {
        Ok(stream) => stream,
        Err(err) => {
            tracing::error!("Upstream generate request failed: {}", err);
            return Ok(
                (StatusCode::BAD_GATEWAY, "Upstream generate request failed").into_response(),
            );
        }
    };

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(relay_tokens(tokens, tx));

    let body = Body::from_stream(UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>));
    let resp = ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response();

    Ok(resp)
}

/// Forward tokens until the stream ends or the client goes away. Racing
/// against `tx.closed()` means a disconnect stops the relay immediately,
/// even while the upstream is stalled between chunks. Returning drops the
/// upstream stream, cancelling the in-flight request.
async fn relay_tokens(mut tokens: TokenStream, tx: mpsc::UnboundedSender<String>) {
    loop {
        tokio::select! {
            _ = tx.closed() => {
                tracing::debug!("Client disconnected, cancelling upstream stream");
                return;
            }
            item = tokens.next() => match item {
                Some(Ok(token)) => {
                    if tx.send(token).is_err() {
                        return;
                    }
                }
                Some(Err(err)) => {
                    // The client sees a truncated body rather than a late
                    // in-band error
                    tracing::error!("Relay stream interrupted: {}", err);
                    return;
                }
                None => return,
            },
        }
    }
}

/// Create the generate router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(generate_handler))
}
