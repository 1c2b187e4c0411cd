//! Webhook Event Source.
//!
//! An axum router that accepts the platform's `POST`s, checks the secret
//! token, decodes the body and pushes the update into the dispatcher's
//! channel.
//!
//! | Condition                          | Status |
//! |------------------------------------|--------|
//! | Not a `POST`                       | 405    |
//! | Secret configured and header wrong | 401    |
//! | Body is not an update              | 400    |
//! | Channel closed                     | 500    |
//! | Update enqueued                    | 200    |
//!
//! ```rust,ignore
//! let (tx, rx) = dispatcher_config.channel();
//! let router = webhook_router("/bot", Some(secret), tx);
//! tokio::spawn(serve("0.0.0.0:8443", router, token.clone()));
//! ```

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use telex_core::Update;

use crate::error::{WebhookError, WebhookResult};

/// Header the platform echoes the configured secret token in.
pub const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

struct WebhookState {
    secret_token: Option<String>,
    sender: mpsc::Sender<Update>,
}

/// Decodes a webhook request body.
pub fn decode_update(body: &[u8]) -> WebhookResult<Update> {
    serde_json::from_slice(body).map_err(|e| WebhookError::Decode(e.to_string()))
}

/// Builds a router that receives updates on `path` and sends them to
/// `sender`.
pub fn webhook_router(
    path: &str,
    secret_token: Option<String>,
    sender: mpsc::Sender<Update>,
) -> Router {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    let state = Arc::new(WebhookState {
        secret_token,
        sender,
    });

    Router::new()
        .route(&path, post(receive))
        .with_state(state)
}

/// Binds `addr` and serves `router` until `token` is cancelled.
pub async fn serve(
    addr: impl ToSocketAddrs,
    router: Router,
    token: CancellationToken,
) -> WebhookResult<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Webhook server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(token.cancelled_owned())
        .await?;

    info!("Webhook server stopped");
    Ok(())
}

fn authorize(state: &WebhookState, headers: &HeaderMap) -> WebhookResult<()> {
    let Some(expected) = &state.secret_token else {
        return Ok(());
    };
    let given = headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if given == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(WebhookError::Unauthorized)
    }
}

async fn receive(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Err(err) = authorize(&state, &headers) {
        warn!(error = %err, "Rejected webhook request");
        return StatusCode::UNAUTHORIZED;
    }

    let update = match decode_update(&body) {
        Ok(update) => update,
        Err(err) => {
            warn!(error = %err, len = body.len(), "Malformed webhook body");
            return StatusCode::BAD_REQUEST;
        }
    };

    let update_id = update.update_id;
    match state.sender.send(update).await {
        Ok(()) => {
            trace!(update_id, "Webhook update enqueued");
            StatusCode::OK
        }
        Err(_) => {
            error!(update_id, error = %WebhookError::ChannelClosed, "Dropping webhook update");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
