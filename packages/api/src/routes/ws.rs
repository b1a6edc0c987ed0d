use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{error::ApiError, middleware::auth::verify_token, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: String,
}

async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let user_id = verify_token(&params.token, &state.jwt_secret)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user_id, state)))
}

async fn handle_socket(socket: WebSocket, user_id: String, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    state.gateway.register(&user_id, tx).await;
    debug!("Client connected: {}", user_id);

    let forward = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    // Mutations arrive over HTTP; the read side only keeps the connection
    // open and notices the disconnect.
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    // Dropping the socket mapping is all a disconnect does; queue and
    // table membership survive a connection blip.
    state.gateway.unregister(&user_id).await;
    forward.abort();
    debug!("Client disconnected: {}", user_id);
}
