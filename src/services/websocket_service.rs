use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{Instrument, info, info_span, warn};

use crate::{dto::rpc::RpcResponse, services::rpc_service, state::SharedState};

/// Handle the full lifecycle of a JSON-RPC WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket, peer: SocketAddr) {
    let span = info_span!("ws", %peer);
    serve_socket(state, socket, peer).instrument(span).await;
}

async fn serve_socket(state: SharedState, socket: WebSocket, peer: SocketAddr) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    info!("client connected");
    let origin = peer.to_string();
    let mut received = 0usize;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                received += 1;
                info!(payload = %text, "received message");
                let response = rpc_service::handle_text(&state, text.as_str(), &origin).await;
                if send_response(&outbound_tx, &response).is_err() {
                    info!("writer closed, terminating");
                    break;
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!("client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {
                warn!("ignoring binary frame");
            }
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(error = %err, received, "websocket error");
                break;
            }
        }
    }

    info!(received, "client disconnected");
    finalize(writer_task, outbound_tx).await;
}

/// Serialize a response and queue it on the writer channel.
///
/// Serialization failures are logged and swallowed; only a closed writer is an error.
fn send_response(
    tx: &mpsc::UnboundedSender<Message>,
    response: &RpcResponse,
) -> Result<(), mpsc::error::SendError<Message>> {
    let payload = match serde_json::to_string(response) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize response");
            return Ok(());
        }
    };
    tx.send(Message::Text(payload.into()))
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
