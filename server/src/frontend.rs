//! C7 — WebSocket front-end: accept loop, per-connection segmentation, and
//! result dispatch. Grounded on the accept-loop-per-connection-task shape
//! used by whisper-preview's transcriber `main.rs`, combined with the
//! socket-id routing from `server_ws_send.py`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use capswriter_protocol::{encode_result, WireResult};
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;

use crate::context::ServerContext;
use crate::deadletter;
use crate::error::ServerError;
use crate::segmenter::{handle_chunk, SegmentBuffer};

/// Maps a live socket id to the channel that carries outbound
/// [`WireResult`]s to that connection's write half (spec §4.3: results
/// route back to the connection that submitted the task, never broadcast).
#[derive(Default, Clone)]
pub struct SocketRegistry(Arc<Mutex<HashMap<String, UnboundedSender<WireResult>>>>);

impl SocketRegistry {
    fn register(&self, id: String, tx: UnboundedSender<WireResult>) {
        self.0.lock().unwrap().insert(id, tx);
    }

    fn unregister(&self, id: &str) {
        self.0.lock().unwrap().remove(id);
    }

    /// Dispatch a result to its owning socket, if still connected. A
    /// result for a socket that has since disconnected is simply dropped.
    pub fn dispatch(&self, socket_id: &str, result: WireResult) {
        let senders = self.0.lock().unwrap();
        if let Some(tx) = senders.get(socket_id) {
            if tx.send(result).is_err() {
                warn!("socket {socket_id} channel closed, dropping result");
            }
        }
    }
}

/// Runs the accept loop until the process is terminated. Each accepted
/// connection is handled in its own task so one slow or misbehaving
/// client never blocks another (spec §7).
pub async fn serve(
    addr: SocketAddr,
    context: Arc<ServerContext>,
    registry: SocketRegistry,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!("listening on {addr}");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("accept failed: {e}");
                continue;
            }
        };
        let context = context.clone();
        let registry = registry.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, context, registry).await {
                error!("connection {peer} ended with error: {e}");
            }
        });
    }
}

async fn handle_connection(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    context: Arc<ServerContext>,
    registry: SocketRegistry,
) -> anyhow::Result<()> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let socket_id = uuid::Uuid::new_v4().to_string();
    info!("accepted connection from {peer} as socket {socket_id}");
    context.live_sockets.insert(socket_id.clone());

    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<WireResult>();
    registry.register(socket_id.clone(), result_tx);

    let send_task = tokio::spawn(async move {
        while let Some(result) = result_rx.recv().await {
            match encode_result(&result) {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("failed to encode result: {e}"),
            }
        }
        let _ = ws_sender.send(Message::Close(None)).await;
    });

    let mut buffer = SegmentBuffer::new();
    while let Some(msg) = ws_receiver.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("websocket error on socket {socket_id}: {e}");
                break;
            }
        };
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        if let Err(e) = handle_chunk(&mut buffer, &socket_id, &text, &context.task_tx) {
            warn!("protocol violation on socket {socket_id}, closing: {e}");
            deadletter::record(&context.data_dir(), "unknown", &socket_id, text.len(), e);
            break;
        }
    }

    info!("socket {socket_id} disconnected");
    context.live_sockets.remove(&socket_id);
    registry.unregister(&socket_id);
    send_task.abort();
    Ok(())
}
