//! WebSocket client half of the protocol in `protocol/src/lib.rs`:
//! streams outbound [`AudioChunk`]s, demultiplexes inbound [`WireResult`]s
//! back to the [`RecordingSession`](crate::audio::RecordingSession) or
//! file-transcription job that is waiting on a given `task_id`.
//!
//! Mirrors the connection shape of `server::frontend`'s accept loop
//! (JSON text frames, one task per `tokio::spawn`'d send/receive pair) on
//! the dialing side instead of the accepting side.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use capswriter_protocol::{AudioChunk, WireResult};
use futures_util::{SinkExt, StreamExt};
use log::{error, warn};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;

pub type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Routes inbound [`WireResult`]s to whichever task is awaiting them,
/// keyed by `task_id`.
#[derive(Default, Clone)]
struct ResultRegistry(Arc<Mutex<HashMap<String, UnboundedSender<WireResult>>>>);

impl ResultRegistry {
    fn register(&self, task_id: String, tx: UnboundedSender<WireResult>) {
        self.0.lock().unwrap().insert(task_id, tx);
    }

    fn unregister(&self, task_id: &str) {
        self.0.lock().unwrap().remove(task_id);
    }

    fn dispatch(&self, result: WireResult) {
        let is_final = result.is_final;
        let task_id = result.task_id.clone();
        let senders = self.0.lock().unwrap();
        if let Some(tx) = senders.get(&task_id) {
            if tx.send(result).is_err() {
                warn!("task {task_id} result receiver dropped");
            }
        } else {
            warn!("result for unknown task {task_id}, dropping");
        }
        drop(senders);
        if is_final {
            self.unregister(&task_id);
        }
    }
}

/// A live connection to the server: send [`AudioChunk`]s, subscribe to a
/// `task_id`'s stream of [`WireResult`]s.
#[derive(Clone)]
pub struct WireClient {
    chunk_tx: UnboundedSender<AudioChunk>,
    registry: ResultRegistry,
}

impl WireClient {
    /// Dial `addr:port` and spawn the send/receive pump tasks. Returns
    /// immediately; connection failures surface as a closed result
    /// channel for any task registered afterwards.
    pub async fn connect(addr: &str, port: u16) -> anyhow::Result<Self> {
        let url = format!("ws://{addr}:{port}");
        let (ws_stream, _response) = tokio_tungstenite::connect_async(&url).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let (chunk_tx, mut chunk_rx): (UnboundedSender<AudioChunk>, UnboundedReceiver<AudioChunk>) =
            mpsc::unbounded_channel();
        let registry = ResultRegistry::default();

        tokio::spawn(async move {
            while let Some(chunk) = chunk_rx.recv().await {
                let text = match serde_json::to_string(&chunk) {
                    Ok(t) => t,
                    Err(e) => {
                        error!("failed to encode audio chunk: {e}");
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            let _ = ws_sender.send(Message::Close(None)).await;
        });

        let recv_registry = registry.clone();
        tokio::spawn(async move {
            while let Some(msg) = ws_receiver.next().await {
                let msg = match msg {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("websocket receive error: {e}");
                        break;
                    }
                };
                let text = match msg {
                    Message::Text(t) => t,
                    Message::Close(_) => break,
                    _ => continue,
                };
                match serde_json::from_str::<WireResult>(&text) {
                    Ok(result) => recv_registry.dispatch(result),
                    Err(e) => warn!("malformed result from server: {e}"),
                }
            }
        });

        Ok(Self { chunk_tx, registry })
    }

    pub fn chunk_sender(&self) -> UnboundedSender<AudioChunk> {
        self.chunk_tx.clone()
    }

    /// Register interest in `task_id`'s results, returning a receiver
    /// that yields every [`WireResult`] for that task until the one
    /// marked `is_final`.
    pub fn subscribe(&self, task_id: String) -> UnboundedReceiver<WireResult> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry.register(task_id, tx);
        rx
    }
}
