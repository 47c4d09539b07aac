//! Shared server state.
//!
//! The original keeps a single module-level "Cosmic" object carrying
//! config, the live socket set, and both queues. Rust has no equivalent to
//! a mutable module singleton without a `static`, so this is an explicit
//! value threaded through constructors instead (design note §9).
//!
//! Hot-word substitution is deliberately absent here: it runs client-side,
//! on the final result text (`client_recv_result.py`), not inside the
//! merger.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::asr::Task;
use crate::config::{ServerConfig, ServerPaths};
use crate::punctuation::PunctuationModel;

/// The set of currently-connected socket ids, consulted by the merger
/// before dispatching a result (a client that disconnected mid-segment
/// should not have its later result delivered anywhere).
#[derive(Default)]
pub struct LiveSockets(Mutex<HashSet<String>>);

impl LiveSockets {
    pub fn insert(&self, id: impl Into<String>) {
        self.0.lock().unwrap().insert(id.into());
    }

    pub fn remove(&self, id: &str) {
        self.0.lock().unwrap().remove(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.lock().unwrap().contains(id)
    }
}

pub struct ServerContext {
    pub config: ServerConfig,
    pub paths: ServerPaths,
    pub live_sockets: Arc<LiveSockets>,
    pub punctuation: Arc<dyn PunctuationModel>,
    /// Hands finished segments to the ASR worker pool.
    pub task_tx: Sender<Task>,
}

impl ServerContext {
    pub fn new(
        config: ServerConfig,
        paths: ServerPaths,
        punctuation: Arc<dyn PunctuationModel>,
        task_tx: Sender<Task>,
    ) -> Self {
        Self {
            config,
            paths,
            live_sockets: Arc::new(LiveSockets::default()),
            punctuation,
            task_tx,
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.config.data_dir(&self.paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_sockets_tracks_membership() {
        let sockets = LiveSockets::default();
        sockets.insert("a");
        assert!(sockets.contains("a"));
        sockets.remove("a");
        assert!(!sockets.contains("a"));
    }
}
