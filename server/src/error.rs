//! Error taxonomy for the server (spec §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ASR model load failed: {0}")]
    ModelLoad(String),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Per-connection errors. A [`ConnectionError`] always closes just the one
/// socket (spec §7: "protocol violation closes a socket, not the server").
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol violation: {0}")]
    Protocol(#[from] capswriter_protocol::CodecError),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
