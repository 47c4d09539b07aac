//! C5 — the ASR worker's black-box recognition boundary.
//!
//! The recogniser itself is explicitly out of scope (spec §1): this module
//! only defines the trait boundary and the worker harness around it. A
//! `MockAsrEngine` test double is provided for the merger's own tests.

pub mod worker;

#[cfg(feature = "whisper")]
pub mod whisper_engine;

use thiserror::Error;

/// One unit of work handed to the ASR worker: a segment's worth of
/// samples, plus the bookkeeping the merger needs to place the output back
/// into the right `PartialResult` (spec §3 `Task`).
#[derive(Debug, Clone)]
pub struct Task {
    pub task_id: String,
    pub socket_id: String,
    pub source: capswriter_protocol::Source,
    pub samples: Vec<f32>,
    pub offset: f64,
    pub overlap: f64,
    pub is_final: bool,
    pub time_start: f64,
    pub time_submit: f64,
}

/// Raw recognition output for one [`Task`], before the merger's overlap
/// cuts and formatting are applied.
#[derive(Debug, Clone, Default)]
pub struct RecognitionOutput {
    pub tokens: Vec<String>,
    /// Seconds, relative to the segment start, monotonically non-decreasing.
    pub timestamps: Vec<f64>,
}

#[derive(Debug, Error, Clone)]
pub enum AsrError {
    #[error("model not found at {0}")]
    ModelNotFound(String),
    #[error("recognition failed: {0}")]
    Recognition(String),
}

/// The black-box recogniser boundary: `recognize(samples, is_final) ->
/// tokens, timestamps, text` (spec §1). `text` is not surfaced on the
/// trait itself — the merger recomposes text from `tokens` (spec §4.4 step
/// 7) — so only `tokens`/`timestamps` need to cross this boundary.
pub trait AsrEngine: Send + Sync {
    fn recognize(&self, samples: &[f32], is_final: bool) -> Result<RecognitionOutput, AsrError>;
}

/// Engine used when no concrete recogniser is configured: every call
/// succeeds with an empty transcript rather than failing the connection.
/// Lets the rest of the pipeline (segmentation, merging, dispatch) run and
/// be exercised without a model file present.
pub struct NullAsrEngine;

impl AsrEngine for NullAsrEngine {
    fn recognize(&self, _samples: &[f32], _is_final: bool) -> Result<RecognitionOutput, AsrError> {
        Ok(RecognitionOutput::default())
    }
}

#[cfg(test)]
pub struct MockAsrEngine {
    pub tokens: Vec<String>,
    pub timestamps: Vec<f64>,
}

#[cfg(test)]
impl AsrEngine for MockAsrEngine {
    fn recognize(&self, _samples: &[f32], _is_final: bool) -> Result<RecognitionOutput, AsrError> {
        Ok(RecognitionOutput {
            tokens: self.tokens.clone(),
            timestamps: self.timestamps.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_engine_is_object_safe() {
        let engine: Box<dyn AsrEngine> = Box::new(MockAsrEngine {
            tokens: vec!["a".into()],
            timestamps: vec![0.0],
        });
        let out = engine.recognize(&[0.0; 16000], true).unwrap();
        assert_eq!(out.tokens, vec!["a".to_string()]);
    }
}
