//! Wire protocol between the client and the server.
//!
//! Every application message is a UTF-8 JSON text; the audio payload is
//! base64-encoded inside the JSON envelope rather than sent as a separate
//! binary WebSocket frame, trading bandwidth for a single uniform framing.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client → server message. One per streamed audio segment.
///
/// All chunks sharing a `task_id` MUST carry identical `source`,
/// `seg_duration`, `seg_overlap` and `time_start`; exactly one chunk per
/// `task_id` has `is_final = true` and it is the last one sent. `data` may
/// be empty iff `is_final` is `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioChunk {
    pub task_id: String,
    pub source: Source,
    pub seg_duration: f64,
    pub seg_overlap: f64,
    pub is_final: bool,
    pub time_start: f64,
    pub time_frame: f64,
    /// Base64 of little-endian float32 PCM, 16 kHz, mono.
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Mic,
    File,
}

/// Server → client message: a `PartialResult` snapshot plus `is_final`.
///
/// Sent after every processed segment so long file transcriptions can show
/// progress; only the `is_final = true` message is authoritative for mic
/// sessions (spec §4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResult {
    pub task_id: String,
    pub duration: f64,
    pub time_start: f64,
    pub time_submit: f64,
    pub time_complete: f64,
    pub text: String,
    pub tokens: Vec<String>,
    pub timestamps: Vec<f64>,
    pub is_final: bool,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("base64 payload did not decode: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload length {0} is not a multiple of 4 bytes (float32 frames)")]
    NotWholeFloats(usize),
}

/// Decode the base64 `data` field of an [`AudioChunk`] into little-endian
/// float32 PCM samples.
///
/// A payload whose decoded byte length is not a multiple of 4 is a protocol
/// violation (spec §4.3): "a base64 payload that does not decode to a whole
/// number of 32-bit floats causes the connection to be closed with no
/// response."
pub fn decode_samples(data: &str) -> Result<Vec<f32>, CodecError> {
    let bytes = BASE64.decode(data)?;
    if bytes.len() % 4 != 0 {
        return Err(CodecError::NotWholeFloats(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Encode float32 PCM samples into the base64 string used in the `data`
/// field of an [`AudioChunk`].
pub fn encode_samples(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    BASE64.encode(bytes)
}

/// Parse an inbound JSON text into an [`AudioChunk`].
pub fn parse_audio_chunk(text: &str) -> Result<AudioChunk, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Serialise an outbound [`WireResult`] into a JSON text.
pub fn encode_result(result: &WireResult) -> Result<String, CodecError> {
    Ok(serde_json::to_string(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_samples() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];
        let encoded = encode_samples(&samples);
        let decoded = decode_samples(&encoded).unwrap();
        assert_eq!(samples, decoded);
    }

    #[test]
    fn empty_payload_decodes_to_empty_samples() {
        let decoded = decode_samples("").unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        // 3 raw bytes, base64-encoded: not a whole number of f32 frames.
        let encoded = BASE64.encode([1u8, 2, 3]);
        let err = decode_samples(&encoded).unwrap_err();
        assert!(matches!(err, CodecError::NotWholeFloats(3)));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let err = decode_samples("not base64!!").unwrap_err();
        assert!(matches!(err, CodecError::Base64(_)));
    }

    #[test]
    fn audio_chunk_round_trips_through_json() {
        let chunk = AudioChunk {
            task_id: "abc-123".into(),
            source: Source::Mic,
            seg_duration: 15.0,
            seg_overlap: 2.0,
            is_final: false,
            time_start: 1000.0,
            time_frame: 1000.5,
            data: encode_samples(&[0.1, 0.2]),
        };
        let json = serde_json::to_string(&chunk).unwrap();
        let parsed = parse_audio_chunk(&json).unwrap();
        assert_eq!(chunk, parsed);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse_audio_chunk("{not json").unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn wire_result_round_trips_through_json() {
        let result = WireResult {
            task_id: "t1".into(),
            duration: 3.0,
            time_start: 1.0,
            time_submit: 2.0,
            time_complete: 2.5,
            text: "hello".into(),
            tokens: vec!["he".into(), "llo".into()],
            timestamps: vec![0.0, 0.2],
            is_final: true,
        };
        let json = encode_result(&result).unwrap();
        let parsed: WireResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, parsed);
    }
}
