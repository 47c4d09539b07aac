//! C4 — audio segmentation: accumulates base64-decoded PCM chunks per
//! connection and slices them into fixed-length overlapping segments for
//! the ASR worker (spec §4.4 steps 1-3), ported from `server_ws_recv.py`'s
//! `Cache`/`message_handler`.

use std::sync::mpsc::Sender;

use capswriter_protocol::{parse_audio_chunk, CodecError, Source};
use log::info;

use crate::asr::Task;

const SAMPLE_RATE: usize = 16_000;
const BYTES_PER_SAMPLE: usize = 4;

/// Per-connection accumulation buffer. One lives for the lifetime of a
/// single `task_id`'s audio stream.
#[derive(Default)]
pub struct SegmentBuffer {
    chunks: Vec<u8>,
    offset: f64,
    frame_num: usize,
}

impl SegmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_start(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn frame_num(&self) -> usize {
        self.frame_num
    }

    fn reset(&mut self) {
        self.chunks.clear();
        self.offset = 0.0;
        self.frame_num = 0;
    }

    /// Feed one decoded [`AudioChunk`] in, producing zero or more [`Task`]s
    /// and dispatching them to `task_tx` in submission order.
    ///
    /// Non-final chunks may yield several tasks if the buffer had already
    /// accumulated more than one segment's worth of audio (the `while`
    /// loop in the original). A final chunk always flushes exactly one
    /// task, however little audio remains.
    pub fn push(
        &mut self,
        task_id: &str,
        socket_id: &str,
        source: Source,
        seg_duration: f64,
        seg_overlap: f64,
        is_final: bool,
        time_start: f64,
        data_b64: &str,
        task_tx: &Sender<Task>,
    ) -> Result<(), CodecError> {
        let bytes = base64_decode(data_b64)?;
        self.chunks.extend_from_slice(&bytes);
        self.frame_num += bytes.len();

        if !is_final {
            let seg_threshold = seg_duration + seg_overlap * 2.0;
            while (self.chunks.len() as f64) / BYTES_PER_SAMPLE as f64 / SAMPLE_RATE as f64
                >= seg_threshold
            {
                let take_bytes =
                    (BYTES_PER_SAMPLE as f64 * SAMPLE_RATE as f64 * (seg_duration + seg_overlap))
                        as usize;
                let drop_bytes =
                    (BYTES_PER_SAMPLE as f64 * SAMPLE_RATE as f64 * seg_duration) as usize;
                let take_bytes = take_bytes.min(self.chunks.len());
                let segment = self.chunks[..take_bytes].to_vec();

                let drop_bytes = drop_bytes.min(self.chunks.len());
                self.chunks.drain(..drop_bytes);

                let task = Task {
                    task_id: task_id.to_string(),
                    socket_id: socket_id.to_string(),
                    source,
                    samples: bytes_to_samples(&segment),
                    offset: self.offset,
                    overlap: seg_overlap,
                    is_final: false,
                    time_start,
                    time_submit: now_seconds(),
                };
                self.offset += seg_duration;
                let _ = task_tx.send(task);
            }
        } else {
            let task = Task {
                task_id: task_id.to_string(),
                socket_id: socket_id.to_string(),
                source,
                samples: bytes_to_samples(&self.chunks),
                offset: self.offset,
                overlap: seg_overlap,
                is_final: true,
                time_start,
                time_submit: now_seconds(),
            };
            info!(
                "task {task_id} final segment, {:.2}s received",
                self.frame_num as f64 / SAMPLE_RATE as f64 / BYTES_PER_SAMPLE as f64
            );
            let _ = task_tx.send(task);
            self.reset();
        }

        Ok(())
    }
}

fn base64_decode(s: &str) -> Result<Vec<u8>, CodecError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(CodecError::Base64)
}

fn bytes_to_samples(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn now_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Decode one incoming `AudioChunk` frame and feed it into `buffer`,
/// dispatching any resulting [`Task`]s.
pub fn handle_chunk(
    buffer: &mut SegmentBuffer,
    socket_id: &str,
    raw: &str,
    task_tx: &Sender<Task>,
) -> Result<(), CodecError> {
    let chunk = parse_audio_chunk(raw)?;
    buffer.push(
        &chunk.task_id,
        socket_id,
        chunk.source,
        chunk.seg_duration,
        chunk.seg_overlap,
        chunk.is_final,
        chunk.time_start,
        &chunk.data,
        task_tx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn encode_chunk(task_id: &str, samples: &[f32], is_final: bool) -> String {
        let data = capswriter_protocol::encode_samples(samples);
        let chunk = capswriter_protocol::AudioChunk {
            task_id: task_id.to_string(),
            source: Source::Mic,
            seg_duration: 1.0,
            seg_overlap: 0.2,
            is_final,
            time_start: 0.0,
            time_frame: samples.len() as f64,
            data,
        };
        serde_json::to_string(&chunk).unwrap()
    }

    #[test]
    fn accumulates_until_threshold_then_emits_task() {
        let (tx, rx) = mpsc::channel();
        let mut buffer = SegmentBuffer::new();

        // seg_threshold = 1.0 + 0.2*2 = 1.4s -> 22400 samples.
        let short = vec![0.0_f32; 1000];
        let raw = encode_chunk("t1", &short, false);
        handle_chunk(&mut buffer, "s1", &raw, &tx).unwrap();
        assert!(rx.try_recv().is_err(), "should not emit below threshold");

        let long = vec![0.0_f32; 30_000];
        let raw = encode_chunk("t1", &long, false);
        handle_chunk(&mut buffer, "s1", &raw, &tx).unwrap();
        let task = rx.recv().unwrap();
        assert_eq!(task.task_id, "t1");
        assert!(!task.is_final);
    }

    #[test]
    fn final_chunk_always_emits_and_resets() {
        let (tx, rx) = mpsc::channel();
        let mut buffer = SegmentBuffer::new();

        let short = vec![0.0_f32; 500];
        let raw = encode_chunk("t2", &short, true);
        handle_chunk(&mut buffer, "s1", &raw, &tx).unwrap();
        let task = rx.recv().unwrap();
        assert!(task.is_final);
        assert!(buffer.is_start());
    }
}
