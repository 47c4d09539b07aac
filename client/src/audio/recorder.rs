//! The "sender coroutine" of spec §4.5: owns one recording task's life
//! from hotkey key-down to key-up, down-samples captured audio, frames it
//! into wire [`AudioChunk`](capswriter_protocol::AudioChunk)s, and
//! optionally mirrors the raw audio to a local WAV file.
//!
//! Modelled after the note in spec §9 on coroutine cancellation: "model
//! each recording session as an object owning (a) a dedicated channel and
//! (b) a cancellation token; cancel drops the channel sender and sets the
//! token". `RecordingSession` is that object; the sender task itself is a
//! plain tokio task rather than a cancellable coroutine.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use capswriter_protocol::{encode_samples, AudioChunk, Source};
use chrono::Local;
use tokio::sync::{mpsc, oneshot};

use super::capture::{AudioCapture, FrameSink, RawFrame};
use super::resample::decimate_and_average;

/// Internal control messages fed to the sender task, mirroring the
/// begin/data/finish queue protocol of the original `ShortcutTask`.
#[derive(Debug)]
pub enum RecorderEvent {
    Data(RawFrame),
    Finish,
}

/// What a completed (non-cancelled) session produced.
#[derive(Debug, Clone)]
pub struct RecordingOutcome {
    pub task_id: String,
    pub duration: f64,
    pub audio_path: Option<PathBuf>,
}

/// One press-to-talk (or file-scan) recording in progress.
///
/// Dropping the sender half of `raw_tx` (via [`RecordingSession::cancel`])
/// starves the sender task's `recv` loop, which then exits without
/// emitting a final chunk — the cancellation path of spec §4.5.
pub struct RecordingSession {
    task_id: String,
    raw_tx: Option<mpsc::UnboundedSender<RawFrame>>,
    cancelled: Arc<AtomicBool>,
    outcome_rx: Option<oneshot::Receiver<RecordingOutcome>>,
}

impl RecordingSession {
    /// Attach to `capture`'s [`FrameSink`] and start streaming.
    ///
    /// `save_audio_to`, when `Some`, is the path of a WAV file the session
    /// mirrors every decimated sample into as it streams (spec §4.6 /
    /// `client_create_file.py`); renamed by the caller once the final
    /// transcript is known.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        capture: &AudioCapture,
        task_id: String,
        source: Source,
        seg_duration: f64,
        seg_overlap: f64,
        chunk_tx: mpsc::UnboundedSender<AudioChunk>,
        save_audio_to: Option<PathBuf>,
    ) -> Self {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let sink: FrameSink = capture.sink();
        *sink.lock().unwrap() = Some(raw_tx.clone());

        let cancelled = Arc::new(AtomicBool::new(false));
        let (outcome_tx, outcome_rx) = oneshot::channel();

        tokio::spawn(run_sender(
            task_id.clone(),
            source,
            seg_duration,
            seg_overlap,
            raw_rx,
            chunk_tx,
            sink,
            cancelled.clone(),
            save_audio_to,
            outcome_tx,
        ));

        Self {
            task_id,
            raw_tx: Some(raw_tx),
            cancelled,
            outcome_rx: Some(outcome_rx),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Abandon the session: no `is_final` chunk is sent, no `Result` will
    /// ever arrive for this `task_id` (spec §4.5 key-up-before-threshold).
    /// MUST NOT block the caller — it is called from the hotkey event
    /// thread's forwarding path.
    pub fn cancel(mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.raw_tx.take();
    }

    /// Signal the sender to flush its buffer as the final segment and
    /// await the resulting [`RecordingOutcome`].
    pub async fn finish(mut self) -> Option<RecordingOutcome> {
        // Dropping raw_tx closes the data side; the sender task notices
        // end-of-stream and treats it identically to an explicit Finish
        // once drained, but we also need one more hop to flush the final
        // chunk deterministically — see run_sender's recv loop.
        if let Some(tx) = self.raw_tx.take() {
            drop(tx);
        }
        self.outcome_rx.take()?.await.ok()
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_sender(
    task_id: String,
    source: Source,
    seg_duration: f64,
    seg_overlap: f64,
    mut raw_rx: mpsc::UnboundedReceiver<RawFrame>,
    chunk_tx: mpsc::UnboundedSender<AudioChunk>,
    sink: FrameSink,
    cancelled: Arc<AtomicBool>,
    save_audio_to: Option<PathBuf>,
    outcome_tx: oneshot::Sender<RecordingOutcome>,
) {
    let mut wav_writer = save_audio_to.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                log::warn!("could not create audio directory {parent:?}: {err}");
                return None;
            }
        }
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        hound::WavWriter::create(path, spec)
            .map_err(|err| log::warn!("could not create wav file {path:?}: {err}"))
            .ok()
    });

    let time_start = wall_clock_secs();
    let mut buffer: Vec<f32> = Vec::new();
    let mut total_samples: u64 = 0;
    let segment_samples = (seg_duration * 16_000.0).round() as usize;

    while let Some(frame) = raw_rx.recv().await {
        let mono = decimate_and_average(&frame.samples, frame.channels);
        total_samples += mono.len() as u64;

        if let Some(writer) = wav_writer.as_mut() {
            for sample in &mono {
                let _ = writer.write_sample(*sample);
            }
        }

        buffer.extend(mono);

        while buffer.len() >= segment_samples && segment_samples > 0 {
            let segment: Vec<f32> = buffer.drain(..segment_samples).collect();
            send_chunk(
                &chunk_tx,
                &task_id,
                source,
                seg_duration,
                seg_overlap,
                false,
                time_start,
                &segment,
            );
        }
    }

    // Channel closed: either cancelled (caller dropped raw_tx directly, in
    // which case `cancelled` is already set and we must stay silent) or
    // finished normally (flush whatever remains as the final segment).
    *sink.lock().unwrap() = None;

    if cancelled.load(Ordering::SeqCst) {
        return;
    }

    send_chunk(
        &chunk_tx,
        &task_id,
        source,
        seg_duration,
        seg_overlap,
        true,
        time_start,
        &buffer,
    );

    if let Some(writer) = wav_writer {
        let _ = writer.finalize();
    }

    let _ = outcome_tx.send(RecordingOutcome {
        task_id,
        duration: total_samples as f64 / 16_000.0,
        audio_path: save_audio_to,
    });
}

fn send_chunk(
    chunk_tx: &mpsc::UnboundedSender<AudioChunk>,
    task_id: &str,
    source: Source,
    seg_duration: f64,
    seg_overlap: f64,
    is_final: bool,
    time_start: f64,
    samples: &[f32],
) {
    let chunk = AudioChunk {
        task_id: task_id.to_string(),
        source,
        seg_duration,
        seg_overlap,
        is_final,
        time_start,
        time_frame: wall_clock_secs(),
        data: encode_samples(samples),
    };
    let _ = chunk_tx.send(chunk);
}

fn wall_clock_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Build the `<yyyy>/<mm>/assets/` path a new recording's audio is
/// mirrored to, relative to `data_dir` (`client_create_file.py`).
pub fn provisional_audio_path(data_dir: &std::path::Path, task_id: &str) -> PathBuf {
    let now = Local::now();
    data_dir
        .join(format!("{}", now.format("%Y")))
        .join(format!("{}", now.format("%m")))
        .join("assets")
        .join(format!("{task_id}.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_suppresses_final_chunk() {
        let capture_sink: FrameSink = Arc::new(std::sync::Mutex::new(None));
        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel();
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        *capture_sink.lock().unwrap() = Some(raw_tx.clone());

        let cancelled = Arc::new(AtomicBool::new(false));
        let (outcome_tx, _outcome_rx) = oneshot::channel();

        let handle = tokio::spawn(run_sender(
            "t1".to_string(),
            Source::Mic,
            15.0,
            2.0,
            raw_rx,
            chunk_tx,
            capture_sink,
            cancelled.clone(),
            None,
            outcome_tx,
        ));

        raw_tx
            .send(RawFrame {
                samples: vec![0.0; 30],
                channels: 1,
                time: 0.0,
            })
            .unwrap();

        cancelled.store(true, Ordering::SeqCst);
        drop(raw_tx);
        handle.await.unwrap();

        assert!(chunk_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn finish_flushes_remaining_buffer_as_final_chunk() {
        let capture_sink: FrameSink = Arc::new(std::sync::Mutex::new(None));
        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel();
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        *capture_sink.lock().unwrap() = Some(raw_tx.clone());

        let cancelled = Arc::new(AtomicBool::new(false));
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let handle = tokio::spawn(run_sender(
            "t2".to_string(),
            Source::Mic,
            15.0,
            2.0,
            raw_rx,
            chunk_tx,
            capture_sink,
            cancelled,
            None,
            outcome_tx,
        ));

        raw_tx
            .send(RawFrame {
                samples: vec![0.1; 9],
                channels: 1,
                time: 0.0,
            })
            .unwrap();
        drop(raw_tx);
        handle.await.unwrap();

        let chunk = chunk_rx.try_recv().expect("final chunk sent");
        assert!(chunk.is_final);

        let outcome = outcome_rx.await.expect("outcome sent");
        assert_eq!(outcome.task_id, "t2");
    }
}
