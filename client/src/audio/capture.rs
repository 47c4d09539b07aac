//! Continuous microphone capture via `cpal` (spec §4.5: "audio capture
//! runs continuously from program start ... opening and closing the
//! device per hotkey press introduces unacceptable latency").
//!
//! Adapted from `voice-to-text`'s `audio::capture::AudioCapture`: same
//! device/stream lifecycle, generalised from a one-shot recording buffer
//! to a router that forwards every callback buffer to whichever
//! [`RecordingSession`](super::recorder::RecordingSession) is currently
//! attached (spec §5: "the audio callback ... MUST only enqueue frames
//! and return").

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// One buffer of raw interleaved audio as delivered by the cpal callback,
/// tagged with its wall-clock arrival time (spec §3 `time_frame`).
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub time: f64,
}

pub struct StreamHandle {
    _stream: cpal::Stream,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,
    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Where a [`RawFrame`] is forwarded: `None` when no session is
/// recording, in which case the callback drops the buffer on the floor
/// (spec §4.5: "when no recording is active, samples are discarded").
pub type FrameSink = Arc<Mutex<Option<UnboundedSender<RawFrame>>>>;

pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    channels: u16,
    sink: FrameSink,
}

impl AudioCapture {
    pub fn new() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;
        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            channels,
            sink: Arc::new(Mutex::new(None)),
        })
    }

    /// A clonable handle recording sessions use to attach/detach their
    /// channel without reaching into the stream itself.
    pub fn sink(&self) -> FrameSink {
        self.sink.clone()
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Build and start the input stream. The callback only clones the
    /// sink `Arc`, checks it under a brief lock, and forwards the buffer
    /// — no allocation beyond the unavoidable `Vec` copy of the callback
    /// data, no blocking I/O, on the audio-driver thread.
    pub fn start(&self) -> Result<StreamHandle, CaptureError> {
        let sink = self.sink.clone();
        let channels = self.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let guard = sink.lock().unwrap();
                if let Some(tx) = guard.as_ref() {
                    let time = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_secs_f64())
                        .unwrap_or(0.0);
                    let _ = tx.send(RawFrame {
                        samples: data.to_vec(),
                        channels,
                        time,
                    });
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_frame_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RawFrame>();
    }
}
