//! C8 — client recorder: continuous microphone capture, resampling, and
//! the per-session sender that frames audio into wire `AudioChunk`s.

pub mod capture;
pub mod recorder;
pub mod resample;

pub use capture::{AudioCapture, CaptureError, RawFrame, StreamHandle};
pub use recorder::{RecorderEvent, RecordingOutcome, RecordingSession};
pub use resample::decimate_and_average;
