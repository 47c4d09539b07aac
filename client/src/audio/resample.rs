//! Down-sampling from the device's native 48 kHz to the 16 kHz the server
//! expects.
//!
//! This deliberately does **not** reuse `voice-to-text`'s linear-interpolation
//! `resample_to_16k` (that function's own doc comment calls it a
//! placeholder pending a "proper" resampler). Ground truth here is
//! `client_send_audio.py`'s `np.mean(data[::3], axis=1)`: take every
//! third audio *frame* (48 kHz / 3 = 16 kHz) and average its channels,
//! rather than interpolating between samples. Only exact for a 48 kHz
//! source; other native rates are passed through the same decimation
//! factor, which the rest of the pipeline tolerates since the server
//! treats all incoming PCM as 16 kHz by protocol, not by measurement.

/// Decimate interleaved multi-channel `samples` by keeping every third
/// frame and averaging its channels down to mono.
///
/// `channels == 0` yields an empty output; `channels == 1` still applies
/// the decimation (the "averaging" of a single channel is a no-op).
pub fn decimate_and_average(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels == 0 {
        return Vec::new();
    }
    let channels = channels as usize;
    let frames: Vec<&[f32]> = samples.chunks_exact(channels).collect();
    frames
        .iter()
        .step_by(3)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_every_third_frame() {
        // 6 mono frames -> frames 0 and 3 survive.
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let out = decimate_and_average(&samples, 1);
        assert_eq!(out, vec![1.0, 4.0]);
    }

    #[test]
    fn averages_channels_within_a_kept_frame() {
        // 2-channel, 3 frames -> only frame 0 survives decimation.
        let samples = vec![1.0, 3.0, /*frame0*/ 10.0, 10.0, /*frame1*/ 20.0, 20.0 /*frame2*/];
        let out = decimate_and_average(&samples, 2);
        assert_eq!(out, vec![2.0]);
    }

    #[test]
    fn zero_channels_yields_empty() {
        assert!(decimate_and_average(&[1.0, 2.0], 0).is_empty());
    }
}
