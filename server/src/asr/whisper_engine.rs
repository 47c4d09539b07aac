//! Optional concrete [`AsrEngine`], behind the `whisper` feature. Adapted
//! from the `WhisperEngine` in the sibling GUI project this crate grew out
//! of (`stt::engine::WhisperEngine`), generalised from a whole-text
//! contract to the token/timestamp contract this crate's merger needs.
//!
//! Whisper reports timestamps per *segment*, not per token, so tokens
//! inside a segment are spread evenly across its `[t0, t1]` window. This
//! is an approximation — the real per-token boundaries the original
//! FunASR-family recognisers report are finer-grained — but it is good
//! enough to drive the merger's overlap-cut arithmetic, which only cares
//! about where a timestamp falls relative to the segment boundaries.

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::{AsrEngine, AsrError, RecognitionOutput};

pub struct WhisperAsrEngine {
    ctx: WhisperContext,
    language: Option<String>,
    n_threads: i32,
}

// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs; the model
// weights are read-only after loading and a fresh WhisperState is created
// per call.
unsafe impl Send for WhisperAsrEngine {}
unsafe impl Sync for WhisperAsrEngine {}

impl WhisperAsrEngine {
    pub fn load(model_path: &str, language: Option<String>) -> Result<Self, AsrError> {
        if !std::path::Path::new(model_path).exists() {
            return Err(AsrError::ModelNotFound(model_path.to_string()));
        }
        let ctx = WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            .map_err(|e| AsrError::ModelNotFound(e.to_string()))?;
        Ok(Self {
            ctx,
            language,
            n_threads: num_cpus(),
        })
    }
}

fn num_cpus() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as i32)
        .unwrap_or(4)
        .min(8)
}

impl AsrEngine for WhisperAsrEngine {
    fn recognize(&self, samples: &[f32], _is_final: bool) -> Result<RecognitionOutput, AsrError> {
        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| AsrError::Recognition(e.to_string()))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(self.language.as_deref());
        params.set_n_threads(self.n_threads);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_token_timestamps(true);

        state
            .full(params, samples)
            .map_err(|e| AsrError::Recognition(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| AsrError::Recognition(e.to_string()))?;

        let mut tokens = Vec::new();
        let mut timestamps = Vec::new();

        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| AsrError::Recognition(format!("segment {i}: {e}")))?;
            let t0 = state.full_get_segment_t0(i).unwrap_or(0).max(0) as f64 / 100.0;
            let t1 = state.full_get_segment_t1(i).unwrap_or(0).max(0) as f64 / 100.0;

            let words: Vec<&str> = text.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            let span = (t1 - t0).max(0.0);
            let step = span / words.len() as f64;
            for (i, word) in words.into_iter().enumerate() {
                tokens.push(word.to_string());
                timestamps.push(t0 + step * i as f64);
            }
        }

        Ok(RecognitionOutput { tokens, timestamps })
    }
}
