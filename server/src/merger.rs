//! C6 — per-task result accumulation and overlap merging, ported from
//! `server_recognize.py::recognize`.
//!
//! One [`PartialResult`] lives per `task_id` from the first segment's
//! recognition until the final segment's, at which point it is removed
//! from the table and returned as the authoritative, complete transcript.

use std::collections::HashMap;
use std::sync::Mutex;

use capswriter_protocol::Source;
use capswriter_textproc::itn::chinese_to_num;
use capswriter_textproc::spacing::adjust_space;
use capswriter_textproc::{drop_trailing_seam_punctuation, join_tokens_to_text};

use crate::asr::{RecognitionOutput, Task};
use crate::punctuation::PunctuationModel;

#[derive(Debug, Clone, Default)]
pub struct PartialResult {
    pub task_id: String,
    pub socket_id: String,
    pub source: Option<Source>,
    pub duration: f64,
    pub time_start: f64,
    pub time_submit: f64,
    pub time_complete: f64,
    pub tokens: Vec<String>,
    pub timestamps: Vec<f64>,
    pub text: String,
    pub is_final: bool,
}

impl PartialResult {
    fn new(task_id: String, socket_id: String) -> Self {
        Self {
            task_id,
            socket_id,
            ..Default::default()
        }
    }
}

/// Table of in-flight results, one per `task_id`, guarded by a mutex since
/// segments for different tasks may complete concurrently across worker
/// threads.
#[derive(Default)]
pub struct ResultTable(Mutex<HashMap<String, PartialResult>>);

impl ResultTable {
    /// Fold one segment's raw recognition output into its task's running
    /// result, applying the coarse/fine overlap cuts, the merge-seam
    /// punctuation fix, and text recomposition (spec §4.4 steps 4-7).
    ///
    /// Returns the updated snapshot. When `task.is_final`, the snapshot is
    /// also removed from the table and its `is_final` flag is set — the
    /// caller owns delivering it onward exactly once.
    pub fn merge(
        &self,
        task: &Task,
        output: &RecognitionOutput,
        cut_fraction: f32,
        opts: &FormatOptions,
        punctuation: &dyn PunctuationModelSync,
    ) -> PartialResult {
        let mut table = self.0.lock().unwrap();
        let entry = table
            .entry(task.task_id.clone())
            .or_insert_with(|| PartialResult::new(task.task_id.clone(), task.socket_id.clone()));

        let segment_duration = task.samples.len() as f64 / 16_000.0;
        entry.duration += segment_duration;
        entry.source = Some(task.source);
        entry.time_start = task.time_start;
        entry.time_submit = task.time_submit;
        entry.time_complete = now_seconds();

        let cut_point = task.overlap * cut_fraction as f64;

        // Coarse cut: drop leading tokens inside the overlap window at the
        // start, and trailing tokens inside the overlap window at the end
        // (unless this is the final segment, which keeps everything to the
        // end).
        let mut m = output.timestamps.len();
        for (i, &ts) in output.timestamps.iter().enumerate() {
            if ts > cut_point {
                m = i;
                break;
            }
        }
        if entry.timestamps.is_empty() {
            m = 0;
        }

        let mut n = output.timestamps.len();
        for (i, &ts) in output.timestamps.iter().enumerate() {
            if ts > segment_duration - cut_point {
                n = i + 1;
                break;
            }
            n = i + 1;
        }
        if task.is_final {
            n = output.timestamps.len();
        }

        let window_tokens: Vec<String> = output.tokens[m.min(output.tokens.len())..n.min(output.tokens.len())].to_vec();

        // Fine cut: if the last one or two tokens already carried over
        // from the previous segment reappear at the head of this window,
        // drop them so they aren't duplicated.
        let mut m2 = 0;
        if !entry.tokens.is_empty() {
            let tail2 = entry.tokens.len().saturating_sub(2);
            if entry.tokens[tail2..] == window_tokens[..window_tokens.len().min(2)] && window_tokens.len() >= 2 {
                m2 = 2;
            } else if entry
                .tokens
                .last()
                .map(|t| window_tokens.first() == Some(t))
                .unwrap_or(false)
            {
                m2 = 1;
            }
        }

        let new_timestamps: Vec<f64> = output.timestamps[m.min(output.timestamps.len())..n.min(output.timestamps.len())]
            [m2.min(window_tokens.len())..]
            .iter()
            .map(|t| t + task.offset)
            .collect();
        let new_tokens: Vec<String> = window_tokens[m2.min(window_tokens.len())..].to_vec();

        entry.tokens.extend(new_tokens);
        entry.timestamps.extend(new_timestamps);

        // Drop a lone punctuation token sitting right at the segment seam
        // so it doesn't get orphaned mid-merge by the next segment's cut.
        if !task.is_final {
            drop_trailing_seam_punctuation(&mut entry.tokens, &mut entry.timestamps);
        }

        entry.text = format_text(&join_tokens_to_text(&entry.tokens), opts, punctuation);

        if task.is_final {
            entry.is_final = true;
            let finished = entry.clone();
            table.remove(&task.task_id);
            finished
        } else {
            entry.clone()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    pub format_num: bool,
    pub format_spell: bool,
}

/// Synchronous facade over [`PunctuationModel`], since the merge step
/// above does not itself run inside an async context. `ServerContext`
/// bridges its async model with a blocking call via `tokio::runtime`'s
/// `block_in_place`/`Handle::block_on` at the call site in the frontend.
pub trait PunctuationModelSync {
    fn punctuate_blocking(&self, text: &str) -> String;
}

/// Recompose formatted text from the merged token stream: spacing, an
/// optional punctuation pass, then Chinese-number ITN, then spacing again
/// (SPEC_FULL.md §4's resolution of the original's `format_text` order).
fn format_text(text: &str, opts: &FormatOptions, punctuation: &dyn PunctuationModelSync) -> String {
    let mut out = text.to_string();
    if opts.format_spell {
        out = adjust_space(&out);
    }
    out = punctuation.punctuate_blocking(&out);
    if opts.format_num {
        out = chinese_to_num(&out);
    }
    if opts.format_spell {
        out = adjust_space(&out);
    }
    out
}

fn now_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Bridges the async [`PunctuationModel`] into [`PunctuationModelSync`] via
/// a handle to the tokio runtime the frontend is already running on.
pub struct BlockingPunctuationModel {
    pub model: std::sync::Arc<dyn PunctuationModel>,
    pub handle: tokio::runtime::Handle,
}

impl PunctuationModelSync for BlockingPunctuationModel {
    fn punctuate_blocking(&self, text: &str) -> String {
        if text.is_empty() {
            return text.to_string();
        }
        let model = self.model.clone();
        let owned = text.to_string();
        let result = tokio::task::block_in_place(|| {
            self.handle
                .block_on(async move { model.punctuate(&owned).await })
        });
        result.unwrap_or_else(|_| text.to_string())
    }
}

/// Drains completed `WorkerOutput`s from the ASR worker pool, merges each
/// into its task's running result, and hands the merged snapshot to
/// `on_result` (which the caller wires to a [`crate::frontend::SocketRegistry`]
/// dispatch). Runs on its own thread since the input queue is a blocking
/// `std::sync::mpsc` receiver.
pub fn run_dispatch_loop(
    queue_out: std::sync::mpsc::Receiver<crate::asr::worker::WorkerOutput>,
    table: std::sync::Arc<ResultTable>,
    cut_fraction: f32,
    opts: FormatOptions,
    punctuation: std::sync::Arc<dyn PunctuationModelSync + Send + Sync>,
    mut on_result: impl FnMut(PartialResult),
) {
    while let Ok(output) = queue_out.recv() {
        let merged = table.merge(
            &output.task,
            &output.result,
            cut_fraction,
            &opts,
            punctuation.as_ref(),
        );
        on_result(merged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PassThrough;
    impl PunctuationModelSync for PassThrough {
        fn punctuate_blocking(&self, text: &str) -> String {
            text.to_string()
        }
    }

    fn task(task_id: &str, is_final: bool, offset: f64) -> Task {
        Task {
            task_id: task_id.to_string(),
            socket_id: "s1".to_string(),
            source: Source::Mic,
            samples: vec![0.0; 16_000],
            offset,
            overlap: 0.4,
            is_final,
            time_start: 0.0,
            time_submit: 0.0,
        }
    }

    #[test]
    fn coarse_cut_drops_head_overlap_and_tail_beyond_first_crossing() {
        let table = ResultTable::default();
        // overlap=0.4, cut_fraction=0.5 -> cut_point=0.2; duration=1.0s ->
        // tail cutoff at 0.8s. "你" sits inside the head overlap and gets
        // dropped; "呢" is the second token past the tail cutoff (only the
        // first crossing token, "吗", is kept) and also gets dropped.
        let output = RecognitionOutput {
            tokens: vec!["你".into(), "好".into(), "吗".into(), "呢".into()],
            timestamps: vec![0.05, 0.3, 0.85, 0.95],
        };
        let opts = FormatOptions {
            format_num: false,
            format_spell: false,
        };
        let result = table.merge(&task("t1", false, 0.0), &output, 0.5, &opts, &PassThrough);
        assert_eq!(result.tokens, vec!["好".to_string(), "吗".to_string()]);
    }

    #[test]
    fn final_segment_is_removed_from_table_and_flagged() {
        let table = ResultTable::default();
        let output = RecognitionOutput {
            tokens: vec!["好".into()],
            timestamps: vec![0.5],
        };
        let opts = FormatOptions {
            format_num: false,
            format_spell: false,
        };
        let result = table.merge(&task("t2", true, 0.0), &output, 0.5, &opts, &PassThrough);
        assert!(result.is_final);
        assert!(table.0.lock().unwrap().get("t2").is_none());
    }

    #[test]
    fn repeated_tail_token_is_not_duplicated_across_segments() {
        let table = ResultTable::default();
        let opts = FormatOptions {
            format_num: false,
            format_spell: false,
        };
        let first = RecognitionOutput {
            tokens: vec!["你".into(), "好".into()],
            timestamps: vec![0.1, 0.3],
        };
        table.merge(&task("t3", false, 0.0), &first, 0.5, &opts, &PassThrough);

        // An overlap of -10 is physically meaningless but isolates the
        // fine-cut path in this test: it forces the coarse cut to keep the
        // whole window (cut_point is far below every timestamp), so the
        // repeated leading "好" can only be caught by the fine dedup.
        let mut second_task = task("t3", true, 1.0);
        second_task.overlap = -10.0;
        let second = RecognitionOutput {
            tokens: vec!["好".into(), "吗".into()],
            timestamps: vec![0.05, 0.6],
        };
        let result = table.merge(&second_task, &second, 0.5, &opts, &PassThrough);
        assert_eq!(
            result.tokens,
            vec!["你".to_string(), "好".to_string(), "吗".to_string()]
        );
    }
}
