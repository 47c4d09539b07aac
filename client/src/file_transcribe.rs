//! File-mode transcription (spec §6 CLI, C10): decode a media file via
//! `ffmpeg`, stream it to the server as `source=file` chunks, and write
//! the `.txt` / `.merge.txt` / `.json` / `.srt` quadruple once the final
//! result arrives.
//!
//! Ground truth for the chunking granularity and output quadruple is
//! `client_transcribe.py`: audio is read from `ffmpeg`'s stdout in fixed
//! 60-second blocks — unrelated to `seg_duration`, since the server's
//! segment windowing (C4) operates on the concatenated byte stream
//! regardless of how the client chose to chunk it.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use capswriter_protocol::{encode_samples, AudioChunk, Source, WireResult};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

use crate::srt::generate_srt;

const CHUNK_SECONDS_OF_SAMPLES: usize = 16_000 * 60;

#[derive(Debug, Serialize)]
struct TokenJson<'a> {
    timestamps: &'a [f64],
    tokens: &'a [String],
}

/// Decode `file` to 16 kHz mono float32 PCM via `ffmpeg`.
async fn decode_to_pcm(file: &Path) -> anyhow::Result<Vec<f32>> {
    let mut child = Command::new("ffmpeg")
        .args([
            "-i",
            file.to_str().unwrap_or_default(),
            "-f",
            "f32le",
            "-ac",
            "1",
            "-ar",
            "16000",
            "-",
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("ffmpeg produced no stdout handle"))?;
    let mut bytes = Vec::new();
    stdout.read_to_end(&mut bytes).await?;

    child.wait().await?;

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Stream `samples` to the server as fixed-size `source=file` chunks and
/// return the final [`WireResult`].
async fn stream_file_samples(
    chunk_tx: &UnboundedSender<AudioChunk>,
    mut result_rx: tokio::sync::mpsc::UnboundedReceiver<WireResult>,
    task_id: &str,
    seg_duration: f64,
    seg_overlap: f64,
    samples: &[f32],
) -> anyhow::Result<WireResult> {
    let time_start = wall_clock_secs();
    let mut offset = 0usize;

    loop {
        let end = (offset + CHUNK_SECONDS_OF_SAMPLES).min(samples.len());
        let is_final = end >= samples.len();
        let chunk = AudioChunk {
            task_id: task_id.to_string(),
            source: Source::File,
            seg_duration,
            seg_overlap,
            is_final,
            time_start,
            time_frame: wall_clock_secs(),
            data: encode_samples(&samples[offset..end]),
        };
        chunk_tx.send(chunk)?;
        offset = end;
        if is_final {
            break;
        }
    }

    loop {
        let result = result_rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("connection closed before a final result arrived"))?;
        if result.is_final {
            return Ok(result);
        }
    }
}

fn wall_clock_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Split merged text into one line per CJK sentence-ending punctuation
/// mark, matching `client_transcribe.py`'s `re.sub('[，。？]', '\n', ...)`.
fn split_into_lines(text: &str) -> String {
    text.chars()
        .map(|c| if "，。？".contains(c) { '\n' } else { c })
        .collect()
}

/// Run the full file-transcription pipeline for one file, writing the
/// `.txt`/`.merge.txt`/`.json`/`.srt` quadruple alongside it.
pub async fn transcribe_file(
    wire: &crate::wire::WireClient,
    file: &Path,
    seg_duration: f64,
    seg_overlap: f64,
) -> anyhow::Result<()> {
    let samples = decode_to_pcm(file).await?;
    let task_id = uuid::Uuid::new_v4().to_string();
    let result_rx = wire.subscribe(task_id.clone());
    let chunk_tx = wire.chunk_sender();

    let result = stream_file_samples(
        &chunk_tx,
        result_rx,
        &task_id,
        seg_duration,
        seg_overlap,
        &samples,
    )
    .await?;

    let merge_path = file.with_extension("merge.txt");
    let txt_path = file.with_extension("txt");
    let json_path = file.with_extension("json");
    let srt_path = file.with_extension("srt");

    std::fs::write(&merge_path, &result.text)?;
    let split_text = split_into_lines(&result.text);
    std::fs::write(&txt_path, &split_text)?;

    let token_json = TokenJson {
        timestamps: &result.timestamps,
        tokens: &result.tokens,
    };
    std::fs::write(&json_path, serde_json::to_string(&token_json)?)?;

    let lines: Vec<String> = split_text.lines().map(|l| l.to_string()).collect();
    let srt_doc = generate_srt(&lines, &result.tokens, &result.timestamps);
    std::fs::write(&srt_path, srt_doc)?;

    Ok(())
}

pub fn quadruple_paths(file: &Path) -> [PathBuf; 4] {
    [
        file.with_extension("txt"),
        file.with_extension("merge.txt"),
        file.with_extension("json"),
        file.with_extension("srt"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_into_lines_breaks_on_cjk_terminators() {
        let text = "你好，世界。再见？";
        let split = split_into_lines(text);
        assert_eq!(split, "你好\n世界\n再见\n");
    }

    #[test]
    fn quadruple_paths_share_the_stem() {
        let file = Path::new("/tmp/lecture.wav");
        let paths = quadruple_paths(file);
        assert_eq!(paths[0], Path::new("/tmp/lecture.txt"));
        assert_eq!(paths[3], Path::new("/tmp/lecture.srt"));
    }
}
