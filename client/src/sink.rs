//! C10 — client result sink: hot-word substitution, text normalisation,
//! punctuation trimming, injection into the focused application, and the
//! optional audio-rename / per-day Markdown logging side effects.
//!
//! Ordering (`client_recv_result.py`, spec §4.6): hot-word (C2) runs
//! before the text normaliser (C1), and trailing-punctuation trimming
//! runs last, against the fully substituted and normalised text.

use std::path::{Path, PathBuf};

use capswriter_protocol::WireResult;
use capswriter_textproc::{normalise, trim_trailing_punctuation, NormaliseOptions, SharedHotwordEngine};
use chrono::Local;

use crate::inject::{effective_mode, inject_text, InjectError};

#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub trash_punc: String,
    pub paste: bool,
    pub restore_clip: bool,
    pub audio_name_len: usize,
    pub data_dir: PathBuf,
    pub keywords_file: PathBuf,
}

pub struct ResultSink {
    hotword: SharedHotwordEngine,
    config: SinkConfig,
}

impl ResultSink {
    pub fn new(hotword: SharedHotwordEngine, config: SinkConfig) -> Self {
        Self { hotword, config }
    }

    /// Process one `is_final=true` [`WireResult`], injecting the cleaned
    /// text and, when `audio_path` is `Some`, renaming the mirrored audio
    /// file and appending the Markdown log entries. Returns the cleaned
    /// text that was injected.
    pub fn handle_final(&self, result: &WireResult, audio_path: Option<&Path>) -> String {
        let text = self.hotword.substitute(&result.text);
        let text = normalise(&text, NormaliseOptions::default());
        let text = trim_trailing_punctuation(&text, &self.config.trash_punc);

        let mode = effective_mode(self.config.paste, self.config.restore_clip);
        if let Err(err) = inject_text(&text, mode) {
            log::warn!("text injection failed: {err}");
        }

        if let Some(path) = audio_path {
            match rename_audio_file(path, &text, self.config.audio_name_len) {
                Ok(renamed) => self.append_markdown_log(&renamed, &text),
                Err(err) => log::warn!("failed to rename audio file {path:?}: {err}"),
            }
        }

        text
    }

    fn append_markdown_log(&self, audio_path: &Path, text: &str) {
        if let Err(err) = append_markdown_entry(&self.config.data_dir, audio_path, text) {
            log::warn!("failed to append markdown log: {err}");
        }
        let keywords = load_keywords(&self.config.keywords_file);
        for keyword in &keywords {
            if !keyword.is_empty() && text.starts_with(keyword.as_str()) {
                if let Err(err) =
                    append_keyword_markdown_entry(&self.config.data_dir, keyword, audio_path, text)
                {
                    log::warn!("failed to append keyword markdown log: {err}");
                }
            }
        }
    }
}

/// Map an [`InjectError`] surfaced by the sink into a log line; kept as
/// a free function so tests can assert on the error text without
/// constructing a whole `ResultSink`.
pub fn describe_inject_error(err: &InjectError) -> String {
    err.to_string()
}

const FORBIDDEN_FILENAME_CHARS: [char; 7] = ['\\', '/', ':', '"', '*', '?', '<', '>'];

fn sanitize_filename(text: &str) -> String {
    text.chars()
        .map(|c| {
            if FORBIDDEN_FILENAME_CHARS.contains(&c) || c == '|' {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// Rename `path` (the provisional `<task_id>.wav`/`.mp3` written while
/// recording) to `(yyyymmdd-hhmmss)<first N chars of text>.<ext>`
/// (`client_rename_audio.py`). Returns the new path.
fn rename_audio_file(path: &Path, text: &str, name_len: usize) -> std::io::Result<PathBuf> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("wav")
        .to_string();
    let now = Local::now();
    let prefix: String = text.chars().take(name_len).collect();
    let stem = sanitize_filename(&format!("({}){}", now.format("%Y%m%d-%H%M%S"), prefix));
    let renamed = path.with_file_name(format!("{stem}.{ext}"));
    std::fs::rename(path, &renamed)?;
    Ok(renamed)
}

/// URL-encode spaces only, matching `client_write_md.py`'s relative
/// audio link formatting.
fn encode_path_for_markdown(path: &str) -> String {
    path.replace(' ', "%20")
}

fn relative_to_day_file(data_dir: &Path, day_file: &Path, audio_path: &Path) -> String {
    let base = day_file.parent().unwrap_or(data_dir);
    let relative = audio_path
        .strip_prefix(base)
        .unwrap_or(audio_path)
        .to_string_lossy()
        .replace('\\', "/");
    encode_path_for_markdown(&relative)
}

fn day_markdown_path(data_dir: &Path) -> PathBuf {
    let now = Local::now();
    data_dir
        .join(format!("{}", now.format("%Y")))
        .join(format!("{}", now.format("%m")))
        .join(format!("{}.md", now.format("%d")))
}

fn keyword_markdown_path(data_dir: &Path, keyword: &str) -> PathBuf {
    let now = Local::now();
    data_dir
        .join(format!("{}", now.format("%Y")))
        .join(format!("{}", now.format("%m")))
        .join(format!("{keyword}-{}.md", now.format("%d")))
}

fn append_entry(log_path: &Path, data_dir: &Path, audio_path: &Path, text: &str) -> std::io::Result<()> {
    use std::io::Write;

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let relative = relative_to_day_file(data_dir, log_path, audio_path);
    let time = Local::now().format("%H:%M:%S");
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(file, "[{time}]({relative}) {text}\n")
}

fn append_markdown_entry(data_dir: &Path, audio_path: &Path, text: &str) -> std::io::Result<()> {
    append_entry(&day_markdown_path(data_dir), data_dir, audio_path, text)
}

fn append_keyword_markdown_entry(
    data_dir: &Path,
    keyword: &str,
    audio_path: &Path,
    text: &str,
) -> std::io::Result<()> {
    append_entry(
        &keyword_markdown_path(data_dir, keyword),
        data_dir,
        audio_path,
        text,
    )
}

/// Load keyword list from `keywords.txt`, always with a leading empty
/// string (`client_write_md.py`'s `kwd_list`) so the per-day log is
/// unconditionally appended to regardless of whether any real keyword
/// matched.
fn load_keywords(path: &Path) -> Vec<String> {
    let mut keywords = vec![String::new()];
    if let Ok(content) = std::fs::read_to_string(path) {
        keywords.extend(
            content
                .lines()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
        );
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_forbidden_characters() {
        assert_eq!(sanitize_filename("a/b:c*d?e"), "a b c d e");
    }

    #[test]
    fn encode_path_escapes_spaces_only() {
        assert_eq!(encode_path_for_markdown("2026/07/assets/a b.wav"), "2026/07/assets/a%20b.wav");
    }

    #[test]
    fn load_keywords_always_includes_leading_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.txt");
        std::fs::write(&path, "todo\nidea\n").unwrap();
        let keywords = load_keywords(&path);
        assert_eq!(keywords[0], "");
        assert!(keywords.contains(&"todo".to_string()));
    }

    #[test]
    fn load_keywords_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let keywords = load_keywords(&dir.path().join("missing.txt"));
        assert_eq!(keywords, vec!["".to_string()]);
    }
}
