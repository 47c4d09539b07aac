//! Dead-letter log: segments that failed to decode are written to disk
//! instead of silently dropped, so a malformed client stream can be
//! inspected after the fact.
//!
//! The original pickles the failed task; this crate writes plain JSON
//! instead, in keeping with the rest of the ambient stack's avoidance of
//! opaque binary formats.

use std::path::{Path, PathBuf};

use log::error;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DeadLetter<'a> {
    task_id: &'a str,
    socket_id: &'a str,
    byte_len: usize,
    error: String,
}

/// Write one failed segment's record to `<data_dir>/dead-letter/`. Failure
/// to write is only logged — a dead-letter write must never itself bring
/// down the connection handler.
pub fn record(data_dir: &Path, task_id: &str, socket_id: &str, byte_len: usize, error_text: impl ToString) {
    let dir = data_dir.join("dead-letter");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        error!("could not create dead-letter directory {}: {e}", dir.display());
        return;
    }

    let entry = DeadLetter {
        task_id,
        socket_id,
        byte_len,
        error: error_text.to_string(),
    };

    let path = file_path(&dir, task_id);
    match serde_json::to_vec_pretty(&entry) {
        Ok(bytes) => {
            if let Err(e) = std::fs::write(&path, bytes) {
                error!("failed to write dead-letter record {}: {e}", path.display());
            }
        }
        Err(e) => error!("failed to serialise dead-letter record: {e}"),
    }
}

fn file_path(dir: &Path, task_id: &str) -> PathBuf {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    dir.join(format!("{task_id}-{ts}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_record_to_the_dead_letter_directory() {
        let dir = tempfile::tempdir().unwrap();
        record(dir.path(), "t1", "s1", 7, "not a whole number of f32 frames");
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("dead-letter"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }
}
