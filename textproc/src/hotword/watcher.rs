//! File-watcher for the hot-word table files, with a debounced reload.
//!
//! Mirrors the `HotkeyListener` shape in the client crate: a dedicated
//! background thread owning the OS resource (here, a `notify` watcher)
//! with lifetime tied to this struct via `Drop`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, info, warn};
use notify::{RecursiveMode, Watcher};

use super::{EnTable, HotwordConfig, HotwordEngine, RuleTable, SharedHotwordEngine, ZhTable};

const DEBOUNCE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct HotwordPaths {
    pub zh: PathBuf,
    pub en: PathBuf,
    pub rule: PathBuf,
}

fn read_lines(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => s.lines().map(|l| l.to_string()).collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            warn!("failed to read hot-word file {}: {e}", path.display());
            Vec::new()
        }
    }
}

fn load_zh(path: &Path) -> ZhTable {
    ZhTable::from_words(
        read_lines(path)
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty() && !l.starts_with('#')),
    )
}

fn load_en(path: &Path) -> EnTable {
    EnTable::from_words(
        read_lines(path)
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty() && !l.starts_with('#')),
    )
}

fn load_rule(path: &Path) -> RuleTable {
    RuleTable::from_lines(read_lines(path))
}

/// Load the three tables from disk and build a fresh [`HotwordEngine`].
pub fn load_engine(paths: &HotwordPaths, config: HotwordConfig) -> HotwordEngine {
    HotwordEngine::new(
        load_zh(&paths.zh),
        load_en(&paths.en),
        load_rule(&paths.rule),
        config,
    )
}

/// Owns the background file-watcher thread; reload fires at most once per
/// [`DEBOUNCE`] quiescence window after the last modification event (spec
/// §4.2: "after a 5-second quiescence debounce it reads the file, rebuilds
/// the table atomically, and swaps the active pointer").
pub struct HotwordWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl HotwordWatcher {
    pub fn start(paths: HotwordPaths, config: HotwordConfig, shared: SharedHotwordEngine) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = stop.clone();

        let handle = thread::spawn(move || {
            let (tx, rx) = mpsc::channel();
            let mut watcher = match notify::recommended_watcher(move |res| {
                let _ = tx.send(res);
            }) {
                Ok(w) => w,
                Err(e) => {
                    error!("hot-word watcher failed to start: {e}");
                    return;
                }
            };

            for path in [&paths.zh, &paths.en, &paths.rule] {
                if let Some(dir) = path.parent() {
                    if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
                        warn!("hot-word watcher could not watch {}: {e}", dir.display());
                    }
                }
            }

            while !stop_thread.load(Ordering::Relaxed) {
                match rx.recv_timeout(Duration::from_millis(200)) {
                    Ok(Ok(_event)) => {
                        // Drain any further events within the debounce
                        // window, then reload once.
                        loop {
                            if stop_thread.load(Ordering::Relaxed) {
                                return;
                            }
                            match rx.recv_timeout(DEBOUNCE) {
                                Ok(Ok(_)) => continue,
                                Ok(Err(e)) => warn!("hot-word watcher event error: {e}"),
                                Err(mpsc::RecvTimeoutError::Timeout) => break,
                                Err(mpsc::RecvTimeoutError::Disconnected) => return,
                            }
                        }
                        info!("hot-word files changed, reloading tables");
                        let engine = load_engine(&paths, config);
                        shared.reload(engine);
                    }
                    Ok(Err(e)) => warn!("hot-word watcher event error: {e}"),
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(mpsc::RecvTimeoutError::Disconnected) => return,
                }
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for HotwordWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_engine_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HotwordPaths {
            zh: dir.path().join("hot-zh.txt"),
            en: dir.path().join("hot-en.txt"),
            rule: dir.path().join("hot-rule.txt"),
        };
        let engine = load_engine(&paths, HotwordConfig::default());
        assert_eq!(engine.substitute("unchanged"), "unchanged");
    }

    #[test]
    fn load_engine_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let en_path = dir.path().join("hot-en.txt");
        fs::write(&en_path, "CapsWriter\n").unwrap();
        let paths = HotwordPaths {
            zh: dir.path().join("hot-zh.txt"),
            en: en_path,
            rule: dir.path().join("hot-rule.txt"),
        };
        let engine = load_engine(
            &paths,
            HotwordConfig {
                hot_zh: false,
                hot_en: true,
                hot_rule: false,
            },
        );
        assert_eq!(engine.substitute("caps writer works"), "CapsWriter works");
    }
}
