//! Dedicated OS-thread hotkey listener, generalised from
//! `voice-to-text::hotkey::listener::HotkeyListener` to watch several
//! bindings at once and to support event suppression.
//!
//! `rdev::listen` is read-only; suppressing the OS event (spec's
//! `suppress=true`) needs `rdev::grab`, whose callback decides per-event
//! whether to forward it (`Some(event)`) or swallow it (`None`). Grab
//! callbacks run on the OS input-hook thread and spec §5 requires them to
//! return in under a millisecond, so anything heavier — cancelling a
//! task, emulating a key tap, restoring a toggle key — is handed to a
//! small worker pool rather than run inline, mirroring
//! `ShortcutManager`'s `ThreadPoolExecutor(max_workers=4)`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::{BoundKey, HotkeyEvent};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool used for the handful of heavy, non-blocking-critical
/// jobs the grab callback offloads (key emulation, restore).
struct WorkerPool {
    tx: std_mpsc::Sender<Job>,
    _threads: Vec<std::thread::JoinHandle<()>>,
}

impl WorkerPool {
    fn new(workers: usize) -> Self {
        let (tx, rx) = std_mpsc::channel::<Job>();
        let rx = Arc::new(std::sync::Mutex::new(rx));
        let threads = (0..workers)
            .map(|i| {
                let rx = rx.clone();
                std::thread::Builder::new()
                    .name(format!("hotkey-worker-{i}"))
                    .spawn(move || loop {
                        let job = {
                            let guard = rx.lock().unwrap();
                            guard.recv()
                        };
                        match job {
                            Ok(job) => job(),
                            Err(_) => break,
                        }
                    })
                    .expect("failed to spawn hotkey-worker thread")
            })
            .collect();
        Self {
            tx,
            _threads: threads,
        }
    }

    fn submit(&self, job: Job) {
        let _ = self.tx.send(job);
    }
}

/// Handle to the running listener thread and its worker pool. Dropping
/// it stops event forwarding; see `voice-to-text`'s listener for why the
/// underlying `rdev` thread itself cannot be joined.
pub struct HotkeyListener {
    stop: Arc<AtomicBool>,
    emulating: Arc<AtomicBool>,
    pool: Arc<WorkerPool>,
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyListener {
    /// `bindings` pairs each configured shortcut's index with its
    /// resolved key/button and whether it should be suppressed.
    pub fn start(bindings: Vec<(usize, BoundKey, bool)>, tx: mpsc::Sender<HotkeyEvent>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let emulating = Arc::new(AtomicBool::new(false));
        let pool = Arc::new(WorkerPool::new(4));

        let stop_clone = stop.clone();
        let emulating_clone = emulating.clone();

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let result = rdev::grab(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return Some(event);
                    }
                    // Self-capture prevention: ignore events we emulated
                    // ourselves (restore-key presses, emulated taps).
                    if emulating_clone.load(Ordering::Relaxed) {
                        return Some(event);
                    }

                    let (matched, down) = match event.event_type {
                        rdev::EventType::KeyPress(k) => (BoundKey::Key(k), true),
                        rdev::EventType::KeyRelease(k) => (BoundKey::Key(k), false),
                        rdev::EventType::ButtonPress(b) => (BoundKey::Button(b), true),
                        rdev::EventType::ButtonRelease(b) => (BoundKey::Button(b), false),
                        _ => return Some(event),
                    };

                    for (index, key, suppress) in &bindings {
                        if *key == matched {
                            let _ = tx.blocking_send(HotkeyEvent {
                                index: *index,
                                down,
                            });
                            if *suppress {
                                return None;
                            }
                            return Some(event);
                        }
                    }
                    Some(event)
                });

                if let Err(err) = result {
                    log::error!("hotkey-listener: rdev::grab exited with error: {err:?}");
                }
            })
            .expect("failed to spawn hotkey-listener thread");

        Self {
            stop,
            emulating,
            pool,
            _thread: thread,
        }
    }

    /// Emulate a single tap of `key` (spec §4.5: replay a cancelled,
    /// suppressed tap so it isn't lost) without re-triggering this
    /// listener's own state machine.
    pub fn emulate_tap(&self, key: BoundKey) {
        self.emulate(key, true);
    }

    /// Re-send `key` once to restore a stateful key's OS-visible state
    /// after we suppressed its original press (spec's `restore`).
    pub fn restore_key(&self, key: BoundKey) {
        self.emulate(key, false);
    }

    fn emulate(&self, key: BoundKey, tap: bool) {
        let emulating = self.emulating.clone();
        self.pool.submit(Box::new(move || {
            emulating.store(true, Ordering::Relaxed);
            let press = match key {
                BoundKey::Key(k) => rdev::EventType::KeyPress(k),
                BoundKey::Button(b) => rdev::EventType::ButtonPress(b),
            };
            let release = match key {
                BoundKey::Key(k) => rdev::EventType::KeyRelease(k),
                BoundKey::Button(b) => rdev::EventType::ButtonRelease(b),
            };
            if tap {
                let _ = rdev::simulate(&press);
                std::thread::sleep(std::time::Duration::from_millis(20));
                let _ = rdev::simulate(&release);
            } else {
                // A stateful key's restore is a single press+release,
                // delayed slightly so it lands after the real key-up the
                // OS just processed (`schedule_restore`'s 50ms delay).
                std::thread::sleep(std::time::Duration::from_millis(50));
                let _ = rdev::simulate(&press);
                std::thread::sleep(std::time::Duration::from_millis(20));
                let _ = rdev::simulate(&release);
            }
            emulating.store(false, Ordering::Relaxed);
        }));
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
