//! The ASR worker: a dedicated OS thread pulling [`Task`]s off an mpsc
//! queue and feeding them to an [`AsrEngine`].
//!
//! Design note (SPEC_FULL.md §3): the original runs the recogniser in a
//! separate OS process, communicating over pipes. Since this crate's ASR
//! boundary is a plain Rust trait object rather than a wire protocol,
//! process-boundary IPC would add marshalling with no corresponding
//! benefit — a dedicated thread gives the same "recognition never blocks
//! the network event loop" property without it.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{error, warn};

use super::{AsrEngine, RecognitionOutput, Task};

/// One completed recognition, still carrying the [`Task`] metadata the
/// merger needs to place it.
pub struct WorkerOutput {
    pub task: Task,
    pub result: RecognitionOutput,
}

pub struct AsrWorker {
    handle: Option<JoinHandle<()>>,
}

impl AsrWorker {
    /// Spawns one worker thread pulling from a receiver shared across the
    /// whole pool (spec §5: "multiple workers MAY be added"). A plain
    /// `mpsc::Receiver` only has one consumer, so the pool shares it behind
    /// a mutex; with `worker_count == 1` this degenerates to no contention.
    pub fn spawn(
        engine: Arc<dyn AsrEngine>,
        queue_in: Arc<Mutex<Receiver<Task>>>,
        queue_out: Sender<WorkerOutput>,
    ) -> Self {
        let handle = std::thread::spawn(move || loop {
            let received = {
                let guard = queue_in.lock().unwrap();
                guard.recv()
            };
            let task = match received {
                Ok(task) => task,
                Err(_) => break,
            };

            match engine.recognize(&task.samples, task.is_final) {
                Ok(result) => {
                    if queue_out.send(WorkerOutput { task, result }).is_err() {
                        warn!("asr worker output queue closed, exiting");
                        break;
                    }
                }
                Err(e) => error!("recognition failed for task {}: {e}", task.task_id),
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Spawns `count` worker threads sharing one input queue.
    pub fn spawn_pool(
        count: usize,
        engine_factory: impl Fn() -> Arc<dyn AsrEngine>,
        queue_in: Receiver<Task>,
        queue_out: Sender<WorkerOutput>,
    ) -> Vec<Self> {
        let queue_in = Arc::new(Mutex::new(queue_in));
        (0..count.max(1))
            .map(|_| Self::spawn(engine_factory(), queue_in.clone(), queue_out.clone()))
            .collect()
    }

    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::MockAsrEngine;
    use std::sync::mpsc;

    #[test]
    fn worker_round_trips_a_task() {
        let engine: Arc<dyn AsrEngine> = Arc::new(MockAsrEngine {
            tokens: vec!["你".into(), "好".into()],
            timestamps: vec![0.0, 0.2],
        });
        let (tx_in, rx_in) = mpsc::channel();
        let (tx_out, rx_out) = mpsc::channel();
        let worker = AsrWorker::spawn(engine, Arc::new(Mutex::new(rx_in)), tx_out);

        tx_in
            .send(Task {
                task_id: "t1".into(),
                socket_id: "s1".into(),
                source: capswriter_protocol::Source::Mic,
                samples: vec![0.0; 16000],
                offset: 0.0,
                overlap: 0.0,
                is_final: true,
                time_start: 0.0,
                time_submit: 0.0,
            })
            .unwrap();

        let output = rx_out.recv().unwrap();
        assert_eq!(output.task.task_id, "t1");
        assert_eq!(output.result.tokens, vec!["你".to_string(), "好".to_string()]);

        drop(tx_in);
        worker.join();
    }
}
