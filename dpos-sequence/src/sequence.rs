// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::SequenceConfig;
use crate::error::{SequenceError, SequenceResult};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, error, info, warn};

type Task = Box<dyn FnOnce() + Send + 'static>;

enum SequenceMessage {
    Run(Task),
    Stop,
}

struct SequenceShared {
    name: String,
    warning_threshold: usize,
    /// tasks submitted and not started yet
    depth: AtomicUsize,
    cancelled: AtomicBool,
    stopped: AtomicBool,
}

/// Handle used to submit tasks to a sequence. Clones feed the same queue.
#[derive(Clone)]
pub struct Sequence {
    sender: Sender<SequenceMessage>,
    shared: Arc<SequenceShared>,
    worker: ThreadId,
}

/// Stops the worker of a sequence
pub struct SequenceManager {
    worker: Option<(Sender<SequenceMessage>, JoinHandle<()>)>,
    shared: Arc<SequenceShared>,
}

/// Spawns the worker thread of a sequence
pub fn start_sequence(config: SequenceConfig) -> SequenceResult<(Sequence, SequenceManager)> {
    let (sender, receiver) = unbounded();
    let shared = Arc::new(SequenceShared {
        name: config.name.clone(),
        warning_threshold: config.warning_threshold,
        depth: AtomicUsize::new(0),
        cancelled: AtomicBool::new(false),
        stopped: AtomicBool::new(false),
    });
    let worker_shared = shared.clone();
    let handle = thread::Builder::new()
        .name(format!("{} sequence", config.name))
        .spawn(move || run(receiver, worker_shared))
        .map_err(|err| SequenceError::SpawnError(config.name.clone(), err.to_string()))?;
    let worker = handle.thread().id();
    info!("sequence {} started", config.name);
    Ok((
        Sequence {
            sender: sender.clone(),
            shared: shared.clone(),
            worker,
        },
        SequenceManager {
            worker: Some((sender, handle)),
            shared,
        },
    ))
}

fn run(receiver: Receiver<SequenceMessage>, shared: Arc<SequenceShared>) {
    while let Ok(SequenceMessage::Run(task)) = receiver.recv() {
        shared.depth.fetch_sub(1, Ordering::SeqCst);
        if shared.cancelled.load(Ordering::SeqCst) {
            debug!("sequence {}: cancelled task skipped", shared.name);
            continue;
        }
        if catch_unwind(AssertUnwindSafe(task)).is_err() {
            error!("sequence {}: task panicked", shared.name);
        }
    }
    let dropped = receiver.try_iter().count();
    if dropped > 0 {
        warn!(
            "sequence {}: {} tasks submitted after stop were dropped",
            shared.name, dropped
        );
    }
    debug!("sequence {} worker exiting", shared.name);
}

impl Sequence {
    /// Name of the domain
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Tasks waiting to start
    pub fn depth(&self) -> usize {
        self.shared.depth.load(Ordering::SeqCst)
    }

    /// Whether the caller is running inside a task of this sequence
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.worker
    }

    /// Queues `task` without waiting for it
    pub fn add<F>(&self, task: F) -> SequenceResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.shared.stopped.load(Ordering::SeqCst) {
            return Err(SequenceError::Stopped(self.shared.name.clone()));
        }
        let depth = self.shared.depth.fetch_add(1, Ordering::SeqCst) + 1;
        if depth > self.shared.warning_threshold {
            warn!(
                "sequence {} has {} pending tasks (threshold {})",
                self.shared.name, depth, self.shared.warning_threshold
            );
        }
        if self
            .sender
            .send(SequenceMessage::Run(Box::new(task)))
            .is_err()
        {
            self.shared.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(SequenceError::Stopped(self.shared.name.clone()));
        }
        Ok(())
    }

    /// Queues `task` and blocks until it has run, returning its result.
    ///
    /// Called from a task of the same sequence, `task` runs immediately: the caller
    /// already holds the sequence.
    pub fn add_and_wait<T, F>(&self, task: F) -> SequenceResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.is_current() {
            return Ok(task());
        }
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        self.add(move || {
            let _ = result_tx.send(task());
        })?;
        result_rx
            .recv()
            .map_err(|_| SequenceError::Cancelled(self.shared.name.clone()))
    }

    /// Makes the worker skip every task that has not started yet
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` was called
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }
}

impl SequenceManager {
    /// Refuses new tasks, lets the queued ones run, then joins the worker
    pub fn stop(&mut self) {
        info!("stopping sequence {}...", self.shared.name);
        self.shared.stopped.store(true, Ordering::SeqCst);
        if let Some((sender, join_handle)) = self.worker.take() {
            if sender.send(SequenceMessage::Stop).is_err() {
                warn!("sequence {} worker already gone", self.shared.name);
            }
            drop(sender);
            if let Err(err) = join_handle.join() {
                warn!("sequence {} worker panicked: {:?}", self.shared.name, err);
            }
        }
        info!("sequence {} stopped", self.shared.name);
    }
}
