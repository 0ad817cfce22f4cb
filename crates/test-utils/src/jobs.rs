#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use jobq::Job;

/// Shared, ordered log of job invocations, for order assertions.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Drain a log into a plain `Vec` for comparison.
pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Job that succeeds and counts how many times it was invoked.
///
/// Clones share the counter, so a clone can be handed to the queue while the
/// test keeps the original for assertions.
#[derive(Clone, Default)]
pub struct CountingJob {
    calls: Arc<AtomicUsize>,
}

impl CountingJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Job for CountingJob {
    fn run(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Job that always fails with a fixed message, counting invocations.
#[derive(Clone)]
pub struct FailingJob {
    message: String,
    calls: Arc<AtomicUsize>,
}

impl FailingJob {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Job for FailingJob {
    fn run(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("{}", self.message))
    }
}

/// Job that appends its name to a shared [`EventLog`] each time it runs.
#[derive(Clone)]
pub struct RecordingJob {
    name: String,
    log: EventLog,
}

impl RecordingJob {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::clone(log),
        }
    }
}

impl Job for RecordingJob {
    fn run(&self) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(self.name.clone());
        Ok(())
    }
}
