// src/task.rs

//! The job capability and the per-task run/reset state machine.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, warn};

use crate::dag::{DagStore, VertexId};
use crate::errors::{JobqError, Result};

/// A unit of work: a no-argument, error-returning operation.
///
/// The executor invokes this exactly once per run-epoch per task and treats
/// a returned error as a terminal failure for that attempt.
pub trait Job: Send + Sync {
    fn run(&self) -> anyhow::Result<()>;
}

impl<F> Job for F
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self) -> anyhow::Result<()> {
        self()
    }
}

/// The graph store shared between the queue and its tasks. The payload of
/// every vertex is the task itself; there is no mirrored structure.
pub(crate) type SharedStore = Arc<Mutex<DagStore<Arc<Task>>>>;

/// Per-run state of a task.
///
/// `Ran` and `RanFailed` are both "ran" for the at-most-once contract: a
/// plain `run()` short-circuits on either. `RanFailed` only behaves
/// differently when the owning queue opts into retrying failed tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    NotRun,
    Ran,
    RanFailed,
}

/// A job wrapped with identity and run-state, stored as its vertex's payload.
///
/// The task owns its job and state exclusively; nothing else observes or
/// mutates them directly. State moves `NotRun -> Ran` at most once per
/// run-epoch and back only through an explicit reset, which cascades to all
/// descendants.
pub struct Task {
    id: VertexId,
    job: Box<dyn Job>,
    state: Mutex<RunState>,
    retry_failed: bool,
    store: Weak<Mutex<DagStore<Arc<Task>>>>,
}

/// Lock that survives a panicking job: a poisoned state flag is still
/// meaningful, so recover the guard instead of propagating the poison.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Task {
    /// Create a task and insert it as a vertex of `store`, which mints the
    /// task's id. Both happen under one store lock, so the id is unique and
    /// the vertex payload is the task itself from the moment it exists.
    pub(crate) fn new(job: Box<dyn Job>, store: &SharedStore, retry_failed: bool) -> Arc<Task> {
        let mut graph = lock_unpoisoned(store);
        let id = graph.mint_id();
        let task = Arc::new(Task {
            id: id.clone(),
            job,
            state: Mutex::new(RunState::NotRun),
            retry_failed,
            store: Arc::downgrade(store),
        });
        graph.insert_vertex(id, Arc::clone(&task));
        task
    }

    /// The task's vertex id in the graph store.
    pub fn id(&self) -> &VertexId {
        &self.id
    }

    /// True once the task has run (successfully or not) in this run-epoch.
    pub fn has_run(&self) -> bool {
        matches!(
            *lock_unpoisoned(&self.state),
            RunState::Ran | RunState::RanFailed
        )
    }

    /// Run the job at most once.
    ///
    /// If the task already ran this epoch, returns `Ok(())` immediately
    /// without re-invoking the job. Otherwise the job runs under the task's
    /// exclusive lock and the state transitions to ran *unconditionally*,
    /// even when the job fails, before the lock is released; the job's error
    /// is returned verbatim. A failing task is therefore never retried by a
    /// plain `run()`; only an explicit reset re-arms it (unless the owning
    /// queue was configured to retry failed tasks).
    ///
    /// Concurrent callers serialize on the lock: exactly one invokes the
    /// job, the rest short-circuit once the state has moved on.
    pub fn run(&self) -> Result<()> {
        let mut state = lock_unpoisoned(&self.state);
        match *state {
            RunState::Ran => return Ok(()),
            RunState::RanFailed if !self.retry_failed => return Ok(()),
            _ => {}
        }

        let outcome = self.job.run();
        *state = if outcome.is_ok() {
            RunState::Ran
        } else {
            RunState::RanFailed
        };
        match outcome {
            Ok(()) => {
                debug!(id = %self.id, "job ran");
                Ok(())
            }
            Err(err) => {
                warn!(id = %self.id, error = %err, "job failed");
                Err(err.into())
            }
        }
    }

    /// Reset this task to not-run, then every descendant reachable via the
    /// graph store, in the store's ordered-descendant order (deterministic).
    pub fn reset_run(&self) {
        self.reset_local();

        let Some(store) = self.store.upgrade() else {
            warn!(id = %self.id, "graph store dropped; reset stops at this task");
            return;
        };

        // Snapshot the cascade under the store lock, release it, then touch
        // the per-task locks.
        let (tasks, order) = {
            let graph = lock_unpoisoned(&store);
            match (graph.descendants(&self.id), graph.ordered_descendants(&self.id)) {
                (Ok(tasks), Ok(order)) => (tasks, order),
                (Err(err), _) | (_, Err(err)) => {
                    warn!(id = %self.id, error = %err, "reset cascade aborted");
                    return;
                }
            }
        };

        for id in &order {
            if let Some(task) = tasks.get(id) {
                task.reset_local();
            }
        }
        debug!(id = %self.id, descendants = order.len(), "reset cascade complete");
    }

    fn reset_local(&self) {
        *lock_unpoisoned(&self.state) = RunState::NotRun;
    }

    /// Insert a "self must complete before `child`" edge and return self for
    /// chaining. Cycle and unknown-vertex errors from the store propagate
    /// unchanged.
    pub fn add_child(self: &Arc<Self>, child: &Arc<Task>) -> Result<Arc<Task>> {
        let store = self.store.upgrade().ok_or_else(|| {
            JobqError::MalformedGraph("graph store dropped before add_child".to_string())
        })?;
        let mut graph = lock_unpoisoned(&store);
        graph.add_edge(&self.id, child.id())?;
        Ok(Arc::clone(self))
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("state", &*lock_unpoisoned(&self.state))
            .finish_non_exhaustive()
    }
}
