// src/queue.rs

//! Queue orchestration: the only component callers interact with directly.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::dag::{DagStore, VertexId};
use crate::errors::{JobqError, Result};
use crate::task::{lock_unpoisoned, Job, SharedStore, Task};

/// Queue construction options.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueOptions {
    /// When true, a task whose job previously failed is re-run by a plain
    /// [`Queue::run`] call, without requiring an explicit reset.
    ///
    /// Default: false — a failed attempt counts as ran until reset, the
    /// at-most-once-attempt policy downstream failure handling depends on.
    pub retry_failed: bool,
}

/// Registers jobs as tasks against one graph store and walks the graph to
/// execute ([`run`](Self::run)) and to reset ([`reset_after`](Self::reset_after)).
///
/// Graph construction (adding tasks and wiring edges) is logically separate
/// from execution; structural mutation during an in-flight `run` is
/// unsupported.
pub struct Queue {
    store: SharedStore,
    options: QueueOptions,
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl Queue {
    pub fn new() -> Self {
        Self::with_options(QueueOptions::default())
    }

    pub fn with_options(options: QueueOptions) -> Self {
        Self {
            store: Arc::new(Mutex::new(DagStore::new())),
            options,
        }
    }

    /// Wrap `job` in a new task, insert it as a vertex and return its id.
    /// Does not run it.
    pub fn add(&self, job: impl Job + 'static) -> VertexId {
        self.default_task(job).id().clone()
    }

    /// Same construction as [`add`](Self::add), returning the task handle so
    /// callers can wire dependencies via [`Task::add_child`] before running.
    pub fn default_task(&self, job: impl Job + 'static) -> Arc<Task> {
        Task::new(Box::new(job), &self.store, self.options.retry_failed)
    }

    /// Execute the whole graph honoring dependencies.
    ///
    /// For every root vertex, in the store's root order: run the root, then
    /// every descendant of that root in topological order. Stops on the
    /// first error: the failing job's error is returned verbatim and no
    /// further tasks are attempted in this call, including unrelated roots
    /// that have not yet started.
    pub fn run(&self) -> Result<()> {
        let plans = self.collect_run_plans()?;
        info!(roots = plans.len(), "running job graph");

        for (root, descendants) in plans {
            self.run_task(&root)?;
            for task in &descendants {
                self.run_task(task)?;
            }
        }
        Ok(())
    }

    /// Re-arm a sub-graph (or the whole graph) for another run.
    ///
    /// With ids: for each id, reset every *descendant* of that id — never
    /// the id's own task. An absent id is a caller error
    /// ([`JobqError::NoSuchVertex`]).
    ///
    /// With no ids: reset every root task, which cascades to all
    /// descendants — a whole-graph reset.
    pub fn reset_after(&self, ids: &[VertexId]) -> Result<()> {
        if ids.is_empty() {
            return self.reset_all();
        }

        for id in ids {
            let descendants = {
                let graph = lock_unpoisoned(&self.store);
                let tasks = graph.descendants(id)?;
                let order = graph.ordered_descendants(id)?;
                order
                    .into_iter()
                    .map(|d| {
                        tasks.get(&d).cloned().ok_or_else(|| {
                            JobqError::MalformedGraph(format!(
                                "vertex {d} is ordered but holds no task"
                            ))
                        })
                    })
                    .collect::<Result<Vec<Arc<Task>>>>()?
            };

            debug!(%id, descendants = descendants.len(), "resetting descendants");
            for task in &descendants {
                task.reset_run();
            }
        }
        Ok(())
    }

    fn reset_all(&self) -> Result<()> {
        let roots = {
            let graph = lock_unpoisoned(&self.store);
            graph
                .roots()
                .into_iter()
                .map(|id| {
                    graph.get(&id).cloned().ok_or_else(|| {
                        JobqError::MalformedGraph(format!("root {id} holds no task"))
                    })
                })
                .collect::<Result<Vec<Arc<Task>>>>()?
        };

        debug!(roots = roots.len(), "resetting whole graph from roots");
        for root in &roots {
            root.reset_run();
        }
        Ok(())
    }

    /// Snapshot, under one store lock, each root together with its ordered
    /// descendant tasks. The lock is released before any job runs.
    fn collect_run_plans(&self) -> Result<Vec<(Arc<Task>, Vec<Arc<Task>>)>> {
        let graph = lock_unpoisoned(&self.store);
        let mut plans = Vec::new();

        for root_id in graph.roots() {
            let root = graph.get(&root_id).cloned().ok_or_else(|| {
                JobqError::MalformedGraph(format!("root {root_id} holds no task"))
            })?;
            let tasks = graph.descendants(&root_id)?;
            let order = graph.ordered_descendants(&root_id)?;

            let mut descendants = Vec::with_capacity(order.len());
            for id in order {
                let task = tasks.get(&id).cloned().ok_or_else(|| {
                    JobqError::MalformedGraph(format!("vertex {id} is ordered but holds no task"))
                })?;
                descendants.push(task);
            }
            plans.push((root, descendants));
        }
        Ok(plans)
    }

    fn run_task(&self, task: &Arc<Task>) -> Result<()> {
        if let Err(err) = task.run() {
            warn!(id = %task.id(), "job failed; aborting this run");
            return Err(err);
        }
        Ok(())
    }
}
