// src/lib.rs

//! `jobq` — a dependency-aware task executor.
//!
//! Callers describe units of work ("jobs") and the ordering constraints
//! between them as a directed acyclic graph. The [`queue::Queue`] runs each
//! job at most once per run-epoch, in an order consistent with its declared
//! dependencies, stops on the first failure, and supports selective
//! re-execution of a sub-graph via reset.
//!
//! - [`dag`] holds the graph store, the sole authority on structure.
//! - [`task`] wraps a job with identity and a run/reset state machine.
//! - [`queue`] is the orchestration layer callers interact with.

pub mod dag;
pub mod errors;
pub mod logging;
pub mod queue;
pub mod task;

pub use dag::{DagStore, VertexId};
pub use errors::{JobqError, Result};
pub use queue::{Queue, QueueOptions};
pub use task::{Job, Task};
