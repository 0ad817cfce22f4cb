// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Structural errors (`Cycle`, `UnknownVertex`, `NoSuchVertex`) are returned
//! synchronously to the call that caused them and never mutate graph state.
//! Job-level errors stay opaque `anyhow::Error` values and pass through
//! [`Queue::run`](crate::queue::Queue::run) transparently.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobqError {
    /// The requested edge would make the graph cyclic; nothing was inserted.
    #[error("edge {from} -> {to} would create a cycle")]
    Cycle { from: String, to: String },

    /// An edge endpoint is not present in the graph.
    #[error("unknown vertex: {0}")]
    UnknownVertex(String),

    /// A descendant query was made against an id not present in the graph.
    #[error("no such vertex: {0}")]
    NoSuchVertex(String),

    /// Internal invariant violated (e.g. a vertex without a task payload).
    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    /// A job-level failure, returned verbatim from the failing job.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, JobqError>;
