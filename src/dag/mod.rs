// src/dag/mod.rs

//! DAG storage and queries.
//!
//! [`store`] owns the vertex/edge structure: vertex insertion with id
//! minting, cycle-checked edge insertion, root listing, and descendant
//! queries (both as a payload map and as a topologically ordered sequence).

pub mod store;

pub use store::{DagStore, VertexId};
