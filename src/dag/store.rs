// src/dag/store.rs

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::errors::{JobqError, Result};

/// Opaque vertex identifier minted by [`DagStore`] at insertion time.
///
/// Callers must treat it as an opaque, comparable handle; its string form is
/// an implementation detail.
pub type VertexId = String;

/// Adjacency for a single vertex: outgoing and incoming edge endpoints.
#[derive(Debug, Clone, Default)]
struct Adjacency {
    children: Vec<VertexId>,
    parents: Vec<VertexId>,
}

/// Owned adjacency-based DAG keyed by minted vertex ids.
///
/// The store is the sole authority on structure. It guarantees:
/// - the graph stays acyclic at all times; a rejected edge never mutates it
/// - vertex ids are unique for the lifetime of the store
/// - root listing and sibling tie-breaks follow insertion order, so repeated
///   queries over an unchanged graph are deterministic
#[derive(Debug)]
pub struct DagStore<T> {
    vertices: HashMap<VertexId, T>,
    adjacency: HashMap<VertexId, Adjacency>,
    /// Vertex ids in insertion order; drives root ordering and tie-breaks.
    order: Vec<VertexId>,
    next_id: u64,
}

impl<T> Default for DagStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DagStore<T> {
    pub fn new() -> Self {
        Self {
            vertices: HashMap::new(),
            adjacency: HashMap::new(),
            order: Vec::new(),
            next_id: 0,
        }
    }

    /// Mint a fresh unique vertex id without inserting anything.
    ///
    /// Split out from [`add_vertex`](Self::add_vertex) so a payload that
    /// carries its own id can be constructed before insertion, under the
    /// same exclusive borrow.
    pub(crate) fn mint_id(&mut self) -> VertexId {
        let id = format!("t{}", self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a payload under a previously minted id.
    pub(crate) fn insert_vertex(&mut self, id: VertexId, payload: T) -> VertexId {
        debug!(id = %id, "vertex inserted");
        self.vertices.insert(id.clone(), payload);
        self.adjacency.insert(id.clone(), Adjacency::default());
        self.order.push(id.clone());
        id
    }

    /// Insert a new vertex holding `payload` and return its freshly minted id.
    pub fn add_vertex(&mut self, payload: T) -> VertexId {
        let id = self.mint_id();
        self.insert_vertex(id, payload)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vertices.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.vertices.get(id)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Insert a directed edge meaning "`from` must complete before `to`".
    ///
    /// Fails with [`JobqError::UnknownVertex`] if either endpoint is absent
    /// and [`JobqError::Cycle`] if the edge would make the graph cyclic; on
    /// failure the graph is left unchanged. Re-inserting an existing edge is
    /// a no-op.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<()> {
        if !self.contains(from) {
            return Err(JobqError::UnknownVertex(from.to_string()));
        }
        if !self.contains(to) {
            return Err(JobqError::UnknownVertex(to.to_string()));
        }
        if from == to || self.is_reachable(to, from) {
            debug!(%from, %to, "edge rejected: would create a cycle");
            return Err(JobqError::Cycle {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        match self.adjacency.get_mut(from) {
            Some(adj) if adj.children.iter().any(|c| c == to) => {
                debug!(%from, %to, "edge already present; ignoring");
                return Ok(());
            }
            Some(adj) => adj.children.push(to.to_string()),
            None => return Err(JobqError::UnknownVertex(from.to_string())),
        }
        if let Some(adj) = self.adjacency.get_mut(to) {
            adj.parents.push(from.to_string());
        }
        debug!(%from, %to, "edge inserted");
        Ok(())
    }

    /// Vertices with zero incoming edges, in insertion order.
    pub fn roots(&self) -> Vec<VertexId> {
        self.order
            .iter()
            .filter(|id| {
                self.adjacency
                    .get(id.as_str())
                    .is_some_and(|a| a.parents.is_empty())
            })
            .cloned()
            .collect()
    }

    /// Every vertex reachable by following edges forward from `id`, as an
    /// id-to-payload map. `id` itself is not included.
    pub fn descendants(&self, id: &str) -> Result<HashMap<VertexId, T>>
    where
        T: Clone,
    {
        if !self.contains(id) {
            return Err(JobqError::NoSuchVertex(id.to_string()));
        }
        let mut out = HashMap::new();
        for v in self.reachable_from(id) {
            if let Some(payload) = self.vertices.get(&v) {
                out.insert(v, payload.clone());
            }
        }
        Ok(out)
    }

    /// Descendants of `id` in a valid topological order of the induced
    /// sub-graph: every descendant appears after all of its own ancestors
    /// that are also descendants of `id`. Sibling ties are broken by
    /// insertion order, so the sequence is reproducible.
    pub fn ordered_descendants(&self, id: &str) -> Result<Vec<VertexId>> {
        if !self.contains(id) {
            return Err(JobqError::NoSuchVertex(id.to_string()));
        }

        let set = self.reachable_from(id);

        // In-degree restricted to parents inside the reachable set; edges
        // from outside (including `id` itself) impose no ordering here.
        let mut indegree: HashMap<&str, usize> = HashMap::new();
        for v in &set {
            let within = self
                .adjacency
                .get(v.as_str())
                .map(|a| a.parents.iter().filter(|p| set.contains(*p)).count())
                .unwrap_or(0);
            indegree.insert(v.as_str(), within);
        }

        let position: HashMap<&str, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, v)| (v.as_str(), i))
            .collect();

        let mut ready: Vec<&str> = indegree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(v, _)| *v)
            .collect();

        let pos_of = |v: &str| position.get(v).copied().unwrap_or(usize::MAX);

        let mut ordered = Vec::with_capacity(set.len());
        while !ready.is_empty() {
            // Deterministic tie-break: earliest inserted vertex first.
            let mut best = 0;
            for i in 1..ready.len() {
                if pos_of(ready[i]) < pos_of(ready[best]) {
                    best = i;
                }
            }
            let next = ready.swap_remove(best);
            ordered.push(next.to_string());

            if let Some(adj) = self.adjacency.get(next) {
                for child in &adj.children {
                    if let Some(d) = indegree.get_mut(child.as_str()) {
                        *d -= 1;
                        if *d == 0 {
                            ready.push(child.as_str());
                        }
                    }
                }
            }
        }

        if ordered.len() != set.len() {
            // Unreachable while add_edge holds the acyclicity invariant.
            return Err(JobqError::MalformedGraph(format!(
                "ordering of descendants of {id} visited {} of {} vertices",
                ordered.len(),
                set.len()
            )));
        }
        Ok(ordered)
    }

    /// Depth-first reachability, excluding the start vertex.
    fn reachable_from(&self, id: &str) -> HashSet<VertexId> {
        let mut seen: HashSet<VertexId> = HashSet::new();
        let mut stack: Vec<&VertexId> = self
            .adjacency
            .get(id)
            .map(|a| a.children.iter().collect())
            .unwrap_or_default();

        while let Some(v) = stack.pop() {
            if seen.insert(v.clone()) {
                if let Some(adj) = self.adjacency.get(v.as_str()) {
                    stack.extend(adj.children.iter());
                }
            }
        }
        seen
    }

    /// True if `to` is reachable from `from` by following edges forward.
    fn is_reachable(&self, from: &str, to: &str) -> bool {
        self.reachable_from(from).contains(to)
    }
}
