//! Shared directed-graph utility used for both the class graph and the
//! file graph. Adjacency is insertion-ordered and deduplicated so that
//! neighbor iteration is reproducible across runs without relying on
//! hash-table iteration order (spec invariant: "Hash-based structures
//! may be used internally but must never leak their iteration order").

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// A directed graph over nodes of type `N`. Self-loops are rejected at
/// `add_edge` time by the caller's choice (`add_edge` vs `add_edge_no_self_loop`);
/// this type itself stores whatever it is given.
#[derive(Debug, Clone)]
pub struct DiGraph<N: Eq + Hash + Clone> {
    order: Vec<N>,
    seen: HashSet<N>,
    adjacency: HashMap<N, Vec<N>>,
    edge_seen: HashMap<N, HashSet<N>>,
}

impl<N: Eq + Hash + Clone> Default for DiGraph<N> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            seen: HashSet::new(),
            adjacency: HashMap::new(),
            edge_seen: HashMap::new(),
        }
    }
}

impl<N: Eq + Hash + Clone> DiGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node if not already present. No-op otherwise.
    pub fn add_node(&mut self, node: N) {
        if self.seen.insert(node.clone()) {
            self.order.push(node.clone());
            self.adjacency.entry(node.clone()).or_default();
            self.edge_seen.entry(node).or_default();
        }
    }

    /// Add a directed edge `from -> to`, inserting both endpoints as
    /// nodes if necessary. Self-loops (`from == to`) are silently
    /// dropped. Duplicate edges collapse to one.
    pub fn add_edge(&mut self, from: N, to: N) {
        if from == to {
            return;
        }
        self.add_node(from.clone());
        self.add_node(to.clone());
        let seen_for_from = self.edge_seen.entry(from.clone()).or_default();
        if seen_for_from.insert(to.clone()) {
            self.adjacency.entry(from).or_default().push(to);
        }
    }

    pub fn contains(&self, node: &N) -> bool {
        self.seen.contains(node)
    }

    pub fn nodes(&self) -> &[N] {
        &self.order
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Neighbors of `node` in insertion order. Empty slice if the node
    /// is absent or has no outgoing edges.
    pub fn neighbors(&self, node: &N) -> &[N] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All edges as `(from, to)` pairs, iterated in node-insertion then
    /// per-node-edge-insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N)> {
        self.order.iter().flat_map(move |from| {
            self.neighbors(from).iter().map(move |to| (from, to))
        })
    }

    pub fn retain_nodes(&mut self, mut keep: impl FnMut(&N) -> bool) {
        let dropped: HashSet<N> = self.order.iter().filter(|n| !keep(n)).cloned().collect();
        if dropped.is_empty() {
            return;
        }
        self.order.retain(|n| !dropped.contains(n));
        for n in &dropped {
            self.seen.remove(n);
            self.adjacency.remove(n);
            self.edge_seen.remove(n);
        }
        for targets in self.adjacency.values_mut() {
            targets.retain(|t| !dropped.contains(t));
        }
        for targets in self.edge_seen.values_mut() {
            targets.retain(|t| !dropped.contains(t));
        }
    }
}
