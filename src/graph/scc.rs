//! SccEngine (spec.md §4.4): iterative Tarjan's algorithm over a
//! `DiGraph<FilePath>`, producing components in reverse-topological
//! emission order and the induced component DAG.
//!
//! The donor crate's cycle detector (`analysis/cycles.rs`) implements
//! Tarjan recursively; this is rewritten as an explicit work-stack per
//! spec.md's implementation note, since the class graphs this pipeline
//! processes come from whole-project parses and can be far larger than
//! the donor's per-file TS/JS import graphs.

use std::collections::HashMap;

use crate::graph::digraph::DiGraph;
use crate::model::FilePath;

/// A strongly-connected component: a non-empty set of files, stored
/// with a stable internal order (Tarjan's pop order) for deterministic
/// downstream iteration (e.g. multi-file target name hashing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub files: Vec<FilePath>,
}

impl Component {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_cycle(&self) -> bool {
        self.files.len() > 1
    }
}

/// The DAG induced by collapsing each SCC to a single node. `edges[i]`
/// lists the indices of `components` that component `i` depends on
/// (`C1 -> C2` iff some file in `C1` has an edge to some file in `C2`).
#[derive(Debug, Clone)]
pub struct ComponentDag {
    pub components: Vec<Component>,
    pub edges: Vec<Vec<usize>>,
}

impl ComponentDag {
    /// Reverse-topological order over component indices: the order
    /// Tarjan's algorithm naturally produces, since it pops a
    /// component only after all of its successors have been popped.
    pub fn emission_order(&self) -> impl Iterator<Item = usize> {
        0..self.components.len()
    }
}

/// Run Tarjan's SCC algorithm and build the induced component DAG.
pub fn compute(graph: &DiGraph<FilePath>) -> ComponentDag {
    let sccs = tarjan(graph);

    let mut owner: HashMap<FilePath, usize> = HashMap::new();
    for (idx, scc) in sccs.iter().enumerate() {
        for file in &scc.files {
            owner.insert(file.clone(), idx);
        }
    }

    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); sccs.len()];
    let mut edge_seen: Vec<std::collections::HashSet<usize>> =
        vec![std::collections::HashSet::new(); sccs.len()];
    for (from, to) in graph.edges() {
        let (Some(&from_idx), Some(&to_idx)) = (owner.get(from), owner.get(to)) else {
            continue;
        };
        if from_idx == to_idx {
            continue;
        }
        if edge_seen[from_idx].insert(to_idx) {
            edges[from_idx].push(to_idx);
        }
    }

    ComponentDag {
        components: sccs,
        edges,
    }
}

/// Iterative Tarjan's SCC, using an explicit work-stack to avoid
/// recursion depth proportional to project size. Neighbor iteration
/// follows the graph's insertion order, so component contents and
/// emission order are reproducible across runs on the same input.
fn tarjan(graph: &DiGraph<FilePath>) -> Vec<Component> {
    #[derive(Clone, Copy)]
    struct Frame {
        neighbor_cursor: usize,
    }

    let nodes = graph.nodes();
    let mut index: HashMap<FilePath, usize> = HashMap::new();
    let mut lowlink: HashMap<FilePath, usize> = HashMap::new();
    let mut on_stack: HashMap<FilePath, bool> = HashMap::new();
    let mut tarjan_stack: Vec<FilePath> = Vec::new();
    let mut result: Vec<Component> = Vec::new();
    let mut counter: usize = 0;

    for start in nodes {
        if index.contains_key(start) {
            continue;
        }

        let mut work: Vec<Frame> = vec![Frame { neighbor_cursor: 0 }];
        // Track which node a work-stack frame refers to by value, since
        // `node_idx` is a position into `nodes` computed once up front.
        let mut frame_node: Vec<FilePath> = vec![start.clone()];

        while let Some(frame) = work.last_mut() {
            let v = frame_node.last().unwrap().clone();

            if frame.neighbor_cursor == 0 {
                index.insert(v.clone(), counter);
                lowlink.insert(v.clone(), counter);
                counter += 1;
                tarjan_stack.push(v.clone());
                on_stack.insert(v.clone(), true);
            }

            let neighbors = graph.neighbors(&v);
            if frame.neighbor_cursor < neighbors.len() {
                let w = neighbors[frame.neighbor_cursor].clone();
                frame.neighbor_cursor += 1;

                if !index.contains_key(&w) {
                    work.push(Frame { neighbor_cursor: 0 });
                    frame_node.push(w);
                    continue;
                } else if *on_stack.get(&w).unwrap_or(&false) {
                    let w_idx = index[&w];
                    let v_low = lowlink[&v];
                    if w_idx < v_low {
                        lowlink.insert(v.clone(), w_idx);
                    }
                }
                continue;
            }

            // All neighbors processed; pop this frame and propagate
            // lowlink to the parent, then (if root) emit the SCC.
            work.pop();
            frame_node.pop();

            if let Some(parent) = frame_node.last() {
                let v_low = lowlink[&v];
                let p_low = lowlink[parent];
                if v_low < p_low {
                    lowlink.insert(parent.clone(), v_low);
                }
            }

            if lowlink[&v] == index[&v] {
                let mut files = Vec::new();
                loop {
                    let w = tarjan_stack.pop().expect("tarjan stack underflow");
                    on_stack.insert(w.clone(), false);
                    let is_root = w == v;
                    files.push(w);
                    if is_root {
                        break;
                    }
                }
                result.push(Component { files });
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fp(s: &str) -> FilePath {
        FilePath(PathBuf::from(s))
    }

    fn find_component<'a>(dag: &'a ComponentDag, file: &FilePath) -> &'a Component {
        dag.components
            .iter()
            .find(|c| c.files.contains(file))
            .unwrap()
    }

    #[test]
    fn linear_chain_has_no_cycles() {
        let mut g = DiGraph::new();
        g.add_edge(fp("a"), fp("b"));
        g.add_edge(fp("b"), fp("c"));
        let dag = compute(&g);
        assert!(dag.components.iter().all(|c| !c.is_cycle()));
        assert_eq!(dag.components.len(), 3);
    }

    #[test]
    fn three_node_cycle_collapses_to_one_component() {
        let mut g = DiGraph::new();
        g.add_edge(fp("a"), fp("b"));
        g.add_edge(fp("b"), fp("c"));
        g.add_edge(fp("c"), fp("a"));
        let dag = compute(&g);
        assert_eq!(dag.components.len(), 1);
        assert_eq!(dag.components[0].len(), 3);
    }

    #[test]
    fn singleton_without_self_loop_is_kept() {
        let mut g = DiGraph::new();
        g.add_node(fp("lonely"));
        let dag = compute(&g);
        assert_eq!(dag.components.len(), 1);
        assert!(!dag.components[0].is_cycle());
    }

    #[test]
    fn dag_is_acyclic_and_reverse_topological() {
        let mut g = DiGraph::new();
        g.add_edge(fp("a"), fp("b"));
        g.add_edge(fp("b"), fp("c"));
        let dag = compute(&g);

        let a_idx = dag
            .components
            .iter()
            .position(|c| c.files.contains(&fp("a")))
            .unwrap();
        let b_idx = dag
            .components
            .iter()
            .position(|c| c.files.contains(&fp("b")))
            .unwrap();
        let c_idx = dag
            .components
            .iter()
            .position(|c| c.files.contains(&fp("c")))
            .unwrap();

        // a depends on b, b depends on c: c must be emitted before b
        // before a in reverse-topological order (leaves first).
        assert!(c_idx < b_idx);
        assert!(b_idx < a_idx);

        // No cycles among component indices.
        for (from, targets) in dag.edges.iter().enumerate() {
            assert!(!targets.contains(&from));
        }
    }

    #[test]
    fn component_dag_edge_points_from_dependent_to_dependency() {
        let mut g = DiGraph::new();
        g.add_edge(fp("a"), fp("b"));
        let dag = compute(&g);
        let a_idx = dag
            .components
            .iter()
            .position(|c| c.files.contains(&fp("a")))
            .unwrap();
        let b_idx = dag
            .components
            .iter()
            .position(|c| c.files.contains(&fp("b")))
            .unwrap();
        assert_eq!(dag.edges[a_idx], vec![b_idx]);
        assert!(dag.edges[b_idx].is_empty());
    }

    #[test]
    fn large_fan_in_does_not_duplicate_component_edges() {
        let mut g = DiGraph::new();
        for i in 0..20 {
            g.add_edge(fp(&format!("leaf{i}")), fp("hub"));
        }
        let dag = compute(&g);
        let hub = find_component(&dag, &fp("hub"));
        assert_eq!(hub.len(), 1);
        for i in 0..20 {
            let leaf_idx = dag
                .components
                .iter()
                .position(|c| c.files.contains(&fp(&format!("leaf{i}"))))
                .unwrap();
            assert_eq!(dag.edges[leaf_idx].len(), 1);
        }
    }

    #[test]
    fn diamond_dependency_has_no_cycle() {
        let mut g = DiGraph::new();
        g.add_edge(fp("a"), fp("b"));
        g.add_edge(fp("a"), fp("c"));
        g.add_edge(fp("b"), fp("d"));
        g.add_edge(fp("c"), fp("d"));
        let dag = compute(&g);
        assert!(dag.components.iter().all(|c| !c.is_cycle()));
        assert_eq!(dag.components.len(), 4);
    }
}
