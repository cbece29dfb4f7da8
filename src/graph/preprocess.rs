//! GraphPreprocessor (spec.md §4.1): trims the class graph against
//! include/exclude patterns, then collapses nested-class identifiers
//! into their enclosing top-level identifier.

use regex::Regex;

use crate::graph::digraph::DiGraph;
use crate::model::ClassId;

/// `preprocess(g, include, exclude) -> ClassGraph`. Two passes, in
/// this order:
///
/// 1. *Trim* — keep a node iff it matches `include` and not `exclude`;
///    edges into dropped nodes are dropped with them.
/// 2. *Collapse* — replace every surviving id with its enclosing
///    top-level id; drop self-loops this introduces; duplicate edges
///    collapse to one.
pub fn preprocess(graph: &DiGraph<ClassId>, include: &Regex, exclude: &Regex) -> DiGraph<ClassId> {
    let trimmed = trim(graph, include, exclude);
    collapse(&trimmed)
}

fn trim(graph: &DiGraph<ClassId>, include: &Regex, exclude: &Regex) -> DiGraph<ClassId> {
    let keep = |id: &ClassId| include.is_match(id.as_str()) && !exclude.is_match(id.as_str());

    let mut out = DiGraph::new();
    for node in graph.nodes() {
        if keep(node) {
            out.add_node(node.clone());
        }
    }
    for (from, to) in graph.edges() {
        if keep(from) && keep(to) {
            out.add_edge(from.clone(), to.clone());
        }
    }
    out
}

fn collapse(graph: &DiGraph<ClassId>) -> DiGraph<ClassId> {
    let mut out = DiGraph::new();
    for node in graph.nodes() {
        out.add_node(node.top_level());
    }
    for (from, to) in graph.edges() {
        out.add_edge(from.top_level(), to.top_level());
    }
    out
}
