//! ClassToSourceMapper (spec.md §4.3): translates the preprocessed
//! class graph into a file graph via a class→file map, dropping
//! intra-file edges.

use std::collections::HashMap;

use crate::error::PipelineError;
use crate::graph::digraph::DiGraph;
use crate::model::{ClassId, FilePath};

/// `map(cg, cf) -> FileGraph`.
///
/// Fails with `InputInvariant` if any node in `cg` is still an inner
/// class id (the caller is expected to have run `preprocess` first).
/// Nodes with no entry in `cf` are silently excluded — they are
/// handled at the class-to-rule layer as externally-resolved classes.
pub fn map(
    cg: &DiGraph<ClassId>,
    cf: &HashMap<ClassId, FilePath>,
) -> Result<DiGraph<FilePath>, PipelineError> {
    for node in cg.nodes() {
        if node.is_inner_class() {
            return Err(PipelineError::InputInvariant(node.clone()));
        }
    }

    let mut files = DiGraph::new();
    // `cf` is a plain `HashMap`; its key iteration order is randomized
    // per process, so node insertion order is canonicalized here
    // rather than left to chance (spec.md §5: neighbor/node iteration
    // must be reproducible across runs, not just within one process).
    let mut classes: Vec<&ClassId> = cf.keys().collect();
    classes.sort();
    for class in classes {
        debug_assert!(!class.is_inner_class());
        files.add_node(cf[class].clone());
    }

    for (from, to) in cg.edges() {
        let (Some(from_file), Some(to_file)) = (cf.get(from), cf.get(to)) else {
            continue;
        };
        if from_file == to_file {
            continue;
        }
        files.add_edge(from_file.clone(), to_file.clone());
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fp(s: &str) -> FilePath {
        FilePath(PathBuf::from(s))
    }

    #[test]
    fn drops_intra_file_edges() {
        let mut cg = DiGraph::new();
        cg.add_edge(ClassId::from("a.A"), ClassId::from("a.B"));
        let mut cf = HashMap::new();
        cf.insert(ClassId::from("a.A"), fp("a.java"));
        cf.insert(ClassId::from("a.B"), fp("a.java"));

        let fg = map(&cg, &cf).unwrap();
        assert!(fg.neighbors(&fp("a.java")).is_empty());
    }

    #[test]
    fn maps_cross_file_edges() {
        let mut cg = DiGraph::new();
        cg.add_edge(ClassId::from("a.A"), ClassId::from("b.B"));
        let mut cf = HashMap::new();
        cf.insert(ClassId::from("a.A"), fp("a.java"));
        cf.insert(ClassId::from("b.B"), fp("b.java"));

        let fg = map(&cg, &cf).unwrap();
        assert_eq!(fg.neighbors(&fp("a.java")).to_vec(), vec![fp("b.java")]);
    }

    #[test]
    fn excludes_classes_with_no_file_mapping() {
        let mut cg = DiGraph::new();
        cg.add_edge(ClassId::from("a.A"), ClassId::from("external.B"));
        let mut cf = HashMap::new();
        cf.insert(ClassId::from("a.A"), fp("a.java"));

        let fg = map(&cg, &cf).unwrap();
        assert!(fg.neighbors(&fp("a.java")).is_empty());
        assert_eq!(fg.node_count(), 1);
    }

    #[test]
    fn fails_on_inner_class_id() {
        let mut cg = DiGraph::new();
        cg.add_edge(ClassId::from("a.Outer$Inner"), ClassId::from("b.B"));
        let cf = HashMap::new();
        let err = map(&cg, &cf).unwrap_err();
        assert!(matches!(err, PipelineError::InputInvariant(_)));
    }
}
