//! Pipeline (spec.md §4.9): orchestrates preprocessing, resolution,
//! mapping, SCC computation, package planning, rule building and
//! emission. The state machine transitions forward only; each stage
//! consumes its predecessor's output and moves ownership forward.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::graph::digraph::DiGraph;
use crate::graph::{build_rule, class_to_source, emit, package_layout, preprocess, rule_kind, scc};
use crate::model::{ClassId, FilePath, ParserOutput, RuleKindHint};
use crate::resolver::{resolve_chain, ClassResolver, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Loading,
    Preprocessing,
    Resolving,
    Mapping,
    Scc,
    Planning,
    Building,
    Emitting,
    Done,
}

/// Run the full pipeline over one `ParserOutput`, threading the
/// preprocessed graph and resolver chain through every stage, and
/// returning the final command stream.
pub fn run(
    input: ParserOutput,
    config: &PipelineConfig,
    resolvers: &[Box<dyn ClassResolver>],
) -> Result<Vec<String>, PipelineError> {
    let mut stage = Stage::Loading;
    debug!(?stage, "pipeline starting");

    let (include, exclude) = config.compiled_patterns()?;

    // `class_to_class` is a plain `HashMap`; its key iteration order is
    // randomized per process, so seed the graph from a sorted key list
    // rather than iterating the map directly (spec.md §5/§8/§9: node
    // insertion order must be reproducible across separate process
    // invocations on byte-identical input, not just within one).
    let mut class_graph: DiGraph<ClassId> = DiGraph::new();
    let mut froms: Vec<&ClassId> = input.class_to_class.keys().collect();
    froms.sort();
    for from in froms {
        class_graph.add_node(from.clone());
        for to in &input.class_to_class[from] {
            class_graph.add_edge(from.clone(), to.clone());
        }
    }

    stage = Stage::Preprocessing;
    debug!(?stage, nodes = class_graph.node_count(), "preprocessing class graph");
    let preprocessed = preprocess::preprocess(&class_graph, &include, &exclude);

    stage = Stage::Resolving;
    debug!(?stage, "resolving classes to build rules");
    let mut class_to_file: HashMap<ClassId, FilePath> = input.class_to_file.clone();
    let mut class_to_external_label: HashMap<ClassId, String> = HashMap::new();

    // Open Question (spec.md §9): the parser-supplied class_to_file map
    // is consulted first, as a zero-cost resolver; only classes it has
    // no entry for fall through to the configured resolver chain.
    let still_unresolved: Vec<ClassId> = preprocessed
        .nodes()
        .iter()
        .filter(|c| !class_to_file.contains_key(c))
        .cloned()
        .collect();

    let resolved = resolve_chain(resolvers, &still_unresolved)?;
    for (class, resolution) in resolved {
        match resolution {
            Resolution::SourceFile(path) => {
                class_to_file.insert(class, path);
            }
            Resolution::ExternalLabel(label) => {
                class_to_external_label.insert(class, label);
            }
        }
    }

    let truly_unresolved: Vec<&ClassId> = preprocessed
        .nodes()
        .iter()
        .filter(|c| !class_to_file.contains_key(c) && !class_to_external_label.contains_key(c))
        .collect();
    if !truly_unresolved.is_empty() {
        warn!(
            count = truly_unresolved.len(),
            "unresolved dependency classes treated as external"
        );
    }

    stage = Stage::Mapping;
    debug!(?stage, "mapping class graph to source-file graph");
    let file_graph = class_to_source::map(&preprocessed, &class_to_file)?;

    // Classes resolved to an external BUILD label never become file-graph
    // nodes; their edges are preserved here so the dependent's file still
    // picks up the label in its `add deps` line (spec.md §3/§4.7/§4.8:
    // `BuildRule::External` rules emit nothing themselves, but still
    // participate as dependencies of `Project` rules).
    let mut external_deps_by_file: HashMap<FilePath, BTreeSet<String>> = HashMap::new();
    for (from, to) in preprocessed.edges() {
        if let Some(label) = class_to_external_label.get(to) {
            if let Some(file) = class_to_file.get(from) {
                external_deps_by_file
                    .entry(file.clone())
                    .or_default()
                    .insert(label.clone());
            }
        }
    }

    stage = Stage::Scc;
    debug!(?stage, "computing strongly connected components");
    let dag = scc::compute(&file_graph);

    stage = Stage::Planning;
    debug!(?stage, components = dag.components.len(), "planning package layout");
    let package_plan = package_layout::plan(&dag.components);

    stage = Stage::Building;
    debug!(?stage, "building rules");
    let mut rules = Vec::with_capacity(dag.components.len());
    let mut external_deps: Vec<Vec<String>> = Vec::with_capacity(dag.components.len());
    for component in &dag.components {
        let package = resolve_package_for_component(component, &package_plan);
        let hints = collect_hints(component, &input.file_to_rule_hint);
        let (kind, extra_commands) = rule_kind::merge(&hints)?;
        rules.push(build_rule::build_project_rule(
            component,
            &package,
            kind,
            extra_commands,
        ));

        let mut labels: Vec<String> = component
            .files
            .iter()
            .filter_map(|f| external_deps_by_file.get(f))
            .flat_map(|set| set.iter().cloned())
            .collect();
        labels.sort();
        labels.dedup();
        external_deps.push(labels);
    }

    stage = Stage::Emitting;
    debug!(?stage, "emitting command stream");
    let stream = emit::emit(&dag, &rules, &external_deps);

    stage = Stage::Done;
    debug!(?stage, lines = stream.len(), "pipeline finished");

    Ok(stream)
}

fn resolve_package_for_component(
    component: &scc::Component,
    plan: &HashMap<std::path::PathBuf, std::path::PathBuf>,
) -> std::path::PathBuf {
    let dir = component.files[0]
        .as_path()
        .parent()
        .unwrap_or_else(|| Path::new(""));
    plan.get(dir).cloned().unwrap_or_else(|| dir.to_path_buf())
}

fn collect_hints(
    component: &scc::Component,
    hints_by_path: &HashMap<FilePath, crate::model::RuleHintPayload>,
) -> Vec<RuleKindHint> {
    component
        .files
        .iter()
        .filter_map(|file| {
            hints_by_path.get(file).map(|payload| RuleKindHint {
                path: file.clone(),
                kind: payload.kind.clone(),
                extra_commands: payload.extra_commands.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fp(s: &str) -> FilePath {
        FilePath(PathBuf::from(s))
    }

    fn hint(kind: &str) -> crate::model::RuleHintPayload {
        crate::model::RuleHintPayload {
            kind: kind.to_string(),
            extra_commands: vec![],
        }
    }

    #[test]
    fn linear_chain_end_to_end_matches_spec_example() {
        let mut input = ParserOutput::default();
        input.class_to_class.insert(
            ClassId::from("com.A"),
            vec![ClassId::from("com.B")],
        );
        input.class_to_class.insert(
            ClassId::from("com.B"),
            vec![ClassId::from("com.C")],
        );
        input.class_to_class.insert(ClassId::from("com.C"), vec![]);
        input.class_to_file.insert(ClassId::from("com.A"), fp("java/com/A.java"));
        input.class_to_file.insert(ClassId::from("com.B"), fp("java/com/B.java"));
        input.class_to_file.insert(ClassId::from("com.C"), fp("java/com/C.java"));
        input.file_to_rule_hint.insert(fp("java/com/A.java"), hint("java_library"));
        input.file_to_rule_hint.insert(fp("java/com/B.java"), hint("java_library"));
        input.file_to_rule_hint.insert(fp("java/com/C.java"), hint("java_library"));

        let config = PipelineConfig::default();
        let resolvers: Vec<Box<dyn ClassResolver>> = vec![];
        let stream = run(input, &config, &resolvers).unwrap();

        assert_eq!(
            stream,
            vec![
                "new java_library C|//java/com:__pkg__",
                "add srcs C.java|//java/com:C",
                "new java_library B|//java/com:__pkg__",
                "add srcs B.java|//java/com:B",
                "add deps //java/com:C|//java/com:B",
                "new java_library A|//java/com:__pkg__",
                "add srcs A.java|//java/com:A",
                "add deps //java/com:B|//java/com:A",
            ]
        );
    }

    #[test]
    fn cycle_collapses_to_single_rule() {
        let mut input = ParserOutput::default();
        input.class_to_class.insert(ClassId::from("com.A"), vec![ClassId::from("com.B")]);
        input.class_to_class.insert(ClassId::from("com.B"), vec![ClassId::from("com.C")]);
        input.class_to_class.insert(ClassId::from("com.C"), vec![ClassId::from("com.A")]);
        input.class_to_file.insert(ClassId::from("com.A"), fp("java/com/A.java"));
        input.class_to_file.insert(ClassId::from("com.B"), fp("java/com/B.java"));
        input.class_to_file.insert(ClassId::from("com.C"), fp("java/com/C.java"));
        for f in ["A", "B", "C"] {
            input
                .file_to_rule_hint
                .insert(fp(&format!("java/com/{f}.java")), hint("java_library"));
        }

        let config = PipelineConfig::default();
        let resolvers: Vec<Box<dyn ClassResolver>> = vec![];
        let stream = run(input, &config, &resolvers).unwrap();

        assert_eq!(stream.len(), 2);
        assert!(stream[1].starts_with("add srcs A.java B.java C.java|"));
        assert!(stream.iter().all(|l| !l.starts_with("add deps")));
    }

    #[test]
    fn rule_kind_conflict_is_fatal() {
        let mut input = ParserOutput::default();
        input.class_to_class.insert(ClassId::from("com.A"), vec![]);
        input.class_to_file.insert(ClassId::from("com.A"), fp("java/com/A.java"));
        input.file_to_rule_hint.insert(fp("java/com/A.java"), hint("java_library"));
        input.file_to_rule_hint.insert(fp("java/com/A2.java"), hint("py_library"));
        // Force A and A2 into the same component by also mapping a
        // second class to the same file set via a cycle that merges
        // them -- simplest way here is to put both files in one SCC.
        input.class_to_class.insert(ClassId::from("com.A2"), vec![ClassId::from("com.A")]);
        input.class_to_class.get_mut(&ClassId::from("com.A")).unwrap().push(ClassId::from("com.A2"));
        input.class_to_file.insert(ClassId::from("com.A2"), fp("java/com/A2.java"));

        let config = PipelineConfig::default();
        let resolvers: Vec<Box<dyn ClassResolver>> = vec![];
        let err = run(input, &config, &resolvers).unwrap_err();
        assert!(matches!(err, PipelineError::RuleKindPrefixMismatch(_)));
    }

    struct FixedExternal(HashMap<ClassId, Resolution>);

    impl ClassResolver for FixedExternal {
        fn resolve(&self, classes: &[ClassId]) -> Result<HashMap<ClassId, Resolution>, PipelineError> {
            Ok(classes
                .iter()
                .filter_map(|c| self.0.get(c).map(|r| (c.clone(), r.clone())))
                .collect())
        }

        fn name(&self) -> &'static str {
            "fixed_external"
        }
    }

    #[test]
    fn externally_resolved_dependency_is_wired_as_external_build_rule() {
        let mut input = ParserOutput::default();
        input.class_to_class.insert(
            ClassId::from("com.A"),
            vec![ClassId::from("com.external.Guava")],
        );
        input.class_to_file.insert(ClassId::from("com.A"), fp("java/com/A.java"));
        input.file_to_rule_hint.insert(fp("java/com/A.java"), hint("java_library"));

        let mut external_map = HashMap::new();
        external_map.insert(
            ClassId::from("com.external.Guava"),
            Resolution::ExternalLabel("//third_party:guava".to_string()),
        );
        let resolvers: Vec<Box<dyn ClassResolver>> = vec![Box::new(FixedExternal(external_map))];

        let config = PipelineConfig::default();
        let stream = run(input, &config, &resolvers).unwrap();

        assert_eq!(
            stream,
            vec![
                "new java_library A|//java/com:__pkg__",
                "add srcs A.java|//java/com:A",
                "add deps //third_party:guava|//java/com:A",
            ]
        );
    }

    #[test]
    fn idempotent_across_runs() {
        let mut input = ParserOutput::default();
        input.class_to_class.insert(ClassId::from("com.A"), vec![ClassId::from("com.B")]);
        input.class_to_class.insert(ClassId::from("com.B"), vec![]);
        input.class_to_file.insert(ClassId::from("com.A"), fp("java/com/A.java"));
        input.class_to_file.insert(ClassId::from("com.B"), fp("java/com/B.java"));
        input.file_to_rule_hint.insert(fp("java/com/A.java"), hint("java_library"));
        input.file_to_rule_hint.insert(fp("java/com/B.java"), hint("java_library"));

        let config = PipelineConfig::default();
        let resolvers: Vec<Box<dyn ClassResolver>> = vec![];
        let stream1 = run(input.clone(), &config, &resolvers).unwrap();
        let stream2 = run(input, &config, &resolvers).unwrap();
        assert_eq!(stream1, stream2);
    }
}
