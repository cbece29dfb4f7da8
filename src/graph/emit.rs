//! CommandEmitter (spec.md §4.8): walks the component DAG in
//! reverse-topological order, emitting creation commands for each
//! node followed by a single sorted `add deps` command when the node
//! has successors.

use crate::error::PipelineError;
use crate::graph::build_rule::BuildRule;
use crate::graph::scc::ComponentDag;

/// Where the emitted command stream goes once it leaves the core.
/// spec.md §6 draws this distinction (dry-run prints, otherwise the
/// stream is handed to a downstream edit tool) but leaves the tool
/// itself out of scope; this seam is the one-line extension point for
/// wiring such a tool in without touching `Pipeline`.
pub trait CommandSink {
    fn send(&mut self, lines: &[String]) -> Result<(), PipelineError>;
}

/// Writes the stream to stdout, one command per line.
pub struct StdoutSink;

impl CommandSink for StdoutSink {
    fn send(&mut self, lines: &[String]) -> Result<(), PipelineError> {
        for line in lines {
            println!("{line}");
        }
        Ok(())
    }
}

/// `rules[i]` must be the `BuildRule` built for `dag.components[i]`, and
/// `external_deps[i]` the labels of any externally-resolved classes a
/// file in `dag.components[i]` depends on (spec.md §4.8: these never
/// become DAG nodes, but still belong in the sorted `add deps` list
/// alongside internal successor labels).
pub fn emit(dag: &ComponentDag, rules: &[BuildRule], external_deps: &[Vec<String>]) -> Vec<String> {
    assert_eq!(dag.components.len(), rules.len());
    assert_eq!(dag.components.len(), external_deps.len());

    let mut stream = Vec::new();

    for idx in dag.emission_order() {
        let rule = &rules[idx];
        stream.extend(rule.creation_commands());

        if matches!(rule, BuildRule::Project { .. }) {
            let successors = &dag.edges[idx];
            if !successors.is_empty() || !external_deps[idx].is_empty() {
                let mut labels: Vec<String> = successors.iter().map(|&s| rules[s].label()).collect();
                labels.extend(external_deps[idx].iter().cloned());
                labels.sort();
                labels.dedup();
                if !labels.is_empty() {
                    stream.push(format!("add deps {}|{}", labels.join(" "), rule.label()));
                }
            }
        }
    }

    stream
}
