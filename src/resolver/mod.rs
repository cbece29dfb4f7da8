//! ClassResolver (spec.md §4.2): a pluggable interface that maps a
//! class identifier to a build-rule label. Shaped after the donor
//! crate's `Resolver` trait in `resolver/mod.rs` — one method, small
//! and `Send + Sync` so resolvers can be held behind `Box<dyn
//! Resolver>` in a priority-ordered chain.

pub mod external;
pub mod source_file;
pub mod user_mapping;

use std::collections::HashMap;

use crate::error::PipelineError;
use crate::model::{ClassId, FilePath};

/// The outcome of resolving one class. `SourceFile` names a genuine
/// project source file: it flows into `class_to_file` and the class
/// proceeds through `ClassToSourceMapper`/`SccEngine`/`BuildRuleBuilder`
/// like any parser-supplied entry. `ExternalLabel` names a BUILD label
/// that already exists outside this pipeline's control (a third-party
/// dependency, say); such a class never becomes a file-graph node —
/// it resolves straight to a `BuildRule::External` and is wired into
/// dependents' `add deps` by label alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    SourceFile(FilePath),
    ExternalLabel(String),
}

impl Resolution {
    fn describe(&self) -> String {
        match self {
            Resolution::SourceFile(path) => path.to_string(),
            Resolution::ExternalLabel(label) => label.clone(),
        }
    }
}

/// Trait for mapping class identifiers to a `Resolution`.
///
/// `resolve` is given the still-unresolved classes and returns a
/// mapping over whatever subset it could resolve; classes with no
/// entry in the returned map are left for the next resolver in the
/// chain.
pub trait ClassResolver {
    fn resolve(&self, classes: &[ClassId]) -> Result<HashMap<ClassId, Resolution>, PipelineError>;

    /// A short name used in diagnostics.
    fn name(&self) -> &'static str;
}

/// Run a priority-ordered chain of resolvers over `unresolved`,
/// merging results into one map and failing with `ResolveConflict` if
/// two resolvers disagree on the same class (spec.md §4.2: "errors if
/// any resolver returns a class already present").
pub fn resolve_chain(
    resolvers: &[Box<dyn ClassResolver>],
    classes: &[ClassId],
) -> Result<HashMap<ClassId, Resolution>, PipelineError> {
    let mut resolved: HashMap<ClassId, Resolution> = HashMap::new();
    let mut remaining: Vec<ClassId> = classes.to_vec();

    for resolver in resolvers {
        if remaining.is_empty() {
            break;
        }
        let results = resolver.resolve(&remaining)?;
        for (class, resolution) in results {
            if let Some(existing) = resolved.get(&class) {
                return Err(PipelineError::ResolveConflict {
                    class,
                    first_label: existing.describe(),
                    second_label: resolution.describe(),
                });
            }
            resolved.insert(class, resolution);
        }
        remaining.retain(|c| !resolved.contains_key(c));
    }

    Ok(resolved)
}
