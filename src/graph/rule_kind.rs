//! RuleKindMerger (spec.md §4.6): derives a single rule kind for a
//! component from the multiset of per-file rule-kind hints, and
//! collects the deduplicated union of their extra commands.

use std::collections::HashSet;

use crate::error::PipelineError;
use crate::model::RuleKindHint;

/// `merge(hints) -> (kind, extra_commands)`.
pub fn merge(hints: &[RuleKindHint]) -> Result<(String, Vec<String>), PipelineError> {
    if hints.is_empty() {
        return Err(PipelineError::MissingRuleKindHint);
    }

    let mut kinds: Vec<&str> = hints.iter().map(|h| h.kind.as_str()).collect();
    kinds.sort_unstable();
    kinds.dedup();

    let kind = if kinds.len() == 1 {
        kinds[0].to_string()
    } else {
        elect_kind(&kinds)?
    };

    let mut seen = HashSet::new();
    let mut extra_commands = Vec::new();
    for hint in hints {
        for cmd in &hint.extra_commands {
            if seen.insert(cmd.clone()) {
                extra_commands.push(cmd.clone());
            }
        }
    }

    Ok((kind, extra_commands))
}

fn elect_kind(kinds: &[&str]) -> Result<String, PipelineError> {
    let mut prefix: Option<&str> = None;
    let mut suffixes: HashSet<&str> = HashSet::new();

    for kind in kinds {
        let Some((p, s)) = kind.split_once('_') else {
            return Err(PipelineError::RuleKindPrefixMismatch(
                kinds.iter().map(|k| k.to_string()).collect(),
            ));
        };
        match prefix {
            None => prefix = Some(p),
            Some(existing) if existing == p => {}
            Some(_) => {
                return Err(PipelineError::RuleKindPrefixMismatch(
                    kinds.iter().map(|k| k.to_string()).collect(),
                ))
            }
        }
        suffixes.insert(s);
    }

    let prefix = prefix.expect("kinds is non-empty");

    let suffix = if suffixes == ["library", "test"].into_iter().collect() {
        "test"
    } else if suffixes == ["library", "binary"].into_iter().collect() {
        "binary"
    } else if suffixes.contains("image")
        && suffixes.is_subset(&["library", "binary", "image"].into_iter().collect())
    {
        "image"
    } else {
        return Err(PipelineError::RuleKindMergeAmbiguous(
            kinds.iter().map(|k| k.to_string()).collect(),
        ));
    };

    Ok(format!("{prefix}_{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilePath;
    use std::path::PathBuf;

    fn hint(kind: &str) -> RuleKindHint {
        RuleKindHint {
            path: FilePath(PathBuf::from("f")),
            kind: kind.to_string(),
            extra_commands: vec![],
        }
    }

    #[test]
    fn single_kind_passes_through() {
        let (kind, _) = merge(&[hint("java_library")]).unwrap();
        assert_eq!(kind, "java_library");
    }

    #[test]
    fn library_and_test_merge_to_test() {
        let (kind, _) = merge(&[hint("java_library"), hint("java_test")]).unwrap();
        assert_eq!(kind, "java_test");
    }

    #[test]
    fn library_and_binary_merge_to_binary() {
        let (kind, _) = merge(&[hint("java_library"), hint("java_binary")]).unwrap();
        assert_eq!(kind, "java_binary");
    }

    #[test]
    fn image_with_library_and_binary_merges_to_image() {
        let (kind, _) = merge(&[hint("java_library"), hint("java_binary"), hint("java_image")])
            .unwrap();
        assert_eq!(kind, "java_image");
    }

    #[test]
    fn mismatched_prefixes_fail() {
        let err = merge(&[hint("java_library"), hint("py_library")]).unwrap_err();
        assert!(matches!(err, PipelineError::RuleKindPrefixMismatch(_)));
    }

    #[test]
    fn ambiguous_suffix_combination_fails() {
        let err = merge(&[hint("java_test"), hint("java_binary")]).unwrap_err();
        assert!(matches!(err, PipelineError::RuleKindMergeAmbiguous(_)));
    }

    #[test]
    fn extra_commands_are_deduplicated_in_first_seen_order() {
        let mut h1 = hint("java_library");
        h1.extra_commands = vec!["set visibility public".to_string()];
        let mut h2 = hint("java_library");
        h2.extra_commands = vec![
            "set visibility public".to_string(),
            "add tag foo".to_string(),
        ];
        let (_, extras) = merge(&[h1, h2]).unwrap();
        assert_eq!(
            extras,
            vec!["set visibility public".to_string(), "add tag foo".to_string()]
        );
    }

    #[test]
    fn kind_without_underscore_is_prefix_mismatch() {
        let err = merge(&[hint("library"), hint("java_test")]).unwrap_err();
        assert!(matches!(err, PipelineError::RuleKindPrefixMismatch(_)));
    }

    #[test]
    fn empty_hints_is_a_missing_rule_kind_hint_error() {
        let err = merge(&[]).unwrap_err();
        assert!(matches!(err, PipelineError::MissingRuleKindHint));
    }
}
