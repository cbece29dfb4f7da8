//! Core data types shared across the pipeline: class identifiers, the
//! parser-supplied input schema, and the rule-kind hints that flow
//! from individual source files into merged build rules.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A fully qualified dotted class identifier. May contain `$` before
/// preprocessing collapses nested-class ids into their enclosing
/// top-level id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(pub String);

impl ClassId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this id names a nested (inner) class, i.e. contains `$`.
    pub fn is_inner_class(&self) -> bool {
        self.0.contains('$')
    }

    /// The enclosing top-level identifier: everything before the first `$`.
    /// Returns a clone of self when there is no `$`.
    pub fn top_level(&self) -> ClassId {
        match self.0.split_once('$') {
            Some((prefix, _)) => ClassId(prefix.to_string()),
            None => self.clone(),
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClassId {
    fn from(s: &str) -> Self {
        ClassId(s.to_string())
    }
}

impl From<String> for ClassId {
    fn from(s: String) -> Self {
        ClassId(s)
    }
}

/// An absolute, normalized source file path. Used as a stable map key
/// throughout a run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FilePath(pub PathBuf);

impl FilePath {
    pub fn as_path(&self) -> &std::path::Path {
        &self.0
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for FilePath {
    fn from(p: PathBuf) -> Self {
        FilePath(p)
    }
}

/// Per-file rule-kind hint, as supplied by the (out-of-scope) parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleKindHint {
    pub path: FilePath,
    pub kind: String,
    #[serde(default)]
    pub extra_commands: Vec<String>,
}

/// The full deserialized input schema (spec.md §6).
///
/// `class_to_class` is an adjacency list: each key's neighbor `Vec` is
/// iterated in the order the parser supplied it. The map itself is a
/// plain `HashMap` because that's what `serde_json` deserializes into;
/// its *key* iteration order is randomized per process and callers
/// (`pipeline::run`) must sort `class_to_class.keys()` before using
/// them to seed anything order-sensitive, such as `DiGraph` node
/// insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserOutput {
    pub class_to_class: HashMap<ClassId, Vec<ClassId>>,
    pub file_to_rule_hint: HashMap<FilePath, RuleHintPayload>,
    #[serde(default)]
    pub class_to_file: HashMap<ClassId, FilePath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHintPayload {
    pub kind: String,
    #[serde(default)]
    pub extra_commands: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_strips_inner_class_suffix() {
        let id = ClassId::from("com.example.Outer$Inner");
        assert_eq!(id.top_level(), ClassId::from("com.example.Outer"));
        assert!(id.is_inner_class());
    }

    #[test]
    fn top_level_is_identity_for_non_inner_class() {
        let id = ClassId::from("com.example.Outer");
        assert_eq!(id.top_level(), id);
        assert!(!id.is_inner_class());
    }

    #[test]
    fn doubly_nested_collapses_to_outermost() {
        let id = ClassId::from("com.example.Outer$Middle$Inner");
        assert_eq!(id.top_level(), ClassId::from("com.example.Outer"));
    }
}
