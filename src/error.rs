//! The fatal-error taxonomy of spec.md §7. The core never catches and
//! continues on one of these; `Pipeline::run` propagates the first one
//! it hits, and `main` maps it to an exit code.

use crate::model::ClassId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("input invariant violated: inner-class identifier `{0}` encountered where none is expected")]
    InputInvariant(ClassId),

    #[error(
        "resolver coverage below threshold: resolved {resolved}/{total} include-matched classes, \
         {ratio:.1}% unresolved (threshold {threshold:.1}%); verify the include pattern and content roots"
    )]
    ResolveCoverageBelowThreshold {
        resolved: usize,
        total: usize,
        ratio: f64,
        threshold: f64,
    },

    #[error("resolve conflict for `{class}`: `{first_label}` vs `{second_label}`")]
    ResolveConflict {
        class: ClassId,
        first_label: String,
        second_label: String,
    },

    #[error("user mapping error in {path}:{line}: {reason}")]
    UserMapping {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("rule kind prefix mismatch: {0:?}")]
    RuleKindPrefixMismatch(Vec<String>),

    #[error("rule kind merge ambiguous: {0:?}")]
    RuleKindMergeAmbiguous(Vec<String>),

    #[error("component has no rule-kind hint from any of its files")]
    MissingRuleKindHint,

    #[error("external resolver `{command}` failed: {reason}")]
    ExternalResolver { command: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to deserialize parser output: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl PipelineError {
    /// Exit code per spec.md §6: 1 for configuration errors, 2 for
    /// every other core failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => 1,
            _ => 2,
        }
    }
}
