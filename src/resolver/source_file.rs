//! SourceFileResolver (spec.md §4.2): turns `a.b.C` into candidate
//! paths under ordered content roots and returns the first hit.
//! Enforces the configurable unresolved-classes threshold.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::model::{ClassId, FilePath};
use crate::resolver::{ClassResolver, Resolution};

pub struct SourceFileResolver {
    content_roots: Vec<PathBuf>,
    source_extensions: Vec<String>,
    /// Fraction of the classes handed to this resolver (not the whole
    /// run) that must resolve, or it fails fast.
    threshold: f64,
    /// Overridable only for tests: normally reads the real filesystem.
    exists: Box<dyn Fn(&Path) -> bool + Send + Sync>,
}

impl SourceFileResolver {
    pub fn new(content_roots: Vec<PathBuf>, source_extensions: Vec<String>, threshold: f64) -> Self {
        Self {
            content_roots,
            source_extensions,
            threshold,
            exists: Box::new(|p| p.exists()),
        }
    }

    #[cfg(test)]
    fn with_exists(mut self, exists: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.exists = Box::new(exists);
        self
    }

    fn candidate_paths(&self, class: &ClassId) -> Vec<PathBuf> {
        let relative = class.as_str().replace('.', "/");
        let mut candidates = Vec::new();
        for root in &self.content_roots {
            for ext in &self.source_extensions {
                candidates.push(root.join(format!("{relative}.{ext}")));
            }
        }
        candidates
    }
}

impl ClassResolver for SourceFileResolver {
    fn resolve(&self, classes: &[ClassId]) -> Result<HashMap<ClassId, Resolution>, PipelineError> {
        let mut resolved = HashMap::new();

        for class in classes {
            if class.is_inner_class() {
                return Err(PipelineError::InputInvariant(class.clone()));
            }
            if let Some(path) = self
                .candidate_paths(class)
                .into_iter()
                .find(|p| (self.exists)(p))
            {
                resolved.insert(class.clone(), Resolution::SourceFile(FilePath(path)));
            }
        }

        // spec.md §4.2: fail when more than `threshold` of the
        // include-matched classes fail to resolve, i.e. the
        // *unresolved* fraction exceeds the threshold.
        let total = classes.len();
        let resolved_count = resolved.len();
        let unresolved_ratio = if total == 0 {
            0.0
        } else {
            (total - resolved_count) as f64 / total as f64
        };
        if total > 0 && unresolved_ratio > self.threshold {
            return Err(PipelineError::ResolveCoverageBelowThreshold {
                resolved: resolved_count,
                total,
                ratio: unresolved_ratio * 100.0,
                threshold: self.threshold * 100.0,
            });
        }

        Ok(resolved)
    }

    fn name(&self) -> &'static str {
        "source_file"
    }
}
