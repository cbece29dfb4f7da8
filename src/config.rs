//! Pipeline configuration: the recognized options of spec.md §6,
//! loadable from CLI flags and/or a `buildgraph.toml` file. Mirrors the
//! donor crate's `linting/config.rs` shape: a `serde`-derived struct
//! with defaulted fields, merged under CLI overrides at the boundary.

use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Default unresolved-classes threshold above which `SourceFileResolver`
/// fails the run (spec.md §9 Open Question: exposed as configuration,
/// defaulting to the constant from the source).
pub const DEFAULT_RESOLVE_THRESHOLD: f64 = 0.70;

/// Default exclude pattern: generated identifiers such as those
/// produced by AutoValue code generation.
pub const DEFAULT_EXCLUDE_PATTERN: &str = r"^AutoValue_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub include_pattern: String,
    pub exclude_pattern: String,
    pub content_roots: Vec<PathBuf>,
    pub user_mapping_path: Option<PathBuf>,
    pub external_resolvers: Vec<String>,
    pub workspace_root: PathBuf,
    pub dry_run: bool,
    pub resolve_threshold: f64,
    /// File extensions `SourceFileResolver` tries under each content
    /// root, in order. The class graph's source language is not fixed
    /// by this crate (spec.md §4.2), so this must be configurable
    /// rather than hardcoded.
    pub source_extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            include_pattern: ".*".to_string(),
            exclude_pattern: DEFAULT_EXCLUDE_PATTERN.to_string(),
            content_roots: Vec::new(),
            user_mapping_path: None,
            external_resolvers: Vec::new(),
            workspace_root: PathBuf::from("."),
            dry_run: true,
            resolve_threshold: DEFAULT_RESOLVE_THRESHOLD,
            source_extensions: vec!["java".to_string()],
        }
    }
}

impl PipelineConfig {
    /// Compile and validate the include/exclude patterns, surfacing
    /// unparseable regexes as `PipelineError::Config` (exit code 1).
    pub fn compiled_patterns(&self) -> Result<(Regex, Regex), PipelineError> {
        let include = Regex::new(&self.include_pattern)
            .map_err(|e| PipelineError::Config(format!("invalid include-pattern: {e}")))?;
        let exclude = Regex::new(&self.exclude_pattern)
            .map_err(|e| PipelineError::Config(format!("invalid exclude-pattern: {e}")))?;
        Ok((include, exclude))
    }

    /// Load a config file, merging it under whatever defaults are
    /// already in `self` (so CLI-constructed defaults still apply to
    /// fields the file omits).
    pub fn merge_toml_file(&mut self, path: &std::path::Path) -> Result<(), PipelineError> {
        let text = std::fs::read_to_string(path)?;
        let file_config: PipelineConfig = toml::from_str(&text)
            .map_err(|e| PipelineError::Config(format!("invalid config file {path:?}: {e}")))?;
        *self = file_config;
        Ok(())
    }
}
