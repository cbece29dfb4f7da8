//! UserMappingResolver (spec.md §4.2): parses `classid,label` text
//! lines. Grounded on the donor crate's line-oriented baseline parser
//! (`linting/baseline.rs`): read the whole file, split on newlines,
//! tolerate blank lines, reject malformed ones with a located error.
//!
//! The labels named in the mapping file are pre-existing BUILD labels
//! (e.g. `//pkg:a`), not source file paths, so every resolved class
//! comes back as `Resolution::ExternalLabel`.

use std::collections::HashMap;
use std::path::Path;

use crate::error::PipelineError;
use crate::model::ClassId;
use crate::resolver::{ClassResolver, Resolution};

#[derive(Debug)]
pub struct UserMappingResolver {
    mapping: HashMap<ClassId, String>,
}

impl UserMappingResolver {
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text, &path.to_string_lossy())
    }

    pub fn from_str(text: &str, source_name: &str) -> Result<Self, PipelineError> {
        let mut mapping: HashMap<ClassId, String> = HashMap::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some((class_str, label)) = line.split_once(',') else {
                return Err(PipelineError::UserMapping {
                    path: source_name.to_string(),
                    line: line_no + 1,
                    reason: format!("expected `classid,label`, got `{line}`"),
                });
            };
            let class_str = class_str.trim();
            let label = label.trim();

            if class_str.contains('$') {
                return Err(PipelineError::UserMapping {
                    path: source_name.to_string(),
                    line: line_no + 1,
                    reason: format!("class id `{class_str}` must not contain `$`"),
                });
            }

            let class = ClassId::from(class_str);
            if let Some(existing) = mapping.get(&class) {
                if existing != label {
                    return Err(PipelineError::UserMapping {
                        path: source_name.to_string(),
                        line: line_no + 1,
                        reason: format!(
                            "duplicate key `{class_str}` with distinct values `{existing}` and `{label}`"
                        ),
                    });
                }
            }
            mapping.insert(class, label.to_string());
        }

        Ok(Self { mapping })
    }
}

impl ClassResolver for UserMappingResolver {
    fn resolve(&self, classes: &[ClassId]) -> Result<HashMap<ClassId, Resolution>, PipelineError> {
        Ok(classes
            .iter()
            .filter_map(|c| {
                self.mapping
                    .get(c)
                    .map(|l| (c.clone(), Resolution::ExternalLabel(l.clone())))
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "user_mapping"
    }
}
