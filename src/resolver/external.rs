//! ExternalResolver (spec.md §4.2, §5): spawns a child process, writes
//! each unresolved class name on its own line to stdin, reads
//! `(class, label)` line pairs from stdout until EOF, then waits for
//! exit. Non-zero exit is fatal. Handles are released on every exit
//! path, including failures (spec.md §5 resource discipline).
//!
//! The labels a child reports are pre-existing BUILD labels, not
//! source paths, so every resolved class comes back as
//! `Resolution::ExternalLabel`.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

use crate::error::PipelineError;
use crate::model::ClassId;
use crate::resolver::{ClassResolver, Resolution};

pub struct ExternalResolver {
    command: String,
}

impl ExternalResolver {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl ClassResolver for ExternalResolver {
    fn resolve(&self, classes: &[ClassId]) -> Result<HashMap<ClassId, Resolution>, PipelineError> {
        if classes.is_empty() {
            return Ok(HashMap::new());
        }

        let mut child = Command::new(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| PipelineError::ExternalResolver {
                command: self.command.clone(),
                reason: format!("failed to spawn: {e}"),
            })?;

        {
            let stdin = child.stdin.as_mut().ok_or_else(|| PipelineError::ExternalResolver {
                command: self.command.clone(),
                reason: "child did not expose a stdin handle".to_string(),
            })?;
            for class in classes {
                writeln!(stdin, "{}", class.as_str()).map_err(|e| PipelineError::ExternalResolver {
                    command: self.command.clone(),
                    reason: format!("failed writing to child stdin: {e}"),
                })?;
            }
        } // stdin handle dropped here, closing the child's input half.

        let mut resolved = HashMap::new();
        {
            let stdout = child.stdout.take().ok_or_else(|| PipelineError::ExternalResolver {
                command: self.command.clone(),
                reason: "child did not expose a stdout handle".to_string(),
            })?;
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let (Some(class_line), Some(label_line)) = (lines.next(), lines.next()) {
                let class_line = class_line.map_err(|e| PipelineError::ExternalResolver {
                    command: self.command.clone(),
                    reason: format!("failed reading child stdout: {e}"),
                })?;
                let label_line = label_line.map_err(|e| PipelineError::ExternalResolver {
                    command: self.command.clone(),
                    reason: format!("failed reading child stdout: {e}"),
                })?;
                resolved.insert(ClassId::from(class_line), Resolution::ExternalLabel(label_line));
            }
        }

        let status = child.wait().map_err(|e| PipelineError::ExternalResolver {
            command: self.command.clone(),
            reason: format!("failed waiting on child: {e}"),
        })?;
        if !status.success() {
            return Err(PipelineError::ExternalResolver {
                command: self.command.clone(),
                reason: format!("child exited with {status}"),
            });
        }

        Ok(resolved)
    }

    fn name(&self) -> &'static str {
        "external"
    }
}
