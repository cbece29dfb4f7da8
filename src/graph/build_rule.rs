//! BuildRuleBuilder (spec.md §4.7): derives a target name, a label, and
//! the creation-command list for each component.

use std::path::{Path, PathBuf};

use crate::graph::scc::Component;
use crate::model::FilePath;

/// Fixed prefix used for the hashed target name of multi-file
/// components (spec.md §4.7: "`<prefix>_<hex64-of-concat(names)>`").
const MULTI_FILE_TARGET_PREFIX: &str = "lib";

#[derive(Debug, Clone)]
pub enum BuildRule {
    /// A rule built from project sources.
    Project {
        files: Vec<FilePath>,
        package: PathBuf,
        target: String,
        kind: String,
        extra_commands: Vec<String>,
    },
    /// A rule resolved to an existing label outside this pipeline's
    /// control (e.g. a third-party dependency); emits no commands.
    External { label: String },
}

impl BuildRule {
    pub fn label(&self) -> String {
        match self {
            BuildRule::Project {
                package, target, ..
            } => format!("//{}:{}", normalize_package(package), target),
            BuildRule::External { label } => label.clone(),
        }
    }

    /// The creation-phase commands for this rule (spec.md §4.7). Empty
    /// for external rules.
    pub fn creation_commands(&self) -> Vec<String> {
        let BuildRule::Project {
            files,
            package,
            target,
            kind,
            extra_commands,
        } = self
        else {
            return Vec::new();
        };

        let label = self.label();
        let pkg = normalize_package(package);
        let mut commands = vec![format!("new {kind} {target}|//{pkg}:__pkg__")];

        let mut rel_paths: Vec<String> = files
            .iter()
            .map(|f| relativize(package, f.as_path()))
            .collect();
        rel_paths.sort();
        commands.push(format!("add srcs {}|{label}", rel_paths.join(" ")));

        for extra in extra_commands {
            commands.push(format!("{extra}|{label}"));
        }

        commands
    }
}

/// Build the `BuildRule::Project` for one component, given its
/// assigned package directory, merged kind, and extra commands.
pub fn build_project_rule(
    component: &Component,
    package: &Path,
    kind: String,
    extra_commands: Vec<String>,
) -> BuildRule {
    let target = target_name(component, package);
    BuildRule::Project {
        files: component.files.clone(),
        package: package.to_path_buf(),
        target,
        kind,
        extra_commands,
    }
}

fn target_name(component: &Component, package: &Path) -> String {
    if component.files.len() == 1 {
        let rel = relativize(package, component.files[0].as_path());
        let without_ext = strip_extension(&rel);
        without_ext.replace(['/', std::path::MAIN_SEPARATOR], "-")
    } else {
        let concat: String = component
            .files
            .iter()
            .map(|f| {
                f.as_path()
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default()
            })
            .collect();
        format!("{MULTI_FILE_TARGET_PREFIX}_{:016x}", fnv1a64(&concat))
    }
}

fn strip_extension(rel: &str) -> String {
    match rel.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
        _ => rel.to_string(),
    }
}

fn relativize(package: &Path, file: &Path) -> String {
    file.strip_prefix(package)
        .unwrap_or(file)
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/")
}

fn normalize_package(package: &Path) -> String {
    package.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/")
}

/// Deterministic, non-cryptographic 64-bit hash (FNV-1a) used only for
/// multi-file target naming, where any wide-adoption 64-bit hash
/// suffices per spec.md's design notes, as long as it is stable across
/// runs and platforms.
fn fnv1a64(input: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
