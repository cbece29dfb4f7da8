//! Command-line surface: a single `generate` subcommand plus the flags
//! enumerated in spec.md §6, shaped after the donor crate's derive-based
//! `Cli`/`Commands` split (`cli/mod.rs`).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "buildgraph",
    version,
    about = "Generates granular BUILD rule definitions from a class dependency graph"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv); overridden by RUST_LOG if set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a parser-output JSON document and emit a BUILD-rule command stream.
    Generate {
        /// Path to the parser-output JSON document (spec.md §6). Reads stdin if omitted.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Path to a `buildgraph.toml` config file, merged under CLI flags.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Regex: a class must match this to be considered (default `.*`).
        #[arg(long)]
        include_pattern: Option<String>,

        /// Regex: a class matching this is dropped even if it matches `--include-pattern`.
        #[arg(long)]
        exclude_pattern: Option<String>,

        /// Source root searched, in order, by the source-file resolver. Repeatable.
        #[arg(long = "content-root")]
        content_root: Vec<PathBuf>,

        /// Source file extension tried by the source-file resolver under
        /// each content root. Repeatable; defaults to `java`.
        #[arg(long = "source-extension")]
        source_extension: Vec<String>,

        /// Path to a `classid,label` user-mapping file, consulted before the source-file resolver.
        #[arg(long)]
        user_mapping_path: Option<PathBuf>,

        /// Shell command run as an external resolver. Repeatable; tried in order given.
        #[arg(long = "external-resolver")]
        external_resolver: Vec<String>,

        /// Workspace root used to compute package-relative labels.
        #[arg(long)]
        workspace_root: Option<PathBuf>,

        /// Print the command stream to stdout instead of handing it to a downstream edit tool.
        #[arg(long)]
        dry_run: bool,

        /// Fraction of include-matched classes that may fail to resolve before the run fails (0.0-1.0).
        #[arg(long)]
        resolve_threshold: Option<f64>,

        /// Output format for the emitted command stream.
        #[arg(long, value_enum, default_value = "lines")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One command per line (spec.md §4.8 wire format).
    Lines,
    /// A JSON array of command strings.
    Json,
}
