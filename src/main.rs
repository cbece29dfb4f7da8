use std::io::Read as _;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use buildgraph::cli::{Cli, Commands, OutputFormat};
use buildgraph::config::PipelineConfig;
use buildgraph::error::PipelineError;
use buildgraph::graph::emit::{CommandSink, StdoutSink};
use buildgraph::model::ParserOutput;
use buildgraph::pipeline;
use buildgraph::resolver::external::ExternalResolver;
use buildgraph::resolver::source_file::SourceFileResolver;
use buildgraph::resolver::user_mapping::UserMappingResolver;
use buildgraph::resolver::ClassResolver;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("error: {err:#}");
            let exit = err
                .downcast_ref::<PipelineError>()
                .map(PipelineError::exit_code)
                .unwrap_or(2);
            std::process::exit(exit);
        }
    }
}

fn init_logging(verbose: u8) {
    let default_directive = match verbose {
        0 => "buildgraph=info",
        1 => "buildgraph=debug",
        _ => "buildgraph=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let Commands::Generate {
        input,
        config: config_path,
        include_pattern,
        exclude_pattern,
        content_root,
        source_extension,
        user_mapping_path,
        external_resolver,
        workspace_root,
        dry_run,
        resolve_threshold,
        format,
    } = cli.command;

    let mut pipeline_config = PipelineConfig::default();
    if let Some(path) = &config_path {
        pipeline_config
            .merge_toml_file(path)
            .with_context(|| format!("loading config file {}", path.display()))?;
    }
    if let Some(pattern) = include_pattern {
        pipeline_config.include_pattern = pattern;
    }
    if let Some(pattern) = exclude_pattern {
        pipeline_config.exclude_pattern = pattern;
    }
    if !content_root.is_empty() {
        pipeline_config.content_roots = content_root;
    }
    if !source_extension.is_empty() {
        pipeline_config.source_extensions = source_extension;
    }
    if user_mapping_path.is_some() {
        pipeline_config.user_mapping_path = user_mapping_path;
    }
    if !external_resolver.is_empty() {
        pipeline_config.external_resolvers = external_resolver;
    }
    if let Some(root) = workspace_root {
        pipeline_config.workspace_root = root;
    }
    if let Some(threshold) = resolve_threshold {
        pipeline_config.resolve_threshold = threshold;
    }
    pipeline_config.dry_run = dry_run || pipeline_config.dry_run;
    let workspace_root = pipeline_config.workspace_root.clone();
    pipeline_config.content_roots = pipeline_config
        .content_roots
        .iter()
        .map(|root| {
            if root.is_relative() {
                workspace_root.join(root)
            } else {
                root.clone()
            }
        })
        .collect();

    let parser_output = load_parser_output(input.as_deref())?;
    let resolvers = build_resolver_chain(&pipeline_config).context("building resolver chain")?;

    let stream = pipeline::run(parser_output, &pipeline_config, &resolvers)
        .context("running pipeline")?;

    emit(&stream, format, pipeline_config.dry_run).context("writing command stream")?;
    Ok(())
}

/// Read a `ParserOutput` document from a file, or stdin when no path is given.
fn load_parser_output(input: Option<&std::path::Path>) -> Result<ParserOutput> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading parser output from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading parser output from stdin")?;
            buf
        }
    };
    serde_json::from_str(&text)
        .map_err(PipelineError::from)
        .context("parsing parser output as JSON")
}

/// Resolvers run in priority order: an explicit user mapping first, then
/// configured external resolvers (in the order given), then the
/// filesystem-probing resolver as the final fallback over content roots.
fn build_resolver_chain(config: &PipelineConfig) -> Result<Vec<Box<dyn ClassResolver>>, PipelineError> {
    let mut resolvers: Vec<Box<dyn ClassResolver>> = Vec::new();

    if let Some(path) = &config.user_mapping_path {
        resolvers.push(Box::new(UserMappingResolver::from_file(path)?));
    }
    for command in &config.external_resolvers {
        resolvers.push(Box::new(ExternalResolver::new(command.clone())));
    }
    if !config.content_roots.is_empty() {
        resolvers.push(Box::new(SourceFileResolver::new(
            config.content_roots.clone(),
            config.source_extensions.clone(),
            config.resolve_threshold,
        )));
    }

    Ok(resolvers)
}

/// Per spec.md §6: a dry run prints the stream verbatim; otherwise it
/// is handed to a downstream edit tool, which this crate does not
/// implement (see `CommandSink`). Lacking one configured, the stream
/// still reaches stdout so the run is never silently swallowed.
fn emit(stream: &[String], format: OutputFormat, dry_run: bool) -> Result<(), PipelineError> {
    if !dry_run {
        tracing::warn!("no downstream edit tool configured; printing the command stream instead");
    }
    match format {
        OutputFormat::Lines => StdoutSink.send(stream),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(stream).unwrap_or_default());
            Ok(())
        }
    }
}
