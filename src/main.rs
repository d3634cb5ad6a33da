use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::debug;

use incident_digest::cli::Cli;
use incident_digest::config::{load_previous, DigestConfig, OutputFormat};
use incident_digest::config_file::ConfigFile;
use incident_digest::decompression::open_input;
use incident_digest::logging::{init_logging, LogConfig};
use incident_digest::metrics::{sample_metrics, MetricsSample};
use incident_digest::platform::{ExitCode, SafeStderr, SafeStdout};
use incident_digest::report::{render_brief, render_prompt};
use incident_digest::{digest, DigestError, Outcome, ScanStats, Summary};

fn main() {
    let cli = Cli::parse();
    let mut stderr = SafeStderr::new();

    init_logging(&LogConfig {
        level: cli.log_level,
        format: cli.log_format,
    });

    match run(&cli, &mut stderr) {
        Ok(code) => code.exit(),
        Err(e) => {
            stderr.writeln(&format!("incident-digest: Error: {:#}", e));
            exit_code_for(&e).exit();
        }
    }
}

/// Bad settings are usage errors; everything else is a general failure.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<DigestError>() {
        Some(DigestError::Config(_)) => ExitCode::InvalidUsage,
        _ => ExitCode::GeneralError,
    }
}

fn run(cli: &Cli, stderr: &mut SafeStderr) -> Result<ExitCode> {
    let mut stdout = SafeStdout::new();

    let config_file = if cli.ignore_config {
        ConfigFile::default()
    } else {
        ConfigFile::load_with_custom_path(cli.config_file.as_deref())?
    };

    if cli.show_config {
        stdout.writeln(config_file.show_config().trim_end())?;
        return Ok(ExitCode::Success);
    }

    let config = DigestConfig::from_cli(cli, &config_file)?;
    debug!(sources = ?config_file.sources, scan = ?config.scan, "configuration resolved");

    // Loaded before the input is opened
    let previous = config
        .input
        .previous
        .as_deref()
        .map(load_previous)
        .transpose()?;

    let (reader, compression) = open_input(config.input.path.as_deref())?;
    debug!(?compression, "input opened");

    let outcome = digest(reader, &config.scan).context("scan failed")?;

    let metrics = match config.input.metrics.as_deref() {
        Some(path) => {
            let (reader, _) = open_input(Some(path))?;
            let sample = sample_metrics(reader, config.input.metrics_rows)
                .with_context(|| format!("failed to sample metrics from {}", path.display()))?;
            if sample.is_none() {
                debug!(path = %path.display(), "no usable metrics rows");
            }
            sample
        }
        None => None,
    };

    match outcome {
        Outcome::Summary { summary, stats } => {
            let rendered = match config.output.format {
                OutputFormat::Json => serde_json::to_string(&Envelope {
                    ok: true,
                    summary: Some(&summary),
                    error: None,
                    scan: &stats,
                    metrics: metrics.as_ref(),
                })?,
                OutputFormat::Text => {
                    render_brief(&summary, previous.as_ref(), metrics.as_ref())
                        .trim_end()
                        .to_string()
                }
                OutputFormat::Prompt => render_prompt(&summary, previous.as_ref(), metrics.as_ref()),
            };
            stdout.writeln(&rendered)?;
            if config.output.stats {
                stderr.writeln(&stats.format_stats());
            }
            Ok(ExitCode::Success)
        }
        Outcome::NoData { stats } => {
            if config.output.format == OutputFormat::Json {
                let body = Envelope {
                    ok: false,
                    summary: None,
                    error: Some("no rows scanned"),
                    scan: &stats,
                    metrics: None,
                };
                stdout.writeln(&serde_json::to_string(&body)?)?;
            } else {
                stderr.writeln("incident-digest: no rows scanned");
            }
            if config.output.stats {
                stderr.writeln(&stats.format_stats());
            }
            Ok(ExitCode::NoData)
        }
    }
}

/// JSON document written to stdout.
#[derive(Serialize)]
struct Envelope<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    scan: &'a ScanStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<&'a MetricsSample>,
}
