use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde_json::Value;

use crate::cli::Cli;
use crate::config_file::ConfigFile;
use crate::decoder::FieldMap;
use crate::error::{DigestError, Result};
use crate::parallel::default_threads;
use crate::pipeline::{ScanConfig, DEFAULT_MAX_ROWS};
use crate::readers::ReaderOptions;
use crate::summary::{Summary, DEFAULT_TOP_K};
use crate::timestamp::TimestampFormats;

/// Main configuration struct, resolved from CLI, environment and config file.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub input: InputConfig,
    pub scan: ScanConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default)]
pub struct InputConfig {
    /// `None` or `-` reads stdin.
    pub path: Option<PathBuf>,
    pub previous: Option<PathBuf>,
    pub metrics: Option<PathBuf>,
    pub metrics_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub stats: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON envelope with summary and scan statistics
    #[default]
    Json,
    /// Plain-text posture brief
    Text,
    /// Brief wrapped with instructions for a text-generation step
    Prompt,
}

impl DigestConfig {
    /// CLI (including its env fallbacks) wins over the file, the file over defaults.
    pub fn from_cli(cli: &Cli, file: &ConfigFile) -> Result<Self> {
        let max_rows = match cli.max_rows.or(file.max_rows) {
            Some(0) => None,
            Some(n) => Some(n),
            None => Some(DEFAULT_MAX_ROWS),
        };

        let top_k = cli.top_k.or(file.top_k).unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(DigestError::Config("top_k must be at least 1".to_string()));
        }

        let threads = match cli.threads.or(file.threads).unwrap_or(1) {
            0 => default_threads(),
            n => n,
        };

        let delimiter = match cli.delimiter.as_deref().or(file.delimiter.as_deref()) {
            Some(raw) => parse_delimiter(raw)?,
            None => b',',
        };

        let formats = if !cli.ts_formats.is_empty() {
            TimestampFormats::new(cli.ts_formats.clone())?
        } else if !file.formats.is_empty() {
            TimestampFormats::new(file.formats.clone())?
        } else {
            TimestampFormats::default()
        };

        Ok(Self {
            input: InputConfig {
                path: cli.input.clone(),
                previous: cli.previous.clone(),
                metrics: cli.metrics.clone(),
                metrics_rows: cli.metrics_rows,
            },
            scan: ScanConfig {
                max_rows,
                top_k,
                fields: resolve_fields(cli, file),
                formats,
                reader: ReaderOptions {
                    delimiter,
                    has_headers: !cli.no_headers,
                },
                threads,
            },
            output: OutputConfig {
                format: cli.output_format,
                stats: cli.stats,
            },
        })
    }
}

fn resolve_fields(cli: &Cli, file: &ConfigFile) -> FieldMap {
    let mut fields = FieldMap::default();
    let targets: [(&str, &Option<String>, &mut String); 6] = [
        ("entity", &cli.entity_col, &mut fields.entity),
        ("category", &cli.category_col, &mut fields.category),
        ("priority", &cli.priority_col, &mut fields.priority),
        ("opened", &cli.opened_col, &mut fields.opened),
        ("resolved", &cli.resolved_col, &mut fields.resolved),
        ("closed", &cli.closed_col, &mut fields.closed),
    ];
    for (key, flag, slot) in targets {
        if let Some(name) = flag.as_ref().or_else(|| file.columns.get(key)) {
            *slot = name.clone();
        }
    }
    fields
}

/// Accepts a single ASCII character, `\t` or `tab`.
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "\\t" | "tab" | "\t" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        s => Err(DigestError::Config(format!(
            "delimiter must be a single ASCII character or 'tab', got '{}'",
            s
        ))),
    }
}

/// Load a summary written by an earlier run, either bare or inside the JSON envelope.
pub fn load_previous(path: &Path) -> Result<Summary> {
    let previous_error = |message: String| DigestError::Previous {
        path: path.to_path_buf(),
        message,
    };

    let content = fs::read_to_string(path).map_err(|e| previous_error(e.to_string()))?;
    let mut value: Value =
        serde_json::from_str(&content).map_err(|e| previous_error(e.to_string()))?;

    if let Some(inner) = value.get_mut("summary") {
        value = inner.take();
    }
    if !value.is_object() {
        return Err(previous_error("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| previous_error(e.to_string()))
}
