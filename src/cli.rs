// Command-line interface definitions

use std::path::PathBuf;

use clap::Parser;

use crate::config::OutputFormat;
use crate::logging::{LogFormat, LogLevel};
use crate::metrics::DEFAULT_SAMPLE_ROWS;

#[derive(Parser, Debug)]
#[command(name = "incident-digest")]
#[command(about = "Summarize an incident export into counts, MTTR and top categories")]
#[command(
    long_about = "Summarize an incident export into counts, MTTR and top categories\n\nReads a delimited export (plain, gzip or zstd) in a single pass, groups rows by\nincident id and prints a JSON summary. Rows after --max-rows are not read.\n\nCOMMON EXAMPLES:\n  incident-digest incidents.csv\n  incident-digest incidents.csv.gz -n 0 --threads 4\n  incident-digest incidents.csv -F text --previous yesterday.json --metrics perf.csv"
)]
#[command(version)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Input file (stdin if not specified, or use "-" to explicitly specify stdin)
    pub input: Option<PathBuf>,

    /// Stop after this many data rows (0 for no limit) [default: 50000]
    #[arg(
        short = 'n',
        long = "max-rows",
        env = "DIGEST_MAX_ROWS",
        help_heading = "Scan Options"
    )]
    pub max_rows: Option<u64>,

    /// Number of entries in each top list [default: 5]
    #[arg(
        short = 'k',
        long = "top",
        env = "DIGEST_TOP_K",
        help_heading = "Scan Options"
    )]
    pub top_k: Option<usize>,

    /// Worker threads for the aggregation (0 for one per CPU) [default: 1]
    #[arg(long = "threads", env = "DIGEST_THREADS", help_heading = "Scan Options")]
    pub threads: Option<usize>,

    /// Column holding the incident id [default: number]
    #[arg(long = "entity-col", help_heading = "Column Options")]
    pub entity_col: Option<String>,

    /// Column holding the category [default: category]
    #[arg(long = "category-col", help_heading = "Column Options")]
    pub category_col: Option<String>,

    /// Column holding the priority [default: priority]
    #[arg(long = "priority-col", help_heading = "Column Options")]
    pub priority_col: Option<String>,

    /// Column holding the opened timestamp [default: opened_at]
    #[arg(long = "opened-col", help_heading = "Column Options")]
    pub opened_col: Option<String>,

    /// Column holding the resolved timestamp [default: resolved_at]
    #[arg(long = "resolved-col", help_heading = "Column Options")]
    pub resolved_col: Option<String>,

    /// Column holding the closed timestamp [default: closed_at]
    #[arg(long = "closed-col", help_heading = "Column Options")]
    pub closed_col: Option<String>,

    /// Timestamp format in strftime syntax (repeatable, replaces the built-in list)
    #[arg(long = "ts-format", help_heading = "Input Options")]
    pub ts_formats: Vec<String>,

    /// Field delimiter: a single character, or "tab" [default: ,]
    #[arg(short = 'd', long = "delimiter", help_heading = "Input Options")]
    pub delimiter: Option<String>,

    /// Input has no header row; columns are named c1, c2, ...
    #[arg(long = "no-headers", help_heading = "Input Options")]
    pub no_headers: bool,

    /// Output format
    #[arg(
        short = 'F',
        long = "output-format",
        value_enum,
        default_value_t = OutputFormat::Json,
        help_heading = "Output Options"
    )]
    pub output_format: OutputFormat,

    /// Previous summary (bare or enveloped JSON) to compare against
    #[arg(long = "previous", help_heading = "Output Options")]
    pub previous: Option<PathBuf>,

    /// Performance CSV (timestamp, cpu_usage, memory_usage, disk_usage) to sample
    #[arg(long = "metrics", help_heading = "Output Options")]
    pub metrics: Option<PathBuf>,

    /// Rows read from the metrics file
    #[arg(
        long = "metrics-rows",
        default_value_t = DEFAULT_SAMPLE_ROWS,
        help_heading = "Output Options"
    )]
    pub metrics_rows: usize,

    /// Print scan statistics to stderr
    #[arg(short = 's', long = "stats", help_heading = "Output Options")]
    pub stats: bool,

    /// Log verbosity (overridden by DIGEST_LOG or RUST_LOG)
    #[arg(
        long = "log-level",
        value_enum,
        default_value_t = LogLevel::Warn,
        help_heading = "Logging Options"
    )]
    pub log_level: LogLevel,

    /// Log line format on stderr
    #[arg(
        long = "log-format",
        value_enum,
        env = "DIGEST_LOG_FORMAT",
        default_value_t = LogFormat::Human,
        help_heading = "Logging Options"
    )]
    pub log_format: LogFormat,

    /// Use this config file instead of searching for .digestrc
    #[arg(long = "config-file", help_heading = "Configuration Options")]
    pub config_file: Option<PathBuf>,

    /// Ignore all config files
    #[arg(
        long = "ignore-config",
        conflicts_with = "config_file",
        help_heading = "Configuration Options"
    )]
    pub ignore_config: bool,

    /// Show config search locations and effective settings, then exit
    #[arg(long = "show-config", help_heading = "Configuration Options")]
    pub show_config: bool,
}
