// Core library for the incident digest: single-pass scan, per-incident fold, bounded summary

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod config_file;
pub mod decoder;
pub mod decompression;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod parallel;
pub mod pipeline;
pub mod platform;
pub mod readers;
pub mod report;
pub mod stats;
pub mod summary;
pub mod timestamp;

pub use aggregate::{fold, EntityRecord, EntityTable};
pub use decoder::{FieldMap, Row, RowDecoder};
pub use error::DigestError;
pub use pipeline::{digest, scan, Outcome, ScanConfig, ScanResult};
pub use stats::ScanStats;
pub use summary::{summarize, Summary, TopEntry};
