use std::collections::HashMap;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{DigestError, Result};

const PROJECT_FILE: &str = ".digestrc";
const APP_DIR: &str = "incident-digest";

/// Keys accepted in the `[columns]` section.
pub const COLUMN_KEYS: &[&str] = &["entity", "category", "priority", "opened", "resolved", "closed"];

/// Settings read from an INI-style `.digestrc` or user config file.
///
/// Every field is optional: anything unset falls through to the built-in default.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigFile {
    pub max_rows: Option<u64>,
    pub top_k: Option<usize>,
    pub threads: Option<usize>,
    pub delimiter: Option<String>,
    /// `[columns]` overrides keyed by logical field name.
    pub columns: HashMap<String, String>,
    /// `[timestamps]` formats in file order. Non-empty replaces the default list.
    pub formats: Vec<String>,
    /// Files that contributed, lowest precedence first.
    pub sources: Vec<PathBuf>,
}

impl ConfigFile {
    /// Find project-level .digestrc by walking up directory tree
    pub fn find_project_config() -> Option<PathBuf> {
        let mut current = env::current_dir().ok()?;
        loop {
            let config_path = current.join(PROJECT_FILE);
            if config_path.exists() {
                return Some(config_path);
            }
            if !current.pop() {
                break;
            }
        }
        None
    }

    /// User config locations in order of preference.
    pub fn get_user_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_DIR).join("config.ini"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(PROJECT_FILE));
        }
        paths
    }

    /// Load configuration with proper precedence: project > user > defaults
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // First existing user file only
        if let Some(path) = Self::get_user_config_paths().into_iter().find(|p| p.exists()) {
            config = Self::merge_configs(config, Self::load_from_path(&path)?);
        }

        if let Some(project_path) = Self::find_project_config() {
            config = Self::merge_configs(config, Self::load_from_path(&project_path)?);
        }

        Ok(config)
    }

    /// An explicit path replaces discovery entirely.
    pub fn load_with_custom_path(custom_path: Option<&Path>) -> Result<Self> {
        match custom_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DigestError::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;

        let mut config = Self::parse_ini_content(&content).map_err(|e| match e {
            DigestError::Config(msg) => DigestError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        config.sources.push(path.to_path_buf());
        Ok(config)
    }

    /// Parse INI content from string
    pub fn parse_ini_content(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut current_section = String::new();

        for (idx, line) in content.lines().enumerate() {
            let lineno = idx + 1;
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_string();
                continue;
            }

            let Some(eq_pos) = line.find('=') else {
                warn!(line = lineno, "ignoring config line without '='");
                continue;
            };
            let key = line[..eq_pos].trim();
            let value = line[eq_pos + 1..].trim();

            match current_section.as_str() {
                "" => match key {
                    "max_rows" => config.max_rows = Some(parse_number(key, value, lineno)?),
                    "top_k" => config.top_k = Some(parse_number(key, value, lineno)?),
                    "threads" => config.threads = Some(parse_number(key, value, lineno)?),
                    "delimiter" => config.delimiter = Some(value.to_string()),
                    _ => warn!(key, line = lineno, "unknown config key"),
                },
                "columns" => {
                    if COLUMN_KEYS.contains(&key) {
                        config.columns.insert(key.to_string(), value.to_string());
                    } else {
                        warn!(key, line = lineno, "unknown column key");
                    }
                }
                "timestamps" => {
                    if key == "format" {
                        config.formats.push(value.to_string());
                    } else {
                        warn!(key, line = lineno, "unknown timestamps key");
                    }
                }
                section => warn!(section, line = lineno, "unknown config section"),
            }
        }

        Ok(config)
    }

    /// Merge two configuration objects, with the second taking precedence
    pub fn merge_configs(base: Self, overlay: Self) -> Self {
        Self {
            max_rows: overlay.max_rows.or(base.max_rows),
            top_k: overlay.top_k.or(base.top_k),
            threads: overlay.threads.or(base.threads),
            delimiter: overlay.delimiter.or(base.delimiter),
            columns: {
                let mut merged = base.columns;
                merged.extend(overlay.columns);
                merged
            },
            formats: if overlay.formats.is_empty() {
                base.formats
            } else {
                overlay.formats
            },
            sources: {
                let mut sources = base.sources;
                sources.extend(overlay.sources);
                sources
            },
        }
    }

    /// Search locations and effective settings, for `--show-config`.
    pub fn show_config(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Configuration precedence: CLI > environment > project {} > user config > defaults\n",
            PROJECT_FILE
        );

        if self.sources.is_empty() {
            let _ = writeln!(out, "No configuration files loaded. Using defaults.");
        } else {
            let _ = writeln!(out, "Configuration loaded from:");
            for source in &self.sources {
                let _ = writeln!(out, "  {}", source.display());
            }
        }

        let mut settings = Vec::new();
        if let Some(v) = self.max_rows {
            settings.push(format!("max_rows = {}", v));
        }
        if let Some(v) = self.top_k {
            settings.push(format!("top_k = {}", v));
        }
        if let Some(v) = self.threads {
            settings.push(format!("threads = {}", v));
        }
        if let Some(v) = &self.delimiter {
            settings.push(format!("delimiter = {}", v));
        }
        let mut columns: Vec<_> = self.columns.iter().collect();
        columns.sort_by_key(|(k, _)| k.as_str());
        for (key, value) in columns {
            settings.push(format!("columns.{} = {}", key, value));
        }
        for format in &self.formats {
            settings.push(format!("timestamps.format = {}", format));
        }
        if !settings.is_empty() {
            let _ = writeln!(out, "\nActive settings:");
            for line in settings {
                let _ = writeln!(out, "  {}", line);
            }
        }

        let _ = writeln!(out, "\nConfiguration search locations (in precedence order):");
        match Self::find_project_config() {
            Some(path) => {
                let _ = writeln!(out, "  1. Project: {} (found)", path.display());
            }
            None => {
                let _ = writeln!(
                    out,
                    "  1. Project: {} (searched up directory tree, not found)",
                    PROJECT_FILE
                );
            }
        }
        for (i, path) in Self::get_user_config_paths().iter().enumerate() {
            let status = if path.exists() { "(found)" } else { "(not found)" };
            let _ = writeln!(out, "  {}. User: {} {}", i + 2, path.display(), status);
        }

        out
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str, lineno: usize) -> Result<T> {
    value.parse().map_err(|_| {
        DigestError::Config(format!(
            "line {}: {} expects a non-negative integer, got '{}'",
            lineno, key, value
        ))
    })
}
