use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::extract::record::DateFormat;
use crate::page::tracker_config::TrackerConfig;

pub const DEFAULT_CONFIG_FILE: &str = "job-tracker.yaml";
pub const DEFAULT_STORE_DIR: &str = ".job-tracker/snapshots";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "job-tracker",
    version,
    about = "Detects job application forms, captures submissions and protects drafts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: job-tracker.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Directory holding saved form snapshots
    #[arg(long, global = true)]
    pub store_dir: Option<String>,

    /// HTTP endpoint that records captured applications
    #[arg(long, global = true)]
    pub sink_endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report classifier signals for a captured page
    Classify {
        /// Page file (.json, .yaml or .yml)
        #[arg(long)]
        page: String,

        /// Form id or name; the whole page when absent
        #[arg(long)]
        form: Option<String>,
    },

    /// Extract the job record a submission of this page would produce
    Extract {
        /// Page file (.json, .yaml or .yml)
        #[arg(long)]
        page: String,

        /// Form id or name; the whole page when absent
        #[arg(long)]
        form: Option<String>,

        /// Date format: us or iso
        #[arg(long)]
        date_format: Option<String>,

        /// Send the record to the sink instead of printing it
        #[arg(long, default_value_t = false)]
        send: bool,
    },

    /// Replay session scripts from YAML files
    Run {
        /// Path to a script YAML file or a directory of them
        #[arg(long)]
        script: String,

        /// Output format: console or json
        #[arg(long, default_value = "console")]
        format: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Inspect or clear saved form snapshots
    Snapshots {
        #[command(subcommand)]
        action: SnapshotAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum SnapshotAction {
    /// List saved forms, newest first
    List,

    /// Delete one saved form by its storage key
    Clear { key: String },

    /// Delete every saved form
    ClearAll,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `job-tracker.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub sink: SinkConfig,

    /// JSONL activity trace written during script runs
    #[serde(default)]
    pub trace_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    pub endpoint: Option<String>,
}

// Serde default helpers
fn default_store_dir() -> String { DEFAULT_STORE_DIR.to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = config_path, error = %e, "ignoring malformed config file");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Settings after merging CLI flags over the config file.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub tracker: TrackerConfig,
    pub store_dir: String,
    pub sink_endpoint: Option<String>,
    pub trace_file: Option<String>,
}

pub fn resolve_settings(cli: &Cli, config: &AppConfig) -> ResolvedSettings {
    ResolvedSettings {
        tracker: config.tracker,
        store_dir: cli
            .store_dir
            .clone()
            .unwrap_or_else(|| config.store.dir.clone()),
        sink_endpoint: cli
            .sink_endpoint
            .clone()
            .or_else(|| config.sink.endpoint.clone()),
        trace_file: config.trace_file.clone(),
    }
}

/// `--date-format` wins over the configured format.
pub fn resolve_date_format(flag: Option<&str>, configured: DateFormat) -> Result<DateFormat, String> {
    match flag {
        Some(name) => DateFormat::parse_name(name)
            .ok_or_else(|| format!("unknown date format '{}', expected us or iso", name)),
        None => Ok(configured),
    }
}
