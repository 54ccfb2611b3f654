use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::browser::notification::NotificationConfig;
use crate::run::runner::{DEFAULT_DROPDOWN_ITEM_SELECTOR, RunOptions, new_run_id};
use crate::run::timing::Timing;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "replay-runner",
    version,
    about = "Record-and-replay UI test runner"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: replay-runner.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Test case collection (overrides store.path from the config file)
    #[arg(long, global = true)]
    pub store: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stored test case names
    List,

    /// Print the steps of a test case as YAML
    Show {
        #[arg(long)]
        name: String,
    },

    /// Create a test case from a YAML or JSON step list
    Create {
        #[arg(long)]
        name: String,

        /// File holding the ordered step list
        #[arg(long)]
        steps: String,
    },

    /// Replace the steps of an existing test case
    Update {
        #[arg(long)]
        name: String,

        #[arg(long)]
        steps: String,
    },

    /// Delete a test case
    Delete {
        #[arg(long)]
        name: String,
    },

    /// Edit individual steps of a stored test case
    Step {
        #[command(subcommand)]
        command: StepCommand,
    },

    /// Run one or more test cases
    Run(RunArgs),
}

#[derive(Subcommand, Debug)]
pub enum StepCommand {
    /// Append a step, or insert it before --at
    Add {
        #[arg(long)]
        case: String,

        /// Step as JSON, e.g. '{"action":"visit","url":"https://x","wait":1}'
        #[arg(long)]
        step: String,

        #[arg(long)]
        at: Option<usize>,
    },

    /// Replace the step at --index
    Edit {
        #[arg(long)]
        case: String,

        #[arg(long)]
        index: usize,

        #[arg(long)]
        step: String,
    },

    /// Remove the step at --index
    Remove {
        #[arg(long)]
        case: String,

        #[arg(long)]
        index: usize,
    },

    /// Move the step at --index one position up or down
    Move {
        #[arg(long)]
        case: String,

        #[arg(long)]
        index: usize,

        #[arg(long, value_enum)]
        direction: Direction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Up,
    Down,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Test case to run (repeatable; cases run in the given order)
    #[arg(long = "case", required = true)]
    pub cases: Vec<String>,

    /// Passes per case when no dataset is given
    #[arg(long)]
    pub repeat: Option<usize>,

    /// CSV or JSON dataset; each row drives one pass and fills {{placeholders}}
    #[arg(long)]
    pub data: Option<String>,

    /// Run the browser headless
    #[arg(long)]
    pub headless: bool,

    /// Dataset column used to group records (e.g. LoginEmail)
    #[arg(long)]
    pub group_by: Option<String>,

    /// Directory for per-step screenshots
    #[arg(long)]
    pub screenshots: Option<String>,

    /// Write the run log as CSV
    #[arg(long)]
    pub csv: Option<String>,

    /// Write the run log as a workbook (one sheet per group)
    #[arg(long)]
    pub xlsx: Option<String>,

    /// Write the run log as JSON
    #[arg(long)]
    pub json: Option<String>,

    /// Append one JSONL trace event per record
    #[arg(long)]
    pub trace: Option<String>,

    /// Delete screenshot files after the exports are written
    #[arg(long)]
    pub cleanup_screenshots: bool,

    /// Fail iterations whose fresh browser session already holds storage
    #[arg(long)]
    pub verify_isolation: bool,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `replay-runner.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub dropdown: DropdownConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_node")]
    pub node: String,

    #[serde(default = "default_script")]
    pub script: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            node: default_node(),
            script: default_script(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropdownConfig {
    #[serde(default = "default_item_selector")]
    pub item_selector: String,
}

impl Default for DropdownConfig {
    fn default() -> Self {
        Self {
            item_selector: default_item_selector(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_one")]
    pub repeat: usize,

    #[serde(default)]
    pub headless: bool,

    pub screenshot_dir: Option<String>,

    pub group_by: Option<String>,

    #[serde(default)]
    pub verify_isolation: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            repeat: 1,
            headless: false,
            screenshot_dir: None,
            group_by: None,
            verify_isolation: false,
        }
    }
}

// Serde default helpers
fn default_store_path() -> String { "test_cases.json".to_string() }
fn default_node() -> String { "node".to_string() }
fn default_script() -> String { "node/browser_server.js".to_string() }
fn default_item_selector() -> String { DEFAULT_DROPDOWN_ITEM_SELECTOR.to_string() }
fn default_one() -> usize { 1 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("replay-runner.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring malformed config '{}': {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Build RunOptions: CLI flag > config file > default.
pub fn build_run_options(config: &AppConfig, args: &RunArgs) -> RunOptions {
    RunOptions {
        repeat: args.repeat.unwrap_or(config.run.repeat).max(1),
        headless: args.headless || config.run.headless,
        timing: config.timing,
        notifications: config.notifications.clone(),
        dropdown_item_selector: config.dropdown.item_selector.clone(),
        screenshot_dir: args
            .screenshots
            .as_deref()
            .or(config.run.screenshot_dir.as_deref())
            .map(PathBuf::from),
        group_by: args.group_by.clone().or_else(|| config.run.group_by.clone()),
        verify_isolation: args.verify_isolation || config.run.verify_isolation,
        run_id: new_run_id(),
    }
}

/// Store path: `--store` > config file > default.
pub fn resolve_store_path(cli_store: Option<&str>, config: &AppConfig) -> PathBuf {
    PathBuf::from(cli_store.unwrap_or(&config.store.path))
}
