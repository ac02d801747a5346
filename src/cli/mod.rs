//! CLI argument definitions.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::SettingsOverrides;

/// Switch Manager - blueprint-driven smart switch configurations.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "swm", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "SWM_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output (any non-falsey NO_COLOR value counts)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Settings file (TOML)
    #[arg(long, short = 'c', global = true, env = "SWM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory holding the store and writable blueprints
    #[arg(long, global = true, env = "SWM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Bundle directory holding manifest.json and source blueprints
    #[arg(long, global = true, env = "SWM_BUNDLE_DIR")]
    pub bundle_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }

    /// Settings overrides from the global flags.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            config: self.config.clone(),
            data_dir: self.data_dir.clone(),
            bundle_dir: self.bundle_dir.clone(),
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Lifecycle ===
    /// Reconcile installed blueprints with the bundled manifest
    Migrate,

    /// Rebuild the blueprint registry from disk
    Reload,

    // === Queries ===
    /// List blueprints, or show one
    Blueprints(BlueprintsArgs),

    /// List switch configs, or show one
    #[command(visible_alias = "ls")]
    Configs(ConfigsArgs),

    // === Mutations ===
    /// Create or update a switch config from a JSON or YAML document
    Save(SaveArgs),

    /// Enable a switch
    Enable(SwitchIdArgs),

    /// Disable a switch
    Disable(SwitchIdArgs),

    /// Delete a switch
    #[command(visible_alias = "rm")]
    Delete(SwitchIdArgs),

    /// Fire a platform event at the bound switches
    Fire(FireArgs),

    // === Protocol ===
    /// Serve JSON-lines requests on stdin, responses on stdout
    Session,

    // === Utilities ===
    /// Show resolved settings
    Settings,

    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct BlueprintsArgs {
    /// Blueprint id
    pub id: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ConfigsArgs {
    /// Switch id
    pub id: Option<String>,
}

/// Arguments for `swm save`.
///
/// # Examples
///
/// ```bash
/// swm save kitchen.yaml
/// cat kitchen.json | swm save -
/// ```
#[derive(Parser, Debug)]
pub struct SaveArgs {
    /// Config document path, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct SwitchIdArgs {
    /// Switch id
    pub id: String,
}

#[derive(Parser, Debug)]
pub struct FireArgs {
    /// Event type (e.g. zha_event)
    pub event_type: String,

    /// Event data as a JSON object
    #[arg(default_value = "{}")]
    pub data: String,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
