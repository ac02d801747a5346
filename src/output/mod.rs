//! Output mode abstraction for robot and human output.
//!
//! Data commands produce the same JSON result the session protocol returns;
//! robot mode prints it as-is, human mode renders it per request type.

use serde_json::Value;

use crate::cli::Cli;
use crate::config::Settings;
use crate::error::SwmError;
use crate::manager::MigrationOutcome;

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    /// JSON output for agents and scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human { color: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub const fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human { color: !cli.no_color }
        }
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { color } => Box::new(HumanOutput::new(color)),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &SwmError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    /// Result of a command-interface request of type `kind`.
    fn response(&self, kind: &str, result: &Value);

    fn migration(&self, outcome: &MigrationOutcome, stored_version: Option<&str>);
    fn settings(&self, settings: &Settings);

    // Metadata
    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>);
}
