//! Robot mode JSON output implementation.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument, trace, warn};

use crate::config::Settings;
use crate::error::SwmError;
use crate::manager::MigrationOutcome;

use super::{Output, RobotFormat};

/// JSON output implementation for agents and scripting.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    /// Serializes `data` in the configured format.
    fn render<T: Serialize + ?Sized>(&self, data: &T) -> Option<String> {
        let rendered = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        match rendered {
            Ok(json) => {
                trace!(json_len = json.len(), "JSON serialized");
                Some(json)
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize output");
                None
            }
        }
    }

    /// Output any serializable data as JSON to stdout.
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            println!("{json}");
        }
    }

    /// Output JSON to stderr.
    fn output_json_stderr<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            eprintln!("{json}");
        }
    }
}

/// Error body shared by robot output and the binary's top-level handler.
pub fn error_json(error: &SwmError) -> serde_json::Value {
    json!({
        "error": true,
        "code": error.code(),
        "message": error.to_string(),
        "suggestion": error.suggestion(),
        "recoverable": error.is_user_recoverable(),
    })
}

impl Output for RobotOutput {
    fn success(&self, message: &str) {
        self.output_json(&json!({ "success": true, "message": message }));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &SwmError) {
        debug!(error = %error, "Robot: error");
        self.output_json_stderr(&error_json(error));
    }

    fn warning(&self, message: &str) {
        self.output_json(&json!({ "warning": true, "message": message }));
    }

    fn info(&self, message: &str) {
        self.output_json(&json!({ "info": true, "message": message }));
    }

    #[instrument(skip(self, result))]
    fn response(&self, kind: &str, result: &serde_json::Value) {
        debug!("Robot: response");
        self.output_json(result);
    }

    fn migration(&self, outcome: &MigrationOutcome, stored_version: Option<&str>) {
        self.output_json(&json!({
            "migration": outcome,
            "stored_version": stored_version,
        }));
    }

    fn settings(&self, settings: &Settings) {
        self.output_json(settings);
    }

    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        self.output_json(&json!({
            "version": version,
            "git_sha": git_sha,
            "build_time": build_time,
            "rustc": option_env!("VERGEN_RUSTC_SEMVER"),
            "target": option_env!("VERGEN_CARGO_TARGET_TRIPLE"),
        }));
    }
}
