//! Error types for switch manager operations.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A single schema violation, addressed by a dotted path into the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field (e.g. `buttons.1.actions.0.title`).
    pub path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} @ {}", self.message, self.path)
        }
    }
}

/// Renders a list of field errors as `a; b; c`.
fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Primary error type for switch manager operations.
#[derive(Error, Debug)]
pub enum SwmError {
    // Validation errors
    #[error("Invalid {context}: {}", join_errors(.errors))]
    Validation {
        context: String,
        errors: Vec<FieldError>,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    // Registry errors
    #[error("Switch config not found: {id}")]
    SwitchNotFound { id: String },

    // Storage errors
    #[error("Store error: {0}")]
    Storage(String),

    // Bundle errors
    #[error("Manifest unavailable at {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error("Blueprint deploy failed: {0}")]
    Deploy(String),

    #[error("Failed to read blueprint '{id}': {reason}")]
    BlueprintRead { id: String, reason: String },

    // Platform errors
    #[error("Action dispatch failed: {0}")]
    Dispatch(String),

    // Settings errors
    #[error("Settings file not found: {path}")]
    SettingsNotFound { path: String },

    #[error("Invalid settings: {0}")]
    SettingsInvalid(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SwmError {
    /// Builds a validation error for the given context.
    pub fn validation(context: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self::Validation {
            context: context.into(),
            errors,
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidRequest(_)
                | Self::UnknownCommand(_)
                | Self::SwitchNotFound { .. }
                | Self::SettingsNotFound { .. }
                | Self::SettingsInvalid(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::SwitchNotFound { .. } => Some("Run: swm configs"),
            Self::Manifest { .. } => Some("Check --bundle-dir points at the bundled assets"),
            Self::SettingsNotFound { .. } => Some("Pass --config or create the settings file"),
            Self::Storage(_) => Some("Check --data-dir is writable"),
            _ => None,
        }
    }

    /// Wire error code reported by the command interface.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::InvalidRequest(_) => "invalid_format",
            Self::UnknownCommand(_) => "unknown_command",
            Self::SwitchNotFound { .. } => "not_found",
            Self::Storage(_) => "storage_error",
            Self::Manifest { .. } => "manifest_error",
            _ => "unknown_error",
        }
    }
}

impl From<rusqlite::Error> for SwmError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Convenience type alias for Results using SwmError.
pub type Result<T> = std::result::Result<T, SwmError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| SwmError::Other(format!("{}: {e}", f().into())))
    }
}
