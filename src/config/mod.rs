//! Configuration module: blueprint and switch schemas, runtime settings.
//!
//! Blueprint definitions and switch configs both arrive as loosely typed
//! documents, so they are checked by an explicit validator that collects
//! every field error. Runtime settings come from TOML.

mod blueprint;
mod path;
mod settings;
mod switch_config;
pub mod validate;

pub use blueprint::{
    Blueprint, BlueprintAction, BlueprintButton, ButtonShape, Condition, conditions_match,
};
pub use path::{PathResolver, home_dir, resolve_path};
pub use settings::{Settings, SettingsFile, SettingsOverrides};
pub use switch_config::{
    ActionConfig, ButtonConfig, SaveConfig, ScriptMode, SwitchConfig, is_reserved_key,
};
