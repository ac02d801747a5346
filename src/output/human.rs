//! Human-friendly output implementation using `console` styling.

use serde_json::{Map, Value};
use tracing::{debug, instrument, trace};

use crate::command::{
    DELETE_CONFIG, FIRE_EVENT, LIST_BLUEPRINTS, LIST_CONFIGS, RELOAD_BLUEPRINTS, SAVE_CONFIG,
    SET_ENABLED,
};
use crate::config::Settings;
use crate::error::SwmError;
use crate::manager::MigrationOutcome;
use crate::theme::SwmTheme;

use super::Output;

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    theme: SwmTheme,
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Blueprint id from a switch view: the object's `id` when resolved, the raw
/// string otherwise.
fn blueprint_label(blueprint: &Value) -> (&str, bool) {
    match blueprint {
        Value::Object(bp) => (bp.get("id").and_then(Value::as_str).unwrap_or(""), true),
        Value::String(id) => (id.as_str(), false),
        _ => ("", false),
    }
}

impl HumanOutput {
    #[instrument]
    pub fn new(color: bool) -> Self {
        debug!("Creating HumanOutput");
        if !color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        Self {
            theme: SwmTheme::default(),
        }
    }

    fn label(&self, name: &str) -> String {
        self.theme.label.apply_to(format!("  {name:<12}")).to_string()
    }

    fn blueprint_list(&self, blueprints: &Map<String, Value>) {
        if blueprints.is_empty() {
            self.warning("No blueprints loaded");
            return;
        }
        println!("{}", self.theme.header.apply_to("Blueprints:"));
        for (id, bp) in blueprints {
            let buttons = bp.get("buttons").and_then(Value::as_array).map_or(0, Vec::len);
            println!(
                "  {:<20} {} {}",
                self.theme.switch_id.apply_to(id),
                text(bp, "name"),
                self.theme.muted.apply_to(format!(
                    "({}, {buttons} buttons)",
                    text(bp, "event_type")
                )),
            );
        }
    }

    fn blueprint_detail(&self, bp: &Value) {
        println!("{}", self.theme.header.apply_to(text(bp, "name")));
        println!("{}{}", self.label("Id"), text(bp, "id"));
        println!("{}{}", self.label("Service"), text(bp, "service"));
        println!("{}{}", self.label("Event"), text(bp, "event_type"));
        println!("{}{}", self.label("Identifier"), text(bp, "identifier_key"));
        let buttons = bp.get("buttons").and_then(Value::as_array);
        for (i, button) in buttons.into_iter().flatten().enumerate() {
            let titles: Vec<_> = button
                .get("actions")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(|a| text(a, "title"))
                .collect();
            println!("{}{}", self.label(&format!("Button {i}")), titles.join(", "));
        }
    }

    fn state_label(&self, view: &Value) -> String {
        if text(view, "state") == "bound" {
            self.theme.bound.apply_to("bound").to_string()
        } else {
            self.theme.unbound.apply_to("unbound").to_string()
        }
    }

    fn switch_list(&self, configs: &Map<String, Value>) {
        if configs.is_empty() {
            self.info("No switches configured");
            return;
        }
        println!("{}", self.theme.header.apply_to("Switches:"));
        for (id, view) in configs {
            let (blueprint, resolved) = blueprint_label(view.get("blueprint").unwrap_or(&Value::Null));
            let blueprint = if resolved {
                blueprint.to_string()
            } else {
                self.theme.warning.apply_to(format!("{blueprint}?")).to_string()
            };
            println!(
                "  {:<6} {:<24} {:<16} {}",
                self.theme.switch_id.apply_to(id),
                text(view, "name"),
                blueprint,
                self.state_label(view),
            );
        }
    }

    fn switch_detail(&self, view: &Value) {
        println!("{}", self.theme.header.apply_to(text(view, "name")));
        println!("{}{}", self.label("Id"), text(view, "id"));
        let (blueprint, resolved) = blueprint_label(view.get("blueprint").unwrap_or(&Value::Null));
        let suffix = if resolved { "" } else { " (unresolved)" };
        println!("{}{blueprint}{suffix}", self.label("Blueprint"));
        println!("{}{}", self.label("Identifier"), text(view, "identifier"));
        println!(
            "{}{}",
            self.label("Enabled"),
            view.get("enabled").and_then(Value::as_bool).unwrap_or(false)
        );
        println!("{}{}", self.label("State"), self.state_label(view));
        if view.get("is_mismatch").and_then(Value::as_bool) == Some(true) {
            self.warning("Buttons do not match the blueprint layout");
        }
    }
}

impl Output for HumanOutput {
    fn success(&self, message: &str) {
        println!("{} {message}", self.theme.success.apply_to("[OK]"));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &SwmError) {
        debug!(error = %error, recoverable = error.is_user_recoverable(), "Outputting error");
        eprintln!("{} {error}", self.theme.error.apply_to("[ERR]"));
        if let SwmError::Validation { errors, .. } = error {
            for field in errors {
                eprintln!("      {}", self.theme.muted.apply_to(field));
            }
        }
        if let Some(suggestion) = error.suggestion() {
            trace!(suggestion, "Adding suggestion");
            eprintln!("{} {suggestion}", self.theme.warning.apply_to("Hint:"));
        }
    }

    fn warning(&self, message: &str) {
        println!("{} {message}", self.theme.warning.apply_to("[WARN]"));
    }

    fn info(&self, message: &str) {
        println!("{} {message}", self.theme.accent.apply_to("[INFO]"));
    }

    #[instrument(skip(self, result))]
    fn response(&self, kind: &str, result: &Value) {
        match kind {
            LIST_BLUEPRINTS => match (result.get("blueprints"), result.get("blueprint")) {
                (Some(Value::Object(all)), _) => self.blueprint_list(all),
                (_, Some(bp @ Value::Object(_))) => self.blueprint_detail(bp),
                (_, Some(Value::String(id))) => self.warning(&format!("Blueprint '{id}' not found")),
                _ => trace!("Unexpected blueprint result"),
            },
            RELOAD_BLUEPRINTS => {
                let loaded = result.get("blueprints").and_then(Value::as_u64).unwrap_or(0);
                self.success(&format!("Reloaded {loaded} blueprint(s)"));
                let skipped = result.get("skipped").and_then(Value::as_array);
                for id in skipped.into_iter().flatten().filter_map(Value::as_str) {
                    self.warning(&format!("Skipped invalid blueprint {id}"));
                }
            }
            LIST_CONFIGS => match (result.get("configs"), result.get("config")) {
                (Some(Value::Object(all)), _) => self.switch_list(all),
                (_, Some(view @ Value::Object(_))) => self.switch_detail(view),
                _ => self.warning("Switch not found"),
            },
            SAVE_CONFIG => {
                let name = result.get("config").map_or("", |c| text(c, "name"));
                self.success(&format!("Saved switch {} ({name})", text(result, "config_id")));
            }
            SET_ENABLED => {
                let enabled = result.get("enabled").and_then(Value::as_bool).unwrap_or(false);
                let verb = if enabled { "enabled" } else { "disabled" };
                self.success(&format!("Switch {} {verb}", text(result, "switch_id")));
            }
            DELETE_CONFIG => self.success(&format!("Switch {} deleted", text(result, "deleted"))),
            FIRE_EVENT => {
                let ran = result.get("actions_run").and_then(Value::as_u64).unwrap_or(0);
                self.info(&format!("{ran} action(s) run"));
            }
            other => trace!(kind = other, "No human renderer"),
        }
    }

    fn migration(&self, outcome: &MigrationOutcome, stored_version: Option<&str>) {
        match outcome {
            MigrationOutcome::Migrated { from, to, copied } => self.success(&format!(
                "Migrated blueprints {} -> {to} ({copied} files)",
                from.as_deref().unwrap_or("none")
            )),
            MigrationOutcome::Repaired { copied } => {
                self.success(&format!("Restored blueprint directory ({copied} files)"));
            }
            MigrationOutcome::Unchanged { version } => {
                self.info(&format!("Blueprints up to date (version {version})"));
            }
            MigrationOutcome::Degraded { reason } => {
                self.warning(&format!(
                    "Blueprint deploy failed, stored version {}: {reason}",
                    stored_version.unwrap_or("none")
                ));
            }
        }
    }

    fn settings(&self, settings: &Settings) {
        println!("{}", self.theme.header.apply_to("Settings"));
        println!("{}{}", self.label("Data"), settings.data_dir.display());
        println!("{}{}", self.label("Store"), settings.store_path.display());
        println!("{}{}", self.label("Blueprints"), settings.blueprints_dir.display());
        println!("{}{}", self.label("Bundle"), settings.bundle_dir.display());
    }

    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        println!("{} {}", self.theme.header.apply_to("swm"), self.theme.value.apply_to(version));
        if let Some(sha) = git_sha {
            println!("{}{sha}", self.label("Git SHA"));
        }
        if let Some(time) = build_time {
            println!("{}{}", self.label("Built"), self.theme.muted.apply_to(time));
        }
        if let Some(rustc) = option_env!("VERGEN_RUSTC_SEMVER") {
            println!("{}{}", self.label("Rust"), self.theme.muted.apply_to(rustc));
        }
        if let Some(target) = option_env!("VERGEN_CARGO_TARGET_TRIPLE") {
            println!("{}{}", self.label("Target"), self.theme.muted.apply_to(target));
        }
    }
}
