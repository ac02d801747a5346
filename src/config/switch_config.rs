//! Managed switch configuration as saved by the UI and kept in the store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use super::validate::{Validator, coerce_string, join};
use crate::error::Result;

/// How an action's script behaves when triggered while already running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptMode {
    #[default]
    Single,
    Restart,
    Queued,
    Parallel,
}

impl ScriptMode {
    const CHOICES: [&'static str; 4] = ["single", "restart", "queued", "parallel"];

    fn from_name(name: &str) -> Self {
        match name {
            "restart" => Self::Restart,
            "queued" => Self::Queued,
            "parallel" => Self::Parallel,
            _ => Self::Single,
        }
    }
}

/// Script bound to one blueprint action. The sequence is opaque here and
/// handed to the automation runtime as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(default)]
    pub mode: ScriptMode,
    #[serde(default)]
    pub sequence: Vec<Value>,
}

/// Per-button list of action scripts, index-aligned with the blueprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonConfig {
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

const fn default_true() -> bool {
    true
}

/// Persisted form of a managed switch (the id is the store key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Blueprint id.
    pub blueprint: String,
    pub identifier: String,
    #[serde(default)]
    pub buttons: Vec<ButtonConfig>,
    /// Unrecognised top-level keys, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A validated save request: the optional target id plus the new config.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveConfig {
    /// Existing switch id to update; `None` creates a new switch.
    pub id: Option<String>,
    pub config: SwitchConfig,
}

const KNOWN_KEYS: [&str; 6] = ["id", "name", "enabled", "blueprint", "identifier", "buttons"];

/// Names computed by the switch view; never accepted as pass-through keys.
const VIEW_KEYS: [&str; 3] = ["valid_blueprint", "is_mismatch", "state"];

/// Whether `key` names a config or view field rather than a pass-through key.
pub fn is_reserved_key(key: &str) -> bool {
    KNOWN_KEYS.contains(&key) || VIEW_KEYS.contains(&key)
}

impl SaveConfig {
    /// Validates a raw save-config document.
    ///
    /// Integer ids are normalised to strings; `null` and `""` mean "create".
    pub fn from_document(doc: &Value) -> Result<Self> {
        let mut v = Validator::new();
        let parsed = Self::parse(doc, &mut v);
        v.finish("switch config", parsed)
    }

    fn parse(doc: &Value, v: &mut Validator) -> Option<Self> {
        let map = v.object(doc, "")?;

        let id = match map.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(value @ Value::String(_)) => coerce_string(value),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            Some(_) => {
                v.error("id", "expected str, int or None");
                None
            }
        };

        let name = v.required_string(map, "name", "");
        let enabled = v.bool_or(map, "enabled", "", true);
        let blueprint = v.required_string(map, "blueprint", "");
        let identifier = v.required_string(map, "identifier", "");
        let buttons = v.required_list(map, "buttons", "").map(|items| {
            items
                .into_iter()
                .enumerate()
                .filter_map(|(i, item)| parse_button(item, &join("buttons", i), v))
                .collect()
        });

        let extra = map
            .iter()
            .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
            .filter(|(k, _)| {
                let reserved = VIEW_KEYS.contains(&k.as_str());
                if reserved {
                    trace!(key = %k, "Dropping config key reserved for the switch view");
                }
                !reserved
            })
            .map(|(k, val)| (k.clone(), val.clone()))
            .collect::<Map<_, _>>();
        if !extra.is_empty() {
            trace!(keys = ?extra.keys().collect::<Vec<_>>(), "Passing through extra config keys");
        }

        Some(Self {
            id,
            config: SwitchConfig {
                name: name?,
                enabled,
                blueprint: blueprint?,
                identifier: identifier?,
                buttons: buttons?,
                extra,
            },
        })
    }
}

fn parse_button(value: &Value, path: &str, v: &mut Validator) -> Option<ButtonConfig> {
    let map = v.object(value, path)?;
    v.reject_extra(map, &["actions"], path);
    let actions = v.required_list(map, "actions", path).map(|items| {
        items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| parse_action(item, &join(&join(path, "actions"), i), v))
            .collect()
    });
    Some(ButtonConfig { actions: actions? })
}

fn parse_action(value: &Value, path: &str, v: &mut Validator) -> Option<ActionConfig> {
    let map = v.object(value, path)?;
    v.reject_extra(map, &["mode", "sequence"], path);
    let mode = v.one_of(map, "mode", path, &ScriptMode::CHOICES, "single");

    let sequence_path = join(path, "sequence");
    let mut sequence = Vec::new();
    for (i, step) in v.optional_list(map, "sequence").into_iter().enumerate() {
        if step.is_object() {
            sequence.push(step.clone());
        } else {
            v.error(&join(&sequence_path, i), "expected a dictionary");
        }
    }

    Some(ActionConfig {
        mode: ScriptMode::from_name(&mode?),
        sequence,
    })
}
