//! Request messages and their validation.

use serde_json::{Map, Value};

use crate::config::SaveConfig;
use crate::config::validate::{Validator, absorb, coerce_string};
use crate::error::{Result, SwmError};
use crate::platform::PlatformEvent;

pub const LIST_BLUEPRINTS: &str = "switch_manager/blueprints";
pub const RELOAD_BLUEPRINTS: &str = "switch_manager/blueprints/reload";
pub const LIST_CONFIGS: &str = "switch_manager/configs";
pub const SAVE_CONFIG: &str = "switch_manager/config/save";
pub const SET_ENABLED: &str = "switch_manager/config/enabled";
pub const DELETE_CONFIG: &str = "switch_manager/config/delete";
pub const FIRE_EVENT: &str = "switch_manager/event";

/// All request types understood by the dispatcher.
pub const REQUEST_TYPES: [&str; 7] = [
    LIST_BLUEPRINTS,
    RELOAD_BLUEPRINTS,
    LIST_CONFIGS,
    SAVE_CONFIG,
    SET_ENABLED,
    DELETE_CONFIG,
    FIRE_EVENT,
];

/// A validated request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListBlueprints { blueprint_id: Option<String> },
    ReloadBlueprints,
    ListConfigs { config_id: Option<String> },
    SaveConfig(SaveConfig),
    SetEnabled { config_id: String, enabled: bool },
    DeleteConfig { config_id: String },
    FireEvent(PlatformEvent),
}

impl Request {
    /// Wire `type` of this request.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ListBlueprints { .. } => LIST_BLUEPRINTS,
            Self::ReloadBlueprints => RELOAD_BLUEPRINTS,
            Self::ListConfigs { .. } => LIST_CONFIGS,
            Self::SaveConfig(_) => SAVE_CONFIG,
            Self::SetEnabled { .. } => SET_ENABLED,
            Self::DeleteConfig { .. } => DELETE_CONFIG,
            Self::FireEvent(_) => FIRE_EVENT,
        }
    }

    /// Validates a raw message. The `id` correlation field is accepted on
    /// every request and otherwise ignored here.
    pub fn from_message(message: &Value) -> Result<Self> {
        let Value::Object(map) = message else {
            return Err(SwmError::InvalidRequest("expected a JSON object".into()));
        };
        let kind = match map.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            Some(_) => return Err(SwmError::InvalidRequest("type must be a string".into())),
            None => return Err(SwmError::InvalidRequest("missing type".into())),
        };

        let mut v = Validator::new();
        let request = match kind {
            LIST_BLUEPRINTS => {
                v.reject_extra(map, &["id", "type", "blueprint_id"], "");
                Some(Self::ListBlueprints {
                    blueprint_id: optional_id(map, "blueprint_id", &mut v),
                })
            }
            RELOAD_BLUEPRINTS => {
                v.reject_extra(map, &["id", "type"], "");
                Some(Self::ReloadBlueprints)
            }
            LIST_CONFIGS => {
                v.reject_extra(map, &["id", "type", "config_id"], "");
                Some(Self::ListConfigs {
                    config_id: optional_id(map, "config_id", &mut v),
                })
            }
            SAVE_CONFIG => {
                v.reject_extra(map, &["id", "type", "config"], "");
                match map.get("config") {
                    Some(config) => match SaveConfig::from_document(config) {
                        Ok(save) => Some(Self::SaveConfig(save)),
                        Err(e) => {
                            absorb(&mut v, "config", e);
                            None
                        }
                    },
                    None => {
                        v.error("config", "required key not provided");
                        None
                    }
                }
            }
            SET_ENABLED => {
                v.reject_extra(map, &["id", "type", "config_id", "enabled"], "");
                let config_id = required_id(map, "config_id", &mut v);
                let enabled = v.required_bool(map, "enabled", "");
                match (config_id, enabled) {
                    (Some(config_id), Some(enabled)) => Some(Self::SetEnabled { config_id, enabled }),
                    _ => None,
                }
            }
            DELETE_CONFIG => {
                v.reject_extra(map, &["id", "type", "config_id"], "");
                required_id(map, "config_id", &mut v).map(|config_id| Self::DeleteConfig { config_id })
            }
            FIRE_EVENT => {
                v.reject_extra(map, &["id", "type", "event_type", "data"], "");
                let event_type = v.required_string(map, "event_type", "");
                let data = match map.get("data") {
                    None | Some(Value::Null) => Some(Map::new()),
                    Some(value) => v.object(value, "data").cloned(),
                };
                match (event_type, data) {
                    (Some(event_type), Some(data)) => Some(Self::FireEvent(PlatformEvent::new(event_type, data))),
                    _ => None,
                }
            }
            other => return Err(SwmError::UnknownCommand(other.to_string())),
        };

        v.finish(format!("request ({kind})"), request)
    }
}

/// Switch or blueprint id given as a string or integer.
fn id_value(value: &Value, field: &str, v: &mut Validator) -> Option<String> {
    match value {
        Value::String(_) | Value::Number(_) => coerce_string(value),
        _ => {
            v.error(field, "expected str");
            None
        }
    }
}

fn optional_id(map: &Map<String, Value>, key: &str, v: &mut Validator) -> Option<String> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => id_value(value, key, v).filter(|id| !id.is_empty()),
    }
}

fn required_id(map: &Map<String, Value>, key: &str, v: &mut Validator) -> Option<String> {
    match map.get(key) {
        Some(value) => id_value(value, key, v),
        None => {
            v.error(key, "required key not provided");
            None
        }
    }
}
