//! Message-based command interface.
//!
//! Each message is a JSON object with a `type` discriminator and an `id`
//! used to correlate the response:
//!
//! ```json
//! {"id": 3, "type": "switch_manager/config/enabled", "config_id": "1", "enabled": false}
//! ```
//!
//! answered with either
//!
//! ```json
//! {"id": 3, "type": "result", "success": true, "result": {"switch_id": "1", "enabled": false}}
//! {"id": 3, "type": "result", "success": false, "error": {"code": "not_found", "message": "..."}}
//! ```
//!
//! This is the only layer that turns [`SwmError`] into wire errors.

mod request;

pub use request::{
    DELETE_CONFIG, FIRE_EVENT, LIST_BLUEPRINTS, LIST_CONFIGS, RELOAD_BLUEPRINTS, REQUEST_TYPES,
    Request, SAVE_CONFIG, SET_ENABLED,
};

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::error::{Result, ResultExt, SwmError};
use crate::manager::SwitchManager;
use crate::platform::Platform;

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).with_context(|| "Failed to serialize result")
}

/// Executes a validated request against the manager.
///
/// # Errors
///
/// Returns not-found for unknown switch ids on toggle, delete and update,
/// and storage errors from failed writes.
pub async fn execute<P: Platform>(manager: &mut SwitchManager<P>, request: Request) -> Result<Value> {
    match request {
        Request::ListBlueprints {
            blueprint_id: Some(id),
        } => Ok(json!({ "blueprint": to_json(manager.blueprint(&id))? })),
        Request::ListBlueprints { blueprint_id: None } => {
            Ok(json!({ "blueprints": to_json(manager.blueprints())? }))
        }
        Request::ReloadBlueprints => {
            let report = manager.reload_blueprints().await;
            Ok(json!({
                "blueprints": report.loaded.len(),
                "skipped": report.skipped,
            }))
        }
        Request::ListConfigs { config_id: Some(id) } => {
            let config = match manager.switch(&id) {
                Some(switch) => to_json(switch.view())?,
                None => Value::Null,
            };
            Ok(json!({ "config": config }))
        }
        Request::ListConfigs { config_id: None } => {
            let mut configs = Map::new();
            for switch in manager.switches() {
                configs.insert(switch.id().to_string(), to_json(switch.view())?);
            }
            Ok(json!({ "configs": configs }))
        }
        Request::SaveConfig(save) => {
            let switch = manager.save_config(save)?;
            Ok(json!({
                "config_id": switch.id(),
                "config": to_json(switch.view())?,
            }))
        }
        Request::SetEnabled { config_id, enabled } => {
            let switch = manager.set_enabled(&config_id, enabled)?;
            Ok(json!({ "switch_id": switch.id(), "enabled": switch.enabled() }))
        }
        Request::DeleteConfig { config_id } => {
            manager.delete_config(&config_id)?;
            Ok(json!({ "deleted": config_id }))
        }
        Request::FireEvent(event) => Ok(json!({ "actions_run": manager.dispatch_event(&event) })),
    }
}

/// Success response envelope.
pub fn success(id: Value, result: Value) -> Value {
    json!({ "id": id, "type": "result", "success": true, "result": result })
}

/// Error response envelope.
pub fn failure(id: Value, error: &SwmError) -> Value {
    json!({
        "id": id,
        "type": "result",
        "success": false,
        "error": { "code": error.code(), "message": error.to_string() },
    })
}

/// Handles one raw message end to end, always producing a response.
pub async fn dispatch<P: Platform>(manager: &mut SwitchManager<P>, message: &Value) -> Value {
    let id = message.get("id").cloned().unwrap_or(Value::Null);

    let outcome = match Request::from_message(message) {
        Ok(request) => {
            debug!(kind = request.kind(), id = %id, "Handling request");
            execute(manager, request).await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => success(id, result),
        Err(e) => {
            warn!(id = %id, code = e.code(), error = %e, "Request failed");
            failure(id, &e)
        }
    }
}
