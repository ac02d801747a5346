//! Request/response flows through the command dispatcher.

use serde_json::{Value, json};
use swm::command::{self, REQUEST_TYPES};
use swm::manager::SwitchManager;
use swm::platform::mock::{MockPlatform, Operation};

use crate::common::fixtures::{Sandbox, dimmer_config, kitchen_config};

async fn start(sandbox: &Sandbox) -> SwitchManager<MockPlatform> {
    SwitchManager::start(sandbox.settings(), MockPlatform::new())
        .await
        .expect("manager should start")
}

/// Sends one message and returns the `result` of a successful response.
async fn ok(manager: &mut SwitchManager<MockPlatform>, message: Value) -> Value {
    let response = command::dispatch(manager, &message).await;
    assert_eq!(response["type"], "result");
    assert_eq!(response["success"], true, "request failed: {response}");
    response["result"].clone()
}

/// Sends one message and returns the error code of a failed response.
async fn err(manager: &mut SwitchManager<MockPlatform>, message: Value) -> String {
    let response = command::dispatch(manager, &message).await;
    assert_eq!(response["success"], false, "request succeeded: {response}");
    assert!(response["error"]["message"].is_string());
    response["error"]["code"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn full_switch_lifecycle() {
    let sandbox = Sandbox::new();
    let mut manager = start(&sandbox).await;

    let saved = ok(
        &mut manager,
        json!({ "id": 1, "type": "switch_manager/config/save", "config": kitchen_config(Value::Null) }),
    )
    .await;
    let id = saved["config_id"].as_str().unwrap().to_string();
    assert_eq!(saved["config"]["state"], "bound");
    assert_eq!(saved["config"]["blueprint"]["id"], "basic");

    let listed = ok(&mut manager, json!({ "id": 2, "type": "switch_manager/configs" })).await;
    assert_eq!(listed["configs"].as_object().unwrap().len(), 1);
    assert_eq!(listed["configs"][&id]["name"], "Kitchen");

    let toggled = ok(
        &mut manager,
        json!({ "id": 3, "type": "switch_manager/config/enabled", "config_id": id, "enabled": false }),
    )
    .await;
    assert_eq!(toggled, json!({ "switch_id": id, "enabled": false }));
    assert_eq!(manager.platform().active_listener_count(), 0);

    let single = ok(
        &mut manager,
        json!({ "id": 4, "type": "switch_manager/configs", "config_id": id }),
    )
    .await;
    assert_eq!(single["config"]["enabled"], false);
    assert_eq!(single["config"]["state"], "unbound");

    let deleted = ok(
        &mut manager,
        json!({ "id": 5, "type": "switch_manager/config/delete", "config_id": id }),
    )
    .await;
    assert_eq!(deleted["deleted"], id);

    let code = err(
        &mut manager,
        json!({ "id": 6, "type": "switch_manager/config/delete", "config_id": id }),
    )
    .await;
    assert_eq!(code, "not_found");
}

#[tokio::test]
async fn update_rebinds_listener() {
    let sandbox = Sandbox::new();
    let mut manager = start(&sandbox).await;

    let saved = ok(
        &mut manager,
        json!({ "type": "switch_manager/config/save", "config": kitchen_config(Value::Null) }),
    )
    .await;
    let id = saved["config_id"].clone();
    manager.platform().clear_operations();

    let mut update = dimmer_config("Hall", "hue-1");
    update["id"] = id.clone();
    let updated = ok(
        &mut manager,
        json!({ "type": "switch_manager/config/save", "config": update }),
    )
    .await;

    assert_eq!(updated["config_id"], id);
    assert_eq!(updated["config"]["name"], "Hall");
    let ops = manager.platform().operations();
    assert_eq!(ops.len(), 2);
    assert!(matches!(ops[0], Operation::Unlisten { .. }));
    assert!(matches!(&ops[1], Operation::Listen { event_type, .. } if event_type == "hue_event"));
}

#[tokio::test]
async fn integer_ids_are_accepted() {
    let sandbox = Sandbox::new();
    let mut manager = start(&sandbox).await;

    ok(
        &mut manager,
        json!({ "type": "switch_manager/config/save", "config": kitchen_config(Value::Null) }),
    )
    .await;
    let toggled = ok(
        &mut manager,
        json!({ "type": "switch_manager/config/enabled", "config_id": 1, "enabled": false }),
    )
    .await;
    assert_eq!(toggled["switch_id"], "1");
}

#[tokio::test]
async fn blueprint_queries() {
    let sandbox = Sandbox::new();
    let mut manager = start(&sandbox).await;

    let all = ok(&mut manager, json!({ "type": "switch_manager/blueprints" })).await;
    let ids: Vec<_> = all["blueprints"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(ids, vec!["basic".to_string(), "hue-dimmer".to_string()]);

    let one = ok(
        &mut manager,
        json!({ "type": "switch_manager/blueprints", "blueprint_id": "hue-dimmer" }),
    )
    .await;
    assert_eq!(one["blueprint"]["name"], "Hue Dimmer");
    assert_eq!(one["blueprint"]["buttons"].as_array().unwrap().len(), 2);

    let reloaded = ok(&mut manager, json!({ "type": "switch_manager/blueprints/reload" })).await;
    assert_eq!(reloaded, json!({ "blueprints": 2, "skipped": [] }));
}

#[tokio::test]
async fn unresolved_blueprint_is_reported() {
    let sandbox = Sandbox::new();
    let mut manager = start(&sandbox).await;

    let mut doc = kitchen_config(Value::Null);
    doc["blueprint"] = json!("gone");
    let saved = ok(
        &mut manager,
        json!({ "type": "switch_manager/config/save", "config": doc }),
    )
    .await;

    assert_eq!(saved["config"]["blueprint"], "gone");
    assert_eq!(saved["config"]["valid_blueprint"], false);
    assert_eq!(saved["config"]["state"], "unbound");
    manager.platform().assert_no_operations();
}

#[tokio::test]
async fn invalid_requests_are_rejected_without_side_effects() {
    let sandbox = Sandbox::new();
    let mut manager = start(&sandbox).await;

    let cases = [
        json!({ "type": "switch_manager/config/save" }),
        json!({ "type": "switch_manager/config/save", "config": { "name": "No blueprint" } }),
        json!({ "type": "switch_manager/config/enabled", "config_id": "1" }),
        json!({ "type": "switch_manager/config/enabled", "config_id": "1", "enabled": "yes" }),
        json!({ "type": "switch_manager/config/delete" }),
        json!({ "type": "switch_manager/configs", "bogus": true }),
        json!({ "type": 7 }),
        json!("not an object"),
    ];
    for message in cases {
        assert_eq!(err(&mut manager, message.clone()).await, "invalid_format", "{message}");
    }

    assert_eq!(
        err(&mut manager, json!({ "type": "switch_manager/nope" })).await,
        "unknown_command"
    );
    assert_eq!(manager.switches().count(), 0);
    manager.platform().assert_no_operations();
}

#[tokio::test]
async fn response_echoes_request_id() {
    let sandbox = Sandbox::new();
    let mut manager = start(&sandbox).await;

    let ok_response =
        command::dispatch(&mut manager, &json!({ "id": "abc", "type": "switch_manager/configs" })).await;
    assert_eq!(ok_response["id"], "abc");

    let err_response = command::dispatch(
        &mut manager,
        &json!({ "id": 99, "type": "switch_manager/config/delete", "config_id": "5" }),
    )
    .await;
    assert_eq!(err_response["id"], 99);
    assert_eq!(err_response["error"]["code"], "not_found");

    let no_id = command::dispatch(&mut manager, &json!({ "type": "switch_manager/configs" })).await;
    assert_eq!(no_id["id"], Value::Null);
}

#[tokio::test]
async fn extras_cannot_mask_an_unbound_switch() {
    let sandbox = Sandbox::new();
    let mut manager = start(&sandbox).await;

    let mut config = kitchen_config(Value::Null);
    config["blueprint"] = json!("ghost");
    config["enabled"] = json!(false);
    config["state"] = json!("bound");
    config["valid_blueprint"] = json!(true);
    config["is_mismatch"] = json!(true);

    let saved = ok(&mut manager, json!({ "id": 1, "type": "switch_manager/config/save", "config": config })).await;
    let id = saved["config_id"].as_str().unwrap().to_string();
    assert_eq!(saved["config"]["state"], "unbound");
    assert_eq!(saved["config"]["valid_blueprint"], false);
    assert_eq!(saved["config"]["is_mismatch"], false);

    let listed = ok(&mut manager, json!({ "id": 2, "type": "switch_manager/configs" })).await;
    assert_eq!(listed["configs"][&id]["state"], "unbound");
    assert_eq!(listed["configs"][&id]["valid_blueprint"], false);
}

#[tokio::test]
async fn update_without_extras_keeps_stored_extras() {
    let sandbox = Sandbox::new();
    let mut manager = start(&sandbox).await;

    let mut config = kitchen_config(Value::Null);
    config["variables"] = json!({ "room": "k" });
    let saved = ok(&mut manager, json!({ "id": 1, "type": "switch_manager/config/save", "config": config })).await;
    let id = saved["config_id"].as_str().unwrap().to_string();

    let mut update = kitchen_config(json!(id));
    update["name"] = json!("Kitchen Island");
    let updated = ok(&mut manager, json!({ "id": 2, "type": "switch_manager/config/save", "config": update })).await;
    assert_eq!(updated["config"]["name"], "Kitchen Island");
    assert_eq!(updated["config"]["variables"], json!({ "room": "k" }));
    drop(manager);

    let mut manager = start(&sandbox).await;
    let listed = ok(&mut manager, json!({ "id": 3, "type": "switch_manager/configs", "config_id": id })).await;
    assert_eq!(listed["config"]["variables"]["room"], "k");
}

#[test]
fn every_request_type_is_namespaced() {
    for kind in REQUEST_TYPES {
        assert!(kind.starts_with("switch_manager/"), "{kind}");
    }
}
