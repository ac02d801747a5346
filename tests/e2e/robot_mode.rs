//! Robot mode: every subcommand prints parseable JSON.

use serde_json::{Value, json};

use crate::common::cli::CliRunner;
use crate::common::fixtures::{Sandbox, dimmer_config, kitchen_config};

fn save(cli: &CliRunner, sandbox: &Sandbox, doc: &Value) -> Value {
    let path = sandbox.write_file("switch.json", &doc.to_string());
    let result = cli.run_robot(&["save", &path.to_string_lossy()]);
    result.assert_success();
    result.json()
}

#[test]
fn quick_start_lists_commands_and_protocol() {
    let sandbox = Sandbox::new();
    let json = CliRunner::new(&sandbox).run_robot(&[]).json();

    assert_eq!(json["tool"], "swm");
    assert!(json["commands"].as_array().is_some_and(|c| !c.is_empty()));
    assert!(
        json["protocol"]
            .as_array()
            .unwrap()
            .contains(&json!("switch_manager/config/save"))
    );
}

#[test]
fn version_reports_package_version() {
    let sandbox = Sandbox::new();
    let json = CliRunner::new(&sandbox).run_robot(&["version"]).json();
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn migrate_reports_outcome() {
    let sandbox = Sandbox::new();
    let cli = CliRunner::new(&sandbox);

    let first = cli.run_robot(&["migrate"]);
    first.assert_success();
    let first = first.json();
    assert_eq!(first["migration"]["outcome"], "migrated");
    assert_eq!(first["migration"]["to"], "1");
    assert_eq!(first["migration"]["copied"], 2);
    assert_eq!(first["stored_version"], "1");

    let second = cli.run_robot(&["migrate"]).json();
    assert_eq!(second["migration"]["outcome"], "unchanged");
}

#[test]
fn blueprints_list_and_detail() {
    let sandbox = Sandbox::new();
    let cli = CliRunner::new(&sandbox);

    let all = cli.run_robot(&["blueprints"]).json();
    assert!(all["blueprints"]["basic"].is_object());
    assert!(all["blueprints"]["hue-dimmer"].is_object());

    let one = cli.run_robot(&["blueprints", "basic"]).json();
    assert_eq!(one["blueprint"]["event_type"], "zha_event");
}

#[test]
fn switch_lifecycle_across_invocations() {
    let sandbox = Sandbox::new();
    let cli = CliRunner::new(&sandbox);

    let saved = save(&cli, &sandbox, &kitchen_config(Value::Null));
    let id = saved["config_id"].as_str().unwrap().to_string();

    let listed = cli.run_robot(&["configs"]).json();
    assert_eq!(listed["configs"][&id]["name"], "Kitchen");

    let disabled = cli.run_robot(&["disable", &id]).json();
    assert_eq!(disabled, json!({ "switch_id": id, "enabled": false }));

    let shown = cli.run_robot(&["configs", &id]).json();
    assert_eq!(shown["config"]["enabled"], false);

    cli.run_robot(&["enable", &id]).assert_success();
    let deleted = cli.run_robot(&["rm", &id]).json();
    assert_eq!(deleted["deleted"], id);

    let listed = cli.run_robot(&["configs"]).json();
    assert_eq!(listed["configs"], json!({}));
}

#[test]
fn save_reads_yaml_from_stdin() {
    let sandbox = Sandbox::new();
    let yaml = "\
name: Porch
blueprint: basic
identifier: aa:bb
buttons:
  - actions:
      - sequence:
          - service: light.toggle
";
    let result = CliRunner::new(&sandbox)
        .with_stdin(yaml)
        .run_robot(&["save", "-"]);
    result.assert_success();
    assert_eq!(result.json()["config"]["name"], "Porch");
}

#[test]
fn fire_runs_matching_actions() {
    let sandbox = Sandbox::new();
    let cli = CliRunner::new(&sandbox);
    save(&cli, &sandbox, &dimmer_config("Hall", "hue-1"));

    let hit = cli
        .run_robot(&[
            "fire",
            "hue_event",
            r#"{"device_id": "hue-1", "subtype": 1, "type": "short_release"}"#,
        ])
        .json();
    assert_eq!(hit["actions_run"], 1);

    let miss = cli
        .run_robot(&["fire", "hue_event", r#"{"device_id": "hue-9"}"#])
        .json();
    assert_eq!(miss["actions_run"], 0);
}

#[test]
fn not_found_is_a_json_error() {
    let sandbox = Sandbox::new();
    let result = CliRunner::new(&sandbox).run_robot(&["disable", "404"]);

    result.assert_failure();
    assert_eq!(result.exit_code, 1);
    let error = result.stderr_json();
    assert_eq!(error["error"], true);
    assert_eq!(error["code"], "not_found");
    assert!(error["message"].as_str().unwrap().contains("404"));
}

#[test]
fn invalid_document_reports_every_field() {
    let sandbox = Sandbox::new();
    let path = sandbox.write_file("bad.json", r#"{"name": 5, "buttons": "x"}"#);
    let result = CliRunner::new(&sandbox).run_robot(&["save", &path.to_string_lossy()]);

    result.assert_failure();
    let error = result.stderr_json();
    assert_eq!(error["code"], "invalid_format");
}

#[test]
fn missing_manifest_fails() {
    let sandbox = Sandbox::empty();
    let result = CliRunner::new(&sandbox).run_robot(&["configs"]);
    result.assert_failure();
    assert_eq!(result.stderr_json()["code"], "manifest_error");
}

#[test]
fn format_env_var_selects_compact_json() {
    let sandbox = Sandbox::new();
    let result = CliRunner::new(&sandbox)
        .with_env("SWM_FORMAT", "json-compact")
        .run(&["blueprints"]);
    result.assert_success();
    assert_eq!(result.stdout.trim().lines().count(), 1);
    assert!(result.json()["blueprints"].is_object());
}

#[test]
fn settings_show_resolved_paths() {
    let sandbox = Sandbox::new();
    let json = CliRunner::new(&sandbox).run_robot(&["settings"]).json();
    assert_eq!(
        json["data_dir"],
        sandbox.data_dir().to_str().unwrap()
    );
    assert_eq!(
        json["bundle_dir"],
        sandbox.bundle_dir().to_str().unwrap()
    );
}
