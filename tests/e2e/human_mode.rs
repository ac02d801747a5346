//! Human mode: styled text on stdout, errors and hints on stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

use crate::common::fixtures::{Sandbox, kitchen_config};

fn swm(sandbox: &Sandbox) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_swm"));
    cmd.env("SWM_DATA_DIR", sandbox.data_dir())
        .env("SWM_BUNDLE_DIR", sandbox.bundle_dir())
        .env("XDG_CONFIG_HOME", sandbox.root().join("config"))
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "off")
        .env_remove("SWM_FORMAT")
        .env_remove("SWM_CONFIG");
    cmd
}

#[test]
fn no_args_prints_quick_start() {
    let sandbox = Sandbox::new();
    swm(&sandbox)
        .assert()
        .success()
        .stdout(predicate::str::contains("QUICK START"))
        .stdout(predicate::str::contains("swm session"));
}

#[test]
fn no_color_env_values_are_accepted() {
    let sandbox = Sandbox::new();
    for value in ["1", "true", "yes", "0"] {
        swm(&sandbox)
            .env("NO_COLOR", value)
            .arg("configs")
            .assert()
            .success()
            .stderr(predicate::str::contains("invalid value").not());
    }
}

#[test]
fn migrate_then_up_to_date() {
    let sandbox = Sandbox::new();
    swm(&sandbox)
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Migrated blueprints none -> 1 (2 files)"));
    swm(&sandbox)
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Blueprints up to date (version 1)"));
}

#[test]
fn blueprint_listing_shows_names() {
    let sandbox = Sandbox::new();
    swm(&sandbox)
        .arg("blueprints")
        .assert()
        .success()
        .stdout(predicate::str::contains("Blueprints:"))
        .stdout(predicate::str::contains("Hue Dimmer"))
        .stdout(predicate::str::contains("(zha_event, 1 buttons)"));
}

#[test]
fn empty_switch_list() {
    let sandbox = Sandbox::new();
    swm(&sandbox)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("No switches configured"));
}

#[test]
fn save_and_show_switch() {
    let sandbox = Sandbox::new();
    let path = sandbox.write_file("kitchen.json", &kitchen_config(Value::Null).to_string());

    swm(&sandbox)
        .arg("save")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Saved switch 1 (Kitchen)"));

    swm(&sandbox)
        .args(["configs", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kitchen"))
        .stdout(predicate::str::contains("bound"));

    swm(&sandbox)
        .args(["disable", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Switch 1 disabled"));
}

#[test]
fn unknown_switch_prints_hint() {
    let sandbox = Sandbox::new();
    swm(&sandbox)
        .args(["delete", "7"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("[ERR] Switch config not found: 7"))
        .stderr(predicate::str::contains("Hint: Run: swm configs"));
}

#[test]
fn bad_event_data_is_rejected() {
    let sandbox = Sandbox::new();
    swm(&sandbox)
        .args(["fire", "zha_event", "[1, 2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("event data must be a JSON object"));
}
