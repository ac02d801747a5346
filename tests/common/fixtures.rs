//! Temporary bundle and data directories.
//!
//! A [`Sandbox`] owns a temp dir laid out as:
//!
//! ```text
//! <root>/
//! ├── bundle/
//! │   ├── manifest.json
//! │   └── blueprints/*.yaml
//! └── data/               # store + deployed blueprints, created on startup
//! ```

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use swm::config::Settings;
use tempfile::TempDir;

/// Single-button ZHA remote; button 0 fires on `command: on`.
pub const BASIC_YAML: &str = "\
name: Basic
service: zha
event_type: zha_event
identifier_key: device_ieee
buttons:
  - actions:
      - title: press
        conditions:
          - key: command
            value: 'on'
";

/// Two-button remote, each with a press and a hold action.
pub const DIMMER_YAML: &str = "\
name: Hue Dimmer
service: hue
event_type: hue_event
identifier_key: device_id
buttons:
  - conditions:
      - key: subtype
        value: '1'
    actions:
      - title: press
        conditions:
          - key: type
            value: short_release
      - title: hold
        conditions:
          - key: type
            value: repeat
  - conditions:
      - key: subtype
        value: '2'
    actions:
      - title: press
        conditions:
          - key: type
            value: short_release
      - title: hold
        conditions:
          - key: type
            value: repeat
";

pub struct Sandbox {
    temp: TempDir,
}

impl Sandbox {
    /// Bundle at version `1` carrying `basic` and `hue-dimmer`.
    #[must_use]
    pub fn new() -> Self {
        let sandbox = Self::empty();
        sandbox.write_manifest("1");
        sandbox.write_blueprint("basic", BASIC_YAML);
        sandbox.write_blueprint("hue-dimmer", DIMMER_YAML);
        sandbox
    }

    /// Bundle directory with nothing in it.
    #[must_use]
    pub fn empty() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir_all(temp.path().join("bundle").join("blueprints"))
            .expect("Failed to create bundle dir");
        Self { temp }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    #[must_use]
    pub fn bundle_dir(&self) -> PathBuf {
        self.root().join("bundle")
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root().join("data")
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings::with_data_dir(self.data_dir(), self.bundle_dir())
    }

    pub fn write_manifest(&self, version: &str) {
        std::fs::write(
            self.bundle_dir().join("manifest.json"),
            json!({ "version": version }).to_string(),
        )
        .expect("Failed to write manifest");
    }

    pub fn write_blueprint(&self, id: &str, yaml: &str) {
        std::fs::write(
            self.bundle_dir().join("blueprints").join(format!("{id}.yaml")),
            yaml,
        )
        .expect("Failed to write blueprint");
    }

    /// Writes straight into the deployed directory, bypassing migration.
    pub fn write_deployed_blueprint(&self, id: &str, yaml: &str) {
        let dir = self.settings().blueprints_dir;
        std::fs::create_dir_all(&dir).expect("Failed to create blueprints dir");
        std::fs::write(dir.join(format!("{id}.yaml")), yaml).expect("Failed to write blueprint");
    }

    /// Writes a file under the sandbox root and returns its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, contents).expect("Failed to write file");
        path
    }
}

/// Save-config document for a `basic` switch named Kitchen.
#[must_use]
pub fn kitchen_config(id: Value) -> Value {
    json!({
        "id": id,
        "name": "Kitchen",
        "blueprint": "basic",
        "identifier": "00:11:22",
        "buttons": [
            { "actions": [{ "mode": "single", "sequence": [{ "service": "light.toggle" }] }] }
        ]
    })
}

/// Save-config document for a `hue-dimmer` switch.
#[must_use]
pub fn dimmer_config(name: &str, identifier: &str) -> Value {
    json!({
        "name": name,
        "blueprint": "hue-dimmer",
        "identifier": identifier,
        "buttons": [
            { "actions": [
                { "sequence": [{ "service": "light.turn_on" }] },
                { "mode": "restart", "sequence": [{ "service": "light.brighten" }] }
            ] },
            { "actions": [
                { "sequence": [{ "service": "light.turn_off" }] },
                { "sequence": [] }
            ] }
        ]
    })
}
