//! Settings layering: defaults, settings file, then overrides.

use std::path::PathBuf;

use swm::config::{Settings, SettingsOverrides};
use swm::manager::SwitchManager;
use swm::platform::mock::MockPlatform;

use crate::common::env::{EnvGuard, with_isolated_config};
use crate::common::fixtures::Sandbox;

#[test]
fn settings_file_points_at_sandbox() {
    let sandbox = Sandbox::new();
    let path = sandbox.write_file(
        "swm.toml",
        "data_dir = \"state\"\nbundle_dir = \"bundle\"\nstore_path = \"/tmp/elsewhere.db\"\n",
    );

    let settings = Settings::load(&SettingsOverrides {
        config: Some(path),
        ..Default::default()
    })
    .unwrap();

    // Relative entries resolve against the settings file's directory.
    let root = sandbox.root().canonicalize().unwrap();
    assert_eq!(settings.data_dir, root.join("state"));
    assert_eq!(settings.bundle_dir, root.join("bundle"));
    assert_eq!(settings.store_path, PathBuf::from("/tmp/elsewhere.db"));
    assert_eq!(settings.blueprints_dir, root.join("state").join("blueprints"));
}

#[cfg(target_os = "linux")]
#[test]
fn default_settings_file_is_discovered() {
    let sandbox = Sandbox::new();
    let config_home = sandbox.root().join("config");
    std::fs::create_dir_all(config_home.join("switch-manager")).unwrap();
    std::fs::write(
        config_home.join("switch-manager").join("config.toml"),
        format!("data_dir = \"{}\"\n", sandbox.data_dir().display()),
    )
    .unwrap();

    let _config = with_isolated_config(&config_home.to_string_lossy());
    let settings = Settings::load(&SettingsOverrides::default()).unwrap();
    assert_eq!(settings.data_dir, sandbox.data_dir());
}

#[cfg(target_os = "linux")]
#[test]
fn defaults_follow_the_platform_data_dir() {
    let sandbox = Sandbox::new();
    let data_home = sandbox.root().join("share");
    let config_home = sandbox.root().join("config");
    let _env = EnvGuard::set_all(&[
        ("XDG_CONFIG_HOME", &config_home.to_string_lossy()),
        ("XDG_DATA_HOME", &data_home.to_string_lossy()),
    ]);

    let settings = Settings::load(&SettingsOverrides::default()).unwrap();
    assert_eq!(settings.data_dir, data_home.join("switch-manager"));
    assert_eq!(settings.bundle_dir, data_home.join("switch-manager").join("bundle"));
}

#[tokio::test]
async fn store_path_outside_data_dir_is_created() {
    let sandbox = Sandbox::new();
    let mut settings = sandbox.settings();
    settings.store_path = sandbox.root().join("nested").join("deeper").join("swm.db");

    let manager = SwitchManager::start(settings.clone(), MockPlatform::new())
        .await
        .unwrap();
    drop(manager);
    assert!(settings.store_path.is_file());
}
