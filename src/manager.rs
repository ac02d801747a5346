//! The switch manager: owns the store, blueprint registry and switch
//! registry for the life of the process.
//!
//! Startup order is store load, migration, blueprint load, then switch
//! construction. Every mutation writes the store first and only then
//! touches the in-memory registry, so a failure part-way leaves the store
//! authoritative and a restart rebuilds the registry from it.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::blueprints::{BlueprintRef, BlueprintRegistry, LoadReport};
use crate::bundle::{check_blueprints_folder_exists, deploy_blueprints, load_manifest};
use crate::config::{SaveConfig, Settings};
use crate::error::{Result, SwmError};
use crate::platform::{Platform, PlatformEvent};
use crate::store::SwitchStore;
use crate::switch::ManagedSwitch;

/// Result of reconciling the stored version with the bundled manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// Version changed: blueprints redeployed and the new version stored.
    Migrated {
        from: Option<String>,
        to: String,
        copied: usize,
    },
    /// Version current but the blueprint directory was missing or empty.
    Repaired { copied: usize },
    Unchanged { version: String },
    /// Deploy failed; the stored version was left as is.
    Degraded { reason: String },
}

/// Explicit context for all switch manager operations.
pub struct SwitchManager<P: Platform> {
    settings: Settings,
    store: SwitchStore,
    registry: BlueprintRegistry,
    switches: BTreeMap<String, ManagedSwitch>,
    platform: P,
    last_migration: Option<MigrationOutcome>,
}

impl<P: Platform> SwitchManager<P> {
    /// Opens the store, migrates, loads blueprints and starts every switch.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be read or the manifest is missing.
    /// Blueprint deploy failures only degrade the result.
    #[instrument(skip_all, fields(data_dir = %settings.data_dir.display()))]
    pub async fn start(settings: Settings, platform: P) -> Result<Self> {
        let mut store = SwitchStore::open(&settings.store_path)?;
        store.load()?;

        let mut manager = Self {
            settings,
            store,
            registry: BlueprintRegistry::new(),
            switches: BTreeMap::new(),
            platform,
            last_migration: None,
        };

        let outcome = manager.migrate().await?;
        manager.last_migration = Some(outcome);

        let (registry, _) = BlueprintRegistry::load(&manager.settings.blueprints_dir).await;
        manager.registry = registry;
        manager.init_switches();

        info!(
            blueprints = manager.registry.len(),
            switches = manager.switches.len(),
            "Switch manager started"
        );
        Ok(manager)
    }

    fn init_switches(&mut self) {
        for (id, config) in self.store.get_managed_switches() {
            let mut switch = ManagedSwitch::new(id.clone(), config.clone(), &self.registry);
            if !switch.valid_blueprint() {
                warn!(id = %id, blueprint = %config.blueprint, "Switch references unknown blueprint");
            }
            switch.start(&self.platform);
            self.switches.insert(id.clone(), switch);
        }
    }

    /// Reconciles the stored blueprint version with the bundled manifest.
    ///
    /// Running it again with an unchanged manifest and an intact blueprint
    /// directory does nothing.
    ///
    /// # Errors
    ///
    /// Fails if the manifest is unreadable or the new version cannot be
    /// stored.
    #[instrument(skip(self))]
    pub async fn migrate(&mut self) -> Result<MigrationOutcome> {
        let manifest = load_manifest(&self.settings.bundle_dir).await?;
        let version = manifest.version();
        let bundle_dir = &self.settings.bundle_dir;
        let blueprints_dir = &self.settings.blueprints_dir;

        if !self.store.compare_version(version) {
            let from = self.store.schema_version().map(str::to_string);
            info!(from = ?from, to = version, "Blueprint version changed, redeploying");
            return match deploy_blueprints(bundle_dir, blueprints_dir).await {
                Ok(copied) => {
                    self.store.update_version(version)?;
                    Ok(MigrationOutcome::Migrated {
                        from,
                        to: version.to_string(),
                        copied,
                    })
                }
                Err(e) => {
                    error!(error = %e, "Blueprint deploy failed, keeping stored version");
                    Ok(MigrationOutcome::Degraded {
                        reason: e.to_string(),
                    })
                }
            };
        }

        if !check_blueprints_folder_exists(blueprints_dir).await {
            warn!("Blueprint directory missing or empty, redeploying");
            return match deploy_blueprints(bundle_dir, blueprints_dir).await {
                Ok(copied) => Ok(MigrationOutcome::Repaired { copied }),
                Err(e) => {
                    error!(error = %e, "Blueprint repair failed");
                    Ok(MigrationOutcome::Degraded {
                        reason: e.to_string(),
                    })
                }
            };
        }

        debug!(version, "Blueprints up to date");
        Ok(MigrationOutcome::Unchanged {
            version: version.to_string(),
        })
    }

    /// Rebuilds the blueprint registry from disk and rebinds every switch.
    #[instrument(skip(self))]
    pub async fn reload_blueprints(&mut self) -> LoadReport {
        let (registry, report) = BlueprintRegistry::load(&self.settings.blueprints_dir).await;
        self.registry = registry;
        for switch in self.switches.values_mut() {
            switch.resolve_blueprint(&self.registry);
            switch.start(&self.platform);
        }
        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            "Blueprints reloaded"
        );
        report
    }

    // === Queries ===

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn platform(&self) -> &P {
        &self.platform
    }

    /// Outcome of the migration run during startup.
    pub const fn last_migration(&self) -> Option<&MigrationOutcome> {
        self.last_migration.as_ref()
    }

    /// Blueprint version currently recorded in the store.
    pub fn stored_version(&self) -> Option<&str> {
        self.store.schema_version()
    }

    pub const fn blueprints(&self) -> &BlueprintRegistry {
        &self.registry
    }

    pub fn blueprint(&self, id: &str) -> BlueprintRef {
        self.registry.get(id)
    }

    pub fn switch(&self, id: &str) -> Option<&ManagedSwitch> {
        self.switches.get(id)
    }

    pub fn switches(&self) -> impl Iterator<Item = &ManagedSwitch> {
        self.switches.values()
    }

    // === Mutations ===

    /// Creates a switch (no id) or updates an existing one. On update,
    /// pass-through keys missing from `save` keep their stored values.
    ///
    /// # Errors
    ///
    /// Returns [`SwmError::SwitchNotFound`] when updating an unknown id, or
    /// a storage error if the write fails. Nothing changes on error.
    #[instrument(skip(self, save), fields(id = ?save.id, name = %save.config.name))]
    pub fn save_config(&mut self, save: SaveConfig) -> Result<&ManagedSwitch> {
        let id = match save.id {
            Some(id) if !self.switches.contains_key(&id) => {
                return Err(SwmError::SwitchNotFound { id });
            }
            Some(id) => id,
            None => self.store.get_available_id()?,
        };

        let mut config = save.config;
        if let Some(existing) = self.switches.get(&id) {
            let mut extra = existing.extra().clone();
            extra.extend(std::mem::take(&mut config.extra));
            config.extra = extra;
        }

        self.store.set_managed_switch(&id, &config)?;

        if let Some(switch) = self.switches.get_mut(&id) {
            switch.update(config, &self.registry, &self.platform);
            info!(id = %id, "Switch updated");
        } else {
            let mut switch = ManagedSwitch::new(id.clone(), config, &self.registry);
            switch.start(&self.platform);
            self.switches.insert(id.clone(), switch);
            info!(id = %id, "Switch created");
        }

        self.switches
            .get(&id)
            .ok_or(SwmError::SwitchNotFound { id })
    }

    /// Persists the enabled flag and rebinds the switch.
    ///
    /// # Errors
    ///
    /// Returns [`SwmError::SwitchNotFound`] for unknown ids, or a storage
    /// error if the write fails.
    #[instrument(skip(self))]
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<&ManagedSwitch> {
        let Some(switch) = self.switches.get_mut(id) else {
            return Err(SwmError::SwitchNotFound { id: id.to_string() });
        };

        let mut config = switch.to_config();
        config.enabled = enabled;
        self.store.set_managed_switch(id, &config)?;

        switch.set_enabled(enabled);
        switch.start(&self.platform);
        info!(id, enabled, "Switch toggled");
        Ok(switch)
    }

    /// Stops and removes a switch.
    ///
    /// # Errors
    ///
    /// Returns [`SwmError::SwitchNotFound`] for unknown ids, or a storage
    /// error if the delete fails.
    #[instrument(skip(self))]
    pub fn delete_config(&mut self, id: &str) -> Result<()> {
        if !self.switches.contains_key(id) {
            return Err(SwmError::SwitchNotFound { id: id.to_string() });
        }

        self.store.delete_managed_switch(id)?;

        if let Some(mut switch) = self.switches.remove(id) {
            switch.stop(&self.platform);
        }
        info!(id, "Switch deleted");
        Ok(())
    }

    // === Runtime ===

    /// Feeds a platform event to every bound switch and runs the matched
    /// actions. Returns the number of actions handed to the platform.
    #[instrument(skip_all, fields(event_type = %event.event_type))]
    pub fn dispatch_event(&self, event: &PlatformEvent) -> usize {
        let mut ran = 0;
        let listening = self
            .switches
            .values()
            .filter(|s| s.listening_for() == Some(event.event_type.as_str()));

        for switch in listening {
            for run in switch.matching_actions(event) {
                match self.platform.run_action(&run) {
                    Ok(()) => ran += 1,
                    Err(e) => error!(
                        switch_id = %run.switch_id,
                        button = run.button,
                        action = run.action,
                        error = %e,
                        "Switch action failed"
                    ),
                }
            }
        }

        debug!(ran, "Event dispatched");
        ran
    }

    /// Stops every switch binding.
    pub fn shutdown(&mut self) {
        for switch in self.switches.values_mut() {
            switch.stop(&self.platform);
        }
        info!(switches = self.switches.len(), "Switch manager stopped");
    }
}
