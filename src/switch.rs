//! Managed switch instances and their event bindings.
//!
//! A [`ManagedSwitch`] pairs a saved [`SwitchConfig`] with its resolved
//! blueprint and, while running, a platform listener for the blueprint's
//! event type.
//!
//! Enabling is two-phase: [`ManagedSwitch::set_enabled`] only
//! flips the flag and [`ManagedSwitch::start`] applies it.
//! [`ManagedSwitch::set_enabled_and_apply`] does both.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};
use tracing::{debug, trace};

use crate::blueprints::{BlueprintRef, BlueprintRegistry};
use crate::config::validate::coerce_string;
use crate::config::{ButtonConfig, SwitchConfig, conditions_match, is_reserved_key};
use crate::platform::{ActionRun, ListenerId, Platform, PlatformEvent};

/// Runtime binding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    Unbound,
    Bound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Unbound,
    Bound(ListenerId),
}

/// A configured switch and its runtime binding.
#[derive(Debug)]
pub struct ManagedSwitch {
    id: String,
    name: String,
    enabled: bool,
    blueprint: BlueprintRef,
    identifier: String,
    buttons: Vec<ButtonConfig>,
    extra: Map<String, Value>,
    binding: Binding,
}

/// Serializable snapshot of a switch for listings.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchView<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub enabled: bool,
    /// Blueprint object when resolved, raw id otherwise.
    pub blueprint: &'a BlueprintRef,
    pub identifier: &'a str,
    pub buttons: &'a [ButtonConfig],
    pub valid_blueprint: bool,
    pub is_mismatch: bool,
    pub state: SwitchState,
    #[serde(flatten)]
    pub extra: PassThrough<'a>,
}

/// Pass-through config keys, minus any that would shadow a view field.
#[derive(Debug, Clone, Copy)]
pub struct PassThrough<'a>(pub &'a Map<String, Value>);

impl Serialize for PassThrough<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().filter(|(key, _)| !is_reserved_key(key)))
    }
}

impl ManagedSwitch {
    /// Builds an unbound switch, resolving its blueprint against `registry`.
    pub fn new(id: impl Into<String>, config: SwitchConfig, registry: &BlueprintRegistry) -> Self {
        let blueprint = registry.get(&config.blueprint);
        Self {
            id: id.into(),
            name: config.name,
            enabled: config.enabled,
            blueprint,
            identifier: config.identifier,
            buttons: config.buttons,
            extra: config.extra,
            binding: Binding::Unbound,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Pass-through config keys.
    pub const fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub const fn blueprint(&self) -> &BlueprintRef {
        &self.blueprint
    }

    pub const fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound(_))
    }

    pub const fn state(&self) -> SwitchState {
        match self.binding {
            Binding::Bound(_) => SwitchState::Bound,
            Binding::Unbound => SwitchState::Unbound,
        }
    }

    pub const fn valid_blueprint(&self) -> bool {
        self.blueprint.is_resolved()
    }

    /// True when the configured buttons or actions do not line up with the
    /// blueprint layout. Unresolved blueprints never report a mismatch.
    pub fn is_mismatch(&self) -> bool {
        let Some(bp) = self.blueprint.blueprint() else {
            return false;
        };
        self.buttons.len() != bp.buttons.len()
            || self
                .buttons
                .iter()
                .zip(&bp.buttons)
                .any(|(cfg, layout)| cfg.actions.len() > layout.actions.len())
    }

    /// Binds to the blueprint's event type if enabled and resolved.
    ///
    /// Any existing binding is torn down first, so repeated calls never
    /// leave more than one listener behind.
    pub fn start(&mut self, platform: &dyn Platform) {
        self.stop(platform);

        if !self.enabled {
            trace!(id = %self.id, "Switch disabled, staying unbound");
            return;
        }
        let Some(bp) = self.blueprint.blueprint() else {
            debug!(id = %self.id, blueprint = %self.blueprint.id(), "Blueprint unresolved, staying unbound");
            return;
        };

        let listener = platform.listen(&bp.event_type);
        debug!(id = %self.id, %listener, event_type = %bp.event_type, "Switch bound");
        self.binding = Binding::Bound(listener);
    }

    /// Tears down the event binding. No-op when unbound.
    pub fn stop(&mut self, platform: &dyn Platform) {
        if let Binding::Bound(listener) = self.binding {
            platform.unlisten(listener);
            debug!(id = %self.id, %listener, "Switch unbound");
        }
        self.binding = Binding::Unbound;
    }

    /// Applies a new config and rebinds. Pass-through keys are merged,
    /// with the new values winning.
    ///
    /// The old binding is removed before the new one is created, so events
    /// are never matched against both the old and new identifier.
    pub fn update(&mut self, config: SwitchConfig, registry: &BlueprintRegistry, platform: &dyn Platform) {
        self.stop(platform);
        if config.blueprint != self.blueprint.id() || !self.blueprint.is_resolved() {
            self.blueprint = registry.get(&config.blueprint);
        }
        self.name = config.name;
        self.enabled = config.enabled;
        self.identifier = config.identifier;
        self.buttons = config.buttons;
        self.extra.extend(config.extra);
        self.start(platform);
    }

    /// Sets the enabled flag without touching the binding. Follow with
    /// [`start`](Self::start) to apply.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the enabled flag and rebinds accordingly.
    pub fn set_enabled_and_apply(&mut self, enabled: bool, platform: &dyn Platform) {
        self.set_enabled(enabled);
        self.start(platform);
    }

    /// Re-resolves the blueprint against a rebuilt registry. The caller
    /// restarts the switch afterwards.
    pub fn resolve_blueprint(&mut self, registry: &BlueprintRegistry) {
        self.blueprint = registry.get(self.blueprint.id());
    }

    /// Event type this switch currently listens for, if bound.
    pub fn listening_for(&self) -> Option<&str> {
        match self.binding {
            Binding::Bound(_) => self.blueprint.blueprint().map(|bp| bp.event_type.as_str()),
            Binding::Unbound => None,
        }
    }

    /// Actions of this switch matched by `event`.
    ///
    /// An event matches configured button `i`, action `j` when it carries
    /// this switch's identifier under the blueprint's `identifier_key` and
    /// satisfies the blueprint, button and action conditions. Actions with
    /// an empty sequence are skipped.
    pub fn matching_actions(&self, event: &PlatformEvent) -> Vec<ActionRun> {
        if !self.is_bound() {
            return Vec::new();
        }
        let Some(bp) = self.blueprint.blueprint() else {
            return Vec::new();
        };
        if event.event_type != bp.event_type {
            return Vec::new();
        }

        let identifier = event.data.get(&bp.identifier_key).and_then(coerce_string);
        if identifier.as_deref() != Some(self.identifier.as_str()) {
            return Vec::new();
        }
        if !conditions_match(&bp.conditions, &event.data) {
            return Vec::new();
        }

        let mut runs = Vec::new();
        for (i, button) in self.buttons.iter().enumerate() {
            for (j, action) in button.actions.iter().enumerate() {
                let Some((layout, bp_action)) = bp.action(i, j) else {
                    continue;
                };
                if action.sequence.is_empty()
                    || !conditions_match(&layout.conditions, &event.data)
                    || !conditions_match(&bp_action.conditions, &event.data)
                {
                    continue;
                }

                let mut variables = Map::new();
                variables.insert("switch_id".into(), json!(self.id));
                variables.insert("button".into(), json!(i));
                variables.insert("action".into(), json!(j));
                variables.insert("data".into(), Value::Object(event.data.clone()));

                runs.push(ActionRun {
                    switch_id: self.id.clone(),
                    button: i,
                    action: j,
                    mode: action.mode,
                    sequence: action.sequence.clone(),
                    variables,
                });
            }
        }
        runs
    }

    /// Persistable form of this switch.
    pub fn to_config(&self) -> SwitchConfig {
        SwitchConfig {
            name: self.name.clone(),
            enabled: self.enabled,
            blueprint: self.blueprint.id().to_string(),
            identifier: self.identifier.clone(),
            buttons: self.buttons.clone(),
            extra: self.extra.clone(),
        }
    }

    pub fn view(&self) -> SwitchView<'_> {
        SwitchView {
            id: &self.id,
            name: &self.name,
            enabled: self.enabled,
            blueprint: &self.blueprint,
            identifier: &self.identifier,
            buttons: &self.buttons,
            valid_blueprint: self.valid_blueprint(),
            is_mismatch: self.is_mismatch(),
            state: self.state(),
            extra: PassThrough(&self.extra),
        }
    }
}
