//! Host platform abstraction.
//!
//! The event bus and script runtime belong to the host automation platform.
//! Switches talk to it only through the [`Platform`] trait, so tests can
//! drive the full lifecycle against [`mock::MockPlatform`] and the binary
//! can run against [`LogPlatform`].

pub mod mock;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::ScriptMode;
use crate::error::Result;

/// Handle for an active event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// An event fired on the platform bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEvent {
    pub event_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }
}

/// A matched switch action handed to the script runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRun {
    pub switch_id: String,
    pub button: usize,
    pub action: usize,
    pub mode: ScriptMode,
    pub sequence: Vec<Value>,
    /// Script variables: `switch_id`, `button`, `action` and the event `data`.
    pub variables: Map<String, Value>,
}

/// Operations the switch runtime needs from the host platform.
pub trait Platform {
    /// Subscribes to events of `event_type`.
    fn listen(&self, event_type: &str) -> ListenerId;

    /// Cancels a subscription. Unknown ids are ignored.
    fn unlisten(&self, listener: ListenerId);

    /// Runs a matched action's script.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime rejects the script.
    fn run_action(&self, run: &ActionRun) -> Result<()>;
}

/// Platform used by the CLI: keeps a subscription table and logs action runs.
#[derive(Debug, Default)]
pub struct LogPlatform {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<ListenerId, String>>,
}

impl LogPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active subscriptions.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map_or(0, |l| l.len())
    }
}

impl Platform for LogPlatform {
    fn listen(&self, event_type: &str) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, event_type.to_string());
        }
        debug!(%id, event_type, "Listening");
        id
    }

    fn unlisten(&self, listener: ListenerId) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.remove(&listener);
        }
        debug!(id = %listener, "Stopped listening");
    }

    fn run_action(&self, run: &ActionRun) -> Result<()> {
        info!(
            switch_id = %run.switch_id,
            button = run.button,
            action = run.action,
            mode = ?run.mode,
            steps = run.sequence.len(),
            "Running switch action"
        );
        Ok(())
    }
}
