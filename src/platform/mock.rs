//! Recording platform for unit and integration tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use swm::platform::mock::{MockPlatform, Operation};
//! use swm::platform::{ListenerId, Platform};
//!
//! let platform = MockPlatform::new();
//! let id = platform.listen("zha_event");
//! platform.unlisten(id);
//!
//! platform.assert_operations(&[
//!     Operation::Listen { id: ListenerId(1), event_type: "zha_event".into() },
//!     Operation::Unlisten { id: ListenerId(1) },
//! ]);
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::{ActionRun, ListenerId, Platform};
use crate::error::{Result, SwmError};

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Listen { id: ListenerId, event_type: String },
    Unlisten { id: ListenerId },
    RunAction(ActionRun),
}

/// Platform double that records every call.
#[derive(Debug, Default)]
pub struct MockPlatform {
    next_id: AtomicU64,
    active: Mutex<BTreeMap<ListenerId, String>>,
    operation_log: Mutex<Vec<Operation>>,
    fail_actions: Mutex<Option<String>>,
}

impl MockPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `run_action` fail with `reason`.
    pub fn fail_actions(&self, reason: impl Into<String>) {
        *self.fail_actions.lock().unwrap() = Some(reason.into());
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operation_log.lock().unwrap().clone()
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        self.operation_log.lock().unwrap().clear();
    }

    /// Active subscriptions and their event types.
    #[must_use]
    pub fn active_listeners(&self) -> Vec<(ListenerId, String)> {
        self.active
            .lock()
            .unwrap()
            .iter()
            .map(|(id, ty)| (*id, ty.clone()))
            .collect()
    }

    #[must_use]
    pub fn active_listener_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    /// Action runs recorded so far, in order.
    #[must_use]
    pub fn action_runs(&self) -> Vec<ActionRun> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::RunAction(run) => Some(run),
                _ => None,
            })
            .collect()
    }

    /// Assert specific operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if the operations don't match.
    pub fn assert_operations(&self, expected: &[Operation]) {
        let actual = self.operations();
        assert_eq!(
            actual, expected,
            "Operation mismatch.\nExpected: {expected:#?}\nActual: {actual:#?}",
        );
    }

    /// Assert no operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if any operations were recorded.
    pub fn assert_no_operations(&self) {
        let ops = self.operations();
        assert!(ops.is_empty(), "Expected no operations, but found: {ops:#?}");
    }

    fn record_op(&self, op: Operation) {
        trace!(?op, "Recording operation");
        self.operation_log.lock().unwrap().push(op);
    }
}

impl Platform for MockPlatform {
    fn listen(&self, event_type: &str) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.active.lock().unwrap().insert(id, event_type.to_string());
        self.record_op(Operation::Listen {
            id,
            event_type: event_type.to_string(),
        });
        id
    }

    fn unlisten(&self, listener: ListenerId) {
        self.active.lock().unwrap().remove(&listener);
        self.record_op(Operation::Unlisten { id: listener });
    }

    fn run_action(&self, run: &ActionRun) -> Result<()> {
        if let Some(reason) = self.fail_actions.lock().unwrap().clone() {
            return Err(SwmError::Dispatch(reason));
        }
        self.record_op(Operation::RunAction(run.clone()));
        Ok(())
    }
}
