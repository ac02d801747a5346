//! In-memory blueprint registry.
//!
//! Rebuilt wholesale from the writable blueprint directory at startup and on
//! explicit reload; never edited in place. Invalid definitions are logged and
//! skipped so one broken file cannot keep the others from loading.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{error, info, instrument};

use crate::bundle::{RawBlueprint, load_blueprints};
use crate::config::Blueprint;
use crate::error::{Result, SwmError};

/// Outcome of resolving a blueprint id against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlueprintRef {
    Resolved(Arc<Blueprint>),
    /// The id did not name a loaded blueprint; carried verbatim.
    Unresolved(String),
}

impl BlueprintRef {
    /// The referenced blueprint id, resolved or not.
    pub fn id(&self) -> &str {
        match self {
            Self::Resolved(bp) => &bp.id,
            Self::Unresolved(id) => id,
        }
    }

    pub fn blueprint(&self) -> Option<&Blueprint> {
        match self {
            Self::Resolved(bp) => Some(bp),
            Self::Unresolved(_) => None,
        }
    }

    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Resolved references serialize as the blueprint object, unresolved ones as
/// the raw id string.
impl Serialize for BlueprintRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Resolved(bp) => bp.as_ref().serialize(serializer),
            Self::Unresolved(id) => serializer.serialize_str(id),
        }
    }
}

/// Summary of a registry build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<String>,
}

/// Map of blueprint id to validated blueprint.
#[derive(Debug, Clone, Default)]
pub struct BlueprintRegistry {
    blueprints: BTreeMap<String, Arc<Blueprint>>,
}

impl BlueprintRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and validates every blueprint in `blueprints_dir`.
    #[instrument(skip_all, fields(dir = %blueprints_dir.display()))]
    pub async fn load(blueprints_dir: &Path) -> (Self, LoadReport) {
        let entries = load_blueprints(blueprints_dir).await;
        Self::from_entries(entries)
    }

    /// Validates raw entries, keeping the valid ones.
    pub fn from_entries(entries: Vec<Result<RawBlueprint>>) -> (Self, LoadReport) {
        let mut registry = Self::new();
        let mut report = LoadReport::default();

        for entry in entries {
            let raw = match entry {
                Ok(raw) => raw,
                Err(e) => {
                    error!(error = %e, "Skipping unreadable blueprint");
                    if let SwmError::BlueprintRead { id, .. } = e {
                        report.skipped.push(id);
                    }
                    continue;
                }
            };

            match Blueprint::from_document(&raw.id, &raw.data, raw.has_image) {
                Ok(bp) => {
                    report.loaded.push(bp.id.clone());
                    registry.blueprints.insert(bp.id.clone(), Arc::new(bp));
                }
                Err(e) => {
                    error!(blueprint = %raw.id, error = %e, "Skipping invalid blueprint");
                    report.skipped.push(raw.id);
                }
            }
        }

        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            "Blueprint registry built"
        );
        (registry, report)
    }

    /// Looks up `id`, yielding [`BlueprintRef::Unresolved`] for unknown ids.
    pub fn get(&self, id: &str) -> BlueprintRef {
        self.blueprints.get(id).map_or_else(
            || BlueprintRef::Unresolved(id.to_string()),
            |bp| BlueprintRef::Resolved(Arc::clone(bp)),
        )
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blueprints.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Blueprint> {
        self.blueprints.values().map(AsRef::as_ref)
    }
}

impl Serialize for BlueprintRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.blueprints.len()))?;
        for (id, bp) in &self.blueprints {
            map.serialize_entry(id, bp.as_ref())?;
        }
        map.end()
    }
}
