//! Bundled manifest: the version of the shipped blueprint set.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Result, SwmError};

/// Manifest file name inside the bundle directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Versioned descriptor of the bundled assets. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
}

impl Manifest {
    /// Version string used for migration comparisons.
    pub fn version(&self) -> &str {
        self.version.trim()
    }
}

/// Reads `<bundle_dir>/manifest.json`.
///
/// A missing or unparseable manifest is fatal: without it the installed
/// blueprint version cannot be reconciled.
#[instrument(skip_all, fields(bundle_dir = %bundle_dir.display()))]
pub async fn load_manifest(bundle_dir: &Path) -> Result<Manifest> {
    let path = bundle_dir.join(MANIFEST_FILE);
    let manifest_err = |reason: String| SwmError::Manifest {
        path: path.display().to_string(),
        reason,
    };

    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| manifest_err(e.to_string()))?;
    let manifest: Manifest =
        serde_json::from_str(&text).map_err(|e| manifest_err(e.to_string()))?;

    if manifest.version().is_empty() {
        return Err(manifest_err("empty version".to_string()));
    }

    debug!(version = %manifest.version(), "Loaded manifest");
    Ok(manifest)
}
