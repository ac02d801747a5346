//! Blueprint file handling: deploy from the bundle, enumerate and read.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, instrument, trace, warn};

use super::BUNDLE_BLUEPRINTS_DIR;
use crate::error::{Result, SwmError};

/// Blueprint definition file extension.
pub const BLUEPRINT_EXTENSION: &str = "yaml";
/// Optional companion image extension.
pub const IMAGE_EXTENSION: &str = "png";

/// An unvalidated blueprint read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlueprint {
    /// File stem of the definition file.
    pub id: String,
    pub data: Value,
    pub has_image: bool,
}

/// Lists regular files in `dir`, sorted by name.
async fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Copies every bundled blueprint file (definitions and images) into
/// `blueprints_dir`, creating it if needed.
///
/// Existing files are always overwritten so a newer bundle wins over an
/// older deployment. Files in `blueprints_dir` that the bundle does not
/// ship are left alone. Returns the number of files copied.
#[instrument(skip_all, fields(bundle_dir = %bundle_dir.display(), dest = %blueprints_dir.display()))]
pub async fn deploy_blueprints(bundle_dir: &Path, blueprints_dir: &Path) -> Result<usize> {
    let source = bundle_dir.join(BUNDLE_BLUEPRINTS_DIR);

    let files = list_files(&source)
        .await
        .map_err(|e| SwmError::Deploy(format!("cannot read {}: {e}", source.display())))?;

    tokio::fs::create_dir_all(blueprints_dir).await.map_err(|e| {
        SwmError::Deploy(format!("cannot create {}: {e}", blueprints_dir.display()))
    })?;

    let mut copied = 0;
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let dest = blueprints_dir.join(name);
        trace!(src = %file.display(), dest = %dest.display(), "Copying blueprint asset");
        tokio::fs::copy(&file, &dest)
            .await
            .map_err(|e| SwmError::Deploy(format!("cannot copy {}: {e}", file.display())))?;
        copied += 1;
    }

    info!(copied, "Deployed blueprint assets");
    Ok(copied)
}

/// True iff `blueprints_dir` exists and has at least one entry.
pub async fn check_blueprints_folder_exists(blueprints_dir: &Path) -> bool {
    match tokio::fs::read_dir(blueprints_dir).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
        Err(_) => false,
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Reads every `<id>.yaml` in `blueprints_dir`.
///
/// Each entry is returned individually so one unreadable file never hides
/// the others. A missing directory yields no entries.
#[instrument(skip_all, fields(dir = %blueprints_dir.display()))]
pub async fn load_blueprints(blueprints_dir: &Path) -> Vec<Result<RawBlueprint>> {
    let files = match list_files(blueprints_dir).await {
        Ok(files) => files,
        Err(e) => {
            warn!(error = %e, "Blueprint directory unreadable");
            return Vec::new();
        }
    };

    let mut loaded = Vec::new();
    for file in files.iter().filter(|f| has_extension(f, BLUEPRINT_EXTENSION)) {
        let Some(id) = file.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let image = file.with_extension(IMAGE_EXTENSION);
        let has_image = tokio::fs::try_exists(&image).await.unwrap_or(false);
        loaded.push(read_blueprint(file, id, has_image).await);
    }

    debug!(count = loaded.len(), "Enumerated blueprint files");
    loaded
}

async fn read_blueprint(path: &Path, id: String, has_image: bool) -> Result<RawBlueprint> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SwmError::BlueprintRead {
            id: id.clone(),
            reason: e.to_string(),
        })?;
    let data: Value = serde_yaml::from_str(&text).map_err(|e| SwmError::BlueprintRead {
        id: id.clone(),
        reason: e.to_string(),
    })?;
    Ok(RawBlueprint { id, data, has_image })
}
