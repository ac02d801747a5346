//! Bundled assets shipped alongside the binary.
//!
//! The bundle directory carries a small versioned manifest and the source
//! blueprint definitions. Blueprints are deployed (copied) into the user's
//! writable blueprint directory, which is what the registry actually reads.
//!
//! # Directory Structure
//!
//! ```text
//! <bundle_dir>/
//! ├── manifest.json          # {"version": "2", ...}
//! └── blueprints/
//!     ├── basic.yaml
//!     ├── basic.png          # optional image
//!     └── hue-dimmer.yaml
//! ```

mod files;
mod manifest;

pub use files::{
    BLUEPRINT_EXTENSION, IMAGE_EXTENSION, RawBlueprint, check_blueprints_folder_exists,
    deploy_blueprints, load_blueprints,
};
pub use manifest::{MANIFEST_FILE, Manifest, load_manifest};

/// Source blueprint directory name inside the bundle.
pub const BUNDLE_BLUEPRINTS_DIR: &str = "blueprints";
