//! Switch Manager library - blueprint-driven smart switch configurations.
//!
//! This library exposes the core of the `swm` CLI for use in tests and by
//! hosts that embed the manager.
//!
//! # Modules
//!
//! - `config`: Blueprint and switch schemas, runtime settings
//! - `bundle`: Bundled manifest and blueprint file handling
//! - `blueprints`: In-memory blueprint registry
//! - `store`: SQLite-backed switch store
//! - `switch`: Managed switch lifecycle and event matching
//! - `platform`: Host platform seam (event bus, script runtime)
//! - `manager`: Startup, migration and mutations over all of the above
//! - `command`: Message-based request/response interface
//! - `error`: Error types with user-recoverable hints
//! - `output`: Output mode abstraction (robot/human)
#![forbid(unsafe_code)]

pub mod blueprints;
pub mod bundle;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod output;
pub mod platform;
pub mod store;
pub mod switch;
pub mod theme;
