//! artifact-store - local storage for opaque file artifacts.
//!
//! Artifacts are kept on disk under `<root>/<YYYY>/<MM>/<filename>`, bucketed
//! by upload date, with a `metadata.json` sidecar per month directory. The
//! store is exposed through a small REST service and a CLI.
//!
//! # Modules
//!
//! - [`artifact`] - Metadata records and filename rules
//! - [`storage`] - Storage backend trait and the local filesystem store
//! - [`commands`] - High-level operations (upload, list, download, delete)
//! - [`config`] - Configuration loading
//! - [`cli`] - Command-line interface definitions
//! - `server` - HTTP service (requires the `server` feature)

pub mod artifact;
pub mod cli;
pub mod commands;
pub mod config;
pub mod storage;

#[cfg(feature = "server")]
pub mod server;
