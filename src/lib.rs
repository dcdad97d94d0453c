//! keyferry: migrate local signing keys into a remote key registry.
//!
//! The crate is a linear pipeline driven by a single orchestrator:
//! 1. A key source reader ([`source`]) yields [`record::KeyRecord`]s from a
//!    local OpenPGP keyring or from explicit key files.
//! 2. A registry client ([`registry`]) wraps the four remote operations:
//!    existence-check, status-check, create(import) and enable.
//! 3. The migrator ([`migrate`]) reconciles each record against the registry
//!    so it converges to "exists and is enabled", without ever re-uploading
//!    or double-creating a key. Re-running a completed migration performs no
//!    mutating calls.

pub mod config;
pub mod error;
pub mod migrate;
pub mod record;
pub mod registry;
pub mod source;

pub use error::{Error, Result};
