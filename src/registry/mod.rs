//! Registry client: a thin, stateless wrapper over the four remote
//! operations the migration needs.
//!
//! The [`Registry`] trait is the seam between the reconciliation logic and
//! the transport. [`RegistryClient`] talks to the real service over HTTP;
//! [`MockRegistry`] is an in-memory implementation for tests. No operation
//! retries; idempotency is enforced by the migrator through the checks it
//! performs before each mutating call.

pub mod client;
pub mod mock;

use async_trait::async_trait;

use crate::record::{KeyRecord, Visibility};

pub use client::{RegistryClient, RegistryConfig};
pub use mock::MockRegistry;

/// Errors from the remote registry. Every unexpected-status variant carries
/// the server status and response body for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("existence check for key {name} returned unexpected status {status}: {body}")]
    ConflictCheck { name: String, status: u16, body: String },

    #[error("status fetch for key {name} returned unexpected status {status}: {body}")]
    StatusFetch { name: String, status: u16, body: String },

    #[error("import of key {name} failed with status {status}: {body}")]
    Create { name: String, status: u16, body: String },

    #[error("enable of key {identifier} failed with status {status}: {body}")]
    Enable { identifier: String, status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The four operations the migration workflow needs from the remote
/// key-management service.
#[async_trait]
pub trait Registry: Send + Sync {
    /// True when no record with this name exists, i.e. it is safe to create.
    /// False when the registry reports a name conflict.
    async fn name_available(
        &self,
        name: &str,
        visibility: Option<Visibility>,
    ) -> Result<bool, RegistryError>;

    /// Whether the named key is currently in the `enabled` state.
    async fn is_enabled(&self, name: &str) -> Result<bool, RegistryError>;

    /// Register a key. Returns the server-confirmed name.
    async fn create(&self, record: &KeyRecord) -> Result<String, RegistryError>;

    /// Transition a key to the enabled state. The identifier format is
    /// mode-dependent, see [`KeyRecord::enable_identifier`].
    async fn enable(&self, identifier: &str) -> Result<(), RegistryError>;
}
