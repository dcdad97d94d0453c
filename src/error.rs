//! Crate-level error type.
//!
//! Source errors abort before any network activity; registry errors abort
//! the run at the record that hit them. The only recoverable condition,
//! skipping an over-long name, is an outcome, not an error.

use crate::registry::RegistryError;
use crate::source::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, Error>;
