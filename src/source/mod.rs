//! Key source readers.
//!
//! Both readers produce a finite, in-memory sequence of
//! [`KeyRecord`](crate::record::KeyRecord)s and never touch the network:
//! - [`files`] builds exactly one X.509 record from explicit key files.
//! - [`keyring`] enumerates the secret keys of a local OpenPGP keyring.

pub mod files;
pub mod keyring;

use std::path::PathBuf;

/// Local source failures. Always fatal, raised before any network activity.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read key file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read keyring {path}")]
    Keyring {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}
