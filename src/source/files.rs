//! Direct mode: build one X.509 end-entity record from explicit key files.

use std::fs;
use std::path::{Path, PathBuf};

use super::SourceError;
use crate::record::{default_expire_at, KeyKind, KeyRecord, Visibility};

/// Inputs for a direct import: scalar metadata plus the two key files.
#[derive(Debug, Clone)]
pub struct KeyPairSource {
    pub name: String,
    pub email: String,
    pub passphrase: String,
    pub visibility: Visibility,
    pub description: String,
    pub public_key_path: PathBuf,
    pub private_key_path: PathBuf,
}

/// Read both key files as raw text and construct the record. The key
/// material is opaque to the migration; it is transported, not validated.
pub fn read_key_pair(source: KeyPairSource) -> Result<KeyRecord, SourceError> {
    let public_key = read_text(&source.public_key_path)?;
    let private_key = read_text(&source.private_key_path)?;

    Ok(KeyRecord {
        name: source.name,
        email: source.email,
        kind: KeyKind::X509Ee,
        visibility: source.visibility,
        description: source.description,
        digest_algorithm: "sha2_256".to_string(),
        key_algorithm: "rsa".to_string(),
        key_length: "2048".to_string(),
        passphrase: source.passphrase,
        create_at: None,
        expire_at: default_expire_at(),
        public_key,
        private_key,
        certificate: String::new(),
    })
}

fn read_text(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}
