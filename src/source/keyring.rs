//! Keyring mode: enumerate the secret keys of a local OpenPGP keyring.
//!
//! The keyring path may be a single keyring file or a directory of key
//! files; armored and binary material are both accepted. Only certificates
//! carrying secret key material become records. Certificates the policy
//! rejects or whose user IDs yield no name are skipped with a warning, the
//! rest of the keyring is still read.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use sequoia_openpgp as openpgp;

use openpgp::cert::prelude::*;
use openpgp::parse::Parse;
use openpgp::policy::StandardPolicy;
use openpgp::serialize::SerializeInto;
use openpgp::types::PublicKeyAlgorithm;
use tracing::{debug, warn};

use super::SourceError;
use crate::record::{default_expire_at, KeyKind, KeyRecord, Visibility};

/// Read every secret key of the keyring at `path` into records, in a
/// deterministic order.
pub fn read_keyring(path: &Path, description: &str) -> Result<Vec<KeyRecord>, SourceError> {
    let mut files = Vec::new();
    if path.is_dir() {
        let entries = fs::read_dir(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| SourceError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if entry.path().is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
    } else {
        files.push(path.to_path_buf());
    }

    let policy = StandardPolicy::new();
    let mut records = Vec::new();
    for file in &files {
        records.extend(read_keyring_file(file, &policy, description)?);
    }
    Ok(records)
}

fn read_keyring_file(
    path: &Path,
    policy: &StandardPolicy,
    description: &str,
) -> Result<Vec<KeyRecord>, SourceError> {
    let parser = CertParser::from_file(path).map_err(|source| SourceError::Keyring {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for cert in parser {
        let cert = match cert {
            Ok(cert) => cert,
            Err(e) => {
                warn!(
                    "skipping unparsable certificate in {}: {}",
                    path.display(),
                    e
                );
                continue;
            }
        };
        if !cert.is_tsk() {
            debug!(
                "skipping {}: no secret key material",
                cert.fingerprint()
            );
            continue;
        }
        match record_from_cert(&cert, policy, description) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => warn!(
                "skipping {}: no usable primary user id",
                cert.fingerprint()
            ),
            Err(source) => {
                return Err(SourceError::Keyring {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
    Ok(records)
}

/// Build one record from a certificate with secret key material. Returns
/// `None` when the certificate has no user ID the record name can be
/// derived from.
fn record_from_cert(
    cert: &Cert,
    policy: &StandardPolicy,
    description: &str,
) -> openpgp::Result<Option<KeyRecord>> {
    let valid = match cert.with_policy(policy, None) {
        Ok(valid) => valid,
        Err(e) => {
            warn!("skipping {}: rejected by policy: {}", cert.fingerprint(), e);
            return Ok(None);
        }
    };
    let userid = match valid.primary_userid() {
        Ok(userid) => userid,
        Err(_) => return Ok(None),
    };
    let name = match userid.userid().name2()? {
        Some(name) => name.to_string(),
        None => return Ok(None),
    };
    let email = userid
        .userid()
        .email2()?
        .unwrap_or_default()
        .to_string();

    let primary = valid.primary_key();
    let create_at = DateTime::<Utc>::from(primary.key().creation_time());
    let expire_at = primary
        .key_expiration_time()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(default_expire_at);
    let key_length = primary
        .key()
        .mpis()
        .bits()
        .map(|bits| bits.to_string())
        .unwrap_or_else(|| "2048".to_string());
    let key_algorithm = algorithm_label(primary.key().pk_algo());

    let public_key = String::from_utf8(cert.armored().to_vec()?)?;
    let private_key = String::from_utf8(cert.as_tsk().armored().to_vec()?)?;

    Ok(Some(KeyRecord {
        name,
        email,
        kind: KeyKind::Pgp,
        visibility: Visibility::Public,
        description: description.to_string(),
        digest_algorithm: "sha2_256".to_string(),
        key_algorithm: key_algorithm.to_string(),
        key_length,
        // Secret material is exported without a passphrase.
        passphrase: String::new(),
        create_at: Some(create_at),
        expire_at,
        public_key,
        private_key,
        certificate: String::new(),
    }))
}

fn algorithm_label(algo: PublicKeyAlgorithm) -> &'static str {
    match algo {
        PublicKeyAlgorithm::RSAEncryptSign => "rsa",
        PublicKeyAlgorithm::DSA => "dsa",
        PublicKeyAlgorithm::ECDSA => "ecdsa",
        PublicKeyAlgorithm::EdDSA => "eddsa",
        _ => "rsa",
    }
}
