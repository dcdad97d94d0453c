//! The key record model shared by the source readers, the registry client
//! and the migrator.
//!
//! A [`KeyRecord`] is immutable after construction; the registry is the only
//! stateful store. All per-mode policy (name ceiling, enable-identifier
//! format, whether the existence check carries a visibility parameter) hangs
//! off [`KeyKind`] so the reconciliation logic stays generic over both modes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};

/// Wire format for registry timestamps, e.g. `2050-12-29 16:00:57+00:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Fallback expiry for keys whose source carries none.
pub fn default_expire_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2050, 12, 29, 16, 0, 57).unwrap()
}

/// Registry key type. Doubles as the per-mode migration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// OpenPGP key migrated out of a local keyring.
    Pgp,
    /// X.509 end-entity key imported from explicit files.
    X509Ee,
}

impl KeyKind {
    /// Longest name the registry accepts for this kind. Records above the
    /// ceiling are skipped locally, never sent.
    pub fn name_ceiling(&self) -> usize {
        match self {
            KeyKind::Pgp => 210,
            KeyKind::X509Ee => 256,
        }
    }

    /// Whether the existence check sends the `visibility` query parameter.
    pub fn sends_visibility(&self) -> bool {
        matches!(self, KeyKind::X509Ee)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::Pgp => "pgp",
            KeyKind::X509Ee => "x509ee",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key visibility in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(format!("unsupported visibility {other}, expected public or private")),
        }
    }
}

/// One signing key plus its metadata, as read from the local source.
#[derive(Debug, Clone)]
pub struct KeyRecord {
    /// Registry-unique identifier.
    pub name: String,
    /// Identity contact; part of the enable identifier for X.509 imports.
    pub email: String,
    pub kind: KeyKind,
    /// Only serialized for direct imports.
    pub visibility: Visibility,
    pub description: String,
    /// Descriptive attributes attached to the registry record.
    pub digest_algorithm: String,
    pub key_algorithm: String,
    pub key_length: String,
    /// Passphrase protecting `private_key`; may be empty.
    pub passphrase: String,
    pub create_at: Option<DateTime<Utc>>,
    pub expire_at: DateTime<Utc>,
    /// Armored/PEM blobs, treated as opaque text.
    pub public_key: String,
    pub private_key: String,
    /// Empty for non-X.509 keys.
    pub certificate: String,
}

impl KeyRecord {
    /// True when the name exceeds the registry ceiling for this kind.
    pub fn exceeds_name_ceiling(&self) -> bool {
        self.name.chars().count() > self.kind.name_ceiling()
    }

    /// Identifier expected by the enable endpoint: `{email}:{name}` for
    /// X.509 imports, the bare name for keyring migrations.
    pub fn enable_identifier(&self) -> String {
        match self.kind {
            KeyKind::Pgp => self.name.clone(),
            KeyKind::X509Ee => format!("{}:{}", self.email, self.name),
        }
    }

    /// Visibility to send with the existence check, if any for this kind.
    pub fn query_visibility(&self) -> Option<Visibility> {
        self.kind.sends_visibility().then_some(self.visibility)
    }
}
