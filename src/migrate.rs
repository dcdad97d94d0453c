//! Migration orchestrator.
//!
//! Drives the per-record reconciliation state machine against the registry:
//! check the name, create the key if it is missing, then make sure it ends
//! up enabled. Records are processed strictly in source order, one at a
//! time. Over-long names are skipped and the run continues; any registry
//! error aborts the whole run immediately.

use std::fmt;

use tracing::{info, warn};

use crate::error::Error;
use crate::record::KeyRecord;
use crate::registry::Registry;

/// What the enable step did for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableOutcome {
    /// The key was already enabled; no call was made.
    AlreadyEnabled,
    /// The key was transitioned to enabled.
    Enabled,
}

/// Terminal outcome for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Name exceeded the registry ceiling; no network calls were made.
    SkippedTooLong { length: usize, ceiling: usize },
    /// The record was reconciled against the registry.
    Reconciled { created: bool, enable: EnableOutcome },
}

/// Ordered per-key outcomes of a completed run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    outcomes: Vec<(String, KeyOutcome)>,
}

impl MigrationReport {
    pub fn outcomes(&self) -> &[(String, KeyOutcome)] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, KeyOutcome::Reconciled { created: true, .. }))
    }

    pub fn already_present(&self) -> usize {
        self.count(|o| matches!(o, KeyOutcome::Reconciled { created: false, .. }))
    }

    pub fn enabled(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                KeyOutcome::Reconciled {
                    enable: EnableOutcome::Enabled,
                    ..
                }
            )
        })
    }

    pub fn skipped_too_long(&self) -> usize {
        self.count(|o| matches!(o, KeyOutcome::SkippedTooLong { .. }))
    }

    fn count(&self, predicate: impl Fn(&KeyOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} keys processed: {} created, {} already present, {} enabled, {} skipped (name too long)",
            self.len(),
            self.created(),
            self.already_present(),
            self.enabled(),
            self.skipped_too_long(),
        )
    }
}

/// Reconciles a sequence of key records against a registry.
pub struct Migrator<R> {
    registry: R,
}

impl<R: Registry> Migrator<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Reconcile every record in order. Returns the per-key outcomes, or the
    /// first registry error, after which no further records are processed.
    pub async fn run(&self, records: &[KeyRecord]) -> Result<MigrationReport, Error> {
        let mut report = MigrationReport::default();
        for (i, record) in records.iter().enumerate() {
            info!(
                "processing key {}/{}: {}",
                i + 1,
                records.len(),
                record.name
            );
            let outcome = self.reconcile(record).await?;
            report.outcomes.push((record.name.clone(), outcome));
        }
        Ok(report)
    }

    async fn reconcile(&self, record: &KeyRecord) -> Result<KeyOutcome, Error> {
        let ceiling = record.kind.name_ceiling();
        let length = record.name.chars().count();
        if length > ceiling {
            warn!(
                "key {} has a {} character name, above the {} ceiling, skipping",
                record.name, length, ceiling
            );
            return Ok(KeyOutcome::SkippedTooLong { length, ceiling });
        }

        let created = if self
            .registry
            .name_available(&record.name, record.query_visibility())
            .await?
        {
            info!("key {} does not exist, creating", record.name);
            let confirmed = self.registry.create(record).await?;
            info!("key {} has been successfully created", confirmed);
            true
        } else {
            info!("key {} already exists, skip creating", record.name);
            false
        };

        let enable = if self.registry.is_enabled(&record.name).await? {
            info!("key {} is already enabled", record.name);
            EnableOutcome::AlreadyEnabled
        } else {
            let identifier = record.enable_identifier();
            info!("key {} is not enabled, enabling as {}", record.name, identifier);
            self.registry.enable(&identifier).await?;
            info!("key {} has been successfully enabled", record.name);
            EnableOutcome::Enabled
        };

        Ok(KeyOutcome::Reconciled { created, enable })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{default_expire_at, KeyKind, Visibility};
    use crate::registry::{MockRegistry, RegistryError};

    fn record(kind: KeyKind, name: &str) -> KeyRecord {
        KeyRecord {
            name: name.to_string(),
            email: "alice@example.org".to_string(),
            kind,
            visibility: Visibility::Public,
            description: "test".to_string(),
            digest_algorithm: "sha2_256".to_string(),
            key_algorithm: "rsa".to_string(),
            key_length: "2048".to_string(),
            passphrase: String::new(),
            create_at: None,
            expire_at: default_expire_at(),
            public_key: "PUB".to_string(),
            private_key: "PRIV".to_string(),
            certificate: String::new(),
        }
    }

    #[tokio::test]
    async fn over_long_name_is_skipped_without_network_calls() {
        let migrator = Migrator::new(MockRegistry::new());
        let records = vec![record(KeyKind::Pgp, &"a".repeat(215))];

        let report = migrator.run(&records).await.unwrap();

        assert_eq!(report.skipped_too_long(), 1);
        assert_eq!(
            report.outcomes()[0].1,
            KeyOutcome::SkippedTooLong {
                length: 215,
                ceiling: 210
            }
        );
        let registry = migrator.registry();
        assert_eq!(registry.exists_calls(), 0);
        assert_eq!(registry.create_calls(), 0);
        assert_eq!(registry.status_calls(), 0);
        assert_eq!(registry.enable_calls(), 0);
    }

    #[tokio::test]
    async fn existing_key_is_not_recreated() {
        let migrator = Migrator::new(MockRegistry::new().with_key("acme-signing", false));
        let records = vec![record(KeyKind::X509Ee, "acme-signing")];

        let report = migrator.run(&records).await.unwrap();

        assert_eq!(report.created(), 0);
        assert_eq!(report.already_present(), 1);
        let registry = migrator.registry();
        assert_eq!(registry.create_calls(), 0);
        // The status/enable stage still runs after a skipped creation.
        assert_eq!(registry.status_calls(), 1);
        assert_eq!(registry.enable_calls(), 1);
    }

    #[tokio::test]
    async fn enabled_key_is_left_alone() {
        let migrator = Migrator::new(MockRegistry::new().with_key("acme-signing", true));
        let records = vec![record(KeyKind::Pgp, "acme-signing")];

        let report = migrator.run(&records).await.unwrap();

        assert_eq!(
            report.outcomes()[0].1,
            KeyOutcome::Reconciled {
                created: false,
                enable: EnableOutcome::AlreadyEnabled
            }
        );
        assert_eq!(migrator.registry().enable_calls(), 0);
    }

    #[tokio::test]
    async fn fresh_key_is_created_and_enabled_with_mode_identifier() {
        let migrator = Migrator::new(MockRegistry::new());
        let records = vec![record(KeyKind::X509Ee, "acme-signing")];

        let report = migrator.run(&records).await.unwrap();

        assert_eq!(report.created(), 1);
        assert_eq!(report.enabled(), 1);
        assert_eq!(
            migrator.registry().enabled_identifiers(),
            vec!["alice@example.org:acme-signing".to_string()]
        );
    }

    #[tokio::test]
    async fn keyring_key_is_enabled_by_bare_name() {
        let migrator = Migrator::new(MockRegistry::new());
        let records = vec![record(KeyKind::Pgp, "release-signing")];

        migrator.run(&records).await.unwrap();

        assert_eq!(
            migrator.registry().enabled_identifiers(),
            vec!["release-signing".to_string()]
        );
    }

    #[tokio::test]
    async fn second_run_performs_no_mutating_calls() {
        let migrator = Migrator::new(MockRegistry::new());
        let records = vec![
            record(KeyKind::Pgp, "release-signing"),
            record(KeyKind::Pgp, "nightly-signing"),
        ];

        migrator.run(&records).await.unwrap();
        let registry = migrator.registry();
        assert_eq!(registry.create_calls(), 2);
        assert_eq!(registry.enable_calls(), 2);

        let report = migrator.run(&records).await.unwrap();

        assert_eq!(report.created(), 0);
        assert_eq!(report.enabled(), 0);
        assert_eq!(report.already_present(), 2);
        assert_eq!(registry.create_calls(), 2);
        assert_eq!(registry.enable_calls(), 2);
    }

    #[tokio::test]
    async fn create_failure_aborts_the_run() {
        let migrator =
            Migrator::new(MockRegistry::new().with_create_error(500, "internal error"));
        let records = vec![
            record(KeyKind::Pgp, "first"),
            record(KeyKind::Pgp, "second"),
        ];

        let err = migrator.run(&records).await.unwrap_err();

        match err {
            Error::Registry(RegistryError::Create { name, status, body }) => {
                assert_eq!(name, "first");
                assert_eq!(status, 500);
                assert_eq!(body, "internal error");
            }
            other => panic!("unexpected error: {other}"),
        }
        // The second record was never reached.
        assert_eq!(migrator.registry().exists_calls(), 1);
    }

    #[tokio::test]
    async fn enable_failure_aborts_the_run() {
        let migrator = Migrator::new(
            MockRegistry::new()
                .with_key("first", false)
                .with_enable_error(500, "boom"),
        );
        let records = vec![record(KeyKind::Pgp, "first"), record(KeyKind::Pgp, "second")];

        let err = migrator.run(&records).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Registry(RegistryError::Enable { status: 500, .. })
        ));
        assert_eq!(migrator.registry().exists_calls(), 1);
    }

    #[tokio::test]
    async fn skip_does_not_abort_subsequent_records() {
        let migrator = Migrator::new(MockRegistry::new());
        let records = vec![
            record(KeyKind::Pgp, &"a".repeat(215)),
            record(KeyKind::Pgp, "short-enough"),
        ];

        let report = migrator.run(&records).await.unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.skipped_too_long(), 1);
        assert_eq!(report.created(), 1);
    }

    #[tokio::test]
    async fn report_summary_reads_naturally() {
        let migrator = Migrator::new(MockRegistry::new().with_key("existing", true));
        let records = vec![
            record(KeyKind::Pgp, "existing"),
            record(KeyKind::Pgp, "fresh"),
            record(KeyKind::Pgp, &"a".repeat(211)),
        ];

        let report = migrator.run(&records).await.unwrap();

        assert_eq!(
            report.to_string(),
            "3 keys processed: 1 created, 1 already present, 1 enabled, 1 skipped (name too long)"
        );
    }
}
