//! In-memory registry for exercising the reconciliation logic in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Registry, RegistryError};
use crate::record::{KeyRecord, Visibility};

/// Configurable in-memory registry.
///
/// Tracks per-operation call counts and mimics the real lifecycle: created
/// keys start disabled, `enable` flips them, the existence check reports a
/// conflict once a name is present.
#[derive(Default)]
pub struct MockRegistry {
    /// name -> enabled
    keys: Mutex<HashMap<String, bool>>,
    /// Identifiers passed to `enable`, in call order.
    enabled_identifiers: Mutex<Vec<String>>,
    fail_create: Option<(u16, String)>,
    fail_enable: Option<(u16, String)>,
    exists_calls: AtomicU32,
    status_calls: AtomicU32,
    create_calls: AtomicU32,
    enable_calls: AtomicU32,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register a key in the given enabled state.
    pub fn with_key(self, name: impl Into<String>, enabled: bool) -> Self {
        self.keys.lock().unwrap().insert(name.into(), enabled);
        self
    }

    /// Make every `create` call fail with the given status and body.
    pub fn with_create_error(mut self, status: u16, body: impl Into<String>) -> Self {
        self.fail_create = Some((status, body.into()));
        self
    }

    /// Make every `enable` call fail with the given status and body.
    pub fn with_enable_error(mut self, status: u16, body: impl Into<String>) -> Self {
        self.fail_enable = Some((status, body.into()));
        self
    }

    pub fn exists_calls(&self) -> u32 {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn enable_calls(&self) -> u32 {
        self.enable_calls.load(Ordering::SeqCst)
    }

    /// Identifiers passed to `enable` so far.
    pub fn enabled_identifiers(&self) -> Vec<String> {
        self.enabled_identifiers.lock().unwrap().clone()
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn name_available(
        &self,
        name: &str,
        _visibility: Option<Visibility>,
    ) -> Result<bool, RegistryError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(!self.keys.lock().unwrap().contains_key(name))
    }

    async fn is_enabled(&self, name: &str) -> Result<bool, RegistryError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.keys.lock().unwrap().get(name) {
            Some(enabled) => Ok(*enabled),
            None => Err(RegistryError::StatusFetch {
                name: name.to_string(),
                status: 404,
                body: "key not found".to_string(),
            }),
        }
    }

    async fn create(&self, record: &KeyRecord) -> Result<String, RegistryError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((status, body)) = &self.fail_create {
            return Err(RegistryError::Create {
                name: record.name.clone(),
                status: *status,
                body: body.clone(),
            });
        }
        self.keys.lock().unwrap().insert(record.name.clone(), false);
        Ok(record.name.clone())
    }

    async fn enable(&self, identifier: &str) -> Result<(), RegistryError> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((status, body)) = &self.fail_enable {
            return Err(RegistryError::Enable {
                identifier: identifier.to_string(),
                status: *status,
                body: body.clone(),
            });
        }
        self.enabled_identifiers
            .lock()
            .unwrap()
            .push(identifier.to_string());
        // The enable identifier may be `email:name`; the key is stored under
        // its bare name.
        let name = identifier
            .rsplit_once(':')
            .map(|(_, name)| name)
            .unwrap_or(identifier);
        self.keys.lock().unwrap().insert(name.to_string(), true);
        Ok(())
    }
}
