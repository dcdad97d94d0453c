//! HTTP implementation of the [`Registry`] trait.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{Registry, RegistryError};
use crate::record::{KeyRecord, Visibility, TIMESTAMP_FORMAT};

/// Process-lifetime configuration for the registry client. Immutable; there
/// is no token refresh or rotation.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    base_url: String,
    token: String,
    accept_invalid_certs: bool,
}

impl RegistryConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: token.into(),
            accept_invalid_certs: false,
        }
    }

    /// Skip TLS certificate verification. Off by default; only meant for
    /// registries running with self-signed certificates.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Stateless request/response mapping to the remote key-management API.
pub struct RegistryClient {
    config: RegistryConfig,
    client: Client,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { config, client })
    }

    fn keys_url(&self, suffix: &str) -> String {
        format!("{}/api/v1/keys/{}", self.config.base_url, suffix)
    }
}

/// `attributes` object of the import payload.
#[derive(Debug, Serialize)]
struct ImportAttributes<'a> {
    digest_algorithm: &'a str,
    key_type: &'a str,
    key_length: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    passphrase: Option<&'a str>,
    expire_at: String,
}

/// Body of `POST /api/v1/keys/import`.
#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    attributes: ImportAttributes<'a>,
    name: &'a str,
    key_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<&'a str>,
    email: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    create_at: Option<String>,
    expire_at: String,
    public_key: &'a str,
    private_key: &'a str,
    certificate: &'a str,
}

impl<'a> ImportRequest<'a> {
    fn from_record(record: &'a KeyRecord) -> Self {
        let expire_at = record.expire_at.format(TIMESTAMP_FORMAT).to_string();
        Self {
            attributes: ImportAttributes {
                digest_algorithm: &record.digest_algorithm,
                key_type: &record.key_algorithm,
                key_length: &record.key_length,
                // Keyring migrations export passphrase-less material and
                // send no passphrase field at all.
                passphrase: record
                    .kind
                    .sends_visibility()
                    .then_some(record.passphrase.as_str()),
                expire_at: expire_at.clone(),
            },
            name: &record.name,
            key_type: record.kind.as_str(),
            visibility: record.query_visibility().map(|v| v.as_str()),
            email: &record.email,
            description: &record.description,
            create_at: record
                .create_at
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            expire_at,
            public_key: &record.public_key,
            private_key: &record.private_key,
            certificate: &record.certificate,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    name: String,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum KeyState {
    Enabled,
    Disabled,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct KeyStatusResponse {
    key_state: KeyState,
}

#[async_trait]
impl Registry for RegistryClient {
    async fn name_available(
        &self,
        name: &str,
        visibility: Option<Visibility>,
    ) -> Result<bool, RegistryError> {
        let mut request = self
            .client
            .head(self.keys_url("name_identical"))
            .query(&[("name", name)]);
        if let Some(visibility) = visibility {
            request = request.query(&[("visibility", visibility.as_str())]);
        }
        let response = request
            .header(header::AUTHORIZATION, self.config.token.as_str())
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::CONFLICT => Ok(false),
            status => Err(RegistryError::ConflictCheck {
                name: name.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn is_enabled(&self, name: &str) -> Result<bool, RegistryError> {
        let response = self
            .client
            .get(self.keys_url(name))
            .header(header::AUTHORIZATION, self.config.token.as_str())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            return Err(RegistryError::StatusFetch {
                name: name.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let status: KeyStatusResponse = response.json().await?;
        Ok(status.key_state == KeyState::Enabled)
    }

    async fn create(&self, record: &KeyRecord) -> Result<String, RegistryError> {
        let response = self
            .client
            .post(self.keys_url("import"))
            .header(header::AUTHORIZATION, self.config.token.as_str())
            .json(&ImportRequest::from_record(record))
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            let status = response.status();
            return Err(RegistryError::Create {
                name: record.name.clone(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let created: ImportResponse = response.json().await?;
        Ok(created.name)
    }

    async fn enable(&self, identifier: &str) -> Result<(), RegistryError> {
        let response = self
            .client
            .post(self.keys_url(&format!("{identifier}/actions/enable")))
            .header(header::AUTHORIZATION, self.config.token.as_str())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            return Err(RegistryError::Enable {
                identifier: identifier.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
