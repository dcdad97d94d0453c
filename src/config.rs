//! Command-line surface.
//!
//! One subcommand per sourcing mode. Both take the registry URL and token
//! as leading positional arguments; the token may also come from the
//! `KEYFERRY_TOKEN` environment variable.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::record::Visibility;
use crate::registry::RegistryConfig;
use crate::source::files::KeyPairSource;

#[derive(Parser, Debug)]
#[command(name = "keyferry", version)]
#[command(about = "Migrates local signing keys into a remote key registry")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a single x509ee key pair from explicit key files
    Import(ImportArgs),
    /// Migrate every secret key found in a local OpenPGP keyring
    Migrate(MigrateArgs),
}

/// Arguments shared by both modes.
#[derive(Args, Debug)]
pub struct RegistryArgs {
    /// Base URL of the key registry, e.g. https://registry.example.com
    pub url: String,

    /// Opaque Authorization token for the registry
    #[arg(env = "KEYFERRY_TOKEN")]
    pub token: String,

    /// Skip TLS certificate verification (self-signed registries only)
    #[arg(long)]
    pub insecure: bool,

    /// Description recorded with each imported key
    #[arg(long, default_value = "imported from local key store")]
    pub description: String,
}

impl RegistryArgs {
    pub fn to_config(&self) -> RegistryConfig {
        RegistryConfig::new(&self.url, &self.token).with_accept_invalid_certs(self.insecure)
    }
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Registry-unique key name
    pub name: String,

    /// Contact email recorded with the key
    pub email: String,

    /// Path to the public key file
    pub public_key: PathBuf,

    /// Path to the private key file
    pub private_key: PathBuf,

    /// Passphrase protecting the private key
    #[arg(default_value = "")]
    pub passphrase: String,

    /// Key visibility in the registry
    #[arg(long, default_value_t = Visibility::Public)]
    pub visibility: Visibility,
}

impl ImportArgs {
    pub fn to_source(&self) -> KeyPairSource {
        KeyPairSource {
            name: self.name.clone(),
            email: self.email.clone(),
            passphrase: self.passphrase.clone(),
            visibility: self.visibility,
            description: self.registry.description.clone(),
            public_key_path: self.public_key.clone(),
            private_key_path: self.private_key.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Keyring file, or directory of key files, to migrate
    pub keyring: PathBuf,
}
