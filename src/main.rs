//! keyferry binary entry point.

use clap::Parser;
use tracing::info;

use keyferry::config::{Cli, Command};
use keyferry::migrate::Migrator;
use keyferry::registry::RegistryClient;
use keyferry::source;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("keyferry=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let report = match cli.command {
        Command::Import(args) => {
            let record = source::files::read_key_pair(args.to_source())?;
            let client = RegistryClient::new(args.registry.to_config())?;
            Migrator::new(client)
                .run(std::slice::from_ref(&record))
                .await?
        }
        Command::Migrate(args) => {
            let records =
                source::keyring::read_keyring(&args.keyring, &args.registry.description)?;
            info!(
                "found {} secret keys in {}",
                records.len(),
                args.keyring.display()
            );
            let client = RegistryClient::new(args.registry.to_config())?;
            Migrator::new(client).run(&records).await?
        }
    };

    println!("{report}");
    Ok(())
}
