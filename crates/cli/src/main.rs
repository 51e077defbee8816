//! RocketShoes CLI - Drive the cart store from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted cart
//! rs-cart show
//!
//! # Add one unit of product 1
//! rs-cart add 1
//!
//! # Set product 1 to three units
//! rs-cart set 1 3
//!
//! # Remove product 1
//! rs-cart remove 1
//! ```
//!
//! Configuration is read from the environment (see `rocketshoes_cart::config`).
//! The cart is printed after every command. Failures print the user-facing
//! message to stderr and exit with status 1.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocketshoes_cart::CartConfig;
use rocketshoes_core::ProductId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "rs-cart")]
#[command(author, version, about = "RocketShoes cart tools")]
struct Cli {
    /// Override the storage file (`ROCKETSHOES_STORAGE_PATH`)
    #[arg(long, global = true)]
    storage: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the quantity of a product already in the cart
    Set {
        /// Product ID
        id: ProductId,

        /// New quantity (zero or less is ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };
    if let Some(path) = cli.storage.clone() {
        config.storage.path = path;
    }

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to warn so command output stays readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_cart=warn,rocketshoes_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = commands::run(cli.command, &config).await {
        if e.was_notified() {
            tracing::debug!("Command failed: {e}");
        } else {
            tracing::error!("Command failed: {e}");
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from(["rs-cart", "add", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Add { id } if id == ProductId::new(3)));
        assert!(cli.storage.is_none());
    }

    #[test]
    fn test_parse_set_negative_amount() {
        let cli = Cli::try_parse_from(["rs-cart", "set", "3", "-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Set { id, amount: -1 } if id == ProductId::new(3)
        ));
    }

    #[test]
    fn test_parse_storage_override() {
        let cli =
            Cli::try_parse_from(["rs-cart", "show", "--storage", "/tmp/cart.json"]).unwrap();
        assert_eq!(
            cli.storage.as_deref(),
            Some(std::path::Path::new("/tmp/cart.json"))
        );
    }

    #[test]
    fn test_parse_rejects_bad_id() {
        assert!(Cli::try_parse_from(["rs-cart", "remove", "shoe"]).is_err());
    }
}
