//! herald: publish linked data offers to a dataspace connector
//!
//! Usage:
//!   herald publish --manifest offer.json              → build graph + register
//!   herald publish --manifest offer.json --dry-run    → in-memory run, print outcome
//!   herald publish --manifest offer.json --no-broker  → build and link only
//!   herald lint --manifest offer.json                 → offline checks, no calls
//!   herald version                                    → show version

mod manifest;

use clap::{Parser, Subcommand};
use herald_core::{EntityKind, HeraldConfig};
use herald_graph::{BrokerPublisher, CatalogSpec, GraphBuilder, OfferDescription, Publication};
use herald_store::{Broker, EntityStore, HttpBroker, HttpEntityStore, MemoryBroker, MemoryStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "herald",
    about = "Publish linked data offers to a dataspace connector and its metadata broker",
    version = env!("CARGO_PKG_VERSION"),
    long_about = "herald builds the offer graph described by a manifest on a\n\
                  dataspace connector (catalog, offer, representations, artifacts,\n\
                  contract, rules), links it, and registers the offer with a\n\
                  metadata broker under the externally routable hostname."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and link the offer graph, then register it with the broker
    Publish {
        /// Offer manifest file
        #[arg(short, long)]
        manifest: PathBuf,

        /// Config file (default: herald.json next to the manifest, then cwd)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the connector's management API base URL
        #[arg(long)]
        store_url: Option<String>,

        /// Override the broker's IDS endpoint URL
        #[arg(long)]
        broker_url: Option<String>,

        /// Bearer token for remote artifacts without a manifest credential
        /// (or set HERALD_BACKEND_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Run against an in-memory store and broker instead of the network
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Skip broker registration
        #[arg(long, default_value_t = false)]
        no_broker: bool,
    },
    /// Check a manifest offline without issuing any call
    Lint {
        /// Offer manifest file
        #[arg(short, long)]
        manifest: PathBuf,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Publish {
            manifest,
            config,
            store_url,
            broker_url,
            token,
            dry_run,
            no_broker,
        } => {
            init_tracing();
            let config = load_config(&manifest, config.as_deref(), store_url, broker_url)?;
            let offer = load_offer(&manifest, token)?;
            publish(&config, &offer, dry_run, no_broker).await?;
        }

        Commands::Lint { manifest } => {
            let offer = manifest::load_offer(&manifest)?;
            offer.validate()?;
            println!(
                "ok: {} representation(s), {} planned link(s)",
                offer.representations.len(),
                offer.planned_links()
            );
        }

        Commands::Version => {
            println!("herald v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "herald=info,herald_core=info,herald_store=info,herald_graph=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Config precedence: explicit file, else discovery next to the manifest,
/// with flag and environment overrides on top.
fn load_config(
    manifest: &Path,
    config: Option<&Path>,
    store_url: Option<String>,
    broker_url: Option<String>,
) -> anyhow::Result<HeraldConfig> {
    let mut config = match config {
        Some(path) => HeraldConfig::load(path)?,
        None => HeraldConfig::discover(Some(manifest))?,
    };
    if let Some(url) = store_url {
        config.store.base_url = url;
    }
    if let Some(url) = broker_url {
        config.broker.url = url;
    }
    if let Ok(user) = std::env::var("HERALD_STORE_USER") {
        config.store.user = user;
    }
    if let Ok(password) = std::env::var("HERALD_STORE_PASSWORD") {
        config.store.password = password;
    }
    Ok(config)
}

fn load_offer(path: &Path, token: Option<String>) -> anyhow::Result<OfferDescription> {
    let mut offer = manifest::load_offer(path)?;
    let token = token.or_else(|| std::env::var("HERALD_BACKEND_TOKEN").ok());
    if let Some(token) = &token {
        manifest::stamp_bearer_token(&mut offer, token);
    }
    Ok(offer)
}

async fn publish(
    config: &HeraldConfig,
    offer: &OfferDescription,
    dry_run: bool,
    no_broker: bool,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; abandoning the run");
                cancel.cancel();
            }
        });
    }

    if dry_run {
        let store = Arc::new(MemoryStore::new());
        if let CatalogSpec::Existing(id) = &offer.catalog {
            store.adopt(id, EntityKind::Catalog).await;
        }
        let broker = Arc::new(MemoryBroker::new());
        let publication = run(store, broker, config, offer, no_broker, &cancel).await?;
        print_outcome(&publication)?;
        return Ok(());
    }

    let store = Arc::new(HttpEntityStore::from_config(&config.store)?);
    let broker = Arc::new(HttpBroker::from_config(&config.store, &config.broker)?);
    let publication = run(store, broker, config, offer, no_broker, &cancel).await?;
    print_outcome(&publication)?;
    Ok(())
}

async fn run(
    store: Arc<dyn EntityStore>,
    broker: Arc<dyn Broker>,
    config: &HeraldConfig,
    offer: &OfferDescription,
    no_broker: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<Publication> {
    let builder = GraphBuilder::new(store);
    let mut publication = builder.build_cancellable(offer, cancel).await?;

    if !no_broker {
        let publisher =
            BrokerPublisher::new(broker, &config.broker).with_retry(config.retry.clone());
        publisher.publish(&mut publication, cancel).await?;
    }
    Ok(publication)
}

fn print_outcome(publication: &Publication) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(publication)?);
    Ok(())
}
