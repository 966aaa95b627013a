//! Virtual-host gateway daemon.
//!
//! Sits in front of a CouchDB-style document database and routes requests
//! by Host header: per-tenant document proxies, reverse proxies and static
//! file sets, all configured through `goydb.vhost:*` documents in the
//! `_admin` database. Unconfigured hosts pass straight through to the
//! database API.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::util::BoxCloneSyncService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use vhost_gateway::config::{load_config, GatewayConfig};
use vhost_gateway::http::{forward, AppState, FallbackService, GatewayServer};
use vhost_gateway::lifecycle::{signals, Shutdown};
use vhost_gateway::observability::metrics;
use vhost_gateway::routing::table::Origin;
use vhost_gateway::routing::{Rebuilder, SharedTable};
use vhost_gateway::store::HttpDocumentStore;

#[derive(Parser)]
#[command(name = "vhost-gateway")]
#[command(about = "Virtual-host routing layer for a document database", long_about = None)]
struct Args {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    // RUST_LOG wins over the configured level.
    let default_filter = format!(
        "vhost_gateway={level},tower_http={level}",
        level = config.observability.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("vhost-gateway v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        rebuild_interval_secs = config.rebuild.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let upstream_url = Url::parse(&config.upstream.url)?;
    let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
    let fallback = upstream_fallback(client.clone(), &upstream_url)?;

    let store = HttpDocumentStore::new(upstream_url, reqwest::Client::new());
    let table = SharedTable::new();
    let rebuilder = Rebuilder::new(store, table.clone())
        .with_source(&config.upstream.admin_database, &config.upstream.document_prefix);

    // First table before we accept traffic; a failure here is survivable,
    // everything falls through until the next rebuild succeeds.
    if let Err(err) = rebuilder.rebuild().await {
        tracing::error!(error = %err, "Initial rebuild failed, starting with an empty routing table");
    }

    let shutdown = Shutdown::new();
    let (reload_tx, reload_rx) = mpsc::channel(1);
    tokio::spawn(rebuilder.run(
        Duration::from_secs(config.rebuild.interval_secs),
        reload_rx,
        shutdown.subscribe(),
    ));
    tokio::spawn(signals::watch(shutdown.clone(), reload_tx));

    let state = AppState {
        table,
        client,
        fallback,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    GatewayServer::new(&config, state)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// The application default handler of this deployment: a pass-through
/// proxy to the document database API. Unmatched hosts and document-proxy
/// rewrites both land here.
fn upstream_fallback(
    client: Client<HttpConnector, axum::body::Body>,
    base: &Url,
) -> Result<FallbackService, Box<dyn std::error::Error>> {
    let origin = Origin::from_url(base).map_err(std::io::Error::other)?;

    let service = tower::service_fn(move |request| {
        let client = client.clone();
        let origin = origin.clone();
        async move {
            Ok::<_, std::convert::Infallible>(
                forward::proxy_to_origin(&client, request, &origin).await,
            )
        }
    });

    Ok(BoxCloneSyncService::new(service))
}
