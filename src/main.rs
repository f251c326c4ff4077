use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::config::{Config, Overrides};
use storefront::HttpUpstream;

/// HTTP gateway for the storefront product catalog
#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Port number
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Base address of the upstream product service
    #[arg(long, value_name = "URL")]
    upstream_url: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, value_name = "SECS")]
    upstream_timeout_secs: Option<u64>,

    /// Reject product requests that carry no bearer credential
    #[arg(long)]
    require_credential: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = Config::load(
        args.config.as_ref(),
        &Overrides {
            bind: args.bind,
            port: args.port,
            upstream_url: args.upstream_url,
            upstream_timeout_secs: args.upstream_timeout_secs,
            require_credential: args.require_credential,
        },
    )?;

    info!(
        "Configuration loaded: bind={}:{} upstream={} require_credential={}",
        config.bind, config.port, config.upstream.base_url, config.auth.require_credential
    );

    let upstream = Arc::new(HttpUpstream::new(&config.upstream)?);

    tokio::select! {
        result = storefront::api::run(config, upstream) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
