use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidbridge::{
    cache::CacheService, config::Config, fetch::PageFetcher, providers::SITES, web::WebServer,
};

#[derive(Parser)]
#[command(name = "vidbridge")]
#[command(version = "0.1.0")]
#[command(about = "Video site bridge serving addon-protocol catalogs and streams")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Public base URL used to rewrite streams through the relay
    #[arg(short = 'b', long, value_name = "URL")]
    base_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("vidbridge={},tower_http=trace", cli.log_level)
    } else {
        format!("vidbridge={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting VidBridge v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration from specified file
    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(base_url) = cli.base_url {
        config.web.base_url = base_url;
    }

    info!(
        "Serving {} sites: {}",
        SITES.len(),
        SITES
            .iter()
            .map(|site| site.id)
            .collect::<Vec<_>>()
            .join(", ")
    );
    if config.web.base_url.trim().is_empty() {
        info!("No base URL configured, streams carry referer hints instead of relay URLs");
    } else {
        info!("Relay rewriting enabled via {}", config.web.base_url);
    }

    let fetcher = Arc::new(PageFetcher::new(&config.fetch));
    let cache = CacheService::new(&config.cache);

    let web_server = WebServer::new(config, fetcher, cache).await?;

    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    info!(
        "Manifest available at http://{}:{}/manifest.json",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}
