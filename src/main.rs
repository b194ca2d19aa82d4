use anyhow::Context;
use clap::Parser;
use search_gateway::{
    api::{build_router, AppState},
    config::Config,
    documents::DocumentService,
    engine::{acquire_connection, ConnectionSupervisor, ElasticsearchClient},
    error::AppError,
    server, telemetry,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "search-backend", version)]
#[command(about = "Backend gateway: document CRUD and search over Elasticsearch", long_about = None)]
struct Args {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<String>,

    /// Listen host
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())
        .map_err(AppError::from)
        .context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.backend.host = host;
    }
    if let Some(port) = args.port {
        config.backend.port = port;
    }

    telemetry::init_tracing(&config.observability);

    tracing::info!("Starting search backend v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        url = %config.elasticsearch.url,
        index = %config.elasticsearch.index,
        "Search engine configured"
    );

    let supervisor = if config.elasticsearch.eager_connect {
        let supervisor = acquire_connection(&config.elasticsearch)
            .await
            .context("Elasticsearch is not available")?;
        tracing::info!("✅ Search engine connected");
        supervisor
    } else {
        let client = ElasticsearchClient::from_config(&config.elasticsearch)
            .context("Invalid Elasticsearch configuration")?;
        tracing::info!("Search engine will be connected on first request");
        Arc::new(ConnectionSupervisor::from_config(
            Arc::new(client),
            &config.elasticsearch,
        ))
    };

    let documents = Arc::new(DocumentService::from_config(
        supervisor,
        &config.elasticsearch,
    ));
    let app = build_router(AppState::new(documents), &config.backend);

    server::serve(app, &config.backend.host, config.backend.port).await?;
    Ok(())
}
