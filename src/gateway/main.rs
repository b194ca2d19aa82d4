use anyhow::Context;
use clap::Parser;
use search_gateway::{
    config::Config,
    error::AppError,
    frontend::{build_frontend_router, BackendClient, FrontendState},
    server, telemetry,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "search-frontend", version)]
#[command(about = "Frontend gateway: browser UI and forwarding to the search backend", long_about = None)]
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
        config.frontend.host = host;
    }
    if let Some(port) = args.port {
        config.frontend.port = port;
    }

    telemetry::init_tracing(&config.observability);

    tracing::info!("Starting search frontend v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(backend_url = %config.frontend.backend_url, "Forwarding to backend");

    let backend = BackendClient::new(&config.frontend).context("Invalid backend configuration")?;
    let app = build_frontend_router(FrontendState::new(Arc::new(backend)), &config.frontend);

    server::serve(app, &config.frontend.host, config.frontend.port).await?;
    Ok(())
}
