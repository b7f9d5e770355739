use anyhow::{Context, Result};
use clap::Parser;
use nutricycle::{create_router, AppState, Config};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "nutricycle", about = "Waste-stream contamination monitor")]
struct Args {
    /// Configuration file (without extension); defaults apply when missing.
    #[arg(long, default_value = "config/nutricycle")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;
    cfg.validate()?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "stream: {:?} ({}), detection backend: {}",
        cfg.stream.kind, cfg.stream.url, cfg.detection.backend
    );

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(cfg)?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
