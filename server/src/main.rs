use anyhow::{Context, Result};
use clap::Parser;
use server::build_app;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, EnvFilter};

/// Serve boolean feed search over a persisted index
#[derive(Parser)]
#[command(name = "server")]
struct Args {
    /// Directory written by `indexer build`
    #[arg(long, default_value = "./index")]
    index: String,
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let app = build_app(args.index.clone())
        .with_context(|| format!("cannot serve index at {}", args.index))?
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("bind {}:{}", args.host, args.port))?;
    tracing::info!(addr = %listener.local_addr()?, index = %args.index, "server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
