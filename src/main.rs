//! Verse-search HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use verse_search::config::Config;
use verse_search::embedding::{EmbedderConfig, MpnetEmbedder};
use verse_search::gateway::{HandlerState, create_router_with_state};
use verse_search::registry::CorpusRegistry;
use verse_search::store::PgSearchBackend;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "Verse search starting"
    );

    let embedder_config = if let Some(path) = &config.model_path {
        EmbedderConfig::new(path.clone())
    } else {
        tracing::warn!("No VERSE_MODEL_PATH configured, running embedder in stub mode");
        EmbedderConfig::stub()
    };
    let embedder = Arc::new(MpnetEmbedder::load(embedder_config)?);

    let backend = PgSearchBackend::connect(&config.database_url(), config.db_pool_size).await?;
    tracing::info!(
        host = %config.db_host,
        db = %config.db_name,
        pool_size = config.db_pool_size,
        "Store pool connected"
    );

    let registry = Arc::new(CorpusRegistry::new(Arc::new(backend.clone())));
    tracing::info!(corpora = ?registry.supported().await, "Corpus registry primed");

    let state = HandlerState::new(embedder, registry, backend);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Verse search shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("VERSE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8000);

    let url = format!("http://127.0.0.1:{}/health", port);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");

    rt.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .expect("failed to build client");

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
