use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use stylemuse::{
    config::Config,
    demo::DemoStylist,
    gemini::GeminiClient,
    orchestrator::Orchestrator,
    routes::{router, AppState},
    stylist::Stylist,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let stylist: Arc<dyn Stylist> = match &config.gemini {
        Some(gemini) => {
            tracing::info!("Using API key: {}...", &gemini.api_key.chars().take(6).collect::<String>());
            Arc::new(GeminiClient::new(gemini.clone()))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set, running with the offline demo stylist");
            Arc::new(DemoStylist)
        }
    };

    let orchestrator = Orchestrator::new(stylist);
    orchestrator.spawn_session_sweeper(config.session_ttl);
    tracing::info!("Idle sessions expire after {:?}", config.session_ttl);

    let state = AppState {
        orchestrator,
        max_upload_bytes: config.max_upload_bytes,
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
