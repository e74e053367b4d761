use std::sync::Arc;

use stratus::api::router::create_router;
use stratus::config::AppConfig;
use stratus::execution::scan_loop::ScanLoop;
use stratus::execution::strategy::IdleStrategy;
use stratus::services::notifier::{AlertTransport, LogTransport, TelegramTransport};
use stratus::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = stratus::metrics::init_metrics()?;

    if config.has_exchange_auth() {
        tracing::info!("Exchange API credentials loaded");
    } else {
        tracing::warn!("No exchange API credentials, strategy runs without an order client");
    }

    // --- Alerts: Telegram when configured, log-only otherwise ---
    let transport: Arc<dyn AlertTransport> = match config.telegram_credentials() {
        Some((token, chat_id)) => {
            tracing::info!("Telegram notifications enabled");
            Arc::new(TelegramTransport::new(
                config.telegram_api_url.clone(),
                token.to_string(),
                chat_id.to_string(),
            ))
        }
        None => {
            tracing::warn!("Telegram notifications disabled, alerts will only be logged");
            Arc::new(LogTransport)
        }
    };

    let state = AppState::new(config, transport, metrics_handle);

    // --- Trading loop ---
    let scan_loop = ScanLoop::new(
        state.store.clone(),
        Arc::new(IdleStrategy),
        state.alerts.clone(),
        state.config.scan_loop(),
    );
    tokio::spawn(scan_loop.run());

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
