//! Storefront HTTP server.
//!
//! Wires the hosted identity and data backend into a session coordinator,
//! serves the HTTP surface and tears the session down on shutdown.
//!
//! All HTTP callers share the one session the process holds, so the server
//! listens on `127.0.0.1` unless `HOST` says otherwise.
//!
//! # Usage
//!
//! ```bash
//! SUPABASE_URL=https://<project>.supabase.co SUPABASE_ANON_KEY=<key> cargo run --bin storefront
//! ```

mod config;

use config::Config;
use storefront_auth::{SessionConfig, SessionCoordinator, SupabaseClient};
use storefront_web::{AppState, build_router};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Storefront HTTP Server");

    let config = Config::from_env()?;
    info!(
        supabase_url = %config.supabase.url,
        products_table = %config.supabase.products_table,
        "Configuration loaded"
    );

    let backend = SupabaseClient::new(&config.supabase.url, &config.supabase.anon_key);

    let session_config = SessionConfig::default()
        .with_request_timeout(config.request_timeout())
        .with_shutdown_timeout(config.shutdown_timeout());
    let session = SessionCoordinator::new(backend.clone(), session_config);
    session.start().await?;
    info!("Session coordinator started");

    let state = AppState::new(session.clone(), backend)
        .with_products_table(config.supabase.products_table.clone());
    let app = build_router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = session.shutdown(config.shutdown_timeout()).await {
        warn!(error = %e, "Session coordinator did not stop cleanly");
    }

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
