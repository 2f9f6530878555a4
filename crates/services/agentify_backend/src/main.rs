use agentify_backend::{routes, AppState};
use agentify_common::{log_error, logging};
use agentify_config::load_config;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log_error(e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    logging::init();

    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            log_error(e, "Failed to load configuration");
            process::exit(1);
        }
    };

    let state = match AppState::from_config(config.clone()) {
        Ok(state) => state,
        Err(e) => {
            log_error(e, "Failed to initialise services");
            process::exit(1);
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log_error(e, &format!("Failed to bind {}", addr));
            process::exit(1);
        }
    };
    info!("Starting server at http://{}", addr);

    if let Err(e) = axum::serve(listener, routes(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        log_error(e, "Server error");
        process::exit(1);
    }
}
