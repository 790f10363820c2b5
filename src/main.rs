mod bridge;
mod config;
mod connection;
mod error;
mod handlers;
#[cfg(test)]
mod mock;
mod session;
mod types;

use std::future::IntoFuture;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use tower_http::cors::CorsLayer;

use bridge::BridgeFactory;
use config::Config;
use connection::ConnectionManager;
use handlers::AppState;

async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(api_key) = state.api_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth_header.strip_prefix("Bearer ").unwrap_or(auth_header);

    if token == api_key {
        Ok(next.run(req).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/sendMessage", post(handlers::send_message))
        .route("/api/status", get(handlers::status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let config = Config::from_env();
    info!("Session: {}", config.session.session);
    info!("Bridge: {}", config.bridge.base_url);

    let factory = BridgeFactory::new(config.bridge.clone())?;
    let connection = Arc::new(ConnectionManager::new(Arc::new(factory), config.session));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Bootstrap is fire-and-forget; handlers answer 503 until it succeeds.
    connection.spawn_connect();

    let state = Arc::new(AppState {
        connection: connection.clone(),
        api_key: config.api_key,
    });

    info!("{}", "=".repeat(50));
    info!("WhatsApp API server running on http://localhost:{}", config.port);
    info!("{}", "=".repeat(50));
    info!("Waiting for WhatsApp connection...");
    info!("If no QR code appears, check the bridge's browser session.");

    tokio::select! {
        res = axum::serve(listener, app(state)).into_future() => res?,
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Shutting down...");
            connection.close().await;
        }
    }

    Ok(())
}
