use anyhow::Result;
use axum::{
    extract::Extension,
    routing::{get, post, put},
    Router,
};
use claims_core::config::ServerConfig;
use claims_core::{ClaimsContext, DbPool};
use claims_notify::NotificationService;
use std::env;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared handler state: the inbox pool and the notification service.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<DbPool>,
    pub notifier: NotificationService,
}

impl AppState {
    pub fn new(ctx: &ClaimsContext, notifier: NotificationService) -> Self {
        Self {
            db_pool: ctx.db_pool.clone(),
            notifier,
        }
    }
}

fn cors_layer() -> CorsLayer {
    match env::var("CORS_ORIGINS") {
        Ok(origins) => {
            let mut cors = CorsLayer::new();
            for origin in origins.split(',').map(str::trim).filter(|o| !o.is_empty()) {
                match origin.parse::<axum::http::HeaderValue>() {
                    Ok(parsed) => cors = cors.allow_origin(parsed),
                    Err(_) => tracing::warn!("Ignoring invalid CORS origin {:?}", origin),
                }
            }
            cors.allow_methods(Any).allow_headers(Any)
        }
        Err(_) => {
            tracing::warn!("CORS_ORIGINS not set, using permissive CORS. Set CORS_ORIGINS for production!");
            CorsLayer::permissive()
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/test/reminders", post(handlers::trigger_reminders))
        .route("/api/internal/damages/:id/created", post(handlers::damage_report_created))
        .route("/api/internal/damages/:id/status", post(handlers::damage_status_changed))
        .route("/api/notifications", get(handlers::list_notifications))
        .route("/api/notifications/unread-count", get(handlers::unread_count))
        .route("/api/notifications/read-all", put(handlers::mark_all_read))
        .route("/api/notifications/:id/read", put(handlers::mark_read))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(state))
                .layer(cors_layer()),
        )
}

/// Serves the API until Ctrl-C.
pub async fn run(state: AppState, server: &ServerConfig) -> Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", server.host, server.api_port);
    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
