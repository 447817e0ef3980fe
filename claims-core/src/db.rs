use anyhow::{anyhow, Result};
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use std::sync::Arc;
use tokio::time::Duration;

use crate::config::DatabaseConfig;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection = Object<AsyncPgConnection>;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Builds the claims database pool and checks out one connection before returning,
/// backing off 1s, 2s, 4s, 8s between attempts.
pub async fn create_pool(config: &DatabaseConfig) -> Result<Arc<DbPool>> {
    tracing::info!("Setting up claims database pool ({})", mask_database_url(&config.url));

    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    let pool = Pool::builder(manager)
        .max_size(config.max_connections as usize)
        .build()
        .map_err(|e| anyhow!("Failed to create connection pool: {}", e))?;

    let mut last_error = anyhow!("No connection attempt was made");
    for attempt in 1..=CONNECT_ATTEMPTS {
        match tokio::time::timeout(CONNECT_TIMEOUT, pool.get()).await {
            Ok(Ok(_conn)) => {
                tracing::info!("Claims database reachable after {} attempt(s)", attempt);
                return Ok(Arc::new(pool));
            }
            Ok(Err(e)) => {
                tracing::warn!("Database connection attempt {}/{} failed: {}", attempt, CONNECT_ATTEMPTS, e);
                last_error = anyhow!("Database connection failed: {}", e);
            }
            Err(_) => {
                tracing::warn!("Database connection attempt {}/{} timed out", attempt, CONNECT_ATTEMPTS);
                last_error = anyhow!("Database connection timed out");
            }
        }

        if attempt < CONNECT_ATTEMPTS {
            tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt - 1))).await;
        }
    }

    tracing::error!("Giving up on the claims database after {} attempts", CONNECT_ATTEMPTS);
    Err(last_error)
}

pub(crate) fn mask_database_url(url: &str) -> String {
    let Some(at_pos) = url.rfind('@') else {
        return "Invalid URL format".to_string();
    };
    let (credentials, host) = url.split_at(at_pos);
    match credentials.rfind(':') {
        Some(colon_pos) if colon_pos > "postgres:".len() => {
            format!("{}:****{}", &credentials[..colon_pos], host)
        }
        _ => format!("postgres://****{}", host),
    }
}
