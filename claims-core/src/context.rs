use std::sync::Arc;
use crate::config::Config;
use crate::db::{DbPool, create_pool as create_db_pool};
use crate::store::{PgStore, Stores};

#[derive(Clone)]
pub struct ClaimsContext {
    pub config: Arc<Config>,
    pub db_pool: Arc<DbPool>,
}

impl ClaimsContext {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = create_db_pool(&config.database).await?;

        Ok(ClaimsContext {
            config: Arc::new(config),
            db_pool,
        })
    }

    /// Postgres-backed report, user and notification stores sharing this context's pool.
    pub fn stores(&self) -> Stores {
        Stores::from_pg(PgStore::new(self.db_pool.clone()))
    }
}
