//! Storage seams for the notification engine.
//!
//! The report and user tables belong to the claims application; this crate only
//! reads them. The notification table is append-only from here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::types::{NewNotification, Notification, NotificationType, ReportRecord, Role, User};

mod pg;

pub use pg::PgStore;

/// How far ahead of `now` deadline candidates are fetched.
pub const CANDIDATE_HORIZON_DAYS: i64 = 2;

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Reports with an unsubmitted airbnb deadline, or a proof deadline while
    /// `PROOF_REQUIRED`, falling in `[now, now + 2 days)`.
    async fn find_reports_with_upcoming_deadlines(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ReportRecord>>;

    async fn find_report_by_id(&self, id: &str) -> anyhow::Result<Option<ReportRecord>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_active_users_by_role(&self, roles: &[Role]) -> anyhow::Result<Vec<User>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, record: NewNotification) -> anyhow::Result<Notification>;

    /// Whether a notification of `notification_type` for the report was created at or after `day_start`.
    async fn exists_for_report_type_today(
        &self,
        report_id: &str,
        notification_type: NotificationType,
        day_start: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
}

/// The three stores the notification engine reads and writes, injected at startup.
#[derive(Clone)]
pub struct Stores {
    pub reports: Arc<dyn ReportStore>,
    pub users: Arc<dyn UserStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    pub fn from_pg(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            reports: store.clone(),
            users: store.clone(),
            notifications: store,
        }
    }
}
