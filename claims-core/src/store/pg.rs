use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{NotificationStore, ReportStore, UserStore, CANDIDATE_HORIZON_DAYS};
use crate::db::{DbConnection, DbPool};
use crate::schema::{damage_items, damage_reports, notifications, users};
use crate::types::{
    NewNotification, Notification, NotificationType, ReportRecord, ReportStatus, Role, User,
};

#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct UserRow {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    is_active: bool,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = row
            .role
            .parse()
            .map_err(|e| anyhow!("user {}: {}", row.id, e))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone.filter(|p| !p.trim().is_empty()),
            role,
            is_active: row.is_active,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = damage_reports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ReportRow {
    id: String,
    property_name: String,
    property_address: Option<String>,
    damage_type: Option<String>,
    description: Option<String>,
    damage_date: DateTime<Utc>,
    checkout_date: Option<DateTime<Utc>>,
    airbnb_deadline: Option<DateTime<Utc>>,
    proof_deadline: Option<DateTime<Utc>>,
    submitted_to_airbnb: bool,
    status: String,
    reported_by_id: String,
}

/// Postgres implementation of every store seam, sharing one pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<DbPool>,
}

impl PgStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .await
            .map_err(|e| anyhow!("Failed to get database connection: {}", e))
    }

    /// Attaches reporter and first damaged item to each report row. A reporter
    /// that is missing or unreadable leaves `reporter` empty; the row is kept.
    async fn hydrate(&self, conn: &mut DbConnection, rows: Vec<ReportRow>) -> Result<Vec<ReportRecord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let report_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let reporter_ids: Vec<String> = rows.iter().map(|r| r.reported_by_id.clone()).collect();

        let reporter_rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(reporter_ids))
            .select(UserRow::as_select())
            .load(&mut *conn)
            .await?;

        let mut reporters = HashMap::with_capacity(reporter_rows.len());
        for row in reporter_rows {
            match User::try_from(row) {
                Ok(user) => {
                    reporters.insert(user.id.clone(), user);
                }
                Err(e) => tracing::warn!("Skipping unreadable reporter: {}", e),
            }
        }

        let items: Vec<(String, String)> = damage_items::table
            .filter(damage_items::damage_report_id.eq_any(report_ids))
            .order((damage_items::damage_report_id.asc(), damage_items::created_at.asc()))
            .select((damage_items::damage_report_id, damage_items::item_name))
            .load(&mut *conn)
            .await?;

        let mut first_items: HashMap<String, String> = HashMap::new();
        for (report_id, item_name) in items {
            first_items.entry(report_id).or_insert(item_name);
        }

        let records = rows
            .into_iter()
            .map(|row| {
                let reporter = reporters.get(&row.reported_by_id).cloned();
                if reporter.is_none() {
                    tracing::warn!(
                        "Damage report {} references missing reporter {}",
                        row.id,
                        row.reported_by_id
                    );
                }
                let first_item_name = first_items.remove(&row.id);
                ReportRecord {
                    id: row.id,
                    property_name: row.property_name,
                    property_address: row.property_address,
                    damage_type: row.damage_type,
                    description: row.description,
                    damage_date: row.damage_date,
                    checkout_date: row.checkout_date,
                    airbnb_deadline: row.airbnb_deadline,
                    proof_deadline: row.proof_deadline,
                    submitted_to_airbnb: row.submitted_to_airbnb,
                    status: row.status,
                    reporter,
                    first_item_name,
                }
            })
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn find_reports_with_upcoming_deadlines(&self, now: DateTime<Utc>) -> Result<Vec<ReportRecord>> {
        let horizon = now + Duration::days(CANDIDATE_HORIZON_DAYS);
        let mut conn = self.connection().await?;

        let airbnb_track = damage_reports::submitted_to_airbnb
            .eq(false)
            .and(damage_reports::airbnb_deadline.ge(now))
            .and(damage_reports::airbnb_deadline.lt(horizon));
        let proof_track = damage_reports::status
            .eq(ReportStatus::ProofRequired.as_str())
            .and(damage_reports::proof_deadline.ge(now))
            .and(damage_reports::proof_deadline.lt(horizon));

        let rows: Vec<ReportRow> = damage_reports::table
            .filter(airbnb_track.or(proof_track))
            .order(damage_reports::created_at.asc())
            .select(ReportRow::as_select())
            .load(&mut conn)
            .await?;

        tracing::debug!("Loaded {} deadline candidates before {}", rows.len(), horizon);

        self.hydrate(&mut conn, rows).await
    }

    async fn find_report_by_id(&self, id: &str) -> Result<Option<ReportRecord>> {
        let mut conn = self.connection().await?;

        let row: Option<ReportRow> = damage_reports::table
            .filter(damage_reports::id.eq(id))
            .select(ReportRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(self.hydrate(&mut conn, vec![row]).await?.into_iter().next())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_active_users_by_role(&self, roles: &[Role]) -> Result<Vec<User>> {
        let mut conn = self.connection().await?;
        let role_names: Vec<&'static str> = roles.iter().map(Role::as_str).collect();

        let rows: Vec<UserRow> = users::table
            .filter(users::role.eq_any(role_names))
            .filter(users::is_active.eq(true))
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert(&self, record: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            user_id: record.user_id,
            damage_report_id: record.damage_report_id,
            notification_type: record.notification_type,
            title: record.title,
            message: record.message,
            is_read: false,
            created_at: record.created_at,
            scheduled_for: record.scheduled_for,
        };

        let mut conn = self.connection().await?;
        diesel::insert_into(notifications::table)
            .values((
                notifications::id.eq(&notification.id),
                notifications::user_id.eq(&notification.user_id),
                notifications::damage_report_id.eq(notification.damage_report_id.as_deref()),
                notifications::notification_type.eq(notification.notification_type.as_str()),
                notifications::title.eq(&notification.title),
                notifications::message.eq(&notification.message),
                notifications::is_read.eq(false),
                notifications::created_at.eq(notification.created_at),
                notifications::scheduled_for.eq(notification.scheduled_for),
            ))
            .execute(&mut conn)
            .await?;

        Ok(notification)
    }

    async fn exists_for_report_type_today(
        &self,
        report_id: &str,
        notification_type: NotificationType,
        day_start: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = self.connection().await?;

        let found = diesel::select(exists(
            notifications::table
                .filter(notifications::damage_report_id.eq(report_id))
                .filter(notifications::notification_type.eq(notification_type.as_str()))
                .filter(notifications::created_at.ge(day_start)),
        ))
        .get_result::<bool>(&mut conn)
        .await?;

        Ok(found)
    }
}
