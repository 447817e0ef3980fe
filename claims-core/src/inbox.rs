//! Per-user notification inbox queries backing the read/unread endpoints.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;

use crate::db::DbConnection;
use crate::schema::notifications;
use crate::types::Notification;

pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page number whose offset still fits in an `i64` at any page size.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct NotificationRow {
    id: String,
    user_id: String,
    damage_report_id: Option<String>,
    notification_type: String,
    title: String,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
    scheduled_for: Option<DateTime<Utc>>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = anyhow::Error;

    fn try_from(row: NotificationRow) -> anyhow::Result<Self> {
        Ok(Notification {
            notification_type: row.notification_type.parse()?,
            id: row.id,
            user_id: row.user_id,
            damage_report_id: row.damage_report_id,
            title: row.title,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
            scheduled_for: row.scheduled_for,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Clamps to 1 <= page <= `MAX_PAGE` and 1 <= limit <= 100.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InboxPage {
    pub notifications: Vec<Notification>,
    pub total: i64,
    pub unread_count: i64,
}

/// Newest-first page of a user's notifications.
pub async fn list_for_user(
    conn: &mut DbConnection,
    user_id: &str,
    unread_only: bool,
    page: PageRequest,
) -> anyhow::Result<InboxPage> {
    let mut query = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .order(notifications::created_at.desc())
        .limit(page.limit)
        .offset(page.offset())
        .into_boxed();
    let mut total_query = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .count()
        .into_boxed();

    if unread_only {
        query = query.filter(notifications::is_read.eq(false));
        total_query = total_query.filter(notifications::is_read.eq(false));
    }

    let rows: Vec<NotificationRow> = query
        .select(NotificationRow::as_select())
        .load(&mut *conn)
        .await?;
    let total: i64 = total_query.get_result(&mut *conn).await?;
    let unread_count = count_unread(conn, user_id).await?;

    let notifications = rows
        .into_iter()
        .map(Notification::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(InboxPage {
        notifications,
        total,
        unread_count,
    })
}

pub async fn count_unread(conn: &mut DbConnection, user_id: &str) -> anyhow::Result<i64> {
    let count = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::is_read.eq(false))
        .count()
        .get_result(&mut *conn)
        .await?;
    Ok(count)
}

/// Marks one notification read. Returns `false` when it does not exist for this user.
pub async fn mark_read(conn: &mut DbConnection, user_id: &str, notification_id: &str) -> anyhow::Result<bool> {
    let updated = diesel::update(
        notifications::table
            .filter(notifications::id.eq(notification_id))
            .filter(notifications::user_id.eq(user_id)),
    )
    .set(notifications::is_read.eq(true))
    .execute(&mut *conn)
    .await?;

    Ok(updated > 0)
}

pub async fn mark_all_read(conn: &mut DbConnection, user_id: &str) -> anyhow::Result<usize> {
    let updated = diesel::update(
        notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(false)),
    )
    .set(notifications::is_read.eq(true))
    .execute(&mut *conn)
    .await?;

    Ok(updated)
}
