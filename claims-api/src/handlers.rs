use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use claims_core::db::DbConnection;
use claims_core::inbox::{self, PageRequest};
use claims_core::types::ReportStatus;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::server::AppState;

type ApiError = (StatusCode, Json<Value>);

fn internal_error(message: &str, e: anyhow::Error) -> ApiError {
    tracing::error!("{}: {}", message, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": message, "error": e.to_string() })),
    )
}

async fn connection(state: &AppState) -> Result<DbConnection, ApiError> {
    state
        .db_pool
        .get()
        .await
        .map_err(|e| internal_error("Database unavailable", anyhow::anyhow!("{}", e)))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "claims-api"
    }))
}

/// Runs one reminder scan on demand, outside the hourly schedule.
pub async fn trigger_reminders(Extension(state): Extension<AppState>) -> Result<Json<Value>, ApiError> {
    let summary = state
        .notifier
        .check_and_send_reminders()
        .await
        .map_err(|e| internal_error("Error checking reminders", e))?;

    Ok(Json(json!({
        "message": "Reminder check completed",
        "timestamp": Utc::now(),
        "summary": summary,
    })))
}

pub async fn damage_report_created(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let summary = state.notifier.notify_new_damage_report(&id).await;
    (StatusCode::ACCEPTED, Json(json!(summary)))
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: String,
}

pub async fn damage_status_changed(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusChange>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let status: ReportStatus = body.status.parse().map_err(|e: claims_core::types::ParseEnumError| {
        (StatusCode::BAD_REQUEST, Json(json!({ "message": e.to_string() })))
    })?;

    let summary = state.notifier.notify_status_update(&id, status).await;
    Ok((StatusCode::ACCEPTED, Json(json!(summary))))
}

#[derive(Deserialize)]
pub struct InboxQuery {
    pub user_id: String,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub unread_only: Option<bool>,
}

pub async fn list_notifications(
    Extension(state): Extension<AppState>,
    Query(params): Query<InboxQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = PageRequest::new(params.page, params.limit);
    let mut conn = connection(&state).await?;

    let inbox = inbox::list_for_user(&mut conn, &params.user_id, params.unread_only.unwrap_or(false), page)
        .await
        .map_err(|e| internal_error("Error fetching notifications", e))?;

    Ok(Json(json!({
        "notifications": inbox.notifications,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": inbox.total,
            "total_pages": page.total_pages(inbox.total),
        },
        "unread_count": inbox.unread_count,
    })))
}

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

pub async fn unread_count(
    Extension(state): Extension<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = connection(&state).await?;
    let count = inbox::count_unread(&mut conn, &params.user_id)
        .await
        .map_err(|e| internal_error("Error fetching unread count", e))?;

    Ok(Json(json!({ "count": count })))
}

pub async fn mark_read(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = connection(&state).await?;
    let found = inbox::mark_read(&mut conn, &params.user_id, &id)
        .await
        .map_err(|e| internal_error("Error marking notification as read", e))?;

    if !found {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Notification not found" })),
        ));
    }

    Ok(Json(json!({ "message": "Notification marked as read" })))
}

pub async fn mark_all_read(
    Extension(state): Extension<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = connection(&state).await?;
    let count = inbox::mark_all_read(&mut conn, &params.user_id)
        .await
        .map_err(|e| internal_error("Error marking notifications as read", e))?;

    Ok(Json(json!({ "message": "All notifications marked as read", "count": count })))
}
