//! Donor dashboard endpoints
//!
//! Read-oriented aggregation of links, student records, and
//! notifications, plus the bulk mark-read mutation.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sproutlink_common::human_time::format_relative_day;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::Notification;
use crate::AppState;

/// Characters of progress narrative shown in the dashboard preview
const PREVIEW_CHARS: usize = 50;

const JOURNAL_ENTRY_MARKER: &str = "📝 New journal entry";
const NO_MESSAGES: &str = "No messages yet";

/// One row of the donor's children dashboard
#[derive(Debug, Serialize)]
pub struct ChildSummary {
    pub id: String,
    pub name: String,
    pub age: Option<i64>,
    pub location: String,
    pub journal_count: usize,
    pub report_count: usize,
    pub online: bool,
    pub unread: i64,
    #[serde(rename = "lastMessage")]
    pub last_message: String,
    pub timestamp: String,
}

/// GET /donor/get_all_children/{donor_id}
///
/// A failure for one student degrades to a log line and a skipped row;
/// only the initial link fetch failing fails the request.
pub async fn get_all_children(
    State(state): State<AppState>,
    Path(donor_id): Path<String>,
) -> ApiResult<Json<Vec<ChildSummary>>> {
    let student_ids = db::links::list_student_ids_for_donor(&state.db, &donor_id)
        .await
        .map_err(|e| {
            tracing::error!(donor_id = %donor_id, "Link fetch failed: {}", e);
            ApiError::Internal("Error fetching children".to_string())
        })?;

    let mut children = Vec::with_capacity(student_ids.len());

    for student_id in student_ids {
        match build_child_summary(&state, &donor_id, &student_id).await {
            Ok(Some(summary)) => children.push(summary),
            Ok(None) => {
                tracing::warn!(
                    donor_id = %donor_id,
                    student_id = %student_id,
                    "Linked student has no record, skipping"
                );
            }
            Err(e) => {
                tracing::warn!(
                    donor_id = %donor_id,
                    student_id = %student_id,
                    "Child summary failed, skipping: {}",
                    e
                );
            }
        }
    }

    Ok(Json(children))
}

async fn build_child_summary(
    state: &AppState,
    donor_id: &str,
    student_id: &str,
) -> anyhow::Result<Option<ChildSummary>> {
    let record = match db::students::get_student(&state.db, student_id).await? {
        Some(record) => record,
        None => return Ok(None),
    };

    let latest = db::notifications::latest_notification(&state.db, donor_id, student_id).await?;

    let (last_message, timestamp, unread) = match latest {
        Some(notification) => {
            let unread =
                db::notifications::count_notifications(&state.db, donor_id, student_id).await?;
            (
                preview_text(&notification),
                format_relative_day(&notification.created_at, Utc::now()),
                unread,
            )
        }
        None => (NO_MESSAGES.to_string(), String::new(), 0),
    };

    Ok(Some(ChildSummary {
        id: record.student_id.clone(),
        name: record
            .name
            .unwrap_or_else(|| format!("Student {}", record.student_id)),
        age: record.age,
        location: record.location.unwrap_or_else(|| "Unknown".to_string()),
        journal_count: record.journal_list.len(),
        report_count: record.report_list.len(),
        online: false,
        unread,
        last_message,
        timestamp,
    }))
}

/// Dashboard preview line for the latest notification
fn preview_text(notification: &Notification) -> String {
    if let Some(report) = &notification.learning_report {
        if !report.progress_update.is_empty() {
            let prefix: String = report.progress_update.chars().take(PREVIEW_CHARS).collect();
            return format!("{}...", prefix);
        }
    }

    if notification.journal_image.is_some() {
        return JOURNAL_ENTRY_MARKER.to_string();
    }

    NO_MESSAGES.to_string()
}

/// GET /donor/get_all_notifications/{donor_id}/{student_id}
pub async fn get_all_notifications(
    State(state): State<AppState>,
    Path((donor_id, student_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications =
        db::notifications::list_notifications(&state.db, &donor_id, &student_id).await?;
    Ok(Json(notifications))
}

/// GET /donor/get_donor_id_by_supabase_id/{supabase_id}
pub async fn get_donor_id_by_supabase_id(
    State(state): State<AppState>,
    Path(supabase_id): Path<String>,
) -> ApiResult<Json<String>> {
    let donor_id = db::donors::get_donor_id_by_auth_id(&state.db, &supabase_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Donor not found".to_string()))?;

    Ok(Json(donor_id))
}

/// POST /donor/mark_notifications_read/{donor_id}/{student_id}
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    Path((donor_id, student_id)): Path<(String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    db::notifications::mark_notifications_read(&state.db, &donor_id, &student_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Notifications marked as read"
    })))
}

/// GET /donor/unread_count/{donor_id}/{student_id}
pub async fn unread_count(
    State(state): State<AppState>,
    Path((donor_id, student_id)): Path<(String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    let count = db::notifications::count_notifications(&state.db, &donor_id, &student_id).await?;

    Ok(Json(json!({ "unread_count": count })))
}

/// Build donor routes
pub fn donor_routes() -> Router<AppState> {
    Router::new()
        .route("/donor/get_all_children/:donor_id", get(get_all_children))
        .route(
            "/donor/get_all_notifications/:donor_id/:student_id",
            get(get_all_notifications),
        )
        .route(
            "/donor/get_donor_id_by_supabase_id/:supabase_id",
            get(get_donor_id_by_supabase_id),
        )
        .route(
            "/donor/mark_notifications_read/:donor_id/:student_id",
            post(mark_notifications_read),
        )
        .route(
            "/donor/unread_count/:donor_id/:student_id",
            get(unread_count),
        )
}
