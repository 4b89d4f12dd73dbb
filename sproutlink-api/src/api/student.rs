//! Journal submission endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::models::Report;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct JournalSubmission {
    pub student_id: String,
    pub journal: String,
    #[serde(default)]
    pub journal_topic: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub message: String,
    pub report: Report,
}

/// POST /student/submit
///
/// Generates and persists the learning report, then ensures a donor
/// link and appends a notification. The report survives a failed
/// notification; the response message says which happened.
pub async fn submit_journal(
    State(state): State<AppState>,
    Json(payload): Json<JournalSubmission>,
) -> ApiResult<Json<SubmissionResponse>> {
    if payload.journal.trim().is_empty() {
        return Err(crate::error::ApiError::BadRequest(
            "Journal text must not be empty".to_string(),
        ));
    }

    let report = state
        .report_service
        .submit(
            &state.db,
            &payload.student_id,
            &payload.journal,
            &payload.journal_topic,
        )
        .await?;

    let notified = match state.linking.ensure_link(&state.db, &payload.student_id).await {
        Ok(_) => {
            match state
                .linking
                .notify_donor_of_new_report(
                    &state.db,
                    &payload.student_id,
                    &report,
                    payload.image_url.as_deref(),
                )
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        student_id = %payload.student_id,
                        "Donor notification failed: {}",
                        e
                    );
                    false
                }
            }
        }
        Err(e) => {
            tracing::warn!(
                student_id = %payload.student_id,
                "Donor link could not be ensured: {}",
                e
            );
            false
        }
    };

    let message = if notified {
        "Journal submitted and report generated.".to_string()
    } else {
        "Journal submitted and report generated (donor notification pending).".to_string()
    };

    Ok(Json(SubmissionResponse { message, report }))
}

/// Build student routes
pub fn student_routes() -> Router<AppState> {
    Router::new().route("/student/submit", post(submit_journal))
}
