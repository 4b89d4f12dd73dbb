//! Journal image upload endpoint
//!
//! Accepts an uploaded image reference, extracts the handwritten text,
//! then runs the full submission pipeline (report, link, notification)
//! on the extracted text before answering with the transcription.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NoteUploadRequest {
    pub student_id: String,
    pub file_url: String,
}

#[derive(Debug, Serialize)]
pub struct NoteUploadResponse {
    pub student_id: String,
    pub image_url: String,
    pub extracted_text: String,
}

/// POST /notes/upload
pub async fn upload_note(
    State(state): State<AppState>,
    Json(request): Json<NoteUploadRequest>,
) -> ApiResult<Json<NoteUploadResponse>> {
    let extracted_text = state.extractor.extract(&request.file_url).await?;

    let report = state
        .report_service
        .submit(&state.db, &request.student_id, &extracted_text, "")
        .await?;

    // Linking and notification come after the saved report; a failure
    // here is logged but the upload still succeeds.
    if let Err(e) = state.linking.ensure_link(&state.db, &request.student_id).await {
        tracing::warn!(
            student_id = %request.student_id,
            "Donor link could not be ensured after upload: {}",
            e
        );
    } else if let Err(e) = state
        .linking
        .notify_donor_of_new_report(
            &state.db,
            &request.student_id,
            &report,
            Some(&request.file_url),
        )
        .await
    {
        tracing::warn!(
            student_id = %request.student_id,
            "Donor notification failed after upload: {}",
            e
        );
    }

    Ok(Json(NoteUploadResponse {
        student_id: request.student_id,
        image_url: request.file_url,
        extracted_text,
    }))
}

/// Build notes routes
pub fn notes_routes() -> Router<AppState> {
    Router::new().route("/notes/upload", post(upload_note))
}
