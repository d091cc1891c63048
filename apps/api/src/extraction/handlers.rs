//! Axum route handlers for the extraction API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tracing::warn;

use crate::errors::AppError;
use crate::extraction::job_description::{extract_job_attributes, JobAttributes};
use crate::extraction::resume::{extract_resume_attributes, pdf_to_text, ResumeAttributes};
use crate::state::AppState;

pub const MAX_RESUME_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct JobExtractResponse {
    pub attributes: JobAttributes,
}

#[derive(Debug, Serialize)]
pub struct ResumeExtractResponse {
    pub attributes: ResumeAttributes,
}

fn require_text(text: &str, field: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// pdf-extract panics on some malformed documents. A panicked parse means the
/// upload is unreadable.
fn pdf_task_error(e: JoinError) -> AppError {
    if e.is_panic() {
        warn!("PDF text extraction panicked");
        AppError::UnprocessableEntity("Could not read PDF".to_string())
    } else {
        AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}"))
    }
}

/// POST /api/v1/extract/job-description
pub async fn handle_extract_job(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<JobExtractResponse>, AppError> {
    require_text(&request.text, "text")?;
    let attributes = extract_job_attributes(&request.text, &state.llm).await?;
    Ok(Json(JobExtractResponse { attributes }))
}

/// POST /api/v1/extract/resume
pub async fn handle_extract_resume(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ResumeExtractResponse>, AppError> {
    require_text(&request.text, "text")?;
    let attributes = extract_resume_attributes(&request.text, &state.llm).await?;
    Ok(Json(ResumeExtractResponse { attributes }))
}

/// POST /api/v1/extract/resume/upload
///
/// Multipart body with a single `resume` PDF field.
pub async fn handle_extract_resume_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeExtractResponse>, AppError> {
    let mut pdf = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("resume") {
            continue;
        }
        if let Some(content_type) = field.content_type() {
            if content_type != "application/pdf" {
                return Err(AppError::Validation(format!(
                    "Resume must be a PDF, got '{content_type}'"
                )));
            }
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read resume upload: {e}")))?;
        pdf = Some(data);
    }

    let pdf = pdf.ok_or_else(|| AppError::Validation("Missing 'resume' field".to_string()))?;
    if pdf.is_empty() {
        return Err(AppError::Validation("Resume upload is empty".to_string()));
    }
    if pdf.len() > MAX_RESUME_UPLOAD_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "Resumes are limited to {} MiB",
            MAX_RESUME_UPLOAD_BYTES / (1024 * 1024)
        )));
    }

    // PDF parsing is CPU-bound; keep it off the async workers.
    let text = tokio::task::spawn_blocking(move || pdf_to_text(&pdf))
        .await
        .map_err(pdf_task_error)??;

    let attributes = extract_resume_attributes(&text, &state.llm).await?;
    Ok(Json(ResumeExtractResponse { attributes }))
}
