//! Axum route handlers for the video review API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::profiles::store::ProfileSource;
use crate::state::AppState;
use crate::video_review::session::SessionClosed;
use crate::video_review::state::ReviewSnapshot;

impl From<SessionClosed> for AppError {
    fn from(e: SessionClosed) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

/// POST /api/v1/candidates/:user_id/video-review
///
/// Starts (or re-observes) the candidate's review session with the intro
/// video currently on their profile.
pub async fn handle_start_review(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ReviewSnapshot>), AppError> {
    let profile = state
        .profiles
        .load_profile(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {user_id} not found")))?;

    let session = state.reviews.get_or_spawn(user_id).await;
    let snapshot = session.observe(profile.intro_video_url).await?;

    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// GET /api/v1/candidates/:user_id/video-review
pub async fn handle_review_status(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ReviewSnapshot>, AppError> {
    let session = state.reviews.get(user_id).await.ok_or_else(|| no_session(user_id))?;
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/candidates/:user_id/video-review/reset
pub async fn handle_reset_review(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ReviewSnapshot>, AppError> {
    let session = state.reviews.get(user_id).await.ok_or_else(|| no_session(user_id))?;
    Ok(Json(session.reset().await?))
}

/// DELETE /api/v1/candidates/:user_id/video-review
pub async fn handle_discard_review(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.reviews.discard(user_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(no_session(user_id))
    }
}

fn no_session(user_id: Uuid) -> AppError {
    AppError::NotFound(format!("No video review in progress for candidate {user_id}"))
}
