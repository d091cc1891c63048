pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extraction::handlers as extraction;
use crate::profiles::handlers as profiles;
use crate::state::AppState;
use crate::video_review::handlers as video_review;

/// Multipart framing overhead allowed on top of the file size limits.
const MULTIPART_SLACK_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate profiles
        .route(
            "/api/v1/candidates/:user_id",
            get(profiles::handle_get_profile).put(profiles::handle_upsert_profile),
        )
        .route(
            "/api/v1/candidates/:user_id/intro-video",
            post(profiles::handle_upload_intro_video).layer(DefaultBodyLimit::max(
                profiles::MAX_INTRO_VIDEO_BYTES + MULTIPART_SLACK_BYTES,
            )),
        )
        .route(
            "/api/v1/search/candidates",
            get(profiles::handle_search_candidates),
        )
        // Intro video review
        .route(
            "/api/v1/candidates/:user_id/video-review",
            get(video_review::handle_review_status)
                .post(video_review::handle_start_review)
                .delete(video_review::handle_discard_review),
        )
        .route(
            "/api/v1/candidates/:user_id/video-review/reset",
            post(video_review::handle_reset_review),
        )
        // Extraction
        .route(
            "/api/v1/extract/job-description",
            post(extraction::handle_extract_job),
        )
        .route("/api/v1/extract/resume", post(extraction::handle_extract_resume))
        .route(
            "/api/v1/extract/resume/upload",
            post(extraction::handle_extract_resume_upload).layer(DefaultBodyLimit::max(
                extraction::MAX_RESUME_UPLOAD_BYTES + MULTIPART_SLACK_BYTES,
            )),
        )
        .with_state(state)
}
