//! Axum route handlers for candidate profiles and recruiter search.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{normalize_skills, CandidateProfileRow, MAX_YEARS_EXPERIENCE};
use crate::profiles::search::{parse_skill_list, rank_candidates, CandidateMatch};
use crate::profiles::store::{ProfileSource, ProfileUpdate, SearchFilter};
use crate::state::AppState;
use crate::storage::{intro_video_key, public_object_url, put_object, video_extension};

pub const MAX_INTRO_VIDEO_BYTES: usize = 200 * 1024 * 1024;
const DEFAULT_SEARCH_LIMIT: usize = 25;
const MAX_SEARCH_LIMIT: usize = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub full_name: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub years_experience: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub skills: Option<String>,
    pub location: Option<String>,
    pub min_years: Option<i32>,
    #[serde(default)]
    pub approved_only: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query_skills: Vec<String>,
    pub results: Vec<CandidateMatch>,
}

/// Validates and normalizes a profile payload.
pub fn validate_profile(request: ProfileRequest) -> Result<ProfileUpdate, AppError> {
    let full_name = request.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AppError::Validation("full_name cannot be empty".to_string()));
    }

    if let Some(years) = request.years_experience {
        if !(0..=MAX_YEARS_EXPERIENCE).contains(&years) {
            return Err(AppError::Validation(format!(
                "years_experience must be between 0 and {MAX_YEARS_EXPERIENCE}"
            )));
        }
    }

    Ok(ProfileUpdate {
        full_name,
        headline: non_blank(request.headline),
        location: non_blank(request.location),
        skills: normalize_skills(&request.skills),
        years_experience: request.years_experience,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidates/:user_id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CandidateProfileRow>, AppError> {
    let profile = state
        .profiles
        .load_profile(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {user_id} not found")))?;
    Ok(Json(profile))
}

/// PUT /api/v1/candidates/:user_id
pub async fn handle_upsert_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<CandidateProfileRow>, AppError> {
    let update = validate_profile(request)?;
    let profile = state.profiles.upsert_profile(user_id, &update).await?;
    Ok(Json(profile))
}

/// POST /api/v1/candidates/:user_id/intro-video
///
/// Accepts a multipart body with a single `video` field, stores it in object
/// storage and points the profile at it. The review status is reset to pending;
/// the client starts a new review afterwards.
pub async fn handle_upload_intro_video(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<CandidateProfileRow>, AppError> {
    let mut video = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("video") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read video upload: {e}")))?;
        video = Some((content_type, data));
    }

    let (content_type, data) =
        video.ok_or_else(|| AppError::Validation("Missing 'video' field".to_string()))?;
    let extension = video_extension(&content_type).ok_or_else(|| {
        AppError::Validation(format!("Unsupported video type '{content_type}'"))
    })?;
    if data.is_empty() {
        return Err(AppError::Validation("Video upload is empty".to_string()));
    }
    if data.len() > MAX_INTRO_VIDEO_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "Intro videos are limited to {} MiB",
            MAX_INTRO_VIDEO_BYTES / (1024 * 1024)
        )));
    }

    if state.profiles.load_profile(user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Candidate {user_id} not found")));
    }

    let key = intro_video_key(user_id, extension);
    put_object(&state.s3, &state.config.s3_bucket, &key, data, &content_type).await?;
    let video_url = public_object_url(&state.config.s3_public_base_url, &key);

    let profile = state
        .profiles
        .set_intro_video(user_id, &video_url)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {user_id} not found")))?;

    // Any review of the previous video no longer applies; the next
    // POST .../video-review starts a fresh session for the new one.
    if state.reviews.discard(user_id).await {
        info!(%user_id, "Intro video replaced, previous review session discarded");
    }
    Ok(Json(profile))
}

/// GET /api/v1/search/candidates?skills=rust,go&location=&min_years=&approved_only=
pub async fn handle_search_candidates(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let query_skills = params
        .skills
        .as_deref()
        .map(parse_skill_list)
        .unwrap_or_default();
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let filter = SearchFilter {
        location: non_blank(params.location),
        min_years: params.min_years,
        approved_only: params.approved_only,
    };
    let candidates = state.profiles.search_prefilter(&filter).await?;
    let results = rank_candidates(candidates, &query_skills, limit);

    Ok(Json(SearchResponse {
        query_skills,
        results,
    }))
}
