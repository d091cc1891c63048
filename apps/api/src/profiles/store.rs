//! Candidate profile persistence.
//!
//! `ProfileSource` is the narrow view the video review sessions depend on;
//! `PgProfileStore` implements it and also carries the profile CRUD and search
//! queries used by the handlers.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::CandidateProfileRow;
use crate::video_review::state::ReviewState;

/// Upper bound on rows pulled back for in-process search ranking.
const SEARCH_PREFILTER_LIMIT: i64 = 500;

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn load_profile(&self, user_id: Uuid) -> Result<Option<CandidateProfileRow>, AppError>;

    /// Stores the terminal decision of a video review on the profile, as long
    /// as the profile still points at the video that was reviewed. Returns
    /// false when the video has since been replaced.
    async fn record_review_status(
        &self,
        user_id: Uuid,
        video_url: Option<&str>,
        state: ReviewState,
    ) -> Result<bool, AppError>;
}

/// Validated profile fields accepted from the candidate.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub years_experience: Option<i32>,
}

/// Database-side search filters. Skill ranking happens afterwards in `search`.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub location: Option<String>,
    pub min_years: Option<i32>,
    pub approved_only: bool,
}

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<CandidateProfileRow, AppError> {
        let row = sqlx::query_as::<_, CandidateProfileRow>(
            r#"
            INSERT INTO candidate_profiles
                (user_id, full_name, headline, location, skills, years_experience)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                headline = EXCLUDED.headline,
                location = EXCLUDED.location,
                skills = EXCLUDED.skills,
                years_experience = EXCLUDED.years_experience,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&update.full_name)
        .bind(&update.headline)
        .bind(&update.location)
        .bind(&update.skills)
        .bind(update.years_experience)
        .fetch_one(&self.pool)
        .await?;

        info!("Saved profile for candidate {user_id}");
        Ok(row)
    }

    /// Points the profile at a newly uploaded intro video. The previous review
    /// decision no longer applies, so the status goes back to pending.
    pub async fn set_intro_video(
        &self,
        user_id: Uuid,
        video_url: &str,
    ) -> Result<Option<CandidateProfileRow>, AppError> {
        Ok(sqlx::query_as::<_, CandidateProfileRow>(
            r#"
            UPDATE candidate_profiles
            SET intro_video_url = $2, video_review_status = 'pending', updated_at = now()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(video_url)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn search_prefilter(
        &self,
        filter: &SearchFilter,
    ) -> Result<Vec<CandidateProfileRow>, AppError> {
        Ok(sqlx::query_as::<_, CandidateProfileRow>(
            r#"
            SELECT *
            FROM candidate_profiles
            WHERE ($1::text IS NULL OR location ILIKE '%' || $1 || '%')
              AND ($2::int IS NULL OR years_experience >= $2)
              AND (NOT $3 OR video_review_status = 'approved')
            ORDER BY updated_at DESC
            LIMIT $4
            "#,
        )
        .bind(&filter.location)
        .bind(filter.min_years)
        .bind(filter.approved_only)
        .bind(SEARCH_PREFILTER_LIMIT)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl ProfileSource for PgProfileStore {
    async fn load_profile(&self, user_id: Uuid) -> Result<Option<CandidateProfileRow>, AppError> {
        Ok(sqlx::query_as::<_, CandidateProfileRow>(
            "SELECT * FROM candidate_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn record_review_status(
        &self,
        user_id: Uuid,
        video_url: Option<&str>,
        state: ReviewState,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE candidate_profiles
            SET video_review_status = $2, updated_at = now()
            WHERE user_id = $1 AND intro_video_url IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(user_id)
        .bind(state.as_str())
        .bind(video_url)
        .execute(&self.pool)
        .await?;

        let recorded = result.rows_affected() > 0;
        if recorded {
            info!("Recorded video review '{state}' for candidate {user_id}");
        }
        Ok(recorded)
    }
}
