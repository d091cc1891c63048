use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Upper bound accepted for years of experience, whether typed in or extracted.
pub const MAX_YEARS_EXPERIENCE: i32 = 70;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfileRow {
    pub user_id: Uuid,
    pub full_name: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub years_experience: Option<i32>,
    pub intro_video_url: Option<String>,
    /// One of the `ReviewState` names.
    pub video_review_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trims, lowercases and dedups skill names, preserving first-seen order.
pub fn normalize_skills<I, S>(skills: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for skill in skills {
        let skill = skill.as_ref().trim().to_lowercase();
        if !skill.is_empty() && !out.contains(&skill) {
            out.push(skill);
        }
    }
    out
}

pub fn clamp_years(years: i32) -> i32 {
    years.clamp(0, MAX_YEARS_EXPERIENCE)
}

#[cfg(test)]
impl CandidateProfileRow {
    /// A profile with only a name set.
    pub fn empty(user_id: Uuid, full_name: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            full_name: full_name.to_string(),
            headline: None,
            location: None,
            skills: vec![],
            years_experience: None,
            intro_video_url: None,
            video_review_status: "pending".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
