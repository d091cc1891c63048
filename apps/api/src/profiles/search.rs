//! Candidate search ranking for recruiters.
//!
//! The database prefilters on location, experience and review status; this
//! module scores what comes back against the requested skills.
//!
//! Per requested skill, the best evidence on the profile wins:
//! - listed skill, exact match → 1.0
//! - mentioned in the headline → 0.6
//! - otherwise → 0.0
//!
//! `score = Σ strength / requested skills × 100`. Candidates with no evidence
//! for any requested skill are dropped.

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::profile::{normalize_skills, CandidateProfileRow};

const SKILL_STRENGTH: f32 = 1.0;
const HEADLINE_STRENGTH: f32 = 0.6;

#[derive(Debug, Clone, Serialize)]
pub struct CandidateMatch {
    pub profile: CandidateProfileRow,
    pub score: u32,
    pub matched_skills: Vec<String>,
    pub partial_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

/// Parses a comma-separated `skills` query parameter.
pub fn parse_skill_list(raw: &str) -> Vec<String> {
    normalize_skills(raw.split(','))
}

fn skill_strength(profile: &CandidateProfileRow, skill: &str) -> f32 {
    if profile.skills.iter().any(|s| s.to_lowercase() == skill) {
        SKILL_STRENGTH
    } else if profile
        .headline
        .as_deref()
        .map(|h| h.to_lowercase().contains(skill))
        .unwrap_or(false)
    {
        HEADLINE_STRENGTH
    } else {
        0.0
    }
}

pub fn score_candidate(profile: CandidateProfileRow, skills: &[String]) -> CandidateMatch {
    let mut matched_skills = Vec::new();
    let mut partial_skills = Vec::new();
    let mut missing_skills = Vec::new();
    let mut total = 0.0_f32;

    for skill in skills {
        let strength = skill_strength(&profile, skill);
        total += strength;
        if strength >= 0.8 {
            matched_skills.push(skill.clone());
        } else if strength >= 0.4 {
            partial_skills.push(skill.clone());
        } else {
            missing_skills.push(skill.clone());
        }
    }

    let score = if skills.is_empty() {
        0
    } else {
        ((total / skills.len() as f32) * 100.0).round() as u32
    };

    CandidateMatch {
        profile,
        score,
        matched_skills,
        partial_skills,
        missing_skills,
    }
}

/// Scores, filters and orders candidates: best score first, then more
/// experience, then name. Without requested skills the order is by name.
pub fn rank_candidates(
    profiles: Vec<CandidateProfileRow>,
    skills: &[String],
    limit: usize,
) -> Vec<CandidateMatch> {
    let mut matches: Vec<CandidateMatch> = profiles
        .into_iter()
        .map(|p| score_candidate(p, skills))
        .filter(|m| skills.is_empty() || m.score > 0)
        .collect();

    if skills.is_empty() {
        matches.sort_by(|a, b| a.profile.full_name.cmp(&b.profile.full_name));
    } else {
        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| compare_experience(a, b))
                .then_with(|| a.profile.full_name.cmp(&b.profile.full_name))
        });
    }
    matches.truncate(limit);
    matches
}

fn compare_experience(a: &CandidateMatch, b: &CandidateMatch) -> Ordering {
    b.profile
        .years_experience
        .unwrap_or(0)
        .cmp(&a.profile.years_experience.unwrap_or(0))
}
