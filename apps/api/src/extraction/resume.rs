//! Resume extraction: candidate attributes from resume text or an uploaded PDF.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::extraction::prompts::{RESUME_EXTRACT_PROMPT_TEMPLATE, RESUME_EXTRACT_SYSTEM};
use crate::models::profile::{clamp_years, normalize_skills};
use crate::llm_client::LlmClient;

/// Resumes longer than this are truncated before prompting.
pub const MAX_RESUME_CHARS: usize = 40_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceItem {
    pub company: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    /// None for the current role.
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationItem {
    pub institution: String,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeAttributes {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub years_experience: Option<i32>,
    #[serde(default)]
    pub experience: Vec<ExperienceItem>,
    #[serde(default)]
    pub education: Vec<EducationItem>,
}

impl ResumeAttributes {
    pub fn normalized(mut self) -> Self {
        self.skills = normalize_skills(&self.skills);
        self.years_experience = self.years_experience.map(clamp_years);
        self.experience.retain(|e| !e.company.trim().is_empty());
        self
    }
}

/// Pulls plain text out of a PDF resume.
pub fn pdf_to_text(bytes: &[u8]) -> Result<String, AppError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?;
    let text = collapse_blank_lines(&text);
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "PDF contains no extractable text".to_string(),
        ));
    }
    debug!("Extracted {} characters from PDF resume", text.len());
    Ok(text)
}

fn collapse_blank_lines(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Extracts `ResumeAttributes` from resume text using the LLM.
pub async fn extract_resume_attributes(
    resume_text: &str,
    llm: &LlmClient,
) -> Result<ResumeAttributes, AppError> {
    let resume_text = truncate_chars(resume_text, MAX_RESUME_CHARS);
    let prompt = RESUME_EXTRACT_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);
    llm.call_json::<ResumeAttributes>(&prompt, RESUME_EXTRACT_SYSTEM)
        .await
        .map(ResumeAttributes::normalized)
        .map_err(|e| AppError::Llm(format!("Resume extraction failed: {e}")))
}
