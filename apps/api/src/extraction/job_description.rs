//! Job description extraction: structured hiring attributes from a raw posting.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::prompts::{JOB_EXTRACT_PROMPT_TEMPLATE, JOB_EXTRACT_SYSTEM};
use crate::models::profile::{clamp_years, normalize_skills};
use crate::llm_client::LlmClient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Intern,
    Junior,
    Mid,
    Senior,
    Staff,
    Principal,
    Director,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePolicy {
    Onsite,
    Hybrid,
    Remote,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
    /// "year", "month" or "hour"
    pub period: Option<String>,
}

/// Full structured output of job description extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAttributes {
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub seniority: Seniority,
    #[serde(default)]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_policy: RemotePolicy,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub min_years_experience: Option<i32>,
    #[serde(default)]
    pub salary: Option<SalaryRange>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl JobAttributes {
    /// Cleans up model output: skills normalized, a skill listed as both
    /// required and preferred stays required, years clamped, salary bounds ordered.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.required_skills = normalize_skills(&self.required_skills);
        let required = &self.required_skills;
        self.preferred_skills = normalize_skills(&self.preferred_skills)
            .into_iter()
            .filter(|s| !required.contains(s))
            .collect();
        self.min_years_experience = self.min_years_experience.map(clamp_years);
        if let Some(salary) = self.salary.as_mut() {
            if let (Some(min), Some(max)) = (salary.min, salary.max) {
                if min > max {
                    salary.min = Some(max);
                    salary.max = Some(min);
                }
            }
        }
        self
    }
}

/// Extracts `JobAttributes` from a raw job description using the LLM.
pub async fn extract_job_attributes(
    jd_text: &str,
    llm: &LlmClient,
) -> Result<JobAttributes, AppError> {
    let prompt = JOB_EXTRACT_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);
    llm.call_json::<JobAttributes>(&prompt, JOB_EXTRACT_SYSTEM)
        .await
        .map(JobAttributes::normalized)
        .map_err(|e| AppError::Llm(format!("Job description extraction failed: {e}")))
}
