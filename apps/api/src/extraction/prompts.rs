// LLM prompt constants for attribute extraction.
// Reuses the JSON-only system fragment from llm_client::prompts.

/// System prompt for job description extraction.
pub const JOB_EXTRACT_SYSTEM: &str = "You are an expert technical recruiter. \
    Read a job description and extract its structured attributes. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT guess values that the posting does not state; use null instead.";

/// Job description extraction prompt. Replace `{jd_text}` before sending.
pub const JOB_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract the structured attributes of the following job description.

Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "Senior Backend Engineer",
  "company": "Acme Corp",
  "seniority": "senior",
  "employment_type": "full_time",
  "location": "Berlin, Germany",
  "remote_policy": "hybrid",
  "required_skills": ["rust", "postgresql"],
  "preferred_skills": ["kubernetes"],
  "min_years_experience": 5,
  "salary": {"min": 90000, "max": 120000, "currency": "EUR", "period": "year"},
  "summary": "One sentence describing the role."
}

Rules:
- seniority: "intern", "junior", "mid", "senior", "staff", "principal", "director", or "unknown".
- employment_type: "full_time", "part_time", "contract", "internship", or "unknown".
- remote_policy: "onsite", "hybrid", "remote", or "unknown".
- required_skills: explicit must-haves ("required", "must have", minimum years).
- preferred_skills: nice-to-haves ("preferred", "bonus", "a plus").
- Skills are short lowercase names of languages, frameworks, tools or domains.
- salary: null when the posting states no compensation. Numbers only, no symbols.
- company, location, min_years_experience: null when not stated.

JOB DESCRIPTION:
{jd_text}"#;

/// System prompt for resume extraction.
pub const RESUME_EXTRACT_SYSTEM: &str = "You are an expert resume analyst. \
    Read a resume and extract the candidate's structured attributes. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT invent employers, dates or skills that the resume does not contain.";

/// Resume extraction prompt. Replace `{resume_text}` before sending.
pub const RESUME_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract the structured attributes of the following resume.

Return a JSON object with this EXACT schema (no extra fields):
{
  "full_name": "Ada Lovelace",
  "email": "ada@example.com",
  "headline": "Backend engineer focused on data pipelines",
  "location": "London, UK",
  "skills": ["rust", "python", "kafka"],
  "years_experience": 6,
  "experience": [
    {
      "company": "Analytical Engines Ltd",
      "title": "Senior Engineer",
      "start_date": "2019-03",
      "end_date": null,
      "highlights": ["Cut batch latency 40% by rewriting the ingest path in Rust"]
    }
  ],
  "education": [
    {"institution": "University of London", "degree": "BSc", "field": "Mathematics", "graduation_year": 2016}
  ]
}

Rules:
- Dates are "YYYY-MM" or null. end_date null means the role is current.
- years_experience: total professional years, rounded down; null if unclear.
- Skills are short lowercase names of languages, frameworks, tools or domains.
- email, headline, location: null when not stated.

RESUME:
{resume_text}"#;
