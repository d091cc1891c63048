// AI attribute extraction for job descriptions and resumes.
// All LLM calls go through llm_client.

pub mod handlers;
pub mod job_description;
pub mod prompts;
pub mod resume;
