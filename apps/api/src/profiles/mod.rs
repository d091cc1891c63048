// Candidate profiles: storage, intro-video upload, and recruiter search.

pub mod handlers;
pub mod search;
pub mod store;
