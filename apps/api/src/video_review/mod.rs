// Candidate intro-video screening: a fixed countdown, one automated review
// call, and a fail-open fallback to manual review.

pub mod clock;
pub mod handlers;
pub mod notify;
pub mod registry;
pub mod reviewer;
pub mod session;
pub mod state;
pub mod workflow;
