use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::profiles::store::PgProfileStore;
use crate::video_review::registry::ReviewRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub llm: LlmClient,
    pub config: Config,
    pub profiles: PgProfileStore,
    /// Live intro-video review sessions, one per candidate.
    pub reviews: ReviewRegistry,
}
