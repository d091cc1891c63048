//! Review capability: the external service that screens an intro video.
//!
//! `AppState` carries an `Arc<dyn VideoReviewer>`; sessions only see the trait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::video_review::state::{ReviewOutcome, ReviewVerdict};

const REVIEW_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Review service returned status {status}: {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait VideoReviewer: Send + Sync {
    async fn review(&self, video_url: &str) -> Result<ReviewVerdict, ReviewError>;
}

/// Runs the capability and folds any error into a failed outcome.
pub async fn run_review(reviewer: &dyn VideoReviewer, video_url: &str) -> ReviewOutcome {
    match reviewer.review(video_url).await {
        Ok(verdict) => ReviewOutcome::Verdict(verdict),
        Err(e) => {
            warn!("Video review failed for {video_url}: {e}");
            ReviewOutcome::Failed(e.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewRequest<'a> {
    video_url: &'a str,
}

/// Calls the hosted review endpoint. Single attempt: a failure goes to a human
/// rather than being retried.
#[derive(Clone)]
pub struct HttpVideoReviewer {
    client: Client,
    endpoint: String,
}

impl HttpVideoReviewer {
    pub fn new(endpoint: String) -> Result<Self, ReviewError> {
        Ok(Self {
            client: Client::builder().timeout(REVIEW_TIMEOUT).build()?,
            endpoint,
        })
    }
}

#[async_trait]
impl VideoReviewer for HttpVideoReviewer {
    async fn review(&self, video_url: &str) -> Result<ReviewVerdict, ReviewError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ReviewRequest { video_url })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReviewError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let verdict: ReviewVerdict = response.json().await?;
        debug!(
            auto_approved = ?verdict.auto_approved,
            approved = ?verdict.approved,
            "Review service responded"
        );
        Ok(verdict)
    }
}
