//! State, verdict and effect types for the intro-video review workflow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Seconds the candidate waits between upload confirmation and the automated review.
pub const COUNTDOWN_SECS: u32 = 10;

/// User-facing review state of a candidate's intro video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    #[default]
    Pending,
    Reviewing,
    Approved,
    ManualReview,
    Rejected,
}

impl ReviewState {
    /// Approved, rejected and manual review hold until an explicit reset.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReviewState::Approved | ReviewState::ManualReview | ReviewState::Rejected
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewState::Pending => "pending",
            ReviewState::Reviewing => "reviewing",
            ReviewState::Approved => "approved",
            ReviewState::ManualReview => "manual_review",
            ReviewState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewState::Pending),
            "reviewing" => Ok(ReviewState::Reviewing),
            "approved" => Ok(ReviewState::Approved),
            "manual_review" => Ok(ReviewState::ManualReview),
            "rejected" => Ok(ReviewState::Rejected),
            other => Err(format!("unknown review state '{other}'")),
        }
    }
}

/// Verdict returned by the review capability.
///
/// Fields are optional so that a partial or unexpected payload still
/// deserializes; anything that is neither an auto-approval nor an explicit
/// rejection lands in manual review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewVerdict {
    #[serde(default)]
    pub auto_approved: Option<bool>,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
impl ReviewVerdict {
    pub fn auto_approved() -> Self {
        Self {
            auto_approved: Some(true),
            approved: Some(true),
            reason: None,
        }
    }

    pub fn needs_human() -> Self {
        Self {
            auto_approved: Some(false),
            approved: Some(true),
            reason: None,
        }
    }

    pub fn rejected() -> Self {
        Self {
            auto_approved: Some(false),
            approved: Some(false),
            reason: None,
        }
    }
}

impl ReviewVerdict {
    /// Maps the verdict onto the state it settles the workflow in.
    pub fn resolve(&self) -> ReviewState {
        match (self.auto_approved, self.approved) {
            (Some(true), _) => ReviewState::Approved,
            (_, Some(false)) => ReviewState::Rejected,
            _ => ReviewState::ManualReview,
        }
    }
}

/// How the review call settled. Failures carry the rendered error only;
/// they are never surfaced beyond the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Verdict(ReviewVerdict),
    Failed(String),
}

/// Why a video ended up waiting for a human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ManualReason {
    NoVideo,
    NeedsHuman,
    ReviewFailed(String),
}

/// User-visible feedback emitted on state entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    ReviewStarted,
    Approved,
    Rejected { reason: Option<String> },
    ManualReview { reason: ManualReason },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::ReviewStarted => "Your intro video is being reviewed".to_string(),
            Notice::Approved => "Your intro video was approved".to_string(),
            Notice::Rejected { reason: Some(r) } => {
                format!("Your intro video did not pass review: {r}")
            }
            Notice::Rejected { reason: None } => {
                "Your intro video did not pass review".to_string()
            }
            Notice::ManualReview {
                reason: ManualReason::NoVideo,
            } => "No intro video found, a recruiter will follow up".to_string(),
            Notice::ManualReview { .. } => {
                "Your intro video has been sent for manual review".to_string()
            }
        }
    }
}

/// Side effects requested by a transition. The session driver executes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CountdownStarted,
    InvokeReview { cycle: u64, video_url: String },
    Notify(Notice),
    RecordDecision(ReviewState),
    RefreshProfile,
}

/// Read-only view of a workflow, published after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSnapshot {
    pub state: ReviewState,
    pub countdown: u32,
    pub countdown_started: bool,
    pub video_url: Option<String>,
    pub notice: Option<Notice>,
}
