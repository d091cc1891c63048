//! VideoReviewWorkflow: the countdown → automated review → decision state machine.
//!
//! Every operation is a pure transition over the instance's own fields and
//! returns the effects the caller must carry out. Nothing here sleeps, spawns
//! or performs I/O, so the full lifecycle is testable without a runtime.

use tracing::debug;

use crate::video_review::state::{
    Effect, ManualReason, Notice, ReviewOutcome, ReviewSnapshot, ReviewState, COUNTDOWN_SECS,
};

#[derive(Debug, Clone)]
pub struct VideoReviewWorkflow {
    state: ReviewState,
    countdown: u32,
    countdown_started: bool,
    video_url: Option<String>,
    /// Bumped by `reset`; review completions from an older cycle are ignored.
    cycle: u64,
    last_notice: Option<Notice>,
}

impl Default for VideoReviewWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReviewWorkflow {
    pub fn new() -> Self {
        Self {
            state: ReviewState::Pending,
            countdown: COUNTDOWN_SECS,
            countdown_started: false,
            video_url: None,
            cycle: 0,
            last_notice: None,
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn countdown_started(&self) -> bool {
        self.countdown_started
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    /// True while ticks still have an effect.
    pub fn is_counting_down(&self) -> bool {
        self.state == ReviewState::Pending && self.countdown_started
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        ReviewSnapshot {
            state: self.state,
            countdown: self.countdown,
            countdown_started: self.countdown_started,
            video_url: self.video_url.clone(),
            notice: self.last_notice.clone(),
        }
    }

    /// Feeds the candidate's current intro video URL into the workflow.
    ///
    /// Only an idle `pending` instance reacts: a URL starts the countdown, a
    /// missing URL sends the candidate straight to manual review.
    pub fn observe_profile(&mut self, video_url: Option<String>) -> Vec<Effect> {
        if self.state != ReviewState::Pending || self.countdown_started {
            debug!(state = %self.state, "observe_profile ignored");
            return vec![];
        }

        match video_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => {
                self.countdown_started = true;
                self.video_url = Some(url);
                vec![Effect::CountdownStarted]
            }
            None => self.settle(
                ReviewState::ManualReview,
                Notice::ManualReview {
                    reason: ManualReason::NoVideo,
                },
            ),
        }
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> Vec<Effect> {
        if !self.is_counting_down() {
            return vec![];
        }

        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return vec![];
        }

        self.state = ReviewState::Reviewing;
        self.last_notice = Some(Notice::ReviewStarted);
        // The guard guarantees a URL was recorded when the countdown began.
        let video_url = self.video_url.clone().unwrap_or_default();
        vec![
            Effect::Notify(Notice::ReviewStarted),
            Effect::InvokeReview {
                cycle: self.cycle,
                video_url,
            },
        ]
    }

    /// Applies the settled review call. Completions for another cycle, or
    /// arriving when no review is in flight, are dropped.
    pub fn complete_review(&mut self, cycle: u64, outcome: ReviewOutcome) -> Vec<Effect> {
        if self.state != ReviewState::Reviewing || cycle != self.cycle {
            debug!(
                state = %self.state,
                cycle,
                current_cycle = self.cycle,
                "Discarding stale review completion"
            );
            return vec![];
        }

        match outcome {
            ReviewOutcome::Verdict(verdict) => match verdict.resolve() {
                ReviewState::Approved => {
                    let mut effects = self.settle(ReviewState::Approved, Notice::Approved);
                    effects.push(Effect::RefreshProfile);
                    effects
                }
                ReviewState::Rejected => self.settle(
                    ReviewState::Rejected,
                    Notice::Rejected {
                        reason: verdict.reason,
                    },
                ),
                _ => self.settle(
                    ReviewState::ManualReview,
                    Notice::ManualReview {
                        reason: ManualReason::NeedsHuman,
                    },
                ),
            },
            ReviewOutcome::Failed(error) => self.settle(
                ReviewState::ManualReview,
                Notice::ManualReview {
                    reason: ManualReason::ReviewFailed(error),
                },
            ),
        }
    }

    /// Returns the instance to its initial values. Never starts a review.
    pub fn reset(&mut self) {
        self.state = ReviewState::Pending;
        self.countdown = COUNTDOWN_SECS;
        self.countdown_started = false;
        self.video_url = None;
        self.last_notice = None;
        self.cycle += 1;
    }

    fn settle(&mut self, state: ReviewState, notice: Notice) -> Vec<Effect> {
        self.state = state;
        self.last_notice = Some(notice.clone());
        vec![Effect::Notify(notice), Effect::RecordDecision(state)]
    }
}
