//! Review session: an actor task that owns one `VideoReviewWorkflow` and
//! carries out the effects its transitions produce.
//!
//! The session reacts to three event sources:
//! - consumer commands (`Observe`, `Reset`) over an mpsc channel
//! - ticks from its `Ticker`, only while the countdown is running
//! - settlement of the spawned review call
//!
//! Dropping every `SessionClient` closes the command channel and ends the task.
//! A session that has settled also exits once it has gone
//! `SETTLED_SESSION_TTL` without a command; the decision lives on in the
//! profile store.
//! An in-flight review is aborted with it, so a discarded session can never
//! apply a late result.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::profiles::store::ProfileSource;
use crate::video_review::clock::Ticker;
use crate::video_review::notify::NotificationSink;
use crate::video_review::reviewer::{run_review, VideoReviewer};
use crate::video_review::state::{Effect, ReviewOutcome, ReviewSnapshot};
use crate::video_review::workflow::VideoReviewWorkflow;

const COMMAND_BUFFER: usize = 8;

/// How long a settled session lingers without commands before its task exits.
pub const SETTLED_SESSION_TTL: Duration = Duration::from_secs(5 * 60);

/// Collaborators every session calls into.
#[derive(Clone)]
pub struct SessionDeps {
    pub reviewer: Arc<dyn VideoReviewer>,
    pub profiles: Arc<dyn ProfileSource>,
    pub sink: Arc<dyn NotificationSink>,
}

#[derive(Debug)]
pub enum SessionCommand {
    Observe {
        video_url: Option<String>,
        ack: oneshot::Sender<ReviewSnapshot>,
    },
    Reset {
        ack: oneshot::Sender<ReviewSnapshot>,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("review session for {0} has shut down")]
pub struct SessionClosed(pub Uuid);

/// Cheap handle used to talk to a running session.
#[derive(Clone)]
pub struct SessionClient {
    user_id: Uuid,
    commands: mpsc::Sender<SessionCommand>,
    status: watch::Receiver<ReviewSnapshot>,
}

impl SessionClient {
    pub fn snapshot(&self) -> ReviewSnapshot {
        self.status.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<ReviewSnapshot> {
        self.status.clone()
    }

    pub async fn observe(&self, video_url: Option<String>) -> Result<ReviewSnapshot, SessionClosed> {
        let (ack, reply) = oneshot::channel();
        self.request(SessionCommand::Observe { video_url, ack }, reply)
            .await
    }

    pub async fn reset(&self) -> Result<ReviewSnapshot, SessionClosed> {
        let (ack, reply) = oneshot::channel();
        self.request(SessionCommand::Reset { ack }, reply).await
    }

    async fn request(
        &self,
        command: SessionCommand,
        reply: oneshot::Receiver<ReviewSnapshot>,
    ) -> Result<ReviewSnapshot, SessionClosed> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionClosed(self.user_id))?;
        reply.await.map_err(|_| SessionClosed(self.user_id))
    }
}

/// Owning handle: the client plus the task. Dropping it aborts the task.
pub struct SessionHandle {
    client: SessionClient,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn spawn<T>(user_id: Uuid, deps: SessionDeps, ticker: T) -> Self
    where
        T: Ticker + 'static,
    {
        let workflow = VideoReviewWorkflow::new();
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status_rx) = watch::channel(workflow.snapshot());

        let session = ReviewSession {
            user_id,
            workflow,
            deps,
            ticker,
            commands: commands_rx,
            status: status_tx,
            refreshed_video_url: None,
        };
        let task = tokio::spawn(session.run());

        Self {
            client: SessionClient {
                user_id,
                commands: commands_tx,
                status: status_rx,
            },
            task,
        }
    }

    pub fn client(&self) -> SessionClient {
        self.client.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The spawned review call. Aborted when dropped.
struct InFlight {
    cycle: u64,
    task: JoinHandle<ReviewOutcome>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct ReviewSession<T> {
    user_id: Uuid,
    workflow: VideoReviewWorkflow,
    deps: SessionDeps,
    ticker: T,
    commands: mpsc::Receiver<SessionCommand>,
    status: watch::Sender<ReviewSnapshot>,
    /// Profile video URL re-read after an approval.
    refreshed_video_url: Option<String>,
}

impl<T: Ticker> ReviewSession<T> {
    async fn run(mut self) {
        let mut in_flight: Option<InFlight> = None;
        info!(user_id = %self.user_id, "Video review session started");

        loop {
            let counting = self.workflow.is_counting_down();
            let settled = self.workflow.state().is_terminal();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Observe { video_url, ack }) => {
                        let effects = self.workflow.observe_profile(video_url);
                        self.apply(effects, &mut in_flight).await;
                        let _ = ack.send(self.publish());
                    }
                    Some(SessionCommand::Reset { ack }) => {
                        // Dropping the in-flight call aborts it; its result is never seen.
                        in_flight = None;
                        self.workflow.reset();
                        self.refreshed_video_url = None;
                        debug!(user_id = %self.user_id, cycle = self.workflow.cycle(), "Review reset");
                        let _ = ack.send(self.publish());
                    }
                    None => break,
                },
                _ = self.ticker.tick(), if counting => {
                    let effects = self.workflow.tick();
                    self.apply(effects, &mut in_flight).await;
                    self.publish();
                }
                (cycle, outcome) = settle(&mut in_flight) => {
                    let effects = self.workflow.complete_review(cycle, outcome);
                    self.apply(effects, &mut in_flight).await;
                    self.publish();
                }
                _ = tokio::time::sleep(SETTLED_SESSION_TTL), if settled => {
                    debug!(user_id = %self.user_id, "Settled review session idle");
                    break;
                }
            }
        }

        info!(user_id = %self.user_id, state = %self.workflow.state(), "Video review session closed");
    }

    async fn apply(&mut self, effects: Vec<Effect>, in_flight: &mut Option<InFlight>) {
        for effect in effects {
            match effect {
                Effect::CountdownStarted => {
                    debug!(
                        user_id = %self.user_id,
                        countdown = self.workflow.countdown(),
                        guarded = self.workflow.countdown_started(),
                        video_url = ?self.workflow.video_url(),
                        "Review countdown started"
                    );
                    self.ticker.restart();
                }
                Effect::InvokeReview { cycle, video_url } => {
                    info!(user_id = %self.user_id, cycle, "Submitting intro video for review");
                    let reviewer = Arc::clone(&self.deps.reviewer);
                    let task =
                        tokio::spawn(async move { run_review(reviewer.as_ref(), &video_url).await });
                    *in_flight = Some(InFlight { cycle, task });
                }
                Effect::Notify(notice) => self.deps.sink.notify(self.user_id, &notice),
                Effect::RecordDecision(state) => {
                    let video_url = self.workflow.video_url().map(str::to_owned);
                    match self
                        .deps
                        .profiles
                        .record_review_status(self.user_id, video_url.as_deref(), state)
                        .await
                    {
                        Ok(true) => {}
                        Ok(false) => info!(
                            user_id = %self.user_id,
                            %state,
                            "Intro video replaced during review, decision not recorded"
                        ),
                        Err(e) => {
                            warn!(user_id = %self.user_id, %state, "Failed to record review decision: {e}")
                        }
                    }
                }
                Effect::RefreshProfile => match self.deps.profiles.load_profile(self.user_id).await {
                    Ok(Some(profile)) => self.refreshed_video_url = profile.intro_video_url,
                    Ok(None) => warn!(user_id = %self.user_id, "Profile disappeared during review"),
                    Err(e) => warn!(user_id = %self.user_id, "Failed to refresh profile: {e}"),
                },
            }
        }
    }

    fn publish(&self) -> ReviewSnapshot {
        let mut snapshot = self.workflow.snapshot();
        if let Some(url) = &self.refreshed_video_url {
            snapshot.video_url = Some(url.clone());
        }
        if snapshot.state.is_terminal() {
            debug!(user_id = %self.user_id, state = %snapshot.state, "Video review settled");
        }
        self.status.send_replace(snapshot.clone());
        snapshot
    }
}

/// Waits for the in-flight review, or forever when there is none.
async fn settle(in_flight: &mut Option<InFlight>) -> (u64, ReviewOutcome) {
    let Some(flight) = in_flight.as_mut() else {
        return std::future::pending().await;
    };
    let outcome = match (&mut flight.task).await {
        Ok(outcome) => outcome,
        Err(e) => ReviewOutcome::Failed(format!("review task ended unexpectedly: {e}")),
    };
    let cycle = flight.cycle;
    *in_flight = None;
    (cycle, outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::errors::AppError;
    use crate::models::profile::CandidateProfileRow;
    use crate::video_review::clock::IntervalTicker;
    use crate::video_review::reviewer::ReviewError;
    use crate::video_review::state::{
        ManualReason, Notice, ReviewState, ReviewVerdict, COUNTDOWN_SECS,
    };

    const URL: &str = "https://x/video.mp4";

    /// Review capability whose answer is set per test.
    struct ScriptedReviewer {
        result: Mutex<Option<Result<ReviewVerdict, String>>>,
        calls: Mutex<Vec<String>>,
        /// When set, the call blocks until notified.
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedReviewer {
        fn answering(result: Result<ReviewVerdict, String>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
                calls: Mutex::new(vec![]),
                gate: None,
            })
        }

        fn gated(result: Result<ReviewVerdict, String>, gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
                calls: Mutex::new(vec![]),
                gate: Some(gate),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VideoReviewer for ScriptedReviewer {
        async fn review(&self, video_url: &str) -> Result<ReviewVerdict, ReviewError> {
            self.calls.lock().unwrap().push(video_url.to_string());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.result.lock().unwrap().clone() {
                Some(Ok(verdict)) => Ok(verdict),
                Some(Err(message)) => Err(ReviewError::Api {
                    status: 502,
                    message,
                }),
                None => Ok(ReviewVerdict::default()),
            }
        }
    }

    #[derive(Default)]
    struct MemoryProfiles {
        video_url: Option<String>,
        recorded: Mutex<Vec<ReviewState>>,
        loads: Mutex<u32>,
    }

    #[async_trait]
    impl ProfileSource for MemoryProfiles {
        async fn load_profile(
            &self,
            user_id: Uuid,
        ) -> Result<Option<CandidateProfileRow>, AppError> {
            *self.loads.lock().unwrap() += 1;
            let mut profile = CandidateProfileRow::empty(user_id, "Ada Lovelace");
            profile.intro_video_url = self.video_url.clone();
            Ok(Some(profile))
        }

        async fn record_review_status(
            &self,
            _user_id: Uuid,
            video_url: Option<&str>,
            state: ReviewState,
        ) -> Result<bool, AppError> {
            if self.video_url.as_deref() != video_url {
                return Ok(false);
            }
            self.recorded.lock().unwrap().push(state);
            Ok(true)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        notices: Mutex<Vec<Notice>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, _user_id: Uuid, notice: &Notice) {
            self.notices.lock().unwrap().push(notice.clone());
        }
    }

    struct Harness {
        handle: SessionHandle,
        reviewer: Arc<ScriptedReviewer>,
        profiles: Arc<MemoryProfiles>,
        sink: Arc<RecordingSink>,
    }

    fn harness(reviewer: Arc<ScriptedReviewer>) -> Harness {
        harness_with_profile_video(reviewer, Some(URL))
    }

    fn harness_with_profile_video(
        reviewer: Arc<ScriptedReviewer>,
        profile_video: Option<&str>,
    ) -> Harness {
        let profiles = Arc::new(MemoryProfiles {
            video_url: profile_video.map(String::from),
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::default());
        let deps = SessionDeps {
            reviewer: reviewer.clone(),
            profiles: profiles.clone(),
            sink: sink.clone(),
        };
        Harness {
            handle: SessionHandle::spawn(Uuid::new_v4(), deps, IntervalTicker::default()),
            reviewer,
            profiles,
            sink,
        }
    }

    async fn wait_for_state(client: &SessionClient, state: ReviewState) -> ReviewSnapshot {
        let mut rx = client.subscribe();
        let snapshot = rx
            .wait_for(|s| s.state == state)
            .await
            .expect("session closed");
        snapshot.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_then_auto_approval() {
        let h = harness(ScriptedReviewer::answering(Ok(ReviewVerdict::auto_approved())));
        let client = h.handle.client();

        let snapshot = client.observe(Some(URL.to_string())).await.unwrap();
        assert_eq!(snapshot.state, ReviewState::Pending);
        assert!(snapshot.countdown_started);
        assert_eq!(snapshot.countdown, COUNTDOWN_SECS);

        tokio::time::sleep(Duration::from_millis(9_500)).await;
        let snapshot = client.snapshot();
        assert_eq!(snapshot.state, ReviewState::Pending);
        assert_eq!(snapshot.countdown, 1);
        assert!(h.reviewer.calls().is_empty());

        let snapshot = wait_for_state(&client, ReviewState::Approved).await;
        assert_eq!(snapshot.video_url.as_deref(), Some(URL));
        assert_eq!(h.reviewer.calls(), vec![URL.to_string()]);
        assert_eq!(
            *h.profiles.recorded.lock().unwrap(),
            vec![ReviewState::Approved]
        );
        assert_eq!(*h.profiles.loads.lock().unwrap(), 1);
        assert_eq!(
            *h.sink.notices.lock().unwrap(),
            vec![Notice::ReviewStarted, Notice::Approved]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_review_failure_lands_in_manual_review() {
        let h = harness(ScriptedReviewer::answering(Err("gateway down".to_string())));
        let client = h.handle.client();
        client.observe(Some(URL.to_string())).await.unwrap();

        let snapshot = wait_for_state(&client, ReviewState::ManualReview).await;
        match snapshot.notice {
            Some(Notice::ManualReview {
                reason: ManualReason::ReviewFailed(msg),
            }) => assert!(msg.contains("gateway down"), "{msg}"),
            other => panic!("unexpected notice {other:?}"),
        }
        assert_eq!(
            *h.profiles.recorded.lock().unwrap(),
            vec![ReviewState::ManualReview]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_video_skips_review() {
        let h = harness(ScriptedReviewer::answering(Ok(ReviewVerdict::auto_approved())));
        let client = h.handle.client();

        let snapshot = client.observe(None).await.unwrap();
        assert_eq!(snapshot.state, ReviewState::ManualReview);
        assert!(!snapshot.countdown_started);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(h.reviewer.calls().is_empty());
        assert_eq!(client.snapshot().state, ReviewState::ManualReview);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_observe_reviews_once() {
        let h = harness(ScriptedReviewer::answering(Ok(ReviewVerdict::rejected())));
        let client = h.handle.client();

        client.observe(Some(URL.to_string())).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        let snapshot = client
            .observe(Some("https://x/second.mp4".to_string()))
            .await
            .unwrap();
        assert_eq!(snapshot.countdown, COUNTDOWN_SECS - 3);

        wait_for_state(&client, ReviewState::Rejected).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.reviewer.calls(), vec![URL.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_during_review_discards_result() {
        let gate = Arc::new(Notify::new());
        let h = harness(ScriptedReviewer::gated(
            Ok(ReviewVerdict::auto_approved()),
            gate.clone(),
        ));
        let client = h.handle.client();

        client.observe(Some(URL.to_string())).await.unwrap();
        wait_for_state(&client, ReviewState::Reviewing).await;

        let snapshot = client.reset().await.unwrap();
        assert_eq!(snapshot.state, ReviewState::Pending);
        assert_eq!(snapshot.countdown, COUNTDOWN_SECS);
        assert!(!snapshot.countdown_started);

        gate.notify_waiters();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(client.snapshot().state, ReviewState::Pending);
        assert!(h.profiles.recorded.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_after_reset_runs_again() {
        let h = harness(ScriptedReviewer::answering(Ok(ReviewVerdict::needs_human())));
        let client = h.handle.client();

        client.observe(Some(URL.to_string())).await.unwrap();
        wait_for_state(&client, ReviewState::ManualReview).await;

        client.reset().await.unwrap();
        client.observe(Some(URL.to_string())).await.unwrap();
        wait_for_state(&client, ReviewState::ManualReview).await;
        assert_eq!(h.reviewer.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_ends_session() {
        let h = harness(ScriptedReviewer::answering(Ok(ReviewVerdict::auto_approved())));
        let client = h.handle.client();
        client.observe(Some(URL.to_string())).await.unwrap();

        drop(h.handle);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(client.observe(None).await.is_err());
        assert!(h.reviewer.calls().is_empty());
        assert!(h.profiles.recorded.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_decision_for_replaced_video_is_not_recorded() {
        let h = harness_with_profile_video(
            ScriptedReviewer::answering(Ok(ReviewVerdict::auto_approved())),
            Some("https://x/replacement.mp4"),
        );
        let client = h.handle.client();

        client.observe(Some(URL.to_string())).await.unwrap();
        wait_for_state(&client, ReviewState::Approved).await;

        assert_eq!(h.reviewer.calls(), vec![URL.to_string()]);
        assert!(h.profiles.recorded.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_video_decision_is_recorded() {
        let h = harness_with_profile_video(
            ScriptedReviewer::answering(Ok(ReviewVerdict::auto_approved())),
            None,
        );
        h.handle.client().observe(None).await.unwrap();

        assert_eq!(
            *h.profiles.recorded.lock().unwrap(),
            vec![ReviewState::ManualReview]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_session_exits_when_idle() {
        let h = harness(ScriptedReviewer::answering(Ok(ReviewVerdict::auto_approved())));
        let client = h.handle.client();
        client.observe(None).await.unwrap();

        tokio::time::sleep(SETTLED_SESSION_TTL - Duration::from_secs(10)).await;
        // Any command restarts the idle period.
        let snapshot = client.observe(None).await.unwrap();
        assert_eq!(snapshot.state, ReviewState::ManualReview);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!h.handle.is_finished());

        tokio::time::sleep(SETTLED_SESSION_TTL).await;
        tokio::task::yield_now().await;
        assert!(h.handle.is_finished());
        assert_eq!(client.snapshot().state, ReviewState::ManualReview);
        assert!(client.reset().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_session_does_not_expire() {
        let h = harness(ScriptedReviewer::answering(Ok(ReviewVerdict::auto_approved())));
        let client = h.handle.client();
        client.reset().await.unwrap();

        tokio::time::sleep(SETTLED_SESSION_TTL * 2).await;
        assert!(!h.handle.is_finished());
        assert_eq!(client.reset().await.unwrap().state, ReviewState::Pending);
    }
}
