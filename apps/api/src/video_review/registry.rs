use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::video_review::clock::IntervalTicker;
use crate::video_review::session::{SessionClient, SessionDeps, SessionHandle};

/// One review session per candidate, created on first use and kept until
/// discarded or until its task exits after settling. The lock only guards map
/// operations; commands go through the cloned client outside it.
#[derive(Clone)]
pub struct ReviewRegistry {
    deps: SessionDeps,
    sessions: Arc<Mutex<HashMap<Uuid, SessionHandle>>>,
}

impl ReviewRegistry {
    pub fn new(deps: SessionDeps) -> Self {
        Self {
            deps,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the candidate's session, spawning one if there is none or the
    /// previous task has exited.
    pub async fn get_or_spawn(&self, user_id: Uuid) -> SessionClient {
        let mut sessions = self.sessions.lock().await;
        prune_finished(&mut sessions);
        if let Some(handle) = sessions.get(&user_id) {
            return handle.client();
        }

        info!(%user_id, "Spawning video review session");
        let handle = SessionHandle::spawn(user_id, self.deps.clone(), IntervalTicker::default());
        let client = handle.client();
        sessions.insert(user_id, handle);
        client
    }

    pub async fn get(&self, user_id: Uuid) -> Option<SessionClient> {
        let mut sessions = self.sessions.lock().await;
        prune_finished(&mut sessions);
        sessions.get(&user_id).map(SessionHandle::client)
    }

    /// Drops the candidate's session, aborting any countdown or review in
    /// progress. Returns false if there was no live session.
    pub async fn discard(&self, user_id: Uuid) -> bool {
        let mut sessions = self.sessions.lock().await;
        prune_finished(&mut sessions);
        let removed = sessions.remove(&user_id).is_some();
        if removed {
            info!(%user_id, "Discarded video review session");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        prune_finished(&mut sessions);
        sessions.len()
    }
}

fn prune_finished(sessions: &mut HashMap<Uuid, SessionHandle>) {
    sessions.retain(|user_id, handle| {
        let finished = handle.is_finished();
        if finished {
            debug!(%user_id, "Evicting finished video review session");
        }
        !finished
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::errors::AppError;
    use crate::models::profile::CandidateProfileRow;
    use crate::profiles::store::ProfileSource;
    use crate::video_review::notify::TracingNotifier;
    use crate::video_review::reviewer::{ReviewError, VideoReviewer};
    use crate::video_review::session::SETTLED_SESSION_TTL;
    use crate::video_review::state::{ReviewState, ReviewVerdict};

    const OLD_VIDEO: &str = "https://x/a.mp4";
    const NEW_VIDEO: &str = "https://x/b.mp4";

    /// Approves everything, optionally holding each call until notified.
    #[derive(Default)]
    struct ApprovingReviewer {
        calls: StdMutex<Vec<String>>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl VideoReviewer for ApprovingReviewer {
        async fn review(&self, video_url: &str) -> Result<ReviewVerdict, ReviewError> {
            self.calls.lock().unwrap().push(video_url.to_string());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(ReviewVerdict::auto_approved())
        }
    }

    #[derive(Default)]
    struct RecordedDecisions {
        recorded: StdMutex<Vec<(Option<String>, ReviewState)>>,
    }

    #[async_trait]
    impl ProfileSource for RecordedDecisions {
        async fn load_profile(
            &self,
            _user_id: Uuid,
        ) -> Result<Option<CandidateProfileRow>, AppError> {
            Ok(None)
        }

        async fn record_review_status(
            &self,
            _user_id: Uuid,
            video_url: Option<&str>,
            state: ReviewState,
        ) -> Result<bool, AppError> {
            self.recorded
                .lock()
                .unwrap()
                .push((video_url.map(String::from), state));
            Ok(true)
        }
    }

    fn registry_with(
        reviewer: Arc<ApprovingReviewer>,
        profiles: Arc<RecordedDecisions>,
    ) -> ReviewRegistry {
        ReviewRegistry::new(SessionDeps {
            reviewer,
            profiles,
            sink: Arc::new(TracingNotifier),
        })
    }

    fn registry() -> ReviewRegistry {
        registry_with(Arc::default(), Arc::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_session_per_candidate() {
        let registry = registry();
        let user = Uuid::new_v4();

        let first = registry.get_or_spawn(user).await;
        first.observe(Some(OLD_VIDEO.to_string())).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let second = registry.get_or_spawn(user).await;
        assert_eq!(second.snapshot().countdown, first.snapshot().countdown);
        assert_eq!(registry.len().await, 1);

        registry.get_or_spawn(Uuid::new_v4()).await;
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_stops_session() {
        let registry = registry();
        let user = Uuid::new_v4();

        let client = registry.get_or_spawn(user).await;
        client.observe(Some(OLD_VIDEO.to_string())).await.unwrap();

        assert!(registry.discard(user).await);
        assert!(!registry.discard(user).await);
        assert!(registry.get(user).await.is_none());

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(client.snapshot().state, ReviewState::Pending);
        assert!(client.reset().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replaced_video_after_settled_review_is_reviewed() {
        let reviewer = Arc::new(ApprovingReviewer::default());
        let profiles = Arc::new(RecordedDecisions::default());
        let registry = registry_with(reviewer.clone(), profiles.clone());
        let user = Uuid::new_v4();

        let client = registry.get_or_spawn(user).await;
        client.observe(Some(OLD_VIDEO.to_string())).await.unwrap();
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(client.snapshot().state, ReviewState::Approved);

        // A settled session ignores new observations; replacing the video
        // starts over with a fresh session.
        let ignored = client.observe(Some(NEW_VIDEO.to_string())).await.unwrap();
        assert_eq!(ignored.video_url.as_deref(), Some(OLD_VIDEO));

        assert!(registry.discard(user).await);
        let client = registry.get_or_spawn(user).await;
        let snapshot = client.observe(Some(NEW_VIDEO.to_string())).await.unwrap();
        assert_eq!(snapshot.state, ReviewState::Pending);
        assert!(snapshot.countdown_started);

        tokio::time::sleep(Duration::from_secs(15)).await;
        let snapshot = client.snapshot();
        assert_eq!(snapshot.state, ReviewState::Approved);
        assert_eq!(snapshot.video_url.as_deref(), Some(NEW_VIDEO));
        assert_eq!(
            *reviewer.calls.lock().unwrap(),
            vec![OLD_VIDEO.to_string(), NEW_VIDEO.to_string()]
        );
        assert_eq!(
            *profiles.recorded.lock().unwrap(),
            vec![
                (Some(OLD_VIDEO.to_string()), ReviewState::Approved),
                (Some(NEW_VIDEO.to_string()), ReviewState::Approved),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_during_review_records_nothing() {
        let gate = Arc::new(Notify::new());
        let reviewer = Arc::new(ApprovingReviewer {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let profiles = Arc::new(RecordedDecisions::default());
        let registry = registry_with(reviewer.clone(), profiles.clone());
        let user = Uuid::new_v4();

        let client = registry.get_or_spawn(user).await;
        client.observe(Some(OLD_VIDEO.to_string())).await.unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(client.snapshot().state, ReviewState::Reviewing);

        assert!(registry.discard(user).await);
        gate.notify_waiters();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(*reviewer.calls.lock().unwrap(), vec![OLD_VIDEO.to_string()]);
        assert!(profiles.recorded.lock().unwrap().is_empty());
        assert_eq!(client.snapshot().state, ReviewState::Reviewing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_sessions_are_evicted() {
        let registry = registry();
        let settled = Uuid::new_v4();
        let waiting = Uuid::new_v4();

        registry.get_or_spawn(settled).await.observe(None).await.unwrap();
        registry.get_or_spawn(waiting).await.reset().await.unwrap();
        assert_eq!(registry.len().await, 2);

        tokio::time::sleep(SETTLED_SESSION_TTL + Duration::from_secs(1)).await;
        tokio::task::yield_now().await;

        assert_eq!(registry.len().await, 1);
        assert!(registry.get(settled).await.is_none());
        assert!(registry.get(waiting).await.is_some());
        assert!(!registry.discard(settled).await);

        let respawned = registry.get_or_spawn(settled).await;
        assert_eq!(respawned.snapshot().state, ReviewState::Pending);
    }
}
