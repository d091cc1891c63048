use tracing::info;
use uuid::Uuid;

use crate::video_review::state::Notice;

/// Receives user-visible review feedback. Purely observational.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, user_id: Uuid, notice: &Notice);
}

/// Default sink: structured log events, picked up by whatever ships the logs.
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, user_id: Uuid, notice: &Notice) {
        info!(%user_id, ?notice, "{}", notice.message());
    }
}
