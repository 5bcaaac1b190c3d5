//! Advance warning for files that expire on the next run

use crate::resolver::ObjectHandle;
use retention_core::{
    effective_time, Clock, Cutoffs, Entry, Notification, NotificationSink, Subject, TimeBasis,
    APP_ID,
};
use std::sync::Arc;
use tracing::{debug, error};

/// Builds and submits "deleted tomorrow" notifications
pub struct NotificationIssuer {
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl NotificationIssuer {
    pub fn new(sink: Arc<dyn NotificationSink>, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock }
    }

    /// Notification for the owner of `entry`
    pub fn build(&self, entry: &Entry) -> Notification {
        Notification {
            app: APP_ID.to_string(),
            user: entry.owner.clone(),
            object_type: "retention".to_string(),
            object_id: entry.id.to_string(),
            subject: Subject::DeleteTomorrow,
            parameters: serde_json::json!({ "fileId": entry.id.0 }),
            created_at: self.clock.now(),
        }
    }

    /// Warn the owner if the file is aged past the warning cutoff
    ///
    /// Callers skip this for files disposed of in the same pass. Returns
    /// whether a notification was submitted; submission failures are logged.
    pub fn notify_pending(&self, handle: &ObjectHandle, basis: TimeBasis, cutoffs: &Cutoffs) -> bool {
        let entry = &handle.entry;
        if effective_time(entry, basis) >= cutoffs.warning {
            return false;
        }

        let notification = self.build(entry);
        debug!(
            file_id = %entry.id,
            user = %notification.user,
            subject = notification.subject.as_str(),
            "Notifying about retention tomorrow"
        );
        match self.sink.submit(&notification) {
            Ok(()) => true,
            Err(e) => {
                error!(file_id = %entry.id, error = %e, "Failed to submit retention notification");
                false
            }
        }
    }
}
