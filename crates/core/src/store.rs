//! Collaborator interfaces consumed by the retention engine
//!
//! Implementations live outside this workspace (the tag subsystem, the file
//! store, the notification manager, the job list). All methods are blocking
//! and must be safe to call from several retention jobs at once.

use crate::cursor::Cursor;
use crate::error::StoreError;
use crate::model::{
    Entry, EntryKind, JobKey, Location, MountInfo, Notification, ObjectId, ObjectKind, OwnerId,
    RetentionRule, TagId,
};

/// Tag lifecycle lookups
pub trait TagStore: Send + Sync {
    fn tag_exists(&self, tag: TagId) -> Result<bool, StoreError>;
}

/// Tag to object associations
pub trait TagObjectMapper: Send + Sync {
    /// Up to `limit` ids tagged with `tag`, in ascending order, strictly after `cursor`
    fn object_ids(
        &self,
        tag: TagId,
        kind: ObjectKind,
        limit: usize,
        cursor: Cursor,
    ) -> Result<Vec<ObjectId>, StoreError>;
}

/// Retention rule lookups
pub trait RuleStore: Send + Sync {
    fn rule_for_tag(&self, tag: TagId) -> Result<Option<RetentionRule>, StoreError>;
}

/// Which mounts reference a file
pub trait MountIndex: Send + Sync {
    /// Mounts in a stable order; may be empty
    fn mounts_for_object(&self, id: ObjectId) -> Result<Vec<MountInfo>, StoreError>;
}

/// Hierarchical file store, viewed through one user's namespace at a time
pub trait FileStore: Send + Sync {
    /// All entries for `id` visible to `user`; one file may appear at several paths
    fn entries_matching(&self, user: &OwnerId, id: ObjectId) -> Result<Vec<Entry>, StoreError>;

    /// Kind of the entry at `at`, `None` when nothing is there
    fn entry_kind(&self, at: &Location) -> Result<Option<EntryKind>, StoreError>;

    fn entry_exists(&self, at: &Location) -> Result<bool, StoreError> {
        Ok(self.entry_kind(at)?.is_some())
    }

    /// Create a single folder; the parent must exist
    ///
    /// Returns [`StoreError::AlreadyExists`] when anything occupies `at`.
    fn create_container(&self, at: &Location) -> Result<(), StoreError>;

    /// Move `entry` to `to`, which must be free
    ///
    /// Returns [`StoreError::AlreadyExists`] when `to` is occupied.
    fn move_entry(&self, entry: &Entry, to: &Location) -> Result<(), StoreError>;

    /// Permanently remove `entry`
    fn delete_entry(&self, entry: &Entry) -> Result<(), StoreError>;
}

/// Notification manager
pub trait NotificationSink: Send + Sync {
    fn submit(&self, notification: &Notification) -> Result<(), StoreError>;
}

/// Job list the retention job is registered in
pub trait JobRegistrar: Send + Sync {
    /// Remove a job; removing an unknown job succeeds
    fn deregister(&self, job: &JobKey) -> Result<(), StoreError>;
}
