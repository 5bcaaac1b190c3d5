//! Core types for tag-based file retention
//!
//! This crate provides:
//! - Retention rules and their persisted integer codes
//! - Time-basis resolution and expiry/warning cutoffs
//! - The pagination cursor over tag-object associations
//! - Collaborator traits (tags, rules, mounts, file store, notifications, jobs)
//! - Runtime settings loaded from TOML

pub mod config;
pub mod cursor;
pub mod error;
pub mod model;
pub mod store;
pub mod time;

// Re-exports
pub use config::RetentionSettings;
pub use cursor::{Cursor, Page};
pub use error::{ConfigError, RuleError, StoreError};
pub use model::{
    Action, ActionType, Entry, EntryKind, JobArgument, JobKey, Location, MountId, MountInfo,
    Notification, ObjectId, ObjectKind, OwnerId, Permissions, RetentionRule, RuleRow, Subject,
    TagId, TimeBasis, TimeUnit,
};
pub use store::{
    FileStore, JobRegistrar, MountIndex, NotificationSink, RuleStore, TagObjectMapper, TagStore,
};
pub use time::{effective_time, Clock, Cutoffs, SystemClock};

/// Name of the per-owner archive container used by [`ActionType::MoveToTrash`]
pub const TRASH_FOLDER: &str = ".trash";

/// Number of object ids requested per page from the tag-object mapper
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// App identifier attached to notifications and job keys
pub const APP_ID: &str = "files_retention";
