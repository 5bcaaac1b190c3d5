//! Retention job engine
//!
//! Drives one retention rule over every file carrying its tag:
//! - `resolver`: find a deletable entry for a file id across its mounts
//! - `disposition`: delete, move to `.trash`, or move to a hidden archive path
//! - `notify`: warn owners a day before disposal
//! - `runner`: validate the rule, paginate the tag, evaluate each file
//! - `worker`: run a job periodically until it retires itself

pub mod disposition;
pub mod naming;
pub mod notify;
pub mod resolver;
pub mod runner;
pub mod worker;

use retention_core::{
    Clock, FileStore, JobRegistrar, MountIndex, NotificationSink, RuleStore, TagObjectMapper,
    TagStore,
};
use std::sync::Arc;

// Re-exports
pub use disposition::{DispositionError, DispositionExecutor, DispositionOutcome, Placement};
pub use notify::NotificationIssuer;
pub use resolver::{CandidateError, ObjectHandle, ObjectResolver, ResolveError};
pub use runner::{RetentionRunner, RetireReason, RunError, RunOutcome, RunReport};
pub use worker::start_retention_worker;

/// External collaborators a retention run talks to
#[derive(Clone)]
pub struct Services {
    pub tags: Arc<dyn TagStore>,
    pub mapper: Arc<dyn TagObjectMapper>,
    pub rules: Arc<dyn RuleStore>,
    pub mounts: Arc<dyn MountIndex>,
    pub files: Arc<dyn FileStore>,
    pub notifications: Arc<dyn NotificationSink>,
    pub jobs: Arc<dyn JobRegistrar>,
    pub clock: Arc<dyn Clock>,
}
