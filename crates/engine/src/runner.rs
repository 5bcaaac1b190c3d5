//! Retention job runner
//!
//! One run of a retention job for a single tag:
//! 1. Validate the tag (retire the job if it is malformed or gone)
//! 2. Load the tag's retention rule (retire the job if there is none)
//! 3. Compute expiry and warning cutoffs once for the whole run
//! 4. Walk the tagged files page by page and evaluate each one
//!
//! Per-file failures are logged and never abort the run.

use crate::disposition::{DispositionExecutor, DispositionOutcome};
use crate::notify::NotificationIssuer;
use crate::resolver::{ObjectResolver, ResolveError};
use crate::Services;
use retention_core::{
    effective_time, Action, Cursor, Cutoffs, JobArgument, JobKey, ObjectId, ObjectKind, Page,
    RetentionRule, RetentionSettings, StoreError, TagId,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a job removed itself from the job list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    /// Job argument is not a valid tag id
    MalformedTag,
    /// Tag was deleted
    TagMissing,
    /// Tag has no retention rule anymore
    NoRule,
}

/// Counters for a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Pages fetched from the tag-object mapper
    pub pages: usize,
    /// Object ids evaluated
    pub scanned: usize,
    /// Ids without a deletable entry on any mount
    pub not_found: usize,
    /// Files deleted or moved
    pub disposed: usize,
    /// Expired files whose disposition failed
    pub failed: usize,
    /// Files left in place (not expired, or no usable action)
    pub retained: usize,
    /// Warnings submitted
    pub notified: usize,
}

impl RunReport {
    /// Check if the run changed anything
    pub fn has_activity(&self) -> bool {
        self.disposed + self.failed + self.notified > 0
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The rule no longer applies; the job was deregistered
    Retired(RetireReason),
    Completed(RunReport),
}

/// Collaborator failure that stopped a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to look up tag {tag}: {source}")]
    TagLookup {
        tag: TagId,
        #[source]
        source: StoreError,
    },

    #[error("failed to load retention rule for tag {tag}: {source}")]
    RuleLookup {
        tag: TagId,
        #[source]
        source: StoreError,
    },

    #[error("failed to fetch files for tag {tag}: {source}")]
    Paging {
        tag: TagId,
        #[source]
        source: StoreError,
    },

    #[error("failed to remove retention job for tag '{tag}': {source}")]
    Deregister {
        tag: String,
        #[source]
        source: StoreError,
    },
}

/// Runs retention jobs against a set of collaborators
pub struct RetentionRunner {
    services: Services,
    settings: RetentionSettings,
    resolver: ObjectResolver,
    executor: DispositionExecutor,
    issuer: NotificationIssuer,
}

/// Per-run values shared by every file
struct RunContext<'a> {
    rule: &'a RetentionRule,
    action: Option<Action>,
    cutoffs: Cutoffs,
}

impl RetentionRunner {
    pub fn new(services: Services, settings: RetentionSettings) -> Self {
        let resolver = ObjectResolver::new(services.mounts.clone(), services.files.clone());
        let executor = DispositionExecutor::new(services.files.clone(), services.clock.clone());
        let issuer =
            NotificationIssuer::new(services.notifications.clone(), services.clock.clone());

        Self {
            services,
            settings,
            resolver,
            executor,
            issuer,
        }
    }

    pub fn settings(&self) -> &RetentionSettings {
        &self.settings
    }

    /// Run the retention job registered with `argument`
    pub fn run(&self, argument: &JobArgument) -> Result<RunOutcome, RunError> {
        let tag = match argument.tag.parse::<TagId>() {
            Ok(tag) => tag,
            Err(e) => {
                self.retire(argument, RetireReason::MalformedTag)?;
                debug!(tag = %argument.tag, error = %e, "Background job was removed, because tag is invalid");
                return Ok(RunOutcome::Retired(RetireReason::MalformedTag));
            }
        };

        let exists = self
            .services
            .tags
            .tag_exists(tag)
            .map_err(|source| RunError::TagLookup { tag, source })?;
        if !exists {
            self.retire(argument, RetireReason::TagMissing)?;
            debug!(tag = %tag, "Background job was removed, because tag no longer exists");
            return Ok(RunOutcome::Retired(RetireReason::TagMissing));
        }

        let rule = match self
            .services
            .rules
            .rule_for_tag(tag)
            .map_err(|source| RunError::RuleLookup { tag, source })?
        {
            Some(rule) => rule,
            None => {
                self.retire(argument, RetireReason::NoRule)?;
                debug!(tag = %tag, "Background job was removed, because tag has no retention configured");
                return Ok(RunOutcome::Retired(RetireReason::NoRule));
            }
        };

        let report = self.sweep(tag, &rule)?;

        if report.has_activity() {
            info!(
                tag = %tag,
                scanned = report.scanned,
                disposed = report.disposed,
                failed = report.failed,
                notified = report.notified,
                "Retention run complete"
            );
        } else {
            debug!(tag = %tag, scanned = report.scanned, "Retention run complete, nothing to do");
        }

        Ok(RunOutcome::Completed(report))
    }

    fn retire(&self, argument: &JobArgument, reason: RetireReason) -> Result<(), RunError> {
        let job = JobKey::retention(argument.clone());
        self.services
            .jobs
            .deregister(&job)
            .map_err(|source| RunError::Deregister {
                tag: argument.tag.clone(),
                source,
            })?;
        debug!(tag = %argument.tag, reason = ?reason, "Retention job deregistered");
        Ok(())
    }

    /// Evaluate every file carrying `tag`
    fn sweep(&self, tag: TagId, rule: &RetentionRule) -> Result<RunReport, RunError> {
        let cutoffs = Cutoffs::compute(
            self.services.clock.now(),
            rule.time_unit,
            rule.time_amount,
        );

        if self.settings.notify_before {
            debug!(
                tag = %tag,
                delete_before = %cutoffs.expiry.to_rfc3339(),
                notify_before = %cutoffs.warning.to_rfc3339(),
                "Running retention"
            );
        } else {
            debug!(tag = %tag, delete_before = %cutoffs.expiry.to_rfc3339(), "Running retention");
        }

        let action = rule.action();
        if action.is_none() {
            warn!(tag = %tag, "Rule moves files to a path but has no destination, files will be kept");
        }

        let ctx = RunContext {
            rule,
            action,
            cutoffs,
        };

        let page_size = self.settings.page_size;
        let mut report = RunReport::default();
        let mut cursor = Cursor::start();

        loop {
            let ids = self
                .services
                .mapper
                .object_ids(tag, ObjectKind::Files, page_size, cursor)
                .map_err(|source| RunError::Paging { tag, source })?;
            let page = Page::new(ids, page_size);
            report.pages += 1;

            debug!(tag = %tag, count = page.len(), "Checking retention for files in this chunk");

            for &id in page.ids() {
                self.evaluate(id, &ctx, &mut report);
            }

            match page.next_cursor() {
                Some(next) => cursor = next,
                None => break,
            }
        }

        Ok(report)
    }

    /// Resolve, age, and dispose of or warn about one file
    fn evaluate(&self, id: ObjectId, ctx: &RunContext<'_>, report: &mut RunReport) {
        report.scanned += 1;

        let handle = match self.resolver.resolve(id) {
            Ok(handle) => handle,
            Err(e @ ResolveError::MountIndex { .. }) => {
                warn!(file_id = %id, error = %e, "Node lookup failed");
                report.not_found += 1;
                return;
            }
            Err(e) => {
                debug!(file_id = %id, error = %e, "Node was not found");
                report.not_found += 1;
                return;
            }
        };

        let time = effective_time(&handle.entry, ctx.rule.time_basis);

        let disposed = match &ctx.action {
            Some(action) if ctx.cutoffs.is_expired(time) => {
                debug!(file_id = %id, action = %ctx.rule.action_type, "Expiring file");
                match self.executor.dispose(&handle, action) {
                    DispositionOutcome::Disposed(_) => {
                        report.disposed += 1;
                        true
                    }
                    DispositionOutcome::Skipped => {
                        report.failed += 1;
                        false
                    }
                }
            }
            _ => {
                debug!(file_id = %id, "Skipping file from expiration");
                report.retained += 1;
                false
            }
        };

        // A failed disposition still falls through to the warning check
        if self.settings.notify_before
            && !disposed
            && self
                .issuer
                .notify_pending(&handle, ctx.rule.time_basis, &ctx.cutoffs)
        {
            report.notified += 1;
        }
    }
}
