//! Disposition actions for expired files
//!
//! Three mutually exclusive actions:
//! - delete the entry
//! - move it into the owner's `.trash` folder under a time-stamped name
//! - move it into a configured archive path whose first folder is hidden
//!
//! Folder creation is idempotent: a folder created concurrently by another
//! job counts as success. Free names are re-checked at move time; if another
//! actor takes a name between the check and the move, the next candidate is
//! tried.

use crate::naming::{copy_candidates, hidden_destination, trash_candidates, MAX_NAME_ATTEMPTS};
use crate::resolver::ObjectHandle;
use retention_core::{
    Action, Clock, Entry, EntryKind, FileStore, Location, ObjectId, RuleError, StoreError,
    TRASH_FOLDER,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// Where an entry ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Deleted,
    Moved(Location),
}

/// Result of a disposition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispositionOutcome {
    Disposed(Placement),
    /// The action failed; the entry was left where it was
    Skipped,
}

impl DispositionOutcome {
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed(_))
    }
}

/// Failure while carrying out an action
#[derive(Debug, Error)]
pub enum DispositionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0} exists but is not a folder")]
    NotAContainer(Location),

    #[error("no free name for '{name}' in {dir} after {attempts} attempts")]
    NamesExhausted {
        name: String,
        dir: Location,
        attempts: usize,
    },

    #[error(transparent)]
    InvalidDestination(#[from] RuleError),

    #[error("file {0} has no name")]
    Unnamed(ObjectId),
}

/// Applies disposition actions through the file store
pub struct DispositionExecutor {
    files: Arc<dyn FileStore>,
    clock: Arc<dyn Clock>,
}

impl DispositionExecutor {
    pub fn new(files: Arc<dyn FileStore>, clock: Arc<dyn Clock>) -> Self {
        Self { files, clock }
    }

    /// Apply `action`; failures are logged and reported as [`DispositionOutcome::Skipped`]
    pub fn dispose(&self, handle: &ObjectHandle, action: &Action) -> DispositionOutcome {
        match self.try_dispose(&handle.entry, action) {
            Ok(placement) => DispositionOutcome::Disposed(placement),
            Err(e) => {
                error!(file_id = %handle.entry.id, error = %e, "Failed to process file");
                DispositionOutcome::Skipped
            }
        }
    }

    /// Apply `action`, returning the failure instead of logging it
    pub fn try_dispose(&self, entry: &Entry, action: &Action) -> Result<Placement, DispositionError> {
        match action {
            Action::Delete => {
                self.files.delete_entry(entry)?;
                debug!(file_id = %entry.id, "Deleted file");
                Ok(Placement::Deleted)
            }
            Action::MoveToTrash => self.move_to_trash(entry).map(Placement::Moved),
            Action::MoveToPath(dest) => self.move_to_path(entry, dest).map(Placement::Moved),
        }
    }

    /// Make sure a folder exists at `at`
    ///
    /// Succeeds if the folder already exists or is created concurrently by
    /// someone else. Fails if a file occupies the name.
    pub fn ensure_container(&self, at: &Location) -> Result<(), DispositionError> {
        match self.files.entry_kind(at)? {
            Some(EntryKind::Container) => return Ok(()),
            Some(EntryKind::File) => return Err(DispositionError::NotAContainer(at.clone())),
            None => {}
        }

        match self.files.create_container(at) {
            Ok(()) => {
                debug!(path = %at, "Created folder");
                Ok(())
            }
            Err(e) if e.is_already_exists() => match self.files.entry_kind(at)? {
                Some(EntryKind::Container) => Ok(()),
                _ => Err(DispositionError::NotAContainer(at.clone())),
            },
            Err(e) => Err(e.into()),
        }
    }

    fn move_to_trash(&self, entry: &Entry) -> Result<Location, DispositionError> {
        let trash = Location::root(entry.owner.clone()).join(TRASH_FOLDER);
        self.ensure_container(&trash)?;

        let name = entry.name().ok_or(DispositionError::Unnamed(entry.id))?;
        let stamp = self.clock.now().timestamp();

        let target = self.move_into(entry, &trash, name, trash_candidates(name, stamp))?;
        debug!(file_id = %entry.id, target = %target, "Moved file to trash");
        Ok(target)
    }

    fn move_to_path(&self, entry: &Entry, destination: &str) -> Result<Location, DispositionError> {
        let segments = hidden_destination(destination)?;

        let configured_first = destination.split('/').find(|p| !p.is_empty());
        if let Some(first) = segments.first() {
            if configured_first != Some(first.as_str()) {
                debug!(folder = %first, "Prefixing archive folder with dot to hide it from mobile apps");
            }
        }

        let mut folder = Location::root(entry.owner.clone());
        for segment in &segments {
            folder = folder.join(segment);
            self.ensure_container(&folder)?;
        }

        let name = entry.name().ok_or(DispositionError::Unnamed(entry.id))?;
        let target = self.move_into(entry, &folder, name, copy_candidates(name))?;
        debug!(file_id = %entry.id, target = %target, "Moved file to archive path (hidden from mobile apps)");
        Ok(target)
    }

    /// Move `entry` into `dir` under the first free candidate name
    fn move_into(
        &self,
        entry: &Entry,
        dir: &Location,
        name: &str,
        candidates: impl Iterator<Item = String>,
    ) -> Result<Location, DispositionError> {
        for candidate in candidates.take(MAX_NAME_ATTEMPTS) {
            let target = dir.join(&candidate);
            if self.files.entry_exists(&target)? {
                continue;
            }

            match self.files.move_entry(entry, &target) {
                Ok(()) => return Ok(target),
                Err(e) if e.is_already_exists() => {
                    debug!(target = %target, "Destination was taken concurrently, trying next name");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DispositionError::NamesExhausted {
            name: name.to_string(),
            dir: dir.clone(),
            attempts: MAX_NAME_ATTEMPTS,
        })
    }
}
