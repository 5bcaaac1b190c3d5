//! Resolve a file id to an entry the retention job may delete or move
//!
//! A file can be reachable through several mounts (shares, group folders,
//! external storage) and, within one namespace, at several paths. Mounts are
//! tried in index order; the first entry with the delete permission wins.

use retention_core::{
    Entry, FileStore, MountIndex, MountInfo, ObjectId, Permissions, StoreError,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Why one mount did not yield a usable entry
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("mount point {mount} has no entry for file {id}: {reason}")]
    Missing {
        mount: String,
        id: ObjectId,
        reason: String,
    },

    #[error("mount point {mount} has access to file {id} but permissions are {permissions}")]
    Denied {
        mount: String,
        id: ObjectId,
        permissions: Permissions,
    },
}

impl CandidateError {
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

/// File could not be resolved to a deletable entry
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no mount points found for file {0}")]
    NoMounts(ObjectId),

    #[error("no mount point with delete permissions found for file {id}")]
    NotFound {
        id: ObjectId,
        attempts: Vec<CandidateError>,
    },

    #[error("failed to list mount points for file {id}: {source}")]
    MountIndex {
        id: ObjectId,
        #[source]
        source: StoreError,
    },
}

/// A resolved, deletable entry
#[derive(Debug)]
pub struct ObjectHandle {
    /// Mount the entry was found through
    pub mount: MountInfo,
    pub entry: Entry,
    /// Mounts tried before this one, in order
    pub skipped: Vec<CandidateError>,
}

/// Return the first successful candidate, or every failure in order
///
/// Candidates are pulled lazily; nothing after the first success is evaluated.
pub fn first_capable<T, I>(candidates: I) -> Result<(T, Vec<CandidateError>), Vec<CandidateError>>
where
    I: IntoIterator<Item = Result<T, CandidateError>>,
{
    let mut failures = Vec::new();
    for candidate in candidates {
        match candidate {
            Ok(found) => return Ok((found, failures)),
            Err(e) => failures.push(e),
        }
    }
    Err(failures)
}

/// Finds deletable entries through the mount index and file store
pub struct ObjectResolver {
    mounts: Arc<dyn MountIndex>,
    files: Arc<dyn FileStore>,
}

impl ObjectResolver {
    pub fn new(mounts: Arc<dyn MountIndex>, files: Arc<dyn FileStore>) -> Self {
        Self { mounts, files }
    }

    /// Resolve `id` to the first deletable entry across its mounts
    pub fn resolve(&self, id: ObjectId) -> Result<ObjectHandle, ResolveError> {
        let mounts = self
            .mounts
            .mounts_for_object(id)
            .map_err(|source| ResolveError::MountIndex { id, source })?;

        if mounts.is_empty() {
            return Err(ResolveError::NoMounts(id));
        }

        let candidates = mounts.iter().map(|mount| {
            self.candidate_at_mount(mount, id)
                .map(|entry| (mount.clone(), entry))
        });

        match first_capable(candidates) {
            Ok(((mount, entry), skipped)) => Ok(ObjectHandle {
                mount,
                entry,
                skipped,
            }),
            Err(attempts) => Err(ResolveError::NotFound { id, attempts }),
        }
    }

    /// First deletable entry for `id` in the namespace of the mount's user
    fn candidate_at_mount(&self, mount: &MountInfo, id: ObjectId) -> Result<Entry, CandidateError> {
        let mount_id = mount.display_id();

        let entries = self
            .files
            .entries_matching(&mount.user, id)
            .map_err(|e| {
                debug!(mount_id = %mount_id, user = %mount.user, error = %e, "Could not open user namespace");
                CandidateError::Missing {
                    mount: mount_id.clone(),
                    id,
                    reason: e.to_string(),
                }
            })?;

        if entries.is_empty() {
            debug!(file_id = %id, user = %mount.user, "No node for file and user");
            return Err(CandidateError::Missing {
                mount: mount_id,
                id,
                reason: format!("no node for user {}", mount.user),
            });
        }

        let mut denied = Permissions::default();
        for entry in entries {
            if entry.permissions.is_deletable() {
                return Ok(entry);
            }
            debug!(
                mount_id = %mount_id,
                file_id = %id,
                permissions = %entry.permissions,
                "Mount point has access to node but not the delete permission"
            );
            denied = entry.permissions;
        }

        debug!(mount_id = %mount_id, file_id = %id, "Mount point has no delete permissions for file");
        Err(CandidateError::Denied {
            mount: mount_id,
            id,
            permissions: denied,
        })
    }
}
