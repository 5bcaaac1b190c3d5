//! In-memory collaborators for engine integration tests
//!
//! Every fake records the calls that mutate state so tests can assert on
//! deletions, moves, folder creation, notifications and deregistrations.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use retention_core::{
    Clock, Cursor, Entry, EntryKind, FileStore, JobArgument, JobKey, JobRegistrar, Location,
    MountId, MountIndex, MountInfo, Notification, NotificationSink, ObjectId, ObjectKind, OwnerId,
    Permissions, RetentionRule, RetentionSettings, RuleStore, StoreError, TagId, TagObjectMapper,
    TagStore,
};
use retention_engine::{RetentionRunner, Services};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

pub fn owner(uid: &str) -> OwnerId {
    OwnerId::new(uid)
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
pub struct MemoryTags {
    pub tags: Mutex<HashSet<TagId>>,
    pub lookups: Mutex<usize>,
    /// Every tag disappears after this many lookups
    pub delete_after: Mutex<Option<usize>>,
}

impl TagStore for MemoryTags {
    fn tag_exists(&self, tag: TagId) -> Result<bool, StoreError> {
        let mut lookups = self.lookups.lock();
        *lookups += 1;

        if let Some(limit) = *self.delete_after.lock() {
            if *lookups > limit {
                return Ok(false);
            }
        }
        Ok(self.tags.lock().contains(&tag))
    }
}

#[derive(Default)]
pub struct MemoryMapper {
    pub assoc: Mutex<BTreeMap<TagId, BTreeSet<ObjectId>>>,
    /// Cursor positions requested, in order
    pub requests: Mutex<Vec<Option<ObjectId>>>,
}

impl MemoryMapper {
    pub fn tag(&self, tag: TagId, ids: impl IntoIterator<Item = u64>) {
        self.assoc
            .lock()
            .entry(tag)
            .or_default()
            .extend(ids.into_iter().map(ObjectId));
    }
}

impl TagObjectMapper for MemoryMapper {
    fn object_ids(
        &self,
        tag: TagId,
        kind: ObjectKind,
        limit: usize,
        cursor: Cursor,
    ) -> Result<Vec<ObjectId>, StoreError> {
        assert_eq!(kind.as_str(), "files", "only file associations are tagged here");
        self.requests.lock().push(cursor.after());

        let assoc = self.assoc.lock();
        let Some(ids) = assoc.get(&tag) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .filter(|id| cursor.after().map_or(true, |after| **id > after))
            .take(limit)
            .copied()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryRules {
    pub rules: Mutex<HashMap<TagId, RetentionRule>>,
}

impl RuleStore for MemoryRules {
    fn rule_for_tag(&self, tag: TagId) -> Result<Option<RetentionRule>, StoreError> {
        Ok(self.rules.lock().get(&tag).cloned())
    }
}

#[derive(Default)]
pub struct MemoryMounts {
    pub mounts: Mutex<HashMap<ObjectId, Vec<MountInfo>>>,
}

impl MemoryMounts {
    pub fn add(&self, id: u64, mount_id: u64, user: &str) {
        self.mounts.lock().entry(ObjectId(id)).or_default().push(MountInfo {
            mount_id: Some(MountId(mount_id)),
            user: owner(user),
        });
    }
}

impl MountIndex for MemoryMounts {
    fn mounts_for_object(&self, id: ObjectId) -> Result<Vec<MountInfo>, StoreError> {
        Ok(self.mounts.lock().get(&id).cloned().unwrap_or_default())
    }
}

/// Mutating file store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCall {
    CreateContainer(Location),
    Move { from: Location, to: Location },
    Delete(Location),
}

#[derive(Debug, Clone)]
struct Node {
    kind: EntryKind,
    id: Option<ObjectId>,
    owner: OwnerId,
    created_at: i64,
    modified_at: i64,
    permissions: Permissions,
}

/// File tree per user, keyed by (user, relative path)
#[derive(Default)]
pub struct MemoryFiles {
    nodes: Mutex<BTreeMap<(OwnerId, PathBuf), Node>>,
    pub calls: Mutex<Vec<FileCall>>,
    /// Moves to these targets fail as if another actor just took the name
    pub claim_on_move: Mutex<HashSet<Location>>,
    /// Folders another actor creates right before we do
    pub race_on_create: Mutex<HashSet<Location>>,
    /// Every move fails with a backend error
    pub fail_moves: Mutex<bool>,
}

impl MemoryFiles {
    /// Add a file owned by `user` at `path` in the user's own namespace
    pub fn add_file(&self, user: &str, path: &str, id: u64, created_at: i64, modified_at: i64) {
        self.add_visible(user, user, path, id, created_at, modified_at, Permissions::ALL);
    }

    /// Add a file owned by `owner_uid` visible in `viewer`'s namespace
    pub fn add_visible(
        &self,
        viewer: &str,
        owner_uid: &str,
        path: &str,
        id: u64,
        created_at: i64,
        modified_at: i64,
        permissions: Permissions,
    ) {
        self.nodes.lock().insert(
            (owner(viewer), PathBuf::from(path)),
            Node {
                kind: EntryKind::File,
                id: Some(ObjectId(id)),
                owner: owner(owner_uid),
                created_at,
                modified_at,
                permissions,
            },
        );
    }

    /// Occupy a path with a plain file that no tag refers to
    pub fn add_placeholder(&self, user: &str, path: &str) {
        self.nodes.lock().insert(
            (owner(user), PathBuf::from(path)),
            Node {
                kind: EntryKind::File,
                id: None,
                owner: owner(user),
                created_at: 0,
                modified_at: 0,
                permissions: Permissions::ALL,
            },
        );
    }

    pub fn add_folder(&self, user: &str, path: &str) {
        self.nodes.lock().insert((owner(user), PathBuf::from(path)), folder(user));
    }

    pub fn exists(&self, user: &str, path: &str) -> bool {
        self.nodes.lock().contains_key(&(owner(user), PathBuf::from(path)))
    }

    pub fn kind(&self, user: &str, path: &str) -> Option<EntryKind> {
        self.nodes
            .lock()
            .get(&(owner(user), PathBuf::from(path)))
            .map(|n| n.kind)
    }

    pub fn deletes(&self) -> Vec<Location> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                FileCall::Delete(at) => Some(at.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn moves(&self) -> Vec<(Location, Location)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                FileCall::Move { from, to } => Some((from.clone(), to.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn created(&self) -> Vec<Location> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                FileCall::CreateContainer(at) => Some(at.clone()),
                _ => None,
            })
            .collect()
    }

    fn key(at: &Location) -> (OwnerId, PathBuf) {
        (at.owner.clone(), at.path.clone())
    }

    fn parent_is_folder(nodes: &BTreeMap<(OwnerId, PathBuf), Node>, at: &Location) -> bool {
        match at.path.parent() {
            None => true,
            Some(parent) if parent == Path::new("") => true,
            Some(parent) => nodes
                .get(&(at.owner.clone(), parent.to_path_buf()))
                .map_or(false, |n| n.kind == EntryKind::Container),
        }
    }
}

fn folder(user: &str) -> Node {
    Node {
        kind: EntryKind::Container,
        id: None,
        owner: owner(user),
        created_at: 0,
        modified_at: 0,
        permissions: Permissions::ALL,
    }
}

impl FileStore for MemoryFiles {
    fn entries_matching(&self, user: &OwnerId, id: ObjectId) -> Result<Vec<Entry>, StoreError> {
        Ok(self
            .nodes
            .lock()
            .iter()
            .filter(|((viewer, _), node)| viewer == user && node.id == Some(id))
            .map(|((viewer, path), node)| Entry {
                id,
                owner: node.owner.clone(),
                location: Location::new(viewer.clone(), path.clone()),
                kind: node.kind,
                created_at: node.created_at,
                modified_at: node.modified_at,
                permissions: node.permissions,
            })
            .collect())
    }

    fn entry_kind(&self, at: &Location) -> Result<Option<EntryKind>, StoreError> {
        Ok(self.nodes.lock().get(&Self::key(at)).map(|n| n.kind))
    }

    fn create_container(&self, at: &Location) -> Result<(), StoreError> {
        let mut nodes = self.nodes.lock();

        if self.race_on_create.lock().remove(at) {
            nodes.insert(Self::key(at), folder(at.owner.as_str()));
            return Err(StoreError::AlreadyExists(at.path.clone()));
        }
        if nodes.contains_key(&Self::key(at)) {
            return Err(StoreError::AlreadyExists(at.path.clone()));
        }
        if !Self::parent_is_folder(&nodes, at) {
            return Err(StoreError::NotFound(format!("parent of {}", at)));
        }

        nodes.insert(Self::key(at), folder(at.owner.as_str()));
        self.calls.lock().push(FileCall::CreateContainer(at.clone()));
        Ok(())
    }

    fn move_entry(&self, entry: &Entry, to: &Location) -> Result<(), StoreError> {
        if *self.fail_moves.lock() {
            return Err(StoreError::Backend("storage unavailable".to_string()));
        }

        let mut nodes = self.nodes.lock();

        if self.claim_on_move.lock().remove(to) {
            nodes.insert(Self::key(to), folder(to.owner.as_str()));
            return Err(StoreError::AlreadyExists(to.path.clone()));
        }
        if nodes.contains_key(&Self::key(to)) {
            return Err(StoreError::AlreadyExists(to.path.clone()));
        }
        if !Self::parent_is_folder(&nodes, to) {
            return Err(StoreError::NotFound(format!("parent of {}", to)));
        }

        let node = nodes
            .remove(&Self::key(&entry.location))
            .ok_or_else(|| StoreError::NotFound(entry.location.to_string()))?;
        nodes.insert(Self::key(to), node);

        self.calls.lock().push(FileCall::Move {
            from: entry.location.clone(),
            to: to.clone(),
        });
        Ok(())
    }

    fn delete_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        self.nodes
            .lock()
            .remove(&Self::key(&entry.location))
            .ok_or_else(|| StoreError::NotFound(entry.location.to_string()))?;
        self.calls.lock().push(FileCall::Delete(entry.location.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNotifications {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: Mutex<bool>,
}

impl NotificationSink for MemoryNotifications {
    fn submit(&self, notification: &Notification) -> Result<(), StoreError> {
        if *self.fail.lock() {
            return Err(StoreError::Backend("notification manager offline".to_string()));
        }
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryJobs {
    pub registered: Mutex<HashSet<JobKey>>,
    pub deregistered: Mutex<Vec<JobKey>>,
}

impl MemoryJobs {
    pub fn register(&self, argument: JobArgument) {
        self.registered.lock().insert(JobKey::retention(argument));
    }
}

impl JobRegistrar for MemoryJobs {
    fn deregister(&self, job: &JobKey) -> Result<(), StoreError> {
        self.registered.lock().remove(job);
        self.deregistered.lock().push(job.clone());
        Ok(())
    }
}

/// All fakes wired together
pub struct World {
    pub tags: Arc<MemoryTags>,
    pub mapper: Arc<MemoryMapper>,
    pub rules: Arc<MemoryRules>,
    pub mounts: Arc<MemoryMounts>,
    pub files: Arc<MemoryFiles>,
    pub notifications: Arc<MemoryNotifications>,
    pub jobs: Arc<MemoryJobs>,
    pub clock: Arc<FixedClock>,
}

impl World {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            tags: Arc::default(),
            mapper: Arc::default(),
            rules: Arc::default(),
            mounts: Arc::default(),
            files: Arc::default(),
            notifications: Arc::default(),
            jobs: Arc::default(),
            clock: Arc::new(FixedClock(now)),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            tags: self.tags.clone(),
            mapper: self.mapper.clone(),
            rules: self.rules.clone(),
            mounts: self.mounts.clone(),
            files: self.files.clone(),
            notifications: self.notifications.clone(),
            jobs: self.jobs.clone(),
            clock: self.clock.clone(),
        }
    }

    pub fn runner(&self, notify_before: bool) -> RetentionRunner {
        self.runner_with(RetentionSettings {
            notify_before,
            ..RetentionSettings::default()
        })
    }

    pub fn runner_with(&self, settings: RetentionSettings) -> RetentionRunner {
        RetentionRunner::new(self.services(), settings)
    }

    /// Register a tag with its rule and job
    pub fn add_rule(&self, rule: RetentionRule) -> JobArgument {
        let argument = JobArgument::for_tag(rule.tag);
        self.tags.tags.lock().insert(rule.tag);
        self.jobs.register(argument.clone());
        self.rules.rules.lock().insert(rule.tag, rule);
        argument
    }

    /// A file owned by `user` at `path`, tagged with `tag`, reachable through one mount
    pub fn add_tagged_file(&self, tag: TagId, id: u64, user: &str, path: &str, mtime: i64) {
        self.files.add_file(user, path, id, 0, mtime);
        self.mounts.add(id, id, user);
        self.mapper.tag(tag, [id]);
    }
}
