//! Retention rules and the file entries they are evaluated against

use crate::error::RuleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Identifier of a system tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub u64);

impl FromStr for TagId {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RuleError::MalformedTag(s.to_string()));
        }
        trimmed
            .parse()
            .map(TagId)
            .map_err(|_| RuleError::MalformedTag(s.to_string()))
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable file identifier, independent of the file's path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a storage mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountId(pub u64);

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User whose namespace a file or mount belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of object a tag is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Files,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Files => "files",
        }
    }
}

/// Unit of a retention window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    /// Persisted integer code
    pub fn code(&self) -> i64 {
        match self {
            Self::Day => 0,
            Self::Week => 1,
            Self::Month => 2,
            Self::Year => 3,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, RuleError> {
        match code {
            0 => Ok(Self::Day),
            1 => Ok(Self::Week),
            2 => Ok(Self::Month),
            3 => Ok(Self::Year),
            other => Err(RuleError::UnknownTimeUnit(other)),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "d" | "day" | "days" => Ok(Self::Day),
            "w" | "week" | "weeks" => Ok(Self::Week),
            "m" | "month" | "months" => Ok(Self::Month),
            "y" | "year" | "years" => Ok(Self::Year),
            other => Err(format!(
                "unknown time unit '{}' (expected day, week, month or year)",
                other
            )),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        };
        f.write_str(s)
    }
}

/// Which timestamp governs the age of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBasis {
    /// Upload/creation time, falling back to mtime when not recorded
    #[default]
    CreationTime,
    /// Modification time, or creation time when that is newer
    ModificationTime,
}

impl TimeBasis {
    pub fn code(&self) -> i64 {
        match self {
            Self::CreationTime => 0,
            Self::ModificationTime => 1,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, RuleError> {
        match code {
            0 => Ok(Self::CreationTime),
            1 => Ok(Self::ModificationTime),
            other => Err(RuleError::UnknownTimeBasis(other)),
        }
    }
}

/// Persisted disposition action selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    #[default]
    Delete,
    MoveToTrash,
    MoveToPath,
}

impl ActionType {
    pub fn code(&self) -> i64 {
        match self {
            Self::Delete => 0,
            Self::MoveToTrash => 1,
            Self::MoveToPath => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, RuleError> {
        match code {
            0 => Ok(Self::Delete),
            1 => Ok(Self::MoveToTrash),
            2 => Ok(Self::MoveToPath),
            other => Err(RuleError::UnknownActionType(other)),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Delete => "delete",
            Self::MoveToTrash => "move to trash",
            Self::MoveToPath => "move to path",
        };
        f.write_str(s)
    }
}

/// A disposition action with everything needed to carry it out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Delete,
    MoveToTrash,
    /// Destination relative to the owner's root, as configured
    MoveToPath(String),
}

/// Retention rule for one tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionRule {
    pub tag: TagId,
    pub time_unit: TimeUnit,
    pub time_amount: NonZeroU32,
    #[serde(default)]
    pub time_basis: TimeBasis,
    #[serde(default)]
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_to_path: Option<String>,
}

impl RetentionRule {
    /// Action to carry out, or `None` for a move-to-path rule without a destination
    pub fn action(&self) -> Option<Action> {
        match self.action_type {
            ActionType::Delete => Some(Action::Delete),
            ActionType::MoveToTrash => Some(Action::MoveToTrash),
            ActionType::MoveToPath => self.move_to_path.clone().map(Action::MoveToPath),
        }
    }

    /// Strict validation applied to newly written rules
    ///
    /// Stored rows are read leniently (see [`RuleRow`]); this check is what a
    /// rule must pass before it is accepted.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.action_type != ActionType::MoveToPath {
            return Ok(());
        }

        let path = match self.move_to_path.as_deref() {
            Some(p) if !p.trim_matches('/').trim().is_empty() => p,
            _ => return Err(RuleError::MissingDestination),
        };

        if path.split('/').any(|seg| seg == "." || seg == "..") {
            return Err(RuleError::InvalidDestination(path.to_string()));
        }

        Ok(())
    }
}

/// Raw retention row as stored by the rule backend
///
/// Integer codes match the persisted schema. `action_type` may be missing on
/// rows written before move actions existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRow {
    #[serde(default)]
    pub id: Option<u64>,
    pub tag_id: u64,
    pub time_unit: i64,
    pub time_amount: i64,
    pub time_after: i64,
    #[serde(default)]
    pub action_type: Option<i64>,
    #[serde(default)]
    pub move_to_path: Option<String>,
}

impl TryFrom<RuleRow> for RetentionRule {
    type Error = RuleError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        let time_amount = u32::try_from(row.time_amount)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(RuleError::InvalidAmount(row.time_amount))?;

        let action_type = match row.action_type {
            Some(code) => ActionType::from_code(code)?,
            None => ActionType::Delete,
        };

        // Only move-to-path rules carry a destination
        let move_to_path = match action_type {
            ActionType::MoveToPath => row.move_to_path,
            _ => None,
        };

        Ok(Self {
            tag: TagId(row.tag_id),
            time_unit: TimeUnit::from_code(row.time_unit)?,
            time_amount,
            time_basis: TimeBasis::from_code(row.time_after)?,
            action_type,
            move_to_path,
        })
    }
}

/// Permission bitset of a file entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Permissions(pub u8);

impl Permissions {
    pub const READ: u8 = 0b0000_0001;
    pub const UPDATE: u8 = 0b0000_0010;
    pub const CREATE: u8 = 0b0000_0100;
    pub const DELETE: u8 = 0b0000_1000;
    pub const SHARE: u8 = 0b0001_0000;
    pub const ALL: Permissions = Permissions(0b0001_1111);

    pub fn contains(&self, bits: u8) -> bool {
        (self.0 & bits) == bits
    }

    /// Entry can be deleted or moved away by the retention job
    pub fn is_deletable(&self) -> bool {
        self.contains(Self::DELETE)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Path inside one user's namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub owner: OwnerId,
    /// Relative to the owner's root; empty for the root itself
    pub path: PathBuf,
}

impl Location {
    pub fn new(owner: OwnerId, path: impl Into<PathBuf>) -> Self {
        Self {
            owner,
            path: path.into(),
        }
    }

    pub fn root(owner: OwnerId) -> Self {
        Self::new(owner, PathBuf::new())
    }

    pub fn join(&self, name: impl AsRef<Path>) -> Self {
        Self::new(self.owner.clone(), self.path.join(name))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/files/{}", self.owner, self.path.display())
    }
}

/// Whether an entry is a file or a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Container,
}

/// A file entry as seen through one user's namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: ObjectId,
    /// Owner of the underlying file (may differ from `location.owner` for shares)
    pub owner: OwnerId,
    /// Where the entry was found
    pub location: Location,
    pub kind: EntryKind,
    /// Upload time in unix seconds; 0 when the backend does not record it
    pub created_at: i64,
    /// Modification time in unix seconds
    pub modified_at: i64,
    pub permissions: Permissions,
}

impl Entry {
    /// Final path component
    pub fn name(&self) -> Option<&str> {
        self.location.path.file_name().and_then(|n| n.to_str())
    }
}

/// A mount that references a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    /// Missing for mounts the backend never assigned an id to
    pub mount_id: Option<MountId>,
    /// User the mount belongs to
    pub user: OwnerId,
}

impl MountInfo {
    /// Mount id for log output
    pub fn display_id(&self) -> String {
        self.mount_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "null".to_string())
    }
}

/// Notification subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    /// File will be disposed of on the next run
    #[serde(rename = "deleteTomorrow")]
    DeleteTomorrow,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeleteTomorrow => "deleteTomorrow",
        }
    }
}

/// Notification request handed to the notification sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub app: String,
    pub user: OwnerId,
    pub object_type: String,
    pub object_id: String,
    pub subject: Subject,
    pub parameters: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Argument a retention job is registered with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobArgument {
    /// Raw tag identifier; may be malformed
    pub tag: String,
}

impl JobArgument {
    pub fn for_tag(tag: TagId) -> Self {
        Self {
            tag: tag.to_string(),
        }
    }
}

/// A registered job instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub job: String,
    pub argument: JobArgument,
}

impl JobKey {
    pub const RETENTION_JOB: &'static str = "retention";

    pub fn retention(argument: JobArgument) -> Self {
        Self {
            job: Self::RETENTION_JOB.to_string(),
            argument,
        }
    }
}
