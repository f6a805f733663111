//! Replication vocabulary shared by the outbox, the watermark store and the
//! synchronizers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of replicated entity.
///
/// The outbox records the singular kind (`road_issue`); the cloud stores each
/// kind in its own collection (`road_issues`). Both spellings parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    RoadIssue,
    UserBlocked,
}

impl EntityKind {
    pub const ALL: [Self; 2] = [Self::RoadIssue, Self::UserBlocked];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoadIssue => "road_issue",
            Self::UserBlocked => "user_blocked",
        }
    }

    /// Cloud collection holding documents of this kind.
    pub fn collection(self) -> &'static str {
        match self {
            Self::RoadIssue => "road_issues",
            Self::UserBlocked => "blocked_users",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown entity kind: {0:?}")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.collection() == s)
            .ok_or_else(|| UnknownEntityKind(s.to_owned()))
    }
}

impl Serialize for EntityKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What an outbox entry asks the cloud to do with its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncAction {
    /// First publication of a locally created entity.
    Push,
    /// Re-publication after a local change.
    Update,
}

impl SyncAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "PUSH",
            Self::Update => "UPDATE",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown sync action: {0:?}")]
pub struct UnknownSyncAction(pub String);

impl FromStr for SyncAction {
    type Err = UnknownSyncAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUSH" => Ok(Self::Push),
            "UPDATE" => Ok(Self::Update),
            other => Err(UnknownSyncAction(other.to_owned())),
        }
    }
}

/// Delivery state of an outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Pending,
    Success,
    Failed,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }

    /// Whether the push synchronizer should (re)deliver an entry in this state.
    pub fn is_deliverable(self) -> bool {
        matches!(self, Self::Pending | Self::Failed)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown sync status: {0:?}")]
pub struct UnknownSyncStatus(pub String);

impl FromStr for SyncStatus {
    type Err = UnknownSyncStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            _ => Err(UnknownSyncStatus(s.to_owned())),
        }
    }
}
