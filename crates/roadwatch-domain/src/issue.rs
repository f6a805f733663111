//! Road issue domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::code::normalize;

/// Lifecycle status of a road issue.
///
/// Wire and storage format is the canonical upper-case code
/// (`EN_ATTENTE`, `NOUVEAU`, `EN_COURS`, `RESOLU`, `ANNULE`). Parsing is
/// case-insensitive and also accepts the legacy accented spellings
/// (`TERMINÉ`, `ANNULÉ`) and the English names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IssueStatus {
    #[default]
    Pending,
    New,
    InProgress,
    Resolved,
    Cancelled,
}

impl IssueStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::New,
        Self::InProgress,
        Self::Resolved,
        Self::Cancelled,
    ];

    /// Canonical encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "EN_ATTENTE",
            Self::New => "NOUVEAU",
            Self::InProgress => "EN_COURS",
            Self::Resolved => "RESOLU",
            Self::Cancelled => "ANNULE",
        }
    }

    /// Position in the lifecycle. `Resolved` and `Cancelled` share the terminal rank.
    pub fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::New => 1,
            Self::InProgress => 2,
            Self::Resolved | Self::Cancelled => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Cancelled)
    }

    /// Whether a manager may move an issue from `self` to `target`.
    ///
    /// Re-applying the current status is always allowed. Otherwise the status
    /// only moves forward, and a terminal status is final.
    pub fn can_transition_to(self, target: Self) -> bool {
        if self == target {
            return true;
        }
        !self.is_terminal() && target.rank() >= self.rank()
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string cannot be parsed as an [`IssueStatus`].
#[derive(Debug, Error)]
#[error("unknown issue status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for IssueStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "EN_ATTENTE" | "PENDING" => Ok(Self::Pending),
            "NOUVEAU" | "NEW" => Ok(Self::New),
            "EN_COURS" | "IN_PROGRESS" => Ok(Self::InProgress),
            "RESOLU" | "TERMINE" | "RESOLVED" => Ok(Self::Resolved),
            "ANNULE" | "CANCELLED" | "CANCELED" => Ok(Self::Cancelled),
            _ => Err(UnknownStatus(s.to_owned())),
        }
    }
}

impl Serialize for IssueStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IssueStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Danger level of a road issue. Defaults to `Medium` when not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DangerLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl DangerLevel {
    /// Canonical encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "FAIBLE",
            Self::Medium => "MOYEN",
            Self::High => "ELEVE",
        }
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string cannot be parsed as a [`DangerLevel`].
#[derive(Debug, Error)]
#[error("unknown danger level: {0:?}")]
pub struct UnknownDangerLevel(pub String);

impl FromStr for DangerLevel {
    type Err = UnknownDangerLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "FAIBLE" | "LOW" => Ok(Self::Low),
            "MOYEN" | "MEDIUM" => Ok(Self::Medium),
            "ELEVE" | "HIGH" => Ok(Self::High),
            _ => Err(UnknownDangerLevel(s.to_owned())),
        }
    }
}

impl Serialize for DangerLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DangerLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
