use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use roadwatch_core::serde::{to_rfc3339_ms, to_rfc3339_ms_opt};
use roadwatch_domain::id::{IssueId, OutboxEntryId, UserId};
use roadwatch_domain::issue::{DangerLevel, IssueStatus};
use roadwatch_domain::sync::{EntityKind, SyncAction, SyncStatus};

use crate::error::SyncServiceError;

/// Reason recorded when a block request does not carry one.
pub const DEFAULT_BLOCK_REASON: &str = "too many failed sign-in attempts";

/// Road issue as stored locally and published to the cloud.
///
/// The serialized form is both the HTTP representation and the outbox
/// snapshot, so field names follow the established wire names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadIssue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "niveau_danger")]
    pub danger_level: DangerLevel,
    pub status: IssueStatus,
    pub surface: f64,
    pub budget: f64,
    pub user_id: Option<String>,
    /// Reporter display name; only known when the reporter exists locally.
    pub user_name: Option<String>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms_opt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "to_rfc3339_ms_opt")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl RoadIssue {
    /// Move to `target`, stamping `started_at`/`resolved_at` the first time
    /// the issue enters `EN_COURS`/`RESOLU`. Stamps are never overwritten.
    pub fn apply_status(&mut self, target: IssueStatus, now: DateTime<Utc>) {
        if target == IssueStatus::InProgress && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if target == IssueStatus::Resolved && self.resolved_at.is_none() {
            self.resolved_at = Some(now);
        }
        self.status = target;
        self.updated_at = now;
    }

    /// Apply a manager-requested status change, rejecting backward moves
    /// and moves out of a terminal status.
    pub fn transition(
        &mut self,
        target: IssueStatus,
        now: DateTime<Utc>,
    ) -> Result<(), SyncServiceError> {
        if !self.status.can_transition_to(target) {
            return Err(SyncServiceError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        self.apply_status(target, now);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Value, SyncServiceError> {
        serde_json::to_value(self)
            .map_err(|e| SyncServiceError::Internal(anyhow::Error::new(e).context("snapshot issue")))
    }
}

/// Validated fields of a new issue.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub danger_level: DangerLevel,
    pub surface: f64,
    pub budget: f64,
    pub user_id: Option<String>,
}

/// Outbox entry describing one local mutation to replicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboxEntry {
    pub id: OutboxEntryId,
    pub entity: EntityKind,
    pub entity_id: String,
    pub action: SyncAction,
    #[serde(rename = "data")]
    pub payload: Value,
    pub status: SyncStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms_opt")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl OutboxEntry {
    /// Fresh `PENDING` entry, ready to be enqueued next to its mutation.
    pub fn pending(
        entity: EntityKind,
        entity_id: impl Into<String>,
        action: SyncAction,
        payload: Value,
    ) -> Self {
        Self {
            id: OutboxEntryId::generate(),
            entity,
            entity_id: entity_id.into(),
            action,
            payload,
            status: SyncStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            synced_at: None,
        }
    }
}

/// Result of one delivery attempt, recorded by `mark_result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Success,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn status(&self) -> SyncStatus {
        match self {
            Self::Success => SyncStatus::Success,
            Self::Failed(_) => SyncStatus::Failed,
        }
    }
}

/// Counts reported by a push or pull cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl SyncSummary {
    /// Fold a later retry round into a drain total. `failed` tracks the
    /// latest round only, since earlier failures were retried.
    pub fn absorb(&mut self, round: SyncSummary) {
        self.processed += round.processed;
        self.succeeded += round.succeeded;
        self.failed = round.failed;
    }
}

impl AddAssign for SyncSummary {
    fn add_assign(&mut self, other: SyncSummary) {
        self.processed += other.processed;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

/// Document read back from the cloud store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub id: String,
    pub data: Value,
    /// Server-assigned `synced_at`, epoch milliseconds.
    pub synced_at_ms: i64,
}

/// Remote issue fields accepted by a pull.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteIssue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub danger_level: DangerLevel,
    pub status: IssueStatus,
    pub surface: f64,
    pub budget: f64,
    pub user_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl RemoteIssue {
    /// Validate a cloud document. Missing danger/status/surface/budget take
    /// their defaults; anything present must parse.
    pub fn from_document(id: &str, data: &Value) -> Result<Self, SyncServiceError> {
        if id.trim().is_empty() {
            return Err(SyncServiceError::validation("document id must not be empty"));
        }
        let data = data
            .as_object()
            .ok_or_else(|| SyncServiceError::validation("document data must be an object"))?;

        let title = match data.get("title") {
            Some(Value::String(title)) if !title.trim().is_empty() => title.clone(),
            _ => return Err(SyncServiceError::validation("title must not be empty")),
        };
        let description = match data.get("description") {
            Some(Value::String(description)) => description.clone(),
            _ => String::new(),
        };
        let latitude = number(data.get("latitude"), "latitude")?
            .ok_or_else(|| SyncServiceError::validation("latitude is required"))?;
        let longitude = number(data.get("longitude"), "longitude")?
            .ok_or_else(|| SyncServiceError::validation("longitude is required"))?;
        validate_coordinates(latitude, longitude)?;

        let danger_level = match text(data.get("niveau_danger")) {
            Some(raw) => raw
                .parse::<DangerLevel>()
                .map_err(SyncServiceError::validation)?,
            None => DangerLevel::default(),
        };
        let status = match text(data.get("status")) {
            Some(raw) => raw
                .parse::<IssueStatus>()
                .map_err(SyncServiceError::validation)?,
            None => IssueStatus::default(),
        };
        let surface = number(data.get("surface"), "surface")?.unwrap_or(0.0);
        let budget = number(data.get("budget"), "budget")?.unwrap_or(0.0);
        validate_amounts(surface, budget)?;

        Ok(Self {
            id: IssueId::from(id),
            title,
            description,
            latitude,
            longitude,
            danger_level,
            status,
            surface,
            budget,
            user_id: text(data.get("user_id")).map(str::to_owned),
            started_at: data.get("started_at").and_then(timestamp),
            resolved_at: data.get("resolved_at").and_then(timestamp),
        })
    }

    /// Lifecycle stamps after applying this document over a row holding
    /// `local` stamps. A stamp already set locally is kept. Otherwise the
    /// remote one is taken, or `now` when the remote status is the one the
    /// stamp marks.
    pub fn lifecycle_stamps(
        &self,
        local: (Option<DateTime<Utc>>, Option<DateTime<Utc>>),
        now: DateTime<Utc>,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let stamp = |kept: Option<DateTime<Utc>>, remote: Option<DateTime<Utc>>, marks: IssueStatus| {
            kept.or(remote)
                .or_else(|| (self.status == marks).then_some(now))
        };
        (
            stamp(local.0, self.started_at, IssueStatus::InProgress),
            stamp(local.1, self.resolved_at, IssueStatus::Resolved),
        )
    }
}

/// Local account with its block state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithStatus {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role_id: i16,
    pub is_blocked: bool,
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), SyncServiceError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(SyncServiceError::validation(format!(
            "latitude {latitude} is outside [-90, 90]"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(SyncServiceError::validation(format!(
            "longitude {longitude} is outside [-180, 180]"
        )));
    }
    Ok(())
}

pub fn validate_amounts(surface: f64, budget: f64) -> Result<(), SyncServiceError> {
    if surface.is_nan() || surface < 0.0 {
        return Err(SyncServiceError::validation("surface must be >= 0"));
    }
    if budget.is_nan() || budget < 0.0 {
        return Err(SyncServiceError::validation("budget must be >= 0"));
    }
    Ok(())
}

/// Milliseconds since the epoch for a remote `synced_at` value.
///
/// Accepts a `{seconds, nanoseconds}` timestamp object (also the `_seconds`
/// and `nanos` spellings), RFC 3339 text, or a bare millisecond count.
pub fn synced_at_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(integer)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .or_else(|| map.get("nanos"))
                .and_then(integer)
                .unwrap_or(0);
            seconds.checked_mul(1000)?.checked_add(nanos / 1_000_000)
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.timestamp_millis())
            .or_else(|| s.trim().parse().ok()),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

/// A lifecycle stamp in any of the `synced_at` encodings. Unreadable stamps
/// are dropped rather than failing the document.
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    synced_at_millis(value).and_then(DateTime::from_timestamp_millis)
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
        _ => None,
    }
}

fn number(value: Option<&Value>, field: &str) -> Result<Option<f64>, SyncServiceError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SyncServiceError::validation(format!("{field} must be a number"))),
        Some(_) => Err(SyncServiceError::validation(format!(
            "{field} must be a number"
        ))),
    }
}
