//! GitLab webhook event model
//!
//! Pipeline and job hooks are deserialized into an explicit tagged union keyed
//! on `object_kind`. Anything else lands in [`WebhookEvent::Unknown`] and is
//! skipped by the ingest path.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Runner label used when a job event carries no runner description
pub const UNKNOWN_RUNNER: &str = "unknown";

// ============================================================
// Envelope
// ============================================================

/// Incoming webhook body, discriminated by GitLab's `object_kind` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "object_kind", rename_all = "snake_case")]
pub enum WebhookEvent {
    Pipeline(PipelineEvent),
    #[serde(rename = "build", alias = "job")]
    Job(JobEvent),
    #[serde(other)]
    Unknown,
}

impl WebhookEvent {
    /// Kind name used in logs and metric labels
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Pipeline(_) => "pipeline",
            Self::Job(_) => "job",
            Self::Unknown => "unknown",
        }
    }
}

/// Last received state of a tracked entity, retained verbatim in the store
#[derive(Debug, Clone, PartialEq)]
pub enum EventRecord {
    Pipeline(PipelineEvent),
    Job(JobEvent),
}

impl EventRecord {
    pub fn key(&self) -> EntityKey {
        match self {
            Self::Pipeline(p) => p.key(),
            Self::Job(j) => j.key(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Pipeline(p) => p.is_terminal(),
            Self::Job(j) => j.is_terminal(),
        }
    }
}

// ============================================================
// Keys
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Pipeline,
    Job,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipeline => "pipeline",
            Self::Job => "job",
        }
    }
}

/// Store key, namespaced by kind so pipeline and job ids never collide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: u64,
}

impl EntityKey {
    pub fn pipeline(id: u64) -> Self {
        Self {
            kind: EntityKind::Pipeline,
            id,
        }
    }

    pub fn job(id: u64) -> Self {
        Self {
            kind: EntityKind::Job,
            id,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

// ============================================================
// Pipeline hook
// ============================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineEvent {
    pub object_attributes: PipelineAttributes,
    pub project: ProjectInfo,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineAttributes {
    pub id: u64,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl PipelineEvent {
    pub fn key(&self) -> EntityKey {
        EntityKey::pipeline(self.object_attributes.id)
    }

    pub fn is_terminal(&self) -> bool {
        is_present(&self.object_attributes.finished_at)
    }

    pub fn project_path(&self) -> &str {
        &self.project.path_with_namespace
    }
}

// ============================================================
// Job hook
// ============================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobEvent {
    pub build_id: u64,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub build_name: String,
    pub build_status: String,
    #[serde(default)]
    pub build_stage: Option<String>,
    #[serde(default)]
    pub build_started_at: Option<String>,
    #[serde(default)]
    pub build_finished_at: Option<String>,
    #[serde(default)]
    pub pipeline_id: Option<u64>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectInfo>,
    #[serde(default)]
    pub runner: Option<RunnerInfo>,
}

impl JobEvent {
    pub fn key(&self) -> EntityKey {
        EntityKey::job(self.build_id)
    }

    pub fn is_terminal(&self) -> bool {
        is_present(&self.build_finished_at)
    }

    /// Project path, preferring the structured project over the legacy name
    pub fn project_path(&self) -> Option<&str> {
        self.project
            .as_ref()
            .map(|p| p.path_with_namespace.as_str())
            .or(self.project_name.as_deref())
            .filter(|p| !p.is_empty())
    }

    pub fn runner_label(&self) -> &str {
        self.runner
            .as_ref()
            .and_then(|r| r.description.as_deref())
            .filter(|d| !d.is_empty())
            .unwrap_or(UNKNOWN_RUNNER)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectInfo {
    pub path_with_namespace: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunnerInfo {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

// ============================================================
// Status
// ============================================================

/// Lifecycle status shared by pipelines and jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Pending,
    Success,
    Failed,
    Canceled,
    Skipped,
}

impl Status {
    /// Gauge value reported for this status
    pub fn code(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Pending => 1,
            Self::Success => 2,
            Self::Failed => 3,
            Self::Canceled => 4,
            Self::Skipped => 5,
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "canceled" => Ok(Self::Canceled),
            "skipped" => Ok(Self::Skipped),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

// ============================================================
// Timestamps
// ============================================================

/// Parse a GitLab webhook timestamp
///
/// Accepts RFC 3339 (`2024-01-01T10:00:00.000Z`), the legacy
/// `2024-01-01 10:00:00 UTC` form, and `2024-01-01 10:00:00 +0200`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    if let Some(naive) = raw.strip_suffix(" UTC") {
        if let Ok(ts) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S") {
            return Some(ts.and_utc());
        }
    }

    DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
