//! Snapshot builder
//!
//! Converts a point-in-time copy of the event store into the gauge
//! observations served on a scrape. Nothing is carried over between reads:
//! entities that left the store simply stop producing observations.

use crate::events::{parse_timestamp, EntityKey, EventRecord, JobEvent, PipelineEvent, Status};
use chrono::{DateTime, Utc};

/// Gauges materialized from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gauge {
    PipelineStatus,
    PipelineDuration,
    JobStatus,
    JobDuration,
}

impl Gauge {
    pub const ALL: [Gauge; 4] = [
        Gauge::PipelineStatus,
        Gauge::PipelineDuration,
        Gauge::JobStatus,
        Gauge::JobDuration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::PipelineStatus => "gitlab_pipeline_status",
            Self::PipelineDuration => "gitlab_pipeline_duration_milliseconds",
            Self::JobStatus => "gitlab_job_status",
            Self::JobDuration => "gitlab_job_duration_milliseconds",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Self::PipelineStatus => {
                "Pipeline status (0=running, 1=pending, 2=success, 3=failed, 4=canceled, 5=skipped)"
            }
            Self::PipelineDuration => "Milliseconds since the pipeline was created",
            Self::JobStatus => {
                "Job status (0=running, 1=pending, 2=success, 3=failed, 4=canceled, 5=skipped)"
            }
            Self::JobDuration => "Milliseconds since the job started",
        }
    }
}

/// One labeled gauge sample
///
/// `value` is `None` when it cannot be derived (unknown status, job not yet
/// started). Such samples are kept in the set but omitted when rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub gauge: Gauge,
    pub labels: Vec<(&'static str, String)>,
    pub value: Option<f64>,
}

impl Observation {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Numeric code for a status string; unknown statuses have no code
pub fn status_to_code(status: &str) -> Option<u8> {
    status.parse::<Status>().ok().map(Status::code)
}

/// Build the full observation set for one read
///
/// Entities that share a label set (two pipelines on the same project and ref)
/// produce identical series; the renderer keeps the one with the highest key.
pub fn build_observations(
    entries: &[(EntityKey, EventRecord)],
    now: DateTime<Utc>,
) -> Vec<Observation> {
    let mut observations = Vec::with_capacity(entries.len() * 2);

    for (key, record) in entries {
        let built = match record {
            EventRecord::Pipeline(pipeline) => pipeline_observations(pipeline, now),
            EventRecord::Job(job) => job_observations(job, now),
        };

        match built {
            Some([status, duration]) => {
                observations.push(status);
                observations.push(duration);
            }
            None => {
                tracing::debug!(key = %key, "Skipping entry that could not be classified");
            }
        }
    }

    observations
}

fn pipeline_observations(
    pipeline: &PipelineEvent,
    now: DateTime<Utc>,
) -> Option<[Observation; 2]> {
    let attrs = &pipeline.object_attributes;
    let created_at = parse_timestamp(attrs.created_at.as_deref()?)?;

    let labels = vec![
        ("project_path", pipeline.project_path().to_string()),
        ("ref", attrs.git_ref.clone()),
    ];

    Some([
        Observation {
            gauge: Gauge::PipelineStatus,
            labels: labels.clone(),
            value: status_to_code(&attrs.status).map(f64::from),
        },
        Observation {
            gauge: Gauge::PipelineDuration,
            labels,
            value: Some(elapsed_millis(created_at, now)),
        },
    ])
}

fn job_observations(job: &JobEvent, now: DateTime<Utc>) -> Option<[Observation; 2]> {
    let project_path = job.project_path()?;

    // Pending jobs have no start time yet
    let started_at = match job.build_started_at.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(parse_timestamp(raw)?),
        _ => None,
    };

    let labels = vec![
        ("project_path", project_path.to_string()),
        ("ref", job.git_ref.clone()),
        ("job_name", job.build_name.clone()),
        ("runner", job.runner_label().to_string()),
    ];

    Some([
        Observation {
            gauge: Gauge::JobStatus,
            labels: labels.clone(),
            value: status_to_code(&job.build_status).map(f64::from),
        },
        Observation {
            gauge: Gauge::JobDuration,
            labels,
            value: started_at.map(|started| elapsed_millis(started, now)),
        },
    ])
}

// Signed; clock skew may make this negative.
fn elapsed_millis(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - since).num_milliseconds() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PipelineAttributes, ProjectInfo, RunnerInfo};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 30).unwrap()
    }

    fn pipeline(status: &str, created_at: Option<&str>) -> EventRecord {
        EventRecord::Pipeline(PipelineEvent {
            object_attributes: PipelineAttributes {
                id: 1,
                git_ref: "main".to_string(),
                status: status.to_string(),
                created_at: created_at.map(str::to_string),
                finished_at: None,
                source: Some("push".to_string()),
                sha: None,
                duration: None,
            },
            project: ProjectInfo {
                path_with_namespace: "group/app".to_string(),
            },
        })
    }

    fn job(status: &str, started_at: Option<&str>, runner: Option<&str>) -> EventRecord {
        EventRecord::Job(JobEvent {
            build_id: 42,
            git_ref: "feature".to_string(),
            build_name: "rspec".to_string(),
            build_status: status.to_string(),
            build_stage: Some("test".to_string()),
            build_started_at: started_at.map(str::to_string),
            build_finished_at: None,
            pipeline_id: Some(1),
            project_name: None,
            project: Some(ProjectInfo {
                path_with_namespace: "group/app".to_string(),
            }),
            runner: runner.map(|d| RunnerInfo {
                id: Some(1),
                description: Some(d.to_string()),
            }),
        })
    }

    #[test]
    fn test_status_to_code_exact() {
        assert_eq!(status_to_code("running"), Some(0));
        assert_eq!(status_to_code("pending"), Some(1));
        assert_eq!(status_to_code("success"), Some(2));
        assert_eq!(status_to_code("failed"), Some(3));
        assert_eq!(status_to_code("canceled"), Some(4));
        assert_eq!(status_to_code("skipped"), Some(5));
        assert_eq!(status_to_code("created"), None);
        assert_eq!(status_to_code("RUNNING"), None);
    }

    #[test]
    fn test_pipeline_observations() {
        let entries = vec![(
            EntityKey::pipeline(1),
            pipeline("failed", Some("2024-05-01T10:00:00Z")),
        )];

        let observations = build_observations(&entries, now());
        assert_eq!(observations.len(), 2);

        let status = &observations[0];
        assert_eq!(status.gauge, Gauge::PipelineStatus);
        assert_eq!(status.value, Some(3.0));
        assert_eq!(
            status.labels,
            vec![("project_path", "group/app".to_string()), ("ref", "main".to_string())]
        );

        let duration = &observations[1];
        assert_eq!(duration.gauge, Gauge::PipelineDuration);
        assert_eq!(duration.value, Some(30_000.0));
        assert_eq!(duration.labels, status.labels);
    }

    #[test]
    fn test_job_observations_default_runner() {
        let entries = vec![(
            EntityKey::job(42),
            job("running", Some("2024-05-01T10:00:30Z"), None),
        )];

        let observations = build_observations(&entries, now());
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].gauge, Gauge::JobStatus);
        assert_eq!(observations[0].value, Some(0.0));
        assert_eq!(observations[0].label("runner"), Some("unknown"));
        assert_eq!(observations[0].label("job_name"), Some("rspec"));
        assert_eq!(observations[0].label("ref"), Some("feature"));
        assert_eq!(observations[1].gauge, Gauge::JobDuration);
        assert_eq!(observations[1].value, Some(0.0));
    }

    #[test]
    fn test_job_runner_description_label() {
        let entries = vec![(
            EntityKey::job(42),
            job("pending", Some("2024-05-01T10:00:00Z"), Some("shared-runner-3")),
        )];

        let observations = build_observations(&entries, now());
        assert_eq!(observations[0].label("runner"), Some("shared-runner-3"));
        assert_eq!(observations[0].value, Some(1.0));
    }

    #[test]
    fn test_negative_duration_is_not_clamped() {
        let future = (now() + Duration::seconds(5)).to_rfc3339();
        let entries = vec![(EntityKey::pipeline(1), pipeline("running", Some(&future)))];

        let observations = build_observations(&entries, now());
        assert_eq!(observations[1].value, Some(-5_000.0));
    }

    #[test]
    fn test_unknown_status_yields_missing_value() {
        let entries = vec![(
            EntityKey::pipeline(1),
            pipeline("waiting_for_resource", Some("2024-05-01T10:00:00Z")),
        )];

        let observations = build_observations(&entries, now());
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].value, None);
        assert_eq!(observations[1].value, Some(30_000.0));
    }

    #[test]
    fn test_unstarted_job_has_no_duration() {
        let entries = vec![(EntityKey::job(42), job("pending", None, None))];

        let observations = build_observations(&entries, now());
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].value, Some(1.0));
        assert_eq!(observations[1].value, None);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let mut orphan = job("running", Some("2024-05-01T10:00:00Z"), None);
        if let EventRecord::Job(j) = &mut orphan {
            j.project = None;
        }

        let entries = vec![
            (EntityKey::pipeline(1), pipeline("running", None)),
            (EntityKey::pipeline(2), pipeline("running", Some("not a date"))),
            (EntityKey::job(3), orphan),
            (EntityKey::job(4), job("running", Some("garbage"), None)),
            (EntityKey::job(42), job("running", Some("2024-05-01T10:00:00Z"), None)),
        ];

        let observations = build_observations(&entries, now());
        assert_eq!(observations.len(), 2);
        assert!(observations.iter().all(|o| o.label("job_name") == Some("rspec")));
    }

    #[test]
    fn test_empty_store_yields_no_observations() {
        assert!(build_observations(&[], now()).is_empty());
    }
}
