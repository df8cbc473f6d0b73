//! Remote pipeline data: runs, jobs, steps, and locally discovered workflow definitions.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Format a duration in seconds into a human-readable string (e.g. "2m 5s").
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Unicode-width-aware truncation with ellipsis.
/// Returns `""` when `max_width` is 0.
pub fn truncate(s: &str, max_width: usize) -> String {
    use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            break;
        }
        out.push(c);
        width += cw;
    }
    out.push('\u{2026}');
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    InProgress,
    Queued,
    Requested,
    Waiting,
    Pending,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::InProgress => "in_progress",
            Self::Queued => "queued",
            Self::Requested => "requested",
            Self::Waiting => "waiting",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    StartupFailure,
    Stale,
    Neutral,
    #[serde(other)]
    Unknown,
}

impl Conclusion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
            Self::TimedOut => "timed_out",
            Self::ActionRequired => "action_required",
            Self::StartupFailure => "startup_failure",
            Self::Stale => "stale",
            Self::Neutral => "neutral",
            Self::Unknown => "unknown",
        }
    }
}

/// Single-glyph status marker shared by runs, jobs and steps.
pub fn status_icon(status: RunStatus, conclusion: Option<Conclusion>) -> &'static str {
    match (status, conclusion) {
        (RunStatus::Completed, Some(Conclusion::Success)) => "✓",
        (RunStatus::Completed, Some(Conclusion::Failure | Conclusion::TimedOut | Conclusion::StartupFailure)) => "✗",
        (RunStatus::Completed, Some(Conclusion::Cancelled)) => "⊘",
        (RunStatus::Completed, Some(Conclusion::Skipped)) => "⊖",
        (RunStatus::InProgress, _) => "●",
        (RunStatus::Queued | RunStatus::Requested, _) => "◷",
        (RunStatus::Pending, _) => "○",
        (RunStatus::Waiting, _) => "⚇",
        _ => "?",
    }
}

/// Owning repository, flattened to the identifying fields a run needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
}

impl Repository {
    pub fn web_url(&self) -> String {
        if self.html_url.is_empty() {
            format!("https://github.com/{}", self.full_name)
        } else {
            self.html_url.clone()
        }
    }
}

/// One execution of a workflow, as returned by `GET /repos/{repo}/actions/runs`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Run {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_title: String,
    #[serde(default)]
    pub head_branch: String,
    #[serde(default)]
    pub head_sha: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub workflow_id: u64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub run_number: u64,
    #[serde(default = "first_attempt")]
    pub run_attempt: u64,
    #[serde(default)]
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub run_started_at: Option<DateTime<Utc>>,
    pub repository: Repository,
}

fn first_attempt() -> u64 {
    1
}

impl Run {
    /// Conclusion for finished runs, status otherwise.
    pub fn status_label(&self) -> &'static str {
        match (self.status, self.conclusion) {
            (RunStatus::Completed, Some(c)) => c.as_str(),
            (status, _) => status.as_str(),
        }
    }

    pub fn icon(&self) -> &'static str {
        status_icon(self.status, self.conclusion)
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self.status, RunStatus::InProgress | RunStatus::Queued)
    }

    /// Basename of the workflow file (`.github/workflows/ci.yml` -> `ci.yml`).
    pub fn workflow_file(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    pub fn repo(&self) -> &str {
        &self.repository.full_name
    }

    /// Wall-clock duration: up to the last update when finished, up to `now` while running.
    pub fn duration_secs(&self, now: DateTime<Utc>) -> i64 {
        let start = self.run_started_at.unwrap_or(self.created_at);
        let end = if self.status == RunStatus::Completed {
            self.updated_at
        } else {
            now
        };
        end.signed_duration_since(start).num_seconds().max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    pub name: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub number: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Job {
    pub id: u64,
    #[serde(default)]
    pub run_id: u64,
    pub name: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Job {
    pub fn icon(&self) -> &'static str {
        status_icon(self.status, self.conclusion)
    }

    pub fn duration_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        let start = self.started_at?;
        let end = self.completed_at.unwrap_or(now);
        Some(end.signed_duration_since(start).num_seconds().max(0))
    }

    /// `(finished, total)` step counts.
    pub fn step_progress(&self) -> (usize, usize) {
        let done = self
            .steps
            .iter()
            .filter(|s| s.status == RunStatus::Completed)
            .count();
        (done, self.steps.len())
    }
}

/// A workflow known from a local `.github/workflows` file, whether or not it ever ran.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowDefinition {
    pub name: String,
    pub file: String,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }
}
