//! Background work requested by the controllers, and the results that come back.
//!
//! Controllers never perform I/O. They return [`Task`] descriptors; the
//! application stamps each with a request id ([`Request`]) and the shell runs it.
//! Results arrive later as [`TaskResult`] tagged with the same id, and the
//! [`RequestLedger`] decides whether they are still current.

use crate::model::{Job, Run, WorkflowDefinition};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Fetch runs of every repo. `partial` marks the quick first-page load.
    LoadRuns {
        repos: Vec<String>,
        page_size: usize,
        partial: bool,
    },
    LoadJobs {
        repo: String,
        run_id: u64,
    },
    LoadLogs {
        repo: String,
        job_id: u64,
        job_name: String,
    },
    DiscoverWorkflows,
    Rerun {
        repo: String,
        run_id: u64,
        debug: bool,
    },
    RerunFailed {
        repo: String,
        run_id: u64,
    },
    Cancel {
        repo: String,
        run_id: u64,
    },
    Dispatch {
        repo: String,
        workflow_file: String,
        git_ref: String,
    },
    OpenUrl(String),
}

impl Task {
    pub fn kind(&self) -> Option<FetchKind> {
        match self {
            Self::LoadRuns { .. } => Some(FetchKind::Runs),
            Self::LoadJobs { .. } => Some(FetchKind::Jobs),
            Self::LoadLogs { .. } => Some(FetchKind::Logs),
            Self::DiscoverWorkflows => Some(FetchKind::Definitions),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LoadRuns { partial: true, .. } => "load-runs-partial",
            Self::LoadRuns { .. } => "load-runs",
            Self::LoadJobs { .. } => "load-jobs",
            Self::LoadLogs { .. } => "load-logs",
            Self::DiscoverWorkflows => "discover-workflows",
            Self::Rerun { .. } => "rerun",
            Self::RerunFailed { .. } => "rerun-failed",
            Self::Cancel { .. } => "cancel",
            Self::Dispatch { .. } => "dispatch",
            Self::OpenUrl(_) => "open-url",
        }
    }
}

/// A task stamped with its request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: u64,
    pub task: Task,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    Runs {
        partial: bool,
        result: Result<Vec<Run>, String>,
    },
    Jobs {
        run_id: u64,
        result: Result<Vec<Job>, String>,
    },
    Logs {
        job_name: String,
        result: Result<String, String>,
    },
    Definitions(Result<Vec<WorkflowDefinition>, String>),
    /// Rerun, rerun-failed and cancel. `Ok` carries the status message.
    Action(Result<String, String>),
    Dispatch(Result<String, String>),
    Browser(Result<(), String>),
}

/// A finished request, as delivered back to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: u64,
    pub result: TaskResult,
}

/// Logical data sets whose responses can race each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Runs,
    Jobs,
    Logs,
    Definitions,
}

/// Hands out monotonically increasing request ids and filters stale responses.
#[derive(Debug, Default)]
pub struct RequestLedger {
    last_id: u64,
    issued: HashMap<FetchKind, u64>,
    applied: HashMap<FetchKind, u64>,
}

impl RequestLedger {
    pub fn issue(&mut self, task: Task) -> Request {
        self.last_id += 1;
        if let Some(kind) = task.kind() {
            self.issued.insert(kind, self.last_id);
        }
        Request {
            id: self.last_id,
            task,
        }
    }

    /// Accepts a response only if nothing newer of the same kind was applied before.
    /// Used where any newer snapshot supersedes older ones (run lists, job lists).
    pub fn accept_newer(&mut self, kind: FetchKind, id: u64) -> bool {
        let applied = self.applied.get(&kind).copied().unwrap_or(0);
        if id <= applied {
            return false;
        }
        self.applied.insert(kind, id);
        true
    }

    /// Accepts a response only if it answers the latest request of its kind.
    /// Used where only the newest request matters (opened logs, workflow discovery).
    pub fn accept_latest(&mut self, kind: FetchKind, id: u64) -> bool {
        if self.issued.get(&kind).copied() != Some(id) {
            return false;
        }
        self.applied.insert(kind, id);
        true
    }

    pub fn last_issued(&self, kind: FetchKind) -> Option<u64> {
        self.issued.get(&kind).copied()
    }
}
