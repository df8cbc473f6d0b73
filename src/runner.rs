//! Executes requests against the collaborators and reports back on the event channel.

use crate::events::AppEvent;
use crate::model::Run;
use crate::task::{Completion, Request, Task, TaskResult};
use crate::traits::{DataSource, WorkflowDiscovery};
use color_eyre::eyre::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn DataSource>,
    pub discovery: Arc<dyn WorkflowDiscovery>,
}

/// Runs `request` in the background and posts its [`Completion`].
pub fn spawn(request: Request, ctx: &Collaborators, tx: mpsc::UnboundedSender<AppEvent>) {
    let ctx = ctx.clone();
    let label = request.task.label();
    let report = tx.clone();
    spawn_monitored(tx, label, async move {
        let Request { id, task } = request;
        let result = execute(task, ctx.source.as_ref(), ctx.discovery.as_ref()).await;
        if report
            .send(AppEvent::Completed(Completion { id, result }))
            .is_err()
        {
            tracing::warn!("{label}: channel closed");
        }
    });
}

/// Reports a panicking task as `AppEvent::Error` instead of losing it silently.
fn spawn_monitored(
    tx: mpsc::UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                match join_err.into_panic().downcast::<String>() {
                    Ok(s) => *s,
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(s) => s.to_string(),
                        Err(_) => "unknown panic".to_string(),
                    },
                }
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            if tx
                .send(AppEvent::Error(format!("{label} crashed: {msg}")))
                .is_err()
            {
                tracing::warn!("{label}: channel closed while reporting panic");
            }
        }
    });
}

fn flatten<T>(result: Result<T>) -> Result<T, String> {
    result.map_err(|e| e.to_string())
}

/// Runs of every repo merged newest first. One failing repo fails the whole load.
async fn load_runs(source: &dyn DataSource, repos: &[String], page_size: usize) -> Result<Vec<Run>> {
    let mut all = Vec::new();
    for repo in repos {
        let start = std::time::Instant::now();
        let runs = source.list_runs(repo, page_size).await?;
        tracing::debug!(%repo, count = runs.len(), elapsed_ms = start.elapsed().as_millis(), "runs loaded");
        all.extend(runs);
    }
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(all)
}

pub async fn execute(
    task: Task,
    source: &dyn DataSource,
    discovery: &dyn WorkflowDiscovery,
) -> TaskResult {
    match task {
        Task::LoadRuns {
            repos,
            page_size,
            partial,
        } => TaskResult::Runs {
            partial,
            result: flatten(load_runs(source, &repos, page_size).await),
        },
        Task::LoadJobs { repo, run_id } => TaskResult::Jobs {
            run_id,
            result: flatten(source.list_jobs(&repo, run_id).await),
        },
        Task::LoadLogs {
            repo,
            job_id,
            job_name,
        } => TaskResult::Logs {
            job_name,
            result: flatten(source.get_job_logs(&repo, job_id).await),
        },
        Task::DiscoverWorkflows => TaskResult::Definitions(flatten(discovery.discover().await)),
        Task::Rerun {
            repo,
            run_id,
            debug,
        } => {
            let msg = if debug {
                "re-run triggered (debug logging enabled)"
            } else {
                "re-run triggered"
            };
            TaskResult::Action(flatten(source.rerun(&repo, run_id, debug).await).map(|()| msg.to_string()))
        }
        Task::RerunFailed { repo, run_id } => TaskResult::Action(
            flatten(source.rerun_failed_only(&repo, run_id).await)
                .map(|()| "re-run of failed jobs triggered".to_string()),
        ),
        Task::Cancel { repo, run_id } => TaskResult::Action(
            flatten(source.cancel(&repo, run_id).await).map(|()| "workflow cancelled".to_string()),
        ),
        Task::Dispatch {
            repo,
            workflow_file,
            git_ref,
        } => TaskResult::Dispatch(
            flatten(source.dispatch(&repo, &workflow_file, &git_ref).await)
                .map(|()| format!("dispatched {workflow_file} on {git_ref}")),
        ),
        Task::OpenUrl(url) => TaskResult::Browser(flatten(source.open_in_browser(&url))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::{make_job, make_run};
    use crate::model::{Job, WorkflowDefinition};
    use async_trait::async_trait;
    use color_eyre::eyre::eyre;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        fail_repo: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl DataSource for FakeSource {
        async fn list_runs(&self, repo: &str, page_size: usize) -> Result<Vec<Run>> {
            self.record(format!("list_runs {repo} {page_size}"));
            if self.fail_repo.as_deref() == Some(repo) {
                return Err(eyre!("HTTP 502"));
            }
            let base = if repo == "o/a" { 10 } else { 20 };
            Ok(vec![make_run(base + 1, "CI", "main", "ci.yml"), make_run(base + 5, "CI", "main", "ci.yml")])
        }

        async fn list_jobs(&self, _repo: &str, run_id: u64) -> Result<Vec<Job>> {
            Ok(vec![make_job(1, run_id, "build")])
        }

        async fn get_job_logs(&self, _repo: &str, job_id: u64) -> Result<String> {
            Ok(format!("log of {job_id}"))
        }

        async fn rerun(&self, repo: &str, run_id: u64, debug: bool) -> Result<()> {
            self.record(format!("rerun {repo} {run_id} {debug}"));
            Ok(())
        }

        async fn rerun_failed_only(&self, repo: &str, run_id: u64) -> Result<()> {
            self.record(format!("rerun_failed {repo} {run_id}"));
            Ok(())
        }

        async fn cancel(&self, _repo: &str, _run_id: u64) -> Result<()> {
            Err(eyre!("gh api error: HTTP 409"))
        }

        async fn dispatch(&self, repo: &str, workflow_file: &str, git_ref: &str) -> Result<()> {
            self.record(format!("dispatch {repo} {workflow_file} {git_ref}"));
            Ok(())
        }

        fn open_in_browser(&self, url: &str) -> Result<()> {
            self.record(format!("open {url}"));
            Ok(())
        }
    }

    struct FakeDiscovery;

    #[async_trait]
    impl WorkflowDiscovery for FakeDiscovery {
        async fn discover(&self) -> Result<Vec<WorkflowDefinition>> {
            Ok(vec![WorkflowDefinition::new("CI", "ci.yml")])
        }
    }

    #[tokio::test]
    async fn runs_from_all_repos_merged_newest_first() {
        let source = FakeSource::default();
        let task = Task::LoadRuns { repos: vec!["o/a".into(), "o/b".into()], page_size: 5, partial: false };
        let TaskResult::Runs { partial, result } = execute(task, &source, &FakeDiscovery).await else {
            panic!("expected runs");
        };
        assert!(!partial);
        let ids: Vec<u64> = result.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![25, 21, 15, 11]);
        assert_eq!(
            *source.calls.lock().unwrap(),
            vec!["list_runs o/a 5".to_string(), "list_runs o/b 5".to_string()]
        );
    }

    #[tokio::test]
    async fn one_failing_repo_fails_the_load() {
        let source = FakeSource { fail_repo: Some("o/b".into()), ..FakeSource::default() };
        let task = Task::LoadRuns { repos: vec!["o/a".into(), "o/b".into()], page_size: 1, partial: true };
        let result = execute(task, &source, &FakeDiscovery).await;
        assert_eq!(result, TaskResult::Runs { partial: true, result: Err("HTTP 502".into()) });
    }

    #[tokio::test]
    async fn action_messages() {
        let source = FakeSource::default();
        let cases = [
            (Task::Rerun { repo: "o/r".into(), run_id: 7, debug: false }, "re-run triggered"),
            (
                Task::Rerun { repo: "o/r".into(), run_id: 7, debug: true },
                "re-run triggered (debug logging enabled)",
            ),
            (Task::RerunFailed { repo: "o/r".into(), run_id: 7 }, "re-run of failed jobs triggered"),
        ];
        for (task, msg) in cases {
            assert_eq!(execute(task, &source, &FakeDiscovery).await, TaskResult::Action(Ok(msg.into())));
        }
        assert_eq!(
            *source.calls.lock().unwrap(),
            vec!["rerun o/r 7 false".to_string(), "rerun o/r 7 true".to_string(), "rerun_failed o/r 7".to_string()]
        );
    }

    #[tokio::test]
    async fn action_error_flattened() {
        let result = execute(Task::Cancel { repo: "o/r".into(), run_id: 1 }, &FakeSource::default(), &FakeDiscovery).await;
        assert_eq!(result, TaskResult::Action(Err("gh api error: HTTP 409".into())));
    }

    #[tokio::test]
    async fn dispatch_and_browser() {
        let source = FakeSource::default();
        let task = Task::Dispatch { repo: "o/r".into(), workflow_file: "deploy.yml".into(), git_ref: "main".into() };
        assert_eq!(
            execute(task, &source, &FakeDiscovery).await,
            TaskResult::Dispatch(Ok("dispatched deploy.yml on main".into()))
        );
        assert_eq!(
            execute(Task::OpenUrl("https://github.com/o/r".into()), &source, &FakeDiscovery).await,
            TaskResult::Browser(Ok(()))
        );
    }

    #[tokio::test]
    async fn spawn_reports_completion_with_request_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = Collaborators {
            source: Arc::new(FakeSource::default()),
            discovery: Arc::new(FakeDiscovery),
        };
        spawn(Request { id: 42, task: Task::DiscoverWorkflows }, &ctx, tx);
        assert_eq!(
            rx.recv().await,
            Some(AppEvent::Completed(Completion {
                id: 42,
                result: TaskResult::Definitions(Ok(vec![WorkflowDefinition::new("CI", "ci.yml")])),
            }))
        );
    }

    #[tokio::test]
    async fn panicking_task_reported_as_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_monitored(tx, "boom", async { panic!("kaboom") });
        assert_eq!(rx.recv().await, Some(AppEvent::Error("boom crashed: kaboom".into())));
    }
}
