//! `DataSource` backed by the `gh` CLI (`gh api -X METHOD repos/...`).

use super::parser;
use crate::model::{Job, Run};
use crate::traits::DataSource;
use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use std::time::Duration;
use tokio::process::Command;

const GH_TIMEOUT: Duration = Duration::from_secs(30);
const LOG_SIZE_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

const DISPATCH_HINT: &str = "hint: workflow file must exist on the default branch to be dispatched";

#[derive(Debug, Default, Clone)]
pub struct GhClient;

impl GhClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DataSource for GhClient {
    async fn list_runs(&self, repo: &str, page_size: usize) -> Result<Vec<Run>> {
        let endpoint = format!("repos/{repo}/actions/runs?per_page={page_size}");
        let json = gh_api("GET", &endpoint, &[]).await?;
        parser::parse_runs(&json)
    }

    async fn list_jobs(&self, repo: &str, run_id: u64) -> Result<Vec<Job>> {
        let endpoint = format!("repos/{repo}/actions/runs/{run_id}/jobs");
        let json = gh_api("GET", &endpoint, &[]).await?;
        parser::parse_jobs(&json)
    }

    async fn get_job_logs(&self, repo: &str, job_id: u64) -> Result<String> {
        let endpoint = format!("repos/{repo}/actions/jobs/{job_id}/logs");
        let raw = gh_api("GET", &endpoint, &[]).await?;
        check_log_size(&raw)?;
        Ok(parser::process_log_output(&raw, parser::MAX_LOG_LINES))
    }

    async fn rerun(&self, repo: &str, run_id: u64, debug: bool) -> Result<()> {
        let endpoint = format!("repos/{repo}/actions/runs/{run_id}/rerun");
        let extra: &[&str] = if debug {
            &["-F", "enable_debug_logging=true"]
        } else {
            &[]
        };
        gh_api("POST", &endpoint, extra).await.map(|_| ())
    }

    async fn rerun_failed_only(&self, repo: &str, run_id: u64) -> Result<()> {
        let endpoint = format!("repos/{repo}/actions/runs/{run_id}/rerun-failed-jobs");
        gh_api("POST", &endpoint, &[]).await.map(|_| ())
    }

    async fn cancel(&self, repo: &str, run_id: u64) -> Result<()> {
        let endpoint = format!("repos/{repo}/actions/runs/{run_id}/cancel");
        gh_api("POST", &endpoint, &[]).await.map(|_| ())
    }

    async fn dispatch(&self, repo: &str, workflow_file: &str, git_ref: &str) -> Result<()> {
        let endpoint = format!("repos/{repo}/actions/workflows/{workflow_file}/dispatches");
        let ref_arg = format!("ref={git_ref}");
        gh_api("POST", &endpoint, &["-f", &ref_arg])
            .await
            .map(|_| ())
            .map_err(|e| eyre!("{}", with_dispatch_hint(&e.to_string())))
    }

    fn open_in_browser(&self, url: &str) -> Result<()> {
        open_in_browser_impl(url)
    }
}

async fn gh_api(method: &str, endpoint: &str, extra: &[&str]) -> Result<String> {
    let mut args = vec!["api", "-X", method, endpoint];
    args.extend_from_slice(extra);
    run_gh(&args).await
}

async fn run_gh(args: &[&str]) -> Result<String> {
    let start = std::time::Instant::now();
    let output = tokio::time::timeout(GH_TIMEOUT, Command::new("gh").args(args).output())
        .await
        .map_err(|_| eyre!("gh command timed out after {}s", GH_TIMEOUT.as_secs()))?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                eyre!("gh CLI not found. Install it from https://cli.github.com/")
            } else {
                eyre!("Failed to run gh: {}", e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(args = ?args, stderr = %stderr.trim(), "gh command failed");
        return Err(eyre!("{}", classify_gh_error(&stderr)));
    }

    tracing::debug!(
        args = ?args,
        elapsed_ms = start.elapsed().as_millis(),
        "gh command completed"
    );
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

pub fn classify_gh_error(stderr: &str) -> String {
    if stderr.contains("not logged") || stderr.contains("auth login") {
        "Not authenticated with gh. Run `gh auth login` first.".to_string()
    } else if stderr.contains("Could not resolve to a Repository") || stderr.contains("not a git repository") {
        "Repository not found. Check the --repo value or the config file.".to_string()
    } else {
        let trimmed = stderr.trim();
        if trimmed.is_empty() {
            "gh api error".to_string()
        } else {
            format!("gh api error: {trimmed}")
        }
    }
}

/// Appends the default-branch hint to errors that look like a missing workflow.
pub fn with_dispatch_hint(msg: &str) -> String {
    let lower = msg.to_lowercase();
    let missing = ["404", "not found", "no workflow", "could not find"]
        .iter()
        .any(|needle| lower.contains(needle));
    if missing {
        format!("{msg}\n{DISPATCH_HINT}")
    } else {
        msg.to_string()
    }
}

fn check_log_size(log: &str) -> Result<()> {
    if log.len() > LOG_SIZE_LIMIT {
        return Err(eyre!(
            "Log output too large ({:.1} MB, max {} MB)",
            log.len() as f64 / (1024.0 * 1024.0),
            LOG_SIZE_LIMIT / (1024 * 1024)
        ));
    }
    Ok(())
}

/// Opens a URL in the user's default browser.
///
/// WSL2 compiles as `target_os = "linux"` but needs `wslview` instead of `xdg-open`.
fn open_in_browser_impl(url: &str) -> Result<()> {
    use std::process::{Command, Stdio};

    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(eyre!("Refusing to open non-HTTP URL: {url}"));
    }

    let cmd = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else if std::env::var_os("WSL_DISTRO_NAME").is_some() {
        "wslview"
    } else {
        "xdg-open"
    };

    Command::new(cmd)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                eyre!("No browser opener found ({cmd})")
            } else {
                eyre!("Failed to open browser with {cmd}: {e}")
            }
        })
}
