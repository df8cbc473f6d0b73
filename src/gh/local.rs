//! The local checkout: `.github/workflows` discovery, current branch, origin remote.

use crate::config::parse_git_remote;
use crate::model::WorkflowDefinition;
use crate::traits::{Environment, WorkflowDiscovery};
use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Git checkout rooted at the process working directory.
#[derive(Debug, Default, Clone)]
pub struct LocalRepo;

impl LocalRepo {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WorkflowDiscovery for LocalRepo {
    async fn discover(&self) -> Result<Vec<WorkflowDefinition>> {
        let root = run_git(&["rev-parse", "--show-toplevel"]).await?;
        let dir = PathBuf::from(root).join(".github").join("workflows");
        scan_workflow_dir(&dir)
    }
}

#[async_trait]
impl Environment for LocalRepo {
    async fn current_branch(&self) -> Result<String> {
        run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).await
    }

    async fn origin_repo(&self) -> Result<String> {
        let url = run_git(&["remote", "get-url", "origin"]).await?;
        parse_git_remote(&url).ok_or_else(|| eyre!("unrecognized origin remote: {url}"))
    }
}

async fn run_git(args: &[&str]) -> Result<String> {
    let output = tokio::time::timeout(GIT_TIMEOUT, Command::new("git").args(args).output())
        .await
        .map_err(|_| eyre!("git command timed out after {}s", GIT_TIMEOUT.as_secs()))?
        .map_err(|e| eyre!("Failed to run git: {}", e))?;

    if !output.status.success() {
        return Err(eyre!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[derive(Deserialize)]
struct WorkflowHeader {
    #[serde(default)]
    name: Option<String>,
}

/// Reads every `*.yml`/`*.yaml` in `dir`. A missing directory yields no definitions.
/// The display name is the file's top-level `name:`, falling back to the file stem.
pub fn scan_workflow_dir(dir: &Path) -> Result<Vec<WorkflowDefinition>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).wrap_err_with(|| format!("failed to read {}", dir.display())),
    };

    let mut defs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_workflow = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yml" || e == "yaml");
        if !is_workflow || !path.is_file() {
            continue;
        }
        let Some(file) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        let raw = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read workflow file {}", path.display()))?;
        let name = serde_yaml::from_str::<WorkflowHeader>(&raw)
            .ok()
            .and_then(|h| h.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(file)
                    .to_string()
            });
        tracing::debug!(%name, file, "discovered local workflow definition");
        defs.push(WorkflowDefinition::new(name, file));
    }
    defs.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gh-ci-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn scans_named_and_unnamed_workflows() {
        let dir = temp_dir("scan");
        std::fs::write(dir.join("ci.yml"), "name: CI\non: push\n").unwrap();
        std::fs::write(dir.join("deploy.yaml"), "on: workflow_dispatch\n").unwrap();
        std::fs::write(dir.join("README.md"), "not a workflow").unwrap();

        let defs = scan_workflow_dir(&dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(
            defs,
            vec![
                WorkflowDefinition::new("CI", "ci.yml"),
                WorkflowDefinition::new("deploy", "deploy.yaml"),
            ]
        );
    }

    #[test]
    fn unparseable_yaml_falls_back_to_stem() {
        let dir = temp_dir("broken");
        std::fs::write(dir.join("nightly.yml"), "name: [unclosed\n").unwrap();
        let defs = scan_workflow_dir(&dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(defs, vec![WorkflowDefinition::new("nightly", "nightly.yml")]);
    }

    #[test]
    fn missing_dir_is_empty() {
        let dir = std::env::temp_dir().join("gh-ci-no-such-workflows-dir");
        assert!(scan_workflow_dir(&dir).unwrap().is_empty());
    }
}
