//! Seams between the controller and the outside world.
//!
//! `DataSource` talks to the hosting service, `WorkflowDiscovery` reads the local
//! checkout, `Environment` answers questions about the working tree. Tests swap in
//! in-memory fakes for all three.

use crate::model::{Job, Run, WorkflowDefinition};
use async_trait::async_trait;
use color_eyre::eyre::Result;

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn list_runs(&self, repo: &str, page_size: usize) -> Result<Vec<Run>>;
    async fn list_jobs(&self, repo: &str, run_id: u64) -> Result<Vec<Job>>;
    async fn get_job_logs(&self, repo: &str, job_id: u64) -> Result<String>;
    async fn rerun(&self, repo: &str, run_id: u64, debug: bool) -> Result<()>;
    async fn rerun_failed_only(&self, repo: &str, run_id: u64) -> Result<()>;
    async fn cancel(&self, repo: &str, run_id: u64) -> Result<()>;
    async fn dispatch(&self, repo: &str, workflow_file: &str, git_ref: &str) -> Result<()>;
    fn open_in_browser(&self, url: &str) -> Result<()>;
}

#[async_trait]
pub trait WorkflowDiscovery: Send + Sync {
    async fn discover(&self) -> Result<Vec<WorkflowDefinition>>;
}

#[async_trait]
pub trait Environment: Send + Sync {
    async fn current_branch(&self) -> Result<String>;
    async fn origin_repo(&self) -> Result<String>;
}
