//! Three-panel dashboard: workflow/branch selector, run list, job detail.
//!
//! The workflow and branch lists are derived from the held runs and local
//! definitions on every ingest. Selections survive a refresh by name, and every
//! cursor is clamped into its list after each mutation.

use crate::config::Config;
use crate::dialog::{
    BranchPicker, DialogOutcome, DispatchConfirm, DispatchTarget, PickerOutcome, RerunConfirm,
    RerunTarget,
};
use crate::fetchable::Fetchable;
use crate::input::KeyMap;
use crate::model::{Job, Run, WorkflowDefinition};
use crate::task::Task;
use crossterm::event::KeyEvent;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Rows moved by page up/down.
pub const PAGE_SIZE: usize = 10;
/// Wildcard entry at the top of the workflow list.
pub const WORKFLOW_ALL: &str = "*";
/// Runs per repo requested by the quick first-page load.
pub const PARTIAL_PAGE_SIZE: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Workflows,
    Runs,
    Detail,
}

impl Panel {
    fn left(self) -> Self {
        match self {
            Self::Workflows | Self::Runs => Self::Workflows,
            Self::Detail => Self::Runs,
        }
    }

    fn right(self) -> Self {
        match self {
            Self::Workflows => Self::Runs,
            Self::Runs | Self::Detail => Self::Detail,
        }
    }
}

/// What a key press or ingest asks of the application: background work and/or a status line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub tasks: Vec<Task>,
    pub status: Option<String>,
}

impl Outcome {
    pub fn task(task: Task) -> Self {
        Self {
            tasks: vec![task],
            status: None,
        }
    }

    pub fn status(msg: impl Into<String>) -> Self {
        Self {
            tasks: Vec::new(),
            status: Some(msg.into()),
        }
    }

    pub fn with_status(mut self, msg: impl Into<String>) -> Self {
        self.status = Some(msg.into());
        self
    }

    fn maybe(task: Option<Task>) -> Self {
        Self {
            tasks: task.into_iter().collect(),
            status: None,
        }
    }
}

/// Workflow names: wildcard first, then the sorted union of local definitions
/// and run workflows whose file is not already covered by a definition.
pub fn derive_workflows(definitions: &[WorkflowDefinition], runs: &[Run]) -> Vec<String> {
    let covered: HashSet<&str> = definitions.iter().map(|d| d.file.as_str()).collect();
    let mut names: BTreeSet<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
    for run in runs {
        if !run.name.is_empty() && !covered.contains(run.workflow_file()) {
            names.insert(&run.name);
        }
    }
    std::iter::once(WORKFLOW_ALL)
        .chain(names)
        .map(str::to_string)
        .collect()
}

/// Sorted branch names seen on runs, plus the default and local branches.
pub fn derive_branches(runs: &[Run], default_branch: &str, local_branch: Option<&str>) -> Vec<String> {
    let mut names: BTreeSet<&str> = runs
        .iter()
        .map(|r| r.head_branch.as_str())
        .filter(|b| !b.is_empty())
        .collect();
    if !default_branch.is_empty() {
        names.insert(default_branch);
    }
    if let Some(local) = local_branch.filter(|b| !b.is_empty()) {
        names.insert(local);
    }
    names.into_iter().map(str::to_string).collect()
}

fn step(cursor: usize, delta: isize, max: usize) -> Option<usize> {
    cursor
        .checked_add_signed(delta)
        .filter(|n| *n <= max && *n != cursor)
}

fn paged(cursor: usize, delta: isize, max: usize) -> usize {
    cursor.saturating_add_signed(delta).min(max)
}

#[derive(Debug)]
pub struct Dashboard {
    keys: KeyMap,
    repos: Vec<String>,
    default_branch: String,
    local_branch: Option<String>,
    page_size: usize,

    runs: Fetchable<Vec<Run>>,
    definitions: Fetchable<Vec<WorkflowDefinition>>,
    jobs: Fetchable<Vec<Job>>,
    /// Run whose jobs are held or being fetched.
    jobs_run_id: Option<u64>,

    /// Workflow name -> workflow file basename, rebuilt from the current runs
    /// and definitions on every change. First mapping wins.
    workflow_files: HashMap<String, String>,
    workflows: Vec<String>,
    branches: Vec<String>,
    /// Indices into `runs` passing the branch + workflow filter.
    visible: Vec<usize>,

    panel: Panel,
    branch_idx: usize,
    /// 0 = branch row, 1 = wildcard, 2.. = named workflows.
    workflow_cursor: usize,
    run_cursor: usize,
    job_cursor: usize,

    branch_picker: BranchPicker,
    rerun_dialog: RerunConfirm,
    dispatch_dialog: DispatchConfirm,
}

impl Dashboard {
    pub fn new(config: &Config, local_branch: Option<String>) -> Self {
        let mut dashboard = Self {
            keys: KeyMap::default(),
            repos: config.repos.clone(),
            default_branch: config.default_branch.clone(),
            local_branch: local_branch.filter(|b| !b.is_empty() && b != "HEAD"),
            page_size: config.page_size,
            runs: Fetchable::default(),
            definitions: Fetchable::default(),
            jobs: Fetchable::default(),
            jobs_run_id: None,
            workflow_files: HashMap::new(),
            workflows: vec![WORKFLOW_ALL.to_string()],
            branches: Vec::new(),
            visible: Vec::new(),
            panel: Panel::Workflows,
            branch_idx: 0,
            workflow_cursor: 1,
            run_cursor: 0,
            job_cursor: 0,
            branch_picker: BranchPicker::default(),
            rerun_dialog: RerunConfirm::default(),
            dispatch_dialog: DispatchConfirm::default(),
        };
        dashboard.rederive();
        dashboard
    }

    // --- Ingest ---

    /// Builds a runs fetch for every configured repo and marks runs as in flight.
    pub fn load_runs_task(&mut self, partial: bool) -> Task {
        self.runs.mark_fetching();
        Task::LoadRuns {
            repos: self.repos.clone(),
            page_size: if partial { PARTIAL_PAGE_SIZE } else { self.page_size },
            partial,
        }
    }

    /// Replaces the run list with a complete snapshot. Returns a job load for the selected run.
    pub fn ingest_runs(&mut self, mut runs: Vec<Run>) -> Option<Task> {
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.runs.set_data(runs);
        self.rederive()
    }

    /// Same as [`Self::ingest_runs`] for a first-page snapshot.
    pub fn ingest_partial_runs(&mut self, mut runs: Vec<Run>) -> Option<Task> {
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.runs.set_partial(runs);
        self.rederive()
    }

    pub fn runs_failed(&mut self, err: &str) {
        self.runs.set_error(err);
    }

    pub fn ingest_definitions(&mut self, definitions: Vec<WorkflowDefinition>) -> Option<Task> {
        self.definitions.set_local(definitions);
        self.rederive()
    }

    pub fn definitions_failed(&mut self, err: &str) {
        self.definitions.set_error(err);
    }

    /// Stores jobs if they belong to the run currently shown. Returns `false` when dropped.
    pub fn ingest_jobs(&mut self, run_id: u64, jobs: Vec<Job>) -> bool {
        if self.jobs_run_id != Some(run_id) {
            return false;
        }
        self.jobs.set_data(jobs);
        if self.job_cursor >= self.jobs.get().len() {
            self.job_cursor = 0;
        }
        true
    }

    pub fn jobs_failed(&mut self, run_id: u64, err: &str) {
        if self.jobs_run_id == Some(run_id) {
            self.jobs.set_error(err);
        }
    }

    fn rederive(&mut self) -> Option<Task> {
        let prev_branch = if self.branches.is_empty() {
            self.local_branch
                .clone()
                .unwrap_or_else(|| self.default_branch.clone())
        } else {
            self.selected_branch().to_string()
        };
        let prev_workflow = self.selected_workflow().map(str::to_string);

        self.workflow_files.clear();
        for run in self.runs.get() {
            if !run.name.is_empty() && !run.path.is_empty() {
                self.workflow_files
                    .entry(run.name.clone())
                    .or_insert_with(|| run.workflow_file().to_string());
            }
        }
        for def in self.definitions.get() {
            self.workflow_files
                .entry(def.name.clone())
                .or_insert_with(|| def.file.clone());
        }

        self.workflows = derive_workflows(self.definitions.get(), self.runs.get());
        self.branches = derive_branches(
            self.runs.get(),
            &self.default_branch,
            self.local_branch.as_deref(),
        );

        self.branch_idx = self
            .branches
            .iter()
            .position(|b| *b == prev_branch)
            .unwrap_or(0);
        match prev_workflow {
            Some(name) => {
                self.workflow_cursor = self
                    .workflows
                    .iter()
                    .position(|w| *w == name)
                    .map_or(1, |i| i + 1);
            }
            None => {
                if self.workflow_cursor > self.workflows.len() {
                    self.workflow_cursor = 0;
                }
            }
        }

        self.apply_filter();
        self.sync_jobs()
    }

    /// Recomputes the visible runs from the selected branch and workflow and clamps the run cursor.
    pub fn apply_filter(&mut self) {
        let visible: Vec<usize> = {
            let branch = self.selected_branch();
            let workflow = self.selected_workflow().filter(|w| *w != WORKFLOW_ALL);
            let file = workflow.and_then(|w| self.workflow_files.get(w));
            self.runs
                .get()
                .iter()
                .enumerate()
                .filter(|(_, run)| run.head_branch == branch)
                .filter(|(_, run)| {
                    workflow.map_or(true, |w| {
                        run.name == w || file.is_some_and(|f| f == run.workflow_file())
                    })
                })
                .map(|(i, _)| i)
                .collect()
        };
        self.visible = visible;
        self.run_cursor = self.run_cursor.min(self.visible.len().saturating_sub(1));
    }

    fn clear_jobs(&mut self) {
        self.jobs.reset();
        self.jobs_run_id = None;
        self.job_cursor = 0;
    }

    /// Points the job list at the selected run and requests its jobs.
    fn sync_jobs(&mut self) -> Option<Task> {
        let Some((run_id, repo)) = self.selected_run().map(|r| (r.id, r.repo().to_string())) else {
            self.clear_jobs();
            return None;
        };
        if self.jobs_run_id != Some(run_id) {
            self.clear_jobs();
            self.jobs_run_id = Some(run_id);
        }
        self.jobs.mark_fetching();
        Some(Task::LoadJobs { repo, run_id })
    }

    fn workflow_changed(&mut self) -> Outcome {
        self.apply_filter();
        self.run_cursor = 0;
        self.clear_jobs();
        Outcome::maybe(self.sync_jobs())
    }

    fn run_changed(&mut self) -> Outcome {
        self.clear_jobs();
        Outcome::maybe(self.sync_jobs())
    }

    fn select_branch(&mut self, name: &str) -> Outcome {
        if let Some(idx) = self.branches.iter().position(|b| b == name) {
            self.branch_idx = idx;
        }
        self.workflow_cursor = 1;
        self.workflow_changed()
    }

    // --- Keys ---

    pub fn has_dialog(&self) -> bool {
        self.branch_picker.is_active() || self.dispatch_dialog.is_active() || self.rerun_dialog.is_active()
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> Outcome {
        if self.branch_picker.is_active() {
            return match self.branch_picker.handle_key(key) {
                PickerOutcome::Picked(branch) => self.select_branch(&branch),
                PickerOutcome::Pending | PickerOutcome::Dismissed => Outcome::default(),
            };
        }
        if self.dispatch_dialog.is_active() {
            return Self::dialog_outcome(self.dispatch_dialog.handle_key(key));
        }
        if self.rerun_dialog.is_active() {
            return Self::dialog_outcome(self.rerun_dialog.handle_key(key));
        }
        self.handle_main_key(key)
    }

    fn dialog_outcome(outcome: DialogOutcome) -> Outcome {
        match outcome {
            DialogOutcome::Confirmed { task, status } => Outcome::task(task).with_status(status),
            DialogOutcome::Pending | DialogOutcome::Cancelled => Outcome::default(),
        }
    }

    fn handle_main_key(&mut self, key: &KeyEvent) -> Outcome {
        let keys = self.keys.clone();
        if keys.up.matches(key) {
            self.move_cursor(-1)
        } else if keys.down.matches(key) {
            self.move_cursor(1)
        } else if keys.page_up.matches(key) {
            self.move_page(-1)
        } else if keys.page_down.matches(key) {
            self.move_page(1)
        } else if keys.top.matches(key) {
            self.move_edge(true)
        } else if keys.bottom.matches(key) {
            self.move_edge(false)
        } else if keys.right.matches(key) {
            if self.panel == Panel::Detail {
                self.request_logs()
            } else {
                self.panel = self.panel.right();
                Outcome::default()
            }
        } else if keys.enter.matches(key) {
            self.enter()
        } else if keys.left.matches(key) || keys.back.matches(key) {
            self.panel = self.panel.left();
            Outcome::default()
        } else if keys.open.matches(key) {
            self.open_url()
        } else if keys.rerun.matches(key) {
            self.open_rerun()
        } else if keys.cancel.matches(key) {
            self.cancel_run()
        } else if keys.dispatch.matches(key) {
            self.open_dispatch()
        } else if keys.refresh.matches(key) {
            Outcome::task(self.load_runs_task(false)).with_status("refreshing...")
        } else {
            Outcome::default()
        }
    }

    fn move_cursor(&mut self, delta: isize) -> Outcome {
        match self.panel {
            Panel::Workflows => {
                if let Some(n) = step(self.workflow_cursor, delta, self.workflows.len()) {
                    self.workflow_cursor = n;
                    return self.workflow_changed();
                }
            }
            Panel::Runs => {
                if let Some(last) = self.visible.len().checked_sub(1) {
                    if let Some(n) = step(self.run_cursor, delta, last) {
                        self.run_cursor = n;
                        return self.run_changed();
                    }
                }
            }
            Panel::Detail => {
                if let Some(last) = self.jobs.get().len().checked_sub(1) {
                    if let Some(n) = step(self.job_cursor, delta, last) {
                        self.job_cursor = n;
                    }
                }
            }
        }
        Outcome::default()
    }

    fn move_page(&mut self, direction: isize) -> Outcome {
        let delta = direction * PAGE_SIZE as isize;
        match self.panel {
            Panel::Workflows => {
                let n = paged(self.workflow_cursor, delta, self.workflows.len());
                if n != self.workflow_cursor {
                    self.workflow_cursor = n;
                    return self.workflow_changed();
                }
            }
            Panel::Runs => {
                let n = paged(self.run_cursor, delta, self.visible.len().saturating_sub(1));
                if n != self.run_cursor {
                    self.run_cursor = n;
                    return self.run_changed();
                }
            }
            Panel::Detail => {
                self.job_cursor = paged(self.job_cursor, delta, self.jobs.get().len().saturating_sub(1));
            }
        }
        Outcome::default()
    }

    fn move_edge(&mut self, top: bool) -> Outcome {
        match self.panel {
            Panel::Workflows => {
                let n = if top { 0 } else { self.workflows.len() };
                if n != self.workflow_cursor {
                    self.workflow_cursor = n;
                    return self.workflow_changed();
                }
            }
            Panel::Runs => {
                let n = if top { 0 } else { self.visible.len().saturating_sub(1) };
                if n != self.run_cursor {
                    self.run_cursor = n;
                    return self.run_changed();
                }
            }
            Panel::Detail => {
                self.job_cursor = if top { 0 } else { self.jobs.get().len().saturating_sub(1) };
            }
        }
        Outcome::default()
    }

    fn enter(&mut self) -> Outcome {
        match self.panel {
            Panel::Workflows if self.workflow_cursor == 0 => {
                self.branch_picker.open(&self.branches);
                Outcome::default()
            }
            Panel::Workflows | Panel::Runs => {
                self.panel = self.panel.right();
                Outcome::default()
            }
            Panel::Detail => self.request_logs(),
        }
    }

    fn request_logs(&self) -> Outcome {
        let (Some(run), Some(job)) = (self.selected_run(), self.selected_job()) else {
            return Outcome::default();
        };
        Outcome::task(Task::LoadLogs {
            repo: run.repo().to_string(),
            job_id: job.id,
            job_name: job.name.clone(),
        })
        .with_status("loading logs...")
    }

    fn repo_web_url(&self) -> Option<String> {
        self.selected_run()
            .map(|r| r.repository.web_url())
            .or_else(|| self.repos.first().map(|r| format!("https://github.com/{r}")))
    }

    /// Web page for whatever the active panel highlights.
    pub fn selected_url(&self) -> Option<String> {
        let url = match self.panel {
            Panel::Workflows => match self.selected_workflow().filter(|w| *w != WORKFLOW_ALL) {
                None => self.repo_web_url().map(|base| format!("{base}/actions")),
                Some(name) => match (self.workflow_files.get(name), self.repo_web_url()) {
                    (Some(file), Some(base)) => Some(format!("{base}/actions/workflows/{file}")),
                    _ => self.selected_run().map(|r| r.html_url.clone()),
                },
            },
            Panel::Runs => self.selected_run().map(|r| r.html_url.clone()),
            Panel::Detail => self.selected_job().map(|j| j.html_url.clone()),
        };
        url.filter(|u| !u.is_empty())
    }

    fn open_url(&self) -> Outcome {
        match self.selected_url() {
            Some(url) => Outcome::task(Task::OpenUrl(url)),
            None => Outcome::status("nothing to open"),
        }
    }

    fn open_rerun(&mut self) -> Outcome {
        let Some(target) = self.selected_run().map(|r| RerunTarget {
            repo: r.repo().to_string(),
            run_id: r.id,
            run_number: r.run_number,
        }) else {
            return Outcome::default();
        };
        self.rerun_dialog.open(target);
        Outcome::default()
    }

    fn cancel_run(&self) -> Outcome {
        let Some(run) = self.selected_run() else {
            return Outcome::default();
        };
        if !run.is_cancellable() {
            return Outcome::status(format!("run #{} is not in progress", run.run_number));
        }
        Outcome::task(Task::Cancel {
            repo: run.repo().to_string(),
            run_id: run.id,
        })
        .with_status("cancelling...")
    }

    fn open_dispatch(&mut self) -> Outcome {
        if self.panel != Panel::Workflows {
            return Outcome::default();
        }
        let Some(name) = self.selected_workflow().filter(|w| *w != WORKFLOW_ALL) else {
            return Outcome::default();
        };
        let Some(file) = self.workflow_files.get(name).cloned() else {
            return Outcome::status(format!("cannot dispatch: no workflow file known for {name}"));
        };
        let repo = self
            .selected_run()
            .map(|r| r.repo().to_string())
            .or_else(|| match self.repos.as_slice() {
                [only] => Some(only.clone()),
                _ => None,
            });
        let Some(repo) = repo else {
            return Outcome::status("cannot dispatch: no runs for this workflow on this branch");
        };
        let git_ref = self.selected_branch().to_string();
        self.dispatch_dialog.open(DispatchTarget {
            repo,
            workflow_file: file,
            git_ref,
        });
        Outcome::default()
    }

    // --- Queries ---

    pub fn keys(&self) -> &KeyMap {
        &self.keys
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn runs(&self) -> &Fetchable<Vec<Run>> {
        &self.runs
    }

    pub fn definitions(&self) -> &Fetchable<Vec<WorkflowDefinition>> {
        &self.definitions
    }

    pub fn jobs(&self) -> &Fetchable<Vec<Job>> {
        &self.jobs
    }

    pub fn workflows(&self) -> &[String] {
        &self.workflows
    }

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    pub fn workflow_cursor(&self) -> usize {
        self.workflow_cursor
    }

    pub fn run_cursor(&self) -> usize {
        self.run_cursor
    }

    pub fn job_cursor(&self) -> usize {
        self.job_cursor
    }

    pub fn selected_branch(&self) -> &str {
        self.branches
            .get(self.branch_idx)
            .map_or(self.default_branch.as_str(), String::as_str)
    }

    /// `None` while the cursor is on the branch row.
    pub fn selected_workflow(&self) -> Option<&str> {
        self.workflow_cursor
            .checked_sub(1)
            .and_then(|i| self.workflows.get(i))
            .map(String::as_str)
    }

    pub fn workflow_file(&self, name: &str) -> Option<&str> {
        self.workflow_files.get(name).map(String::as_str)
    }

    pub fn visible_runs(&self) -> impl Iterator<Item = &Run> + '_ {
        self.visible.iter().filter_map(|&i| self.runs.get().get(i))
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn selected_run(&self) -> Option<&Run> {
        self.visible
            .get(self.run_cursor)
            .and_then(|&i| self.runs.get().get(i))
    }

    pub fn selected_job(&self) -> Option<&Job> {
        self.jobs.get().get(self.job_cursor)
    }

    pub fn branch_picker(&self) -> &BranchPicker {
        &self.branch_picker
    }

    pub fn rerun_dialog(&self) -> &RerunConfirm {
        &self.rerun_dialog
    }

    pub fn dispatch_dialog(&self) -> &DispatchConfirm {
        &self.dispatch_dialog
    }
}
