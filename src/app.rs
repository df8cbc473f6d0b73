//! Application controller: the single update function every event goes through.
//!
//! `App::update` consumes one [`AppEvent`] at a time and returns the background
//! work it wants started, already stamped with request ids. The shell runs those
//! requests and feeds their results back as `AppEvent::Completed`; responses the
//! [`RequestLedger`] considers stale are dropped here.

use crate::config::Config;
use crate::dashboard::{Dashboard, Outcome};
use crate::events::AppEvent;
use crate::fetchable::LoadState;
use crate::input::{is_interrupt, is_press};
use crate::logviewer::{LogOutcome, LogViewer};
use crate::poller::backoff_delay;
use crate::task::{Completion, FetchKind, Request, RequestLedger, Task, TaskResult};
use crossterm::event::KeyEvent;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Dashboard,
    Logs,
}

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    set_at: Instant,
}

#[derive(Debug)]
pub struct App {
    config: Config,
    screen: Screen,
    dashboard: Dashboard,
    log_viewer: LogViewer,
    ledger: RequestLedger,
    size: (u16, u16),
    status: Option<StatusMessage>,
    status_ttl: Duration,
    should_quit: bool,
    tick_count: usize,
    /// Consecutive failed full refreshes.
    refresh_failures: u32,
}

impl App {
    pub fn new(config: Config, local_branch: Option<String>) -> Self {
        let dashboard = Dashboard::new(&config, local_branch);
        let status_ttl = Duration::from_secs(config.message_timeout);
        Self {
            config,
            screen: Screen::Dashboard,
            dashboard,
            log_viewer: LogViewer::default(),
            ledger: RequestLedger::default(),
            size: (80, 24),
            status: None,
            status_ttl,
            should_quit: false,
            tick_count: 0,
            refresh_failures: 0,
        }
    }

    /// Startup requests: local discovery, a quick first page, then the full page.
    pub fn init(&mut self) -> Vec<Request> {
        let partial = self.dashboard.load_runs_task(true);
        let full = self.dashboard.load_runs_task(false);
        vec![
            self.ledger.issue(Task::DiscoverWorkflows),
            self.ledger.issue(partial),
            self.ledger.issue(full),
        ]
    }

    pub fn update(&mut self, event: AppEvent) -> Vec<Request> {
        match event {
            AppEvent::Key(key) => self.handle_key(&key),
            AppEvent::Resize(w, h) => {
                self.size = (w, h);
                Vec::new()
            }
            AppEvent::Tick => {
                self.tick_count = self.tick_count.wrapping_add(1);
                self.prune_status(Instant::now());
                Vec::new()
            }
            AppEvent::RefreshDue => self.refresh(),
            AppEvent::Completed(completion) => self.handle_completion(completion),
            AppEvent::Error(msg) => {
                self.set_status(format!("error: {msg}"));
                Vec::new()
            }
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Vec<Request> {
        if !is_press(key) {
            return Vec::new();
        }
        if is_interrupt(key) {
            self.should_quit = true;
            return Vec::new();
        }
        match self.screen {
            Screen::Dashboard => {
                if !self.dashboard.has_dialog() && self.dashboard.keys().quit.matches(key) {
                    self.should_quit = true;
                    return Vec::new();
                }
                let outcome = self.dashboard.handle_key(key);
                self.apply(outcome)
            }
            Screen::Logs => {
                if !self.log_viewer.is_searching() && self.dashboard.keys().quit.matches(key) {
                    self.should_quit = true;
                    return Vec::new();
                }
                if self.log_viewer.handle_key(key, self.size.1) == LogOutcome::Back {
                    self.screen = Screen::Dashboard;
                }
                Vec::new()
            }
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Request> {
        if let Some(msg) = outcome.status {
            self.set_status(msg);
        }
        outcome
            .tasks
            .into_iter()
            .map(|task| self.ledger.issue(task))
            .collect()
    }

    fn issue(&mut self, task: Option<Task>) -> Vec<Request> {
        task.into_iter().map(|t| self.ledger.issue(t)).collect()
    }

    fn refresh(&mut self) -> Vec<Request> {
        let task = self.dashboard.load_runs_task(false);
        vec![self.ledger.issue(task)]
    }

    fn handle_completion(&mut self, Completion { id, result }: Completion) -> Vec<Request> {
        match result {
            TaskResult::Runs { partial, result } => {
                if !self.ledger.accept_newer(FetchKind::Runs, id) {
                    tracing::debug!(id, partial, "dropping stale runs response");
                    return Vec::new();
                }
                match result {
                    Ok(runs) => {
                        if !partial {
                            self.refresh_failures = 0;
                        }
                        let task = if partial {
                            self.dashboard.ingest_partial_runs(runs)
                        } else {
                            self.dashboard.ingest_runs(runs)
                        };
                        self.issue(task)
                    }
                    Err(e) => {
                        if !partial {
                            self.refresh_failures = self.refresh_failures.saturating_add(1);
                        }
                        self.dashboard.runs_failed(&e);
                        self.set_status(format!("error: {e}"));
                        Vec::new()
                    }
                }
            }
            TaskResult::Jobs { run_id, result } => {
                if !self.ledger.accept_newer(FetchKind::Jobs, id) {
                    tracing::debug!(id, run_id, "dropping stale jobs response");
                    return Vec::new();
                }
                match result {
                    Ok(jobs) => {
                        if !self.dashboard.ingest_jobs(run_id, jobs) {
                            tracing::debug!(run_id, "jobs for a run no longer selected");
                        }
                    }
                    Err(e) => {
                        self.dashboard.jobs_failed(run_id, &e);
                        self.set_status(format!("error: {e}"));
                    }
                }
                Vec::new()
            }
            TaskResult::Logs { job_name, result } => {
                if !self.ledger.accept_latest(FetchKind::Logs, id) {
                    tracing::debug!(id, %job_name, "dropping stale logs response");
                    return Vec::new();
                }
                self.status = None;
                match result {
                    Ok(text) => {
                        self.log_viewer.set_logs(job_name, &text);
                        self.screen = Screen::Logs;
                    }
                    Err(e) => self.set_status(format!("error loading logs: {e}")),
                }
                Vec::new()
            }
            TaskResult::Definitions(result) => {
                if !self.ledger.accept_latest(FetchKind::Definitions, id) {
                    return Vec::new();
                }
                match result {
                    Ok(defs) => {
                        let task = self.dashboard.ingest_definitions(defs);
                        self.issue(task)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "workflow discovery failed; continuing without local workflows");
                        self.dashboard.definitions_failed(&e);
                        Vec::new()
                    }
                }
            }
            TaskResult::Action(result) | TaskResult::Dispatch(result) => {
                match result {
                    Ok(msg) => self.set_status(msg),
                    Err(e) => self.set_status(format!("error: {e}")),
                }
                self.refresh()
            }
            TaskResult::Browser(result) => {
                if let Err(e) = result {
                    self.set_status(format!("error: {e}"));
                }
                Vec::new()
            }
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            set_at: Instant::now(),
        });
    }

    fn prune_status(&mut self, now: Instant) {
        if self
            .status
            .as_ref()
            .is_some_and(|s| now.saturating_duration_since(s.set_at) >= self.status_ttl)
        {
            self.status = None;
        }
    }

    /// Seconds until the next automatic refresh, stretched after failures.
    pub fn refresh_delay(&self) -> u64 {
        if self.refresh_failures == 0 {
            self.config.refresh_interval
        } else {
            backoff_delay(self.config.refresh_interval, self.refresh_failures)
        }
    }

    // --- Queries ---

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn log_viewer(&self) -> &LogViewer {
        &self.log_viewer
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn tick_count(&self) -> usize {
        self.tick_count
    }

    /// True until the first runs response (data or error) has arrived.
    pub fn is_loading(&self) -> bool {
        self.dashboard.runs().state() == LoadState::Idle
    }

    pub fn refresh_failures(&self) -> u32 {
        self.refresh_failures
    }
}
