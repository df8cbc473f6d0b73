//! Full-screen job log viewer with fuzzy search.
//!
//! Modes: viewing all lines, typing a query, or viewing the filtered context
//! rows of a submitted query. The scroll offset is always kept within
//! `[0, max(0, total - visible)]`.

use crate::input::{typed_char, KeyMap};
use crate::search::{build_log_context, LogContext, CONTEXT_LINES};
use crossterm::event::{KeyCode, KeyEvent};

/// Rows taken by the title, header, search line and help bar.
pub const LOG_VIEW_OVERHEAD: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    All,
    SearchInput,
    Filtered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    Stay,
    /// Leave the viewer and return to the dashboard.
    Back,
}

#[derive(Debug, Default)]
pub struct LogViewer {
    keys: KeyMap,
    job_name: String,
    lines: Vec<String>,
    offset: usize,
    query: String,
    /// `Some` while the search prompt is open.
    input: Option<String>,
    /// `Some` once a non-empty query was submitted.
    context: Option<LogContext>,
    match_idx: usize,
}

/// Visible log rows for a terminal of `height` rows.
pub fn visible_lines(height: u16) -> usize {
    usize::from(height.saturating_sub(LOG_VIEW_OVERHEAD).max(1))
}

impl LogViewer {
    pub fn set_logs(&mut self, job_name: impl Into<String>, text: &str) {
        self.job_name = job_name.into();
        self.lines = text.lines().map(str::to_string).collect();
        self.offset = 0;
        self.reset_search();
    }

    fn reset_search(&mut self) {
        self.query.clear();
        self.input = None;
        self.context = None;
        self.match_idx = 0;
    }

    pub fn mode(&self) -> ViewMode {
        if self.input.is_some() {
            ViewMode::SearchInput
        } else if self.context.is_some() {
            ViewMode::Filtered
        } else {
            ViewMode::All
        }
    }

    pub fn is_searching(&self) -> bool {
        self.input.is_some()
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn context(&self) -> Option<&LogContext> {
        self.context.as_ref()
    }

    /// `(current, total)` match groups of the submitted query.
    pub fn match_position(&self) -> Option<(usize, usize)> {
        self.context
            .as_ref()
            .filter(|c| !c.groups.is_empty())
            .map(|c| (self.match_idx + 1, c.groups.len()))
    }

    pub fn has_no_matches(&self) -> bool {
        self.context.as_ref().is_some_and(LogContext::is_empty)
    }

    /// Rows currently scrollable: filtered rows when a query is applied.
    pub fn total_rows(&self) -> usize {
        self.context
            .as_ref()
            .map_or(self.lines.len(), |c| c.rows.len())
    }

    fn max_offset(&self, visible: usize) -> usize {
        self.total_rows().saturating_sub(visible)
    }

    fn scroll_by(&mut self, delta: isize, visible: usize) {
        self.offset = self
            .offset
            .saturating_add_signed(delta)
            .min(self.max_offset(visible));
    }

    pub fn handle_key(&mut self, key: &KeyEvent, height: u16) -> LogOutcome {
        if self.input.is_some() {
            self.handle_search_key(key);
            return LogOutcome::Stay;
        }

        let visible = visible_lines(height);
        let page = visible as isize;
        let keys = self.keys.clone();
        if keys.back.matches(key) || keys.left.matches(key) || key.code == KeyCode::Backspace {
            self.reset_search();
            return LogOutcome::Back;
        }
        if keys.search.matches(key) {
            self.input = Some(String::new());
        } else if keys.search_next.matches(key) {
            self.jump_group(1, visible);
        } else if keys.search_prev.matches(key) {
            self.jump_group(-1, visible);
        } else if keys.up.matches(key) {
            self.scroll_by(-1, visible);
        } else if keys.down.matches(key) {
            self.scroll_by(1, visible);
        } else if keys.page_up.matches(key) {
            self.scroll_by(-page, visible);
        } else if keys.page_down.matches(key) {
            self.scroll_by(page, visible);
        } else if keys.half_page_up.matches(key) {
            self.scroll_by(-page / 2, visible);
        } else if keys.half_page_down.matches(key) {
            self.scroll_by(page / 2, visible);
        } else if keys.top.matches(key) {
            self.offset = 0;
        } else if keys.bottom.matches(key) {
            self.offset = self.max_offset(visible);
        }
        LogOutcome::Stay
    }

    fn handle_search_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input = None,
            KeyCode::Enter => {
                let query = self.input.take().unwrap_or_default();
                self.submit(query);
            }
            KeyCode::Backspace => {
                if let Some(input) = self.input.as_mut() {
                    input.pop();
                }
            }
            _ => {
                if let (Some(c), Some(input)) = (typed_char(key), self.input.as_mut()) {
                    input.push(c);
                }
            }
        }
    }

    fn submit(&mut self, query: String) {
        self.offset = 0;
        self.match_idx = 0;
        self.context = if query.is_empty() {
            None
        } else {
            Some(build_log_context(&self.lines, &query, CONTEXT_LINES))
        };
        self.query = query;
    }

    fn jump_group(&mut self, delta: isize, visible: usize) {
        let Some(groups) = self.context.as_ref().map(|c| c.groups.as_slice()) else {
            return;
        };
        let Some(idx) = self
            .match_idx
            .checked_add_signed(delta)
            .filter(|i| *i < groups.len())
        else {
            return;
        };
        let target = groups[idx];
        self.match_idx = idx;
        self.offset = target.min(self.max_offset(visible));
    }
}
