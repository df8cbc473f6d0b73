use super::DialogOutcome;
use crate::input::typed_char;
use crate::task::Task;
use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerunTarget {
    pub repo: String,
    pub run_id: u64,
    pub run_number: u64,
}

/// `y` normal rerun, `d` rerun with debug logging, `f` failed jobs only.
#[derive(Debug, Default)]
pub struct RerunConfirm {
    target: Option<RerunTarget>,
}

impl RerunConfirm {
    pub fn open(&mut self, target: RerunTarget) {
        self.target = Some(target);
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&RerunTarget> {
        self.target.as_ref()
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> DialogOutcome {
        if key.code == KeyCode::Esc {
            self.target = None;
            return DialogOutcome::Cancelled;
        }
        let Some(c) = typed_char(key) else {
            return DialogOutcome::Pending;
        };
        if !matches!(c, 'y' | 'd' | 'f' | 'q') {
            return DialogOutcome::Pending;
        }
        let Some(RerunTarget { repo, run_id, .. }) = self.target.take() else {
            return DialogOutcome::Cancelled;
        };
        match c {
            'y' => DialogOutcome::Confirmed {
                task: Task::Rerun { repo, run_id, debug: false },
                status: "re-running...".to_string(),
            },
            'd' => DialogOutcome::Confirmed {
                task: Task::Rerun { repo, run_id, debug: true },
                status: "re-running with debug...".to_string(),
            },
            'f' => DialogOutcome::Confirmed {
                task: Task::RerunFailed { repo, run_id },
                status: "re-running failed jobs...".to_string(),
            },
            _ => DialogOutcome::Cancelled,
        }
    }

    pub fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("y", "normal"), ("d", "debug logs"), ("f", "failed jobs"), ("esc", "cancel")]
    }
}
