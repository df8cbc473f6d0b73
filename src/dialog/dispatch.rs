use super::DialogOutcome;
use crate::input::typed_char;
use crate::task::Task;
use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTarget {
    pub repo: String,
    pub workflow_file: String,
    pub git_ref: String,
}

/// Confirms a `workflow_dispatch` of one file on one ref.
#[derive(Debug, Default)]
pub struct DispatchConfirm {
    target: Option<DispatchTarget>,
}

impl DispatchConfirm {
    pub fn open(&mut self, target: DispatchTarget) {
        self.target = Some(target);
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&DispatchTarget> {
        self.target.as_ref()
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> DialogOutcome {
        let cancel = key.code == KeyCode::Esc || typed_char(key) == Some('q');
        let confirm = typed_char(key) == Some('y');
        if !cancel && !confirm {
            return DialogOutcome::Pending;
        }
        match self.target.take() {
            Some(t) if confirm => DialogOutcome::Confirmed {
                task: Task::Dispatch {
                    repo: t.repo,
                    workflow_file: t.workflow_file,
                    git_ref: t.git_ref,
                },
                status: "dispatching...".to_string(),
            },
            _ => DialogOutcome::Cancelled,
        }
    }
}
