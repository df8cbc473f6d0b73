//! Modal dialogs opened from the dashboard. At most one is active at a time.

pub mod branch_picker;
pub mod dispatch;
pub mod rerun;

pub use branch_picker::{BranchPicker, PickerOutcome};
pub use dispatch::{DispatchConfirm, DispatchTarget};
pub use rerun::{RerunConfirm, RerunTarget};

use crate::task::Task;

/// Result of feeding a key to a confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    /// Key ignored, dialog still open.
    Pending,
    Cancelled,
    Confirmed { task: Task, status: String },
}
