use crate::input::typed_char;
use crossterm::event::{KeyCode, KeyEvent};

/// Suggestions rendered below the input line.
pub const MAX_SUGGESTIONS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutcome {
    Pending,
    Dismissed,
    Picked(String),
}

/// Type-to-filter branch selector.
#[derive(Debug, Default)]
pub struct BranchPicker {
    active: bool,
    branches: Vec<String>,
    query: String,
    cursor: usize,
}

impl BranchPicker {
    pub fn open(&mut self, branches: &[String]) {
        self.active = true;
        self.branches = branches.to_vec();
        self.query.clear();
        self.cursor = 0;
    }

    pub fn close(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Branches containing the query, case-insensitively, in list order.
    pub fn suggestions(&self) -> Vec<&str> {
        let q = self.query.to_lowercase();
        self.branches
            .iter()
            .filter(|b| b.to_lowercase().contains(&q))
            .map(String::as_str)
            .collect()
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> PickerOutcome {
        match key.code {
            KeyCode::Esc => {
                self.close();
                PickerOutcome::Dismissed
            }
            KeyCode::Enter => {
                let picked = {
                    let suggestions = self.suggestions();
                    suggestions
                        .get(self.cursor.min(suggestions.len().saturating_sub(1)))
                        .map(|s| (*s).to_string())
                };
                self.close();
                picked.map_or(PickerOutcome::Dismissed, PickerOutcome::Picked)
            }
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                PickerOutcome::Pending
            }
            KeyCode::Down => {
                let last = self.suggestions().len().saturating_sub(1);
                self.cursor = (self.cursor + 1).min(last);
                PickerOutcome::Pending
            }
            KeyCode::Backspace => {
                if self.query.pop().is_some() {
                    self.cursor = 0;
                }
                PickerOutcome::Pending
            }
            _ => {
                if let Some(c) = typed_char(key) {
                    self.query.push(c);
                    self.cursor = 0;
                }
                PickerOutcome::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::tests::{char_key, press};

    fn branches() -> Vec<String> {
        ["main", "feature/login", "feature/Logout", "release/1.0"]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    fn open_picker() -> BranchPicker {
        let mut p = BranchPicker::default();
        p.open(&branches());
        p
    }

    fn type_str(p: &mut BranchPicker, s: &str) {
        for c in s.chars() {
            assert_eq!(p.handle_key(&char_key(c)), PickerOutcome::Pending);
        }
    }

    #[test]
    fn open_resets_query_and_cursor() {
        let mut p = open_picker();
        type_str(&mut p, "fea");
        p.handle_key(&press(KeyCode::Down));
        p.close();
        p.open(&branches());
        assert!(p.is_active());
        assert_eq!(p.query(), "");
        assert_eq!(p.cursor(), 0);
        assert_eq!(p.suggestions().len(), 4);
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let mut p = open_picker();
        type_str(&mut p, "LOG");
        assert_eq!(p.suggestions(), vec!["feature/login", "feature/Logout"]);
    }

    #[test]
    fn cursor_clamped_to_suggestions() {
        let mut p = open_picker();
        type_str(&mut p, "feature");
        for _ in 0..5 {
            p.handle_key(&press(KeyCode::Down));
        }
        assert_eq!(p.cursor(), 1);
        for _ in 0..5 {
            p.handle_key(&press(KeyCode::Up));
        }
        assert_eq!(p.cursor(), 0);
    }

    #[test]
    fn typing_resets_cursor() {
        let mut p = open_picker();
        p.handle_key(&press(KeyCode::Down));
        p.handle_key(&press(KeyCode::Down));
        type_str(&mut p, "e");
        assert_eq!(p.cursor(), 0);
    }

    #[test]
    fn enter_picks_highlighted() {
        let mut p = open_picker();
        type_str(&mut p, "feature");
        p.handle_key(&press(KeyCode::Down));
        assert_eq!(
            p.handle_key(&press(KeyCode::Enter)),
            PickerOutcome::Picked("feature/Logout".to_string())
        );
        assert!(!p.is_active());
    }

    #[test]
    fn enter_with_overrun_cursor_picks_last() {
        let mut p = open_picker();
        p.handle_key(&press(KeyCode::Down));
        p.handle_key(&press(KeyCode::Down));
        p.handle_key(&press(KeyCode::Down));
        // Shrink the list under the cursor without typing, which would reset it.
        p.query.push_str("main");
        assert_eq!(
            p.handle_key(&press(KeyCode::Enter)),
            PickerOutcome::Picked("main".to_string())
        );
    }

    #[test]
    fn enter_with_no_suggestions_dismisses() {
        let mut p = open_picker();
        type_str(&mut p, "zzz");
        assert_eq!(p.handle_key(&press(KeyCode::Enter)), PickerOutcome::Dismissed);
        assert!(!p.is_active());
    }

    #[test]
    fn escape_dismisses() {
        let mut p = open_picker();
        assert_eq!(p.handle_key(&press(KeyCode::Esc)), PickerOutcome::Dismissed);
        assert!(!p.is_active());
    }

    #[test]
    fn backspace_edits_query() {
        let mut p = open_picker();
        type_str(&mut p, "rel");
        p.handle_key(&press(KeyCode::Backspace));
        assert_eq!(p.query(), "re");
    }
}
