//! Log search: in-order fuzzy matching and `grep -C` style context windows.

/// Lines shown above and below each match.
pub const CONTEXT_LINES: usize = 3;

/// True when every character of `query` appears in `line`, in order, ignoring case.
/// The empty query matches everything.
pub fn fuzzy_match(line: &str, query: &str) -> bool {
    let mut needle = query.chars().flat_map(char::to_lowercase).peekable();
    for c in line.chars().flat_map(char::to_lowercase) {
        match needle.peek() {
            None => return true,
            Some(&n) if n == c => {
                needle.next();
            }
            Some(_) => {}
        }
    }
    needle.peek().is_none()
}

/// One displayed row of a filtered log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRow {
    /// 1-based line number; 0 marks the gap row between groups.
    pub line_no: usize,
    pub text: String,
    pub is_match: bool,
}

impl ContextRow {
    fn gap() -> Self {
        Self {
            line_no: 0,
            text: String::new(),
            is_match: false,
        }
    }

    pub fn is_gap(&self) -> bool {
        self.line_no == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    pub rows: Vec<ContextRow>,
    /// Index into `rows` of the first row of each merged group.
    pub groups: Vec<usize>,
}

impl LogContext {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn match_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_match).count()
    }
}

/// Collects every line matching `query` with `ctx` lines of context on each side.
///
/// Windows that overlap or touch are merged into one group; separate groups are
/// divided by a single gap row.
pub fn build_log_context<S: AsRef<str>>(lines: &[S], query: &str, ctx: usize) -> LogContext {
    let matches: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| fuzzy_match(l.as_ref(), query))
        .map(|(i, _)| i)
        .collect();

    let mut out = LogContext::default();
    let Some(last_line) = lines.len().checked_sub(1) else {
        return out;
    };
    let row = |i: usize, is_match: bool| ContextRow {
        line_no: i + 1,
        text: lines[i].as_ref().to_string(),
        is_match,
    };

    let mut prev_end: Option<usize> = None;
    for m in matches {
        let start = m.saturating_sub(ctx);
        let end = (m + ctx).min(last_line);

        match prev_end {
            Some(pe) if start <= pe + 1 => {
                for i in pe + 1..=end {
                    out.rows.push(row(i, i == m));
                }
                // The match may sit inside the part already emitted.
                if let Some(r) = out.rows.iter_mut().rev().find(|r| r.line_no == m + 1) {
                    r.is_match = true;
                }
                prev_end = Some(end.max(pe));
            }
            _ => {
                if prev_end.is_some() {
                    out.rows.push(ContextRow::gap());
                }
                out.groups.push(out.rows.len());
                for i in start..=end {
                    out.rows.push(row(i, i == m));
                }
                prev_end = Some(end);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("line {i}")).collect()
    }

    // --- fuzzy_match ---

    #[test]
    fn empty_query_matches_everything() {
        assert!(fuzzy_match("", ""));
        assert!(fuzzy_match("anything at all", ""));
    }

    #[test]
    fn subsequence_in_order() {
        assert!(fuzzy_match("abc", "ac"));
        assert!(!fuzzy_match("abc", "ca"));
        assert!(!fuzzy_match("ab", "abc"));
    }

    #[test]
    fn case_insensitive() {
        assert!(fuzzy_match("Build FAILED", "failed"));
        assert!(fuzzy_match("error: oops", "ERROR"));
    }

    // --- build_log_context ---

    #[test]
    fn single_match_with_context() {
        let lines = vec!["a", "b", "needle", "d", "e"];
        let ctx = build_log_context(&lines, "needle", 1);
        assert_eq!(
            ctx.rows,
            vec![
                ContextRow { line_no: 2, text: "b".into(), is_match: false },
                ContextRow { line_no: 3, text: "needle".into(), is_match: true },
                ContextRow { line_no: 4, text: "d".into(), is_match: false },
            ]
        );
        assert_eq!(ctx.groups, vec![0]);
    }

    #[test]
    fn overlapping_windows_merge() {
        let mut lines = numbered(10);
        lines[3] = "hit".into();
        lines[5] = "hit".into();
        let ctx = build_log_context(&lines, "hit", 1);
        assert_eq!(ctx.groups, vec![0]);
        assert!(ctx.rows.iter().all(|r| !r.is_gap()));
        assert_eq!(ctx.match_count(), 2);
        let nos: Vec<usize> = ctx.rows.iter().map(|r| r.line_no).collect();
        assert_eq!(nos, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn touching_windows_merge() {
        let mut lines = numbered(10);
        lines[1] = "hit".into();
        lines[4] = "hit".into();
        // Windows [0,2] and [3,5] touch.
        let ctx = build_log_context(&lines, "hit", 1);
        assert_eq!(ctx.groups.len(), 1);
        assert_eq!(ctx.rows.len(), 6);
    }

    #[test]
    fn separate_windows_get_one_gap() {
        let mut lines = numbered(20);
        lines[2] = "hit".into();
        lines[12] = "hit".into();
        let ctx = build_log_context(&lines, "hit", 1);
        assert_eq!(ctx.groups, vec![0, 4]);
        let gaps: Vec<usize> = ctx
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_gap())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(gaps, vec![3]);
        assert!(!ctx.rows[3].is_match);
    }

    #[test]
    fn adjacent_matches_without_context() {
        let lines = vec!["x", "hit", "hit", "y"];
        let ctx = build_log_context(&lines, "hit", 0);
        assert_eq!(ctx.groups, vec![0]);
        assert_eq!(ctx.rows.len(), 2);
        assert_eq!(ctx.match_count(), 2);
    }

    #[test]
    fn windows_clamped_to_bounds() {
        let lines = vec!["hit", "b", "c", "hit"];
        let ctx = build_log_context(&lines, "hit", 5);
        let nos: Vec<usize> = ctx.rows.iter().map(|r| r.line_no).collect();
        assert_eq!(nos, vec![1, 2, 3, 4]);
        assert_eq!(ctx.match_count(), 2);
    }

    #[test]
    fn match_inside_previous_window_is_flagged() {
        // ctx 2: window of the first hit already covers line 3.
        let lines = vec!["a", "hit", "hit", "d", "e", "f"];
        let ctx = build_log_context(&lines, "hit", 2);
        let flagged: Vec<usize> = ctx.rows.iter().filter(|r| r.is_match).map(|r| r.line_no).collect();
        assert_eq!(flagged, vec![2, 3]);
    }

    #[test]
    fn no_match_is_empty() {
        let ctx = build_log_context(&numbered(5), "zzz", 3);
        assert!(ctx.is_empty());
        assert!(ctx.groups.is_empty());
    }

    #[test]
    fn empty_log() {
        let lines: Vec<String> = Vec::new();
        assert!(build_log_context(&lines, "", 3).is_empty());
    }
}
