use crate::logviewer::{visible_lines, LogViewer, ViewMode};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

/// `a-b / total` for the rows currently on screen.
pub fn scroll_info(offset: usize, visible: usize, total: usize) -> String {
    if total == 0 {
        return "0-0 / 0".to_string();
    }
    let first = offset + 1;
    let last = (offset + visible).min(total);
    format!("{first}-{last} / {total}")
}

fn numbered(line_no: usize, text: &str, is_match: bool) -> Line<'static> {
    let text_style = if is_match {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{line_no:>6} "), Style::default().fg(Color::DarkGray)),
        Span::styled(text.to_string(), text_style),
    ])
}

fn body_lines(viewer: &LogViewer, visible: usize) -> Vec<Line<'static>> {
    match viewer.context() {
        Some(ctx) => ctx
            .rows
            .iter()
            .skip(viewer.offset())
            .take(visible)
            .map(|row| {
                if row.is_gap() {
                    Line::from(Span::styled("     ┆", Style::default().fg(Color::DarkGray)))
                } else {
                    numbered(row.line_no, &row.text, row.is_match)
                }
            })
            .collect(),
        None => viewer
            .lines()
            .iter()
            .enumerate()
            .skip(viewer.offset())
            .take(visible)
            .map(|(i, text)| numbered(i + 1, text, false))
            .collect(),
    }
}

/// Header, scrollable body, search line. The help bar is drawn by the caller.
pub fn render(f: &mut Frame, area: Rect, viewer: &LogViewer) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .split(area);

    let visible = visible_lines(f.area().height);
    let mut header = vec![
        Span::styled(
            viewer.job_name().to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            scroll_info(viewer.offset(), visible, viewer.total_rows()),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if let Some((current, total)) = viewer.match_position() {
        header.push(Span::styled(
            format!("  [/{}  match {current}/{total}]", viewer.query()),
            Style::default().fg(Color::Yellow),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(header)), chunks[0]);

    f.render_widget(Paragraph::new(body_lines(viewer, visible)), chunks[1]);

    let search = match viewer.mode() {
        ViewMode::SearchInput => Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Cyan)),
            Span::raw(viewer.input().unwrap_or_default().to_string()),
            Span::styled("█", Style::default().fg(Color::Cyan)),
        ]),
        ViewMode::Filtered if viewer.has_no_matches() => Line::from(Span::styled(
            format!("no matches for \"{}\"", viewer.query()),
            Style::default().fg(Color::Red),
        )),
        _ => Line::from(""),
    };
    f.render_widget(Paragraph::new(search), chunks[2]);
}
