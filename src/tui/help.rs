use crate::app::{App, Screen};
use crate::input::{Binding, KeyMap};
use crate::logviewer::ViewMode;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

fn bind(b: &Binding) -> (&'static str, &'static str) {
    (b.keys, b.help)
}

/// Key hints for whatever currently receives input.
pub fn hints(app: &App) -> Vec<(&'static str, &'static str)> {
    let keys: &KeyMap = app.dashboard().keys();
    let dashboard = app.dashboard();
    match app.screen() {
        Screen::Logs => match app.log_viewer().mode() {
            ViewMode::SearchInput => vec![("↵", "apply"), ("esc", "cancel")],
            ViewMode::Filtered => vec![
                bind(&keys.up),
                bind(&keys.down),
                bind(&keys.search_next),
                bind(&keys.search_prev),
                bind(&keys.search),
                ("esc", "clear + back"),
                bind(&keys.quit),
            ],
            ViewMode::All => vec![
                bind(&keys.up),
                bind(&keys.down),
                bind(&keys.page_down),
                bind(&keys.top),
                bind(&keys.bottom),
                bind(&keys.search),
                bind(&keys.back),
                bind(&keys.quit),
            ],
        },
        Screen::Dashboard if dashboard.branch_picker().is_active() => {
            vec![("type", "filter"), ("↑/↓", "select"), ("↵", "pick"), ("esc", "cancel")]
        }
        Screen::Dashboard if dashboard.rerun_dialog().is_active() => {
            dashboard.rerun_dialog().hints().to_vec()
        }
        Screen::Dashboard if dashboard.dispatch_dialog().is_active() => {
            vec![("y", "dispatch"), ("esc", "cancel")]
        }
        Screen::Dashboard => vec![
            bind(&keys.up),
            bind(&keys.down),
            ("←/→", "panels"),
            bind(&keys.enter),
            bind(&keys.rerun),
            bind(&keys.cancel),
            bind(&keys.dispatch),
            bind(&keys.open),
            bind(&keys.refresh),
            bind(&keys.quit),
        ],
    }
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hints(app).into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            format!(" {desc}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// One-line status message; errors in red.
pub fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let Some(msg) = app.status() else {
        return;
    };
    let color = if msg.starts_with("error") {
        Color::Red
    } else {
        Color::Yellow
    };
    // Only the first line fits; the dispatch hint follows on the next one.
    let text = msg.lines().collect::<Vec<_>>().join("  ");
    f.render_widget(
        Paragraph::new(Span::styled(text, Style::default().fg(color))),
        area,
    );
}
