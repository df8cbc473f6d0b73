use crate::app::{App, Screen};
use crate::tui::{confirm, dashboard, help, log_view, spinner};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

fn render_title(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            format!(" gh-ci v{}+{} ", env!("CARGO_PKG_VERSION"), env!("BUILD_NUMBER")),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(
            app.config().repos.join(", "),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", app.dashboard().selected_branch()),
            Style::default().fg(Color::Yellow),
        ),
    ];

    if app.screen() == Screen::Logs {
        spans.push(Span::styled(" │ logs", Style::default().fg(Color::DarkGray)));
    }

    let runs = app.dashboard().runs();
    if runs.is_fetching() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            spinner::frame(app.tick_count()).to_string(),
            Style::default().fg(Color::Yellow),
        ));
    }
    if runs.error().is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Title row, screen body, then status and help rows. The log screen shares
/// one bottom row between status and help so its overhead stays at four rows.
pub fn render(f: &mut Frame, app: &App) {
    if app.screen() == Screen::Logs {
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());
        render_title(f, chunks[0], app);
        log_view::render(f, chunks[1], app.log_viewer());
        if app.status().is_some() {
            help::render_status(f, chunks[2], app);
        } else {
            help::render(f, chunks[2], app);
        }
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(f.area());

    render_title(f, chunks[0], app);
    if app.is_loading() {
        let msg = spinner::label(app.tick_count(), "loading workflow runs...");
        f.render_widget(
            Paragraph::new(Span::styled(msg, Style::default().fg(Color::DarkGray))),
            chunks[1],
        );
    } else {
        dashboard::render(f, chunks[1], app.dashboard(), app.tick_count());
        confirm::render(f, app.dashboard());
    }
    help::render_status(f, chunks[2], app);
    help::render(f, chunks[3], app);
}
