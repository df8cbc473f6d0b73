//! The three dashboard panels: WORKFLOWS, RUNS and DETAIL.

use crate::dashboard::{Dashboard, Panel, WORKFLOW_ALL};
use crate::fetchable::LoadState;
use crate::model::{format_duration, truncate, Job, Run};
use crate::tui::spinner;
use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

fn panel_block(title: &'static str, active: bool) -> Block<'static> {
    let color = if active { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn selected_style(active: bool) -> Style {
    if active {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    }
}

fn icon_color(icon: &str) -> Color {
    match icon {
        "✓" => Color::Green,
        "✗" => Color::Red,
        "●" => Color::Yellow,
        "◷" | "○" | "⚇" => Color::Blue,
        _ => Color::DarkGray,
    }
}

pub fn render(f: &mut Frame, area: Rect, dashboard: &Dashboard, tick: usize) {
    let chunks = Layout::horizontal([
        Constraint::Percentage(22),
        Constraint::Percentage(48),
        Constraint::Percentage(30),
    ])
    .split(area);

    render_workflows(f, chunks[0], dashboard);
    render_runs(f, chunks[1], dashboard);
    render_detail(f, chunks[2], dashboard, tick);
}

fn render_workflows(f: &mut Frame, area: Rect, d: &Dashboard) {
    let active = d.panel() == Panel::Workflows;
    let block = panel_block("WORKFLOWS", active);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = usize::from(inner.width);
    let mut lines: Vec<Line> = Vec::new();

    let picker = d.branch_picker();
    if picker.is_active() {
        lines.push(Line::from(vec![
            Span::styled("⎇ ", Style::default().fg(Color::Yellow)),
            Span::raw(picker.query().to_string()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ]));
        for (i, name) in picker.suggestions().into_iter().enumerate() {
            let style = if i == picker.cursor() {
                selected_style(true)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(Span::styled(
                format!("  {}", truncate(name, width.saturating_sub(2))),
                style,
            )));
        }
    } else {
        let style = if d.workflow_cursor() == 0 {
            selected_style(active)
        } else {
            Style::default().fg(Color::Yellow)
        };
        lines.push(Line::from(Span::styled(
            format!("⎇ {}", truncate(d.selected_branch(), width.saturating_sub(2))),
            style,
        )));
    }
    lines.push(Line::from(""));

    for (i, name) in d.workflows().iter().enumerate() {
        let label = if name == WORKFLOW_ALL {
            "all".to_string()
        } else {
            truncate(name, width.saturating_sub(2))
        };
        let style = if d.workflow_cursor() == i + 1 {
            selected_style(active)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!("  {label}"), style)));
    }

    let file = d
        .selected_workflow()
        .filter(|w| *w != WORKFLOW_ALL)
        .and_then(|w| d.workflow_file(w));
    let list_height = if file.is_some() {
        inner.height.saturating_sub(1)
    } else {
        inner.height
    };
    f.render_widget(
        Paragraph::new(lines),
        Rect::new(inner.x, inner.y, inner.width, list_height),
    );

    if let Some(file) = file {
        let footer = Rect::new(inner.x, inner.y + list_height, inner.width, 1);
        f.render_widget(
            Paragraph::new(Span::styled(
                truncate(file, width),
                Style::default().fg(Color::DarkGray),
            )),
            footer,
        );
    }
}

fn run_row(run: &Run, now: DateTime<Utc>, name_width: usize) -> Row<'static> {
    let icon = run.icon();
    Row::new(vec![
        Cell::from(run.created_at.format("%m-%d %H:%M").to_string()),
        Cell::from(truncate(run.workflow_file(), 16)),
        Cell::from(truncate(&run.display_title, name_width)),
        Cell::from(format!("#{}", run.run_number)),
        Cell::from(format_duration(run.duration_secs(now))),
        Cell::from(Span::styled(icon, Style::default().fg(icon_color(icon)))),
    ])
}

fn render_runs(f: &mut Frame, area: Rect, d: &Dashboard) {
    let active = d.panel() == Panel::Runs;
    let block = panel_block("RUNS", active);

    if d.visible_count() == 0 {
        let msg = match d.runs().state() {
            LoadState::Error => d.runs().error().unwrap_or("error").to_string(),
            _ => format!("no runs on {}", d.selected_branch()),
        };
        f.render_widget(
            Paragraph::new(Span::styled(msg, Style::default().fg(Color::DarkGray))).block(block),
            area,
        );
        return;
    }

    let now = Utc::now();
    let widths = [
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Min(8),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(2),
    ];
    // Fixed columns plus spacing take 53 cells; the name gets the rest.
    let name_width = usize::from(area.width.saturating_sub(2 + 53)).max(8);
    let header = Row::new(["DISPATCHED (UTC)", "FILE", "NAME", "RUN", "TIME", "OK"])
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = d
        .visible_runs()
        .map(|run| run_row(run, now, name_width))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(selected_style(active));
    let mut state = TableState::default().with_selected(Some(d.run_cursor()));
    f.render_stateful_widget(table, area, &mut state);
}

fn job_line(job: &Job, now: DateTime<Utc>, selected: bool, active: bool, width: usize) -> Line<'static> {
    let icon = job.icon();
    let (done, total) = job.step_progress();
    let duration = job.duration_secs(now).map(format_duration).unwrap_or_default();
    let suffix = format!(" {done}/{total} {duration}");
    let name = truncate(&job.name, width.saturating_sub(suffix.len() + 2));
    let style = if selected {
        selected_style(active)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{icon} "), Style::default().fg(icon_color(icon))),
        Span::styled(name, style),
        Span::styled(suffix, Style::default().fg(Color::DarkGray)),
    ])
}

fn render_detail(f: &mut Frame, area: Rect, d: &Dashboard, tick: usize) {
    let active = d.panel() == Panel::Detail;
    let block = panel_block("DETAIL", active);
    let width = usize::from(area.width.saturating_sub(2));

    let Some(run) = d.selected_run() else {
        f.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let now = Utc::now();
    let label = Style::default().fg(Color::DarkGray);
    let sha: String = run.head_sha.chars().take(8).collect();
    let mut lines = vec![
        Line::from(Span::styled(
            truncate(&format!("[#{}] {}", run.run_number, run.display_title), width),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![Span::styled("repo    ", label), Span::raw(run.repo().to_string())]),
        Line::from(vec![Span::styled("branch  ", label), Span::raw(run.head_branch.clone())]),
        Line::from(vec![Span::styled("commit  ", label), Span::raw(sha)]),
        Line::from(vec![
            Span::styled("status  ", label),
            Span::styled(
                format!("{} {}", run.icon(), run.status_label()),
                Style::default().fg(icon_color(run.icon())),
            ),
            Span::styled(format!(" ({})", format_duration(run.duration_secs(now))), label),
        ]),
        Line::from(""),
    ];

    let jobs = d.jobs();
    if jobs.get().is_empty() {
        let msg = match (jobs.is_fetching(), jobs.error()) {
            (true, _) => spinner::label(tick, "loading jobs..."),
            (false, Some(e)) => format!("error: {e}"),
            (false, None) => "no jobs".to_string(),
        };
        lines.push(Line::from(Span::styled(msg, label)));
    } else {
        lines.push(Line::from(Span::styled("JOBS", label.add_modifier(Modifier::BOLD))));
        for (i, job) in jobs.get().iter().enumerate() {
            lines.push(job_line(job, now, i == d.job_cursor(), active, width));
        }
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use crate::app::App;
    use crate::dashboard::tests::{config, make_job, make_run};
    use crate::events::AppEvent;
    use crate::task::{Completion, TaskResult};
    use crate::tui::testing::draw;

    fn loaded_app() -> App {
        let mut app = App::new(config(), Some("main".to_string()));
        let reqs = app.init();
        let follow = app.update(AppEvent::Completed(Completion {
            id: reqs[2].id,
            result: TaskResult::Runs {
                partial: false,
                result: Ok(vec![
                    make_run(1, "CI", "main", "ci.yml"),
                    make_run(2, "Deploy", "main", "deploy.yml"),
                ]),
            },
        }));
        app.update(AppEvent::Completed(Completion {
            id: follow[0].id,
            result: TaskResult::Jobs {
                run_id: 2,
                result: Ok(vec![make_job(20, 2, "build"), make_job(21, 2, "publish")]),
            },
        }));
        app
    }

    #[test]
    fn panels_and_columns_rendered() {
        let screen = draw(&loaded_app(), 160, 30);
        for needle in ["WORKFLOWS", "RUNS", "DETAIL", "DISPATCHED (UTC)", "FILE", "NAME", "TIME", "OK"] {
            assert!(screen.contains(needle), "missing {needle}\n{screen}");
        }
    }

    #[test]
    fn detail_shows_run_and_jobs() {
        let screen = draw(&loaded_app(), 160, 30);
        assert!(screen.contains("[#2] Deploy #2"), "{screen}");
        assert!(screen.contains("commit  00000000"), "{screen}");
        assert!(screen.contains("build"));
        assert!(screen.contains("publish"));
    }

    #[test]
    fn workflow_list_shows_branch_and_all() {
        let screen = draw(&loaded_app(), 160, 30);
        assert!(screen.contains("⎇ main"));
        assert!(screen.contains("all"));
        assert!(screen.contains("Deploy"));
    }
}
