use crate::dashboard::Dashboard;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn hint_line(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (key, desc) in hints {
        spans.push(Span::styled(
            key.to_string(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {desc}  "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn render_box(f: &mut Frame, title: String, message: String, hints: &[(&str, &str)]) {
    let area = centered(f.area(), 56, 7);
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(title)
        .title_bottom(hint_line(hints).centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let message = Line::from(Span::styled(message, Style::default().fg(Color::White)));
    let paragraph = Paragraph::new(vec![Line::from(""), message, Line::from("")])
        .block(block)
        .centered();
    f.render_widget(paragraph, area);
}

/// Draws the rerun or dispatch confirmation if one is open.
pub fn render(f: &mut Frame, dashboard: &Dashboard) {
    if let Some(t) = dashboard.rerun_dialog().target() {
        render_box(
            f,
            format!(" Re-run #{} ", t.run_number),
            format!("re-run #{} in {}?", t.run_number, t.repo),
            dashboard.rerun_dialog().hints(),
        );
    } else if let Some(t) = dashboard.dispatch_dialog().target() {
        render_box(
            f,
            " Dispatch ".to_string(),
            format!("dispatch {} on {}?", t.workflow_file, t.git_ref),
            &[("y", "dispatch"), ("esc", "cancel")],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_fits_small_areas() {
        let r = centered(Rect::new(0, 0, 30, 5), 56, 7);
        assert_eq!(r, Rect::new(0, 0, 30, 5));
        let r = centered(Rect::new(0, 0, 100, 21), 56, 7);
        assert_eq!(r, Rect::new(22, 7, 56, 7));
    }
}
