//! Common UI components of the dashboard.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::columns::{ColumnName, ColumnValue};
use crate::host::HostStatus;

/// Render the header bar with the host and its health.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status = match app.cells.value(ColumnName::Health) {
        ColumnValue::Status(status) => status,
        _ => HostStatus::Grey,
    };

    let epoch = app.cells.value(ColumnName::CurrentEpoch);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let accent = Style::default().fg(app.theme.highlight);

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.status_style(status)),
        Span::styled("SUIMON ", bold),
        Span::raw("│ "),
        Span::styled(app.host_label.clone(), accent),
        Span::raw(" │ "),
        Span::styled(status.symbol(), app.theme.status_style(status)),
        Span::raw(" │ epoch "),
        Span::styled(epoch.to_string(), bold),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows the refresh cadence and available controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.cells.value(ColumnName::Health).is_missing() {
        " Waiting for first fetch... | ?:help q:quit".to_string()
    } else {
        format!(" {} | ?:help q:quit", app.refresh_description)
    };

    let dim = Style::default().add_modifier(Modifier::DIM);
    frame.render_widget(Paragraph::new(status).style(dim), area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from("  ?           Toggle this help"),
        Line::from("  q / Esc     Quit"),
        Line::from("  Ctrl-C      Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Health",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(vec![
            Span::styled("  OK   ", app.theme.status_style(HostStatus::Green)),
            Span::raw("synced"),
        ]),
        Line::from(vec![
            Span::styled("  WARN ", app.theme.status_style(HostStatus::Yellow)),
            Span::raw("falling behind"),
        ]),
        Line::from(vec![
            Span::styled("  CRIT ", app.theme.status_style(HostStatus::Red)),
            Span::raw("far behind"),
        ]),
        Line::from(vec![
            Span::styled("  N/A  ", app.theme.status_style(HostStatus::Grey)),
            Span::raw("no data yet"),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 16u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::CellSurface;
    use crate::ui::dashboard::DashboardCells;
    use crate::ui::theme::Theme;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn status_bar_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 1)).unwrap();
        terminal
            .draw(|frame| render_status_bar(frame, app, frame.area()))
            .unwrap();
        let buf = terminal.backend().buffer();
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_status_bar_shows_cadence_and_controls() {
        let cells = Arc::new(DashboardCells::node());
        let app = App::new(Arc::clone(&cells), "node".to_string(), Theme::dark())
            .with_refresh_description("query 1s, render 1s".to_string());
        assert!(status_bar_text(&app).contains("Waiting for first fetch"));

        let health = ColumnValue::Status(HostStatus::Green);
        cells.write_cell(ColumnName::Health, &health).unwrap();
        let text = status_bar_text(&app);
        assert!(text.contains("query 1s, render 1s"));
        assert!(text.contains("?:help q:quit"));
    }
}
