//! Node dashboard.
//!
//! The refresh loop writes into [`DashboardCells`] from its render schedule;
//! the terminal thread reads them on every frame.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::app::App;
use crate::columns::layout::{
    dashboard_caption, dashboard_columns, NODE_DASHBOARD, NODE_DASHBOARD_HEALTH,
};
use crate::columns::{ColumnName, ColumnValue};
use crate::error::SurfaceError;
use crate::host::HostStatus;
use crate::surface::CellSurface;

/// Current cell values of the dashboard.
#[derive(Debug)]
pub struct DashboardCells {
    columns: Vec<ColumnName>,
    values: RwLock<BTreeMap<ColumnName, ColumnValue>>,
    closed: AtomicBool,
}

impl DashboardCells {
    /// Cells for the node dashboard layout, all empty.
    pub fn node() -> Self {
        Self::with_columns(dashboard_columns())
    }

    pub fn with_columns(columns: Vec<ColumnName>) -> Self {
        let values = columns
            .iter()
            .map(|column| (*column, ColumnValue::Missing))
            .collect();
        Self {
            columns,
            values: RwLock::new(values),
            closed: AtomicBool::new(false),
        }
    }

    /// Tear the surface down; later writes fail with [`SurfaceError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn value(&self, column: ColumnName) -> ColumnValue {
        self.values
            .read()
            .get(&column)
            .cloned()
            .unwrap_or(ColumnValue::Missing)
    }
}

impl CellSurface for DashboardCells {
    fn columns(&self) -> Vec<ColumnName> {
        self.columns.clone()
    }

    fn write_cell(&self, column: ColumnName, value: &ColumnValue) -> Result<(), SurfaceError> {
        if self.is_closed() {
            return Err(SurfaceError::Closed);
        }
        self.values.write().insert(column, value.clone());
        Ok(())
    }
}

/// Draw the dashboard grid: health and the first band on top, then one row per band.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::vertical(ratios(NODE_DASHBOARD.len())).split(area);

    for (band_index, band) in NODE_DASHBOARD.iter().enumerate() {
        let mut columns: Vec<ColumnName> = band.to_vec();
        if band_index == 0 {
            columns.insert(0, NODE_DASHBOARD_HEALTH);
        }

        let row = rows[band_index];
        let cells = Layout::horizontal(ratios(columns.len())).split(row);

        for (column, cell_area) in columns.iter().zip(cells.iter()) {
            render_cell(frame, app, *column, *cell_area);
        }
    }
}

/// `count` equal shares of the available space.
fn ratios(count: usize) -> Vec<Constraint> {
    vec![Constraint::Ratio(1, count as u32); count]
}

fn render_cell(frame: &mut Frame, app: &App, column: ColumnName, area: Rect) {
    let value = app.cells.value(column);
    let title = format!(" {} ", dashboard_caption(column));
    let block = Block::default()
        .title(Line::styled(title, app.theme.header))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if let Some(pct) = value.as_percent() {
        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(app.theme.gauge))
            .percent(pct.min(100) as u16)
            .label(value.to_string());
        frame.render_widget(gauge, area);
        return;
    }

    let style = match &value {
        ColumnValue::Status(status) => app.theme.status_style(*status),
        ColumnValue::Missing => app.theme.status_style(HostStatus::Grey),
        _ => app.theme.row,
    };

    let paragraph = Paragraph::new(value.to_string())
        .style(style)
        .alignment(ratatui::layout::Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}
