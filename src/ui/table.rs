//! Static table rendering.
//!
//! [`TableView`] collects the rows a [`TableConfig`](crate::builder::TableConfig)
//! lays out and draws them as a bordered ratatui table. [`InlinePrinter`]
//! prints finished tables into the normal terminal scrollback, above the
//! shell prompt.

use std::io;

use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Text},
    widgets::{Block, Borders, Cell, Row, Table, Widget},
    Terminal, TerminalOptions, Viewport,
};

use crate::error::SurfaceError;
use crate::surface::{TableRow, TableSurface};
use crate::ui::theme::Theme;

/// Space between columns.
const COLUMN_SPACING: u16 = 2;

/// A table held in memory until drawn.
#[derive(Debug, Clone, Default)]
pub struct TableView {
    title: String,
    widths: Vec<u16>,
    rows: Vec<TableRow>,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    fn row_height(row: &TableRow) -> u16 {
        match row {
            TableRow::Header(captions) => captions
                .iter()
                .map(|caption| caption.lines().count() as u16)
                .max()
                .unwrap_or(1)
                .max(1),
            TableRow::Values(_) | TableRow::Separator => 1,
        }
    }

    /// Lines needed to draw the whole table, borders included.
    pub fn height(&self) -> u16 {
        self.rows.iter().map(Self::row_height).sum::<u16>() + 2
    }

    /// Columns needed to draw the whole table, borders included.
    pub fn width(&self) -> u16 {
        let columns: u16 = self.widths.iter().sum();
        let gaps = COLUMN_SPACING * self.widths.len().saturating_sub(1) as u16;
        let title = self.title.chars().count() as u16 + 4;
        (columns + gaps + 2).max(title)
    }

    /// Draw into a buffer region.
    pub fn draw(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let rows = self.rows.iter().map(|row| {
            let height = Self::row_height(row);
            match row {
                TableRow::Header(captions) => Row::new(
                    captions
                        .iter()
                        .map(|caption| Cell::from(Text::from(caption.as_str()))),
                )
                .height(height)
                .style(theme.header),
                TableRow::Values(values) => Row::new(values.iter().map(|value| {
                    let style = theme.symbol_style(value).unwrap_or(theme.row);
                    Cell::from(value.as_str()).style(style)
                })),
                TableRow::Separator => Row::new(
                    self.widths
                        .iter()
                        .map(|width| Cell::from("─".repeat(*width as usize))),
                )
                .style(Style::default().fg(theme.border)),
            }
        });

        let block = Block::default()
            .title(Line::styled(format!(" {} ", self.title), theme.header))
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.border));

        Table::new(rows, self.widths.iter().map(|w| Constraint::Length(*w)))
            .column_spacing(COLUMN_SPACING)
            .block(block)
            .render(area, buf);
    }
}

impl TableSurface for TableView {
    fn set_columns(&mut self, title: &str, widths: &[u16]) -> Result<(), SurfaceError> {
        self.title = title.to_string();
        self.widths = widths.to_vec();
        self.rows.clear();
        Ok(())
    }

    fn append_row(&mut self, row: TableRow) -> Result<(), SurfaceError> {
        self.rows.push(row);
        Ok(())
    }

    /// Rows stay buffered; see [`TableView::draw`].
    fn render(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// Prints each rendered table into the terminal scrollback.
pub struct InlinePrinter {
    view: TableView,
    theme: Theme,
}

impl InlinePrinter {
    pub fn new(theme: Theme) -> Self {
        Self {
            view: TableView::new(),
            theme,
        }
    }
}

impl TableSurface for InlinePrinter {
    fn set_columns(&mut self, title: &str, widths: &[u16]) -> Result<(), SurfaceError> {
        self.view.set_columns(title, widths)
    }

    fn append_row(&mut self, row: TableRow) -> Result<(), SurfaceError> {
        self.view.append_row(row)
    }

    fn render(&mut self) -> Result<(), SurfaceError> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Inline(1),
            },
        )?;

        let height = self.view.height();
        let width = self.view.width();
        let view = &self.view;
        let theme = &self.theme;
        terminal.insert_before(height, |buf| {
            let area = Rect {
                width: width.min(buf.area.width),
                ..buf.area
            };
            view.draw(area, buf, theme);
        })?;
        terminal.clear()?;
        Ok(())
    }
}
