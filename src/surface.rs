//! Render surfaces.
//!
//! The builder and the refresh loop write through these traits and never
//! touch the terminal directly. Implementations live in [`crate::ui`].

use crate::columns::{ColumnName, ColumnValue};
use crate::error::SurfaceError;

/// One line of a static table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    /// Column captions; may contain line breaks.
    Header(Vec<String>),
    Values(Vec<String>),
    /// Visual break between items of a multi-band table.
    Separator,
}

/// A table printed once, row by row.
pub trait TableSurface {
    /// Start a table with the given title and column widths.
    fn set_columns(&mut self, title: &str, widths: &[u16]) -> Result<(), SurfaceError>;

    fn append_row(&mut self, row: TableRow) -> Result<(), SurfaceError>;

    /// Flush the accumulated table.
    fn render(&mut self) -> Result<(), SurfaceError>;
}

/// A grid of named cells updated in place.
///
/// Writes come from the render schedule while the terminal draws from
/// another thread, so implementations synchronize internally.
pub trait CellSurface: Send + Sync {
    /// Cells the surface displays.
    fn columns(&self) -> Vec<ColumnName>;

    /// Update one cell. Fails with [`SurfaceError::Closed`] once the surface is torn down.
    fn write_cell(&self, column: ColumnName, value: &ColumnValue) -> Result<(), SurfaceError>;
}
