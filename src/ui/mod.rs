//! Terminal rendering: static tables and the live node dashboard.

pub mod common;
pub mod dashboard;
pub mod table;
pub mod theme;

pub use dashboard::DashboardCells;
pub use table::{InlinePrinter, TableView};
pub use theme::Theme;
