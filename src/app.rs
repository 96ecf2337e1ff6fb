//! Dashboard application state.

use std::sync::Arc;

use crate::ui::dashboard::DashboardCells;
use crate::ui::theme::Theme;

/// State of the live dashboard.
///
/// Metric values are not stored here; they live in the shared
/// [`DashboardCells`] the refresh loop writes into.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub theme: Theme,
    pub cells: Arc<DashboardCells>,
    /// Host shown in the header.
    pub host_label: String,
    /// Refresh cadence shown in the status bar.
    pub refresh_description: String,
}

impl App {
    pub fn new(cells: Arc<DashboardCells>, host_label: String, theme: Theme) -> Self {
        Self {
            running: true,
            show_help: false,
            theme,
            cells,
            host_label,
            refresh_description: String::new(),
        }
    }

    pub fn with_refresh_description(mut self, description: String) -> Self {
        self.refresh_description = description;
        self
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Stop the UI loop. The caller tears the cells down.
    pub fn quit(&mut self) {
        self.running = false;
    }
}
