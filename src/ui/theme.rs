//! Theme configuration for the terminal output.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::host::HostStatus;

/// Color and style theme for tables and the dashboard.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for titles and active elements.
    pub highlight: Color,
    /// Color for warning-level host status.
    pub warning: Color,
    /// Color for critical-level host status.
    pub critical: Color,
    /// Color for healthy status.
    pub healthy: Color,
    /// Color for hosts without data.
    pub unknown: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for value rows in tables.
    pub row: Style,
    /// Fill color of percentage gauges.
    pub gauge: Color,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            unknown: Color::DarkGray,
            border: Color::Gray,
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            row: Style::default().fg(Color::White),
            gauge: Color::Cyan,
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            unknown: Color::Gray,
            border: Color::DarkGray,
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            row: Style::default().fg(Color::Black),
            gauge: Color::Blue,
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a host status
    pub fn status_style(&self, status: HostStatus) -> Style {
        match status {
            HostStatus::Grey => Style::default().fg(self.unknown),
            HostStatus::Green => Style::default().fg(self.healthy),
            HostStatus::Yellow => Style::default().fg(self.warning),
            HostStatus::Red => Style::default()
                .fg(self.critical)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Style of a rendered status symbol, if the text is one.
    pub fn symbol_style(&self, text: &str) -> Option<Style> {
        [
            HostStatus::Grey,
            HostStatus::Green,
            HostStatus::Yellow,
            HostStatus::Red,
        ]
        .into_iter()
        .find(|status| status.symbol() == text)
        .map(|status| self.status_style(status))
    }
}
