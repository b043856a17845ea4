//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use accesswatch_types::AccessStatus;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for granted reads.
    pub granted: Color,
    /// Color for denied reads.
    pub denied: Color,
    /// Color for a source whose last fetch failed.
    pub error: Color,
    /// Color for a source that has not answered yet.
    pub pending: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            granted: Color::Green,
            denied: Color::Red,
            error: Color::LightRed,
            pending: Color::Yellow,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            granted: Color::Green,
            denied: Color::Red,
            error: Color::Red,
            pending: Color::Magenta,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
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

    /// Color for an access outcome.
    pub fn status_color(&self, status: AccessStatus) -> Color {
        match status {
            AccessStatus::Granted => self.granted,
            AccessStatus::Denied => self.denied,
        }
    }

    /// Get style for an access outcome
    pub fn status_style(&self, status: AccessStatus) -> Style {
        match status {
            AccessStatus::Granted => Style::default().fg(self.granted),
            AccessStatus::Denied => Style::default().fg(self.denied).add_modifier(Modifier::BOLD),
        }
    }
}
