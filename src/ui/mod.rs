//! Terminal rendering.
//!
//! The pure bindings ([`transaction_rows`], [`activity_series`]) turn the
//! latest feed data into display structures; the `render` functions draw
//! them with ratatui.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

pub mod activity;
pub mod common;
pub mod theme;
pub mod transactions;

pub use activity::{activity_series, ActivitySeries};
pub use theme::Theme;
pub use transactions::{format_timestamp, transaction_rows, TransactionRow};

// Minimum terminal size for usable display
const MIN_WIDTH: u16 = 60;
const MIN_HEIGHT: u16 = 16;

/// Draw the whole screen.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(
            0,
            (area.height / 2).saturating_sub(2),
            area.width,
            5.min(area.height),
        );
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1),      // Header bar
        Constraint::Percentage(40), // Activity chart
        Constraint::Min(6),         // Events table
        Constraint::Length(1),      // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    activity::render(frame, app, chunks[1]);
    transactions::render(frame, app, chunks[2]);
    common::render_status_bar(frame, app, chunks[3]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}
