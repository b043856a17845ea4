//! Recent events table.
//!
//! Rows are shown in exactly the order the server returned them, most
//! recent first. No sorting or filtering happens here.

use accesswatch_types::{AccessStatus, Event};
use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;

/// Display form of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRow {
    pub id: String,
    pub time: String,
    pub uid: String,
    pub status: AccessStatus,
}

/// Map events to table rows, preserving order.
pub fn transaction_rows(events: &[Event], utc: bool) -> Vec<TransactionRow> {
    events
        .iter()
        .map(|e| TransactionRow {
            id: e.id.clone(),
            time: format_timestamp(e.timestamp, utc),
            uid: e.uid.clone(),
            status: e.status,
        })
        .collect()
}

/// Format epoch seconds as `YYYY-MM-DD HH:MM:SS`.
///
/// Timestamps chrono cannot represent are shown as the raw number.
pub fn format_timestamp(secs: i64, utc: bool) -> String {
    format_with(secs, utc, "%Y-%m-%d %H:%M:%S")
}

/// Format epoch seconds as `HH:MM`, for axis labels.
pub fn format_clock(secs: i64, utc: bool) -> String {
    format_with(secs, utc, "%H:%M")
}

fn format_with(secs: i64, utc: bool, fmt: &str) -> String {
    let Some(dt) = DateTime::<Utc>::from_timestamp(secs, 0) else {
        return secs.to_string();
    };
    if utc {
        dt.format(fmt).to_string()
    } else {
        dt.with_timezone(&Local).format(fmt).to_string()
    }
}

/// Render the events table, or a placeholder while there is nothing to show.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.transactions_state;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let Some(ref events) = state.latest else {
        let (text, style) = if let Some(ref err) = state.last_error {
            (format!("No events: {}", err), Style::default().fg(app.theme.error))
        } else if state.is_loading() {
            ("Loading events...".to_string(), Style::default().fg(app.theme.pending))
        } else {
            ("Not polling".to_string(), Style::default().add_modifier(Modifier::DIM))
        };
        let paragraph = Paragraph::new(text)
            .style(style)
            .block(block.title(" Recent events "));
        frame.render_widget(paragraph, area);
        return;
    };

    let header = Row::new(vec!["Time", "Badge UID", "Status", "ID"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = transaction_rows(events, app.utc)
        .into_iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.time),
                Cell::from(r.uid),
                Cell::from(r.status.as_str()).style(app.theme.status_style(r.status)),
                Cell::from(r.id).style(Style::default().add_modifier(Modifier::DIM)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(19),
        Constraint::Fill(2),
        Constraint::Length(8),
        Constraint::Fill(1),
    ];

    let selected = app.selected_row.min(events.len().saturating_sub(1));
    let position_info = if events.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, events.len())
    };
    let zone = if app.utc { "UTC" } else { "local" };
    let title = format!(" Recent events ({}){} ", zone, position_info);

    // Keep showing the last good list, flag the failed poll in the border
    let block = if state.last_error.is_some() {
        block
            .title(title)
            .border_style(Style::default().fg(app.theme.error))
    } else {
        block.title(title)
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut table_state = TableState::default();
    if !events.is_empty() {
        table_state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut table_state);
}
