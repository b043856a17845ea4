//! Common UI components shared across views.
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
use crate::duration::format_age;
use crate::source::{Phase, PollState};
use crate::ui::Theme;

/// Health of one feed as shown in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedHealth {
    /// Last fetch succeeded.
    Ok,
    /// Still waiting for the first response.
    Loading,
    /// Last fetch failed; any data on screen is stale.
    Failing,
    /// Not polling.
    Stopped,
}

impl FeedHealth {
    /// Classify a feed's state.
    pub fn of<T>(state: &PollState<T>) -> Self {
        match state.phase {
            Phase::Idle | Phase::Stopped => FeedHealth::Stopped,
            Phase::Running if state.last_error.is_some() => FeedHealth::Failing,
            Phase::Running if state.latest.is_none() => FeedHealth::Loading,
            Phase::Running => FeedHealth::Ok,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeedHealth::Ok => "ok",
            FeedHealth::Loading => "loading",
            FeedHealth::Failing => "error",
            FeedHealth::Stopped => "stopped",
        }
    }

    fn style(self, theme: &Theme) -> Style {
        match self {
            FeedHealth::Ok => Style::default().fg(theme.granted),
            FeedHealth::Loading => Style::default().fg(theme.pending),
            FeedHealth::Failing => Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            FeedHealth::Stopped => Style::default().add_modifier(Modifier::DIM),
        }
    }
}

fn feed_spans<T>(name: &'static str, state: &PollState<T>, theme: &Theme) -> Vec<Span<'static>> {
    let health = FeedHealth::of(state);
    vec![
        Span::styled("● ", health.style(theme)),
        Span::raw(format!("{} ", name)),
        Span::styled(health.label(), health.style(theme)),
    ]
}

/// Render the header bar with per-feed health.
///
/// Displays: backend URL, a status indicator for each feed.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" ACCESSWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("{} │ ", app.source_description())),
    ];
    spans.extend(feed_spans("events", &app.transactions_state, &app.theme));
    spans.push(Span::raw(" │ "));
    spans.extend(feed_spans("stats", &app.stats_state, &app.theme));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn age<T>(state: &PollState<T>) -> String {
    state
        .last_success
        .map(|t| format_age(t.elapsed()))
        .map(|a| format!("{} ago", a))
        .unwrap_or_else(|| "never".to_string())
}

/// Text of the status bar when no temporary message is showing.
pub fn status_line(app: &App) -> String {
    let mut parts = vec![
        format!("events {}", age(&app.transactions_state)),
        format!("stats {}", age(&app.stats_state)),
    ];
    if let Some(ref err) = app.transactions_state.last_error {
        parts.push(format!("Error: {}", err));
    }
    if let Some(ref err) = app.stats_state.last_error {
        parts.push(format!("Error: {}", err));
    }
    parts.push("r:refresh R:restart e:export ?:help q:quit".to_string());
    format!(" {}", parts.join(" | "))
}

/// Render the status bar at the bottom.
///
/// Shows: time since each feed last updated, current errors, controls.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let failing =
        app.transactions_state.last_error.is_some() || app.stats_state.last_error.is_some();
    let style = if failing {
        Style::default().fg(app.theme.error)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    frame.render_widget(Paragraph::new(status_line(app)).style(style), area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ↑/↓ j/k     Move selection"),
        Line::from("  PgUp/PgDn   Jump 10 rows"),
        Line::from("  Home/End    Newest/oldest"),
        Line::from(""),
        section(" Polling"),
        Line::from("  r           Fetch now"),
        Line::from("  R           Restart polling"),
        Line::from(""),
        section(" General"),
        Line::from("  e           Export to JSON"),
        Line::from("  ?           Toggle help"),
        Line::from("  q           Quit"),
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

    // Center the help overlay - responsive to terminal size
    let help_width = 38u16.min(area.width.saturating_sub(4));
    let help_height = 20u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
