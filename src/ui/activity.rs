//! Pass/fail activity chart for the statistics window.

use accesswatch_types::{AccessStatus, StatsSnapshot};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::transactions::format_clock;

/// Chart-ready form of a statistics snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySeries {
    /// `(t, granted)` per bucket, in timeline order.
    pub granted: Vec<(f64, f64)>,
    /// `(t, denied)` per bucket, in timeline order.
    pub denied: Vec<(f64, f64)>,
    /// Horizontal extent, in epoch seconds.
    pub x_bounds: [f64; 2],
    /// Top of the vertical axis; at least 1.
    pub y_max: f64,
    /// Totals exactly as reported by the server.
    pub total_granted: u64,
    pub total_denied: u64,
}

/// Build the chart series for a snapshot.
///
/// The horizontal axis spans the reported window. When the server sends a
/// degenerate window the timeline's own extent is used instead.
pub fn activity_series(stats: &StatsSnapshot) -> ActivitySeries {
    let point = |t: i64, count: u64| (t as f64, count as f64);

    let granted = stats
        .timeline
        .iter()
        .map(|b| point(b.t, b.count(AccessStatus::Granted)))
        .collect();
    let denied = stats
        .timeline
        .iter()
        .map(|b| point(b.t, b.count(AccessStatus::Denied)))
        .collect();

    let x_bounds = if stats.window_secs() > 0 {
        [stats.since as f64, stats.now as f64]
    } else {
        match (stats.timeline.first(), stats.timeline.last()) {
            (Some(first), Some(last)) if last.t > first.t => [first.t as f64, last.t as f64],
            (Some(only), _) => [only.t as f64 - 1.0, only.t as f64 + 1.0],
            _ => [0.0, 1.0],
        }
    };

    ActivitySeries {
        granted,
        denied,
        x_bounds,
        y_max: stats.peak().max(1) as f64,
        total_granted: stats.total_for(AccessStatus::Granted),
        total_denied: stats.total_for(AccessStatus::Denied),
    }
}

/// Render the activity chart, or a placeholder while there is nothing to show.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.stats_state;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(if state.last_error.is_some() {
            app.theme.error
        } else {
            app.theme.border
        }));

    let Some(ref stats) = state.latest else {
        let (text, style) = if let Some(ref err) = state.last_error {
            (format!("No statistics: {}", err), Style::default().fg(app.theme.error))
        } else if state.is_loading() {
            ("Loading statistics...".to_string(), Style::default().fg(app.theme.pending))
        } else {
            ("Not polling".to_string(), Style::default().add_modifier(Modifier::DIM))
        };
        let paragraph = Paragraph::new(text)
            .style(style)
            .block(block.title(" Activity "));
        frame.render_widget(paragraph, area);
        return;
    };

    let series = activity_series(stats);
    let hours = stats.window_secs() as f64 / 3600.0;
    let title = Line::from(vec![
        Span::raw(format!(" Activity, last {:.0}h │ ", hours)),
        Span::styled(
            format!("{} granted", series.total_granted),
            Style::default().fg(app.theme.granted),
        ),
        Span::raw(" · "),
        Span::styled(
            format!("{} denied", series.total_denied),
            Style::default().fg(app.theme.denied),
        ),
        Span::raw(" "),
    ]);

    let datasets = vec![
        Dataset::default()
            .name("granted")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(app.theme.granted))
            .data(&series.granted),
        Dataset::default()
            .name("denied")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(app.theme.denied))
            .data(&series.denied),
    ];

    let [x_min, x_max] = series.x_bounds;
    let x_labels = vec![
        Span::raw(format_clock(x_min as i64, app.utc)),
        Span::raw(format_clock(x_max as i64, app.utc)),
    ];
    let y_labels = vec![Span::raw("0"), Span::raw(format!("{:.0}", series.y_max))];

    let chart = Chart::new(datasets)
        .block(block.title(title))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds(series.x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, series.y_max])
                .labels(y_labels),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use accesswatch_types::Bucket;

    use super::*;

    fn snapshot(total: &[(AccessStatus, u64)], timeline: Vec<Bucket>) -> StatsSnapshot {
        StatsSnapshot {
            since: 1_234_567_890,
            now: 1_234_571_490,
            total: total.iter().copied().collect::<BTreeMap<_, _>>(),
            timeline,
        }
    }

    #[test]
    fn test_series_follows_timeline() {
        let stats = snapshot(
            &[(AccessStatus::Granted, 10), (AccessStatus::Denied, 5)],
            vec![
                Bucket {
                    t: 1_234_567_890,
                    granted: 5,
                    denied: 2,
                },
                Bucket {
                    t: 1_234_571_490,
                    granted: 5,
                    denied: 3,
                },
            ],
        );
        let series = activity_series(&stats);

        assert_eq!(series.granted, vec![(1_234_567_890.0, 5.0), (1_234_571_490.0, 5.0)]);
        assert_eq!(series.denied, vec![(1_234_567_890.0, 2.0), (1_234_571_490.0, 3.0)]);
        assert_eq!(series.x_bounds, [1_234_567_890.0, 1_234_571_490.0]);
        assert_eq!(series.y_max, 5.0);
        assert_eq!(series.total_granted, 10);
        assert_eq!(series.total_denied, 5);
    }

    #[test]
    fn test_totals_not_recomputed() {
        let stats = snapshot(
            &[(AccessStatus::Granted, 99)],
            vec![Bucket {
                t: 1_234_567_890,
                granted: 1,
                denied: 0,
            }],
        );
        let series = activity_series(&stats);
        assert_eq!(series.total_granted, 99);
        assert_eq!(series.total_denied, 0);
    }

    #[test]
    fn test_extreme_window_bounds() {
        let mut stats = snapshot(&[], Vec::new());
        stats.since = -9_000_000_000_000_000_000;
        stats.now = 9_000_000_000_000_000_000;
        let series = activity_series(&stats);
        assert_eq!(series.x_bounds, [-9e18, 9e18]);
    }

    #[test]
    fn test_empty_window() {
        let mut stats = snapshot(&[], Vec::new());
        stats.now = stats.since;
        let series = activity_series(&stats);
        assert!(series.granted.is_empty());
        assert_eq!(series.x_bounds, [0.0, 1.0]);
        assert_eq!(series.y_max, 1.0);
    }
}
