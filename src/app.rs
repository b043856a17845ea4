//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use accesswatch_types::{Event, StatsSnapshot};
use anyhow::Result;
use tokio::sync::watch;

use crate::export::ExportDocument;
use crate::source::{PollState, StatsAggregator, TransactionFeed};
use crate::ui::Theme;

/// How long a status message stays on screen.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
///
/// The app owns both feeds for its whole lifetime. It starts them on
/// construction and stops each exactly once, in [`shutdown`](Self::shutdown)
/// or on drop. The render loop only ever reads the snapshots copied out by
/// [`sync`](Self::sync).
pub struct App {
    pub running: bool,
    pub show_help: bool,

    // Feeds
    transactions: TransactionFeed,
    stats: StatsAggregator,
    transactions_rx: watch::Receiver<PollState<Vec<Event>>>,
    stats_rx: watch::Receiver<PollState<StatsSnapshot>>,
    pub transactions_state: PollState<Vec<Event>>,
    pub stats_state: PollState<StatsSnapshot>,
    description: String,

    // Navigation state
    pub selected_row: usize,

    // UI
    pub theme: Theme,
    pub utc: bool,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Take ownership of both feeds and start them.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        mut transactions: TransactionFeed,
        mut stats: StatsAggregator,
        description: impl Into<String>,
        theme: Theme,
        utc: bool,
    ) -> Self {
        let transactions_rx = transactions.subscribe();
        let stats_rx = stats.subscribe();
        transactions.start();
        stats.start();

        let mut app = Self {
            running: true,
            show_help: false,
            transactions,
            stats,
            transactions_rx,
            stats_rx,
            transactions_state: PollState::default(),
            stats_state: PollState::default(),
            description: description.into(),
            selected_row: 0,
            theme,
            utc,
            status_message: None,
        };
        app.sync();
        app
    }

    /// Returns a description of the backend being watched.
    pub fn source_description(&self) -> &str {
        &self.description
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Copy the latest published state of both feeds.
    ///
    /// Returns true if either feed changed since the previous call.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;

        if self.transactions_rx.has_changed().unwrap_or(false) {
            self.transactions_state = self.transactions_rx.borrow_and_update().clone();
            changed = true;
        }
        if self.stats_rx.has_changed().unwrap_or(false) {
            self.stats_state = self.stats_rx.borrow_and_update().clone();
            changed = true;
        }

        // Clamp selection to the (possibly shorter) new list
        let max = self.row_count().saturating_sub(1);
        if self.selected_row > max {
            self.selected_row = max;
        }
        changed
    }

    /// Events currently on display.
    pub fn events(&self) -> &[Event] {
        self.transactions_state.latest.as_deref().unwrap_or(&[])
    }

    /// Number of rows in the event table.
    pub fn row_count(&self) -> usize {
        self.events().len()
    }

    /// The highlighted event, if any.
    pub fn selected_event(&self) -> Option<&Event> {
        self.events().get(self.selected_row)
    }

    /// Move selection down by one row.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one row.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n rows.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.row_count().saturating_sub(1);
        self.selected_row = (self.selected_row + n).min(max);
    }

    /// Move selection up by n rows.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_row = self.selected_row.saturating_sub(n);
    }

    /// Jump to the most recent event.
    pub fn select_first(&mut self) {
        self.selected_row = 0;
    }

    /// Jump to the oldest event shown.
    pub fn select_last(&mut self) {
        self.selected_row = self.row_count().saturating_sub(1);
    }

    /// Fetch both resources now, without waiting for the next tick.
    pub fn refresh_all(&mut self) {
        let transactions = self.transactions.refresh();
        let stats = self.stats.refresh();
        if transactions && stats {
            self.set_status_message("Refreshing...".to_string());
        }
    }

    /// Restart both feeds, discarding any response still in flight.
    pub fn restart_all(&mut self) {
        let transactions = self.transactions.restart();
        let stats = self.stats.restart();
        if transactions && stats {
            self.set_status_message("Restarted polling".to_string());
        }
    }

    /// Stop both feeds. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.transactions.stop();
        self.stats.stop();
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Write what is currently on screen to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        ExportDocument::new(&self.description)
            .transactions(self.transactions_state.latest.as_deref())
            .stats(self.stats_state.latest.as_ref())
            .error("transactions", self.transactions_state.last_error.as_ref())
            .error("stats", self.stats_state.last_error.as_ref())
            .write_to(path)
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}
