//! JSON export of the current view.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use accesswatch_types::{Event, StatsSnapshot};
use anyhow::{Context, Result};
use serde::Serialize;

/// What gets written to disk by `e` in the TUI and by `--export`.
///
/// A source that has never produced data is written as `null`; its most
/// recent error, if any, goes in `errors` keyed by source name.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub exported_at: i64,
    pub source: &'a str,
    pub transactions: Option<&'a [Event]>,
    pub stats: Option<&'a StatsSnapshot>,
    pub errors: BTreeMap<&'static str, String>,
}

impl<'a> ExportDocument<'a> {
    /// Start a document stamped with the current time.
    pub fn new(source: &'a str) -> Self {
        Self {
            exported_at: chrono::Utc::now().timestamp(),
            source,
            transactions: None,
            stats: None,
            errors: BTreeMap::new(),
        }
    }

    pub fn transactions(mut self, events: Option<&'a [Event]>) -> Self {
        self.transactions = events;
        self
    }

    pub fn stats(mut self, stats: Option<&'a StatsSnapshot>) -> Self {
        self.stats = stats;
        self
    }

    /// Record a source's error, if it has one.
    pub fn error(mut self, name: &'static str, error: Option<impl ToString>) -> Self {
        if let Some(error) = error {
            self.errors.insert(name, error.to_string());
        }
        self
    }

    /// Pretty-print the document to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}
