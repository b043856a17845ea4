//! # accesswatch
//!
//! A live terminal view and library for NFC access-control events.
//!
//! The backend records every badge read as GRANTED or DENIED. This crate
//! polls it for the most recent events and for windowed pass/fail
//! statistics, and keeps a terminal UI fresh without user action. Each feed
//! runs on its own timer, tolerates transient failures, and never shows a
//! response older than one it has already shown.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                             Application                             │
//! │  ┌───────────┐   ┌─────────────────┐   ┌─────────┐   ┌───────────┐  │
//! │  │ transport │──▶│      source     │──▶│   app   │──▶│     ui    │  │
//! │  │   (HTTP)  │   │ (PollingSource) │   │ (state) │   │ (ratatui) │  │
//! │  └───────────┘   └─────────────────┘   └─────────┘   └───────────┘  │
//! │                    TransactionFeed                                  │
//! │                    StatsAggregator                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`transport`]**: one request/response round trip ([`Transport`] trait,
//!   [`HttpTransport`] over reqwest) with a typed [`TransportError`]
//! - **[`source`]**: the generic polling engine ([`PollingSource`]) and the two
//!   feeds built on it
//! - **[`app`]**: owns both feeds and the navigation state of the TUI
//! - **[`ui`]**: pure view bindings plus ratatui renderers
//! - **[`config`]**: command-line flags and layered settings
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a local backend
//! accesswatch --base-url http://localhost:8000
//!
//! # Only denied reads, last 48 hours of statistics
//! accesswatch --status DENIED --hours 48
//!
//! # One-shot probe, or dump to a file
//! accesswatch --check
//! accesswatch --export snapshot.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use accesswatch::{HttpTransport, TransactionFeed, TransactionQuery};
//!
//! # tokio_test::block_on(async {
//! let transport = HttpTransport::builder()
//!     .base_url("http://localhost:8000")
//!     .build()
//!     .unwrap();
//!
//! let mut feed = TransactionFeed::new(Arc::new(transport), TransactionQuery::default());
//! let mut updates = feed.subscribe();
//! feed.start();
//!
//! updates.changed().await.unwrap();
//! if let Some(ref events) = updates.borrow().latest {
//!     println!("{} recent events", events.len());
//! }
//! feed.stop();
//! # });
//! ```

pub mod app;
pub mod config;
pub mod duration;
pub mod events;
pub mod export;
pub mod source;
pub mod transport;
pub mod ui;

// Re-export main types for convenience
pub use accesswatch_types::{AccessStatus, Bucket, Event, StatsSnapshot};
pub use app::App;
pub use config::{Cli, Settings};
pub use export::ExportDocument;
pub use source::{
    Fetch, Phase, PollState, PollingSource, StatsAggregator, StatsQuery, TransactionFeed,
    TransactionQuery,
};
pub use transport::{HttpTransport, Transport, TransportError};
