use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use accesswatch::config::{Cli, LogSettings, Settings};
use accesswatch::source::{fetch_stats, fetch_transactions};
use accesswatch::transport::check_health;
use accesswatch::ui::Theme;
use accesswatch::{events, ui, App, ExportDocument, StatsAggregator, TransactionFeed, Transport};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;

    let interactive = !cli.check && cli.export.is_none();
    init_tracing(&settings.log, interactive)?;

    // The TUI loop owns the main thread; feeds run on a single worker
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    let transport = settings.build_transport()?;
    info!(backend = transport.description(), "starting");

    if cli.check {
        return rt.block_on(run_check(transport.as_ref(), &settings));
    }

    if let Some(ref export_path) = cli.export {
        return rt.block_on(export_to_file(transport.as_ref(), &settings, export_path));
    }

    let _guard = rt.enter();
    run_tui(transport, &settings)
}

/// Send logs to stderr in one-shot modes, and to the log file (if any) while
/// the TUI owns the terminal.
fn init_tracing(log: &LogSettings, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    match (&log.file, interactive) {
        (Some(path), _) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        (None, false) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
        // Nowhere to write without corrupting the screen
        (None, true) => {}
    }
    Ok(())
}

/// Probe the backend and fetch each resource once
async fn run_check(transport: &dyn Transport, settings: &Settings) -> Result<()> {
    println!("Backend: {}", transport.description());
    let mut failures = 0;

    match check_health(transport).await {
        Ok(true) => println!("  health        ok"),
        Ok(false) => {
            println!("  health        reported not ok");
            failures += 1;
        }
        Err(e) => {
            println!("  health        {}", e);
            failures += 1;
        }
    }

    let query = settings.transaction_query();
    match fetch_transactions(transport, &query).await {
        Ok(events) => println!(
            "  transactions  {} events (limit {})",
            events.len(),
            query.limit
        ),
        Err(e) => {
            println!("  transactions  {}", e);
            failures += 1;
        }
    }

    let query = settings.stats_query();
    match fetch_stats(transport, query).await {
        Ok(stats) => println!(
            "  stats         {} granted, {} denied over {}h ({} buckets)",
            stats.total_for(accesswatch::AccessStatus::Granted),
            stats.total_for(accesswatch::AccessStatus::Denied),
            query.hours,
            stats.timeline.len()
        ),
        Err(e) => {
            println!("  stats         {}", e);
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{} check(s) failed", failures);
    }
    Ok(())
}

/// Fetch both resources once and write them to a JSON file
async fn export_to_file(transport: &dyn Transport, settings: &Settings, path: &Path) -> Result<()> {
    let query = settings.transaction_query();
    let (transactions, stats) = tokio::join!(
        fetch_transactions(transport, &query),
        fetch_stats(transport, settings.stats_query()),
    );

    ExportDocument::new(transport.description())
        .transactions(transactions.as_deref().ok())
        .stats(stats.as_ref().ok())
        .error("transactions", transactions.as_ref().err())
        .error("stats", stats.as_ref().err())
        .write_to(path)?;

    println!("Exported to {}", path.display());
    if transactions.is_err() && stats.is_err() {
        bail!("both fetches failed, see the errors in {}", path.display());
    }
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(transport: Arc<dyn Transport>, settings: &Settings) -> Result<()> {
    let theme = Theme::auto_detect();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let transactions = TransactionFeed::with_interval(
        transport.clone(),
        settings.transaction_query(),
        settings.transactions_interval(),
    );
    let stats = StatsAggregator::with_interval(
        transport.clone(),
        settings.stats_query(),
        settings.stats_interval(),
    );
    let mut app = App::new(
        transactions,
        stats,
        transport.description(),
        theme,
        settings.utc,
    );

    let result = run_app(&mut terminal, &mut app);
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.sync();
        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }
    }

    info!("quit");
    Ok(())
}
