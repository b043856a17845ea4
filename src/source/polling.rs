//! Recurring fetch engine with generation-scoped result delivery.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use super::Fetch;
use crate::transport::TransportError;

/// Shortest interval the engine will schedule.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle phase of a [`PollingSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Created, no timer yet.
    #[default]
    Idle,
    /// Timer running; results of the current generation are accepted.
    Running,
    /// Terminal. Nothing is scheduled and late results are dropped.
    Stopped,
}

/// Observable state of a polling source.
///
/// `latest` and `last_error` can both be set: the view keeps showing the
/// last good value while flagging that the most recent attempt failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState<T> {
    /// Last successfully received value.
    pub latest: Option<T>,
    /// Most recent failure, cleared by the next success.
    pub last_error: Option<TransportError>,
    /// Incremented on every (re)start.
    pub generation: u64,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// When `latest` was last replaced.
    pub last_success: Option<Instant>,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            latest: None,
            last_error: None,
            generation: 0,
            phase: Phase::Idle,
            last_success: None,
        }
    }
}

impl<T> PollState<T> {
    /// Whether the timer is running.
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Running, but no fetch of any kind has come back yet.
    ///
    /// A failure ends the loading state even though `latest` stays empty.
    pub fn is_loading(&self) -> bool {
        self.is_active() && self.latest.is_none() && self.last_error.is_none()
    }
}

/// Turns a single-shot [`Fetch`] into a continuously refreshing value.
///
/// Calling [`start`](Self::start) fetches once immediately and then once per
/// interval. Fetches run as independent tasks and are never awaited by the
/// timer, so a slow backend produces overlapping requests. Each request
/// carries the generation it was issued in; on completion the result is
/// applied only if that generation is still current and the source is still
/// running. Within a generation the last result to arrive wins.
///
/// [`restart`](Self::restart) and [`stop`](Self::stop) never abort requests
/// in flight, they only make their results stale. Dropping the source stops
/// it.
///
/// The timer and fetches are spawned onto the ambient Tokio runtime, so
/// `start`, `restart` and `refresh` must be called from within one.
pub struct PollingSource<F: Fetch> {
    name: &'static str,
    fetcher: Arc<F>,
    interval: Duration,
    state: Arc<watch::Sender<PollState<F::Output>>>,
    stop_tx: Option<watch::Sender<bool>>,
}

impl<F: Fetch> PollingSource<F> {
    /// Create an idle source. `name` tags log output.
    pub fn new(name: &'static str, fetcher: F, interval: Duration) -> Self {
        let (state, _) = watch::channel(PollState::default());
        Self {
            name,
            fetcher: Arc::new(fetcher),
            interval: interval.max(MIN_INTERVAL),
            state: Arc::new(state),
            stop_tx: None,
        }
    }

    /// Name used in log output.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Time between scheduled fetches.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The fetch this source repeats.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Subscribe to state changes.
    ///
    /// The receiver sees every update after it is applied, never a
    /// half-applied one.
    pub fn subscribe(&self) -> watch::Receiver<PollState<F::Output>> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PollState<F::Output> {
        self.state.borrow().clone()
    }

    /// Begin polling. Only acts on an idle source.
    ///
    /// Returns `true` if the source was started.
    pub fn start(&mut self) -> bool {
        match self.enter_generation(|phase| phase == Phase::Idle) {
            Some(generation) => {
                debug!(
                    source = self.name,
                    generation,
                    interval = ?self.interval,
                    "polling started"
                );
                self.spawn_timer(generation);
                true
            }
            None => false,
        }
    }

    /// Begin a new generation, invalidating every fetch still in flight.
    ///
    /// `latest` and `last_error` carry over. Refused once the source has
    /// been stopped; returns `true` if the source is now running a fresh
    /// generation.
    pub fn restart(&mut self) -> bool {
        match self.enter_generation(|phase| phase != Phase::Stopped) {
            Some(generation) => {
                self.halt_timer();
                debug!(source = self.name, generation, "polling restarted");
                self.spawn_timer(generation);
                true
            }
            None => {
                warn!(source = self.name, "restart ignored on a stopped source");
                false
            }
        }
    }

    /// Issue one extra fetch in the current generation without touching
    /// the timer.
    ///
    /// Returns `false` if the source is not running.
    pub fn refresh(&self) -> bool {
        let (phase, generation) = {
            let state = self.state.borrow();
            (state.phase, state.generation)
        };
        if phase != Phase::Running {
            return false;
        }
        issue(self.name, &self.fetcher, &self.state, generation);
        true
    }

    /// Stop polling for good. Calling it again is a no-op.
    pub fn stop(&mut self) {
        let stopped = self.state.send_if_modified(|state| {
            if state.phase == Phase::Stopped {
                return false;
            }
            state.phase = Phase::Stopped;
            true
        });
        self.halt_timer();
        if stopped {
            debug!(source = self.name, "polling stopped");
        }
    }

    /// Move to a new generation and `Running` if `allowed` accepts the
    /// current phase. Returns the new generation.
    fn enter_generation(&self, allowed: impl FnOnce(Phase) -> bool) -> Option<u64> {
        let mut entered = None;
        self.state.send_if_modified(|state| {
            if !allowed(state.phase) {
                return false;
            }
            state.generation += 1;
            state.phase = Phase::Running;
            entered = Some(state.generation);
            true
        });
        entered
    }

    fn halt_timer(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
    }

    fn spawn_timer(&mut self, generation: u64) {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let name = self.name;
        let fetcher = Arc::clone(&self.fetcher);
        let state = Arc::clone(&self.state);
        let period = self.interval;

        tokio::spawn(async move {
            // The first tick completes immediately.
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = timer.tick() => issue(name, &fetcher, &state, generation),
                }
            }
            trace!(source = name, generation, "timer exited");
        });

        self.stop_tx = Some(stop_tx);
    }
}

impl<F: Fetch> Drop for PollingSource<F> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<F: Fetch> fmt::Debug for PollingSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("PollingSource")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("generation", &state.generation)
            .field("phase", &state.phase)
            .finish()
    }
}

/// Spawn one fetch tagged with `generation`.
fn issue<F: Fetch>(
    name: &'static str,
    fetcher: &Arc<F>,
    state: &Arc<watch::Sender<PollState<F::Output>>>,
    generation: u64,
) {
    let fetcher = Arc::clone(fetcher);
    let state = Arc::clone(state);
    trace!(source = name, generation, "fetch issued");

    tokio::spawn(async move {
        let outcome = fetcher.fetch().await;
        deliver(name, &state, generation, outcome);
    });
}

/// Apply a completed fetch if its generation is still current.
///
/// The check and the update happen under the channel's write lock, and
/// subscribers are woken only after it is released. Returns whether the
/// outcome was applied.
fn deliver<T>(
    name: &str,
    state: &watch::Sender<PollState<T>>,
    generation: u64,
    outcome: Result<T, TransportError>,
) -> bool {
    state.send_if_modified(|current| {
        if current.generation != generation || current.phase != Phase::Running {
            trace!(
                source = name,
                generation,
                current = current.generation,
                "dropping stale result"
            );
            return false;
        }
        match outcome {
            Ok(value) => {
                current.latest = Some(value);
                current.last_error = None;
                current.last_success = Some(Instant::now());
            }
            Err(err) => {
                warn!(source = name, generation, error = %err, "fetch failed");
                current.last_error = Some(err);
            }
        }
        true
    })
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::testing::{failure, settle, ScriptedFetch};
    use super::*;

    const LONG: Duration = Duration::from_secs(3600);
    const WAIT: Duration = Duration::from_secs(120);

    async fn wait_for<T: Clone>(
        rx: &mut watch::Receiver<PollState<T>>,
        pred: impl FnMut(&PollState<T>) -> bool,
    ) -> PollState<T> {
        tokio::time::timeout(WAIT, rx.wait_for(pred))
            .await
            .expect("timed out waiting for state")
            .expect("source dropped")
            .clone()
    }

    /// Counts calls and records when each one started.
    struct CountingFetch {
        calls: AtomicU64,
        started: Mutex<Vec<Instant>>,
        fail: bool,
    }

    impl CountingFetch {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicU64::new(0),
                started: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl Fetch for CountingFetch {
        type Output = u64;

        async fn fetch(&self) -> Result<u64, TransportError> {
            self.started.lock().unwrap().push(Instant::now());
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                Err(failure(503))
            } else {
                Ok(n)
            }
        }
    }

    #[tokio::test]
    async fn test_new_source_is_idle() {
        let (fetch, _issued) = ScriptedFetch::new();
        let source = PollingSource::new("test", fetch, LONG);
        let state = source.state();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.generation, 0);
        assert!(!state.is_active());
        assert!(!state.is_loading());
        assert!(!source.refresh());
    }

    #[tokio::test]
    async fn test_start_fetches_immediately() {
        let (fetch, mut issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);
        let mut rx = source.subscribe();

        assert!(source.start());
        assert!(!source.start(), "second start is refused");
        assert!(source.state().is_loading());

        let responder = issued.recv().await.unwrap();
        responder.send(Ok("first".to_string())).unwrap();

        let state = wait_for(&mut rx, |s| s.latest.is_some()).await;
        assert_eq!(state.latest.as_deref(), Some("first"));
        assert_eq!(state.generation, 1);
        assert!(state.last_success.is_some());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_restart_from_idle_starts_polling() {
        let (fetch, mut issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);
        let mut rx = source.subscribe();

        assert!(source.restart());
        let state = source.state();
        assert_eq!(state.generation, 1);
        assert_eq!(state.phase, Phase::Running);

        let responder = tokio::time::timeout(WAIT, issued.recv())
            .await
            .expect("no immediate fetch")
            .unwrap();
        responder.send(Ok("first".to_string())).unwrap();

        let state = wait_for(&mut rx, |s| s.latest.is_some()).await;
        assert_eq!(state.latest.as_deref(), Some("first"));
        assert_eq!(state.generation, 1);
        assert!(!source.start(), "already running");
    }

    #[tokio::test]
    async fn test_restart_discards_outstanding_fetch() {
        let (fetch, mut issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);
        let mut rx = source.subscribe();

        source.start();
        let old = issued.recv().await.unwrap();

        assert!(source.restart());
        let after_restart = source.state();
        assert_eq!(after_restart.generation, 2);
        let new = issued.recv().await.unwrap();

        // Late success from generation 1 changes nothing.
        old.send(Ok("stale".to_string())).unwrap();
        settle().await;
        assert_eq!(source.state(), after_restart);

        // Generation 2 is still live.
        new.send(Err(failure(500))).unwrap();
        let state = wait_for(&mut rx, |s| s.last_error.is_some()).await;
        assert_eq!(state.latest, None);
        assert_eq!(state.generation, 2);
    }

    #[tokio::test]
    async fn test_restart_discards_outstanding_failure() {
        let (fetch, mut issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);

        source.start();
        let old = issued.recv().await.unwrap();
        source.restart();
        let after_restart = source.state();

        old.send(Err(failure(502))).unwrap();
        settle().await;
        assert_eq!(source.state(), after_restart);
        assert!(source.state().last_error.is_none());
    }

    #[tokio::test]
    async fn test_restart_keeps_last_good_value() {
        let (fetch, mut issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);
        let mut rx = source.subscribe();

        source.start();
        issued.recv().await.unwrap().send(Ok("kept".to_string())).unwrap();
        wait_for(&mut rx, |s| s.latest.is_some()).await;

        source.restart();
        let state = source.state();
        assert_eq!(state.latest.as_deref(), Some("kept"));
        assert!(state.is_active());
    }

    #[tokio::test]
    async fn test_failure_keeps_latest() {
        let (fetch, mut issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);
        let mut rx = source.subscribe();

        source.start();
        issued.recv().await.unwrap().send(Ok("good".to_string())).unwrap();
        wait_for(&mut rx, |s| s.latest.is_some()).await;

        for code in [500, 502, 503] {
            assert!(source.refresh());
            issued.recv().await.unwrap().send(Err(failure(code))).unwrap();
            let state = wait_for(&mut rx, |s| {
                s.last_error.as_ref().and_then(|e| e.status_code()) == Some(code)
            })
            .await;
            assert_eq!(state.latest.as_deref(), Some("good"));
            assert_eq!(state.phase, Phase::Running);
        }

        // The next success clears the error.
        source.refresh();
        issued.recv().await.unwrap().send(Ok("better".to_string())).unwrap();
        let state = wait_for(&mut rx, |s| s.last_error.is_none()).await;
        assert_eq!(state.latest.as_deref(), Some("better"));
    }

    #[tokio::test]
    async fn test_last_arrival_wins_within_generation() {
        let (fetch, mut issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);
        let mut rx = source.subscribe();

        source.start();
        let a = issued.recv().await.unwrap();
        source.refresh();
        let b = issued.recv().await.unwrap();

        // B was issued second but resolves first.
        b.send(Ok("b".to_string())).unwrap();
        wait_for(&mut rx, |s| s.latest.as_deref() == Some("b")).await;

        a.send(Ok("a".to_string())).unwrap();
        let state = wait_for(&mut rx, |s| s.latest.as_deref() == Some("a")).await;
        assert_eq!(state.generation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_on_interval_multiples() {
        let interval = Duration::from_millis(5000);
        let mut source = PollingSource::new("test", CountingFetch::new(false), interval);
        let mut rx = source.subscribe();

        let t0 = Instant::now();
        source.start();
        wait_for(&mut rx, |s| s.latest == Some(4)).await;

        let offsets: Vec<Duration> = source
            .fetcher()
            .started
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.duration_since(t0))
            .collect();
        assert_eq!(
            offsets,
            vec![Duration::ZERO, interval, interval * 2, interval * 3]
        );

        // Nothing more once stopped.
        source.stop();
        tokio::time::sleep(interval * 10).await;
        assert_eq!(source.fetcher().calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_ticking_through_failures() {
        let mut source =
            PollingSource::new("test", CountingFetch::new(true), Duration::from_secs(10));
        let mut rx = source.subscribe();

        source.start();
        wait_for(&mut rx, |s| s.last_error.is_some()).await;
        tokio::time::sleep(Duration::from_secs(35)).await;

        let state = source.state();
        assert_eq!(source.fetcher().calls.load(Ordering::SeqCst), 4);
        assert_eq!(state.phase, Phase::Running);
        assert_eq!(state.latest, None);
        assert_eq!(state.last_error.and_then(|e| e.status_code()), Some(503));
    }

    #[tokio::test]
    async fn test_stop_discards_in_flight_result() {
        let (fetch, mut issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);

        source.start();
        let pending = issued.recv().await.unwrap();
        source.stop();

        pending.send(Ok("late".to_string())).unwrap();
        settle().await;

        let state = source.state();
        assert_eq!(state.phase, Phase::Stopped);
        assert_eq!(state.latest, None);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_terminal() {
        let (fetch, _issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);
        let mut rx = source.subscribe();

        source.start();
        source.stop();
        let stopped = source.state();
        rx.borrow_and_update();

        source.stop();
        assert_eq!(source.state(), stopped);
        assert!(!rx.has_changed().unwrap(), "second stop does not notify");

        assert!(!source.start());
        assert!(!source.restart());
        assert!(!source.refresh());
        assert_eq!(source.state().generation, 1);
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let (fetch, _issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);
        source.stop();
        assert_eq!(source.state().phase, Phase::Stopped);
        assert!(!source.start());
    }

    #[tokio::test]
    async fn test_drop_stops_source() {
        let (fetch, mut issued) = ScriptedFetch::new();
        let mut source = PollingSource::new("test", fetch, LONG);
        let mut rx = source.subscribe();

        source.start();
        let pending = issued.recv().await.unwrap();
        drop(source);

        assert_eq!(rx.borrow_and_update().phase, Phase::Stopped);
        pending.send(Ok("late".to_string())).unwrap();
        settle().await;
        assert_eq!(rx.borrow().latest, None);
    }

    #[test]
    fn test_deliver_checks_generation_and_phase() {
        let (tx, _rx) = watch::channel(PollState::<u32> {
            generation: 3,
            phase: Phase::Running,
            ..PollState::default()
        });

        assert!(!deliver("test", &tx, 2, Ok(1)));
        assert_eq!(tx.borrow().latest, None);

        assert!(deliver("test", &tx, 3, Ok(7)));
        assert_eq!(tx.borrow().latest, Some(7));

        tx.send_modify(|s| s.phase = Phase::Stopped);
        assert!(!deliver("test", &tx, 3, Ok(9)));
        assert_eq!(tx.borrow().latest, Some(7));
    }
}
