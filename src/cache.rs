//! In-memory roster cache with single-flight fetching.
//!
//! The first caller that finds no usable snapshot becomes the leader of a
//! flight and runs the fetch; every caller arriving while that flight is in the
//! air waits on it and receives the same outcome. Snapshots are published as a
//! whole `Arc`, so readers never observe a mix of two patches.

use crate::api::RosterSource;
use crate::champion::RosterSnapshot;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CachePolicy {
    /// Upper bound on a single fetch. `None` waits for the source indefinitely.
    pub fetch_timeout: Option<Duration>,
    /// Refetch once the last check is older than this. `None` fetches once.
    pub max_age: Option<chrono::Duration>,
}

/// Set when the latest fetch failed and an older snapshot is being served.
#[derive(Debug, Clone, PartialEq)]
pub struct StaleWarning {
    /// When fetching first started failing.
    pub since: DateTime<Utc>,
    pub reason: String,
}

/// What a caller gets back from the cache.
#[derive(Debug, Clone)]
pub struct RosterRead {
    pub snapshot: Arc<RosterSnapshot>,
    pub fetched_at: DateTime<Utc>,
    pub stale: Option<StaleWarning>,
}

impl RosterRead {
    pub fn is_stale(&self) -> bool {
        self.stale.is_some()
    }
}

#[derive(Debug, Clone)]
struct CachedRoster {
    snapshot: Arc<RosterSnapshot>,
    fetched_at: DateTime<Utc>,
    // last fetch attempt, successful or not
    checked_at: DateTime<Utc>,
    stale: Option<StaleWarning>,
}

impl CachedRoster {
    fn read(&self) -> RosterRead {
        RosterRead {
            snapshot: Arc::clone(&self.snapshot),
            fetched_at: self.fetched_at,
            stale: self.stale.clone(),
        }
    }
}

type FlightOutcome = Result<RosterRead, AppError>;

struct Flight {
    outcome: Mutex<Option<FlightOutcome>>,
    landed: Condvar,
}

impl Flight {
    fn new() -> Self {
        Flight {
            outcome: Mutex::new(None),
            landed: Condvar::new(),
        }
    }

    fn land(&self, outcome: FlightOutcome) {
        *self.outcome.lock() = Some(outcome);
        self.landed.notify_all();
    }

    fn wait(&self) -> FlightOutcome {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.landed.wait(&mut outcome);
        }
    }
}

#[derive(Default)]
struct CacheState {
    current: Option<CachedRoster>,
    in_flight: Option<Arc<Flight>>,
    // A worker is inside `RosterSource::fetch`. Stays set past a timeout until
    // the worker returns, so no second fetch can start beside it.
    fetch_running: bool,
    // The leader gave up waiting; the worker publishes its own result.
    abandoned: bool,
}

impl CacheState {
    fn publish(&mut self, fetched: Result<RosterSnapshot, AppError>) -> FlightOutcome {
        let now = Utc::now();
        self.in_flight = None;

        match fetched {
            Ok(snapshot) => {
                let snapshot = match self.current.as_ref() {
                    Some(current) if current.snapshot.version() == snapshot.version() => {
                        tracing::debug!(version = %snapshot.version(), "Roster unchanged");
                        Arc::clone(&current.snapshot)
                    }
                    _ => {
                        tracing::info!(
                            version = %snapshot.version(),
                            champions = snapshot.len(),
                            "Published roster snapshot"
                        );
                        Arc::new(snapshot)
                    }
                };

                let cached = CachedRoster {
                    snapshot,
                    fetched_at: now,
                    checked_at: now,
                    stale: None,
                };
                let read = cached.read();
                self.current = Some(cached);
                Ok(read)
            }
            Err(error) => match self.current.as_mut() {
                Some(current) => {
                    tracing::warn!(
                        version = %current.snapshot.version(),
                        error = %error,
                        "Roster fetch failed, serving cached snapshot"
                    );
                    let since = current.stale.as_ref().map_or(now, |s| s.since);
                    current.checked_at = now;
                    current.stale = Some(StaleWarning {
                        since,
                        reason: error.to_string(),
                    });
                    Ok(current.read())
                }
                None => {
                    tracing::warn!(error = %error, "Roster fetch failed with nothing cached");
                    Err(error)
                }
            },
        }
    }
}

enum Ticket {
    Hit(RosterRead),
    Join(Arc<Flight>),
    Lead(Arc<Flight>, Option<String>),
    Busy,
}

pub struct RosterCache {
    source: Arc<dyn RosterSource>,
    policy: CachePolicy,
    state: Arc<Mutex<CacheState>>,
}

impl RosterCache {
    pub fn new(source: Arc<dyn RosterSource>, policy: CachePolicy) -> Self {
        RosterCache {
            source,
            policy,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Returns the cached roster, fetching it first if there is none.
    ///
    /// Fails with [`AppError::SourceUnavailable`] only when the fetch fails and
    /// nothing was cached before; otherwise the old snapshot is served with a
    /// [`StaleWarning`].
    pub fn get_roster(&self) -> Result<RosterRead, AppError> {
        self.load(false)
    }

    /// Fetches again even if a snapshot is cached. Joins a flight already in
    /// the air instead of starting a second one.
    pub fn refresh(&self) -> Result<RosterRead, AppError> {
        self.load(true)
    }

    /// Drops the cached snapshot so the next read fetches.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        if state.current.take().is_some() {
            tracing::debug!("Roster cache invalidated");
        }
    }

    /// The cached roster, without ever fetching.
    pub fn current(&self) -> Option<RosterRead> {
        self.state.lock().current.as_ref().map(CachedRoster::read)
    }

    fn load(&self, force: bool) -> Result<RosterRead, AppError> {
        match self.take_ticket(force) {
            Ticket::Hit(read) => {
                tracing::trace!(version = %read.snapshot.version(), "Roster cache hit");
                Ok(read)
            }
            Ticket::Join(flight) => {
                tracing::debug!("Waiting on in-flight roster fetch");
                flight.wait()
            }
            Ticket::Lead(flight, previous) => {
                tracing::debug!(previous = ?previous, "Starting roster fetch");
                let outcome = self.run_flight(previous);
                flight.land(outcome.clone());
                outcome
            }
            Ticket::Busy => Err(AppError::SourceUnavailable(
                "an earlier roster fetch is still running".to_string(),
            )),
        }
    }

    fn take_ticket(&self, force: bool) -> Ticket {
        let mut state = self.state.lock();

        if !force {
            if let Some(current) = state.current.as_ref() {
                if !self.is_due(current) {
                    return Ticket::Hit(current.read());
                }
            }
        }

        if let Some(flight) = state.in_flight.as_ref() {
            return Ticket::Join(Arc::clone(flight));
        }

        if state.fetch_running {
            // An abandoned fetch has not returned yet; its result will be
            // published when it does.
            return match state.current.as_ref() {
                Some(current) => Ticket::Hit(current.read()),
                None => Ticket::Busy,
            };
        }

        let flight = Arc::new(Flight::new());
        state.in_flight = Some(Arc::clone(&flight));
        state.fetch_running = true;
        let previous = state
            .current
            .as_ref()
            .map(|c| c.snapshot.version().to_string());

        Ticket::Lead(flight, previous)
    }

    fn is_due(&self, cached: &CachedRoster) -> bool {
        match self.policy.max_age {
            Some(max_age) => Utc::now().signed_duration_since(cached.checked_at) >= max_age,
            None => false,
        }
    }

    // The fetch runs on a worker thread so a hung or panicking source cannot
    // strand the leader and everyone waiting on it.
    fn run_flight(&self, previous: Option<String>) -> FlightOutcome {
        let aborted = || AppError::SourceUnavailable("roster fetch aborted".to_string());

        let rx = match self.spawn_fetch(previous) {
            Ok(rx) => rx,
            Err(error) => {
                let mut state = self.state.lock();
                state.fetch_running = false;
                return state.publish(Err(error));
            }
        };

        let fetched = match self.policy.fetch_timeout {
            Some(timeout) => match rx.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => {
                    let mut state = self.state.lock();
                    // The worker may have finished while we waited for the lock.
                    let fetched = match rx.try_recv() {
                        Ok(result) => result,
                        Err(TryRecvError::Empty) => {
                            state.abandoned = true;
                            Err(AppError::SourceUnavailable(format!(
                                "roster fetch timed out after {}ms",
                                timeout.as_millis()
                            )))
                        }
                        Err(TryRecvError::Disconnected) => {
                            state.fetch_running = false;
                            Err(aborted())
                        }
                    };
                    return state.publish(fetched);
                }
                Err(RecvTimeoutError::Disconnected) => Err(aborted()),
            },
            None => rx.recv().unwrap_or_else(|_| Err(aborted())),
        };

        let mut state = self.state.lock();
        state.fetch_running = false;
        state.publish(fetched)
    }

    fn spawn_fetch(
        &self,
        previous: Option<String>,
    ) -> Result<Receiver<Result<RosterSnapshot, AppError>>, AppError> {
        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.state);
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("roster-fetch".to_string())
            .spawn(move || {
                let fetched = panic::catch_unwind(AssertUnwindSafe(|| {
                    source.fetch(previous.as_deref())
                }))
                .unwrap_or_else(|_| {
                    Err(AppError::SourceUnavailable("roster fetch aborted".to_string()))
                })
                .map_err(AppError::into_source_unavailable);

                let mut state = shared.lock();
                state.fetch_running = false;
                if state.abandoned {
                    state.abandoned = false;
                    tracing::debug!("Abandoned roster fetch returned, publishing its result");
                    let _ = state.publish(fetched);
                } else {
                    let _ = tx.send(fetched);
                }
            })
            .map_err(|e| {
                AppError::SourceUnavailable(format!("could not start roster fetch: {}", e))
            })?;

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::champion::{test_champion, Archetype};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    fn snapshot(version: &str) -> RosterSnapshot {
        RosterSnapshot::new(
            version,
            vec![
                test_champion("Darius", &[Archetype::Fighter, Archetype::Tank], 175.0, 3),
                test_champion("Teemo", &[Archetype::Marksman], 550.0, 6),
            ],
        )
        .unwrap()
    }

    /// Replays scripted outcomes and records every call.
    struct ScriptedSource {
        outcomes: parking_lot::Mutex<VecDeque<Result<RosterSnapshot, AppError>>>,
        calls: AtomicUsize,
        previous: parking_lot::Mutex<Vec<Option<String>>>,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<Result<RosterSnapshot, AppError>>) -> Self {
            ScriptedSource {
                outcomes: parking_lot::Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
                previous: parking_lot::Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RosterSource for ScriptedSource {
        fn fetch(&self, previous_version: Option<&str>) -> Result<RosterSnapshot, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.previous.lock().push(previous_version.map(str::to_string));
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            self.outcomes
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::SourceUnavailable("script exhausted".into())))
        }
    }

    struct PanickingSource;

    impl RosterSource for PanickingSource {
        fn fetch(&self, _previous_version: Option<&str>) -> Result<RosterSnapshot, AppError> {
            panic!("source blew up");
        }
    }

    #[test]
    fn concurrent_first_access_fetches_once() {
        let source = Arc::new(
            ScriptedSource::new(vec![Ok(snapshot("14.1.1"))]).with_delay(Duration::from_millis(50)),
        );
        let cache = RosterCache::new(source.clone(), CachePolicy::default());
        let barrier = Barrier::new(8);

        let reads: Vec<RosterRead> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache.get_roster()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });

        assert_eq!(source.calls(), 1);
        for read in &reads {
            assert!(Arc::ptr_eq(&read.snapshot, &reads[0].snapshot));
            assert!(!read.is_stale());
        }
    }

    #[test]
    fn concurrent_callers_share_a_failure() {
        let source = Arc::new(
            ScriptedSource::new(vec![Err(AppError::SourceUnavailable("cdn down".into()))])
                .with_delay(Duration::from_millis(50)),
        );
        let cache = RosterCache::new(source.clone(), CachePolicy::default());
        let barrier = Barrier::new(4);

        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache.get_roster()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // Late arrivals may start a second flight after the first one failed,
        // but never while it is still running.
        assert!(source.calls() >= 1);
        for result in results {
            assert!(matches!(result, Err(AppError::SourceUnavailable(_))));
        }
    }

    #[test]
    fn cached_snapshot_is_returned_without_fetching() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(snapshot("14.1.1"))]));
        let cache = RosterCache::new(source.clone(), CachePolicy::default());

        let first = cache.get_roster().unwrap();
        let second = cache.get_roster().unwrap();

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&first.snapshot, &second.snapshot));
        assert_eq!(second.fetched_at, first.fetched_at);
    }

    #[test]
    fn failure_without_snapshot_is_source_unavailable() {
        let source = Arc::new(ScriptedSource::new(vec![Err(AppError::HttpError(
            "connection refused".into(),
        ))]));
        let cache = RosterCache::new(source, CachePolicy::default());

        let err = cache.get_roster().unwrap_err();
        assert_eq!(
            err,
            AppError::SourceUnavailable("HTTP error: connection refused".into())
        );
        assert!(cache.current().is_none());
    }

    #[test]
    fn serves_stale_snapshot_when_refresh_fails() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(snapshot("14.1.1")),
            Err(AppError::SourceUnavailable("cdn down".into())),
            Err(AppError::SourceUnavailable("still down".into())),
            Ok(snapshot("14.2.1")),
        ]));
        let cache = RosterCache::new(source.clone(), CachePolicy::default());

        let fresh = cache.get_roster().unwrap();
        let stale = cache.refresh().unwrap();
        assert!(Arc::ptr_eq(&fresh.snapshot, &stale.snapshot));
        let warning = stale.stale.clone().unwrap();
        assert!(warning.reason.contains("cdn down"));

        // Plain reads keep reporting the warning until a fetch succeeds.
        assert!(cache.get_roster().unwrap().is_stale());

        let still_stale = cache.refresh().unwrap();
        let second_warning = still_stale.stale.unwrap();
        assert_eq!(second_warning.since, warning.since);
        assert!(second_warning.reason.contains("still down"));

        let recovered = cache.refresh().unwrap();
        assert!(!recovered.is_stale());
        assert_eq!(recovered.snapshot.version(), "14.2.1");
        assert_eq!(source.calls(), 4);
    }

    #[test]
    fn same_version_refresh_keeps_the_snapshot() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(snapshot("14.1.1")),
            Ok(snapshot("14.1.1")),
        ]));
        let cache = RosterCache::new(source.clone(), CachePolicy::default());

        let first = cache.get_roster().unwrap();
        let second = cache.refresh().unwrap();
        assert!(Arc::ptr_eq(&first.snapshot, &second.snapshot));
        assert_eq!(
            *source.previous.lock(),
            vec![None, Some("14.1.1".to_string())]
        );
    }

    #[test]
    fn invalidate_forces_next_read_to_fetch() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(snapshot("14.1.1")),
            Ok(snapshot("14.2.1")),
        ]));
        let cache = RosterCache::new(source.clone(), CachePolicy::default());

        cache.get_roster().unwrap();
        cache.invalidate();
        assert!(cache.current().is_none());

        let read = cache.get_roster().unwrap();
        assert_eq!(read.snapshot.version(), "14.2.1");
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn expired_snapshot_is_rechecked() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(snapshot("14.1.1")),
            Ok(snapshot("14.2.1")),
        ]));
        let policy = CachePolicy {
            fetch_timeout: None,
            max_age: Some(chrono::Duration::zero()),
        };
        let cache = RosterCache::new(source.clone(), policy);

        assert_eq!(cache.get_roster().unwrap().snapshot.version(), "14.1.1");
        assert_eq!(cache.get_roster().unwrap().snapshot.version(), "14.2.1");
        assert_eq!(
            *source.previous.lock(),
            vec![None, Some("14.1.1".to_string())]
        );
    }

    #[test]
    fn slow_source_times_out() {
        let source = Arc::new(
            ScriptedSource::new(vec![Ok(snapshot("14.1.1"))])
                .with_delay(Duration::from_millis(500)),
        );
        let policy = CachePolicy {
            fetch_timeout: Some(Duration::from_millis(20)),
            max_age: None,
        };
        let cache = RosterCache::new(source, policy);

        match cache.get_roster() {
            Err(AppError::SourceUnavailable(reason)) => assert!(reason.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other.map(|r| r.fetched_at)),
        }
    }

    #[test]
    fn panicking_source_is_reported_not_propagated() {
        let cache = RosterCache::new(Arc::new(PanickingSource), CachePolicy::default());
        assert_eq!(
            cache.get_roster().unwrap_err(),
            AppError::SourceUnavailable("roster fetch aborted".into())
        );
    }

    /// Slow after the first call; tracks how many fetches overlap.
    struct SlowSource {
        calls: AtomicUsize,
        running: AtomicUsize,
        peak: AtomicUsize,
        fast_first: bool,
        delay: Duration,
    }

    impl SlowSource {
        fn new(delay: Duration, fast_first: bool) -> Self {
            SlowSource {
                calls: AtomicUsize::new(0),
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                fast_first,
                delay,
            }
        }
    }

    impl RosterSource for SlowSource {
        fn fetch(&self, _previous_version: Option<&str>) -> Result<RosterSnapshot, AppError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 && self.fast_first {
                return Ok(snapshot("14.1.1"));
            }

            let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(snapshot("14.2.1"))
        }
    }

    fn wait_for_version(cache: &RosterCache, version: &str) -> RosterRead {
        for _ in 0..200 {
            if let Some(read) = cache.current() {
                if read.snapshot.version() == version {
                    return read;
                }
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("roster {} was never published", version);
    }

    #[test]
    fn timed_out_fetch_blocks_new_fetches_until_it_returns() {
        let source = Arc::new(SlowSource::new(Duration::from_millis(400), false));
        let policy = CachePolicy {
            fetch_timeout: Some(Duration::from_millis(20)),
            max_age: None,
        };
        let cache = RosterCache::new(source.clone(), policy);

        for _ in 0..5 {
            assert!(matches!(
                cache.get_roster(),
                Err(AppError::SourceUnavailable(_))
            ));
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        // The late result is published once the worker returns.
        let read = wait_for_version(&cache, "14.2.1");
        assert!(!read.is_stale());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.peak.load(Ordering::SeqCst), 1);

        let again = cache.get_roster().unwrap();
        assert!(Arc::ptr_eq(&again.snapshot, &read.snapshot));
    }

    #[test]
    fn refresh_timeout_serves_cached_snapshot() {
        let source = Arc::new(SlowSource::new(Duration::from_millis(300), true));
        let policy = CachePolicy {
            fetch_timeout: Some(Duration::from_millis(20)),
            max_age: None,
        };
        let cache = RosterCache::new(source.clone(), policy);

        let fresh = cache.get_roster().unwrap();
        let stale = cache.refresh().unwrap();

        assert!(Arc::ptr_eq(&fresh.snapshot, &stale.snapshot));
        assert!(stale.is_stale());
        assert!(stale.stale.unwrap().reason.contains("timed out"));

        // While the slow fetch is still out, a second refresh does not start
        // another one and keeps serving the cached roster.
        let during = cache.refresh().unwrap();
        assert!(Arc::ptr_eq(&fresh.snapshot, &during.snapshot));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        let recovered = wait_for_version(&cache, "14.2.1");
        assert!(!recovered.is_stale());
        assert_eq!(source.peak.load(Ordering::SeqCst), 1);
    }
}
