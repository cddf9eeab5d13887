//! Reading-time stopwatch
//!
//! A [`Stopwatch`] accumulates whole seconds of active time across any number
//! of start/stop cycles. While running it reports a live total and notifies an
//! optional observer once per tick so a view can redraw.

use crate::types::{BookId, Clock, SystemClock, Timestamp};
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Cadence of live notifications while a stopwatch is running
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest cadence the ticker will run at
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Callback fired on every tick and once on reset
///
/// It carries no payload; observers re-read [`Stopwatch::total_time`].
/// Observers run on the ticker thread and must not block on the stopwatch's owner.
pub type TickObserver = Arc<dyn Fn() + Send + Sync>;

type ObserverSlot = Arc<RwLock<Option<TickObserver>>>;

/// Accumulates active duration for one book
pub struct Stopwatch {
    book_id: BookId,
    total_seconds: u64,
    session_start: Option<Timestamp>,
    clock: Arc<dyn Clock>,
    observer: ObserverSlot,
    ticker: Option<Ticker>,
    tick_interval: Duration,
}

impl Stopwatch {
    /// Creates a stopped stopwatch seeded with previously accumulated seconds
    pub fn new(book_id: BookId, initial_seconds: u64) -> Self {
        Self::with_clock(book_id, initial_seconds, Arc::new(SystemClock))
    }

    /// Creates a stopwatch reading time from the given clock
    pub fn with_clock(book_id: BookId, initial_seconds: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            book_id,
            total_seconds: initial_seconds,
            session_start: None,
            clock,
            observer: Arc::new(RwLock::new(None)),
            ticker: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Sets the live notification cadence
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Returns the id of the book this stopwatch belongs to
    pub fn book_id(&self) -> &BookId {
        &self.book_id
    }

    /// Returns the live notification cadence
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Changes the cadence; a running ticker keeps its old cadence until the next start
    pub fn set_tick_interval(&mut self, interval: Duration) {
        self.tick_interval = interval;
    }

    /// Registers the observer, replacing any previous one
    ///
    /// Takes effect immediately, including for a ticker that is already running.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        if let Ok(mut slot) = self.observer.write() {
            *slot = Some(Arc::new(observer));
        }
    }

    /// Removes the observer
    pub fn clear_observer(&mut self) {
        if let Ok(mut slot) = self.observer.write() {
            *slot = None;
        }
    }

    /// Starts a session; does nothing if one is already running
    pub fn start(&mut self) {
        if self.session_start.is_some() {
            return;
        }

        self.session_start = Some(self.clock.now());
        self.ticker = Ticker::spawn(self.tick_interval, Arc::clone(&self.observer));
        log::debug!("Stopwatch started for book {}", self.book_id);
    }

    /// Ends the running session and folds its whole seconds into the total
    ///
    /// Does nothing if not running.
    pub fn stop(&mut self) {
        let Some(start) = self.session_start.take() else {
            return;
        };

        let session = self.clock.now().whole_seconds_since(start);
        self.total_seconds = self.total_seconds.saturating_add(session);
        // Dropping the ticker stops and joins its thread
        self.ticker = None;

        log::debug!(
            "Stopwatch stopped for book {}: session {}s, total {}s",
            self.book_id,
            session,
            self.total_seconds
        );
    }

    /// Stops, zeroes the total and notifies the observer once
    pub fn reset(&mut self) {
        self.stop();
        self.total_seconds = 0;
        notify(&self.observer);
    }

    /// Accumulated seconds, including the running session if any
    pub fn total_time(&self) -> u64 {
        match self.session_start {
            Some(start) => self
                .total_seconds
                .saturating_add(self.clock.now().whole_seconds_since(start)),
            None => self.total_seconds,
        }
    }

    /// Returns true while a session is running
    pub fn is_active(&self) -> bool {
        self.session_start.is_some()
    }

    /// Replaces the accumulated total of completed sessions
    ///
    /// A running session keeps running and is added on top when stopped.
    pub fn set_total(&mut self, seconds: u64) {
        self.total_seconds = seconds;
    }
}

impl fmt::Debug for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stopwatch")
            .field("book_id", &self.book_id)
            .field("total_seconds", &self.total_seconds)
            .field("session_start", &self.session_start)
            .field("tick_interval", &self.tick_interval)
            .finish_non_exhaustive()
    }
}

fn notify(slot: &ObserverSlot) {
    // Clone out of the lock so the observer can replace itself
    let observer = slot.read().ok().and_then(|guard| guard.clone());
    if let Some(observer) = observer {
        observer();
    }
}

/// Deadline of the tick after one due at `due`
///
/// Ticks stay on the grid laid from the spawn instant; ticks missed while
/// the observer ran long are skipped rather than fired in a burst.
fn next_deadline(due: Instant, now: Instant, interval: Duration) -> Instant {
    let mut next = due + interval;
    while next <= now {
        next += interval;
    }
    next
}

/// Background thread firing the observer at a fixed interval
struct Ticker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    fn spawn(interval: Duration, slot: ObserverSlot) -> Option<Self> {
        let interval = interval.max(MIN_TICK_INTERVAL);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let spawned = thread::Builder::new()
            .name("stopwatch-ticker".to_string())
            .spawn(move || {
                let mut due = Instant::now() + interval;
                loop {
                    let wait = due.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            notify(&slot);
                            due = next_deadline(due, Instant::now(), interval);
                        }
                        // Explicit stop or sender dropped
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            });

        match spawned {
            Ok(handle) => Some(Self {
                stop_tx: Some(stop_tx),
                handle: Some(handle),
            }),
            Err(e) => {
                log::warn!("Failed to start stopwatch ticker, live updates disabled: {}", e);
                None
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Stopwatch ticker thread panicked");
            }
        }
    }
}
