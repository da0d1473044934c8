//! Progress tracking for long-running matrix computations
//!
//! Backends call [`ProgressTracker::increment`] once per finished unit of
//! work (a keyword on the CPU, a batch on the GPU). The counter is atomic;
//! reporting is serialised so observers see a non-decreasing percentage and
//! exactly one terminal "done" update.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Snapshot pushed to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Finished units
    pub completed: usize,
    /// Total units
    pub total: usize,
    /// Completion percentage in `0..=100`
    pub percent: u8,
    /// Terminal update (emitted once)
    pub done: bool,
}

type Observer = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

#[derive(Debug, Default)]
struct ReportState {
    last_percent: u8,
    done: bool,
    resumed: bool,
}

/// Thread-safe completion counter
pub struct ProgressTracker {
    process: String,
    completion_message: String,
    total: AtomicUsize,
    current: AtomicUsize,
    state: Mutex<ReportState>,
    observer: Option<Observer>,
}

impl ProgressTracker {
    /// Create tracker for `total` units of work
    #[must_use]
    pub fn new(
        process: impl Into<String>,
        completion_message: impl Into<String>,
        total: usize,
    ) -> Self {
        Self {
            process: process.into(),
            completion_message: completion_message.into(),
            total: AtomicUsize::new(total),
            current: AtomicUsize::new(0),
            state: Mutex::new(ReportState::default()),
            observer: None,
        }
    }

    /// Tracker that only logs (used when the caller passes none)
    #[must_use]
    pub fn silent(total: usize) -> Self {
        Self::new("keyword distance matrix", "", total)
    }

    /// Push every update to `observer`
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(ProgressUpdate) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Reset the counter and set the amount of work for a new run
    ///
    /// After [`resume`](Self::resume) the reported percentage and the
    /// terminal flag carry over instead.
    pub fn begin(&self, total: usize) {
        let mut state = self.state.lock();
        self.total.store(total, Ordering::Release);
        self.current.store(0, Ordering::Release);
        if state.resumed {
            state.resumed = false;
        } else {
            *state = ReportState::default();
        }
        info!(process = %self.process, total, "starting");

        if total == 0 {
            self.report(&mut state, 0, 0);
        }
    }

    /// Mark the next [`begin`](Self::begin) as a retry of the current run
    ///
    /// Observers keep seeing a non-decreasing percentage and at most one
    /// terminal update across both attempts.
    pub fn resume(&self) {
        let mut state = self.state.lock();
        state.resumed = true;
        debug!(process = %self.process, percent = state.last_percent, "resuming");
    }

    /// Record one finished unit and report
    pub fn increment(&self) -> ProgressUpdate {
        let mut state = self.state.lock();
        let completed = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        let total = self.total.load(Ordering::Acquire);
        self.report(&mut state, completed, total)
    }

    /// Current percentage
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.state.lock().last_percent
    }

    /// Whether the terminal update has been emitted
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state.lock().done
    }

    /// Finished units so far
    #[must_use]
    pub fn completed(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    fn report(&self, state: &mut ReportState, completed: usize, total: usize) -> ProgressUpdate {
        let percent = percent_of(completed, total).max(state.last_percent);
        state.last_percent = percent;

        let finished = completed >= total;
        let done = finished && !state.done;
        let update = ProgressUpdate {
            completed: completed.min(total),
            total,
            percent,
            done,
        };

        if done {
            state.done = true;
            info!(process = %self.process, "100% complete. {}", self.completion_message);
        } else if !state.done {
            debug!(process = %self.process, percent, "progress");
        }

        // Late increments after completion are not pushed again
        if !finished || done {
            if let Some(observer) = &self.observer {
                observer(update);
            }
        }
        update
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("process", &self.process)
            .field("total", &self.total.load(Ordering::Relaxed))
            .field("current", &self.current.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_possible_truncation)] // Clamped to 100
fn percent_of(completed: usize, total: usize) -> u8 {
    if total == 0 || completed >= total {
        return 100;
    }
    ((completed as u128 * 100) / total as u128) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 4), 0);
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(3, 3), 100);
        assert_eq!(percent_of(5, 3), 100);
        assert_eq!(percent_of(0, 0), 100);
    }

    #[test]
    fn test_increment_until_done() {
        let tracker = ProgressTracker::new("matrix", "Done.", 4);
        tracker.begin(4);

        assert_eq!(tracker.increment().percent, 25);
        assert_eq!(tracker.increment().percent, 50);
        assert_eq!(tracker.increment().percent, 75);
        assert!(!tracker.is_done());

        let last = tracker.increment();
        assert_eq!(last.percent, 100);
        assert!(last.done);
        assert!(tracker.is_done());

        // Extra increments never re-emit the terminal signal
        assert!(!tracker.increment().done);
        assert_eq!(tracker.percent(), 100);
    }

    #[test]
    fn test_zero_work_is_done_on_begin() {
        let tracker = ProgressTracker::silent(0);
        tracker.begin(0);
        assert!(tracker.is_done());
        assert_eq!(tracker.percent(), 100);
    }

    #[test]
    fn test_begin_resets() {
        let tracker = ProgressTracker::silent(1);
        tracker.begin(1);
        tracker.increment();
        assert!(tracker.is_done());

        tracker.begin(2);
        assert!(!tracker.is_done());
        assert_eq!(tracker.percent(), 0);
        assert_eq!(tracker.completed(), 0);
    }

    #[test]
    fn test_resume_keeps_percent_floor() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let tracker = ProgressTracker::new("matrix", "", 0)
            .with_observer(move |update| sink.lock().push(update.percent));

        tracker.begin(2);
        tracker.increment();
        tracker.resume();
        tracker.begin(4);
        assert_eq!(tracker.completed(), 0);
        assert_eq!(tracker.percent(), 50);

        for _ in 0..4 {
            tracker.increment();
        }
        assert_eq!(*seen.lock(), vec![50, 50, 50, 75, 100]);
        assert!(tracker.is_done());

        // Only the next begin is affected
        tracker.begin(1);
        assert_eq!(tracker.percent(), 0);
    }

    #[test]
    fn test_observer_sees_monotonic_updates_under_contention() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let tracker = Arc::new(
            ProgressTracker::new("matrix", "", 800)
                .with_observer(move |update| sink.lock().push(update)),
        );
        tracker.begin(800);

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.increment();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let updates = seen.lock();
        assert_eq!(updates.len(), 800);
        assert!(updates.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert_eq!(updates.iter().filter(|u| u.done).count(), 1);
        assert!(updates.last().is_some_and(|u| u.done && u.percent == 100));
    }
}
