//! Time sources for the motion loops.
//!
//! A [`Clock`] provides three things to a timed primitive:
//! - a monotonic timestamp (`now`)
//! - a fixed-rate sleep (`sleep_until_next_tick`)
//! - a cooperative cancellation flag (`is_cancelled`), polled once per tick
//!
//! [`SystemClock`] runs in real time against `std::time::Instant`.
//! [`SimClock`] runs in virtual time and never blocks, which makes the
//! loops deterministic under test.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Time source and cancellation signal consumed by the motion primitives.
pub trait Clock {
    /// Monotonic timestamp.
    fn now(&self) -> Instant;

    /// Suspend until the next tick boundary at `frequency_hz`.
    fn sleep_until_next_tick(&mut self, frequency_hz: f64);

    /// True once the owner wants the current motion to end.
    fn is_cancelled(&self) -> bool;

    /// Restart the tick schedule. Called once before the first tick of a motion.
    fn begin_ticks(&mut self) {}
}

/// Period of one tick at `frequency_hz`, rounded to whole nanoseconds.
///
/// `frequency_hz` must be finite and positive.
pub fn tick_period(frequency_hz: f64) -> Duration {
    Duration::from_nanos((1e9 / frequency_hz).round() as u64)
}

/// Real-time clock backed by `Instant` and `thread::sleep`.
///
/// Ticks follow a fixed schedule: each wake-up is one period after the
/// previous one, so time spent publishing does not stretch the period.
/// If the caller falls more than a full period behind, the schedule
/// restarts from the current instant instead of firing a burst of ticks.
#[derive(Debug)]
pub struct SystemClock {
    shutdown: Arc<AtomicBool>,
    last_tick: Option<Instant>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::with_shutdown(Arc::new(AtomicBool::new(false)))
    }

    /// Use an existing shutdown flag (e.g. one shared with a signal handler).
    pub fn with_shutdown(shutdown: Arc<AtomicBool>) -> Self {
        Self {
            shutdown,
            last_tick: None,
        }
    }

    /// Flag that cancels any running motion when set to `true`.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until_next_tick(&mut self, frequency_hz: f64) {
        let period = tick_period(frequency_hz);
        let now = Instant::now();
        let target = self.last_tick.unwrap_or(now) + period;

        if target > now {
            std::thread::sleep(target - now);
            self.last_tick = Some(target);
        } else if now.duration_since(target) > period {
            tracing::trace!(
                "Tick schedule behind by {:?}, restarting",
                now.duration_since(target)
            );
            self.last_tick = Some(now);
        } else {
            self.last_tick = Some(target);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn begin_ticks(&mut self) {
        self.last_tick = Some(Instant::now());
    }
}

/// Virtual clock for tests and dry runs.
///
/// Every `sleep_until_next_tick` advances virtual time by one period
/// (plus an optional fixed jitter) and returns immediately.
#[derive(Debug, Clone)]
pub struct SimClock {
    origin: Instant,
    elapsed: Duration,
    jitter: Duration,
    sleeps: u64,
    cancel_after: Option<u64>,
    cancelled: bool,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Duration::ZERO,
            jitter: Duration::ZERO,
            sleeps: 0,
            cancel_after: None,
            cancelled: false,
        }
    }

    /// Report cancellation once `ticks` sleeps have completed.
    pub fn cancel_after(mut self, ticks: u64) -> Self {
        self.cancel_after = Some(ticks);
        self
    }

    /// Add a fixed scheduling delay to every sleep.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Move virtual time forward without counting a tick.
    pub fn advance(&mut self, by: Duration) {
        self.elapsed += by;
    }

    /// Virtual time since construction.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of completed sleeps.
    pub fn sleeps(&self) -> u64 {
        self.sleeps
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed
    }

    fn sleep_until_next_tick(&mut self, frequency_hz: f64) {
        self.elapsed += tick_period(frequency_hz) + self.jitter;
        self.sleeps += 1;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled || self.cancel_after.is_some_and(|n| self.sleeps >= n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_period() {
        assert_eq!(tick_period(10.0), Duration::from_millis(100));
        assert_eq!(tick_period(20.0), Duration::from_millis(50));
        assert_eq!(tick_period(3.0), Duration::from_nanos(333_333_333));
    }

    #[test]
    fn test_sim_clock_advances_one_period_per_sleep() {
        let mut clock = SimClock::new();
        let start = clock.now();

        for _ in 0..5 {
            clock.sleep_until_next_tick(10.0);
        }

        assert_eq!(clock.now() - start, Duration::from_millis(500));
        assert_eq!(clock.sleeps(), 5);
    }

    #[test]
    fn test_sim_clock_jitter() {
        let mut clock = SimClock::new().with_jitter(Duration::from_millis(7));
        clock.sleep_until_next_tick(10.0);
        clock.sleep_until_next_tick(10.0);
        assert_eq!(clock.elapsed(), Duration::from_millis(214));
    }

    #[test]
    fn test_sim_clock_cancel_after() {
        let mut clock = SimClock::new().cancel_after(2);
        assert!(!clock.is_cancelled());
        clock.sleep_until_next_tick(10.0);
        assert!(!clock.is_cancelled());
        clock.sleep_until_next_tick(10.0);
        assert!(clock.is_cancelled());
    }

    #[test]
    fn test_sim_clock_manual_cancel() {
        let mut clock = SimClock::new();
        clock.cancel();
        assert!(clock.is_cancelled());
    }

    #[test]
    fn test_sim_clock_advance_does_not_count_tick() {
        let mut clock = SimClock::new();
        let start = clock.now();

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));
        assert_eq!(clock.sleeps(), 0);
    }

    #[test]
    fn test_system_clock_signal_shutdown() {
        let clock = SystemClock::new();
        let handle = clock.shutdown_handle();

        clock.signal_shutdown();
        assert!(clock.is_cancelled());
        assert!(handle.load(Ordering::SeqCst));
    }

    #[test]
    fn test_system_clock_shutdown_flag() {
        let clock = SystemClock::new();
        assert!(!clock.is_cancelled());

        let handle = clock.shutdown_handle();
        handle.store(true, Ordering::SeqCst);
        assert!(clock.is_cancelled());
    }

    #[test]
    fn test_system_clock_keeps_rate() {
        let mut clock = SystemClock::new();
        clock.begin_ticks();
        let start = Instant::now();

        for _ in 0..3 {
            clock.sleep_until_next_tick(50.0);
        }

        // 3 ticks at 20ms; allow generous scheduler slack on the upper bound
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(55), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(500), "elapsed {:?}", elapsed);
    }
}
