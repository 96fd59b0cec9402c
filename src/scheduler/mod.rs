//! Scheduler - paces the tick loop against a clock

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    time::{Duration, Instant},
};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Time source used by the scheduler.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when told to. Clones share the same timeline, so a
/// test can keep one handle and give the other to a scheduler.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Rc<Cell<Duration>>,
    sleeps: Rc<RefCell<Vec<Duration>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
            sleeps: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}

/// How ticks are spaced in time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Wait the full interval after every tick; the real period is the
    /// interval plus however long the tick took.
    #[default]
    FixedDelay,
    /// Start ticks on a fixed grid of deadlines. An overrunning tick moves the
    /// grid to the moment it finished; missed ticks are never replayed.
    FixedRate,
}

/// Statistics for a single tick
#[derive(Debug, Clone)]
pub struct TickStats {
    pub tick: u64,
    pub duration: Duration,
    pub slept: Duration,
}

pub struct TickScheduler<C: Clock> {
    interval: Duration,
    cadence: Cadence,
    clock: C,
    tick_count: u64,
    next_deadline: Option<Instant>,
    stats_history: VecDeque<TickStats>,
    max_stats_history: usize,
}

impl<C: Clock> TickScheduler<C> {
    pub fn new(interval: Duration, cadence: Cadence, clock: C) -> Self {
        Self {
            interval,
            cadence,
            clock,
            tick_count: 0,
            next_deadline: None,
            stats_history: VecDeque::new(),
            max_stats_history: 100,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Get recent tick statistics
    pub fn recent_stats(&self) -> impl Iterator<Item = &TickStats> {
        self.stats_history.iter()
    }

    /// Get average tick time from recent history
    pub fn average_tick_time(&self) -> Option<Duration> {
        if self.stats_history.is_empty() {
            return None;
        }

        let total: Duration = self.stats_history.iter().map(|s| s.duration).sum();
        Some(total / self.stats_history.len() as u32)
    }

    /// Calls `tick` with the 1-based tick number until `max_ticks` ticks have
    /// run, or forever when no limit is given. The first tick runs
    /// immediately and no wait follows the last one. Returns the number of
    /// ticks run so far.
    pub fn run<F>(&mut self, max_ticks: Option<u64>, mut tick: F) -> Result<u64>
    where
        F: FnMut(u64) -> Result<()>,
    {
        loop {
            if max_ticks.is_some_and(|limit| self.tick_count >= limit) {
                break;
            }

            let started = self.clock.now();
            tick(self.tick_count + 1)?;
            self.tick_count += 1;
            let finished = self.clock.now();
            let duration = finished.saturating_duration_since(started);

            let last = max_ticks.is_some_and(|limit| self.tick_count >= limit);
            let wait = if last {
                Duration::ZERO
            } else {
                self.next_wait(started, finished)
            };

            self.record(TickStats {
                tick: self.tick_count,
                duration,
                slept: wait,
            });
            tracing::trace!(tick = self.tick_count, ?duration, ?wait, "tick finished");

            if !wait.is_zero() {
                self.clock.sleep(wait);
            }
        }
        Ok(self.tick_count)
    }

    fn next_wait(&mut self, started: Instant, finished: Instant) -> Duration {
        match self.cadence {
            Cadence::FixedDelay => self.interval,
            Cadence::FixedRate => {
                let deadline = self.next_deadline.unwrap_or(started) + self.interval;
                if finished >= deadline {
                    tracing::debug!(
                        tick = self.tick_count,
                        overrun = ?finished.saturating_duration_since(deadline),
                        "tick overran its slot"
                    );
                    self.next_deadline = Some(finished);
                    Duration::ZERO
                } else {
                    self.next_deadline = Some(deadline);
                    deadline.saturating_duration_since(finished)
                }
            }
        }
    }

    fn record(&mut self, stats: TickStats) {
        self.stats_history.push_back(stats);
        if self.stats_history.len() > self.max_stats_history {
            self.stats_history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn run_with_work(cadence: Cadence, work: &[u64]) -> (u64, Vec<Duration>) {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let mut scheduler = TickScheduler::new(ms(1_000), cadence, clock);
        let work = work.to_vec();
        let ran = scheduler
            .run(Some(work.len() as u64), |tick| {
                handle.advance(ms(work[(tick - 1) as usize]));
                Ok(())
            })
            .unwrap();
        (ran, handle.sleeps())
    }

    #[test]
    fn fixed_delay_waits_full_interval_between_ticks() {
        let (ran, sleeps) = run_with_work(Cadence::FixedDelay, &[300, 300, 300]);
        assert_eq!(ran, 3);
        assert_eq!(sleeps, vec![ms(1_000), ms(1_000)]);
    }

    #[test]
    fn fixed_rate_subtracts_processing_time() {
        let (_, sleeps) = run_with_work(Cadence::FixedRate, &[300, 200, 100]);
        assert_eq!(sleeps, vec![ms(700), ms(800)]);
    }

    #[test]
    fn fixed_rate_overrun_does_not_catch_up() {
        let (_, sleeps) = run_with_work(Cadence::FixedRate, &[1_500, 100, 100]);
        // First tick overruns: no sleep, grid re-based on its finish time.
        assert_eq!(sleeps, vec![ms(900)]);
    }

    #[test]
    fn stats_track_tick_durations() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let mut scheduler = TickScheduler::new(ms(50), Cadence::FixedDelay, clock);
        scheduler
            .run(Some(2), |_| {
                handle.advance(ms(10));
                Ok(())
            })
            .unwrap();

        let stats: Vec<_> = scheduler.recent_stats().collect();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].tick, 1);
        assert_eq!(stats[0].slept, ms(50));
        assert_eq!(stats[1].slept, Duration::ZERO);
        assert_eq!(scheduler.average_tick_time(), Some(ms(10)));
        assert_eq!(handle.elapsed(), ms(70));
    }

    #[test]
    fn run_resumes_after_previous_limit() {
        let mut scheduler = TickScheduler::new(ms(5), Cadence::FixedDelay, ManualClock::new());
        let mut seen = Vec::new();
        scheduler
            .run(Some(2), |tick| {
                seen.push(tick);
                Ok(())
            })
            .unwrap();
        scheduler
            .run(Some(4), |tick| {
                seen.push(tick);
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[test]
    fn tick_error_stops_the_loop() {
        let mut scheduler = TickScheduler::new(ms(5), Cadence::FixedDelay, ManualClock::new());
        let result = scheduler.run(None, |tick| {
            if tick == 3 {
                anyhow::bail!("stop");
            }
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(scheduler.tick_count(), 2);
    }
}
