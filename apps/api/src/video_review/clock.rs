//! Countdown clock. The session only ever asks "has one more second passed?",
//! so tests swap the wall clock for tokio's paused virtual time.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[async_trait]
pub trait Ticker: Send {
    /// Resolves once the next period has elapsed.
    async fn tick(&mut self);

    /// Re-arms the ticker so the next tick lands one full period from now.
    fn restart(&mut self);
}

pub struct IntervalTicker {
    period: Duration,
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: Self::build(period),
        }
    }

    fn build(period: Duration) -> Interval {
        // interval() fires immediately; the countdown must wait a full second first.
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }

    fn restart(&mut self) {
        self.interval = Self::build(self.period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_a_full_period() {
        let mut ticker = IntervalTicker::default();
        let start = Instant::now();
        ticker.tick().await;
        assert_eq!(start.elapsed(), TICK_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ten_ticks_take_ten_seconds() {
        let mut ticker = IntervalTicker::default();
        let start = Instant::now();
        for _ in 0..10 {
            ticker.tick().await;
        }
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_rearms_period() {
        let mut ticker = IntervalTicker::default();
        tokio::time::advance(Duration::from_millis(700)).await;
        ticker.restart();
        let start = Instant::now();
        ticker.tick().await;
        assert_eq!(start.elapsed(), TICK_PERIOD);
    }
}
