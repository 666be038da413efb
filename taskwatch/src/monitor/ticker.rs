//! Poll scheduling.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Interval, MissedTickBehavior};

/// Source of poll cycle start signals.
#[async_trait]
pub trait Ticker: Send {
    /// Wait until the next cycle should start.
    async fn tick(&mut self);
}

/// Fixed-period ticker. The first tick completes immediately; an overrun
/// cycle delays the following ones instead of bursting.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Must be called from within a tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticker_period() {
        let mut ticker = IntervalTicker::new(Duration::from_secs(60));

        let start = tokio::time::Instant::now();
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        ticker.tick().await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
