use std::time::Duration;

/// Recurring fixed-interval timer
///
/// Holds the time of the next firing. Polling with the current time returns
/// how many whole intervals have elapsed and schedules the next one.
/// A live `IntervalTimer` is the playback scheduler's timer handle; dropping
/// it cancels all pending firings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    interval: Duration,
    next_due: Duration,
}

impl IntervalTimer {
    /// Start a timer whose first firing is one interval after `now`
    pub fn starting_at(now: Duration, interval: Duration) -> Self {
        Self {
            interval,
            next_due: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    /// Number of firings due at `now`; advances the schedule past them
    pub fn poll(&mut self, now: Duration) -> u32 {
        if now < self.next_due || self.interval.is_zero() {
            return 0;
        }

        let overdue = now - self.next_due;
        let fired = 1 + (overdue.as_nanos() / self.interval.as_nanos()) as u32;
        self.next_due += self.interval * fired;
        fired
    }
}
