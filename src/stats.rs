//! Loop rate statistics for status reports.

use crate::time::{TimeDuration, TimeInstant, elapsed_exceeds};

/// Counts loop iterations and averages the rate over fixed windows.
#[derive(Debug, Clone, Copy)]
pub struct LoopStats<I: TimeInstant> {
    window: I::Duration,
    window_start: Option<I>,
    iterations: u32,
    rate_sum: u64,
    windows: u32,
}

impl<I: TimeInstant> LoopStats<I> {
    /// Creates statistics measured over `window`.
    pub fn new(window: I::Duration) -> Self {
        Self {
            window,
            window_start: None,
            iterations: 0,
            rate_sum: 0,
            windows: 0,
        }
    }

    /// Records one loop iteration at `now`.
    ///
    /// Closes the current window once it has run longer than the window length.
    pub fn record(&mut self, now: I) {
        self.iterations = self.iterations.saturating_add(1);

        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return;
        };

        if elapsed_exceeds(now, start, self.window) {
            let elapsed_ms = now.duration_since(start).as_millis().max(1);
            self.rate_sum += u64::from(self.iterations) * 1000 / elapsed_ms;
            self.windows += 1;
            self.iterations = 0;
            self.window_start = Some(now);
        }
    }

    /// Mean iterations per second over closed windows, then resets.
    ///
    /// Returns `None` if no window has closed since the last call.
    pub fn take_average(&mut self) -> Option<u32> {
        if self.windows == 0 {
            return None;
        }
        let average = self.rate_sum / u64::from(self.windows);
        self.rate_sum = 0;
        self.windows = 0;
        Some(u32::try_from(average).unwrap_or(u32::MAX))
    }

    /// Number of closed windows awaiting [`take_average`](Self::take_average).
    pub fn closed_windows(&self) -> u32 {
        self.windows
    }

    /// Window length.
    pub fn window(&self) -> I::Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct TestDuration(u64);

    impl TimeDuration for TestDuration {
        fn as_millis(&self) -> u64 {
            self.0
        }

        fn from_millis(millis: u64) -> Self {
            TestDuration(millis)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct TestInstant(u64);

    impl TimeInstant for TestInstant {
        type Duration = TestDuration;

        fn duration_since(&self, earlier: Self) -> Self::Duration {
            TestDuration(self.0.saturating_sub(earlier.0))
        }

        fn checked_add(self, duration: Self::Duration) -> Option<Self> {
            self.0.checked_add(duration.0).map(TestInstant)
        }
    }

    #[test]
    fn averages_closed_windows() {
        let mut stats = LoopStats::new(TestDuration(1000));

        // 1 iteration every 10 ms: 100 per second.
        for t in (0..=2020).step_by(10) {
            stats.record(TestInstant(t));
        }
        assert_eq!(stats.closed_windows(), 2);
        assert_eq!(stats.take_average(), Some(100));
        assert_eq!(stats.take_average(), None);
    }
}
