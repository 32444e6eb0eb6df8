//! Bank-wide timing, identity and per-head configuration.

use crate::mux::BALANCED_AMBER_PATTERN;
use crate::time::TimeDuration;
use crate::types::{Aspect, Indication};

/// Default interval between brightness ramp steps, in milliseconds.
///
/// A full cool-down takes eight steps and a color change sixteen.
pub const DEFAULT_RAMP_STEP_MS: u64 = 44;

/// Default flash half-period, in milliseconds.
pub const DEFAULT_FLASH_PERIOD_MS: u64 = 1000;

/// Default interval between status reports, in milliseconds.
pub const DEFAULT_REPORT_INTERVAL_MS: u64 = 600_000;

/// Default loop statistics window, in milliseconds.
pub const DEFAULT_STATS_WINDOW_MS: u64 = 10_000;

/// Default topic prefix.
pub const DEFAULT_TOPIC_PREFIX: &str = "JMRI/signal";

/// Default device hostname used for status topics.
pub const DEFAULT_HOSTNAME: &str = "HOsrv01";

/// Configuration shared by every head in a bank.
#[derive(Debug, Clone, Copy)]
pub struct SignalConfig<D: TimeDuration> {
    /// Time between brightness ramp steps.
    pub ramp_step: D,

    /// Time between flash phase toggles.
    pub flash_period: D,

    /// Seed for the yellow duty-cycle multiplexer.
    pub amber_pattern: u8,

    /// Time between periodic status reports.
    pub report_interval: D,

    /// Window over which the loop rate is measured.
    pub stats_window: D,

    /// Topic prefix for commands and state, without trailing slash.
    pub topic_prefix: &'static str,

    /// Device name used in status and announcement topics.
    pub hostname: &'static str,
}

impl<D: TimeDuration> SignalConfig<D> {
    /// Sets the ramp step interval.
    pub fn ramp_step(mut self, step: D) -> Self {
        self.ramp_step = step;
        self
    }

    /// Sets the flash period.
    pub fn flash_period(mut self, period: D) -> Self {
        self.flash_period = period;
        self
    }

    /// Sets the multiplexer seed.
    pub fn amber_pattern(mut self, pattern: u8) -> Self {
        self.amber_pattern = pattern;
        self
    }

    /// Sets the status report interval.
    pub fn report_interval(mut self, interval: D) -> Self {
        self.report_interval = interval;
        self
    }

    /// Sets the loop statistics window.
    pub fn stats_window(mut self, window: D) -> Self {
        self.stats_window = window;
        self
    }

    /// Sets the topic prefix. A trailing `/` is ignored.
    pub fn topic_prefix(mut self, prefix: &'static str) -> Self {
        self.topic_prefix = prefix.trim_end_matches('/');
        self
    }

    /// Sets the device hostname.
    pub fn hostname(mut self, hostname: &'static str) -> Self {
        self.hostname = hostname;
        self
    }
}

impl<D: TimeDuration> Default for SignalConfig<D> {
    fn default() -> Self {
        Self {
            ramp_step: D::from_millis(DEFAULT_RAMP_STEP_MS),
            flash_period: D::from_millis(DEFAULT_FLASH_PERIOD_MS),
            amber_pattern: BALANCED_AMBER_PATTERN,
            report_interval: D::from_millis(DEFAULT_REPORT_INTERVAL_MS),
            stats_window: D::from_millis(DEFAULT_STATS_WINDOW_MS),
            topic_prefix: DEFAULT_TOPIC_PREFIX,
            hostname: DEFAULT_HOSTNAME,
        }
    }
}

/// Configuration for a single signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadConfig {
    /// Name used to route commands and publish state.
    pub name: &'static str,

    /// Two-bit slot in the output frame.
    pub slot: u8,

    /// Indication to warm up to after power-on.
    pub initial: Indication,
}

impl HeadConfig {
    /// Creates a head that starts dark.
    pub const fn new(name: &'static str, slot: u8) -> Self {
        Self {
            name,
            slot,
            initial: Indication::DARK,
        }
    }

    /// Sets the power-on indication.
    pub const fn initial(mut self, indication: Indication) -> Self {
        self.initial = indication;
        self
    }

    /// Sets a steady power-on aspect.
    pub const fn initial_aspect(self, aspect: Aspect) -> Self {
        self.initial(Indication::steady(aspect))
    }
}
