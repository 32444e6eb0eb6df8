//! Time abstraction traits for platform-agnostic timing.
//!
//! The signal bank never sleeps or blocks on time. It samples
//! [`TimeSource::now`] once per tick and compares instants against ramp,
//! flash and report deadlines.

/// Trait for abstracting time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;

    /// Creates duration from milliseconds.
    fn from_millis(millis: u64) -> Self;
}

/// Trait abstraction for instant types.
///
/// Instants must be ordered so deadlines can be checked with `>=`.
pub trait TimeInstant: Copy + PartialOrd {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    ///
    /// Implementations should saturate to zero if `earlier` is in the future.
    fn duration_since(&self, earlier: Self) -> Self::Duration;

    /// Adds duration to instant, returns None on overflow.
    fn checked_add(self, duration: Self::Duration) -> Option<Self>;
}

/// Returns true once `interval` has been strictly exceeded since `since`.
#[inline]
pub(crate) fn elapsed_exceeds<I: TimeInstant>(now: I, since: I, interval: I::Duration) -> bool {
    now.duration_since(since).as_millis() > interval.as_millis()
}
