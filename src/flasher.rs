//! Shared flash phase for heads with a flashing indication.

use crate::time::{TimeInstant, elapsed_exceeds};

/// Toggles a shared on/off phase once per flash period.
///
/// All flashing heads read the same phase, so they blink together.
#[derive(Debug, Clone, Copy)]
pub struct Flasher<I: TimeInstant> {
    period: I::Duration,
    last_toggle: Option<I>,
    on: bool,
}

impl<I: TimeInstant> Flasher<I> {
    /// Creates a flasher that starts in the on phase.
    pub fn new(period: I::Duration) -> Self {
        Self {
            period,
            last_toggle: None,
            on: true,
        }
    }

    /// Advances the phase if the period has elapsed and returns it.
    ///
    /// The first call anchors the period at `now` without toggling.
    pub fn update(&mut self, now: I) -> bool {
        match self.last_toggle {
            None => self.last_toggle = Some(now),
            Some(last) if elapsed_exceeds(now, last, self.period) => {
                self.last_toggle = Some(now);
                self.on = !self.on;
            }
            Some(_) => {}
        }
        self.on
    }

    /// Current phase without advancing.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Flash period.
    pub fn period(&self) -> I::Duration {
        self.period
    }
}
