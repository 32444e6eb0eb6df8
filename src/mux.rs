//! Duty-cycle color multiplexer.
//!
//! A bi-color LED can only light one leg at a time. Switching between the
//! green and red leg on every tick, faster than flicker fusion, reads as
//! amber. [`ColorMux`] holds the one rotating pattern that every head in
//! [`Aspect::Yellow`](crate::Aspect::Yellow) samples, so all yellow heads
//! switch legs in lockstep.

use crate::types::Leg;

/// Alternating seed: four green and four red ticks per period.
pub const BALANCED_AMBER_PATTERN: u8 = 0b1010_1010;

/// Green-heavy seed (six of eight ticks green), warmer on common bi-color parts.
pub const WARM_AMBER_PATTERN: u8 = 0b1110_1110;

/// Rotating 8-bit green/red selector shared by all heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColorMux {
    pattern: u8,
}

impl ColorMux {
    /// Period of the multiplexer in ticks.
    pub const PERIOD: usize = 8;

    /// Creates a multiplexer seeded with `pattern`.
    pub const fn new(pattern: u8) -> Self {
        Self { pattern }
    }

    /// Rotates the pattern left by one bit and samples the new top bit.
    ///
    /// Call exactly once per tick, before any head renders.
    #[inline]
    pub fn advance_and_sample(&mut self) -> Leg {
        self.pattern = self.pattern.rotate_left(1);
        self.sample()
    }

    /// The leg selected by the current top bit, without advancing.
    #[inline]
    pub fn sample(&self) -> Leg {
        if self.pattern & 0x80 != 0 {
            Leg::Green
        } else {
            Leg::Red
        }
    }

    /// Current pattern.
    pub fn pattern(&self) -> u8 {
        self.pattern
    }

    /// Fraction of a period spent on the green leg.
    pub fn green_duty(&self) -> f32 {
        self.pattern.count_ones() as f32 / Self::PERIOD as f32
    }
}

impl Default for ColorMux {
    fn default() -> Self {
        Self::new(BALANCED_AMBER_PATTERN)
    }
}
