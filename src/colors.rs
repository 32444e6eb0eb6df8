//! Perceived color helpers.
//!
//! Maps aspects and brightness patterns to `palette::Srgb` so simulators and
//! host-side tools can show what a head looks like without real hardware.

use crate::types::Aspect;
use palette::{Mix, Srgb};

/// Green leg at full brightness.
pub const LED_GREEN: Srgb = Srgb::new(0.0, 1.0, 0.0);

/// Red leg at full brightness.
pub const LED_RED: Srgb = Srgb::new(1.0, 0.0, 0.0);

/// Both legs off.
pub const LED_OFF: Srgb = Srgb::new(0.0, 0.0, 0.0);

/// Full-brightness color of an aspect.
///
/// Yellow is the red/green blend for the given share of green ticks.
#[inline]
pub fn aspect_color(aspect: Aspect, green_duty: f32) -> Srgb {
    match aspect {
        Aspect::Green => LED_GREEN,
        Aspect::Red => LED_RED,
        Aspect::Yellow => LED_RED.mix(LED_GREEN, green_duty.clamp(0.0, 1.0)),
        Aspect::Dark => LED_OFF,
    }
}

/// Scales `color` by the share of lit bits in a brightness pattern.
#[inline]
pub fn dimmed(color: Srgb, brightness: u8) -> Srgb {
    let level = brightness.count_ones() as f32 / 8.0;
    LED_OFF.mix(color, level)
}
