//! Aspect transition engine for a single signal head.
//!
//! Provides [`SignalHead`], which turns a requested [`Indication`] into a
//! two-bit [`PinCode`] on every tick while simulating the warm-up and
//! cool-down of an incandescent lamp. A head never cross-fades between
//! colors: it always cools down to dark before warming up into the next
//! aspect.
//!
//! Brightness is an 8-bit pattern whose set bits are the lit sub-ticks. Each
//! ramp step shifts one bit in (warming) or out (cooling). On every tick of
//! an active ramp, [`SignalHead::tick`] tests one bit of the pattern and
//! blanks the output if it is clear. This gives finer apparent dimming
//! than the eight ramp steps alone.

use crate::colors;
use crate::command::{HeadAction, Report};
use crate::config::HeadConfig;
use crate::frame::FRAME_SLOTS;
use crate::time::TimeInstant;
use crate::types::{Aspect, ConfigError, Indication, Leg, PinCode, RampState};
use heapless::String;
use palette::Srgb;

/// Maximum head name length in bytes.
pub const NAME_CAPACITY: usize = 16;

/// Fixed-capacity head name.
pub type HeadName = String<NAME_CAPACITY>;

/// Brightness pattern of a fully lit head.
pub const FULL_BRIGHTNESS: u8 = u8::MAX;

/// One bi-color signal head and its transition state.
///
/// Heads are owned by a [`SignalBank`](crate::SignalBank), which ticks them
/// in [`HeadId`](crate::HeadId) order and routes commands to them. They can
/// also be driven directly for testing or custom loops.
#[derive(Debug, Clone)]
pub struct SignalHead<I: TimeInstant> {
    name: HeadName,
    slot: u8,
    indication: Indication,
    current: Aspect,
    target: Aspect,
    brightness: u8,
    ramp_phase: u8,
    next_ramp_deadline: Option<I>,
    output: PinCode,
}

impl<I: TimeInstant> SignalHead<I> {
    /// Creates a dark, stable head.
    ///
    /// # Errors
    /// * `SlotOutOfRange` - `slot` does not fit in a [`Frame`](crate::Frame)
    /// * `EmptyName` - `name` is empty
    /// * `NameTooLong` - `name` exceeds [`NAME_CAPACITY`]
    pub fn new(name: &str, slot: u8) -> Result<Self, ConfigError> {
        if slot >= FRAME_SLOTS {
            return Err(ConfigError::SlotOutOfRange {
                slot,
                max: FRAME_SLOTS - 1,
            });
        }

        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }

        let mut stored = HeadName::new();
        stored
            .push_str(name)
            .map_err(|_| ConfigError::NameTooLong { max: NAME_CAPACITY })?;

        Ok(Self {
            name: stored,
            slot,
            indication: Indication::DARK,
            current: Aspect::Dark,
            target: Aspect::Dark,
            brightness: 0,
            ramp_phase: 0,
            next_ramp_deadline: None,
            output: PinCode::Dark,
        })
    }

    /// Creates a head from its configuration.
    ///
    /// The head starts dark and warms up to the configured initial indication.
    pub fn from_config(config: &HeadConfig) -> Result<Self, ConfigError> {
        let mut head = Self::new(config.name, config.slot)?;
        head.indication = config.initial;
        head.target = config.initial.aspect;
        Ok(head)
    }

    /// Renders this tick's pin code and advances the brightness ramp.
    ///
    /// * `now` - time sampled once for the whole tick
    /// * `flash_on` - shared flash phase
    /// * `leg` - multiplexer sample, used when the lit aspect is yellow
    /// * `ramp_step` - interval between brightness steps
    ///
    /// The ramp advances at most one step per call, however late the call is.
    pub fn tick(&mut self, now: I, flash_on: bool, leg: Leg, ramp_step: I::Duration) -> PinCode {
        if self.indication.flashing {
            self.target = self.indication.target(flash_on);
        }

        let mut code = self.lit_aspect().render(leg);

        if !self.is_stable() {
            self.ramp_phase = (self.ramp_phase + 1) % 8;
            if self.brightness & (1 << self.ramp_phase) == 0 {
                code = PinCode::Dark;
            }

            if self.next_ramp_deadline.is_none_or(|deadline| now >= deadline) {
                // Overflow leaves the deadline unset, which steps again next tick.
                self.next_ramp_deadline = now.checked_add(ramp_step);
                if let Some(stepped) = self.step_ramp(leg) {
                    code = stepped;
                }
            }
        }

        self.output = code;
        code
    }

    /// Advances the ramp by one step, returning a code that overrides the
    /// sub-tick dimming for this tick.
    fn step_ramp(&mut self, leg: Leg) -> Option<PinCode> {
        match self.ramp_state() {
            RampState::Brightening => {
                self.brightness = (self.brightness << 1) | 1;
                if self.brightness == FULL_BRIGHTNESS {
                    self.current = self.target;
                }
                Some(self.target.render(leg))
            }
            RampState::Darkening => {
                self.brightness >>= 1;
                if self.brightness == 0 {
                    self.current = Aspect::Dark;
                    self.target = self.indication.aspect;
                    Some(PinCode::Dark)
                } else {
                    None
                }
            }
            RampState::Stable => None,
        }
    }

    /// Applies a command action and reports which state should be published.
    ///
    /// This is the only path through which commands mutate a head. Setting an
    /// indication forces the target dark, so even a repeat of the current
    /// aspect cools down and warms up again.
    pub fn apply(&mut self, action: HeadAction) -> Option<Report> {
        match action {
            HeadAction::SetFlashing(flashing) => {
                self.indication.flashing = flashing;
                Some(Report::FlashingState)
            }
            HeadAction::SetIndication(indication) => {
                self.indication = indication;
                self.target = Aspect::Dark;
                (indication.aspect != self.current).then_some(Report::AspectState)
            }
            HeadAction::Query => Some(Report::AspectState),
        }
    }

    /// The aspect whose color is lit during the current ramp.
    fn lit_aspect(&self) -> Aspect {
        if self.current == Aspect::Dark {
            self.target
        } else {
            self.current
        }
    }

    /// Returns the current transition phase.
    pub fn ramp_state(&self) -> RampState {
        if self.is_stable() {
            RampState::Stable
        } else if self.current == Aspect::Dark && self.target != Aspect::Dark {
            RampState::Brightening
        } else {
            RampState::Darkening
        }
    }

    /// Returns true if no ramp is in progress.
    ///
    /// Brightness is not part of the test. A flashing head whose phase turns
    /// back on mid cool-down is stable again at the partial pattern, and its
    /// next cool-down starts from there.
    pub fn is_stable(&self) -> bool {
        self.current == self.indication.aspect && self.current == self.target
    }

    /// Head name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output slot.
    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Requested indication.
    pub fn indication(&self) -> Indication {
        self.indication
    }

    /// Requested aspect.
    pub fn aspect(&self) -> Aspect {
        self.indication.aspect
    }

    /// Returns true if the head is set to flash.
    pub fn is_flashing(&self) -> bool {
        self.indication.flashing
    }

    /// Aspect the last completed ramp reached.
    pub fn current_aspect(&self) -> Aspect {
        self.current
    }

    /// Aspect the ramp is moving toward.
    pub fn target_aspect(&self) -> Aspect {
        self.target
    }

    /// Brightness pattern; the number of set bits is the brightness level.
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Pin code rendered on the last tick.
    pub fn output(&self) -> PinCode {
        self.output
    }

    /// Approximate color an observer sees, averaged over sub-tick switching.
    ///
    /// `green_duty` is the multiplexer's share of green ticks, used for yellow.
    pub fn perceived_color(&self, green_duty: f32) -> Srgb {
        let color = colors::aspect_color(self.lit_aspect(), green_duty);
        if self.is_stable() {
            color
        } else {
            colors::dimmed(color, self.brightness)
        }
    }
}
