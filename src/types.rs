//! Core types shared by the transition engine, composer and command protocol.

/// The semantic color a signal head shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Aspect {
    /// Green leg lit.
    Green,

    /// Red leg lit.
    Red,

    /// Amber, synthesized by alternating green and red every tick.
    Yellow,

    /// Both legs off.
    #[default]
    Dark,
}

impl Aspect {
    /// Renders this aspect to a pin code.
    ///
    /// `leg` is the multiplexer sample for this tick and is only consulted
    /// for [`Aspect::Yellow`].
    #[inline]
    pub fn render(self, leg: Leg) -> PinCode {
        match self {
            Aspect::Green => PinCode::Green,
            Aspect::Red => PinCode::Red,
            Aspect::Yellow => leg.pin_code(),
            Aspect::Dark => PinCode::Dark,
        }
    }

    /// Upper-case name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Aspect::Green => "GREEN",
            Aspect::Red => "RED",
            Aspect::Yellow => "YELLOW",
            Aspect::Dark => "DARK",
        }
    }
}

/// One leg of a bi-color LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Leg {
    Green,
    Red,
}

impl Leg {
    /// Pin code that lights this leg.
    #[inline]
    pub fn pin_code(self) -> PinCode {
        match self {
            Leg::Green => PinCode::Green,
            Leg::Red => PinCode::Red,
        }
    }
}

/// Two-bit electrical code for one head's pair of register outputs.
///
/// The LED sits between the two outputs, so exactly one output high lights
/// one leg and both outputs high leaves it dark. Both low is never driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PinCode {
    Red = 0b01,
    Green = 0b10,
    #[default]
    Dark = 0b11,
}

impl PinCode {
    /// Raw two-bit value.
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decodes a two-bit value, returning `None` for the unused `0b00`.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0b11 {
            0b01 => Some(PinCode::Red),
            0b10 => Some(PinCode::Green),
            0b11 => Some(PinCode::Dark),
            _ => None,
        }
    }
}

/// A requested aspect with the flashing overlay applied on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Indication {
    /// Steady-state color.
    pub aspect: Aspect,

    /// Alternate between `aspect` and dark at the shared flash period.
    pub flashing: bool,
}

impl Indication {
    /// Dark, not flashing.
    pub const DARK: Self = Self::steady(Aspect::Dark);

    /// Creates a non-flashing indication.
    #[inline]
    pub const fn steady(aspect: Aspect) -> Self {
        Self {
            aspect,
            flashing: false,
        }
    }

    /// Creates a flashing indication.
    #[inline]
    pub const fn flashing(aspect: Aspect) -> Self {
        Self {
            aspect,
            flashing: true,
        }
    }

    /// The aspect the ramp should be heading for in the given flash phase.
    #[inline]
    pub fn target(self, flash_on: bool) -> Aspect {
        if !self.flashing || flash_on {
            self.aspect
        } else {
            Aspect::Dark
        }
    }

    /// Parses a command payload such as `green` or `FLASHINGRED`, ignoring case.
    ///
    /// Flashing dark is not a valid indication.
    pub fn parse(payload: &str) -> Option<Self> {
        const TABLE: [(&str, Indication); 7] = [
            ("GREEN", Indication::steady(Aspect::Green)),
            ("RED", Indication::steady(Aspect::Red)),
            ("YELLOW", Indication::steady(Aspect::Yellow)),
            ("DARK", Indication::steady(Aspect::Dark)),
            ("FLASHINGGREEN", Indication::flashing(Aspect::Green)),
            ("FLASHINGRED", Indication::flashing(Aspect::Red)),
            ("FLASHINGYELLOW", Indication::flashing(Aspect::Yellow)),
        ];

        TABLE
            .iter()
            .find(|(word, _)| payload.eq_ignore_ascii_case(word))
            .map(|&(_, indication)| indication)
    }

    /// Wire form, e.g. `FLASHINGGREEN`.
    pub fn as_str(self) -> &'static str {
        match (self.flashing, self.aspect) {
            (false, aspect) => aspect.as_str(),
            (true, Aspect::Green) => "FLASHINGGREEN",
            (true, Aspect::Red) => "FLASHINGRED",
            (true, Aspect::Yellow) => "FLASHINGYELLOW",
            (true, Aspect::Dark) => "FLASHINGDARK",
        }
    }
}

/// Stable index of a head within a [`SignalBank`](crate::SignalBank).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeadId(pub usize);

impl From<usize> for HeadId {
    fn from(id: usize) -> Self {
        HeadId(id)
    }
}

impl From<HeadId> for usize {
    fn from(id: HeadId) -> Self {
        id.0
    }
}

/// Which phase of the aspect transition a head is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampState {
    /// Showing the requested aspect at full brightness, or fully dark.
    Stable,

    /// Cooling down toward dark.
    Darkening,

    /// Warming up from dark toward the target aspect.
    Brightening,
}

/// Bank construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No heads were configured.
    NoHeads,

    /// More heads configured than the bank can hold.
    TooManyHeads { capacity: usize },

    /// A slot index does not fit in the output frame.
    SlotOutOfRange { slot: u8, max: u8 },

    /// Two heads share an output slot.
    DuplicateSlot(u8),

    /// Two heads share a name.
    DuplicateName,

    /// Head name is empty.
    EmptyName,

    /// Head name does not fit the name buffer.
    NameTooLong { max: usize },

    /// Ramp step interval or flash period is zero.
    ZeroInterval,

    /// Topic prefix or hostname does not fit its buffer.
    IdentityTooLong,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::NoHeads => write!(f, "at least one signal head must be configured"),
            ConfigError::TooManyHeads { capacity } => {
                write!(f, "bank capacity of {} heads exceeded", capacity)
            }
            ConfigError::SlotOutOfRange { slot, max } => {
                write!(f, "output slot {} exceeds the highest slot {}", slot, max)
            }
            ConfigError::DuplicateSlot(slot) => {
                write!(f, "output slot {} is assigned to more than one head", slot)
            }
            ConfigError::DuplicateName => write!(f, "head names must be unique"),
            ConfigError::EmptyName => write!(f, "head name must not be empty"),
            ConfigError::NameTooLong { max } => {
                write!(f, "head name longer than {} bytes", max)
            }
            ConfigError::ZeroInterval => {
                write!(f, "ramp step and flash period must be non-zero")
            }
            ConfigError::IdentityTooLong => {
                write!(f, "topic prefix or hostname too long")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
