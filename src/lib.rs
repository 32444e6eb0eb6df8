#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Aspect`**: The color a head shows: `Green`, `Red`, `Yellow` or `Dark`
//! - **`Indication`**: An aspect plus the flashing overlay, as requested by commands
//! - **`SignalHead`**: Transition engine for one bi-color head, rendering a `PinCode` per tick
//! - **`ColorMux`**: Shared duty-cycle multiplexer that synthesizes yellow from green and red
//! - **`Frame`** / **`FrameComposer`**: The shared output word and the mask-and-merge packer
//! - **`SignalBank`**: Owns all heads and runs the tick loop
//! - **`OutputRegister`**: Trait to implement for your output register hardware
//! - **`Transport`**: Trait to implement for your message bus client
//! - **`TimeSource`**: Trait to implement for your timing system
//! - **`HeadCommand`**: A parsed command targeting one head
//!
//! A head never changes color directly. It cools down to dark and then warms
//! up into the new aspect, imitating an incandescent lamp.

#[macro_use]
mod fmt;

pub mod time;
pub mod types;
pub mod config;
pub mod mux;
pub mod flasher;
pub mod colors;
pub mod head;
pub mod frame;
pub mod command;
pub mod publish;
pub mod stats;
pub mod bank;

pub use bank::{BankBuilder, BankError, SignalBank};
pub use command::{HeadAction, HeadCommand, Report, parse_command};
pub use config::{HeadConfig, SignalConfig};
pub use flasher::Flasher;
pub use frame::{FRAME_SLOTS, Frame, FrameComposer, OutputRegister};
pub use head::{FULL_BRIGHTNESS, NAME_CAPACITY, SignalHead};
pub use mux::{BALANCED_AMBER_PATTERN, ColorMux, WARM_AMBER_PATTERN};
pub use publish::{PublishError, StatePublisher, StatusClock, Transport};
pub use stats::LoopStats;
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use types::{Aspect, ConfigError, HeadId, Indication, Leg, PinCode, RampState};

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;
