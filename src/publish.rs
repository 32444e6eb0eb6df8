//! State publication over the message bus.
//!
//! Topics are rendered into fixed-capacity buffers:
//!
//! - `<prefix>/<name>` carries the combined indication, e.g. `FLASHINGRED`;
//! - `<prefix>/light/<name>/{green,yellow,red,flashing}` carry `ON` or `OFF`.
//!
//! Publication is fire-and-forget. Delivery and reconnection belong to the
//! [`Transport`] implementation.

use core::fmt::Write;

use crate::head::SignalHead;
use crate::time::TimeInstant;
use crate::types::{Aspect, ConfigError};
use heapless::String;

/// Capacity of rendered topic buffers.
pub const TOPIC_CAPACITY: usize = 96;

/// Capacity of the stored topic prefix and hostname.
pub const IDENTITY_CAPACITY: usize = 32;

/// Capacity of status payloads such as timestamps.
pub const PAYLOAD_CAPACITY: usize = 48;

/// Fixed-capacity topic.
pub type Topic = String<TOPIC_CAPACITY>;

/// Trait for abstracting the message bus client.
pub trait Transport {
    /// Transport-specific error.
    type Error;

    /// Publishes `payload` on `topic`.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Self::Error>;

    /// Subscribes to a topic pattern.
    fn subscribe(&mut self, pattern: &str) -> Result<(), Self::Error>;

    /// Returns true while a session is established.
    fn is_connected(&self) -> bool;
}

/// Trait for the wall-clock collaborator used in status reports.
pub trait StatusClock {
    /// Writes a human-readable timestamp.
    fn write_timestamp<W: Write>(&self, out: &mut W) -> core::fmt::Result;
}

/// Errors that can occur while publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishError<E> {
    /// Rendered topic or payload exceeded its buffer.
    TooLong,

    /// The transport rejected the message.
    Transport(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for PublishError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PublishError::TooLong => write!(f, "topic or payload exceeds buffer capacity"),
            PublishError::Transport(err) => write!(f, "transport error: {:?}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for PublishError<E> {}

/// Boolean state payload.
#[inline]
pub fn on_off(state: bool) -> &'static str {
    if state { "ON" } else { "OFF" }
}

/// Renders head state into topics and publishes it.
#[derive(Debug, Clone)]
pub struct StatePublisher {
    prefix: String<IDENTITY_CAPACITY>,
}

impl StatePublisher {
    /// Creates a publisher for `prefix` (without trailing slash).
    ///
    /// # Errors
    /// * `IdentityTooLong` - prefix exceeds [`IDENTITY_CAPACITY`]
    pub fn new(prefix: &str) -> Result<Self, ConfigError> {
        let mut stored = String::new();
        stored
            .push_str(prefix.trim_end_matches('/'))
            .map_err(|_| ConfigError::IdentityTooLong)?;
        Ok(Self { prefix: stored })
    }

    /// Topic prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Renders `<prefix>/<parts...>` joined with `/`.
    pub fn topic(&self, parts: &[&str]) -> Option<Topic> {
        let mut topic = Topic::new();
        topic.push_str(&self.prefix).ok()?;
        for part in parts {
            topic.push('/').ok()?;
            topic.push_str(part).ok()?;
        }
        Some(topic)
    }

    /// Publishes `payload` under `<prefix>/<parts...>`.
    pub fn send<T: Transport>(
        &self,
        transport: &mut T,
        parts: &[&str],
        payload: &str,
    ) -> Result<(), PublishError<T::Error>> {
        let topic = self.topic(parts).ok_or(PublishError::TooLong)?;
        trace!("publish {} = {}", topic.as_str(), payload);
        transport
            .publish(&topic, payload)
            .map_err(PublishError::Transport)
    }

    /// Publishes the combined indication and the four boolean state topics.
    ///
    /// The flags reflect the requested indication, not the transient ramp.
    pub fn publish_aspect_state<I: TimeInstant, T: Transport>(
        &self,
        head: &SignalHead<I>,
        transport: &mut T,
    ) -> Result<(), PublishError<T::Error>> {
        let indication = head.indication();
        let aspect = indication.aspect;

        self.send(transport, &[head.name()], indication.as_str())?;
        self.send(
            transport,
            &["light", head.name(), "green"],
            on_off(aspect == Aspect::Green),
        )?;
        self.send(
            transport,
            &["light", head.name(), "yellow"],
            on_off(aspect == Aspect::Yellow),
        )?;
        self.send(
            transport,
            &["light", head.name(), "red"],
            on_off(aspect == Aspect::Red),
        )?;
        self.publish_flashing_state(head, transport)
    }

    /// Publishes only the flashing flag.
    pub fn publish_flashing_state<I: TimeInstant, T: Transport>(
        &self,
        head: &SignalHead<I>,
        transport: &mut T,
    ) -> Result<(), PublishError<T::Error>> {
        self.send(
            transport,
            &["light", head.name(), "flashing"],
            on_off(head.is_flashing()),
        )
    }

    /// Publishes a formatted payload under `<prefix>/<parts...>`.
    pub fn send_fmt<T: Transport>(
        &self,
        transport: &mut T,
        parts: &[&str],
        args: core::fmt::Arguments<'_>,
    ) -> Result<(), PublishError<T::Error>> {
        let mut payload = String::<PAYLOAD_CAPACITY>::new();
        payload.write_fmt(args).map_err(|_| PublishError::TooLong)?;
        self.send(transport, parts, &payload)
    }
}
