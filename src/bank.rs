//! A bank of signal heads sharing one output register.
//!
//! [`SignalBank`] owns every [`SignalHead`] in a fixed-capacity arena
//! indexed by [`HeadId`], together with the shared flasher, yellow
//! multiplexer and frame composer. One call to [`SignalBank::service`] is
//! one tick of the real-time loop. It never blocks, so call it as often as
//! the main loop allows, interleaved with message handling:
//!
//! ```text
//! loop {
//!     while let Some((topic, payload)) = transport.poll() {
//!         bank.handle_message(topic, payload, &mut transport);
//!     }
//!     bank.service();
//!     bank.report_status(&mut transport, &clock);
//! }
//! ```
//!
//! Commands and ticks both need `&mut SignalBank`, so they can never
//! interleave.

use crate::command::{HeadCommand, Report, parse_command};
use crate::config::{HeadConfig, SignalConfig};
use crate::flasher::Flasher;
use crate::frame::{Frame, FrameComposer, OutputRegister};
use crate::head::SignalHead;
use crate::mux::ColorMux;
use crate::publish::{IDENTITY_CAPACITY, PAYLOAD_CAPACITY, PublishError, StatePublisher, StatusClock, Transport};
use crate::stats::LoopStats;
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use crate::types::{ConfigError, HeadId};
use heapless::{String, Vec};
use palette::Srgb;

/// Errors that can occur when addressing heads directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BankError {
    /// The specified head ID does not exist in the bank.
    InvalidHeadId(HeadId),
}

impl core::fmt::Display for BankError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BankError::InvalidHeadId(id) => {
                write!(f, "head ID {} does not exist in bank", id.0)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BankError {}

/// Drives a fixed set of signal heads through one shared output register.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `R` - Output register implementation
/// * `T` - Time source implementation type
/// * `HEADS` - Maximum number of heads
pub struct SignalBank<'t, I: TimeInstant, R: OutputRegister, T: TimeSource<I>, const HEADS: usize> {
    heads: Vec<SignalHead<I>, HEADS>,
    config: SignalConfig<I::Duration>,
    mux: ColorMux,
    flasher: Flasher<I>,
    flash_on: bool,
    composer: FrameComposer,
    publisher: StatePublisher,
    hostname: String<IDENTITY_CAPACITY>,
    stats: LoopStats<I>,
    next_report: Option<I>,
    register: R,
    time_source: &'t T,
}

impl<'t, I, R, T, const HEADS: usize> SignalBank<'t, I, R, T, HEADS>
where
    I: TimeInstant,
    R: OutputRegister,
    T: TimeSource<I>,
{
    /// Runs one tick: advances the shared flasher and multiplexer, renders
    /// every head in index order, and writes the composed frame once.
    pub fn service(&mut self) -> Frame {
        let now = self.time_source.now();
        self.stats.record(now);

        self.flash_on = self.flasher.update(now);
        let leg = self.mux.advance_and_sample();
        let ramp_step = self.config.ramp_step;

        for head in self.heads.iter_mut() {
            let before = head.current_aspect();
            head.tick(now, self.flash_on, leg, ramp_step);
            if head.current_aspect() != before {
                trace!("{} reached {}", head.name(), head.current_aspect());
            }
        }

        let frame = self.composer.compose(self.heads.iter());
        self.register.write_frame(frame);
        frame
    }

    /// Interprets an inbound message, applies it and publishes the resulting
    /// state.
    ///
    /// Returns the addressed head if the message was understood. Anything
    /// else is dropped silently.
    pub fn handle_message<X: Transport>(
        &mut self,
        topic: &str,
        payload: &str,
        transport: &mut X,
    ) -> Option<HeadId> {
        let command = parse_command(topic, payload, self.heads.iter().map(|head| head.name()))?;
        debug!("command for head {}: {}", command.head.0, command.action);

        if let Ok(Some(report)) = self.handle_command(command) {
            self.publish_report(command.head, report, transport);
        }
        Some(command.head)
    }

    /// Applies a parsed command to its head.
    ///
    /// # Returns
    /// * `Ok(Some(report))` - State that should be published
    /// * `Ok(None)` - Nothing to publish
    /// * `Err` - Invalid head ID
    pub fn handle_command(&mut self, command: HeadCommand) -> Result<Option<Report>, BankError> {
        let head = self
            .heads
            .get_mut(command.head.0)
            .ok_or(BankError::InvalidHeadId(command.head))?;
        Ok(head.apply(command.action))
    }

    /// Publishes `report` for one head. Failures are logged and dropped.
    pub fn publish_report<X: Transport>(&self, id: HeadId, report: Report, transport: &mut X) {
        let Some(head) = self.heads.get(id.0) else {
            return;
        };
        if !transport.is_connected() {
            return;
        }

        let result = match report {
            Report::AspectState => self.publisher.publish_aspect_state(head, transport),
            Report::FlashingState => self.publisher.publish_flashing_state(head, transport),
        };
        if let Err(err) = result {
            match err {
                PublishError::TooLong => warn!("state topic for {} too long", head.name()),
                PublishError::Transport(_) => warn!("state publish for {} failed", head.name()),
            }
        }
    }

    /// Announces the device and subscribes to the command topics.
    ///
    /// Call after every (re)connection of the transport.
    pub fn on_connected<X: Transport>(&self, transport: &mut X) -> Result<(), PublishError<X::Error>> {
        info!("announcing {} under {}", self.hostname.as_str(), self.publisher.prefix());
        self.publisher
            .send(transport, &[self.hostname.as_str()], "Reconnected")?;

        let pattern = self.publisher.topic(&["#"]).ok_or(PublishError::TooLong)?;
        transport.subscribe(&pattern).map_err(PublishError::Transport)
    }

    /// Publishes the timestamp and average loop rate when a report is due.
    ///
    /// The first call reports immediately; later reports follow the
    /// configured interval. Nothing is sent, and the schedule is kept, while
    /// the transport is disconnected. Returns true if a report was sent.
    pub fn report_status<X: Transport, C: StatusClock>(&mut self, transport: &mut X, clock: &C) -> bool {
        let now = self.time_source.now();
        if self.next_report.is_some_and(|due| now < due) || !transport.is_connected() {
            return false;
        }
        self.next_report = now.checked_add(self.config.report_interval);

        let host = self.hostname.as_str();

        let mut stamp = String::<PAYLOAD_CAPACITY>::new();
        match clock.write_timestamp(&mut stamp) {
            Ok(()) => {
                if self.publisher.send(transport, &[host, "time"], &stamp).is_err() {
                    warn!("time report failed");
                }
            }
            Err(_) => warn!("timestamp does not fit the payload buffer"),
        }

        let rate = self.stats.take_average().unwrap_or(0);
        if self
            .publisher
            .send_fmt(transport, &[host, "stats"], format_args!("{}", rate))
            .is_err()
        {
            warn!("stats report failed");
        }
        true
    }

    /// Returns the head with the given ID.
    pub fn head(&self, id: HeadId) -> Option<&SignalHead<I>> {
        self.heads.get(id.0)
    }

    /// Finds a head by exact name.
    pub fn head_by_name(&self, name: &str) -> Option<(HeadId, &SignalHead<I>)> {
        self.heads
            .iter()
            .enumerate()
            .find(|(_, head)| head.name() == name)
            .map(|(index, head)| (HeadId(index), head))
    }

    /// All heads in index order.
    pub fn heads(&self) -> &[SignalHead<I>] {
        &self.heads
    }

    /// Approximate color a head shows, for simulators and previews.
    pub fn perceived_color(&self, id: HeadId) -> Result<Srgb, BankError> {
        self.head(id)
            .map(|head| head.perceived_color(self.mux.green_duty()))
            .ok_or(BankError::InvalidHeadId(id))
    }

    /// The most recently written frame.
    pub fn frame(&self) -> Frame {
        self.composer.frame()
    }

    /// Flash phase used on the last tick.
    pub fn flash_on(&self) -> bool {
        self.flash_on
    }

    /// The shared yellow multiplexer.
    pub fn mux(&self) -> &ColorMux {
        &self.mux
    }

    /// Bank configuration.
    pub fn config(&self) -> &SignalConfig<I::Duration> {
        &self.config
    }

    /// The output register.
    pub fn register(&self) -> &R {
        &self.register
    }

    /// Mutable access to the output register.
    pub fn register_mut(&mut self) -> &mut R {
        &mut self.register
    }

    /// Returns the number of heads in the bank.
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    /// Returns true if the bank contains no heads.
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }
}

/// Builder for constructing validated signal banks.
#[derive(Debug, Clone)]
pub struct BankBuilder<D: TimeDuration, const HEADS: usize> {
    config: SignalConfig<D>,
    heads: Vec<HeadConfig, HEADS>,
}

impl<D: TimeDuration, const HEADS: usize> BankBuilder<D, HEADS> {
    /// Creates a builder with default configuration and no heads.
    pub fn new() -> Self {
        Self {
            config: SignalConfig::default(),
            heads: Vec::new(),
        }
    }

    /// Replaces the bank configuration.
    pub fn config(mut self, config: SignalConfig<D>) -> Self {
        self.config = config;
        self
    }

    /// Adds a dark head named `name` in output slot `slot`.
    ///
    /// # Errors
    /// * `TooManyHeads` - the bank capacity is exceeded
    pub fn head(self, name: &'static str, slot: u8) -> Result<Self, ConfigError> {
        self.head_with(HeadConfig::new(name, slot))
    }

    /// Adds a head from its full configuration.
    ///
    /// # Errors
    /// * `TooManyHeads` - the bank capacity is exceeded
    pub fn head_with(mut self, head: HeadConfig) -> Result<Self, ConfigError> {
        self.heads
            .push(head)
            .map_err(|_| ConfigError::TooManyHeads { capacity: HEADS })?;
        Ok(self)
    }

    /// Builds and validates the bank, then writes the all-dark initial frame.
    ///
    /// # Errors
    /// * `NoHeads` - no heads were added
    /// * `ZeroInterval` - ramp step or flash period is zero
    /// * `SlotOutOfRange` / `DuplicateSlot` - invalid slot assignment
    /// * `EmptyName` / `NameTooLong` / `DuplicateName` - invalid head name
    /// * `IdentityTooLong` - prefix or hostname does not fit
    pub fn build<'t, I, R, T>(
        self,
        mut register: R,
        time_source: &'t T,
    ) -> Result<SignalBank<'t, I, R, T, HEADS>, ConfigError>
    where
        I: TimeInstant<Duration = D>,
        R: OutputRegister,
        T: TimeSource<I>,
    {
        if self.heads.is_empty() {
            return Err(ConfigError::NoHeads);
        }

        if self.config.ramp_step.as_millis() == 0 || self.config.flash_period.as_millis() == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let mut heads: Vec<SignalHead<I>, HEADS> = Vec::new();
        for (index, head_config) in self.heads.iter().enumerate() {
            let earlier = &self.heads[..index];
            if earlier.iter().any(|other| other.slot == head_config.slot) {
                return Err(ConfigError::DuplicateSlot(head_config.slot));
            }
            if earlier.iter().any(|other| other.name == head_config.name) {
                return Err(ConfigError::DuplicateName);
            }

            let head = SignalHead::from_config(head_config)?;
            heads
                .push(head)
                .map_err(|_| ConfigError::TooManyHeads { capacity: HEADS })?;
        }

        let publisher = StatePublisher::new(self.config.topic_prefix)?;
        let mut hostname = String::new();
        hostname
            .push_str(self.config.hostname)
            .map_err(|_| ConfigError::IdentityTooLong)?;

        let composer = FrameComposer::all_dark(self.heads.iter().map(|head| head.slot));
        register.write_frame(composer.frame());

        Ok(SignalBank {
            heads,
            mux: ColorMux::new(self.config.amber_pattern),
            flasher: Flasher::new(self.config.flash_period),
            flash_on: true,
            composer,
            publisher,
            hostname,
            stats: LoopStats::new(self.config.stats_window),
            next_report: None,
            config: self.config,
            register,
            time_source,
        })
    }
}

impl<D: TimeDuration, const HEADS: usize> Default for BankBuilder<D, HEADS> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FRAME_SLOTS;
    use crate::types::{Aspect, PinCode};

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

    struct MockTimeSource {
        current_time: core::cell::Cell<TestInstant>,
    }

    impl MockTimeSource {
        fn new() -> Self {
            Self {
                current_time: core::cell::Cell::new(TestInstant(0)),
            }
        }
    }

    impl TimeSource<TestInstant> for MockTimeSource {
        fn now(&self) -> TestInstant {
            self.current_time.get()
        }
    }

    struct MockRegister {
        writes: usize,
        last: Frame,
    }

    impl OutputRegister for MockRegister {
        fn write_frame(&mut self, frame: Frame) {
            self.writes += 1;
            self.last = frame;
        }
    }

    type TestBank<'t, const H: usize> = SignalBank<'t, TestInstant, MockRegister, MockTimeSource, H>;

    fn register() -> MockRegister {
        MockRegister {
            writes: 0,
            last: Frame(0),
        }
    }

    #[test]
    fn build_writes_initial_dark_frame() {
        let timer = MockTimeSource::new();
        let bank: TestBank<4> = BankBuilder::new()
            .head("A", 0)
            .unwrap()
            .head("B", 3)
            .unwrap()
            .build(register(), &timer)
            .unwrap();

        assert_eq!(bank.register().writes, 1);
        assert_eq!(bank.register().last, Frame(0b11_00_00_11));
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn builder_rejects_invalid_layouts() {
        let timer = MockTimeSource::new();

        let empty: Result<TestBank<4>, _> = BankBuilder::new().build(register(), &timer);
        assert!(matches!(empty, Err(ConfigError::NoHeads)));

        let duplicate_slot: Result<TestBank<4>, _> = BankBuilder::new()
            .head("A", 1)
            .unwrap()
            .head("B", 1)
            .unwrap()
            .build(register(), &timer);
        assert!(matches!(duplicate_slot, Err(ConfigError::DuplicateSlot(1))));

        let duplicate_name: Result<TestBank<4>, _> = BankBuilder::new()
            .head("A", 0)
            .unwrap()
            .head("A", 1)
            .unwrap()
            .build(register(), &timer);
        assert!(matches!(duplicate_name, Err(ConfigError::DuplicateName)));

        let out_of_range: Result<TestBank<4>, _> = BankBuilder::new()
            .head("A", FRAME_SLOTS)
            .unwrap()
            .build(register(), &timer);
        assert!(matches!(out_of_range, Err(ConfigError::SlotOutOfRange { .. })));

        let full = BankBuilder::<TestDuration, 1>::new()
            .head("A", 0)
            .unwrap()
            .head("B", 1);
        assert!(matches!(full, Err(ConfigError::TooManyHeads { capacity: 1 })));

        let zero: Result<TestBank<1>, _> = BankBuilder::new()
            .config(SignalConfig::default().ramp_step(TestDuration(0)))
            .head("A", 0)
            .unwrap()
            .build(register(), &timer);
        assert!(matches!(zero, Err(ConfigError::ZeroInterval)));
    }

    #[test]
    fn service_writes_exactly_one_frame_per_tick() {
        let timer = MockTimeSource::new();
        let mut bank: TestBank<2> = BankBuilder::new()
            .head("A", 0)
            .unwrap()
            .build(register(), &timer)
            .unwrap();

        for _ in 0..5 {
            bank.service();
        }
        assert_eq!(bank.register().writes, 6);
    }

    #[test]
    fn handle_command_rejects_unknown_head() {
        let timer = MockTimeSource::new();
        let mut bank: TestBank<2> = BankBuilder::new()
            .head("A", 0)
            .unwrap()
            .build(register(), &timer)
            .unwrap();

        let command = HeadCommand::new(HeadId(5), crate::command::HeadAction::Query);
        assert_eq!(
            bank.handle_command(command),
            Err(BankError::InvalidHeadId(HeadId(5)))
        );
    }

    #[test]
    fn head_lookup_by_name() {
        let timer = MockTimeSource::new();
        let bank: TestBank<2> = BankBuilder::new()
            .head("A", 0)
            .unwrap()
            .head_with(HeadConfig::new("B", 1).initial_aspect(Aspect::Red))
            .unwrap()
            .build(register(), &timer)
            .unwrap();

        let (id, head) = bank.head_by_name("B").unwrap();
        assert_eq!(id, HeadId(1));
        assert_eq!(head.aspect(), Aspect::Red);
        assert_eq!(head.output(), PinCode::Dark);
        assert!(bank.head_by_name("C").is_none());
    }
}
