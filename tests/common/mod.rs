//! Shared test infrastructure for bicolor-signal integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use bicolor_signal::{
    BankBuilder, Frame, OutputRegister, SignalBank, SignalConfig, StatusClock, TimeDuration,
    TimeInstant, TimeSource, Transport,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0.saturating_sub(earlier.0))
    }

    fn checked_add(self, duration: Self::Duration) -> Option<Self> {
        self.0.checked_add(duration.0).map(TestInstant)
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }

    pub fn set_time(&self, time: TestInstant) {
        self.current_time.set(time);
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Output Register
// ============================================================================

/// Mock register that records every written frame
pub struct MockRegister {
    frame_history: Vec<Frame>,
}

impl MockRegister {
    pub fn new() -> Self {
        Self {
            frame_history: Vec::new(),
        }
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.frame_history.last().copied()
    }

    pub fn frame_history(&self) -> &[Frame] {
        &self.frame_history
    }
}

impl OutputRegister for MockRegister {
    fn write_frame(&mut self, frame: Frame) {
        self.frame_history.push(frame);
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock message bus that records published messages
pub struct MockTransport {
    pub connected: bool,
    pub fail_publish: bool,
    published: Vec<(String, String)>,
    subscriptions: Vec<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            connected: true,
            fail_publish: false,
            published: Vec::new(),
            subscriptions: Vec::new(),
        }
    }

    pub fn published(&self) -> &[(String, String)] {
        &self.published
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    /// Payload of the last message published on `topic`
    pub fn last_payload(&self, topic: &str) -> Option<&str> {
        self.published
            .iter()
            .rev()
            .find(|(t, _)| t == topic)
            .map(|(_, payload)| payload.as_str())
    }

    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl Transport for MockTransport {
    type Error = ();

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), Self::Error> {
        if self.fail_publish {
            return Err(());
        }
        self.published.push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    fn subscribe(&mut self, pattern: &str) -> Result<(), Self::Error> {
        self.subscriptions.push(pattern.to_string());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ============================================================================
// Mock Clock
// ============================================================================

/// Clock that always reports the same timestamp
pub struct MockClock(pub &'static str);

impl StatusClock for MockClock {
    fn write_timestamp<W: core::fmt::Write>(&self, out: &mut W) -> core::fmt::Result {
        out.write_str(self.0)
    }
}

// ============================================================================
// Bank Helpers
// ============================================================================

pub type TestBank<'t> = SignalBank<'t, TestInstant, MockRegister, MockTimeSource, 4>;

/// Ramp step used by test banks
pub const RAMP_STEP: TestDuration = TestDuration(10);

/// Flash period used by test banks
pub const FLASH_PERIOD: TestDuration = TestDuration(200);

pub fn test_config() -> SignalConfig<TestDuration> {
    SignalConfig::default()
        .ramp_step(RAMP_STEP)
        .flash_period(FLASH_PERIOD)
}

/// Four dark heads AMW-A..AMW-D in slots 0..3
pub fn four_head_bank(timer: &MockTimeSource) -> TestBank<'_> {
    BankBuilder::new()
        .config(test_config())
        .head("AMW-A", 0)
        .unwrap()
        .head("AMW-B", 1)
        .unwrap()
        .head("AMW-C", 2)
        .unwrap()
        .head("AMW-D", 3)
        .unwrap()
        .build(MockRegister::new(), timer)
        .unwrap()
}

/// Services the bank once per millisecond for `millis` milliseconds
pub fn run_for(bank: &mut TestBank<'_>, timer: &MockTimeSource, millis: u64) {
    for _ in 0..millis {
        bank.service();
        timer.advance(TestDuration(1));
    }
}
