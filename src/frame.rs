//! Shared output register frame.
//!
//! Every head owns a fixed two-bit slice of one [`Frame`] word. Slot `s`
//! occupies bits `2s` and `2s + 1`. [`FrameComposer`] merges each head's
//! [`PinCode`] into its slice with mask-and-merge, so no head can disturb
//! another's bits, and the whole frame is written to the [`OutputRegister`]
//! once per tick.

use crate::head::SignalHead;
use crate::time::TimeInstant;
use crate::types::PinCode;

/// Number of two-bit slots in a frame.
pub const FRAME_SLOTS: u8 = 16;

/// Trait for abstracting the output register hardware.
///
/// Implement this for your shift register chain, port expander or GPIO bank.
pub trait OutputRegister {
    /// Latches a complete frame onto the outputs.
    ///
    /// Handle any hardware errors internally - this method cannot fail.
    fn write_frame(&mut self, frame: Frame);
}

/// Bit-packed pin state of every head for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame(pub u32);

impl Frame {
    /// Mask covering the two bits of `slot`.
    #[inline]
    pub const fn slot_mask(slot: u8) -> u32 {
        0b11 << (2 * slot as u32)
    }

    /// Returns a copy with `code` merged into `slot`, leaving other slots intact.
    #[inline]
    pub const fn with_slot(self, slot: u8, code: PinCode) -> Self {
        let shift = 2 * slot as u32;
        Frame((self.0 & !Self::slot_mask(slot)) | ((code.bits() as u32) << shift))
    }

    /// Raw two bits stored in `slot`.
    #[inline]
    pub const fn slot_bits(self, slot: u8) -> u8 {
        ((self.0 >> (2 * slot as u32)) & 0b11) as u8
    }

    /// Pin code stored in `slot`, or `None` if the slot holds `0b00`.
    pub const fn slot(self, slot: u8) -> Option<PinCode> {
        PinCode::from_bits(self.slot_bits(slot))
    }

    /// Raw frame value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Low byte, the content of a single 8-bit register holding slots 0-3.
    pub const fn low_byte(self) -> u8 {
        self.0 as u8
    }
}

/// Packs head outputs into the shared frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameComposer {
    frame: Frame,
}

impl FrameComposer {
    /// Creates a composer whose previous frame is `initial`.
    pub const fn new(initial: Frame) -> Self {
        Self { frame: initial }
    }

    /// Creates a composer with every given slot dark and all other bits clear.
    pub fn all_dark<S: IntoIterator<Item = u8>>(slots: S) -> Self {
        let frame = slots
            .into_iter()
            .fold(Frame::default(), |frame, slot| frame.with_slot(slot, PinCode::Dark));
        Self::new(frame)
    }

    /// Merges every head's last output into the frame and returns it.
    ///
    /// Starts from the previous frame, so bits of slots without a head keep
    /// their value.
    pub fn compose<'h, I, H>(&mut self, heads: H) -> Frame
    where
        I: TimeInstant + 'h,
        H: IntoIterator<Item = &'h SignalHead<I>>,
    {
        self.frame = heads
            .into_iter()
            .fold(self.frame, |frame, head| frame.with_slot(head.slot(), head.output()));
        self.frame
    }

    /// The most recently composed frame.
    pub fn frame(&self) -> Frame {
        self.frame
    }
}
