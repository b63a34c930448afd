//! Minute frame accumulator

use std::fmt;

/// Bit slots in one minute frame
///
/// Seconds 0 through 58 each carry one bit. Second 59 carries
/// no pulse; its absence is the minute marker.
pub const FRAME_BITS: u8 = 59;

/// Validity of the frame being accumulated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FrameState {
    /// Bits are being appended
    Collecting,

    /// Bits are discarded until the next minute marker
    #[default]
    Invalid,
}

/// A packed minute frame
///
/// Bit `n` of the frame is the bit sent in second `n` of the
/// minute. The frame is filled one bit at a time with
/// [`on_bit()`](#method.on_bit) and restarted at each minute
/// marker with [`on_sync()`](#method.on_sync).
///
/// A new frame is [`Invalid`](FrameState::Invalid): we cannot
/// know which second a bit belongs to until we have seen a
/// minute marker.
///
/// ```
/// use dcfsync::{BitFrame, FrameState};
///
/// let mut frame = BitFrame::new();
/// assert!(!frame.on_bit(true));
///
/// frame.on_sync();
/// assert!(frame.on_bit(true));
/// assert!(frame.on_bit(false));
/// assert_eq!(frame.cursor(), 2);
/// assert_eq!(frame.bit(0), 1);
///
/// frame.on_invalid();
/// assert_eq!(frame.state(), FrameState::Invalid);
/// assert!(!frame.on_bit(true));
/// assert_eq!(frame.cursor(), 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BitFrame {
    bits: u64,
    cursor: u8,
    state: FrameState,
}

impl BitFrame {
    /// New, invalid frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame from packed `bits` with `cursor` bits written
    ///
    /// Bits beyond [`FRAME_BITS`] are discarded and `cursor` is
    /// clamped to `FRAME_BITS`. The frame is `Collecting`.
    pub fn from_bits(bits: u64, cursor: u8) -> Self {
        Self {
            bits: bits & FRAME_MASK,
            cursor: u8::min(cursor, FRAME_BITS),
            state: FrameState::Collecting,
        }
    }

    /// Minute marker received
    ///
    /// Clears all bits and starts collecting from second zero.
    pub fn on_sync(&mut self) {
        self.bits = 0;
        self.cursor = 0;
        self.state = FrameState::Collecting;
    }

    /// Invalid pulse received
    ///
    /// Further bits are ignored until the next minute marker.
    pub fn on_invalid(&mut self) {
        self.state = FrameState::Invalid;
    }

    /// Append one bit
    ///
    /// Returns `true` if the bit was written and the cursor
    /// advanced. The bit is ignored if the frame is full or
    /// `Invalid`.
    pub fn on_bit(&mut self, value: bool) -> bool {
        if self.cursor >= FRAME_BITS || self.state == FrameState::Invalid {
            return false;
        }

        if value {
            self.bits |= 1 << self.cursor;
        }
        self.cursor += 1;
        true
    }

    /// Number of bits written since the last minute marker
    pub fn cursor(&self) -> u8 {
        self.cursor
    }

    /// Frame validity
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// True if every bit slot is filled
    pub fn is_full(&self) -> bool {
        self.cursor >= FRAME_BITS
    }

    /// Value of bit `index`, as `0` or `1`
    ///
    /// Unwritten and out-of-range bits read as zero.
    pub fn bit(&self, index: usize) -> u8 {
        if index >= FRAME_BITS as usize {
            return 0;
        }
        ((self.bits >> index) & 1) as u8
    }

    /// Packed bits, second zero in the LSB
    pub fn bits(&self) -> u64 {
        self.bits
    }
}

impl fmt::Display for BitFrame {
    /// Written bits in transmission order
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.cursor as usize {
            write!(f, "{}", self.bit(i))?;
        }
        if self.state == FrameState::Invalid {
            write!(f, " (invalid)")?;
        }
        Ok(())
    }
}

const FRAME_MASK: u64 = (1 << FRAME_BITS) - 1;
