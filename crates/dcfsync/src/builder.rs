use crate::align::DEFAULT_ALLOWANCE_MS;
use crate::frame::FRAME_BITS;
use crate::receiver::TimeReceiver;

/// Builds a DCF77 time receiver
///
/// The builder comes with defaults which suit a receiver module
/// sampled by a GPIO interrupt. The acquisition gives up after
/// 300 received pulses or five minutes, whichever comes first.
///
/// ```
/// use dcfsync::TimeReceiverBuilder;
///
/// let rx = TimeReceiverBuilder::new()
///     .with_max_pulses(200)
///     .with_timeout_ms(200_000)
///     .with_parity_check(true)
///     .build();
/// assert_eq!(rx.max_pulses(), 200);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeReceiverBuilder {
    max_pulses: u32,
    timeout_ms: u64,
    poll_interval_ms: u64,
    align_allowance_ms: u64,
    frame_bits: u8,
    parity_check: bool,
}

impl TimeReceiverBuilder {
    /// New receiver with default settings
    pub fn new() -> Self {
        Self {
            max_pulses: 300,
            timeout_ms: 300_000,
            poll_interval_ms: 1,
            align_allowance_ms: DEFAULT_ALLOWANCE_MS,
            frame_bits: DEFAULT_FRAME_BITS,
            parity_check: false,
        }
    }

    /// Build a receiver
    pub fn build(&self) -> TimeReceiver {
        TimeReceiver::from(self)
    }

    /// Pulse budget
    ///
    /// An acquisition fails once it has received `max` pulses
    /// without completing a frame. Every received pulse counts,
    /// including minute markers and invalid pulses. A full
    /// minute is 59 pulses, and acquisition must first wait for
    /// a minute marker, so values below 117 will rarely succeed.
    pub fn with_max_pulses(&mut self, max: u32) -> &mut Self {
        self.max_pulses = u32::max(max, 1);
        self
    }

    /// Wall-clock budget, in milliseconds
    ///
    /// An acquisition fails once this much time has passed since
    /// it started, even if the line never changes. Checked every
    /// poll interval.
    pub fn with_timeout_ms(&mut self, timeout: u64) -> &mut Self {
        self.timeout_ms = timeout;
        self
    }

    /// Poll interval, in milliseconds
    ///
    /// While waiting for a pulse, the receiver sleeps this long
    /// between checks. Keep this short compared to the 100 ms
    /// pulse resolution. Clamped to `[1, 50]`.
    pub fn with_poll_interval_ms(&mut self, interval: u64) -> &mut Self {
        self.poll_interval_ms = u64::clamp(interval, 1, 50);
        self
    }

    /// Minute alignment allowance, in milliseconds
    ///
    /// After the last bit, the receiver waits until `allowance`
    /// milliseconds before the top of the minute. Use this to
    /// cover whatever the caller does with the time before it is
    /// displayed or set. Clamped to at most 2000.
    pub fn with_align_allowance_ms(&mut self, allowance: u64) -> &mut Self {
        self.align_allowance_ms = u64::min(allowance, 2000);
        self
    }

    /// Bits required to complete a frame
    ///
    /// The default is 58: bits 0 through 57. The low time which
    /// would carry bit 58 is swallowed by the minute marker. The
    /// decoded fields end at bit 56. Clamped to `[57, 59]`.
    pub fn with_frame_bits(&mut self, bits: u8) -> &mut Self {
        self.frame_bits = u8::clamp(bits, 57, FRAME_BITS);
        self
    }

    /// Check minute and hour parity
    ///
    /// When enabled, a complete frame whose minute or hour parity
    /// bit is wrong fails with
    /// [`AcquireErr::Parity`](crate::AcquireErr::Parity). Off by
    /// default.
    pub fn with_parity_check(&mut self, enable: bool) -> &mut Self {
        self.parity_check = enable;
        self
    }

    /// Pulse budget
    pub fn max_pulses(&self) -> u32 {
        self.max_pulses
    }

    /// Wall-clock budget, in milliseconds
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Poll interval, in milliseconds
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Minute alignment allowance, in milliseconds
    pub fn align_allowance_ms(&self) -> u64 {
        self.align_allowance_ms
    }

    /// Bits required to complete a frame
    pub fn frame_bits(&self) -> u8 {
        self.frame_bits
    }

    /// Parity checking enabled
    pub fn parity_check(&self) -> bool {
        self.parity_check
    }
}

impl Default for TimeReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// bits 0..=57 are observable before the minute marker
const DEFAULT_FRAME_BITS: u8 = 58;
