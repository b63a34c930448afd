//! Time acquisition supervisor

use std::sync::Arc;

#[cfg(not(test))]
use log::{debug, info, warn};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as info;
#[cfg(test)]
use std::println as warn;

use thiserror::Error;

use crate::align;
use crate::builder::TimeReceiverBuilder;
use crate::capture::{EdgeCapture, Pulse};
use crate::classify::{classify, PulseClass};
use crate::frame::{BitFrame, FrameState};
use crate::source::{CaptureErr, SignalSource};
use crate::timecode::{self, DecodedTime, Field, FieldRangeErr};

/// Reasons a time acquisition fails
///
/// Signal quality problems are normal. The caller should retry
/// with a fresh acquisition later.
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AcquireErr {
    /// No complete frame within the pulse or wall-clock budget
    #[error("no complete time frame after {pulses} pulses and {elapsed_ms} ms")]
    Timeout {
        /// Pulses received
        pulses: u32,

        /// Time spent, in milliseconds
        elapsed_ms: u64,
    },

    /// A complete frame decoded to an implausible time
    #[error("implausible time frame: {0}")]
    Implausible(#[from] FieldRangeErr),

    /// A complete frame failed its parity check
    #[error("parity error in time frame: {0}")]
    Parity(Field),

    /// The signal source could not be enabled
    #[error(transparent)]
    CaptureUnavailable(#[from] CaptureErr),
}

impl AcquireErr {
    /// True if a complete frame was received
    ///
    /// Complete-frame failures suggest a bit error or a timing
    /// mismatch, rather than a weak signal.
    pub fn is_frame_error(&self) -> bool {
        matches!(self, AcquireErr::Implausible(_) | AcquireErr::Parity(_))
    }
}

/// A DCF77 time receiver
///
/// The receiver performs one blocking *acquisition* per call
/// to [`acquire()`](#method.acquire):
///
/// 1. Enable the [`SignalSource`] and wait for a minute marker.
/// 2. Classify each pulse and accumulate a
///    [`BitFrame`](crate::BitFrame). An invalid pulse discards
///    the frame until the next minute marker.
/// 3. Once the frame is complete, wait for the top of the
///    minute and decode it.
///
/// An acquisition is bounded by both a pulse budget and a
/// wall-clock deadline, so it will end even if the signal
/// disappears completely. Worst-case latency is about five
/// minutes with the default settings.
///
/// Create the receiver from its
/// [builder](crate::TimeReceiverBuilder).
#[derive(Clone, Debug)]
pub struct TimeReceiver {
    capture: Arc<EdgeCapture>,
    max_pulses: u32,
    timeout_ms: u64,
    poll_interval_ms: u64,
    align_allowance_ms: u64,
    frame_bits: u8,
    parity_check: bool,
    pulse_counter: u64,
}

impl TimeReceiver {
    /// Acquire the time from `source`
    ///
    /// Blocks until a frame has been received and decoded or
    /// one of the watchdog budgets is exhausted. The time
    /// returned is the time at the top of the current minute;
    /// `acquire()` returns shortly before it, by the configured
    /// allowance.
    ///
    /// The `source` is disabled on return, however the
    /// acquisition ends.
    pub fn acquire<S>(&mut self, source: &mut S) -> Result<DecodedTime, AcquireErr>
    where
        S: SignalSource + ?Sized,
    {
        let out = self.run(source);
        source.disable();
        debug!(
            "acquire: {} pulses received to date, {} overwritten unread",
            self.pulse_counter,
            self.capture.overruns()
        );
        match &out {
            Ok(tm) => info!("acquired: {}", tm),
            Err(e) => warn!("acquisition failed: {}", e),
        }
        out
    }

    /// Edge capture shared with the signal source
    pub fn capture(&self) -> &Arc<EdgeCapture> {
        &self.capture
    }

    /// Lifetime total of pulses received
    pub fn pulse_counter(&self) -> u64 {
        self.pulse_counter
    }

    /// Pulse budget per acquisition
    pub fn max_pulses(&self) -> u32 {
        self.max_pulses
    }

    /// Wall-clock budget per acquisition, in milliseconds
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    // The acquisition state machine
    fn run<S>(&mut self, source: &mut S) -> Result<DecodedTime, AcquireErr>
    where
        S: SignalSource + ?Sized,
    {
        let mut state = State::Idle;
        let mut start_ms = 0;
        let mut pulses = 0u32;

        loop {
            state = match state {
                State::Idle => {
                    self.capture.reset();
                    source.enable(self.capture.clone())?;
                    start_ms = source.now_ms();
                    debug!("acquire: started at {} ms", start_ms);
                    State::WaitingForPulse(BitFrame::new())
                }

                State::WaitingForPulse(frame) => match self.capture.take() {
                    Some(pulse) => {
                        pulses += 1;
                        self.pulse_counter = self.pulse_counter.wrapping_add(1);
                        State::Classifying(frame, pulse)
                    }
                    None => {
                        let elapsed_ms = source.now_ms().saturating_sub(start_ms);
                        if elapsed_ms >= self.timeout_ms {
                            State::TimedOut
                        } else {
                            source.sleep_ms(self.poll_interval_ms);
                            State::WaitingForPulse(frame)
                        }
                    }
                },

                State::Classifying(mut frame, pulse) => {
                    let class = classify(pulse.interval_ms() as i64);
                    debug!(
                        "pulse [{:>3}]: {:>5} ms → {} (frame bit {})",
                        pulses,
                        pulse.interval_ms(),
                        class,
                        frame.cursor()
                    );
                    match class {
                        PulseClass::MinuteSync => {
                            info!("acquire: minute marker after {} pulses", pulses);
                            frame.on_sync();
                        }
                        PulseClass::Bit(value) => {
                            frame.on_bit(value);
                        }
                        PulseClass::Invalid => {
                            if frame.state() == FrameState::Collecting {
                                info!(
                                    "acquire: invalid {} ms pulse; waiting for next minute",
                                    pulse.interval_ms()
                                );
                            }
                            frame.on_invalid();
                        }
                    }
                    State::Accumulating(frame, pulse)
                }

                State::Accumulating(frame, pulse) => {
                    if frame.cursor() >= self.frame_bits {
                        State::Complete(frame, pulse)
                    } else if pulses >= self.max_pulses {
                        State::TimedOut
                    } else {
                        State::WaitingForPulse(frame)
                    }
                }

                State::Complete(frame, last) => {
                    source.disable();
                    info!("acquire: frame complete: {}", frame);
                    align::align(source, &last, self.align_allowance_ms);
                    return self.finish(&frame);
                }

                State::TimedOut => {
                    return Err(AcquireErr::Timeout {
                        pulses,
                        elapsed_ms: source.now_ms().saturating_sub(start_ms),
                    });
                }
            };
        }
    }

    // Decode and check a complete frame
    fn finish(&self, frame: &BitFrame) -> Result<DecodedTime, AcquireErr> {
        if self.parity_check {
            timecode::check_parity(frame).map_err(AcquireErr::Parity)?;
        }
        Ok(timecode::decode(frame)?)
    }
}

impl From<&TimeReceiverBuilder> for TimeReceiver {
    /// Create the receiver from its Builder
    fn from(cfg: &TimeReceiverBuilder) -> Self {
        Self {
            capture: Arc::new(EdgeCapture::new()),
            max_pulses: cfg.max_pulses(),
            timeout_ms: cfg.timeout_ms(),
            poll_interval_ms: cfg.poll_interval_ms(),
            align_allowance_ms: cfg.align_allowance_ms(),
            frame_bits: cfg.frame_bits(),
            parity_check: cfg.parity_check(),
            pulse_counter: 0,
        }
    }
}

// Acquisition states
//
// The frame under construction moves from state to state; it
// is never shared.
#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    // Reset and enable the capture
    Idle,

    // Poll for the next pulse
    WaitingForPulse(BitFrame),

    // Route a received pulse into the frame
    Classifying(BitFrame, Pulse),

    // Decide whether we are done
    Accumulating(BitFrame, Pulse),

    // Align and decode. Payload includes the last pulse.
    Complete(BitFrame, Pulse),

    // Out of pulses or time
    TimedOut,
}
