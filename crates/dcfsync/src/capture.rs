//! Edge capture and pulse publication
//!
//! The [`EdgeCapture`] sits between the hardware notification
//! source (an interrupt handler, a GPIO watcher thread, or a
//! [`ReplaySource`](crate::ReplaySource)) and the acquisition
//! loop. The source calls [`on_edge()`](EdgeCapture::on_edge)
//! for every transition of the receiver's output line. The
//! acquisition loop drains completed pulses with
//! [`take()`](EdgeCapture::take).
//!
//! The receiver module's output is high while the carrier is
//! reduced, i.e., at the start of each second. A *pulse* here is
//! the low time which a rising edge closes:
//!
//! ```txt
//!          ┌──┐        ┌───┐         ┌──┐
//!  ────────┘  └────────┘   └─────────┘  └──────
//!             ↑ fall   ↑ rise
//!             |<------>|  interval: 800 ms or 900 ms
//! ```
//!
//! There is exactly one pending pulse slot. If the consumer does
//! not drain the slot before the next rising edge, the older
//! pulse is overwritten. The slot is a single atomic word, so the
//! consumer always observes the interval and the end timestamp of
//! the *same* pulse.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

#[cfg(not(test))]
use log::trace;

#[cfg(test)]
use std::println as trace;

/// Logic level of the receiver output
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// Line is low (full carrier)
    Low,

    /// Line is high (reduced carrier)
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// One observed level transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeEvent {
    /// Monotonic timestamp, in milliseconds
    pub timestamp_ms: u64,

    /// Level of the line *after* the transition
    pub level: Level,
}

impl EdgeEvent {
    /// New edge at `timestamp_ms` which leaves the line at `level`
    pub fn new(timestamp_ms: u64, level: Level) -> Self {
        Self {
            timestamp_ms,
            level,
        }
    }
}

/// A completed pulse
///
/// The `interval_ms` is the time between a falling edge and
/// the rising edge which follows it. The end timestamp is kept
/// modulo 2³² ms, which is ample for measuring the few seconds
/// between a pulse and its use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pulse {
    interval_ms: u32,
    end_ms: u32,
}

impl Pulse {
    /// Pulse of `interval_ms` which ended at `end_ms`
    pub fn new(interval_ms: u32, end_ms: u64) -> Self {
        Self {
            interval_ms: u32::min(interval_ms, MAX_INTERVAL_MS),
            end_ms: end_ms as u32,
        }
    }

    /// Low time of the pulse, in milliseconds
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Milliseconds elapsed between the rising edge and `now_ms`
    ///
    /// `now_ms` must come from the same monotonic clock as the
    /// edge timestamps.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        (now_ms as u32).wrapping_sub(self.end_ms) as u64
    }

    fn pack(&self) -> u64 {
        SLOT_READY | (self.interval_ms as u64) << 32 | self.end_ms as u64
    }

    fn unpack(word: u64) -> Option<Self> {
        if word & SLOT_READY == 0 {
            return None;
        }
        Some(Self {
            interval_ms: ((word & !SLOT_READY) >> 32) as u32,
            end_ms: word as u32,
        })
    }
}

/// Single-producer, single-consumer edge capture
///
/// `EdgeCapture` is `Send + Sync`. Share it with the
/// notification source through an `Arc`. Only one producer may
/// call [`on_edge()`](#method.on_edge) at a time.
#[derive(Debug)]
pub struct EdgeCapture {
    // level recorded at the last transition; high at power-on
    last_high: AtomicBool,

    // last falling edge, if any
    has_falling: AtomicBool,
    falling_ms: AtomicU64,

    // published pulse (see `Pulse::pack()`)
    slot: AtomicU64,

    // pulses overwritten before the consumer took them
    overruns: AtomicU32,
}

impl EdgeCapture {
    /// New capture with no pending pulse
    pub fn new() -> Self {
        Self {
            last_high: AtomicBool::new(true),
            has_falling: AtomicBool::new(false),
            falling_ms: AtomicU64::new(0),
            slot: AtomicU64::new(0),
            overruns: AtomicU32::new(0),
        }
    }

    /// Clear all edge history and any pending pulse
    ///
    /// Must not race with [`on_edge()`](#method.on_edge): call
    /// it while the notification source is disabled.
    pub fn reset(&self) {
        self.last_high.store(true, Ordering::Relaxed);
        self.has_falling.store(false, Ordering::Relaxed);
        self.falling_ms.store(0, Ordering::Relaxed);
        self.overruns.store(0, Ordering::Relaxed);
        self.slot.store(0, Ordering::Release);
    }

    /// Record a transition of the monitored line
    ///
    /// Called by the producer on every level change, with the
    /// current monotonic time and the line's new `level`.
    /// Notifications which repeat the last recorded level are
    /// ignored. Never blocks.
    pub fn on_edge(&self, timestamp_ms: u64, level: Level) {
        let was_high = self.last_high.load(Ordering::Relaxed);
        match (was_high, level) {
            (true, Level::Low) => {
                self.last_high.store(false, Ordering::Relaxed);
                self.falling_ms.store(timestamp_ms, Ordering::Relaxed);
                self.has_falling.store(true, Ordering::Relaxed);
            }
            (false, Level::High) => {
                self.last_high.store(true, Ordering::Relaxed);
                if !self.has_falling.load(Ordering::Relaxed) {
                    return;
                }

                let falling_ms = self.falling_ms.load(Ordering::Relaxed);
                let interval = timestamp_ms.saturating_sub(falling_ms);
                let pulse = Pulse::new(
                    u32::try_from(interval).unwrap_or(MAX_INTERVAL_MS),
                    timestamp_ms,
                );
                trace!("capture [{:<10}]: pulse {} ms", timestamp_ms, pulse.interval_ms);

                let prev = self.slot.swap(pulse.pack(), Ordering::Release);
                if prev & SLOT_READY != 0 {
                    self.overruns.fetch_add(1, Ordering::Relaxed);
                }
            }
            _ => {}
        }
    }

    /// Take the pending pulse, if any
    ///
    /// Empties the slot. Returns `None` if no pulse has
    /// completed since the last call.
    pub fn take(&self) -> Option<Pulse> {
        Pulse::unpack(self.slot.swap(0, Ordering::Acquire))
    }

    /// True if a pulse is waiting to be taken
    pub fn is_ready(&self) -> bool {
        self.slot.load(Ordering::Acquire) & SLOT_READY != 0
    }

    /// Number of pulses overwritten before they were taken
    ///
    /// Counts since the last [`reset()`](#method.reset).
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }
}

impl Default for EdgeCapture {
    fn default() -> Self {
        Self::new()
    }
}

// ready flag of the pulse slot
const SLOT_READY: u64 = 1 << 63;

// intervals are stored in 31 bits
const MAX_INTERVAL_MS: u32 = (1 << 31) - 1;
