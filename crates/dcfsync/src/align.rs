//! Minute alignment
//!
//! A frame is complete at the rising edge which begins second
//! 58. The time it carries starts at the *next* minute marker,
//! two seconds later. We hold off until then, less a fixed
//! allowance for the work which follows, so that the caller
//! receives the time at (about) the top of the minute.

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use crate::capture::Pulse;
use crate::source::SignalSource;

/// Time from the last accepted pulse to the top of the minute
pub const MINUTE_TARGET_MS: u64 = 2000;

/// Default processing allowance, in milliseconds
pub const DEFAULT_ALLOWANCE_MS: u64 = 250;

/// Remaining hold-off, in milliseconds
///
/// `elapsed_ms` is the time since the last accepted pulse ended.
/// Returns zero if the target has already passed.
pub fn hold_off_ms(elapsed_ms: u64, allowance_ms: u64) -> u64 {
    MINUTE_TARGET_MS
        .saturating_sub(allowance_ms)
        .saturating_sub(elapsed_ms)
}

/// Wait for the top of the minute
///
/// Sleeps through the `source` until the minute which follows
/// `last` begins, less `allowance_ms`. Returns immediately if
/// that time has already passed. Returns the time waited.
pub fn align<S>(source: &mut S, last: &Pulse, allowance_ms: u64) -> u64
where
    S: SignalSource + ?Sized,
{
    let elapsed = last.elapsed_ms(source.now_ms());
    let wait = hold_off_ms(elapsed, allowance_ms);
    debug!(
        "align: {} ms since last pulse, holding off {} ms",
        elapsed, wait
    );
    if wait > 0 {
        source.sleep_ms(wait);
    }
    wait
}
