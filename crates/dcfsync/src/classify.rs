//! Pulse classification
//!
//! Each captured [`Pulse`](crate::Pulse) is sorted into exactly
//! one [`PulseClass`] by hard thresholds on its low time. The
//! pockets are disjoint and there is no hysteresis. A value which
//! falls between pockets is reported as `Invalid` rather than
//! rounded to the nearest bit, since one silently-wrong bit
//! corrupts the whole minute.

use std::fmt;
use std::ops::Range;

/// Low times above this many milliseconds mark the minute
///
/// The 59th second of each minute carries no pulse, so the low
/// time which spans it is at least 1800 ms.
pub const MINUTE_SYNC_MIN_MS: i64 = 1500;

/// Low times in this range are a logical one (200 ms pulse)
pub const BIT_ONE_MS: Range<i64> = 750..850;

/// Low times in this range are a logical zero (100 ms pulse)
pub const BIT_ZERO_MS: Range<i64> = 850..950;

/// Classified pulse
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PulseClass {
    /// One data bit
    Bit(bool),

    /// Start of a new minute
    MinuteSync,

    /// Timing fits no pocket
    Invalid,
}

impl fmt::Display for PulseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PulseClass::Bit(true) => write!(f, "1"),
            PulseClass::Bit(false) => write!(f, "0"),
            PulseClass::MinuteSync => write!(f, "M"),
            PulseClass::Invalid => write!(f, "?"),
        }
    }
}

/// Classify a low time of `interval_ms`
///
/// * `> 1500` → [`MinuteSync`](PulseClass::MinuteSync)
/// * `[750, 850)` → `Bit(true)`
/// * `[850, 950)` → `Bit(false)`
/// * everything else, including negative durations →
///   [`Invalid`](PulseClass::Invalid)
pub fn classify(interval_ms: i64) -> PulseClass {
    if interval_ms > MINUTE_SYNC_MIN_MS {
        PulseClass::MinuteSync
    } else if BIT_ONE_MS.contains(&interval_ms) {
        PulseClass::Bit(true)
    } else if BIT_ZERO_MS.contains(&interval_ms) {
        PulseClass::Bit(false)
    } else {
        PulseClass::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_pockets() {
        assert_eq!(PulseClass::Bit(true), classify(750));
        assert_eq!(PulseClass::Bit(true), classify(800));
        assert_eq!(PulseClass::Bit(true), classify(849));
        assert_eq!(PulseClass::Bit(false), classify(850));
        assert_eq!(PulseClass::Bit(false), classify(900));
        assert_eq!(PulseClass::Bit(false), classify(949));
        assert_eq!(PulseClass::MinuteSync, classify(1501));
        assert_eq!(PulseClass::MinuteSync, classify(1800));
        assert_eq!(PulseClass::MinuteSync, classify(i64::MAX));
    }

    #[test]
    fn test_classify_invalid() {
        for iv in [i64::MIN, -1, 0, 100, 749, 950, 1000, 1200, 1500] {
            assert_eq!(PulseClass::Invalid, classify(iv), "interval {}", iv);
        }
    }

    #[test]
    fn test_classify_exhaustive() {
        // pockets change only at the documented thresholds
        let mut transitions = vec![];
        let mut last = classify(-10);
        for iv in -10..3000 {
            let out = classify(iv);
            if out != last {
                transitions.push(iv);
                last = out;
            }
        }
        assert_eq!(vec![750, 850, 950, 1501], transitions);
    }

    #[test]
    fn test_display() {
        let s: String = [
            PulseClass::MinuteSync,
            PulseClass::Bit(false),
            PulseClass::Bit(true),
            PulseClass::Invalid,
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        assert_eq!("M01?", s);
    }
}
