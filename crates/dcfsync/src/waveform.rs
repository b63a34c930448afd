//! DCF77 waveform synthesis and slicing
//!
//! DCF77 reduces its carrier at the start of every second except
//! the 59th. The reduction lasts 100 ms for a zero bit and 200 ms
//! for a one bit. A receiver module reports the reduction as a
//! high level on its output line.
//!
//! ```txt
//!  second:  57        58        59        0
//!           ┌─┐       ┌──┐                ┌─┐
//!  ─────────┘ └───────┘  └────────────────┘ └────
//!           0         1      (no pulse)   minute marker
//! ```

use crate::capture::{EdgeEvent, Level};
use crate::frame::{BitFrame, FRAME_BITS};

/// Length of one second, in milliseconds
pub const SECOND_MS: u64 = 1000;

/// Length of one minute, in milliseconds
pub const MINUTE_MS: u64 = 60 * SECOND_MS;

/// Carrier reduction for a zero bit, in milliseconds
pub const PULSE_ZERO_MS: u64 = 100;

/// Carrier reduction for a one bit, in milliseconds
pub const PULSE_ONE_MS: u64 = 200;

/// Edges for one minute of broadcast
///
/// The minute starts at `start_ms`, which is the rising edge of
/// second zero. Bits 0 through 58 of `frame` are sent as pulses
/// in seconds 0 through 58, regardless of the frame's cursor.
/// Second 59 is silent.
pub fn minute_edges(frame: &BitFrame, start_ms: u64) -> Vec<EdgeEvent> {
    let mut out = Vec::with_capacity(2 * FRAME_BITS as usize);
    for sec in 0..FRAME_BITS as usize {
        let rise = start_ms + sec as u64 * SECOND_MS;
        let width = if frame.bit(sec) == 1 {
            PULSE_ONE_MS
        } else {
            PULSE_ZERO_MS
        };
        out.push(EdgeEvent::new(rise, Level::High));
        out.push(EdgeEvent::new(rise + width, Level::Low));
    }
    out
}

/// Edges for consecutive minutes of broadcast
///
/// Each frame is sent for one minute, the first starting at
/// `start_ms`. The receiver synchronizes to the minute marker
/// which begins the *second* frame, so you will need at least
/// two frames to acquire the time.
///
/// A final rising edge begins the minute after the last frame,
/// closing its minute marker.
pub fn broadcast(frames: &[BitFrame], start_ms: u64) -> Vec<EdgeEvent> {
    let mut out = Vec::with_capacity(frames.len() * 2 * FRAME_BITS as usize + 1);
    let mut minute_start = start_ms;
    for frame in frames {
        out.extend(minute_edges(frame, minute_start));
        minute_start += MINUTE_MS;
    }
    if !frames.is_empty() {
        out.push(EdgeEvent::new(minute_start, Level::High));
    }
    out
}

/// Edges for a sequence of low times
///
/// Each entry of `intervals_ms` is the low time of one pulse,
/// closed by a rising edge. Pulses are `high_ms` long. The first
/// falling edge is at `start_ms`.
///
/// This is handy for feeding arbitrary, including malformed,
/// timings to a receiver.
pub fn pulse_train(intervals_ms: &[u64], high_ms: u64, start_ms: u64) -> Vec<EdgeEvent> {
    let mut out = Vec::with_capacity(2 * intervals_ms.len() + 1);
    let mut t = start_ms;
    out.push(EdgeEvent::new(t, Level::Low));
    for iv in intervals_ms {
        t += iv;
        out.push(EdgeEvent::new(t, Level::High));
        t += high_ms;
        out.push(EdgeEvent::new(t, Level::Low));
    }
    out
}

/// Convert sampled receiver output into edges
///
/// `samples` are taken at `rate` Hz; a sample is high if it is
/// positive. An edge is emitted for the first sample and for
/// every sample whose level differs from the one before it. The
/// edge timestamp is the sample time, in milliseconds.
///
/// A `rate` of zero yields no edges.
pub fn slice_samples<I>(samples: I, rate: u32) -> Vec<EdgeEvent>
where
    I: IntoIterator<Item = i16>,
{
    if rate == 0 {
        return vec![];
    }

    let mut out = vec![];
    let mut last: Option<Level> = None;
    for (i, sa) in samples.into_iter().enumerate() {
        let level = Level::from(sa > 0);
        if last != Some(level) {
            out.push(EdgeEvent::new(i as u64 * 1000 / rate as u64, level));
            last = Some(level);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::classify::{classify, PulseClass};

    // low times closed by each rising edge
    fn low_times(edges: &[EdgeEvent]) -> Vec<i64> {
        let mut out = vec![];
        let mut fall = None;
        for e in edges {
            match e.level {
                Level::Low => fall = Some(e.timestamp_ms),
                Level::High => {
                    if let Some(f) = fall {
                        out.push(e.timestamp_ms as i64 - f as i64);
                    }
                }
            }
        }
        out
    }

    #[test]
    fn test_minute_edges() {
        let frame = BitFrame::from_bits(0b101, FRAME_BITS);
        let edges = minute_edges(&frame, 5000);
        assert_eq!(2 * FRAME_BITS as usize, edges.len());
        assert_eq!(EdgeEvent::new(5000, Level::High), edges[0]);
        assert_eq!(EdgeEvent::new(5200, Level::Low), edges[1]);
        assert_eq!(EdgeEvent::new(6000, Level::High), edges[2]);
        assert_eq!(EdgeEvent::new(6100, Level::Low), edges[3]);

        // last pulse is in second 58
        assert_eq!(5000 + 58 * SECOND_MS, edges[edges.len() - 2].timestamp_ms);
    }

    #[test]
    fn test_broadcast_classifies() {
        let frame = BitFrame::from_bits(0x5555_5555_5555_5555, FRAME_BITS);
        let edges = broadcast(&[frame, frame], 0);
        let classes: Vec<PulseClass> = low_times(&edges).into_iter().map(classify).collect();

        // 58 bits, a marker, 58 bits, and the closing marker
        assert_eq!(2 * 58 + 2, classes.len());
        assert_eq!(PulseClass::MinuteSync, classes[58]);
        assert_eq!(PulseClass::MinuteSync, classes[117]);
        for (i, c) in classes[59..117].iter().enumerate() {
            assert_eq!(PulseClass::Bit(frame.bit(i) == 1), *c);
        }
    }

    #[test]
    fn test_pulse_train() {
        let edges = pulse_train(&[1800, 800, 1000], 100, 0);
        assert_eq!(vec![1800, 800, 1000], low_times(&edges));
        assert_eq!(EdgeEvent::new(3900, Level::Low), *edges.last().unwrap());
    }

    #[test]
    fn test_slice_samples() {
        // 100 Hz
        let samples: Vec<i16> = [0i16; 10]
            .iter()
            .chain([500i16; 20].iter())
            .chain([-3i16; 5].iter())
            .copied()
            .collect();
        let edges = slice_samples(samples.iter().copied(), 100);
        assert_eq!(
            vec![
                EdgeEvent::new(0, Level::Low),
                EdgeEvent::new(100, Level::High),
                EdgeEvent::new(300, Level::Low),
            ],
            edges
        );

        assert!(slice_samples(samples, 0).is_empty());
    }
}
