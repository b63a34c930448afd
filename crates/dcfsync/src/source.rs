//! Signal sources
//!
//! A [`SignalSource`] is the hardware boundary: whatever watches
//! the receiver's output line and tells an
//! [`EdgeCapture`](crate::EdgeCapture) about each transition. It
//! also supplies the monotonic clock and the means to suspend
//! the acquisition loop.

use std::sync::Arc;

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use thiserror::Error;

use crate::capture::{EdgeCapture, EdgeEvent};
use crate::waveform;

/// Error enabling a signal source
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CaptureErr {
    /// The source is already delivering edges to a capture
    #[error("signal source is already enabled")]
    AlreadyEnabled,

    /// The hardware could not be set up
    #[error("signal source unavailable: {0}")]
    Unavailable(String),
}

/// Source of level transitions
///
/// Implement this trait for your receiver hardware. While
/// enabled, the source must call
/// [`EdgeCapture::on_edge()`](crate::EdgeCapture::on_edge)
/// from its notification handler for every transition of the
/// monitored line, using the same clock as
/// [`now_ms()`](#tymethod.now_ms).
///
/// The [`TimeReceiver`](crate::TimeReceiver) enables the source
/// at the start of an acquisition and disables it when the
/// acquisition ends, however it ends.
pub trait SignalSource {
    /// Start delivering edges to `capture`
    fn enable(&mut self, capture: Arc<EdgeCapture>) -> Result<(), CaptureErr>;

    /// Stop delivering edges
    ///
    /// Disabling a disabled source does nothing.
    fn disable(&mut self);

    /// Monotonic time, in milliseconds
    fn now_ms(&self) -> u64;

    /// Suspend the caller for about `ms` milliseconds
    fn sleep_ms(&mut self, ms: u64);
}

/// Replays recorded edges in virtual time
///
/// The `ReplaySource` owns a list of [`EdgeEvent`]s and a
/// virtual clock which starts at zero. Time only passes when the
/// acquisition loop calls [`sleep_ms()`](SignalSource::sleep_ms).
/// Each sleep delivers every edge which falls due, in order, to
/// the enabled capture. Edges which fall due while the source is
/// disabled are lost, as they would be on real hardware.
///
/// Once the recording is exhausted, the line simply goes quiet.
///
/// ```
/// use dcfsync::{DecodedTime, ReplaySource, TimeReceiverBuilder};
/// use dcfsync::waveform::broadcast;
///
/// let tm = DecodedTime::new(15, 9, 3, 14, 5, 25).unwrap();
/// let edges = broadcast(&[tm.encode(), tm.encode()], 0);
/// let mut src = ReplaySource::new(edges);
///
/// let mut rx = TimeReceiverBuilder::default().build();
/// assert_eq!(Ok(tm), rx.acquire(&mut src));
/// ```
#[derive(Clone, Debug)]
pub struct ReplaySource {
    edges: Vec<EdgeEvent>,
    next: usize,
    now_ms: u64,
    capture: Option<Arc<EdgeCapture>>,
}

impl ReplaySource {
    /// Replay the given `edges`
    ///
    /// Edges are sorted by timestamp. Edges at the same time keep
    /// their relative order.
    pub fn new<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = EdgeEvent>,
    {
        let mut edges: Vec<EdgeEvent> = edges.into_iter().collect();
        edges.sort_by_key(|e| e.timestamp_ms);
        Self {
            edges,
            next: 0,
            now_ms: 0,
            capture: None,
        }
    }

    /// Replay sampled receiver output
    ///
    /// `samples` are taken at `rate` Hz. Positive samples are
    /// high. See [`waveform::slice_samples()`].
    pub fn from_samples<I>(samples: I, rate: u32) -> Self
    where
        I: IntoIterator<Item = i16>,
    {
        Self::new(waveform::slice_samples(samples, rate))
    }

    /// Edges not yet replayed
    pub fn remaining(&self) -> usize {
        self.edges.len() - self.next
    }

    /// True if every edge has been replayed
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// True while edges are being delivered
    pub fn is_enabled(&self) -> bool {
        self.capture.is_some()
    }

    // deliver all edges due at or before `until_ms`
    fn advance(&mut self, until_ms: u64) {
        while let Some(edge) = self.edges.get(self.next) {
            if edge.timestamp_ms > until_ms {
                break;
            }
            if let Some(capture) = &self.capture {
                capture.on_edge(edge.timestamp_ms, edge.level);
            }
            self.next += 1;
        }
        self.now_ms = until_ms;
    }
}

impl SignalSource for ReplaySource {
    fn enable(&mut self, capture: Arc<EdgeCapture>) -> Result<(), CaptureErr> {
        if self.capture.is_some() {
            return Err(CaptureErr::AlreadyEnabled);
        }
        debug!(
            "replay: enabled at {} ms, {} edges remaining",
            self.now_ms,
            self.remaining()
        );
        self.capture = Some(capture);
        Ok(())
    }

    fn disable(&mut self) {
        if self.capture.take().is_some() {
            debug!("replay: disabled at {} ms", self.now_ms);
        }
    }

    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.advance(self.now_ms.saturating_add(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::capture::Level;

    fn edges() -> Vec<EdgeEvent> {
        vec![
            EdgeEvent::new(1100, Level::Low),
            EdgeEvent::new(100, Level::Low),
            EdgeEvent::new(1000, Level::High),
            EdgeEvent::new(0, Level::High),
        ]
    }

    #[test]
    fn test_replay_delivers_in_order() {
        let cap = Arc::new(EdgeCapture::new());
        let mut src = ReplaySource::new(edges());
        assert_eq!(4, src.remaining());

        src.enable(cap.clone()).expect("enable");
        assert!(src.is_enabled());
        assert_eq!(Err(CaptureErr::AlreadyEnabled), src.enable(cap.clone()));

        src.sleep_ms(999);
        assert_eq!(999, src.now_ms());
        assert_eq!(2, src.remaining());
        assert!(cap.take().is_none());

        src.sleep_ms(1);
        assert_eq!(1, src.remaining());
        let pulse = cap.take().expect("pulse");
        assert_eq!(900, pulse.interval_ms());
        assert_eq!(0, pulse.elapsed_ms(src.now_ms()));

        src.sleep_ms(10_000);
        assert!(src.is_exhausted());
        assert_eq!(11_000, src.now_ms());
    }

    #[test]
    fn test_replay_disabled_drops_edges() {
        let cap = Arc::new(EdgeCapture::new());
        let mut src = ReplaySource::new(edges());

        // falling edge at 100 is lost
        src.sleep_ms(500);
        src.enable(cap.clone()).expect("enable");
        src.sleep_ms(1000);
        assert!(cap.take().is_none());

        src.disable();
        src.disable();
        assert!(!src.is_enabled());
        assert!(src.is_exhausted());
    }

    #[test]
    fn test_replay_from_samples() {
        // 10 Hz: high for 1 sample, low for 9
        let samples = (0..30).map(|i| if i % 10 == 0 { 1000i16 } else { -1000 });
        let cap = Arc::new(EdgeCapture::new());
        let mut src = ReplaySource::from_samples(samples, 10);
        src.enable(cap.clone()).expect("enable");

        src.sleep_ms(1000);
        assert_eq!(900, cap.take().expect("pulse").interval_ms());
    }
}
