//! # dcfsync: DCF77 Time Signal Decoding
//!
//! This crate decodes the
//! [DCF77](https://en.wikipedia.org/wiki/DCF77) long-wave time
//! signal, broadcast on 77.5 kHz from Mainflingen, Germany. It
//! turns the edges of a receiver module's output line into a
//! validated date and time.
//!
//! ## Disclaimer
//!
//! This crate is dual-licensed MIT and Apache 2.0. Read these
//! licenses carefully as they may affect your rights.
//!
//! DCF77 carries no error correction beyond a few parity bits.
//! This decoder checks pulse timings and field ranges, but it
//! cannot catch every bit error. Do not use it where a wrong
//! time is dangerous.
//!
//! ## Example
//!
//! You will need a DCF77 receiver module. These modules output
//! a logic level which is high while the carrier is reduced:
//! 100 ms at the start of each second for a zero bit, 200 ms for
//! a one bit, and not at all during the 59th second.
//!
//! Connect the module's output to an input which can notify you
//! of every level change, and implement [`SignalSource`] for it.
//! Your notification handler must call
//! [`EdgeCapture::on_edge()`] with a monotonic millisecond
//! timestamp and the new level.
//!
//! ```
//! use dcfsync::waveform::broadcast;
//! use dcfsync::{AcquireErr, DecodedTime, ReplaySource, TimeReceiverBuilder};
//!
//! # let tm = DecodedTime::new(42, 17, 4, 16, 10, 26).unwrap();
//! # let mut source = ReplaySource::new(broadcast(&[tm.encode(), tm.encode()], 0));
//! // let `source` be your SignalSource
//! let mut rx = TimeReceiverBuilder::new()
//!     .with_max_pulses(300)         // give up after 300 pulses…
//!     .with_timeout_ms(300_000)     // …or five minutes
//!     .build();
//!
//! match rx.acquire(&mut source) {
//!     Ok(time) => println!("it is now {}", time),
//!     Err(AcquireErr::Timeout { .. }) => println!("no signal; try again later"),
//!     Err(e) => println!("bad frame: {}", e),
//! }
//! ```
//!
//! [`acquire()`](TimeReceiver::acquire) blocks for up to the
//! configured budget. It returns just before the top of the
//! minute with the time which begins at that minute.
//!
//! Without hardware, [`ReplaySource`] replays recorded edges
//! in virtual time, and the [`waveform`] module synthesizes
//! broadcasts for any time.
//!
//! ## Background
//!
//! Every second but the last, DCF77 sends one bit. The minute
//! begins where a pulse is missing. Each minute's 59 bits carry
//! the local time of the *next* minute:
//!
//! | Bits    | Content                           |
//! |---------|-----------------------------------|
//! | 0–19    | reserved, weather, announcements  |
//! | 20      | start of time, always 1           |
//! | 21–27   | minutes, BCD                      |
//! | 28      | minute parity                     |
//! | 29–34   | hours, BCD                        |
//! | 35      | hour parity                       |
//! | 36–41   | day of month, BCD                 |
//! | 42–44   | day of week, Monday = 1           |
//! | 45–49   | month, BCD                        |
//! | 50–56   | year, BCD                         |
//! | 57      | year weight 80, not decoded       |
//! | 58      | date parity                       |
//!
//! The decoder measures each low time between pulses. A low time
//! of 800 ms follows a one; 900 ms follows a zero; more than
//! 1500 ms spans the missing pulse and marks the minute.
//!
//! ## Crate features
//!
//! * `chrono`: Convert a [`DecodedTime`] to and from a
//!   `chrono::NaiveDateTime`. If enabled, `chrono` becomes part
//!   of this crate's public API.
//!

mod align;
mod builder;
mod capture;
mod classify;
mod frame;
mod receiver;
mod source;
mod timecode;

pub mod waveform;

pub use align::{hold_off_ms, DEFAULT_ALLOWANCE_MS, MINUTE_TARGET_MS};
pub use builder::TimeReceiverBuilder;
pub use capture::{EdgeCapture, EdgeEvent, Level, Pulse};
pub use classify::{classify, PulseClass, BIT_ONE_MS, BIT_ZERO_MS, MINUTE_SYNC_MIN_MS};
pub use frame::{BitFrame, FrameState, FRAME_BITS};
pub use receiver::{AcquireErr, TimeReceiver};
pub use source::{CaptureErr, ReplaySource, SignalSource};
pub use timecode::{check_parity, decode, DecodedTime, Field, FieldRangeErr};
