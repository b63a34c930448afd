//! Time code fields
//!
//! DCF77 sends each calendar field as a run of bits starting at
//! a fixed second. The bits of a field are weighted
//!
//! ```txt
//! 1, 2, 4, 8, 10, 20, 40, 80
//! ```
//!
//! which is a two-digit BCD number sent ones-digit first. Only
//! as many weights as the field has bits are used.

use std::convert::TryFrom;
use std::fmt;

#[cfg(feature = "chrono")]
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::frame::BitFrame;

/// A calendar field of the time code
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::EnumIter,
    strum_macros::IntoStaticStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    /// Minute of the hour
    Minutes,

    /// Hour of the day
    Hours,

    /// Day of the month
    Day,

    /// Day of the week, Monday is 1
    Weekday,

    /// Month of the year
    Month,

    /// Two-digit year
    Year,
}

impl Field {
    /// Second of the minute which carries the field's first bit
    pub const fn start_bit(&self) -> usize {
        match self {
            Field::Minutes => 21,
            Field::Hours => 29,
            Field::Day => 36,
            Field::Weekday => 42,
            Field::Month => 45,
            Field::Year => 50,
        }
    }

    /// Number of bits in the field
    pub const fn width(&self) -> usize {
        match self {
            Field::Minutes => 7,
            Field::Hours => 6,
            Field::Day => 6,
            Field::Weekday => 3,
            Field::Month => 5,
            Field::Year => 7,
        }
    }

    /// Largest plausible value
    pub const fn max_value(&self) -> u8 {
        match self {
            Field::Minutes => 59,
            Field::Hours => 23,
            Field::Day => 31,
            Field::Weekday => 7,
            Field::Month => 12,
            Field::Year => 99,
        }
    }

    // even parity bit which follows the field, if any
    const fn parity_bit(&self) -> Option<usize> {
        match self {
            Field::Minutes => Some(28),
            Field::Hours => Some(35),
            _ => None,
        }
    }
}

/// A field value out of range
///
/// The frame was received completely but does not describe a
/// plausible time. This usually means a bit was misread without
/// tripping the pulse timing checks. Acquire a fresh frame.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[error("implausible {field}: {value} (maximum {max})", max = .field.max_value())]
pub struct FieldRangeErr {
    /// The offending field
    pub field: Field,

    /// The decoded value
    pub value: u8,
}

/// A decoded and validated DCF77 time
///
/// This is the local (CET/CEST) time which begins at the
/// minute marker *after* the frame that carried it. Every field
/// has been range-checked, but the date as a whole is not
/// checked against the calendar.
///
/// ```
/// use dcfsync::DecodedTime;
///
/// let tm = DecodedTime::new(30, 14, 7, 18, 10, 26).expect("valid time");
/// assert_eq!(tm.hours(), 14);
/// assert_eq!("2026-10-18 14:30 (weekday 7)", tm.to_string());
///
/// assert!(DecodedTime::new(60, 14, 7, 18, 10, 26).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodedTime {
    minutes: u8,
    hours: u8,
    weekday: u8,
    day: u8,
    month: u8,
    year: u8,
}

impl DecodedTime {
    /// Validated time from its fields
    ///
    /// Fails if any field exceeds its
    /// [maximum](Field::max_value). Zero is accepted for every
    /// field, including `weekday`, `day`, and `month`.
    pub fn new(
        minutes: u8,
        hours: u8,
        weekday: u8,
        day: u8,
        month: u8,
        year: u8,
    ) -> Result<Self, FieldRangeErr> {
        let out = Self {
            minutes,
            hours,
            weekday,
            day,
            month,
            year,
        };

        for field in Field::iter() {
            let value = out.get(field);
            if value > field.max_value() {
                return Err(FieldRangeErr { field, value });
            }
        }

        Ok(out)
    }

    /// Minute of the hour, `0..=59`
    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    /// Hour of the day, `0..=23`
    pub fn hours(&self) -> u8 {
        self.hours
    }

    /// Day of the week, `1..=7` with Monday as 1
    ///
    /// A zero weekday is not valid DCF77 but passes validation.
    pub fn weekday(&self) -> u8 {
        self.weekday
    }

    /// Day of the month, `1..=31`
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Month of the year, `1..=12`
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Two-digit year, `0..=99`
    pub fn year(&self) -> u8 {
        self.year
    }

    /// Value of the given `field`
    pub fn get(&self, field: Field) -> u8 {
        match field {
            Field::Minutes => self.minutes,
            Field::Hours => self.hours,
            Field::Day => self.day,
            Field::Weekday => self.weekday,
            Field::Month => self.month,
            Field::Year => self.year,
        }
    }

    /// Encode as a full DCF77 frame
    ///
    /// Writes every field, the start-of-time bit (20), and the
    /// even parity bits for minutes (28), hours (35), and the
    /// date (58). All other bits are zero.
    ///
    /// Tens digits which do not fit the field are truncated;
    /// years from 80 onward do not survive encoding.
    pub fn encode(&self) -> BitFrame {
        let mut bits = 1u64 << START_OF_TIME_BIT;
        for field in Field::iter() {
            bits |= field_bits(field, self.get(field));
        }
        bits |= (parity(bits, 21, 28) as u64) << 28;
        bits |= (parity(bits, 29, 35) as u64) << 35;
        bits |= (parity(bits, 36, 58) as u64) << 58;
        BitFrame::from_bits(bits, crate::frame::FRAME_BITS)
    }

    /// Convert to a calendar date and time
    ///
    /// Assumes the year is in the 2000s. Returns `None` if the
    /// fields do not name a real date, like February 31st.
    #[cfg(feature = "chrono")]
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2000 + self.year as i32, self.month as u32, self.day as u32)?
            .and_hms_opt(self.hours as u32, self.minutes as u32, 0)
    }
}

impl fmt::Display for DecodedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "20{:02}-{:02}-{:02} {:02}:{:02} (weekday {})",
            self.year, self.month, self.day, self.hours, self.minutes, self.weekday
        )
    }
}

impl TryFrom<&BitFrame> for DecodedTime {
    type Error = FieldRangeErr;

    fn try_from(frame: &BitFrame) -> Result<Self, Self::Error> {
        decode(frame)
    }
}

#[cfg(feature = "chrono")]
impl TryFrom<&NaiveDateTime> for DecodedTime {
    type Error = FieldRangeErr;

    /// The DCF77 fields of a calendar time, seconds discarded
    fn try_from(dt: &NaiveDateTime) -> Result<Self, Self::Error> {
        Self::new(
            dt.minute() as u8,
            dt.hour() as u8,
            dt.weekday().number_from_monday() as u8,
            dt.day() as u8,
            dt.month() as u8,
            dt.year().rem_euclid(100) as u8,
        )
    }
}

/// Decode the time fields of a received frame
///
/// Each field is the weighted sum of its bits. The result is
/// range-checked; the first implausible field is reported as an
/// error and no partial time is returned.
///
/// The frame's cursor and state are not consulted. The caller
/// decides when the frame is complete.
pub fn decode(frame: &BitFrame) -> Result<DecodedTime, FieldRangeErr> {
    DecodedTime::new(
        weighted_sum(frame, Field::Minutes),
        weighted_sum(frame, Field::Hours),
        weighted_sum(frame, Field::Weekday),
        weighted_sum(frame, Field::Day),
        weighted_sum(frame, Field::Month),
        weighted_sum(frame, Field::Year),
    )
}

/// Check the minute and hour parity bits of a received frame
///
/// DCF77 follows the minutes and hours with an even parity bit.
/// Returns the first field whose parity does not match.
pub fn check_parity(frame: &BitFrame) -> Result<(), Field> {
    for field in [Field::Minutes, Field::Hours] {
        if let Some(pbit) = field.parity_bit() {
            if parity(frame.bits(), field.start_bit(), pbit) {
                return Err(field);
            }
        }
    }
    Ok(())
}

// Bit weights of a two-digit BCD field, ones digit first
const WEIGHTS: [u8; 8] = [1, 2, 4, 8, 10, 20, 40, 80];

// Start of encoded time; always one
const START_OF_TIME_BIT: usize = 20;

// Weighted sum of `field`'s bits in `frame`
fn weighted_sum(frame: &BitFrame, field: Field) -> u8 {
    WEIGHTS
        .iter()
        .take(field.width())
        .enumerate()
        .map(|(i, w)| w * frame.bit(field.start_bit() + i))
        .sum()
}

// Packed bits for `value` in `field`, without range checks
//
// The tens digit is truncated to the bits available.
fn field_bits(field: Field, value: u8) -> u64 {
    let bcd = (value / 10) << 4 | (value % 10);
    let mask = (1u64 << field.width()) - 1;
    (bcd as u64 & mask) << field.start_bit()
}

// Odd count of ones in bits `first..=last` of `word`
fn parity(word: u64, first: usize, last: usize) -> bool {
    let span = last - first + 1;
    ((word >> first) & ((1u64 << span) - 1)).count_ones() % 2 == 1
}
