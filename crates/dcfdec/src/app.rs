//! Acquisition front-end
//!
//! The program performs exactly one acquisition:
//!
//! ```txt
//!   samples ──> ReplaySource ──> TimeReceiver ──> stdout
//!                                    ||
//!   --demo ──> synthesized ──────────||
//! ```
//!
//! Either the input samples or, in demo mode, a synthesized
//! broadcast are replayed in virtual time. The decoded time is
//! printed; a failed acquisition becomes a `CliError`.

use chrono::{DateTime, Duration, DurationRound, Utc};
use log::{info, warn};

use dcfsync::waveform::broadcast;
use dcfsync::{DecodedTime, ReplaySource, TimeReceiver, TimeReceiverBuilder};

use crate::cli::{Args, CliError};

/// Build the receiver from the command-line `args`
pub fn make_receiver(args: &Args) -> TimeReceiver {
    TimeReceiverBuilder::new()
        .with_max_pulses(args.max_pulses)
        .with_timeout_ms(args.timeout_secs.saturating_mul(1000))
        .with_poll_interval_ms(args.poll_ms)
        .with_align_allowance_ms(args.allowance_ms)
        .with_frame_bits(args.frame_bits)
        .with_parity_check(args.parity)
        .build()
}

/// Run the application
///
/// Runs one acquisition with a fully-initialized `receiver`
/// over the `input` iterator, which returns each `i16` sample
/// from some input source until it is exhausted.
///
/// In demo mode (see `args`), the `input` is ignored.
pub fn run<I>(args: &Args, receiver: &mut TimeReceiver, input: I) -> Result<(), CliError>
where
    I: Iterator<Item = i16>,
{
    let mut source = if args.demo {
        warn!("demonstration (--demo) mode: the following time is NOT LIVE!");
        let (source, expect) = make_demo_source(&Utc::now())?;
        info!("demo broadcast should decode to {}", expect);
        source
    } else {
        ReplaySource::from_samples(input, args.rate)
    };

    let time = receiver.acquire(&mut source)?;
    if !args.quiet {
        println!("{}", format_time(&time));
    }
    Ok(())
}

/// Display form of a decoded time
///
/// The decoded fields, and on a second line the ISO 8601 local
/// time if the fields name a real date.
pub fn format_time(time: &DecodedTime) -> String {
    match time.to_naive_datetime() {
        Some(dt) => format!("{}\n{}", time, dt.format("%Y-%m-%dT%H:%M:%S")),
        None => time.to_string(),
    }
}

/// Synthesize a two-minute broadcast starting at `now`
///
/// The broadcast starts at the top of `now`'s minute. Each
/// minute carries the time of the minute which follows it.
/// Returns the source and the time it should decode to.
pub fn make_demo_source(now: &DateTime<Utc>) -> Result<(ReplaySource, DecodedTime), anyhow::Error> {
    let minute = now.duration_trunc(Duration::minutes(1))?.naive_utc();
    let first = DecodedTime::try_from(&(minute + Duration::minutes(1)))?;
    let second = DecodedTime::try_from(&(minute + Duration::minutes(2)))?;

    let edges = broadcast(&[first.encode(), second.encode()], 0);
    Ok((ReplaySource::new(edges), second))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use clap::Parser;

    #[test]
    fn test_demo_decodes() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 14, 28, 31).unwrap();
        let (mut source, expect) = make_demo_source(&now).expect("demo");
        assert_eq!(DecodedTime::new(30, 14, 7, 18, 10, 26).unwrap(), expect);

        let args = Args::try_parse_from(["dcfdec", "--parity"]).expect("parse");
        let mut rx = make_receiver(&args);
        assert_eq!(Ok(expect), rx.acquire(&mut source));
    }

    #[test]
    fn test_demo_crosses_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 12, 31, 23, 58, 0).unwrap();
        let (_, expect) = make_demo_source(&now).expect("demo");
        assert_eq!(DecodedTime::new(0, 0, 5, 1, 1, 27).unwrap(), expect);
    }

    #[test]
    fn test_run_samples() {
        // 100 Hz samples of a synthesized broadcast
        let tm = DecodedTime::new(5, 6, 2, 3, 4, 25).unwrap();
        let edges = broadcast(&[tm.encode(), tm.encode()], 0);
        let end = edges.last().unwrap().timestamp_ms;
        let mut samples = vec![];
        let mut level = -1000i16;
        let mut edge_iter = edges.iter().peekable();
        for i in 0..=(end / 10) {
            while let Some(e) = edge_iter.next_if(|e| e.timestamp_ms <= i * 10) {
                level = match e.level {
                    dcfsync::Level::High => 1000,
                    dcfsync::Level::Low => -1000,
                };
            }
            samples.push(level);
        }

        let args = Args::try_parse_from(["dcfdec", "-q", "-r", "100"]).expect("parse");
        let mut rx = make_receiver(&args);
        assert!(run(&args, &mut rx, samples.into_iter()).is_ok());
    }

    #[test]
    fn test_run_no_signal() {
        let args = Args::try_parse_from(["dcfdec", "-q", "--timeout-secs", "5"]).expect("parse");
        let mut rx = make_receiver(&args);
        let err = run(&args, &mut rx, std::iter::repeat(0i16).take(10_000))
            .expect_err("no signal");
        assert_eq!(crate::cli::EXIT_NO_TIME, err.exit_code());
    }

    #[test]
    fn test_format_time() {
        let tm = DecodedTime::new(30, 14, 7, 18, 10, 26).unwrap();
        assert_eq!(
            "2026-10-18 14:30 (weekday 7)\n2026-10-18T14:30:00",
            format_time(&tm)
        );

        // not a calendar date
        let tm = DecodedTime::new(0, 0, 0, 0, 0, 0).unwrap();
        assert_eq!("2000-00-00 00:00 (weekday 0)", format_time(&tm));
    }
}
