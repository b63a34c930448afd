use std::fmt::Display;

use clap::{error::ErrorKind, value_parser, CommandFactory, Parser};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts the output of a DCF77 receiver module, sampled as signed 16-bit (i16) PCM at the given --rate, and decodes one minute of time code. Positive samples are high (carrier reduced).

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program accepts the output of a DCF77 receiver module, sampled as signed 16-bit (i16) PCM at the given --rate, and decodes one minute of time code. Positive samples are high (carrier reduced).

If your receiver module's output is wired to a sound card input, you can record and decode it with sox

    sox -d -t raw -r 1000 -e signed -b 16 -c 1 - \
        | dcfdec -r 1000

Acquisition waits for a minute marker and then reads one full minute, so expect to wait up to two minutes. It gives up after --max-pulses pulses or --timeout-secs, whichever comes first.

On success, the decoded time is printed as

    2026-10-18 14:30 (weekday 7)
    2026-10-18T14:30:00

and dcfdec exits with status 0. If no time could be decoded, dcfdec exits with status 2.

The input is replayed in virtual time: a recording is decoded as fast as it can be read.
"#;

const ADVANCED: &str = "Advanced Decoder Options";

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even the decoded time
    #[arg(short, long)]
    pub quiet: bool,

    /// Sampling rate (Hz)
    ///
    /// Set to the sampling rate of your input. The decoder needs
    /// about 10 ms of resolution; 1000 Hz is plenty.
    #[arg(short, long, default_value_t = 1000)]
    #[arg(value_parser = value_parser!(u32).range(100..))]
    pub rate: u32,

    /// Input file (or "-" for stdin)
    ///
    /// The input must be one-channel (mono), signed 16-bit
    /// native-endian at --rate.
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Decode a synthesized broadcast for the current time and exit
    ///
    /// No input is read. The demo broadcast is two minutes long,
    /// starting at the current UTC minute, and should decode to
    /// the minute after next.
    #[arg(long)]
    pub demo: bool,

    /// Give up after this many pulses
    #[arg(long, default_value_t = 300)]
    #[arg(value_parser = value_parser!(u32).range(1..))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub max_pulses: u32,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 300)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub timeout_secs: u64,

    /// Pulse poll interval (ms)
    #[arg(long, default_value_t = 1)]
    #[arg(value_parser = value_parser!(u64).range(1..=50))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub poll_ms: u64,

    /// Return this long before the top of the minute (ms)
    #[arg(long, default_value_t = 250)]
    #[arg(value_parser = value_parser!(u64).range(0..=2000))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub allowance_ms: u64,

    /// Bits required for a complete frame (57 ≤ BITS ≤ 59)
    #[arg(long, default_value_t = 58)]
    #[arg(value_parser = value_parser!(u8).range(57..=59))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub frame_bits: u8,

    /// Reject frames with bad minute or hour parity
    #[arg(long)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub parity: bool,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }
}

/// Exit code when no time could be decoded
pub const EXIT_NO_TIME: i32 = 2;

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

impl From<dcfsync::AcquireErr> for CliError {
    fn from(err: dcfsync::AcquireErr) -> CliError {
        CliError::new(err.into(), EXIT_NO_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["dcfdec"]).expect("parse");
        assert!(args.input_is_stdin());
        assert_eq!(1000, args.rate);
        assert_eq!(300, args.max_pulses);
        assert_eq!(58, args.frame_bits);
        assert!(!args.parity);
    }

    #[test]
    fn test_ranges() {
        assert!(Args::try_parse_from(["dcfdec", "--frame-bits", "60"]).is_err());
        assert!(Args::try_parse_from(["dcfdec", "--rate", "10"]).is_err());
        assert!(Args::try_parse_from(["dcfdec", "--poll-ms", "0"]).is_err());
    }

    #[test]
    fn test_acquire_err_exit_code() {
        let err = CliError::from(dcfsync::AcquireErr::Timeout {
            pulses: 300,
            elapsed_ms: 1,
        });
        assert_eq!(EXIT_NO_TIME, err.exit_code());
    }
}
