use std::io;

use anyhow::{anyhow, Context};
use byteorder::{NativeEndian, ReadBytesExt};
use clap::Parser;
use log::{info, LevelFilter};

mod app;
mod cli;

use cli::{Args, CliError};

fn main() {
    match dcfdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn dcfdec() -> Result<(), CliError> {
    let args = Args::try_parse()?;
    log_setup(&args);

    let mut rx = app::make_receiver(&args);
    if args.demo {
        return app::run(&args, &mut rx, std::iter::empty());
    }

    let stdin = io::stdin();
    let mut input = open_input(&args, stdin.lock())?;

    // samples end at the first short read
    let samples = std::iter::from_fn(|| input.read_i16::<NativeEndian>().ok());
    app::run(&args, &mut rx, samples)
}

fn log_setup(args: &Args) {
    if args.quiet {
        return;
    }

    // RUST_LOG overrides -v
    if std::env::var_os("RUST_LOG").is_some() {
        pretty_env_logger::init();
        return;
    }

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    pretty_env_logger::formatted_builder()
        .filter_module("dcfsync", level)
        .filter_module("dcfdec", level)
        .init();
}

// Sample input: the --file, or standard input
fn open_input<'a>(
    args: &Args,
    stdin: io::StdinLock<'a>,
) -> Result<Box<dyn io::BufRead + 'a>, anyhow::Error> {
    if !args.input_is_stdin() {
        info!("dcfdec: samples from \"{}\"", args.file);
        let file = std::fs::File::open(&args.file)
            .with_context(|| format!("cannot open --file \"{}\"", args.file))?;
        return Ok(Box::new(io::BufReader::new(file)));
    }

    if is_terminal(&io::stdin()) {
        return Err(anyhow!(
            "standard input is a terminal, not a sample stream.

Pipe the receiver output (i16 samples at --rate) into dcfdec,
or run with --demo to decode a synthesized broadcast."
        ));
    }
    info!("dcfdec: samples from standard input");
    Ok(Box::new(stdin))
}

#[cfg(not(target_os = "windows"))]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::fd::AsRawFd,
{
    terminal_size::terminal_size_using_fd(stream.as_raw_fd()).is_some()
}

#[cfg(target_os = "windows")]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::windows::io::AsRawHandle,
{
    terminal_size::terminal_size_using_handle(stream.as_raw_handle()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_open_input_file() {
        let path = std::env::temp_dir().join(format!("dcfdec-{}.raw", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).expect("create");
            for s in [-1000i16, 1000, 1000] {
                file.write_all(&s.to_ne_bytes()).expect("write");
            }
            file.write_all(&[0x7f]).expect("write");
        }

        let args = Args::try_parse_from(["dcfdec", "--file", path.to_str().unwrap()])
            .expect("parse");
        let stdin = io::stdin();
        let mut input = open_input(&args, stdin.lock()).expect("open");
        let samples: Vec<i16> =
            std::iter::from_fn(|| input.read_i16::<NativeEndian>().ok()).collect();
        std::fs::remove_file(&path).expect("remove");

        // the trailing odd byte is not a sample
        assert_eq!(vec![-1000, 1000, 1000], samples);
    }

    #[test]
    fn test_open_input_missing_file() {
        let args = Args::try_parse_from(["dcfdec", "--file", "/nonexistent/dcfdec.raw"])
            .expect("parse");
        let stdin = io::stdin();
        let err = open_input(&args, stdin.lock()).err().expect("missing file");
        assert!(err.to_string().contains("cannot open --file"));
    }
}
