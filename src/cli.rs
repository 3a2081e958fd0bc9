use anyhow::{Result, bail};
use clap::Parser;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

Copyright (c) 2025 InkyQuill
License: MIT
Source: https://github.com/InkyQuill/qrev
Rust Edition: 2024"
);

/// Smallest line buffer worth running with; anything below this cannot hold
/// a terminator plus useful content.
const MIN_BUFFER_SIZE: usize = 16;

#[derive(Parser)]
#[command(name = "qrev")]
#[command(about = "Reverse quoted text in place, streaming files of any size")]
#[command(long_about = "qrev rewrites text files in place, one line at a time.

Each file is streamed through a fixed-size buffer, so files far larger than
memory are fine. The default transformation reverses the characters between
each pair of double quotes on a line, leaving everything else untouched.

Both LF and CRLF line endings are accepted; output is always LF. A line
longer than the buffer fails that file (raise --buffer-size for long lines).
Failures are per-file: the remaining files are still processed.

EXAMPLES:
  qrev notes.txt                     Rewrite one file in place
  qrev *.log                         Rewrite many files, in parallel
  qrev --dry-run big.csv             Count changes without writing
  qrev --buffer-size 1048576 big.csv Allow lines up to 1 MiB
  qrev --init-config                 Write a commented default config")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
struct Cli {
    /// Files to rewrite in place
    #[arg(value_name = "FILE", required_unless_present = "init_config")]
    files: Vec<String>,

    /// Preview mode (read and count changes, write nothing)
    #[arg(short = 'd', long)]
    #[arg(help = "Read and count changes without modifying any file")]
    dry_run: bool,

    /// Line buffer capacity in bytes
    #[arg(long, value_name = "BYTES")]
    #[arg(help = "Line buffer capacity in bytes (default: 65536)\nA line longer than this fails its file; raise it for long-line data")]
    buffer_size: Option<usize>,

    /// Suppress per-file status output
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging for this run
    #[arg(long)]
    #[arg(help = "Log debug output to the qrev log file for this run\nOverrides the [logging] section of the config file")]
    debug: bool,

    /// Write a commented default configuration file and exit
    #[arg(long = "init-config")]
    init_config: bool,
}

#[derive(Debug)]
pub struct Args {
    pub files: Vec<String>,
    pub dry_run: bool,
    pub buffer_size: Option<usize>,
    pub quiet: bool,
    pub debug: bool,
    pub init_config: bool,
}

pub fn parse_args() -> Result<Args> {
    let cli = Cli::parse();

    if let Some(size) = cli.buffer_size {
        if size < MIN_BUFFER_SIZE {
            bail!("--buffer-size must be at least {MIN_BUFFER_SIZE} bytes, got {size}");
        }
    }

    Ok(Args {
        files: cli.files,
        dry_run: cli.dry_run,
        buffer_size: cli.buffer_size,
        quiet: cli.quiet,
        debug: cli.debug,
        init_config: cli.init_config,
    })
}
