mod cli;
mod config;
mod line_reader;
mod logger;
mod rewriter;
mod transform;

use anyhow::Result;
use colored::Colorize;
use rayon::prelude::*;
use std::path::Path;

use config::Config;
use rewriter::Rewriter;
use transform::QuoteReverser;

fn main() -> Result<()> {
    let args = cli::parse_args()?;

    if args.init_config {
        let path = Config::init_default_file()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {e:#}; using defaults");
            Config::default()
        }
    };

    let debug = args.debug || config.debug_logging();
    if let Some(log_path) = logger::init_debug_logging(debug)? {
        if !args.quiet {
            eprintln!("Logging to {}", log_path.display());
        }
    }

    let capacity = args.buffer_size.unwrap_or_else(|| config.buffer_capacity());
    let transform = QuoteReverser;
    let rewriter = Rewriter::new(&transform)
        .buffer_capacity(capacity)
        .dry_run(args.dry_run);

    // Files are independent: no shared state, no cross-file ordering.
    let failures: usize = args
        .files
        .par_iter()
        .map(|file| process_file(&rewriter, file, args.dry_run, args.quiet))
        .map(|ok| usize::from(!ok))
        .sum();

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Rewrite one file, reporting the outcome; failures never stop the others.
fn process_file(rewriter: &Rewriter, file: &str, dry_run: bool, quiet: bool) -> bool {
    match rewriter.rewrite_file(Path::new(file)) {
        Ok(outcome) => {
            if !quiet {
                let verb = if dry_run {
                    "would rewrite".yellow()
                } else {
                    "rewrote".green()
                };
                println!(
                    "{verb} {file}: {} lines, {} changed",
                    outcome.lines, outcome.changed
                );
            }
            true
        }
        Err(e) => {
            let kind = e
                .downcast_ref::<line_reader::ReadError>()
                .map(line_reader::ReadError::kind)
                .unwrap_or("rewrite failure");
            eprintln!("{} {file} ({kind}): {e:#}", "error:".red());
            tracing::error!(file, kind, error = %format!("{e:#}"), "rewrite failed");
            false
        }
    }
}
