//! In-place file rewriting
//!
//! Drives a [`LineReader`] over a file opened for read+write, applies a
//! [`LineTransform`] to each line, and writes the result back into the same
//! file at a running write offset. The read and write sides are two clones
//! of one open handle; both seek explicitly before every operation, so the
//! shared cursor never carries state between them.
//!
//! The write cursor must never pass the reader's fetch position: bytes
//! beyond it are still unread on disk, and overwriting them would corrupt
//! the remainder of the file. The reader publishes that bound as its write
//! frontier and the rewriter refuses any line that would cross it, which in
//! practice only triggers for transforms producing longer output than their
//! input. Failures are file-local: the file is left partially rewritten at
//! the last successful write offset, never rolled back.

use crate::line_reader::{Emission, LineReader};
use crate::transform::LineTransform;
use anyhow::{Context, Result, bail};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// Per-file summary of one rewrite pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Lines read from the file
    pub lines: usize,
    /// Lines the transform actually changed
    pub changed: usize,
    /// Bytes written back, including terminators
    pub bytes_written: u64,
}

/// Rewrites files in place, one line at a time, through a fixed-size buffer
pub struct Rewriter<'a> {
    transform: &'a dyn LineTransform,
    buffer_capacity: usize,
    dry_run: bool,
}

impl<'a> Rewriter<'a> {
    pub fn new(transform: &'a dyn LineTransform) -> Self {
        Rewriter {
            transform,
            buffer_capacity: crate::line_reader::DEFAULT_CAPACITY,
            dry_run: false,
        }
    }

    /// Line buffer capacity used for every file this rewriter processes
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Read and count changes without writing anything back
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Rewrite one file in place
    ///
    /// Emitted lines are written back LF-terminated (CRLF input shrinks),
    /// and the file is truncated to the bytes actually written after a
    /// clean end-of-file. On any error the file keeps whatever had been
    /// written so far.
    pub fn rewrite_file(&self, path: &Path) -> Result<RewriteOutcome> {
        let file = OpenOptions::new()
            .read(true)
            .write(!self.dry_run)
            .open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;

        // In dry-run mode the single handle is read-only and no write side
        // exists at all.
        let (src, mut out) = if self.dry_run {
            (file, None)
        } else {
            let src = file
                .try_clone()
                .with_context(|| format!("Failed to clone handle for: {}", path.display()))?;
            (src, Some(file))
        };

        let mut reader = LineReader::with_capacity(src, self.buffer_capacity);
        let mut outcome = RewriteOutcome::default();
        let mut write_offset: u64 = 0;

        reader.request_line();
        while let Some(delivery) = reader.poll() {
            let emission = delivery
                .with_context(|| format!("Failed to read line from {}", path.display()))?;
            match emission {
                Emission::Line(line) => {
                    let replaced = self.transform.transform(&line);
                    outcome.lines += 1;
                    if replaced.as_ref() != line.as_str() {
                        outcome.changed += 1;
                    }
                    if let Some(out) = out.as_mut() {
                        write_offset = write_line(
                            out,
                            write_offset,
                            replaced.as_bytes(),
                            reader.write_frontier(),
                        )
                        .with_context(|| {
                            format!("Failed to write line {} of {}", outcome.lines, path.display())
                        })?;
                        outcome.bytes_written = write_offset;
                    }
                    reader.request_line();
                }
                Emission::Eof => break,
            }
        }

        if let Some(out) = out.as_mut() {
            // CRLF normalization makes the output shorter than the input;
            // drop the stale tail past the last write.
            out.set_len(write_offset)
                .with_context(|| format!("Failed to truncate {}", path.display()))?;
        }

        tracing::debug!(
            file = %path.display(),
            lines = outcome.lines,
            changed = outcome.changed,
            dry_run = self.dry_run,
            "rewrite pass complete"
        );
        Ok(outcome)
    }
}

/// Write one LF-terminated line at `offset`, returning the next offset
fn write_line(
    out: &mut File,
    offset: u64,
    line: &[u8],
    frontier: Option<u64>,
) -> Result<u64> {
    let end = offset + line.len() as u64 + 1;
    if let Some(frontier) = frontier {
        if end > frontier {
            bail!(
                "transformed line of {} bytes would overrun unread input at offset {}",
                line.len(),
                frontier
            );
        }
    }
    out.seek(SeekFrom::Start(offset))?;
    out.write_all(line)?;
    out.write_all(b"\n")?;
    Ok(end)
}
