//! Incremental buffered line reading
//!
//! This module is the core of qrev: a pull-based line reader that steps
//! through arbitrarily large files using a single fixed-capacity byte
//! buffer. Lines are assembled across read boundaries, CRLF terminators are
//! normalized, and a single-slot delivery protocol guarantees at most one
//! fetch in flight per reader.
//!
//! The consumption pattern is deliberately narrow: arm exactly one fetch
//! with [`LineReader::request_line`], collect its single delivery with
//! [`LineReader::poll`], repeat. Each accepted request resolves exactly once
//! with a line, an end-of-file signal, or an error. Requesting a second
//! fetch while one is armed is a protocol violation that permanently closes
//! the reader.

use std::io::{self, Read, Seek, SeekFrom};

/// Default line buffer capacity (64 KiB)
///
/// A line longer than the configured capacity (terminator included) cannot
/// be assembled and fails the file with [`ReadError::LineTooLong`].
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Errors surfaced through the reader's delivery slot
///
/// All of these are terminal for the reader: once one is delivered the
/// reader is closed and only [`ReadError::Closed`] (or a repeated
/// end-of-file signal) can follow.
#[derive(Debug)]
pub enum ReadError {
    /// A fetch was requested while another was still outstanding
    Busy,
    /// The reader was closed before the request
    Closed,
    /// An unterminated line saturated the whole buffer capacity
    LineTooLong { capacity: usize },
    /// The underlying source failed, or produced invalid UTF-8
    Io(io::Error),
}

impl ReadError {
    /// Short stable tag for the failure-reporting boundary
    pub fn kind(&self) -> &'static str {
        match self {
            ReadError::Busy => "protocol violation",
            ReadError::Closed => "reader closed",
            ReadError::LineTooLong { .. } => "capacity exceeded",
            ReadError::Io(_) => "read failure",
        }
    }
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Busy => write!(f, "line fetch already in progress"),
            ReadError::Closed => write!(f, "reader is closed"),
            ReadError::LineTooLong { capacity } => {
                write!(f, "line exceeds buffer capacity of {capacity} bytes")
            }
            ReadError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        ReadError::Io(err)
    }
}

/// One delivery from the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// A terminator-stripped UTF-8 line, copied out of the buffer
    Line(String),
    /// The source is exhausted; delivered once, then repeated on demand
    Eof,
}

/// Fixed-capacity byte window over the unprocessed part of the stream
///
/// Encapsulates the `start <= end <= capacity` bookkeeping so the indices
/// can never be observed out of order. `start..end` holds bytes read from
/// the source but not yet handed to the caller.
#[derive(Debug)]
struct Window {
    buf: Box<[u8]>,
    start: usize,
    end: usize,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Window {
            buf: vec![0u8; capacity].into_boxed_slice(),
            start: 0,
            end: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn len(&self) -> usize {
        self.end - self.start
    }

    fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when the unprocessed range already spans the whole buffer, so
    /// compaction cannot reclaim any room for another read.
    fn is_saturated(&self) -> bool {
        self.len() == self.buf.len()
    }

    fn unprocessed(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// Offset of the first LF within the unprocessed range
    fn find_lf(&self) -> Option<usize> {
        self.unprocessed().iter().position(|&b| b == b'\n')
    }

    /// Drop `n` bytes from the front of the unprocessed range
    fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.len());
        self.start += n;
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
    }

    /// Move the unprocessed range to the front of the buffer
    fn compact(&mut self) {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
    }

    /// Writable spare room after the unprocessed range
    fn spare(&mut self) -> &mut [u8] {
        &mut self.buf[self.end..]
    }

    /// Record `n` bytes appended into the spare room
    fn extend(&mut self, n: usize) {
        debug_assert!(self.end + n <= self.buf.len());
        self.end += n;
    }

    fn clear(&mut self) {
        self.start = 0;
        self.end = 0;
    }
}

/// Pull-based buffered line reader over a seekable byte source
///
/// One instance per open file. The source is owned exclusively and released
/// exactly once, either when end-of-file is delivered, when an unrecoverable
/// error occurs, or on an explicit [`close`](LineReader::close). A closed
/// reader is inert: further requests resolve immediately without touching
/// the buffer.
///
/// The reader seeks to its own read position before every refill, so a
/// writer moving the shared cursor of a cloned handle between fetches
/// cannot disturb it.
pub struct LineReader<R> {
    src: Option<R>,
    window: Window,
    /// Offset of the next byte to read from the source; never decreases
    file_pos: u64,
    /// The source returned zero bytes; nothing further to fetch
    at_eof: bool,
    /// The end-of-file delivery has been collected at least once
    eof_signaled: bool,
    /// Armed delivery; `Some` exactly while a fetch is outstanding
    pending: Option<Result<Emission, ReadError>>,
}

impl<R: Read + Seek> LineReader<R> {
    /// Reader with the default buffer capacity
    pub fn new(src: R) -> Self {
        Self::with_capacity(src, DEFAULT_CAPACITY)
    }

    /// Reader with an explicit buffer capacity
    ///
    /// The capacity is a hard ceiling on line length (terminator included),
    /// not a tuning hint. Callers expecting longer lines must configure a
    /// larger capacity up front.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(src: R, capacity: usize) -> Self {
        assert!(capacity > 0, "line buffer capacity must be non-zero");
        LineReader {
            src: Some(src),
            window: Window::new(capacity),
            file_pos: 0,
            at_eof: false,
            eof_signaled: false,
            pending: None,
        }
    }

    /// Arm exactly one line fetch
    ///
    /// Never returns a value: the outcome is always collected through
    /// [`poll`](LineReader::poll), so every accepted request resolves
    /// exactly once, errors included.
    ///
    /// Requesting while a delivery is already armed is a protocol
    /// violation: the armed delivery is discarded unseen, the reader is
    /// closed, and [`ReadError::Busy`] is delivered in its place. After
    /// end-of-file has been collected the request resolves to another
    /// end-of-file signal; after close it resolves to
    /// [`ReadError::Closed`]. Neither touches the buffer.
    pub fn request_line(&mut self) {
        if self.pending.is_some() {
            // Overlapping fetch. Drop the stale delivery rather than
            // emitting it, and make the violation the terminal event.
            self.pending = None;
            self.close();
            self.pending = Some(Err(ReadError::Busy));
            return;
        }
        if self.eof_signaled {
            self.pending = Some(Ok(Emission::Eof));
            return;
        }
        if self.src.is_none() {
            self.pending = Some(Err(ReadError::Closed));
            return;
        }
        let delivery = self.fetch();
        self.pending = Some(delivery);
    }

    /// Collect the armed delivery, or `None` when no fetch is outstanding
    pub fn poll(&mut self) -> Option<Result<Emission, ReadError>> {
        self.pending.take()
    }

    /// Release the source and invalidate the buffer
    ///
    /// Idempotent. An armed delivery not yet collected is discarded.
    pub fn close(&mut self) {
        self.src = None;
        self.window.clear();
        self.pending = None;
    }

    pub fn is_closed(&self) -> bool {
        self.src.is_none()
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    /// Highest file offset a same-handle writer may write up to without
    /// touching bytes this reader has not fetched yet
    ///
    /// `None` once the source has hit end-of-file: every byte is already
    /// buffered, so writes may extend past the old end freely.
    pub fn write_frontier(&self) -> Option<u64> {
        if self.at_eof { None } else { Some(self.file_pos) }
    }

    /// Run the fetch loop; on any error the reader ends up closed.
    fn fetch(&mut self) -> Result<Emission, ReadError> {
        let delivery = self.fetch_inner();
        if delivery.is_err() {
            self.close();
        }
        delivery
    }

    fn fetch_inner(&mut self) -> Result<Emission, ReadError> {
        loop {
            if let Some(lf) = self.window.find_lf() {
                return Ok(Emission::Line(self.take_line(lf)?));
            }
            if self.at_eof {
                // Zero-byte read already seen. Flush trailing unterminated
                // text as a final line, or deliver end-of-file and close.
                if self.window.is_empty() {
                    self.eof_signaled = true;
                    self.close();
                    return Ok(Emission::Eof);
                }
                return Ok(Emission::Line(self.take_trailing()?));
            }
            if self.window.is_saturated() {
                // No terminator anywhere in a full buffer and no room to
                // load more. Unrecoverable for this file.
                return Err(ReadError::LineTooLong {
                    capacity: self.window.capacity(),
                });
            }
            self.window.compact();
            if self.refill()? == 0 {
                self.at_eof = true;
            }
        }
    }

    /// One disk read into the spare room, at the reader's own position
    fn refill(&mut self) -> Result<usize, ReadError> {
        let src = match self.src.as_mut() {
            Some(src) => src,
            None => return Err(ReadError::Closed),
        };
        // Reposition explicitly: a writer sharing the underlying handle may
        // have moved the cursor since the last refill.
        src.seek(SeekFrom::Start(self.file_pos))?;
        let n = src.read(self.window.spare())?;
        self.window.extend(n);
        self.file_pos += n as u64;
        Ok(n)
    }

    /// Take the line ending at the LF found at `lf`, stripping the
    /// terminator and a CR immediately preceding it.
    fn take_line(&mut self, lf: usize) -> Result<String, ReadError> {
        let content = self.window.unprocessed();
        let mut end = lf;
        if end > 0 && content[end - 1] == b'\r' {
            end -= 1;
        }
        let line = decode_utf8(&content[..end])?;
        self.window.consume(lf + 1);
        Ok(line)
    }

    /// Take everything left in the window as the final, unterminated line.
    /// A trailing CR here is ordinary content, not a terminator.
    fn take_trailing(&mut self) -> Result<String, ReadError> {
        let content = self.window.unprocessed();
        let n = content.len();
        let line = decode_utf8(content)?;
        self.window.consume(n);
        Ok(line)
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, ReadError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| {
            ReadError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "stream did not contain valid UTF-8",
            ))
        })
}
