//! Per-line text transformations
//!
//! Transforms are pure, synchronous and stateless: one stripped line in,
//! one line out, with no awareness of buffering or file position. The
//! rewriter applies them between reading a line and writing it back.

use std::borrow::Cow;

/// A pure per-line rewrite
///
/// Implementations must not hold per-line state; the same input always
/// yields the same output.
pub trait LineTransform: Sync {
    fn transform<'a>(&self, line: &'a str) -> Cow<'a, str>;
}

/// Reverses the character sequence between each successive pair of double
/// quotes, leaving unquoted text and the quotes themselves untouched.
///
/// An unterminated trailing quote leaves the rest of the line unmodified.
/// The output always has the same byte length as the input.
pub struct QuoteReverser;

impl LineTransform for QuoteReverser {
    fn transform<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if !line.contains('"') {
            return Cow::Borrowed(line);
        }
        let mut out = String::with_capacity(line.len());
        let mut rest = line;
        while let Some(open) = rest.find('"') {
            out.push_str(&rest[..=open]);
            let tail = &rest[open + 1..];
            match tail.find('"') {
                Some(close) => {
                    out.extend(tail[..close].chars().rev());
                    out.push('"');
                    rest = &tail[close + 1..];
                }
                None => {
                    // Unterminated quote: the tail passes through as-is.
                    out.push_str(tail);
                    return Cow::Owned(out);
                }
            }
        }
        out.push_str(rest);
        Cow::Owned(out)
    }
}
