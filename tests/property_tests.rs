//! Property-based tests for qrev
//!
//! This module uses proptest to verify core invariants of the line reader,
//! the quote-reversing transform, and the end-to-end in-place rewrite.
//! Property-based testing generates hundreds of random inputs to verify
//! that certain properties always hold true.

use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

use qrev::{Emission, LineReader, LineTransform, QuoteReverser, Rewriter};

// Import proptest macro
use proptest::prelude::*;

/// Pull lines out of a reader until end-of-file
fn drain(reader: &mut LineReader<Cursor<Vec<u8>>>) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        reader.request_line();
        match reader.poll().expect("request must arm a delivery") {
            Ok(Emission::Line(line)) => lines.push(line),
            Ok(Emission::Eof) => return lines,
            Err(e) => panic!("unexpected read error: {e}"),
        }
    }
}

/// Assemble file content from (line, crlf) pairs plus an optional final
/// unterminated fragment.
fn assemble(lines: &[(String, bool)], trailing: &Option<String>) -> String {
    let mut content = String::new();
    for (line, crlf) in lines {
        content.push_str(line);
        content.push_str(if *crlf { "\r\n" } else { "\n" });
    }
    if let Some(fragment) = trailing {
        content.push_str(fragment);
    }
    content
}

/// A line of printable ASCII with no terminator bytes; quotes included so
/// the transform has something to chew on.
fn line_strategy() -> impl Strategy<Value = String> {
    "[ -~]{0,40}"
}

// ============================================================================
// Property 1: Line-splitting correctness
// ============================================================================
// For any terminator mix and any buffer capacity large enough for the
// longest line, the reader emits exactly the source lines in order.

proptest! {
    #[test]
    fn prop_reader_emits_exactly_the_source_lines(
        lines in prop::collection::vec((line_strategy(), any::<bool>()), 0..30),
        trailing in prop_oneof![Just(None), line_strategy().prop_map(Some)],
        capacity in 48usize..256
    ) {
        let content = assemble(&lines, &trailing);
        let mut reader =
            LineReader::with_capacity(Cursor::new(content.into_bytes()), capacity);

        let mut expected: Vec<String> =
            lines.iter().map(|(line, _)| line.clone()).collect();
        // A non-empty trailing fragment is one last line; an absent or
        // empty one is not (no phantom line after a final terminator).
        if let Some(fragment) = &trailing {
            if !fragment.is_empty() {
                expected.push(fragment.clone());
            }
        }

        prop_assert_eq!(drain(&mut reader), expected);
    }

    /// The reader agrees with `str::lines` on arbitrary LF-mixed content,
    /// regardless of how reads chop the stream.
    #[test]
    fn prop_reader_agrees_with_std_lines(
        content in "[ -~\n]{0,200}",
        capacity in 256usize..512
    ) {
        let mut reader =
            LineReader::with_capacity(Cursor::new(content.clone().into_bytes()), capacity);
        let emitted = drain(&mut reader);
        let expected: Vec<&str> = content.lines().collect();
        prop_assert_eq!(emitted, expected);
    }
}

// ============================================================================
// Property 2: Transform invariants
// ============================================================================

proptest! {
    /// Quote reversal never changes the byte length of a line
    #[test]
    fn prop_transform_preserves_byte_length(line in line_strategy()) {
        let out = QuoteReverser.transform(&line);
        prop_assert_eq!(out.len(), line.len());
    }

    /// Applying the transform twice restores the original line: quote
    /// positions are fixed and each quoted run is reversed back.
    #[test]
    fn prop_transform_is_an_involution(line in line_strategy()) {
        let once = QuoteReverser.transform(&line).into_owned();
        let twice = QuoteReverser.transform(&once).into_owned();
        prop_assert_eq!(twice, line);
    }

    /// Text outside quoted runs survives the transform verbatim
    #[test]
    fn prop_unquoted_lines_pass_through(line in "[ !#-~]{0,40}") {
        // Strategy excludes the double quote entirely.
        let out = QuoteReverser.transform(&line);
        prop_assert_eq!(out.as_ref(), line.as_str());
    }
}

// ============================================================================
// Property 3: End-to-end rewrite == in-memory reference
// ============================================================================
// The streamed in-place rewrite must agree with the obvious in-memory
// computation: split lines, transform each, join with LF, terminate.

fn reference_rewrite(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let mut expected: String = content
        .lines()
        .map(|line| QuoteReverser.transform(line).into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    expected.push('\n');
    expected
}

proptest! {
    #[test]
    fn prop_streamed_rewrite_matches_reference(
        lines in prop::collection::vec((line_strategy(), any::<bool>()), 0..20),
        trailing in prop_oneof![Just(None), line_strategy().prop_map(Some)],
        capacity in 64usize..256
    ) {
        let content = assemble(&lines, &trailing);
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("input.txt");
        fs::write(&file_path, &content).unwrap();

        Rewriter::new(&QuoteReverser)
            .buffer_capacity(capacity)
            .rewrite_file(&file_path)
            .unwrap();

        let rewritten = fs::read_to_string(&file_path).unwrap();
        prop_assert_eq!(rewritten, reference_rewrite(&content));
    }

    /// Rewriting quote-free content is idempotent up to terminator
    /// normalization: a second pass changes nothing.
    #[test]
    fn prop_rewrite_is_idempotent_after_first_pass(
        lines in prop::collection::vec(("[ !#-~]{0,40}", any::<bool>()), 1..20)
    ) {
        let content = assemble(&lines, &None);
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("input.txt");
        fs::write(&file_path, &content).unwrap();

        let rewriter = Rewriter::new(&QuoteReverser);
        rewriter.rewrite_file(&file_path).unwrap();
        let after_first = fs::read_to_string(&file_path).unwrap();

        rewriter.rewrite_file(&file_path).unwrap();
        let after_second = fs::read_to_string(&file_path).unwrap();

        prop_assert_eq!(after_first, after_second);
    }

    /// Dry-run never modifies the file, whatever the content
    #[test]
    fn prop_dry_run_never_writes(
        lines in prop::collection::vec((line_strategy(), any::<bool>()), 0..20)
    ) {
        let content = assemble(&lines, &None);
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("input.txt");
        fs::write(&file_path, &content).unwrap();

        Rewriter::new(&QuoteReverser)
            .dry_run(true)
            .rewrite_file(&file_path)
            .unwrap();

        prop_assert_eq!(fs::read_to_string(&file_path).unwrap(), content);
    }
}
