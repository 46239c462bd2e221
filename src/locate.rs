//! Anchor location: literal occurrence search and the structural block scan.
//!
//! The structural scan finds the full extent of a delimited block (function
//! body, object literal, config table) by counting delimiter depth from a
//! start marker, without parsing the language. It is deliberately not
//! string- or comment-aware: callers must choose a delimiter pair that stays
//! balanced inside the block's literal content.
//!
//! # Hard Rules
//!
//! 1. A start marker that matches more than one location is refused. No
//!    guessing which block the caller meant.
//! 2. "Not found" is a normal result (`Ok(None)`), never an error; callers
//!    treat it as "skip this patch".

use thiserror::Error;

use crate::buffer::TextBuffer;

/// A half-open byte range `[start, end)` into a [`TextBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Starting byte offset (inclusive)
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted span {start}..{end}");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("marker {marker:?} matched {count} locations, expected exactly 1")]
    AmbiguousMarker { marker: String, count: usize },

    #[error("no opening delimiter {open:?} found after marker {marker:?}")]
    MissingOpenDelimiter { marker: String, open: char },

    #[error("unbalanced delimiters after marker {marker:?}: depth {depth} at end of input")]
    UnbalancedDelimiters { marker: String, depth: usize },
}

/// Byte offset of the first occurrence of `needle`.
pub fn find_literal(buffer: &TextBuffer, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    buffer.find(needle)
}

/// Byte offsets of every non-overlapping occurrence of `needle`, left to right.
pub fn find_all_literal(buffer: &TextBuffer, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    buffer
        .as_str()
        .match_indices(needle)
        .map(|(offset, _)| offset)
        .collect()
}

/// Locate `marker`, requiring it to be unique in the buffer.
///
/// Zero occurrences is `Ok(None)`; more than one is
/// [`LocateError::AmbiguousMarker`].
pub fn find_unique(buffer: &TextBuffer, marker: &str) -> Result<Option<usize>, LocateError> {
    if marker.is_empty() {
        return Ok(None);
    }
    let mut occurrences = buffer.as_str().match_indices(marker);
    let first = occurrences.next();
    if first.is_some() && occurrences.next().is_some() {
        return Err(LocateError::AmbiguousMarker {
            marker: marker.to_string(),
            count: buffer.count(marker),
        });
    }
    Ok(first.map(|(offset, _)| offset))
}

/// Locate the full structural block introduced by `marker`.
///
/// The marker must be unique. From the marker, the scan walks forward to the
/// first `open` delimiter, then counts depth up on `open` and down on `close`;
/// the span ends one character past the close that returns depth to zero. If
/// `trailing` immediately follows the close (e.g. `;` after an expression
/// body), it is included in the span.
///
/// The returned span starts at the marker, so a splice replaces the whole
/// construct including its introduction.
pub fn find_structural_block(
    buffer: &TextBuffer,
    marker: &str,
    open: char,
    close: char,
    trailing: Option<&str>,
) -> Result<Option<Span>, LocateError> {
    let start = match find_unique(buffer, marker)? {
        Some(offset) => offset,
        None => return Ok(None),
    };

    let text = buffer.as_str();
    let scan_from = match text[start..].find(open) {
        Some(rel) => start + rel,
        None => {
            return Err(LocateError::MissingOpenDelimiter {
                marker: marker.to_string(),
                open,
            })
        }
    };

    let mut depth: usize = 0;
    for (i, ch) in text[scan_from..].char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            // The first scanned char is the open delimiter, so depth is
            // always >= 1 when a close is seen.
            depth -= 1;
            if depth == 0 {
                let mut end = scan_from + i + close.len_utf8();
                if let Some(trailing) = trailing {
                    if text[end..].starts_with(trailing) {
                        end += trailing.len();
                    }
                }
                return Ok(Some(Span::new(start, end)));
            }
        }
    }

    Err(LocateError::UnbalancedDelimiters {
        marker: marker.to_string(),
        depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_literal_first_occurrence() {
        let buf = TextBuffer::new("one two one");
        assert_eq!(find_literal(&buf, "one"), Some(0));
        assert_eq!(find_literal(&buf, "two"), Some(4));
        assert_eq!(find_literal(&buf, "three"), None);
    }

    #[test]
    fn find_all_literal_non_overlapping() {
        let buf = TextBuffer::new("abab abab");
        assert_eq!(find_all_literal(&buf, "ab"), vec![0, 2, 5, 7]);
        let buf = TextBuffer::new("aaaa");
        assert_eq!(find_all_literal(&buf, "aa"), vec![0, 2]);
    }

    #[test]
    fn find_unique_rejects_ambiguous_marker() {
        let buf = TextBuffer::new("fn f() {} fn f() {}");
        let err = find_unique(&buf, "fn f()").unwrap_err();
        assert_eq!(
            err,
            LocateError::AmbiguousMarker {
                marker: "fn f()".to_string(),
                count: 2,
            }
        );
    }

    #[test]
    fn structural_block_spans_nested_delimiters() {
        let buf = TextBuffer::new("function foo() { a { b { } } c }\nrest");
        let span = find_structural_block(&buf, "function foo() {", '{', '}', None)
            .unwrap()
            .unwrap();
        let matched = buf.slice(span);
        assert_eq!(matched, "function foo() { a { b { } } c }");
        assert_eq!(matched.matches('{').count(), matched.matches('}').count());
        // ends exactly one char past the outermost close
        assert_eq!(span.end, buf.find("\nrest").unwrap());
    }

    #[test]
    fn structural_block_consumes_trailing_chars() {
        let buf = TextBuffer::new("const f = () => {\n  return 1;\n};\nconst g = 1;");
        let span = find_structural_block(&buf, "const f = () => {", '{', '}', Some(";"))
            .unwrap()
            .unwrap();
        assert_eq!(buf.slice(span), "const f = () => {\n  return 1;\n};");
    }

    #[test]
    fn structural_block_trailing_chars_absent() {
        let buf = TextBuffer::new("block {x} more");
        let span = find_structural_block(&buf, "block {", '{', '}', Some(";"))
            .unwrap()
            .unwrap();
        assert_eq!(buf.slice(span), "block {x}");
    }

    #[test]
    fn structural_block_marker_absent_is_none() {
        let buf = TextBuffer::new("nothing here");
        assert_eq!(
            find_structural_block(&buf, "function foo() {", '{', '}', None).unwrap(),
            None
        );
    }

    #[test]
    fn structural_block_unbalanced_is_error() {
        let buf = TextBuffer::new("fn f() { open { forever");
        let err = find_structural_block(&buf, "fn f() {", '{', '}', None).unwrap_err();
        assert_eq!(
            err,
            LocateError::UnbalancedDelimiters {
                marker: "fn f() {".to_string(),
                depth: 2,
            }
        );
    }

    #[test]
    fn structural_block_missing_open_is_error() {
        let buf = TextBuffer::new("marker and then nothing");
        let err = find_structural_block(&buf, "marker", '{', '}', None).unwrap_err();
        assert!(matches!(err, LocateError::MissingOpenDelimiter { open: '{', .. }));
    }

    #[test]
    fn structural_block_skips_closers_before_the_first_open() {
        // A stray close delimiter between marker and block is not
        // balance-relevant; counting starts at the first open.
        let buf = TextBuffer::new("marker x } y { a { b } c } tail");
        let span = find_structural_block(&buf, "marker", '{', '}', None)
            .unwrap()
            .unwrap();
        assert_eq!(buf.slice(span), "marker x } y { a { b } c }");
    }

    #[test]
    fn structural_block_with_bracket_delimiters() {
        let buf = TextBuffer::new("items = [1, [2, 3], 4] # tail");
        let span = find_structural_block(&buf, "items = ", '[', ']', None)
            .unwrap()
            .unwrap();
        assert_eq!(buf.slice(span), "items = [1, [2, 3], 4]");
    }
}
