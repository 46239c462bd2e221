use std::fmt;
use std::sync::Arc;

use crate::locate::Span;

/// An immutable snapshot of source text.
///
/// All edit operations compile down to a single primitive: [`TextBuffer::splice`],
/// which replaces one byte span and returns a new buffer. Intelligence lives in
/// span acquisition (see [`crate::locate`]), not in the application logic.
///
/// Offsets are byte offsets into UTF-8 text and are used consistently by every
/// operation in this crate. Cloning is cheap (shared `Arc<str>`), so threading
/// a buffer through a patch run never copies text that did not change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    text: Arc<str>,
}

impl TextBuffer {
    /// Create a buffer from source text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Arc::from(text.into().into_boxed_str()),
        }
    }

    /// The full text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True if the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in Unicode scalar values. Used for report deltas.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// True if `needle` occurs anywhere in the buffer.
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    /// Byte offset of the first occurrence of `needle`.
    pub fn find(&self, needle: &str) -> Option<usize> {
        self.text.find(needle)
    }

    /// Byte offset of the last occurrence of `needle`.
    pub fn rfind(&self, needle: &str) -> Option<usize> {
        self.text.rfind(needle)
    }

    /// Number of non-overlapping occurrences of `needle`.
    pub fn count(&self, needle: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        self.text.matches(needle).count()
    }

    /// The text at `span`.
    ///
    /// # Panics
    ///
    /// Panics if `span` is out of bounds or not on char boundaries. Spans
    /// produced by this crate's locator functions are always valid.
    pub fn slice(&self, span: Span) -> &str {
        &self.text[span.start..span.end]
    }

    /// Replace the text at `span`, yielding a new buffer.
    ///
    /// Every character outside the addressed span is carried over unchanged.
    pub fn splice(&self, span: Span, replacement: &str) -> TextBuffer {
        let mut out = String::with_capacity(self.text.len() - span.len() + replacement.len());
        out.push_str(&self.text[..span.start]);
        out.push_str(replacement);
        out.push_str(&self.text[span.end..]);
        TextBuffer::new(out)
    }

    /// Replace the first occurrence of `needle`, if present.
    pub fn replace_first(&self, needle: &str, replacement: &str) -> Option<TextBuffer> {
        let start = self.find(needle)?;
        Some(self.splice(Span::new(start, start + needle.len()), replacement))
    }

    /// Replace every non-overlapping occurrence of `needle`, left to right.
    ///
    /// Returns the new buffer and the occurrence count; a count of zero means
    /// the buffer was returned unchanged.
    pub fn replace_all(&self, needle: &str, replacement: &str) -> (TextBuffer, usize) {
        if needle.is_empty() || !self.contains(needle) {
            return (self.clone(), 0);
        }
        let count = self.count(needle);
        (TextBuffer::new(self.text.replace(needle, replacement)), count)
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        TextBuffer::new(text)
    }
}

impl From<String> for TextBuffer {
    fn from(text: String) -> Self {
        TextBuffer::new(text)
    }
}
