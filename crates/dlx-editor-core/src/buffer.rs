//! Line and glyph storage.
//!
//! The buffer is a non-empty vector of lines; each line is a vector of
//! [`Glyph`]s (one byte plus a color tag). Lines never contain a newline
//! glyph, the separator is implicit between successive lines. Multi-byte
//! UTF-8 characters occupy one glyph per code unit and are kept contiguous
//! by the editing layer.

use crate::palette::PaletteIndex;
use thiserror::Error;

/// A single 8-bit code unit with its color tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    /// Raw byte value.
    pub byte: u8,
    /// Color tag assigned by the colorizer.
    pub color: PaletteIndex,
}

impl Glyph {
    /// Create a new glyph.
    pub fn new(byte: u8, color: PaletteIndex) -> Self {
        Self { byte, color }
    }
}

/// One line of glyphs, without a trailing newline.
pub type Line = Vec<Glyph>;

/// Error raised by the line-level buffer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferFault {
    /// The editor is in read-only mode.
    #[error("the editor is read-only")]
    ReadOnly,
    /// A line index was outside the buffer.
    #[error("line index {index} is out of bounds for a buffer of {len} lines")]
    LineOutOfBounds {
        /// The rejected index.
        index: usize,
        /// Current number of lines.
        len: usize,
    },
}

/// The glyph buffer. Always holds at least one (possibly empty) line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<Line>,
}

impl TextBuffer {
    /// An empty buffer: a single empty line.
    pub fn new() -> Self {
        Self {
            lines: vec![Line::new()],
        }
    }

    /// Build a buffer from plain text.
    ///
    /// Carriage returns and control bytes other than `\n` and `\t` are
    /// discarded; `\n` starts a new line; everything else becomes a
    /// `Default`-colored glyph.
    pub fn from_text(text: &str) -> Self {
        let mut lines = vec![Line::new()];

        for &byte in text.as_bytes() {
            if byte == b'\r' || (byte.is_ascii_control() && byte != b'\n' && byte != b'\t') {
                // Control bytes never enter the buffer through set_text.
            } else if byte == b'\n' {
                lines.push(Line::new());
            } else {
                let last = lines.len() - 1;
                lines[last].push(Glyph::new(byte, PaletteIndex::Default));
            }
        }

        Self { lines }
    }

    /// Build a buffer from individual lines.
    ///
    /// An embedded `\n` inside an entry starts a new line, exactly as if the
    /// entries had been joined with newlines first.
    pub fn from_lines(source: &[String]) -> Self {
        if source.is_empty() {
            return Self::new();
        }

        let mut lines: Vec<Line> = vec![Line::new()];
        for entry in source {
            for &byte in entry.as_bytes() {
                if byte == b'\n' {
                    lines.push(Line::new());
                } else {
                    let last = lines.len() - 1;
                    lines[last].push(Glyph::new(byte, PaletteIndex::Default));
                }
            }
            lines.push(Line::new());
        }
        // The loop appends one line past the last entry.
        lines.pop();

        Self { lines }
    }

    /// Number of lines. Never zero.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Index of the last line.
    pub fn max_line_index(&self) -> usize {
        self.lines.len() - 1
    }

    /// Immutable access to a line.
    pub fn line(&self, index: usize) -> &Line {
        &self.lines[index]
    }

    /// Mutable access to a line.
    pub fn line_mut(&mut self, index: usize) -> &mut Line {
        &mut self.lines[index]
    }

    /// All lines.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Mutable iterator over all lines.
    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut Line> {
        self.lines.iter_mut()
    }

    /// True when the buffer holds exactly one empty line.
    pub fn is_blank(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// Insert a raw line at `index` without touching annotations.
    pub(crate) fn insert_raw_line(&mut self, index: usize, line: Line) {
        self.lines.insert(index, line);
    }

    /// Remove the raw lines in `[start, end)` without touching annotations.
    ///
    /// Callers must leave at least one line behind.
    pub(crate) fn remove_raw_lines(&mut self, start: usize, end: usize) {
        self.lines.drain(start..end);
        debug_assert!(!self.lines.is_empty());
    }

    /// Reset to a single empty line.
    pub(crate) fn clear(&mut self) {
        self.lines.clear();
        self.lines.push(Line::new());
    }

    /// The bytes of one line as text.
    pub fn line_text(&self, index: usize) -> String {
        let bytes: Vec<u8> = self.lines[index].iter().map(|glyph| glyph.byte).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// All lines as text, without newline separators.
    pub fn text_lines(&self) -> Vec<String> {
        (0..self.lines.len()).map(|i| self.line_text(i)).collect()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_has_one_empty_line() {
        let buffer = TextBuffer::new();
        assert_eq!(buffer.line_count(), 1);
        assert!(buffer.is_blank());
    }

    #[test]
    fn test_from_text_splits_lines() {
        let buffer = TextBuffer::from_text("one\ntwo\nthree");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line_text(1), "two");
    }

    #[test]
    fn test_from_text_trailing_newline_keeps_empty_line() {
        let buffer = TextBuffer::from_text("one\n");
        assert_eq!(buffer.line_count(), 2);
        assert!(buffer.line(1).is_empty());
    }

    #[test]
    fn test_from_text_strips_carriage_returns_and_control_bytes() {
        let buffer = TextBuffer::from_text("a\r\nb\x07c\td");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.line_text(0), "a");
        assert_eq!(buffer.line_text(1), "bc\td");
    }

    #[test]
    fn test_from_lines_honors_embedded_newlines() {
        let source = vec!["one".to_string(), "two\nthree".to_string()];
        let buffer = TextBuffer::from_lines(&source);
        assert_eq!(buffer.text_lines(), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_from_lines_empty_input() {
        let buffer = TextBuffer::from_lines(&[]);
        assert_eq!(buffer.line_count(), 1);
        assert!(buffer.is_blank());
    }

    #[test]
    fn test_multibyte_text_round_trips() {
        let buffer = TextBuffer::from_text("héllo\nwörld");
        assert_eq!(buffer.line_text(0), "héllo");
        assert_eq!(buffer.line_text(1), "wörld");
        // One glyph per UTF-8 code unit.
        assert_eq!(buffer.line(0).len(), 6);
    }
}
