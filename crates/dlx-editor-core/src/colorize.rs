//! The colorizer driver and the parser seam.
//!
//! The editor never tokenizes anything itself. Whenever the buffer changes
//! it hands the full text to a [`ProgramParser`] on the next refresh, then
//! paints the color tag of every glyph a token covers. Parse errors come
//! back through the same call and land in the error-marker map.
//!
//! `colorize` only grows a dirty line interval; no recoloring happens
//! synchronously inside an edit.

use crate::editor::Editor;
use crate::palette::PaletteIndex;
use log::debug;

/// Classification of a source token, as reported by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Line comment.
    Comment,
    /// Instruction mnemonic.
    OpCode,
    /// Integer register (`R0`..`R31`).
    RegisterInt,
    /// Float register (`F0`..`F31`).
    RegisterFloat,
    /// The floating point status register (`FPSR`).
    RegisterStatus,
    /// `#`-prefixed immediate integer.
    ImmediateInteger,
    /// Plain integer literal.
    IntegerLiteral,
    /// Label or other identifier.
    Identifier,
    /// `,` separator.
    Comma,
    /// `:` after a label.
    Colon,
    /// `(` in an address displacement.
    OpenBracket,
    /// `)` in an address displacement.
    ClosingBracket,
    /// End of a source line. Never colorized.
    NewLine,
    /// Anything the tokenizer could not classify.
    Unknown,
}

impl TokenKind {
    /// The palette tag glyphs of this token are painted with.
    pub fn palette_index(self) -> PaletteIndex {
        match self {
            TokenKind::Comment => PaletteIndex::Comment,
            TokenKind::OpCode => PaletteIndex::OpCode,
            TokenKind::RegisterInt | TokenKind::RegisterFloat | TokenKind::RegisterStatus => {
                PaletteIndex::Register
            }
            TokenKind::ImmediateInteger | TokenKind::IntegerLiteral => PaletteIndex::IntegerLiteral,
            _ => PaletteIndex::Default,
        }
    }
}

/// One token of the parsed program. Line and column are **1-based**.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceToken {
    /// Token kind.
    pub kind: TokenKind,
    /// 1-based source line.
    pub line: usize,
    /// 1-based column (byte offset into the line plus one).
    pub column: usize,
    /// Length in bytes.
    pub length: usize,
}

impl SourceToken {
    /// Create a new token.
    pub fn new(kind: TokenKind, line: usize, column: usize, length: usize) -> Self {
        Self {
            kind,
            line,
            column,
            length,
        }
    }
}

/// A diagnostic produced while parsing. `line` is **1-based**.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// 1-based source line.
    pub line: usize,
    /// Human-readable message.
    pub message: String,
}

impl ParseDiagnostic {
    /// Create a new diagnostic.
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Everything one parse of the buffer yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// The token stream, in source order.
    pub tokens: Vec<SourceToken>,
    /// Diagnostics keyed to 1-based lines.
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// The external tokenizer/parser the editor colorizes from.
///
/// `parse` is a pure function of the source text; the editor may call it on
/// every frame in which the buffer changed.
pub trait ProgramParser {
    /// Tokenize `source` and report line diagnostics.
    fn parse(&mut self, source: &str) -> ParseOutcome;
}

/// A parser that produces no tokens and no diagnostics.
///
/// Useful for hosts that embed the editor without a language backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullParser;

impl ProgramParser for NullParser {
    fn parse(&mut self, _source: &str) -> ParseOutcome {
        ParseOutcome::default()
    }
}

impl Editor {
    /// Enlarge the dirty line interval by `count` lines starting at
    /// `from_line`. Nothing is recolored synchronously.
    pub(crate) fn colorize_lines(&mut self, from_line: usize, count: usize) {
        let to_line = self.total_lines().min(from_line + count);
        self.color_range_min = self.color_range_min.min(from_line);
        self.color_range_max = self.color_range_max.max(to_line);
    }

    /// Mark the whole buffer dirty for recoloring.
    pub(crate) fn colorize_all(&mut self) {
        self.color_range_min = 0;
        self.color_range_max = self.total_lines();
    }

    /// Run one refresh cycle if the buffer changed since the last one:
    /// reparse the full text, repaint glyph colors, and replace the error
    /// markers with the parser's diagnostics.
    ///
    /// [`Editor::render`] calls this every frame; tests call it directly.
    pub fn refresh(&mut self) {
        if !self.is_text_changed() {
            return;
        }

        let source = self.get_text();
        let outcome = self.parse_source(&source);
        debug!(
            "refresh: {} tokens, {} diagnostics over {} lines",
            outcome.tokens.len(),
            outcome.diagnostics.len(),
            self.total_lines()
        );

        self.apply_token_colors(&outcome.tokens);

        self.clear_error_markers();
        for diagnostic in &outcome.diagnostics {
            self.add_error_marker(diagnostic.line, &diagnostic.message);
        }

        self.color_range_min = usize::MAX;
        self.color_range_max = 0;
        self.mark_text_unchanged();
    }

    /// Paint glyph color tags from a token stream.
    ///
    /// Glyphs not covered by any token fall back to `Default`; `NewLine`
    /// tokens are skipped. Out-of-range token spans are clipped rather than
    /// trusted.
    fn apply_token_colors(&mut self, tokens: &[SourceToken]) {
        if !self.is_colorizer_enabled() {
            return;
        }

        self.reset_glyph_colors();

        for token in tokens {
            if token.kind == TokenKind::NewLine {
                continue;
            }
            let palette_index = token.kind.palette_index();

            if token.line == 0 || token.line > self.total_lines() {
                continue;
            }
            let line = self.buffer_mut().line_mut(token.line - 1);
            let line_len = line.len();
            let start = token.column.saturating_sub(1);
            let end = (start + token.length).min(line_len);
            for glyph in &mut line[start.min(line_len)..end] {
                glyph.color = palette_index;
            }
        }
    }
}
