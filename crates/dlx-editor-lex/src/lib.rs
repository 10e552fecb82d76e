//! `dlx-editor-lex` - DLX assembly tokenizer for `dlx-editor-core`.
//!
//! Implements the editor's [`ProgramParser`] seam for the DLX instruction
//! set: comments, labels, punctuation, `#` immediates, integer literals,
//! registers, and the opcode table, with 1-based line/column positions the
//! colorizer maps straight onto glyphs.
//!
//! The tokenizer is line oriented. A `;` or `/` starts a comment running to
//! the end of the line; whitespace separates tokens; `,`, `(` and `)` are
//! single-byte tokens; a trailing `:` is kept attached to its label. On top
//! of the token stream it reports a small set of line diagnostics (unknown
//! instruction, more than one instruction on a line, malformed immediates,
//! orphan colons) that surface in the editor as error markers.

use dlx_editor_core::{ParseDiagnostic, ParseOutcome, ProgramParser, SourceToken, TokenKind};
use regex::Regex;

/// Every DLX mnemonic the tokenizer recognizes, sorted for binary search.
const OPCODES: &[&str] = &[
    "ADD", "ADDI", "ADDU", "ADDUI", "AND", "ANDI", "BEQZ", "BNEZ", "DIV", "DIVI", "DIVU",
    "DIVUI", "HALT", "J", "JAL", "JALR", "JR", "LB", "LBU", "LH", "LHU", "LW", "LWU", "MULT",
    "MULTI", "MULTU", "MULTUI", "NOP", "OR", "ORI", "SB", "SBU", "SEQ", "SEQI", "SGE", "SGEI",
    "SGT", "SGTI", "SH", "SHU", "SLA", "SLAI", "SLE", "SLEI", "SLL", "SLLI", "SLT", "SLTI",
    "SNE", "SNEI", "SRA", "SRAI", "SRL", "SRLI", "SUB", "SUBI", "SUBU", "SUBUI", "SW", "SWU",
    "TRAP", "XOR", "XORI",
];

fn is_opcode(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    OPCODES.binary_search(&upper.as_str()).is_ok()
}

/// The DLX tokenizer. One instance is reusable across parses.
#[derive(Debug, Clone)]
pub struct DlxParser {
    number: Regex,
    int_register: Regex,
    float_register: Regex,
}

impl DlxParser {
    /// Build a tokenizer with its token-shape rules compiled.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            number: Regex::new(r"^[+-]?[0-9]+$")?,
            int_register: Regex::new(r"^[Rr]([0-9]|[12][0-9]|3[01])$")?,
            float_register: Regex::new(r"^[Ff]([0-9]|[12][0-9]|3[01])$")?,
        })
    }

    fn classify(&self, text: &str) -> TokenKind {
        if let Some(rest) = text.strip_prefix('#') {
            if !rest.is_empty() {
                return TokenKind::ImmediateInteger;
            }
            // A lone `#` lexes as an identifier, like any other junk word.
            return TokenKind::Identifier;
        }

        if text.starts_with('/') || text.starts_with(';') {
            return TokenKind::Comment;
        }
        if self.number.is_match(text) {
            return TokenKind::IntegerLiteral;
        }
        if text.eq_ignore_ascii_case("FPSR") {
            return TokenKind::RegisterStatus;
        }
        if self.int_register.is_match(text) {
            return TokenKind::RegisterInt;
        }
        if self.float_register.is_match(text) {
            return TokenKind::RegisterFloat;
        }
        if is_opcode(text) {
            return TokenKind::OpCode;
        }

        TokenKind::Identifier
    }

    fn tokenize_line(&self, line: &str, line_number: usize, outcome: &mut ParseOutcome) {
        let bytes = line.as_bytes();
        let mut i = 0;
        let mut saw_opcode = false;
        let mut saw_code = false;
        let mut reported_extra_opcode = false;

        while i < bytes.len() {
            let byte = bytes[i];

            // Comment to end of line.
            if byte == b';' || byte == b'/' {
                outcome.tokens.push(SourceToken::new(
                    TokenKind::Comment,
                    line_number,
                    i + 1,
                    bytes.len() - i,
                ));
                return;
            }

            if byte == b' ' || byte == b'\t' || byte == b'\x0b' {
                i += 1;
                continue;
            }

            match byte {
                b',' => {
                    outcome
                        .tokens
                        .push(SourceToken::new(TokenKind::Comma, line_number, i + 1, 1));
                    i += 1;
                    continue;
                }
                b'(' => {
                    outcome.tokens.push(SourceToken::new(
                        TokenKind::OpenBracket,
                        line_number,
                        i + 1,
                        1,
                    ));
                    i += 1;
                    continue;
                }
                b')' => {
                    outcome.tokens.push(SourceToken::new(
                        TokenKind::ClosingBracket,
                        line_number,
                        i + 1,
                        1,
                    ));
                    i += 1;
                    continue;
                }
                b':' => {
                    // A colon with no label in front of it.
                    outcome
                        .tokens
                        .push(SourceToken::new(TokenKind::Colon, line_number, i + 1, 1));
                    outcome
                        .diagnostics
                        .push(ParseDiagnostic::new(line_number, "Empty label"));
                    i += 1;
                    continue;
                }
                _ => {}
            }

            // Scan one word; a trailing ':' stays attached to its label.
            let start = i;
            while i < bytes.len()
                && !matches!(
                    bytes[i],
                    b' ' | b'\t' | b'\x0b' | b',' | b'(' | b')' | b':' | b';' | b'/'
                )
            {
                i += 1;
            }
            let is_label = i < bytes.len() && bytes[i] == b':';
            if is_label {
                i += 1;
            }

            let text = &line[start..i];
            let kind = self.classify(text);

            match kind {
                TokenKind::OpCode => {
                    if saw_opcode && !reported_extra_opcode {
                        outcome.diagnostics.push(ParseDiagnostic::new(
                            line_number,
                            "One instruction per line",
                        ));
                        reported_extra_opcode = true;
                    }
                    saw_opcode = true;
                    saw_code = true;
                }
                TokenKind::ImmediateInteger => {
                    let digits = &text[1..];
                    if !self.number.is_match(digits) {
                        outcome.diagnostics.push(ParseDiagnostic::new(
                            line_number,
                            format!("Invalid number '{digits}'"),
                        ));
                    }
                    saw_code = true;
                }
                TokenKind::Identifier if !is_label => {
                    if !saw_code {
                        outcome.diagnostics.push(ParseDiagnostic::new(
                            line_number,
                            format!("Expected an instruction but got '{text}'"),
                        ));
                    }
                    saw_code = true;
                }
                // Labels do not count as code: an unknown instruction right
                // after a label is still flagged.
                TokenKind::Identifier => {}
                _ => {
                    saw_code = true;
                }
            }

            outcome.tokens.push(SourceToken::new(
                kind,
                line_number,
                start + 1,
                text.len(),
            ));
        }
    }
}

impl ProgramParser for DlxParser {
    fn parse(&mut self, source: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        let mut line_number = 0;
        for line in source.split('\n') {
            line_number += 1;
            self.tokenize_line(line, line_number, &mut outcome);
            outcome.tokens.push(SourceToken::new(
                TokenKind::NewLine,
                line_number,
                line.len() + 1,
                1,
            ));
        }

        outcome
    }
}
