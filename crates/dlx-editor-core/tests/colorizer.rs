use dlx_editor_core::{
    Coordinate, Editor, ParseDiagnostic, ParseOutcome, ProgramParser, SelectionMode, SourceToken,
    TokenKind,
};

/// A tiny line-oriented tokenizer: the first word of a line is an opcode,
/// `R<n>` words are registers, digit words are literals, `;` starts a
/// comment. Lines containing "BAD" produce a diagnostic.
struct StubParser;

impl ProgramParser for StubParser {
    fn parse(&mut self, source: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for (line_index, line) in source.split('\n').enumerate() {
            let line_number = line_index + 1;

            if line.contains("BAD") {
                outcome
                    .diagnostics
                    .push(ParseDiagnostic::new(line_number, "bad instruction"));
            }

            if let Some(comment_start) = line.find(';') {
                outcome.tokens.push(SourceToken::new(
                    TokenKind::Comment,
                    line_number,
                    comment_start + 1,
                    line.len() - comment_start,
                ));
            }

            let code = line.split(';').next().unwrap_or("");
            let mut first = true;
            let mut column = 1;
            for word in code.split(' ') {
                if !word.is_empty() {
                    let kind = if first {
                        first = false;
                        TokenKind::OpCode
                    } else if word.starts_with('R') {
                        TokenKind::RegisterInt
                    } else if word.chars().all(|ch| ch.is_ascii_digit()) {
                        TokenKind::IntegerLiteral
                    } else {
                        TokenKind::Identifier
                    };
                    outcome
                        .tokens
                        .push(SourceToken::new(kind, line_number, column, word.len()));
                }
                column += word.len() + 1;
            }

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

fn editor_with(text: &str) -> Editor {
    let mut editor = Editor::new(Box::new(StubParser));
    editor.set_text(text);
    editor
}

#[test]
fn test_refresh_paints_token_colors() {
    let mut editor = editor_with("ADD R1 2 ; note");
    editor.refresh();
    assert!(!editor.is_text_changed());

    // Colors feed the word-boundary rule, which is observable without
    // reaching into the buffer: double-click style word selection snaps to
    // token edges.
    editor.set_selection(
        Coordinate::new(0, 1),
        Coordinate::new(0, 1),
        SelectionMode::Word,
    );
    assert_eq!(editor.get_selected_text(), "ADD");

    editor.set_selection(
        Coordinate::new(0, 5),
        Coordinate::new(0, 5),
        SelectionMode::Word,
    );
    assert_eq!(editor.get_selected_text(), "R1");
}

#[test]
fn test_refresh_reports_diagnostics_as_error_markers() {
    let mut editor = editor_with("ADD R1 R2\nBAD thing\nHALT");
    editor.refresh();

    assert_eq!(editor.error_markers().len(), 1);
    assert_eq!(
        editor.error_markers().get(&2).map(String::as_str),
        Some("bad instruction")
    );

    // Fixing the line clears the marker on the next refresh.
    editor.set_selection_start(Coordinate::new(1, 0));
    editor.set_selection_end(Coordinate::new(1, 3));
    editor.delete();
    editor.refresh();
    assert!(editor.error_markers().is_empty());
}

#[test]
fn test_refresh_only_runs_when_dirty() {
    let mut editor = editor_with("ADD R1 R2");
    editor.refresh();
    assert!(!editor.is_text_changed());

    // A cursor move does not set the dirty flag.
    editor.set_cursor_position(Coordinate::new(0, 3));
    assert!(!editor.is_text_changed());

    editor.enter_character('X' as u32, false);
    assert!(editor.is_text_changed());
    editor.refresh();
    assert!(!editor.is_text_changed());
}

#[test]
fn test_word_selection_follows_token_colors() {
    let mut editor = editor_with("SUB R10 R11");
    editor.refresh();

    // `R10` and `R11` are separate tokens of the same kind; the space
    // between them keeps the default color, so each register is its own
    // word.
    editor.set_selection(
        Coordinate::new(0, 5),
        Coordinate::new(0, 5),
        SelectionMode::Word,
    );
    assert_eq!(editor.get_selected_text(), "R10");
}

#[test]
fn test_colorizer_disabled_uses_space_boundaries() {
    let mut editor = editor_with("one two");
    editor.set_colorizer_enabled(false);
    editor.refresh();

    // With uniform colors the word run reaches through the separator
    // whitespace to the next word start.
    editor.set_selection(
        Coordinate::new(0, 1),
        Coordinate::new(0, 1),
        SelectionMode::Word,
    );
    assert_eq!(editor.get_selected_text(), "one ");
}

#[test]
fn test_token_spans_are_clipped_to_line_length() {
    struct OverflowParser;
    impl ProgramParser for OverflowParser {
        fn parse(&mut self, _source: &str) -> ParseOutcome {
            ParseOutcome {
                tokens: vec![
                    SourceToken::new(TokenKind::OpCode, 1, 1, 999),
                    SourceToken::new(TokenKind::Comment, 7, 1, 3),
                    SourceToken::new(TokenKind::Comment, 0, 1, 3),
                ],
                diagnostics: vec![ParseDiagnostic::new(99, "out of range")],
            }
        }
    }

    let mut editor = Editor::new(Box::new(OverflowParser));
    editor.set_text("ab");
    editor.refresh();

    // Out-of-range markers are rejected, out-of-range tokens clipped.
    assert!(editor.error_markers().is_empty());
    assert_eq!(editor.get_text(), "ab");
}
