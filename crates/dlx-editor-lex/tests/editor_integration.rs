use dlx_editor_core::{Coordinate, Editor, SelectionMode};
use dlx_editor_lex::DlxParser;

fn dlx_editor(text: &str) -> Editor {
    let parser = DlxParser::new().expect("tokenizer rules compile");
    let mut editor = Editor::new(Box::new(parser));
    editor.set_text(text);
    editor
}

#[test]
fn test_refresh_colors_make_tokens_words() {
    let mut editor = dlx_editor("ADD R1 R2 ; sum");
    editor.refresh();

    // Double-click word selection snaps to token boundaries because the
    // colorizer painted each token with its own palette tag.
    editor.set_selection(
        Coordinate::new(0, 5),
        Coordinate::new(0, 5),
        SelectionMode::Word,
    );
    assert_eq!(editor.get_selected_text(), "R1");

    editor.set_selection(
        Coordinate::new(0, 1),
        Coordinate::new(0, 1),
        SelectionMode::Word,
    );
    assert_eq!(editor.get_selected_text(), "ADD");
}

#[test]
fn test_parse_errors_become_error_markers() {
    let mut editor = dlx_editor("NOP\nFROB R1 R2\nHALT");
    editor.refresh();

    assert_eq!(editor.error_markers().len(), 1);
    let message = editor.error_markers().get(&2).cloned().unwrap_or_default();
    assert!(message.contains("FROB"));
}

#[test]
fn test_fixing_the_line_clears_the_marker() {
    let mut editor = dlx_editor("FROB R1 R2");
    editor.refresh();
    assert_eq!(editor.error_markers().len(), 1);

    editor.select_all();
    editor.enter_character('N' as u32, false);
    editor.insert_text("OP");
    editor.refresh();

    assert_eq!(editor.get_text(), "NOP");
    assert!(editor.error_markers().is_empty());
}

#[test]
fn test_word_boundaries_change_after_recolor() {
    let mut editor = dlx_editor("ADD R1 R2");
    editor.refresh();

    // As a register token, R1 is bounded by the color change at the space.
    editor.set_selection(
        Coordinate::new(0, 5),
        Coordinate::new(0, 5),
        SelectionMode::Word,
    );
    assert_eq!(editor.get_selected_text(), "R1");

    // Turn the tail of the line into a comment and recolor. The glyphs are
    // uniform again, so the word run now reaches through the whitespace.
    editor.set_cursor_position(Coordinate::new(0, 3));
    editor.enter_character(';' as u32, false);
    editor.refresh();

    editor.set_selection(
        Coordinate::new(0, 6),
        Coordinate::new(0, 6),
        SelectionMode::Word,
    );
    assert_eq!(editor.get_selected_text(), "R1 ");
}

#[test]
fn test_immediates_colorize_as_literals() {
    let mut editor = dlx_editor("ADDI R1 R0 #42");
    editor.refresh();

    editor.set_selection(
        Coordinate::new(0, 12),
        Coordinate::new(0, 12),
        SelectionMode::Word,
    );
    assert_eq!(editor.get_selected_text(), "#42");
}
