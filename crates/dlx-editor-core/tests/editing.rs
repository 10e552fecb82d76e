use dlx_editor_core::{Coordinate, Editor, NullParser, SelectionMode};

fn editor() -> Editor {
    Editor::new(Box::new(NullParser))
}

#[test]
fn test_auto_indent_on_newline() {
    let mut editor = editor();
    editor.set_text("   ABC");
    editor.set_cursor_position(Coordinate::new(0, 999));
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 6));

    editor.enter_character('\n' as u32, false);
    editor.verify_internal_state();
    editor.enter_character('\n' as u32, false);
    editor.verify_internal_state();

    assert_eq!(editor.get_text(), "   ABC\n   \n   ");
    assert_eq!(editor.get_cursor_position(), Coordinate::new(2, 3));
}

#[test]
fn test_auto_indent_copies_tabs() {
    let mut editor = editor();
    editor.set_text("\tLOOP:");
    editor.set_cursor_position(Coordinate::new(0, 999));
    editor.enter_character('\n' as u32, false);

    assert_eq!(editor.get_text(), "\tLOOP:\n\t");
    assert_eq!(editor.get_cursor_position(), Coordinate::new(1, 4));
}

#[test]
fn test_block_indent_and_outdent() {
    let mut editor = editor();
    editor.set_text("Hi\n:)");
    editor.select_all();

    editor.enter_character('\t' as u32, false);
    editor.verify_internal_state();
    assert_eq!(editor.get_text(), "\tHi\n\t:)");

    editor.enter_character('\t' as u32, true);
    editor.verify_internal_state();
    assert_eq!(editor.get_text(), "Hi\n:)");
}

#[test]
fn test_block_outdent_removes_leading_spaces() {
    let mut editor = editor();
    editor.set_text("    one\n        two");
    editor.select_all();

    editor.enter_character('\t' as u32, true);
    assert_eq!(editor.get_text(), "one\n    two");
}

#[test]
fn test_block_indent_is_one_undo_step() {
    let mut editor = editor();
    editor.set_text("Hi\n:)");
    editor.select_all();

    editor.enter_character('\t' as u32, false);
    assert_eq!(editor.get_text(), "\tHi\n\t:)");

    editor.undo(1);
    assert_eq!(editor.get_text(), "Hi\n:)");
    editor.redo(1);
    assert_eq!(editor.get_text(), "\tHi\n\t:)");
}

#[test]
fn test_backspace_joins_lines_and_shifts_annotations() {
    let mut editor = editor();
    editor.set_text("A\nB");
    editor.add_error_marker(2, "err");
    editor.set_cursor_position(Coordinate::new(1, 0));

    editor.backspace();
    editor.verify_internal_state();

    assert_eq!(editor.get_text(), "AB");
    assert_eq!(editor.error_markers().len(), 1);
    assert_eq!(editor.error_markers().get(&1).map(String::as_str), Some("err"));
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 1));
}

#[test]
fn test_undo_redo_round_trip_with_selection() {
    let mut editor = editor();
    editor.set_text("Hello World");
    editor.set_cursor_position(Coordinate::new(0, 3));
    editor.select_all();
    editor.clear_text();

    assert_eq!(editor.get_text(), "");

    editor.undo(1);
    assert_eq!(editor.get_text(), "Hello World");
    assert_eq!(editor.selection_start(), Coordinate::new(0, 0));
    assert_eq!(editor.selection_end(), Coordinate::new(0, 11));
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 3));

    editor.redo(1);
    assert_eq!(editor.get_text(), "");
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 0));
}

#[test]
fn test_tab_size_change_preserves_byte_position() {
    let mut editor = editor();
    editor.set_text("\tX");
    editor.set_cursor_position(Coordinate::new(0, 5));

    let byte_index = editor.char_index_of(editor.get_cursor_position());
    assert_eq!(byte_index, 2);

    editor.set_tab_size(2);
    assert_eq!(editor.char_index_of(editor.get_cursor_position()), 2);
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 3));
}

#[test]
fn test_cursor_inside_tab_snaps_to_tab_start() {
    let mut editor = editor();
    editor.set_text("\tX");
    for column in 1..4 {
        editor.set_cursor_position(Coordinate::new(0, column));
        assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 0));
    }
    editor.set_cursor_position(Coordinate::new(0, 4));
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 4));
}

#[test]
fn test_overwrite_replaces_character() {
    let mut editor = editor();
    editor.set_text("ABC");
    editor.set_cursor_position(Coordinate::new(0, 1));
    editor.set_overwrite(true);

    editor.enter_character('X' as u32, false);
    editor.verify_internal_state();

    assert_eq!(editor.get_text(), "AXC");
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 2));
    assert_eq!(editor.undo_count(), 1);

    let dump = editor.get_editor_dump();
    assert!(dump.contains("Removed: \"B\""));
    assert!(dump.contains("Added: \"X\""));
}

#[test]
fn test_overwrite_at_end_of_line_appends() {
    let mut editor = editor();
    editor.set_text("AB");
    editor.set_cursor_position(Coordinate::new(0, 2));
    editor.set_overwrite(true);

    editor.enter_character('C' as u32, false);
    assert_eq!(editor.get_text(), "ABC");
}

#[test]
fn test_set_text_normalizes_crlf_and_control_bytes() {
    let mut editor = editor();
    editor.set_text("one\r\ntwo\x07three\x1b\nfour\tfive");
    assert_eq!(editor.get_text(), "one\ntwothree\nfour\tfive");

    // The round trip holds for already-normalized text.
    let normalized = editor.get_text();
    editor.set_text(&normalized);
    assert_eq!(editor.get_text(), normalized);
}

#[test]
fn test_set_text_resets_cursor_and_history() {
    let mut editor = editor();
    editor.set_text("abc");
    editor.enter_character('x' as u32, false);
    assert!(editor.can_undo());

    editor.set_text("def");
    assert!(!editor.can_undo());
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 0));
    assert!(!editor.has_selection());
}

#[test]
fn test_set_text_lines_and_get_text_lines() {
    let mut editor = editor();
    editor.set_text_lines(&["one".to_string(), "two".to_string(), String::new()]);
    assert_eq!(editor.total_lines(), 3);
    assert_eq!(editor.get_text(), "one\ntwo\n");
    assert_eq!(editor.get_text_lines(), vec!["one", "two", ""]);
}

#[test]
fn test_enter_character_replaces_selection() {
    let mut editor = editor();
    editor.set_text("Hello");
    editor.select_all();
    editor.enter_character('A' as u32, false);
    assert_eq!(editor.get_text(), "A");
    assert_eq!(editor.total_lines(), 1);

    editor.undo(1);
    assert_eq!(editor.get_text(), "Hello");
}

#[test]
fn test_enter_character_rejects_nul_and_surrogates() {
    let mut editor = editor();
    editor.set_text("x");
    editor.set_cursor_position(Coordinate::new(0, 1));

    editor.enter_character(0, false);
    editor.enter_character(0xd800, false);
    editor.enter_character(0xdfff, false);
    editor.enter_character(0x110000, false);

    assert_eq!(editor.get_text(), "x");
    assert!(!editor.can_undo());
}

#[test]
fn test_enter_character_encodes_multibyte() {
    let mut editor = editor();
    editor.enter_character('é' as u32, false);
    editor.enter_character('漢' as u32, false);
    editor.enter_character('🦀' as u32, false);
    assert_eq!(editor.get_text(), "é漢🦀");
    // One column per character, regardless of byte length.
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 3));
}

#[test]
fn test_backspace_removes_whole_multibyte_character() {
    let mut editor = editor();
    editor.set_text("aé漢");
    editor.set_cursor_position(Coordinate::new(0, 3));

    editor.backspace();
    assert_eq!(editor.get_text(), "aé");
    editor.backspace();
    assert_eq!(editor.get_text(), "a");

    editor.undo(2);
    assert_eq!(editor.get_text(), "aé漢");
}

#[test]
fn test_backspace_removes_single_tab_glyph() {
    let mut editor = editor();
    editor.set_text("\tA");
    editor.set_cursor_position(Coordinate::new(0, 4));

    editor.backspace();
    assert_eq!(editor.get_text(), "A");
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 0));
}

#[test]
fn test_backspace_at_origin_is_noop() {
    let mut editor = editor();
    editor.set_text("abc");
    editor.set_cursor_position(Coordinate::new(0, 0));
    editor.backspace();
    assert_eq!(editor.get_text(), "abc");
    assert!(!editor.can_undo());
}

#[test]
fn test_delete_forward_character_and_join() {
    let mut editor = editor();
    editor.set_text("ab\ncd");
    editor.set_cursor_position(Coordinate::new(0, 0));

    editor.delete();
    assert_eq!(editor.get_text(), "b\ncd");

    editor.set_cursor_position(Coordinate::new(0, 1));
    editor.delete();
    assert_eq!(editor.get_text(), "bcd");

    editor.undo(2);
    assert_eq!(editor.get_text(), "ab\ncd");
}

#[test]
fn test_delete_join_migrates_annotations() {
    let mut editor = editor();
    editor.set_text("a\nb\nc");
    editor.add_error_marker(2, "two");
    editor.add_error_marker(3, "three");
    editor.add_breakpoint(2);
    editor.set_cursor_position(Coordinate::new(0, 1));

    editor.delete();
    editor.verify_internal_state();

    assert_eq!(editor.get_text(), "ab\nc");
    assert_eq!(editor.error_markers().get(&1).map(String::as_str), Some("two"));
    assert_eq!(editor.error_markers().get(&2).map(String::as_str), Some("three"));
    assert!(editor.breakpoints().contains(&1));
}

#[test]
fn test_delete_at_end_of_buffer_is_noop() {
    let mut editor = editor();
    editor.set_text("ab");
    editor.set_cursor_position(Coordinate::new(0, 2));
    editor.delete();
    assert_eq!(editor.get_text(), "ab");
    assert!(!editor.can_undo());
}

#[test]
fn test_delete_selection() {
    let mut editor = editor();
    editor.set_text("one two three");
    editor.set_selection_start(Coordinate::new(0, 4));
    editor.set_selection_end(Coordinate::new(0, 8));

    editor.delete();
    assert_eq!(editor.get_text(), "one three");
    assert_eq!(editor.get_cursor_position(), Coordinate::new(0, 4));

    editor.undo(1);
    assert_eq!(editor.get_text(), "one two three");
    assert_eq!(editor.selection_start(), Coordinate::new(0, 4));
    assert_eq!(editor.selection_end(), Coordinate::new(0, 8));
}

#[test]
fn test_insert_text_multi_line() {
    let mut editor = editor();
    editor.set_text("ab");
    editor.set_cursor_position(Coordinate::new(0, 1));

    editor.insert_text("1\n2\n3");
    assert_eq!(editor.get_text(), "a1\n2\n3b");
    assert_eq!(editor.get_cursor_position(), Coordinate::new(2, 1));

    editor.undo(1);
    assert_eq!(editor.get_text(), "ab");
}

#[test]
fn test_insert_text_empty_is_noop() {
    let mut editor = editor();
    editor.set_text("ab");
    editor.insert_text("");
    assert!(!editor.can_undo());
}

#[test]
fn test_clear_text_records_one_undo_step() {
    let mut editor = editor();
    editor.set_text("line1\nline2");
    editor.clear_text();

    assert_eq!(editor.get_text(), "");
    assert_eq!(editor.total_lines(), 1);
    assert_eq!(editor.undo_count(), 1);

    editor.undo(1);
    assert_eq!(editor.get_text(), "line1\nline2");
}

#[test]
fn test_clear_text_on_empty_buffer_is_noop() {
    let mut editor = editor();
    editor.clear_text();
    assert!(!editor.can_undo());
}

#[test]
fn test_read_only_blocks_all_mutations() {
    let mut editor = editor();
    editor.set_text("abc");
    editor.set_read_only(true);

    editor.enter_character('x' as u32, false);
    editor.backspace();
    editor.delete();
    editor.insert_text("nope");
    editor.clear_text();

    assert_eq!(editor.get_text(), "abc");
    assert!(!editor.can_undo());
    assert!(!editor.can_redo());
    assert!(editor.insert_line(0).is_err());
    assert!(editor.remove_line(0).is_err());
}

#[test]
fn test_insert_and_remove_lines_shift_annotations() {
    let mut editor = editor();
    editor.set_text("a\nb\nc");
    editor.add_error_marker(3, "bottom");
    editor.add_breakpoint(3);

    editor.insert_line(1).unwrap();
    assert_eq!(editor.total_lines(), 4);
    assert!(editor.error_markers().contains_key(&4));
    assert!(editor.breakpoints().contains(&4));

    editor.remove_line(1).unwrap();
    assert_eq!(editor.total_lines(), 3);
    assert!(editor.error_markers().contains_key(&3));
    assert!(editor.breakpoints().contains(&3));
}

#[test]
fn test_get_current_line_and_word() {
    let mut editor = editor();
    editor.set_text("ADD R1 R2\nHALT");
    editor.set_cursor_position(Coordinate::new(0, 5));

    assert_eq!(editor.get_current_line_text(), "ADD R1 R2");
    // Without distinct token colors the word run extends through the
    // following whitespace.
    assert_eq!(editor.get_word_under_cursor(), "R1 ");
    assert_eq!(editor.get_word_at(Coordinate::new(1, 1)), "HALT");
}

#[test]
fn test_selected_text_spans_lines() {
    let mut editor = editor();
    editor.set_text("one\ntwo\nthree");
    editor.set_selection_start(Coordinate::new(0, 2));
    editor.set_selection_end(Coordinate::new(2, 3));
    assert_eq!(editor.get_selected_text(), "e\ntwo\nthr");
}

#[test]
fn test_selection_mode_line_covers_whole_lines() {
    let mut editor = editor();
    editor.set_text("one\ntwo\nthree");
    editor.set_selection(
        Coordinate::new(1, 1),
        Coordinate::new(1, 2),
        SelectionMode::Line,
    );
    assert_eq!(editor.selection_start(), Coordinate::new(1, 0));
    assert_eq!(editor.selection_end(), Coordinate::new(1, 3));
    assert_eq!(editor.get_selected_text(), "two");
}

#[test]
fn test_selection_endpoints_reorder() {
    let mut editor = editor();
    editor.set_text("hello");
    editor.set_selection(
        Coordinate::new(0, 4),
        Coordinate::new(0, 1),
        SelectionMode::Normal,
    );
    assert_eq!(editor.selection_start(), Coordinate::new(0, 1));
    assert_eq!(editor.selection_end(), Coordinate::new(0, 4));
}

#[test]
fn test_editor_dump_mentions_core_state() {
    let mut editor = editor();
    editor.set_text("ADD R1 R2");
    editor.add_breakpoint(1);
    editor.enter_character('!' as u32, false);

    let dump = editor.get_editor_dump();
    assert!(dump.contains("Cursor position:"));
    assert!(dump.contains("Total lines: 1"));
    assert!(dump.contains("Break points:"));
    assert!(dump.contains("#00 UndoRecord:"));
}
