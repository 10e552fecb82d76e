//! Fuzzer-derived regression sequences.
//!
//! Each test replays an input sequence that once triggered a crash or a
//! broken invariant. The only assertion that matters is that every step
//! leaves the internal state consistent.

use dlx_editor_core::{Coordinate, Editor, MockHost, NullParser, Vec2};

fn editor() -> Editor {
    Editor::new(Box::new(NullParser))
}

#[test]
fn crash_6ededd1eef55e21130e51a28a22b1275a0929cfd() {
    let mut editor = editor();

    editor.insert_text("\n\n\n");
    editor.verify_internal_state();

    editor.set_selection(
        Coordinate::new(0, 1_993_065),
        Coordinate::new(31, 1_761_607_680),
        dlx_editor_core::SelectionMode::Normal,
    );
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();

    editor.undo(24);
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();
}

#[test]
fn crash_1c525126120b9931b78d5b724f6338435e211037() {
    let mut editor = editor();

    editor.insert_text("\n");
    editor.verify_internal_state();

    editor.set_cursor_position(Coordinate::new(0, 0));
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();

    editor.set_selection_start(Coordinate::new(0, 30));
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();
}

#[test]
fn crash_a37f577acccdcbfa8bdc8f53a570e1c6385c13da() {
    let mut editor = editor();

    editor.set_text("z`3!\n");
    editor.verify_internal_state();

    editor.insert_text("\x1e");
    editor.verify_internal_state();

    editor.move_bottom(true);
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();
}

#[test]
fn crash_2b9e8952b4d9676e2af93db7032ebca1dc2a9480() {
    let mut editor = editor();

    editor.set_text("!");
    editor.verify_internal_state();

    editor.select_all();
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();
}

#[test]
fn crash_4161f8892d023e82832c668012743711e7e8c263() {
    let mut editor = editor();

    editor.insert_text("\x02\x01");
    editor.verify_internal_state();

    editor.move_home(true);
    editor.verify_internal_state();

    editor.insert_text("\n");
    editor.verify_internal_state();
}

#[test]
fn crash_9caa85410b9d43f4c105d38ab169f0540d159648() {
    let mut editor = editor();

    editor.insert_text("\x02\x01");
    editor.verify_internal_state();

    editor.move_home(true);
    editor.verify_internal_state();

    editor.insert_text("\n\n");
    editor.verify_internal_state();
}

#[test]
fn crash_0c744fcdb9b8193836417ce839daa3174ce89e16() {
    let mut editor = editor();

    editor.set_text("U");
    editor.verify_internal_state();

    editor.set_selection(
        Coordinate::new(7, 1537),
        Coordinate::new(738_197_504, 30),
        dlx_editor_core::SelectionMode::Normal,
    );
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();
}

#[test]
fn crash_4620fed3f283876c8534a78e77bbb319a9def029() {
    let mut editor = editor();

    let lines: Vec<String> = vec![
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        "\x1e".to_string(),
    ];
    editor.set_text_lines(&lines);
    editor.verify_internal_state();

    editor.set_selection(
        Coordinate::new(0, 30),
        Coordinate::new(30, 2_883_584),
        dlx_editor_core::SelectionMode::Normal,
    );
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();
}

#[test]
fn crash_73ef47764c46d77f157ef9399720189dbbeaeee3() {
    let mut editor = editor();

    editor.insert_text("(#8(\t");
    editor.verify_internal_state();

    editor.move_bottom(true);
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();
}

#[test]
fn crash_ebbfccfff485022666d0448d53c7634d31f98c9a() {
    let mut editor = editor();

    editor.insert_text("\tDM");
    editor.verify_internal_state();

    editor.move_end(true);
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();
}

#[test]
fn crash_aeb78eb087c7e15d3bc53666d21575ec7b73bd02() {
    let mut editor = editor();
    let mut host = MockHost::new();

    editor.insert_text("(#8(\x7f\t\x07");
    editor.verify_internal_state();

    editor.copy(&mut host);
    editor.verify_internal_state();

    editor.paste(&mut host);
    editor.verify_internal_state();

    editor.undo(638_844_961);
    editor.verify_internal_state();
}

#[test]
fn crash_1bc6fd5daba7cdfcacbc166f238326b0b3ed7b1e() {
    let mut editor = editor();

    editor.insert_text("\tDM+");
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();

    editor.move_bottom(true);
    editor.verify_internal_state();

    editor.delete();
    editor.verify_internal_state();
}

#[test]
fn crash_28853252177dc5b6be74f8247bde0d2a2b4f87b5() {
    let mut editor = editor();
    let mut host = MockHost::new();

    editor.insert_text("kA`\"#;#");
    editor.verify_internal_state();

    assert_eq!(editor.get_text().len(), 7);
    assert_eq!(editor.total_lines(), 1);

    editor.render(&mut host, Vec2::new(0.0, 0.0), true);
    editor.verify_internal_state();
}

#[test]
fn crash_c567e237f4822cff4cab65198f9ea3b393e6f92c() {
    let mut editor = editor();
    let mut host = MockHost::new();

    editor.set_text(" ");
    editor.verify_internal_state();

    for _ in 0..3 {
        editor.enter_character(u32::from(b'\n'), true);
        editor.verify_internal_state();
    }

    editor.insert_text(":x;(");
    editor.verify_internal_state();

    editor.render(&mut host, Vec2::new(0.0, 0.0), true);
    editor.verify_internal_state();
}

#[test]
fn crash_1e4a2c5c4b7bd8fe934c1eb3b5e0e98ed3474b72() {
    let mut editor = editor();
    let mut host = MockHost::new();

    editor.enter_character(0xff, true);
    editor.verify_internal_state();

    editor.enter_character(u32::from(b'\n'), true);
    editor.verify_internal_state();

    editor.insert_text("(m:M:x;");
    editor.verify_internal_state();

    editor.render(&mut host, Vec2::new(0.0, 0.0), true);
    editor.verify_internal_state();
}

#[test]
fn crash_b969d74f5fc10237a879950cd37541614ee459e4() {
    let mut editor = editor();
    let mut host = MockHost::new();

    editor.insert_text("A\tJ");
    editor.verify_internal_state();

    editor.render(&mut host, Vec2::new(0.0, 0.0), true);
    editor.verify_internal_state();

    editor.add_error_marker(0, "");
    editor.verify_internal_state();

    editor.add_error_marker(0, "");
    editor.verify_internal_state();

    editor.move_right(0, true, true);
    editor.verify_internal_state();

    editor.add_error_marker(0, "");
    editor.verify_internal_state();

    assert!(editor.error_markers().is_empty());
}
