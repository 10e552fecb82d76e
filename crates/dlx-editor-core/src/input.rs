//! Input dispatch.
//!
//! Translates one frame of host keyboard and mouse state into editor
//! operations. Runs inside [`Editor::render`] after the character advance is
//! known, so hit-testing and page sizes are valid.
//!
//! On macOS hosts the `super` key takes the role `ctrl` plays elsewhere; the
//! [`Modifiers`] accessors hide that swap.

use crate::coords::encode_utf8;
use crate::editor::{Editor, SelectionMode};
use crate::host::{EditorHost, EditorKey, Modifiers};

impl Editor {
    /// Lines one PageUp/PageDown stride covers.
    pub(crate) fn page_size(&self, host: &dyn EditorHost) -> usize {
        if self.char_advance.y <= 0.0 {
            return 5;
        }
        let height = host.window_size().y - 20.0;
        let page_size = (height / self.char_advance.y).floor();
        page_size.max(5.0) as usize
    }

    /// Move the cursor one page up, sized from the host window.
    pub fn move_page_up(&mut self, host: &dyn EditorHost, select: bool) {
        let page_size = self.page_size(host);
        self.move_up(page_size.saturating_sub(4), select);
    }

    /// Move the cursor one page down, sized from the host window.
    pub fn move_page_down(&mut self, host: &dyn EditorHost, select: bool) {
        let page_size = self.page_size(host);
        self.move_down(page_size.saturating_sub(4), select);
    }

    /// Apply this frame's keyboard state.
    pub(crate) fn handle_keyboard_inputs(&mut self, host: &mut dyn EditorHost) {
        if !host.is_focused() {
            return;
        }

        let modifiers: Modifiers = host.modifiers();
        let shift = modifiers.shift;
        let ctrl = modifiers.command();
        let alt = modifiers.option();

        if host.is_hovered() {
            host.use_text_cursor();
        }

        let read_only = self.is_read_only();

        if !read_only && ctrl && !shift && !alt && host.is_key_pressed(EditorKey::Z) {
            self.undo(1);
        } else if !read_only && !ctrl && !shift && alt && host.is_key_pressed(EditorKey::Backspace)
        {
            self.undo(1);
        } else if !read_only && ctrl && !shift && !alt && host.is_key_pressed(EditorKey::Y) {
            self.redo(1);
        } else if !ctrl && !alt && host.is_key_pressed(EditorKey::Up) {
            self.move_up(1, shift);
        } else if !ctrl && !alt && host.is_key_pressed(EditorKey::Down) {
            self.move_down(1, shift);
        } else if !alt && host.is_key_pressed(EditorKey::Left) {
            self.move_left(1, shift, ctrl);
        } else if !alt && host.is_key_pressed(EditorKey::Right) {
            self.move_right(1, shift, ctrl);
        } else if !alt && host.is_key_pressed(EditorKey::PageUp) {
            self.move_page_up(host, shift);
        } else if !alt && host.is_key_pressed(EditorKey::PageDown) {
            self.move_page_down(host, shift);
        } else if !alt && ctrl && host.is_key_pressed(EditorKey::Home) {
            self.move_top(shift);
        } else if ctrl && !alt && host.is_key_pressed(EditorKey::End) {
            self.move_bottom(shift);
        } else if !ctrl && !alt && host.is_key_pressed(EditorKey::Home) {
            self.move_home(shift);
        } else if !ctrl && !alt && host.is_key_pressed(EditorKey::End) {
            self.move_end(shift);
        } else if !read_only && !ctrl && !shift && !alt && host.is_key_pressed(EditorKey::Delete) {
            self.delete();
        } else if !read_only && !ctrl && !shift && !alt && host.is_key_pressed(EditorKey::Backspace)
        {
            self.backspace_impl();
        } else if !ctrl && !shift && !alt && host.is_key_pressed(EditorKey::Insert) {
            self.toggle_overwrite();
        } else if ctrl && !shift && !alt && host.is_key_pressed(EditorKey::Insert) {
            self.copy(host);
        } else if ctrl && !shift && !alt && host.is_key_pressed(EditorKey::C) {
            self.copy(host);
        } else if !read_only && !ctrl && shift && !alt && host.is_key_pressed(EditorKey::Insert) {
            self.paste(host);
        } else if !read_only && ctrl && !shift && !alt && host.is_key_pressed(EditorKey::V) {
            self.paste(host);
        } else if ctrl && !shift && !alt && host.is_key_pressed(EditorKey::X) {
            self.cut(host);
        } else if !ctrl && shift && !alt && host.is_key_pressed(EditorKey::Delete) {
            self.cut(host);
        } else if ctrl && !shift && !alt && host.is_key_pressed(EditorKey::A) {
            self.select_all();
        } else if !read_only
            && !ctrl
            && !alt
            && (host.is_key_pressed(EditorKey::Enter) || host.is_key_pressed(EditorKey::KeypadEnter))
        {
            self.enter_character_impl(u32::from(b'\n'), shift);
        } else if !read_only && !ctrl && !alt && host.is_key_pressed(EditorKey::Tab) {
            self.enter_character_impl(u32::from(b'\t'), shift);
        }

        if !read_only {
            for character in host.drain_characters() {
                if character != 0 && encode_utf8(character).is_some() {
                    self.enter_character_impl(character, shift);
                }
            }
        }
    }

    /// Apply this frame's mouse state.
    pub(crate) fn handle_mouse_inputs(&mut self, host: &mut dyn EditorHost) {
        if !host.is_hovered() {
            return;
        }

        let modifiers = host.modifiers();
        let shift = modifiers.shift;
        let ctrl = modifiers.command();
        let alt = modifiers.option();

        if shift || alt {
            return;
        }

        let click = host.is_mouse_clicked();
        let double_click = host.is_mouse_double_clicked();
        let time = host.time_ms();
        let triple_click = click
            && !double_click
            && self
                .last_click_ms
                .is_some_and(|last| time.saturating_sub(last) < host.double_click_interval_ms());

        // The line-number gutter is not part of the text column.
        if (click || double_click) && host.mouse_position().x < self.text_start {
            return;
        }

        if triple_click {
            if !ctrl {
                let coord = self.screen_pos_to_coordinates(host, host.mouse_position());
                self.state.cursor = coord;
                self.interactive_start = coord;
                self.interactive_end = coord;
                self.selection_mode = SelectionMode::Line;
                self.set_selection(self.interactive_start, self.interactive_end, self.selection_mode);
            }
            self.last_click_ms = None;
        } else if double_click {
            if !ctrl {
                let coord = self.screen_pos_to_coordinates(host, host.mouse_position());
                self.state.cursor = coord;
                self.interactive_start = coord;
                self.interactive_end = coord;
                self.selection_mode = if self.selection_mode == SelectionMode::Line {
                    SelectionMode::Normal
                } else {
                    SelectionMode::Word
                };
                self.set_selection(self.interactive_start, self.interactive_end, self.selection_mode);
            }
            self.last_click_ms = Some(time);
        } else if click {
            let coord = self.screen_pos_to_coordinates(host, host.mouse_position());
            self.state.cursor = coord;
            self.interactive_start = coord;
            self.interactive_end = coord;
            self.selection_mode = if ctrl {
                SelectionMode::Word
            } else {
                SelectionMode::Normal
            };
            self.set_selection(self.interactive_start, self.interactive_end, self.selection_mode);
            self.last_click_ms = Some(time);
        } else if host.is_mouse_dragging() && host.is_mouse_down() {
            let coord = self.screen_pos_to_coordinates(host, host.mouse_position());
            self.state.cursor = coord;
            self.interactive_end = coord;
            self.set_selection(self.interactive_start, self.interactive_end, self.selection_mode);
        }
    }
}
