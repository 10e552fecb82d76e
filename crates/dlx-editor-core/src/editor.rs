//! The editor state machine.
//!
//! A single [`Editor`] owns the glyph buffer, the cursor and selection, the
//! undo history, the annotations, and every option. All methods are
//! synchronous and must run on the host's UI thread; state is consistent at
//! every method boundary.
//!
//! Mutations follow one discipline: update the buffer, re-sanitize cursor
//! and selection, set the dirty flag, and wrap the whole change in a single
//! undo record when the call is user-level. While the editor is read-only
//! every mutation silently does nothing.

use crate::annotations::{self, Breakpoints, ErrorMarkers};
use crate::buffer::{BufferFault, Glyph, Line, TextBuffer};
use crate::colorize::{ParseOutcome, ProgramParser};
use crate::coords::{
    Coordinate, char_index_for_column, column_for_char_index, encode_utf8, is_blank_byte,
    is_space_byte, is_utf8_continuation, line_character_count, line_max_column, tab_stop_advance,
    utf8_sequence_length,
};
use crate::host::{Clipboard, Vec2};
use crate::palette::{Palette, PaletteIndex};
use crate::undo::{EditorState, UndoRecord};
use log::{trace, warn};
use std::fmt::Write as _;

/// How a selection grows while the mouse drags or the API extends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Byte-granular selection.
    #[default]
    Normal,
    /// Endpoints snap to word boundaries.
    Word,
    /// Endpoints snap to whole lines.
    Line,
}

/// Smallest allowed tab size.
pub const MIN_TAB_SIZE: usize = 1;
/// Largest allowed tab size.
pub const MAX_TAB_SIZE: usize = 32;

/// The interactive, colorized code editor core.
pub struct Editor {
    pub(crate) buffer: TextBuffer,
    pub(crate) state: CursorState,
    pub(crate) undo_buffer: Vec<UndoRecord>,
    pub(crate) undo_index: usize,

    pub(crate) tab_size: usize,
    pub(crate) overwrite: bool,
    pub(crate) read_only: bool,
    pub(crate) colorizer_enabled: bool,
    pub(crate) show_whitespaces: bool,
    pub(crate) line_spacing: f32,

    pub(crate) scroll_to_cursor: bool,
    pub(crate) scroll_to_top: bool,
    pub(crate) text_changed: bool,
    pub(crate) cursor_position_changed: bool,

    pub(crate) text_start: f32,
    pub(crate) color_range_min: usize,
    pub(crate) color_range_max: usize,
    pub(crate) selection_mode: SelectionMode,

    pub(crate) palette_base: Palette,
    pub(crate) palette: Palette,

    pub(crate) breakpoints: Breakpoints,
    pub(crate) error_markers: ErrorMarkers,
    pub(crate) char_advance: Vec2,
    pub(crate) interactive_start: Coordinate,
    pub(crate) interactive_end: Coordinate,
    pub(crate) last_click_ms: Option<u64>,

    pub(crate) parser: Box<dyn ProgramParser>,
}

/// Cursor plus both selection endpoints, in visual columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    /// The cursor. May hold a "desired" column past the end of a short line
    /// after vertical movement; accessors sanitize it.
    pub cursor: Coordinate,
    /// Ordered selection start (`start <= end`).
    pub selection_start: Coordinate,
    /// Ordered selection end.
    pub selection_end: Coordinate,
}

impl Editor {
    /// Create an editor over an empty buffer, colorizing through `parser`.
    pub fn new(parser: Box<dyn ProgramParser>) -> Self {
        Self {
            buffer: TextBuffer::new(),
            state: CursorState::default(),
            undo_buffer: Vec::new(),
            undo_index: 0,
            tab_size: 4,
            overwrite: false,
            read_only: false,
            colorizer_enabled: true,
            show_whitespaces: false,
            line_spacing: 1.0,
            scroll_to_cursor: false,
            scroll_to_top: false,
            text_changed: false,
            cursor_position_changed: false,
            text_start: 20.0,
            color_range_min: usize::MAX,
            color_range_max: 0,
            selection_mode: SelectionMode::Normal,
            palette_base: Palette::dark(),
            palette: Palette::dark(),
            breakpoints: Breakpoints::new(),
            error_markers: ErrorMarkers::new(),
            char_advance: Vec2::default(),
            interactive_start: Coordinate::default(),
            interactive_end: Coordinate::default(),
            last_click_ms: None,
            parser,
        }
    }

    // ---- options --------------------------------------------------------

    /// Current palette preset.
    pub fn palette(&self) -> &Palette {
        &self.palette_base
    }

    /// Replace the palette.
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette_base = palette;
        self.palette = palette;
    }

    /// Tab size in cells.
    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// Change the tab size, clamped to `[1, 32]`.
    ///
    /// The cursor and selection keep their byte positions and are
    /// re-projected to visual columns under the new size.
    pub fn set_tab_size(&mut self, value: usize) {
        let new_tab_size = value.clamp(MIN_TAB_SIZE, MAX_TAB_SIZE);
        if new_tab_size == self.tab_size {
            return;
        }

        let cursor_index = self.char_index_of(self.state.cursor);
        let start_index = self.char_index_of(self.state.selection_start);
        let end_index = self.char_index_of(self.state.selection_end);

        self.tab_size = new_tab_size;

        self.state.cursor.column = self.column_of(self.state.cursor.line, cursor_index);
        self.state.selection_start.column =
            self.column_of(self.state.selection_start.line, start_index);
        self.state.selection_end.column = self.column_of(self.state.selection_end.line, end_index);
    }

    /// Overwrite mode.
    pub fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Set overwrite mode.
    pub fn set_overwrite(&mut self, value: bool) {
        self.overwrite = value;
    }

    /// Flip overwrite mode.
    pub fn toggle_overwrite(&mut self) {
        self.overwrite = !self.overwrite;
    }

    /// Read-only mode.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Set read-only mode.
    pub fn set_read_only(&mut self, value: bool) {
        self.read_only = value;
    }

    /// Flip read-only mode.
    pub fn toggle_read_only(&mut self) {
        self.read_only = !self.read_only;
    }

    /// Whether the colorizer repaints glyph colors.
    pub fn is_colorizer_enabled(&self) -> bool {
        self.colorizer_enabled
    }

    /// Enable or disable the colorizer.
    pub fn set_colorizer_enabled(&mut self, value: bool) {
        self.colorizer_enabled = value;
    }

    /// Flip the colorizer.
    pub fn toggle_colorizer(&mut self) {
        self.colorizer_enabled = !self.colorizer_enabled;
    }

    /// Whether whitespace glyphs are drawn.
    pub fn is_showing_whitespaces(&self) -> bool {
        self.show_whitespaces
    }

    /// Show or hide whitespace glyphs.
    pub fn set_show_whitespaces(&mut self, value: bool) {
        self.show_whitespaces = value;
    }

    /// Flip whitespace rendering.
    pub fn toggle_show_whitespaces(&mut self) {
        self.show_whitespaces = !self.show_whitespaces;
    }

    /// Vertical spacing multiplier between rows.
    pub fn line_spacing(&self) -> f32 {
        self.line_spacing
    }

    /// Set the vertical spacing multiplier.
    pub fn set_line_spacing(&mut self, value: f32) {
        if value.is_finite() {
            self.line_spacing = value.max(0.1);
        }
    }

    /// True when the buffer changed since the last refresh cycle.
    pub fn is_text_changed(&self) -> bool {
        self.text_changed
    }

    /// True when the cursor or selection moved during the last frame.
    pub fn is_cursor_position_changed(&self) -> bool {
        self.cursor_position_changed
    }

    pub(crate) fn mark_text_unchanged(&mut self) {
        self.text_changed = false;
    }

    // ---- text -----------------------------------------------------------

    /// Replace the whole buffer.
    ///
    /// CR and control bytes other than `\n` and `\t` are discarded. Cursor,
    /// selection, annotations, and the undo history are reset.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = TextBuffer::from_text(text);
        self.reset_state();

        self.text_changed = true;
        self.scroll_to_top = true;

        self.undo_buffer.clear();
        self.undo_index = 0;

        self.colorize_all();
    }

    /// The whole buffer as text, lines joined with `\n`, no trailing newline.
    pub fn get_text(&self) -> String {
        let max_line = self.max_line_index();
        self.text_between(
            Coordinate::new(0, 0),
            Coordinate::new(max_line, self.line_max_column_at(max_line)),
        )
    }

    /// Replace the buffer from a list of lines.
    pub fn set_text_lines(&mut self, lines: &[String]) {
        self.buffer = TextBuffer::from_lines(lines);
        self.reset_state();

        self.text_changed = true;
        self.scroll_to_top = true;

        self.undo_buffer.clear();
        self.undo_index = 0;

        self.colorize_all();
    }

    /// Every line's text, without separators.
    pub fn get_text_lines(&self) -> Vec<String> {
        self.buffer.text_lines()
    }

    /// Remove every line, leaving one empty line, as a single undo step.
    pub fn clear_text(&mut self) {
        if self.read_only || self.buffer.is_blank() {
            return;
        }

        let mut record = UndoRecord::default();
        record.store_before(self);

        record.removed = self.get_text();
        record.removed_start = Coordinate::new(0, 0);
        let max_line = self.max_line_index();
        record.removed_end = Coordinate::new(max_line, self.buffer.line(max_line).len());

        self.buffer.clear();
        self.reset_state();
        self.text_changed = true;

        record.store_after(self);
        self.add_undo(record);
    }

    /// The selected text, empty when there is no selection.
    pub fn get_selected_text(&self) -> String {
        self.text_between(self.state.selection_start, self.state.selection_end)
    }

    /// The full text of the line the cursor is on.
    pub fn get_current_line_text(&self) -> String {
        let line = self.get_cursor_position().line;
        self.text_between(
            Coordinate::new(line, 0),
            Coordinate::new(line, self.line_max_column_at(line)),
        )
    }

    /// Number of lines in the buffer.
    pub fn total_lines(&self) -> usize {
        self.buffer.line_count()
    }

    /// Bytes between two coordinates, `\n`-joined across lines.
    pub fn text_between(&self, start: Coordinate, end: Coordinate) -> String {
        debug_assert!(start <= end);
        if start.line >= self.buffer.line_count() || start > end {
            return String::new();
        }

        let mut bytes = Vec::new();
        let mut lstart = start.line;
        let lend = end.line.min(self.buffer.max_line_index());
        let mut istart = self.char_index_of(start);
        let iend = self
            .char_index_of(Coordinate::new(lend, end.column))
            .min(self.buffer.line(lend).len());

        while istart < iend || lstart < lend {
            let line = self.buffer.line(lstart);
            if istart < line.len() {
                bytes.push(line[istart].byte);
                istart += 1;
            } else {
                istart = 0;
                lstart += 1;
                if lstart != self.buffer.line_count() {
                    bytes.push(b'\n');
                }
            }
        }

        String::from_utf8_lossy(&bytes).into_owned()
    }

    // ---- coordinates ----------------------------------------------------

    /// Byte index into its line for a visual coordinate.
    pub fn char_index_of(&self, coordinate: Coordinate) -> usize {
        if coordinate.line >= self.buffer.line_count() {
            return 0;
        }
        char_index_for_column(self.buffer.line(coordinate.line), coordinate.column, self.tab_size)
    }

    /// Visual column for a byte index into a line.
    pub fn column_of(&self, line: usize, index: usize) -> usize {
        if line >= self.buffer.line_count() {
            return 0;
        }
        column_for_char_index(self.buffer.line(line), index, self.tab_size)
    }

    /// Number of characters on a line.
    pub fn line_character_count_at(&self, line: usize) -> usize {
        if line >= self.buffer.line_count() {
            return 0;
        }
        line_character_count(self.buffer.line(line))
    }

    /// Visual width of a line.
    pub fn line_max_column_at(&self, line: usize) -> usize {
        if line >= self.buffer.line_count() {
            return 0;
        }
        line_max_column(self.buffer.line(line), self.tab_size)
    }

    /// Index of the last line.
    pub fn max_line_index(&self) -> usize {
        self.buffer.max_line_index()
    }

    /// Project an arbitrary coordinate onto a valid cursor position.
    ///
    /// The line clamps into the buffer, the column clamps to the line width,
    /// and a column landing inside a tab's span snaps back to the column the
    /// tab starts at.
    pub fn sanitize(&self, value: Coordinate) -> Coordinate {
        if value.line >= self.buffer.line_count() {
            let line = self.buffer.max_line_index();
            return Coordinate::new(line, self.line_max_column_at(line));
        }

        let line = self.buffer.line(value.line);
        let mut column = 0;
        let mut index = 0;
        while index < line.len() {
            let byte = line[index].byte;
            let next = if byte == b'\t' {
                (column / self.tab_size) * self.tab_size + self.tab_size
            } else {
                column + 1
            };
            if value.column < next {
                return Coordinate::new(value.line, column);
            }
            column = next;
            index += utf8_sequence_length(byte);
        }

        Coordinate::new(value.line, column)
    }

    /// Step a coordinate one character forward, wrapping to the next line.
    pub(crate) fn advance(&self, coordinates: &mut Coordinate) {
        if coordinates.line >= self.buffer.line_count() {
            return;
        }

        let line = self.buffer.line(coordinates.line);
        let mut cindex = self.char_index_of(*coordinates);

        if cindex + 1 < line.len() {
            let delta = utf8_sequence_length(line[cindex].byte);
            cindex = (cindex + delta).min(line.len() - 1);
        } else {
            coordinates.line += 1;
            cindex = 0;
        }
        coordinates.column = self.column_of(coordinates.line, cindex);
    }

    /// A coordinate with its column converted from visual to byte index.
    pub(crate) fn byte_coord(&self, coordinate: Coordinate) -> Coordinate {
        Coordinate::new(coordinate.line, self.char_index_of(coordinate))
    }

    /// A saved byte-index coordinate re-projected to visual columns against
    /// the current buffer and tab size.
    pub(crate) fn coordinate_from_byte_index(&self, saved: Coordinate) -> Coordinate {
        let line = saved.line.min(self.buffer.max_line_index());
        Coordinate::new(line, self.column_of(line, saved.column))
    }

    // ---- cursor & selection --------------------------------------------

    /// The sanitized cursor position.
    pub fn get_cursor_position(&self) -> Coordinate {
        self.sanitize(self.state.cursor)
    }

    /// Move the cursor, sanitizing the input.
    pub fn set_cursor_position(&mut self, position: Coordinate) {
        let new_pos = self.sanitize(position);
        if self.state.cursor != new_pos {
            self.state.cursor = new_pos;
            self.cursor_position_changed = true;
            self.ensure_cursor_visible();
        }
    }

    /// Set the selection start, keeping the endpoints ordered.
    pub fn set_selection_start(&mut self, position: Coordinate) {
        self.state.selection_start = self.sanitize(position);
        if self.state.selection_start > self.state.selection_end {
            std::mem::swap(&mut self.state.selection_start, &mut self.state.selection_end);
        }
    }

    /// Set the selection end, keeping the endpoints ordered.
    pub fn set_selection_end(&mut self, position: Coordinate) {
        self.state.selection_end = self.sanitize(position);
        if self.state.selection_start > self.state.selection_end {
            std::mem::swap(&mut self.state.selection_start, &mut self.state.selection_end);
        }
    }

    /// Set both selection endpoints, then apply the mode's snapping.
    pub fn set_selection(&mut self, start: Coordinate, end: Coordinate, mode: SelectionMode) {
        let old_start = self.state.selection_start;
        let old_end = self.state.selection_end;

        self.state.selection_start = self.sanitize(start);
        self.state.selection_end = self.sanitize(end);
        if self.state.selection_start > self.state.selection_end {
            std::mem::swap(&mut self.state.selection_start, &mut self.state.selection_end);
        }

        match mode {
            SelectionMode::Normal => {}
            SelectionMode::Word => {
                self.state.selection_start = self.find_word_start(self.state.selection_start);
                if !self.is_on_word_boundary(self.state.selection_end) {
                    self.state.selection_end =
                        self.find_word_end(self.find_word_start(self.state.selection_end));
                }
            }
            SelectionMode::Line => {
                let line_no = self.state.selection_end.line;
                self.state.selection_start = Coordinate::new(self.state.selection_start.line, 0);
                self.state.selection_end =
                    Coordinate::new(line_no, self.line_max_column_at(line_no));
            }
        }

        if self.state.selection_start != old_start || self.state.selection_end != old_end {
            self.cursor_position_changed = true;
        }
    }

    /// Select the word under the cursor.
    pub fn select_word_under_cursor(&mut self) {
        let coords = self.get_cursor_position();
        self.set_selection(
            self.find_word_start(coords),
            self.find_word_end(coords),
            SelectionMode::Normal,
        );
    }

    /// Select the whole buffer.
    pub fn select_all(&mut self) {
        self.set_selection(
            Coordinate::new(0, 0),
            Coordinate::new(self.buffer.line_count(), 0),
            SelectionMode::Normal,
        );
    }

    /// Collapse the selection to nothing.
    pub fn clear_selection(&mut self) {
        self.set_selection(Coordinate::new(0, 0), Coordinate::new(0, 0), SelectionMode::Normal);
    }

    /// True when the selection is non-empty.
    pub fn has_selection(&self) -> bool {
        self.state.selection_end > self.state.selection_start
    }

    /// Ordered selection start.
    pub fn selection_start(&self) -> Coordinate {
        self.state.selection_start
    }

    /// Ordered selection end.
    pub fn selection_end(&self) -> Coordinate {
        self.state.selection_end
    }

    pub(crate) fn sanitize_selection(&mut self) {
        self.state.selection_start = self.sanitize(self.state.selection_start);
        self.state.selection_end = self.sanitize(self.state.selection_end);
        if self.state.selection_start > self.state.selection_end {
            std::mem::swap(&mut self.state.selection_start, &mut self.state.selection_end);
        }
    }

    pub(crate) fn state_as_byte_indices(&self) -> EditorState {
        let cursor = self.get_cursor_position();
        let start = self.state.selection_start;
        let end = self.state.selection_end;
        EditorState {
            cursor: Coordinate::new(cursor.line, self.char_index_of(cursor)),
            selection_start: Coordinate::new(start.line, self.char_index_of(start)),
            selection_end: Coordinate::new(end.line, self.char_index_of(end)),
        }
    }

    pub(crate) fn apply_saved_state(&mut self, saved: &EditorState) {
        self.state.cursor = self.coordinate_from_byte_index(saved.cursor);
        self.state.selection_start = self.coordinate_from_byte_index(saved.selection_start);
        self.state.selection_end = self.coordinate_from_byte_index(saved.selection_end);
        if self.state.selection_start > self.state.selection_end {
            std::mem::swap(&mut self.state.selection_start, &mut self.state.selection_end);
        }
        self.cursor_position_changed = true;
    }

    pub(crate) fn ensure_cursor_visible(&mut self) {
        self.scroll_to_cursor = true;
    }

    fn reset_state(&mut self) {
        self.state = CursorState::default();
        self.breakpoints.clear();
        self.error_markers.clear();
    }

    // ---- movement -------------------------------------------------------

    fn fix_selection_after_move(&mut self, select: bool, old_pos: Coordinate) {
        if select {
            if old_pos == self.interactive_start {
                self.interactive_start = self.state.cursor;
            } else if old_pos == self.interactive_end {
                self.interactive_end = self.state.cursor;
            } else {
                self.interactive_start = self.state.cursor;
                self.interactive_end = old_pos;
            }
        } else {
            self.interactive_start = self.state.cursor;
            self.interactive_end = self.state.cursor;
        }

        self.set_selection(self.interactive_start, self.interactive_end, SelectionMode::Normal);
        self.ensure_cursor_visible();
    }

    /// Move the cursor up `amount` lines, preserving the visual column.
    pub fn move_up(&mut self, amount: usize, select: bool) {
        if amount == 0 {
            return;
        }

        let old_pos = self.state.cursor;
        if amount > old_pos.line {
            self.state.cursor.line = 0;
            self.state.cursor.column = 0;
        } else {
            self.state.cursor.line -= amount;
        }

        self.fix_selection_after_move(select, old_pos);
    }

    /// Move the cursor down `amount` lines, preserving the visual column.
    pub fn move_down(&mut self, amount: usize, select: bool) {
        if amount == 0 {
            return;
        }

        let old_pos = self.state.cursor;
        let max_line = self.max_line_index();

        if old_pos.line + amount > max_line {
            self.state.cursor.line = max_line;
            self.state.cursor.column = self.line_max_column_at(max_line);
        } else {
            self.state.cursor.line += amount;
        }

        self.fix_selection_after_move(select, old_pos);
    }

    /// Move the cursor left `amount` characters; wraps to the previous line
    /// at column 0 and snaps to word starts in `word_mode`.
    pub fn move_left(&mut self, amount: usize, select: bool, word_mode: bool) {
        if amount == 0 {
            return;
        }

        let old_pos = self.state.cursor;
        self.state.cursor = self.get_cursor_position();
        let mut line = self.state.cursor.line;
        let mut cindex = self.char_index_of(self.state.cursor);

        let mut remaining = amount;
        while remaining > 0 {
            remaining -= 1;

            if cindex == 0 {
                if line == 0 {
                    remaining = 0;
                } else {
                    line -= 1;
                    cindex = self.buffer.line(line).len();
                }
            } else {
                cindex -= 1;
                while cindex > 0 && is_utf8_continuation(self.buffer.line(line)[cindex].byte) {
                    cindex -= 1;
                }
            }

            self.state.cursor = Coordinate::new(line, self.column_of(line, cindex));
            if word_mode {
                self.state.cursor = self.find_word_start(self.state.cursor);
                cindex = self.char_index_of(self.state.cursor);
            }
        }

        self.state.cursor = Coordinate::new(line, self.column_of(line, cindex));
        self.fix_selection_after_move(select, old_pos);
    }

    /// Move the cursor right `amount` characters; wraps to the next line at
    /// end of line and snaps to the next word in `word_mode`.
    pub fn move_right(&mut self, amount: usize, select: bool, word_mode: bool) {
        let old_pos = self.state.cursor;
        if old_pos.line >= self.buffer.line_count() || amount == 0 {
            return;
        }

        let mut cindex = self.char_index_of(self.state.cursor);
        let mut remaining = amount;
        while remaining > 0 {
            remaining -= 1;

            let lindex = self.state.cursor.line;
            let line_len = self.buffer.line(lindex).len();

            if cindex >= line_len {
                if lindex < self.max_line_index() {
                    self.state.cursor.line = lindex + 1;
                    self.state.cursor.column = 0;
                    cindex = 0;
                } else {
                    return;
                }
            } else {
                cindex += utf8_sequence_length(self.buffer.line(lindex)[cindex].byte);
                self.state.cursor = Coordinate::new(lindex, self.column_of(lindex, cindex));

                if word_mode {
                    self.state.cursor = self.find_next_word(self.state.cursor);
                    cindex = self.char_index_of(self.state.cursor);
                }
            }
        }

        self.fix_selection_after_move(select, old_pos);
    }

    /// Jump to the beginning of the buffer.
    pub fn move_top(&mut self, select: bool) {
        let old_pos = self.state.cursor;
        self.set_cursor_position(Coordinate::new(0, 0));

        if select {
            self.interactive_end = old_pos;
            self.interactive_start = self.state.cursor;
        } else {
            self.interactive_start = self.state.cursor;
            self.interactive_end = self.state.cursor;
        }

        self.set_selection(self.interactive_start, self.interactive_end, SelectionMode::Normal);
        self.ensure_cursor_visible();
    }

    /// Jump to the end of the buffer.
    pub fn move_bottom(&mut self, select: bool) {
        let old_pos = self.get_cursor_position();
        let end_line = self.max_line_index();
        let new_pos = Coordinate::new(end_line, self.line_max_column_at(end_line));

        self.set_cursor_position(new_pos);
        if select {
            self.interactive_start = old_pos;
            self.interactive_end = new_pos;
        } else {
            self.interactive_start = new_pos;
            self.interactive_end = new_pos;
        }

        self.set_selection(self.interactive_start, self.interactive_end, SelectionMode::Normal);
        self.ensure_cursor_visible();
    }

    /// Jump to column 0 of the current line.
    pub fn move_home(&mut self, select: bool) {
        let old_pos = self.state.cursor;
        self.set_cursor_position(Coordinate::new(self.state.cursor.line, 0));
        self.fix_selection_after_move(select, old_pos);
    }

    /// Jump to the end of the current line.
    pub fn move_end(&mut self, select: bool) {
        let old_pos = self.state.cursor;
        self.set_cursor_position(Coordinate::new(
            self.state.cursor.line,
            self.line_max_column_at(old_pos.line),
        ));
        self.fix_selection_after_move(select, old_pos);
    }

    // ---- words ----------------------------------------------------------

    pub(crate) fn find_word_start(&self, from: Coordinate) -> Coordinate {
        if from.line >= self.buffer.line_count() {
            return from;
        }

        let line = self.buffer.line(from.line);
        let mut cindex = self.char_index_of(from);
        if cindex >= line.len() {
            return from;
        }

        while cindex > 0 && is_space_byte(line[cindex].byte) {
            cindex -= 1;
        }

        let cstart = line[cindex].color;
        while cindex > 0 {
            let glyph = line[cindex];
            if !is_utf8_continuation(glyph.byte) {
                if glyph.byte <= 32 && is_space_byte(glyph.byte) {
                    cindex += 1;
                    break;
                }
                if cstart != line[cindex - 1].color {
                    break;
                }
            }
            cindex -= 1;
        }

        Coordinate::new(from.line, self.column_of(from.line, cindex))
    }

    pub(crate) fn find_word_end(&self, from: Coordinate) -> Coordinate {
        if from.line >= self.buffer.line_count() {
            return from;
        }

        let line = self.buffer.line(from.line);
        let mut cindex = self.char_index_of(from);
        if cindex >= line.len() {
            return from;
        }

        let prevspace = is_space_byte(line[cindex].byte);
        let cstart = line[cindex].color;
        while cindex < line.len() {
            let glyph = line[cindex];
            if cstart != glyph.color {
                break;
            }
            if prevspace != is_space_byte(glyph.byte) {
                if is_space_byte(glyph.byte) {
                    while cindex < line.len() && is_space_byte(line[cindex].byte) {
                        cindex += 1;
                    }
                }
                break;
            }
            cindex += utf8_sequence_length(glyph.byte);
        }

        Coordinate::new(from.line, self.column_of(from.line, cindex))
    }

    pub(crate) fn find_next_word(&self, from: Coordinate) -> Coordinate {
        let mut at = from;
        if at.line >= self.buffer.line_count() {
            return at;
        }

        let mut cindex = self.char_index_of(from);
        let mut is_word = false;
        let mut skip = false;
        if cindex < self.buffer.line(at.line).len() {
            is_word = self.buffer.line(at.line)[cindex].byte.is_ascii_alphanumeric();
            skip = is_word;
        }

        while !is_word || skip {
            if at.line >= self.buffer.line_count() {
                let line_number = self.max_line_index();
                return Coordinate::new(line_number, self.line_max_column_at(line_number));
            }

            let line_len = self.buffer.line(at.line).len();
            if cindex < line_len {
                is_word = self.buffer.line(at.line)[cindex].byte.is_ascii_alphanumeric();

                if is_word && !skip {
                    return Coordinate::new(at.line, self.column_of(at.line, cindex));
                }
                if !is_word {
                    skip = false;
                }
                cindex += 1;
            } else {
                cindex = 0;
                at.line += 1;
                skip = false;
                is_word = false;
            }
        }

        at
    }

    pub(crate) fn is_on_word_boundary(&self, at: Coordinate) -> bool {
        if at.line >= self.buffer.line_count() || at.column == 0 {
            return true;
        }

        let line = self.buffer.line(at.line);
        let cindex = self.char_index_of(at);
        if cindex >= line.len() || cindex == 0 {
            return true;
        }

        if self.colorizer_enabled {
            return line[cindex].color != line[cindex - 1].color;
        }

        is_space_byte(line[cindex].byte) != is_space_byte(line[cindex - 1].byte)
    }

    /// The word under the cursor.
    pub fn get_word_under_cursor(&self) -> String {
        self.get_word_at(self.get_cursor_position())
    }

    /// The word at an arbitrary coordinate.
    pub fn get_word_at(&self, coords: Coordinate) -> String {
        if coords.line >= self.buffer.line_count() {
            return String::new();
        }

        let start = self.find_word_start(coords);
        let end = self.find_word_end(coords);
        let istart = self.char_index_of(start);
        let iend = self.char_index_of(end);

        let line = self.buffer.line(coords.line);
        let bytes: Vec<u8> = line[istart.min(line.len())..iend.min(line.len())]
            .iter()
            .map(|glyph| glyph.byte)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    // ---- line structure -------------------------------------------------

    /// Insert an empty line at `index`, shifting annotations below it.
    pub fn insert_line(&mut self, index: usize) -> Result<(), BufferFault> {
        if self.read_only {
            return Err(BufferFault::ReadOnly);
        }
        if index > self.buffer.line_count() {
            return Err(BufferFault::LineOutOfBounds {
                index,
                len: self.buffer.line_count(),
            });
        }

        self.insert_line_impl(index, Line::new());
        self.text_changed = true;
        self.sanitize_selection();
        self.state.cursor = self.sanitize(self.state.cursor);
        Ok(())
    }

    /// Remove the line at `index`. The buffer keeps its last line.
    pub fn remove_line(&mut self, index: usize) -> Result<(), BufferFault> {
        if self.read_only {
            return Err(BufferFault::ReadOnly);
        }
        if index >= self.buffer.line_count() || self.buffer.line_count() == 1 {
            return Err(BufferFault::LineOutOfBounds {
                index,
                len: self.buffer.line_count(),
            });
        }

        self.remove_line_impl(index);
        self.sanitize_selection();
        self.state.cursor = self.sanitize(self.state.cursor);
        Ok(())
    }

    /// Remove the lines in `[start, end_exclusive)`.
    pub fn remove_lines(&mut self, start: usize, end_exclusive: usize) -> Result<(), BufferFault> {
        if self.read_only {
            return Err(BufferFault::ReadOnly);
        }
        if start >= end_exclusive {
            return Ok(());
        }
        if end_exclusive > self.buffer.line_count()
            || end_exclusive - start >= self.buffer.line_count()
        {
            return Err(BufferFault::LineOutOfBounds {
                index: end_exclusive,
                len: self.buffer.line_count(),
            });
        }

        self.remove_lines_impl(start, end_exclusive);
        self.sanitize_selection();
        self.state.cursor = self.sanitize(self.state.cursor);
        Ok(())
    }

    fn insert_line_impl(&mut self, index: usize, line: Line) {
        annotations::shift_for_inserted_line(&mut self.error_markers, &mut self.breakpoints, index);
        self.buffer.insert_raw_line(index, line);
    }

    fn remove_line_impl(&mut self, index: usize) {
        debug_assert!(self.buffer.line_count() > 1);

        annotations::shift_for_removed_line(&mut self.error_markers, &mut self.breakpoints, index);

        if self.state.selection_start.line >= index {
            self.state.selection_start.line = self.state.selection_start.line.saturating_sub(1);
        }
        if self.state.selection_end.line >= index {
            self.state.selection_end.line = self.state.selection_end.line.saturating_sub(1);
        }
        if self.state.selection_start > self.state.selection_end {
            std::mem::swap(&mut self.state.selection_start, &mut self.state.selection_end);
        }

        self.buffer.remove_raw_lines(index, index + 1);
        self.text_changed = true;
    }

    fn remove_lines_impl(&mut self, start: usize, end: usize) {
        debug_assert!(end >= start);
        debug_assert!(self.buffer.line_count() > end - start);

        annotations::shift_for_removed_range(
            &mut self.error_markers,
            &mut self.breakpoints,
            start,
            end,
        );

        self.buffer.remove_raw_lines(start, end);
        let max_line = self.buffer.max_line_index();
        let count = end - start;

        for endpoint in [&mut self.state.selection_start, &mut self.state.selection_end] {
            if endpoint.line >= end {
                endpoint.line -= count;
            } else if endpoint.line >= start {
                endpoint.line = start;
            }
            endpoint.line = endpoint.line.min(max_line);
        }
        if self.state.selection_start > self.state.selection_end {
            std::mem::swap(&mut self.state.selection_start, &mut self.state.selection_end);
        }

        if self.state.cursor.line >= end {
            self.state.cursor.line -= count;
        } else if self.state.cursor.line >= start {
            self.state.cursor.line = start;
        }
        self.state.cursor.line = self.state.cursor.line.min(max_line);

        self.text_changed = true;
    }

    // ---- editing primitives ---------------------------------------------

    /// Remove everything in `[start, end)`.
    pub(crate) fn delete_range(&mut self, start: Coordinate, end: Coordinate) {
        debug_assert!(end >= start);
        debug_assert!(!self.read_only);
        if end <= start || start.line >= self.buffer.line_count() {
            return;
        }

        let start_index = self.char_index_of(start);
        let end_index = self.char_index_of(end);

        if start.line == end.line {
            let max_column = self.line_max_column_at(start.line);
            if end.column >= max_column {
                self.buffer.line_mut(start.line).truncate(start_index);
                if self.state.selection_start.column > start_index {
                    self.state.selection_start.column = start_index;
                }
                if self.state.selection_end.column > start_index {
                    self.state.selection_end.column = start_index;
                }
            } else {
                let start_column = self.column_of(start.line, start_index);
                let end_column = self.column_of(end.line, end_index);
                self.buffer.line_mut(start.line).drain(start_index..end_index);

                for endpoint in [&mut self.state.selection_start, &mut self.state.selection_end] {
                    if endpoint.column > start_column {
                        if endpoint.column <= end_column {
                            endpoint.column = start_column;
                        } else {
                            endpoint.column -= end_column - start_column;
                        }
                    }
                }
            }
        } else {
            let end_line = end.line.min(self.buffer.max_line_index());
            let tail = self.buffer.line_mut(end_line).split_off(end_index);
            self.buffer.line_mut(start.line).truncate(start_index);
            self.buffer.line_mut(start.line).extend(tail);

            if start.line < end_line {
                self.remove_lines_impl(start.line + 1, end_line + 1);
            }
        }

        self.text_changed = true;
        self.sanitize_selection();
    }

    /// Write `value` at `where_`, splitting lines at `\n`. Returns the
    /// number of new lines; `where_` ends up just past the inserted text.
    pub(crate) fn insert_text_at(&mut self, where_: &mut Coordinate, value: &str) -> usize {
        debug_assert!(!self.read_only);
        debug_assert!(where_.line < self.buffer.line_count());

        let mut cindex = self.char_index_of(*where_);
        let mut total_lines = 0;
        let bytes = value.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            let byte = bytes[i];

            if byte == b'\n' {
                if cindex < self.buffer.line(where_.line).len() {
                    let tail = self.buffer.line_mut(where_.line).split_off(cindex);
                    self.insert_line_impl(where_.line + 1, tail);
                } else {
                    self.insert_line_impl(where_.line + 1, Line::new());
                }
                where_.line += 1;
                where_.column = 0;
                cindex = 0;
                total_lines += 1;
                i += 1;
            } else if byte == b'\t' {
                self.buffer
                    .line_mut(where_.line)
                    .insert(cindex, Glyph::new(byte, PaletteIndex::Default));
                cindex += 1;
                where_.column += tab_stop_advance(where_.column, self.tab_size);
                i += 1;
            } else {
                let length = utf8_sequence_length(byte);
                let mut remaining = length;
                while remaining > 0 && i < bytes.len() {
                    self.buffer
                        .line_mut(where_.line)
                        .insert(cindex, Glyph::new(bytes[i], PaletteIndex::Default));
                    cindex += 1;
                    i += 1;
                    remaining -= 1;
                }
                where_.column += 1;
            }

            self.text_changed = true;
        }

        total_lines
    }

    /// Insert text at the cursor as one undoable step.
    pub fn insert_text(&mut self, value: &str) {
        if value.is_empty() || self.read_only {
            return;
        }

        let mut record = UndoRecord::default();
        record.store_before(self);

        let mut pos = self.get_cursor_position();
        let start = pos.min(self.state.selection_start);
        record.added_start = self.byte_coord(pos);

        let mut total_lines = pos.line - start.line;
        total_lines += self.insert_text_at(&mut pos, value);

        self.set_selection(pos, pos, SelectionMode::Normal);
        self.set_cursor_position(pos);

        record.added = value.to_string();
        record.added_end = self.byte_coord(self.get_cursor_position());
        record.store_after(self);
        self.add_undo(record);

        self.colorize_lines(start.line, total_lines + 2);
    }

    /// Type one code point. `\n` auto-indents, `\t` block-indents a
    /// selection, and overwrite mode replaces the character at the cursor.
    ///
    /// NUL and lone surrogates make the whole call a no-op.
    pub fn enter_character(&mut self, character: u32, shift: bool) {
        if self.read_only || character == 0 || encode_utf8(character).is_none() {
            return;
        }
        self.enter_character_impl(character, shift);
    }

    pub(crate) fn enter_character_impl(&mut self, character: u32, shift: bool) {
        debug_assert!(!self.read_only);
        debug_assert!(character != 0);

        let mut record = UndoRecord::default();
        record.store_before(self);

        if self.has_selection() {
            if character == u32::from(b'\t')
                && (self.state.selection_start.column == 0
                    || self.state.selection_start.line != self.state.selection_end.line)
            {
                self.block_indent(shift, record);
                return;
            }

            record.removed = self.get_selected_text();
            record.removed_start = self.byte_coord(self.state.selection_start);
            record.removed_end = self.byte_coord(self.state.selection_end);
            self.delete_selection();
        }

        let coord = self.get_cursor_position();
        record.added_start = self.byte_coord(coord);

        if character == u32::from(b'\n') {
            let cindex = self.char_index_of(coord);

            let mut whitespace: Line = Vec::new();
            {
                let line = self.buffer.line(coord.line);
                let mut it = 0;
                while it < line.len() && it < coord.column && is_blank_byte(line[it].byte) {
                    whitespace.push(line[it]);
                    it += 1;
                }
            }

            let mut added = String::from("\n");
            for glyph in &whitespace {
                added.push(glyph.byte as char);
            }

            self.insert_line_impl(coord.line + 1, Line::new());
            let tail = self.buffer.line_mut(coord.line).split_off(cindex);
            let whitespace_len = whitespace.len();
            {
                let new_line = self.buffer.line_mut(coord.line + 1);
                new_line.extend(whitespace);
                new_line.extend(tail);
            }

            record.added = added;
            let column = self.column_of(coord.line + 1, whitespace_len);
            self.set_cursor_position(Coordinate::new(coord.line + 1, column));

            if !self.has_selection() {
                self.clear_selection();
            }
        } else {
            let Some((bytes, length)) = encode_utf8(character) else {
                return;
            };

            let mut cindex = self.char_index_of(coord);

            if self.overwrite && cindex < self.buffer.line(coord.line).len() {
                let char_length = utf8_sequence_length(self.buffer.line(coord.line)[cindex].byte);

                record.removed_start = self.byte_coord(coord);
                record.removed_end = Coordinate::new(coord.line, cindex + char_length);

                let line = self.buffer.line_mut(coord.line);
                let removed_end_index = (cindex + char_length).min(line.len());
                let removed_bytes: Vec<u8> = line[cindex..removed_end_index]
                    .iter()
                    .map(|glyph| glyph.byte)
                    .collect();
                record.removed = String::from_utf8_lossy(&removed_bytes).into_owned();
                line.drain(cindex..removed_end_index);
            }

            {
                let line = self.buffer.line_mut(coord.line);
                for &byte in &bytes[..length] {
                    line.insert(cindex, Glyph::new(byte, PaletteIndex::Default));
                    cindex += 1;
                }
            }
            record.added = String::from_utf8_lossy(&bytes[..length]).into_owned();

            let column = self.column_of(coord.line, cindex);
            self.set_cursor_position(Coordinate::new(coord.line, column));
        }

        self.text_changed = true;
        self.sanitize_selection();

        record.added_end = self.byte_coord(self.get_cursor_position());
        record.store_after(self);
        self.add_undo(record);

        self.colorize_lines(coord.line, 3);
    }

    /// Indent (or outdent with `shift`) every line touched by the selection.
    fn block_indent(&mut self, shift: bool, mut record: UndoRecord) {
        let mut start = self.state.selection_start;
        let mut end = self.state.selection_end;
        let original_end = end;

        start.column = 0;
        if end.column == 0 && end.line > 0 {
            end.line -= 1;
        }
        if end.line >= self.buffer.line_count() {
            end.line = self.buffer.max_line_index();
        }
        end.column = self.line_max_column_at(end.line);

        record.removed_start = self.byte_coord(start);
        record.removed_end = self.byte_coord(end);
        record.removed = self.text_between(start, end);

        let tab_size = self.tab_size;
        let mut modified = false;

        for line_index in start.line..=end.line {
            let line = self.buffer.line_mut(line_index);
            if shift {
                if line.is_empty() {
                    continue;
                }
                if line[0].byte == b'\t' {
                    line.remove(0);
                    modified = true;
                } else {
                    let mut removed = 0;
                    while removed < tab_size && !line.is_empty() && line[0].byte == b' ' {
                        line.remove(0);
                        removed += 1;
                        modified = true;
                    }
                }
            } else {
                line.insert(0, Glyph::new(b'\t', PaletteIndex::Background));
                modified = true;
            }
        }

        if modified {
            start = Coordinate::new(start.line, self.column_of(start.line, 0));
            let range_end;
            if original_end.column != 0 {
                end = Coordinate::new(end.line, self.line_max_column_at(end.line));
                range_end = end;
                record.added = self.text_between(start, end);
            } else {
                end = Coordinate::new(original_end.line, 0);
                range_end = Coordinate::new(
                    end.line - 1,
                    self.line_max_column_at(end.line - 1),
                );
                record.added = self.text_between(start, range_end);
            }

            record.added_start = self.byte_coord(start);
            record.added_end = self.byte_coord(range_end);
            self.state.selection_start = start;
            self.state.selection_end = end;

            record.store_after(self);
            self.add_undo(record);

            self.text_changed = true;
            self.ensure_cursor_visible();
        }
    }

    /// Delete backwards: the selection, a line join at column 0, one tab
    /// glyph, or one (possibly multi-byte) character.
    pub fn backspace(&mut self) {
        if !self.read_only {
            self.backspace_impl();
        }
    }

    pub(crate) fn backspace_impl(&mut self) {
        debug_assert!(!self.read_only);

        let mut record = UndoRecord::default();
        record.store_before(self);

        if self.has_selection() {
            record.removed = self.get_selected_text();
            record.removed_start = self.byte_coord(self.state.selection_start);
            record.removed_end = self.byte_coord(self.state.selection_end);
            self.delete_selection();
        } else {
            let pos = self.get_cursor_position();
            self.set_cursor_position(pos);

            if self.state.cursor.column == 0 {
                if self.state.cursor.line == 0 {
                    return;
                }

                let prev_line = pos.line - 1;
                record.removed = String::from("\n");
                let removed_at = Coordinate::new(prev_line, self.line_max_column_at(prev_line));
                record.removed_start = self.byte_coord(removed_at);
                let mut removed_end = removed_at;
                self.advance(&mut removed_end);
                record.removed_end = self.byte_coord(removed_end);

                let prev_size = self.line_max_column_at(prev_line);
                let moved: Line = std::mem::take(self.buffer.line_mut(pos.line));
                self.buffer.line_mut(prev_line).extend(moved);

                annotations::migrate_for_joined_line(
                    &mut self.error_markers,
                    &mut self.breakpoints,
                    pos.line,
                );
                self.remove_line_impl(pos.line);

                self.state.cursor.line = prev_line;
                self.state.cursor.column = prev_size;
            } else {
                let cindex = self.char_index_of(pos);
                debug_assert!(cindex > 0);
                let mut cindex = cindex - 1;

                if self.buffer.line(pos.line)[cindex].byte == b'\t' {
                    record.removed = String::from("\t");
                    record.removed_start = Coordinate::new(pos.line, cindex);
                    record.removed_end = self.byte_coord(pos);

                    self.buffer.line_mut(pos.line).remove(cindex);
                    self.state.cursor.column = self.column_of(pos.line, cindex);
                } else {
                    let cend = cindex + 1;
                    while cindex > 0
                        && is_utf8_continuation(self.buffer.line(pos.line)[cindex].byte)
                    {
                        cindex -= 1;
                    }

                    record.removed_start = Coordinate::new(pos.line, cindex);
                    record.removed_end = Coordinate::new(pos.line, cend);
                    {
                        let line = self.buffer.line_mut(pos.line);
                        let removed_bytes: Vec<u8> =
                            line[cindex..cend].iter().map(|glyph| glyph.byte).collect();
                        record.removed = String::from_utf8_lossy(&removed_bytes).into_owned();
                        line.drain(cindex..cend);
                    }
                    self.state.cursor.column = pos.column - 1;
                }
            }

            self.text_changed = true;
            self.ensure_cursor_visible();
            self.colorize_lines(self.state.cursor.line, 2);
        }

        self.sanitize_selection();
        record.store_after(self);
        self.add_undo(record);
    }

    /// Delete forwards: the selection, a line join at end of line, or one
    /// (possibly multi-byte) character.
    pub fn delete(&mut self) {
        if self.read_only {
            return;
        }

        let mut record = UndoRecord::default();
        record.store_before(self);

        if self.has_selection() {
            record.removed = self.get_selected_text();
            record.removed_start = self.byte_coord(self.state.selection_start);
            record.removed_end = self.byte_coord(self.state.selection_end);
            self.delete_selection();
        } else {
            let pos = self.get_cursor_position();
            self.set_cursor_position(pos);

            if pos.column == self.line_max_column_at(pos.line) {
                if pos.line == self.max_line_index() {
                    return;
                }

                record.removed = String::from("\n");
                record.removed_start = self.byte_coord(pos);
                let mut removed_end = pos;
                self.advance(&mut removed_end);
                record.removed_end = self.byte_coord(removed_end);

                let next: Line = std::mem::take(self.buffer.line_mut(pos.line + 1));
                self.buffer.line_mut(pos.line).extend(next);

                annotations::migrate_for_joined_line(
                    &mut self.error_markers,
                    &mut self.breakpoints,
                    pos.line + 1,
                );
                self.remove_line_impl(pos.line + 1);
            } else {
                if self.buffer.line(pos.line).is_empty() {
                    return;
                }

                let cindex = self.char_index_of(pos);
                let length = utf8_sequence_length(self.buffer.line(pos.line)[cindex].byte);
                record.removed_start = Coordinate::new(pos.line, cindex);
                record.removed_end = Coordinate::new(pos.line, cindex + length);

                {
                    let line = self.buffer.line_mut(pos.line);
                    let end_index = (cindex + length).min(line.len());
                    let removed_bytes: Vec<u8> = line[cindex..end_index]
                        .iter()
                        .map(|glyph| glyph.byte)
                        .collect();
                    record.removed = String::from_utf8_lossy(&removed_bytes).into_owned();
                    line.drain(cindex..end_index);
                }
            }

            self.text_changed = true;
            self.colorize_lines(pos.line, 2);
        }

        self.sanitize_selection();
        record.store_after(self);
        self.add_undo(record);
    }

    pub(crate) fn delete_selection(&mut self) {
        if self.state.selection_end == self.state.selection_start {
            return;
        }

        let start = self.state.selection_start;
        let end = self.state.selection_end;
        self.delete_range(start, end);

        self.set_selection(start, start, SelectionMode::Normal);
        self.set_cursor_position(start);
        self.colorize_lines(start.line, 2);
        self.text_changed = true;
    }

    // ---- clipboard ------------------------------------------------------

    /// Copy the selection (or the current line) to the clipboard.
    pub fn copy(&self, clipboard: &mut dyn Clipboard) {
        if self.has_selection() {
            clipboard.set_clipboard_text(&self.get_selected_text());
        } else {
            let line = self.get_cursor_position().line;
            clipboard.set_clipboard_text(&self.buffer.line_text(line));
        }
    }

    /// Cut the selection to the clipboard. Degrades to a copy while
    /// read-only.
    pub fn cut(&mut self, clipboard: &mut dyn Clipboard) {
        if self.read_only {
            self.copy(clipboard);
            return;
        }
        if !self.has_selection() {
            return;
        }

        let mut record = UndoRecord::default();
        record.store_before(self);
        record.removed = self.get_selected_text();
        record.removed_start = self.byte_coord(self.state.selection_start);
        record.removed_end = self.byte_coord(self.state.selection_end);

        self.copy(clipboard);
        self.delete_selection();

        record.store_after(self);
        self.add_undo(record);
    }

    /// Paste the clipboard over the selection. An empty clipboard is a
    /// no-op.
    pub fn paste(&mut self, clipboard: &mut dyn Clipboard) {
        if self.read_only {
            return;
        }
        let Some(clip_text) = clipboard.clipboard_text() else {
            return;
        };
        if clip_text.is_empty() {
            return;
        }

        let mut record = UndoRecord::default();
        record.store_before(self);

        if self.has_selection() {
            record.removed = self.get_selected_text();
            record.removed_start = self.byte_coord(self.state.selection_start);
            record.removed_end = self.byte_coord(self.state.selection_end);
            self.delete_selection();
        }

        let mut pos = self.get_cursor_position();
        let start = pos;
        record.added = clip_text.clone();
        record.added_start = self.byte_coord(pos);

        let total_lines = self.insert_text_at(&mut pos, &clip_text);
        self.set_selection(pos, pos, SelectionMode::Normal);
        self.set_cursor_position(pos);
        self.colorize_lines(start.line, total_lines + 2);

        record.added_end = self.byte_coord(self.get_cursor_position());
        record.store_after(self);
        self.add_undo(record);
    }

    // ---- undo / redo ----------------------------------------------------

    /// Whether an undo step is available. Always false while read-only.
    pub fn can_undo(&self) -> bool {
        !self.read_only && self.undo_index != 0
    }

    /// Whether a redo step is available. Always false while read-only.
    pub fn can_redo(&self) -> bool {
        !self.read_only && self.undo_index < self.undo_buffer.len()
    }

    /// Undo up to `steps` records.
    pub fn undo(&mut self, steps: usize) {
        let mut steps = steps;
        while self.can_undo() && steps > 0 {
            self.undo_index -= 1;
            let record = self.undo_buffer[self.undo_index].clone();
            record.undo(self);
            steps -= 1;
        }
    }

    /// Redo up to `steps` records.
    pub fn redo(&mut self, steps: usize) {
        let mut steps = steps;
        while self.can_redo() && steps > 0 {
            let record = self.undo_buffer[self.undo_index].clone();
            record.redo(self);
            self.undo_index += 1;
            steps -= 1;
        }
    }

    /// Depth of the undo stack.
    pub fn undo_count(&self) -> usize {
        self.undo_buffer.len()
    }

    /// Current position inside the undo stack.
    pub fn undo_index(&self) -> usize {
        self.undo_index
    }

    pub(crate) fn add_undo(&mut self, record: UndoRecord) {
        debug_assert!(!self.read_only);
        debug_assert!(record.added_start <= record.added_end);
        debug_assert!(record.removed_start <= record.removed_end);
        if record.is_empty() {
            return;
        }

        self.undo_buffer.truncate(self.undo_index);
        self.undo_buffer.push(record);
        self.undo_index += 1;
        trace!("undo record #{} recorded", self.undo_index);

        #[cfg(feature = "verify-undo")]
        self.verify_undo_roundtrip();
    }

    /// Replay the newest record (undo then redo) and assert the round trip
    /// leaves buffer and cursor state bit-identical.
    #[cfg(feature = "verify-undo")]
    fn verify_undo_roundtrip(&mut self) {
        let text_before = self.get_text();
        let state_before = self.state_as_byte_indices();

        self.undo(1);
        self.redo(1);

        let text_after = self.get_text();
        let state_after = self.state_as_byte_indices();

        if text_before != text_after || state_before != state_after {
            log::error!(
                "undo round trip diverged: text match: {}, state match: {}",
                text_before == text_after,
                state_before == state_after
            );
            debug_assert!(false, "undo round trip diverged");
        }
    }

    // ---- annotations ----------------------------------------------------

    /// Replace all error markers. Rejected wholesale if any key is not a
    /// valid 1-based line.
    pub fn set_error_markers(&mut self, markers: ErrorMarkers) {
        for &line in markers.keys() {
            if line == 0 || line > self.buffer.line_count() {
                warn!("rejecting error markers: line {line} is out of range");
                return;
            }
        }
        self.error_markers = markers;
    }

    /// Add (or append to) the error marker on a 1-based line.
    pub fn add_error_marker(&mut self, line_number: usize, message: &str) {
        if line_number == 0 || line_number > self.buffer.line_count() {
            return;
        }

        self.error_markers
            .entry(line_number)
            .and_modify(|existing| {
                existing.push('\n');
                existing.push_str(message);
            })
            .or_insert_with(|| message.to_string());
    }

    /// Drop every error marker.
    pub fn clear_error_markers(&mut self) {
        self.error_markers.clear();
    }

    /// The error-marker map.
    pub fn error_markers(&self) -> &ErrorMarkers {
        &self.error_markers
    }

    /// Replace all breakpoints. Rejected wholesale if any line is invalid.
    pub fn set_breakpoints(&mut self, breakpoints: Breakpoints) {
        for &line in &breakpoints {
            if line == 0 || line > self.buffer.line_count() {
                warn!("rejecting breakpoints: line {line} is out of range");
                return;
            }
        }
        self.breakpoints = breakpoints;
    }

    /// Set a breakpoint on a 1-based line. Returns whether it was added.
    pub fn add_breakpoint(&mut self, line_number: usize) -> bool {
        if line_number == 0 || line_number > self.buffer.line_count() {
            return false;
        }
        self.breakpoints.insert(line_number)
    }

    /// Remove a breakpoint. Returns whether one was there.
    pub fn remove_breakpoint(&mut self, line_number: usize) -> bool {
        self.breakpoints.remove(&line_number)
    }

    /// Toggle a breakpoint. Returns whether it is set afterwards.
    pub fn toggle_breakpoint(&mut self, line_number: usize) -> bool {
        if self.breakpoints.remove(&line_number) {
            return false;
        }
        self.add_breakpoint(line_number)
    }

    /// Drop every breakpoint.
    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// The breakpoint set.
    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    // ---- internals shared with sibling modules --------------------------

    pub(crate) fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut TextBuffer {
        &mut self.buffer
    }

    pub(crate) fn parse_source(&mut self, source: &str) -> ParseOutcome {
        self.parser.parse(source)
    }

    pub(crate) fn reset_glyph_colors(&mut self) {
        for line in self.buffer.lines_mut() {
            for glyph in line.iter_mut() {
                glyph.color = PaletteIndex::Default;
            }
        }
    }

    // ---- diagnostics ----------------------------------------------------

    /// Check the editor invariants. Asserts in debug builds, best effort in
    /// release.
    pub fn verify_internal_state(&self) {
        debug_assert!(self.buffer.line_count() >= 1);

        debug_assert!(self.state.selection_end >= self.state.selection_start);
        debug_assert!(self.state.selection_start.line < self.buffer.line_count());
        debug_assert!(self.state.selection_end.line < self.buffer.line_count());
        debug_assert!(self.state.cursor.line < self.buffer.line_count());

        debug_assert!(
            self.state.selection_start.column
                <= self.line_max_column_at(self.state.selection_start.line)
        );
        debug_assert!(
            self.state.selection_end.column
                <= self.line_max_column_at(self.state.selection_end.line)
        );

        for &breakpoint in &self.breakpoints {
            debug_assert!(breakpoint >= 1);
            debug_assert!(breakpoint <= self.buffer.line_count());
        }

        for &line_number in self.error_markers.keys() {
            debug_assert!(line_number >= 1);
            debug_assert!(line_number <= self.buffer.line_count());
        }
    }

    /// A human-readable snapshot of the full editor state, for tests and
    /// the debug panel.
    pub fn get_editor_dump(&self) -> String {
        let mut out = String::new();
        let cursor_pos = self.get_cursor_position();

        out.push_str("State:\n");
        let _ = writeln!(
            out,
            "Cursor position: {}, {}",
            self.state.cursor.line, self.state.cursor.column
        );
        let _ = writeln!(
            out,
            "Actual cursor position: {}, {}",
            cursor_pos.line, cursor_pos.column
        );
        let _ = writeln!(
            out,
            "Selection start: {}, {}",
            self.state.selection_start.line, self.state.selection_start.column
        );
        let _ = writeln!(
            out,
            "Selection end: {}, {}",
            self.state.selection_end.line, self.state.selection_end.column
        );
        let _ = writeln!(out, "Has selection: {}", self.has_selection());

        out.push_str("\nOptions:\n");
        let _ = writeln!(out, "Line spacing: {}", self.line_spacing);
        let _ = writeln!(out, "Tab size: {}", self.tab_size);
        let _ = writeln!(out, "Overwrite: {}", self.overwrite);
        let _ = writeln!(out, "Read only: {}", self.read_only);
        let _ = writeln!(out, "Show whitespaces: {}", self.show_whitespaces);
        let _ = writeln!(out, "Selection mode: {:?}", self.selection_mode);

        out.push_str("\nText:\n");
        let _ = writeln!(out, "Total lines: {}", self.total_lines());
        let _ = writeln!(out, "{:?}", self.get_text());
        if self.has_selection() {
            let _ = writeln!(out, "Selected text: {:?}", self.get_selected_text());
        } else {
            out.push_str("Selected text: N/A\n");
        }
        let _ = writeln!(out, "Current line text: {:?}", self.get_current_line_text());
        let _ = writeln!(out, "Word under cursor: {:?}", self.get_word_under_cursor());

        out.push_str("\nError markers:\n");
        if self.error_markers.is_empty() {
            out.push_str("None\n");
        }
        for (line, message) in &self.error_markers {
            let _ = writeln!(out, "{line:02}: {message}");
        }

        out.push_str("\nBreak points:\n");
        if self.breakpoints.is_empty() {
            out.push_str("None\n");
        }
        for breakpoint in &self.breakpoints {
            let _ = writeln!(out, "{breakpoint:02}");
        }

        out.push_str("\nUndo/Redo:\n");
        let _ = writeln!(out, "Can undo: {}", self.can_undo());
        let _ = writeln!(out, "Can redo: {}", self.can_redo());
        let _ = writeln!(out, "Undo index: {}", self.undo_index);

        out.push_str("UndoBuffer:\n");
        if self.undo_buffer.is_empty() {
            out.push_str("Empty\n");
        }
        for (index, record) in self.undo_buffer.iter().enumerate() {
            let _ = writeln!(out, "#{index:02} UndoRecord:");
            if !record.added.is_empty() {
                let _ = writeln!(
                    out,
                    "Added: {:?} from {}, {} to {}, {}",
                    record.added,
                    record.added_start.line,
                    record.added_start.column,
                    record.added_end.line,
                    record.added_end.column
                );
            }
            if !record.removed.is_empty() {
                let _ = writeln!(
                    out,
                    "Removed: {:?} from {}, {} to {}, {}",
                    record.removed,
                    record.removed_start.line,
                    record.removed_start.column,
                    record.removed_end.line,
                    record.removed_end.column
                );
            }
            let _ = writeln!(
                out,
                "State before:\nCursor position: {}, {}\nSelection start: {}, {}\nSelection end: {}, {}",
                record.before.cursor.line,
                record.before.cursor.column,
                record.before.selection_start.line,
                record.before.selection_start.column,
                record.before.selection_end.line,
                record.before.selection_end.column
            );
            let _ = writeln!(
                out,
                "State after:\nCursor position: {}, {}\nSelection start: {}, {}\nSelection end: {}, {}",
                record.after.cursor.line,
                record.after.cursor.column,
                record.after.selection_start.line,
                record.after.selection_start.column,
                record.after.selection_end.line,
                record.after.selection_end.column
            );
        }

        out
    }
}
