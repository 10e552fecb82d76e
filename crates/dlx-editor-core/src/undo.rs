//! The undo engine.
//!
//! Every user-level mutation is summarized as one [`UndoRecord`]: the text it
//! added, the text it removed, and the full cursor state before and after.
//! Records never point into the glyph vectors; all saved coordinates keep
//! their **byte index** in the `column` field so a later tab-size change
//! cannot invalidate a replay. The visual columns are recomputed at apply
//! time against the buffer as it exists then.

use crate::coords::Coordinate;
use crate::editor::Editor;

/// Cursor and selection, captured together.
///
/// Inside a stored [`UndoRecord`] the `column` fields hold byte indices, not
/// visual columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditorState {
    /// Cursor position.
    pub cursor: Coordinate,
    /// Ordered selection start.
    pub selection_start: Coordinate,
    /// Ordered selection end.
    pub selection_end: Coordinate,
}

/// A reversible description of a single user-visible edit.
///
/// Either patch may be empty: an insertion has no removed patch, a deletion
/// no added patch, a replacement has both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoRecord {
    /// Text the edit inserted.
    pub added: String,
    /// Where the added text begins (byte-index column).
    pub added_start: Coordinate,
    /// Where the added text ends (byte-index column).
    pub added_end: Coordinate,
    /// Text the edit removed.
    pub removed: String,
    /// Where the removed text began (byte-index column).
    pub removed_start: Coordinate,
    /// Where the removed text ended (byte-index column).
    pub removed_end: Coordinate,
    /// Cursor state before the edit.
    pub before: EditorState,
    /// Cursor state after the edit.
    pub after: EditorState,
}

impl UndoRecord {
    /// Capture the pre-edit cursor state from `editor`.
    pub(crate) fn store_before(&mut self, editor: &Editor) {
        self.before = editor.state_as_byte_indices();
    }

    /// Capture the post-edit cursor state from `editor`.
    pub(crate) fn store_after(&mut self, editor: &Editor) {
        self.after = editor.state_as_byte_indices();
    }

    /// True when neither patch carries any text.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Apply this record in inverse direction: delete what was added,
    /// re-insert what was removed, restore the pre-edit cursor state.
    pub(crate) fn undo(&self, editor: &mut Editor) {
        if !self.added.is_empty() {
            let start = editor.coordinate_from_byte_index(self.added_start);
            let end = editor.coordinate_from_byte_index(self.added_end);
            editor.delete_range(start, end);
            editor.colorize_lines(
                self.added_start.line,
                self.added_end.line - self.added_start.line + 2,
            );
        }

        if !self.removed.is_empty() {
            let mut start = editor.coordinate_from_byte_index(self.removed_start);
            editor.insert_text_at(&mut start, &self.removed);
            editor.colorize_lines(
                self.removed_start.line,
                self.removed_end.line - self.removed_start.line + 2,
            );
        }

        editor.apply_saved_state(&self.before);
        editor.ensure_cursor_visible();
    }

    /// Apply this record in forward direction: delete what was removed,
    /// re-insert what was added, restore the post-edit cursor state.
    pub(crate) fn redo(&self, editor: &mut Editor) {
        if !self.removed.is_empty() {
            let start = editor.coordinate_from_byte_index(self.removed_start);
            let end = editor.coordinate_from_byte_index(self.removed_end);
            editor.delete_range(start, end);
            editor.colorize_lines(
                self.removed_start.line,
                self.removed_end.line - self.removed_start.line + 2,
            );
        }

        if !self.added.is_empty() {
            let mut start = editor.coordinate_from_byte_index(self.added_start);
            editor.insert_text_at(&mut start, &self.added);
            editor.colorize_lines(
                self.added_start.line,
                self.added_end.line - self.added_start.line + 2,
            );
        }

        editor.apply_saved_state(&self.after);
        editor.ensure_cursor_visible();
    }
}
