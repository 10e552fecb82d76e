#![warn(missing_docs)]
//! A headless, colorized code editor core for DLX assembly.
//!
//! # Overview
//!
//! `dlx-editor-core` is the text-buffer state machine behind an
//! immediate-mode editor widget: lines of color-tagged glyphs, a cursor and
//! selection in visual coordinates, a byte-indexed undo history, line
//! annotations (breakpoints and error markers), and a colorizer that paints
//! glyphs from an external token stream.
//!
//! It draws nothing itself. A host implements the traits in [`host`]
//! (clipboard, font metrics, draw list, scroll window, input, clock) and
//! calls [`Editor::render`] once per frame; everything else is plain
//! synchronous state manipulation that works without any UI at all.
//!
//! # Architecture layers
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Editor API (text, cursor, edit, undo)       │  ← public surface
//! ├──────────────────────────────────────────────┤
//! │  Input dispatch & render driver (host traits)│  ← one call per frame
//! ├──────────────────────────────────────────────┤
//! │  Colorizer driver (ProgramParser seam)       │  ← token stream → colors
//! ├──────────────────────────────────────────────┤
//! │  Coordinates (visual column ⇄ byte index)    │  ← tab-aware conversion
//! ├──────────────────────────────────────────────┤
//! │  Glyph buffer (lines of byte + color tag)    │  ← storage
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Coordinate spaces
//!
//! A cursor position is a `(line, visual column)` pair: tabs expand to the
//! next multiple of the tab size and a multi-byte UTF-8 character is one
//! column wide. Byte indices appear in exactly two places: the coordinate
//! conversions in [`coords`], and saved undo records, which keep byte
//! indices so a tab-size change never invalidates the history.
//!
//! # Quick start
//!
//! ```rust
//! use dlx_editor_core::{Coordinate, Editor, NullParser};
//!
//! let mut editor = Editor::new(Box::new(NullParser));
//! editor.set_text("ADD R1 R2 R3\nHALT");
//!
//! editor.set_cursor_position(Coordinate::new(1, 0));
//! editor.enter_character('\n' as u32, false);
//! assert_eq!(editor.get_text(), "ADD R1 R2 R3\n\nHALT");
//!
//! editor.undo(1);
//! assert_eq!(editor.get_text(), "ADD R1 R2 R3\nHALT");
//! ```
//!
//! # Module description
//!
//! - [`buffer`] - glyph and line storage
//! - [`coords`] - visual column ⇄ byte index conversion and sanitation
//! - [`editor`] - the state machine: editing, selection, movement, undo
//! - [`undo`] - record format and replay
//! - [`annotations`] - breakpoints and error markers (1-based lines)
//! - [`colorize`] - the parser seam and token-driven recoloring
//! - [`palette`] - color tags and palette presets
//! - [`host`] - everything the embedding UI must provide
//! - [`render`] - the per-frame render driver
//! - [`input`] - keyboard and mouse dispatch

pub mod annotations;
pub mod buffer;
pub mod colorize;
pub mod coords;
pub mod editor;
pub mod host;
mod input;
pub mod palette;
mod render;
pub mod undo;

pub use annotations::{Breakpoints, ErrorMarkers};
pub use buffer::{BufferFault, Glyph, Line, TextBuffer};
pub use colorize::{NullParser, ParseDiagnostic, ParseOutcome, ProgramParser, SourceToken, TokenKind};
pub use coords::Coordinate;
pub use editor::{CursorState, Editor, MAX_TAB_SIZE, MIN_TAB_SIZE, SelectionMode};
pub use host::{
    Clipboard, DrawRecord, DrawSurface, EditorHost, EditorKey, EditorWindow, FontMetrics,
    InputSource, MockHost, Modifiers, Vec2,
};
pub use palette::{Palette, PaletteIndex};
pub use undo::{EditorState, UndoRecord};
