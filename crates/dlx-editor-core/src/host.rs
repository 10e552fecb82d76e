//! Host interfaces.
//!
//! The editor is headless: everything platform-specific arrives through the
//! traits in this module. Hosts implement them over their immediate-mode UI
//! library; tests use [`MockHost`], which records draw commands and replays
//! scripted input.
//!
//! All host resources are scoped per call: the clipboard is only touched
//! inside copy/cut/paste, the clock is only read while rendering, and font
//! metrics are only read during rendering and hit-testing.

use std::collections::HashSet;
use unicode_width::UnicodeWidthStr;

/// A 2D point or extent in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vec2 {
    /// Create a new vector.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Modifier key state for one input frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Shift held.
    pub shift: bool,
    /// Control held.
    pub ctrl: bool,
    /// Alt (option) held.
    pub alt: bool,
    /// Super (command) held.
    pub super_key: bool,
    /// True when the host follows macOS conventions, where `super` plays
    /// the role `ctrl` plays elsewhere (and `ctrl` stands in for `alt`).
    pub mac_shortcuts: bool,
}

impl Modifiers {
    /// The "primary" shortcut modifier: `super` on macOS, `ctrl` elsewhere.
    pub fn command(&self) -> bool {
        if self.mac_shortcuts { self.super_key } else { self.ctrl }
    }

    /// The "secondary" modifier: `ctrl` on macOS, `alt` elsewhere.
    pub fn option(&self) -> bool {
        if self.mac_shortcuts { self.ctrl } else { self.alt }
    }
}

/// Non-character keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKey {
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Home.
    Home,
    /// End.
    End,
    /// Insert.
    Insert,
    /// Forward delete.
    Delete,
    /// Backspace.
    Backspace,
    /// Return.
    Enter,
    /// Keypad return.
    KeypadEnter,
    /// Tab.
    Tab,
    /// The `A` key (select all).
    A,
    /// The `C` key (copy).
    C,
    /// The `V` key (paste).
    V,
    /// The `X` key (cut).
    X,
    /// The `Y` key (redo).
    Y,
    /// The `Z` key (undo).
    Z,
}

/// Clipboard access.
pub trait Clipboard {
    /// Current clipboard contents, if any.
    fn clipboard_text(&mut self) -> Option<String>;
    /// Replace the clipboard contents.
    fn set_clipboard_text(&mut self, text: &str);
}

/// Font measurements for the fixed-pitch editor font.
pub trait FontMetrics {
    /// Advance width of `text` in pixels.
    fn advance_width(&self, text: &str) -> f32;
    /// Height of one text row in pixels.
    fn line_height(&self) -> f32;
    /// Distance from the top of a row to the baseline.
    fn ascent(&self) -> f32;
}

/// Draw-list primitives the render pass emits.
pub trait DrawSurface {
    /// Axis-aligned filled rectangle.
    fn filled_rect(&mut self, min: Vec2, max: Vec2, color: u32);
    /// Axis-aligned rectangle outline.
    fn rect(&mut self, min: Vec2, max: Vec2, color: u32);
    /// Line segment.
    fn line_segment(&mut self, from: Vec2, to: Vec2, color: u32);
    /// Filled circle.
    fn filled_circle(&mut self, center: Vec2, radius: f32, color: u32);
    /// A run of text at `pos` (top-left).
    fn text(&mut self, pos: Vec2, color: u32, text: &str);
}

/// Scroll container and window queries.
pub trait EditorWindow {
    /// Open the editor's scrollable child region.
    fn begin_child(&mut self, id: &str, size: Vec2, border: bool);
    /// Close the child region.
    fn end_child(&mut self);
    /// Size of the visible content region.
    fn content_size(&self) -> Vec2;
    /// Size of the window holding the editor.
    fn window_size(&self) -> Vec2;
    /// Whether the editor window has keyboard focus.
    fn is_focused(&self) -> bool;
    /// Whether the mouse is over the editor window.
    fn is_hovered(&self) -> bool;
    /// Current horizontal scroll offset.
    fn scroll_x(&self) -> f32;
    /// Current vertical scroll offset.
    fn scroll_y(&self) -> f32;
    /// Set the horizontal scroll offset.
    fn set_scroll_x(&mut self, x: f32);
    /// Set the vertical scroll offset.
    fn set_scroll_y(&mut self, y: f32);
    /// Switch the mouse cursor to the text-input shape.
    fn use_text_cursor(&mut self);
}

/// Keyboard, mouse, and clock state for one frame.
pub trait InputSource {
    /// Modifier keys held this frame.
    fn modifiers(&self) -> Modifiers;
    /// Whether `key` was pressed this frame.
    fn is_key_pressed(&self, key: EditorKey) -> bool;
    /// Drain the queued text input. Values are Unicode code points; lone
    /// UTF-16 surrogates may appear and are rejected downstream.
    fn drain_characters(&mut self) -> Vec<u32>;
    /// Mouse position in content-local pixels (scroll already applied).
    fn mouse_position(&self) -> Vec2;
    /// Left button pressed this frame.
    fn is_mouse_clicked(&self) -> bool;
    /// Left button double-clicked this frame.
    fn is_mouse_double_clicked(&self) -> bool;
    /// Left button held and moving.
    fn is_mouse_dragging(&self) -> bool;
    /// Left button currently held.
    fn is_mouse_down(&self) -> bool;
    /// Host double-click interval in milliseconds.
    fn double_click_interval_ms(&self) -> u64;
    /// Monotonic time in milliseconds. Drives the cursor blink.
    fn time_ms(&self) -> u64;
}

/// Everything the editor needs from its host, in one bound.
pub trait EditorHost:
    Clipboard + FontMetrics + DrawSurface + EditorWindow + InputSource
{
}

impl<T: Clipboard + FontMetrics + DrawSurface + EditorWindow + InputSource> EditorHost for T {}

/// A recorded draw-list entry from [`MockHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawRecord {
    /// Filled rectangle.
    FilledRect {
        /// Top-left corner.
        min: Vec2,
        /// Bottom-right corner.
        max: Vec2,
        /// Packed color.
        color: u32,
    },
    /// Rectangle outline.
    Rect {
        /// Top-left corner.
        min: Vec2,
        /// Bottom-right corner.
        max: Vec2,
        /// Packed color.
        color: u32,
    },
    /// Line segment.
    LineSegment {
        /// Start point.
        from: Vec2,
        /// End point.
        to: Vec2,
        /// Packed color.
        color: u32,
    },
    /// Filled circle.
    FilledCircle {
        /// Center point.
        center: Vec2,
        /// Radius in pixels.
        radius: f32,
        /// Packed color.
        color: u32,
    },
    /// Text run.
    Text {
        /// Top-left position.
        pos: Vec2,
        /// Packed color.
        color: u32,
        /// The drawn text.
        text: String,
    },
}

/// An in-memory host for tests and headless tools.
///
/// Fonts are monospaced at [`MockHost::CHAR_WIDTH`] pixels per cell, with
/// East Asian wide characters taking two cells (via `unicode-width`). Input
/// is scripted by mutating the public fields between frames.
#[derive(Debug, Default)]
pub struct MockHost {
    /// Modifier state for the next frame.
    pub modifiers: Modifiers,
    /// Keys considered pressed for the next frame.
    pub pressed_keys: HashSet<EditorKey>,
    /// Queued text input for the next frame.
    pub character_queue: Vec<u32>,
    /// Scripted mouse position (content-local).
    pub mouse_position: Vec2,
    /// Scripted click state.
    pub mouse_clicked: bool,
    /// Scripted double-click state.
    pub mouse_double_clicked: bool,
    /// Scripted drag state.
    pub mouse_dragging: bool,
    /// Scripted button-held state.
    pub mouse_down: bool,
    /// Clipboard contents.
    pub clipboard: String,
    /// Monotonic clock, advanced by the test.
    pub now_ms: u64,
    /// Window focus state.
    pub focused: bool,
    /// Window hover state.
    pub hovered: bool,
    /// Reported window size.
    pub window: Vec2,
    /// Current scroll offsets.
    pub scroll: Vec2,
    /// Every draw call issued since the last [`MockHost::clear_draws`].
    pub draws: Vec<DrawRecord>,
    /// Depth of open `begin_child` scopes.
    pub open_children: usize,
}

impl MockHost {
    /// Cell width of the mock font in pixels.
    pub const CHAR_WIDTH: f32 = 8.0;
    /// Row height of the mock font in pixels.
    pub const LINE_HEIGHT: f32 = 16.0;

    /// A focused 640x360 host with an empty clipboard.
    pub fn new() -> Self {
        Self {
            focused: true,
            hovered: false,
            window: Vec2::new(640.0, 360.0),
            ..Self::default()
        }
    }

    /// Queue a string as text input.
    pub fn type_text(&mut self, text: &str) {
        self.character_queue
            .extend(text.chars().map(|ch| ch as u32));
    }

    /// Press a key for the next frame.
    pub fn press(&mut self, key: EditorKey) {
        self.pressed_keys.insert(key);
    }

    /// Release all keys and clear queued characters and clicks.
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
        self.character_queue.clear();
        self.mouse_clicked = false;
        self.mouse_double_clicked = false;
        self.mouse_dragging = false;
        self.mouse_down = false;
    }

    /// Forget recorded draw calls.
    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    /// All recorded text runs, in draw order.
    pub fn drawn_text(&self) -> Vec<&str> {
        self.draws
            .iter()
            .filter_map(|record| match record {
                DrawRecord::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Clipboard for MockHost {
    fn clipboard_text(&mut self) -> Option<String> {
        if self.clipboard.is_empty() {
            None
        } else {
            Some(self.clipboard.clone())
        }
    }

    fn set_clipboard_text(&mut self, text: &str) {
        self.clipboard = text.to_string();
    }
}

impl FontMetrics for MockHost {
    fn advance_width(&self, text: &str) -> f32 {
        text.width() as f32 * Self::CHAR_WIDTH
    }

    fn line_height(&self) -> f32 {
        Self::LINE_HEIGHT
    }

    fn ascent(&self) -> f32 {
        Self::LINE_HEIGHT * 0.75
    }
}

impl DrawSurface for MockHost {
    fn filled_rect(&mut self, min: Vec2, max: Vec2, color: u32) {
        self.draws.push(DrawRecord::FilledRect { min, max, color });
    }

    fn rect(&mut self, min: Vec2, max: Vec2, color: u32) {
        self.draws.push(DrawRecord::Rect { min, max, color });
    }

    fn line_segment(&mut self, from: Vec2, to: Vec2, color: u32) {
        self.draws.push(DrawRecord::LineSegment { from, to, color });
    }

    fn filled_circle(&mut self, center: Vec2, radius: f32, color: u32) {
        self.draws
            .push(DrawRecord::FilledCircle { center, radius, color });
    }

    fn text(&mut self, pos: Vec2, color: u32, text: &str) {
        self.draws.push(DrawRecord::Text {
            pos,
            color,
            text: text.to_string(),
        });
    }
}

impl EditorWindow for MockHost {
    fn begin_child(&mut self, _id: &str, _size: Vec2, _border: bool) {
        self.open_children += 1;
    }

    fn end_child(&mut self) {
        self.open_children -= 1;
    }

    fn content_size(&self) -> Vec2 {
        self.window
    }

    fn window_size(&self) -> Vec2 {
        self.window
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn is_hovered(&self) -> bool {
        self.hovered
    }

    fn scroll_x(&self) -> f32 {
        self.scroll.x
    }

    fn scroll_y(&self) -> f32 {
        self.scroll.y
    }

    fn set_scroll_x(&mut self, x: f32) {
        self.scroll.x = x.max(0.0);
    }

    fn set_scroll_y(&mut self, y: f32) {
        self.scroll.y = y.max(0.0);
    }

    fn use_text_cursor(&mut self) {}
}

impl InputSource for MockHost {
    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    fn is_key_pressed(&self, key: EditorKey) -> bool {
        self.pressed_keys.contains(&key)
    }

    fn drain_characters(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.character_queue)
    }

    fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    fn is_mouse_clicked(&self) -> bool {
        self.mouse_clicked
    }

    fn is_mouse_double_clicked(&self) -> bool {
        self.mouse_double_clicked
    }

    fn is_mouse_dragging(&self) -> bool {
        self.mouse_dragging
    }

    fn is_mouse_down(&self) -> bool {
        self.mouse_down
    }

    fn double_click_interval_ms(&self) -> u64 {
        300
    }

    fn time_ms(&self) -> u64 {
        self.now_ms
    }
}
