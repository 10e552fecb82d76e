//! The per-frame render driver.
//!
//! One call to [`Editor::render`] runs the whole frame: sanitize the
//! requested size, open the host's scroll child, apply keyboard and mouse
//! input, run the refresh cycle (reparse + recolor + error markers), emit
//! the draw list, and close the child.
//!
//! All geometry is content-local: (0, 0) is the top-left corner of the
//! first line, with the host's scroll offsets already folded into mouse
//! positions.

use crate::coords::{Coordinate, utf8_sequence_length};
use crate::editor::Editor;
use crate::host::{EditorHost, Vec2};
use crate::palette::PaletteIndex;

/// Pixels between the window edge and the line numbers.
const LEFT_MARGIN: f32 = 10.0;

/// Cursor blink period: 400 ms on, 400 ms off.
const BLINK_INTERVAL_MS: u64 = 400;

fn sanitize_extent(value: f32) -> f32 {
    const MAX_SIZE: f32 = i32::MAX as f32 * 0.95;
    if value.is_nan() || value.is_infinite() {
        0.0
    } else {
        value.clamp(0.0, MAX_SIZE)
    }
}

impl Editor {
    /// Render one frame into `host` and drive the refresh cycle.
    pub fn render(&mut self, host: &mut dyn EditorHost, size: Vec2, border: bool) {
        self.cursor_position_changed = false;

        let sanitized = Vec2::new(sanitize_extent(size.x), sanitize_extent(size.y));
        host.begin_child("code-editor", sanitized, border);

        self.compute_char_advance(host);
        self.handle_keyboard_inputs(host);
        self.handle_mouse_inputs(host);
        self.refresh();
        self.internal_render(host);

        host.end_child();
    }

    fn compute_char_advance(&mut self, host: &dyn EditorHost) {
        self.char_advance = Vec2::new(
            host.advance_width("#"),
            host.line_height() * self.line_spacing,
        );
    }

    /// Pixel distance from the start of a line to `from`, tab stops
    /// included.
    pub(crate) fn text_distance_to_line_start(
        &self,
        host: &dyn EditorHost,
        from: Coordinate,
    ) -> f32 {
        if from.line >= self.buffer().line_count() {
            return 0.0;
        }

        let line = self.buffer().line(from.line);
        let space_size = host.advance_width(" ");
        let tab_width = self.tab_size() as f32 * space_size;
        let col_index = self.char_index_of(from);

        let mut distance = 0.0f32;
        let mut it = 0;
        while it < line.len() && it < col_index {
            let byte = line[it].byte;
            if byte == b'\t' {
                distance = (1.0 + ((1.0 + distance) / tab_width).floor()) * tab_width;
                it += 1;
            } else {
                let length = utf8_sequence_length(byte).min(line.len() - it);
                let bytes: Vec<u8> = line[it..it + length].iter().map(|glyph| glyph.byte).collect();
                let text = String::from_utf8_lossy(&bytes);
                distance += host.advance_width(&text);
                it += length;
            }
        }

        distance
    }

    /// Map a content-local position to the nearest valid coordinate.
    pub(crate) fn screen_pos_to_coordinates(
        &self,
        host: &dyn EditorHost,
        position: Vec2,
    ) -> Coordinate {
        if self.char_advance.y <= 0.0 {
            return Coordinate::new(0, 0);
        }

        let line_no = (position.y / self.char_advance.y).floor().max(0.0) as usize;
        let mut column_coord = 0;

        if line_no < self.buffer().line_count() {
            let line = self.buffer().line(line_no);
            let space_size = host.advance_width(" ");
            let tab_width = self.tab_size() as f32 * space_size;

            let mut column_index = 0;
            let mut column_x = 0.0f32;

            while column_index < line.len() {
                let byte = line[column_index].byte;
                let column_width;

                if byte == b'\t' {
                    let new_column_x = (1.0 + ((1.0 + column_x) / tab_width).floor()) * tab_width;
                    column_width = new_column_x - column_x;
                    if self.text_start + column_x + column_width * 0.5 > position.x {
                        break;
                    }
                    column_x = new_column_x;
                    column_coord = (column_coord / self.tab_size()) * self.tab_size() + self.tab_size();
                    column_index += 1;
                } else {
                    let length = utf8_sequence_length(byte).min(line.len() - column_index);
                    let bytes: Vec<u8> = line[column_index..column_index + length]
                        .iter()
                        .map(|glyph| glyph.byte)
                        .collect();
                    let text = String::from_utf8_lossy(&bytes);
                    column_width = host.advance_width(&text);
                    if self.text_start + column_x + column_width * 0.5 > position.x {
                        break;
                    }
                    column_x += column_width;
                    column_coord += 1;
                    column_index += length;
                }
            }
        }

        self.sanitize(Coordinate::new(line_no, column_coord))
    }

    fn scroll_to_cursor_now(&mut self, host: &mut dyn EditorHost) {
        let scroll_x = host.scroll_x();
        let scroll_y = host.scroll_y();
        let height = host.window_size().y;
        let width = host.window_size().x;

        if self.char_advance.x <= 0.0 || self.char_advance.y <= 0.0 {
            return;
        }

        let top = 1.0 + (scroll_y / self.char_advance.y).ceil();
        let bottom = ((scroll_y + height) / self.char_advance.y).ceil();
        let left = (scroll_x / self.char_advance.x).ceil();
        let right = ((scroll_x + width) / self.char_advance.x).ceil();

        let pos = self.get_cursor_position();
        let len = self.text_distance_to_line_start(host, pos);

        if (pos.line as f32) < top {
            host.set_scroll_y(((pos.line as f32) - 1.0).max(0.0) * self.char_advance.y);
        }
        if (pos.line as f32) > bottom - 4.0 {
            host.set_scroll_y(((pos.line as f32 + 4.0) * self.char_advance.y - height).max(0.0));
        }
        if len + self.text_start < left + 4.0 {
            host.set_scroll_x((len + self.text_start - 4.0).max(0.0));
        }
        if len + self.text_start > right - 4.0 {
            host.set_scroll_x((len + self.text_start + 4.0 - width).max(0.0));
        }
    }

    fn internal_render(&mut self, host: &mut dyn EditorHost) {
        if self.scroll_to_top {
            self.scroll_to_top = false;
            host.set_scroll_y(0.0);
        }

        if self.char_advance.y <= 0.0 {
            return;
        }

        let content_size = host.content_size();
        let scroll_y = host.scroll_y();
        let focused = host.is_focused();
        let advance = self.char_advance;

        let mut line_no = (scroll_y / advance.y).floor() as usize;
        let visible = ((scroll_y + content_size.y) / advance.y).floor() as usize;
        let line_max = self.max_line_index().min(visible);

        self.text_start =
            host.advance_width(&format!(" {} ", self.total_lines())) + LEFT_MARGIN;
        let space_size = host.advance_width(" ");

        while line_no <= line_max {
            let line_y = line_no as f32 * advance.y;
            let text_x = self.text_start;

            let line_start_coord = Coordinate::new(line_no, 0);
            let line_end_coord = Coordinate::new(line_no, self.line_max_column_at(line_no));

            // Selection band for this line.
            let selection_start = self.selection_start();
            let selection_end = self.selection_end();
            let mut sstart = -1.0f32;
            let mut ssend = -1.0f32;
            if selection_start <= line_end_coord {
                sstart = if selection_start > line_start_coord {
                    self.text_distance_to_line_start(host, selection_start)
                } else {
                    0.0
                };
            }
            if selection_end > line_start_coord {
                ssend = self.text_distance_to_line_start(host, if selection_end < line_end_coord {
                    selection_end
                } else {
                    line_end_coord
                });
            }
            if selection_end.line > line_no {
                ssend += advance.x;
            }
            if sstart != -1.0 && ssend != -1.0 && sstart < ssend {
                host.filled_rect(
                    Vec2::new(text_x + sstart, line_y),
                    Vec2::new(text_x + ssend, line_y + advance.y),
                    self.palette.color(PaletteIndex::Selection),
                );
            }

            // Breakpoint and error fills cover the whole row.
            let row_min = Vec2::new(0.0, line_y);
            let row_max = Vec2::new(content_size.x, line_y + advance.y);
            if self.breakpoints.contains(&(line_no + 1)) {
                host.filled_rect(row_min, row_max, self.palette.color(PaletteIndex::Breakpoint));
            }
            if let Some(message) = self.error_markers.get(&(line_no + 1)) {
                host.filled_rect(row_min, row_max, self.palette.color(PaletteIndex::ErrorMarker));

                let mouse = host.mouse_position();
                if host.is_hovered() && mouse.y >= line_y && mouse.y < line_y + advance.y {
                    let tooltip = format!("Error at line {}:\n{}", line_no + 1, message);
                    let pad = host.line_height() - host.ascent();
                    let width = host.advance_width(message) + pad * 2.0;
                    host.filled_rect(
                        mouse,
                        Vec2::new(mouse.x + width, mouse.y + advance.y + pad * 2.0),
                        self.palette.color(PaletteIndex::Background),
                    );
                    host.text(
                        Vec2::new(mouse.x + pad, mouse.y + pad),
                        self.palette.color(PaletteIndex::ErrorMarker),
                        &tooltip,
                    );
                }
            }

            // Line number, right-aligned against the text column.
            let line_number = format!("{} ", line_no + 1);
            let number_width = host.advance_width(&line_number);
            host.text(
                Vec2::new(self.text_start - number_width, line_y),
                self.palette.color(PaletteIndex::LineNumber),
                &line_number,
            );

            let cursor_coord = self.get_cursor_position();
            if cursor_coord.line == line_no {
                // Highlight the cursor's row when nothing is selected.
                if !self.has_selection() {
                    let fill = if focused {
                        PaletteIndex::CurrentLineFill
                    } else {
                        PaletteIndex::CurrentLineFillInactive
                    };
                    host.filled_rect(row_min, row_max, self.palette.color(fill));
                    host.rect(row_min, row_max, self.palette.color(PaletteIndex::CurrentLineEdge));
                }

                if focused && host.time_ms() % (BLINK_INTERVAL_MS * 2) < BLINK_INTERVAL_MS {
                    let cx = self.text_distance_to_line_start(host, cursor_coord);
                    let cindex = self.char_index_of(cursor_coord);
                    let line = self.buffer().line(line_no);
                    let width = if self.is_overwrite() && cindex < line.len() {
                        if line[cindex].byte == b'\t' {
                            let tab_width = self.tab_size() as f32 * space_size;
                            (1.0 + ((1.0 + cx) / tab_width).floor()) * tab_width - cx
                        } else {
                            advance.x
                        }
                    } else {
                        1.0
                    };
                    host.filled_rect(
                        Vec2::new(text_x + cx, line_y),
                        Vec2::new(text_x + cx + width, line_y + advance.y),
                        self.palette.color(PaletteIndex::Cursor),
                    );
                }
            }

            self.draw_line_glyphs(host, line_no, Vec2::new(text_x, line_y), space_size);

            line_no += 1;
        }

        if self.scroll_to_cursor {
            self.scroll_to_cursor_now(host);
            self.scroll_to_cursor = false;
        }
    }

    /// Draw one line's glyphs, batching runs of equal color and handling
    /// tabs and whitespace dots.
    fn draw_line_glyphs(
        &self,
        host: &mut dyn EditorHost,
        line_no: usize,
        origin: Vec2,
        space_size: f32,
    ) {
        let line = self.buffer().line(line_no);
        let tab_width = self.tab_size() as f32 * space_size;
        let colorized = self.is_colorizer_enabled();

        let mut buffer = String::new();
        let mut buffer_start_x = 0.0f32;
        let mut offset_x = 0.0f32;
        let mut prev_color: Option<PaletteIndex> = None;

        let mut i = 0;
        while i < line.len() {
            let glyph = line[i];
            let color = if colorized { glyph.color } else { PaletteIndex::Default };

            if prev_color.is_some_and(|previous| previous != color) && !buffer.is_empty() {
                host.text(
                    Vec2::new(origin.x + buffer_start_x, origin.y),
                    self.palette.color(prev_color.unwrap_or(PaletteIndex::Default)),
                    &buffer,
                );
                offset_x = buffer_start_x + host.advance_width(&buffer);
                buffer.clear();
            }
            if buffer.is_empty() {
                buffer_start_x = offset_x;
            }
            prev_color = Some(color);

            if glyph.byte == b'\t' {
                if !buffer.is_empty() {
                    host.text(
                        Vec2::new(origin.x + buffer_start_x, origin.y),
                        self.palette.color(color),
                        &buffer,
                    );
                    offset_x = buffer_start_x + host.advance_width(&buffer);
                    buffer.clear();
                }

                let new_x = (1.0 + ((1.0 + offset_x) / tab_width).floor()) * tab_width;
                if self.is_showing_whitespaces() {
                    let mid_y = origin.y + host.line_height() * 0.5;
                    host.line_segment(
                        Vec2::new(origin.x + offset_x + 1.0, mid_y),
                        Vec2::new(origin.x + new_x - 1.0, mid_y),
                        self.palette.color(PaletteIndex::Default),
                    );
                }
                offset_x = new_x;
                buffer_start_x = offset_x;
                i += 1;
            } else if glyph.byte == b' ' {
                if self.is_showing_whitespaces() {
                    let x = buffer_start_x + host.advance_width(&buffer) + space_size * 0.5;
                    let mid_y = origin.y + host.line_height() * 0.5;
                    host.filled_circle(
                        Vec2::new(origin.x + x, mid_y),
                        1.5,
                        self.palette.color(PaletteIndex::Default),
                    );
                }
                buffer.push(' ');
                i += 1;
            } else {
                let length = utf8_sequence_length(glyph.byte).min(line.len() - i);
                let bytes: Vec<u8> = line[i..i + length].iter().map(|g| g.byte).collect();
                buffer.push_str(&String::from_utf8_lossy(&bytes));
                i += length;
            }
        }

        if !buffer.is_empty() {
            host.text(
                Vec2::new(origin.x + buffer_start_x, origin.y),
                self.palette.color(prev_color.unwrap_or(PaletteIndex::Default)),
                &buffer,
            );
        }
    }
}
