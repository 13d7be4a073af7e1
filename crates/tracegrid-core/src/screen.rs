//! Fixed-size tilemap viewport.
//!
//! The screen is a `cols × rows` grid where each cell is four bytes:
//! `(tile_x, tile_y, color_lo, color_hi)`. The byte array is exactly what the
//! renderer uploads as the tilemap texture, so every write here is the full
//! CPU half of drawing a character. The grid never grows on write — it
//! mirrors GPU texture storage sized at resize time, and writes outside the
//! grid are silently dropped.

use crate::atlas::AtlasLayout;
use crate::buffer::LogBuffer;
use crate::color::PackedColor;
use crate::style::StyleFlags;

/// Bytes per tilemap cell.
pub const CELL_BYTES: usize = 4;

/// A selected run of cells: `len` cells starting at `(x, y)`.
///
/// Selections are drawn by the host overlay; they never touch the tilemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSpan {
    pub x: u16,
    pub y: u16,
    pub len: u16,
}

/// CPU-side viewport state: tilemap bytes, cursor, dirty flag, selections.
#[derive(Debug, Clone)]
pub struct Screen {
    layout: AtlasLayout,
    cols: u16,
    rows: u16,
    tilemap: Vec<u8>,
    cursor_x: u16,
    cursor_y: u16,
    dirty: bool,
    selections: Vec<SelectionSpan>,
    color: PackedColor,
    style: StyleFlags,
}

impl Screen {
    /// Create an unsized screen; call [`Screen::resize`] before writing.
    #[must_use]
    pub fn new(layout: AtlasLayout) -> Self {
        Self {
            layout,
            cols: 0,
            rows: 0,
            tilemap: Vec::new(),
            cursor_x: 0,
            cursor_y: 0,
            dirty: false,
            selections: Vec::new(),
            color: PackedColor::WHITE,
            style: StyleFlags::empty(),
        }
    }

    /// Resize the grid, reallocating the tilemap to `cols * rows * 4` bytes.
    ///
    /// This is the CPU mirror of the renderer's resize step — the only place
    /// the tilemap's size changes. Contents reset to blank.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.tilemap.clear();
        self.tilemap
            .resize(usize::from(cols) * usize::from(rows) * CELL_BYTES, 0);
        self.clamp_cursor();
        self.dirty = true;
    }

    /// Swap the atlas layout (font size / DPR changed) and blank the grid.
    pub fn set_layout(&mut self, layout: AtlasLayout) {
        self.layout = layout;
        self.clear();
    }

    #[must_use]
    pub fn layout(&self) -> AtlasLayout {
        self.layout
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// The raw tilemap bytes, row-major, 4 bytes per cell.
    #[must_use]
    pub fn tilemap(&self) -> &[u8] {
        &self.tilemap
    }

    /// Active color for cursor writes.
    pub fn set_color(&mut self, color: PackedColor) {
        self.color = color;
    }

    /// Active style for cursor writes.
    pub fn set_style(&mut self, style: StyleFlags) {
        self.style = style;
    }

    /// Move the cursor, clamped into the grid.
    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cursor_x = x;
        self.cursor_y = y;
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        self.cursor_x = self.cursor_x.min(self.cols.saturating_sub(1));
        self.cursor_y = self.cursor_y.min(self.rows.saturating_sub(1));
    }

    /// Write one cell at an explicit position. Out-of-grid writes are
    /// silently dropped.
    pub fn put_char(&mut self, x: u16, y: u16, code: u8, color: PackedColor, style: StyleFlags) {
        if x >= self.cols || y >= self.rows {
            return;
        }
        let (tx, ty) = self.layout.tile_coords(code, style);
        let at = (usize::from(y) * usize::from(self.cols) + usize::from(x)) * CELL_BYTES;
        self.tilemap[at] = tx;
        self.tilemap[at + 1] = ty;
        self.tilemap[at + 2] = color.lo();
        self.tilemap[at + 3] = color.hi();
        self.dirty = true;
    }

    /// Write one code point at the cursor and advance it.
    ///
    /// The cursor can walk off the right edge; writes there are dropped until
    /// the next `move_to` or newline.
    pub fn write_char_code(&mut self, code: u8) {
        if code == b'\n' {
            self.cursor_x = 0;
            self.cursor_y = self.cursor_y.saturating_add(1);
            return;
        }
        self.put_char(self.cursor_x, self.cursor_y, code, self.color, self.style);
        self.cursor_x = self.cursor_x.saturating_add(1);
    }

    /// Write a string at the cursor. Code points above 255 become `'?'`.
    pub fn write_str(&mut self, s: &str) {
        for ch in s.chars() {
            if ch == '\n' {
                self.write_char_code(b'\n');
            } else {
                let code = u32::from(ch);
                self.write_char_code(if code > 0xFF { b'?' } else { code as u8 });
            }
        }
    }

    /// Copy a rectangular window of buffer content to the grid at the cursor.
    ///
    /// The source rectangle is clamped to the buffer's live content (each
    /// row's span ends at the earlier of the next line start and the write
    /// index) and the destination is clamped to the grid. A source rectangle
    /// fully outside the buffer is a zero-size copy.
    pub fn write_buffer(&mut self, buffer: &LogBuffer, src_x: u32, src_y: u32, w: u16, h: u16) {
        let (cx, cy) = (self.cursor_x, self.cursor_y);
        for dy in 0..h {
            let dest_y = cy.saturating_add(dy);
            if dest_y >= self.rows {
                break;
            }
            let src_row = src_y.saturating_add(u32::from(dy));
            if src_row >= buffer.row_count() {
                break;
            }
            let (start, end) = buffer.line_span(src_row);
            let row_start = start.saturating_add(src_x);
            for dx in 0..w {
                let dest_x = cx.saturating_add(dx);
                if dest_x >= self.cols {
                    break;
                }
                let i = row_start.saturating_add(u32::from(dx));
                if i >= end {
                    break;
                }
                self.put_char(
                    dest_x,
                    dest_y,
                    buffer.char_at(i),
                    buffer.color_at(i),
                    buffer.style_at(i),
                );
            }
        }
    }

    /// Blank the whole grid and home the cursor.
    pub fn clear(&mut self) {
        self.tilemap.fill(0);
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.dirty = true;
    }

    /// Force a re-upload on the next frame without changing contents.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Whether the tilemap changed since the last [`Screen::take_dirty`].
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag. Called once per frame by the renderer; a
    /// `false` return means the frame's upload and draw are skipped entirely.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Add a selection span for the overlay.
    pub fn select(&mut self, x: u16, y: u16, len: u16) {
        self.selections.push(SelectionSpan { x, y, len });
    }

    /// Drop all selection spans.
    pub fn clear_selections(&mut self) {
        self.selections.clear();
    }

    #[must_use]
    pub fn selections(&self) -> &[SelectionSpan] {
        &self.selections
    }

    /// The four bytes of one cell, for inspection. `None` outside the grid.
    #[must_use]
    pub fn cell(&self, x: u16, y: u16) -> Option<[u8; 4]> {
        if x >= self.cols || y >= self.rows {
            return None;
        }
        let at = (usize::from(y) * usize::from(self.cols) + usize::from(x)) * CELL_BYTES;
        Some([
            self.tilemap[at],
            self.tilemap[at + 1],
            self.tilemap[at + 2],
            self.tilemap[at + 3],
        ])
    }
}
