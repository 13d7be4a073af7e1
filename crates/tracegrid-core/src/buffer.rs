//! Append-only log buffer: flat character, color, and style storage.
//!
//! Stores every written character in parallel flat arrays (`u8` code point,
//! `u16` packed color, `u8` style byte) with a separate array of line start
//! offsets. Growth is amortized doubling; `clear` keeps the allocated
//! capacity so sustained tracing never reallocates twice for the same
//! watermark. Newlines are never stored — they only advance the line index.
//!
//! A monotonically increasing `version` counter lets consumers (the view)
//! detect mutations with one integer compare instead of scanning content.

use crate::color::PackedColor;
use crate::style::StyleFlags;

/// Per-line column cap: a row that reaches this width is force-wrapped so a
/// missing newline in the input cannot grow one row without bound.
pub const DEFAULT_MAX_COLUMNS: u32 = 1024;

const DEFAULT_CHAR_CAPACITY: usize = 16 * 1024;
const DEFAULT_LINE_CAPACITY: usize = 1024;

/// Append-only text store for tracing output.
///
/// Invariants:
/// - `data.len() == colors.len() == styles.len()` at all times.
/// - `line_starts` is strictly increasing, starts with 0, and every entry is
///   `<= write_index`.
/// - Written characters are never overwritten or removed (until `clear`).
#[derive(Debug, Clone)]
pub struct LogBuffer {
    data: Vec<u8>,
    colors: Vec<u16>,
    styles: Vec<u8>,
    line_starts: Vec<u32>,
    max_line_width: u32,
    max_columns: u32,
    version: u64,
    color: PackedColor,
    style: StyleFlags,
}

impl LogBuffer {
    /// Create a buffer with default initial capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHAR_CAPACITY, DEFAULT_LINE_CAPACITY)
    }

    /// Create a buffer with explicit initial capacities (characters, lines).
    #[must_use]
    pub fn with_capacity(chars: usize, lines: usize) -> Self {
        let mut line_starts = Vec::with_capacity(lines.max(1));
        line_starts.push(0);
        Self {
            data: Vec::with_capacity(chars),
            colors: Vec::with_capacity(chars),
            styles: Vec::with_capacity(chars),
            line_starts,
            max_line_width: 0,
            max_columns: DEFAULT_MAX_COLUMNS,
            version: 0,
            color: PackedColor::WHITE,
            style: StyleFlags::empty(),
        }
    }

    /// Set the per-line column cap. Rows reaching it are force-wrapped.
    pub fn set_max_columns(&mut self, max_columns: u32) {
        self.max_columns = max_columns.max(1);
    }

    /// Active color applied to subsequently written characters.
    pub fn set_color(&mut self, color: PackedColor) {
        self.color = color;
    }

    #[must_use]
    pub fn color(&self) -> PackedColor {
        self.color
    }

    /// Active style applied to subsequently written characters.
    pub fn set_style(&mut self, style: StyleFlags) {
        self.style = style;
    }

    #[must_use]
    pub fn style(&self) -> StyleFlags {
        self.style
    }

    /// Next free absolute character position (== characters written).
    #[must_use]
    pub fn write_index(&self) -> u32 {
        self.data.len() as u32
    }

    /// Number of logical rows, counting the open last row.
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Mutation counter. Cheap dirty-check for consumers.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Width of the widest row, including the in-progress last row.
    ///
    /// Tracked incrementally; no scan.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.max_line_width.max(self.open_row_width())
    }

    fn open_row_width(&self) -> u32 {
        // line_starts is never empty.
        let last = self.line_starts[self.line_starts.len() - 1];
        self.write_index() - last
    }

    /// Append one code point with the active color and style.
    ///
    /// A row that has reached the column cap is broken first.
    pub fn write_char_code(&mut self, code: u8) {
        if self.open_row_width() >= self.max_columns {
            self.new_line();
        }
        self.data.push(code);
        self.colors.push(self.color.0);
        self.styles.push(self.style.bits());
        self.version += 1;
    }

    /// Append a string. `'\n'` advances the line index instead of being
    /// stored; code points above 255 are written as `'?'`.
    pub fn write_str(&mut self, s: &str) {
        for ch in s.chars() {
            if ch == '\n' {
                self.new_line();
            } else {
                let code = u32::from(ch);
                self.write_char_code(if code > 0xFF { b'?' } else { code as u8 });
            }
        }
    }

    /// Close the current row and open a new one.
    pub fn new_line(&mut self) {
        self.max_line_width = self.max_line_width.max(self.open_row_width());
        self.line_starts.push(self.write_index());
        self.version += 1;
    }

    /// Reset to the empty state while retaining allocated capacity.
    ///
    /// Observationally identical to a fresh buffer; reused capacity avoids
    /// reallocation storms when a tracing session restarts.
    pub fn clear(&mut self) {
        self.data.clear();
        self.colors.clear();
        self.styles.clear();
        self.line_starts.clear();
        self.line_starts.push(0);
        self.max_line_width = 0;
        self.version = 0;
    }

    /// Character span `[start, end)` of a row, clamped to live content.
    ///
    /// Rows at or beyond `row_count` are empty. The end is bounded by
    /// `write_index`, so reads never touch slots reused after a `clear`.
    #[must_use]
    pub fn line_span(&self, row: u32) -> (u32, u32) {
        let Some(&start) = self.line_starts.get(row as usize) else {
            return (self.write_index(), self.write_index());
        };
        let end = self
            .line_starts
            .get(row as usize + 1)
            .copied()
            .unwrap_or_else(|| self.write_index())
            .min(self.write_index());
        (start, end)
    }

    /// Code point at an absolute position; 0 past the write index.
    #[must_use]
    pub fn char_at(&self, index: u32) -> u8 {
        self.data.get(index as usize).copied().unwrap_or(0)
    }

    /// Packed color at an absolute position; black past the write index.
    #[must_use]
    pub fn color_at(&self, index: u32) -> PackedColor {
        PackedColor(self.colors.get(index as usize).copied().unwrap_or(0))
    }

    /// Style at an absolute position; normal past the write index.
    #[must_use]
    pub fn style_at(&self, index: u32) -> StyleFlags {
        StyleFlags::from_byte(self.styles.get(index as usize).copied().unwrap_or(0))
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_text(buf: &LogBuffer, row: u32) -> String {
        let (start, end) = buf.line_span(row);
        (start..end).map(|i| char::from(buf.char_at(i))).collect()
    }

    #[test]
    fn width_tracks_the_open_row() {
        let mut buf = LogBuffer::new();
        buf.write_str("hello");
        assert_eq!(buf.width(), 5);
        assert_eq!(buf.row_count(), 1);
        buf.write_str(" world");
        assert_eq!(buf.width(), 11);
    }

    #[test]
    fn newline_is_not_stored() {
        let mut buf = LogBuffer::new();
        buf.write_str("AB\nCD");
        assert_eq!(buf.write_index(), 4);
        assert_eq!(buf.row_count(), 2);
        assert_eq!(buffer_text(&buf, 0), "AB");
        assert_eq!(buffer_text(&buf, 1), "CD");
        assert_eq!(buf.width(), 2);
    }

    #[test]
    fn n_lines_of_m_chars() {
        let mut buf = LogBuffer::new();
        let (n, m) = (20u32, 7u32);
        for _ in 0..n {
            for _ in 0..m {
                buf.write_char_code(b'x');
            }
            buf.new_line();
        }
        assert_eq!(buf.row_count(), n + 1);
        for row in 0..n {
            let (start, end) = buf.line_span(row);
            assert_eq!(end - start, m);
        }
        // Open final row is empty.
        let (start, end) = buf.line_span(n);
        assert_eq!(start, end);
    }

    #[test]
    fn column_cap_force_wraps() {
        let mut buf = LogBuffer::new();
        buf.set_max_columns(4);
        buf.write_str("abcdefghij");
        assert_eq!(buf.row_count(), 3);
        assert_eq!(buffer_text(&buf, 0), "abcd");
        assert_eq!(buffer_text(&buf, 1), "efgh");
        assert_eq!(buffer_text(&buf, 2), "ij");
        // Characters themselves are all preserved.
        assert_eq!(buf.write_index(), 10);
    }

    #[test]
    fn growth_preserves_characters_colors_and_styles() {
        let mut buf = LogBuffer::with_capacity(4, 1);
        buf.set_color(PackedColor::from_rgb8(0xFF, 0, 0));
        buf.set_style(StyleFlags::BOLD);
        for i in 0..100u32 {
            buf.write_char_code(b'a' + (i % 26) as u8);
        }
        buf.set_color(PackedColor::WHITE);
        buf.set_style(StyleFlags::empty());
        for i in 0..100u32 {
            buf.write_char_code(b'A' + (i % 26) as u8);
        }

        for i in 0..100u32 {
            assert_eq!(buf.char_at(i), b'a' + (i % 26) as u8);
            assert_eq!(buf.color_at(i), PackedColor::from_rgb8(0xFF, 0, 0));
            assert_eq!(buf.style_at(i), StyleFlags::BOLD);
        }
        for i in 100..200u32 {
            assert_eq!(buf.char_at(i), b'A' + ((i - 100) % 26) as u8);
            assert_eq!(buf.color_at(i), PackedColor::WHITE);
            assert_eq!(buf.style_at(i), StyleFlags::empty());
        }
    }

    #[test]
    fn clear_is_observationally_fresh() {
        let mut buf = LogBuffer::new();
        buf.write_str("some earlier session\nwith lines\n");
        buf.clear();

        let fresh = LogBuffer::new();
        assert_eq!(buf.write_index(), fresh.write_index());
        assert_eq!(buf.row_count(), fresh.row_count());
        assert_eq!(buf.width(), fresh.width());
        assert_eq!(buf.version(), fresh.version());

        buf.write_str("next");
        let mut fresh = LogBuffer::new();
        fresh.write_str("next");
        for i in 0..4 {
            assert_eq!(buf.char_at(i), fresh.char_at(i));
            assert_eq!(buf.color_at(i), fresh.color_at(i));
        }
        assert_eq!(buf.version(), fresh.version());
    }

    #[test]
    fn clear_retains_capacity() {
        let mut buf = LogBuffer::with_capacity(8, 2);
        for _ in 0..1000 {
            buf.write_char_code(b'x');
        }
        let cap = buf.data.capacity();
        buf.clear();
        assert_eq!(buf.data.capacity(), cap);
        assert_eq!(buf.write_index(), 0);
    }

    #[test]
    fn line_span_clamps_to_live_content() {
        let mut buf = LogBuffer::new();
        buf.write_str("abc");
        let (start, end) = buf.line_span(5);
        assert_eq!(start, end);
        // Reads past the write index come back blank.
        assert_eq!(buf.char_at(999), 0);
    }

    #[test]
    fn version_counts_every_mutation() {
        let mut buf = LogBuffer::new();
        assert_eq!(buf.version(), 0);
        buf.write_char_code(b'a');
        assert_eq!(buf.version(), 1);
        buf.new_line();
        assert_eq!(buf.version(), 2);
        buf.write_str("xy");
        assert_eq!(buf.version(), 4);
        buf.clear();
        assert_eq!(buf.version(), 0);
    }

    #[test]
    fn non_latin1_scalars_become_question_marks() {
        let mut buf = LogBuffer::new();
        buf.write_str("a\u{3c0}b");
        assert_eq!(buf.char_at(0), b'a');
        assert_eq!(buf.char_at(1), b'?');
        assert_eq!(buf.char_at(2), b'b');
    }
}
