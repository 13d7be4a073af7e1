//! Integration + property tests for the buffer → view → screen pipeline.

use proptest::prelude::*;
use tracegrid_core::{AtlasLayout, LogBuffer, Screen, StyleFlags, View};

fn sized_screen(cols: u16, rows: u16) -> Screen {
    let mut screen = Screen::new(AtlasLayout::new(8, 16));
    screen.resize(cols, rows);
    screen
}

fn glyph_cell(screen: &Screen, code: u8) -> [u8; 4] {
    let (tx, ty) = screen.layout().tile_coords(code, StyleFlags::empty());
    [tx, ty, 0xFF, 0xFF]
}

#[test]
fn ab_cd_end_to_end() {
    let mut buf = LogBuffer::new();
    buf.write_str("AB\nCD");

    assert_eq!(buf.row_count(), 2);
    assert_eq!(buf.width(), 2);
    let (s0, e0) = buf.line_span(0);
    assert_eq!((buf.char_at(s0), buf.char_at(s0 + 1), e0 - s0), (b'A', b'B', 2));
    let (s1, e1) = buf.line_span(1);
    assert_eq!((buf.char_at(s1), buf.char_at(s1 + 1), e1 - s1), (b'C', b'D', 2));

    let mut screen = sized_screen(4, 4);
    let mut view = View::new();
    view.render(&buf, &mut screen);

    assert_eq!(screen.cell(0, 0), Some(glyph_cell(&screen, b'A')));
    assert_eq!(screen.cell(1, 0), Some(glyph_cell(&screen, b'B')));
    assert_eq!(screen.cell(0, 1), Some(glyph_cell(&screen, b'C')));
    assert_eq!(screen.cell(1, 1), Some(glyph_cell(&screen, b'D')));

    // Everything else (except the status row) is blank: tile (0, 0).
    for y in 0..3u16 {
        for x in 0..4u16 {
            if y < 2 && x < 2 {
                continue;
            }
            let cell = screen.cell(x, y).unwrap();
            assert_eq!((cell[0], cell[1]), (0, 0), "cell ({x},{y}) not blank");
        }
    }
}

proptest! {
    /// Width equals characters written since the last newline/clear, for any
    /// newline-free input.
    #[test]
    fn width_equals_chars_written(chunks in prop::collection::vec("[a-zA-Z0-9 ]{0,40}", 0..20)) {
        let mut buf = LogBuffer::new();
        let mut total = 0u32;
        for chunk in &chunks {
            buf.write_str(chunk);
            total += chunk.len() as u32;
        }
        // Max input here (20 × 40 chars) stays below the 1024 column cap.
        prop_assert_eq!(buf.width(), total);
        prop_assert_eq!(buf.row_count(), 1);
    }

    /// Scroll offsets never leave the valid range, for any delta sequence.
    #[test]
    fn scroll_never_escapes_content(
        deltas in prop::collection::vec((-1.0f32..=1.0, -1.0f32..=1.0), 0..64),
        lines in 0u32..200,
        cols in 1u16..80,
        rows in 1u16..50,
    ) {
        let mut buf = LogBuffer::new();
        for i in 0..lines {
            buf.write_str(&format!("line {i}"));
            buf.new_line();
        }
        let screen = sized_screen(cols, rows);
        let mut view = View::new();
        for (dx, dy) in deltas {
            view.scroll(dx, dy, &buf, &screen);
            prop_assert!(view.scroll_y() <= buf.row_count().saturating_sub(u32::from(rows)));
            prop_assert!(view.scroll_x() <= buf.width().saturating_sub(u32::from(cols)));
        }
    }

    /// A cleared buffer reproduces the same content prefix as a fresh one.
    #[test]
    fn clear_reuse_is_unobservable(
        first in "[ -~\n]{0,200}",
        second in "[ -~\n]{0,200}",
    ) {
        let mut reused = LogBuffer::new();
        reused.write_str(&first);
        reused.clear();
        reused.write_str(&second);

        let mut fresh = LogBuffer::new();
        fresh.write_str(&second);

        prop_assert_eq!(reused.write_index(), fresh.write_index());
        prop_assert_eq!(reused.row_count(), fresh.row_count());
        prop_assert_eq!(reused.width(), fresh.width());
        prop_assert_eq!(reused.version(), fresh.version());
        for i in 0..reused.write_index() {
            prop_assert_eq!(reused.char_at(i), fresh.char_at(i));
            prop_assert_eq!(reused.color_at(i), fresh.color_at(i));
            prop_assert_eq!(reused.style_at(i), fresh.style_at(i));
        }
    }

    /// Rendering any buffer into any screen never panics and always leaves
    /// the screen dirty exactly once per version change.
    #[test]
    fn render_any_window(
        text in "[ -~\n]{0,300}",
        cols in 0u16..40,
        rows in 0u16..20,
        dy in -1.0f32..=1.0,
    ) {
        let mut buf = LogBuffer::new();
        buf.write_str(&text);
        let mut screen = sized_screen(cols, rows);
        let mut view = View::new();
        view.scroll(0.0, dy, &buf, &screen);
        view.render(&buf, &mut screen);
        let _ = screen.take_dirty();
        view.render(&buf, &mut screen);
        prop_assert!(!screen.is_dirty());
    }
}
