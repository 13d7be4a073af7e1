//! Scroll view: binds one log buffer to one screen.
//!
//! The view owns the scroll offset and the version of the buffer it last
//! rendered. Each tick it compares versions; on mismatch it clears the
//! screen's tilemap, copies the visible buffer window into it, and draws a
//! status line into the reserved last row. Matching versions cost one integer
//! compare — the mechanism that keeps an idle trace display at zero cost.

use core::fmt::Write as _;

use crate::buffer::LogBuffer;
use crate::screen::Screen;

/// Grid cells scrolled per unit of normalized wheel delta.
pub const SCROLL_STEP: f32 = 3.0;

/// Sentinel forcing the next render; the version counter never reaches it.
const FORCE_RENDER: u64 = u64::MAX;

/// Scroll offset + version tracking for one buffer/screen binding.
#[derive(Debug, Clone)]
pub struct View {
    scroll_x: f64,
    scroll_y: f64,
    last_rendered_version: u64,
    status: String,
}

impl View {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            last_rendered_version: FORCE_RENDER,
            status: String::new(),
        }
    }

    /// Current horizontal offset in whole columns.
    #[must_use]
    pub fn scroll_x(&self) -> u32 {
        self.scroll_x as u32
    }

    /// Current vertical offset in whole rows.
    #[must_use]
    pub fn scroll_y(&self) -> u32 {
        self.scroll_y as u32
    }

    /// Apply normalized scroll deltas (each in `[-1, 1]`).
    ///
    /// Offsets accumulate in `f64` so sub-cell deltas from smooth-scrolling
    /// devices are not lost and whole-row offsets stay exact for any `u32`
    /// row count, and clamp so scrolling never reveals rows or columns beyond
    /// buffer content.
    pub fn scroll(&mut self, dx: f32, dy: f32, buffer: &LogBuffer, screen: &Screen) {
        let max_x = f64::from(buffer.width().saturating_sub(u32::from(screen.cols())));
        let max_y = f64::from(buffer.row_count().saturating_sub(u32::from(screen.rows())));
        let step = f64::from(SCROLL_STEP);
        self.scroll_x = (self.scroll_x + f64::from(dx) * step).clamp(0.0, max_x);
        self.scroll_y = (self.scroll_y + f64::from(dy) * step).clamp(0.0, max_y);
        self.last_rendered_version = FORCE_RENDER;
    }

    /// Jump to the newest content.
    pub fn scroll_to_bottom(&mut self, buffer: &LogBuffer, screen: &Screen) {
        self.scroll_y =
            f64::from(buffer.row_count().saturating_sub(u32::from(screen.rows())));
        self.last_rendered_version = FORCE_RENDER;
    }

    /// Force the next [`render`](Self::render) to repaint regardless of the
    /// buffer version.
    ///
    /// `LogBuffer::clear` resets the version counter to 0, so a cleared
    /// buffer that receives the same number of mutations can land back on the
    /// last rendered version and the equality gate would skip the repaint.
    /// Hosts call this alongside `clear` to close that window.
    pub fn force_render(&mut self) {
        self.last_rendered_version = FORCE_RENDER;
    }

    /// Re-render the visible window into the screen if the buffer changed.
    ///
    /// No-op when the buffer version matches the last rendered one. The last
    /// screen row is reserved for a status line reporting buffer size and
    /// scroll position; buffer content fills the rows above it.
    pub fn render(&mut self, buffer: &LogBuffer, screen: &mut Screen) {
        if buffer.version() == self.last_rendered_version {
            return;
        }
        self.last_rendered_version = buffer.version();

        screen.clear();
        if screen.rows() == 0 || screen.cols() == 0 {
            return;
        }

        let content_rows = screen.rows().saturating_sub(1);
        screen.move_to(0, 0);
        screen.write_buffer(
            buffer,
            self.scroll_x(),
            self.scroll_y(),
            screen.cols(),
            content_rows,
        );

        self.status.clear();
        let _ = write!(
            self.status,
            "{} lines  {} chars  @{},{}",
            buffer.row_count(),
            buffer.write_index(),
            self.scroll_x(),
            self.scroll_y(),
        );
        screen.move_to(0, screen.rows() - 1);
        screen.write_str(&self.status);
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}
