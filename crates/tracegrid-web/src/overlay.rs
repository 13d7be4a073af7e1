//! Selection overlay: translucent rectangles on a 2D canvas.
//!
//! Drawn on a separate canvas stacked above the WebGPU one, so selections
//! never touch the tilemap. Cleared and redrawn every tick — the rect count
//! is tiny and a 2D clear is cheaper than tracking overlay dirtiness.

use tracegrid_core::screen::SelectionSpan;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

const SELECTION_FILL: &str = "rgba(120, 160, 255, 0.35)";

pub struct SelectionOverlay {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    tile_width: f64,
    tile_height: f64,
}

impl SelectionOverlay {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context for overlay"))?
            .dyn_into()
            .map_err(|_| JsValue::from_str("overlay context is not 2d"))?;
        Ok(Self {
            canvas,
            ctx,
            tile_width: 1.0,
            tile_height: 1.0,
        })
    }

    /// Match the overlay's backing store to the render surface.
    pub fn resize(&mut self, pixel_width: u32, pixel_height: u32, tile_width: u32, tile_height: u32) {
        self.canvas.set_width(pixel_width);
        self.canvas.set_height(pixel_height);
        self.tile_width = f64::from(tile_width);
        self.tile_height = f64::from(tile_height);
    }

    /// Clear and redraw all selection spans.
    pub fn draw(&self, selections: &[SelectionSpan]) {
        self.ctx.clear_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
        if selections.is_empty() {
            return;
        }
        self.ctx.set_fill_style_str(SELECTION_FILL);
        for span in selections {
            self.ctx.fill_rect(
                f64::from(span.x) * self.tile_width,
                f64::from(span.y) * self.tile_height,
                f64::from(span.len) * self.tile_width,
                self.tile_height,
            );
        }
    }
}
