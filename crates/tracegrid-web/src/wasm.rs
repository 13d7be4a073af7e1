#![forbid(unsafe_code)]

use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;
use web_time::Instant;

use crate::config::{FontSpec, GridOptions};
use crate::glyph_atlas::{CanvasRasterizer, GlyphAtlas};
use crate::overlay::SelectionOverlay;
use crate::renderer::TilemapRenderer;
use tracegrid_core::atlas::AtlasLayout;
use tracegrid_core::buffer::LogBuffer;
use tracegrid_core::color::PackedColor;
use tracegrid_core::screen::Screen;
use tracegrid_core::style::StyleFlags;
use tracegrid_core::view::View;

/// Web/WASM tracing display surface.
///
/// Owns the whole pipeline: log buffer → view → screen tilemap → WebGPU
/// upload, plus the optional selection overlay. The host drives it with
/// `write`/`scroll` calls and one `tick` per animation frame.
#[wasm_bindgen]
pub struct TraceGrid {
    options: GridOptions,
    buffer: LogBuffer,
    screen: Screen,
    view: View,
    renderer: Option<TilemapRenderer>,
    overlay: Option<SelectionOverlay>,
    last_frame_ms: f64,
}

#[wasm_bindgen]
impl TraceGrid {
    /// Create an uninitialized surface. `options_json` is an optional JSON
    /// object; unknown or malformed options fall back to defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: Option<String>) -> Self {
        let options = match options_json.as_deref().map(GridOptions::from_json) {
            Some(Ok(options)) => options,
            Some(Err(e)) => {
                web_sys::console::warn_1(&format!("tracegrid: bad options: {e}").into());
                GridOptions::default()
            }
            None => GridOptions::default(),
        };

        let spec = FontSpec::from_options(&options);
        // Placeholder layout until init measures the real font.
        let layout = AtlasLayout::new(spec.tile_height().div_ceil(2), spec.tile_height());

        let mut buffer = LogBuffer::new();
        buffer.set_max_columns(options.max_columns);

        Self {
            options,
            buffer,
            screen: Screen::new(layout),
            view: View::new(),
            renderer: None,
            overlay: None,
            last_frame_ms: 0.0,
        }
    }

    /// Initialize rendering on an existing `<canvas>`, with an optional
    /// second canvas for the selection overlay.
    ///
    /// GPU setup failure is unrecoverable for the session: it is reported to
    /// the console and returned as a rejected Promise; no fallback is
    /// attempted.
    pub async fn init(
        &mut self,
        canvas: HtmlCanvasElement,
        overlay: Option<HtmlCanvasElement>,
    ) -> Result<(), JsValue> {
        let pixel_w = canvas.width();
        let pixel_h = canvas.height();

        let atlas = self.build_atlas()?;
        let layout = atlas.layout();
        let cols = (pixel_w / layout.tile_width()).min(u32::from(u16::MAX)) as u16;
        let rows = (pixel_h / layout.tile_height()).min(u32::from(u16::MAX)) as u16;

        self.screen.set_layout(layout);
        self.screen.resize(cols, rows);

        let renderer = TilemapRenderer::init(canvas, &atlas, cols, rows)
            .await
            .map_err(|e| {
                let msg = format!("tracegrid: renderer init failed: {e}");
                web_sys::console::error_1(&msg.clone().into());
                JsValue::from_str(&msg)
            })?;
        self.renderer = Some(renderer);

        if let Some(overlay_canvas) = overlay {
            let mut overlay = SelectionOverlay::new(overlay_canvas)?;
            overlay.resize(pixel_w, pixel_h, layout.tile_width(), layout.tile_height());
            self.overlay = Some(overlay);
        }
        Ok(())
    }

    /// Resize to new pixel dimensions (host polls its container).
    ///
    /// Rebuilds the glyph atlas when the DPR changed, recomputes the grid,
    /// and resizes every GPU resource. Content re-renders on the next tick.
    pub fn resize(&mut self, pixel_w: u32, pixel_h: u32, dpr: f32) -> Result<(), JsValue> {
        let dpr_changed = (dpr - self.options.dpr).abs() > f32::EPSILON;
        self.options.dpr = dpr;

        let layout = if dpr_changed {
            let atlas = self.build_atlas()?;
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.set_atlas(&atlas);
            }
            let layout = atlas.layout();
            self.screen.set_layout(layout);
            layout
        } else {
            self.screen.layout()
        };

        let cols = (pixel_w / layout.tile_width()).min(u32::from(u16::MAX)) as u16;
        let rows = (pixel_h / layout.tile_height()).min(u32::from(u16::MAX)) as u16;
        self.screen.resize(cols, rows);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(cols, rows);
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.resize(pixel_w, pixel_h, layout.tile_width(), layout.tile_height());
        }
        self.view.scroll(0.0, 0.0, &self.buffer, &self.screen);
        Ok(())
    }

    fn build_atlas(&self) -> Result<GlyphAtlas, JsValue> {
        let spec = FontSpec::from_options(&self.options);
        let mut rasterizer = CanvasRasterizer::new(spec.clone())?;
        let tile_width = rasterizer.measure_tile_width()?;
        let layout = AtlasLayout::new(tile_width, spec.tile_height());
        Ok(GlyphAtlas::build(layout, &mut rasterizer))
    }

    /// Append text to the log buffer. Newlines advance the line index.
    pub fn write(&mut self, text: &str) {
        self.buffer.write_str(text);
    }

    /// Set the active color for subsequent writes (8-bit channels, packed
    /// down to 5/6/5 internally).
    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.buffer.set_color(PackedColor::from_rgb8(r, g, b));
    }

    /// Set the active style for subsequent writes.
    #[wasm_bindgen(js_name = setStyle)]
    pub fn set_style(&mut self, bold: bool, italic: bool) {
        let mut style = StyleFlags::empty();
        style.set(StyleFlags::BOLD, bold);
        style.set(StyleFlags::ITALIC, italic);
        self.buffer.set_style(style);
    }

    /// Reset the buffer, keeping its allocated capacity.
    pub fn clear(&mut self) {
        self.buffer.clear();
        // The version counter restarts at 0, so the view cannot tell a
        // cleared-and-refilled buffer from the one it already drew.
        self.view.force_render();
    }

    /// Apply normalized scroll deltas (each in `[-1, 1]`).
    pub fn scroll(&mut self, dx: f32, dy: f32) {
        self.view.scroll(dx, dy, &self.buffer, &self.screen);
    }

    /// Jump to the newest content.
    #[wasm_bindgen(js_name = scrollToBottom)]
    pub fn scroll_to_bottom(&mut self) {
        self.view.scroll_to_bottom(&self.buffer, &self.screen);
    }

    /// Move the screen cursor (clamped to the grid) for direct writes.
    #[wasm_bindgen(js_name = moveTo)]
    pub fn move_to(&mut self, x: u16, y: u16) {
        self.screen.move_to(x, y);
    }

    /// Write text straight into the tilemap at the cursor, bypassing the
    /// buffer/view pair. Overwritten by the next buffer re-render; meant for
    /// simple fixed-position text.
    #[wasm_bindgen(js_name = writeDirect)]
    pub fn write_direct(&mut self, text: &str) {
        self.screen.write_str(text);
    }

    /// Add a selection span at grid coordinates.
    pub fn select(&mut self, x: u16, y: u16, len: u16) {
        self.screen.select(x, y, len);
    }

    /// Drop all selection spans.
    #[wasm_bindgen(js_name = clearAllSelections)]
    pub fn clear_all_selections(&mut self) {
        self.screen.clear_selections();
    }

    /// Force a full upload + draw on the next tick.
    pub fn invalidate(&mut self) {
        self.screen.invalidate();
    }

    /// Drive one frame. Call once per animation frame.
    ///
    /// Returns immediately when the buffer and tilemap are unchanged — the
    /// idle path is one version compare and one boolean check.
    pub fn tick(&mut self) {
        self.view.render(&self.buffer, &mut self.screen);

        if self.screen.take_dirty() {
            let started = Instant::now();
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.upload_tilemap(self.screen.tilemap());
                if let Err(e) = renderer.render_frame() {
                    web_sys::console::error_1(
                        &format!("tracegrid: frame failed: {e}").into(),
                    );
                }
            }
            self.last_frame_ms = started.elapsed().as_secs_f64() * 1000.0;
        }

        if let Some(overlay) = self.overlay.as_ref() {
            overlay.draw(self.screen.selections());
        }
    }

    /// Grid width in columns.
    pub fn cols(&self) -> u16 {
        self.screen.cols()
    }

    /// Grid height in rows.
    pub fn rows(&self) -> u16 {
        self.screen.rows()
    }

    /// Logical line count of the buffer.
    #[wasm_bindgen(js_name = lineCount)]
    pub fn line_count(&self) -> u32 {
        self.buffer.row_count()
    }

    /// Characters stored in the buffer.
    #[wasm_bindgen(js_name = charCount)]
    pub fn char_count(&self) -> u32 {
        self.buffer.write_index()
    }

    /// CPU time of the most recent uploaded frame, in milliseconds.
    #[wasm_bindgen(js_name = lastFrameMs)]
    pub fn last_frame_ms(&self) -> f64 {
        self.last_frame_ms
    }

    /// Explicit teardown for JS callers: releases GPU resources and the
    /// overlay so the canvases can be reclaimed.
    pub fn destroy(&mut self) {
        self.renderer = None;
        self.overlay = None;
    }
}
