//! Glyph atlas construction.
//!
//! Rasterizes all 256 code points × 4 style variants into one square R8
//! bitmap at the positions dictated by [`AtlasLayout`] — the same mapping the
//! screen uses to encode tilemap cells, so construction and lookup cannot
//! drift apart. Built once per font-size/DPR change (the resize path), never
//! per frame.
//!
//! Rasterization itself sits behind [`GlyphRasterizer`]: on wasm a 2D canvas
//! (`fillText` + alpha extraction); in tests a deterministic procedural
//! pattern.

use tracegrid_core::atlas::AtlasLayout;
use tracegrid_core::style::StyleFlags;

/// Produces one R8 alpha tile per (code point, style) pair.
pub trait GlyphRasterizer {
    /// Rasterize `code` in `style` into a `width * height` R8 bitmap.
    ///
    /// The returned vec must be exactly `width * height` bytes; tiles of any
    /// other length are skipped by the builder.
    fn rasterize(&mut self, code: u8, style: StyleFlags, width: u32, height: u32) -> Vec<u8>;
}

/// One fully-built glyph atlas: layout + R8 pixels, ready for texture upload.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    layout: AtlasLayout,
    pixels: Vec<u8>,
}

impl GlyphAtlas {
    /// Rasterize every glyph tile into a fresh atlas bitmap.
    ///
    /// Code point 0 is left empty in every style so tile `(0, 0)` — the
    /// blank cell encoding — never carries ink.
    pub fn build<R: GlyphRasterizer>(layout: AtlasLayout, rasterizer: &mut R) -> Self {
        let mut pixels = vec![0u8; layout.pixel_len()];
        let (tw, th) = (layout.tile_width(), layout.tile_height());

        for style_bits in 0..StyleFlags::VARIANTS {
            let style = StyleFlags::from_byte(style_bits);
            for code in 1..=255u8 {
                let tile = rasterizer.rasterize(code, style, tw, th);
                if tile.len() != (tw as usize) * (th as usize) {
                    continue;
                }
                let (tx, ty) = layout.tile_coords(code, style);
                let (px, py) = layout.tile_origin_px(tx, ty);
                blit_r8(&mut pixels, layout.atlas_size(), px, py, tw, th, &tile);
            }
        }

        Self { layout, pixels }
    }

    #[must_use]
    pub fn layout(&self) -> AtlasLayout {
        self.layout
    }

    /// The R8 atlas bitmap, `atlas_size × atlas_size` bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

fn blit_r8(dst: &mut [u8], dst_size: u32, x: u32, y: u32, w: u32, h: u32, src: &[u8]) {
    let stride = dst_size as usize;
    for row in 0..(h as usize) {
        let dst_at = (y as usize + row) * stride + x as usize;
        let src_at = row * (w as usize);
        dst[dst_at..dst_at + w as usize].copy_from_slice(&src[src_at..src_at + w as usize]);
    }
}

/// Deterministic rasterizer producing a recognizable per-glyph pattern.
///
/// Stands in for a real font wherever no canvas is available (native tests,
/// headless runs). Whitespace and control characters come out empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProceduralRasterizer;

impl GlyphRasterizer for ProceduralRasterizer {
    fn rasterize(&mut self, code: u8, style: StyleFlags, width: u32, height: u32) -> Vec<u8> {
        let mut pixels = vec![0u8; (width as usize) * (height as usize)];
        if code <= 0x20 || code == 0x7F {
            return pixels;
        }

        let seed = u32::from(code)
            .wrapping_mul(0x9E37_79B9)
            .wrapping_add(u32::from(style.variant_index()) << 24);
        for y in 0..height {
            for x in 0..width {
                let border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
                let bit_index = (x + y * 7) & 31;
                let hash_bit = ((seed >> bit_index) & 1) == 1;
                let dot = ((x + y * 5 + seed) % 17) == 0;
                if border || hash_bit || dot {
                    pixels[(y as usize) * (width as usize) + (x as usize)] = 0xFF;
                }
            }
        }
        pixels
    }
}

// ---------------------------------------------------------------------------
// Canvas rasterization (wasm32 only)
// ---------------------------------------------------------------------------

#[cfg(target_arch = "wasm32")]
mod canvas {
    use super::GlyphRasterizer;
    use crate::config::FontSpec;
    use tracegrid_core::style::StyleFlags;
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

    /// Rasterizes glyphs by drawing them on a scratch 2D canvas and reading
    /// back the alpha channel.
    pub struct CanvasRasterizer {
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        spec: FontSpec,
    }

    impl CanvasRasterizer {
        /// Create a scratch canvas in the current document.
        pub fn new(spec: FontSpec) -> Result<Self, JsValue> {
            let document = web_sys::window()
                .ok_or_else(|| JsValue::from_str("no window"))?
                .document()
                .ok_or_else(|| JsValue::from_str("no document"))?;
            let canvas: HtmlCanvasElement = document
                .create_element("canvas")?
                .dyn_into()
                .map_err(|_| JsValue::from_str("not a canvas"))?;
            let ctx: CanvasRenderingContext2d = canvas
                .get_context("2d")?
                .ok_or_else(|| JsValue::from_str("no 2d context"))?
                .dyn_into()
                .map_err(|_| JsValue::from_str("not a 2d context"))?;
            Ok(Self { canvas, ctx, spec })
        }

        /// Measured advance width of the reference glyph, in device pixels.
        ///
        /// Determines the atlas tile width; monospace fonts make every glyph
        /// share it.
        pub fn measure_tile_width(&self) -> Result<u32, JsValue> {
            self.ctx.set_font(&self.spec.font_string(false, false));
            let metrics = self.ctx.measure_text("M")?;
            Ok((metrics.width().ceil() as u32).max(1))
        }
    }

    impl GlyphRasterizer for CanvasRasterizer {
        fn rasterize(&mut self, code: u8, style: StyleFlags, width: u32, height: u32) -> Vec<u8> {
            let len = (width as usize) * (height as usize);
            let Some(ch) = char::from_u32(u32::from(code)) else {
                return vec![0u8; len];
            };

            // Resizing resets the context state, so the font is set after.
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.ctx
                .clear_rect(0.0, 0.0, f64::from(width), f64::from(height));
            self.ctx.set_font(&self.spec.font_string(
                style.contains(StyleFlags::BOLD),
                style.contains(StyleFlags::ITALIC),
            ));
            self.ctx.set_fill_style_str("#ffffff");
            self.ctx.set_text_baseline("top");

            let pad = f64::from(self.spec.dpr);
            if self
                .ctx
                .fill_text(ch.encode_utf8(&mut [0u8; 4]), 0.0, pad)
                .is_err()
            {
                return vec![0u8; len];
            }

            let Ok(image) =
                self.ctx
                    .get_image_data(0.0, 0.0, f64::from(width), f64::from(height))
            else {
                return vec![0u8; len];
            };
            let rgba = image.data();
            // Alpha channel only; fill color is known white.
            (0..len)
                .map(|i| rgba.get(i * 4 + 3).copied().unwrap_or(0))
                .collect()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRasterizer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_fills_non_blank_tiles() {
        let layout = AtlasLayout::new(6, 12);
        let atlas = GlyphAtlas::build(layout, &mut ProceduralRasterizer);
        assert_eq!(atlas.pixels().len(), layout.pixel_len());

        let (tx, ty) = layout.tile_coords(b'A', StyleFlags::empty());
        let (px, py) = layout.tile_origin_px(tx, ty);
        // Border pixels of a visible glyph tile are inked.
        let at = (py as usize) * (layout.atlas_size() as usize) + px as usize;
        assert_eq!(atlas.pixels()[at], 0xFF);
    }

    #[test]
    fn blank_tile_stays_empty() {
        let layout = AtlasLayout::new(6, 12);
        let atlas = GlyphAtlas::build(layout, &mut ProceduralRasterizer);
        let (px, py) = layout.tile_origin_px(0, 0);
        let stride = layout.atlas_size() as usize;
        for y in 0..layout.tile_height() as usize {
            for x in 0..layout.tile_width() as usize {
                assert_eq!(atlas.pixels()[(py as usize + y) * stride + px as usize + x], 0);
            }
        }
    }

    #[test]
    fn style_variants_rasterize_differently() {
        let layout = AtlasLayout::new(8, 16);
        let atlas = GlyphAtlas::build(layout, &mut ProceduralRasterizer);

        let tile = |style: StyleFlags| -> Vec<u8> {
            let (tx, ty) = layout.tile_coords(b'g', style);
            let (px, py) = layout.tile_origin_px(tx, ty);
            let stride = layout.atlas_size() as usize;
            let mut out = Vec::new();
            for y in 0..layout.tile_height() as usize {
                let at = (py as usize + y) * stride + px as usize;
                out.extend_from_slice(&atlas.pixels()[at..at + layout.tile_width() as usize]);
            }
            out
        };

        assert_ne!(tile(StyleFlags::empty()), tile(StyleFlags::BOLD));
    }

    #[test]
    fn whitespace_glyphs_are_empty() {
        let mut r = ProceduralRasterizer;
        let tile = r.rasterize(b' ', StyleFlags::empty(), 8, 16);
        assert!(tile.iter().all(|&b| b == 0));
    }

    #[test]
    fn malformed_tiles_are_skipped() {
        struct Short;
        impl GlyphRasterizer for Short {
            fn rasterize(&mut self, _: u8, _: StyleFlags, _: u32, _: u32) -> Vec<u8> {
                vec![0xFF; 3]
            }
        }
        let layout = AtlasLayout::new(8, 16);
        let atlas = GlyphAtlas::build(layout, &mut Short);
        assert!(atlas.pixels().iter().all(|&b| b == 0));
    }
}
