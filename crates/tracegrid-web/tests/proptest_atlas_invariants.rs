//! Property tests for the atlas builder + options parsing (native-only;
//! these exercise everything in this crate that does not need a browser).

#![cfg(not(target_arch = "wasm32"))]

use proptest::prelude::*;
use tracegrid_core::atlas::AtlasLayout;
use tracegrid_core::style::StyleFlags;
use tracegrid_web::config::GridOptions;
use tracegrid_web::glyph_atlas::{GlyphAtlas, ProceduralRasterizer};

proptest! {
    /// Atlas construction succeeds for any plausible tile geometry, and the
    /// bitmap always matches the layout's pixel length.
    #[test]
    fn build_never_panics(tile_w in 1u32..64, tile_h in 1u32..128) {
        let layout = AtlasLayout::new(tile_w, tile_h);
        let atlas = GlyphAtlas::build(layout, &mut ProceduralRasterizer);
        prop_assert_eq!(atlas.pixels().len(), layout.pixel_len());
    }

    /// The blank tile (code 0, normal style) carries no ink regardless of
    /// geometry — cells encoding it must be discardable.
    #[test]
    fn blank_tile_has_no_ink(tile_w in 1u32..32, tile_h in 1u32..64) {
        let layout = AtlasLayout::new(tile_w, tile_h);
        let atlas = GlyphAtlas::build(layout, &mut ProceduralRasterizer);
        let stride = layout.atlas_size() as usize;
        for y in 0..tile_h as usize {
            for x in 0..tile_w as usize {
                prop_assert_eq!(atlas.pixels()[y * stride + x], 0);
            }
        }
    }

    /// Every visible glyph tile lands exactly where the shared layout says,
    /// in every style variant (the invariant that keeps construction and
    /// cell encoding in lockstep).
    #[test]
    fn visible_glyphs_are_inked_at_their_tile(code in 0x21u8..0x7F, style_bits in 0u8..4) {
        let layout = AtlasLayout::new(8, 16);
        let atlas = GlyphAtlas::build(layout, &mut ProceduralRasterizer);
        let style = StyleFlags::from_byte(style_bits);
        let (tx, ty) = layout.tile_coords(code, style);
        let (px, py) = layout.tile_origin_px(tx, ty);
        // The procedural pattern always inks the tile border.
        let at = (py as usize) * (layout.atlas_size() as usize) + px as usize;
        prop_assert_eq!(atlas.pixels()[at], 0xFF);
    }

    /// Options parsing accepts any JSON object with our known keys and never
    /// produces out-of-domain values.
    #[test]
    fn options_roundtrip(font_px in 1u16..96, dpr in 0.5f32..4.0, max_columns in 1u32..8192) {
        let json = format!(
            r#"{{"fontPx": {font_px}, "dpr": {dpr}, "maxColumns": {max_columns}}}"#
        );
        let opts = GridOptions::from_json(&json).unwrap();
        prop_assert_eq!(opts.font_px, font_px);
        prop_assert_eq!(opts.max_columns, max_columns);
        let back: GridOptions =
            serde_json::from_str(&serde_json::to_string(&opts).unwrap()).unwrap();
        prop_assert_eq!(back, opts);
    }
}
