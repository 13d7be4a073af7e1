//! Atlas grid layout: the shared tile-index coordinate mapping.
//!
//! The glyph atlas is one square bitmap holding every rasterized glyph tile
//! in a regular grid. The mapping `(code point, style) → tile index → atlas
//! grid coordinates` must be identical between atlas construction and every
//! tilemap cell encoding; a mismatch silently corrupts rendering. Both sides
//! therefore go through [`AtlasLayout`] — it is the only place the mapping
//! exists.

use crate::style::StyleFlags;

/// Number of rasterized code points per style variant.
pub const GLYPH_COUNT: u32 = 256;

/// Number of style variants (normal / bold / italic / bold-italic).
pub const STYLE_COUNT: u32 = StyleFlags::VARIANTS as u32;

/// Total glyph tiles in the atlas.
pub const TILE_SLOTS: u32 = GLYPH_COUNT * STYLE_COUNT;

/// Largest tile edge the layout accepts, in pixels.
const MAX_TILE_DIM: u32 = 512;

/// Largest atlas the layout produces (a common GPU texture limit). All
/// [`TILE_SLOTS`] tiles at [`MAX_TILE_DIM`] fit inside it.
const MAX_ATLAS_SIZE: u32 = 16_384;

/// Geometry of the glyph atlas grid.
///
/// Tile `(0, 0)` — code point 0, normal style — is the blank tile; the
/// fragment stage discards pixels for cells that reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    tile_width: u32,
    tile_height: u32,
    atlas_size: u32,
    tile_columns: u32,
}

impl AtlasLayout {
    /// Build a layout for the given tile pixel size.
    ///
    /// Picks the smallest power-of-two square atlas that fits all
    /// [`TILE_SLOTS`] tiles. `tile_columns` is capped at 256 so atlas grid
    /// coordinates always fit the tilemap's byte pair. Tile edges clamp to
    /// `[1, MAX_TILE_DIM]`, which bounds the search at [`MAX_ATLAS_SIZE`];
    /// real font metrics sit far below the cap.
    #[must_use]
    pub fn new(tile_width: u32, tile_height: u32) -> Self {
        let tile_width = tile_width.clamp(1, MAX_TILE_DIM);
        let tile_height = tile_height.clamp(1, MAX_TILE_DIM);

        let mut atlas_size = 256u32;
        loop {
            let columns = (atlas_size / tile_width).clamp(1, 256);
            let rows_available = atlas_size / tile_height;
            let rows_needed = TILE_SLOTS.div_ceil(columns);
            if rows_needed <= rows_available && rows_needed <= 256 {
                return Self {
                    tile_width,
                    tile_height,
                    atlas_size,
                    tile_columns: columns,
                };
            }
            debug_assert!(atlas_size < MAX_ATLAS_SIZE);
            atlas_size *= 2;
        }
    }

    #[must_use]
    pub const fn tile_width(&self) -> u32 {
        self.tile_width
    }

    #[must_use]
    pub const fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Side length of the square atlas bitmap in pixels.
    #[must_use]
    pub const fn atlas_size(&self) -> u32 {
        self.atlas_size
    }

    #[must_use]
    pub const fn tile_columns(&self) -> u32 {
        self.tile_columns
    }

    /// Length in bytes of the R8 atlas bitmap.
    #[must_use]
    pub const fn pixel_len(&self) -> usize {
        (self.atlas_size as usize) * (self.atlas_size as usize)
    }

    /// Linear tile index for a code point in a given style.
    #[must_use]
    pub const fn tile_index(&self, code: u8, style: StyleFlags) -> u32 {
        (style.variant_index() as u32) * GLYPH_COUNT + (code as u32)
    }

    /// Atlas grid coordinates for a code point in a given style.
    ///
    /// Always fits a byte pair: construction bounds both axes by 256.
    #[must_use]
    pub const fn tile_coords(&self, code: u8, style: StyleFlags) -> (u8, u8) {
        let idx = self.tile_index(code, style);
        ((idx % self.tile_columns) as u8, (idx / self.tile_columns) as u8)
    }

    /// Top-left pixel of a tile, from its grid coordinates.
    #[must_use]
    pub const fn tile_origin_px(&self, tile_x: u8, tile_y: u8) -> (u32, u32) {
        (
            tile_x as u32 * self.tile_width,
            tile_y as u32 * self.tile_height,
        )
    }
}
