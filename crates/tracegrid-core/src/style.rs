//! Per-character style channel.
//!
//! The log buffer stores one style byte per character; the atlas rasterizes
//! one glyph set per style variant. Keeping the channel to two flags (bold,
//! italic) means the variant index is just the flag bits, which is what ties
//! the buffer encoding to [`crate::atlas::AtlasLayout`] without a lookup
//! table.

use bitflags::bitflags;

bitflags! {
    /// Style flags stored one byte per character.
    ///
    /// The two low bits double as the atlas style-variant index:
    /// normal = 0, bold = 1, italic = 2, bold-italic = 3.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        const BOLD   = 1 << 0;
        const ITALIC = 1 << 1;
    }
}

impl StyleFlags {
    /// Number of distinct style variants the atlas carries.
    pub const VARIANTS: u8 = 4;

    /// Atlas style-variant index in `0..VARIANTS`.
    #[must_use]
    pub const fn variant_index(self) -> u8 {
        self.bits() & 0b11
    }

    /// Decode a style byte as stored in the buffer, dropping unknown bits.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}
