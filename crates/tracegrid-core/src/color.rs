//! Packed 16-bit colors and the constant palette image.
//!
//! Cells store a 16-bit 5/6/5 packed color instead of full RGBA; expansion to
//! 8-bit channels happens in the fragment stage by loading one texel of a
//! precomputed 256×256 palette texture. That keeps the tilemap payload at
//! 4 bytes per cell.

/// Side length of the square palette texture. Texel `(i % 256, i / 256)`
/// decodes packed color `i`.
pub const PALETTE_DIM: u32 = 256;

/// A 16-bit packed RGB color: 5 bits red, 6 bits green, 5 bits blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedColor(pub u16);

impl PackedColor {
    pub const BLACK: Self = Self(0x0000);
    pub const WHITE: Self = Self(0xFFFF);

    /// Pack 8-bit channels down to 5/6/5.
    #[must_use]
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        let r5 = (r >> 3) as u16;
        let g6 = (g >> 2) as u16;
        let b5 = (b >> 3) as u16;
        Self((r5 << 11) | (g6 << 5) | b5)
    }

    /// Expand to 8-bit RGBA with full alpha.
    ///
    /// High bits are replicated into the low bits so that a saturated channel
    /// expands back to exactly 0xFF.
    #[must_use]
    pub const fn to_rgba8(self) -> [u8; 4] {
        let r5 = ((self.0 >> 11) & 0x1F) as u8;
        let g6 = ((self.0 >> 5) & 0x3F) as u8;
        let b5 = (self.0 & 0x1F) as u8;
        [
            (r5 << 3) | (r5 >> 2),
            (g6 << 2) | (g6 >> 4),
            (b5 << 3) | (b5 >> 2),
            0xFF,
        ]
    }

    /// Low byte of the packed value (tilemap cell byte 2).
    #[must_use]
    pub const fn lo(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// High byte of the packed value (tilemap cell byte 3).
    #[must_use]
    pub const fn hi(self) -> u8 {
        (self.0 >> 8) as u8
    }
}

/// Build the constant 256×256 RGBA palette image enumerating every packed
/// color. Built once at renderer startup and uploaded as a texture; never
/// mutated afterwards.
#[must_use]
pub fn palette_texture_bytes() -> Vec<u8> {
    let dim = PALETTE_DIM as usize;
    let mut bytes = Vec::with_capacity(dim * dim * 4);
    for i in 0..=u16::MAX {
        bytes.extend_from_slice(&PackedColor(i).to_rgba8());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturated_channels_round_trip_to_ff() {
        assert_eq!(PackedColor::WHITE.to_rgba8(), [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(PackedColor::BLACK.to_rgba8(), [0, 0, 0, 0xFF]);
        assert_eq!(
            PackedColor::from_rgb8(0xFF, 0x00, 0xFF).to_rgba8(),
            [0xFF, 0x00, 0xFF, 0xFF]
        );
    }

    #[test]
    fn pack_keeps_high_bits() {
        let c = PackedColor::from_rgb8(0x12, 0x34, 0x56);
        let [r, g, b, a] = c.to_rgba8();
        assert_eq!(a, 0xFF);
        // 5/6/5 quantization: within one quantization step of the input.
        assert!((i16::from(r) - 0x12i16).abs() <= 7);
        assert!((i16::from(g) - 0x34i16).abs() <= 3);
        assert!((i16::from(b) - 0x56i16).abs() <= 7);
    }

    #[test]
    fn lo_hi_split() {
        let c = PackedColor(0xABCD);
        assert_eq!(c.lo(), 0xCD);
        assert_eq!(c.hi(), 0xAB);
        assert_eq!(u16::from(c.hi()) << 8 | u16::from(c.lo()), 0xABCD);
    }

    #[test]
    fn palette_image_addresses_every_packed_color() {
        let bytes = palette_texture_bytes();
        assert_eq!(bytes.len(), 256 * 256 * 4);

        // Texel (i % 256, i / 256) must decode packed color i.
        for &i in &[0u16, 1, 255, 256, 0x1234, u16::MAX] {
            let x = usize::from(i) % 256;
            let y = usize::from(i) / 256;
            let at = (y * 256 + x) * 4;
            assert_eq!(&bytes[at..at + 4], &PackedColor(i).to_rgba8());
        }
    }
}
