//! JSON-friendly configuration for the web surface.
//!
//! The JS host passes options as a JSON string; everything has a default so
//! `new TraceGrid()` with no options is a working monospace console.

use serde::{Deserialize, Serialize};

/// Host-supplied options, deserialized from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridOptions {
    /// CSS font family for glyph rasterization.
    pub font_family: String,
    /// Font size in CSS pixels.
    pub font_px: u16,
    /// Device pixel ratio at startup (updated by `resize`).
    pub dpr: f32,
    /// Per-line column cap for the log buffer.
    pub max_columns: u32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_px: 14,
            dpr: 1.0,
            max_columns: 1024,
        }
    }
}

impl GridOptions {
    /// Parse options from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Font geometry for one atlas build.
///
/// The tile width comes from the measured advance of a reference glyph (done
/// host-side, since it needs a canvas); the tile height is derived here:
/// font size plus two device pixels of vertical padding, all scaled by DPR.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub px_size: u16,
    pub dpr: f32,
}

impl FontSpec {
    #[must_use]
    pub fn from_options(options: &GridOptions) -> Self {
        Self {
            family: options.font_family.clone(),
            px_size: options.font_px,
            dpr: options.dpr.max(0.1),
        }
    }

    /// Font size in device pixels.
    #[must_use]
    pub fn device_px(&self) -> f32 {
        f32::from(self.px_size) * self.dpr
    }

    /// Atlas tile height in device pixels.
    #[must_use]
    pub fn tile_height(&self) -> u32 {
        (self.device_px() + 2.0 * self.dpr).ceil().max(1.0) as u32
    }

    /// CSS font string for one style variant, e.g. `"italic bold 28px monospace"`.
    #[must_use]
    pub fn font_string(&self, bold: bool, italic: bool) -> String {
        let mut s = String::new();
        if italic {
            s.push_str("italic ");
        }
        if bold {
            s.push_str("bold ");
        }
        s.push_str(&format!("{}px {}", self.device_px().round() as u32, self.family));
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_empty_object() {
        let opts = GridOptions::from_json("{}").unwrap();
        assert_eq!(opts, GridOptions::default());
    }

    #[test]
    fn partial_options_keep_other_defaults() {
        let opts = GridOptions::from_json(r#"{"fontPx": 18, "dpr": 2.0}"#).unwrap();
        assert_eq!(opts.font_px, 18);
        assert_eq!(opts.dpr, 2.0);
        assert_eq!(opts.font_family, "monospace");
        assert_eq!(opts.max_columns, 1024);
    }

    #[test]
    fn tile_height_scales_with_dpr() {
        let spec = FontSpec {
            family: "monospace".into(),
            px_size: 14,
            dpr: 2.0,
        };
        assert_eq!(spec.tile_height(), 32); // 14*2 + 2*2
        assert_eq!(spec.font_string(true, false), "bold 28px monospace");
        assert_eq!(spec.font_string(true, true), "italic bold 28px monospace");
        assert_eq!(spec.font_string(false, false), "28px monospace");
    }
}
