#![forbid(unsafe_code)]

//! Host-agnostic tracing display engine.
//!
//! `tracegrid-core` is the platform-independent half of TraceGrid: an
//! append-only log buffer paired with a fixed-size tilemap viewport, designed
//! so an application can emit megabytes of trace text without per-character
//! allocation or layout work. All types here are pure data + logic; the host
//! adapter (e.g. `tracegrid-web`) supplies pixels, input, and GPU upload.
//!
//! # Primary responsibilities
//!
//! - **LogBuffer**: growable flat arrays of code points, packed colors, and
//!   style flags, indexed by line starts. Append-only, versioned.
//! - **Screen**: a fixed `cols × rows` grid whose cells encode
//!   `(tile_x, tile_y, color_lo, color_hi)` bytes, ready for one texture
//!   upload per frame.
//! - **View**: binds a buffer to a screen at a scroll offset and re-renders
//!   the visible window only when the buffer version changes.
//! - **AtlasLayout**: the single tile-index ↔ atlas-grid mapping shared by
//!   atlas construction and cell encoding.
//! - **PackedColor**: 16-bit 5/6/5 colors plus the constant 256×256 palette
//!   image the fragment stage samples.
//!
//! # Design principles
//!
//! - **No I/O**: the host drives frames; nothing here blocks or sleeps.
//! - **No recoverable errors**: out-of-range writes clamp or drop silently;
//!   this is a high-frequency tracing path.
//! - **`#![forbid(unsafe_code)]`**: safety enforced at compile time.

pub mod atlas;
pub mod buffer;
pub mod color;
pub mod screen;
pub mod style;
pub mod view;

pub use atlas::{AtlasLayout, GLYPH_COUNT, STYLE_COUNT, TILE_SLOTS};
pub use buffer::LogBuffer;
pub use color::{PALETTE_DIM, PackedColor, palette_texture_bytes};
pub use screen::{CELL_BYTES, Screen, SelectionSpan};
pub use style::StyleFlags;
pub use view::{SCROLL_STEP, View};
