#![forbid(unsafe_code)]

//! Web frontend for TraceGrid.
//!
//! This crate is intentionally host-specific (web/WASM). It layers on top of
//! `tracegrid-core`:
//! - builds the glyph atlas from a real font via a scratch 2D canvas,
//! - owns the WebGPU tilemap renderer (three textures, one quad per frame),
//! - draws the selection overlay on a second canvas,
//! - exports the whole pipeline to JS through `wasm-bindgen`.
//!
//! The atlas layout math, the tilemap encoding, and everything else testable
//! without a browser lives in `tracegrid-core`; this crate holds only the
//! host glue and the GPU path.

pub mod config;
pub mod glyph_atlas;
pub mod renderer;

#[cfg(target_arch = "wasm32")]
mod overlay;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::TraceGrid;

/// Native builds compile this crate as a stub so `cargo check --workspace`
/// stays green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct TraceGrid;

#[cfg(not(target_arch = "wasm32"))]
impl TraceGrid {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
