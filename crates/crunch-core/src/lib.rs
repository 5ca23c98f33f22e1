//! Core library for packing PNG sprites into texture atlases.
//!
//! - Placement: MaxRects free-rectangle packing (BSSF/BLSF/BAF/BLR/CPR)
//! - Preprocessing: alpha trimming, premultiplication, content hashing
//! - Output: composed RGBA pages plus `crch` binary / XML / JSON sidecars
//!
//! Quick example:
//! ```ignore
//! use crunch_core::{AtlasConfig, Bitmap, Packer, render_page};
//! # fn main() -> crunch_core::Result<()> {
//! let cfg = AtlasConfig::builder().max_dimensions(1024, 1024).trim(true).build();
//! let mut bitmaps = vec![
//!     Bitmap::load("a.png", "a", cfg.premultiply, cfg.trim)?,
//!     Bitmap::load("b.png", "b", cfg.premultiply, cfg.trim)?,
//! ];
//! let mut packer = Packer::new(cfg.max_width, cfg.max_height, cfg.padding, cfg.stretch);
//! packer.pack(&mut bitmaps, cfg.unique, cfg.rotate, cfg.heuristic);
//! let page = render_page(&packer);
//! # Ok(()) }
//! ```

pub mod bitmap;
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod hash;
pub mod packer;

pub use bitmap::*;
pub use compositing::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use packer::*;

/// Convenience prelude for common types and functions.
pub mod prelude {
    pub use crate::bitmap::Bitmap;
    pub use crate::compositing::render_page;
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder, Heuristic, StringFormat};
    pub use crate::error::{CrunchError, Result};
    pub use crate::export::{AtlasDoc, ImageEntry, TextureEntry};
    pub use crate::packer::{Packer, Point, Rect};
}
