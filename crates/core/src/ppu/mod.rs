//! Reusable PPU building blocks for tile-based video hardware.
//!
//! System crates combine these with their own register decoding and timing.

pub mod palette;
pub mod tile;

pub use palette::{IndexedPalette, ShadeTable};
pub use tile::Tile;
