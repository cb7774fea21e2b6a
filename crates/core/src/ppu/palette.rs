//! Indexed colour tables for monochrome-style video hardware.
//!
//! Palette registers on these systems do not hold colours directly: they map
//! a pixel's shade to a palette entry, and the entry indexes a small table of
//! renderable colours. `ShadeTable` is that final table.

use serde::{Deserialize, Serialize};

/// Maps a palette entry to a 32-bit ARGB colour (0xAARRGGBB).
pub trait IndexedPalette {
    fn color(&self, index: u8) -> u32;

    /// Number of entries in the table.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The four colours a 2-bit palette entry can resolve to.
///
/// Defaults to the classic DMG grey ramp: white, light grey, dark grey, black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadeTable(pub [u32; 4]);

impl ShadeTable {
    pub const DMG_GREY: ShadeTable = ShadeTable([0xFFFFFFFF, 0xFFAAAAAA, 0xFF555555, 0xFF000000]);

    pub fn new(colors: [u32; 4]) -> Self {
        Self(colors)
    }

    pub fn colors(&self) -> &[u32; 4] {
        &self.0
    }
}

impl Default for ShadeTable {
    fn default() -> Self {
        Self::DMG_GREY
    }
}

impl IndexedPalette for ShadeTable {
    #[inline]
    fn color(&self, index: u8) -> u32 {
        assert!(index < 4, "palette entry {} out of range", index);
        self.0[index as usize]
    }

    fn len(&self) -> usize {
        4
    }
}
