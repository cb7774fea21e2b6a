//! 2bpp planar tile decoding.
//!
//! Tiles are 8x8 pixels stored in 16 bytes with interleaved bitplanes:
//!
//! - Bytes 0-1: low and high bitplanes for row 0
//! - Bytes 2-3: low and high bitplanes for row 1
//! - And so on...
//!
//! Bit 7 of each plane byte is the leftmost pixel. A decoded pixel is a
//! 2-bit shade (0-3) that still has to go through a palette.

/// Number of bytes one tile occupies in video memory.
pub const TILE_BYTES: usize = 16;

/// Width and height of a tile in pixels.
pub const TILE_SIZE: usize = 8;

/// Decode one row of a tile from its low/high plane bytes.
#[inline]
pub fn decode_row(lo: u8, hi: u8) -> [u8; TILE_SIZE] {
    let mut row = [0u8; TILE_SIZE];
    for (col, shade) in row.iter_mut().enumerate() {
        let bit = 7 - col;
        let lo_bit = (lo >> bit) & 1;
        let hi_bit = (hi >> bit) & 1;
        *shade = (hi_bit << 1) | lo_bit;
    }
    row
}

/// An 8x8 grid of shades, fixed once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tile {
    shades: [[u8; TILE_SIZE]; TILE_SIZE],
}

impl Tile {
    /// Decode a tile from exactly 16 bytes of plane data.
    pub fn decode(data: &[u8]) -> Self {
        assert_eq!(
            data.len(),
            TILE_BYTES,
            "tile data must be {} bytes, got {}",
            TILE_BYTES,
            data.len()
        );
        let mut shades = [[0u8; TILE_SIZE]; TILE_SIZE];
        for (row, out) in shades.iter_mut().enumerate() {
            *out = decode_row(data[row * 2], data[row * 2 + 1]);
        }
        Self { shades }
    }

    /// Shade at (`row`, `col`). Panics if either is 8 or more.
    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> u8 {
        assert!(
            row < TILE_SIZE && col < TILE_SIZE,
            "tile coordinate ({}, {}) out of range",
            row,
            col
        );
        self.shades[row][col]
    }

    pub fn row(&self, row: usize) -> [u8; TILE_SIZE] {
        assert!(row < TILE_SIZE, "tile row {} out of range", row);
        self.shades[row]
    }

    /// True when every pixel is shade 0.
    pub fn is_blank(&self) -> bool {
        self.shades.iter().all(|r| r.iter().all(|&s| s == 0))
    }
}
