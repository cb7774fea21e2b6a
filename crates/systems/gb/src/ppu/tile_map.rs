//! Tile addressing, the decoded tile cache and the 32x32 tile maps.
//!
//! Tile data occupies $8000-$97FF: 384 tiles of 16 bytes. Two overlapping
//! tile sets index into it:
//!
//! ```text
//! slot   0..128   $8000-$87FF   set 0 only (unsigned 0..127)
//! slot 128..256   $8800-$8FFF   shared     (unsigned 128..255 / signed -128..-1)
//! slot 256..384   $9000-$97FF   set 1 only (signed 0..127)
//! ```
//!
//! Set 0 is indexed unsigned from $8000, set 1 signed from $9000, so both
//! reach the shared middle block.

use emu_core::ppu::tile::{TILE_BYTES, TILE_SIZE};
use emu_core::ppu::Tile;

use crate::bus::{VideoBus, VRAM_START};

/// Base address of tile set 0 (unsigned indexing).
pub const TILE_SET0_BASE: u16 = 0x8000;
/// Base address of tile set 1 (signed indexing).
pub const TILE_SET1_BASE: u16 = 0x9000;
/// Number of distinct tiles addressable through either set.
pub const TILE_SLOTS: usize = 384;
/// Tiles per map row/column.
pub const MAP_TILES: usize = 32;

/// Which tile set, and therefore which addressing mode, a layer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSet {
    /// Set 0: index 0..=255 from $8000.
    Unsigned,
    /// Set 1: index -128..=127 from $9000.
    Signed,
}

impl TileSet {
    /// Position of the tile within the 384-tile data region.
    #[inline]
    pub fn slot(self, index: u8) -> usize {
        match self {
            TileSet::Unsigned => index as usize,
            TileSet::Signed => (256 + (index as i8) as i32) as usize,
        }
    }

    /// Absolute address of the tile's first byte.
    pub fn tile_address(self, index: u8) -> u16 {
        match self {
            TileSet::Unsigned => TILE_SET0_BASE + index as u16 * TILE_BYTES as u16,
            TileSet::Signed => {
                (TILE_SET1_BASE as i32 + (index as i8) as i32 * TILE_BYTES as i32) as u16
            }
        }
    }
}

/// Location of a 32x32 tile map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMapBase {
    /// $9800-$9BFF
    Low,
    /// $9C00-$9FFF
    High,
}

impl TileMapBase {
    pub fn address(self) -> u16 {
        match self {
            TileMapBase::Low => 0x9800,
            TileMapBase::High => 0x9C00,
        }
    }
}

/// A layer's map + tile set choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSelect {
    pub map: TileMapBase,
    pub tile_set: TileSet,
}

/// Decoded copy of the whole tile data region.
///
/// `refresh` re-reads the raw bytes and only re-decodes tiles whose bytes
/// changed since the previous refresh.
pub struct TileCache {
    raw: Vec<u8>,
    tiles: Vec<Tile>,
}

impl TileCache {
    pub fn new() -> Self {
        Self {
            raw: vec![0; TILE_SLOTS * TILE_BYTES],
            tiles: vec![Tile::default(); TILE_SLOTS],
        }
    }

    /// Reload tile data from the bus. Returns how many tiles were re-decoded.
    pub fn refresh<B: VideoBus + ?Sized>(&mut self, bus: &B) -> usize {
        let mut fresh = [0u8; TILE_BYTES];
        let mut decoded = 0;
        for slot in 0..TILE_SLOTS {
            let base = VRAM_START + (slot * TILE_BYTES) as u16;
            for (i, byte) in fresh.iter_mut().enumerate() {
                *byte = bus.read(base + i as u16);
            }
            let cached = &mut self.raw[slot * TILE_BYTES..(slot + 1) * TILE_BYTES];
            if cached[..] != fresh[..] {
                cached.copy_from_slice(&fresh);
                self.tiles[slot] = Tile::decode(&fresh);
                decoded += 1;
            }
        }
        decoded
    }

    /// Tile `index` of `set`.
    #[inline]
    pub fn tile(&self, set: TileSet, index: u8) -> &Tile {
        &self.tiles[set.slot(index)]
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of one 32x32 map of tile indices plus the set they index.
#[derive(Clone)]
pub struct TileMap {
    select: MapSelect,
    indices: [u8; MAP_TILES * MAP_TILES],
}

impl TileMap {
    /// Read the map selected by `select` from the bus.
    pub fn load<B: VideoBus + ?Sized>(bus: &B, select: MapSelect) -> Self {
        let base = select.map.address();
        let mut indices = [0u8; MAP_TILES * MAP_TILES];
        for (i, index) in indices.iter_mut().enumerate() {
            *index = bus.read(base + i as u16);
        }
        Self { select, indices }
    }

    pub fn select(&self) -> MapSelect {
        self.select
    }

    /// Tile index stored at map (`row`, `col`). Panics outside 32x32.
    #[inline]
    pub fn tile_index(&self, row: usize, col: usize) -> u8 {
        assert!(
            row < MAP_TILES && col < MAP_TILES,
            "tile map coordinate ({}, {}) out of range",
            row,
            col
        );
        self.indices[row * MAP_TILES + col]
    }

    /// Decoded tile at map (`row`, `col`).
    #[inline]
    pub fn tile<'a>(&self, tiles: &'a TileCache, row: usize, col: usize) -> &'a Tile {
        tiles.tile(self.select.tile_set, self.tile_index(row, col))
    }

    /// Shade of layer pixel (`x`, `y`); both wrap every 256 pixels.
    #[inline]
    pub fn shade_at(&self, tiles: &TileCache, x: usize, y: usize) -> u8 {
        let tile = self.tile(tiles, (y / TILE_SIZE) % MAP_TILES, (x / TILE_SIZE) % MAP_TILES);
        tile.pixel(y % TILE_SIZE, x % TILE_SIZE)
    }
}
