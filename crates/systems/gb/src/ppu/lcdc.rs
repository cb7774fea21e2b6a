//! LCDC (0xFF40) decoding.
//!
//! The PPU samples LCDC once per visible line, at OAM search entry, and keeps
//! the decoded `LcdcConfig` fixed for the rest of that line.

use super::tile_map::{MapSelect, TileMapBase, TileSet};

// LCDC bits
pub const LCDC_ENABLE: u8 = 0x80;
pub const LCDC_WIN_TILEMAP: u8 = 0x40;
pub const LCDC_WIN_ENABLE: u8 = 0x20;
pub const LCDC_BG_WIN_TILES: u8 = 0x10;
pub const LCDC_BG_TILEMAP: u8 = 0x08;
pub const LCDC_OBJ_SIZE: u8 = 0x04;
pub const LCDC_OBJ_ENABLE: u8 = 0x02;

/// Sprite height mode (LCDC bit 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteHeight {
    /// 8x8 sprites
    Short,
    /// 8x16 sprites built from a tile pair
    Tall,
}

impl SpriteHeight {
    #[inline]
    pub fn pixels(self) -> u8 {
        match self {
            SpriteHeight::Short => 8,
            SpriteHeight::Tall => 16,
        }
    }
}

/// Everything the per-line pipeline needs from LCDC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcdcConfig {
    pub sprites_enabled: bool,
    pub sprite_height: SpriteHeight,
    pub window_enabled: bool,
    pub background: MapSelect,
    pub window: MapSelect,
}

impl LcdcConfig {
    pub fn decode(lcdc: u8) -> Self {
        // One bit picks the tile set for both layers on this hardware; the
        // layers still carry their own selection.
        let tile_set = if lcdc & LCDC_BG_WIN_TILES != 0 {
            TileSet::Unsigned
        } else {
            TileSet::Signed
        };
        let map_for = |bit: u8| {
            if lcdc & bit != 0 {
                TileMapBase::High
            } else {
                TileMapBase::Low
            }
        };

        Self {
            sprites_enabled: lcdc & LCDC_OBJ_ENABLE != 0,
            sprite_height: if lcdc & LCDC_OBJ_SIZE != 0 {
                SpriteHeight::Tall
            } else {
                SpriteHeight::Short
            },
            window_enabled: lcdc & LCDC_WIN_ENABLE != 0,
            background: MapSelect {
                map: map_for(LCDC_BG_TILEMAP),
                tile_set,
            },
            window: MapSelect {
                map: map_for(LCDC_WIN_TILEMAP),
                tile_set,
            },
        }
    }
}
