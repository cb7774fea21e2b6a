//! OAM scan and the per-line sprite column cache.
//!
//! # OAM entry layout
//!
//! ```text
//! byte 0  Y position + 16
//! byte 1  X position + 8
//! byte 2  tile index (always from $8000, unsigned)
//! byte 3  attributes
//!           bit 7  behind background (BG shades 1-3 cover the sprite)
//!           bit 6  flip Y
//!           bit 5  flip X
//!           bit 4  palette (0 = OBP0, 1 = OBP1)
//! ```
//!
//! The cache is indexed by absolute X (`x + 0..8`, so 0..=263); screen
//! column `c` is looked up at `c + 8`.

use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::ppu::tile::TILE_SIZE;

use super::lcdc::SpriteHeight;
use super::palette::PaletteSelect;
use super::tile_map::{TileCache, TileSet};
use crate::bus::{VideoBus, OAM_START};

pub const OAM_ENTRIES: usize = 40;
pub const MAX_SPRITES_PER_LINE: usize = 10;
/// Absolute columns a sprite can cover: x in 0..=255 plus 8 pixels.
pub const SPRITE_COLUMNS: usize = 256 + TILE_SIZE;

const ATTR_BEHIND_BG: u8 = 0x80;
const ATTR_FLIP_Y: u8 = 0x40;
const ATTR_FLIP_X: u8 = 0x20;
const ATTR_OBP1: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub y: u8,
    pub x: u8,
    pub tile: u8,
    pub attributes: u8,
    pub oam_index: u8,
}

impl Sprite {
    /// Read OAM entry `index` through the bus.
    pub fn read<B: VideoBus + ?Sized>(bus: &B, index: usize) -> Self {
        assert!(index < OAM_ENTRIES, "OAM entry {} out of range", index);
        let base = OAM_START + (index * 4) as u16;
        Self {
            y: bus.read(base),
            x: bus.read(base + 1),
            tile: bus.read(base + 2),
            attributes: bus.read(base + 3),
            oam_index: index as u8,
        }
    }

    #[inline]
    pub fn behind_background(&self) -> bool {
        self.attributes & ATTR_BEHIND_BG != 0
    }

    #[inline]
    pub fn flip_y(&self) -> bool {
        self.attributes & ATTR_FLIP_Y != 0
    }

    #[inline]
    pub fn flip_x(&self) -> bool {
        self.attributes & ATTR_FLIP_X != 0
    }

    #[inline]
    pub fn uses_obp1(&self) -> bool {
        self.attributes & ATTR_OBP1 != 0
    }

    pub fn palette(&self) -> PaletteSelect {
        if self.uses_obp1() {
            PaletteSelect::Obp1
        } else {
            PaletteSelect::Obp0
        }
    }

    /// Whether the sprite covers `line`: `y <= line + 16 < y + height`.
    #[inline]
    pub fn in_range(&self, line: u8, height: SpriteHeight) -> bool {
        let target = line as u16 + 16;
        let top = self.y as u16;
        top <= target && target < top + height.pixels() as u16
    }
}

/// Shade of `sprite` at (`row`, `col`) relative to its top-left corner.
///
/// Flips are applied here. Tall sprites take the top half from `tile & 0xFE`
/// and the bottom half from `tile | 0x01`.
pub fn sprite_pixel(
    sprite: &Sprite,
    height: SpriteHeight,
    row: usize,
    col: usize,
    tiles: &TileCache,
) -> u8 {
    let h = height.pixels() as usize;
    assert!(
        row < h && col < TILE_SIZE,
        "sprite pixel ({}, {}) outside 8x{}",
        row,
        col,
        h
    );
    let row = if sprite.flip_y() { h - 1 - row } else { row };
    let col = if sprite.flip_x() { TILE_SIZE - 1 - col } else { col };

    let (tile, row) = match height {
        SpriteHeight::Short => (sprite.tile, row),
        SpriteHeight::Tall if row < TILE_SIZE => (sprite.tile & 0xFE, row),
        SpriteHeight::Tall => (sprite.tile | 0x01, row - TILE_SIZE),
    };
    tiles.tile(TileSet::Unsigned, tile).pixel(row, col)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnHit {
    slot: u8,
    shade: u8,
}

/// Sprites selected for one line and the column ownership between them.
pub struct SpriteCache {
    sprites: Vec<Sprite>,
    columns: [Option<ColumnHit>; SPRITE_COLUMNS],
}

impl SpriteCache {
    pub fn new() -> Self {
        Self {
            sprites: Vec::with_capacity(MAX_SPRITES_PER_LINE),
            columns: [None; SPRITE_COLUMNS],
        }
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
        self.columns = [None; SPRITE_COLUMNS];
    }

    /// Rebuild the cache for `line`. Returns the number of sprites selected.
    ///
    /// OAM is walked in table order and the walk stops at the tenth visible
    /// sprite. Inside a column the sprite with the smaller X wins; equal X
    /// keeps whichever was scanned first.
    pub fn scan<B: VideoBus + ?Sized>(
        &mut self,
        bus: &B,
        tiles: &TileCache,
        line: u8,
        height: SpriteHeight,
    ) -> usize {
        self.clear();

        for index in 0..OAM_ENTRIES {
            if self.sprites.len() == MAX_SPRITES_PER_LINE {
                break;
            }
            let sprite = Sprite::read(bus, index);
            if !sprite.in_range(line, height) {
                continue;
            }

            let slot = self.sprites.len() as u8;
            let row = (line as usize + 16) - sprite.y as usize;
            for i in 0..TILE_SIZE {
                let column = sprite.x as usize + i;
                let shade = sprite_pixel(&sprite, height, row, i, tiles);
                if shade == 0 {
                    continue;
                }
                let claim = match self.columns[column] {
                    None => true,
                    Some(hit) => sprite.x < self.sprites[hit.slot as usize].x,
                };
                if claim {
                    self.columns[column] = Some(ColumnHit { slot, shade });
                }
            }
            self.sprites.push(sprite);
        }

        assert!(
            self.sprites.len() <= MAX_SPRITES_PER_LINE,
            "sprite cache holds {} sprites",
            self.sprites.len()
        );
        log(LogCategory::Sprites, LogLevel::Trace, || {
            format!("line {}: {} sprites selected", line, self.sprites.len())
        });
        self.sprites.len()
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Owner of absolute column `column` and its shade.
    pub fn column(&self, column: usize) -> Option<(&Sprite, u8)> {
        self.columns
            .get(column)
            .copied()
            .flatten()
            .map(|hit| (&self.sprites[hit.slot as usize], hit.shade))
    }

    /// Owner of screen column `screen_x` (looked up at `screen_x + 8`).
    #[inline]
    pub fn sprite_at(&self, screen_x: usize) -> Option<(&Sprite, u8)> {
        self.column(screen_x + TILE_SIZE)
    }
}

impl Default for SpriteCache {
    fn default() -> Self {
        Self::new()
    }
}
