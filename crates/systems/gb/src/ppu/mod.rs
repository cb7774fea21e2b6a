//! Game Boy PPU: scanline timing and pixel composition.
//!
//! The engine advances one dot per [`Ppu::tick`]. A frame is 154 lines of
//! 456 dots; lines 0-143 are visible and walk through three modes, lines
//! 144-153 are vertical blank.
//!
//! ```text
//! dot    0 ........ 79 | 80 ......... 251 | 252 ........ 455
//!        OAM search (2)| pixel transfer(3)| H-blank (0)        lines 0-143
//!        V-blank (1) ......................................... lines 144-153
//! ```
//!
//! Pixels are written during dots 80..240, one column per dot.
//!
//! ## Register latching
//!
//! - SCX is read on every pixel dot, so mid-line scroll writes take effect
//!   on the next column.
//! - SCY, WX, WY and the LCDC selections are latched at dot 0 of each
//!   visible line. The tile maps, tile data and sprite cache are reloaded
//!   at the same point.
//! - BGP/OBP0/OBP1 are latched once per frame at line 0.
//! - LYC is read after every dot, so a write lands on the next compare.

pub mod lcdc;
pub mod palette;
pub mod sprite;
pub mod tile_map;

use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::ppu::ShadeTable;
use emu_core::renderer::FrameSink;
use emu_core::types::Frame;
use thiserror::Error;

use crate::bus::{
    VideoBus, INT_LCD_STAT, INT_VBLANK, REG_LCDC, REG_LY, REG_LYC, REG_SCX, REG_SCY, REG_STAT,
    REG_WX, REG_WY,
};
use lcdc::LcdcConfig;
use palette::{PaletteSelect, PaletteSet};
use sprite::SpriteCache;
use tile_map::{TileCache, TileMap};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
pub const DOTS_PER_LINE: u16 = 456;
pub const LINES_PER_FRAME: u8 = 154;
pub const VISIBLE_LINES: u8 = 144;
pub const DOTS_PER_FRAME: u32 = DOTS_PER_LINE as u32 * LINES_PER_FRAME as u32;
/// First dot of pixel transfer.
pub const OAM_SEARCH_END: u16 = 80;
/// First dot of H-blank.
pub const PIXEL_TRANSFER_END: u16 = 252;
/// One past the last dot that writes a pixel.
const PIXEL_WRITE_END: u16 = OAM_SEARCH_END + SCREEN_WIDTH as u16;

const STAT_MODE_MASK: u8 = 0x03;
const STAT_MODE_SWITCH: u8 = 0x80;

/// PPU mode as reported in STAT bits 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamSearch = 2,
    PixelTransfer = 3,
}

impl Mode {
    /// Mode in effect at (`dot`, `line`). Panics outside the frame.
    pub fn at(dot: u16, line: u8) -> Self {
        assert!(dot < DOTS_PER_LINE, "dot {} out of range", dot);
        assert!(line < LINES_PER_FRAME, "line {} out of range", line);
        if line >= VISIBLE_LINES {
            Mode::VBlank
        } else if dot < OAM_SEARCH_END {
            Mode::OamSearch
        } else if dot < PIXEL_TRANSFER_END {
            Mode::PixelTransfer
        } else {
            Mode::HBlank
        }
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PpuError {
    #[error("dot {0} is outside 0..456")]
    DotOutOfRange(u16),
    #[error("line {0} is outside 0..154")]
    LineOutOfRange(u8),
}

/// Where the beam is: the next (dot, line) `tick` will execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    dot: u16,
    line: u8,
}

impl Position {
    pub fn new(dot: u16, line: u8) -> Result<Self, PpuError> {
        if dot >= DOTS_PER_LINE {
            return Err(PpuError::DotOutOfRange(dot));
        }
        if line >= LINES_PER_FRAME {
            return Err(PpuError::LineOutOfRange(line));
        }
        Ok(Self { dot, line })
    }

    #[inline]
    pub fn dot(&self) -> u16 {
        self.dot
    }

    #[inline]
    pub fn line(&self) -> u8 {
        self.line
    }

    pub fn mode(&self) -> Mode {
        Mode::at(self.dot, self.line)
    }

    /// Step one dot. Returns true when a new line starts.
    fn advance(&mut self) -> bool {
        self.dot += 1;
        if self.dot < DOTS_PER_LINE {
            return false;
        }
        self.dot = 0;
        self.line += 1;
        if self.line == LINES_PER_FRAME {
            self.line = 0;
        }
        true
    }
}

/// Everything latched at OAM search entry for one visible line.
struct LineState {
    line: u8,
    config: LcdcConfig,
    scroll_y: u8,
    /// WX - 7; negative when WX < 7.
    window_x: i16,
    window_y: u8,
    background: TileMap,
    window: TileMap,
}

pub struct Ppu {
    position: Position,
    framebuffer: Frame,
    shades: ShadeTable,
    palettes: PaletteSet,
    tiles: TileCache,
    sprites: SpriteCache,
    line_state: Option<LineState>,
    hblank: bool,
    frame_ready: bool,
    frames_presented: u64,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new(ShadeTable::default())
    }
}

impl Ppu {
    pub fn new(shades: ShadeTable) -> Self {
        Self {
            position: Position::default(),
            framebuffer: Frame::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32),
            shades,
            palettes: PaletteSet::default(),
            tiles: TileCache::new(),
            sprites: SpriteCache::new(),
            line_state: None,
            hblank: false,
            frame_ready: false,
            frames_presented: 0,
        }
    }

    /// Back to line 0, dot 0 with an empty framebuffer. The shade table is
    /// kept; register state lives on the bus.
    pub fn reset(&mut self) {
        self.position = Position::default();
        self.framebuffer = Frame::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
        self.palettes = PaletteSet::default();
        self.tiles = TileCache::new();
        self.sprites.clear();
        self.line_state = None;
        self.hblank = false;
        self.frame_ready = false;
        self.frames_presented = 0;
    }

    /// Execute the dot at the current position, then advance by one.
    pub fn tick<B, S>(&mut self, bus: &mut B, sink: &mut S)
    where
        B: VideoBus + ?Sized,
        S: FrameSink + ?Sized,
    {
        self.frame_ready = false;
        let Position { dot, line } = self.position;

        if dot == 0 {
            self.hblank = false;
            bus.write(REG_LY, line);
        }

        if line < VISIBLE_LINES {
            match dot {
                0 => self.enter_oam_search(bus, line),
                OAM_SEARCH_END => set_mode(bus, Mode::PixelTransfer),
                PIXEL_TRANSFER_END => {
                    set_mode(bus, Mode::HBlank);
                    self.hblank = true;
                }
                _ => {}
            }
            if (OAM_SEARCH_END..PIXEL_WRITE_END).contains(&dot) {
                self.render_pixel(&*bus, dot, line);
            }
        } else if line == VISIBLE_LINES && dot == 0 {
            self.enter_vblank(bus, sink);
        }

        if self.position.advance() {
            bus.write(REG_LY, self.position.line);
        }

        if bus.read(REG_LYC) == self.position.line {
            if self.position.dot == 0 {
                log(LogCategory::Interrupts, LogLevel::Debug, || {
                    format!("LYC match on line {}", self.position.line)
                });
            }
            bus.request_interrupt(INT_LCD_STAT);
        }
    }

    fn enter_oam_search<B: VideoBus + ?Sized>(&mut self, bus: &mut B, line: u8) {
        if line == 0 {
            self.palettes = PaletteSet::load(&*bus);
        }

        let config = LcdcConfig::decode(bus.read(REG_LCDC));
        let decoded = self.tiles.refresh(&*bus);
        if decoded > 0 {
            log(LogCategory::Timing, LogLevel::Trace, || {
                format!("line {}: {} tiles re-decoded", line, decoded)
            });
        }

        if config.sprites_enabled {
            self.sprites.scan(&*bus, &self.tiles, line, config.sprite_height);
        } else {
            self.sprites.clear();
        }

        self.line_state = Some(LineState {
            line,
            config,
            scroll_y: bus.read(REG_SCY),
            window_x: bus.read(REG_WX) as i16 - 7,
            window_y: bus.read(REG_WY),
            background: TileMap::load(&*bus, config.background),
            window: TileMap::load(&*bus, config.window),
        });

        let stat = bus.read(REG_STAT);
        bus.write(
            REG_STAT,
            (stat & !STAT_MODE_MASK) | STAT_MODE_SWITCH | Mode::OamSearch.bits(),
        );
    }

    fn enter_vblank<B, S>(&mut self, bus: &mut B, sink: &mut S)
    where
        B: VideoBus + ?Sized,
        S: FrameSink + ?Sized,
    {
        set_mode(bus, Mode::VBlank);
        self.line_state = None;

        sink.present(&self.framebuffer);
        self.frames_presented += 1;
        self.frame_ready = true;
        bus.request_interrupt(INT_VBLANK);

        log(LogCategory::Frame, LogLevel::Debug, || {
            format!("frame {} presented to {}", self.frames_presented, sink.name())
        });
    }

    fn render_pixel<B: VideoBus + ?Sized>(&mut self, bus: &B, dot: u16, line: u8) {
        let state = match self.line_state.as_ref() {
            Some(state) if state.line == line => state,
            _ => panic!("pixel transfer on line {} before its OAM search", line),
        };
        let x = (dot - OAM_SEARCH_END) as usize;
        let y = line as usize;

        let scroll_x = bus.read(REG_SCX);
        let mut base = state.background.shade_at(
            &self.tiles,
            (scroll_x as usize + x) & 0xFF,
            (state.scroll_y as usize + y) & 0xFF,
        );

        if state.config.window_enabled && x as i16 >= state.window_x && line >= state.window_y {
            base = state.window.shade_at(
                &self.tiles,
                (x as i16 - state.window_x) as usize,
                (line - state.window_y) as usize,
            );
        }

        let mut color = self
            .palettes
            .get(PaletteSelect::Background)
            .color(base, &self.shades);
        if state.config.sprites_enabled {
            if let Some((sprite, shade)) = self.sprites.sprite_at(x) {
                if (!sprite.behind_background() || base == 0) && shade != 0 {
                    color = self
                        .palettes
                        .get(sprite.palette())
                        .color(shade, &self.shades);
                }
            }
        }

        self.framebuffer.set_pixel(x as u32, y as u32, color);
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn mode(&self) -> Mode {
        self.position.mode()
    }

    /// True from dot 252 of a visible line until the next line starts or the
    /// driver acknowledges it.
    pub fn is_hblank(&self) -> bool {
        self.hblank
    }

    pub fn clear_hblank_indicator(&mut self) {
        self.hblank = false;
    }

    /// True only right after the tick that presented a frame.
    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn framebuffer(&self) -> &Frame {
        &self.framebuffer
    }

    pub fn shades(&self) -> &ShadeTable {
        &self.shades
    }

    /// Takes effect from the next pixel written.
    pub fn set_shades(&mut self, shades: ShadeTable) {
        self.shades = shades;
    }
}

/// Write the mode into STAT bits 0-1, keeping the rest.
fn set_mode<B: VideoBus + ?Sized>(bus: &mut B, mode: Mode) {
    let stat = bus.read(REG_STAT);
    bus.write(REG_STAT, (stat & !STAT_MODE_MASK) | mode.bits());
    log(LogCategory::Timing, LogLevel::Trace, || format!("mode {:?}", mode));
}
