//! Video register store and the handle the PPU uses to reach it.
//!
//! The PPU never holds a reference to whoever owns it. Each `tick` receives a
//! `VideoBus` through which it reads configuration, writes status/LY and raises
//! interrupt requests. `GbBus` is the concrete store a driver owns.
//!
//! # Memory Map (video-relevant subset)
//!
//! ```text
//! $8000-$97FF  Tile data (two overlapping 4KB windows)
//! $9800-$9BFF  Tile map 0
//! $9C00-$9FFF  Tile map 1
//! $FE00-$FE9F  OAM - 40 sprites x 4 bytes (Y, X, tile, attributes)
//! $FF0F        IF - interrupt flags
//! $FF40-$FF4B  LCD registers
//! ```
//!
//! ## LCD Registers
//! - `$FF40 (LCDC)`: LCD control
//! - `$FF41 (STAT)`: LCD status (bits 0-1 mode, written by the PPU)
//! - `$FF42 (SCY)`: Scroll Y
//! - `$FF43 (SCX)`: Scroll X
//! - `$FF44 (LY)`: Current line (written by the PPU)
//! - `$FF45 (LYC)`: Line compare
//! - `$FF47 (BGP)`: Background palette
//! - `$FF48 (OBP0)`: Object palette 0
//! - `$FF49 (OBP1)`: Object palette 1
//! - `$FF4A (WY)`: Window Y position
//! - `$FF4B (WX)`: Window X position + 7

use emu_core::logging::{log, LogCategory, LogLevel};

pub const VRAM_START: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9FFF;
pub const OAM_START: u16 = 0xFE00;
pub const OAM_END: u16 = 0xFE9F;

pub const REG_IF: u16 = 0xFF0F;
pub const REG_LCDC: u16 = 0xFF40;
pub const REG_STAT: u16 = 0xFF41;
pub const REG_SCY: u16 = 0xFF42;
pub const REG_SCX: u16 = 0xFF43;
pub const REG_LY: u16 = 0xFF44;
pub const REG_LYC: u16 = 0xFF45;
pub const REG_BGP: u16 = 0xFF47;
pub const REG_OBP0: u16 = 0xFF48;
pub const REG_OBP1: u16 = 0xFF49;
pub const REG_WY: u16 = 0xFF4A;
pub const REG_WX: u16 = 0xFF4B;

/// IF bit 0: vertical blank.
pub const INT_VBLANK: u8 = 0x01;
/// IF bit 1: LCD status.
pub const INT_LCD_STAT: u8 = 0x02;

/// Byte-addressed access to the video registers, VRAM and OAM.
pub trait VideoBus {
    fn read(&self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, val: u8);

    /// OR `mask` into IF. The PPU never clears request bits.
    fn request_interrupt(&mut self, mask: u8) {
        let current = self.read(REG_IF);
        self.write(REG_IF, current | mask);
    }
}

/// Flat storage for everything the PPU reads and writes.
pub struct GbBus {
    /// VRAM (8KB)
    vram: [u8; 0x2000],
    /// OAM (160 bytes)
    oam: [u8; 0xA0],
    /// Interrupt Flag register
    if_reg: u8,
    pub lcdc: u8,
    pub stat: u8,
    pub scy: u8,
    pub scx: u8,
    pub ly: u8,
    pub lyc: u8,
    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
    pub wy: u8,
    pub wx: u8,
}

impl Default for GbBus {
    fn default() -> Self {
        Self::new()
    }
}

impl GbBus {
    /// Post-boot DMG register values.
    pub fn new() -> Self {
        Self {
            vram: [0; 0x2000],
            oam: [0; 0xA0],
            if_reg: 0,
            lcdc: 0x91,
            stat: 0x00,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            bgp: 0xFC,
            obp0: 0xFF,
            obp1: 0xFF,
            wy: 0,
            wx: 0,
        }
    }

    /// Restore the post-boot register values and clear IF. VRAM and OAM
    /// are kept.
    pub fn reset_registers(&mut self) {
        *self = Self {
            vram: self.vram,
            oam: self.oam,
            ..Self::new()
        };
    }

    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    pub fn oam(&self) -> &[u8] {
        &self.oam
    }

    /// Copy `data` into VRAM starting at absolute address `addr`.
    pub fn load_vram(&mut self, addr: u16, data: &[u8]) {
        assert!(
            (VRAM_START..=VRAM_END).contains(&addr),
            "address {:04X} is not in VRAM",
            addr
        );
        let start = (addr - VRAM_START) as usize;
        assert!(
            start + data.len() <= self.vram.len(),
            "{} bytes at {:04X} overrun VRAM",
            data.len(),
            addr
        );
        self.vram[start..start + data.len()].copy_from_slice(data);
    }

    /// Write one 4-byte OAM entry.
    pub fn set_oam_entry(&mut self, index: usize, y: u8, x: u8, tile: u8, attributes: u8) {
        assert!(index < 40, "OAM entry {} out of range", index);
        self.oam[index * 4..index * 4 + 4].copy_from_slice(&[y, x, tile, attributes]);
    }

    pub fn interrupt_flags(&self) -> u8 {
        self.if_reg
    }

    /// Acknowledge (clear) interrupt bits, as the CPU side would.
    pub fn clear_interrupts(&mut self, mask: u8) {
        self.if_reg &= !mask;
    }
}

impl VideoBus for GbBus {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            VRAM_START..=VRAM_END => self.vram[(addr - VRAM_START) as usize],
            OAM_START..=OAM_END => self.oam[(addr - OAM_START) as usize],
            REG_IF => self.if_reg,
            REG_LCDC => self.lcdc,
            REG_STAT => self.stat,
            REG_SCY => self.scy,
            REG_SCX => self.scx,
            REG_LY => self.ly,
            REG_LYC => self.lyc,
            REG_BGP => self.bgp,
            REG_OBP0 => self.obp0,
            REG_OBP1 => self.obp1,
            REG_WY => self.wy,
            REG_WX => self.wx,
            _ => {
                log(LogCategory::Registers, LogLevel::Trace, || {
                    format!("read from unmapped address {:04X}", addr)
                });
                0xFF
            }
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        match addr {
            VRAM_START..=VRAM_END => self.vram[(addr - VRAM_START) as usize] = val,
            OAM_START..=OAM_END => self.oam[(addr - OAM_START) as usize] = val,
            REG_IF => self.if_reg = val,
            REG_LCDC => self.lcdc = val,
            REG_STAT => self.stat = val,
            REG_SCY => self.scy = val,
            REG_SCX => self.scx = val,
            REG_LY => self.ly = val,
            REG_LYC => self.lyc = val,
            REG_BGP => self.bgp = val,
            REG_OBP0 => self.obp0 = val,
            REG_OBP1 => self.obp1 = val,
            REG_WY => self.wy = val,
            REG_WX => self.wx = val,
            _ => log(LogCategory::Registers, LogLevel::Trace, || {
                format!("write {:02X} to unmapped address {:04X} ignored", val, addr)
            }),
        }
    }
}
