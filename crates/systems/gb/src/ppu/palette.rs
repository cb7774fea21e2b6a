//! BGP / OBP0 / OBP1 decoding.
//!
//! Each register packs four 2-bit entries: shade `i` maps to
//! `(byte >> 2i) & 3`, and that entry picks one of the four renderable
//! colours in a `ShadeTable`.

use emu_core::ppu::{IndexedPalette, ShadeTable};

use crate::bus::{VideoBus, REG_BGP, REG_OBP0, REG_OBP1};

/// One decoded palette register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    entries: [u8; 4],
}

impl Palette {
    pub fn decode(byte: u8) -> Self {
        let mut entries = [0u8; 4];
        for (i, entry) in entries.iter_mut().enumerate() {
            *entry = (byte >> (2 * i)) & 0x03;
        }
        Self { entries }
    }

    /// Palette entry for `shade`. Panics if `shade` is not 0-3.
    #[inline]
    pub fn entry(&self, shade: u8) -> u8 {
        assert!(shade < 4, "shade {} out of range", shade);
        self.entries[shade as usize]
    }

    pub fn entries(&self) -> [u8; 4] {
        self.entries
    }

    /// Final colour for `shade`.
    #[inline]
    pub fn color(&self, shade: u8, table: &ShadeTable) -> u32 {
        table.color(self.entry(shade))
    }
}

/// Which palette a composed pixel goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteSelect {
    Background,
    Obp0,
    Obp1,
}

/// The three palettes the PPU renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteSet {
    pub bgp: Palette,
    pub obp0: Palette,
    pub obp1: Palette,
}

impl PaletteSet {
    pub fn load<B: VideoBus + ?Sized>(bus: &B) -> Self {
        Self {
            bgp: Palette::decode(bus.read(REG_BGP)),
            obp0: Palette::decode(bus.read(REG_OBP0)),
            obp1: Palette::decode(bus.read(REG_OBP1)),
        }
    }

    #[inline]
    pub fn get(&self, select: PaletteSelect) -> &Palette {
        match select {
            PaletteSelect::Background => &self.bgp,
            PaletteSelect::Obp0 => &self.obp0,
            PaletteSelect::Obp1 => &self.obp1,
        }
    }
}

impl Default for PaletteSet {
    /// Power-on register values: BGP 0xFC, OBP0/OBP1 0xFF.
    fn default() -> Self {
        Self {
            bgp: Palette::decode(0xFC),
            obp0: Palette::decode(0xFF),
            obp1: Palette::decode(0xFF),
        }
    }
}
