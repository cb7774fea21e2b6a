//! Game Boy video subsystem
//!
//! `GbVideo` owns the register store, the PPU and the frame sink. A CPU core
//! drives it by calling [`GbVideo::tick`] once per dot and routing its video
//! register accesses through [`GbVideo::read`] / [`GbVideo::write`].

use std::path::Path;

use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::renderer::{FrameCapture, FrameSink};
use emu_core::types::Frame;

pub mod bus;
pub mod config;
pub mod ppu;

pub use bus::{GbBus, VideoBus};
pub use config::{ConfigError, VideoConfig};
pub use ppu::{Mode, Position, Ppu, PpuError};

use bus::{REG_LY, REG_STAT};

/// STAT bits the CPU may write (interrupt source enables).
const STAT_WRITABLE: u8 = 0x78;

#[derive(thiserror::Error, Debug)]
pub enum GbError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ppu(#[from] PpuError),
}

pub struct GbVideo<S = FrameCapture> {
    bus: GbBus,
    ppu: Ppu,
    sink: S,
}

impl Default for GbVideo<FrameCapture> {
    fn default() -> Self {
        Self::new()
    }
}

impl GbVideo<FrameCapture> {
    pub fn new() -> Self {
        Self::with_sink(FrameCapture::new())
    }

    /// Build from a config file, applying its log filter.
    pub fn from_config_file(path: &Path) -> Result<Self, GbError> {
        let config = VideoConfig::load(path)?;
        Self::with_config(&config, FrameCapture::new())
    }
}

impl<S: FrameSink> GbVideo<S> {
    pub fn with_sink(sink: S) -> Self {
        Self {
            bus: GbBus::new(),
            ppu: Ppu::default(),
            sink,
        }
    }

    pub fn with_config(config: &VideoConfig, sink: S) -> Result<Self, GbError> {
        config.apply_logging()?;
        Ok(Self {
            bus: GbBus::new(),
            ppu: Ppu::new(config.shades),
            sink,
        })
    }

    /// Advance one dot.
    #[inline]
    pub fn tick(&mut self) {
        self.ppu.tick(&mut self.bus, &mut self.sink);
    }

    /// Run to the start of the next line.
    pub fn step_line(&mut self) {
        self.tick();
        while self.ppu.position().dot() != 0 {
            self.tick();
        }
    }

    /// Run until the next frame has been presented and return it.
    pub fn step_frame(&mut self) -> &Frame {
        self.tick();
        while !self.ppu.frame_ready() {
            self.tick();
        }
        self.ppu.framebuffer()
    }

    /// Run until the PPU is about to execute (`dot`, `line`). Returns the
    /// number of dots executed.
    pub fn run_to(&mut self, dot: u16, line: u8) -> Result<u32, GbError> {
        let target = Position::new(dot, line)?;
        let mut ticks = 0;
        while self.ppu.position() != target {
            self.tick();
            ticks += 1;
        }
        Ok(ticks)
    }

    /// CPU read of a video register, VRAM or OAM.
    pub fn read(&self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    /// CPU write of a video register, VRAM or OAM.
    ///
    /// STAT keeps its mode bits and LY is read-only. Everything else,
    /// LYC included, lands on the bus where the PPU reads it.
    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            REG_STAT => {
                self.bus.stat = (self.bus.stat & !STAT_WRITABLE) | (val & STAT_WRITABLE);
            }
            REG_LY => log(LogCategory::Registers, LogLevel::Debug, || {
                format!("ignored write {:02X} to LY", val)
            }),
            _ => self.bus.write(addr, val),
        }
    }

    /// Restart the beam at line 0 and restore the post-boot registers.
    /// VRAM, OAM and the sink are kept.
    pub fn reset(&mut self) {
        self.bus.reset_registers();
        self.ppu.reset();
    }

    pub fn bus(&self) -> &GbBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut GbBus {
        &mut self.bus
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{INT_LCD_STAT, INT_VBLANK, REG_BGP, REG_LCDC, REG_LYC};
    use crate::ppu::DOTS_PER_FRAME;

    #[test]
    fn test_step_frame_presents_at_line_144() {
        let mut video = GbVideo::new();
        video.step_frame();
        assert_eq!(video.ppu().position(), Position::new(1, 144).unwrap());
        assert_eq!(video.sink().presented(), 1);

        video.step_frame();
        assert_eq!(video.sink().presented(), 2);
        assert_eq!(video.ppu().frames_presented(), 2);
    }

    #[test]
    fn test_step_frame_returns_presented_picture() {
        let mut video = GbVideo::new();
        video.write(REG_BGP, 0x03);
        let frame = video.step_frame().clone();
        assert!(frame.pixels.iter().all(|&c| c == 0xFF000000));
        assert_eq!(video.sink().last_frame(), Some(&frame));
    }

    #[test]
    fn test_step_line() {
        let mut video = GbVideo::new();
        video.step_line();
        assert_eq!(video.ppu().position(), Position::new(0, 1).unwrap());
        assert_eq!(video.read(REG_LY), 1);
    }

    #[test]
    fn test_run_to() {
        let mut video = GbVideo::new();
        assert_eq!(video.run_to(0, 144).unwrap(), 144 * 456);
        assert_eq!(video.run_to(0, 0).unwrap(), DOTS_PER_FRAME - 144 * 456);
        assert!(matches!(
            video.run_to(500, 0),
            Err(GbError::Ppu(PpuError::DotOutOfRange(500)))
        ));
    }

    #[test]
    fn test_stat_write_keeps_mode_bits() {
        let mut video = GbVideo::new();
        video.tick();
        video.write(REG_STAT, 0xFF);
        assert_eq!(video.read(REG_STAT), 0x80 | STAT_WRITABLE | Mode::OamSearch.bits());
        video.write(REG_STAT, 0x00);
        assert_eq!(video.read(REG_STAT) & STAT_WRITABLE, 0);
        assert_eq!(video.read(REG_STAT) & 0x03, Mode::OamSearch.bits());
    }

    #[test]
    fn test_ly_is_read_only() {
        let mut video = GbVideo::new();
        video.step_line();
        video.write(REG_LY, 0x42);
        assert_eq!(video.read(REG_LY), 1);
    }

    #[test]
    fn test_lyc_write_drives_line_compare() {
        let mut video = GbVideo::new();
        video.write(REG_LYC, 2);
        assert_eq!(video.read(REG_LYC), 2);

        video.step_line();
        assert_eq!(video.bus().interrupt_flags() & INT_LCD_STAT, 0);
        video.step_line();
        assert_eq!(video.bus().interrupt_flags() & INT_LCD_STAT, INT_LCD_STAT);
    }

    #[test]
    fn test_closure_sink() {
        let mut count = 0;
        {
            let mut video = GbVideo::with_sink(|frame: &Frame| {
                assert_eq!((frame.width, frame.height), (160, 144));
                count += 1;
            });
            video.step_frame();
            video.step_frame();
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_with_config_uses_shades() {
        let config = VideoConfig {
            shades: emu_core::ppu::ShadeTable::new([7, 8, 9, 10]),
            ..VideoConfig::default()
        };
        let mut video = GbVideo::with_config(&config, FrameCapture::new()).unwrap();
        let frame = video.step_frame();
        assert_eq!(frame.pixel(0, 0), 7);
    }

    #[test]
    fn test_from_config_file_missing() {
        let path = std::env::temp_dir().join("emu_gb_missing_video_config.json");
        assert!(matches!(
            GbVideo::from_config_file(&path),
            Err(GbError::Config(ConfigError::Io(_)))
        ));
    }

    #[test]
    fn test_reset() {
        let mut video = GbVideo::new();
        video.step_frame();
        video.reset();
        assert_eq!(video.ppu().position(), Position::default());
        assert_eq!(video.ppu().frames_presented(), 0);
    }

    #[test]
    fn test_reset_restores_registers() {
        let mut video = GbVideo::new();
        video.write(REG_LCDC, 0x93);
        video.write(REG_LYC, 7);
        video.write(0x8000, 0x3C);
        video.run_to(100, 150).unwrap();
        assert_eq!(video.read(REG_LY), 150);
        assert_ne!(video.bus().interrupt_flags() & INT_VBLANK, 0);

        video.reset();
        assert_eq!(video.read(REG_LY), 0);
        assert_eq!(video.read(REG_STAT), 0);
        assert_eq!(video.read(REG_LCDC), 0x91);
        assert_eq!(video.read(REG_LYC), 0);
        assert_eq!(video.bus().interrupt_flags(), 0);
        assert_eq!(video.read(0x8000), 0x3C);
        assert_eq!(video.sink().presented(), 1);

        video.tick();
        assert_eq!(video.read(REG_STAT) & 0x03, Mode::OamSearch.bits());
    }
}
