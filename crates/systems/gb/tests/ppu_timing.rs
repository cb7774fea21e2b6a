use emu_core::renderer::FrameCapture;
use emu_gb::bus::{
    GbBus, VideoBus, INT_LCD_STAT, INT_VBLANK, REG_BGP, REG_LCDC, REG_LYC, REG_OBP0, REG_SCX,
    REG_STAT, REG_WX, REG_WY,
};
use emu_gb::ppu::lcdc::SpriteHeight;
use emu_gb::ppu::sprite::SpriteCache;
use emu_gb::ppu::tile_map::TileCache;
use emu_gb::ppu::{Mode, DOTS_PER_FRAME, SCREEN_WIDTH};
use emu_gb::GbVideo;

const WHITE: u32 = 0xFFFFFFFF;
const LIGHT: u32 = 0xFFAAAAAA;
const BLACK: u32 = 0xFF000000;

fn video_with_solid_tile() -> GbVideo<FrameCapture> {
    let mut video = GbVideo::new();
    video.write(REG_BGP, 0xE4);
    video.bus_mut().load_vram(0x8010, &[0xFF; 16]);
    video
}

#[test]
fn sprite_scan_from_oam() {
    let mut bus = GbBus::new();
    bus.load_vram(0x8010, &[0xFF; 16]);
    bus.set_oam_entry(0, 32, 16, 1, 0);
    let mut tiles = TileCache::new();
    tiles.refresh(&bus);

    let mut cache = SpriteCache::new();
    cache.scan(&bus, &tiles, 16, SpriteHeight::Short);
    for column in 16..24 {
        let (sprite, _) = cache.column(column).unwrap();
        assert_eq!((sprite.y, sprite.x), (32, 16));
    }
}

#[test]
fn mode_sequence_over_one_line() {
    let mut video = GbVideo::new();
    let mut modes = Vec::new();
    for _ in 0..456 {
        video.tick();
        let mode = video.read(REG_STAT) & 0x03;
        if modes.last() != Some(&mode) {
            modes.push(mode);
        }
    }
    assert_eq!(
        modes,
        vec![
            Mode::OamSearch.bits(),
            Mode::PixelTransfer.bits(),
            Mode::HBlank.bits()
        ]
    );
}

#[test]
fn one_presentation_per_frame() {
    let mut video = GbVideo::new();
    for _ in 0..(3 * DOTS_PER_FRAME) {
        video.tick();
    }
    assert_eq!(video.sink().presented(), 3);
    assert_ne!(video.bus().interrupt_flags() & INT_VBLANK, 0);
}

#[test]
fn mid_frame_scroll_split() {
    // Tile 1 at map column 1: shade 3 on x 8..16 of the background.
    let mut video = video_with_solid_tile();
    for row in 0..32u16 {
        video.write(0x9801 + row * 32, 1);
    }

    // Lines 0..72 unscrolled, lines 72.. scrolled by 8.
    video.run_to(0, 72).unwrap();
    video.write(REG_SCX, 8);
    let frame = video.step_frame().clone();

    assert_eq!(frame.pixel(0, 71), WHITE);
    assert_eq!(frame.pixel(8, 71), BLACK);
    assert_eq!(frame.pixel(0, 72), BLACK);
    assert_eq!(frame.pixel(8, 72), WHITE);
}

#[test]
fn mid_line_scroll_change_affects_following_columns() {
    let mut video = video_with_solid_tile();
    for row in 0..32u16 {
        video.write(0x9801 + row * 32, 1);
    }
    // Column 4 is written at dot 84.
    video.run_to(84, 10).unwrap();
    video.write(REG_SCX, 8);
    let frame = video.step_frame().clone();
    for x in 0..4 {
        assert_eq!(frame.pixel(x, 10), WHITE);
    }
    for x in 4..8 {
        assert_eq!(frame.pixel(x, 10), BLACK);
    }
}

#[test]
fn lyc_request_through_driver() {
    let mut video = GbVideo::new();
    video.write(REG_LYC, 100);
    video.run_to(455, 99).unwrap();
    assert_eq!(video.bus().interrupt_flags() & INT_LCD_STAT, 0);
    video.tick();
    assert_eq!(video.bus().interrupt_flags() & INT_LCD_STAT, INT_LCD_STAT);

    // Acknowledged on a later line, it stays clear until the next match.
    video.run_to(0, 101).unwrap();
    video.bus_mut().clear_interrupts(INT_LCD_STAT);
    video.run_to(0, 100).unwrap();
    assert_eq!(video.bus().interrupt_flags() & INT_LCD_STAT, INT_LCD_STAT);
}

#[test]
fn lyc_written_straight_to_the_bus() {
    let mut video = GbVideo::new();
    video.bus_mut().write(REG_LYC, 5);
    video.run_to(10, 5).unwrap();
    assert_eq!(video.bus().interrupt_flags() & INT_LCD_STAT, INT_LCD_STAT);
}

#[test]
fn eleventh_sprite_on_a_line_is_dropped() {
    let mut video = video_with_solid_tile();
    video.write(REG_LCDC, 0x93);
    video.write(REG_OBP0, 0b0100_0000);
    for i in 0..11 {
        video.bus_mut().set_oam_entry(i, 16, 8 + i as u8 * 12, 1, 0);
    }
    let frame = video.step_frame().clone();
    for i in 0..10 {
        assert_eq!(frame.pixel(i * 12, 0), LIGHT, "sprite {}", i);
    }
    assert_eq!(frame.pixel(120, 0), WHITE);
    // Off the sprites' rows the background shows.
    assert_eq!(frame.pixel(0, 8), WHITE);
}

#[test]
fn tall_sprite_spans_sixteen_lines() {
    let mut video = video_with_solid_tile();
    // Tile 0 is blank, tile 1 solid: sprite tile 0 in 8x16 mode is blank on
    // top and solid below.
    video.write(REG_LCDC, 0x97);
    video.write(REG_OBP0, 0b0100_0000);
    video.bus_mut().set_oam_entry(0, 16, 8, 0, 0);
    let frame = video.step_frame().clone();
    assert_eq!(frame.pixel(0, 7), WHITE);
    assert_eq!(frame.pixel(0, 8), LIGHT);
    assert_eq!(frame.pixel(0, 15), LIGHT);
    assert_eq!(frame.pixel(0, 16), WHITE);
}

#[test]
fn window_left_of_screen_edge() {
    let mut video = video_with_solid_tile();
    // Window map at $9C00; column 1 is the solid tile.
    video.write(REG_LCDC, 0x91 | 0x20 | 0x40);
    video.write(0x9C01, 1);
    video.write(REG_WX, 3); // window starts at x = -4
    video.write(REG_WY, 0);
    let frame = video.step_frame().clone();
    // Screen x 4..12 is window x 8..16.
    assert_eq!(frame.pixel(3, 0), WHITE);
    assert_eq!(frame.pixel(4, 0), BLACK);
    assert_eq!(frame.pixel(11, 0), BLACK);
    assert_eq!(frame.pixel(12, 0), WHITE);
}

#[test]
fn every_visible_row_is_written() {
    let mut video = GbVideo::new();
    video.write(REG_BGP, 0xFF);
    let frame = video.step_frame();
    for y in 0..144 {
        let row = frame.row(y);
        assert_eq!(row.len(), SCREEN_WIDTH);
        assert!(row.iter().all(|&c| c == BLACK), "row {}", y);
    }
}
