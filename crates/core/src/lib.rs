//! Core emulator primitives shared by the video subsystem.

pub mod logging;
pub mod ppu;
pub mod renderer;

pub mod types {
    use serde::{Deserialize, Serialize};

    /// A finished picture, one ARGB8888 value per pixel, row-major.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u32>,
    }

    impl Frame {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; (width * height) as usize],
            }
        }

        fn index(&self, x: u32, y: u32) -> usize {
            assert!(
                x < self.width && y < self.height,
                "pixel ({}, {}) outside {}x{} frame",
                x,
                y,
                self.width,
                self.height
            );
            (y * self.width + x) as usize
        }

        /// Read one pixel. Panics outside the frame.
        pub fn pixel(&self, x: u32, y: u32) -> u32 {
            self.pixels[self.index(x, y)]
        }

        /// Write one pixel. Panics outside the frame.
        pub fn set_pixel(&mut self, x: u32, y: u32, color: u32) {
            let idx = self.index(x, y);
            self.pixels[idx] = color;
        }

        /// Borrow a whole row.
        pub fn row(&self, y: u32) -> &[u32] {
            let start = self.index(0, y);
            &self.pixels[start..start + self.width as usize]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::types::Frame;

    #[test]
    fn frame_initialization() {
        let f = Frame::new(10, 10);
        assert_eq!(f.pixels.len(), 100);
        assert_eq!(f.width, 10);
        assert_eq!(f.height, 10);
    }

    #[test]
    fn frame_pixel_access() {
        let mut f = Frame::new(4, 3);
        f.set_pixel(3, 2, 0xFF123456);
        assert_eq!(f.pixel(3, 2), 0xFF123456);
        assert_eq!(f.pixels[11], 0xFF123456);
        assert_eq!(f.row(2), &[0, 0, 0, 0xFF123456]);
    }

    #[test]
    #[should_panic(expected = "outside 4x3 frame")]
    fn frame_rejects_out_of_range_pixel() {
        let f = Frame::new(4, 3);
        f.pixel(4, 0);
    }

    #[test]
    fn frame_json_roundtrip() {
        let mut f = Frame::new(2, 2);
        f.set_pixel(1, 1, 0xFF000000);
        let s = serde_json::to_string(&f).expect("serialize");
        let back: Frame = serde_json::from_str(&s).expect("deserialize");
        assert_eq!(back, f);
    }
}
