//! Synthetic frame source: a deterministic moving test pattern, useful for
//! development and tests without camera hardware.

use anyhow::Result;

use super::StreamSource;
use crate::frame::Frame;

pub struct SyntheticSource {
    width: u32,
    height: u32,
    tick: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tick: 0,
        }
    }
}

impl StreamSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self) -> Result<Frame> {
        let shift = (self.tick as u32).wrapping_mul(4);
        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                pixels.push((x.wrapping_add(shift) % 256) as u8);
                pixels.push((y % 256) as u8);
                pixels.push((self.tick % 256) as u8);
            }
        }
        self.tick += 1;
        Frame::new(pixels, self.width, self.height)
    }

    fn stop(&mut self) {}

    // status() keeps the trait default.
}
