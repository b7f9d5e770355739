use anyhow::{anyhow, Context, Result};
use image::{imageops, DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// A decoded video frame: owned RGB8 pixels plus dimensions.
///
/// Frames are plain values; the pipeline hands copies across threads rather
/// than sharing live buffers.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(anyhow!(
                "pixel buffer is {} bytes, expected {} for {}x{} rgb",
                pixels.len(),
                expected,
                width,
                height
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Decode an encoded image (JPEG) into an RGB frame.
    pub fn from_jpeg(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).context("decode image")?;
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self {
            pixels: rgb.into_raw(),
            width,
            height,
        })
    }

    /// A solid-color frame.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&rgb);
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    /// The frame published while the stream is down: dark background with a
    /// red band across the middle.
    pub fn placeholder(width: u32, height: u32) -> Self {
        let mut frame = Self::solid(width, height, [24, 24, 24]);
        let band_top = height / 2 - height / 10;
        let band_bottom = height / 2 + height / 10;
        for y in band_top..band_bottom {
            for x in 0..width {
                let idx = (y as usize * width as usize + x as usize) * 3;
                frame.pixels[idx] = 180;
                frame.pixels[idx + 1] = 30;
                frame.pixels[idx + 2] = 30;
            }
        }
        frame
    }

    /// Bilinear resize to the given resolution.
    pub fn resize(&self, width: u32, height: u32) -> Result<Self> {
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        let img = self.to_rgb_image()?;
        let resized = imageops::resize(&img, width, height, imageops::FilterType::Triangle);
        Ok(Self {
            pixels: resized.into_raw(),
            width,
            height,
        })
    }

    /// Encode the frame as JPEG for the republished video feed.
    pub fn to_jpeg(&self) -> Result<Vec<u8>> {
        let img = self.to_rgb_image()?;
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .context("encode jpeg")?;
        Ok(bytes)
    }

    fn to_rgb_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("pixel buffer does not match frame dimensions"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_frame_has_expected_size() {
        let frame = Frame::solid(4, 3, [1, 2, 3]);
        assert_eq!(frame.pixels.len(), 4 * 3 * 3);
        assert_eq!(&frame.pixels[..3], &[1, 2, 3]);
    }

    #[test]
    fn new_rejects_mismatched_buffer() {
        assert!(Frame::new(vec![0; 10], 4, 4).is_err());
    }

    #[test]
    fn jpeg_round_trip_preserves_dimensions() {
        let frame = Frame::solid(32, 16, [200, 100, 50]);
        let jpeg = frame.to_jpeg().unwrap();
        let decoded = Frame::from_jpeg(&jpeg).unwrap();
        assert_eq!(decoded.width, 32);
        assert_eq!(decoded.height, 16);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Frame::from_jpeg(b"definitely not a jpeg").is_err());
    }

    #[test]
    fn resize_changes_dimensions() {
        let frame = Frame::solid(64, 48, [10, 20, 30]);
        let small = frame.resize(32, 24).unwrap();
        assert_eq!(small.width, 32);
        assert_eq!(small.height, 24);
        assert_eq!(small.pixels.len(), 32 * 24 * 3);
    }
}
