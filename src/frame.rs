use std::path::Path;

use anyhow::Context as _;

use crate::error::{JoyplotError, JoyplotResult};

/// Interleaved channels per pixel.
pub const CHANNELS: usize = 4;

/// One captured frame, stored as straight RGBA8.
///
/// Channel 0 (red) is read as brightness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl VideoFrame {
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> JoyplotResult<Self> {
        if width == 0 || height == 0 {
            return Err(JoyplotError::validation("frame width/height must be > 0"));
        }
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(JoyplotError::validation(format!(
                "frame byte length mismatch: got {}, expected {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Grey frame whose brightness at each pixel is `f(x, y)`.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> u8,
    ) -> JoyplotResult<Self> {
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let v = f(x, y);
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Self::from_rgba8(width, height, data)
    }

    pub fn solid(width: u32, height: u32, brightness: u8) -> JoyplotResult<Self> {
        Self::from_fn(width, height, |_, _| brightness)
    }

    pub fn from_image(img: &image::DynamicImage) -> JoyplotResult<Self> {
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        Self::from_rgba8(w, h, rgba.into_raw())
    }

    pub fn decode(bytes: &[u8]) -> JoyplotResult<Self> {
        let img = image::load_from_memory(bytes).context("decode image from memory")?;
        Self::from_image(&img)
    }

    pub fn open(path: &Path) -> JoyplotResult<Self> {
        let img = image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
        Self::from_image(&img)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Brightness (channel 0) at column `x`, row `y`.
    ///
    /// Coordinates past the right or bottom edge read the nearest edge pixel.
    pub fn brightness(&self, x: u32, y: u32) -> u8 {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let idx = x + y * self.width as usize;
        self.data[CHANNELS * idx]
    }
}
