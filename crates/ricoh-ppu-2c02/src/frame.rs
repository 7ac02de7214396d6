//! RGB frame buffers.
//!
//! Used both for the 256x240 screen and for 128x128 pattern-table views.
//! Coordinates wrap modulo the buffer size instead of being rejected, so a
//! write from a half-configured raster position lands somewhere harmless.

/// One 24-bit colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Packed `0xAARRGGBB` with full alpha.
    #[must_use]
    pub const fn argb(self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

/// A width x height grid of colours, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl FrameBuffer {
    /// A black buffer. Zero dimensions are bumped to 1 so wrapping stays
    /// defined.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![Rgb::default(); width * height],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        let x = i64::from(x).rem_euclid(self.width as i64) as usize;
        let y = i64::from(y).rem_euclid(self.height as i64) as usize;
        y * self.width + x
    }

    /// Write a pixel, wrapping both coordinates.
    pub fn set_pixel(&mut self, x: i32, y: i32, colour: Rgb) {
        let index = self.index(x, y);
        self.pixels[index] = colour;
    }

    /// Read a pixel, wrapping both coordinates.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Rgb {
        self.pixels[self.index(x, y)]
    }

    #[must_use]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Pixels packed as ARGB32 for front-ends that upload textures.
    #[must_use]
    pub fn to_argb(&self) -> Vec<u32> {
        self.pixels.iter().map(|p| p.argb()).collect()
    }
}
