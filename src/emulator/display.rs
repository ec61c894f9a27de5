//! The framebuffer and the primitives that draw on it.
//!
//! Pixels are kept in a buffer big enough for high resolution. Switching
//! resolution only changes how much of it is addressable, so nothing is lost.

use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
pub const HIRES_WIDTH: usize = 128;
pub const HIRES_HEIGHT: usize = 64;

type Pixels = [[bool; HIRES_WIDTH]; HIRES_HEIGHT];
const EMPTY_PIXELS: Pixels = [[false; HIRES_WIDTH]; HIRES_HEIGHT];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 64x32
    Standard,
    /// 128x64
    Extended,
}

impl Resolution {
    pub fn width(self) -> usize {
        match self {
            Resolution::Standard => SCREEN_WIDTH,
            Resolution::Extended => HIRES_WIDTH,
        }
    }

    pub fn height(self) -> usize {
        match self {
            Resolution::Standard => SCREEN_HEIGHT,
            Resolution::Extended => HIRES_HEIGHT,
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::Standard
    }
}

/// A sprite ready to be blitted: `rows` rows of `row_width` bits each,
/// most significant bit leftmost. Rows are 8 or 16 bits wide.
pub struct Sprite<'a> {
    pub data: &'a [u8],
    pub row_width: usize,
}

impl<'a> Sprite<'a> {
    /// One byte per row.
    pub fn narrow(data: &'a [u8]) -> Sprite<'a> {
        Sprite { data, row_width: 8 }
    }

    /// Two bytes per row, big endian.
    pub fn wide(data: &'a [u8]) -> Sprite<'a> {
        Sprite { data, row_width: 16 }
    }

    fn rows(&self) -> usize {
        self.data.len() / (self.row_width / 8)
    }

    fn bit(&self, row: usize, col: usize) -> bool {
        let bytes_per_row = self.row_width / 8;
        let byte = self.data[row * bytes_per_row + col / 8];
        byte & (0x80 >> (col % 8)) != 0
    }
}

#[derive(Clone)]
pub struct Display {
    pixels: Pixels,
    resolution: Resolution,
}

impl Display {
    pub fn new() -> Display {
        Display {
            pixels: EMPTY_PIXELS,
            resolution: Resolution::Standard,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        if self.resolution != resolution {
            log::debug!("Switching resolution to {:?}", resolution);
        }
        self.resolution = resolution;
    }

    pub fn width(&self) -> usize {
        self.resolution.width()
    }

    pub fn height(&self) -> usize {
        self.resolution.height()
    }

    /// Whether the pixel at `(x, y)` is lit. Coordinates outside the
    /// addressable area read as unlit.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width() && y < self.height() && self.pixels[y][x]
    }

    /// The addressable rows, top to bottom, each `width()` pixels long.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        let width = self.width();
        self.pixels[..self.height()].iter().map(move |row| &row[..width])
    }

    pub fn lit_count(&self) -> usize {
        self.rows().flatten().filter(|&&lit| lit).count()
    }

    /// Unlight every pixel.
    pub fn clear(&mut self) {
        self.pixels = EMPTY_PIXELS;
    }

    /// XOR a sprite onto the screen with its top left corner at `(x, y)`.
    /// The corner wraps onto the screen. Pixels running past the edges wrap
    /// when `wrap` is set and are clipped otherwise.
    /// Returns true if any lit pixel was turned off.
    pub fn draw(&mut self, x: usize, y: usize, sprite: &Sprite<'_>, wrap: bool) -> bool {
        let (width, height) = (self.width(), self.height());
        let (x0, y0) = (x % width, y % height);
        let mut collision = false;

        for row in 0..sprite.rows() {
            let mut py = y0 + row;
            if py >= height {
                if !wrap {
                    break;
                }
                py %= height;
            }
            for col in 0..sprite.row_width {
                let mut px = x0 + col;
                if px >= width {
                    if !wrap {
                        break;
                    }
                    px %= width;
                }
                if sprite.bit(row, col) {
                    let pixel = &mut self.pixels[py][px];
                    collision |= *pixel;
                    *pixel = !*pixel;
                }
            }
        }

        collision
    }

    /// Move everything down by `n` rows, blanking the rows uncovered at the top.
    pub fn scroll_down(&mut self, n: usize) {
        let (width, height) = (self.width(), self.height());
        for y in (0..height).rev() {
            for x in 0..width {
                self.pixels[y][x] = y >= n && self.pixels[y - n][x];
            }
        }
    }

    /// Move everything up by `n` rows, blanking the rows uncovered at the bottom.
    pub fn scroll_up(&mut self, n: usize) {
        let (width, height) = (self.width(), self.height());
        for y in 0..height {
            for x in 0..width {
                self.pixels[y][x] = y + n < height && self.pixels[y + n][x];
            }
        }
    }

    /// Move everything right by `n` columns.
    pub fn scroll_right(&mut self, n: usize) {
        let (width, height) = (self.width(), self.height());
        for row in self.pixels[..height].iter_mut() {
            for x in (0..width).rev() {
                row[x] = x >= n && row[x - n];
            }
        }
    }

    /// Move everything left by `n` columns.
    pub fn scroll_left(&mut self, n: usize) {
        let (width, height) = (self.width(), self.height());
        for row in self.pixels[..height].iter_mut() {
            for x in 0..width {
                row[x] = x + n < width && row[x + n];
            }
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Display {
    fn eq(&self, other: &Self) -> bool {
        self.resolution == other.resolution && self.pixels[..] == other.pixels[..]
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("resolution", &self.resolution)
            .field("lit", &self.lit_count())
            .finish()
    }
}

/// Draws the addressable area with `#` for lit pixels.
impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for &lit in row {
                write!(f, "{}", if lit { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
