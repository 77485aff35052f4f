//! Color types and operations.
//!
//! - `Rgba`: f64 components in [0, 1], used for background colors
//! - `Rgba8`: u8 components, the pixel type of every raster
//!
//! Component orders describe where each channel lives in a 4-byte pixel.

use crate::basics::{uround, CoverType};

// ============================================================================
// Component orders
// ============================================================================

/// RGBA component order: R=0, G=1, B=2, A=3
pub struct OrderRgba;
impl OrderRgba {
    pub const R: usize = 0;
    pub const G: usize = 1;
    pub const B: usize = 2;
    pub const A: usize = 3;
}

/// ARGB component order: A=0, R=1, G=2, B=3
pub struct OrderArgb;
impl OrderArgb {
    pub const A: usize = 0;
    pub const R: usize = 1;
    pub const G: usize = 2;
    pub const B: usize = 3;
}

// ============================================================================
// Rgba (f64 precision color)
// ============================================================================

/// RGBA color with f64 components in range [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent white, the default image background.
    pub fn transparent_white() -> Self {
        Self::new(1.0, 1.0, 1.0, 0.0)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

// ============================================================================
// Rgba8 (8-bit per channel)
// ============================================================================

/// RGBA color with u8 components, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BASE_SHIFT: u32 = 8;
    pub const BASE_SCALE: u32 = 1 << Self::BASE_SHIFT;
    pub const BASE_MASK: u32 = Self::BASE_SCALE - 1;
    pub const BASE_MSB: u32 = 1 << (Self::BASE_SHIFT - 1);

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert from `Rgba` (f64) to `Rgba8`, rounding each component.
    /// Components outside [0, 1] saturate.
    pub fn from_rgba(c: &Rgba) -> Self {
        Self {
            r: Self::from_double(c.r),
            g: Self::from_double(c.g),
            b: Self::from_double(c.b),
            a: Self::from_double(c.a),
        }
    }

    #[inline]
    pub fn from_double(a: f64) -> u8 {
        uround(a.clamp(0.0, 1.0) * Self::BASE_MASK as f64) as u8
    }

    /// Read a pixel stored in RGBA order.
    #[inline]
    pub fn from_slice(p: &[u8]) -> Self {
        Self {
            r: p[OrderRgba::R],
            g: p[OrderRgba::G],
            b: p[OrderRgba::B],
            a: p[OrderRgba::A],
        }
    }

    #[inline]
    pub fn to_array(&self) -> [u8; 4] {
        let mut p = [0u8; 4];
        p[OrderRgba::R] = self.r;
        p[OrderRgba::G] = self.g;
        p[OrderRgba::B] = self.b;
        p[OrderRgba::A] = self.a;
        p
    }

    /// Fixed-point multiply, exact over u8.
    /// `(a * b + 128) >> 8`, with rounding correction.
    #[inline]
    pub fn multiply(a: u8, b: u8) -> u8 {
        let t: u32 = a as u32 * b as u32 + Self::BASE_MSB;
        (((t >> Self::BASE_SHIFT) + t) >> Self::BASE_SHIFT) as u8
    }

    /// Multiply a color component by a cover.
    #[inline]
    pub fn mult_cover(a: u8, b: CoverType) -> u8 {
        Self::multiply(a, b)
    }

    /// Interpolate p to q by a.
    #[inline]
    pub fn lerp(p: u8, q: u8, a: u8) -> u8 {
        let t = (q as i32 - p as i32) * a as i32 + Self::BASE_MSB as i32 - (p > q) as i32;
        (p as i32 + (((t >> Self::BASE_SHIFT) + t) >> Self::BASE_SHIFT)) as u8
    }
}
