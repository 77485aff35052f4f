//! RGBA pixel format with alpha blending.
//!
//! Reads and writes straight-alpha RGBA32 pixels in a [`RenderingBuffer`].
//! Blending lerps the colour channels toward the source by
//! `alpha = source.a * cover` and pushes destination alpha toward opaque by
//! the same amount.

use crate::basics::{CoverType, COVER_FULL};
use crate::color::Rgba8;
use crate::rendering_buffer::{RenderingBuffer, BPP};

// ============================================================================
// PixelFormat trait
// ============================================================================

/// Pixel-level access used by the renderers. Coordinates are assumed to be
/// inside the raster; clipping is the caller's job.
pub trait PixelFormat {
    type ColorType;

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn pixel(&self, x: i32, y: i32) -> Self::ColorType;

    /// Overwrite the pixel at (x, y).
    fn copy_pixel(&mut self, x: i32, y: i32, c: &Self::ColorType);

    /// Blend `c` at (x, y) with coverage `cover`.
    fn blend_pixel(&mut self, x: i32, y: i32, c: &Self::ColorType, cover: CoverType);

    /// Overwrite `colors.len()` pixels starting at (x, y).
    fn copy_color_hspan(&mut self, x: i32, y: i32, colors: &[Self::ColorType]);

    /// Copy `len` pixels of row `ysrc` of `src`, starting at `xsrc`, to
    /// (xdst, ydst).
    fn copy_from(
        &mut self,
        src: &RenderingBuffer<'_>,
        xdst: i32,
        ydst: i32,
        xsrc: i32,
        ysrc: i32,
        len: u32,
    );

    /// Write a span of per-pixel colours with per-pixel coverage.
    ///
    /// Fully covered pixels receive their colour verbatim, alpha included.
    /// Partially covered pixels are blended with `alpha = c.a * cover`.
    fn blend_color_hspan(
        &mut self,
        x: i32,
        y: i32,
        colors: &[Self::ColorType],
        covers: &[CoverType],
    );
}

// ============================================================================
// PixfmtRgba32: non-premultiplied RGBA, 8 bits per channel
// ============================================================================

pub struct PixfmtRgba32<'r, 'a> {
    rbuf: &'r mut RenderingBuffer<'a>,
}

impl<'r, 'a> PixfmtRgba32<'r, 'a> {
    pub fn new(rbuf: &'r mut RenderingBuffer<'a>) -> Self {
        Self { rbuf }
    }

    /// Set every pixel to `c`.
    pub fn clear(&mut self, c: &Rgba8) {
        self.rbuf.fill(*c);
    }

    pub fn rbuf(&self) -> &RenderingBuffer<'a> {
        self.rbuf
    }

    #[inline]
    fn pix_mut(&mut self, x: i32, y: i32) -> &mut [u8] {
        let off = x as usize * BPP;
        &mut self.rbuf.row_slice_mut(y as u32)[off..off + BPP]
    }

    #[inline]
    fn blend_pix(p: &mut [u8], c: &Rgba8, alpha: u8) {
        p[0] = Rgba8::lerp(p[0], c.r, alpha);
        p[1] = Rgba8::lerp(p[1], c.g, alpha);
        p[2] = Rgba8::lerp(p[2], c.b, alpha);
        p[3] = Rgba8::lerp(p[3], 255, alpha);
    }

    #[inline]
    fn copy_or_blend_pix(p: &mut [u8], c: &Rgba8, cover: CoverType) {
        let alpha = Rgba8::mult_cover(c.a, cover);
        if alpha == 255 {
            p.copy_from_slice(&[c.r, c.g, c.b, 255]);
        } else if alpha > 0 {
            Self::blend_pix(p, c, alpha);
        }
    }
}

impl PixelFormat for PixfmtRgba32<'_, '_> {
    type ColorType = Rgba8;

    fn width(&self) -> u32 {
        self.rbuf.width()
    }

    fn height(&self) -> u32 {
        self.rbuf.height()
    }

    fn pixel(&self, x: i32, y: i32) -> Rgba8 {
        self.rbuf.pixel(x as u32, y as u32)
    }

    fn copy_pixel(&mut self, x: i32, y: i32, c: &Rgba8) {
        self.pix_mut(x, y).copy_from_slice(&c.to_array());
    }

    fn blend_pixel(&mut self, x: i32, y: i32, c: &Rgba8, cover: CoverType) {
        Self::copy_or_blend_pix(self.pix_mut(x, y), c, cover);
    }

    fn copy_color_hspan(&mut self, x: i32, y: i32, colors: &[Rgba8]) {
        let off = x as usize * BPP;
        let row = &mut self.rbuf.row_slice_mut(y as u32)[off..off + colors.len() * BPP];
        for (dst, c) in row.chunks_exact_mut(BPP).zip(colors) {
            dst.copy_from_slice(&c.to_array());
        }
    }

    fn copy_from(
        &mut self,
        src: &RenderingBuffer<'_>,
        xdst: i32,
        ydst: i32,
        xsrc: i32,
        ysrc: i32,
        len: u32,
    ) {
        let n = len as usize * BPP;
        let s = xsrc as usize * BPP;
        let d = xdst as usize * BPP;
        let from = &src.row_slice(ysrc as u32)[s..s + n];
        self.rbuf.row_slice_mut(ydst as u32)[d..d + n].copy_from_slice(from);
    }

    fn blend_color_hspan(&mut self, x: i32, y: i32, colors: &[Rgba8], covers: &[CoverType]) {
        let off = x as usize * BPP;
        let row = &mut self.rbuf.row_slice_mut(y as u32)[off..off + colors.len() * BPP];
        for ((dst, c), &cover) in row.chunks_exact_mut(BPP).zip(colors).zip(covers) {
            if cover == COVER_FULL {
                dst.copy_from_slice(&c.to_array());
            } else {
                Self::copy_or_blend_pix(dst, c, cover);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(w: u32, h: u32) -> RenderingBuffer<'static> {
        RenderingBuffer::new(w, h).unwrap()
    }

    #[test]
    fn test_copy_and_read_pixel() {
        let mut rb = buffer(4, 4);
        let mut pf = PixfmtRgba32::new(&mut rb);
        pf.copy_pixel(2, 3, &Rgba8::new(10, 20, 30, 40));
        assert_eq!(pf.pixel(2, 3), Rgba8::new(10, 20, 30, 40));
        assert_eq!(pf.pixel(3, 2), Rgba8::default());
        assert_eq!((pf.width(), pf.height()), (4, 4));
    }

    #[test]
    fn test_blend_opaque_replaces() {
        let mut rb = buffer(1, 1);
        let mut pf = PixfmtRgba32::new(&mut rb);
        pf.clear(&Rgba8::new(255, 255, 255, 0));
        pf.blend_pixel(0, 0, &Rgba8::new(255, 0, 0, 255), 255);
        assert_eq!(pf.pixel(0, 0), Rgba8::new(255, 0, 0, 255));
    }

    #[test]
    fn test_blend_half_alpha() {
        let mut rb = buffer(1, 1);
        let mut pf = PixfmtRgba32::new(&mut rb);
        pf.clear(&Rgba8::new(0, 0, 0, 0));
        pf.blend_pixel(0, 0, &Rgba8::new(255, 255, 255, 128), 255);
        let p = pf.pixel(0, 0);
        assert!((127..=129).contains(&p.r), "r = {}", p.r);
        assert!((127..=129).contains(&p.a), "a = {}", p.a);
    }

    #[test]
    fn test_blend_transparent_is_noop() {
        let mut rb = buffer(1, 1);
        let mut pf = PixfmtRgba32::new(&mut rb);
        pf.clear(&Rgba8::new(1, 2, 3, 4));
        pf.blend_pixel(0, 0, &Rgba8::new(200, 200, 200, 0), 255);
        pf.blend_pixel(0, 0, &Rgba8::new(200, 200, 200, 255), 0);
        assert_eq!(pf.pixel(0, 0), Rgba8::new(1, 2, 3, 4));
    }

    #[test]
    fn test_color_hspan_full_cover_copies_alpha() {
        let mut rb = buffer(3, 1);
        let mut pf = PixfmtRgba32::new(&mut rb);
        pf.clear(&Rgba8::new(255, 255, 255, 0));
        let colors = [
            Rgba8::new(10, 20, 30, 40),
            Rgba8::new(50, 60, 70, 80),
            Rgba8::new(0, 0, 0, 255),
        ];
        pf.blend_color_hspan(0, 0, &colors, &[255, 255, 128]);
        assert_eq!(pf.pixel(0, 0), colors[0]);
        assert_eq!(pf.pixel(1, 0), colors[1]);
        // half covered black over transparent white
        let p = pf.pixel(2, 0);
        assert!((126..=129).contains(&p.r), "r = {}", p.r);
        assert!((127..=129).contains(&p.a), "a = {}", p.a);
    }

    #[test]
    fn test_copy_from_row_segment() {
        let data = (0..32).collect::<Vec<u8>>();
        let src = RenderingBuffer::from_vec(data, 4, 2).unwrap();
        let mut rb = buffer(3, 3);
        let mut pf = PixfmtRgba32::new(&mut rb);
        pf.copy_from(&src, 1, 2, 2, 1, 2);
        assert_eq!(pf.pixel(1, 2), src.pixel(2, 1));
        assert_eq!(pf.pixel(2, 2), src.pixel(3, 1));
        assert_eq!(pf.pixel(0, 2), Rgba8::default());
    }

    #[test]
    fn test_copy_color_hspan_respects_offset() {
        let mut rb = buffer(4, 2);
        let mut pf = PixfmtRgba32::new(&mut rb);
        let colors = [Rgba8::new(1, 1, 1, 1), Rgba8::new(2, 2, 2, 2)];
        pf.copy_color_hspan(1, 1, &colors);
        assert_eq!(pf.pixel(0, 1), Rgba8::default());
        assert_eq!(pf.pixel(1, 1), colors[0]);
        assert_eq!(pf.pixel(2, 1), colors[1]);
        assert_eq!(pf.pixel(3, 1), Rgba8::default());
    }
}
