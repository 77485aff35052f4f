//! Base renderer with clipping.
//!
//! Wraps a pixel format with a clip rectangle so that every span, pixel and
//! block copy stays inside the visible area.

use crate::basics::{CoverType, RectI};
use crate::pixfmt_rgba::PixelFormat;
use crate::rendering_buffer::RenderingBuffer;

// ============================================================================
// RendererBase: clip-and-delegate renderer
// ============================================================================

pub struct RendererBase<PF: PixelFormat> {
    ren: PF,
    clip_box: RectI,
}

impl<PF: PixelFormat> RendererBase<PF> {
    /// Wrap `ren`, clipping to its full extent.
    pub fn new(ren: PF) -> Self {
        let w = ren.width() as i32;
        let h = ren.height() as i32;
        Self {
            ren,
            clip_box: RectI::new(0, 0, w - 1, h - 1),
        }
    }

    pub fn width(&self) -> u32 {
        self.ren.width()
    }

    pub fn height(&self) -> u32 {
        self.ren.height()
    }

    pub fn clip_box(&self) -> &RectI {
        &self.clip_box
    }

    #[inline]
    pub fn inbox(&self, x: i32, y: i32) -> bool {
        self.clip_box.hit_test(x, y)
    }

    // ========================================================================
    // Rendering operations (clip then delegate)
    // ========================================================================

    /// Fill the whole buffer, ignoring the clip box.
    pub fn clear(&mut self, c: &PF::ColorType)
    where
        PF::ColorType: Clone,
    {
        let w = self.width() as usize;
        if w == 0 {
            return;
        }
        let row = vec![c.clone(); w];
        for y in 0..self.height() as i32 {
            self.ren.copy_color_hspan(0, y, &row);
        }
    }

    pub fn copy_pixel(&mut self, x: i32, y: i32, c: &PF::ColorType) {
        if self.inbox(x, y) {
            self.ren.copy_pixel(x, y, c);
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, c: &PF::ColorType, cover: CoverType) {
        if self.inbox(x, y) {
            self.ren.blend_pixel(x, y, c, cover);
        }
    }

    /// Pixel at (x, y), or `None` outside the clip box.
    pub fn pixel(&self, x: i32, y: i32) -> Option<PF::ColorType> {
        self.inbox(x, y).then(|| self.ren.pixel(x, y))
    }

    /// Write a span of colours with per-pixel coverage, clipped.
    pub fn blend_color_hspan(
        &mut self,
        mut x: i32,
        y: i32,
        colors: &[PF::ColorType],
        covers: &[CoverType],
    ) {
        if y > self.clip_box.y2 || y < self.clip_box.y1 {
            return;
        }
        let mut len = colors.len().min(covers.len()) as i32;
        let mut skip = 0usize;
        if x < self.clip_box.x1 {
            let d = self.clip_box.x1 - x;
            len -= d;
            if len <= 0 {
                return;
            }
            skip = d as usize;
            x = self.clip_box.x1;
        }
        if x + len > self.clip_box.x2 + 1 {
            len = self.clip_box.x2 - x + 1;
            if len <= 0 {
                return;
            }
        }
        let end = skip + len as usize;
        self.ren
            .blend_color_hspan(x, y, &colors[skip..end], &covers[skip..end]);
    }

    /// Copy a block of `src` into this buffer displaced by (dx, dy).
    ///
    /// `rect` selects the source block with inclusive corners; `None` copies
    /// the whole source. The block is clipped against both the source extent
    /// and the clip box.
    pub fn copy_from(&mut self, src: &RenderingBuffer<'_>, rect: Option<RectI>, dx: i32, dy: i32) {
        let (sw, sh) = (src.width() as i32, src.height() as i32);
        let mut rsrc = match rect {
            Some(r) => r,
            None => RectI::new(0, 0, sw - 1, sh - 1),
        };
        if !rsrc.clip(&RectI::new(0, 0, sw - 1, sh - 1)) {
            return;
        }
        let mut rdst = RectI::new(rsrc.x1 + dx, rsrc.y1 + dy, rsrc.x2 + dx, rsrc.y2 + dy);
        if !rdst.clip(&self.clip_box) {
            return;
        }
        let xsrc = rdst.x1 - dx;
        let len = (rdst.x2 - rdst.x1 + 1) as u32;
        for ydst in rdst.y1..=rdst.y2 {
            self.ren.copy_from(src, rdst.x1, ydst, xsrc, ydst - dy, len);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
