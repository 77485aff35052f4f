//! Unpacked scanline: one coverage byte per pixel.

use crate::basics::CoverType;
use crate::rasterizer_scanline_aa::Scanline;

/// A horizontal run of pixels. `cover_offset` indexes the first coverage
/// byte of the run in [`ScanlineU8::covers`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanlineSpan {
    pub x: i32,
    pub len: i32,
    pub cover_offset: usize,
}

/// Coverage for one scanline, stored per pixel and grouped into runs of
/// adjacent pixels.
///
/// `reset(min_x, max_x)` sizes the coverage array for the x range the
/// rasterizer can produce; cells and spans must then arrive with increasing
/// x.
#[derive(Debug)]
pub struct ScanlineU8 {
    min_x: i32,
    last_x: Option<i32>,
    y: i32,
    covers: Vec<CoverType>,
    spans: Vec<ScanlineSpan>,
}

impl ScanlineU8 {
    pub fn new() -> Self {
        Self {
            min_x: 0,
            last_x: None,
            y: 0,
            covers: Vec::new(),
            spans: Vec::new(),
        }
    }

    pub fn reset(&mut self, min_x: i32, max_x: i32) {
        let len = (max_x - min_x + 2).max(0) as usize;
        if len > self.covers.len() {
            self.covers.resize(len, 0);
        }
        self.min_x = min_x;
        self.reset_spans();
    }

    pub fn spans(&self) -> &[ScanlineSpan] {
        &self.spans
    }

    pub fn covers(&self) -> &[CoverType] {
        &self.covers
    }

    /// Coverage bytes of `span`.
    pub fn span_covers(&self, span: &ScanlineSpan) -> &[CoverType] {
        &self.covers[span.cover_offset..span.cover_offset + span.len as usize]
    }

    fn extend(&mut self, x: i32, offset: usize, len: i32) {
        let last = self.spans.last_mut();
        match last {
            Some(span) if self.last_x == Some(offset as i32 - 1) => span.len += len,
            _ => self.spans.push(ScanlineSpan {
                x,
                len,
                cover_offset: offset,
            }),
        }
        self.last_x = Some(offset as i32 + len - 1);
    }
}

impl Scanline for ScanlineU8 {
    fn reset_spans(&mut self) {
        self.last_x = None;
        self.spans.clear();
    }

    fn add_cell(&mut self, x: i32, cover: u32) {
        let offset = (x - self.min_x) as usize;
        self.covers[offset] = cover as CoverType;
        self.extend(x, offset, 1);
    }

    fn add_span(&mut self, x: i32, len: u32, cover: u32) {
        let offset = (x - self.min_x) as usize;
        self.covers[offset..offset + len as usize].fill(cover as CoverType);
        self.extend(x, offset, len as i32);
    }

    fn finalize(&mut self, y: i32) {
        self.y = y;
    }

    fn num_spans(&self) -> u32 {
        self.spans.len() as u32
    }

    fn y(&self) -> i32 {
        self.y
    }
}

impl Default for ScanlineU8 {
    fn default() -> Self {
        Self::new()
    }
}
