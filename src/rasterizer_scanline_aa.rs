//! Polygon scanline rasterizer with anti-aliasing.
//!
//! Accepts closed contours in pixel coordinates, accumulates their edges as
//! cells and sweeps them into per-scanline coverage using the non-zero
//! winding rule. Coverage is linear (no gamma).

use crate::basics::POLY_SUBPIXEL_SHIFT;
use crate::rasterizer_cells_aa::RasterizerCellsAa;
use crate::rasterizer_sl_clip::{poly_coord, RasterizerSlClipInt};

const AA_SHIFT: u32 = 8;
const AA_MASK: i32 = (1 << AA_SHIFT) - 1;

// ============================================================================
// Scanline trait
// ============================================================================

/// Receiver of the coverage produced by one sweep step.
pub trait Scanline {
    /// Drop the spans of the previous scanline.
    fn reset_spans(&mut self);

    /// Coverage `cover` for the single pixel at `x`.
    fn add_cell(&mut self, x: i32, cover: u32);

    /// Coverage `cover` for `len` pixels starting at `x`.
    fn add_span(&mut self, x: i32, len: u32, cover: u32);

    fn finalize(&mut self, y: i32);

    fn num_spans(&self) -> u32;

    fn y(&self) -> i32;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Initial,
    MoveTo,
    LineTo,
    Closed,
}

// ============================================================================
// RasterizerScanlineAa
// ============================================================================

/// Anti-aliased polygon rasterizer.
///
/// Contours are built with `move_to_d` / `line_to_d` (or `add_polygon`) and
/// closed automatically when the next one starts or the sweep begins.
/// `rewind_scanlines` then `sweep_scanline` until it returns `false`.
pub struct RasterizerScanlineAa {
    outline: RasterizerCellsAa,
    clipper: RasterizerSlClipInt,
    start_x: i32,
    start_y: i32,
    status: Status,
    scan_y: i32,
}

impl RasterizerScanlineAa {
    pub fn new() -> Self {
        Self {
            outline: RasterizerCellsAa::new(),
            clipper: RasterizerSlClipInt::new(),
            start_x: 0,
            start_y: 0,
            status: Status::Initial,
            scan_y: 0,
        }
    }

    /// Discard all contours.
    pub fn reset(&mut self) {
        self.outline.reset();
        self.status = Status::Initial;
    }

    /// Clip contours to the box (x1, y1)-(x2, y2), in pixels.
    pub fn clip_box(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.reset();
        self.clipper
            .clip_box(poly_coord(x1), poly_coord(y1), poly_coord(x2), poly_coord(y2));
    }

    pub fn close_polygon(&mut self) {
        if self.status == Status::LineTo {
            self.clipper
                .line_to(&mut self.outline, self.start_x, self.start_y);
            self.status = Status::Closed;
        }
    }

    pub fn move_to_d(&mut self, x: f64, y: f64) {
        if self.outline.sorted() {
            self.reset();
        }
        self.close_polygon();
        self.start_x = poly_coord(x);
        self.start_y = poly_coord(y);
        self.clipper.move_to(self.start_x, self.start_y);
        self.status = Status::MoveTo;
    }

    pub fn line_to_d(&mut self, x: f64, y: f64) {
        self.clipper
            .line_to(&mut self.outline, poly_coord(x), poly_coord(y));
        self.status = Status::LineTo;
    }

    /// Add one closed contour through `points`.
    pub fn add_polygon(&mut self, points: &[(f64, f64)]) {
        let Some((&(x0, y0), rest)) = points.split_first() else {
            return;
        };
        self.move_to_d(x0, y0);
        for &(x, y) in rest {
            self.line_to_d(x, y);
        }
        self.close_polygon();
    }

    pub fn min_x(&self) -> i32 {
        self.outline.min_x()
    }
    pub fn min_y(&self) -> i32 {
        self.outline.min_y()
    }
    pub fn max_x(&self) -> i32 {
        self.outline.max_x()
    }
    pub fn max_y(&self) -> i32 {
        self.outline.max_y()
    }

    /// Close the open contour and sort the cells. Returns `false` when
    /// nothing would be drawn.
    pub fn rewind_scanlines(&mut self) -> bool {
        self.close_polygon();
        self.outline.sort_cells();
        if self.outline.total_cells() == 0 {
            return false;
        }
        self.scan_y = self.outline.min_y();
        true
    }

    /// Coverage (0..=255) of a doubled signed area, non-zero winding.
    #[inline]
    pub fn calculate_alpha(area: i32) -> u32 {
        let cover = (area >> (POLY_SUBPIXEL_SHIFT * 2 + 1 - AA_SHIFT)).abs();
        cover.min(AA_MASK) as u32
    }

    /// Feed the next non-empty scanline into `sl`. Returns `false` once every
    /// scanline has been produced.
    pub fn sweep_scanline<SL: Scanline>(&mut self, sl: &mut SL) -> bool {
        loop {
            if self.scan_y > self.outline.max_y() {
                return false;
            }
            sl.reset_spans();

            let cells = self.outline.scanline_cells(self.scan_y);
            let mut cover = 0;
            let mut i = 0;
            while i < cells.len() {
                let x = cells[i].x;
                let mut area = 0;
                while i < cells.len() && cells[i].x == x {
                    area += cells[i].area;
                    cover += cells[i].cover;
                    i += 1;
                }

                let mut span_x = x;
                if area != 0 {
                    let alpha = Self::calculate_alpha((cover << (POLY_SUBPIXEL_SHIFT + 1)) - area);
                    if alpha != 0 {
                        sl.add_cell(x, alpha);
                    }
                    span_x += 1;
                }

                if let Some(next) = cells.get(i) {
                    if next.x > span_x {
                        let alpha = Self::calculate_alpha(cover << (POLY_SUBPIXEL_SHIFT + 1));
                        if alpha != 0 {
                            sl.add_span(span_x, (next.x - span_x) as u32, alpha);
                        }
                    }
                }
            }

            if sl.num_spans() > 0 {
                break;
            }
            self.scan_y += 1;
        }

        sl.finalize(self.scan_y);
        self.scan_y += 1;
        true
    }
}

impl Default for RasterizerScanlineAa {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
