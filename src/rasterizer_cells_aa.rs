//! Anti-aliased cell accumulation.
//!
//! Edges arrive in 24.8 fixed point and are split into per-pixel cells. Each
//! cell carries the net vertical cover the edges contribute to its pixel and
//! twice the signed area they leave to the right of them inside the pixel.
//! The scanline rasterizer turns those two numbers into coverage.

use crate::basics::{POLY_SUBPIXEL_MASK, POLY_SUBPIXEL_SCALE, POLY_SUBPIXEL_SHIFT};

const SHIFT: u32 = POLY_SUBPIXEL_SHIFT;
const SCALE: i32 = POLY_SUBPIXEL_SCALE as i32;
const MASK: i32 = POLY_SUBPIXEL_MASK as i32;

/// Longer horizontal runs are split in half to keep the area products in
/// range.
const DX_LIMIT: i64 = 16384 << POLY_SUBPIXEL_SHIFT;

// ============================================================================
// CellAa
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAa {
    pub x: i32,
    pub y: i32,
    pub cover: i32,
    pub area: i32,
}

impl CellAa {
    const NONE: CellAa = CellAa {
        x: i32::MAX,
        y: i32::MAX,
        cover: 0,
        area: 0,
    };

    fn at(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            cover: 0,
            area: 0,
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        (self.cover | self.area) == 0
    }
}

/// Floor division by a positive divisor; the remainder is never negative.
#[inline]
fn floor_divmod(p: i64, d: i64) -> (i32, i64) {
    let (mut q, mut r) = (p / d, p % d);
    if r < 0 {
        q -= 1;
        r += d;
    }
    (q as i32, r)
}

// ============================================================================
// RasterizerCellsAa
// ============================================================================

/// Accumulates cells for a set of closed outlines.
///
/// `line` may be called any number of times; `sort_cells` freezes the cell
/// list and indexes it by scanline for the sweep. Adding lines after sorting
/// requires `reset`.
pub struct RasterizerCellsAa {
    cells: Vec<CellAa>,
    rows: Vec<(usize, usize)>,
    curr_cell: CellAa,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    sorted: bool,
}

impl RasterizerCellsAa {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            rows: Vec::new(),
            curr_cell: CellAa::NONE,
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_x: i32::MIN,
            max_y: i32::MIN,
            sorted: false,
        }
    }

    pub fn reset(&mut self) {
        self.cells.clear();
        self.rows.clear();
        self.curr_cell = CellAa::NONE;
        self.min_x = i32::MAX;
        self.min_y = i32::MAX;
        self.max_x = i32::MIN;
        self.max_y = i32::MIN;
        self.sorted = false;
    }

    pub fn min_x(&self) -> i32 {
        self.min_x
    }
    pub fn min_y(&self) -> i32 {
        self.min_y
    }
    pub fn max_x(&self) -> i32 {
        self.max_x
    }
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn sorted(&self) -> bool {
        self.sorted
    }

    #[inline]
    fn flush_curr_cell(&mut self) {
        if !self.curr_cell.is_empty() {
            self.cells.push(self.curr_cell);
        }
    }

    #[inline]
    fn set_curr_cell(&mut self, x: i32, y: i32) {
        if self.curr_cell.x != x || self.curr_cell.y != y {
            self.flush_curr_cell();
            self.curr_cell = CellAa::at(x, y);
        }
    }

    #[inline]
    fn accumulate(&mut self, cover: i32, area: i32) {
        self.curr_cell.cover += cover;
        self.curr_cell.area += area;
    }

    /// Distribute the part of an edge that stays inside scanline `ey`.
    ///
    /// `y1` and `y2` are the subpixel offsets within that scanline.
    fn render_hline(&mut self, ey: i32, x1: i32, y1: i32, x2: i32, y2: i32) {
        let (ex1, ex2) = (x1 >> SHIFT, x2 >> SHIFT);
        let (fx1, fx2) = (x1 & MASK, x2 & MASK);

        if y1 == y2 {
            self.set_curr_cell(ex2, ey);
            return;
        }
        if ex1 == ex2 {
            let delta = y2 - y1;
            self.accumulate(delta, (fx1 + fx2) * delta);
            return;
        }

        let dy = (y2 - y1) as i64;
        let (p, first, incr, dx) = if x2 < x1 {
            (fx1 as i64 * dy, 0, -1, x1 as i64 - x2 as i64)
        } else {
            ((SCALE - fx1) as i64 * dy, SCALE, 1, x2 as i64 - x1 as i64)
        };

        let (mut delta, mut modulo) = floor_divmod(p, dx);
        self.accumulate(delta, (fx1 + first) * delta);

        let mut ex = ex1 + incr;
        let mut y = y1 + delta;
        self.set_curr_cell(ex, ey);

        if ex != ex2 {
            let (lift, rem) = floor_divmod(SCALE as i64 * dy, dx);
            modulo -= dx;
            while ex != ex2 {
                delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dx;
                    delta += 1;
                }
                self.accumulate(delta, SCALE * delta);
                y += delta;
                ex += incr;
                self.set_curr_cell(ex, ey);
            }
        }

        delta = y2 - y;
        self.accumulate(delta, (fx2 + SCALE - first) * delta);
    }

    /// Straight vertical edge at subpixel column `x`.
    fn vertical_line(&mut self, x: i32, ey1: i32, ey2: i32, fy1: i32, fy2: i32, first: i32) {
        let incr = if first == 0 { -1 } else { 1 };
        let ex = x >> SHIFT;
        let two_fx = (x - (ex << SHIFT)) << 1;

        let delta = first - fy1;
        self.accumulate(delta, two_fx * delta);

        let mut ey = ey1 + incr;
        self.set_curr_cell(ex, ey);

        let full = first + first - SCALE;
        while ey != ey2 {
            self.curr_cell.cover = full;
            self.curr_cell.area = two_fx * full;
            ey += incr;
            self.set_curr_cell(ex, ey);
        }

        let delta = fy2 - SCALE + first;
        self.accumulate(delta, two_fx * delta);
    }

    /// Add an edge from (x1, y1) to (x2, y2), in 24.8 fixed point.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let dx = x2 as i64 - x1 as i64;
        if dx.abs() >= DX_LIMIT {
            let cx = ((x1 as i64 + x2 as i64) >> 1) as i32;
            let cy = ((y1 as i64 + y2 as i64) >> 1) as i32;
            self.line(x1, y1, cx, cy);
            self.line(cx, cy, x2, y2);
            return;
        }

        let dy = y2 as i64 - y1 as i64;
        let (ex1, ex2) = (x1 >> SHIFT, x2 >> SHIFT);
        let (ey1, ey2) = (y1 >> SHIFT, y2 >> SHIFT);
        let (fy1, fy2) = (y1 & MASK, y2 & MASK);

        self.min_x = self.min_x.min(ex1).min(ex2);
        self.max_x = self.max_x.max(ex1).max(ex2);
        self.min_y = self.min_y.min(ey1).min(ey2);
        self.max_y = self.max_y.max(ey1).max(ey2);

        self.set_curr_cell(ex1, ey1);

        if ey1 == ey2 {
            self.render_hline(ey1, x1, fy1, x2, fy2);
            return;
        }

        let (first, incr) = if dy < 0 { (0, -1) } else { (SCALE, 1) };

        if dx == 0 {
            self.vertical_line(x1, ey1, ey2, fy1, fy2, first);
            return;
        }

        let dy_abs = dy.abs();
        let p = if dy < 0 {
            fy1 as i64 * dx
        } else {
            (SCALE - fy1) as i64 * dx
        };
        let (delta, mut modulo) = floor_divmod(p, dy_abs);

        let mut x_from = x1 + delta;
        self.render_hline(ey1, x1, fy1, x_from, first);

        let mut ey = ey1 + incr;
        self.set_curr_cell(x_from >> SHIFT, ey);

        if ey != ey2 {
            let (lift, rem) = floor_divmod(SCALE as i64 * dx, dy_abs);
            modulo -= dy_abs;
            while ey != ey2 {
                let mut delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dy_abs;
                    delta += 1;
                }
                let x_to = x_from + delta;
                self.render_hline(ey, x_from, SCALE - first, x_to, first);
                x_from = x_to;
                ey += incr;
                self.set_curr_cell(x_from >> SHIFT, ey);
            }
        }

        self.render_hline(ey, x_from, SCALE - first, x2, fy2);
    }

    /// Flush the pending cell, order cells by (y, x) and index the rows.
    pub fn sort_cells(&mut self) {
        if self.sorted {
            return;
        }
        self.flush_curr_cell();
        self.curr_cell = CellAa::NONE;
        if self.cells.is_empty() {
            return;
        }

        self.cells.sort_unstable_by_key(|c| (c.y, c.x));

        let rows = (self.max_y - self.min_y + 1) as usize;
        self.rows.clear();
        self.rows.resize(rows, (0, 0));
        let mut start = 0;
        while start < self.cells.len() {
            let y = self.cells[start].y;
            let len = self.cells[start..].iter().take_while(|c| c.y == y).count();
            self.rows[(y - self.min_y) as usize] = (start, len);
            start += len;
        }
        self.sorted = true;
    }

    /// Cells of scanline `y`, ordered by x. Empty before `sort_cells` or
    /// outside the bounding box.
    pub fn scanline_cells(&self, y: i32) -> &[CellAa] {
        if !self.sorted || y < self.min_y || y > self.max_y {
            return &[];
        }
        let (start, len) = self.rows[(y - self.min_y) as usize];
        &self.cells[start..start + len]
    }
}

impl Default for RasterizerCellsAa {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
