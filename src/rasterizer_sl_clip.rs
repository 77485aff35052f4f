//! Edge clipping for the scanline rasterizer.
//!
//! Converts coordinates to 24.8 fixed point and clips edges against a box
//! before they reach the cell accumulator. Parts of an edge left or right of
//! the box are projected onto its vertical sides rather than dropped, so the
//! winding of every scanline inside the box is preserved. Parts above or
//! below are dropped.

use crate::basics::{iround, RectI, POLY_SUBPIXEL_SCALE};
use crate::rasterizer_cells_aa::RasterizerCellsAa;

const RIGHT: u32 = 1;
const BELOW: u32 = 2;
const LEFT: u32 = 4;
const ABOVE: u32 = 8;
const Y_FLAGS: u32 = BELOW | ABOVE;

/// Double to 24.8 fixed point.
#[inline]
pub fn poly_coord(v: f64) -> i32 {
    iround(v * POLY_SUBPIXEL_SCALE as f64)
}

#[inline]
fn mul_div(a: i32, b: i32, c: i32) -> i32 {
    iround(a as f64 * b as f64 / c as f64)
}

#[inline]
fn flags_y(y: i32, b: &RectI) -> u32 {
    (((y > b.y2) as u32) << 1) | (((y < b.y1) as u32) << 3)
}

#[inline]
fn flags(x: i32, y: i32, b: &RectI) -> u32 {
    (x > b.x2) as u32 | (((x < b.x1) as u32) << 2) | flags_y(y, b)
}

/// -1 left of the box, 0 inside, 1 right of it.
#[inline]
fn x_side(f: u32) -> i32 {
    if f & LEFT != 0 {
        -1
    } else if f & RIGHT != 0 {
        1
    } else {
        0
    }
}

// ============================================================================
// RasterizerSlClipInt
// ============================================================================

pub struct RasterizerSlClipInt {
    clip_box: RectI,
    x1: i32,
    y1: i32,
    f1: u32,
    clipping: bool,
}

impl RasterizerSlClipInt {
    pub fn new() -> Self {
        Self {
            clip_box: RectI::new(0, 0, 0, 0),
            x1: 0,
            y1: 0,
            f1: 0,
            clipping: false,
        }
    }

    /// Clip to the box with corners (x1, y1) and (x2, y2), in 24.8 fixed
    /// point.
    pub fn clip_box(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.clip_box = RectI::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2));
        self.clipping = true;
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x1 = x;
        self.y1 = y;
        if self.clipping {
            self.f1 = flags(x, y, &self.clip_box);
        }
    }

    /// Emit the edge from the current point to (x2, y2).
    pub fn line_to(&mut self, cells: &mut RasterizerCellsAa, x2: i32, y2: i32) {
        if !self.clipping {
            cells.line(self.x1, self.y1, x2, y2);
            self.x1 = x2;
            self.y1 = y2;
            return;
        }

        let f2 = flags(x2, y2, &self.clip_box);
        let (x1, y1, f1) = (self.x1, self.y1, self.f1);
        self.x1 = x2;
        self.y1 = y2;
        self.f1 = f2;

        // both ends above, or both below
        if (f1 & Y_FLAGS) == (f2 & Y_FLAGS) && (f1 & Y_FLAGS) != 0 {
            return;
        }

        let b = self.clip_box;
        let (s1, s2) = (x_side(f1), x_side(f2));
        let clamp_x = |side: i32, x: i32| match side {
            -1 => b.x1,
            1 => b.x2,
            _ => x,
        };

        // The edge is walked from start to end through every vertical side of
        // the box it crosses.
        let mut pts = [(0, 0, 0u32); 4];
        let mut n = 0;
        pts[n] = (clamp_x(s1, x1), y1, f1);
        n += 1;
        let (crossings, count) = match (s1, s2) {
            (-1, 0) | (0, -1) => ([b.x1, 0], 1),
            (0, 1) | (1, 0) => ([b.x2, 0], 1),
            (-1, 1) => ([b.x1, b.x2], 2),
            (1, -1) => ([b.x2, b.x1], 2),
            _ => ([0, 0], 0),
        };
        for &cx in &crossings[..count] {
            let y = y1 + mul_div(cx - x1, y2 - y1, x2 - x1);
            pts[n] = (cx, y, flags_y(y, &b));
            n += 1;
        }
        pts[n] = (clamp_x(s2, x2), y2, f2);
        n += 1;

        for w in pts[..n].windows(2) {
            let ((ax, ay, af), (bx, by, bf)) = (w[0], w[1]);
            self.line_clip_y(cells, ax, ay, bx, by, af, bf);
        }
    }

    /// Clip an edge already inside the box horizontally against its top and
    /// bottom.
    #[allow(clippy::too_many_arguments)]
    fn line_clip_y(
        &self,
        cells: &mut RasterizerCellsAa,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        f1: u32,
        f2: u32,
    ) {
        let (f1, f2) = (f1 & Y_FLAGS, f2 & Y_FLAGS);
        if (f1 | f2) == 0 {
            cells.line(x1, y1, x2, y2);
            return;
        }
        if f1 == f2 {
            return;
        }

        let b = &self.clip_box;
        let at_y = |edge: i32| x1 + mul_div(edge - y1, x2 - x1, y2 - y1);
        let (mut tx1, mut ty1, mut tx2, mut ty2) = (x1, y1, x2, y2);
        if f1 & ABOVE != 0 {
            tx1 = at_y(b.y1);
            ty1 = b.y1;
        }
        if f1 & BELOW != 0 {
            tx1 = at_y(b.y2);
            ty1 = b.y2;
        }
        if f2 & ABOVE != 0 {
            tx2 = at_y(b.y1);
            ty2 = b.y1;
        }
        if f2 & BELOW != 0 {
            tx2 = at_y(b.y2);
            ty2 = b.y2;
        }
        cells.line(tx1, ty1, tx2, ty2);
    }
}

impl Default for RasterizerSlClipInt {
    fn default() -> Self {
        Self::new()
    }
}
