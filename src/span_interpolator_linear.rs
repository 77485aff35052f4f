//! Linear span interpolator.
//!
//! Maps a horizontal run of destination pixel centres into source space
//! through an affine matrix. Only the two end points of the run are
//! transformed; the pixels between them are stepped with an integer DDA in
//! 1/256 pixel units.

use crate::basics::iround;
use crate::trans_affine::TransAffine;

pub const SUBPIXEL_SHIFT: u32 = 8;
pub const SUBPIXEL_SCALE: i32 = 1 << SUBPIXEL_SHIFT;

/// Source of per-pixel source coordinates for a span, in subpixel units.
pub trait SpanInterpolator {
    /// Start a run of `len` pixels at (x, y), in destination coordinates.
    fn begin(&mut self, x: f64, y: f64, len: u32);
    fn next(&mut self);
    fn coordinates(&self) -> (i32, i32);
}

/// Integer DDA that spreads `y2 - y1` evenly over `count` steps.
#[derive(Debug, Clone, Copy)]
struct Dda {
    cnt: i32,
    lift: i32,
    rem: i32,
    modulo: i32,
    y: i32,
}

impl Dda {
    fn new(y1: i32, y2: i32, count: i32) -> Self {
        let cnt = count.max(1);
        let mut lift = (y2 - y1) / cnt;
        let mut rem = (y2 - y1) % cnt;
        let mut modulo = rem;
        if modulo <= 0 {
            modulo += cnt;
            rem += cnt;
            lift -= 1;
        }
        Self {
            cnt,
            lift,
            rem,
            modulo: modulo - cnt,
            y: y1,
        }
    }

    #[inline]
    fn inc(&mut self) {
        self.modulo += self.rem;
        self.y += self.lift;
        if self.modulo > 0 {
            self.modulo -= self.cnt;
            self.y += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpanInterpolatorLinear {
    trans: TransAffine,
    li_x: Dda,
    li_y: Dda,
}

impl SpanInterpolatorLinear {
    pub fn new(trans: TransAffine) -> Self {
        Self {
            trans,
            li_x: Dda::new(0, 0, 1),
            li_y: Dda::new(0, 0, 1),
        }
    }

    fn subpixel(&self, x: f64, y: f64) -> (i32, i32) {
        let (mut x, mut y) = (x, y);
        self.trans.transform(&mut x, &mut y);
        (
            iround(x * SUBPIXEL_SCALE as f64),
            iround(y * SUBPIXEL_SCALE as f64),
        )
    }
}

impl SpanInterpolator for SpanInterpolatorLinear {
    fn begin(&mut self, x: f64, y: f64, len: u32) {
        let (x1, y1) = self.subpixel(x, y);
        let (x2, y2) = self.subpixel(x + len as f64, y);
        self.li_x = Dda::new(x1, x2, len as i32);
        self.li_y = Dda::new(y1, y2, len as i32);
    }

    #[inline]
    fn next(&mut self) {
        self.li_x.inc();
        self.li_y.inc();
    }

    #[inline]
    fn coordinates(&self) -> (i32, i32) {
        (self.li_x.y, self.li_y.y)
    }
}
