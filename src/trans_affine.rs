//! Affine transformation matrix.
//!
//! The image carries two of these: one places the source footprint on the
//! output canvas, the other maps output pixels back into source pixels once
//! inverted.

use crate::error::{ImageError, Result};

/// Epsilon for affine matrix comparisons.
pub const AFFINE_EPSILON: f64 = 1e-14;

/// 2D affine transformation matrix.
///
/// Stores six components: `[sx, shy, shx, sy, tx, ty]` representing the
/// matrix:
///
/// ```text
///   | sx  shx tx |
///   | shy  sy ty |
///   |  0    0  1 |
/// ```
///
/// Transform: `x' = x*sx + y*shx + tx`, `y' = x*shy + y*sy + ty`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransAffine {
    pub sx: f64,
    pub shy: f64,
    pub shx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl TransAffine {
    /// Identity matrix.
    pub fn new() -> Self {
        Self::new_custom(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn new_custom(sx: f64, shy: f64, shx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Self {
            sx,
            shy,
            shx,
            sy,
            tx,
            ty,
        }
    }

    /// Rotation by `a` radians.
    pub fn new_rotation(a: f64) -> Self {
        let (sa, ca) = a.sin_cos();
        Self::new_custom(ca, sa, -sa, ca, 0.0, 0.0)
    }

    pub fn new_scaling(x: f64, y: f64) -> Self {
        Self::new_custom(x, 0.0, 0.0, y, 0.0, 0.0)
    }

    pub fn new_translation(x: f64, y: f64) -> Self {
        Self::new_custom(1.0, 0.0, 0.0, 1.0, x, y)
    }

    // ====================================================================
    // Operations (mutate self)
    // ====================================================================

    /// Reset to identity.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::new();
        self
    }

    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        self.tx += x;
        self.ty += y;
        self
    }

    /// Rotate by angle `a` (radians).
    pub fn rotate(&mut self, a: f64) -> &mut Self {
        self.multiply(&Self::new_rotation(a))
    }

    pub fn scale(&mut self, x: f64, y: f64) -> &mut Self {
        self.sx *= x;
        self.shx *= x;
        self.tx *= x;
        self.shy *= y;
        self.sy *= y;
        self.ty *= y;
        self
    }

    /// Post-multiply: `self = self * m`, i.e. `m` is applied after `self`.
    pub fn multiply(&mut self, m: &TransAffine) -> &mut Self {
        let sx = self.sx * m.sx + self.shy * m.shx;
        let shx = self.shx * m.sx + self.sy * m.shx;
        let tx = self.tx * m.sx + self.ty * m.shx + m.tx;
        self.shy = self.sx * m.shy + self.shy * m.sy;
        self.sy = self.shx * m.shy + self.sy * m.sy;
        self.ty = self.tx * m.shy + self.ty * m.sy + m.ty;
        self.sx = sx;
        self.shx = shx;
        self.tx = tx;
        self
    }

    /// Product `self * m` as a new matrix.
    pub fn compose(&self, m: &TransAffine) -> TransAffine {
        let mut t = *self;
        t.multiply(m);
        t
    }

    /// Invert the matrix in place.
    ///
    /// A singular matrix is reported as `DegenerateTransform` and left
    /// untouched.
    pub fn invert(&mut self) -> Result<&mut Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(ImageError::DegenerateTransform { determinant: det });
        }
        let d = 1.0 / det;
        let sx = self.sy * d;
        self.sy = self.sx * d;
        self.shy = -self.shy * d;
        self.shx = -self.shx * d;
        let tx = -self.tx * sx - self.ty * self.shx;
        self.ty = -self.tx * self.shy - self.ty * self.sy;
        self.sx = sx;
        self.tx = tx;
        Ok(self)
    }

    /// Inverted copy of this matrix.
    pub fn inverted(&self) -> Result<TransAffine> {
        let mut t = *self;
        t.invert()?;
        Ok(t)
    }

    // ====================================================================
    // Transformations
    // ====================================================================

    /// Forward transform: `(x, y) -> (x', y')`.
    #[inline]
    pub fn transform(&self, x: &mut f64, y: &mut f64) {
        let tmp = *x;
        *x = tmp * self.sx + *y * self.shx + self.tx;
        *y = tmp * self.shy + *y * self.sy + self.ty;
    }

    /// Inverse transform without building the inverse matrix.
    #[inline]
    pub fn inverse_transform(&self, x: &mut f64, y: &mut f64) {
        let d = 1.0 / self.determinant();
        let a = (*x - self.tx) * d;
        let b = (*y - self.ty) * d;
        *x = a * self.sy - b * self.shx;
        *y = b * self.sx - a * self.shy;
    }

    // ====================================================================
    // Auxiliary
    // ====================================================================

    /// Determinant of the 2x2 portion.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.sx * self.sy - self.shy * self.shx
    }

    pub fn is_identity(&self, epsilon: f64) -> bool {
        (self.sx - 1.0).abs() <= epsilon
            && self.shy.abs() <= epsilon
            && self.shx.abs() <= epsilon
            && (self.sy - 1.0).abs() <= epsilon
            && self.tx.abs() <= epsilon
            && self.ty.abs() <= epsilon
    }

    /// Absolute scaling (from matrix magnitudes).
    pub fn scaling_abs(&self) -> (f64, f64) {
        (
            (self.sx * self.sx + self.shx * self.shx).sqrt(),
            (self.shy * self.shy + self.sy * self.sy).sqrt(),
        )
    }
}

impl Default for TransAffine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Mul for TransAffine {
    type Output = TransAffine;
    fn mul(self, rhs: TransAffine) -> TransAffine {
        self.compose(&rhs)
    }
}

impl std::ops::MulAssign for TransAffine {
    fn mul_assign(&mut self, rhs: TransAffine) {
        self.multiply(&rhs);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-10;

    fn apply(m: &TransAffine, x: f64, y: f64) -> (f64, f64) {
        let (mut x, mut y) = (x, y);
        m.transform(&mut x, &mut y);
        (x, y)
    }

    #[test]
    fn test_identity() {
        let m = TransAffine::new();
        assert!(m.is_identity(AFFINE_EPSILON));
        assert_eq!(m.determinant(), 1.0);
        assert_eq!(apply(&m, 3.0, -2.0), (3.0, -2.0));
    }

    #[test]
    fn test_rotation_90() {
        let (x, y) = apply(&TransAffine::new_rotation(PI / 2.0), 1.0, 0.0);
        assert!(x.abs() < EPS);
        assert!((y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_multiply_applies_right_operand_last() {
        let mut m = TransAffine::new_translation(10.0, 0.0);
        m.multiply(&TransAffine::new_scaling(2.0, 2.0));
        let (x, y) = apply(&m, 0.0, 0.0);
        assert!((x - 20.0).abs() < EPS);
        assert!(y.abs() < EPS);

        let mut m = TransAffine::new_scaling(2.0, 2.0);
        m *= TransAffine::new_translation(10.0, 0.0);
        let (x, _) = apply(&m, 5.0, 0.0);
        assert!((x - 20.0).abs() < EPS);
    }

    #[test]
    fn test_rotate_matches_rotation_product() {
        let mut a = TransAffine::new_scaling(2.0, 3.0);
        a.rotate(0.3);
        let b = TransAffine::new_scaling(2.0, 3.0) * TransAffine::new_rotation(0.3);
        let (ax, ay) = apply(&a, 1.5, -4.0);
        let (bx, by) = apply(&b, 1.5, -4.0);
        assert!((ax - bx).abs() < EPS && (ay - by).abs() < EPS);
    }

    #[test]
    fn test_invert_round_trip() {
        let mut m = TransAffine::new_scaling(2.0, 3.0);
        m.multiply(&TransAffine::new_translation(10.0, 20.0));
        m.rotate(0.7);

        let inv = m.inverted().unwrap();
        assert!((m * inv).is_identity(1e-10));

        let (x, y) = apply(&m, 5.0, 4.0);
        let (bx, by) = apply(&inv, x, y);
        assert!((bx - 5.0).abs() < EPS && (by - 4.0).abs() < EPS);
    }

    #[test]
    fn test_inverse_transform() {
        let m = TransAffine::new_scaling(2.0, 4.0);
        let (mut x, mut y) = (10.0, 8.0);
        m.inverse_transform(&mut x, &mut y);
        assert!((x - 5.0).abs() < EPS);
        assert!((y - 2.0).abs() < EPS);
    }

    #[test]
    fn test_invert_singular_fails_and_keeps_matrix() {
        let mut m = TransAffine::new_scaling(0.0, 1.0);
        m.translate(3.0, 4.0);
        let before = m;
        match m.invert() {
            Err(ImageError::DegenerateTransform { determinant }) => assert_eq!(determinant, 0.0),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(m, before);
    }

    #[test]
    fn test_reset_and_scaling_abs() {
        let mut m = TransAffine::new_scaling(3.0, 4.0);
        assert_eq!(m.scaling_abs(), (3.0, 4.0));
        m.reset();
        assert!(m.is_identity(0.0));
    }
}
