//! Interpolation schemes, filter kernels and the weight lookup table.
//!
//! Every scheme except nearest-neighbour is a separable kernel with a support
//! radius and a weight function. A kernel is tabulated once per resampling
//! pass into an [`ImageFilterLut`] of 14-bit fixed-point weights sampled at
//! 1/256 pixel steps.

use std::fmt;
use std::str::FromStr;

use crate::basics::{iround, uceil};
use crate::error::ImageError;
use crate::math::besj;
use std::f64::consts::PI;

// ============================================================================
// Constants
// ============================================================================

pub const IMAGE_FILTER_SHIFT: u32 = 14;
pub const IMAGE_FILTER_SCALE: i32 = 1 << IMAGE_FILTER_SHIFT; // 16384

pub const IMAGE_SUBPIXEL_SHIFT: u32 = 8;
pub const IMAGE_SUBPIXEL_SCALE: u32 = 1 << IMAGE_SUBPIXEL_SHIFT; // 256
pub const IMAGE_SUBPIXEL_MASK: u32 = IMAGE_SUBPIXEL_SCALE - 1;

/// Smallest support radius accepted by the sinc, lanczos and blackman kernels.
pub const MIN_WINDOWED_RADIUS: f64 = 2.0;
/// Largest support radius a resampling pass accepts.
pub const MAX_FILTER_RADIUS: f64 = 256.0;

// ============================================================================
// ImageFilterFunction trait
// ============================================================================

/// A symmetric filter kernel: support radius plus weight at distance `x >= 0`.
pub trait ImageFilterFunction {
    fn radius(&self) -> f64;
    fn calc_weight(&self, x: f64) -> f64;
}

impl<F: ImageFilterFunction + ?Sized> ImageFilterFunction for Box<F> {
    fn radius(&self) -> f64 {
        (**self).radius()
    }
    fn calc_weight(&self, x: f64) -> f64 {
        (**self).calc_weight(x)
    }
}

// ============================================================================
// Interpolation
// ============================================================================

/// The closed set of interpolation schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    Spline16,
    Spline36,
    Hanning,
    Hamming,
    Hermite,
    Kaiser,
    Quadric,
    Catrom,
    Gaussian,
    Bessel,
    Mitchell,
    Sinc,
    Lanczos,
    Blackman,
}

impl Interpolation {
    pub const ALL: [Interpolation; 17] = [
        Interpolation::Nearest,
        Interpolation::Bilinear,
        Interpolation::Bicubic,
        Interpolation::Spline16,
        Interpolation::Spline36,
        Interpolation::Hanning,
        Interpolation::Hamming,
        Interpolation::Hermite,
        Interpolation::Kaiser,
        Interpolation::Quadric,
        Interpolation::Catrom,
        Interpolation::Gaussian,
        Interpolation::Bessel,
        Interpolation::Mitchell,
        Interpolation::Sinc,
        Interpolation::Lanczos,
        Interpolation::Blackman,
    ];

    /// Lower-case name, as used in configuration strings.
    pub fn name(self) -> &'static str {
        match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Bilinear => "bilinear",
            Interpolation::Bicubic => "bicubic",
            Interpolation::Spline16 => "spline16",
            Interpolation::Spline36 => "spline36",
            Interpolation::Hanning => "hanning",
            Interpolation::Hamming => "hamming",
            Interpolation::Hermite => "hermite",
            Interpolation::Kaiser => "kaiser",
            Interpolation::Quadric => "quadric",
            Interpolation::Catrom => "catrom",
            Interpolation::Gaussian => "gaussian",
            Interpolation::Bessel => "bessel",
            Interpolation::Mitchell => "mitchell",
            Interpolation::Sinc => "sinc",
            Interpolation::Lanczos => "lanczos",
            Interpolation::Blackman => "blackman",
        }
    }

    /// Integer code of the scheme (0 for nearest, then declaration order).
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Whether the scheme reads a padded source buffer.
    pub fn needs_padding(self) -> bool {
        self != Interpolation::Nearest
    }

    /// Kernel for this scheme, `None` for nearest-neighbour.
    ///
    /// `radius` only affects sinc, lanczos and blackman, and is raised to
    /// [`MIN_WINDOWED_RADIUS`] when smaller.
    pub fn kernel(self, radius: f64) -> Option<Box<dyn ImageFilterFunction>> {
        let kernel: Box<dyn ImageFilterFunction> = match self {
            Interpolation::Nearest => return None,
            Interpolation::Bilinear => Box::new(ImageFilterBilinear),
            Interpolation::Bicubic => Box::new(ImageFilterBicubic),
            Interpolation::Spline16 => Box::new(ImageFilterSpline16),
            Interpolation::Spline36 => Box::new(ImageFilterSpline36),
            Interpolation::Hanning => Box::new(ImageFilterHanning),
            Interpolation::Hamming => Box::new(ImageFilterHamming),
            Interpolation::Hermite => Box::new(ImageFilterHermite),
            Interpolation::Kaiser => Box::new(ImageFilterKaiser::default()),
            Interpolation::Quadric => Box::new(ImageFilterQuadric),
            Interpolation::Catrom => Box::new(ImageFilterCatrom),
            Interpolation::Gaussian => Box::new(ImageFilterGaussian),
            Interpolation::Bessel => Box::new(ImageFilterBessel),
            Interpolation::Mitchell => Box::new(ImageFilterMitchell::default()),
            Interpolation::Sinc => Box::new(ImageFilterSinc::new(radius)),
            Interpolation::Lanczos => Box::new(ImageFilterLanczos::new(radius)),
            Interpolation::Blackman => Box::new(ImageFilterBlackman::new(radius)),
        };
        Some(kernel)
    }

    /// Tabulated weights for this scheme, `None` for nearest-neighbour.
    pub fn lut(self, normalize: bool, radius: f64) -> Option<ImageFilterLut> {
        self.kernel(radius)
            .map(|k| ImageFilterLut::new_with_filter(&k, normalize))
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Interpolation {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|i| i.name() == wanted)
            .ok_or_else(|| ImageError::InvalidArgument(format!("unknown interpolation {s:?}")))
    }
}

// ============================================================================
// ImageFilterLut: weight lookup table
// ============================================================================

/// Filter weights sampled at subpixel resolution.
///
/// Entry `j * IMAGE_SUBPIXEL_SCALE + f` holds the weight of tap `j` (counted
/// from `start`) for fractional offset `f / 256`, scaled by
/// `IMAGE_FILTER_SCALE`.
#[derive(Debug, Clone, Default)]
pub struct ImageFilterLut {
    radius: f64,
    diameter: u32,
    start: i32,
    weight_array: Vec<i16>,
}

impl ImageFilterLut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_filter<F: ImageFilterFunction>(filter: &F, normalization: bool) -> Self {
        let mut lut = Self::new();
        lut.calculate(filter, normalization);
        lut
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of taps per axis.
    pub fn diameter(&self) -> u32 {
        self.diameter
    }

    /// Offset of the first tap relative to the sample's integer position.
    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn weight_array(&self) -> &[i16] {
        &self.weight_array
    }

    /// Tabulate `filter`, optionally renormalizing every subpixel phase.
    pub fn calculate<F: ImageFilterFunction>(&mut self, filter: &F, normalization: bool) {
        self.radius = filter.radius();
        self.diameter = uceil(self.radius) * 2;
        self.start = -((self.diameter / 2) as i32 - 1);
        self.weight_array = vec![0; (self.diameter as usize) << IMAGE_SUBPIXEL_SHIFT];

        let pivot = self.pivot();
        for i in 0..pivot {
            let x = i as f64 / IMAGE_SUBPIXEL_SCALE as f64;
            let w = iround(filter.calc_weight(x) * IMAGE_FILTER_SCALE as f64) as i16;
            self.weight_array[pivot + i] = w;
            self.weight_array[pivot - i] = w;
        }
        self.wrap_first();

        if normalization {
            self.normalize();
        }
    }

    /// Scale the weights of every subpixel phase so they sum to exactly
    /// `IMAGE_FILTER_SCALE`, spreading the rounding residue outward from the
    /// centre tap alternately left and right.
    pub fn normalize(&mut self) {
        let phases = IMAGE_SUBPIXEL_SCALE as usize;
        let diameter = self.diameter as usize;
        let mut flip = true;

        for phase in 0..phases {
            loop {
                let sum = self.phase_sum(phase);
                if sum == IMAGE_FILTER_SCALE {
                    break;
                }

                let k = IMAGE_FILTER_SCALE as f64 / sum as f64;
                let mut residue = -IMAGE_FILTER_SCALE;
                for idx in self.phase_taps(phase) {
                    let v = iround(self.weight_array[idx] as f64 * k) as i16;
                    self.weight_array[idx] = v;
                    residue += v as i32;
                }

                let step: i16 = if residue > 0 { -1 } else { 1 };
                let mut j = 0;
                while j < diameter && residue != 0 {
                    flip = !flip;
                    let tap = if flip {
                        diameter / 2 + j / 2
                    } else {
                        diameter / 2 - j / 2
                    };
                    let idx = tap * phases + phase;
                    if (self.weight_array[idx] as i32) < IMAGE_FILTER_SCALE {
                        self.weight_array[idx] += step;
                        residue += step as i32;
                    }
                    j += 1;
                }
            }
        }

        let pivot = self.pivot();
        for i in 0..pivot {
            self.weight_array[pivot + i] = self.weight_array[pivot - i];
        }
        self.wrap_first();
    }

    /// Sum of the weights of one subpixel phase, in filter units.
    pub fn phase_sum(&self, phase: usize) -> i32 {
        self.phase_taps(phase)
            .map(|idx| self.weight_array[idx] as i32)
            .sum()
    }

    fn phase_taps(&self, phase: usize) -> std::iter::StepBy<std::ops::Range<usize>> {
        let phases = IMAGE_SUBPIXEL_SCALE as usize;
        (phase..self.diameter as usize * phases).step_by(phases)
    }

    fn pivot(&self) -> usize {
        (self.diameter as usize) << (IMAGE_SUBPIXEL_SHIFT - 1)
    }

    fn wrap_first(&mut self) {
        if let Some(&last) = self.weight_array.last() {
            self.weight_array[0] = last;
        }
    }
}

// ============================================================================
// Fixed-radius kernels
// ============================================================================

/// Triangle, radius 1.
pub struct ImageFilterBilinear;
impl ImageFilterFunction for ImageFilterBilinear {
    fn radius(&self) -> f64 {
        1.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        1.0 - x
    }
}

pub struct ImageFilterHanning;
impl ImageFilterFunction for ImageFilterHanning {
    fn radius(&self) -> f64 {
        1.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        0.5 + 0.5 * (PI * x).cos()
    }
}

pub struct ImageFilterHamming;
impl ImageFilterFunction for ImageFilterHamming {
    fn radius(&self) -> f64 {
        1.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        0.54 + 0.46 * (PI * x).cos()
    }
}

pub struct ImageFilterHermite;
impl ImageFilterFunction for ImageFilterHermite {
    fn radius(&self) -> f64 {
        1.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        (2.0 * x - 3.0) * x * x + 1.0
    }
}

/// Piecewise quadratic, radius 1.5.
pub struct ImageFilterQuadric;
impl ImageFilterFunction for ImageFilterQuadric {
    fn radius(&self) -> f64 {
        1.5
    }
    fn calc_weight(&self, x: f64) -> f64 {
        match x {
            x if x < 0.5 => 0.75 - x * x,
            x if x < 1.5 => 0.5 * (x - 1.5) * (x - 1.5),
            _ => 0.0,
        }
    }
}

/// Cubic B-spline, radius 2.
pub struct ImageFilterBicubic;
impl ImageFilterFunction for ImageFilterBicubic {
    fn radius(&self) -> f64 {
        2.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        let cube = |v: f64| if v <= 0.0 { 0.0 } else { v * v * v };
        (cube(x + 2.0) - 4.0 * cube(x + 1.0) + 6.0 * cube(x) - 4.0 * cube(x - 1.0)) / 6.0
    }
}

/// Kaiser window with shape parameter `b` (6.33 by default), radius 1.
pub struct ImageFilterKaiser {
    a: f64,
    i0a: f64,
}

impl ImageFilterKaiser {
    const EPSILON: f64 = 1e-12;

    pub fn new(b: f64) -> Self {
        Self {
            a: b,
            i0a: 1.0 / Self::bessel_i0(b),
        }
    }

    /// Modified Bessel function of the first kind, order 0 (power series).
    fn bessel_i0(x: f64) -> f64 {
        let y = x * x / 4.0;
        let mut sum = 1.0;
        let mut term = y;
        let mut i = 2.0;
        while term > Self::EPSILON {
            sum += term;
            term *= y / (i * i);
            i += 1.0;
        }
        sum
    }
}

impl Default for ImageFilterKaiser {
    fn default() -> Self {
        Self::new(6.33)
    }
}

impl ImageFilterFunction for ImageFilterKaiser {
    fn radius(&self) -> f64 {
        1.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        Self::bessel_i0(self.a * (1.0 - x * x).sqrt()) * self.i0a
    }
}

/// Catmull-Rom spline, radius 2.
pub struct ImageFilterCatrom;
impl ImageFilterFunction for ImageFilterCatrom {
    fn radius(&self) -> f64 {
        2.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        if x < 1.0 {
            0.5 * (2.0 + x * x * (-5.0 + x * 3.0))
        } else if x < 2.0 {
            0.5 * (4.0 + x * (-8.0 + x * (5.0 - x)))
        } else {
            0.0
        }
    }
}

/// Mitchell-Netravali cubic with parameters `b`, `c` (1/3, 1/3 by default).
pub struct ImageFilterMitchell {
    near: [f64; 3],
    far: [f64; 4],
}

impl ImageFilterMitchell {
    pub fn new(b: f64, c: f64) -> Self {
        Self {
            near: [
                (6.0 - 2.0 * b) / 6.0,
                (-18.0 + 12.0 * b + 6.0 * c) / 6.0,
                (12.0 - 9.0 * b - 6.0 * c) / 6.0,
            ],
            far: [
                (8.0 * b + 24.0 * c) / 6.0,
                (-12.0 * b - 48.0 * c) / 6.0,
                (6.0 * b + 30.0 * c) / 6.0,
                (-b - 6.0 * c) / 6.0,
            ],
        }
    }
}

impl Default for ImageFilterMitchell {
    fn default() -> Self {
        Self::new(1.0 / 3.0, 1.0 / 3.0)
    }
}

impl ImageFilterFunction for ImageFilterMitchell {
    fn radius(&self) -> f64 {
        2.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        let [p0, p2, p3] = self.near;
        let [q0, q1, q2, q3] = self.far;
        if x < 1.0 {
            p0 + x * x * (p2 + x * p3)
        } else if x < 2.0 {
            q0 + x * (q1 + x * (q2 + x * q3))
        } else {
            0.0
        }
    }
}

pub struct ImageFilterSpline16;
impl ImageFilterFunction for ImageFilterSpline16 {
    fn radius(&self) -> f64 {
        2.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        if x < 1.0 {
            return ((x - 9.0 / 5.0) * x - 1.0 / 5.0) * x + 1.0;
        }
        let t = x - 1.0;
        ((-1.0 / 3.0 * t + 4.0 / 5.0) * t - 7.0 / 15.0) * t
    }
}

pub struct ImageFilterSpline36;
impl ImageFilterFunction for ImageFilterSpline36 {
    fn radius(&self) -> f64 {
        3.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        if x < 1.0 {
            return ((13.0 / 11.0 * x - 453.0 / 209.0) * x - 3.0 / 209.0) * x + 1.0;
        }
        if x < 2.0 {
            let t = x - 1.0;
            return ((-6.0 / 11.0 * t + 270.0 / 209.0) * t - 156.0 / 209.0) * t;
        }
        let t = x - 2.0;
        ((1.0 / 11.0 * t - 45.0 / 209.0) * t + 26.0 / 209.0) * t
    }
}

pub struct ImageFilterGaussian;
impl ImageFilterFunction for ImageFilterGaussian {
    fn radius(&self) -> f64 {
        2.0
    }
    fn calc_weight(&self, x: f64) -> f64 {
        (-2.0 * x * x).exp() * (2.0 / PI).sqrt()
    }
}

/// Jinc-style kernel built on `J1`, radius 3.2383.
pub struct ImageFilterBessel;
impl ImageFilterFunction for ImageFilterBessel {
    fn radius(&self) -> f64 {
        3.2383
    }
    fn calc_weight(&self, x: f64) -> f64 {
        if x == 0.0 {
            PI / 4.0
        } else {
            besj(PI * x, 1) / (2.0 * x)
        }
    }
}

// ============================================================================
// Variable-radius kernels
// ============================================================================

#[inline]
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        x.sin() / x
    }
}

pub struct ImageFilterSinc {
    radius: f64,
}
impl ImageFilterSinc {
    pub fn new(r: f64) -> Self {
        Self {
            radius: r.max(MIN_WINDOWED_RADIUS),
        }
    }
}
impl ImageFilterFunction for ImageFilterSinc {
    fn radius(&self) -> f64 {
        self.radius
    }
    fn calc_weight(&self, x: f64) -> f64 {
        sinc(x * PI)
    }
}

pub struct ImageFilterLanczos {
    radius: f64,
}
impl ImageFilterLanczos {
    pub fn new(r: f64) -> Self {
        Self {
            radius: r.max(MIN_WINDOWED_RADIUS),
        }
    }
}
impl ImageFilterFunction for ImageFilterLanczos {
    fn radius(&self) -> f64 {
        self.radius
    }
    fn calc_weight(&self, x: f64) -> f64 {
        if x > self.radius {
            return 0.0;
        }
        let x = x * PI;
        sinc(x) * sinc(x / self.radius)
    }
}

pub struct ImageFilterBlackman {
    radius: f64,
}
impl ImageFilterBlackman {
    pub fn new(r: f64) -> Self {
        Self {
            radius: r.max(MIN_WINDOWED_RADIUS),
        }
    }
}
impl ImageFilterFunction for ImageFilterBlackman {
    fn radius(&self) -> f64 {
        self.radius
    }
    fn calc_weight(&self, x: f64) -> f64 {
        if x == 0.0 {
            return 1.0;
        }
        if x > self.radius {
            return 0.0;
        }
        let x = x * PI;
        let xr = x / self.radius;
        sinc(x) * (0.42 + 0.5 * xr.cos() + 0.08 * (2.0 * xr).cos())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kernel_sums_to_one_per_phase() {
        for interp in Interpolation::ALL {
            let Some(lut) = interp.lut(true, 4.0) else {
                assert_eq!(interp, Interpolation::Nearest);
                continue;
            };
            for phase in 0..IMAGE_SUBPIXEL_SCALE as usize {
                let sum = lut.phase_sum(phase) as f64 / IMAGE_FILTER_SCALE as f64;
                assert!(
                    (sum - 1.0).abs() < 1e-3,
                    "{interp}: phase {phase} sums to {sum}"
                );
            }
        }
    }

    #[test]
    fn test_lut_geometry() {
        let lut = Interpolation::Bilinear.lut(true, 4.0).unwrap();
        assert_eq!(lut.diameter(), 2);
        assert_eq!(lut.start(), 0);
        assert_eq!(lut.weight_array().len(), 512);

        let lut = Interpolation::Bicubic.lut(true, 4.0).unwrap();
        assert_eq!(lut.diameter(), 4);
        assert_eq!(lut.start(), -1);

        let lut = Interpolation::Bessel.lut(true, 4.0).unwrap();
        assert_eq!(lut.diameter(), 8);
        assert_eq!(lut.start(), -3);
    }

    #[test]
    fn test_unnormalized_lut_is_symmetric() {
        let lut = ImageFilterLut::new_with_filter(&ImageFilterCatrom, false);
        let pivot = (lut.diameter() as usize) << (IMAGE_SUBPIXEL_SHIFT - 1);
        let w = lut.weight_array();
        assert_eq!(w[pivot], IMAGE_FILTER_SCALE as i16);
        for i in 1..pivot {
            assert_eq!(w[pivot + i], w[pivot - i], "asymmetry at offset {i}");
        }
    }

    #[test]
    fn test_windowed_radius_is_clamped() {
        assert_eq!(Interpolation::Sinc.kernel(1.0).unwrap().radius(), 2.0);
        assert_eq!(Interpolation::Lanczos.kernel(6.0).unwrap().radius(), 6.0);
        assert_eq!(Interpolation::Blackman.kernel(0.0).unwrap().radius(), 2.0);
        // fixed kernels ignore the radius argument
        assert_eq!(Interpolation::Spline36.kernel(9.0).unwrap().radius(), 3.0);
        assert!(Interpolation::Nearest.kernel(4.0).is_none());
    }

    #[test]
    fn test_kernel_peaks() {
        assert_eq!(ImageFilterBilinear.calc_weight(0.5), 0.5);
        assert_eq!(ImageFilterHermite.calc_weight(0.0), 1.0);
        assert!((ImageFilterBicubic.calc_weight(0.0) - 2.0 / 3.0).abs() < 1e-12);
        assert!((ImageFilterKaiser::default().calc_weight(0.0) - 1.0).abs() < 1e-10);
        assert!((ImageFilterMitchell::default().calc_weight(0.0) - 8.0 / 9.0).abs() < 1e-12);
        assert!((ImageFilterBessel.calc_weight(0.0) - PI / 4.0).abs() < 1e-12);
        assert_eq!(ImageFilterQuadric.calc_weight(1.5), 0.0);
        assert_eq!(ImageFilterLanczos::new(3.0).calc_weight(4.0), 0.0);
        assert_eq!(ImageFilterSinc::new(3.0).calc_weight(0.0), 1.0);
        assert_eq!(ImageFilterBlackman::new(3.0).calc_weight(0.0), 1.0);
    }

    #[test]
    fn test_names_and_codes() {
        for (i, interp) in Interpolation::ALL.iter().enumerate() {
            assert_eq!(interp.code(), i as u32);
            assert_eq!(Interpolation::from_code(i as u32), Some(*interp));
            assert_eq!(interp.name().parse::<Interpolation>().unwrap(), *interp);
        }
        assert_eq!("  Lanczos ".parse::<Interpolation>().unwrap(), Interpolation::Lanczos);
        assert!("cubic".parse::<Interpolation>().is_err());
        assert_eq!(Interpolation::from_code(17), None);
        assert_eq!(Interpolation::default(), Interpolation::Bilinear);
        assert!(!Interpolation::Nearest.needs_padding());
    }
}
