//! Resampling image.
//!
//! An [`Image`] holds an input raster, an output raster, the two affine
//! matrices that place the input on the output, and the sampling settings.
//! [`Image::resize`] runs the anti-aliased scanline pipeline: the input
//! footprint is rasterized through `src_matrix`, and every covered output
//! pixel is sampled from the input through the inverse of `image_matrix`.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::array_view::ArrayView;
use crate::basics::deg2rad;
use crate::codec::RgbaEncoder;
use crate::color::{OrderArgb, OrderRgba, Rgba, Rgba8};
use crate::edge_pad::pad_edges;
use crate::error::{ImageError, Result};
use crate::image_filters::{Interpolation, MAX_FILTER_RADIUS};
use crate::pixfmt_rgba::PixfmtRgba32;
use crate::rasterizer_scanline_aa::RasterizerScanlineAa;
use crate::renderer_base::RendererBase;
use crate::renderer_scanline::render_scanlines_aa;
use crate::rendering_buffer::{alloc_pixels, raster_bytes, RenderingBuffer, BPP};
use crate::scanline_u::ScanlineU8;
use crate::span_image_filter_rgba::{SpanImageFilterRgba, SpanImageFilterRgbaNn};
use crate::span_interpolator_linear::SpanInterpolatorLinear;
use crate::trans_affine::TransAffine;

// ============================================================================
// Settings
// ============================================================================

/// Aspect ratio policy. Stored for the caller; resampling ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aspect {
    #[default]
    Free,
    Preserve,
}

impl Aspect {
    pub fn name(self) -> &'static str {
        match self {
            Aspect::Free => "free",
            Aspect::Preserve => "preserve",
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Aspect::Free),
            1 => Some(Aspect::Preserve),
            _ => None,
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aspect {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(Aspect::Free),
            "preserve" => Ok(Aspect::Preserve),
            _ => Err(ImageError::InvalidArgument(format!("unknown aspect policy {s:?}"))),
        }
    }
}

/// Which raster an ingestion call fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The raster `resize` samples from.
    Input,
    /// The result raster, used as-is without resampling.
    Output,
}

/// Filter options for [`Image::resize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    /// Renormalize each subpixel phase of the kernel to sum to one.
    pub norm: bool,
    /// Support radius of the sinc, lanczos and blackman kernels. Must be
    /// finite and no larger than [`MAX_FILTER_RADIUS`].
    pub radius: f64,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            norm: true,
            radius: 4.0,
        }
    }
}

// ============================================================================
// Image
// ============================================================================

/// Input and output rasters plus the transform and sampling state that maps
/// one onto the other.
///
/// The lifetime belongs to an output raster attached with
/// [`Image::attach_output`]; images that own all their memory are
/// `Image<'static>`.
#[derive(Debug)]
pub struct Image<'a> {
    input: Option<RenderingBuffer<'static>>,
    output: Option<RenderingBuffer<'a>>,
    src_matrix: TransAffine,
    image_matrix: TransAffine,
    bg: Rgba,
    interpolation: Interpolation,
    aspect: Aspect,
}

impl Default for Image<'_> {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            src_matrix: TransAffine::new(),
            image_matrix: TransAffine::new(),
            bg: Rgba::transparent_white(),
            interpolation: Interpolation::Bilinear,
            aspect: Aspect::Free,
        }
    }
}

impl Image<'static> {
    /// Build an image from a float array in [0, 1].
    ///
    /// Rank 2 arrays are luminance and expand to opaque gray. Rank 3 arrays
    /// must have 3 (RGB, opaque) or 4 (RGBA) trailing channels. Values are
    /// scaled by 255 and truncated, saturating outside [0, 1].
    pub fn from_array(array: &ArrayView<'_, f64>, target: Target) -> Result<Self> {
        log::trace!("Image::from_array shape={:?} target={target:?}", array.shape());
        let (rows, cols, channels) = match array.ndim() {
            2 => (array.dim(0), array.dim(1), 1),
            3 => match array.dim(2) {
                c @ (3 | 4) => (array.dim(0), array.dim(1), c),
                c => {
                    return Err(ImageError::InvalidArgument(format!(
                        "3rd dimension must be length 3 (RGB) or 4 (RGBA); found {c}"
                    )))
                }
            },
            n => {
                return Err(ImageError::InvalidArgument(format!(
                    "illegal array rank {n}; must be 2 or 3"
                )))
            }
        };

        let (width, height) = raster_size(cols, rows)?;
        let mut data = alloc_pixels(width, height)?;
        let mut px = data.chunks_exact_mut(BPP);
        for row in 0..rows {
            for col in 0..cols {
                let Some(dst) = px.next() else { break };
                let rgba = if channels == 1 {
                    let gray = channel_byte(array.at(&[row, col]));
                    [gray, gray, gray, 255]
                } else {
                    let ch = |c: usize| channel_byte(array.at(&[row, col, c]));
                    let alpha = if channels == 4 { ch(3) } else { 255 };
                    [ch(0), ch(1), ch(2), alpha]
                };
                dst.copy_from_slice(&rgba);
            }
        }

        Self::with_raster(RenderingBuffer::from_vec(data, width, height)?, target)
    }

    /// Build an image from a rank 3 byte array with 3 or 4 channels.
    pub fn from_bytes(array: &ArrayView<'_, u8>, target: Target) -> Result<Self> {
        log::trace!("Image::from_bytes shape={:?} target={target:?}", array.shape());
        array.expect_rank(3, "byte image")?;
        let channels = array.dim(2);
        if !(3..=4).contains(&channels) {
            return Err(ImageError::InvalidArgument(format!(
                "array dimension 3 must have size 3 or 4, found {channels}"
            )));
        }

        let (rows, cols) = (array.dim(0), array.dim(1));
        let (width, height) = raster_size(cols, rows)?;
        let mut data = alloc_pixels(width, height)?;
        let mut px = data.chunks_exact_mut(BPP);
        for row in 0..rows {
            for col in 0..cols {
                let Some(dst) = px.next() else { break };
                for (c, v) in dst.iter_mut().enumerate().take(channels) {
                    *v = array.at(&[row, col, c]);
                }
                if channels == 3 {
                    dst[OrderRgba::A] = 255;
                }
            }
        }

        Self::with_raster(RenderingBuffer::from_vec(data, width, height)?, target)
    }

    /// Build an image from exactly `width * height * 4` RGBA bytes.
    pub fn from_buffer(buf: &[u8], width: u32, height: u32, target: Target) -> Result<Self> {
        log::trace!("Image::from_buffer {width}x{height} target={target:?}");
        let expected = raster_bytes(width, height)?;
        if buf.len() != expected {
            return Err(ImageError::InvalidArgument(format!(
                "buffer length must be width * height * 4 ({expected}), got {}",
                buf.len()
            )));
        }
        let mut data = alloc_pixels(width, height)?;
        data.copy_from_slice(buf);
        Self::with_raster(RenderingBuffer::from_vec(data, width, height)?, target)
    }

    fn with_raster(raster: RenderingBuffer<'static>, target: Target) -> Result<Self> {
        let mut image = Self::default();
        match target {
            Target::Input => image.input = Some(raster),
            Target::Output => image.output = Some(raster),
        }
        Ok(image)
    }
}

impl<'a> Image<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render into caller memory. The buffer is never freed by the image.
    pub fn attach_output(&mut self, buf: &'a mut [u8], width: u32, height: u32) -> Result<()> {
        log::trace!("Image::attach_output {width}x{height}");
        self.output = Some(RenderingBuffer::attach(buf, width, height)?);
        Ok(())
    }

    pub fn input(&self) -> Option<&RenderingBuffer<'static>> {
        self.input.as_ref()
    }

    pub fn output(&self) -> Option<&RenderingBuffer<'a>> {
        self.output.as_ref()
    }

    pub(crate) fn set_output(&mut self, raster: RenderingBuffer<'a>) {
        self.output = Some(raster);
    }

    pub fn src_matrix(&self) -> &TransAffine {
        &self.src_matrix
    }

    pub fn image_matrix(&self) -> &TransAffine {
        &self.image_matrix
    }

    // ------------------------------------------------------------------------
    // Transform edits, applied to both matrices
    // ------------------------------------------------------------------------

    /// Rotate by `degrees`.
    pub fn apply_rotation(&mut self, degrees: f64) {
        log::trace!("Image::apply_rotation {degrees}");
        self.apply(&TransAffine::new_rotation(deg2rad(degrees)));
    }

    pub fn apply_scaling(&mut self, sx: f64, sy: f64) {
        log::trace!("Image::apply_scaling {sx} {sy}");
        self.apply(&TransAffine::new_scaling(sx, sy));
    }

    pub fn apply_translation(&mut self, tx: f64, ty: f64) {
        log::trace!("Image::apply_translation {tx} {ty}");
        self.apply(&TransAffine::new_translation(tx, ty));
    }

    fn apply(&mut self, m: &TransAffine) {
        self.src_matrix.multiply(m);
        self.image_matrix.multiply(m);
    }

    pub fn reset_matrix(&mut self) {
        log::trace!("Image::reset_matrix");
        self.src_matrix.reset();
        self.image_matrix.reset();
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Background colour, components in [0, 1].
    pub fn set_bg(&mut self, r: f64, g: f64, b: f64, a: f64) {
        log::trace!("Image::set_bg {r} {g} {b} {a}");
        self.bg = Rgba::new(r, g, b, a);
    }

    pub fn background(&self) -> Rgba {
        self.bg
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        log::trace!("Image::set_interpolation {interpolation}");
        self.interpolation = interpolation;
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_aspect(&mut self, aspect: Aspect) {
        log::trace!("Image::set_aspect {aspect}");
        self.aspect = aspect;
    }

    pub fn aspect(&self) -> Aspect {
        self.aspect
    }

    /// `(rows, cols)` of the input raster, zero when none is loaded.
    pub fn size(&self) -> (u32, u32) {
        log::trace!("Image::size");
        self.input
            .as_ref()
            .map_or((0, 0), |r| (r.height(), r.width()))
    }

    /// `(rows, cols)` of the output raster, zero when there is none.
    pub fn size_out(&self) -> (u32, u32) {
        log::trace!("Image::size_out");
        self.output
            .as_ref()
            .map_or((0, 0), |r| (r.height(), r.width()))
    }

    /// Reverse the row order of the input without copying.
    pub fn flipud_in(&mut self) {
        log::trace!("Image::flipud_in");
        if let Some(r) = self.input.as_mut() {
            r.flip_vertical();
        }
    }

    /// Reverse the row order of the output without copying.
    pub fn flipud_out(&mut self) {
        log::trace!("Image::flipud_out");
        if let Some(r) = self.output.as_mut() {
            r.flip_vertical();
        }
    }

    // ------------------------------------------------------------------------
    // Resampling
    // ------------------------------------------------------------------------

    /// Resample the input into a `width x height` output raster.
    ///
    /// An attached output of the same size is rendered in place; otherwise
    /// a new raster is allocated. The previous output is left alone when the
    /// pass fails.
    pub fn resize(&mut self, width: u32, height: u32, options: ResizeOptions) -> Result<()> {
        log::trace!("Image::resize {width}x{height} {options:?}");
        let input = self
            .input
            .as_ref()
            .ok_or(ImageError::InvalidState("you must first load the image"))?;

        if !(options.radius.is_finite() && options.radius <= MAX_FILTER_RADIUS) {
            return Err(ImageError::InvalidArgument(format!(
                "filter radius must be finite and at most {MAX_FILTER_RADIUS}, got {}",
                options.radius
            )));
        }
        let inverse = self.image_matrix.inverted()?;
        let lut = self.interpolation.lut(options.norm, options.radius);
        let padded = match lut {
            Some(_) if !input.is_empty() => Some(pad_edges(input)?),
            _ => None,
        };

        let reuse = matches!(
            &self.output,
            Some(o) if !o.is_owned() && o.width() == width && o.height() == height
        );
        if !reuse {
            self.output = Some(RenderingBuffer::new(width, height)?);
        }
        let Some(out) = self.output.as_mut() else {
            return Err(ImageError::InvalidState("output buffer missing"));
        };

        let background = Rgba8::from_rgba(&self.bg);
        let mut ren = RendererBase::new(PixfmtRgba32::new(out));
        ren.clear(&background);

        if !input.is_empty() {
            let cols = input.width() as f64;
            let rows = input.height() as f64;
            let (x0, y0, x1, y1) = if self.interpolation.needs_padding() {
                (1.0, 1.0, cols + 1.0, rows + 1.0)
            } else {
                (0.0, 0.0, cols, rows)
            };
            let footprint = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)].map(|(mut x, mut y)| {
                self.src_matrix.transform(&mut x, &mut y);
                (x, y)
            });

            let mut ras = RasterizerScanlineAa::new();
            ras.clip_box(0.0, 0.0, width as f64, height as f64);
            ras.add_polygon(&footprint);

            let mut sl = ScanlineU8::new();
            let interpolator = SpanInterpolatorLinear::new(inverse);
            match (&lut, &padded) {
                (Some(lut), Some(padded)) => {
                    let mut sg = SpanImageFilterRgba::new(padded, background, interpolator, lut);
                    render_scanlines_aa(&mut ras, &mut sl, &mut ren, &mut sg);
                }
                _ => {
                    let mut sg = SpanImageFilterRgbaNn::new(input, background, interpolator);
                    render_scanlines_aa(&mut ras, &mut sl, &mut ren, &mut sg);
                }
            }
        }

        log::debug!(
            "resized {}x{} -> {width}x{height} with {}",
            input.width(),
            input.height(),
            self.interpolation
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Output emission
    // ------------------------------------------------------------------------

    fn require_output(&self) -> Result<&RenderingBuffer<'a>> {
        self.output
            .as_ref()
            .ok_or(ImageError::InvalidState("image has no output buffer"))
    }

    /// `(rows, cols, bytes)` of the output in top-down RGBA order.
    ///
    /// Borrows the raster unless it is flipped.
    pub fn as_rgba_bytes(&self) -> Result<(u32, u32, Cow<'_, [u8]>)> {
        log::trace!("Image::as_rgba_bytes");
        let out = self.require_output()?;
        Ok((out.height(), out.width(), out.to_top_down_bytes()))
    }

    /// `(rows, cols, bytes)` of the output exactly as stored.
    pub fn buffer_rgba(&self) -> Result<(u32, u32, &[u8])> {
        log::trace!("Image::buffer_rgba");
        let out = self.require_output()?;
        Ok((out.height(), out.width(), out.as_bytes()))
    }

    /// `(rows, cols, bytes)` of the output reordered to A, R, G, B.
    pub fn buffer_argb32(&self) -> Result<(u32, u32, Vec<u8>)> {
        log::trace!("Image::buffer_argb32");
        let out = self.require_output()?;
        let mut argb = alloc_pixels(out.width(), out.height())?;
        let row_len = out.width() as usize * BPP;
        if row_len > 0 {
            for (y, dst_row) in (0..out.height()).zip(argb.chunks_exact_mut(row_len)) {
                for (dst, src) in dst_row
                    .chunks_exact_mut(BPP)
                    .zip(out.row_slice(y).chunks_exact(BPP))
                {
                    dst[OrderArgb::A] = src[OrderRgba::A];
                    dst[OrderArgb::R] = src[OrderRgba::R];
                    dst[OrderArgb::G] = src[OrderRgba::G];
                    dst[OrderArgb::B] = src[OrderRgba::B];
                }
            }
        }
        Ok((out.height(), out.width(), argb))
    }

    /// Hand the top-down output to `encoder`.
    pub fn write_png<E: RgbaEncoder + ?Sized>(&self, path: impl AsRef<Path>, encoder: &mut E) -> Result<()> {
        let path = path.as_ref();
        log::trace!("Image::write_png {}", path.display());
        let (rows, cols, bytes) = self.as_rgba_bytes()?;
        encoder
            .encode_rgba(path, cols, rows, &bytes)
            .map_err(|source| ImageError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Scale a [0, 1] float to a byte, truncating and saturating.
#[inline]
fn channel_byte(v: f64) -> u8 {
    (255.0 * v) as u8
}

fn raster_size(cols: usize, rows: usize) -> Result<(u32, u32)> {
    let too_large = || ImageError::InvalidArgument(format!("image of {rows}x{cols} is too large"));
    Ok((
        u32::try_from(cols).map_err(|_| too_large())?,
        u32::try_from(rows).map_err(|_| too_large())?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 40) as u8, (y * 40) as u8, (x + y) as u8, 200]);
            }
        }
        data
    }

    #[test]
    fn test_defaults() {
        let img = Image::new();
        assert_eq!(img.interpolation(), Interpolation::Bilinear);
        assert_eq!(img.aspect(), Aspect::Free);
        assert_eq!(img.background(), Rgba::new(1.0, 1.0, 1.0, 0.0));
        assert_eq!(img.size(), (0, 0));
        assert_eq!(img.size_out(), (0, 0));
    }

    #[test]
    fn test_aspect_names_and_codes() {
        assert_eq!("preserve".parse::<Aspect>().unwrap(), Aspect::Preserve);
        assert_eq!(Aspect::Free.to_string(), "free");
        assert_eq!(Aspect::from_code(1), Some(Aspect::Preserve));
        assert_eq!(Aspect::Preserve.code(), 1);
        assert!("square".parse::<Aspect>().is_err());
    }

    #[test]
    fn test_unbounded_radius_is_rejected() {
        let mut img = Image::from_buffer(&[10, 20, 30, 255], 1, 1, Target::Input).unwrap();
        img.set_interpolation(Interpolation::Sinc);
        img.resize(2, 2, ResizeOptions::default()).unwrap();
        let before = img.buffer_rgba().unwrap().2.to_vec();

        for radius in [f64::INFINITY, f64::NAN, 1e12] {
            let options = ResizeOptions { norm: true, radius };
            assert!(matches!(
                img.resize(3, 3, options),
                Err(ImageError::InvalidArgument(_))
            ));
        }
        assert_eq!(img.size_out(), (2, 2));
        assert_eq!(img.buffer_rgba().unwrap().2, &before[..]);
    }

    #[test]
    fn test_resize_without_input_fails() {
        let mut img = Image::new();
        assert!(matches!(
            img.resize(4, 4, ResizeOptions::default()),
            Err(ImageError::InvalidState(_))
        ));
    }

    #[test]
    fn test_nearest_identity_round_trip() {
        let data = gradient(5, 3);
        let mut img = Image::from_buffer(&data, 5, 3, Target::Input).unwrap();
        img.set_interpolation(Interpolation::Nearest);
        img.resize(5, 3, ResizeOptions::default()).unwrap();
        let (rows, cols, bytes) = img.as_rgba_bytes().unwrap();
        assert_eq!((rows, cols), (3, 5));
        assert_eq!(&bytes[..], &data[..]);
    }

    #[test]
    fn test_nearest_upscale_by_two() {
        let data = gradient(2, 2);
        let mut img = Image::from_buffer(&data, 2, 2, Target::Input).unwrap();
        img.set_interpolation(Interpolation::Nearest);
        img.apply_scaling(2.0, 2.0);
        img.resize(4, 4, ResizeOptions::default()).unwrap();
        let out = img.output().unwrap();
        assert_eq!(out.pixel(0, 0), out.pixel(1, 1));
        assert_eq!(out.pixel(3, 3), Rgba8::from_slice(&data[12..16]));
        assert_eq!(out.pixel(2, 0), Rgba8::from_slice(&data[4..8]));
    }

    #[test]
    fn test_uncovered_pixels_get_background() {
        let data = gradient(2, 2);
        let mut img = Image::from_buffer(&data, 2, 2, Target::Input).unwrap();
        img.set_interpolation(Interpolation::Nearest);
        img.set_bg(0.0, 0.0, 1.0, 1.0);
        img.resize(4, 4, ResizeOptions::default()).unwrap();
        let out = img.output().unwrap();
        assert_eq!(out.pixel(3, 3), Rgba8::new(0, 0, 255, 255));
        assert_eq!(out.pixel(0, 3), Rgba8::new(0, 0, 255, 255));
        assert_eq!(out.pixel(1, 1), Rgba8::from_slice(&data[12..16]));
    }

    #[test]
    fn test_bilinear_flat_image_stays_flat() {
        let data = [90u8, 60, 30, 255].repeat(16);
        let mut img = Image::from_buffer(&data, 4, 4, Target::Input).unwrap();
        img.apply_scaling(1.5, 1.5);
        img.resize(6, 6, ResizeOptions::default()).unwrap();
        let out = img.output().unwrap();
        // padded footprint starts at 1.5 output pixels
        assert_eq!(out.pixel(0, 0), Rgba8::new(255, 255, 255, 0));
        for y in 2..6 {
            for x in 2..6 {
                let p = out.pixel(x, y);
                for (got, want) in p.to_array().into_iter().zip([90, 60, 30, 255]) {
                    assert!(got.abs_diff(want) <= 1, "({x}, {y}): {p:?}");
                }
            }
        }
    }

    #[test]
    fn test_singular_matrix_keeps_previous_output() {
        let data = gradient(2, 2);
        let mut img = Image::from_buffer(&data, 2, 2, Target::Input).unwrap();
        img.resize(2, 2, ResizeOptions::default()).unwrap();
        img.apply_scaling(0.0, 1.0);
        assert!(matches!(
            img.resize(3, 3, ResizeOptions::default()),
            Err(ImageError::DegenerateTransform { .. })
        ));
        assert_eq!(img.size_out(), (2, 2));
        // stored matrix is untouched by the failed pass
        assert_eq!(img.image_matrix().determinant(), 0.0);
    }

    #[test]
    fn test_repeated_resize_does_not_reinvert() {
        let data = gradient(3, 3);
        let mut img = Image::from_buffer(&data, 3, 3, Target::Input).unwrap();
        img.set_interpolation(Interpolation::Nearest);
        img.apply_translation(1.0, 0.0);
        img.resize(4, 3, ResizeOptions::default()).unwrap();
        let first = img.as_rgba_bytes().unwrap().2.into_owned();
        img.resize(4, 3, ResizeOptions::default()).unwrap();
        assert_eq!(img.as_rgba_bytes().unwrap().2.into_owned(), first);
        assert_eq!(img.output().unwrap().pixel(1, 0), Rgba8::from_slice(&data[0..4]));
    }

    #[test]
    fn test_zero_sized_input_gives_background() {
        let mut img = Image::from_buffer(&[], 0, 0, Target::Input).unwrap();
        img.set_bg(1.0, 0.0, 0.0, 1.0);
        img.resize(2, 1, ResizeOptions::default()).unwrap();
        let (_, _, bytes) = img.as_rgba_bytes().unwrap();
        assert_eq!(&bytes[..], &[255, 0, 0, 255, 255, 0, 0, 255]);
    }

    #[test]
    fn test_from_array_gray_is_opaque() {
        let data = [0.0, 0.5, 1.0, 2.0];
        let view = ArrayView::new(&data, &[2, 2]).unwrap();
        let img = Image::from_array(&view, Target::Output).unwrap();
        let (_, _, bytes) = img.buffer_rgba().unwrap();
        assert_eq!(
            bytes,
            &[0, 0, 0, 255, 127, 127, 127, 255, 255, 255, 255, 255, 255, 255, 255, 255]
        );
        assert!(img.input().is_none());
    }

    #[test]
    fn test_from_array_rejects_bad_channels() {
        let data = [0.0; 8];
        let view = ArrayView::new(&data, &[1, 4, 2]).unwrap();
        assert!(Image::from_array(&view, Target::Input).is_err());
        let view = ArrayView::new(&data, &[8]).unwrap();
        assert!(Image::from_array(&view, Target::Input).is_err());
    }

    #[test]
    fn test_from_bytes_rgb() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let view = ArrayView::new(&data, &[1, 2, 3]).unwrap();
        let img = Image::from_bytes(&view, Target::Input).unwrap();
        assert_eq!(img.size(), (1, 2));
        assert_eq!(img.input().unwrap().as_bytes(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_from_buffer_length_mismatch() {
        assert!(matches!(
            Image::from_buffer(&[0; 7], 1, 2, Target::Input),
            Err(ImageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_buffer_overflowing_size_is_rejected() {
        assert!(matches!(
            Image::from_buffer(&[], 1 << 31, 1 << 31, Target::Input),
            Err(ImageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_flipud_out_changes_read_order() {
        let data = gradient(1, 2);
        let mut img = Image::from_buffer(&data, 1, 2, Target::Output).unwrap();
        img.flipud_out();
        let (_, _, top_down) = img.as_rgba_bytes().unwrap();
        assert_eq!(&top_down[..4], &data[4..8]);
        assert!(matches!(top_down, Cow::Owned(_)));
        // raw buffer is unchanged
        assert_eq!(img.buffer_rgba().unwrap().2, &data[..]);
        img.flipud_out();
        assert!(img.output().unwrap().stride() > 0);
    }

    #[test]
    fn test_buffer_argb32() {
        let img = Image::from_buffer(&[1, 2, 3, 4], 1, 1, Target::Output).unwrap();
        assert_eq!(img.buffer_argb32().unwrap(), (1, 1, vec![4, 1, 2, 3]));
    }

    #[test]
    fn test_attach_output_renders_into_caller_memory() {
        let mut mem = vec![0u8; 2 * 2 * 4];
        {
            let mut img = Image::from_buffer(&[10, 20, 30, 255], 1, 1, Target::Input).unwrap();
            img.set_interpolation(Interpolation::Nearest);
            img.attach_output(&mut mem, 2, 2).unwrap();
            img.resize(2, 2, ResizeOptions::default()).unwrap();
            assert!(!img.output().unwrap().is_owned());
        }
        assert_eq!(&mem[..4], &[10, 20, 30, 255]);
        assert_eq!(&mem[4..8], &[255, 255, 255, 0]);
    }

    #[test]
    fn test_attached_output_of_other_size_is_replaced() {
        let mut mem = vec![7u8; 4];
        let mut img = Image::from_buffer(&[10, 20, 30, 255], 1, 1, Target::Input).unwrap();
        img.attach_output(&mut mem, 1, 1).unwrap();
        img.resize(2, 2, ResizeOptions::default()).unwrap();
        assert!(img.output().unwrap().is_owned());
        drop(img);
        assert_eq!(mem, vec![7; 4]);
    }

    struct Capture(Vec<(u32, u32, Vec<u8>)>);

    impl RgbaEncoder for Capture {
        fn encode_rgba(
            &mut self,
            _path: &Path,
            width: u32,
            height: u32,
            rgba: &[u8],
        ) -> std::io::Result<()> {
            self.0.push((width, height, rgba.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_write_png_hands_over_top_down_rows() {
        let data = gradient(2, 3);
        let mut img = Image::from_buffer(&data, 2, 3, Target::Output).unwrap();
        img.flipud_out();
        let mut enc = Capture(Vec::new());
        img.write_png("out.png", &mut enc).unwrap();
        let (w, h, bytes) = &enc.0[0];
        assert_eq!((*w, *h), (2, 3));
        assert_eq!(&bytes[..8], &data[16..24]);

        assert!(matches!(
            Image::new().write_png("none.png", &mut enc),
            Err(ImageError::InvalidState(_))
        ));
    }

    #[test]
    fn test_matrix_edits_apply_to_both() {
        let mut img = Image::new();
        img.apply_rotation(90.0);
        img.apply_translation(2.0, 3.0);
        assert_eq!(img.src_matrix(), img.image_matrix());
        let (mut x, mut y) = (1.0, 0.0);
        img.src_matrix().transform(&mut x, &mut y);
        assert!((x - 2.0).abs() < 1e-12 && (y - 4.0).abs() < 1e-12);
        img.reset_matrix();
        assert!(img.src_matrix().is_identity(1e-14));
    }
}
