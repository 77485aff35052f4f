//! RGBA image sampling span generators.
//!
//! Both generators walk destination pixel centres back into the source
//! raster through a [`SpanInterpolator`]. Source pixels outside the raster
//! read as the background colour.

use crate::color::Rgba8;
use crate::image_filters::{
    ImageFilterLut, IMAGE_FILTER_SCALE, IMAGE_FILTER_SHIFT, IMAGE_SUBPIXEL_MASK,
    IMAGE_SUBPIXEL_SCALE, IMAGE_SUBPIXEL_SHIFT,
};
use crate::renderer_scanline::SpanGenerator;
use crate::rendering_buffer::RenderingBuffer;
use crate::span_interpolator_linear::SpanInterpolator;

/// Pixel centre offset applied before interpolation.
const FILTER_OFFSET: f64 = 0.5;
/// The same offset in subpixel units; the kernel window is centred on it.
const FILTER_OFFSET_INT: i32 = (IMAGE_SUBPIXEL_SCALE / 2) as i32;

const MASK: i32 = IMAGE_SUBPIXEL_MASK as i32;

/// Source raster with a background colour for reads outside it.
struct ClippedSource<'a, 'b> {
    rbuf: &'a RenderingBuffer<'b>,
    background: Rgba8,
}

impl ClippedSource<'_, '_> {
    #[inline]
    fn pixel(&self, x: i32, y: i32) -> Rgba8 {
        if x < 0 || y < 0 || x >= self.rbuf.width() as i32 || y >= self.rbuf.height() as i32 {
            self.background
        } else {
            self.rbuf.pixel(x as u32, y as u32)
        }
    }
}

// ============================================================================
// SpanImageFilterRgbaNn: nearest neighbour
// ============================================================================

/// Copies the source pixel the mapped centre falls in.
pub struct SpanImageFilterRgbaNn<'a, 'b, I> {
    source: ClippedSource<'a, 'b>,
    interpolator: I,
}

impl<'a, 'b, I: SpanInterpolator> SpanImageFilterRgbaNn<'a, 'b, I> {
    pub fn new(rbuf: &'a RenderingBuffer<'b>, background: Rgba8, interpolator: I) -> Self {
        Self {
            source: ClippedSource { rbuf, background },
            interpolator,
        }
    }

    pub fn background(&self) -> Rgba8 {
        self.source.background
    }
}

impl<I: SpanInterpolator> SpanGenerator for SpanImageFilterRgbaNn<'_, '_, I> {
    type Color = Rgba8;

    fn generate(&mut self, span: &mut [Rgba8], x: i32, y: i32) {
        self.interpolator.begin(
            x as f64 + FILTER_OFFSET,
            y as f64 + FILTER_OFFSET,
            span.len() as u32,
        );
        for pixel in span.iter_mut() {
            let (sx, sy) = self.interpolator.coordinates();
            *pixel = self
                .source
                .pixel(sx >> IMAGE_SUBPIXEL_SHIFT, sy >> IMAGE_SUBPIXEL_SHIFT);
            self.interpolator.next();
        }
    }
}

// ============================================================================
// SpanImageFilterRgba: general separable kernel
// ============================================================================

/// Weighted sum over the `diameter x diameter` window of a filter LUT.
///
/// Channels are accumulated independently in 14-bit fixed point and clamped
/// to [0, 255]; negative lobes may undershoot or overshoot.
pub struct SpanImageFilterRgba<'a, 'b, I> {
    source: ClippedSource<'a, 'b>,
    interpolator: I,
    filter: &'a ImageFilterLut,
}

impl<'a, 'b, I: SpanInterpolator> SpanImageFilterRgba<'a, 'b, I> {
    pub fn new(
        rbuf: &'a RenderingBuffer<'b>,
        background: Rgba8,
        interpolator: I,
        filter: &'a ImageFilterLut,
    ) -> Self {
        Self {
            source: ClippedSource { rbuf, background },
            interpolator,
            filter,
        }
    }

    pub fn filter(&self) -> &ImageFilterLut {
        self.filter
    }

    fn sample(&self, cx: i32, cy: i32) -> Rgba8 {
        let diameter = self.filter.diameter() as i32;
        let start = self.filter.start();
        let weights = self.filter.weight_array();

        let x0 = (cx >> IMAGE_SUBPIXEL_SHIFT) + start;
        let y0 = (cy >> IMAGE_SUBPIXEL_SHIFT) + start;
        let x_phase = MASK - (cx & MASK);
        let y_phase = MASK - (cy & MASK);

        let mut fg = [0i32; 4];
        for j in 0..diameter {
            let weight_y = weights[(y_phase + j * IMAGE_SUBPIXEL_SCALE as i32) as usize] as i32;
            for i in 0..diameter {
                let weight_x = weights[(x_phase + i * IMAGE_SUBPIXEL_SCALE as i32) as usize] as i32;
                let weight = (weight_y * weight_x + IMAGE_FILTER_SCALE / 2) >> IMAGE_FILTER_SHIFT;
                let p = self.source.pixel(x0 + i, y0 + j).to_array();
                for (acc, v) in fg.iter_mut().zip(p) {
                    *acc += weight * v as i32;
                }
            }
        }

        let [r, g, b, a] = fg.map(|v| (v >> IMAGE_FILTER_SHIFT).clamp(0, 255) as u8);
        Rgba8::new(r, g, b, a)
    }
}

impl<I: SpanInterpolator> SpanGenerator for SpanImageFilterRgba<'_, '_, I> {
    type Color = Rgba8;

    fn generate(&mut self, span: &mut [Rgba8], x: i32, y: i32) {
        self.interpolator.begin(
            x as f64 + FILTER_OFFSET,
            y as f64 + FILTER_OFFSET,
            span.len() as u32,
        );
        for pixel in span.iter_mut() {
            let (cx, cy) = self.interpolator.coordinates();
            *pixel = self.sample(cx - FILTER_OFFSET_INT, cy - FILTER_OFFSET_INT);
            self.interpolator.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_filters::{ImageFilterBilinear, Interpolation};
    use crate::span_interpolator_linear::SpanInterpolatorLinear;
    use crate::trans_affine::TransAffine;

    fn checker() -> RenderingBuffer<'static> {
        let mut data = Vec::new();
        for i in 0..4u8 {
            let v = if i % 3 == 0 { 200 } else { 40 };
            data.extend_from_slice(&[v, v / 2, 10 * i, 255]);
        }
        RenderingBuffer::from_vec(data, 2, 2).unwrap()
    }

    #[test]
    fn test_nn_identity_copies_pixels() {
        let src = checker();
        let interp = SpanInterpolatorLinear::new(TransAffine::new());
        let bg = Rgba8::new(1, 2, 3, 4);
        let mut sg = SpanImageFilterRgbaNn::new(&src, bg, interp);
        let mut span = [Rgba8::default(); 3];
        sg.generate(&mut span, 0, 1);
        assert_eq!(span[0], src.pixel(0, 1));
        assert_eq!(span[1], src.pixel(1, 1));
        assert_eq!(span[2], bg);
    }

    #[test]
    fn test_nn_negative_coordinates_read_background() {
        let src = checker();
        let interp = SpanInterpolatorLinear::new(TransAffine::new_translation(-3.0, 0.0));
        let bg = Rgba8::new(9, 9, 9, 9);
        let mut sg = SpanImageFilterRgbaNn::new(&src, bg, interp);
        assert_eq!(sg.background(), bg);
        let mut span = [Rgba8::default(); 2];
        sg.generate(&mut span, 0, 0);
        assert_eq!(span, [bg, bg]);
    }

    #[test]
    fn test_bilinear_identity_keeps_flat_interior() {
        let px = [200, 100, 50, 255];
        let src = RenderingBuffer::from_vec(px.repeat(9), 3, 3).unwrap();
        let lut = ImageFilterLut::new_with_filter(&ImageFilterBilinear, true);
        let interp = SpanInterpolatorLinear::new(TransAffine::new());
        let mut sg = SpanImageFilterRgba::new(&src, Rgba8::default(), interp, &lut);
        let mut span = [Rgba8::default(); 1];
        sg.generate(&mut span, 1, 1);
        assert_eq!(span[0], Rgba8::new(200, 100, 50, 255));
    }

    #[test]
    fn test_bilinear_half_step_averages() {
        let data = vec![0, 0, 0, 255, 200, 100, 50, 255];
        let src = RenderingBuffer::from_vec(data, 2, 1).unwrap();
        let lut = Interpolation::Bilinear.lut(true, 4.0).unwrap();
        // destination pixel 0 centre maps to the seam between the two pixels
        let interp = SpanInterpolatorLinear::new(TransAffine::new_translation(0.5, 0.0));
        let mut sg = SpanImageFilterRgba::new(&src, Rgba8::new(0, 0, 0, 255), interp, &lut);
        let mut span = [Rgba8::default(); 1];
        sg.generate(&mut span, 0, 0);
        assert!((99..=101).contains(&span[0].r), "r = {}", span[0].r);
        assert!((49..=51).contains(&span[0].g), "g = {}", span[0].g);
        assert_eq!(span[0].a, 255);
    }

    #[test]
    fn test_negative_lobes_are_clamped() {
        let mut data = vec![0u8; 5 * 4];
        data[8..12].copy_from_slice(&[255, 255, 255, 255]);
        let src = RenderingBuffer::from_vec(data, 5, 1).unwrap();
        let lut = Interpolation::Lanczos.lut(true, 4.0).unwrap();
        let interp = SpanInterpolatorLinear::new(TransAffine::new_scaling(0.37, 1.0));
        let mut sg = SpanImageFilterRgba::new(&src, Rgba8::default(), interp, &lut);
        let mut span = [Rgba8::default(); 14];
        sg.generate(&mut span, 0, 0);
        assert!(span.iter().any(|c| c.r > 0));
        assert_eq!(sg.filter().diameter(), 8);
    }
}
