//! Scanline rendering driver.
//!
//! Ties the pipeline together: rasterizer coverage, span colours from a
//! generator, clipped blending through the base renderer.

use crate::pixfmt_rgba::PixelFormat;
use crate::rasterizer_scanline_aa::{RasterizerScanlineAa, Scanline};
use crate::renderer_base::RendererBase;
use crate::scanline_u::ScanlineU8;

// ============================================================================
// SpanGenerator trait
// ============================================================================

/// Produces the colours of horizontal runs of output pixels.
pub trait SpanGenerator {
    type Color;

    /// Called once before the first span.
    fn prepare(&mut self) {}

    /// Fill `span` with the colours of the pixels starting at (x, y).
    fn generate(&mut self, span: &mut [Self::Color], x: i32, y: i32);
}

/// Render every scanline of `ras`, colouring covered pixels with `span_gen`.
pub fn render_scanlines_aa<PF, SG>(
    ras: &mut RasterizerScanlineAa,
    sl: &mut ScanlineU8,
    ren: &mut RendererBase<PF>,
    span_gen: &mut SG,
) where
    PF: PixelFormat<ColorType = SG::Color>,
    SG: SpanGenerator,
    SG::Color: Default + Clone,
{
    if !ras.rewind_scanlines() {
        return;
    }

    sl.reset(ras.min_x(), ras.max_x());
    span_gen.prepare();
    let mut colors: Vec<SG::Color> = Vec::new();
    while ras.sweep_scanline(sl) {
        let y = sl.y();
        for span in sl.spans() {
            let len = span.len as usize;
            if colors.len() < len {
                colors.resize(len, SG::Color::default());
            }
            let colors = &mut colors[..len];
            span_gen.generate(colors, span.x, y);
            ren.blend_color_hspan(span.x, y, colors, sl.span_covers(span));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;
    use crate::pixfmt_rgba::PixfmtRgba32;
    use crate::rendering_buffer::RenderingBuffer;

    /// Encodes the pixel position into the colour.
    struct Positions {
        prepared: bool,
    }

    impl SpanGenerator for Positions {
        type Color = Rgba8;

        fn prepare(&mut self) {
            self.prepared = true;
        }

        fn generate(&mut self, span: &mut [Rgba8], x: i32, y: i32) {
            for (i, c) in span.iter_mut().enumerate() {
                *c = Rgba8::new((x + i as i32) as u8, y as u8, 0, 255);
            }
        }
    }

    #[test]
    fn test_generator_colours_covered_pixels() {
        let mut rb = RenderingBuffer::new(6, 4).unwrap();
        let mut ren = RendererBase::new(PixfmtRgba32::new(&mut rb));
        let mut ras = RasterizerScanlineAa::new();
        ras.add_polygon(&[(1.0, 1.0), (4.0, 1.0), (4.0, 3.0), (1.0, 3.0)]);
        let mut sg = Positions { prepared: false };
        render_scanlines_aa(&mut ras, &mut ScanlineU8::new(), &mut ren, &mut sg);

        assert!(sg.prepared);
        assert_eq!(ren.pixel(2, 2), Some(Rgba8::new(2, 2, 0, 255)));
        assert_eq!(ren.pixel(0, 0), Some(Rgba8::default()));
        assert_eq!(ren.pixel(4, 1), Some(Rgba8::default()));
    }

    #[test]
    fn test_polygon_outside_buffer_draws_nothing() {
        let mut rb = RenderingBuffer::new(3, 3).unwrap();
        let mut ren = RendererBase::new(PixfmtRgba32::new(&mut rb));
        let mut ras = RasterizerScanlineAa::new();
        ras.add_polygon(&[(10.0, 10.0), (12.0, 10.0), (12.0, 12.0)]);
        let mut sg = Positions { prepared: false };
        render_scanlines_aa(&mut ras, &mut ScanlineU8::new(), &mut ren, &mut sg);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(ren.pixel(x, y), Some(Rgba8::default()));
            }
        }
    }
}
