//! One-pixel replicated border around a source raster.
//!
//! Kernel samplers read up to one pixel past the source edge; giving them a
//! border that repeats the outermost rows and columns keeps edge pixels from
//! fading toward the background.

use crate::basics::RectI;
use crate::error::Result;
use crate::pixfmt_rgba::PixfmtRgba32;
use crate::renderer_base::RendererBase;
use crate::rendering_buffer::RenderingBuffer;

/// Copy `src` into a new `(width + 2) x (height + 2)` raster at offset
/// (1, 1), then replicate its edge rows, edge columns and corner pixels into
/// the border.
///
/// An empty source yields an all-zero border-only raster.
pub fn pad_edges(src: &RenderingBuffer<'_>) -> Result<RenderingBuffer<'static>> {
    let mut padded = RenderingBuffer::new(src.width() + 2, src.height() + 2)?;
    if src.is_empty() {
        return Ok(padded);
    }

    let cols = src.width() as i32;
    let rows = src.height() as i32;
    let mut ren = RendererBase::new(PixfmtRgba32::new(&mut padded));

    ren.copy_from(src, None, 1, 1);

    ren.copy_from(src, Some(RectI::new(0, 0, cols - 1, 0)), 1, 0);
    ren.copy_from(src, Some(RectI::new(0, rows - 1, cols - 1, rows - 1)), 1, 2);
    ren.copy_from(src, Some(RectI::new(0, 0, 0, rows - 1)), 0, 1);
    ren.copy_from(src, Some(RectI::new(cols - 1, 0, cols - 1, rows - 1)), 2, 1);

    ren.copy_pixel(0, 0, &src.pixel(0, 0));
    ren.copy_pixel(cols + 1, 0, &src.pixel(cols as u32 - 1, 0));
    ren.copy_pixel(0, rows + 1, &src.pixel(0, rows as u32 - 1));
    ren.copy_pixel(
        cols + 1,
        rows + 1,
        &src.pixel(cols as u32 - 1, rows as u32 - 1),
    );

    Ok(padded)
}
