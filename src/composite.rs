//! Alpha compositing of resampled images onto one canvas.

use crate::color::Rgba8;
use crate::error::{ImageError, Result};
use crate::image::Image;
use crate::pixfmt_rgba::PixfmtRgba32;
use crate::renderer_base::RendererBase;
use crate::rendering_buffer::RenderingBuffer;

/// Blend the outputs of `images` onto a new `rows x cols` canvas.
///
/// Each entry is an image and the signed offset of its top-left output
/// pixel. The canvas starts as the first image's background; entries are
/// painted in order with their own alpha, so later ones land on top. Pixels
/// that fall outside the canvas are dropped.
pub fn from_images(rows: u32, cols: u32, images: &[(&Image<'_>, i32, i32)]) -> Result<Image<'static>> {
    log::trace!("from_images {rows}x{cols}, {} images", images.len());
    let Some((first, _, _)) = images.first() else {
        return Err(ImageError::InvalidArgument("empty list of images".into()));
    };

    let mut canvas = RenderingBuffer::new(cols, rows)?;
    {
        let mut ren = RendererBase::new(PixfmtRgba32::new(&mut canvas));
        ren.clear(&Rgba8::from_rgba(&first.background()));

        for &(image, ox, oy) in images {
            let src = image
                .output()
                .ok_or(ImageError::InvalidState("composited image has no output buffer"))?;
            for y in 0..src.height() {
                let dy = y as i64 + oy as i64;
                if dy < 0 || dy >= rows as i64 {
                    continue;
                }
                for x in 0..src.width() {
                    let dx = x as i64 + ox as i64;
                    if dx < 0 || dx >= cols as i64 {
                        continue;
                    }
                    ren.blend_pixel(dx as i32, dy as i32, &src.pixel(x, y), 255);
                }
            }
        }
    }

    log::debug!("composited {} images onto {rows}x{cols}", images.len());
    let mut result = Image::new();
    result.set_output(canvas);
    Ok(result)
}
