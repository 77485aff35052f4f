//! File codec boundary.
//!
//! The engine never parses or writes an image file format itself. Callers
//! plug in an encoder and a decoder; the engine hands them raw 8-bit pixel
//! buffers and converts decoded pixels into the float layout ingestion
//! expects.

use std::path::Path;

use crate::error::{ImageError, Result};

/// Channel layout of a decoded 8-bit buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Rgba,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// Top-down 8-bit pixels as produced by a decoder.
///
/// Decoders expand palette and grayscale sources to RGB and strip 16-bit
/// samples to 8 bits before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

/// Writes a top-down RGBA buffer to a file.
pub trait RgbaEncoder {
    fn encode_rgba(&mut self, path: &Path, width: u32, height: u32, rgba: &[u8])
        -> std::io::Result<()>;
}

/// Reads a file into 8-bit RGB or RGBA pixels.
pub trait RgbaDecoder {
    fn decode(&mut self, path: &Path) -> std::io::Result<DecodedImage>;
}

/// A decoded image as `rows x cols x 4` floats in [0, 1], row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatRgba {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl FloatRgba {
    pub fn shape(&self) -> [usize; 3] {
        [self.rows, self.cols, 4]
    }
}

/// Decode `path` and convert it to float RGBA.
///
/// RGB sources get alpha 1.0.
pub fn read_png<D: RgbaDecoder + ?Sized>(path: impl AsRef<Path>, decoder: &mut D) -> Result<FloatRgba> {
    let path = path.as_ref();
    log::trace!("read_png {}", path.display());

    let decoded = decoder.decode(path).map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rows = decoded.height as usize;
    let cols = decoded.width as usize;
    let channels = decoded.layout.channels();
    let expected = rows.checked_mul(cols).and_then(|n| n.checked_mul(channels));
    if expected != Some(decoded.data.len()) {
        return Err(ImageError::InvalidArgument(format!(
            "decoded {}: {} bytes do not hold {cols}x{rows} {:?}",
            path.display(),
            decoded.data.len(),
            decoded.layout
        )));
    }

    let len = decoded.data.len() / channels * 4;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| ImageError::AllocationFailure {
            bytes: len.saturating_mul(std::mem::size_of::<f64>()),
        })?;
    for px in decoded.data.chunks_exact(channels) {
        data.extend(px[..3].iter().map(|&v| v as f64 / 255.0));
        data.push(match decoded.layout {
            PixelLayout::Rgb => 1.0,
            PixelLayout::Rgba => px[3] as f64 / 255.0,
        });
    }

    log::debug!("read_png {}: {rows}x{cols} {:?}", path.display(), decoded.layout);
    Ok(FloatRgba { rows, cols, data })
}
