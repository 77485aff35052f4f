//! Rendering buffer: an RGBA raster with row-oriented access.
//!
//! A raster either owns its bytes or borrows them from the caller; the
//! variant is explicit in [`PixelStorage`]. Rows are addressed through a
//! signed stride, so a negative stride reads the same bytes bottom-up
//! without copying.

use std::borrow::Cow;

use crate::color::Rgba8;
use crate::error::{ImageError, Result};

/// Bytes per pixel of every raster (R, G, B, A).
pub const BPP: usize = 4;

/// Byte size of a `width x height` RGBA raster.
pub fn raster_bytes(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(BPP))
        .ok_or_else(|| {
            ImageError::InvalidArgument(format!("raster of {width}x{height} is too large"))
        })
}

/// Allocate `width * height` zeroed RGBA pixels, reporting failure instead of
/// aborting.
pub fn alloc_pixels(width: u32, height: u32) -> Result<Vec<u8>> {
    let bytes = raster_bytes(width, height)?;
    let mut data = Vec::new();
    data.try_reserve_exact(bytes)
        .map_err(|_| ImageError::AllocationFailure { bytes })?;
    data.resize(bytes, 0);
    Ok(data)
}

/// Who owns the bytes behind a raster.
#[derive(Debug)]
pub enum PixelStorage<'a> {
    /// Allocated by the engine and freed with the raster.
    Owned(Vec<u8>),
    /// Supplied by the caller; never freed here.
    Borrowed(&'a mut [u8]),
}

impl PixelStorage<'_> {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            PixelStorage::Owned(v) => v,
            PixelStorage::Borrowed(s) => s,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            PixelStorage::Owned(v) => v,
            PixelStorage::Borrowed(s) => s,
        }
    }
}

// ============================================================================
// RenderingBuffer
// ============================================================================

/// RGBA raster of `width x height` pixels.
#[derive(Debug)]
pub struct RenderingBuffer<'a> {
    storage: PixelStorage<'a>,
    width: u32,
    height: u32,
    stride: i32,
}

impl RenderingBuffer<'static> {
    /// Allocate an owned raster, zero-filled.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let stride = row_stride(width)?;
        Ok(Self {
            storage: PixelStorage::Owned(alloc_pixels(width, height)?),
            width,
            height,
            stride,
        })
    }

    /// Take ownership of `data`, which must hold exactly `width * height`
    /// RGBA pixels.
    pub fn from_vec(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let stride = row_stride(width)?;
        let expected = raster_bytes(width, height)?;
        if data.len() != expected {
            return Err(ImageError::InvalidArgument(format!(
                "buffer length {} does not match {width}x{height} RGBA ({expected} bytes)",
                data.len()
            )));
        }
        Ok(Self {
            storage: PixelStorage::Owned(data),
            width,
            height,
            stride,
        })
    }
}

impl<'a> RenderingBuffer<'a> {
    /// Wrap caller memory holding at least `width * height` RGBA pixels.
    pub fn attach(buf: &'a mut [u8], width: u32, height: u32) -> Result<Self> {
        let stride = row_stride(width)?;
        let needed = raster_bytes(width, height)?;
        if buf.len() < needed {
            return Err(ImageError::InvalidArgument(format!(
                "buffer of {} bytes is too small for {width}x{height} RGBA ({needed} bytes)",
                buf.len()
            )));
        }
        Ok(Self {
            storage: PixelStorage::Borrowed(buf),
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Signed row stride in bytes; negative when flipped.
    pub fn stride(&self) -> i32 {
        self.stride
    }

    pub fn stride_abs(&self) -> usize {
        self.stride.unsigned_abs() as usize
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.storage, PixelStorage::Owned(_))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn storage(&self) -> &PixelStorage<'a> {
        &self.storage
    }

    /// Reverse the vertical row order by negating the stride.
    pub fn flip_vertical(&mut self) {
        self.stride = -self.stride;
    }

    /// Raw bytes in storage order, ignoring the stride sign.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage.as_slice()[..self.height as usize * self.stride_abs()]
    }

    #[inline]
    fn row_start(&self, y: u32) -> usize {
        let physical = if self.stride < 0 {
            self.height - 1 - y
        } else {
            y
        };
        physical as usize * self.stride_abs()
    }

    /// Pixel bytes of logical row `y`.
    #[inline]
    pub fn row_slice(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {} out of bounds (height={})", y, self.height);
        let start = self.row_start(y);
        &self.storage.as_slice()[start..start + self.width as usize * BPP]
    }

    #[inline]
    pub fn row_slice_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(y < self.height, "row {} out of bounds (height={})", y, self.height);
        let start = self.row_start(y);
        let len = self.width as usize * BPP;
        &mut self.storage.as_mut_slice()[start..start + len]
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        let off = x as usize * BPP;
        Rgba8::from_slice(&self.row_slice(y)[off..off + BPP])
    }

    /// Set every pixel to `c`.
    pub fn fill(&mut self, c: Rgba8) {
        let px = c.to_array();
        for y in 0..self.height {
            for dst in self.row_slice_mut(y).chunks_exact_mut(BPP) {
                dst.copy_from_slice(&px);
            }
        }
    }

    /// Copy logical rows of `src` into the same logical rows here, over the
    /// common width and height.
    pub fn copy_from(&mut self, src: &RenderingBuffer<'_>) {
        let h = self.height.min(src.height);
        let len = self.width.min(src.width) as usize * BPP;
        for y in 0..h {
            self.row_slice_mut(y)[..len].copy_from_slice(&src.row_slice(y)[..len]);
        }
    }

    /// Bytes in logical top-down row order; a copy is made only when the
    /// raster is flipped.
    pub fn to_top_down_bytes(&self) -> Cow<'_, [u8]> {
        if self.stride >= 0 {
            return Cow::Borrowed(self.as_bytes());
        }
        let mut out = Vec::with_capacity(self.height as usize * self.width as usize * BPP);
        for y in 0..self.height {
            out.extend_from_slice(self.row_slice(y));
        }
        Cow::Owned(out)
    }
}

fn row_stride(width: u32) -> Result<i32> {
    (width as usize)
        .checked_mul(BPP)
        .and_then(|s| i32::try_from(s).ok())
        .ok_or_else(|| ImageError::InvalidArgument(format!("image width {width} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: u32, height: u32) -> RenderingBuffer<'static> {
        let data = (0..width * height * 4).map(|v| v as u8).collect();
        RenderingBuffer::from_vec(data, width, height).unwrap()
    }

    #[test]
    fn test_new_is_zeroed_and_owned() {
        let rb = RenderingBuffer::new(3, 2).unwrap();
        assert!(rb.is_owned());
        assert_eq!(rb.stride(), 12);
        assert_eq!(rb.as_bytes().len(), 24);
        assert!(rb.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let err = RenderingBuffer::from_vec(vec![0; 7], 1, 2).unwrap_err();
        assert!(matches!(err, ImageError::InvalidArgument(_)));
    }

    #[test]
    fn test_attach_borrows() {
        let mut mem = vec![9u8; 32];
        {
            let mut rb = RenderingBuffer::attach(&mut mem, 2, 2).unwrap();
            assert!(!rb.is_owned());
            rb.fill(Rgba8::new(1, 2, 3, 4));
        }
        assert_eq!(&mem[..4], &[1, 2, 3, 4]);
        // bytes past the raster are untouched
        assert_eq!(&mem[16..], &[9u8; 16]);

        let mut short = vec![0u8; 15];
        assert!(RenderingBuffer::attach(&mut short, 2, 2).is_err());
    }

    #[test]
    fn test_flip_reverses_rows_and_is_idempotent() {
        let mut rb = numbered(1, 3);
        let top = rb.row_slice(0).to_vec();
        let bottom = rb.row_slice(2).to_vec();

        rb.flip_vertical();
        assert_eq!(rb.stride(), -4);
        assert_eq!(rb.row_slice(0), &bottom[..]);
        assert_eq!(rb.row_slice(2), &top[..]);

        rb.flip_vertical();
        assert_eq!(rb.stride(), 4);
        assert_eq!(rb.row_slice(0), &top[..]);
    }

    #[test]
    fn test_top_down_bytes_copies_only_when_flipped() {
        let mut rb = numbered(2, 2);
        assert!(matches!(rb.to_top_down_bytes(), Cow::Borrowed(_)));

        rb.flip_vertical();
        let bytes = rb.to_top_down_bytes();
        assert!(matches!(bytes, Cow::Owned(_)));
        assert_eq!(&bytes[..8], &rb.as_bytes()[8..16]);
        assert_eq!(&bytes[8..], &rb.as_bytes()[..8]);
    }

    #[test]
    fn test_pixel_and_copy_from() {
        let src = numbered(2, 2);
        assert_eq!(src.pixel(1, 1), Rgba8::new(12, 13, 14, 15));

        let mut dst = RenderingBuffer::new(3, 1).unwrap();
        dst.copy_from(&src);
        assert_eq!(dst.pixel(0, 0), src.pixel(0, 0));
        assert_eq!(dst.pixel(1, 0), src.pixel(1, 0));
        assert_eq!(dst.pixel(2, 0), Rgba8::default());
    }

    #[test]
    fn test_zero_sized_raster() {
        let rb = RenderingBuffer::new(0, 5).unwrap();
        assert!(rb.is_empty());
        assert!(rb.as_bytes().is_empty());
        assert!(rb.to_top_down_bytes().is_empty());
    }

    #[test]
    fn test_alloc_overflow_is_reported() {
        let err = alloc_pixels(u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(err, ImageError::InvalidArgument(_)));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_alloc_past_isize_max_fails() {
        // size fits in usize but no allocator can serve it
        let err = alloc_pixels(u32::MAX, 1 << 30).unwrap_err();
        assert!(matches!(err, ImageError::AllocationFailure { .. }));
    }

    #[test]
    fn test_overflowing_dimensions_are_rejected() {
        assert!(matches!(
            RenderingBuffer::from_vec(Vec::new(), 1 << 31, 1 << 31),
            Err(ImageError::InvalidArgument(_))
        ));
        let mut mem = [0u8; 4];
        assert!(matches!(
            RenderingBuffer::attach(&mut mem, u32::MAX, u32::MAX),
            Err(ImageError::InvalidArgument(_))
        ));
    }
}
