//! Pseudo-colour rasterization of non-uniform grids.
//!
//! Each output pixel takes the colour of the grid cell whose centre is
//! nearest along each axis. The lookup is separable: one table maps output
//! columns to grid columns, one maps output rows to grid rows, and runs of
//! output rows that land on the same grid row are copied instead of
//! gathered again.

use crate::array_view::ArrayView;
use crate::error::{ImageError, Result};
use crate::image::Image;
use crate::rendering_buffer::{alloc_pixels, RenderingBuffer, BPP};

/// Data extent covered by the output raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Bounds {
    pub fn new(x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

impl TryFrom<&[f32]> for Bounds {
    type Error = ImageError;

    /// `[x_min, x_max, y_min, y_max]`.
    fn try_from(v: &[f32]) -> Result<Self> {
        match *v {
            [x_min, x_max, y_min, y_max] => Ok(Self::new(x_min, x_max, y_min, y_max)),
            _ => Err(ImageError::InvalidArgument(format!(
                "incorrect number of bounds ({} given, 4 expected)",
                v.len()
            ))),
        }
    }
}

/// Output-to-grid lookup tables.
///
/// Entry `i` is how many grid cells the cursor advanced between output
/// pixel `i - 1` and output pixel `i`; the first entry is relative to grid
/// cell 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridMapping {
    pub rowstarts: Vec<u32>,
    pub colstarts: Vec<u32>,
}

/// Advance a cursor over `centers` for `count` output pixels spaced `step`
/// apart starting at `min`.
fn axis_deltas(centers: &[f32], count: u32, min: f32, step: f32) -> Vec<u32> {
    let mut deltas = Vec::with_capacity(count as usize);
    let mut j = 0usize;
    let mut j_last = 0usize;
    for i in 0..count {
        let o = min + (i as f32 + 0.5) * step;
        while j + 1 < centers.len() && 0.5 * (centers[j] + centers[j + 1]) < o {
            j += 1;
        }
        deltas.push((j - j_last) as u32);
        j_last = j;
    }
    deltas
}

/// Lookup tables for mapping grid centres `x`, `y` onto a `rows x cols`
/// raster spanning `bounds`.
pub fn pcolor_mapping(x: &[f32], y: &[f32], rows: u32, cols: u32, bounds: &Bounds) -> GridMapping {
    let dx = (bounds.x_max - bounds.x_min) / cols as f32;
    let dy = (bounds.y_max - bounds.y_min) / rows as f32;
    GridMapping {
        rowstarts: axis_deltas(y, rows, bounds.y_min, dy),
        colstarts: axis_deltas(x, cols, bounds.x_min, dx),
    }
}

fn axis_centers(view: &ArrayView<'_, f32>, name: &'static str) -> Result<Vec<f32>> {
    if view.ndim() != 1 || view.is_empty() {
        return Err(ImageError::InvalidArgument(format!(
            "{name} is of incorrect shape {:?} (wanted non-empty 1D)",
            view.shape()
        )));
    }
    Ok((0..view.dim(0)).map(|i| view.at(&[i])).collect())
}

/// Pseudo-colour image of the `ny x nx x 4` RGBA `data` with cell centres
/// `x` (length nx) and `y` (length ny), sampled onto a `rows x cols` output
/// raster spanning `bounds`.
pub fn pcolor(
    x: &ArrayView<'_, f32>,
    y: &ArrayView<'_, f32>,
    data: &ArrayView<'_, u8>,
    rows: u32,
    cols: u32,
    bounds: &Bounds,
) -> Result<Image<'static>> {
    log::trace!("pcolor {rows}x{cols} {bounds:?}");
    if rows == 0 || cols == 0 {
        return Err(ImageError::InvalidArgument("cannot scale to zero size".into()));
    }
    let xs = axis_centers(x, "x")?;
    let ys = axis_centers(y, "y")?;
    data.expect_rank(3, "pcolor data")?;
    if data.dim(2) != 4 {
        return Err(ImageError::InvalidArgument("data must be in RGBA format".into()));
    }
    let (nx, ny) = (xs.len(), ys.len());
    if nx != data.dim(1) || ny != data.dim(0) {
        return Err(ImageError::InvalidArgument(format!(
            "data and axis dimensions do not match: data {:?}, nx {nx}, ny {ny}",
            data.shape()
        )));
    }

    let mut buf = alloc_pixels(cols, rows)?;
    let mapping = pcolor_mapping(&xs, &ys, rows, cols, bounds);
    let row_len = cols as usize * BPP;

    let mut src_row = 0usize;
    for (i, &rowstart) in mapping.rowstarts.iter().enumerate() {
        let (done, rest) = buf.split_at_mut(i * row_len);
        let dst = &mut rest[..row_len];
        if i > 0 && rowstart == 0 {
            dst.copy_from_slice(&done[(i - 1) * row_len..]);
            continue;
        }
        src_row += rowstart as usize;
        let mut src_col = 0usize;
        for (px, &colstart) in dst.chunks_exact_mut(BPP).zip(&mapping.colstarts) {
            src_col += colstart as usize;
            for (c, v) in px.iter_mut().enumerate() {
                *v = data.at(&[src_row, src_col, c]);
            }
        }
    }

    log::debug!("pcolor {ny}x{nx} grid -> {rows}x{cols}");
    let mut image = Image::new();
    image.set_output(RenderingBuffer::from_vec(buf, cols, rows)?);
    Ok(image)
}
