//! Borrowed n-dimensional array view.
//!
//! A described buffer: flat element data plus a shape and per-axis strides
//! counted in elements. Ingestion and pcolor read their inputs through this
//! instead of assuming a particular host array layout.

use crate::error::{ImageError, Result};

/// Row-major strides for `shape`.
pub fn strides_from_shape(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut stride: usize = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride = stride.saturating_mul(shape[i]);
    }
    strides
}

#[derive(Debug, Clone)]
pub struct ArrayView<'a, T> {
    data: &'a [T],
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl<'a, T: Copy> ArrayView<'a, T> {
    /// View `data` as a contiguous row-major array of `shape`.
    pub fn new(data: &'a [T], shape: &[usize]) -> Result<Self> {
        let strides = strides_from_shape(shape);
        Self::with_strides(data, shape, &strides)
    }

    /// View `data` with explicit element strides.
    ///
    /// Fails when the ranks differ or the last addressed element lies past
    /// the end of `data`.
    pub fn with_strides(data: &'a [T], shape: &[usize], strides: &[usize]) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(ImageError::InvalidArgument(format!(
                "shape has {} axes but strides have {}",
                shape.len(),
                strides.len()
            )));
        }
        if shape.iter().all(|&n| n > 0) {
            let last = shape
                .iter()
                .zip(strides)
                .try_fold(0usize, |acc, (&n, &s)| (n - 1).checked_mul(s)?.checked_add(acc));
            if last.map_or(true, |last| last >= data.len()) {
                return Err(ImageError::InvalidArgument(format!(
                    "array of shape {shape:?} does not fit in {} elements",
                    data.len()
                )));
            }
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
            strides: strides.to_vec(),
        })
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Extent of axis `axis`, 0 past the last axis.
    pub fn dim(&self, axis: usize) -> usize {
        self.shape.get(axis).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|&n| n == 0)
    }

    /// Element at `index`, or `None` when the index is out of bounds or has
    /// the wrong rank.
    pub fn get(&self, index: &[usize]) -> Option<T> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for ((&i, &n), &s) in index.iter().zip(&self.shape).zip(&self.strides) {
            if i >= n {
                return None;
            }
            offset += i * s;
        }
        self.data.get(offset).copied()
    }

    /// Element at `index` without rank or bounds validation beyond the
    /// slice bounds check.
    #[inline]
    pub(crate) fn at(&self, index: &[usize]) -> T {
        let offset: usize = index.iter().zip(&self.strides).map(|(&i, &s)| i * s).sum();
        self.data[offset]
    }

    /// Fail unless the view has exactly `rank` axes.
    pub(crate) fn expect_rank(&self, rank: usize, what: &str) -> Result<()> {
        if self.ndim() != rank {
            return Err(ImageError::InvalidArgument(format!(
                "{what} must be rank {rank}, got shape {:?}",
                self.shape
            )));
        }
        Ok(())
    }
}
