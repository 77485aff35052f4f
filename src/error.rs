//! Error type shared by every fallible image operation.

use std::path::PathBuf;

/// An error type for image resampling, compositing and ingestion.
#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    /// The operation needs a raster that has not been loaded yet.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// A raster or scratch buffer could not be allocated.
    #[error("Could not allocate {bytes} bytes of image memory")]
    AllocationFailure { bytes: usize },

    /// Malformed input: bad shape, rank, channel count or length.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A codec failed to read or write the given file.
    #[error("Could not access file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The affine matrix is singular and cannot be inverted.
    #[error("Degenerate transform (determinant {determinant})")]
    DegenerateTransform { determinant: f64 },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ImageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path() {
        let err = ImageError::Io {
            path: PathBuf::from("/tmp/out.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/out.png"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_invalid_state_message() {
        let err = ImageError::InvalidState("no input image");
        assert_eq!(err.to_string(), "Invalid state: no input image");
    }
}
