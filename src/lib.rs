//! # agg-image
//!
//! Image resampling and compositing on an Anti-Grain Geometry style
//! scanline pipeline.
//!
//! - Affine resampling of RGBA rasters with nearest-neighbour or one of 16
//!   separable filter kernels
//! - Anti-aliased footprint edges with subpixel accuracy
//! - Alpha compositing of several rasters onto one canvas
//! - Nearest-centre pseudo-colour mapping of non-uniform grids
//!
//! ## Architecture
//!
//! A resampling pass runs the classic AGG pipeline:
//!
//! 1. **Footprint**: the input rectangle, transformed to output space
//! 2. **Scanline Rasterizer**: converts the footprint to anti-aliased scanlines
//! 3. **Span Interpolator**: maps output pixel centres back into the input
//! 4. **Span Generator**: samples input pixels (nearest or filter kernel)
//! 5. **Renderer**: blends the sampled spans into the output buffer
//!
//! File formats stay outside the crate: [`codec`] defines the encoder and
//! decoder traits callers plug in.

// Foundation types & math
pub mod basics;
pub mod color;
pub mod error;
pub mod math;
pub mod trans_affine;

// Memory
pub mod array_view;
pub mod edge_pad;
pub mod rendering_buffer;

// Scanline rasterizer
pub mod rasterizer_cells_aa;
pub mod rasterizer_scanline_aa;
pub mod rasterizer_sl_clip;
pub mod scanline_u;

// Pixel formats & renderers
pub mod pixfmt_rgba;
pub mod renderer_base;
pub mod renderer_scanline;

// Image sampling
pub mod image_filters;
pub mod span_image_filter_rgba;
pub mod span_interpolator_linear;

// Engine
pub mod codec;
pub mod composite;
pub mod image;
pub mod pcolor;

pub use array_view::ArrayView;
pub use codec::{read_png, DecodedImage, FloatRgba, PixelLayout, RgbaDecoder, RgbaEncoder};
pub use color::{Rgba, Rgba8};
pub use composite::from_images;
pub use error::{ImageError, Result};
pub use image::{Aspect, Image, ResizeOptions, Target};
pub use image_filters::Interpolation;
pub use pcolor::{pcolor, pcolor_mapping, Bounds, GridMapping};
pub use rendering_buffer::RenderingBuffer;
pub use trans_affine::TransAffine;
