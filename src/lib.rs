//! # amf-rs
//!
//! A pure Rust implementation of the Adaptive Manifold Filter (AMF), an
//! edge-aware image smoother guided by a (possibly distinct) joint image.
//!
//! AMF approximates a high-dimensional bilateral/range filter by projecting
//! samples onto a small set of low-dimensional "manifolds" built through
//! recursive PCA-driven clustering, filtering each manifold with a cheap
//! Domain Transform recursive filter, then slicing the result back to image
//! space.
//!
//! ## Features
//!
//! - **Core**: Basic data structures (Mat, Point, Size, Rect, Scalar)
//! - **Image I/O**: Reading and writing images in various formats
//! - **Image Processing**: Color conversion, filtering, geometric transformations
//! - **Photo**: Edge-aware filters, including the Adaptive Manifold Filter
//!
//! ## Example
//!
//! ```rust,no_run
//! use amf_rs::prelude::*;
//! use amf_rs::imgcodecs::{imread, imwrite};
//! use amf_rs::photo::am_filter;
//!
//! # fn main() -> amf_rs::error::Result<()> {
//! let src = imread("input.jpg")?;
//! let mut dst = Mat::new(1, 1, 1, MatDepth::U8)?;
//!
//! // Smooth src while preserving edges, using src as its own guide.
//! am_filter(&src, &src, &mut dst, 16.0, 0.2, false)?;
//!
//! imwrite("output.jpg", &dst)?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod imgcodecs;
pub mod imgproc;
pub mod photo;

pub mod prelude {
    //! Convenience module that re-exports commonly used items
    pub use crate::core::{Mat, MatDepth, Point, Point2f, Size, Rect, Scalar};
    pub use crate::core::types::{Point3f, ColorConversionCode, InterpolationFlag, ThresholdType};
    pub use crate::error::{Error, Result};
    pub use crate::photo::{AdaptiveManifoldFilter, am_filter, create_amf};
}
