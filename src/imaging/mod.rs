//! Image geometry and pixel operations.
//!
//! | Operation | Where |
//! |---|---|
//! | **Crop / fit / smart / stretch planning** | [`calculations`] |
//! | **Flip, sample and rotation math** | [`calculations`] |
//! | **Decode, canvas, resample copy, rotate, encode** | [`RustBackend`] (`image` + `imageproc`) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions turning a request into a copy plan (unit testable)
//! - **Parameters**: Data structures describing requests, rectangles and formats
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, RasterBackend};
pub use calculations::{CopyPlan, Geometry, compute_geometry};
pub use params::{
    Axis, Color, Direction, Mime, Mode, OutputFormat, Quality, Rect, ResizeOptions, SourceRect,
    XAlign, YAlign,
};
pub use rust_backend::RustBackend;
