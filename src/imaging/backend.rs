//! Raster backend trait and shared types.
//!
//! The [`RasterBackend`] trait is the only place pixels are touched. The
//! session decides *which* rectangles to copy; the backend decodes, allocates,
//! resamples, rotates and encodes.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust, built on the
//! `image` crate.

use super::params::{Color, OutputFormat, Quality, Rect, SourceRect};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<Dimensions> for (u32, u32) {
    fn from(d: Dimensions) -> Self {
        (d.width, d.height)
    }
}

/// Trait for raster backends.
///
/// `Handle` is the backend's decoded image. Sessions own exactly one working
/// handle and keep a clone of the first decode around for reloads, so handles
/// must be `Clone`.
pub trait RasterBackend {
    type Handle: Clone;

    /// Sniff the MIME type of a file on disk (e.g. `"image/jpeg"`).
    fn detect_mime(&self, path: &Path) -> Result<String, BackendError>;

    /// Decode a file on disk.
    fn decode_file(&self, path: &Path) -> Result<Self::Handle, BackendError>;

    /// Decode an in-memory encoded image. Returns the handle and its MIME type.
    fn decode_bytes(&self, data: &[u8]) -> Result<(Self::Handle, String), BackendError>;

    /// Dimensions of a handle.
    fn dimensions(&self, handle: &Self::Handle) -> Dimensions;

    /// Allocate a `width × height` canvas filled with `background`.
    fn allocate_canvas(
        &self,
        width: u32,
        height: u32,
        background: Color,
    ) -> Result<Self::Handle, BackendError>;

    /// Resample `src_rect` of `src` into `dst_rect` of `dst`.
    ///
    /// A negative source width or height mirrors the copied region along that
    /// axis (see [`SourceRect`]).
    fn resample_copy(
        &self,
        dst: &mut Self::Handle,
        src: &Self::Handle,
        dst_rect: Rect,
        src_rect: SourceRect,
    ) -> Result<(), BackendError>;

    /// Rotate counter-clockwise by `degrees`, filling uncovered area with `background`.
    fn rotate(
        &self,
        handle: &Self::Handle,
        degrees: f64,
        background: Color,
    ) -> Result<Self::Handle, BackendError>;

    /// Encode a handle into the given format.
    fn encode(
        &self,
        handle: &Self::Handle,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
