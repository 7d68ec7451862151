//! # rasterfit
//!
//! Normalize uploaded or generated images onto fixed-size canvases.
//!
//! A [`ImageSession`] loads one JPEG, PNG or GIF (from disk, from memory, or
//! as an already decoded handle), applies a chain of geometric transforms and
//! exports the result as a file, a byte buffer or an HTTP-like response.
//!
//! # Architecture: Plan, Then Copy
//!
//! Every transform is split in two:
//!
//! ```text
//! 1. Plan    (width, height) + request  →  CopyPlan   (pure arithmetic)
//! 2. Copy    CopyPlan + working handle  →  new handle (RasterBackend)
//! ```
//!
//! The plan says which canvas to allocate, which source rectangle to read and
//! where to draw it. Planning is pure, so all of the ratio logic is unit
//! tested without decoding a single pixel; the backend only ever executes
//! rectangles it is handed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Load/reload, transform chaining, save, byte and response output |
//! | [`imaging`] | Geometry planning, parameter types, backend trait and the pure Rust backend |
//! | [`config`] | Optional TOML config: background color, save quality, resample filter |
//!
//! # Resize Modes
//!
//! | Mode | Canvas | Source drawn |
//! |------|--------|--------------|
//! | `crop` | exactly the target | largest aligned window with the target's ratio |
//! | `fit` | exactly the target | whole image, letterboxed on the background color |
//! | `smart` | ratio-preserving size matching the dominant target axis | whole image |
//!
//! [`ImageSession::stretch`] fills the target ignoring ratio.
//!
//! # Design Decisions
//!
//! ## Exact Ratio Comparison
//!
//! Whether a source is "wider" or "taller" than the target decides which axis
//! gets trimmed or letterboxed. Ratios are compared by cross-multiplying the
//! integer dimensions, so a 800x600 source against a 400x300 target is equal
//! and never wobbles into a one-pixel crop.
//!
//! ## Flips Are Copies
//!
//! A flip is a resample copy whose source rectangle has negative extent along
//! the mirrored axis ([`imaging::SourceRect`]). Same-size copies skip the
//! resampling filter, so flipping twice gives back the exact pixels.
//!
//! ## No Cached Geometry
//!
//! Width, height and ratio are derived from the working handle every time
//! ([`imaging::compute_geometry`]), so they can never go stale after a
//! transform.

pub mod config;
pub mod imaging;
pub mod session;

pub use config::{ConfigError, SessionConfig, load_config};
pub use imaging::{
    Axis, Color, Direction, Geometry, Mime, Mode, OutputFormat, Quality, ResizeOptions, XAlign,
    YAlign,
};
pub use session::{ImageError, ImageResponse, ImageSession, Source, SourceKind};
