//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the [`session`](crate::session) (which decides which
//! transform runs), the [`calculations`](super::calculations) (which turn a
//! request into rectangles) and the [`backend`](super::backend) (which does the
//! actual pixel work).
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Color`] — Flat RGB fill used for every new canvas. Defaults to white.
//! - [`ResizeOptions`] — Mode, alignment and optional sample box for [`resize`](crate::ImageSession::resize).
//! - [`Axis`], [`Direction`], [`OutputFormat`], [`Mime`] — small closed vocabularies,
//!   each parsed leniently from strings where the caller passes free text.
//! - [`Rect`] / [`SourceRect`] — destination and source rectangles for a resample copy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    /// Quality used for in-memory and streamed output.
    pub const MAX: Quality = Quality(100);

    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Background fill color for newly allocated canvases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// How [`resize`](crate::ImageSession::resize) maps the source onto the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Mode {
    /// Exact target canvas, source cropped along the non-dominant axis.
    #[default]
    Crop,
    /// Exact target canvas, whole source letterboxed inside it.
    Fit,
    /// Canvas shrinks to the aspect-preserving size matching the dominant axis.
    Smart,
}

impl Mode {
    /// Lenient parse: anything unrecognised is `Crop`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "fit" => Mode::Fit,
            "smart" => Mode::Smart,
            _ => Mode::Crop,
        }
    }
}

impl From<String> for Mode {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl FromStr for Mode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Horizontal alignment of a crop window or a letterboxed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum XAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl XAlign {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => XAlign::Left,
            "right" => XAlign::Right,
            _ => XAlign::Center,
        }
    }
}

impl From<String> for XAlign {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

/// Vertical alignment of a crop window or a letterboxed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum YAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

impl YAlign {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" => YAlign::Center,
            "bottom" => YAlign::Bottom,
            _ => YAlign::Top,
        }
    }
}

impl From<String> for YAlign {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

/// Options for [`resize`](crate::ImageSession::resize).
///
/// `src_w`/`src_h` bound the sample box used by crop mode. They are a maximum:
/// the actual crop window is re-derived inside that box so it matches the
/// target aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeOptions {
    pub mode: Mode,
    pub x_align: XAlign,
    pub y_align: YAlign,
    pub src_w: Option<u32>,
    pub src_h: Option<u32>,
}

impl ResizeOptions {
    pub fn crop() -> Self {
        Self::default()
    }

    pub fn fit() -> Self {
        Self {
            mode: Mode::Fit,
            ..Self::default()
        }
    }

    pub fn smart() -> Self {
        Self {
            mode: Mode::Smart,
            ..Self::default()
        }
    }

    pub fn align(mut self, x_align: XAlign, y_align: YAlign) -> Self {
        self.x_align = x_align;
        self.y_align = y_align;
        self
    }

    pub fn sample_box(mut self, src_w: u32, src_h: u32) -> Self {
        self.src_w = Some(src_w);
        self.src_h = Some(src_h);
        self
    }
}

/// Axis (or axes) to mirror in [`flip`](crate::ImageSession::flip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    /// Mirror left-right.
    #[default]
    X,
    /// Mirror top-bottom.
    Y,
    XY,
}

impl Axis {
    /// Lenient parse: anything unrecognised is `X`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "y" => Axis::Y,
            "xy" | "yx" => Axis::XY,
            _ => Axis::X,
        }
    }
}

/// Rotation direction for [`rotate`](crate::ImageSession::rotate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Cw,
    Ccw,
}

impl Direction {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "ccw" => Direction::Ccw,
            _ => Direction::Cw,
        }
    }
}

/// Encoded output format for [`save`](crate::ImageSession::save).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpg,
    Gif,
    Png,
}

impl OutputFormat {
    /// Extensions stripped from save names before the resolved one is appended.
    pub const KNOWN_EXTENSIONS: [&'static str; 3] = [".jpg", ".gif", ".png"];

    /// Strict parse: `None` for anything but `jpg`, `gif` or `png`.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" => Some(OutputFormat::Jpg),
            "gif" => Some(OutputFormat::Gif),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Gif => "gif",
            OutputFormat::Png => "png",
        }
    }
}

/// MIME types a session accepts as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mime {
    Jpeg,
    Png,
    Gif,
}

impl Mime {
    pub fn from_mime_str(s: &str) -> Option<Self> {
        match s {
            "image/jpeg" => Some(Mime::Jpeg),
            "image/png" => Some(Mime::Png),
            "image/gif" => Some(Mime::Gif),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mime::Jpeg => "image/jpeg",
            Mime::Png => "image/png",
            Mime::Gif => "image/gif",
        }
    }
}

impl fmt::Display for Mime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination rectangle inside a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width × height` image.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }
}

/// Source rectangle for a resample copy.
///
/// Width and height are signed: a negative extent walks backwards from
/// `x`/`y`, which mirrors the copied region along that axis. `x = W - 1,
/// width = -W` covers the whole row right-to-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl SourceRect {
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Resolve into an upright region plus per-axis mirror flags.
    pub fn normalize(self) -> (Rect, bool, bool) {
        let (x, width, mirror_x) = normalize_span(self.x, self.width);
        let (y, height, mirror_y) = normalize_span(self.y, self.height);
        (Rect::new(x, y, width, height), mirror_x, mirror_y)
    }
}

impl From<Rect> for SourceRect {
    fn from(r: Rect) -> Self {
        Self::new(r.x as i64, r.y as i64, r.width as i64, r.height as i64)
    }
}

fn normalize_span(start: i64, extent: i64) -> (u32, u32, bool) {
    if extent < 0 {
        // Walking backwards from `start` inclusive.
        let len = extent.unsigned_abs();
        let begin = (start + 1 - len as i64).max(0);
        (begin as u32, len as u32, true)
    } else {
        (start.max(0) as u32, extent as u32, false)
    }
}
