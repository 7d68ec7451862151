//! The image session: one working image, transformed in place.
//!
//! A session loads a source once, then each transform computes a
//! [`CopyPlan`] with the pure functions in
//! [`calculations`](crate::imaging::calculations), hands it to the backend and
//! swaps the resulting canvas in as the new working handle. Transforms return
//! `&mut Self` so they chain:
//!
//! ```no_run
//! # use rasterfit::{ImageSession, ResizeOptions, Source, Axis};
//! # fn main() -> Result<(), rasterfit::ImageError> {
//! let mut session: ImageSession = ImageSession::default();
//! session
//!     .load(Source::Path("upload.jpg".into()))?
//!     .resize(200, 200, &ResizeOptions::fit())?
//!     .flip(Axis::X)?;
//! session.save("/var/www/thumbs", "upload", "png")?;
//! # Ok(())
//! # }
//! ```
//!
//! Width, height and ratio are never cached: [`ImageSession::geometry`] reads
//! them from the working handle on every call.

use crate::config::SessionConfig;
use crate::imaging::calculations::{
    CopyPlan, Geometry, compute_geometry, plan_crop, plan_fit, plan_flip, plan_sample,
    plan_smart, plan_stretch, rotation_degrees,
};
use crate::imaging::{
    Axis, BackendError, Color, Direction, Mime, Mode, OutputFormat, Quality, RasterBackend,
    ResizeOptions, RustBackend,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Could not load image: {0}")]
    Load(String),
    #[error("Invalid save path: {0}")]
    Path(String),
    #[error("No image loaded")]
    NotLoaded,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ImageError>;

/// Where a session's image came from.
#[derive(Debug, Clone)]
pub enum Source<H> {
    /// A JPEG, PNG or GIF file on disk.
    Path(PathBuf),
    /// An encoded image held in memory.
    Bytes(Vec<u8>),
    /// An already decoded backend handle.
    Handle(H),
}

impl<H> Source<H> {
    /// Interpret untyped input the way loose callers pass it.
    ///
    /// Input naming an existing file is a path. Otherwise it is treated as
    /// encoded image data when `is_raw_data` is set, and rejected when not.
    pub fn from_raw(input: impl AsRef<[u8]>, is_raw_data: bool) -> Result<Self> {
        let input = input.as_ref();
        if let Ok(s) = std::str::from_utf8(input) {
            let path = Path::new(s);
            if !s.is_empty() && path.is_file() {
                return Ok(Source::Path(path.to_path_buf()));
            }
        }
        if is_raw_data {
            return Ok(Source::Bytes(input.to_vec()));
        }
        Err(ImageError::Load(
            "source is neither an existing file nor raw image data".into(),
        ))
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Path(_) => SourceKind::File,
            Source::Bytes(_) => SourceKind::Data,
            Source::Handle(_) => SourceKind::Handle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Data,
    Handle,
}

/// An encoded image ready to be written to an HTTP-like response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    pub content_type: &'static str,
    pub content_length: usize,
    pub body: Vec<u8>,
}

impl ImageResponse {
    pub const CONTENT_TYPE: &'static str = "image/jpg";

    /// Write header lines, a blank line, then the body.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "Content-Type: {}\r\n", self.content_type)?;
        write!(out, "Content-Length: {}\r\n\r\n", self.content_length)?;
        out.write_all(&self.body)?;
        out.flush()
    }
}

/// Everything that exists only once a source has loaded.
struct Loaded<H> {
    working: H,
    /// First decode of the source. Reload falls back to it when a file-based
    /// source has disappeared from disk.
    original: H,
    source: Source<H>,
    mime: Mime,
    name: String,
}

/// A freshly opened source, before it is installed into the session.
struct Opened<H> {
    handle: H,
    mime: Mime,
    name: String,
}

/// Name reported for sources that are not files.
const RESOURCE_NAME: &str = "resource";

/// A single image being loaded, transformed and exported.
pub struct ImageSession<B: RasterBackend = RustBackend> {
    backend: B,
    background: Color,
    quality: Quality,
    state: Option<Loaded<B::Handle>>,
}

impl Default for ImageSession<RustBackend> {
    fn default() -> Self {
        Self::new(RustBackend::new())
    }
}

impl ImageSession<RustBackend> {
    /// Session on the pure Rust backend, configured from a [`SessionConfig`].
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::with_config(RustBackend::with_filter(config.filter.into()), config)
    }
}

impl<B: RasterBackend> ImageSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            background: Color::default(),
            quality: Quality::default(),
            state: None,
        }
    }

    pub fn with_config(backend: B, config: &SessionConfig) -> Self {
        Self {
            backend,
            background: config.background_color(),
            quality: config.save_quality(),
            state: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load a source, replacing whatever the session held before.
    ///
    /// On failure the session is left without an image.
    pub fn load(&mut self, source: Source<B::Handle>) -> Result<&mut Self> {
        self.state = None;
        let opened = self.open(&source)?;
        info!(
            name = %opened.name,
            mime = %opened.mime,
            kind = ?source.kind(),
            "Loaded image"
        );
        self.state = Some(Loaded {
            original: opened.handle.clone(),
            working: opened.handle,
            source,
            mime: opened.mime,
            name: opened.name,
        });
        Ok(self)
    }

    /// Discard all transforms and start again from the stored source.
    ///
    /// A file-based source that no longer exists restores the image decoded at
    /// first load instead of reading disk.
    pub fn reload(&mut self) -> Result<&mut Self> {
        let state = self.state.as_ref().ok_or(ImageError::NotLoaded)?;

        let working = match &state.source {
            Source::Path(path) if !path.exists() => {
                warn!(path = %path.display(), "Source file is gone, restoring first decode");
                state.original.clone()
            }
            source => {
                let opened = self.open(source)?;
                opened.handle
            }
        };

        if let Some(state) = self.state.as_mut() {
            state.working = working;
        }
        debug!("Reloaded image");
        Ok(self)
    }

    fn open(&self, source: &Source<B::Handle>) -> Result<Opened<B::Handle>> {
        match source {
            Source::Path(path) => self.open_file(path),
            Source::Bytes(data) => {
                let (handle, mime) = self
                    .backend
                    .decode_bytes(data)
                    .map_err(|e| ImageError::Load(e.to_string()))?;
                let mime = Mime::from_mime_str(&mime).ok_or_else(|| {
                    ImageError::Load(format!("does not accept data of MIME type {mime}"))
                })?;
                Ok(Opened {
                    handle,
                    mime,
                    name: RESOURCE_NAME.to_string(),
                })
            }
            Source::Handle(handle) => Ok(Opened {
                handle: handle.clone(),
                mime: Mime::Png,
                name: RESOURCE_NAME.to_string(),
            }),
        }
    }

    fn open_file(&self, path: &Path) -> Result<Opened<B::Handle>> {
        if !path.is_file() {
            return Err(ImageError::Load(format!(
                "could not locate the source file: {}",
                path.display()
            )));
        }

        let mime = self
            .backend
            .detect_mime(path)
            .map_err(|e| ImageError::Load(e.to_string()))?;
        let mime = Mime::from_mime_str(&mime)
            .ok_or_else(|| ImageError::Load(format!("does not accept files of MIME type {mime}")))?;

        let handle = self
            .backend
            .decode_file(path)
            .map_err(|e| ImageError::Load(e.to_string()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Opened { handle, mime, name })
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// Width, height and ratio of the current working image.
    pub fn geometry(&self) -> Result<Geometry> {
        Ok(compute_geometry(self.dimensions()?))
    }

    fn dimensions(&self) -> Result<(u32, u32)> {
        let state = self.state.as_ref().ok_or(ImageError::NotLoaded)?;
        Ok(self.backend.dimensions(&state.working).into())
    }

    pub fn mime(&self) -> Option<Mime> {
        self.state.as_ref().map(|s| s.mime)
    }

    /// File name with extension for file sources, `resource` otherwise.
    pub fn name(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.name.as_str())
    }

    pub fn source_kind(&self) -> Option<SourceKind> {
        self.state.as_ref().map(|s| s.source.kind())
    }

    /// The current working handle.
    pub fn handle(&self) -> Option<&B::Handle> {
        self.state.as_ref().map(|s| &s.working)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set the fill color for canvases allocated by later transforms.
    pub fn set_background(&mut self, r: u8, g: u8, b: u8) -> &mut Self {
        self.background = Color::new(r, g, b);
        self
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Set the JPEG quality used by [`save`](Self::save).
    pub fn set_quality(&mut self, quality: Quality) -> &mut Self {
        self.quality = quality;
        self
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Resize onto a `dst_w × dst_h` target using the mode in `opts`.
    pub fn resize(&mut self, dst_w: u32, dst_h: u32, opts: &ResizeOptions) -> Result<&mut Self> {
        let target = check_target(dst_w, dst_h)?;
        let source = self.dimensions()?;
        let plan = match opts.mode {
            Mode::Crop => plan_crop(source, target, opts),
            Mode::Fit => plan_fit(source, target, opts),
            Mode::Smart => plan_smart(source, target),
        };
        debug!(mode = ?opts.mode, ?source, ?target, ?plan, "Resize");
        self.apply(plan)
    }

    /// Resample the whole image onto `dst_w × dst_h`, ignoring aspect ratio.
    pub fn stretch(&mut self, dst_w: u32, dst_h: u32) -> Result<&mut Self> {
        let target = check_target(dst_w, dst_h)?;
        let plan = plan_stretch(self.dimensions()?, target);
        debug!(?target, "Stretch");
        self.apply(plan)
    }

    pub fn flip(&mut self, axis: Axis) -> Result<&mut Self> {
        let plan = plan_flip(self.dimensions()?, axis);
        debug!(?axis, "Flip");
        self.apply(plan)
    }

    /// Rotate by `angle` degrees. Non-right angles keep the canvas size.
    pub fn rotate(&mut self, angle: f64, direction: Direction) -> Result<&mut Self> {
        let state = self.state.as_mut().ok_or(ImageError::NotLoaded)?;
        let degrees = rotation_degrees(angle, direction);
        debug!(angle, ?direction, degrees, "Rotate");
        state.working = self
            .backend
            .rotate(&state.working, degrees, self.background)?;
        Ok(self)
    }

    /// Replace the image with a sub-rectangle, clamped to stay inside it.
    pub fn sample(&mut self, src_x: i64, src_y: i64, src_w: i64, src_h: i64) -> Result<&mut Self> {
        let plan = plan_sample(self.dimensions()?, src_x, src_y, src_w, src_h);
        debug!(src_x, src_y, src_w, src_h, ?plan, "Sample");
        self.apply(plan)
    }

    fn apply(&mut self, plan: CopyPlan) -> Result<&mut Self> {
        let state = self.state.as_mut().ok_or(ImageError::NotLoaded)?;
        let (width, height) = plan.canvas;
        let mut canvas = self
            .backend
            .allocate_canvas(width, height, self.background)?;
        self.backend
            .resample_copy(&mut canvas, &state.working, plan.dst, plan.src)?;
        state.working = canvas;
        Ok(self)
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Save to `{dir}/{name}.{format}`.
    ///
    /// `format` is `jpg`, `gif` or `png`; anything else saves as `jpg`. Known
    /// extensions are stripped from `name` first, and what remains must be a
    /// plain file name. Returns the written path.
    pub fn save(&self, dir: impl AsRef<Path>, name: &str, format: &str) -> Result<PathBuf> {
        let format = OutputFormat::from_name(format).unwrap_or_else(|| {
            warn!(format, "Unsupported save format, using jpg");
            OutputFormat::Jpg
        });
        self.save_as(dir, name, format)
    }

    pub fn save_as(&self, dir: impl AsRef<Path>, name: &str, format: OutputFormat) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let state = self.state.as_ref().ok_or(ImageError::NotLoaded)?;
        verify_save_dir(dir)?;

        let stem = save_stem(name)?;
        let target = dir.join(format!("{stem}.{}", format.extension()));
        let bytes = self.backend.encode(&state.working, format, self.quality)?;

        fs::write(&target, bytes).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => {
                ImageError::Path(format!("{} is not writable", dir.display()))
            }
            _ => ImageError::Io(e),
        })?;

        info!(path = %target.display(), "Saved image");
        Ok(target)
    }

    /// The working image as JPEG at quality 100.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let state = self.state.as_ref().ok_or(ImageError::NotLoaded)?;
        Ok(self
            .backend
            .encode(&state.working, OutputFormat::Jpg, Quality::MAX)?)
    }

    pub fn response(&self) -> Result<ImageResponse> {
        let body = self.to_bytes()?;
        Ok(ImageResponse {
            content_type: ImageResponse::CONTENT_TYPE,
            content_length: body.len(),
            body,
        })
    }

    /// Write the working image as a JPEG response to `out`.
    pub fn show<W: Write>(&self, out: &mut W) -> Result<()> {
        self.response()?.write_to(out)?;
        Ok(())
    }

    /// Delete the backing file when the source was a file. No-op otherwise.
    pub fn destroy(&mut self) -> Result<()> {
        let Some(Loaded {
            source: Source::Path(path),
            ..
        }) = &self.state
        else {
            return Ok(());
        };

        match fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "Deleted source file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_target(width: u32, height: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidRequest(format!(
            "target size {width}x{height} must be non-zero"
        )));
    }
    Ok((width, height))
}

fn verify_save_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(ImageError::Path(format!(
            "{} is not a valid directory",
            dir.display()
        )));
    }
    if fs::metadata(dir)?.permissions().readonly() {
        return Err(ImageError::Path(format!("{} is not writable", dir.display())));
    }
    Ok(())
}

/// The file stem for `name`, which must stay inside the save directory.
fn save_stem(name: &str) -> Result<String> {
    let stem = strip_known_extensions(name);
    let mut components = Path::new(&stem).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !stem.contains(['/', '\\']);
    if !plain {
        return Err(ImageError::Path(format!("{name:?} is not a plain file name")));
    }
    Ok(stem)
}

fn strip_known_extensions(name: &str) -> String {
    OutputFormat::KNOWN_EXTENSIONS
        .iter()
        .fold(name.to_string(), |acc, ext| acc.replace(ext, ""))
}
