//! Pure Rust raster backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF) | `image::ImageReader` / `image::load_from_memory_with_format` |
//! | MIME sniffing | `ImageReader::with_guessed_format` + `ImageFormat::to_mime_type` |
//! | Canvas | `image::RgbImage::from_pixel` |
//! | Resample copy | `imageops::crop_imm` + `flip_*_in_place` + `imageops::resize` + `imageops::replace` |
//! | Right-angle rotation | `imageops::rotate90` / `rotate180` / `rotate270` |
//! | Free rotation | `imageproc::geometric_transformations::rotate_about_center` |
//! | Encode | `JpegEncoder::new_with_quality`, `ImageBuffer::write_to` for PNG/GIF |
//!
//! Every handle is flattened to 8-bit RGB on decode. Alpha is dropped; the
//! only color handling is the flat background fill.

use super::backend::{BackendError, Dimensions, RasterBackend};
use super::calculations::quarter_turns;
use super::params::{Color, OutputFormat, Quality, Rect, SourceRect};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageFormat, ImageReader, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::io::Cursor;
use std::path::Path;

/// MIME reported for files whose format cannot be guessed.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    filter: FilterType,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            filter: FilterType::CatmullRom,
        }
    }

    /// Use a different resampling filter for scaled copies.
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_failed(what: impl std::fmt::Display, e: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("Failed to decode {what}: {e}"))
}

impl RasterBackend for RustBackend {
    type Handle = RgbImage;

    fn detect_mime(&self, path: &Path) -> Result<String, BackendError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        Ok(reader
            .format()
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|| UNKNOWN_MIME.to_string()))
    }

    fn decode_file(&self, path: &Path) -> Result<RgbImage, BackendError> {
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_failed(path.display(), e))?;
        Ok(img.to_rgb8())
    }

    fn decode_bytes(&self, data: &[u8]) -> Result<(RgbImage, String), BackendError> {
        let format = image::guess_format(data).map_err(|e| decode_failed("buffer", e))?;
        let img = image::load_from_memory_with_format(data, format)
            .map_err(|e| decode_failed("buffer", e))?;
        Ok((img.to_rgb8(), format.to_mime_type().to_string()))
    }

    fn dimensions(&self, handle: &RgbImage) -> Dimensions {
        Dimensions {
            width: handle.width(),
            height: handle.height(),
        }
    }

    fn allocate_canvas(
        &self,
        width: u32,
        height: u32,
        background: Color,
    ) -> Result<RgbImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Cannot allocate {width}x{height} canvas"
            )));
        }
        Ok(RgbImage::from_pixel(
            width,
            height,
            Rgb([background.r, background.g, background.b]),
        ))
    }

    fn resample_copy(
        &self,
        dst: &mut RgbImage,
        src: &RgbImage,
        dst_rect: Rect,
        src_rect: SourceRect,
    ) -> Result<(), BackendError> {
        let (region, mirror_x, mirror_y) = src_rect.normalize();
        if region.width == 0
            || region.height == 0
            || region.x + region.width > src.width()
            || region.y + region.height > src.height()
        {
            return Err(BackendError::ProcessingFailed(format!(
                "Source rect {src_rect:?} outside {}x{} image",
                src.width(),
                src.height()
            )));
        }

        let mut patch =
            imageops::crop_imm(src, region.x, region.y, region.width, region.height).to_image();
        if mirror_x {
            imageops::flip_horizontal_in_place(&mut patch);
        }
        if mirror_y {
            imageops::flip_vertical_in_place(&mut patch);
        }

        // Same-size copies skip the filter so they stay pixel-exact.
        if patch.dimensions() != (dst_rect.width, dst_rect.height) {
            patch = imageops::resize(&patch, dst_rect.width, dst_rect.height, self.filter);
        }

        imageops::replace(dst, &patch, dst_rect.x as i64, dst_rect.y as i64);
        Ok(())
    }

    fn rotate(
        &self,
        handle: &RgbImage,
        degrees: f64,
        background: Color,
    ) -> Result<RgbImage, BackendError> {
        // `image` rotates clockwise; `degrees` is counter-clockwise.
        Ok(match quarter_turns(degrees) {
            Some(0) => handle.clone(),
            Some(1) => imageops::rotate270(handle),
            Some(2) => imageops::rotate180(handle),
            Some(_) => imageops::rotate90(handle),
            None => rotate_about_center(
                handle,
                -(degrees.to_radians() as f32),
                Interpolation::Bilinear,
                Rgb([background.r, background.g, background.b]),
            ),
        })
    }

    fn encode(
        &self,
        handle: &RgbImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let mut buf = Cursor::new(Vec::new());
        let result = match format {
            OutputFormat::Jpg => handle.write_with_encoder(JpegEncoder::new_with_quality(
                &mut buf,
                quality.value() as u8,
            )),
            OutputFormat::Png => handle.write_to(&mut buf, ImageFormat::Png),
            OutputFormat::Gif => handle.write_to(&mut buf, ImageFormat::Gif),
        };
        result.map_err(|e| {
            BackendError::ProcessingFailed(format!("{} encode failed: {e}", format.extension()))
        })?;
        Ok(buf.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::calculations::plan_flip;
    use crate::imaging::params::Axis;

    /// Gradient image with a distinct value per pixel position.
    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 10 % 256) as u8, (y * 10 % 256) as u8, 128])
        })
    }

    #[test]
    fn canvas_is_filled_with_background() {
        let backend = RustBackend::new();
        let canvas = backend
            .allocate_canvas(4, 3, Color::new(10, 20, 30))
            .unwrap();
        assert_eq!(canvas.dimensions(), (4, 3));
        assert!(canvas.pixels().all(|p| *p == Rgb([10, 20, 30])));
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let backend = RustBackend::new();
        assert!(backend.allocate_canvas(0, 3, Color::WHITE).is_err());
    }

    #[test]
    fn same_size_copy_is_exact() {
        let backend = RustBackend::new();
        let src = gradient(8, 6);
        let mut dst = backend.allocate_canvas(4, 2, Color::WHITE).unwrap();
        backend
            .resample_copy(
                &mut dst,
                &src,
                Rect::full(4, 2),
                SourceRect::new(2, 3, 4, 2),
            )
            .unwrap();
        assert_eq!(dst.get_pixel(0, 0), src.get_pixel(2, 3));
        assert_eq!(dst.get_pixel(3, 1), src.get_pixel(5, 4));
    }

    #[test]
    fn copy_into_sub_rect_leaves_background() {
        let backend = RustBackend::new();
        let src = gradient(4, 4);
        let mut dst = backend.allocate_canvas(6, 4, Color::new(0, 0, 0)).unwrap();
        backend
            .resample_copy(&mut dst, &src, Rect::new(1, 0, 4, 4), Rect::full(4, 4).into())
            .unwrap();
        assert_eq!(*dst.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*dst.get_pixel(5, 3), Rgb([0, 0, 0]));
        assert_eq!(dst.get_pixel(1, 0), src.get_pixel(0, 0));
    }

    #[test]
    fn negative_width_mirrors_horizontally() {
        let backend = RustBackend::new();
        let src = gradient(5, 3);
        let plan = plan_flip((5, 3), Axis::X);
        let mut dst = backend.allocate_canvas(5, 3, Color::WHITE).unwrap();
        backend
            .resample_copy(&mut dst, &src, plan.dst, plan.src)
            .unwrap();
        assert_eq!(dst.get_pixel(0, 0), src.get_pixel(4, 0));
        assert_eq!(dst.get_pixel(4, 2), src.get_pixel(0, 2));
    }

    #[test]
    fn negative_height_mirrors_vertically() {
        let backend = RustBackend::new();
        let src = gradient(5, 3);
        let plan = plan_flip((5, 3), Axis::Y);
        let mut dst = backend.allocate_canvas(5, 3, Color::WHITE).unwrap();
        backend
            .resample_copy(&mut dst, &src, plan.dst, plan.src)
            .unwrap();
        assert_eq!(dst.get_pixel(1, 0), src.get_pixel(1, 2));
    }

    #[test]
    fn out_of_bounds_source_errors() {
        let backend = RustBackend::new();
        let src = gradient(5, 3);
        let mut dst = backend.allocate_canvas(5, 3, Color::WHITE).unwrap();
        let result =
            backend.resample_copy(&mut dst, &src, Rect::full(5, 3), SourceRect::new(1, 0, 5, 3));
        assert!(result.is_err());
    }

    #[test]
    fn scaled_copy_fills_destination() {
        let backend = RustBackend::with_filter(FilterType::Triangle);
        let src = RgbImage::from_pixel(40, 20, Rgb([200, 10, 10]));
        let mut dst = backend.allocate_canvas(10, 10, Color::WHITE).unwrap();
        backend
            .resample_copy(&mut dst, &src, Rect::full(10, 10), Rect::full(40, 20).into())
            .unwrap();
        assert_eq!(dst.dimensions(), (10, 10));
        assert!(
            dst.pixels()
                .all(|p| p.0[0].abs_diff(200) <= 1 && p.0[1].abs_diff(10) <= 1)
        );
    }

    #[test]
    fn rotate_right_angles_swap_dimensions() {
        let backend = RustBackend::new();
        let src = gradient(6, 2);
        let ccw = backend.rotate(&src, 90.0, Color::WHITE).unwrap();
        assert_eq!(ccw.dimensions(), (2, 6));
        // Counter-clockwise: top-right corner moves to top-left
        assert_eq!(ccw.get_pixel(0, 0), src.get_pixel(5, 0));

        let cw = backend.rotate(&src, 270.0, Color::WHITE).unwrap();
        // Clockwise: bottom-left corner moves to top-left
        assert_eq!(cw.get_pixel(0, 0), src.get_pixel(0, 1));

        assert_eq!(backend.rotate(&src, 180.0, Color::WHITE).unwrap().dimensions(), (6, 2));
        assert_eq!(backend.rotate(&src, 0.0, Color::WHITE).unwrap(), src);
    }

    #[test]
    fn rotate_free_angle_keeps_canvas_and_fills_corners() {
        let backend = RustBackend::new();
        let src = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
        let rotated = backend.rotate(&src, 45.0, Color::new(255, 0, 0)).unwrap();
        assert_eq!(rotated.dimensions(), (40, 40));
        assert_eq!(*rotated.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*rotated.get_pixel(20, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn rotate_free_angle_turns_counter_clockwise() {
        let backend = RustBackend::new();
        // Green marker band along the right edge, middle rows
        let src = RgbImage::from_fn(41, 41, |x, y| {
            if x >= 34 && (16..=24).contains(&y) {
                Rgb([0, 255, 0])
            } else {
                Rgb([0, 0, 0])
            }
        });

        // A counter-clockwise turn just short of a quarter carries the
        // right edge marker to the top edge, not the bottom.
        let rotated = backend.rotate(&src, 80.0, Color::WHITE).unwrap();
        assert!(rotated.get_pixel(20, 4).0[1] > 200);
        assert!(rotated.get_pixel(20, 36).0[1] < 50);

        let clockwise = backend.rotate(&src, 280.0, Color::WHITE).unwrap();
        assert!(clockwise.get_pixel(20, 36).0[1] > 200);
        assert!(clockwise.get_pixel(20, 4).0[1] < 50);
    }

    #[test]
    fn filter_defaults_to_catmull_rom() {
        assert_eq!(RustBackend::new().filter(), FilterType::CatmullRom);
        assert_eq!(
            RustBackend::with_filter(FilterType::Nearest).filter(),
            FilterType::Nearest
        );
    }

    #[test]
    fn encode_and_decode_each_format() {
        let backend = RustBackend::new();
        let src = gradient(12, 8);
        for (format, mime) in [
            (OutputFormat::Jpg, "image/jpeg"),
            (OutputFormat::Png, "image/png"),
            (OutputFormat::Gif, "image/gif"),
        ] {
            let bytes = backend.encode(&src, format, Quality::MAX).unwrap();
            let (decoded, detected) = backend.decode_bytes(&bytes).unwrap();
            assert_eq!(decoded.dimensions(), (12, 8));
            assert_eq!(detected, mime);
        }
    }

    #[test]
    fn png_encode_is_lossless() {
        let backend = RustBackend::new();
        let src = gradient(7, 5);
        let bytes = backend
            .encode(&src, OutputFormat::Png, Quality::default())
            .unwrap();
        let (decoded, _) = backend.decode_bytes(&bytes).unwrap();
        assert_eq!(decoded, src);
    }

    #[test]
    fn detect_mime_and_decode_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        // Extension deliberately wrong: detection goes by content
        let path = tmp.path().join("picture.jpg");
        gradient(9, 4).save_with_format(&path, ImageFormat::Png).unwrap();

        let backend = RustBackend::new();
        assert_eq!(backend.detect_mime(&path).unwrap(), "image/png");
        assert_eq!(backend.decode_file(&path).unwrap().dimensions(), (9, 4));
    }

    #[test]
    fn detect_mime_nonexistent_file_errors() {
        let backend = RustBackend::new();
        assert!(backend.detect_mime(Path::new("/nonexistent/image.jpg")).is_err());
    }

    #[test]
    fn decode_garbage_bytes_errors() {
        let backend = RustBackend::new();
        assert!(backend.decode_bytes(b"definitely not an image").is_err());
    }
}
