//! Pure calculation functions for canvas geometry.
//!
//! All functions here are pure and testable without any I/O or images. Each
//! `plan_*` function turns a request into a [`CopyPlan`]: the canvas to
//! allocate, where to draw inside it, and which source region to draw.
//!
//! Aspect ratios are compared by integer cross-multiplication so that
//! "equal ratio" really means equal, independent of float rounding.

use super::params::{Axis, Direction, Rect, ResizeOptions, SourceRect, XAlign, YAlign};
use std::cmp::Ordering;

/// Width, height and aspect ratio of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    /// `width / height`. Greater than 1 for landscape, less than 1 for portrait.
    pub ratio: f64,
}

/// Derive [`Geometry`] from raw dimensions.
pub fn compute_geometry((width, height): (u32, u32)) -> Geometry {
    Geometry {
        width,
        height,
        ratio: width as f64 / height as f64,
    }
}

/// A single resample copy: allocate `canvas`, then copy `src` onto `dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyPlan {
    pub canvas: (u32, u32),
    pub dst: Rect,
    pub src: SourceRect,
}

/// Compare the aspect ratio of `a` against `b` without floating point.
///
/// `Less` means `a` is relatively taller than `b`, `Greater` relatively wider.
pub fn compare_aspect(a: (u32, u32), b: (u32, u32)) -> Ordering {
    let lhs = a.0 as u64 * b.1 as u64;
    let rhs = a.1 as u64 * b.0 as u64;
    lhs.cmp(&rhs)
}

#[derive(Clone, Copy)]
enum Anchor {
    Start,
    Center,
    End,
}

impl From<XAlign> for Anchor {
    fn from(a: XAlign) -> Self {
        match a {
            XAlign::Left => Anchor::Start,
            XAlign::Center => Anchor::Center,
            XAlign::Right => Anchor::End,
        }
    }
}

impl From<YAlign> for Anchor {
    fn from(a: YAlign) -> Self {
        match a {
            YAlign::Top => Anchor::Start,
            YAlign::Center => Anchor::Center,
            YAlign::Bottom => Anchor::End,
        }
    }
}

/// Offset that places a span inside a larger one leaving `slack` pixels over.
fn anchor_offset(slack: u32, anchor: Anchor) -> u32 {
    match anchor {
        Anchor::Start => 0,
        Anchor::Center => slack / 2,
        Anchor::End => slack,
    }
}

/// `floor(a * b / c)`, clamped into `[1, max]`.
fn scale_floor(a: u32, b: u32, c: u32, max: u32) -> u32 {
    let v = a as u64 * b as u64 / c as u64;
    (v as u32).clamp(1, max.max(1))
}

/// `round(a * b / c)`, clamped into `[1, max]`.
fn scale_round(a: u32, b: u32, c: u32, max: u32) -> u32 {
    let v = (a as f64 * b as f64 / c as f64).round() as u32;
    v.clamp(1, max.max(1))
}

/// Plan a crop-mode resize.
///
/// The canvas is exactly `target`. The sample box is the whole image, or the
/// `src_w`/`src_h` override clamped into the image. Inside that box the largest
/// window with the target's aspect ratio is chosen: a relatively taller box
/// loses height, a relatively wider one loses width. The window is then
/// positioned in the image by the alignment hints.
///
/// # Examples
/// ```
/// # use rasterfit::imaging::calculations::plan_crop;
/// # use rasterfit::imaging::{ResizeOptions, SourceRect};
/// // 800x400 into a 200x200 square: keep the middle 400x400
/// let plan = plan_crop((800, 400), (200, 200), &ResizeOptions::default());
/// assert_eq!(plan.src, SourceRect::new(200, 0, 400, 400));
/// ```
pub fn plan_crop(source: (u32, u32), target: (u32, u32), opts: &ResizeOptions) -> CopyPlan {
    let (w, h) = source;
    let (tw, th) = target;

    let box_w = opts.src_w.map_or(w, |v| v.clamp(1, w));
    let box_h = opts.src_h.map_or(h, |v| v.clamp(1, h));

    let (sw, sh) = match compare_aspect((box_w, box_h), target) {
        // Taller than the target: trim height
        Ordering::Less => (box_w, scale_floor(th, box_w, tw, box_h)),
        // Wider than the target: trim width
        Ordering::Greater => (scale_floor(tw, box_h, th, box_w), box_h),
        Ordering::Equal => (box_w, box_h),
    };

    let sx = anchor_offset(w - sw, opts.x_align.into());
    let sy = anchor_offset(h - sh, opts.y_align.into());

    CopyPlan {
        canvas: target,
        dst: Rect::full(tw, th),
        src: Rect::new(sx, sy, sw, sh).into(),
    }
}

/// Plan a fit-mode resize.
///
/// The canvas is exactly `target` and keeps its background outside the drawn
/// region. The whole source is drawn at the largest size that preserves its
/// aspect ratio. A wider source spans the full width and is placed vertically
/// by `y_align`; a taller one spans the full height and is placed
/// horizontally by `x_align`.
pub fn plan_fit(source: (u32, u32), target: (u32, u32), opts: &ResizeOptions) -> CopyPlan {
    let (w, h) = source;
    let (tw, th) = target;

    let dst = match compare_aspect(source, target) {
        Ordering::Greater => {
            let dh = scale_round(h, tw, w, th);
            Rect::new(0, anchor_offset(th - dh, opts.y_align.into()), tw, dh)
        }
        Ordering::Less => {
            let dw = scale_round(w, th, h, tw);
            Rect::new(anchor_offset(tw - dw, opts.x_align.into()), 0, dw, th)
        }
        Ordering::Equal => Rect::full(tw, th),
    };

    CopyPlan {
        canvas: target,
        dst,
        src: Rect::full(w, h).into(),
    }
}

/// Plan a smart-mode resize.
///
/// The canvas is the aspect-preserving size that matches the dominant target
/// axis, so the result may be smaller than `target` on the other axis.
pub fn plan_smart(source: (u32, u32), target: (u32, u32)) -> CopyPlan {
    let (w, h) = source;
    let (tw, th) = target;

    let canvas = match compare_aspect(source, target) {
        Ordering::Greater => (tw, scale_round(h, tw, w, th)),
        Ordering::Less => (scale_round(w, th, h, tw), th),
        Ordering::Equal => (tw, th),
    };

    CopyPlan {
        canvas,
        dst: Rect::full(canvas.0, canvas.1),
        src: Rect::full(w, h).into(),
    }
}

/// Plan a stretch: the whole source onto the whole target, aspect ignored.
pub fn plan_stretch(source: (u32, u32), target: (u32, u32)) -> CopyPlan {
    CopyPlan {
        canvas: target,
        dst: Rect::full(target.0, target.1),
        src: Rect::full(source.0, source.1).into(),
    }
}

/// Plan a flip as a copy with negative source extents.
///
/// Mirroring an axis starts the source at its last pixel and walks backwards
/// over the full extent.
pub fn plan_flip(source: (u32, u32), axis: Axis) -> CopyPlan {
    let (w, h) = source;
    let (w64, h64) = (w as i64, h as i64);

    let src = match axis {
        Axis::X => SourceRect::new(w64 - 1, 0, -w64, h64),
        Axis::Y => SourceRect::new(0, h64 - 1, w64, -h64),
        Axis::XY => SourceRect::new(w64 - 1, h64 - 1, -w64, -h64),
    };

    CopyPlan {
        canvas: source,
        dst: Rect::full(w, h),
        src,
    }
}

/// Plan extraction of a sub-rectangle.
///
/// Sizes that are non-positive or larger than the image become the full
/// extent. Origins that are negative or outside the image become 0, then are
/// pulled back so the window ends inside the image.
pub fn plan_sample(source: (u32, u32), x: i64, y: i64, width: i64, height: i64) -> CopyPlan {
    let (w, h) = source;
    let (sx, sw) = clamp_window(x, width, w);
    let (sy, sh) = clamp_window(y, height, h);

    CopyPlan {
        canvas: (sw, sh),
        dst: Rect::full(sw, sh),
        src: Rect::new(sx, sy, sw, sh).into(),
    }
}

fn clamp_window(start: i64, extent: i64, limit: u32) -> (u32, u32) {
    let limit64 = limit as i64;
    let extent = if extent <= 0 || extent > limit64 {
        limit
    } else {
        extent as u32
    };
    let start = if start < 0 || start >= limit64 {
        0
    } else {
        start as u32
    };
    (start.min(limit - extent), extent)
}

/// Counter-clockwise degrees in `[0, 360)` for a rotation request.
///
/// Clockwise requests are expressed as `360 - angle`.
pub fn rotation_degrees(angle: f64, direction: Direction) -> f64 {
    let ccw = match direction {
        Direction::Cw => 360.0 - angle,
        Direction::Ccw => angle,
    };
    ccw.rem_euclid(360.0)
}

/// Number of counter-clockwise quarter turns when `degrees` is a right angle.
pub fn quarter_turns(degrees: f64) -> Option<u8> {
    let turns = degrees / 90.0;
    if (turns - turns.round()).abs() < 1e-9 {
        Some((turns.round() as i64).rem_euclid(4) as u8)
    } else {
        None
    }
}
