//! Where the page image actually sits on screen.
//!
//! The page image is letterboxed inside a fixed-size container (max-width /
//! max-height scaling, centred), and the container itself sits somewhere
//! inside the section. The drawing surface has to cover exactly the image,
//! so we resolve two nested rectangles and add their offsets.
//!
//! All boxes handed in by a [`LayoutProbe`] are viewport rectangles (what
//! `getBoundingClientRect` returns), so scrolling shifts them all equally and
//! the relative offsets stay put.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Normalised rectangle spanning two arbitrary corners.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            left: a.0.min(b.0),
            top: a.1.min(b.1),
            width: (a.0 - b.0).abs(),
            height: (a.1 - b.1).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// This rectangle expressed in `origin`'s coordinate space.
    pub fn relative_to(&self, origin: &Rect) -> Rect {
        Rect::new(self.left - origin.left, self.top - origin.top, self.width, self.height)
    }

    /// Trim to `[0, width] x [0, height]`. Sub-pixel rounding in the browser
    /// can report an image a fraction outside its container.
    pub fn clamp_within(&self, width: f64, height: f64) -> Rect {
        let left = self.left.clamp(0.0, width);
        let top = self.top.clamp(0.0, height);
        Rect::new(
            left,
            top,
            (self.right().min(width) - left).max(0.0),
            (self.bottom().min(height) - top).max(0.0),
        )
    }
}

/// Resolved placement: `container` relative to the section root, `image`
/// relative to `container`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryRectangle {
    pub container: Rect,
    pub image: Rect,
}

impl GeometryRectangle {
    /// Box the drawing surface must occupy, relative to the section root.
    pub fn surface_rect(&self) -> Rect {
        Rect::new(
            self.container.left + self.image.left,
            self.container.top + self.image.top,
            self.image.width,
            self.image.height,
        )
    }

    pub fn is_contained(&self) -> bool {
        self.image.left >= 0.0
            && self.image.top >= 0.0
            && self.image.right() <= self.container.width
            && self.image.bottom() <= self.container.height
    }
}

/// Read-only view of the live layout of one section. Implemented over real
/// DOM handles in the web crate and over plain numbers in tests.
pub trait LayoutProbe {
    /// Viewport box of the section root, `None` if not mounted.
    fn section_box(&self) -> Option<Rect>;
    /// Viewport box of the fixed-size image container.
    fn container_box(&self) -> Option<Rect>;
    /// Viewport box of the rendered page image.
    fn image_box(&self) -> Option<Rect>;
    /// Decoded pixel size; `None` until the image reports load complete.
    fn natural_size(&self) -> Option<(u32, u32)>;
}

pub fn resolve(probe: &impl LayoutProbe) -> Result<GeometryRectangle, GeometryError> {
    let section = probe.section_box().ok_or(GeometryError::NotMounted("section"))?;
    let container = probe.container_box().ok_or(GeometryError::NotMounted("image container"))?;
    let image = probe.image_box().ok_or(GeometryError::NotMounted("page image"))?;
    match probe.natural_size() {
        Some((w, h)) if w > 0 && h > 0 => {}
        _ => return Err(GeometryError::NotDecoded),
    }
    if container.is_empty() || image.is_empty() {
        return Err(GeometryError::ZeroSize);
    }

    let container_rel = container.relative_to(&section);
    let image_rel = image
        .relative_to(&container)
        .clamp_within(container.width, container.height);
    if image_rel.is_empty() {
        return Err(GeometryError::ZeroSize);
    }
    Ok(GeometryRectangle { container: container_rel, image: image_rel })
}

/// Box an image of `natural` size occupies inside a `box_w x box_h` container
/// when scaled with `max-width: 100%; max-height: 100%` and centred. Images
/// are never scaled up.
#[cfg(test)]
fn letterbox(box_w: f64, box_h: f64, natural: (u32, u32)) -> Rect {
    let (nw, nh) = (natural.0 as f64, natural.1 as f64);
    if nw <= 0.0 || nh <= 0.0 || box_w <= 0.0 || box_h <= 0.0 {
        return Rect::default();
    }
    let scale = (box_w / nw).min(box_h / nh).min(1.0);
    let (w, h) = (nw * scale, nh * scale);
    Rect::new((box_w - w) / 2.0, (box_h - h) / 2.0, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeLayout {
        section: Option<Rect>,
        container: Option<Rect>,
        image: Option<Rect>,
        natural: Option<(u32, u32)>,
    }

    impl FakeLayout {
        /// Section at (sx, sy) in the viewport, container 800x1131 at (20, 60)
        /// inside it, image letterboxed in the container.
        fn letterboxed(sx: f64, sy: f64, natural: (u32, u32)) -> Self {
            let container = Rect::new(sx + 20.0, sy + 60.0, 800.0, 1131.0);
            let inner = letterbox(800.0, 1131.0, natural);
            Self {
                section: Some(Rect::new(sx, sy, 1400.0, 1300.0)),
                container: Some(container),
                image: Some(Rect::new(container.left + inner.left, container.top + inner.top, inner.width, inner.height)),
                natural: Some(natural),
            }
        }
    }

    impl LayoutProbe for FakeLayout {
        fn section_box(&self) -> Option<Rect> {
            self.section
        }
        fn container_box(&self) -> Option<Rect> {
            self.container
        }
        fn image_box(&self) -> Option<Rect> {
            self.image
        }
        fn natural_size(&self) -> Option<(u32, u32)> {
            self.natural
        }
    }

    #[test]
    fn resolves_letterboxed_image() {
        let probe = FakeLayout::letterboxed(0.0, 0.0, (1600, 1131));
        let geo = resolve(&probe).unwrap();
        assert_eq!(geo.container, Rect::new(20.0, 60.0, 800.0, 1131.0));
        assert_eq!(geo.image.left, 0.0);
        assert_eq!(geo.image.width, 800.0);
        assert!((geo.image.height - 565.5).abs() < 1e-9);
        assert!((geo.image.top - 282.75).abs() < 1e-9);
        let s = geo.surface_rect();
        assert_eq!((s.left, s.width), (20.0, 800.0));
        assert!((s.top - 342.75).abs() < 1e-9);
    }

    #[test]
    fn scrolling_does_not_move_relative_placement() {
        let still = resolve(&FakeLayout::letterboxed(0.0, 0.0, (600, 900))).unwrap();
        let scrolled = resolve(&FakeLayout::letterboxed(-35.0, -812.5, (600, 900))).unwrap();
        assert_eq!(still, scrolled);
    }

    #[test]
    fn image_always_inside_container() {
        for natural in [(1, 1), (300, 4000), (4000, 300), (800, 1131), (799, 1500), (2400, 3393)] {
            for (sx, sy) in [(0.0, 0.0), (13.3, -400.7), (-2.0, 99.9)] {
                let geo = resolve(&FakeLayout::letterboxed(sx, sy, natural)).unwrap();
                assert!(geo.is_contained(), "{natural:?} at {sx},{sy}: {geo:?}");
            }
        }
    }

    #[test]
    fn subpixel_overflow_is_clamped() {
        let mut probe = FakeLayout::letterboxed(0.0, 0.0, (800, 1131));
        probe.image = Some(Rect::new(19.6, 60.0, 800.8, 1131.0));
        let geo = resolve(&probe).unwrap();
        assert!(geo.is_contained());
        assert_eq!(geo.image.left, 0.0);
        assert_eq!(geo.image.width, 800.0);
    }

    #[test]
    fn undecoded_image_is_not_resolved() {
        let mut probe = FakeLayout::letterboxed(0.0, 0.0, (800, 1131));
        probe.natural = None;
        assert_eq!(resolve(&probe), Err(GeometryError::NotDecoded));
        probe.natural = Some((0, 0));
        assert_eq!(resolve(&probe), Err(GeometryError::NotDecoded));
    }

    #[test]
    fn unmounted_parts_are_reported() {
        let mut probe = FakeLayout::letterboxed(0.0, 0.0, (800, 1131));
        probe.image = None;
        assert_eq!(resolve(&probe), Err(GeometryError::NotMounted("page image")));
        probe.section = None;
        assert_eq!(resolve(&probe), Err(GeometryError::NotMounted("section")));
    }

    #[test]
    fn collapsed_layout_is_zero_size() {
        let mut probe = FakeLayout::letterboxed(0.0, 0.0, (800, 1131));
        probe.container = Some(Rect::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(resolve(&probe), Err(GeometryError::ZeroSize));
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let r = letterbox(800.0, 1131.0, (200, 100));
        assert_eq!(r, Rect::new(300.0, 515.5, 200.0, 100.0));
    }
}
