//! Lifecycle of one section's drawing surface.
//!
//! ```text
//! Uninitialized --initialize()--> Ready --position()--> Positioned
//!                                   ^                     |    ^
//!                                   |                  hide()  | position()
//!                                   |                     v    |
//!                                   +---- dispose() ---- Hidden
//! ```
//!
//! `dispose()` from any state returns to `Uninitialized`. The controller never
//! retries on its own; callers drive `initialize()`/`position()` through
//! [`crate::retry::retry`].

use crate::error::SurfaceError;
use crate::geometry::{GeometryRectangle, Rect};
use crate::model::Parameter;
use crate::overlay::{self, OverlayStyle};
use crate::scene::Scene;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    Uninitialized,
    Ready,
    Positioned,
    Hidden,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Crosshair => "crosshair",
        }
    }
}

/// The element side of a drawing surface: a canvas inside a wrapper that is
/// absolutely positioned over the section.
pub trait SurfaceHost {
    /// Committed layout size of the canvas element, `None` if it is not mounted.
    fn element_size(&self) -> Option<(f64, f64)>;
    /// Acquire drawing resources for a canvas of the given size.
    fn bind(&mut self, width: f64, height: f64) -> Result<(), SurfaceError>;
    /// Move the wrapper to `rect` (relative to the section root) and size the
    /// canvas backing store to match.
    fn place(&mut self, rect: Rect);
    fn set_visible(&mut self, visible: bool);
    fn set_cursor(&mut self, cursor: Cursor);
    fn paint(&mut self, scene: &Scene);
    fn release(&mut self);
}

pub struct DrawingSurface<H> {
    host: H,
    state: SurfaceState,
    scene: Scene,
    style: OverlayStyle,
    params: Vec<Parameter>,
    placement: Option<Rect>,
    cursor: Cursor,
}

impl<H: SurfaceHost> DrawingSurface<H> {
    pub fn new(host: H, style: OverlayStyle) -> Self {
        Self {
            host,
            state: SurfaceState::Uninitialized,
            scene: Scene::new(),
            style,
            params: Vec::new(),
            placement: None,
            cursor: Cursor::Default,
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state != SurfaceState::Uninitialized
    }

    pub fn is_visible(&self) -> bool {
        self.state == SurfaceState::Positioned
    }

    pub fn placement(&self) -> Option<Rect> {
        self.placement
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Bind the surface to its canvas. Safe to call repeatedly; only the first
    /// successful call allocates. Fails while the canvas is unmounted or has
    /// not been laid out.
    pub fn initialize(&mut self) -> Result<(), SurfaceError> {
        if self.is_ready() {
            return Ok(());
        }
        let (w, h) = self.host.element_size().ok_or(SurfaceError::NotMounted)?;
        if w <= 0.0 || h <= 0.0 {
            return Err(SurfaceError::NoLayout);
        }
        self.host.bind(w, h)?;
        self.host.set_visible(false);
        self.host.set_cursor(self.cursor);
        self.state = SurfaceState::Ready;
        log::debug!("drawing surface bound at {w}x{h}");
        Ok(())
    }

    /// Cover `geo`'s image box and show the surface.
    pub fn position(&mut self, geo: &GeometryRectangle) -> Result<(), SurfaceError> {
        if !self.is_ready() {
            return Err(SurfaceError::NotReady);
        }
        let rect = geo.surface_rect();
        if self.placement != Some(rect) {
            self.host.place(rect);
            self.placement = Some(rect);
        }
        if self.state != SurfaceState::Positioned {
            self.host.set_visible(true);
            self.state = SurfaceState::Positioned;
        }
        // canvas resize wipes the bitmap
        self.redraw_forced();
        Ok(())
    }

    pub fn hide(&mut self) {
        match self.state {
            SurfaceState::Uninitialized | SurfaceState::Hidden => {}
            SurfaceState::Ready | SurfaceState::Positioned => {
                self.host.set_visible(false);
                self.state = SurfaceState::Hidden;
            }
        }
    }

    pub fn set_params(&mut self, params: &[Parameter]) {
        self.params = params.to_vec();
        self.redraw();
    }

    pub fn redraw(&mut self) {
        overlay::render(&self.params, &mut self.scene, &self.style);
        self.flush();
    }

    fn redraw_forced(&mut self) {
        overlay::render(&self.params, &mut self.scene, &self.style);
        if self.is_ready() {
            self.scene.take_dirty();
            self.host.paint(&self.scene);
        }
    }

    /// Let the caller mutate the scene (selection preview), then repaint.
    pub fn edit_scene<R>(&mut self, f: impl FnOnce(&mut Scene, &OverlayStyle) -> R) -> R {
        let out = f(&mut self.scene, &self.style);
        self.flush();
        out
    }

    /// Repaint if the scene changed since the last paint.
    pub fn flush(&mut self) {
        if self.is_ready() && self.scene.take_dirty() {
            self.host.paint(&self.scene);
        }
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        if self.cursor == cursor {
            return;
        }
        self.cursor = cursor;
        if self.is_ready() {
            self.host.set_cursor(cursor);
        }
    }

    pub fn dispose(&mut self) {
        if self.is_ready() {
            self.host.set_visible(false);
            self.host.release();
        }
        self.scene.clear();
        self.scene.take_dirty();
        self.placement = None;
        self.state = SurfaceState::Uninitialized;
    }
}
