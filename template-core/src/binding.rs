//! One section's overlay: the drawing surface, the selection tool, and the
//! flags that decide whether the surface is shown at all.

use crate::config::EngineConfig;
use crate::error::{SurfaceError, SyncError};
use crate::geometry::{self, LayoutProbe, Point};
use crate::model::{Anchor, Parameter};
use crate::overlay::OverlayStyle;
use crate::selection::SelectionTool;
use crate::surface::{Cursor, DrawingSurface, SurfaceHost};

pub struct SectionOverlay<H> {
    surface: DrawingSurface<H>,
    tool: SelectionTool,
    selecting: bool,
    view_only: bool,
}

impl<H: SurfaceHost> SectionOverlay<H> {
    pub fn new(host: H, config: &EngineConfig, view_only: bool) -> Self {
        let style = OverlayStyle::default().with_label_offset(config.label_offset);
        Self {
            surface: DrawingSurface::new(host, style),
            tool: SelectionTool::new(config.min_selection_extent),
            selecting: false,
            view_only,
        }
    }

    pub fn surface(&self) -> &DrawingSurface<H> {
        &self.surface
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    /// Shown while selecting, and always for read-only sections.
    pub fn wants_visible(&self) -> bool {
        self.selecting || self.view_only
    }

    pub fn initialize(&mut self) -> Result<(), SurfaceError> {
        self.surface.initialize()
    }

    /// Follow the section's selection flag. Returns true when the surface
    /// now needs to be placed.
    pub fn set_selecting(&mut self, on: bool) -> bool {
        if on == self.selecting {
            return false;
        }
        self.selecting = on;
        self.surface.set_cursor(if on && !self.view_only { Cursor::Crosshair } else { Cursor::Default });
        if !on {
            self.surface.edit_scene(|scene, _| self.tool.cancel(scene));
            if !self.view_only {
                self.surface.hide();
            }
        }
        on
    }

    /// Resolve the page image's placement and move the surface over it, or
    /// hide the surface if the section does not want it shown.
    pub fn sync(&mut self, probe: &impl LayoutProbe) -> Result<(), SyncError> {
        if !self.wants_visible() {
            self.surface.hide();
            return Ok(());
        }
        let geo = geometry::resolve(probe)?;
        self.surface.position(&geo)?;
        Ok(())
    }

    /// Scroll/resize handler. Only a visible surface is moved; returns whether
    /// it was.
    pub fn follow_layout(&mut self, probe: &impl LayoutProbe) -> bool {
        if !self.surface.is_visible() {
            return false;
        }
        match self.sync(probe) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("overlay not moved: {e}");
                false
            }
        }
    }

    pub fn show_params(&mut self, params: &[Parameter]) {
        self.surface.set_params(params);
    }

    /// The section moved to another page: any half-drawn box belongs to the
    /// old page and is dropped.
    pub fn page_changed(&mut self, params: &[Parameter]) {
        self.surface.edit_scene(|scene, _| self.tool.cancel(scene));
        self.surface.set_params(params);
    }

    fn armed(&self) -> bool {
        self.selecting && !self.view_only && self.surface.is_visible()
    }

    pub fn pointer_down(&mut self, at: Point) -> bool {
        let armed = self.armed();
        let tool = &mut self.tool;
        self.surface.edit_scene(|scene, style| tool.pointer_down(at, armed, scene, &style.preview))
    }

    pub fn pointer_move(&mut self, at: Point) -> bool {
        let tool = &mut self.tool;
        self.surface.edit_scene(|scene, _| tool.pointer_move(at, scene))
    }

    pub fn pointer_up(&mut self, at: Point, anchor: Anchor, now_ms: u64) -> Option<Parameter> {
        let tool = &mut self.tool;
        self.surface.edit_scene(|scene, _| tool.pointer_up(at, anchor, now_ms, scene))
    }

    pub fn is_dragging(&self) -> bool {
        self.tool.is_dragging()
    }

    pub fn dispose(&mut self) {
        self.surface.edit_scene(|scene, _| self.tool.cancel(scene));
        self.surface.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GeometryError, RetryError};
    use crate::geometry::Rect;
    use crate::retry::retry;
    use crate::scene::Layer;
    use crate::surface::tests::FakeHost;
    use crate::surface::SurfaceState;
    use futures::executor::block_on;
    use futures::future;
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    struct Probe {
        mounted: bool,
        decoded: bool,
    }

    impl LayoutProbe for Probe {
        fn section_box(&self) -> Option<Rect> {
            self.mounted.then(|| Rect::new(0.0, 0.0, 1400.0, 1300.0))
        }
        fn container_box(&self) -> Option<Rect> {
            self.mounted.then(|| Rect::new(10.0, 50.0, 800.0, 1131.0))
        }
        fn image_box(&self) -> Option<Rect> {
            self.mounted.then(|| Rect::new(10.0, 50.0, 800.0, 1131.0))
        }
        fn natural_size(&self) -> Option<(u32, u32)> {
            self.decoded.then_some((1600, 2262))
        }
    }

    fn ready_overlay(view_only: bool) -> SectionOverlay<FakeHost> {
        let mut overlay = SectionOverlay::new(FakeHost::mounted(), &EngineConfig::default(), view_only);
        overlay.initialize().unwrap();
        overlay
    }

    fn live() -> Probe {
        Probe { mounted: true, decoded: true }
    }

    #[test]
    fn selecting_shows_and_leaving_hides() {
        let mut overlay = ready_overlay(false);
        assert!(overlay.set_selecting(true));
        overlay.sync(&live()).unwrap();
        assert!(overlay.surface().is_visible());
        assert_eq!(overlay.surface().host().cursor, Cursor::Crosshair);
        assert_eq!(overlay.surface().placement(), Some(Rect::new(10.0, 50.0, 800.0, 1131.0)));

        assert!(!overlay.set_selecting(false));
        assert_eq!(overlay.surface().state(), SurfaceState::Hidden);
        assert_eq!(overlay.surface().host().cursor, Cursor::Default);
    }

    #[test]
    fn view_only_stays_visible_and_never_drags() {
        let mut overlay = ready_overlay(true);
        overlay.sync(&live()).unwrap();
        assert!(overlay.surface().is_visible());
        overlay.set_selecting(true);
        assert_eq!(overlay.surface().host().cursor, Cursor::Default);
        assert!(!overlay.pointer_down(Point::new(1.0, 1.0)));
        overlay.set_selecting(false);
        assert!(overlay.surface().is_visible());
    }

    #[test]
    fn drag_emits_and_cleans_up() {
        let mut overlay = ready_overlay(false);
        overlay.set_selecting(true);
        overlay.sync(&live()).unwrap();
        assert!(overlay.pointer_down(Point::new(110.0, 70.0)));
        overlay.pointer_move(Point::new(10.0, 20.0));
        assert_eq!(overlay.surface().scene().count(Layer::Preview), 1);
        let p = overlay.pointer_up(Point::new(10.0, 20.0), Anchor::Standalone, 1).unwrap();
        assert_eq!((p.x1.value(), p.y2.value()), (10.0, 70.0));
        assert_eq!(overlay.surface().scene().count(Layer::Preview), 0);
    }

    #[test]
    fn leaving_selection_mid_drag_drops_the_preview() {
        let mut overlay = ready_overlay(false);
        overlay.set_selecting(true);
        overlay.sync(&live()).unwrap();
        overlay.pointer_down(Point::new(0.0, 0.0));
        overlay.pointer_move(Point::new(60.0, 60.0));
        overlay.set_selecting(false);
        assert!(!overlay.is_dragging());
        assert_eq!(overlay.surface().scene().count(Layer::Preview), 0);
        assert_eq!(overlay.pointer_up(Point::new(60.0, 60.0), Anchor::Standalone, 1), None);
    }

    #[test]
    fn page_change_drops_the_preview_and_swaps_params() {
        let mut overlay = ready_overlay(false);
        overlay.set_selecting(true);
        overlay.sync(&live()).unwrap();
        overlay.show_params(&[Parameter::from_corners("a", (0.0, 0.0), (9.0, 9.0), Anchor::Page(1))]);
        overlay.pointer_down(Point::new(0.0, 0.0));
        overlay.page_changed(&[]);
        assert!(overlay.surface().scene().is_empty());
        assert!(!overlay.is_dragging());
    }

    #[test]
    fn pointer_is_ignored_until_positioned() {
        let mut overlay = ready_overlay(false);
        overlay.set_selecting(true);
        assert!(!overlay.pointer_down(Point::new(1.0, 1.0)));
    }

    #[test]
    fn hidden_surface_ignores_scroll() {
        let mut overlay = ready_overlay(false);
        assert!(!overlay.follow_layout(&live()));
        assert!(overlay.surface().host().placed.is_empty());
        overlay.set_selecting(true);
        overlay.sync(&live()).unwrap();
        assert!(overlay.follow_layout(&live()));
        // unmounted mid-scroll: no panic, surface left where it was
        assert!(!overlay.follow_layout(&Probe { mounted: false, decoded: true }));
        assert!(overlay.surface().is_visible());
    }

    #[test]
    fn positioning_gives_up_when_nothing_mounts() {
        let overlay = RefCell::new(SectionOverlay::new(FakeHost::default(), &EngineConfig::default(), false));
        overlay.borrow_mut().set_selecting(true);
        let probe = Probe { mounted: false, decoded: false };
        let attempts = Cell::new(0);
        let policy = EngineConfig::default().surface_position;
        let result = block_on(retry(
            policy,
            "position overlay",
            |_| -> Result<(), SyncError> {
                attempts.set(attempts.get() + 1);
                let mut o = overlay.borrow_mut();
                o.initialize()?;
                o.sync(&probe)
            },
            |_: Duration| future::ready(()),
        ));
        assert_eq!(attempts.get(), policy.max_attempts);
        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 50, .. })));
        let o = overlay.borrow();
        assert!(!o.surface().is_visible());
        assert_eq!(o.surface().state(), SurfaceState::Uninitialized);
    }

    #[test]
    fn undecoded_image_is_retried_until_decoded() {
        let overlay = RefCell::new(ready_overlay(false));
        overlay.borrow_mut().set_selecting(true);
        let attempts = Cell::new(0);
        let result = block_on(retry(
            EngineConfig::default().image_wait,
            "wait for page image",
            |n| {
                attempts.set(n);
                let probe = Probe { mounted: true, decoded: n >= 4 };
                overlay.borrow_mut().sync(&probe)
            },
            |_: Duration| future::ready(()),
        ));
        assert_eq!(result, Ok(()));
        assert_eq!(attempts.get(), 4);
        assert!(overlay.borrow().surface().is_visible());
    }

    #[test]
    fn sync_reports_geometry_errors() {
        let mut overlay = ready_overlay(false);
        overlay.set_selecting(true);
        assert_eq!(
            overlay.sync(&Probe { mounted: true, decoded: false }),
            Err(SyncError::Geometry(GeometryError::NotDecoded))
        );
    }
}
