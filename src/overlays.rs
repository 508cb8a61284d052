//! Per-section overlay engines and open documents.
//!
//! Both hold DOM/JS objects, so they live in thread-locals keyed by
//! `(Scope, SectionId)` rather than in signals.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use template_core::binding::SectionOverlay;
use template_core::config::EngineConfig;
use template_core::documents::DocumentHandle;
use template_core::geometry::LayoutProbe;
use template_core::retry::retry;
use template_core::{GeometryError, SectionId, SurfaceError, SyncError};

use crate::canvas::{CanvasHost, SectionRefs};
use crate::dom;
use crate::state::Scope;

pub type OverlayKey = (Scope, SectionId);

thread_local! {
    static OVERLAYS: RefCell<HashMap<OverlayKey, SectionOverlay<CanvasHost>>> = RefCell::new(HashMap::new());
    static DOCUMENTS: RefCell<HashMap<OverlayKey, Rc<dyn DocumentHandle>>> = RefCell::new(HashMap::new());
}

pub fn register(key: OverlayKey, overlay: SectionOverlay<CanvasHost>) {
    OVERLAYS.with(|m| {
        if let Some(mut old) = m.borrow_mut().insert(key, overlay) {
            old.dispose();
        }
    });
}

pub fn unregister(key: OverlayKey) {
    // take it out first so dispose runs without the map borrowed
    let removed = OVERLAYS.with(|m| m.borrow_mut().remove(&key));
    if let Some(mut overlay) = removed {
        overlay.dispose();
    }
}

/// Run `f` against the section's overlay, if it has one. `f` must not call
/// back into this module.
pub fn with_overlay<R>(key: OverlayKey, f: impl FnOnce(&mut SectionOverlay<CanvasHost>) -> R) -> Option<R> {
    OVERLAYS.with(|m| m.borrow_mut().get_mut(&key).map(f))
}

pub fn set_document(key: OverlayKey, doc: Rc<dyn DocumentHandle>) {
    DOCUMENTS.with(|m| m.borrow_mut().insert(key, doc));
}

pub fn document(key: OverlayKey) -> Option<Rc<dyn DocumentHandle>> {
    DOCUMENTS.with(|m| m.borrow().get(&key).cloned())
}

pub fn drop_document(key: OverlayKey) {
    DOCUMENTS.with(|m| m.borrow_mut().remove(&key));
}

/// Bind the canvas once it has layout: short settle delay, then bounded
/// retries.
pub async fn initialize(key: OverlayKey, config: &EngineConfig) -> bool {
    dom::sleep(std::time::Duration::from_millis(config.surface_init_delay_ms as u64)).await;
    let result = retry(
        config.surface_init,
        "bind drawing surface",
        |_| with_overlay(key, |o| o.initialize()).unwrap_or(Err(SurfaceError::NotMounted)),
        dom::sleep,
    )
    .await;
    result.is_ok()
}

fn sync_once(key: OverlayKey, refs: &SectionRefs) -> Result<(), SyncError> {
    let probe = refs.probe().ok_or(GeometryError::NotMounted("section"))?;
    with_overlay(key, |o| {
        o.initialize()?;
        o.sync(&probe)
    })
    .unwrap_or(Err(SyncError::Surface(SurfaceError::NotMounted)))
}

/// Wait for the page image to decode, then place the overlay over it. Does
/// nothing for a section that does not want its overlay shown. Gives up
/// quietly; the surface keeps its last state.
pub async fn sync(key: OverlayKey, refs: SectionRefs, config: &EngineConfig) {
    if !with_overlay(key, |o| o.wants_visible()).unwrap_or(false) {
        return;
    }
    let decoded = retry(
        config.image_wait,
        "wait for page image",
        |_| match refs.probe() {
            Some(probe) if probe.natural_size().is_some() => Ok(()),
            Some(_) => Err(GeometryError::NotDecoded),
            None => Err(GeometryError::NotMounted("page image")),
        },
        dom::sleep,
    )
    .await;
    if decoded.is_ok() {
        let _ = retry(config.surface_position, "position overlay", |_| sync_once(key, &refs), dom::sleep).await;
    }
}

/// Scroll/resize: move a visible overlay along with its image.
pub fn follow(key: OverlayKey, refs: &SectionRefs) {
    if let Some(probe) = refs.probe() {
        with_overlay(key, |o| o.follow_layout(&probe));
    }
}
