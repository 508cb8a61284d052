//! Drag-to-create on a drawing surface.
//!
//! `Idle` until a pointer goes down while the section is selecting, then
//! `Dragging` with a preview box until the pointer comes up. The drag state is
//! a plain `Option<Drag>` owned here; nothing is stashed on the surface.

use crate::geometry::{Point, Rect};
use crate::model::{Anchor, Parameter};
use crate::scene::{BoxStyle, Layer, Scene, ShapeId, ShapeKind};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Drag {
    anchor: Point,
    preview: ShapeId,
}

/// Hands out `Param <n>` ids. `n` follows the wall clock in milliseconds but
/// never repeats within one source, even for two drags in the same tick.
#[derive(Clone, Debug, Default)]
pub struct ParamIdSource {
    last: u64,
}

impl ParamIdSource {
    pub fn next(&mut self, now_ms: u64) -> String {
        let n = now_ms.max(self.last + 1);
        self.last = n;
        format!("Param {n}")
    }
}

#[derive(Debug)]
pub struct SelectionTool {
    drag: Option<Drag>,
    min_extent: f64,
    ids: ParamIdSource,
}

impl SelectionTool {
    pub fn new(min_extent: f64) -> Self {
        Self { drag: None, min_extent, ids: ParamIdSource::default() }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start a drag at `at` (surface-local). Ignored unless `armed`.
    pub fn pointer_down(&mut self, at: Point, armed: bool, scene: &mut Scene, style: &BoxStyle) -> bool {
        if !armed {
            return false;
        }
        // a lost pointerup leaves a stale drag behind
        self.cancel(scene);
        let preview = scene.add(
            Layer::Preview,
            ShapeKind::Box { rect: Rect::new(at.x, at.y, 0.0, 0.0), style: style.clone() },
        );
        self.drag = Some(Drag { anchor: at, preview });
        true
    }

    pub fn pointer_move(&mut self, at: Point, scene: &mut Scene) -> bool {
        match self.drag {
            Some(drag) => scene.set_box(drag.preview, Rect::from_corners((drag.anchor.x, drag.anchor.y), (at.x, at.y))),
            None => false,
        }
    }

    /// Finish the drag. The preview is always removed; a parameter comes back
    /// only when the box is larger than the minimum extent on both axes.
    pub fn pointer_up(&mut self, at: Point, anchor: Anchor, now_ms: u64, scene: &mut Scene) -> Option<Parameter> {
        let drag = self.drag.take()?;
        scene.remove(drag.preview);
        let a = (drag.anchor.x, drag.anchor.y);
        let b = (at.x, at.y);
        let rect = Rect::from_corners(a, b);
        if rect.width > self.min_extent && rect.height > self.min_extent {
            Some(Parameter::from_corners(self.ids.next(now_ms), a, b, anchor))
        } else {
            log::debug!("drag of {:.1}x{:.1} ignored as a click", rect.width, rect.height);
            None
        }
    }

    /// Abandon an in-flight drag without emitting anything.
    pub fn cancel(&mut self, scene: &mut Scene) -> bool {
        match self.drag.take() {
            Some(drag) => {
                scene.remove(drag.preview);
                true
            }
            None => false,
        }
    }
}
