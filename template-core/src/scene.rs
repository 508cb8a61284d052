//! Retained list of shapes drawn on a drawing surface.
//!
//! Two layers: parameter boxes (owned by the overlay renderer, rebuilt
//! wholesale) and the in-progress selection preview (owned by the selection
//! state machine). Clearing one never touches the other. Shapes are inert:
//! they are painted, never hit-tested.

use crate::geometry::{Point, Rect};

pub type ShapeId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Params,
    Preview,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoxStyle {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    /// Empty for a solid stroke.
    pub dash: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// CSS font shorthand.
    pub font: String,
    pub fill: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    Box { rect: Rect, style: BoxStyle },
    /// `at` is the alphabetic baseline start.
    Label { at: Point, text: String, style: TextStyle },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub id: ShapeId,
    pub layer: Layer,
    pub kind: ShapeKind,
}

#[derive(Debug, Default)]
pub struct Scene {
    shapes: Vec<Shape>,
    next_id: ShapeId,
    dirty: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, layer: Layer, kind: ShapeKind) -> ShapeId {
        self.next_id += 1;
        let id = self.next_id;
        self.shapes.push(Shape { id, layer, kind });
        self.dirty = true;
        id
    }

    /// Move/resize a box shape. Returns false if `id` is gone or not a box.
    pub fn set_box(&mut self, id: ShapeId, rect: Rect) -> bool {
        let Some(shape) = self.shapes.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        match &mut shape.kind {
            ShapeKind::Box { rect: r, .. } => {
                *r = rect;
                self.dirty = true;
                true
            }
            ShapeKind::Label { .. } => false,
        }
    }

    pub fn remove(&mut self, id: ShapeId) -> bool {
        let before = self.shapes.len();
        self.shapes.retain(|s| s.id != id);
        let removed = self.shapes.len() != before;
        self.dirty |= removed;
        removed
    }

    pub fn clear_layer(&mut self, layer: Layer) -> usize {
        let before = self.shapes.len();
        self.shapes.retain(|s| s.layer != layer);
        let removed = before - self.shapes.len();
        self.dirty |= removed > 0;
        removed
    }

    pub fn clear(&mut self) {
        self.dirty |= !self.shapes.is_empty();
        self.shapes.clear();
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn count(&self, layer: Layer) -> usize {
        self.shapes.iter().filter(|s| s.layer == layer).count()
    }

    /// Parameter shapes first, preview on top.
    pub fn paint_order(&self) -> impl Iterator<Item = &Shape> {
        self.shapes
            .iter()
            .filter(|s| s.layer == Layer::Params)
            .chain(self.shapes.iter().filter(|s| s.layer == Layer::Preview))
    }

    /// Whether anything changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
