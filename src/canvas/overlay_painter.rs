use template_core::geometry::Rect;
use template_core::scene::{BoxStyle, Scene, ShapeKind};
use template_core::surface::{Cursor, SurfaceHost};
use template_core::SurfaceError;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement};

use crate::dom::js_message;

/// The overlay canvas plus the absolutely-positioned wrapper that carries it
/// over the page image.
pub struct CanvasHost {
    wrapper: HtmlElement,
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
}

impl CanvasHost {
    pub fn new(wrapper: HtmlElement, canvas: HtmlCanvasElement) -> Self {
        Self { wrapper, canvas, ctx: None }
    }

    fn style(el: &HtmlElement, prop: &str, value: &str) {
        if let Err(e) = el.style().set_property(prop, value) {
            log::debug!("style {prop}: {}", js_message(&e));
        }
    }
}

fn paint_box(ctx: &CanvasRenderingContext2d, rect: &Rect, style: &BoxStyle) {
    ctx.set_fill_style_str(&style.fill);
    ctx.fill_rect(rect.left, rect.top, rect.width, rect.height);

    let dash = js_sys::Array::new();
    for d in &style.dash {
        dash.push(&JsValue::from_f64(*d));
    }
    let _ = ctx.set_line_dash(&dash);
    ctx.set_stroke_style_str(&style.stroke);
    ctx.set_line_width(style.stroke_width);
    ctx.stroke_rect(rect.left, rect.top, rect.width, rect.height);
}

impl SurfaceHost for CanvasHost {
    fn element_size(&self) -> Option<(f64, f64)> {
        if !self.canvas.is_connected() {
            return None;
        }
        let el: &HtmlElement = self.canvas.unchecked_ref();
        Some((el.offset_width() as f64, el.offset_height() as f64))
    }

    fn bind(&mut self, width: f64, height: f64) -> Result<(), SurfaceError> {
        let ctx = self
            .canvas
            .get_context("2d")
            .map_err(|e| SurfaceError::Context(js_message(&e)))?
            .ok_or_else(|| SurfaceError::Context("no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SurfaceError::Context("not a 2d context".into()))?;
        self.canvas.set_width(width.round() as u32);
        self.canvas.set_height(height.round() as u32);
        self.ctx = Some(ctx);
        Ok(())
    }

    fn place(&mut self, rect: Rect) {
        Self::style(&self.wrapper, "left", &format!("{}px", rect.left));
        Self::style(&self.wrapper, "top", &format!("{}px", rect.top));
        Self::style(&self.wrapper, "width", &format!("{}px", rect.width));
        Self::style(&self.wrapper, "height", &format!("{}px", rect.height));
        let el: &HtmlElement = self.canvas.unchecked_ref();
        Self::style(el, "width", &format!("{}px", rect.width));
        Self::style(el, "height", &format!("{}px", rect.height));
        // backing store matches CSS size so pointer offsets are canvas pixels
        self.canvas.set_width(rect.width.round().max(1.0) as u32);
        self.canvas.set_height(rect.height.round().max(1.0) as u32);
    }

    fn set_visible(&mut self, visible: bool) {
        Self::style(&self.wrapper, "visibility", if visible { "visible" } else { "hidden" });
        Self::style(&self.wrapper, "pointer-events", if visible { "auto" } else { "none" });
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        Self::style(self.canvas.unchecked_ref(), "cursor", cursor.as_css());
    }

    fn paint(&mut self, scene: &Scene) {
        let Some(ctx) = &self.ctx else { return };
        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
        ctx.clear_rect(0.0, 0.0, w, h);
        for shape in scene.paint_order() {
            match &shape.kind {
                ShapeKind::Box { rect, style } => paint_box(ctx, rect, style),
                ShapeKind::Label { at, text, style } => {
                    ctx.set_font(&style.font);
                    ctx.set_fill_style_str(&style.fill);
                    let _ = ctx.fill_text(text, at.x, at.y);
                }
            }
        }
        let _ = ctx.set_line_dash(&js_sys::Array::new());
    }

    fn release(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
            ctx.clear_rect(0.0, 0.0, w, h);
        }
    }
}
