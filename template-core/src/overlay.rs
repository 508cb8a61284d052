use crate::geometry::{Point, Rect};
use crate::model::Parameter;
use crate::scene::{BoxStyle, Layer, Scene, ShapeKind, TextStyle};

/// Colours and fonts used on the drawing surface.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayStyle {
    pub param_box: BoxStyle,
    pub label: TextStyle,
    pub label_offset: (f64, f64),
    pub preview: BoxStyle,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            param_box: BoxStyle {
                fill: "rgba(255, 0, 255, 0.2)".into(),
                stroke: "magenta".into(),
                stroke_width: 2.0,
                dash: Vec::new(),
            },
            label: TextStyle { font: "bold 16px Arial".into(), fill: "cyan".into() },
            label_offset: (5.0, 16.0),
            preview: BoxStyle {
                fill: "rgba(0, 0, 255, 0.2)".into(),
                stroke: "blue".into(),
                stroke_width: 2.0,
                dash: vec![5.0, 5.0],
            },
        }
    }
}

impl OverlayStyle {
    pub fn with_label_offset(mut self, offset: (f64, f64)) -> Self {
        self.label_offset = offset;
        self
    }
}

/// Replace every parameter shape in `scene` with one box and one label per
/// entry of `params`. The selection preview layer is left alone, and calling
/// this repeatedly with the same list yields the same scene.
pub fn render(params: &[Parameter], scene: &mut Scene, style: &OverlayStyle) {
    scene.clear_layer(Layer::Params);
    for param in params {
        let rect: Rect = param.rect();
        scene.add(
            Layer::Params,
            ShapeKind::Box { rect, style: style.param_box.clone() },
        );
        scene.add(
            Layer::Params,
            ShapeKind::Label {
                at: Point::new(rect.left + style.label_offset.0, rect.top + style.label_offset.1),
                text: param.id.clone(),
                style: style.label.clone(),
            },
        );
    }
}
