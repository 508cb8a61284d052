pub mod layout;
pub mod overlay_painter;

pub use layout::{DomLayout, SectionRefs};
pub use overlay_painter::CanvasHost;
