use leptos::html;
use leptos::prelude::*;
use template_core::geometry::{LayoutProbe, Rect};
use web_sys::{Element, HtmlElement, HtmlImageElement};

fn viewport_box(el: &Element) -> Option<Rect> {
    if !el.is_connected() {
        return None;
    }
    let r = el.get_bounding_client_rect();
    Some(Rect::new(r.left(), r.top(), r.width(), r.height()))
}

/// Node refs of the elements one section's overlay is laid against.
#[derive(Clone, Copy)]
pub struct SectionRefs {
    pub root: NodeRef<html::Div>,
    pub container: NodeRef<html::Div>,
    pub image: NodeRef<html::Img>,
}

impl SectionRefs {
    pub fn new() -> Self {
        Self { root: NodeRef::new(), container: NodeRef::new(), image: NodeRef::new() }
    }

    /// Snapshot the live elements; `None` while any is unmounted.
    pub fn probe(&self) -> Option<DomLayout> {
        Some(DomLayout {
            section: self.root.get_untracked()?.into(),
            container: self.container.get_untracked()?.into(),
            image: self.image.get_untracked()?,
        })
    }
}

pub struct DomLayout {
    section: HtmlElement,
    container: HtmlElement,
    image: HtmlImageElement,
}

impl LayoutProbe for DomLayout {
    fn section_box(&self) -> Option<Rect> {
        viewport_box(&self.section)
    }

    fn container_box(&self) -> Option<Rect> {
        viewport_box(&self.container)
    }

    fn image_box(&self) -> Option<Rect> {
        viewport_box(&self.image)
    }

    fn natural_size(&self) -> Option<(u32, u32)> {
        let img = &self.image;
        (img.complete() && img.natural_width() > 0 && img.natural_height() > 0)
            .then(|| (img.natural_width(), img.natural_height()))
    }
}
