//! Opening documents and rasterising their pages, with every wait bounded.
//!
//! The actual decoder lives behind [`DocumentRenderer`]; the web crate
//! implements it over pdf.js. Timers are injected like in [`crate::retry`].

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::EngineConfig;
use crate::error::{LoadError, RenderError};
use crate::retry::with_timeout;
use crate::section::DocumentInfo;

/// A rendered page, ready to use as an image source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

#[async_trait(?Send)]
pub trait DocumentRenderer {
    async fn open(&self, bytes: Vec<u8>) -> Result<Rc<dyn DocumentHandle>, LoadError>;
}

#[async_trait(?Send)]
pub trait DocumentHandle {
    fn page_count(&self) -> u32;
    /// Rasterise 1-based `page` at `scale` (1.0 = 72 dpi).
    async fn render(&self, page: u32, scale: f64) -> Result<RasterImage, RenderError>;
}

pub struct LoadedDocument {
    pub handle: Rc<dyn DocumentHandle>,
    pub info: DocumentInfo,
    pub first_page: RasterImage,
}

/// Decode `bytes` and render page 1 for the editor.
pub async fn load_document<R, T, F>(
    renderer: &R,
    filename: &str,
    bytes: Vec<u8>,
    config: &EngineConfig,
    timer: T,
) -> Result<LoadedDocument, LoadError>
where
    R: DocumentRenderer + ?Sized,
    T: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let handle = open_document(renderer, bytes, config, &timer).await?;
    let total_pages = handle.page_count();
    log::info!("opened {filename}: {total_pages} pages");
    let first_page = render_page(handle.as_ref(), 1, config.editor_render_scale, config, &timer).await?;
    Ok(LoadedDocument {
        handle,
        info: DocumentInfo { filename: filename.to_string(), total_pages },
        first_page,
    })
}

/// Decode `bytes` within the load timeout. Documents without pages are
/// rejected.
pub async fn open_document<R, T, F>(
    renderer: &R,
    bytes: Vec<u8>,
    config: &EngineConfig,
    timer: T,
) -> Result<Rc<dyn DocumentHandle>, LoadError>
where
    R: DocumentRenderer + ?Sized,
    T: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let after = config.document_load_timeout();
    let handle = with_timeout("document load", after, renderer.open(bytes), timer(after)).await??;
    if handle.page_count() == 0 {
        return Err(LoadError::Empty);
    }
    Ok(handle)
}

pub async fn render_page<T, F>(
    doc: &dyn DocumentHandle,
    page: u32,
    scale: f64,
    config: &EngineConfig,
    timer: &T,
) -> Result<RasterImage, RenderError>
where
    T: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let total = doc.page_count();
    if page < 1 || page > total {
        return Err(RenderError::InvalidPage { page, total });
    }
    let after = config.page_render_timeout();
    with_timeout("page render", after, doc.render(page, scale), timer(after)).await?
}

/// Render every page in order, reporting `(done, total)` after each one.
pub async fn render_all_pages<T, F>(
    doc: &dyn DocumentHandle,
    scale: f64,
    config: &EngineConfig,
    timer: &T,
    mut progress: impl FnMut(u32, u32),
) -> Result<Vec<RasterImage>, RenderError>
where
    T: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let total = doc.page_count();
    let mut pages = Vec::with_capacity(total as usize);
    for page in 1..=total {
        pages.push(render_page(doc, page, scale, config, timer).await?);
        progress(page, total);
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetryError;
    use futures::executor::block_on;
    use futures::future;
    use std::cell::RefCell;

    struct FakeDoc {
        pages: u32,
        hang_on: Option<u32>,
        rendered: RefCell<Vec<(u32, f64)>>,
    }

    #[async_trait(?Send)]
    impl DocumentHandle for FakeDoc {
        fn page_count(&self) -> u32 {
            self.pages
        }

        async fn render(&self, page: u32, scale: f64) -> Result<RasterImage, RenderError> {
            if self.hang_on == Some(page) {
                future::pending::<()>().await;
            }
            self.rendered.borrow_mut().push((page, scale));
            Ok(RasterImage {
                data_uri: format!("data:image/png;base64,page{page}"),
                width: (600.0 * scale) as u32,
                height: (800.0 * scale) as u32,
            })
        }
    }

    enum FakeRenderer {
        Pages(u32, Option<u32>),
        Corrupt,
        Hang,
    }

    #[async_trait(?Send)]
    impl DocumentRenderer for FakeRenderer {
        async fn open(&self, _bytes: Vec<u8>) -> Result<Rc<dyn DocumentHandle>, LoadError> {
            match self {
                FakeRenderer::Pages(pages, hang_on) => {
                    let doc: Rc<dyn DocumentHandle> = Rc::new(FakeDoc {
                        pages: *pages,
                        hang_on: *hang_on,
                        rendered: RefCell::new(Vec::new()),
                    });
                    Ok(doc)
                }
                FakeRenderer::Corrupt => Err(LoadError::Corrupt("Invalid PDF structure".into())),
                FakeRenderer::Hang => future::pending().await,
            }
        }
    }

    fn never(_: Duration) -> future::Pending<()> {
        future::pending()
    }

    fn now(_: Duration) -> future::Ready<()> {
        future::ready(())
    }

    #[test]
    fn loads_and_renders_first_page_at_editor_scale() {
        let cfg = EngineConfig::default();
        let doc = block_on(load_document(&FakeRenderer::Pages(3, None), "invoice.pdf", vec![1, 2], &cfg, never)).unwrap();
        assert_eq!(doc.info, DocumentInfo { filename: "invoice.pdf".into(), total_pages: 3 });
        assert_eq!(doc.first_page.data_uri, "data:image/png;base64,page1");
        assert_eq!((doc.first_page.width, doc.first_page.height), (900, 1200));
    }

    #[test]
    fn corrupt_input_is_a_load_error() {
        let cfg = EngineConfig::default();
        let r = block_on(load_document(&FakeRenderer::Corrupt, "x.pdf", Vec::new(), &cfg, never));
        assert!(matches!(r, Err(LoadError::Corrupt(_))));
    }

    #[test]
    fn hung_open_times_out() {
        let cfg = EngineConfig::default();
        let r = block_on(load_document(&FakeRenderer::Hang, "x.pdf", Vec::new(), &cfg, now));
        assert!(matches!(
            r,
            Err(LoadError::Timeout(RetryError::TimedOut { what: "document load", .. }))
        ));
    }

    #[test]
    fn empty_document_is_rejected() {
        let cfg = EngineConfig::default();
        let r = block_on(load_document(&FakeRenderer::Pages(0, None), "x.pdf", Vec::new(), &cfg, never));
        assert!(matches!(r, Err(LoadError::Empty)));
    }

    #[test]
    fn open_alone_renders_nothing() {
        let cfg = EngineConfig::default();
        let doc = block_on(open_document(&FakeRenderer::Pages(4, None), Vec::new(), &cfg, never)).unwrap();
        assert_eq!(doc.page_count(), 4);
        let r = block_on(open_document(&FakeRenderer::Pages(0, None), Vec::new(), &cfg, never));
        assert!(matches!(r, Err(LoadError::Empty)));
    }

    #[test]
    fn hung_first_page_fails_the_load() {
        let cfg = EngineConfig::default();
        let r = block_on(load_document(&FakeRenderer::Pages(2, Some(1)), "x.pdf", Vec::new(), &cfg, now));
        assert!(matches!(r, Err(LoadError::FirstPage(RenderError::Timeout(_)))));
    }

    #[test]
    fn out_of_range_pages_are_not_rendered() {
        let cfg = EngineConfig::default();
        let doc = FakeDoc { pages: 2, hang_on: None, rendered: RefCell::new(Vec::new()) };
        for page in [0, 3] {
            let r = block_on(render_page(&doc, page, 1.0, &cfg, &never));
            assert_eq!(r, Err(RenderError::InvalidPage { page, total: 2 }));
        }
        assert!(doc.rendered.borrow().is_empty());
    }

    #[test]
    fn all_pages_in_order_with_progress() {
        let cfg = EngineConfig::default();
        let doc = FakeDoc { pages: 3, hang_on: None, rendered: RefCell::new(Vec::new()) };
        let mut seen = Vec::new();
        let pages = block_on(render_all_pages(&doc, 1.0, &cfg, &never, |done, total| seen.push((done, total)))).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(*doc.rendered.borrow(), vec![(1, 1.0), (2, 1.0), (3, 1.0)]);
    }
}
