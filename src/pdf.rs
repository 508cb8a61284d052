//! pdf.js behind the core's document traits. `pdfjsLib` is loaded as a
//! global by index.html.

use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Object, Promise, Reflect, Uint8Array};
use template_core::documents::{DocumentHandle, DocumentRenderer, RasterImage};
use template_core::{LoadError, RenderError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::dom::js_message;

#[wasm_bindgen]
extern "C" {
    type LoadingTask;

    #[wasm_bindgen(js_namespace = pdfjsLib, js_name = getDocument, catch)]
    fn get_document(src: &JsValue) -> Result<LoadingTask, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn promise(this: &LoadingTask) -> Promise;

    type PdfDocument;

    #[wasm_bindgen(method, getter, js_name = numPages)]
    fn num_pages(this: &PdfDocument) -> u32;

    #[wasm_bindgen(method, js_name = getPage)]
    fn get_page(this: &PdfDocument, page: u32) -> Promise;

    type PdfPage;

    #[wasm_bindgen(method, js_name = getViewport)]
    fn get_viewport(this: &PdfPage, params: &JsValue) -> Viewport;

    #[wasm_bindgen(method, catch)]
    fn render(this: &PdfPage, params: &JsValue) -> Result<RenderTask, JsValue>;

    type Viewport;

    #[wasm_bindgen(method, getter)]
    fn width(this: &Viewport) -> f64;

    #[wasm_bindgen(method, getter)]
    fn height(this: &Viewport) -> f64;

    type RenderTask;

    #[wasm_bindgen(method, getter = promise)]
    fn done(this: &RenderTask) -> Promise;
}

fn object(entries: &[(&str, &JsValue)]) -> Result<JsValue, JsValue> {
    let obj = Object::new();
    for (key, value) in entries {
        Reflect::set(&obj, &JsValue::from_str(key), value)?;
    }
    Ok(obj.into())
}

pub struct PdfJsRenderer;

#[async_trait(?Send)]
impl DocumentRenderer for PdfJsRenderer {
    async fn open(&self, bytes: Vec<u8>) -> Result<Rc<dyn DocumentHandle>, LoadError> {
        let data = JsValue::from(Uint8Array::from(bytes.as_slice()));
        let src = object(&[("data", &data)]).map_err(|e| LoadError::Read(js_message(&e)))?;
        let task = get_document(&src).map_err(|e| LoadError::Corrupt(js_message(&e)))?;
        let doc = JsFuture::from(task.promise())
            .await
            .map_err(|e| LoadError::Corrupt(js_message(&e)))?;
        let doc: Rc<dyn DocumentHandle> = Rc::new(PdfJsDocument { doc: doc.unchecked_into() });
        Ok(doc)
    }
}

pub struct PdfJsDocument {
    doc: PdfDocument,
}

impl PdfJsDocument {
    async fn rasterise(&self, page: u32, scale: f64) -> Result<RasterImage, JsValue> {
        let handle: PdfPage = JsFuture::from(self.doc.get_page(page)).await?.unchecked_into();
        let viewport = handle.get_viewport(&object(&[("scale", &JsValue::from_f64(scale))])?);
        let (width, height) = (viewport.width().floor() as u32, viewport.height().floor() as u32);

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = document.create_element("canvas")?.unchecked_into();
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .unchecked_into();

        let (ctx, viewport): (&JsValue, &JsValue) = (&ctx, &viewport);
        let params = object(&[("canvasContext", ctx), ("viewport", viewport)])?;
        JsFuture::from(handle.render(&params)?.done()).await?;

        let data_uri = canvas.to_data_url_with_type("image/png")?;
        Ok(RasterImage { data_uri, width, height })
    }
}

#[async_trait(?Send)]
impl DocumentHandle for PdfJsDocument {
    fn page_count(&self) -> u32 {
        self.doc.num_pages()
    }

    async fn render(&self, page: u32, scale: f64) -> Result<RasterImage, RenderError> {
        self.rasterise(page, scale).await.map_err(|e| {
            let reason = js_message(&e);
            log::error!("pdf.js failed on page {page}: {reason}");
            RenderError::Failed { page, reason }
        })
    }
}
