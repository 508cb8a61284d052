//! Small browser helpers: timers, file reading, downloads, dialogs, storage.

use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use js_sys::{Array, Uint8Array};
use template_api::ApiConfig;
use template_core::config::EngineConfig;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, File, HtmlAnchorElement, Url};

const CONFIG_KEY: &str = "template-studio.config";

/// Resolve after `after` via `setTimeout`.
pub fn sleep(after: Duration) -> impl Future<Output = ()> {
    let ms = after.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let Some(win) = web_sys::window() else {
            let _ = resolve.call0(&JsValue::NULL);
            return;
        };
        let cb = Closure::once_into_js(move || {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), ms);
    });
    async move {
        let _ = JsFuture::from(promise).await;
    }
}

pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Human-readable text for a thrown JS value.
pub fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

pub fn alert(message: &str) {
    if let Some(win) = web_sys::window() {
        let _ = win.alert_with_message(message);
    }
}

pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|win| win.confirm_with_message(message).ok())
        .unwrap_or(false)
}

pub async fn read_bytes(file: &File) -> Result<Vec<u8>, String> {
    let buf = JsFuture::from(file.array_buffer()).await.map_err(|e| js_message(&e))?;
    Ok(Uint8Array::new(&buf).to_vec())
}

pub async fn read_text(file: &File) -> Result<String, String> {
    let text = JsFuture::from(file.text()).await.map_err(|e| js_message(&e))?;
    text.as_string().ok_or_else(|| "file is not text".to_string())
}

pub async fn read_data_uri(file: &File) -> Result<String, String> {
    let bytes = read_bytes(file).await?;
    let mime = match file.type_() {
        t if t.is_empty() => "application/octet-stream".to_string(),
        t => t,
    };
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// First file of an `<input type=file>` change event; clears the input so
/// picking the same file again fires another change.
pub fn take_file(ev: &web_sys::Event) -> Option<File> {
    let input = ev.target()?.dyn_into::<web_sys::HtmlInputElement>().ok()?;
    let file = input.files()?.get(0);
    input.set_value("");
    file
}

/// Offer `body` as a file download.
pub fn download(filename: &str, mime: &str, body: &str) -> Result<(), String> {
    let parts = Array::of1(&JsValue::from_str(body));
    let opts = BlobPropertyBag::new();
    opts.set_type(mime);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &opts).map_err(|e| js_message(&e))?;
    let url = Url::create_object_url_with_blob(&blob).map_err(|e| js_message(&e))?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("no document")?;
    let link: HtmlAnchorElement = document
        .create_element("a")
        .map_err(|e| js_message(&e))?
        .unchecked_into();
    link.set_href(&url);
    link.set_download(filename);
    if let Some(body_el) = document.body() {
        let _ = body_el.append_child(&link);
    }
    link.click();
    link.remove();
    let _ = Url::revoke_object_url(&url);
    Ok(())
}

pub fn local_date() -> String {
    String::from(js_sys::Date::new_0().to_locale_date_string("default", &JsValue::UNDEFINED))
}

/// Engine tunables, with any override stored in localStorage applied.
pub fn load_engine_config() -> EngineConfig {
    let stored = web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|s| s.get_item(CONFIG_KEY).ok().flatten());
    match stored {
        Some(text) => EngineConfig::from_json(&text).unwrap_or_else(|e| {
            log::warn!("ignoring {CONFIG_KEY}: {e}");
            EngineConfig::default()
        }),
        None => EngineConfig::default(),
    }
}

/// Backend location baked in at build time, defaulting to this page's origin.
pub fn api_config() -> ApiConfig {
    let mut config = ApiConfig::from_build_env();
    if config.base_url.is_empty() {
        if let Some(origin) = web_sys::window().and_then(|w| w.location().origin().ok()) {
            config.base_url = origin;
        }
    }
    config
}

/// `Param <7 random base-36 chars>` for parameters loaded without an id.
pub fn random_param_id() -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let tag: String = (0..7)
        .map(|_| DIGITS[(js_sys::Math::random() * DIGITS.len() as f64) as usize % DIGITS.len()] as char)
        .collect();
    format!("Param {tag}")
}
