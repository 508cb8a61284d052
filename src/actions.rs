//! Async section operations triggered from the UI.
//!
//! Each one reads what it needs from the workspace, awaits with no borrow
//! held, and only then commits. On failure the user is told and the section
//! is left as it was.

use std::time::Duration;

use leptos::prelude::*;
use template_api::PageUpload;
use template_core::documents::{self, RasterImage};
use template_core::template::{DataUri, TemplateFile};
use template_core::{EditError, InputError, LoadError, Section, SectionId, Workspace};
use web_sys::File;

use crate::canvas::SectionRefs;
use crate::dom;
use crate::overlays::{self, OverlayKey};
use crate::pdf::PdfJsRenderer;
use crate::state::{AppState, Scope};

/// Everything a section's components share.
#[derive(Clone, Copy)]
pub struct SectionSlot {
    pub scope: Scope,
    pub id: SectionId,
    pub refs: SectionRefs,
    /// Bumped whenever the overlay should be re-placed over its image.
    pub resync: RwSignal<u32>,
}

impl SectionSlot {
    pub fn new(scope: Scope, id: SectionId) -> Self {
        Self { scope, id, refs: SectionRefs::new(), resync: RwSignal::new(0) }
    }

    pub fn key(&self) -> OverlayKey {
        (self.scope, self.id)
    }

    pub fn workspace(&self, state: &AppState) -> RwSignal<Workspace> {
        state.workspace(self.scope)
    }

    /// Tracked read of this section.
    pub fn with<R>(&self, state: &AppState, f: impl FnOnce(&Section) -> R) -> Option<R> {
        self.workspace(state).with(|w| w.section(self.id).map(f))
    }

    pub fn read<R>(&self, state: &AppState, f: impl FnOnce(&Section) -> R) -> Option<R> {
        self.workspace(state).with_untracked(|w| w.section(self.id).map(f))
    }

    pub fn edit<R>(&self, state: &AppState, f: impl FnOnce(&mut Section) -> Result<R, EditError>) -> Result<R, EditError> {
        let mut out = Err(EditError::UnknownSection(self.id));
        self.workspace(state).update(|w| {
            out = w.section_mut(self.id).and_then(f);
        });
        out
    }

    pub fn request_sync(&self) {
        self.resync.update(|n| *n = n.wrapping_add(1));
    }
}

fn is_pdf(file: &File) -> bool {
    file.type_() == "application/pdf" || file.name().to_ascii_lowercase().ends_with(".pdf")
}

pub async fn import_file(state: AppState, slot: SectionSlot, file: File) {
    if is_pdf(&file) {
        import_pdf(state, slot, file).await;
    } else if file.type_().starts_with("image/") {
        import_image(state, slot, file).await;
    } else {
        let err = InputError::WrongFileType { expected: "an image or a PDF", got: file.type_() };
        dom::alert(&err.to_string());
    }
}

async fn import_image(state: AppState, slot: SectionSlot, file: File) {
    let data_uri = match dom::read_data_uri(&file).await {
        Ok(uri) => uri,
        Err(e) => {
            log::error!("reading {}: {e}", file.name());
            dom::alert(&LoadError::Read(e).to_string());
            return;
        }
    };
    overlays::drop_document(slot.key());
    let _ = slot.edit(&state, |s| {
        s.import_image(RasterImage { data_uri, width: 0, height: 0 });
        Ok(())
    });
    log::info!("section {}: imported image {}", slot.id, file.name());
}

async fn import_pdf(state: AppState, slot: SectionSlot, file: File) {
    let _busy = state.busy("Loading PDF...");
    let config = state.config.get_value();
    let name = file.name();

    let bytes = match dom::read_bytes(&file).await {
        Ok(b) => b,
        Err(e) => {
            log::error!("reading {name}: {e}");
            dom::alert(&LoadError::Read(e).to_string());
            return;
        }
    };
    match documents::load_document(&PdfJsRenderer, &name, bytes, &config, dom::sleep).await {
        Ok(loaded) => {
            overlays::set_document(slot.key(), loaded.handle);
            let _ = slot.edit(&state, |s| {
                s.apply_document(loaded.info, loaded.first_page);
                Ok(())
            });
        }
        Err(e) => {
            log::error!("loading {name}: {e}");
            dom::alert(&format!("Failed to load PDF: {e}"));
        }
    }
}

/// Show `page`, rendering it first if it was never rendered. The page number
/// does not move unless the image is in hand.
pub async fn change_page(state: AppState, slot: SectionSlot, page: u32) {
    let config = state.config.get_value();
    let Some((valid, cached)) = slot.read(&state, |s| (s.validate_page(page), s.page_images.contains_key(&page)))
    else {
        return;
    };
    if let Err(e) = valid {
        log::debug!("section {}: {e}", slot.id);
        return;
    }

    if !cached {
        let Some(doc) = overlays::document(slot.key()) else {
            dom::alert(&EditError::PageNotRendered(page).to_string());
            return;
        };
        let _busy = state.busy(format!("Rendering page {page}..."));
        match documents::render_page(doc.as_ref(), page, config.editor_render_scale, &config, &dom::sleep).await {
            Ok(image) => {
                let _ = slot.edit(&state, |s| {
                    s.store_page(page, image);
                    Ok(())
                });
            }
            Err(e) => {
                log::error!("section {}: {e}", slot.id);
                dom::alert(&format!("Could not render page {page}: {e}"));
                return;
            }
        }
    }

    if let Err(e) = slot.edit(&state, |s| s.change_page(page)) {
        dom::alert(&e.to_string());
        return;
    }
    dom::sleep(Duration::from_millis(config.page_settle_ms as u64)).await;
    slot.request_sync();
}

pub fn save_local(state: &AppState, slot: SectionSlot) {
    let config = state.config.get_value();
    let description = format!("Template created on {}", dom::local_date());
    let Some(file) = slot.read(state, |s| TemplateFile::from_section(s, description, config.default_page_size)) else {
        return;
    };
    let json = match file.and_then(|f| f.to_json_pretty()) {
        Ok(json) => json,
        Err(e) => {
            dom::alert(&e.to_string());
            return;
        }
    };
    let filename = format!("template_{}.json", dom::now_ms());
    match dom::download(&filename, "application/json", &json) {
        Ok(()) => log::info!("saved {filename}"),
        Err(e) => {
            log::error!("download {filename}: {e}");
            dom::alert(&format!("Could not save template: {e}"));
        }
    }
}

pub async fn load_local(state: AppState, slot: SectionSlot, file: File) {
    let text = match dom::read_text(&file).await {
        Ok(t) => t,
        Err(e) => {
            dom::alert(&LoadError::Read(e).to_string());
            return;
        }
    };
    let template = match TemplateFile::from_json(&text) {
        Ok(t) => t,
        Err(e) => {
            log::error!("{}: {e}", file.name());
            dom::alert(&format!("Error loading template: {e}"));
            return;
        }
    };

    let Some(mut section) = slot.read(&state, Section::clone) else {
        return;
    };
    if let Err(e) = template.apply_to(&mut section, dom::random_param_id) {
        dom::alert(&format!("Error loading template: {e}"));
        return;
    }
    // pages of a loaded template come from the file, not from pdf.js; the
    // handle goes before the commit so pagination sees the section as it is
    overlays::drop_document(slot.key());
    let _ = slot.edit(&state, |s| {
        *s = section;
        Ok(())
    });
    log::info!("section {}: loaded {}", slot.id, file.name());
}

/// Send the current page image to the selected template as a new form.
pub async fn upload_form(state: AppState, slot: SectionSlot) {
    let Some(template_id) = state.selected_template.get_untracked() else {
        dom::alert("Please select a template first.");
        return;
    };
    let Some(prepared) = slot.read(&state, |s| {
        s.check_saveable()?;
        let uri = s.current_image().ok_or(InputError::NoImage)?.to_string();
        Ok::<_, InputError>((s.name.clone(), uri))
    }) else {
        return;
    };
    let (name, uri) = match prepared {
        Ok(p) => p,
        Err(e) => {
            dom::alert(&e.to_string());
            return;
        }
    };
    let (mime, bytes) = match DataUri::parse(&uri).and_then(|d| {
        let bytes = d.decode().map_err(|source| template_core::TemplateError::Binary { page: 1, source })?;
        Ok((d.mime.to_string(), bytes))
    }) {
        Ok(parts) => parts,
        Err(e) => {
            dom::alert(&e.to_string());
            return;
        }
    };

    let _busy = state.busy("Uploading template...");
    match state.api().upload_form(template_id, &name, bytes, &mime).await {
        Ok(_) => dom::alert("Template uploaded."),
        Err(e) => dom::alert(&format!("Upload failed: {e}")),
    }
}

/// Capture screen: rasterise every page of `file` and store them as the
/// selected file's document for form `form_id`.
pub async fn upload_document(state: AppState, form_id: i64, file: File) {
    let Some(file_id) = state.selected_file.get_untracked() else {
        dom::alert("Please select a file first.");
        return;
    };
    if !is_pdf(&file) {
        let err = InputError::WrongFileType { expected: "a PDF", got: file.type_() };
        dom::alert(&err.to_string());
        return;
    }
    let config = state.config.get_value();
    let busy = state.busy("Reading PDF...");

    let bytes = match dom::read_bytes(&file).await {
        Ok(b) => b,
        Err(e) => {
            dom::alert(&LoadError::Read(e).to_string());
            return;
        }
    };
    let doc = match documents::open_document(&PdfJsRenderer, bytes, &config, dom::sleep).await {
        Ok(doc) => doc,
        Err(e) => {
            log::error!("opening {}: {e}", file.name());
            dom::alert(&format!("Failed to load PDF: {e}"));
            return;
        }
    };

    busy.text("Rendering pages...");
    let pages = match documents::render_all_pages(
        doc.as_ref(),
        config.upload_render_scale,
        &config,
        &dom::sleep,
        |done, total| busy.progress(done, total),
    )
    .await
    {
        Ok(pages) => pages,
        Err(e) => {
            dom::alert(&format!("Failed to render PDF: {e}"));
            return;
        }
    };

    let mut uploads = Vec::with_capacity(pages.len());
    for (i, image) in pages.iter().enumerate() {
        let page = i as u32 + 1;
        match DataUri::parse(&image.data_uri).map(|d| d.decode()) {
            Ok(Ok(png)) => uploads.push(PageUpload { page, png }),
            _ => {
                dom::alert(&format!("Page {page} could not be encoded."));
                return;
            }
        }
    }

    busy.text("Uploading...");
    match state.api().upload_document_pages(file_id, form_id, uploads).await {
        Ok(_) => {
            log::info!("uploaded {} pages for form {form_id}", pages.len());
            dom::alert("Document uploaded.");
        }
        Err(e) => dom::alert(&format!("Upload failed: {e}")),
    }
}

pub async fn export_xml(state: AppState) {
    let Some(file_id) = state.selected_file.get_untracked() else {
        dom::alert("Please select a file first.");
        return;
    };
    let _busy = state.busy("Exporting...");
    match state.api().export_file(file_id).await {
        Ok(xml) => {
            if let Err(e) = dom::download("response.xml", "application/xml", &xml) {
                dom::alert(&format!("Could not save export: {e}"));
            }
        }
        Err(e) => dom::alert(&format!("Export failed: {e}")),
    }
}
