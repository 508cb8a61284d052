//! The template file: page images plus parameter geometry, as written by the
//! local save and read back by local load and the capture screen.
//!
//! ```json
//! {
//!   "description": "...",
//!   "template": {
//!     "source": { "type": "pdf", "filename": "...", "allPages": [1, 2], "totalPages": 3 },
//!     "data": [ { "page": 1, "binary": "<base64>", "size": { "width": 800, "height": 1131 }, "type": "image/png" } ]
//!   },
//!   "params": [ ... ],
//!   "allPageParams": { "1": [ ... ] }
//! }
//! ```
//!
//! `params` is written for single-image sections and `allPageParams` for
//! document-backed ones.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::model::{Anchor, Parameter};
use crate::section::{DocumentInfo, Section, SectionId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateFile {
    #[serde(default)]
    pub description: String,
    pub template: TemplateBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Parameter>>,
    #[serde(rename = "allPageParams", default, skip_serializing_if = "Option::is_none")]
    pub all_page_params: Option<BTreeMap<u32, Vec<Parameter>>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TemplateSource>,
    #[serde(default)]
    pub data: Vec<PageData>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateSource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub filename: String,
    #[serde(rename = "allPages", default)]
    pub all_pages: Vec<u32>,
    #[serde(rename = "totalPages", default)]
    pub total_pages: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    pub page: u32,
    /// Base64 without the `data:` prefix.
    pub binary: String,
    pub size: PageSize,
    #[serde(rename = "type", default = "default_mime")]
    pub mime: String,
}

fn default_mime() -> String {
    "image/png".to_string()
}

/// A base64 `data:` URI split into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> Result<Self, TemplateError> {
        let rest = uri.strip_prefix("data:").ok_or(TemplateError::NotDataUri)?;
        let (head, payload) = rest.split_once(',').ok_or(TemplateError::NotDataUri)?;
        let mime = head.strip_suffix(";base64").ok_or(TemplateError::NotDataUri)?;
        Ok(Self { mime, payload })
    }

    pub fn build(mime: &str, payload: &str) -> String {
        format!("data:{mime};base64,{payload}")
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.payload)
    }
}

impl PageData {
    /// Image source for this page. Payloads that already carry a `data:`
    /// prefix are taken as they are.
    pub fn to_data_uri(&self) -> Result<String, TemplateError> {
        if self.binary.starts_with("data:") {
            let uri = DataUri::parse(&self.binary)?;
            uri.decode().map_err(|source| TemplateError::Binary { page: self.page, source })?;
            return Ok(self.binary.clone());
        }
        STANDARD
            .decode(&self.binary)
            .map_err(|source| TemplateError::Binary { page: self.page, source })?;
        Ok(DataUri::build(&self.mime, &self.binary))
    }
}

impl TemplateFile {
    /// Snapshot `section` for saving. Every cached page image is written.
    pub fn from_section(
        section: &Section,
        description: impl Into<String>,
        default_size: (u32, u32),
    ) -> Result<Self, TemplateError> {
        section.check_saveable()?;

        let mut data = Vec::with_capacity(section.page_images.len());
        for (&page, uri) in &section.page_images {
            let parsed = DataUri::parse(uri)?;
            let (width, height) = section.page_sizes.get(&page).copied().unwrap_or(default_size);
            data.push(PageData {
                page,
                binary: parsed.payload.to_string(),
                size: PageSize { width, height },
                mime: parsed.mime.to_string(),
            });
        }

        let (source, params, all_page_params) = match &section.document {
            Some(doc) => (
                Some(TemplateSource {
                    kind: "pdf".to_string(),
                    filename: doc.filename.clone(),
                    all_pages: section.page_params.keys().copied().collect(),
                    total_pages: section.total_pages,
                }),
                None,
                Some(section.page_params.clone()),
            ),
            None => (None, Some(section.params.clone()), None),
        };

        Ok(Self {
            description: description.into(),
            template: TemplateBody { source, data },
            params,
            all_page_params,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, TemplateError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, TemplateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load into `section`, replacing its pages and parameters. The section is
    /// untouched on error.
    pub fn apply_to(&self, section: &mut Section, fresh_id: impl FnMut() -> String) -> Result<(), TemplateError> {
        let loaded = build_section(
            section.id,
            &section.name,
            &self.template,
            self.params.as_deref().unwrap_or(&[]),
            self.all_page_params.as_ref(),
            fresh_id,
        )?;
        let is_selecting = section.is_selecting;
        *section = Section { is_selecting, ..loaded };
        Ok(())
    }
}

/// Read-only section for a form fetched from the server.
pub fn view_only_section(
    id: SectionId,
    name: &str,
    body: &TemplateBody,
    all_page_params: Option<&BTreeMap<u32, Vec<Parameter>>>,
    fresh_id: impl FnMut() -> String,
) -> Result<Section, TemplateError> {
    let mut section = build_section(id, name, body, &[], all_page_params, fresh_id)?;
    section.view_only = true;
    Ok(section)
}

fn build_section(
    id: SectionId,
    name: &str,
    body: &TemplateBody,
    params: &[Parameter],
    all_page_params: Option<&BTreeMap<u32, Vec<Parameter>>>,
    mut fresh_id: impl FnMut() -> String,
) -> Result<Section, TemplateError> {
    if body.data.is_empty() {
        return Err(TemplateError::NoPages);
    }
    let mut section = Section::new(id, name);
    for page in &body.data {
        section.page_images.insert(page.page, page.to_data_uri()?);
        section.page_sizes.insert(page.page, (page.size.width, page.size.height));
    }

    let mut fix = |mut p: Parameter, anchor: Anchor| {
        if p.id.trim().is_empty() {
            p.id = fresh_id();
        }
        p.anchor = anchor;
        p
    };

    match &body.source {
        Some(source) => {
            // no renderer backs a loaded section, so pages past the last
            // stored image can never be shown
            let highest = section.page_images.keys().next_back().copied().unwrap_or(1);
            if source.total_pages > highest {
                log::debug!("{}: {} of {} pages stored", source.filename, section.page_images.len(), source.total_pages);
            }
            let total_pages = highest.max(1);
            section.document = Some(DocumentInfo { filename: source.filename.clone(), total_pages });
            section.total_pages = total_pages;
            section.page = source
                .all_pages
                .iter()
                .copied()
                .find(|p| section.page_images.contains_key(p))
                .or_else(|| section.page_images.keys().next().copied())
                .unwrap_or(1);
            for (&page, list) in all_page_params.into_iter().flatten() {
                let fixed = list.iter().cloned().map(|p| fix(p, Anchor::Page(page))).collect();
                section.page_params.insert(page, fixed);
            }
        }
        None => {
            // single image: keep only the first page
            if let Some((&first, _)) = section.page_images.iter().next() {
                let uri = section.page_images.remove(&first).unwrap_or_default();
                let size = section.page_sizes.remove(&first);
                section.page_images.clear();
                section.page_sizes.clear();
                section.page_images.insert(1, uri);
                if let Some(size) = size {
                    section.page_sizes.insert(1, size);
                }
            }
            section.params = params.iter().cloned().map(|p| fix(p, Anchor::Standalone)).collect();
        }
    }
    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::RasterImage;
    use crate::model::{Coord, ParamType};
    use crate::error::InputError;
    use serde_json::json;

    const PNG: &str = "iVBORw0KGgo=";

    fn image(payload: &str) -> RasterImage {
        RasterImage { data_uri: DataUri::build("image/png", payload), width: 640, height: 905 }
    }

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("Param gen{n}")
        }
    }

    #[test]
    fn single_image_round_trip() {
        let mut section = Section::new(1, "Section 1");
        section.import_image(image(PNG));
        section.add_parameter(Parameter::from_corners("Param 1", (10.0, 20.0), (110.0, 70.0), Anchor::Standalone));

        let file = TemplateFile::from_section(&section, "Template created on 16/10/2026", (800, 1131)).unwrap();
        let text = file.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value["params"][0],
            json!({"id": "Param 1", "type": "string", "x1": "10.00", "y1": "20.00",
                   "x2": "110.00", "y2": "70.00", "isMultiline": false})
        );
        assert_eq!(value["template"]["data"][0]["binary"], PNG);
        assert!(value.get("allPageParams").is_none());

        let mut loaded = Section::new(1, "Section 1");
        TemplateFile::from_json(&text).unwrap().apply_to(&mut loaded, counter()).unwrap();
        assert_eq!(loaded.params, section.params);
        assert_eq!(loaded.page_images, section.page_images);
        assert!(!loaded.has_document());
    }

    #[test]
    fn document_round_trip_keeps_every_page() {
        let mut section = Section::new(4, "Invoice");
        section.apply_document(DocumentInfo { filename: "invoice.pdf".into(), total_pages: 3 }, image("cDE="));
        section.add_parameter(Parameter::from_corners("Invoice No", (1.0, 2.0), (30.0, 40.0), Anchor::Standalone));
        section.store_page(3, image("cDM="));
        section.change_page(3).unwrap();
        let mut total = Parameter::from_corners("Total", (5.556, 6.0), (90.0, 99.996), Anchor::Standalone);
        total.param_type = ParamType::Currency;
        total.is_multiline = true;
        section.add_parameter(total);

        let file = TemplateFile::from_section(&section, "d", (800, 1131)).unwrap();
        assert_eq!(file.template.data.len(), 2);
        let source = file.template.source.as_ref().unwrap();
        assert_eq!(source.all_pages, vec![1, 3]);
        assert_eq!(source.total_pages, 3);
        assert!(file.params.is_none());

        let text = file.to_json_pretty().unwrap();
        let mut loaded = Section::new(4, "Invoice");
        TemplateFile::from_json(&text).unwrap().apply_to(&mut loaded, counter()).unwrap();
        assert_eq!(loaded.page_params, section.page_params);
        assert_eq!(loaded.page_images, section.page_images);
        assert_eq!(loaded.total_pages, 3);
        assert_eq!(loaded.page, 1);
        assert_eq!(loaded.page_params[&3][0].x1, Coord::new(5.56));
    }

    #[test]
    fn decoded_image_size_is_saved() {
        let mut section = Section::new(1, "Section 1");
        section.import_image(RasterImage { data_uri: DataUri::build("image/png", PNG), width: 0, height: 0 });
        section.record_page_size(1240, 1754);
        section.add_parameter(Parameter::from_corners("Param 1", (1.0, 1.0), (50.0, 50.0), Anchor::Standalone));
        let file = TemplateFile::from_section(&section, "", (800, 1131)).unwrap();
        assert_eq!(file.template.data[0].size, PageSize { width: 1240, height: 1754 });
    }

    #[test]
    fn loose_input_is_normalised() {
        let text = json!({
            "description": "",
            "template": {
                "source": {"type": "pdf", "filename": "x.pdf", "allPages": [2], "totalPages": 2},
                "data": [{"page": 2, "binary": PNG, "size": {"width": 800, "height": 1131}, "type": "image/jpeg"}]
            },
            "allPageParams": {"2": [{"x1": 1.234, "y1": "2", "x2": 50, "y2": "60.5"}]}
        })
        .to_string();
        let mut section = Section::new(1, "s");
        TemplateFile::from_json(&text).unwrap().apply_to(&mut section, counter()).unwrap();
        assert_eq!(section.page, 2);
        assert_eq!(section.current_image(), Some(format!("data:image/jpeg;base64,{PNG}").as_str()));
        let p = &section.page_params[&2][0];
        assert_eq!(p.id, "Param gen1");
        assert_eq!(p.x1.to_string(), "1.23");
        assert_eq!(p.anchor, Anchor::Page(2));
    }

    #[test]
    fn bad_base64_leaves_section_alone() {
        let text = json!({
            "template": {"data": [{"page": 1, "binary": "***", "size": {"width": 1, "height": 1}}]},
            "params": []
        })
        .to_string();
        let mut section = Section::new(1, "s");
        section.import_image(image(PNG));
        let before = section.clone();
        let err = TemplateFile::from_json(&text).unwrap().apply_to(&mut section, counter()).unwrap_err();
        assert!(matches!(err, TemplateError::Binary { page: 1, .. }));
        assert_eq!(section, before);
    }

    #[test]
    fn empty_data_is_rejected() {
        let file = TemplateFile::from_json(r#"{"template": {"data": []}}"#).unwrap();
        let mut section = Section::new(1, "s");
        assert!(matches!(file.apply_to(&mut section, counter()), Err(TemplateError::NoPages)));
    }

    #[test]
    fn saving_checks_input_first() {
        let section = Section::new(1, "s");
        let err = TemplateFile::from_section(&section, "", (800, 1131)).unwrap_err();
        assert!(matches!(err, TemplateError::Input(InputError::NoImage)));
    }

    #[test]
    fn prefixed_binaries_are_accepted() {
        let page = PageData {
            page: 1,
            binary: DataUri::build("image/png", PNG),
            size: PageSize { width: 1, height: 1 },
            mime: "image/png".into(),
        };
        assert_eq!(page.to_data_uri().unwrap(), page.binary);
    }

    #[test]
    fn data_uri_parts() {
        let uri = DataUri::parse("data:image/png;base64,AAAA").unwrap();
        assert_eq!(uri, DataUri { mime: "image/png", payload: "AAAA" });
        assert!(DataUri::parse("https://host/page.png").is_err());
        assert!(DataUri::parse("data:image/svg+xml,<svg/>").is_err());
    }

    #[test]
    fn unsaved_pages_are_not_counted() {
        let body = TemplateBody {
            source: Some(TemplateSource { kind: "pdf".into(), filename: "a.pdf".into(), all_pages: vec![1], total_pages: 3 }),
            data: vec![PageData { page: 1, binary: PNG.into(), size: PageSize { width: 800, height: 1131 }, mime: "image/png".into() }],
        };
        let mut s = view_only_section(2, "Receipt", &body, None, counter()).unwrap();
        assert_eq!(s.total_pages, 1);
        assert_eq!(s.neighbour_page(true, true), None);
        assert_eq!(s.change_page(2), Err(crate::error::EditError::PageOutOfRange { page: 2, total: 1 }));
        assert_eq!(s.page, 1);
    }

    #[test]
    fn view_only_form_section() {
        let body = TemplateBody {
            source: Some(TemplateSource { kind: "pdf".into(), filename: String::new(), all_pages: vec![1], total_pages: 0 }),
            data: vec![
                PageData { page: 1, binary: PNG.into(), size: PageSize { width: 800, height: 1131 }, mime: "image/png".into() },
                PageData { page: 2, binary: PNG.into(), size: PageSize { width: 800, height: 1131 }, mime: "image/png".into() },
            ],
        };
        let mut params = BTreeMap::new();
        params.insert(2, vec![Parameter::from_corners("b", (0.0, 0.0), (9.0, 9.0), Anchor::Standalone)]);
        let s = view_only_section(7, "Invoice", &body, Some(&params), counter()).unwrap();
        assert!(s.view_only);
        assert_eq!(s.total_pages, 2);
        assert!(s.active_params().is_empty());
        assert_eq!(s.page_params[&2][0].anchor, Anchor::Page(2));
    }
}
