//! One editing slot: its page images and the parameters drawn on them.

use std::collections::BTreeMap;

use crate::documents::RasterImage;
use crate::error::{EditError, InputError};
use crate::model::{Anchor, ParamField, Parameter};

pub type SectionId = u32;

/// What a section knows about the multi-page document behind it. The live
/// renderer handle stays with whoever opened the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentInfo {
    pub filename: String,
    pub total_pages: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub document: Option<DocumentInfo>,
    pub page: u32,
    pub total_pages: u32,
    /// Image source per page; only the current page is guaranteed present.
    pub page_images: BTreeMap<u32, String>,
    /// Pixel size of each rendered page, when known.
    pub page_sizes: BTreeMap<u32, (u32, u32)>,
    /// Parameters per page of a document-backed section.
    pub page_params: BTreeMap<u32, Vec<Parameter>>,
    /// Parameters of a single-image section.
    pub params: Vec<Parameter>,
    pub is_selecting: bool,
    /// Overlay always shown, no drag creation.
    pub view_only: bool,
}

impl Section {
    pub fn new(id: SectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            document: None,
            page: 1,
            total_pages: 1,
            page_images: BTreeMap::new(),
            page_sizes: BTreeMap::new(),
            page_params: BTreeMap::new(),
            params: Vec::new(),
            is_selecting: false,
            view_only: false,
        }
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Image shown for the current page, `None` while the placeholder is up.
    pub fn current_image(&self) -> Option<&str> {
        self.page_images.get(&self.page).map(String::as_str)
    }

    pub fn is_placeholder(&self) -> bool {
        self.current_image().is_none()
    }

    /// Anchor a parameter drawn right now would get.
    pub fn anchor(&self) -> Anchor {
        if self.has_document() {
            Anchor::Page(self.page)
        } else {
            Anchor::Standalone
        }
    }

    pub fn active_params(&self) -> &[Parameter] {
        if self.has_document() {
            self.page_params.get(&self.page).map(Vec::as_slice).unwrap_or(&[])
        } else {
            &self.params
        }
    }

    pub fn add_parameter(&mut self, mut param: Parameter) {
        param.anchor = self.anchor();
        if self.has_document() {
            self.page_params.entry(self.page).or_default().push(param);
        } else {
            self.params.push(param);
        }
    }

    /// Empty the current page's list, or the whole list for a single image.
    /// Returns how many parameters were dropped.
    pub fn clear_parameters(&mut self) -> usize {
        if self.has_document() {
            self.page_params.get_mut(&self.page).map(std::mem::take).map_or(0, |v| v.len())
        } else {
            std::mem::take(&mut self.params).len()
        }
    }

    fn list_mut(&mut self, page: Option<u32>) -> Result<&mut Vec<Parameter>, EditError> {
        match (page, self.has_document()) {
            (None, false) => Ok(&mut self.params),
            (Some(_), false) => Err(EditError::NoDocument),
            (page, true) => {
                let page = page.unwrap_or(self.page);
                if page < 1 || page > self.total_pages {
                    return Err(EditError::PageOutOfRange { page, total: self.total_pages });
                }
                Ok(self.page_params.entry(page).or_default())
            }
        }
    }

    /// Edit one column of one row. Rows on pages other than the current one
    /// are read-only.
    pub fn update_parameter(&mut self, page: Option<u32>, index: usize, field: ParamField) -> Result<(), EditError> {
        if let Some(p) = page {
            if self.has_document() && p != self.page {
                return Err(EditError::NotCurrentPage(p));
            }
        }
        let list = self.list_mut(page)?;
        let param = list.get_mut(index).ok_or_else(|| EditError::NoSuchParameter {
            page: page.map_or_else(|| "image".to_string(), |p| format!("page {p}")),
            index,
        })?;
        param.apply(field);
        Ok(())
    }

    pub fn delete_parameter(&mut self, page: Option<u32>, index: usize) -> Result<Parameter, EditError> {
        let list = self.list_mut(page)?;
        if index >= list.len() {
            return Err(EditError::NoSuchParameter {
                page: page.map_or_else(|| "image".to_string(), |p| format!("page {p}")),
                index,
            });
        }
        Ok(list.remove(index))
    }

    /// Every page-keyed list, in page order, for the grouped table.
    pub fn params_by_page(&self) -> impl Iterator<Item = (u32, &[Parameter])> {
        self.page_params.iter().map(|(page, list)| (*page, list.as_slice()))
    }

    pub fn parameter_count(&self) -> usize {
        if self.has_document() {
            self.page_params.values().map(Vec::len).sum()
        } else {
            self.params.len()
        }
    }

    /// Replace the contents with a single standalone image.
    pub fn import_image(&mut self, image: RasterImage) {
        self.document = None;
        self.page = 1;
        self.total_pages = 1;
        self.page_params.clear();
        self.params.clear();
        self.page_images.clear();
        self.page_sizes.clear();
        self.store_page(1, image);
    }

    /// Replace the contents with a freshly opened document showing page 1.
    pub fn apply_document(&mut self, info: DocumentInfo, first_page: RasterImage) {
        self.total_pages = info.total_pages.max(1);
        self.document = Some(info);
        self.page = 1;
        self.page_params.clear();
        self.params.clear();
        self.page_images.clear();
        self.page_sizes.clear();
        self.store_page(1, first_page);
    }

    pub fn store_page(&mut self, page: u32, image: RasterImage) {
        if image.width > 0 && image.height > 0 {
            self.page_sizes.insert(page, (image.width, image.height));
        }
        self.page_images.insert(page, image.data_uri);
    }

    /// Fill in the current page's pixel size once its image has decoded.
    /// Sizes already known are kept. Returns whether anything changed.
    pub fn record_page_size(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || self.is_placeholder() || self.page_sizes.contains_key(&self.page) {
            return false;
        }
        self.page_sizes.insert(self.page, (width, height));
        true
    }

    pub fn validate_page(&self, page: u32) -> Result<(), EditError> {
        if page < 1 || page > self.total_pages {
            return Err(EditError::PageOutOfRange { page, total: self.total_pages });
        }
        Ok(())
    }

    /// Page the previous/next buttons lead to. With `stored_only` the step
    /// skips pages that have no image, for sections no renderer can fill in.
    pub fn neighbour_page(&self, forward: bool, stored_only: bool) -> Option<u32> {
        if stored_only {
            return if forward {
                self.page_images.range(self.page + 1..).next().map(|(&p, _)| p)
            } else {
                self.page_images.range(..self.page).next_back().map(|(&p, _)| p)
            };
        }
        let next = if forward { self.page.checked_add(1)? } else { self.page.checked_sub(1)? };
        (1..=self.total_pages).contains(&next).then_some(next)
    }

    /// Switch to `page`, whose image must already be stored. Nothing changes
    /// on error.
    pub fn change_page(&mut self, page: u32) -> Result<(), EditError> {
        self.validate_page(page)?;
        if !self.page_images.contains_key(&page) {
            return Err(EditError::PageNotRendered(page));
        }
        self.page = page;
        Ok(())
    }

    /// Check the section can be written out as a template.
    pub fn check_saveable(&self) -> Result<(), InputError> {
        if self.is_placeholder() {
            return Err(InputError::NoImage);
        }
        if self.parameter_count() == 0 {
            return Err(InputError::NoParameters);
        }
        Ok(())
    }
}
