use crate::error::EditError;
use crate::section::{Section, SectionId};

/// All sections of one editing session.
#[derive(Clone, Debug, PartialEq)]
pub struct Workspace {
    sections: Vec<Section>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// A workspace with one empty section.
    pub fn new() -> Self {
        Self { sections: vec![Section::new(1, "Section 1")] }
    }

    /// Capture screen: sections come from the server. May be empty.
    pub fn from_sections(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn ids(&self) -> Vec<SectionId> {
        self.sections.iter().map(|s| s.id).collect()
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: SectionId) -> Result<&mut Section, EditError> {
        self.sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(EditError::UnknownSection(id))
    }

    pub fn add_section(&mut self) -> SectionId {
        let id = self.sections.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        self.sections.push(Section::new(id, format!("Section {id}")));
        log::debug!("added section {id}");
        id
    }

    pub fn remove_section(&mut self, id: SectionId) -> Result<Section, EditError> {
        let index = self
            .sections
            .iter()
            .position(|s| s.id == id)
            .ok_or(EditError::UnknownSection(id))?;
        if self.sections.len() == 1 {
            return Err(EditError::LastSection);
        }
        Ok(self.sections.remove(index))
    }

    pub fn rename(&mut self, id: SectionId, name: impl Into<String>) -> Result<(), EditError> {
        self.section_mut(id)?.name = name.into();
        Ok(())
    }

    /// Turn selection mode on or off for `id`. Turning it on turns it off
    /// everywhere else. Sections still showing the placeholder, and read-only
    /// sections, never select. Returns the new state.
    pub fn set_selecting(&mut self, id: SectionId, on: bool) -> Result<bool, EditError> {
        let target = self.section_mut(id)?;
        if on && (target.is_placeholder() || target.view_only) {
            return Ok(target.is_selecting);
        }
        target.is_selecting = on;
        if on {
            for other in self.sections.iter_mut().filter(|s| s.id != id) {
                other.is_selecting = false;
            }
        }
        Ok(on)
    }

    pub fn toggle_selecting(&mut self, id: SectionId) -> Result<bool, EditError> {
        let current = self.section(id).ok_or(EditError::UnknownSection(id))?.is_selecting;
        self.set_selecting(id, !current)
    }

    #[cfg(test)]
    fn selecting(&self) -> Option<SectionId> {
        self.sections.iter().find(|s| s.is_selecting).map(|s| s.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::RasterImage;

    fn with_image(ws: &mut Workspace, id: SectionId) {
        ws.section_mut(id).unwrap().import_image(RasterImage {
            data_uri: "data:image/png;base64,AAAA".into(),
            width: 10,
            height: 10,
        });
    }

    #[test]
    fn ids_follow_the_highest() {
        let mut ws = Workspace::new();
        assert_eq!(ws.add_section(), 2);
        assert_eq!(ws.add_section(), 3);
        ws.remove_section(2).unwrap();
        assert_eq!(ws.add_section(), 4);
        assert_eq!(ws.section(4).unwrap().name, "Section 4");
        ws.remove_section(4).unwrap();
        ws.remove_section(3).unwrap();
        assert_eq!(ws.add_section(), 2);
    }

    #[test]
    fn last_section_stays() {
        let mut ws = Workspace::new();
        assert_eq!(ws.remove_section(1), Err(EditError::LastSection));
        assert_eq!(ws.remove_section(9), Err(EditError::UnknownSection(9)));
        assert_eq!(ws.sections().len(), 1);
    }

    #[test]
    fn selection_is_mutually_exclusive() {
        let mut ws = Workspace::new();
        let b = ws.add_section();
        let c = ws.add_section();
        for id in [1, b, c] {
            with_image(&mut ws, id);
        }
        assert!(ws.toggle_selecting(1).unwrap());
        assert!(ws.set_selecting(b, true).unwrap());
        assert!(!ws.section(1).unwrap().is_selecting);
        assert_eq!(ws.selecting(), Some(b));

        assert!(ws.toggle_selecting(c).unwrap());
        assert_eq!(ws.sections().iter().filter(|s| s.is_selecting).count(), 1);

        assert!(!ws.toggle_selecting(c).unwrap());
        assert_eq!(ws.selecting(), None);
    }

    #[test]
    fn placeholder_sections_do_not_select() {
        let mut ws = Workspace::new();
        assert!(!ws.toggle_selecting(1).unwrap());
        assert_eq!(ws.selecting(), None);
    }

    #[test]
    fn rename_unknown_section() {
        let mut ws = Workspace::new();
        ws.rename(1, "Invoice").unwrap();
        assert_eq!(ws.section(1).unwrap().name, "Invoice");
        assert_eq!(ws.rename(5, "x"), Err(EditError::UnknownSection(5)));
    }
}
