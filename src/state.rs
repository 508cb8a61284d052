use leptos::prelude::*;
use template_api::{ApiClient, FileSummary, TemplateSummary};
use template_core::config::EngineConfig;
use template_core::Workspace;

use crate::dom;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Editor,
    Capture,
}

/// Which workspace a section belongs to; section ids are only unique within
/// one screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Editor,
    Capture,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Loading {
    pub open: bool,
    pub text: String,
    /// 0..=100 while a multi-step job reports progress.
    pub progress: Option<u32>,
    /// Jobs still holding a `Busy` guard.
    jobs: u32,
}

impl Loading {
    fn begin(&mut self, text: String) {
        self.jobs += 1;
        self.open = true;
        self.text = text;
        self.progress = None;
    }

    /// The overlay stays up until the last overlapping job ends.
    fn finish(&mut self) {
        self.jobs = self.jobs.saturating_sub(1);
        if self.jobs == 0 {
            *self = Self::default();
        }
    }
}

#[derive(Clone, Copy)]
pub struct AppState {
    pub screen: RwSignal<Screen>,
    pub editor: RwSignal<Workspace>,
    pub capture: RwSignal<Workspace>,
    pub loading: RwSignal<Loading>,
    pub config: StoredValue<EngineConfig>,

    // server-side lists
    pub templates: RwSignal<Vec<TemplateSummary>>,
    pub selected_template: RwSignal<Option<i64>>,
    pub files: RwSignal<Vec<FileSummary>>,
    pub selected_file: RwSignal<Option<i64>>,
}

impl AppState {
    pub fn new() -> Self {
        let config = dom::load_engine_config();
        log::debug!("engine config: {config:?}");
        Self {
            screen: RwSignal::new(Screen::Editor),
            editor: RwSignal::new(Workspace::new()),
            capture: RwSignal::new(Workspace::from_sections(Vec::new())),
            loading: RwSignal::new(Loading::default()),
            config: StoredValue::new(config),
            templates: RwSignal::new(Vec::new()),
            selected_template: RwSignal::new(None),
            files: RwSignal::new(Vec::new()),
            selected_file: RwSignal::new(None),
        }
    }

    pub fn workspace(&self, scope: Scope) -> RwSignal<Workspace> {
        match scope {
            Scope::Editor => self.editor,
            Scope::Capture => self.capture,
        }
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(dom::api_config())
    }

    /// Show the loading overlay until the returned guard is dropped.
    pub fn busy(&self, text: impl Into<String>) -> Busy {
        let text = text.into();
        self.loading.update(|l| l.begin(text));
        Busy { loading: self.loading }
    }

    pub async fn refresh_templates(&self) {
        match self.api().list_templates().await {
            Ok(list) => self.templates.set(list),
            Err(e) => log::error!("could not load templates: {e}"),
        }
    }

    pub async fn refresh_files(&self) {
        match self.api().list_files().await {
            Ok(list) => self.files.set(list),
            Err(e) => log::error!("could not load files: {e}"),
        }
    }
}

/// Clears the loading overlay on every exit path of an async job.
pub struct Busy {
    loading: RwSignal<Loading>,
}

impl Busy {
    pub fn text(&self, text: impl Into<String>) {
        let text = text.into();
        self.loading.update(|l| l.text = text);
    }

    pub fn progress(&self, done: u32, total: u32) {
        let pct = if total == 0 { 0 } else { done * 100 / total };
        self.loading.update(|l| l.progress = Some(pct));
    }
}

impl Drop for Busy {
    fn drop(&mut self) {
        self.loading.update(Loading::finish);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_jobs_keep_the_overlay_open() {
        let mut loading = Loading::default();
        loading.begin("Loading PDF...".into());
        loading.begin("Uploading...".into());
        loading.finish();
        assert!(loading.open);
        assert_eq!(loading.text, "Uploading...");
        loading.finish();
        assert_eq!(loading, Loading::default());
    }

    #[test]
    fn unmatched_finish_is_harmless() {
        let mut loading = Loading::default();
        loading.finish();
        assert!(!loading.open);
        loading.begin("Exporting...".into());
        loading.progress = Some(40);
        loading.finish();
        assert_eq!(loading, Loading::default());
    }
}
