use leptos::html;
use leptos::prelude::*;
use template_api::{Form, NewFile};
use template_core::template::view_only_section;
use template_core::{InputError, Section, SectionId, Workspace};
use wasm_bindgen_futures::spawn_local;

use crate::actions::{self, SectionSlot};
use crate::components::page_viewer::PageViewer;
use crate::components::params_table::ParamsTable;
use crate::components::section_canvas::SectionCanvas;
use crate::components::template_editor::TemplatePicker;
use crate::dom;
use crate::overlays;
use crate::state::{AppState, Scope};

fn form_section(form: &Form) -> Option<Section> {
    let id = SectionId::try_from(form.id).ok()?;
    let Some(body) = &form.template else {
        let mut blank = Section::new(id, form.name.clone());
        blank.view_only = true;
        return Some(blank);
    };
    match view_only_section(id, &form.name, body, form.all_page_params.as_ref(), dom::random_param_id) {
        Ok(section) => Some(section),
        Err(e) => {
            log::error!("form {} ({}): {e}", form.id, form.name);
            None
        }
    }
}

/// Pick a template and file, upload a filled-in PDF per form, export the
/// captured data.
#[component]
pub fn CaptureScreen() -> impl IntoView {
    let state = expect_context::<AppState>();

    spawn_local(async move {
        state.refresh_files().await;
    });

    // Forms of the selected template become read-only sections.
    Effect::new(move |_| {
        let template = state.selected_template.get();
        spawn_local(async move {
            let Some(template_id) = template else {
                state.capture.set(Workspace::from_sections(Vec::new()));
                return;
            };
            let _busy = state.busy("Loading forms...");
            match state.api().list_forms(template_id).await {
                Ok(forms) => {
                    for id in state.capture.with_untracked(|w| w.ids()) {
                        overlays::drop_document((Scope::Capture, id));
                    }
                    let sections = forms.iter().filter_map(form_section).collect();
                    state.capture.set(Workspace::from_sections(sections));
                }
                Err(e) => dom::alert(&format!("Could not load forms: {e}")),
            }
        });
    });

    let ids = Memo::new(move |_| state.capture.with(|w| w.ids()));

    view! {
        <div class="capture-screen">
            <div class="editor-bar">
                <TemplatePicker />
                <FilePicker />
                <button on:click=move |_| spawn_local(actions::export_xml(state))>"Export XML"</button>
            </div>
            <Show
                when=move || !ids.with(Vec::is_empty)
                fallback=|| view! { <div class="empty-state">"Select a template to see its forms"</div> }
            >
                <For each=move || ids.get() key=|id| *id let:id>
                    <FormViewer id=id />
                </For>
            </Show>
        </div>
    }
}

#[component]
fn FilePicker() -> impl IntoView {
    let state = expect_context::<AppState>();
    let creating = RwSignal::new(false);
    let new_name = RwSignal::new(String::new());

    let create = move |_: web_sys::MouseEvent| {
        let name = new_name.get_untracked().trim().to_string();
        if name.is_empty() {
            dom::alert(&InputError::EmptyName.to_string());
            return;
        }
        let Some(template_id) = state.selected_template.get_untracked() else {
            dom::alert("Please select a template first.");
            return;
        };
        spawn_local(async move {
            let _busy = state.busy("Creating file...");
            match state.api().create_file(&NewFile { name, template_id, user_id: 1 }).await {
                Ok(created) => {
                    state.refresh_files().await;
                    state.selected_file.set(Some(created.id));
                    creating.set(false);
                    new_name.set(String::new());
                }
                Err(e) => dom::alert(&format!("Could not create file: {e}")),
            }
        });
    };

    view! {
        <div class="file-picker">
            <label>"File "</label>
            <select on:change=move |ev| state.selected_file.set(event_target_value(&ev).parse::<i64>().ok())>
                <option value="" selected=move || state.selected_file.get().is_none()>"Select a file"</option>
                {move || state.files.get().into_iter().map(|f| {
                    let id = f.id;
                    view! {
                        <option value=id.to_string() selected=move || state.selected_file.get() == Some(id)>
                            {f.name}
                        </option>
                    }
                }).collect_view()}
            </select>
            <button on:click=move |_| creating.set(true)>"New file"</button>
            <Show when=move || creating.get()>
                <div class="dialog">
                    <input
                        type="text"
                        placeholder="File name"
                        prop:value=move || new_name.get()
                        on:input=move |ev| new_name.set(event_target_value(&ev))
                    />
                    <button on:click=create>"Create"</button>
                    <button on:click=move |_| creating.set(false)>"Cancel"</button>
                </div>
            </Show>
        </div>
    }
}

/// One form of the template: its pages with the parameters always shown.
#[component]
fn FormViewer(id: SectionId) -> impl IntoView {
    let state = expect_context::<AppState>();
    let slot = SectionSlot::new(Scope::Capture, id);
    let pdf_input = NodeRef::<html::Input>::new();
    let name = Memo::new(move |_| slot.with(&state, |s| s.name.clone()).unwrap_or_default());

    view! {
        <div class="section-panel">
            <div class="section-header">
                <span class="section-name">{move || name.get()}</span>
                <div style="flex: 1;"></div>
                <button on:click=move |_| {
                    if let Some(el) = pdf_input.get_untracked() {
                        el.click();
                    }
                }>"Import PDF"</button>
                <input
                    node_ref=pdf_input
                    type="file"
                    accept="application/pdf,.pdf"
                    style="display: none;"
                    on:change=move |ev| {
                        if let Some(file) = dom::take_file(&ev) {
                            spawn_local(actions::upload_document(state, id as i64, file));
                        }
                    }
                />
            </div>
            <div node_ref=slot.refs.root class="section-body" style="position: relative;">
                <PageViewer slot=slot />
                <SectionCanvas slot=slot view_only=true />
            </div>
            <ParamsTable slot=slot read_only=true />
        </div>
    }
}
