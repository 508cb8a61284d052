use leptos::html;
use leptos::prelude::*;
use template_core::SectionId;
use wasm_bindgen_futures::spawn_local;

use crate::actions::{self, SectionSlot};
use crate::components::page_viewer::PageViewer;
use crate::components::params_table::ParamsTable;
use crate::components::section_canvas::SectionCanvas;
use crate::dom;
use crate::overlays;
use crate::state::{AppState, Scope};

/// One editable section of the template editor.
#[component]
pub fn SectionPanel(id: SectionId) -> impl IntoView {
    let state = expect_context::<AppState>();
    let slot = SectionSlot::new(Scope::Editor, id);
    let ws = slot.workspace(&state);

    let file_input = NodeRef::<html::Input>::new();
    let json_input = NodeRef::<html::Input>::new();

    let name = Memo::new(move |_| slot.with(&state, |s| s.name.clone()).unwrap_or_default());
    let selecting = Memo::new(move |_| slot.with(&state, |s| s.is_selecting).unwrap_or(false));
    let placeholder = Memo::new(move |_| slot.with(&state, |s| s.is_placeholder()).unwrap_or(true));
    let can_remove = Memo::new(move |_| ws.with(|w| w.sections().len() > 1));

    let toggle_selecting = move |_: web_sys::MouseEvent| {
        ws.update(|w| match w.toggle_selecting(id) {
            Ok(on) => log::debug!("section {id}: selecting {on}"),
            Err(e) => log::warn!("{e}"),
        });
    };

    let clear = move |_: web_sys::MouseEvent| {
        let page_scoped = slot.read(&state, |s| s.has_document()).unwrap_or(false);
        let msg = if page_scoped {
            "Are you sure you want to clear all parameters on this page?"
        } else {
            "Are you sure you want to clear all parameters?"
        };
        if !dom::confirm(msg) {
            return;
        }
        if let Ok(n) = slot.edit(&state, |s| Ok(s.clear_parameters())) {
            log::info!("section {id}: cleared {n} parameters");
        }
    };

    let remove = move |_: web_sys::MouseEvent| {
        if !dom::confirm("Remove this section?") {
            return;
        }
        let mut result = Ok(());
        ws.update(|w| result = w.remove_section(id).map(drop));
        match result {
            Ok(()) => overlays::drop_document(slot.key()),
            Err(e) => dom::alert(&e.to_string()),
        }
    };

    let open_picker = move |input: NodeRef<html::Input>| {
        if let Some(el) = input.get_untracked() {
            el.click();
        }
    };

    view! {
        <div class="section-panel">
            <div class="section-header">
                <input
                    class="section-name"
                    type="text"
                    prop:value=move || name.get()
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        if value.trim().is_empty() {
                            dom::alert(&template_core::InputError::EmptyName.to_string());
                            return;
                        }
                        ws.update(|w| {
                            if let Err(e) = w.rename(id, value) {
                                log::warn!("{e}");
                            }
                        });
                    }
                />
                <div style="flex: 1;"></div>
                <button on:click=move |_| open_picker(file_input)>"Import image / PDF"</button>
                <button on:click=move |_| open_picker(json_input)>"Load template"</button>
                <button on:click=move |_| actions::save_local(&state, slot)>"Save locally"</button>
                <button on:click=move |_| spawn_local(actions::upload_form(state, slot))>"Upload to server"</button>
                <button
                    class=move || if selecting.get() { "select-toggle active" } else { "select-toggle" }
                    disabled=move || placeholder.get()
                    on:click=toggle_selecting
                >{move || if selecting.get() { "Stop selecting" } else { "Select parameters" }}</button>
                <button on:click=clear>"Clear"</button>
                <Show when=move || can_remove.get()>
                    <button class="delete" on:click=remove>"Remove section"</button>
                </Show>
                <input
                    node_ref=file_input
                    type="file"
                    accept="image/*,application/pdf"
                    style="display: none;"
                    on:change=move |ev| {
                        if let Some(file) = dom::take_file(&ev) {
                            spawn_local(actions::import_file(state, slot, file));
                        }
                    }
                />
                <input
                    node_ref=json_input
                    type="file"
                    accept="application/json,.json"
                    style="display: none;"
                    on:change=move |ev| {
                        if let Some(file) = dom::take_file(&ev) {
                            spawn_local(actions::load_local(state, slot, file));
                        }
                    }
                />
            </div>
            <div node_ref=slot.refs.root class="section-body" style="position: relative;">
                <PageViewer slot=slot />
                <SectionCanvas slot=slot />
            </div>
            <ParamsTable slot=slot />
        </div>
    }
}
