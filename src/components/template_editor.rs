use leptos::prelude::*;
use template_api::NewTemplate;
use template_core::InputError;
use wasm_bindgen_futures::spawn_local;

use crate::components::section_panel::SectionPanel;
use crate::dom;
use crate::state::AppState;

#[component]
pub fn TemplateEditor() -> impl IntoView {
    let state = expect_context::<AppState>();
    let ids = Memo::new(move |_| state.editor.with(|w| w.ids()));

    view! {
        <div class="template-editor">
            <div class="editor-bar">
                <TemplatePicker />
                <button on:click=move |_| {
                    let mut id = 0;
                    state.editor.update(|w| id = w.add_section());
                    log::info!("added section {id}");
                }>"Add section"</button>
            </div>
            <For each=move || ids.get() key=|id| *id let:id>
                <SectionPanel id=id />
            </For>
        </div>
    }
}

/// Template dropdown plus the create-template dialog.
#[component]
pub fn TemplatePicker() -> impl IntoView {
    let state = expect_context::<AppState>();
    let creating = RwSignal::new(false);
    let new_name = RwSignal::new(String::new());
    let new_description = RwSignal::new(String::new());

    let create = move |_: web_sys::MouseEvent| {
        let name = new_name.get_untracked().trim().to_string();
        if name.is_empty() {
            dom::alert(&InputError::EmptyName.to_string());
            return;
        }
        let description = Some(new_description.get_untracked()).filter(|d| !d.trim().is_empty());
        spawn_local(async move {
            let _busy = state.busy("Creating template...");
            match state.api().create_template(&NewTemplate { name, description }).await {
                Ok(created) => {
                    log::info!("created template {}", created.id);
                    state.refresh_templates().await;
                    state.selected_template.set(Some(created.id));
                    creating.set(false);
                    new_name.set(String::new());
                    new_description.set(String::new());
                }
                Err(e) => dom::alert(&format!("Could not create template: {e}")),
            }
        });
    };

    view! {
        <div class="template-picker">
            <label>"Template "</label>
            <select on:change=move |ev| {
                state.selected_template.set(event_target_value(&ev).parse::<i64>().ok());
            }>
                <option value="" selected=move || state.selected_template.get().is_none()>"Select a template"</option>
                {move || state.templates.get().into_iter().map(|t| {
                    let id = t.id;
                    view! {
                        <option value=id.to_string() selected=move || state.selected_template.get() == Some(id)>
                            {t.name}
                        </option>
                    }
                }).collect_view()}
            </select>
            <button on:click=move |_| creating.set(true)>"New template"</button>
            <Show when=move || creating.get()>
                <div class="dialog">
                    <input
                        type="text"
                        placeholder="Template name"
                        prop:value=move || new_name.get()
                        on:input=move |ev| new_name.set(event_target_value(&ev))
                    />
                    <input
                        type="text"
                        placeholder="Description"
                        prop:value=move || new_description.get()
                        on:input=move |ev| new_description.set(event_target_value(&ev))
                    />
                    <button on:click=create>"Create"</button>
                    <button on:click=move |_| creating.set(false)>"Cancel"</button>
                </div>
            </Show>
        </div>
    }
}
