use leptos::prelude::*;
use crate::state::{AppState, Screen};
use crate::components::capture_screen::CaptureScreen;
use crate::components::loading_overlay::LoadingOverlay;
use crate::components::template_editor::TemplateEditor;

#[component]
pub fn App() -> impl IntoView {
    let state = AppState::new();
    provide_context(state);

    wasm_bindgen_futures::spawn_local(async move {
        state.refresh_templates().await;
    });

    view! {
        <div class="app">
            <NavBar />
            <MainArea />
            <LoadingOverlay />
        </div>
    }
}

#[component]
fn NavBar() -> impl IntoView {
    let state = expect_context::<AppState>();
    let tab = move |screen: Screen, label: &'static str| {
        view! {
            <button
                class=move || if state.screen.get() == screen { "nav-tab active" } else { "nav-tab" }
                on:click=move |_| state.screen.set(screen)
            >{label}</button>
        }
    };

    view! {
        <div class="toolbar">
            <span class="toolbar-brand"><b>"template"</b><i>"studio"</i></span>
            <div style="flex: 1;"></div>
            {tab(Screen::Editor, "Templates")}
            {tab(Screen::Capture, "Capture")}
        </div>
    }
}

#[component]
fn MainArea() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <div class="main">
            {move || match state.screen.get() {
                Screen::Editor => view! { <TemplateEditor /> }.into_any(),
                Screen::Capture => view! { <CaptureScreen /> }.into_any(),
            }}
        </div>
    }
}
