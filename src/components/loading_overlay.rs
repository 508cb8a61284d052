use leptos::prelude::*;
use crate::state::AppState;

#[component]
pub fn LoadingOverlay() -> impl IntoView {
    let state = expect_context::<AppState>();
    let open = move || state.loading.with(|l| l.open);

    view! {
        <Show when=open>
            <div class="loading-overlay">
                <div class="loading-box">
                    <div class="spinner"></div>
                    <div class="loading-text">{move || state.loading.with(|l| l.text.clone())}</div>
                    {move || state.loading.with(|l| l.progress).map(|pct| view! {
                        <div class="progress">
                            <div class="progress-bar" style=format!("width: {pct}%")></div>
                        </div>
                    })}
                </div>
            </div>
        </Show>
    }
}
