use leptos::prelude::*;
use template_core::geometry::LayoutProbe;
use wasm_bindgen_futures::spawn_local;

use crate::actions::{self, SectionSlot};
use crate::overlays;
use crate::state::AppState;

/// Keep the decoded size of an image whose size was not known at import.
fn record_size(state: &AppState, slot: SectionSlot) {
    let Some(size) = slot.refs.probe().and_then(|layout| layout.natural_size()) else {
        return;
    };
    let missing = slot.read(state, |s| !s.is_placeholder() && !s.page_sizes.contains_key(&s.page));
    if missing == Some(true) {
        let _ = slot.edit(state, |s| Ok(s.record_page_size(size.0, size.1)));
        log::debug!("section {}: page size {}x{}", slot.id, size.0, size.1);
    }
}

/// Fixed-size box the page image is letterboxed into.
#[component]
pub fn PageViewer(slot: SectionSlot) -> impl IntoView {
    let state = expect_context::<AppState>();
    let image = Memo::new(move |_| slot.with(&state, |s| s.current_image().map(str::to_string)).flatten());
    let has_image = move || image.with(Option::is_some);

    view! {
        <div
            node_ref=slot.refs.container
            class="page-container"
            style="width: 800px; height: 1131px; display: flex; align-items: center; justify-content: center; background: #f3f3f3;"
        >
            <img
                node_ref=slot.refs.image
                alt="page"
                src=move || image.get().unwrap_or_default()
                style=move || if has_image() { "max-width: 100%; max-height: 100%;" } else { "display: none;" }
                on:load=move |_| {
                    record_size(&state, slot);
                    slot.request_sync();
                }
            />
            <Show when=move || !has_image()>
                <div class="placeholder">"Import an image or PDF to start"</div>
            </Show>
        </div>
        <Pagination slot=slot />
    }
}

#[derive(Clone, Copy, PartialEq)]
struct Pages {
    page: u32,
    total: u32,
    previous: Option<u32>,
    next: Option<u32>,
}

#[component]
fn Pagination(slot: SectionSlot) -> impl IntoView {
    let state = expect_context::<AppState>();
    let pages = Memo::new(move |_| {
        // without an open document only stored pages can be shown
        let stored_only = overlays::document(slot.key()).is_none();
        slot.with(&state, |s| {
            (s.has_document() || s.total_pages > 1).then(|| Pages {
                page: s.page,
                total: s.total_pages,
                previous: s.neighbour_page(false, stored_only),
                next: s.neighbour_page(true, stored_only),
            })
        })
        .flatten()
    });
    let go = move |page: Option<u32>| {
        if let Some(page) = page {
            spawn_local(actions::change_page(state, slot, page));
        }
    };

    move || {
        pages.get().map(|Pages { page, total, previous, next }| view! {
            <div class="pagination">
                <button disabled={previous.is_none()} on:click=move |_| go(previous)>"Previous"</button>
                <span>{format!("Page {page} of {total}")}</span>
                <button disabled={next.is_none()} on:click=move |_| go(next)>"Next"</button>
            </div>
        })
    }
}
