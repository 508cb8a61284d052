use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use template_core::binding::SectionOverlay;
use template_core::geometry::Point;
use template_core::Parameter;
use wasm_bindgen_futures::spawn_local;

use crate::actions::SectionSlot;
use crate::canvas::CanvasHost;
use crate::dom;
use crate::overlays;
use crate::state::AppState;

fn local_point(ev: &web_sys::PointerEvent) -> Point {
    Point::new(ev.offset_x() as f64, ev.offset_y() as f64)
}

/// The drawing surface laid over a section's page image.
#[component]
pub fn SectionCanvas(slot: SectionSlot, #[prop(optional)] view_only: bool) -> impl IntoView {
    let state = expect_context::<AppState>();
    let key = slot.key();
    let wrapper_ref = NodeRef::<html::Div>::new();
    let canvas_ref = NodeRef::<html::Canvas>::new();
    let bound = RwSignal::new(false);

    // Register once both elements exist, then bind in the background.
    Effect::new(move |registered: Option<bool>| {
        if registered == Some(true) {
            return true;
        }
        let (Some(wrapper), Some(canvas)) = (wrapper_ref.get(), canvas_ref.get()) else {
            return false;
        };
        let config = state.config.get_value();
        overlays::register(key, SectionOverlay::new(CanvasHost::new(wrapper.into(), canvas), &config, view_only));
        spawn_local(async move {
            if overlays::initialize(key, &config).await {
                bound.set(true);
            } else {
                log::warn!("section {}: drawing surface never became ready", slot.id);
            }
        });
        true
    });

    let selecting = Memo::new(move |_| slot.with(&state, |s| s.is_selecting).unwrap_or(false));
    let page = Memo::new(move |_| slot.with(&state, |s| s.page).unwrap_or(1));
    let params = Memo::new(move |_| slot.with(&state, |s| s.active_params().to_vec()).unwrap_or_default());

    Effect::new(move |_| {
        let on = selecting.get();
        if !bound.get() {
            return;
        }
        let place = overlays::with_overlay(key, |o| o.set_selecting(on)).unwrap_or(false);
        if place || view_only {
            slot.request_sync();
        }
    });

    Effect::new(move |prev: Option<u32>| {
        let now = page.get();
        if prev.is_some_and(|p| p != now) {
            let list: Vec<Parameter> = params.get_untracked();
            overlays::with_overlay(key, |o| o.page_changed(&list));
        }
        now
    });

    Effect::new(move |_| {
        bound.track();
        params.with(|list| overlays::with_overlay(key, |o| o.show_params(list)));
    });

    Effect::new(move |_| {
        slot.resync.track();
        if !bound.get() {
            return;
        }
        let config = state.config.get_value();
        spawn_local(async move {
            overlays::sync(key, slot.refs, &config).await;
        });
    });

    let refs = slot.refs;
    let on_scroll = window_event_listener(ev::scroll, move |_| overlays::follow(key, &refs));
    let on_resize = window_event_listener(ev::resize, move |_| overlays::follow(key, &refs));
    on_cleanup(move || {
        on_scroll.remove();
        on_resize.remove();
        overlays::unregister(key);
    });

    let on_down = move |ev: web_sys::PointerEvent| {
        if overlays::with_overlay(key, |o| o.pointer_down(local_point(&ev))).unwrap_or(false) {
            ev.prevent_default();
            if let Some(canvas) = canvas_ref.get_untracked() {
                let _ = canvas.set_pointer_capture(ev.pointer_id());
            }
        }
    };
    let on_move = move |ev: web_sys::PointerEvent| {
        overlays::with_overlay(key, |o| o.pointer_move(local_point(&ev)));
    };
    let on_up = move |ev: web_sys::PointerEvent| {
        let Some(anchor) = slot.read(&state, |s| s.anchor()) else { return };
        let emitted = overlays::with_overlay(key, |o| o.pointer_up(local_point(&ev), anchor, dom::now_ms())).flatten();
        if let Some(param) = emitted {
            log::info!("section {}: new parameter {}", slot.id, param.id);
            let _ = slot.edit(&state, |s| {
                s.add_parameter(param);
                Ok(())
            });
        }
    };

    view! {
        <div
            node_ref=wrapper_ref
            class="overlay-wrapper"
            style="position: absolute; left: 0; top: 0; visibility: hidden; pointer-events: none;"
        >
            <canvas
                node_ref=canvas_ref
                class="overlay-canvas"
                style="display: block; touch-action: none;"
                on:pointerdown=on_down
                on:pointermove=on_move
                on:pointerup=on_up
            ></canvas>
        </div>
    }
}
