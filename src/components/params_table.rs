use leptos::prelude::*;
use template_core::model::{ParamField, ParamType};
use template_core::Parameter;

use crate::actions::SectionSlot;
use crate::dom;
use crate::state::AppState;

#[derive(Clone, PartialEq)]
struct Group {
    /// `None` for a single-image section.
    page: Option<u32>,
    editable: bool,
    params: Vec<Parameter>,
}

fn edit(state: &AppState, slot: SectionSlot, page: Option<u32>, index: usize, field: ParamField) {
    if let Err(e) = slot.edit(state, |s| s.update_parameter(page, index, field)) {
        log::warn!("section {}: {e}", slot.id);
        dom::alert(&e.to_string());
    }
}

/// Parameters of a section, grouped by page for documents. Rows on pages
/// other than the current one are read-only.
#[component]
pub fn ParamsTable(slot: SectionSlot, #[prop(optional)] read_only: bool) -> impl IntoView {
    let state = expect_context::<AppState>();

    let groups = Memo::new(move |_| {
        slot.with(&state, |s| {
            if s.has_document() {
                s.params_by_page()
                    .filter(|(_, list)| !list.is_empty())
                    .map(|(page, list)| Group {
                        page: Some(page),
                        editable: !read_only && page == s.page,
                        params: list.to_vec(),
                    })
                    .collect::<Vec<_>>()
            } else {
                vec![Group { page: None, editable: !read_only, params: s.params.clone() }]
            }
        })
        .unwrap_or_default()
    });
    let current_page = Memo::new(move |_| slot.with(&state, |s| s.page).unwrap_or(1));

    let delete = move |page: Option<u32>, index: usize| {
        let other_page = page.is_some_and(|p| p != current_page.get_untracked());
        if other_page && !dom::confirm(&format!("Delete this parameter from page {}?", page.unwrap_or_default())) {
            return;
        }
        match slot.edit(&state, |s| s.delete_parameter(page, index)) {
            Ok(p) => log::info!("section {}: deleted {}", slot.id, p.id),
            Err(e) => dom::alert(&e.to_string()),
        }
    };

    let row = move |page: Option<u32>, editable: bool, index: usize, p: Parameter| {
        let disabled = !editable;
        let current_type = p.param_type;
        view! {
            <tr class={if editable { "param-row" } else { "param-row readonly" }}>
                <td>
                    <input
                        type="text"
                        prop:value={p.id.clone()}
                        disabled=disabled
                        on:change=move |ev| edit(&state, slot, page, index, ParamField::Id(event_target_value(&ev)))
                    />
                </td>
                <td>
                    <select
                        disabled=disabled
                        on:change=move |ev| { match event_target_value(&ev).parse::<ParamType>() {
                            Ok(t) => edit(&state, slot, page, index, ParamField::Type(t)),
                            Err(e) => log::warn!("{e}"),
                        } }
                    >
                        {ParamType::ALL.into_iter().map(|t| view! {
                            <option value=t.as_str() selected={t == current_type}>{t.as_str()}</option>
                        }).collect_view()}
                    </select>
                </td>
                <td>
                    <input
                        type="checkbox"
                        prop:checked=p.is_multiline
                        disabled=disabled
                        on:change=move |ev| edit(&state, slot, page, index, ParamField::Multiline(event_target_checked(&ev)))
                    />
                </td>
                <td class="coords">{format!("({}, {}) - ({}, {})", p.x1, p.y1, p.x2, p.y2)}</td>
                <Show when=move || !read_only>
                    <td><button class="delete" on:click=move |_| delete(page, index)>"Delete"</button></td>
                </Show>
            </tr>
        }
    };

    view! {
        <table class="params-table">
            <thead>
                <tr>
                    <th>"ID"</th>
                    <th>"Type"</th>
                    <th>"Multiline"</th>
                    <th>"Box"</th>
                </tr>
            </thead>
            {move || groups.get().into_iter().map(|group| {
                let Group { page, editable, params } = group;
                view! {
                    <tbody>
                        {page.map(|n| view! {
                            <tr class="page-heading">
                                <td colspan="5">
                                    {if editable { format!("Page {n} (current)") } else { format!("Page {n}") }}
                                </td>
                            </tr>
                        })}
                        {params.into_iter().enumerate().map(|(i, p)| row(page, editable, i, p)).collect_view()}
                    </tbody>
                }
            }).collect_view()}
        </table>
    }
}
