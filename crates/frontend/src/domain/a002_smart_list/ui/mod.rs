use contracts::domain::a002_smart_list::{SmartList, SmartListItem};
use contracts::shared::ids::EntityId;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;

use super::store::use_smart_lists;
use crate::shared::icons::icon;
use crate::shared::toast::use_toast;

#[component]
#[allow(non_snake_case)]
fn ListItemRow(list_id: EntityId, item: SmartListItem) -> impl IntoView {
    let lists = use_smart_lists();
    let toast = use_toast();
    let item_id = item.id.clone();

    let dec = {
        let lists = lists.clone();
        let (list_id, item_id) = (list_id.clone(), item_id.clone());
        move |_| lists.decrease_qty(&list_id, &item_id)
    };
    let inc = {
        let lists = lists.clone();
        let (list_id, item_id) = (list_id.clone(), item_id.clone());
        move |_| lists.increase_qty(&list_id, &item_id)
    };
    let remove = move |_| {
        let lists = lists.clone();
        let toast = toast.clone();
        let (list_id, item_id) = (list_id.clone(), item_id.clone());
        spawn_local(async move {
            if let Err(e) = lists.remove_item(&list_id, &item_id).await {
                toast.error(e.to_string());
            }
        });
    };

    view! {
        <div class="list-item">
            <div class="list-item__name">{item.product.name.clone()}</div>
            <div class="list-item__qty">
                <button class="button button--secondary" on:click=dec>{icon("minus")}</button>
                <span>{item.quantity}</span>
                <button class="button button--secondary" on:click=inc>{icon("plus")}</button>
            </div>
            <div class="list-item__price">
                {format!("{:.2}", item.product.price * f64::from(item.quantity))}
            </div>
            <button class="button button--ghost" on:click=remove>{icon("trash")}</button>
        </div>
    }
}

#[component]
#[allow(non_snake_case)]
fn SmartListCard(list: SmartList) -> impl IntoView {
    let lists = use_smart_lists();
    let toast = use_toast();
    let list_id = list.id.clone();

    let order_all = {
        let lists = lists.clone();
        let toast = toast.clone();
        let list_id = list_id.clone();
        move |_| {
            let lists = lists.clone();
            let toast = toast.clone();
            let list_id = list_id.clone();
            spawn_local(async move {
                match lists.order_all(&list_id).await {
                    Ok(_) => toast.success("Order placed from list"),
                    Err(e) => toast.error(e.to_string()),
                }
            });
        }
    };
    let delete = move |_| {
        let lists = lists.clone();
        let toast = toast.clone();
        let list_id = list_id.clone();
        spawn_local(async move {
            if let Err(e) = lists.delete_list(&list_id).await {
                toast.error(e.to_string());
            }
        });
    };

    let rows = list
        .items
        .iter()
        .cloned()
        .map(|item| view! { <ListItemRow list_id=list.id.clone() item=item /> })
        .collect_view();

    view! {
        <div class="smart-list">
            <div class="smart-list__header">
                <span class="smart-list__name">{list.name.clone()}</span>
                <span class="smart-list__meta">
                    {format!("{} items, est. {:.2}", list.item_count(), list.estimated_total())}
                </span>
            </div>
            <div class="smart-list__items">{rows}</div>
            <div class="smart-list__actions">
                <Button
                    size=ButtonSize::Small
                    appearance=ButtonAppearance::Primary
                    disabled=list.items.is_empty()
                    on_click=order_all
                >
                    "Order all"
                </Button>
                <Button size=ButtonSize::Small appearance=ButtonAppearance::Subtle on_click=delete>
                    "Delete list"
                </Button>
            </div>
        </div>
    }
}

#[component]
#[allow(non_snake_case)]
pub fn SmartListsPage() -> impl IntoView {
    let store = use_smart_lists();
    let toast = use_toast();
    let lists = store.lists;
    let loading = store.loading;
    let error = store.error;
    let new_name = RwSignal::new(String::new());

    // Item names come from the catalog; lists load with the session.
    {
        let store = store.clone();
        spawn_local(async move {
            if let Err(e) = store.fetch_catalog().await {
                log::warn!("Smart list catalog unavailable: {}", e);
            }
        });
    }

    let create = move |_| {
        let name = new_name.get_untracked();
        if name.trim().is_empty() {
            toast.error("List name is required");
            return;
        }
        let store = store.clone();
        let toast = toast.clone();
        spawn_local(async move {
            match store.create_list(name.trim()).await {
                Ok(list) => {
                    new_name.set(String::new());
                    toast.success(format!("Created {}", list.name));
                }
                Err(e) => toast.error(e.to_string()),
            }
        });
    };

    view! {
        <div class="page">
            <div class="header">
                <div class="header__content">
                    <h1 class="header__title">"Smart Lists"</h1>
                </div>
                <div class="header__actions">
                    <Input value=new_name placeholder="New list name" />
                    <Button appearance=ButtonAppearance::Primary on_click=create>
                        "Create"
                    </Button>
                </div>
            </div>

            {move || error.get().map(|e| view! {
                <div class="warning-box">
                    <span class="warning-box__icon">"⚠"</span>
                    <span class="warning-box__text">{e}</span>
                </div>
            })}

            <Show when=move || !loading.get() fallback=|| view! { <Spinner /> }>
                <Show
                    when=move || !lists.with(Vec::is_empty)
                    fallback=|| view! { <div class="empty-state">"No smart lists yet"</div> }
                >
                    {move || {
                        lists
                            .get()
                            .into_iter()
                            .map(|list| view! { <SmartListCard list=list /> })
                            .collect_view()
                    }}
                </Show>
            </Show>
        </div>
    }
}
