use contracts::domain::a003_order::Order;
use contracts::shared::ids::EntityId;
use leptos::prelude::*;

use super::store::{use_orders, OrdersStore};

/// One-line summary shown under the order number.
pub fn order_summary(order: &Order) -> String {
    let status = order.status().unwrap_or_else(|| "pending".to_string());
    let mut parts = vec![status];
    if let Some(total) = order.total() {
        parts.push(format!("{:.2}", total));
    }
    if let Some(created) = order.created_at() {
        parts.push(created.chars().take(10).collect());
    }
    parts.join(" · ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub id: EntityId,
    pub title: String,
    pub summary: String,
    pub is_new: bool,
}

pub fn order_rows(store: &OrdersStore) -> Vec<OrderRow> {
    store.orders.with(|orders| {
        orders
            .iter()
            .map(|order| OrderRow {
                id: order.id.clone(),
                title: format!("Order #{}", order.id),
                summary: order_summary(order),
                is_new: store.is_new(&order.id),
            })
            .collect()
    })
}

#[component]
#[allow(non_snake_case)]
pub fn OrdersPage() -> impl IntoView {
    let orders = use_orders();
    let list = orders.orders;
    let loading = orders.loading;
    // Copy handle, so the nested Show children stay `Fn`.
    let store = StoredValue::new(orders);

    view! {
        <div class="page">
            <div class="header">
                <div class="header__content">
                    <h1 class="header__title">"Orders"</h1>
                </div>
            </div>

            <Show when=move || !loading.get() || !list.with(Vec::is_empty) fallback=|| view! { <div class="loader">"Loading..."</div> }>
                <Show
                    when=move || !list.with(Vec::is_empty)
                    fallback=|| view! { <div class="empty-state">"No orders yet"</div> }
                >
                    {move || {
                        store
                            .with_value(order_rows)
                            .into_iter()
                            .map(|row| {
                                let OrderRow { id, title, summary, is_new } = row;
                                view! {
                                    <div
                                        class=if is_new { "order-row order-row--new" } else { "order-row" }
                                        on:click=move |_| store.with_value(|s| s.mark_order_as_viewed(&id))
                                    >
                                        <div class="order-row__title">
                                            {title}
                                            {is_new.then(|| view! { <span class="badge">"New"</span> })}
                                        </div>
                                        <div class="order-row__summary">{summary}</div>
                                    </div>
                                }
                            })
                            .collect_view()
                    }}
                </Show>
            </Show>
        </div>
    }
}
