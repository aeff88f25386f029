use leptos::prelude::*;

use super::navigation::{use_nav, Page};
use crate::domain::a001_cart::store::use_cart;
use crate::domain::a002_smart_list::store::use_smart_lists;
use crate::domain::a003_order::store::use_orders;
use crate::shared::icons::icon;
use crate::system::notifications::store::use_notifications;

fn icon_for(page: Page) -> AnyView {
    icon(match page {
        Page::Catalog => "products",
        Page::Cart => "cart",
        Page::SmartLists => "lists",
        Page::Orders => "orders",
        Page::Notifications => "bell",
        Page::Profile => "users",
    })
}

/// Badge text, hidden at zero.
pub fn badge_label(count: usize) -> Option<String> {
    match count {
        0 => None,
        1..=99 => Some(count.to_string()),
        _ => Some("99+".to_string()),
    }
}

#[component]
pub fn BottomNav() -> impl IntoView {
    let nav = use_nav();
    let cart = use_cart();
    let lists = use_smart_lists();
    let orders = use_orders();
    let notifications = use_notifications();

    let badge = move |page: Page| -> usize {
        match page {
            Page::Cart => cart.cart_count() as usize,
            Page::SmartLists => lists.lists_count(),
            Page::Orders => orders.new_orders_count(),
            Page::Notifications => notifications.unread.get(),
            Page::Catalog | Page::Profile => 0,
        }
    };

    view! {
        <nav class="bottom-nav">
            {Page::all()
                .into_iter()
                .map(|page| {
                    let badge = badge.clone();
                    view! {
                        <button
                            class=move || {
                                if nav.active.get() == page {
                                    "bottom-nav__item bottom-nav__item--active"
                                } else {
                                    "bottom-nav__item"
                                }
                            }
                            on:click=move |_| nav.go(page)
                        >
                            {icon_for(page)}
                            <span class="bottom-nav__label">{page.title()}</span>
                            {move || {
                                badge_label(badge(page))
                                    .map(|text| view! { <span class="bottom-nav__badge">{text}</span> })
                            }}
                        </button>
                    }
                })
                .collect_view()}
        </nav>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_label() {
        assert_eq!(badge_label(0), None);
        assert_eq!(badge_label(7).as_deref(), Some("7"));
        assert_eq!(badge_label(120).as_deref(), Some("99+"));
    }
}
