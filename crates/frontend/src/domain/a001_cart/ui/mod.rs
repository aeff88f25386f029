use contracts::domain::a001_cart::CartItem;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;

use super::store::{use_cart, CartStore};
use crate::layout::navigation::{use_nav, Page};
use crate::shared::icons::icon;
use crate::shared::toast::{use_toast, ToastService};

/// Run a cart mutation in the background and surface failures as a toast.
fn run<F, Fut>(cart: &CartStore, toast: &ToastService, op: F)
where
    F: FnOnce(CartStore) -> Fut + 'static,
    Fut: std::future::Future<Output = Result<(), crate::shared::http::ApiError>> + 'static,
{
    let cart = cart.clone();
    let toast = toast.clone();
    spawn_local(async move {
        if let Err(e) = op(cart).await {
            toast.error(e.to_string());
        }
    });
}

#[component]
#[allow(non_snake_case)]
fn CartRow(item: CartItem) -> impl IntoView {
    let cart = use_cart();
    let toast = use_toast();
    let key = item.id.to_string();
    let quantity = item.quantity;

    let change = {
        let cart = cart.clone();
        let toast = toast.clone();
        let key = key.clone();
        move |next: u32| {
            let key = key.clone();
            run(&cart, &toast, move |cart| async move { cart.update_qty(&key, next).await });
        }
    };
    let dec = change.clone();
    let inc = change;
    let remove = move |_| {
        let key = key.clone();
        run(&cart, &toast, move |cart| async move { cart.remove_from_cart(&key).await });
    };

    view! {
        <div class="cart-row">
            <img class="cart-row__image" src=item.image.clone() alt=item.name.clone() />
            <div class="cart-row__info">
                <div class="cart-row__name">{item.name.clone()}</div>
                <div class="cart-row__price">{format!("{:.2}", item.price)}</div>
            </div>
            <div class="cart-row__qty">
                <button class="button button--secondary" on:click=move |_| dec(quantity.saturating_sub(1))>
                    {icon("minus")}
                </button>
                <span>{quantity}</span>
                <button class="button button--secondary" on:click=move |_| inc(quantity + 1)>
                    {icon("plus")}
                </button>
            </div>
            <div class="cart-row__total">{format!("{:.2}", item.line_total())}</div>
            <button class="button button--ghost" on:click=remove>{icon("trash")}</button>
        </div>
    }
}

#[component]
#[allow(non_snake_case)]
pub fn CartPage() -> impl IntoView {
    let cart = use_cart();
    let toast = use_toast();
    let nav = use_nav();
    let items = cart.items;
    let (checking_out, set_checking_out) = signal(false);

    let clear = {
        let cart = cart.clone();
        let toast = toast.clone();
        move |_| run(&cart, &toast, |cart| async move { cart.clear_cart().await })
    };

    let checkout = {
        let cart = cart.clone();
        let toast = toast.clone();
        move |_| {
            let cart = cart.clone();
            let toast = toast.clone();
            set_checking_out.set(true);
            spawn_local(async move {
                match cart.checkout().await {
                    Ok(order_id) => {
                        let label = order_id.map(|id| format!(" #{}", id)).unwrap_or_default();
                        toast.success(format!("Order{} placed", label));
                        nav.go(Page::Orders);
                    }
                    Err(e) => toast.error(e.to_string()),
                }
                set_checking_out.set(false);
            });
        }
    };

    let count = {
        let cart = cart.clone();
        move || cart.cart_count()
    };
    let total = move || cart.cart_total();

    view! {
        <div class="page">
            <div class="header">
                <div class="header__content">
                    <h1 class="header__title">"Cart"</h1>
                </div>
                <div class="header__actions">
                    <Button
                        size=ButtonSize::Small
                        appearance=ButtonAppearance::Secondary
                        disabled=Signal::derive(move || items.with(Vec::is_empty))
                        on_click=clear
                    >
                        "Clear"
                    </Button>
                </div>
            </div>

            <Show
                when=move || !items.with(Vec::is_empty)
                fallback=|| view! { <div class="empty-state">"Your cart is empty"</div> }
            >
                <div class="cart-list">
                    <For
                        each=move || items.get()
                        key=|item| (item.id.clone(), item.quantity)
                        children=|item| view! { <CartRow item=item /> }
                    />
                </div>
                <div class="cart-summary">
                    <span>{count.clone()} " items"</span>
                    <span class="cart-summary__total">
                        {let total = total.clone(); move || format!("{:.2}", total())}
                    </span>
                    <Button
                        appearance=ButtonAppearance::Primary
                        disabled=checking_out
                        on_click=checkout.clone()
                    >
                        {move || if checking_out.get() { "Placing order..." } else { "Checkout" }}
                    </Button>
                </div>
            </Show>
        </div>
    }
}
