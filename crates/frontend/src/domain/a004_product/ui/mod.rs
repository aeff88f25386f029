use contracts::domain::a004_product::Product;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;

use super::api::{self, ProductQuery};
use crate::domain::a001_cart::store::use_cart;
use crate::domain::a002_smart_list::store::use_smart_lists;
use crate::shared::http::use_api_client;
use crate::shared::icons::icon;
use crate::shared::toast::use_toast;

/// Case-insensitive match on name and category.
pub fn filter_products(products: &[Product], search: &str) -> Vec<Product> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return products.to_vec();
    }
    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle) || p.category.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Slug when the catalog has one, otherwise the id.
fn cart_identifier(product: &Product) -> String {
    product
        .slug
        .clone()
        .unwrap_or_else(|| product.id.to_string())
}

#[component]
#[allow(non_snake_case)]
pub fn CatalogPage() -> impl IntoView {
    let client = use_api_client();
    let cart = use_cart();
    let lists = use_smart_lists();
    let toast = use_toast();

    let (products, set_products) = signal::<Vec<Product>>(Vec::new());
    let (loading, set_loading) = signal(false);
    let (error, set_error) = signal::<Option<String>>(None);
    let search = RwSignal::new(String::new());

    let load = {
        let client = client.clone();
        move || {
            let client = client.clone();
            set_loading.set(true);
            spawn_local(async move {
                match api::fetch_catalog(&client, &ProductQuery::default()).await {
                    Ok(items) => {
                        set_products.set(items);
                        set_error.set(None);
                    }
                    Err(e) => {
                        log::error!("Failed to load catalog: {}", e);
                        set_error.set(Some(e.to_string()));
                    }
                }
                set_loading.set(false);
            });
        }
    };
    load();

    let visible = move || products.with(|all| filter_products(all, &search.get()));

    let add_to_cart = {
        let cart = cart.clone();
        let toast = toast.clone();
        move |product: Product| {
            let cart = cart.clone();
            let toast = toast.clone();
            spawn_local(async move {
                match cart.add_to_cart(&cart_identifier(&product), 1, &product.name).await {
                    Ok(()) => toast.success(format!("{} added to cart", product.name)),
                    Err(e) => toast.error(e.to_string()),
                }
            });
        }
    };

    let add_to_first_list = {
        let lists = lists.clone();
        let toast = toast.clone();
        move |product: Product| {
            let lists = lists.clone();
            let toast = toast.clone();
            let Some(list) = lists.lists.with_untracked(|l| l.first().cloned()) else {
                toast.error("Create a smart list first");
                return;
            };
            spawn_local(async move {
                match lists.add_item_to_list(&list.id, product.id.clone(), 1).await {
                    Ok(()) => toast.success(format!("{} added to {}", product.name, list.name)),
                    Err(e) => toast.error(e.to_string()),
                }
            });
        }
    };

    view! {
        <div class="page">
            <div class="header">
                <div class="header__content">
                    <h1 class="header__title">"Catalog"</h1>
                </div>
                <div class="header__actions">
                    <Input value=search placeholder="Search products" />
                    <Button appearance=ButtonAppearance::Secondary on_click={
                        let load = load.clone();
                        move |_| load()
                    }>
                        "Refresh"
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
                <div class="product-grid">
                    <For
                        each=visible.clone()
                        key=|p| p.id.clone()
                        children={
                            let add_to_cart = add_to_cart.clone();
                            let add_to_first_list = add_to_first_list.clone();
                            move |product: Product| {
                                let for_cart = product.clone();
                                let for_list = product.clone();
                                let add_to_cart = add_to_cart.clone();
                                let add_to_first_list = add_to_first_list.clone();
                                view! {
                                    <div class="product-card">
                                        <img class="product-card__image" src=product.image.clone() alt=product.name.clone() />
                                        <div class="product-card__name">{product.name.clone()}</div>
                                        <div class="product-card__category">{product.category.clone()}</div>
                                        <div class="product-card__price">{format!("{:.2}", product.price)}</div>
                                        <div class="product-card__actions">
                                            <button class="button button--primary" on:click=move |_| add_to_cart(for_cart.clone())>
                                                {icon("cart")}
                                                "Add to cart"
                                            </button>
                                            <button class="button button--secondary" on:click=move |_| add_to_first_list(for_list.clone())>
                                                {icon("lists")}
                                            </button>
                                        </div>
                                    </div>
                                }
                            }
                        }
                    />
                </div>
            </Show>
        </div>
    }
}
