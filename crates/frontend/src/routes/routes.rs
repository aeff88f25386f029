use crate::domain::a001_cart::ui::CartPage;
use crate::domain::a002_smart_list::ui::SmartListsPage;
use crate::domain::a003_order::ui::OrdersPage;
use crate::domain::a004_product::ui::CatalogPage;
use crate::layout::navigation::{use_nav, Page};
use crate::layout::Shell;
use crate::system::auth::guard::RequireAuth;
use crate::system::notifications::ui::NotificationsPage;
use crate::system::pages::login::LoginPage;
use crate::system::pages::profile::ProfilePage;
use leptos::prelude::*;

fn page_view(page: Page) -> AnyView {
    match page {
        Page::Catalog => view! { <CatalogPage /> }.into_any(),
        Page::Cart => view! { <CartPage /> }.into_any(),
        Page::SmartLists => view! { <SmartListsPage /> }.into_any(),
        Page::Orders => view! { <OrdersPage /> }.into_any(),
        Page::Notifications => view! { <NotificationsPage /> }.into_any(),
        Page::Profile => view! { <ProfilePage /> }.into_any(),
    }
}

#[component]
fn MainLayout() -> impl IntoView {
    let nav = use_nav();

    // Keep ?page= in the address bar in step with the active page.
    nav.init_url_sync();

    view! {
        <Shell>
            {move || page_view(nav.active.get())}
        </Shell>
    }
}

#[component]
pub fn AppRoutes() -> impl IntoView {
    view! {
        <RequireAuth fallback=|| view! { <LoginPage /> }>
            <MainLayout />
        </RequireAuth>
    }
}
