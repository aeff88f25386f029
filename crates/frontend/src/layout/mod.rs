pub mod bottom_nav;
pub mod navigation;

use leptos::prelude::*;

use bottom_nav::BottomNav;
use navigation::use_nav;
use crate::shared::toast::ToastHost;

/// Mobile storefront shell.
///
/// ```text
/// +---------------------------+
/// |  header (page title)      |
/// +---------------------------+
/// |  active page              |
/// +---------------------------+
/// |  bottom navigation        |
/// +---------------------------+
/// ```
#[component]
pub fn Shell(children: Children) -> impl IntoView {
    let nav = use_nav();

    view! {
        <div class="app-layout">
            <header class="app-header">
                <span class="app-header__brand">"Storefront"</span>
                <span class="app-header__title">{move || nav.active.get().title()}</span>
            </header>
            <main class="app-main">{children()}</main>
            <ToastHost />
            <BottomNav />
        </div>
    }
}
