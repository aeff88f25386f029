use leptos::prelude::*;

use super::context::use_auth;

/// Renders `children` only for a signed-in customer, `fallback` otherwise.
/// While the first profile fetch is pending a loader is shown instead.
#[component]
pub fn RequireAuth(
    #[prop(optional, into)] fallback: Option<ViewFn>,
    children: ChildrenFn,
) -> impl IntoView {
    let auth = use_auth();
    let loading = auth.loading;
    let user = auth.user;
    let fallback = fallback.unwrap_or_else(|| {
        ViewFn::from(|| view! { <div class="auth-required">"Please sign in to continue."</div> })
    });

    view! {
        <Show
            when=move || !loading.get()
            fallback=|| view! { <div class="app-loader">"Loading..."</div> }
        >
            {
                let children = children.clone();
                let fallback = fallback.clone();
                view! {
                    <Show when=move || user.with(Option::is_some) fallback=fallback>
                        {children()}
                    </Show>
                }
            }
        </Show>
    }
}
