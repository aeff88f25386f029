use contracts::enums::theme::Theme;
use leptos::prelude::*;
use thaw::*;

use super::use_theme;

/// Light/dark switch for the profile page.
#[component]
pub fn ThemeToggle() -> impl IntoView {
    let store = use_theme();
    let theme = store.theme;

    view! {
        <Button
            size=ButtonSize::Small
            appearance=ButtonAppearance::Secondary
            on_click=move |_| store.toggle_theme()
        >
            {move || match theme.get() {
                Theme::Light => "Dark mode",
                Theme::Dark => "Light mode",
            }}
        </Button>
    }
}
