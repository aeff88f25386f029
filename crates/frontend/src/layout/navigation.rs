use leptos::prelude::*;
use std::collections::HashMap;

/// Top-level screens reachable from the bottom navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Catalog,
    Cart,
    SmartLists,
    Orders,
    Notifications,
    Profile,
}

impl Page {
    pub fn key(&self) -> &'static str {
        match self {
            Page::Catalog => "catalog",
            Page::Cart => "cart",
            Page::SmartLists => "lists",
            Page::Orders => "orders",
            Page::Notifications => "notifications",
            Page::Profile => "profile",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Catalog => "Shop",
            Page::Cart => "Cart",
            Page::SmartLists => "Lists",
            Page::Orders => "Orders",
            Page::Notifications => "Inbox",
            Page::Profile => "Profile",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().into_iter().find(|p| p.key() == key)
    }

    pub fn all() -> [Page; 6] {
        [
            Page::Catalog,
            Page::Cart,
            Page::SmartLists,
            Page::Orders,
            Page::Notifications,
            Page::Profile,
        ]
    }
}

/// `?page=<key>` query for a page.
pub fn page_query(page: Page) -> String {
    let params = HashMap::from([("page".to_string(), page.key().to_string())]);
    format!("?{}", serde_qs::to_string(&params).unwrap_or_default())
}

/// Page named by a location search string, if any.
pub fn page_from_search(search: &str) -> Option<Page> {
    let params: HashMap<String, String> =
        serde_qs::from_str(search.trim_start_matches('?')).unwrap_or_default();
    params.get("page").and_then(|key| Page::from_key(key))
}

#[derive(Clone, Copy)]
pub struct NavContext {
    pub active: RwSignal<Page>,
}

impl NavContext {
    pub fn new() -> Self {
        Self {
            active: RwSignal::new(Page::default()),
        }
    }

    pub fn go(&self, page: Page) {
        self.active.set(page);
    }

    /// Restore the page from the URL and keep the URL in step with it.
    pub fn init_url_sync(&self) {
        #[cfg(target_arch = "wasm32")]
        {
            use web_sys::window;

            let search = window()
                .and_then(|w| w.location().search().ok())
                .unwrap_or_default();
            if let Some(page) = page_from_search(&search) {
                self.active.set(page);
            }

            let active = self.active;
            Effect::new(move |_| {
                let new_url = page_query(active.get());
                let current = window()
                    .and_then(|w| w.location().search().ok())
                    .unwrap_or_default();
                if current == new_url {
                    return;
                }
                if let Some(history) = window().and_then(|w| w.history().ok()) {
                    let _ = history.replace_state_with_url(
                        &wasm_bindgen::JsValue::NULL,
                        "",
                        Some(&new_url),
                    );
                }
            });
        }
    }
}

impl Default for NavContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Hook to access navigation
pub fn use_nav() -> NavContext {
    use_context::<NavContext>().expect("NavContext not found in component tree")
}
