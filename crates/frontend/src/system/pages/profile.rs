use contracts::domain::a006_address::{Address, AddressDto};
use contracts::system::account::SupportMessageRequest;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;

use crate::shared::http::use_api_client;
use crate::shared::icons::icon;
use crate::shared::theme::theme_toggle::ThemeToggle;
use crate::shared::toast::use_toast;
use crate::system::account::api;
use crate::system::auth::context::use_auth;

#[component]
#[allow(non_snake_case)]
fn AddressBook() -> impl IntoView {
    let client = use_api_client();
    let toast = use_toast();
    let (addresses, set_addresses) = signal::<Vec<Address>>(Vec::new());
    let line1 = RwSignal::new(String::new());
    let city = RwSignal::new(String::new());

    let load = {
        let client = client.clone();
        move || {
            let client = client.clone();
            spawn_local(async move {
                match api::fetch_addresses(&client).await {
                    Ok(list) => set_addresses.set(list),
                    Err(e) => log::warn!("Failed to load addresses: {}", e),
                }
            });
        }
    };
    load();

    let add = {
        let client = client.clone();
        let toast = toast.clone();
        let load = load.clone();
        move |_| {
            let dto = AddressDto {
                line1: line1.get_untracked().trim().to_string(),
                city: city.get_untracked().trim().to_string(),
                is_default: addresses.with_untracked(Vec::is_empty),
                ..AddressDto::default()
            };
            if dto.line1.is_empty() || dto.city.is_empty() {
                toast.error("Street and city are required");
                return;
            }
            let client = client.clone();
            let toast = toast.clone();
            let load = load.clone();
            spawn_local(async move {
                match api::create_address(&client, &dto).await {
                    Ok(_) => {
                        line1.set(String::new());
                        city.set(String::new());
                        load();
                    }
                    Err(e) => toast.error(e.to_string()),
                }
            });
        }
    };

    let remove = move |address: Address| {
        let client = client.clone();
        let toast = toast.clone();
        let load = load.clone();
        spawn_local(async move {
            match api::delete_address(&client, &address.id).await {
                Ok(()) => load(),
                Err(e) => toast.error(e.to_string()),
            }
        });
    };

    view! {
        <section class="profile-section">
            <h2 class="profile-section__title">"Addresses"</h2>
            {move || {
                addresses
                    .get()
                    .into_iter()
                    .map(|address| {
                        let remove = remove.clone();
                        let summary = address.summary();
                        let is_default = address.is_default;
                        view! {
                            <div class="address-row">
                                <span>{summary}</span>
                                {is_default.then(|| view! { <span class="badge">"Default"</span> })}
                                <button class="button button--ghost" on:click=move |_| remove(address.clone())>
                                    {icon("trash")}
                                </button>
                            </div>
                        }
                    })
                    .collect_view()
            }}
            <div class="address-form">
                <Input value=line1 placeholder="Street" />
                <Input value=city placeholder="City" />
                <Button size=ButtonSize::Small appearance=ButtonAppearance::Secondary on_click=add>
                    "Add address"
                </Button>
            </div>
        </section>
    }
}

#[component]
#[allow(non_snake_case)]
fn SupportForm() -> impl IntoView {
    let client = use_api_client();
    let toast = use_toast();
    let subject = RwSignal::new(String::new());
    let message = RwSignal::new(String::new());

    let send = move |_| {
        let request = SupportMessageRequest {
            subject: subject.get_untracked(),
            message: message.get_untracked(),
            order_id: None,
        };
        let client = client.clone();
        let toast = toast.clone();
        spawn_local(async move {
            match api::send_support_message(&client, &request).await {
                Ok(()) => {
                    subject.set(String::new());
                    message.set(String::new());
                    toast.success("Message sent, we'll get back to you soon");
                }
                Err(e) => toast.error(e.to_string()),
            }
        });
    };

    view! {
        <section class="profile-section">
            <h2 class="profile-section__title">"Contact support"</h2>
            <Input value=subject placeholder="Subject" />
            <Textarea value=message placeholder="How can we help?" />
            <Button size=ButtonSize::Small appearance=ButtonAppearance::Primary on_click=send>
                "Send"
            </Button>
        </section>
    }
}

#[component]
#[allow(non_snake_case)]
fn PinForm() -> impl IntoView {
    let client = use_api_client();
    let toast = use_toast();
    let pin = RwSignal::new(String::new());

    let save = move |_| {
        let value = pin.get_untracked();
        let client = client.clone();
        let toast = toast.clone();
        spawn_local(async move {
            match api::set_pin(&client, value.trim()).await {
                Ok(()) => {
                    pin.set(String::new());
                    toast.success("PIN updated");
                }
                Err(e) => toast.error(e.to_string()),
            }
        });
    };

    view! {
        <section class="profile-section">
            <h2 class="profile-section__title">"Ordering PIN"</h2>
            <Input value=pin input_type=InputType::Password placeholder="4 to 6 digits" />
            <Button size=ButtonSize::Small appearance=ButtonAppearance::Secondary on_click=save>
                "Save PIN"
            </Button>
        </section>
    }
}

#[component]
#[allow(non_snake_case)]
pub fn ProfilePage() -> impl IntoView {
    let auth = use_auth();
    let user = auth.user;

    view! {
        <div class="page">
            <div class="header">
                <div class="header__content">
                    <h1 class="header__title">"Profile"</h1>
                </div>
                <div class="header__actions">
                    <ThemeToggle />
                </div>
            </div>

            <section class="profile-section">
                <div class="profile-name">
                    {move || user.with(|u| u.as_ref().map(|u| u.display_name()).unwrap_or_default())}
                </div>
                <div class="profile-contact">
                    {move || user.with(|u| u.as_ref().and_then(|u| u.email.clone()).unwrap_or_default())}
                </div>
            </section>

            <AddressBook />
            <PinForm />
            <SupportForm />

            <button class="button button--secondary" on:click=move |_| auth.logout()>
                {icon("logout")}
                "Sign out"
            </button>
        </div>
    }
}
