use contracts::system::auth::SignupRequest;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::shared::http::{use_api_client, ApiError, ErrorKind};
use crate::system::account::api as account_api;
use crate::system::auth::context::use_auth;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    SignIn,
    SignUp,
    Forgot,
}

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Login form message for a failed sign-in.
pub fn login_error_message(error: &ApiError) -> String {
    match error.kind() {
        ErrorKind::Unauthenticated => "Invalid business name or password".to_string(),
        ErrorKind::Network | ErrorKind::Timeout => {
            "Cannot reach the server. Check your connection.".to_string()
        }
        _ => format!("Login failed: {}", error),
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let client = use_api_client();

    let remembered = auth.remembered_business_name();
    let (mode, set_mode) = signal(Mode::SignIn);
    let (business_name, set_business_name) = signal(remembered.clone().unwrap_or_default());
    let (password, set_password) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (phone, set_phone) = signal(String::new());
    let (remember, set_remember) = signal(remembered.is_some());
    let (error_message, set_error_message) = signal(Option::<String>::None);
    let (info_message, set_info_message) = signal(Option::<String>::None);
    let (is_loading, set_is_loading) = signal(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();

        let auth = auth.clone();
        let client = client.clone();
        let name_val = business_name.get();
        let password_val = password.get();
        let current = mode.get();

        set_is_loading.set(true);
        set_error_message.set(None);
        set_info_message.set(None);

        spawn_local(async move {
            // A successful sign-in sets the user, which swaps this page out.
            let result = match current {
                Mode::SignIn => auth
                    .login(name_val, password_val, remember.get_untracked())
                    .await
                    .map(|_| None),
                Mode::SignUp => auth
                    .signup(SignupRequest {
                        business_name: name_val,
                        password: password_val,
                        email: optional(email.get_untracked()),
                        phone: optional(phone.get_untracked()),
                    })
                    .await
                    .map(|_| None),
                Mode::Forgot => account_api::forgot_password(&client, email.get_untracked().trim())
                    .await
                    .map(|_| Some("If the address is registered, a reset link is on its way.".to_string())),
            };
            match result {
                Ok(info) => set_info_message.set(info),
                Err(e) => set_error_message.set(Some(login_error_message(&e))),
            }
            set_is_loading.set(false);
        });
    };

    let switch = move |next: Mode| {
        set_error_message.set(None);
        set_info_message.set(None);
        set_mode.set(next);
    };

    view! {
        <div class="login-container">
            <div class="login-box">
                <h1>"Storefront"</h1>
                <h2>
                    {move || match mode.get() {
                        Mode::SignIn => "Sign in",
                        Mode::SignUp => "Create account",
                        Mode::Forgot => "Reset password",
                    }}
                </h2>

                <Show when=move || error_message.get().is_some()>
                    <div class="error-message">
                        {move || error_message.get().unwrap_or_default()}
                    </div>
                </Show>
                <Show when=move || info_message.get().is_some()>
                    <div class="info-message">
                        {move || info_message.get().unwrap_or_default()}
                    </div>
                </Show>

                <form on:submit=on_submit>
                    <Show when=move || mode.get() != Mode::Forgot>
                        <div class="form-group">
                            <label for="business_name">"Business name"</label>
                            <input
                                type="text"
                                id="business_name"
                                value=move || business_name.get()
                                on:input=move |ev| set_business_name.set(event_target_value(&ev))
                                required
                                disabled=move || is_loading.get()
                            />
                        </div>

                        <div class="form-group">
                            <label for="password">"Password"</label>
                            <input
                                type="password"
                                id="password"
                                value=move || password.get()
                                on:input=move |ev| set_password.set(event_target_value(&ev))
                                required
                                disabled=move || is_loading.get()
                            />
                        </div>
                    </Show>

                    <Show when=move || mode.get() != Mode::SignIn>
                        <div class="form-group">
                            <label for="email">"Email"</label>
                            <input
                                type="email"
                                id="email"
                                value=move || email.get()
                                on:input=move |ev| set_email.set(event_target_value(&ev))
                                disabled=move || is_loading.get()
                            />
                        </div>
                    </Show>

                    <Show when=move || mode.get() == Mode::SignUp>
                        <div class="form-group">
                            <label for="phone">"Phone"</label>
                            <input
                                type="tel"
                                id="phone"
                                value=move || phone.get()
                                on:input=move |ev| set_phone.set(event_target_value(&ev))
                                disabled=move || is_loading.get()
                            />
                        </div>
                    </Show>

                    <Show when=move || mode.get() == Mode::SignIn>
                        <label class="form-check">
                            <input
                                type="checkbox"
                                prop:checked=move || remember.get()
                                on:change=move |ev| set_remember.set(event_target_checked(&ev))
                            />
                            "Remember business name"
                        </label>
                    </Show>

                    <button
                        type="submit"
                        class="btn-primary"
                        disabled=move || is_loading.get()
                    >
                        {move || match (is_loading.get(), mode.get()) {
                            (true, _) => "Please wait...",
                            (false, Mode::SignIn) => "Sign in",
                            (false, Mode::SignUp) => "Create account",
                            (false, Mode::Forgot) => "Send reset link",
                        }}
                    </button>
                </form>

                <div class="login-info">
                    <Show
                        when=move || mode.get() == Mode::SignIn
                        fallback=move || view! {
                            <a href="#" on:click=move |ev| { ev.prevent_default(); switch(Mode::SignIn) }>
                                "Back to sign in"
                            </a>
                        }
                    >
                        <a href="#" on:click=move |ev| { ev.prevent_default(); switch(Mode::SignUp) }>
                            "Create an account"
                        </a>
                        " · "
                        <a href="#" on:click=move |ev| { ev.prevent_default(); switch(Mode::Forgot) }>
                            "Forgot password?"
                        </a>
                    </Show>
                </div>
            </div>
        </div>
    }
}
