use contracts::domain::a005_notification::{Notification, NotificationKind};
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;

use super::store::{use_notifications, NotificationStatus};
use crate::shared::icons::icon;

fn kind_icon(kind: NotificationKind) -> AnyView {
    icon(match kind {
        NotificationKind::Order => "orders",
        NotificationKind::CartReminder => "cart",
        NotificationKind::Promotion => "products",
        NotificationKind::System => "bell",
    })
}

#[component]
#[allow(non_snake_case)]
fn NotificationRow(notification: Notification) -> impl IntoView {
    let store = use_notifications();
    let id = notification.id.clone();
    let is_read = notification.is_read;

    let mark_read = {
        let store = store.clone();
        let id = id.clone();
        move |_| {
            let store = store.clone();
            let id = id.clone();
            spawn_local(async move { store.mark_as_read(&id).await });
        }
    };
    let delete = move |_| store.delete_notification(&id);

    view! {
        <div class=if is_read { "notification" } else { "notification notification--unread" }>
            <div class="notification__icon">{kind_icon(notification.kind())}</div>
            <div class="notification__body">
                <div class="notification__title">{notification.title.clone().unwrap_or_default()}</div>
                <div class="notification__message">{notification.message.clone().unwrap_or_default()}</div>
                <div class="notification__time">{notification.created_at.clone().unwrap_or_default()}</div>
            </div>
            <div class="notification__actions">
                {(!is_read).then(|| view! {
                    <button class="button button--ghost" title="Mark as read" on:click=mark_read>
                        {icon("check")}
                    </button>
                })}
                <button class="button button--ghost" title="Delete" on:click=delete>
                    {icon("trash")}
                </button>
            </div>
        </div>
    }
}

#[component]
#[allow(non_snake_case)]
pub fn NotificationsPage() -> impl IntoView {
    let store = use_notifications();
    let items = store.items;
    let unread = store.unread;
    let status = store.status;

    let mark_all = move |_| {
        let store = store.clone();
        spawn_local(async move { store.mark_all_as_read().await });
    };

    view! {
        <div class="page">
            <div class="header">
                <div class="header__content">
                    <h1 class="header__title">"Notifications"</h1>
                </div>
                <div class="header__actions">
                    <Button
                        size=ButtonSize::Small
                        appearance=ButtonAppearance::Secondary
                        disabled=Signal::derive(move || unread.get() == 0)
                        on_click=mark_all
                    >
                        "Mark all as read"
                    </Button>
                </div>
            </div>

            {move || match status.get() {
                NotificationStatus::Errored(message) => Some(view! {
                    <div class="warning-box">
                        <span class="warning-box__icon">"⚠"</span>
                        <span class="warning-box__text">{message}</span>
                    </div>
                }),
                _ => None,
            }}

            <Show
                when=move || !items.with(Vec::is_empty)
                fallback=move || {
                    if status.get() == NotificationStatus::Loading {
                        view! { <Spinner /> }.into_any()
                    } else {
                        view! { <div class="empty-state">"You're all caught up"</div> }.into_any()
                    }
                }
            >
                <For
                    each=move || items.get()
                    key=|n| (n.id.clone(), n.is_read)
                    children=|n| view! { <NotificationRow notification=n /> }
                />
            </Show>
        </div>
    }
}
