use crate::api::use_api;
use crate::auth::{refresh_user, store_user, use_auth};
use crate::components::common::{ErrorAlert, Notice, NoticeToast, PageHeader, use_notice};
use leptos::prelude::*;
use leptos::task::spawn_local;
use linkgate_shared::format_money;
use linkgate_shared::protocol::UpdateProfileRequest;

pub const PAYOUT_METHODS: [&str; 3] = ["paypal", "bitcoin", "bank"];

#[component]
pub fn ProfilePage() -> impl IntoView {
    let auth = use_auth();
    let api = StoredValue::new_local(use_api());
    let notice = use_notice();

    let method = RwSignal::new(String::new());
    let address = RwSignal::new(String::new());
    let (saving, set_saving) = signal(false);
    let (error_msg, set_error_msg) = signal(None::<String>);

    let fill_form = move || {
        if let Some(user) = auth.user() {
            method.set(user.payout_method.unwrap_or_else(|| PAYOUT_METHODS[0].to_string()));
            address.set(user.payout_address.unwrap_or_default());
        }
    };
    fill_form();

    // 挂载时拉取最新资料
    {
        let api = api.get_value();
        spawn_local(async move {
            match refresh_user(auth, &api).await {
                Ok(_) => fill_form(),
                Err(e) => set_error_msg.set(Some(format!("Failed to load profile: {}", e))),
            }
        });
    }

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let addr = address.get().trim().to_string();
        if addr.is_empty() {
            set_error_msg.set(Some("Please enter a payout address".to_string()));
            return;
        }
        set_error_msg.set(None);
        set_saving.set(true);

        let api = api.get_value();
        let req = UpdateProfileRequest {
            payout_method: method.get(),
            payout_address: addr,
        };
        spawn_local(async move {
            match api.send(&req).await {
                Ok(user) => {
                    store_user(auth, &api, user);
                    notice.set(Some(Notice::success("Payout settings saved")));
                }
                Err(e) => set_error_msg.set(Some(e.to_string())),
            }
            set_saving.set(false);
        });
    };

    let email = move || auth.session.with(|s| s.user.as_ref().map(|u| u.email.clone()).unwrap_or_default());
    let balance = move || auth.session.with(|s| s.user.as_ref().map_or(0.0, |u| u.balance));
    let verified = move || auth.session.with(|s| s.user.as_ref().is_some_and(|u| u.email_verified));

    view! {
        <NoticeToast notice=notice />
        <PageHeader title="Profile" />

        <div class="grid gap-6 md:grid-cols-2">
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <h3 class="card-title">"Account"</h3>
                    <div class="text-sm opacity-70">"Email"</div>
                    <div class="flex items-center gap-2">
                        <span class="font-mono">{email}</span>
                        <Show
                            when=verified
                            fallback=|| view! { <span class="badge badge-warning">"unverified"</span> }
                        >
                            <span class="badge badge-success">"verified"</span>
                        </Show>
                    </div>
                    <div class="text-sm opacity-70 mt-2">"Balance"</div>
                    <div class="text-2xl font-bold text-success">{move || format_money(balance())}</div>
                </div>
            </div>

            <div class="card bg-base-100 shadow-xl">
                <form class="card-body" on:submit=on_submit>
                    <h3 class="card-title">"Payout settings"</h3>
                    <ErrorAlert message=error_msg />
                    <div class="form-control">
                        <label class="label" for="method">
                            <span class="label-text">"Method"</span>
                        </label>
                        <select
                            id="method"
                            class="select select-bordered"
                            on:change=move |ev| method.set(event_target_value(&ev))
                            prop:value=method
                        >
                            {PAYOUT_METHODS
                                .iter()
                                .map(|m| view! { <option value=*m>{*m}</option> })
                                .collect_view()}
                        </select>
                    </div>
                    <div class="form-control">
                        <label class="label" for="address">
                            <span class="label-text">"Address"</span>
                        </label>
                        <input
                            id="address"
                            type="text"
                            placeholder="PayPal email, wallet address or IBAN"
                            class="input input-bordered"
                            on:input=move |ev| address.set(event_target_value(&ev))
                            prop:value=address
                        />
                    </div>
                    <div class="form-control mt-4">
                        <button class="btn btn-primary" disabled=move || saving.get()>"Save"</button>
                    </div>
                </form>
            </div>
        </div>
    }
}
